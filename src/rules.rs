//! Classification rules and the rule matcher.
//!
//! A [`Schema`] is the ordered rule list as authored. [`RuleMatcher`] compiles
//! a copy of it, ordered by specificity, and decides which directory a file
//! belongs in.
//!
//! # Examples
//!
//! ```
//! use superd::rules::{Rule, RuleMatcher, Schema};
//!
//! let schema = Schema {
//!     rules: vec![
//!         Rule::with_extensions("archive", "Archive", &[".tmp"], "Archive"),
//!         Rule::with_pattern("trash", "Trash", "*.tmp", "Trash"),
//!     ],
//! };
//! let matcher = RuleMatcher::new(&schema);
//! assert_eq!(matcher.classify("a.tmp", ".tmp"), Some("Trash"));
//! ```

use crate::error::{Result, SuperdError};
use crate::scan::FileInfo;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Directory name used for files no rule claims.
pub const UNCATEGORIZED_DIR: &str = "!Uncategorized";

/// A named criterion mapping a file-name pattern or extension set to a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Lowercase, dot-prefixed extensions such as `.jpg`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Vec<String>,
    /// Glob matched against the file name. Empty means unset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pattern: String,
    /// Destination directory, absolute or relative to the file's parent.
    pub target_dir: String,
}

/// Reads an explicit `null` as the field's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Rule {
    /// Builds an extension-only rule.
    pub fn with_extensions(id: &str, name: &str, extensions: &[&str], target_dir: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            pattern: String::new(),
            target_dir: target_dir.to_string(),
        }
    }

    /// Builds a pattern-only rule.
    pub fn with_pattern(id: &str, name: &str, pattern: &str, target_dir: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            extensions: Vec::new(),
            pattern: pattern.to_string(),
            target_dir: target_dir.to_string(),
        }
    }
}

/// The persisted rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for Schema {
    /// The built-in rules used when no schema has been saved.
    fn default() -> Self {
        Self {
            rules: vec![
                Rule::with_extensions("1", "Images", &[".jpg", ".png", ".webp"], "Pictures"),
                Rule::with_extensions("2", "Docs", &[".pdf", ".docx", ".txt"], "Documents"),
            ],
        }
    }
}

impl Schema {
    /// Parses schema JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|source| SuperdError::InvalidSchema { source })
    }

    /// Serializes the schema as indented JSON.
    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// Ranks a rule so the most selective one is consulted first.
///
/// A pattern scores `1000` plus the count of its non-wildcard characters, a
/// non-empty extension set adds `100`, and a rule with neither scores `0`.
pub fn specificity_score(rule: &Rule) -> usize {
    let mut score = 0;
    if !rule.pattern.is_empty() {
        let literal = rule.pattern.replace(['*', '?'], "");
        score += 1000 + literal.len();
    }
    if !rule.extensions.is_empty() {
        score += 100;
    }
    score
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.is_empty() || lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

struct CompiledRule {
    pattern: Option<Pattern>,
    extensions: HashSet<String>,
    target_dir: String,
}

/// Rules compiled and ordered by descending specificity.
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    options: MatchOptions,
}

impl RuleMatcher {
    /// Compiles a sorted copy of the schema; the schema itself is left untouched.
    ///
    /// A pattern that fails to compile never matches, but still counts toward
    /// the rule's specificity.
    pub fn new(schema: &Schema) -> Self {
        let mut ordered: Vec<&Rule> = schema.rules.iter().collect();
        // sort_by_key is stable, so equal scores keep their authored order.
        ordered.sort_by_key(|rule| std::cmp::Reverse(specificity_score(rule)));

        let rules = ordered
            .into_iter()
            .map(|rule| {
                let pattern = if rule.pattern.is_empty() {
                    None
                } else {
                    match Pattern::new(&rule.pattern) {
                        Ok(p) => Some(p),
                        Err(e) => {
                            log::warn!("Rule '{}' has an invalid pattern '{}': {}", rule.name, rule.pattern, e);
                            None
                        }
                    }
                };
                CompiledRule {
                    pattern,
                    extensions: rule.extensions.iter().map(|e| normalize_extension(e)).collect(),
                    target_dir: rule.target_dir.clone(),
                }
            })
            .collect();

        Self {
            rules,
            options: MatchOptions {
                case_sensitive: cfg!(not(any(windows, target_os = "macos"))),
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        }
    }

    /// Returns the target directory of the first rule that claims the file.
    ///
    /// Within one rule the pattern is tried first, then the extension set.
    pub fn classify(&self, file_name: &str, extension: &str) -> Option<&str> {
        let extension = extension.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                let pattern_hit = rule
                    .pattern
                    .as_ref()
                    .is_some_and(|p| p.matches_with(file_name, self.options));
                pattern_hit || rule.extensions.contains(&extension)
            })
            .map(|rule| rule.target_dir.as_str())
    }

    /// Resolves the directory a scanned file should be moved into.
    ///
    /// Relative targets are joined onto the file's own parent directory.
    /// Unclaimed files go to `<parent>/!Uncategorized`.
    pub fn destination_dir(&self, file: &FileInfo) -> PathBuf {
        let parent = file.parent_dir();
        match self.classify(&file.name, &file.extension) {
            Some(target) => {
                let target = Path::new(target);
                if target.is_absolute() {
                    target.to_path_buf()
                } else {
                    parent.join(target)
                }
            }
            None => parent.join(UNCATEGORIZED_DIR),
        }
    }
}
