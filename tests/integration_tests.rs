/// Integration tests for superd
///
/// These tests run complete organize / undo workflows against temporary
/// directories, with the application state kept in its own temporary
/// directory.
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use superd::config::AppDirs;
use superd::conflict::ConflictPolicy;
use superd::file_organizer::{FileOrganizer, MoveStatus, OrganizeReport};
use superd::history::MAX_HISTORY;
use superd::rules::{Rule, Schema};
use superd::undo::UndoManager;
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A folder to organize plus a separate application directory.
struct TestFixture {
    work_dir: TempDir,
    app_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        TestFixture {
            work_dir: TempDir::new().expect("Failed to create temp directory"),
            app_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    fn path(&self) -> &Path {
        self.work_dir.path()
    }

    fn app_dirs(&self) -> AppDirs {
        AppDirs::resolve(Some(self.app_dir.path())).expect("Failed to resolve app dir")
    }

    fn create_text_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn organize(&self, schema: &Schema, policy: ConflictPolicy) -> OrganizeReport {
        let log = self.app_dirs().transaction_log();
        FileOrganizer::new(schema, policy, &log).organize(&[self.path()])
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

fn trash_and_archive_rules() -> Schema {
    Schema {
        rules: vec![
            Rule::with_pattern("1", "Trash", "*.tmp", "Trash"),
            Rule::with_extensions("2", "Archive", &[".tmp"], "Archive"),
        ],
    }
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_pattern_rule_wins_over_extension_rule() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.tmp", "temp");

    let report = fixture.organize(&trash_and_archive_rules(), ConflictPolicy::Rename);

    assert_eq!(report.moved_count(), 1);
    fixture.assert_file_exists("Trash/a.tmp");
    fixture.assert_file_not_exists("Archive/a.tmp");
}

#[test]
fn test_pattern_rule_wins_when_declared_last() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.tmp", "temp");
    let mut schema = trash_and_archive_rules();
    schema.rules.reverse();

    fixture.organize(&schema, ConflictPolicy::Rename);

    fixture.assert_file_exists("Trash/a.tmp");
}

#[test]
fn test_unmatched_files_go_to_uncategorized() {
    let fixture = TestFixture::new();
    fixture.create_text_file("setup.exe", "binary");
    fixture.create_text_file("README", "no extension");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    assert_eq!(report.moved_count(), 2);
    for op in report.moved() {
        assert_eq!(
            op.new_path,
            fixture.path().join("!Uncategorized").join(&op.file_name)
        );
    }
}

#[test]
fn test_default_rules_sort_images_and_documents() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.JPG", "jpg");
    fixture.create_text_file("report.pdf", "pdf");
    fixture.create_text_file("notes.txt", "txt");

    fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    fixture.assert_file_exists("Pictures/photo.JPG");
    fixture.assert_file_exists("Documents/report.pdf");
    fixture.assert_file_exists("Documents/notes.txt");
}

#[test]
fn test_subdirectories_are_not_descended_into() {
    let fixture = TestFixture::new();
    fixture.create_text_file("nested/inner.txt", "inner");
    fixture.create_text_file("outer.txt", "outer");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    assert_eq!(report.moved_count(), 1);
    fixture.assert_file_exists("nested/inner.txt");
    fixture.assert_file_exists("Documents/outer.txt");
}

#[test]
fn test_absolute_target_directory() {
    let fixture = TestFixture::new();
    let elsewhere = TempDir::new().expect("Failed to create temp directory");
    let target = elsewhere.path().join("isos");
    fixture.create_text_file("debian.iso", "iso");
    let schema = Schema {
        rules: vec![Rule::with_extensions(
            "1",
            "Images",
            &[".iso"],
            &target.to_string_lossy(),
        )],
    };

    fixture.organize(&schema, ConflictPolicy::Rename);

    assert!(target.join("debian.iso").is_file());
    fixture.assert_file_not_exists("debian.iso");
}

// ============================================================================
// Conflicts
// ============================================================================

#[test]
fn test_skip_leaves_source_and_destination_untouched() {
    let fixture = TestFixture::new();
    fixture.create_text_file("x.txt", "incoming");
    fixture.create_text_file("Documents/x.txt", "existing");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Skip);

    assert_eq!(report.moved_count(), 0);
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(fixture.read("x.txt"), "incoming");
    assert_eq!(fixture.read("Documents/x.txt"), "existing");
    assert!(report.transaction.is_none());
    assert!(fixture.app_dirs().transaction_log().list().is_empty());
}

#[test]
fn test_rename_prefixes_unix_timestamp() {
    let fixture = TestFixture::new();
    fixture.create_text_file("x.txt", "incoming");
    fixture.create_text_file("Documents/x.txt", "existing");

    let before = chrono::Utc::now().timestamp();
    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);
    let after = chrono::Utc::now().timestamp();

    let ops: Vec<_> = report.moved().collect();
    assert_eq!(ops.len(), 1);
    let new_name = ops[0]
        .new_path
        .file_name()
        .expect("file name")
        .to_string_lossy()
        .to_string();
    let re = Regex::new(r"^(\d+)_x\.txt$").expect("valid regex");
    let captures = re.captures(&new_name).expect("renamed with timestamp prefix");
    let stamp: i64 = captures[1].parse().expect("numeric prefix");
    assert!(stamp >= before && stamp <= after);

    assert_eq!(fixture.read("Documents/x.txt"), "existing");
    assert_eq!(
        fs::read_to_string(&ops[0].new_path).expect("read"),
        "incoming"
    );
}

#[test]
fn test_rename_keeps_same_named_files_from_two_folders() {
    let fixture = TestFixture::new();
    let first = fixture.create_text_file("a/x.txt", "from a");
    let second = fixture.create_text_file("b/x.txt", "from b");
    fixture.create_text_file("shared/x.txt", "existing");
    let shared = fixture.path().join("shared");
    let schema = Schema {
        rules: vec![Rule::with_extensions(
            "1",
            "Docs",
            &[".txt"],
            &shared.to_string_lossy(),
        )],
    };
    let log = fixture.app_dirs().transaction_log();

    let report = FileOrganizer::new(&schema, ConflictPolicy::Rename, &log)
        .organize(&[fixture.path().join("a"), fixture.path().join("b")]);

    let ops: Vec<_> = report.moved().collect();
    assert_eq!(ops.len(), 2);
    assert_ne!(ops[0].new_path, ops[1].new_path);
    assert!(!first.exists());
    assert!(!second.exists());
    assert_eq!(fixture.read("shared/x.txt"), "existing");
    let mut contents: Vec<_> = ops
        .iter()
        .map(|op| fs::read_to_string(&op.new_path).expect("read"))
        .collect();
    contents.sort();
    assert_eq!(contents, vec!["from a", "from b"]);

    UndoManager::new(&log).undo_latest().expect("undo");
    assert_eq!(fs::read_to_string(&first).expect("read"), "from a");
    assert_eq!(fs::read_to_string(&second).expect("read"), "from b");
}

#[test]
fn test_overwrite_replaces_existing_file() {
    let fixture = TestFixture::new();
    fixture.create_text_file("x.txt", "incoming");
    fixture.create_text_file("Documents/x.txt", "existing");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::from("overwrite"));

    assert_eq!(report.moved_count(), 1);
    assert_eq!(fixture.read("Documents/x.txt"), "incoming");
    fixture.assert_file_not_exists("x.txt");
}

// ============================================================================
// History and undo
// ============================================================================

#[test]
fn test_organize_records_one_transaction_per_run() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");
    fixture.create_text_file("b.png", "b");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    let history = fixture.app_dirs().transaction_log().list();
    assert_eq!(history.len(), 1);
    let tx = report.transaction.expect("transaction recorded");
    assert_eq!(history[0], tx);
    let names: Vec<_> = tx.operations.iter().map(|op| op.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.png"]);
}

#[test]
fn test_undo_restores_files_and_shrinks_history() {
    let fixture = TestFixture::new();
    let log = fixture.app_dirs().transaction_log();

    fixture.create_text_file("first.txt", "1");
    fixture.organize(&Schema::default(), ConflictPolicy::Rename);
    fixture.create_text_file("photo.png", "png");
    fixture.create_text_file("notes.pdf", "pdf");
    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);
    let tx = report.transaction.expect("transaction recorded");
    assert_eq!(log.list().len(), 2);

    let undo = UndoManager::new(&log)
        .undo(&tx.id)
        .expect("undo")
        .expect("transaction exists");

    assert_eq!(undo.restored_files, 2);
    fixture.assert_file_exists("photo.png");
    fixture.assert_file_exists("notes.pdf");
    fixture.assert_file_not_exists("Pictures/photo.png");
    fixture.assert_file_exists("Documents/first.txt");
    let history = log.list();
    assert_eq!(history.len(), 1);
    assert!(history.iter().all(|t| t.id != tx.id));
}

#[test]
fn test_undo_unknown_id_changes_nothing() {
    let fixture = TestFixture::new();
    let log = fixture.app_dirs().transaction_log();
    fixture.create_text_file("a.txt", "a");
    fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    let result = UndoManager::new(&log).undo("does-not-exist").expect("undo");

    assert!(result.is_none());
    assert_eq!(log.list().len(), 1);
    fixture.assert_file_exists("Documents/a.txt");
}

#[test]
fn test_undo_renamed_conflict_restores_original_name() {
    let fixture = TestFixture::new();
    let log = fixture.app_dirs().transaction_log();
    fixture.create_text_file("x.txt", "incoming");
    fixture.create_text_file("Documents/x.txt", "existing");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);
    let tx = report.transaction.expect("transaction recorded");
    UndoManager::new(&log).undo(&tx.id).expect("undo");

    assert_eq!(fixture.read("x.txt"), "incoming");
    assert_eq!(fixture.read("Documents/x.txt"), "existing");
    assert_eq!(fixture.list_files_recursive().len(), 2);
}

#[test]
fn test_history_never_exceeds_cap() {
    let fixture = TestFixture::new();
    let log = fixture.app_dirs().transaction_log();

    let mut ids = Vec::new();
    for i in 0..=MAX_HISTORY {
        fixture.create_text_file(&format!("file{}.txt", i), "x");
        let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);
        ids.push(report.transaction.expect("transaction recorded").id);
    }

    let history = log.list();
    assert_eq!(history.len(), MAX_HISTORY);
    assert!(history.iter().all(|tx| tx.id != ids[0]));
    assert_eq!(history[0].id, ids[MAX_HISTORY]);
}

#[test]
fn test_corrupt_history_is_treated_as_empty() {
    let fixture = TestFixture::new();
    let app_dirs = fixture.app_dirs();
    fs::write(app_dirs.history_path(), "[{ broken").expect("Failed to write file");
    fixture.create_text_file("a.txt", "a");

    let report = fixture.organize(&Schema::default(), ConflictPolicy::Rename);

    assert!(report.transaction.is_some());
    assert_eq!(app_dirs.transaction_log().list().len(), 1);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_schema_round_trip_through_app_dir() {
    let fixture = TestFixture::new();
    let app_dirs = fixture.app_dirs();
    let mut schema = trash_and_archive_rules();
    schema.rules[1].pattern = "backup-??".to_string();

    app_dirs.save_schema(&schema).expect("save schema");

    assert_eq!(app_dirs.load_schema(), schema);
}

#[test]
fn test_full_workflow_organize_undo_reorganize() {
    let fixture = TestFixture::new();
    let log = fixture.app_dirs().transaction_log();
    fixture.create_text_file("a.tmp", "a");
    fixture.create_text_file("b.txt", "b");
    let schema = trash_and_archive_rules();

    let first = fixture.organize(&schema, ConflictPolicy::Rename);
    assert!(
        first
            .outcomes
            .iter()
            .all(|o| matches!(o.status, MoveStatus::Moved(_)))
    );
    let tx = first.transaction.expect("transaction recorded");
    UndoManager::new(&log).undo(&tx.id).expect("undo");
    fixture.assert_file_exists("a.tmp");
    fixture.assert_file_exists("b.txt");

    let second = fixture.organize(&schema, ConflictPolicy::Rename);
    assert_eq!(second.moved_count(), 2);
    fixture.assert_file_exists("Trash/a.tmp");
    fixture.assert_file_exists("!Uncategorized/b.txt");
    assert_eq!(log.list().len(), 1);
}
