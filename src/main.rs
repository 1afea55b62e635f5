use clap::Parser;
use superd::cli::{Cli, run_cli};
use superd::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run_cli(cli) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}
