//! Studio shell
//!
//! Interactive, role-gated command prompt for the studio environment

use std::io;
use std::path::PathBuf;

use clap::Parser;
use studio_core::logging_facility::{init, Profile};
use studio_core::StartupOptions;

mod repl;

#[derive(Debug, Parser)]
#[command(name = "studio")]
#[command(about = "Studio shell - role-gated command prompt with background jobs", long_about = None)]
struct Cli {
    /// Directory holding Data/ (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log output format on stderr: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: Profile,

    /// Run as this user id instead of the persisted one
    #[arg(long)]
    user_id: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init(cli.log_format);

    if let Err(e) = execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let working_dir = std::env::current_dir()?.canonicalize()?;
    let root = cli.root.unwrap_or_else(|| working_dir.clone());

    tracing::debug!(root = %root.display(), cwd = %working_dir.display(), "starting shell");
    let mut options = StartupOptions::new(root, working_dir);
    options.user_id = cli.user_id;
    let mut startup = studio_core::start(options)?;

    let stdin = io::stdin();
    repl::run(
        &mut startup.dispatcher,
        &startup.warnings,
        stdin.lock(),
        io::stdout().lock(),
        io::stderr().lock(),
    )?;
    Ok(())
}
