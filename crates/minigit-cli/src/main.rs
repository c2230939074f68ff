mod commands;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use commands::Commands;

#[derive(Parser)]
#[command(name = "minigit", about = "A minimal git implementation in Rust", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set the path to the .git directory
    #[arg(long = "git-dir", global = true)]
    git_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    match commands::run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("fatal: {e}");
            process::exit(128);
        }
    }
}
