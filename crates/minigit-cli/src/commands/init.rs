use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use minigit_repository::InitOptions;

use crate::Cli;

#[derive(Args)]
pub struct InitArgs {
    /// Create a bare repository
    #[arg(long)]
    bare: bool,

    /// Override the name of the initial branch
    #[arg(short = 'b', long, value_name = "branch-name")]
    initial_branch: Option<String>,

    /// Be quiet, only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Directory to create the repository in
    directory: Option<PathBuf>,
}

pub fn run(args: &InitArgs, _cli: &Cli) -> Result<i32> {
    let target = match &args.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };

    if !target.exists() {
        std::fs::create_dir_all(&target)?;
    }

    let opts = InitOptions {
        bare: args.bare,
        default_branch: args.initial_branch.clone(),
    };

    let repo = minigit_repository::Repository::init_opts(&target, &opts)?;

    if !args.quiet {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        let git_dir = std::fs::canonicalize(repo.git_dir())
            .unwrap_or_else(|_| repo.git_dir().to_path_buf());
        let mut display_path = git_dir.display().to_string();
        if !display_path.ends_with('/') {
            display_path.push('/');
        }
        writeln!(err, "Initialized empty Git repository in {}", display_path)?;
    }

    Ok(0)
}
