use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use minigit_repository::snapshot;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct WriteTreeArgs {}

pub fn run(_args: &WriteTreeArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let cwd = std::env::current_dir()?;

    let oid = snapshot::write_tree(repo.odb(), &cwd)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", oid.to_hex())?;

    Ok(0)
}
