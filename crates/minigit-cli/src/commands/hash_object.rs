use std::io::{self, Read, Write};

use anyhow::Result;
use clap::Args;
use minigit_hash::hasher::Hasher;
use minigit_object::ObjectType;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Actually write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Object type (default: blob)
    #[arg(short = 't', default_value = "blob", value_name = "type")]
    obj_type: ObjectType,

    /// Read the object from stdin
    #[arg(long)]
    stdin: bool,

    /// Files to hash
    #[arg(value_name = "file")]
    files: Vec<String>,
}

pub fn run(args: &HashObjectArgs, cli: &Cli) -> Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // A repository is only needed when writing.
    let repo = if args.write { Some(open_repo(cli)?) } else { None };

    if args.stdin {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        let oid = hash_and_maybe_write(&data, args.obj_type, repo.as_ref())?;
        writeln!(out, "{}", oid.to_hex())?;
    }

    for file in &args.files {
        let data = std::fs::read(file)?;
        let oid = hash_and_maybe_write(&data, args.obj_type, repo.as_ref())?;
        writeln!(out, "{}", oid.to_hex())?;
    }

    Ok(0)
}

fn hash_and_maybe_write(
    data: &[u8],
    obj_type: ObjectType,
    repo: Option<&minigit_repository::Repository>,
) -> Result<minigit_hash::ObjectId> {
    if let Some(repo) = repo {
        Ok(repo.odb().write_raw(obj_type, data)?)
    } else {
        Ok(Hasher::hash_object(obj_type.as_str(), data)?)
    }
}
