use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Args;
use minigit_hash::ObjectId;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CatFileArgs {
    /// Print the raw object payload
    #[arg(short = 'p', conflicts_with_all = ["type_only", "size"])]
    pretty: bool,

    /// Show object type
    #[arg(short = 't', conflicts_with_all = ["pretty", "size"])]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', conflicts_with_all = ["pretty", "type_only"])]
    size: bool,

    /// Object ID
    #[arg(value_name = "object")]
    object: String,
}

pub fn run(args: &CatFileArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let odb = repo.odb();
    let oid = ObjectId::from_hex(&args.object)
        .map_err(|_| anyhow::anyhow!("not a valid object name: {}", args.object))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.type_only || args.size {
        let Some((obj_type, size)) = odb.read_header(&oid)? else {
            bail!("object not found: {}", args.object);
        };
        if args.type_only {
            writeln!(out, "{}", obj_type)?;
        } else {
            writeln!(out, "{}", size)?;
        }
        return Ok(0);
    }

    // -p (and the bare default): the raw payload, nothing appended.
    let Some((_, payload)) = odb.read_raw(&oid)? else {
        bail!("object not found: {}", args.object);
    };
    out.write_all(&payload)?;
    Ok(0)
}
