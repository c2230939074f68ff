use std::io::{self, Write};

use anyhow::{bail, Result};
use bstr::ByteSlice;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_object::{Object, TreeEntry};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct LsTreeArgs {
    /// Show only names
    #[arg(long)]
    name_only: bool,

    /// Recurse into sub-trees
    #[arg(short = 'r')]
    recurse: bool,

    /// Tree to list
    #[arg(value_name = "tree-ish")]
    tree_ish: String,
}

pub fn run(args: &LsTreeArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let odb = repo.odb();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let oid = ObjectId::from_hex(&args.tree_ish)
        .map_err(|_| anyhow::anyhow!("not a valid object name: {}", args.tree_ish))?;

    // A commit id is accepted and resolves to its tree.
    let tree_oid = match odb.read(&oid)? {
        Some(Object::Tree(_)) => oid,
        Some(Object::Commit(commit)) => commit.tree,
        Some(other) => bail!(
            "not a tree object: {} is a {}",
            args.tree_ish,
            other.object_type()
        ),
        None => bail!("object not found: {}", args.tree_ish),
    };

    list_tree(odb, &tree_oid, "", args, &mut out)?;

    Ok(0)
}

fn list_tree(
    odb: &minigit_odb::ObjectStore,
    tree_oid: &ObjectId,
    prefix: &str,
    args: &LsTreeArgs,
    out: &mut impl Write,
) -> Result<()> {
    let tree = match odb.read(tree_oid)? {
        Some(Object::Tree(t)) => t,
        _ => bail!("not a tree: {}", tree_oid.to_hex()),
    };

    for entry in tree.iter() {
        let name = entry.name.to_str_lossy();
        let full_path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        };

        if entry.mode.is_tree() && args.recurse {
            list_tree(odb, &entry.oid, &full_path, args, out)?;
        } else {
            print_entry(entry, &full_path, args.name_only, out)?;
        }
    }

    Ok(())
}

fn print_entry(
    entry: &TreeEntry,
    full_path: &str,
    name_only: bool,
    out: &mut impl Write,
) -> Result<()> {
    if name_only {
        writeln!(out, "{}", full_path)?;
    } else {
        let type_name = if entry.mode.is_tree() {
            "tree"
        } else if entry.mode.is_gitlink() {
            "commit"
        } else {
            "blob"
        };
        writeln!(
            out,
            "{:06o} {} {}\t{}",
            entry.mode.raw(),
            type_name,
            entry.oid.to_hex(),
            full_path,
        )?;
    }
    Ok(())
}
