use std::io::{self, Read, Write};

use anyhow::Result;
use bstr::BString;
use clap::Args;
use minigit_hash::ObjectId;
use minigit_object::{Commit, Object};
use minigit_utils::date::{GitDate, Signature};

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct CommitTreeArgs {
    /// Tree object ID
    tree: String,

    /// Parent commit(s)
    #[arg(short = 'p', num_args = 1, value_name = "parent")]
    parent: Vec<String>,

    /// Commit message
    #[arg(short = 'm', value_name = "message")]
    message: Option<String>,
}

pub fn run(args: &CommitTreeArgs, cli: &Cli) -> Result<i32> {
    let repo = open_repo(cli)?;
    let odb = repo.odb();

    let tree_oid = ObjectId::from_hex(&args.tree)?;
    if !odb.contains(&tree_oid) {
        anyhow::bail!("not a valid object name: {}", args.tree);
    }

    let parents: Vec<ObjectId> = args
        .parent
        .iter()
        .map(|p| ObjectId::from_hex(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut message = match &args.message {
        Some(msg) => BString::from(msg.as_str()),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            BString::from(buf)
        }
    };
    if !message.ends_with(b"\n") {
        message.push(b'\n');
    }

    let author = signature_from_env("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL", "GIT_AUTHOR_DATE")?;
    let committer = signature_from_env(
        "GIT_COMMITTER_NAME",
        "GIT_COMMITTER_EMAIL",
        "GIT_COMMITTER_DATE",
    )?;

    let commit = Commit {
        tree: tree_oid,
        parents,
        author,
        committer,
        extra_headers: Vec::new(),
        message,
    };

    let oid = odb.write(&Object::Commit(commit))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", oid.to_hex())?;

    Ok(0)
}

fn signature_from_env(name_var: &str, email_var: &str, date_var: &str) -> Result<Signature> {
    let name = std::env::var(name_var).unwrap_or_else(|_| "minigit".to_string());
    let email = std::env::var(email_var).unwrap_or_else(|_| "minigit@localhost".to_string());

    let date = if let Ok(date_str) = std::env::var(date_var) {
        GitDate::parse_raw(&date_str)?
    } else {
        GitDate::now()
    };

    Ok(Signature {
        name: BString::from(name),
        email: BString::from(email),
        date,
    })
}
