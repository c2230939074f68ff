use std::io::{self, Cursor, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use minigit_hash::ObjectId;
use minigit_protocol::advert::parse_ref_advertisement;
use minigit_protocol::capability::negotiate_fetch_capabilities;
use minigit_protocol::fetch::fetch_pack;
use minigit_protocol::pktline::PktLineReader;
use minigit_protocol::sideband::progress_to_stderr;
use minigit_repository::{checkout, finalize_clone_refs, InitOptions, Repository};
use minigit_transport::HttpClient;

use crate::Cli;

#[derive(Args)]
pub struct CloneArgs {
    /// Be quiet, only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Repository URL
    repository: String,

    /// Destination directory
    dest_dir: Option<String>,
}

pub fn run(args: &CloneArgs, _cli: &Cli) -> Result<i32> {
    let stderr = io::stderr();
    let mut err = stderr.lock();

    let dest = match &args.dest_dir {
        Some(d) => PathBuf::from(d),
        None => infer_directory(&args.repository)?,
    };

    if dest.exists() && std::fs::read_dir(&dest)?.next().is_some() {
        bail!(
            "destination path '{}' already exists and is not an empty directory",
            dest.display()
        );
    }

    if !args.quiet {
        writeln!(err, "Cloning into '{}'...", dest.display())?;
    }

    // Discover refs before touching the filesystem: a bad remote leaves
    // nothing behind.
    let client = HttpClient::new(&args.repository)?;
    let advert_body = client.info_refs()?;
    let mut reader = PktLineReader::new(Cursor::new(advert_body));
    let (advertised_refs, capabilities) = parse_ref_advertisement(&mut reader)?;

    let repo = Repository::init_opts(&dest, &InitOptions::default())?;

    if advertised_refs.is_empty() {
        if !args.quiet {
            writeln!(err, "warning: You appear to have cloned an empty repository.")?;
        }
        return Ok(0);
    }

    // Want every advertised branch tip (deduplicated, advertisement order).
    let mut wants: Vec<ObjectId> = Vec::new();
    for (oid, name) in &advertised_refs {
        if name.starts_with(b"refs/heads/") && !wants.contains(oid) {
            wants.push(*oid);
        }
    }

    if !wants.is_empty() {
        let client_caps = negotiate_fetch_capabilities(&capabilities);

        let quiet = args.quiet;
        let mut progress = move |msg: &[u8]| {
            if !quiet {
                progress_to_stderr(msg);
            }
        };
        let pack = fetch_pack(&client, &wants, &client_caps, &mut progress)?;

        minigit_pack::ingest::unpack(repo.odb(), &pack)?;
    }

    // Objects are all persisted; only now do refs and HEAD appear.
    let (_branch, head_oid) = finalize_clone_refs(&repo, &advertised_refs)?;

    checkout::checkout_commit(&repo, &head_oid)?;

    Ok(0)
}

fn infer_directory(url_str: &str) -> Result<PathBuf> {
    let path = url_str
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url_str)
        .trim_end_matches(".git");
    if path.is_empty() {
        bail!("cannot infer directory name from '{}'", url_str);
    }
    Ok(PathBuf::from(path))
}
