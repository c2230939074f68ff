pub mod cat_file;
pub mod clone;
pub mod commit_tree;
pub mod hash_object;
pub mod init;
pub mod ls_tree;
pub mod write_tree;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty Git repository or reinitialize an existing one
    Init(init::InitArgs),
    /// Provide contents or type and size information for repository objects
    CatFile(cat_file::CatFileArgs),
    /// Compute object ID and optionally create a blob from a file
    HashObject(hash_object::HashObjectArgs),
    /// List the contents of a tree object
    LsTree(ls_tree::LsTreeArgs),
    /// Create a tree object from the current working directory
    WriteTree(write_tree::WriteTreeArgs),
    /// Create a new commit object
    CommitTree(commit_tree::CommitTreeArgs),
    /// Clone a repository into a new directory
    Clone(clone::CloneArgs),
}

/// Open a repository, respecting --git-dir override.
pub fn open_repo(cli: &Cli) -> Result<minigit_repository::Repository> {
    let repo = if let Some(ref git_dir) = cli.git_dir {
        minigit_repository::Repository::open(git_dir)?
    } else {
        minigit_repository::Repository::discover(".")?
    };
    Ok(repo)
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args, &cli),
        Commands::CatFile(args) => cat_file::run(args, &cli),
        Commands::HashObject(args) => hash_object::run(args, &cli),
        Commands::LsTree(args) => ls_tree::run(args, &cli),
        Commands::WriteTree(args) => write_tree::run(args, &cli),
        Commands::CommitTree(args) => commit_tree::run(args, &cli),
        Commands::Clone(args) => clone::run(args, &cli),
    }
}
