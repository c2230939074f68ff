use std::fs;
use std::path::{Path, PathBuf};

use crate::RepoError;

/// Options for repository initialization.
pub struct InitOptions {
    pub bare: bool,
    pub default_branch: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            bare: false,
            default_branch: None,
        }
    }
}

/// Initialize a new git repository.
///
/// Creates the standard `.git/` structure:
/// - HEAD (pointing to the default branch)
/// - config
/// - objects/ (with info/ and pack/)
/// - refs/heads/, refs/tags/
/// - description
/// - info/exclude
///
/// Returns `(git_dir, work_tree)`.
pub(crate) fn init_repository(
    path: &Path,
    options: &InitOptions,
) -> Result<(PathBuf, Option<PathBuf>), RepoError> {
    let path = if path.is_relative() {
        std::env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };

    let (git_dir, work_tree) = if options.bare {
        (path.clone(), None)
    } else {
        (path.join(".git"), Some(path.clone()))
    };

    // Re-running init on an existing repo is a safe no-op; existing data is
    // never overwritten.
    if git_dir.join("HEAD").is_file() {
        return Ok((git_dir, work_tree));
    }

    fs::create_dir_all(&git_dir)?;
    fs::create_dir_all(git_dir.join("objects").join("info"))?;
    fs::create_dir_all(git_dir.join("objects").join("pack"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    fs::create_dir_all(git_dir.join("refs").join("tags"))?;
    fs::create_dir_all(git_dir.join("info"))?;

    let default_branch = options.default_branch.as_deref().unwrap_or("main");

    fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{default_branch}\n"),
    )?;

    let config_content = if options.bare {
        "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = true\n"
    } else {
        "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n\tlogallrefupdates = true\n"
    };
    fs::write(git_dir.join("config"), config_content)?;

    fs::write(
        git_dir.join("description"),
        "Unnamed repository; edit this file 'description' to name the repository.\n",
    )?;

    fs::write(
        git_dir.join("info").join("exclude"),
        "# git ls-files --others --exclude-from=.git/info/exclude\n# Lines that start with '#' are comments.\n",
    )?;

    Ok((git_dir, work_tree))
}
