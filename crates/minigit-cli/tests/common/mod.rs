//! Shared test harness for minigit-cli integration tests.
//!
//! Provides a binary runner and repo setup helpers. Author/committer
//! environment is fully pinned for deterministic object ids.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stdout_bytes: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok(&self) -> &Self {
        assert_eq!(
            self.exit_code, 0,
            "command failed\nstdout: {}\nstderr: {}",
            self.stdout, self.stderr
        );
        self
    }
}

/// Discover the path to the compiled `minigit` binary.
pub fn minigit_bin() -> PathBuf {
    let mut path = std::env::current_exe()
        .unwrap()
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    path.push("minigit");
    path
}

/// Apply the pinned environment variables to a `Command`.
fn pin_env(cmd: &mut Command) {
    cmd.env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("TZ", "UTC")
        .env("LC_ALL", "C")
        .env("LANG", "C");
}

/// Run the minigit binary in `dir` with the given arguments.
pub fn minigit(dir: &Path, args: &[&str]) -> CommandResult {
    let mut cmd = Command::new(minigit_bin());
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd);
    let output = cmd.output().expect("failed to run minigit");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stdout_bytes: output.stdout.clone(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Run minigit with piped stdin.
pub fn minigit_stdin(dir: &Path, args: &[&str], stdin_bytes: &[u8]) -> CommandResult {
    use std::io::Write;

    let mut cmd = Command::new(minigit_bin());
    cmd.args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    pin_env(&mut cmd);

    let mut child = cmd.spawn().expect("failed to spawn minigit");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin_bytes)
        .unwrap();
    let output = child.wait_with_output().expect("failed to run minigit");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stdout_bytes: output.stdout.clone(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

/// Create a temp dir with an initialized repository.
pub fn init_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    minigit(dir.path(), &["init", "--quiet"]).ok();
    dir
}
