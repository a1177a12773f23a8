// Redirection happens in two places.  Before forking, `validate` makes
// sure the named files can be opened at all, so a bad path is reported
// by the shell and nothing is spawned.  After forking, the child calls
// `redirect_stdin`/`redirect_stdout` to reopen them onto fds 0 and 1.

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2};

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::RawFd;

use crate::line::Command;

pub const DEV_NULL: &str = "/dev/null";

const STDIN_FILENO: RawFd = 0;
const STDOUT_FILENO: RawFd = 1;

#[derive(Debug)]
pub enum RedirectError {
    NotFound(String),
    CannotOpenInput(String),
    CannotOpenOutput(String),
    Other(String, io::Error),
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectError::NotFound(path) => write!(f, "{}: no such file or directory", path),
            RedirectError::CannotOpenInput(path) => write!(f, "{}: cannot open file for input", path),
            RedirectError::CannotOpenOutput(path) => write!(f, "{}: cannot open file for output", path),
            RedirectError::Other(path, e) => write!(f, "{}: {}", path, e),
        }
    }
}

impl std::error::Error for RedirectError {}

pub fn validate(command: &Command) -> Result<(), RedirectError> {
    if let Some(path) = command.input_path() {
        OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| classify(path, e, RedirectError::CannotOpenInput))?;
    }

    // Opened the way the child will see it: created if absent,
    // emptied if present.
    if let Some(path) = command.output_path() {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| classify(path, e, RedirectError::CannotOpenOutput))?;
    }

    Ok(())
}

fn classify(path: &str, e: io::Error, denied: fn(String) -> RedirectError) -> RedirectError {
    match e.kind() {
        io::ErrorKind::NotFound => RedirectError::NotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => denied(path.to_string()),
        _ => RedirectError::Other(path.to_string(), e),
    }
}

// Child side only
pub fn redirect_stdin(path: &str) -> nix::Result<()> {
    let fd = open(path, OFlag::O_RDONLY, Mode::empty())?;
    replace_fd(fd, STDIN_FILENO)
}

// Child side only
pub fn redirect_stdout(path: &str) -> nix::Result<()> {
    let fd = open(
        path,
        OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        Mode::from_bits_truncate(0o644),
    )?;
    replace_fd(fd, STDOUT_FILENO)
}

fn replace_fd(fd: RawFd, target: RawFd) -> nix::Result<()> {
    if fd != target {
        dup2(fd, target)?;
        close(fd)?;
    }

    Ok(())
}
