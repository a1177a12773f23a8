use crate::line::Command;
use crate::shell::Shell;

use anyhow::Result;
use nix::unistd;
use tracing::debug;

use std::path::PathBuf;

// `cd` with no argument goes to $HOME.  Extra arguments are ignored.
pub fn chdir(smsh: &mut Shell, command: &Command) -> Result<()> {
    let dir = match command.arguments().first() {
        Some(dir) => PathBuf::from(dir),
        None => match smsh.env().get_var("HOME") {
            Some(home) => PathBuf::from(home),
            None => {
                smsh.print("cd: HOME not set")?;
                return Ok(());
            }
        },
    };

    match unistd::chdir(dir.as_path()) {
        Ok(()) => {
            debug!(dir = %dir.display(), "changed directory");
            Ok(())
        }
        Err(e) => smsh.print(format!("cd: {}: {}", dir.display(), e.desc())),
    }
}

pub fn exit(smsh: &mut Shell, _command: &Command) -> Result<()> {
    smsh.exit()
}

pub fn status(smsh: &mut Shell, _command: &Command) -> Result<()> {
    let status = smsh.state().last_status;
    smsh.print(status)
}
