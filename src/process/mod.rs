use anyhow::Result;
use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::{execvp, fork, getpgrp, ForkResult, Pid};
use tracing::{debug, warn};

use std::ffi::CString;
use std::fmt;
use std::io::{self, Write};

use crate::line::Command;

mod outcome;
pub use outcome::ProcessOutcome;
pub mod redirect;
use redirect::{redirect_stdin, redirect_stdout, DEV_NULL};
pub mod signal;

// Everything the shell needs from the operating system to run an
// external command.
pub trait Launcher {
    // Runs `command` and blocks until it terminates
    fn foreground(&mut self, command: &Command) -> Result<ProcessOutcome>;

    // Starts `command` without waiting for it
    fn background(&mut self, command: &Command) -> Result<Pid>;

    // Collects every background child that has finished since the last
    // call.  Never blocks.
    fn reap(&mut self) -> Result<Vec<(Pid, ProcessOutcome)>>;

    // Kills every child the shell has started
    fn terminate_all(&mut self) -> Result<()>;
}

// fork() failing leaves the shell unable to do its job; main() exits
// when it sees this.
#[derive(Debug)]
pub struct ForkFailed(pub nix::Error);

impl fmt::Display for ForkFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fork: {}", self.0.desc())
    }
}

impl std::error::Error for ForkFailed {}

#[derive(Default)]
pub struct Forker {
    children: Vec<Pid>,         // Outstanding background children
    finished: Vec<(Pid, ProcessOutcome)>,
}

impl Forker {
    pub fn new() -> Self {
        Forker::default()
    }

    fn spawn(&mut self, command: &Command) -> Result<Pid> {
        // Built before forking so a bad argument never reaches the child
        let argv = command.argv()?;

        // Anything buffered would otherwise be written twice
        io::stdout().flush()?;

        match unsafe { fork() } {
            Ok(ForkResult::Parent { child, .. }) => {
                debug!(pid = child.as_raw(), program = command.program(),
                       background = command.is_background(), "spawned");
                Ok(child)
            }
            Ok(ForkResult::Child) => exec_child(command, &argv),
            Err(e) => Err(ForkFailed(e).into()),
        }
    }

    // Non-blocking.  A child that already finished is remembered so the
    // next reap() reports it.
    fn check(&mut self, pid: Pid) -> Result<()> {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => {
                if let Some(outcome) = ProcessOutcome::from_wait_status(status) {
                    self.children.retain(|&child| child != pid);
                    self.finished.push((pid, outcome));
                }
                Ok(())
            }
            Err(Errno::ECHILD) => {
                warn!(pid = pid.as_raw(), "background child vanished");
                self.children.retain(|&child| child != pid);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Launcher for Forker {
    fn foreground(&mut self, command: &Command) -> Result<ProcessOutcome> {
        let pid = self.spawn(command)?;

        wait_for(pid)
    }

    fn background(&mut self, command: &Command) -> Result<Pid> {
        let pid = self.spawn(command)?;

        self.children.push(pid);
        self.check(pid)?;

        Ok(pid)
    }

    fn reap(&mut self) -> Result<Vec<(Pid, ProcessOutcome)>> {
        for pid in self.children.clone() {
            self.check(pid)?;
        }

        for (pid, outcome) in &self.finished {
            debug!(pid = pid.as_raw(), %outcome, "reaped");
        }

        Ok(std::mem::take(&mut self.finished))
    }

    fn terminate_all(&mut self) -> Result<()> {
        for pid in self.children.drain(..) {
            match kill(pid, Signal::SIGTERM) {
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(e) => warn!(pid = pid.as_raw(), error = %e, "kill failed"),
            }
        }

        // Then everything else left in our process group, sparing ourselves
        signal::ignore(Signal::SIGTERM)?;
        killpg(getpgrp(), Signal::SIGTERM)?;

        Ok(())
    }
}

// Blocks until `pid` terminates.  Stops are not terminations.
fn wait_for(pid: Pid) -> Result<ProcessOutcome> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(outcome) = ProcessOutcome::from_wait_status(status) {
                    debug!(pid = pid.as_raw(), %outcome, "foreground finished");
                    return Ok(outcome);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

// Runs in the child.  Only returns by exiting.
fn exec_child(command: &Command, argv: &[CString]) -> ! {
    let err = match prepare_child(command) {
        Ok(()) => match execvp(&argv[0], argv) {
            Ok(never) => match never {},
            Err(e) => e,
        },
        Err(e) => e,
    };

    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{}: {}", command.program(), err.desc());
    let _ = stdout.flush();

    std::process::exit(1);
}

fn prepare_child(command: &Command) -> nix::Result<()> {
    if command.is_background() {
        signal::ignore(Signal::SIGINT)?;
        redirect_stdin(command.input_path().unwrap_or(DEV_NULL))?;
        redirect_stdout(command.output_path().unwrap_or(DEV_NULL))?;
    } else {
        if let Some(path) = command.input_path() {
            redirect_stdin(path)?;
        }
        if let Some(path) = command.output_path() {
            redirect_stdout(path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::line::parse;
    use pretty_assertions::assert_eq;

    use std::fs;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    fn command(line: &str) -> Command {
        parse(line, &Config::default()).unwrap()
    }

    #[test]
    fn foreground_exit_codes() {
        let mut forker = Forker::new();

        assert_eq!(forker.foreground(&command("true")).unwrap(), ProcessOutcome::Exited(0));
        assert_eq!(forker.foreground(&command("false")).unwrap(), ProcessOutcome::Exited(1));
    }

    #[test]
    fn foreground_signal() {
        let mut forker = Forker::new();

        let outcome = forker.foreground(&command("sh -c kill${IFS}-9${IFS}$$")).unwrap();

        assert_eq!(outcome, ProcessOutcome::Signaled(9));
    }

    #[test]
    fn missing_program_exits_non_zero() {
        let mut forker = Forker::new();

        let outcome = forker
            .foreground(&command("smallsh-test-no-such-program"))
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::Exited(1));
    }

    #[test]
    fn foreground_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::write(&input, "b\na\n").unwrap();

        let cmd = command(&format!("sort < {} > {}", input.display(), output.display()));
        redirect::validate(&cmd).unwrap();

        let outcome = Forker::new().foreground(&cmd).unwrap();

        assert_eq!(outcome, ProcessOutcome::Exited(0));
        assert_eq!(fs::read_to_string(&output).unwrap(), "a\nb\n");
    }

    fn reap_until_done(forker: &mut Forker) -> Vec<(Pid, ProcessOutcome)> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut reaped = Vec::new();
        while reaped.is_empty() && Instant::now() < deadline {
            reaped = forker.reap().unwrap();
            sleep(Duration::from_millis(20));
        }
        reaped
    }

    #[test]
    fn background_is_reaped_once() {
        let mut forker = Forker::new();

        let pid = forker.background(&command("sleep 0.1 &")).unwrap();

        assert_eq!(reap_until_done(&mut forker), vec![(pid, ProcessOutcome::Exited(0))]);
        assert!(forker.reap().unwrap().is_empty());
    }

    #[test]
    fn background_stdout_goes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");

        let mut forker = Forker::new();
        let cmd = command(&format!("echo hello > {} &", output.display()));
        redirect::validate(&cmd).unwrap();
        let pid = forker.background(&cmd).unwrap();

        assert_eq!(reap_until_done(&mut forker), vec![(pid, ProcessOutcome::Exited(0))]);
        assert_eq!(fs::read_to_string(&output).unwrap(), "hello\n");
    }

    #[test]
    fn background_stdin_is_empty() {
        let mut forker = Forker::new();

        // cat reading the terminal would never finish
        let pid = forker.background(&command("cat &")).unwrap();

        assert_eq!(reap_until_done(&mut forker), vec![(pid, ProcessOutcome::Exited(0))]);
    }
}
