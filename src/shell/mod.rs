use crate::config::Config;
use crate::line::{self, Command};
use crate::process::{redirect, signal, Launcher};
use crate::sources::Source;
use anyhow::Result;
use nix::sys::signal::Signal;
use tracing::debug;

use std::collections::HashMap;
use std::fmt::Display;
use std::io::Write;

mod env;
pub use env::Environment;
mod modules;
use modules::*;
mod init;
use init::init;
mod state;
use state::State;

const PROMPT: &str = ": ";

pub struct Shell {
    source: Box<dyn Source>,
    launcher: Box<dyn Launcher>,
    builtins: HashMap<&'static str, Builtin>,
    env: Environment,
    config: Config,
    state: State,
    out: Box<dyn Write>,
    interrupts: fn() -> Option<Signal>,
}

impl Shell {
    pub fn new() -> Result<Shell> {
        init()
    }

    pub fn build(
        source: Box<dyn Source>,
        launcher: Box<dyn Launcher>,
        env: Environment,
        config: Config,
        out: Box<dyn Write>,
    ) -> Shell {
        let mut smsh = Shell {
            source,
            launcher,
            builtins: HashMap::<&'static str, Builtin>::new(),
            env,
            config,
            state: State::new(),
            out,
            interrupts: signal::take_pending,
        };

        load_module(&mut smsh, Module::Core);

        smsh
    }

    // Returns Ok once `exit` has run or input is exhausted.  An Err
    // leaves the shell in a state where run() can simply be called again.
    pub fn run(&mut self) -> Result<()> {
        while !self.state.exit_requested() {
            self.drain_interrupt();
            self.report_background()?;

            match self.source.get_line(PROMPT)? {
                Some(rawline) => self.execute_line(&rawline)?,
                None => self.exit()?,
            }
        }

        Ok(())
    }

    fn execute_line(&mut self, rawline: &str) -> Result<()> {
        let command = match line::parse(rawline, &self.config) {
            Ok(command) => command,
            Err(rejection) => {
                debug!(%rejection, "line rejected");
                return Ok(());
            }
        };

        if let Err(e) = redirect::validate(&command) {
            return self.print(e);
        }

        if let Some(builtin) = self.get_builtin(command.program()).copied() {
            builtin(self, &command)
        } else if command.is_background() {
            self.run_background(&command)
        } else {
            self.run_foreground(&command)
        }
    }

    fn run_foreground(&mut self, command: &Command) -> Result<()> {
        self.out.flush()?;

        let outcome = self.launcher.foreground(command)?;
        self.state.last_status = outcome;

        if outcome.is_signaled() {
            self.print(outcome)?;
        }

        Ok(())
    }

    fn run_background(&mut self, command: &Command) -> Result<()> {
        self.out.flush()?;

        let pid = self.launcher.background(command)?;

        self.print(format!("background pid is {}", pid))
    }

    // Every finished background child is announced before the prompt
    fn report_background(&mut self) -> Result<()> {
        for (pid, outcome) in self.launcher.reap()? {
            self.print(format!("background pid {} is done: {}", pid, outcome))?;
        }

        Ok(())
    }

    // The shell itself is immune to SIGINT; a foreground child killed
    // by it has already been reported through its outcome.  So all
    // that's left is to clear the record.
    fn drain_interrupt(&mut self) {
        if let Some(signal) = (self.interrupts)() {
            self.state.pending_interrupt = Some(signal);
        }

        if let Some(signal) = self.state.pending_interrupt.take() {
            debug!(?signal, "interrupt cleared");
        }
    }

    // Kills every child and stops the loop.  Called by `exit` and on EOF.
    pub fn exit(&mut self) -> Result<()> {
        self.state.request_exit();
        self.out.flush()?;
        self.launcher.terminate_all()
    }

    pub fn get_builtin(&self, command: &str) -> Option<&Builtin> {
        self.builtins.get(command)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    // User-visible text goes to stdout, flushed so it lands before the
    // next prompt.
    pub fn print<T: Display>(&mut self, text: T) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}
