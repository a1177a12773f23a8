use nix::sys::signal::Signal;

use crate::process::ProcessOutcome;

#[derive(Debug, Default)]
pub struct State {
    // Set (reset) by every foreground external command.
    // Built-ins do not affect this.
    pub last_status: ProcessOutcome,

    // Copied out of the signal slot at the top of each loop iteration
    pub pending_interrupt: Option<Signal>,

    exit_requested: bool,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}
