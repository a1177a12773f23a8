use nix::sys::wait::WaitStatus;

use std::fmt;

// How an external command ended
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProcessOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ProcessOutcome {
    // None for statuses that are not terminations (stopped, still alive, ...)
    pub fn from_wait_status(status: WaitStatus) -> Option<ProcessOutcome> {
        match status {
            WaitStatus::Exited(_, code) => Some(ProcessOutcome::Exited(code)),
            WaitStatus::Signaled(_, signal, _) => Some(ProcessOutcome::Signaled(signal as i32)),
            _ => None,
        }
    }

    pub fn is_signaled(&self) -> bool {
        matches!(self, ProcessOutcome::Signaled(_))
    }
}

impl Default for ProcessOutcome {
    fn default() -> Self {
        ProcessOutcome::Exited(0)
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessOutcome::Exited(code) => write!(f, "exit value {}", code),
            ProcessOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}
