// The interrupt handler does exactly one thing: store the signal number
// in a single slot.  Everything else (deciding whether to report it,
// clearing it) happens in the main loop through `take_pending`.

use anyhow::Result;
use nix::libc::c_int;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use std::sync::atomic::{AtomicI32, Ordering};

const EMPTY: i32 = 0;

static PENDING: AtomicI32 = AtomicI32::new(EMPTY);

extern "C" fn record_signal(signum: c_int) {
    PENDING.store(signum, Ordering::SeqCst);
}

// SA_RESTART keeps an interrupted read or waitpid going instead of
// failing with EINTR.  Children get the default disposition back when
// they exec.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(record_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    unsafe { sigaction(Signal::SIGINT, &action)? };

    Ok(())
}

// Drains the slot
pub fn take_pending() -> Option<Signal> {
    match PENDING.swap(EMPTY, Ordering::SeqCst) {
        EMPTY => None,
        signum => Signal::try_from(signum).ok(),
    }
}

// Background children ignore SIGINT so a terminal interrupt only
// reaches the foreground command.  The shell ignores SIGTERM before
// signalling its own process group on exit.
pub fn ignore(signal: Signal) -> nix::Result<()> {
    unsafe { nix::sys::signal::signal(signal, SigHandler::SigIgn)? };

    Ok(())
}
