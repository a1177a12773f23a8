mod config;
mod line;
mod process;
mod shell;
mod sources;

use process::ForkFailed;
use shell::Shell;
use tracing_subscriber::EnvFilter;

use std::io::{self, ErrorKind, Write};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SMALLSH_LOG"))
        .with_writer(io::stderr)
        .init();

    let mut smsh = match Shell::new() {
        Ok(smsh) => smsh,
        Err(e) => {
            report(&e);
            std::process::exit(1);
        }
    };

    while let Err(e) = smsh.run() {
        report(&e);

        if is_fatal(&e) {
            let _ = smsh.exit();
            std::process::exit(1);
        }
    }

    std::process::exit(0);
}

// stdout may be the thing that failed
fn report(e: &anyhow::Error) {
    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "smallsh: {:#}", e);
    let _ = stdout.flush();
}

// Without fork() or a place to write, another trip round the loop
// would fail the same way.
fn is_fatal(e: &anyhow::Error) -> bool {
    e.is::<ForkFailed>()
        || e.chain().any(|cause| {
            cause
                .downcast_ref::<io::Error>()
                .map_or(false, |io_err| io_err.kind() == ErrorKind::BrokenPipe)
        })
}
