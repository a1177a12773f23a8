use anyhow::Result;
use tracing::debug;

use std::io;

use crate::config::Config;
use crate::process::{signal, Forker};
use crate::sources::tty::Tty;
use super::{Environment, Shell};

pub fn init() -> Result<Shell> {
    let config = Config::load()?;
    debug!(?config, "configured");

    signal::install()?;

    let smsh = Shell::build(
        Tty::build_source(config.max_line_length),
        Box::new(Forker::new()),
        Environment::new(),
        config,
        Box::new(io::stdout()),
    );

    Ok(smsh)
}
