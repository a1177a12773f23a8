use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};
use xdg::BaseDirectories;

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

const MAX_ARGUMENTS: usize = 512;
const MAX_LINE_LENGTH: usize = 2048;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    // Upper bound on argv entries, program included
    pub max_arguments: usize,
    // Upper bound on the length of one input line, in bytes
    pub max_line_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_arguments: MAX_ARGUMENTS,
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

impl Config {
    // Reads `$XDG_CONFIG_HOME/smallsh/config` (or the first match in
    // $XDG_CONFIG_DIRS).  No file means defaults.
    pub fn load() -> Result<Config> {
        match find_config_file() {
            Some(path) => Config::from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        debug!(path = %path.display(), "loading config");

        let text = read_to_string(path)
            .with_context(|| format!("{}: cannot read config", path.display()))?;

        Config::parse_text(&text)
            .with_context(|| format!("{}: invalid config", path.display()))
    }

    fn parse_text(text: &str) -> Result<Config> {
        let mut config = Config::default();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, val) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("line {}: expected `key = value`", i + 1))?;

            match key.trim() {
                "max_arguments" => config.max_arguments = parse_bound(val, i)?,
                "max_line_length" => config.max_line_length = parse_bound(val, i)?,
                other => warn!(key = other, line = i + 1, "ignoring unknown config key"),
            }
        }

        Ok(config)
    }
}

// Without a usable home directory there is nowhere to look
fn find_config_file() -> Option<PathBuf> {
    match BaseDirectories::new() {
        Ok(base_dirs) => base_dirs.find_config_file(PathBuf::from("smallsh/config")),
        Err(e) => {
            warn!(error = %e, "no XDG base directories, using default config");
            None
        }
    }
}

fn parse_bound(val: &str, i: usize) -> Result<usize> {
    let n: usize = val
        .trim()
        .parse()
        .with_context(|| format!("line {}: `{}` is not a number", i + 1, val.trim()))?;

    if n == 0 {
        Err(anyhow!("line {}: bound must be greater than zero", i + 1))
    } else {
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    use std::io::Write;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(Config::parse_text("").unwrap(), Config::default());
    }

    #[test]
    fn keys_override_defaults() {
        let text = "# limits\nmax_arguments = 16\n\n  max_line_length=80  \n";

        let config = Config::parse_text(text).unwrap();

        assert_eq!(config, Config { max_arguments: 16, max_line_length: 80 });
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let config = Config::parse_text("prompt = $\nmax_arguments = 4").unwrap();

        assert_eq!(config.max_arguments, 4);
        assert_eq!(config.max_line_length, MAX_LINE_LENGTH);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(Config::parse_text("max_arguments = many").is_err());
        assert!(Config::parse_text("max_arguments = 0").is_err());
        assert!(Config::parse_text("max_arguments").is_err());
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_line_length = 10").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.max_line_length, 10);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(Config::from_file(&dir.path().join("nope")).is_err());
    }
}
