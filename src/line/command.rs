use anyhow::{Context, Result};

use std::ffi::CString;

// One parsed request.  Built once per input line by `Line::parse`
// and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Command {
    program: String,
    arguments: Vec<String>,
    input_path: Option<String>,
    output_path: Option<String>,
    background: bool,
}

impl Command {
    pub fn new(program: String) -> Self {
        Command {
            program,
            arguments: Vec::<String>::new(),
            input_path: None,
            output_path: None,
            background: false,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn input_path(&self) -> Option<&str> {
        self.input_path.as_deref()
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output_path.as_deref()
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    // Program first, then each argument in order.  The trailing NULL
    // execvp() wants is added by nix.
    pub fn argv(&self) -> Result<Vec<CString>> {
        let mut argv = Vec::<CString>::with_capacity(self.arguments.len() + 1);

        argv.push(CString::new(self.program.as_str())
            .with_context(|| format!("{}: invalid program name", self.program))?);

        for arg in &self.arguments {
            argv.push(CString::new(arg.as_str())
                .with_context(|| format!("{}: invalid argument", self.program))?);
        }

        Ok(argv)
    }

    pub(super) fn push_arg(&mut self, arg: String) {
        self.arguments.push(arg);
    }

    pub(super) fn set_input_path(&mut self, path: String) {
        self.input_path = Some(path);
    }

    pub(super) fn set_output_path(&mut self, path: String) {
        self.output_path = Some(path);
    }

    pub(super) fn set_background(&mut self) {
        self.background = true;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn argv_starts_with_program() {
        let mut cmd = Command::new("ls".to_string());
        cmd.push_arg("-l".to_string());
        cmd.push_arg("/tmp".to_string());

        let argv = cmd.argv().unwrap();

        assert_eq!(
            argv,
            vec![
                CString::new("ls").unwrap(),
                CString::new("-l").unwrap(),
                CString::new("/tmp").unwrap(),
            ]
        );
    }

    #[test]
    fn argv_rejects_interior_nul() {
        let mut cmd = Command::new("echo".to_string());
        cmd.push_arg("a\0b".to_string());

        assert!(cmd.argv().is_err());
    }
}
