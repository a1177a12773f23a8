use anyhow::Result;

pub mod tty;
#[cfg(test)]
pub mod buffer;

// Anything that can hand the shell one raw line at a time.  Lines come
// back without their terminator; `None` means no more input.
pub trait Source {
    fn get_line(&mut self, prompt: &str) -> Result<Option<String>>;
}
