use anyhow::{Context, Result};
use tracing::{trace, warn};

use std::io::{self, BufRead, Read, Stdin, Write};

use super::Source;

// Plain stdin reader.  No editing, no history.
pub struct Tty {
    stdin: Stdin,
    line_num: usize,
    // Bytes kept per line: the longest accepted line plus "\r\n"
    read_limit: usize,
}

impl Tty {
    pub fn build_source(max_line_length: usize) -> Box<dyn Source> {
        let stdin = io::stdin();

        Box::new(Tty {
            stdin,
            line_num: 0,
            read_limit: max_line_length.saturating_add(2),
        })
    }
}

impl Source for Tty {
    fn get_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let bytes = match read_capped(&mut self.stdin.lock(), self.read_limit) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None), // EOF was found
            Err(e) => {
                // Retrying would only fail the same way
                warn!(error = %e, "cannot read standard input, treating as EOF");
                return Ok(None);
            }
        };

        self.line_num += 1;
        trace!(line_num = self.line_num, bytes = bytes.len(), "read line");

        // A cut-off line may end mid-character; it is rejected for its
        // length anyway.
        let buffer = if bytes.len() >= self.read_limit {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::from_utf8(bytes)
                .with_context(|| format!("line {}: input is not valid UTF-8", self.line_num))?
        };

        Ok(Some(strip_terminator(buffer)))
    }
}

// Reads one line, keeping at most `limit` bytes of it.  What is left of a
// longer line is consumed and dropped.
fn read_capped<R: BufRead>(reader: &mut R, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();

    let num_bytes_read = reader
        .by_ref()
        .take(limit as u64)
        .read_until(b'\n', &mut bytes)?;

    if num_bytes_read == 0 {
        return Ok(None);
    }

    if num_bytes_read >= limit && !bytes.ends_with(b"\n") {
        skip_line(reader)?;
    }

    Ok(Some(bytes))
}

fn skip_line<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let (found, used) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, buf.len()),
            }
        };

        reader.consume(used);

        if found {
            return Ok(());
        }
    }
}

fn strip_terminator(mut buffer: String) -> String {
    while buffer.ends_with('\n') || buffer.ends_with('\r') {
        buffer.pop();
    }

    buffer
}
