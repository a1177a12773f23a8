use anyhow::Result;

use std::collections::VecDeque;

use super::Source;

// Serves a fixed list of lines, then EOF
pub struct BufferSource {
    lines: VecDeque<String>,
}

impl BufferSource {
    pub fn build_source(lines: Vec<&str>) -> Box<dyn Source> {
        Box::new(BufferSource {
            lines: lines.into_iter().map(String::from).collect(),
        })
    }
}

impl Source for BufferSource {
    fn get_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
