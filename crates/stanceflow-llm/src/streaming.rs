/// Incremental NDJSON line splitter.
///
/// Ollama's chat endpoint streams one JSON object per line; HTTP chunk
/// boundaries fall anywhere, so lines are buffered until their newline
/// arrives.
#[derive(Default)]
pub struct NdjsonParser {
    buffer: String,
}

impl NdjsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and extract complete lines.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim().to_string();
            self.buffer = self.buffer[pos + 1..].to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }

        lines
    }

    /// Drain whatever is left in the buffer after the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.buffer.trim().to_string();
        self.buffer.clear();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut parser = NdjsonParser::new();
        let lines = parser.feed("{\"message\":{\"content\":\"hi\"}}\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], "{\"message\":{\"content\":\"hi\"}}");
    }

    #[test]
    fn test_chunked_line() {
        let mut parser = NdjsonParser::new();
        assert!(parser.feed("{\"message\":{\"conte").is_empty());
        let lines = parser.feed("nt\":\"hi\"}}\n{\"done\":true}\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "{\"done\":true}");
    }

    #[test]
    fn test_finish_drains_trailing_line() {
        let mut parser = NdjsonParser::new();
        assert!(parser.feed("{\"done\":true}").is_empty());
        assert_eq!(parser.finish().as_deref(), Some("{\"done\":true}"));
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut parser = NdjsonParser::new();
        let lines = parser.feed("\n\n{\"a\":1}\n\n");
        assert_eq!(lines.len(), 1);
    }
}
