//! Line framing over arbitrary chunk boundaries.

/// Splits a chunked byte stream into lines.
///
/// Bytes are buffered until a `\n` arrives, so a line (or a multi-byte UTF-8
/// character) split across two network reads is reassembled before decoding.
/// A trailing `\r` is dropped from each line.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = &self.buffer[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Convenience wrapper around [`LineFramer::push`] for text chunks
    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.push(chunk.as_bytes())
    }

    /// Bytes of the incomplete trailing line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// End of stream.
    ///
    /// An unterminated final line is not emitted as a line. It is returned
    /// here so the caller can log or inspect what was dropped.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let leftover = String::from_utf8_lossy(&self.buffer).into_owned();
        tracing::debug!(bytes = self.buffer.len(), "discarding unterminated line at end of stream");
        Some(leftover)
    }
}
