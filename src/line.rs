//! Line buffer for a byte stream.
//!
//! Bytes from the socket are appended as they arrive, CRLF pairs are folded
//! into a single `\n` on the way in, and whole lines are handed out one at a
//! time. With the `encoding` feature the wire charset is chosen by label;
//! otherwise lines are decoded as (lossy) UTF-8.

#[cfg(feature = "encoding")]
use encoding::Encoding;

use crate::error;

/// Accumulates received bytes and splits them into lines.
#[derive(Debug)]
pub struct LineBuffer {
    #[cfg(feature = "encoding")]
    encoding: &'static Encoding,
    buffer: Vec<u8>,
    /// Index of next byte to check for newline
    next_index: usize,
}

impl LineBuffer {
    /// Create an empty buffer for the given encoding label (e.g. `"utf-8"`).
    pub fn new(_label: &str) -> error::Result<Self> {
        Ok(Self {
            #[cfg(feature = "encoding")]
            encoding: match Encoding::for_label(_label.as_bytes()) {
                Some(enc) => enc,
                None => return Err(error::ProtocolError::UnknownEncoding(_label.to_owned())),
            },
            buffer: Vec::new(),
            next_index: 0,
        })
    }

    /// Append received bytes, folding `\r\n` into `\n`.
    ///
    /// A CR at the end of the previous chunk still pairs with an LF at the
    /// start of this one.
    pub fn extend(&mut self, chunk: &[u8]) {
        let start = self.buffer.len().saturating_sub(1);
        self.buffer.extend_from_slice(chunk);

        let len = self.buffer.len();
        let mut write = start;
        let mut read = start;
        while read < len {
            if self.buffer[read] == b'\r' && read + 1 < len && self.buffer[read + 1] == b'\n' {
                read += 1;
                continue;
            }
            self.buffer[write] = self.buffer[read];
            write += 1;
            read += 1;
        }
        self.buffer.truncate(write);
        self.next_index = self.next_index.min(start);
    }

    /// True when at least one complete line is buffered.
    pub fn has_line(&mut self) -> bool {
        self.find_newline().is_some()
    }

    /// Remove and return the next complete line, without its `\n`.
    pub fn take_line(&mut self) -> Option<String> {
        let offset = self.find_newline()?;
        let line: Vec<u8> = self.buffer.drain(..=offset).collect();
        self.next_index = 0;
        Some(self.decode_bytes(&line[..offset]))
    }

    /// Remove and return whatever is buffered, complete line or not.
    ///
    /// Returns `None` when the buffer is empty.
    pub fn take_rest(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.next_index = 0;
        Some(self.decode_bytes(&rest))
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Convert an outbound line to wire bytes.
    pub fn encode_line(&self, line: &str) -> Vec<u8> {
        #[cfg(feature = "encoding")]
        {
            let (bytes, _enc, _had_errors) = self.encoding.encode(line);
            bytes.into_owned()
        }

        #[cfg(not(feature = "encoding"))]
        {
            line.as_bytes().to_vec()
        }
    }

    fn find_newline(&mut self) -> Option<usize> {
        match self.buffer[self.next_index..].iter().position(|b| *b == b'\n') {
            Some(offset) => Some(self.next_index + offset),
            None => {
                self.next_index = self.buffer.len();
                None
            }
        }
    }

    fn decode_bytes(&self, bytes: &[u8]) -> String {
        #[cfg(feature = "encoding")]
        {
            let (text, _enc, _had_errors) = self.encoding.decode(bytes);
            text.into_owned()
        }

        #[cfg(not(feature = "encoding"))]
        {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> LineBuffer {
        LineBuffer::new("utf-8").unwrap()
    }

    #[test]
    fn test_crlf_folded() {
        let mut buf = buffer();
        buf.extend(b"PING :a\r\nPING :b\r\n");
        assert_eq!(buf.take_line().as_deref(), Some("PING :a"));
        assert_eq!(buf.take_line().as_deref(), Some("PING :b"));
        assert_eq!(buf.take_line(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut buf = buffer();
        buf.extend(b"PING :a\r");
        assert!(!buf.has_line());
        buf.extend(b"\nPI");
        assert_eq!(buf.take_line().as_deref(), Some("PING :a"));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut buf = buffer();
        buf.extend(b"PRIVMSG #c :hel");
        assert_eq!(buf.take_line(), None);
        buf.extend(b"lo\nNEXT");
        assert_eq!(buf.take_line().as_deref(), Some("PRIVMSG #c :hello"));
        assert_eq!(buf.take_rest().as_deref(), Some("NEXT"));
        assert_eq!(buf.take_rest(), None);
    }

    #[test]
    fn test_bare_lf_accepted() {
        let mut buf = buffer();
        buf.extend(b"a\nb\n");
        assert_eq!(buf.take_line().as_deref(), Some("a"));
        assert_eq!(buf.take_line().as_deref(), Some("b"));
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut buf = buffer();
        buf.extend(b"caf\xc3\xa9 \xff\n");
        let line = buf.take_line().unwrap();
        assert!(line.starts_with("café "));
    }

    #[test]
    fn test_encode_line() {
        let buf = buffer();
        assert_eq!(buf.encode_line("NICK :bot\r\n"), b"NICK :bot\r\n".to_vec());
    }
}
