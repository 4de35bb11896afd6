//! Batched, newline-delimited line input.

use crate::error::Result;
use std::io::BufRead;

/// One input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based position in the stream.
    pub number: u64,
    /// Decoded content without terminator. Invalid UTF-8 becomes U+FFFD.
    pub text: String,
    /// Raw bytes as read, terminator included.
    pub raw: Vec<u8>,
}

/// Reads lines from a [`BufRead`] in fixed-size batches.
pub struct LineReader<R> {
    reader: R,
    next_number: u64,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            next_number: 1,
        }
    }

    /// Reads a single line, or `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<Line>> {
        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(strip_terminator(&raw)).into_owned();
        let line = Line {
            number: self.next_number,
            text,
            raw,
        };
        self.next_number += 1;
        Ok(Some(line))
    }

    /// Clears `batch` and refills it with up to `size` lines.
    ///
    /// Returns false once the input is exhausted and nothing was read.
    pub fn read_batch(&mut self, batch: &mut Vec<Line>, size: usize) -> Result<bool> {
        batch.clear();
        while batch.len() < size {
            match self.read_line()? {
                Some(line) => batch.push(line),
                None => break,
            }
        }
        Ok(!batch.is_empty())
    }
}

/// Strips a trailing `\n` or `\r\n`.
pub fn strip_terminator(raw: &[u8]) -> &[u8] {
    match raw.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator(b"abc\n"), b"abc");
        assert_eq!(strip_terminator(b"abc\r\n"), b"abc");
        assert_eq!(strip_terminator(b"abc"), b"abc");
        assert_eq!(strip_terminator(b"\n"), b"");
        assert_eq!(strip_terminator(b""), b"");
    }

    #[test]
    fn test_read_batches() {
        let input = "one\ntwo\nthree\nfour\nfive";
        let mut reader = LineReader::new(input.as_bytes());
        let mut batch = Vec::new();

        assert!(reader.read_batch(&mut batch, 2).unwrap());
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].number, 1);
        assert_eq!(batch[1].text, "two");

        assert!(reader.read_batch(&mut batch, 2).unwrap());
        assert_eq!(batch[0].number, 3);

        assert!(reader.read_batch(&mut batch, 2).unwrap());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].text, "five");
        assert_eq!(batch[0].raw, b"five");

        assert!(!reader.read_batch(&mut batch, 2).unwrap());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_keeps_raw_terminator() {
        let mut reader = LineReader::new("a b\r\n".as_bytes());
        let line = reader.read_line().unwrap().unwrap();
        assert_eq!(line.text, "a b");
        assert_eq!(line.raw, b"a b\r\n");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut reader = LineReader::new(&b"ab\xffcd\n"[..]);
        let line = reader.read_line().unwrap().unwrap();
        assert_eq!(line.text, "ab\u{FFFD}cd");
        assert_eq!(line.raw, b"ab\xffcd\n");
    }
}
