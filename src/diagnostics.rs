//! Diagnostic channel for dropped content.
//!
//! Both filters report everything they remove (junk lines, matched bracket
//! spans, impure and degenerate lines) to a [`DiagnosticSink`] passed in by
//! the caller. The report is meant for human review and is never part of the
//! primary output.
//!
//! ```
//! use textsieve::diagnostics::Diagnostic;
//! use textsieve::{LineSanitizer, SanitizeOptions};
//!
//! let sanitizer = LineSanitizer::new(SanitizeOptions::default()).unwrap();
//! let mut dropped = Vec::new();
//! let mut sink = |d: &Diagnostic| dropped.push(d.content.clone());
//! let mut output: Vec<u8> = Vec::new();
//! sanitizer
//!     .sanitize_stream("<br>Hello World\n".as_bytes(), &mut output, &mut sink)
//!     .unwrap();
//! assert_eq!(output, b"Hello World\n");
//! assert_eq!(dropped, vec!["<br>".to_string()]);
//! ```

use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Why a piece of content was removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Short line starting with a markup character.
    JunkLine,
    /// `<...>` span matched within the lookahead window.
    BracketSpan,
    /// Line whose alphabetic ratio fell below the threshold.
    Impure { ratio: f64 },
    /// Line without any non-white character.
    Degenerate,
}

/// One removed piece of content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based line number in the stream being filtered.
    pub line_number: u64,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// The removed text, without line terminator.
    pub content: String,
}

impl Diagnostic {
    pub fn new(line_number: u64, kind: DiagnosticKind, content: impl Into<String>) -> Self {
        Self {
            line_number,
            kind,
            content: content.into(),
        }
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    /// Records one removed piece of content.
    fn report(&mut self, diagnostic: &Diagnostic) -> Result<()>;

    /// Pushes buffered diagnostics to their destination.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn report(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        self(diagnostic);
        Ok(())
    }
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: &Diagnostic) -> Result<()> {
        Ok(())
    }
}

/// Keeps diagnostics in memory, in the order they were reported.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub diagnostics: Vec<Diagnostic>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removed contents only.
    pub fn contents(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.content.as_str()).collect()
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        self.diagnostics.push(diagnostic.clone());
        Ok(())
    }
}

/// Line format used by [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticFormat {
    /// The removed content alone, one per line.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Writes diagnostics to any [`Write`] target.
pub struct WriterSink<W: Write> {
    writer: W,
    format: DiagnosticFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: DiagnosticFormat) -> Self {
        Self { writer, format }
    }

    pub fn plain(writer: W) -> Self {
        Self::new(writer, DiagnosticFormat::Plain)
    }

    pub fn json(writer: W) -> Self {
        Self::new(writer, DiagnosticFormat::Json)
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn report(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        match self.format {
            DiagnosticFormat::Plain => writeln!(self.writer, "{}", diagnostic.content)?,
            DiagnosticFormat::Json => {
                serde_json::to_writer(&mut self.writer, diagnostic)?;
                self.writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufWriter};

    /// Accepts nothing, like a full disk.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |d: &Diagnostic| seen.push(d.line_number);
            sink.report(&Diagnostic::new(3, DiagnosticKind::JunkLine, "!x"))
                .unwrap();
            sink.report(&Diagnostic::new(7, DiagnosticKind::Degenerate, " "))
                .unwrap();
        }
        assert_eq!(seen, vec![3, 7]);
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.report(&Diagnostic::new(1, DiagnosticKind::BracketSpan, "<a>"))
            .unwrap();
        sink.report(&Diagnostic::new(1, DiagnosticKind::BracketSpan, "<b>"))
            .unwrap();
        assert_eq!(sink.contents(), vec!["<a>", "<b>"]);
        assert_eq!(sink.into_inner().len(), 2);
    }

    #[test]
    fn test_plain_writer_sink() {
        let mut sink = WriterSink::plain(Vec::<u8>::new());
        sink.report(&Diagnostic::new(2, DiagnosticKind::JunkLine, "!width=28|"))
            .unwrap();
        let written = sink.into_inner().unwrap();
        assert_eq!(written, b"!width=28|\n");
    }

    #[test]
    fn test_json_writer_sink() {
        let mut sink = WriterSink::json(Vec::<u8>::new());
        sink.report(&Diagnostic::new(
            4,
            DiagnosticKind::Impure { ratio: 0.5 },
            "abc123",
        ))
        .unwrap();
        let written = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(written.trim_end()).unwrap();
        assert_eq!(value["line_number"], 4);
        assert_eq!(value["kind"], "impure");
        assert_eq!(value["ratio"], 0.5);
        assert_eq!(value["content"], "abc123");
    }

    #[test]
    fn test_null_sink() {
        let mut sink = NullSink;
        assert!(sink
            .report(&Diagnostic::new(1, DiagnosticKind::JunkLine, "#"))
            .is_ok());
    }

    #[test]
    fn test_writer_sink_flush_surfaces_write_errors() {
        let mut sink = WriterSink::plain(BufWriter::new(FullDisk));
        sink.report(&Diagnostic::new(1, DiagnosticKind::BracketSpan, "<br>"))
            .unwrap();
        assert!(matches!(sink.flush(), Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_default_flush_is_noop() {
        let mut sink = MemorySink::new();
        assert!(sink.flush().is_ok());
        assert!(NullSink.flush().is_ok());
    }
}
