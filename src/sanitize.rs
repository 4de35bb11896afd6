//! # Line Sanitizer
//!
//! First filtering pass, run on raw extracted text before tokenization.
//!
//! ## Stages
//!
//! Each line goes through three stages in order, and a stage only sees lines
//! that survived the previous one:
//!
//! 1. **Empty lines** - dropped silently
//! 2. **Junk lines** - short lines starting with `|`, `#`, `!` or `[[`
//!    (table rows, wiki markup like `!width=28|`) are dropped and reported
//! 3. **Character scan** - non-ASCII characters are removed, `<...>` spans
//!    closed within the lookahead window are removed and reported
//!
//! Every surviving line is written with a `\n` terminator.

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::Result;
use crate::lines::{Line, LineReader};
use crate::options::SanitizeOptions;
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufRead, Write};

/// Prefixes marking a line as a junk candidate.
pub const JUNK_STARTERS: [&str; 4] = ["|", "#", "!", "[["];

/// Result of the character scan on one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    /// Text left after removal.
    pub text: String,
    /// Removed `<...>` spans, in order.
    pub spans: Vec<String>,
    /// Number of non-ASCII characters removed.
    pub non_ascii: usize,
}

/// Decision for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    /// Nothing to emit, nothing to report.
    Empty,
    /// Dropped as junk; the whole line is reported.
    Junk,
    /// Emitted after the character scan.
    Kept(ScanResult),
}

/// Counters for one sanitizer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SanitizeStats {
    pub lines_read: u64,
    pub empty_lines: u64,
    pub junk_lines: u64,
    pub lines_written: u64,
    pub bracket_spans: u64,
    pub non_ascii_chars: u64,
}

/// Stage 1: line has no characters.
pub fn is_empty_line(line: &str) -> bool {
    line.is_empty()
}

/// Stage 2: line starts with a junk starter and is shorter than `junk_length`
/// characters.
pub fn is_junk_line(line: &str, junk_length: usize) -> bool {
    JUNK_STARTERS.iter().any(|starter| line.starts_with(starter))
        && line.chars().count() < junk_length
}

/// Looks for `>` in `chars[start + 1 .. min(start + lookahead, len)]`.
///
/// `start` is the index of the `<`. Returns the index of the first `>` in the
/// window. There is no nesting and no backtracking.
pub fn find_closing_bracket(chars: &[char], start: usize, lookahead: usize) -> Option<usize> {
    let window_end = start.saturating_add(lookahead).min(chars.len());
    (start + 1..window_end).find(|&j| chars[j] == '>')
}

/// Stage 3: removes non-ASCII characters and bracketed spans.
pub fn scan_characters(line: &str, lookahead: usize) -> ScanResult {
    let chars: Vec<char> = line.chars().collect();
    let mut result = ScanResult {
        text: String::with_capacity(line.len()),
        ..Default::default()
    };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if !c.is_ascii() {
            result.non_ascii += 1;
            i += 1;
            continue;
        }

        if c == '<' {
            if let Some(close) = find_closing_bracket(&chars, i, lookahead) {
                result.spans.push(chars[i..=close].iter().collect());
                i = close + 1;
                continue;
            }
            // Unterminated within the window: keep `<` as text
        }

        result.text.push(c);
        i += 1;
    }

    result
}

/// Streaming line sanitizer.
#[derive(Debug, Clone)]
pub struct LineSanitizer {
    options: SanitizeOptions,
}

impl LineSanitizer {
    /// Creates a sanitizer after validating `options`.
    pub fn new(options: SanitizeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &SanitizeOptions {
        &self.options
    }

    /// Runs the three stages on a single line (without terminator).
    pub fn sanitize_line(&self, line: &str) -> Sanitized {
        if is_empty_line(line) {
            return Sanitized::Empty;
        }
        if is_junk_line(line, self.options.junk_length) {
            return Sanitized::Junk;
        }
        Sanitized::Kept(scan_characters(line, self.options.lookahead))
    }

    /// Decides every line of a batch, preserving order.
    pub fn sanitize_batch(&self, batch: &[Line]) -> Vec<Sanitized> {
        if self.options.parallel {
            batch
                .par_iter()
                .map(|line| self.sanitize_line(&line.text))
                .collect()
        } else {
            batch
                .iter()
                .map(|line| self.sanitize_line(&line.text))
                .collect()
        }
    }

    /// Sanitizes `reader` into `writer`, reporting removed content to `sink`.
    pub fn sanitize_stream<R, W, S>(
        &self,
        reader: R,
        mut writer: W,
        sink: &mut S,
    ) -> Result<SanitizeStats>
    where
        R: BufRead,
        W: Write,
        S: DiagnosticSink + ?Sized,
    {
        let mut lines = LineReader::new(reader);
        let mut batch = Vec::with_capacity(self.options.batch_size.min(1 << 16));
        let mut stats = SanitizeStats::default();

        while lines.read_batch(&mut batch, self.options.batch_size)? {
            let decisions = self.sanitize_batch(&batch);
            for (line, decision) in batch.iter().zip(decisions) {
                emit(line, decision, &mut writer, sink, &mut stats)?;
            }
            debug!(
                "sanitized batch of {} lines ({} written so far)",
                batch.len(),
                stats.lines_written
            );
        }

        writer.flush()?;
        sink.flush()?;
        Ok(stats)
    }
}

fn emit<W, S>(
    line: &Line,
    decision: Sanitized,
    writer: &mut W,
    sink: &mut S,
    stats: &mut SanitizeStats,
) -> Result<()>
where
    W: Write,
    S: DiagnosticSink + ?Sized,
{
    stats.lines_read += 1;
    match decision {
        Sanitized::Empty => stats.empty_lines += 1,
        Sanitized::Junk => {
            stats.junk_lines += 1;
            sink.report(&Diagnostic::new(
                line.number,
                DiagnosticKind::JunkLine,
                line.text.as_str(),
            ))?;
        }
        Sanitized::Kept(scan) => {
            for span in scan.spans {
                stats.bracket_spans += 1;
                sink.report(&Diagnostic::new(line.number, DiagnosticKind::BracketSpan, span))?;
            }
            stats.non_ascii_chars += scan.non_ascii as u64;
            writer.write_all(scan.text.as_bytes())?;
            writer.write_all(b"\n")?;
            stats.lines_written += 1;
        }
    }
    Ok(())
}
