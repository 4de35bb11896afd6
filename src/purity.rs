//! # Purity Filter
//!
//! Final filtering pass over tokenized, deduplicated sentences. A line is kept
//! when the share of alphabetic characters among its non-white characters is
//! at least the purity threshold. Kept lines are copied byte for byte,
//! terminator included.

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{Error, Result};
use crate::lines::{Line, LineReader};
use crate::options::{DegeneratePolicy, PurityOptions};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{BufRead, Write};

/// Character class counts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharCounts {
    /// Characters that are not whitespace.
    pub nonwhite: usize,
    /// Non-white characters that are alphabetic.
    pub alpha: usize,
}

impl CharCounts {
    pub fn of(line: &str) -> Self {
        line.chars()
            .filter(|c| !c.is_whitespace())
            .fold(Self::default(), |mut counts, c| {
                counts.nonwhite += 1;
                if c.is_alphabetic() {
                    counts.alpha += 1;
                }
                counts
            })
    }

    /// `alpha / nonwhite`, or `None` for a line with no non-white characters.
    pub fn ratio(&self) -> Option<f64> {
        if self.nonwhite == 0 {
            None
        } else {
            Some(self.alpha as f64 / self.nonwhite as f64)
        }
    }
}

/// Decision for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PurityVerdict {
    Keep,
    /// Ratio strictly below the threshold.
    Impure { ratio: f64 },
    /// No non-white characters.
    Degenerate,
}

/// Counters for one purity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PurityStats {
    pub lines_read: u64,
    pub lines_kept: u64,
    pub impure_lines: u64,
    pub degenerate_lines: u64,
}

/// Streaming purity filter.
#[derive(Debug, Clone)]
pub struct PurityFilter {
    options: PurityOptions,
}

impl PurityFilter {
    /// Creates a filter after validating `options`.
    pub fn new(options: PurityOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PurityOptions {
        &self.options
    }

    /// Judges a single line.
    pub fn judge(&self, line: &str) -> PurityVerdict {
        match CharCounts::of(line).ratio() {
            None => PurityVerdict::Degenerate,
            Some(ratio) if ratio < self.options.purity => PurityVerdict::Impure { ratio },
            Some(_) => PurityVerdict::Keep,
        }
    }

    /// Judges every line of a batch, preserving order.
    pub fn judge_batch(&self, batch: &[Line]) -> Vec<PurityVerdict> {
        if self.options.parallel {
            batch.par_iter().map(|line| self.judge(&line.text)).collect()
        } else {
            batch.iter().map(|line| self.judge(&line.text)).collect()
        }
    }

    /// Filters `reader` into `writer`, reporting dropped lines to `sink`.
    ///
    /// With [`DegeneratePolicy::Fail`], the first all-whitespace line aborts
    /// the run with [`Error::DegenerateLine`]. Lines before it have already
    /// been written.
    pub fn purify_stream<R, W, S>(
        &self,
        reader: R,
        mut writer: W,
        sink: &mut S,
    ) -> Result<PurityStats>
    where
        R: BufRead,
        W: Write,
        S: DiagnosticSink + ?Sized,
    {
        let mut lines = LineReader::new(reader);
        let mut batch = Vec::with_capacity(self.options.batch_size.min(1 << 16));
        let mut stats = PurityStats::default();

        while lines.read_batch(&mut batch, self.options.batch_size)? {
            let verdicts = self.judge_batch(&batch);
            for (line, verdict) in batch.iter().zip(verdicts) {
                stats.lines_read += 1;
                match verdict {
                    PurityVerdict::Keep => {
                        writer.write_all(&line.raw)?;
                        stats.lines_kept += 1;
                    }
                    PurityVerdict::Impure { ratio } => {
                        stats.impure_lines += 1;
                        sink.report(&Diagnostic::new(
                            line.number,
                            DiagnosticKind::Impure { ratio },
                            line.text.as_str(),
                        ))?;
                    }
                    PurityVerdict::Degenerate => match self.options.degenerate {
                        DegeneratePolicy::Fail => {
                            writer.flush()?;
                            sink.flush()?;
                            return Err(Error::DegenerateLine {
                                line_number: line.number,
                            });
                        }
                        DegeneratePolicy::Drop => {
                            warn!("dropping line {} with no non-white characters", line.number);
                            stats.degenerate_lines += 1;
                            sink.report(&Diagnostic::new(
                                line.number,
                                DiagnosticKind::Degenerate,
                                line.text.as_str(),
                            ))?;
                        }
                    },
                }
            }
            debug!(
                "purified batch of {} lines ({} kept so far)",
                batch.len(),
                stats.lines_kept
            );
        }

        writer.flush()?;
        sink.flush()?;
        Ok(stats)
    }
}
