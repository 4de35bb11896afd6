//! Options for the sanitizing and purity passes.

use crate::error::{Error, Result};

/// Default bracket lookahead window, in characters.
pub const DEFAULT_LOOKAHEAD: usize = 80;

/// Default length below which a line with a junk starter is dropped.
pub const DEFAULT_JUNK_LENGTH: usize = 150;

/// Default minimum share of alphabetic characters among non-white ones.
pub const DEFAULT_PURITY: f64 = 0.6;

/// Default number of lines decided together in one batch.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Options for the line sanitizer.
#[derive(Debug, Clone)]
pub struct SanitizeOptions {
    /// How far past a `<` to look for the closing `>`, counting the `<`.
    pub lookahead: usize,

    /// Lines starting with a junk starter are dropped below this length.
    pub junk_length: usize,

    /// Whether to decide the lines of a batch in parallel.
    pub parallel: bool,

    /// Lines per batch.
    pub batch_size: usize,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            junk_length: DEFAULT_JUNK_LENGTH,
            parallel: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SanitizeOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bracket lookahead window.
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Sets the junk line length threshold.
    pub fn with_junk_length(mut self, junk_length: usize) -> Self {
        self.junk_length = junk_length;
        self
    }

    /// Sets the number of lines per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.lookahead == 0 {
            return Err(Error::InvalidOption("lookahead must be at least 1".into()));
        }
        if self.junk_length == 0 {
            return Err(Error::InvalidOption(
                "junk_length must be at least 1".into(),
            ));
        }
        validate_batch_size(self.batch_size)
    }
}

/// Options for the purity filter.
#[derive(Debug, Clone)]
pub struct PurityOptions {
    /// Minimum alphabetic ratio a line needs to be kept.
    pub purity: f64,

    /// What to do with lines that have no non-white characters.
    pub degenerate: DegeneratePolicy,

    /// Whether to decide the lines of a batch in parallel.
    pub parallel: bool,

    /// Lines per batch.
    pub batch_size: usize,
}

impl Default for PurityOptions {
    fn default() -> Self {
        Self {
            purity: DEFAULT_PURITY,
            degenerate: DegeneratePolicy::Drop,
            parallel: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PurityOptions {
    /// Creates new options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the purity threshold.
    pub fn with_purity(mut self, purity: f64) -> Self {
        self.purity = purity;
        self
    }

    /// Fails the run on the first degenerate line.
    pub fn strict(mut self) -> Self {
        self.degenerate = DegeneratePolicy::Fail;
        self
    }

    /// Drops degenerate lines and reports them as diagnostics.
    pub fn lenient(mut self) -> Self {
        self.degenerate = DegeneratePolicy::Drop;
        self
    }

    /// Sets the number of lines per batch.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Disables parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Returns true if degenerate lines abort the run.
    pub fn is_strict(&self) -> bool {
        matches!(self.degenerate, DegeneratePolicy::Fail)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.purity.is_finite() || !(0.0..=1.0).contains(&self.purity) {
            return Err(Error::InvalidOption(format!(
                "purity must be within [0, 1], got {}",
                self.purity
            )));
        }
        validate_batch_size(self.batch_size)
    }
}

fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::InvalidOption("batch_size must be at least 1".into()));
    }
    Ok(())
}

/// How to handle a line with zero non-white characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Drop the line and report it on the diagnostic channel.
    #[default]
    Drop,
    /// Abort with [`Error::DegenerateLine`].
    Fail,
}
