//! # textsieve
//!
//! Line-level cleaning for preparing plain-text training corpora from raw
//! extracted text (for example, wiki dumps).
//!
//! ## Filters
//!
//! - **Line Sanitizer**: drops empty and short markup-junk lines, strips
//!   non-ASCII characters and `<...>` markup spans
//! - **Purity Filter**: drops lines whose non-white characters are not mostly
//!   alphabetic
//!
//! Both filters stream line by line and report everything they remove to an
//! injected [`DiagnosticSink`]. The [`pipeline`] module chains them around an
//! external tokenizer and a sort/deduplicate step.
//!
//! ## Quick Start
//!
//! ```
//! use textsieve::{purify_text, sanitize_text, PurityOptions, SanitizeOptions};
//!
//! fn main() -> textsieve::Result<()> {
//!     let raw = "<br>Hello World\n!width=28|\nabc123\n";
//!
//!     let sanitized = sanitize_text(raw, &SanitizeOptions::default())?;
//!     assert_eq!(sanitized, "Hello World\nabc123\n");
//!
//!     let pure = purify_text(&sanitized, &PurityOptions::default())?;
//!     assert_eq!(pure, "Hello World\n");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `async`: Async wrappers with Tokio

pub mod diagnostics;
pub mod error;
pub mod lines;
pub mod options;
pub mod pipeline;
pub mod purity;
pub mod sanitize;

#[cfg(feature = "async")]
pub mod async_api;

// Re-exports
pub use diagnostics::{
    Diagnostic, DiagnosticFormat, DiagnosticKind, DiagnosticSink, MemorySink, NullSink,
    WriterSink,
};
pub use error::{Error, Result};
pub use options::{DegeneratePolicy, PurityOptions, SanitizeOptions};
pub use pipeline::{
    CoreNlpTokenizer, IdentityTokenizer, Pipeline, PipelineOptions, RunSummary, Stage, Tokenizer,
};
pub use purity::{PurityFilter, PurityStats};
pub use sanitize::{LineSanitizer, SanitizeStats};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Sanitizes a file into another file.
///
/// # Example
///
/// ```no_run
/// use textsieve::{sanitize_file, SanitizeOptions, WriterSink};
///
/// let mut log = WriterSink::plain(std::io::stdout());
/// let stats = sanitize_file("wiki.txt", "wiki.clean", &SanitizeOptions::default(), &mut log)?;
/// println!("Junk lines: {}", stats.junk_lines);
/// # Ok::<(), textsieve::Error>(())
/// ```
pub fn sanitize_file<S>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &SanitizeOptions,
    sink: &mut S,
) -> Result<SanitizeStats>
where
    S: DiagnosticSink + ?Sized,
{
    let sanitizer = LineSanitizer::new(options.clone())?;
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    sanitizer.sanitize_stream(reader, writer, sink)
}

/// Purity-filters a file into another file.
pub fn purify_file<S>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &PurityOptions,
    sink: &mut S,
) -> Result<PurityStats>
where
    S: DiagnosticSink + ?Sized,
{
    let filter = PurityFilter::new(options.clone())?;
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    filter.purify_stream(reader, writer, sink)
}

/// Sanitizes an in-memory text, discarding diagnostics.
pub fn sanitize_text(input: &str, options: &SanitizeOptions) -> Result<String> {
    let sanitizer = LineSanitizer::new(options.clone())?;
    let mut output = Vec::with_capacity(input.len());
    sanitizer.sanitize_stream(input.as_bytes(), &mut output, &mut NullSink)?;
    // The sanitizer only writes ASCII
    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Purity-filters an in-memory text, discarding diagnostics.
pub fn purify_text(input: &str, options: &PurityOptions) -> Result<String> {
    let filter = PurityFilter::new(options.clone())?;
    let mut output = Vec::with_capacity(input.len());
    filter.purify_stream(input.as_bytes(), &mut output, &mut NullSink)?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}
