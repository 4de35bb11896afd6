//! Async API for non-blocking corpus cleaning.
//!
//! Enable the `async` feature to use these APIs:
//!
//! ```toml
//! [dependencies]
//! textsieve = { version = "0.1", features = ["async"] }
//! ```
//!
//! The filters are CPU-bound and stream through blocking file I/O, so every
//! call runs on Tokio's blocking pool. Diagnostics are collected in memory and
//! returned in input order.

use crate::diagnostics::{Diagnostic, MemorySink};
use crate::error::{Error, Result};
use crate::options::{PurityOptions, SanitizeOptions};
use crate::pipeline::{Pipeline, RunSummary, Tokenizer};
use crate::purity::PurityStats;
use crate::sanitize::SanitizeStats;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?
}

/// Asynchronously sanitizes a file into another file.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> textsieve::Result<()> {
/// use textsieve::SanitizeOptions;
///
/// let (stats, dropped) =
///     textsieve::async_api::sanitize_file("wiki.txt", "wiki.clean", SanitizeOptions::default())
///         .await?;
/// println!("{} lines written, {} removals", stats.lines_written, dropped.len());
/// # Ok(())
/// # }
/// ```
pub async fn sanitize_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: SanitizeOptions,
) -> Result<(SanitizeStats, Vec<Diagnostic>)> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    run_blocking(move || {
        let mut sink = MemorySink::new();
        let stats = crate::sanitize_file(&input, &output, &options, &mut sink)?;
        Ok((stats, sink.into_inner()))
    })
    .await
}

/// Asynchronously purity-filters a file into another file.
pub async fn purify_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: PurityOptions,
) -> Result<(PurityStats, Vec<Diagnostic>)> {
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    run_blocking(move || {
        let mut sink = MemorySink::new();
        let stats = crate::purify_file(&input, &output, &options, &mut sink)?;
        Ok((stats, sink.into_inner()))
    })
    .await
}

/// Asynchronously sanitizes everything read from an async reader.
pub async fn sanitize_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    options: SanitizeOptions,
) -> Result<String> {
    let mut data = String::new();
    reader.read_to_string(&mut data).await?;
    run_blocking(move || crate::sanitize_text(&data, &options)).await
}

/// Asynchronously runs a full pipeline.
pub async fn run_pipeline<T>(
    pipeline: Pipeline<T>,
    input: impl Into<PathBuf>,
    output: impl Into<PathBuf>,
) -> Result<(RunSummary, Vec<Diagnostic>)>
where
    T: Tokenizer + Send + 'static,
{
    let input = input.into();
    let output = output.into();
    run_blocking(move || {
        let mut sink = MemorySink::new();
        let summary = pipeline.run(&input, &output, &mut sink)?;
        Ok((summary, sink.into_inner()))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::pipeline::{IdentityTokenizer, PipelineOptions};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sanitize_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        tokio::fs::write(&input, "<br>Hello World\n").await.unwrap();

        let (stats, dropped) = sanitize_file(&input, &output, SanitizeOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.lines_written, 1);
        assert_eq!(dropped[0].kind, DiagnosticKind::BracketSpan);
        assert_eq!(
            tokio::fs::read_to_string(&output).await.unwrap(),
            "Hello World\n"
        );
    }

    #[tokio::test]
    async fn test_sanitize_reader() {
        let text = sanitize_reader("|junk\nfine\n".as_bytes(), SanitizeOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "fine\n");
    }

    #[tokio::test]
    async fn test_run_pipeline() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        tokio::fs::write(&input, "beta text\nalpha text\n123 456\n")
            .await
            .unwrap();

        let pipeline = Pipeline::new(IdentityTokenizer, PipelineOptions::default()).unwrap();
        let (summary, dropped) = run_pipeline(pipeline, &input, &output).await.unwrap();
        assert_eq!(summary.purity.lines_kept, 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(
            tokio::fs::read_to_string(&output).await.unwrap(),
            "alpha text\nbeta text\n"
        );
    }
}
