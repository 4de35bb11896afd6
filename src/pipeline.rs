//! # Corpus Pipeline
//!
//! Runs the full cleaning sequence over one text file:
//!
//! 1. **Sanitize** - [`LineSanitizer`] into `<input>__clean1`
//! 2. **Tokenize** - external [`Tokenizer`] into `<input>__clean1__tok`
//! 3. **Deduplicate** - [`sort_unique`] into `<input>__clean1__tok__nodup`
//! 4. **Purify** - [`PurityFilter`] into the output file
//!
//! Purity filtering runs after sorting, so the output is in byte-lexicographic
//! order, not input order. Intermediate files are removed when the run ends,
//! whether it succeeded or not, unless they are explicitly kept.

use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::options::{PurityOptions, SanitizeOptions};
use crate::purity::{PurityFilter, PurityStats};
use crate::sanitize::{LineSanitizer, SanitizeStats};
use log::{info, warn};
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Main class of the Stanford CoreNLP sentence splitter and tokenizer.
pub const CORENLP_PREPROCESSOR: &str = "edu.stanford.nlp.process.DocumentPreprocessor";

/// Turns a text file into one whitespace-tokenized sentence per line.
pub trait Tokenizer {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Verifies the tool is usable. Called once before any processing.
    fn check(&self) -> Result<()>;

    /// Tokenizes `input` into `output`.
    fn tokenize(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Stanford CoreNLP `DocumentPreprocessor`, run through `java`.
#[derive(Debug, Clone)]
pub struct CoreNlpTokenizer {
    install_dir: PathBuf,
    java: PathBuf,
}

impl CoreNlpTokenizer {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            java: PathBuf::from("java"),
        }
    }

    /// Sets the java executable.
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Classpath covering every jar in the installation.
    fn classpath(&self) -> OsString {
        self.install_dir.join("*").into_os_string()
    }
}

impl Tokenizer for CoreNlpTokenizer {
    fn name(&self) -> &str {
        "corenlp"
    }

    fn check(&self) -> Result<()> {
        if self.install_dir.is_dir() {
            Ok(())
        } else {
            Err(Error::MissingTool(format!(
                "CoreNLP installation not found at {}",
                self.install_dir.display()
            )))
        }
    }

    fn tokenize(&self, input: &Path, output: &Path) -> Result<()> {
        let stdout = File::create(output)?;
        let status = Command::new(&self.java)
            .arg("-cp")
            .arg(self.classpath())
            .arg(CORENLP_PREPROCESSOR)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(stdout)
            .status()
            .map_err(|e| Error::MissingTool(format!("{}: {}", self.java.display(), e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed {
                tool: self.name().to_string(),
                status,
            })
        }
    }
}

/// Copies its input unchanged, for text that is already tokenized.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTokenizer;

impl Tokenizer for IdentityTokenizer {
    fn name(&self) -> &str {
        "identity"
    }

    fn check(&self) -> Result<()> {
        Ok(())
    }

    fn tokenize(&self, input: &Path, output: &Path) -> Result<()> {
        fs::copy(input, output)?;
        Ok(())
    }
}

/// Sorts the lines of `input` bytewise, drops exact duplicates and writes
/// them newline-terminated to `output`. Returns the number of unique lines.
///
/// The whole file is held in memory while sorting, so peak memory is roughly
/// the size of `input` plus per-line overhead.
pub fn sort_unique(input: &Path, output: &Path) -> Result<usize> {
    let mut lines = BufReader::new(File::open(input)?)
        .split(b'\n')
        .collect::<std::io::Result<Vec<Vec<u8>>>>()?;
    lines.sort_unstable();
    lines.dedup();

    let mut writer = BufWriter::new(File::create(output)?);
    for line in &lines {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(lines.len())
}

/// Counts newline-delimited lines in a file.
fn count_lines(path: &Path) -> Result<usize> {
    let mut count = 0;
    for line in BufReader::new(File::open(path)?).split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Pipeline step, reported to observers as it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sanitize,
    Tokenize,
    Deduplicate,
    Purify,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Sanitize => write!(f, "Sanitizing lines"),
            Stage::Tokenize => write!(f, "Tokenizing"),
            Stage::Deduplicate => write!(f, "Sorting and deduplicating"),
            Stage::Purify => write!(f, "Filtering by purity"),
        }
    }
}

/// Options for a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub sanitize: SanitizeOptions,
    pub purity: PurityOptions,
    /// Leave intermediate files on disk after the run.
    pub keep_intermediates: bool,
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitize(mut self, sanitize: SanitizeOptions) -> Self {
        self.sanitize = sanitize;
        self
    }

    pub fn with_purity(mut self, purity: PurityOptions) -> Self {
        self.purity = purity;
        self
    }

    pub fn keep_intermediates(mut self) -> Self {
        self.keep_intermediates = true;
        self
    }
}

/// Counters for a full pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub sanitize: SanitizeStats,
    pub tokenized_lines: usize,
    pub unique_lines: usize,
    pub purity: PurityStats,
}

/// Paths of the files passed between stages.
#[derive(Debug, Clone)]
pub struct IntermediateFiles {
    pub sanitized: PathBuf,
    pub tokenized: PathBuf,
    pub deduplicated: PathBuf,
    keep: bool,
}

impl IntermediateFiles {
    /// Derives intermediate paths from the input path.
    pub fn for_input(input: &Path, keep: bool) -> Self {
        let sanitized = with_suffix(input, "__clean1");
        let tokenized = with_suffix(&sanitized, "__tok");
        let deduplicated = with_suffix(&tokenized, "__nodup");
        Self {
            sanitized,
            tokenized,
            deduplicated,
            keep,
        }
    }

    fn paths(&self) -> [&Path; 3] {
        [
            self.sanitized.as_path(),
            self.tokenized.as_path(),
            self.deduplicated.as_path(),
        ]
    }
}

impl Drop for IntermediateFiles {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for path in self.paths() {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("could not remove {}: {}", path.display(), e),
            }
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Sanitize, tokenize, deduplicate and purify one file.
pub struct Pipeline<T> {
    tokenizer: T,
    sanitizer: LineSanitizer,
    filter: PurityFilter,
    keep_intermediates: bool,
}

impl<T: Tokenizer> Pipeline<T> {
    /// Builds a pipeline, validating every option.
    pub fn new(tokenizer: T, options: PipelineOptions) -> Result<Self> {
        Ok(Self {
            tokenizer,
            sanitizer: LineSanitizer::new(options.sanitize)?,
            filter: PurityFilter::new(options.purity)?,
            keep_intermediates: options.keep_intermediates,
        })
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Runs every stage, reporting dropped content to `sink`.
    pub fn run<S>(&self, input: &Path, output: &Path, sink: &mut S) -> Result<RunSummary>
    where
        S: DiagnosticSink + ?Sized,
    {
        self.run_observed(input, output, sink, |_| {})
    }

    /// Like [`Pipeline::run`], calling `observer` as each stage starts.
    pub fn run_observed<S, F>(
        &self,
        input: &Path,
        output: &Path,
        sink: &mut S,
        mut observer: F,
    ) -> Result<RunSummary>
    where
        S: DiagnosticSink + ?Sized,
        F: FnMut(Stage),
    {
        self.tokenizer.check()?;

        let files = IntermediateFiles::for_input(input, self.keep_intermediates);
        let mut summary = RunSummary::default();

        observer(Stage::Sanitize);
        info!("sanitizing {} into {}", input.display(), files.sanitized.display());
        summary.sanitize = {
            let reader = BufReader::new(File::open(input)?);
            let writer = BufWriter::new(File::create(&files.sanitized)?);
            self.sanitizer.sanitize_stream(reader, writer, sink)?
        };

        observer(Stage::Tokenize);
        info!("tokenizing with {}", self.tokenizer.name());
        self.tokenizer.tokenize(&files.sanitized, &files.tokenized)?;
        summary.tokenized_lines = count_lines(&files.tokenized)?;

        observer(Stage::Deduplicate);
        summary.unique_lines = sort_unique(&files.tokenized, &files.deduplicated)?;
        info!(
            "{} tokenized lines, {} unique",
            summary.tokenized_lines, summary.unique_lines
        );

        observer(Stage::Purify);
        info!("filtering by purity into {}", output.display());
        summary.purity = {
            let reader = BufReader::new(File::open(&files.deduplicated)?);
            let writer = BufWriter::new(File::create(output)?);
            self.filter.purify_stream(reader, writer, sink)?
        };

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, MemorySink};
    use tempfile::TempDir;

    #[test]
    fn test_intermediate_names() {
        let files = IntermediateFiles::for_input(Path::new("/data/wiki.txt"), true);
        assert_eq!(files.sanitized, Path::new("/data/wiki.txt__clean1"));
        assert_eq!(files.tokenized, Path::new("/data/wiki.txt__clean1__tok"));
        assert_eq!(
            files.deduplicated,
            Path::new("/data/wiki.txt__clean1__tok__nodup")
        );
    }

    #[test]
    fn test_sort_unique() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "pear\napple\nBanana\napple\npear").unwrap();

        let count = sort_unique(&input, &output).unwrap();
        assert_eq!(count, 3);
        assert_eq!(fs::read_to_string(&output).unwrap(), "Banana\napple\npear\n");
    }

    #[test]
    fn test_missing_corenlp_install() {
        let dir = TempDir::new().unwrap();
        let tokenizer = CoreNlpTokenizer::new(dir.path().join("absent"));
        assert!(matches!(tokenizer.check(), Err(Error::MissingTool(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_corenlp_nonzero_exit_is_tool_failure() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "Some text.\n").unwrap();

        let tokenizer = CoreNlpTokenizer::new(dir.path()).with_java("false");
        let err = tokenizer.tokenize(&input, &output).unwrap_err();
        assert!(matches!(err, Error::ToolFailed { ref tool, .. } if tool == "corenlp"));
    }

    #[test]
    fn test_corenlp_missing_java() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "Some text.\n").unwrap();

        let tokenizer = CoreNlpTokenizer::new(dir.path()).with_java(dir.path().join("no-java"));
        let err = tokenizer.tokenize(&input, &output).unwrap_err();
        assert!(matches!(err, Error::MissingTool(_)));
    }

    #[test]
    fn test_corenlp_classpath_covers_install_dir() {
        let tokenizer = CoreNlpTokenizer::new("/opt/corenlp");
        assert_eq!(
            PathBuf::from(tokenizer.classpath()),
            Path::new("/opt/corenlp").join("*")
        );
    }

    #[test]
    fn test_missing_tool_fails_before_processing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("wiki.txt");
        let output = dir.path().join("clean.txt");
        fs::write(&input, "Some text.\n").unwrap();

        let pipeline = Pipeline::new(
            CoreNlpTokenizer::new(dir.path().join("absent")),
            PipelineOptions::default(),
        )
        .unwrap();
        let err = pipeline.run(&input, &output, &mut MemorySink::new()).unwrap_err();
        assert!(matches!(err, Error::MissingTool(_)));
        assert!(!with_suffix(&input, "__clean1").exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_run_with_identity_tokenizer() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("wiki.txt");
        let output = dir.path().join("clean.txt");
        fs::write(
            &input,
            "zebra crossing here\n<br>apple pie recipe\n!width=28|\n\n\
             zebra crossing here\n1999 2000 2001\n",
        )
        .unwrap();

        let pipeline = Pipeline::new(IdentityTokenizer, PipelineOptions::default()).unwrap();
        let mut sink = MemorySink::new();
        let mut stages = Vec::new();
        let summary = pipeline
            .run_observed(&input, &output, &mut sink, |stage| stages.push(stage))
            .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "apple pie recipe\nzebra crossing here\n"
        );
        assert_eq!(
            stages,
            vec![Stage::Sanitize, Stage::Tokenize, Stage::Deduplicate, Stage::Purify]
        );
        assert_eq!(summary.sanitize.junk_lines, 1);
        assert_eq!(summary.sanitize.lines_written, 4);
        assert_eq!(summary.tokenized_lines, 4);
        assert_eq!(summary.unique_lines, 3);
        assert_eq!(summary.purity.impure_lines, 1);

        let kinds: Vec<DiagnosticKind> = sink.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds[0], DiagnosticKind::BracketSpan);
        assert_eq!(kinds[1], DiagnosticKind::JunkLine);
        assert!(matches!(kinds[2], DiagnosticKind::Impure { .. }));

        let files = IntermediateFiles::for_input(&input, true);
        for path in files.paths() {
            assert!(!path.exists(), "{} left behind", path.display());
        }
    }

    #[test]
    fn test_keep_intermediates() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("wiki.txt");
        let output = dir.path().join("clean.txt");
        fs::write(&input, "b line\na line\n").unwrap();

        let pipeline = Pipeline::new(
            IdentityTokenizer,
            PipelineOptions::new().keep_intermediates(),
        )
        .unwrap();
        pipeline.run(&input, &output, &mut MemorySink::new()).unwrap();

        let files = IntermediateFiles::for_input(&input, true);
        assert_eq!(fs::read_to_string(&files.sanitized).unwrap(), "b line\na line\n");
        assert_eq!(
            fs::read_to_string(&files.deduplicated).unwrap(),
            "a line\nb line\n"
        );
    }

    #[test]
    fn test_intermediates_removed_on_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("wiki.txt");
        let output = dir.path().join("clean.txt");
        fs::write(&input, "fine line\n   \n").unwrap();

        let options = PipelineOptions::new().with_purity(PurityOptions::new().strict());
        let pipeline = Pipeline::new(IdentityTokenizer, options).unwrap();
        let err = pipeline.run(&input, &output, &mut MemorySink::new()).unwrap_err();
        assert!(matches!(err, Error::DegenerateLine { .. }));

        let files = IntermediateFiles::for_input(&input, true);
        for path in files.paths() {
            assert!(!path.exists());
        }
    }
}
