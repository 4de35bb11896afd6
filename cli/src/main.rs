//! textsieve CLI - clean extracted text into a training corpus
//!
//! A command-line tool for sanitizing, tokenizing, deduplicating and
//! purity-filtering plain text.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use textsieve::{
    CoreNlpTokenizer, DiagnosticFormat, DiagnosticSink, IdentityTokenizer, LineSanitizer,
    Pipeline, PipelineOptions, PurityFilter, PurityOptions, RunSummary, SanitizeOptions,
    Tokenizer, WriterSink,
};

/// Default location of the Stanford CoreNLP distribution.
const DEFAULT_CORENLP_DIR: &str = "third_party/stanford-corenlp-full-2014-08-27";

/// Corpus cleaning: markup/junk stripping and purity filtering
#[derive(Parser)]
#[command(
    name = "textsieve",
    version,
    about = "Clean extracted text into a training corpus",
    long_about = "textsieve - line-level corpus cleaning.\n\n\
                  Removes markup spans, junk lines and non-ASCII characters, tokenizes,\n\
                  sorts and deduplicates sentences, then keeps sentences that are mostly\n\
                  alphabetic. Removed content is printed as diagnostics.\n\n\
                  Usage:\n  \
                  textsieve <input> <output>          Run the full pipeline\n  \
                  textsieve sanitize <input> -o <f>   Run the sanitizer only\n  \
                  textsieve purify <input> -o <f>     Run the purity filter only"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input text file (for the full pipeline)
    input: Option<PathBuf>,

    /// Output file (for the full pipeline)
    output: Option<PathBuf>,

    #[command(flatten)]
    sanitize: SanitizeArgs,

    #[command(flatten)]
    purity: PurityArgs,

    #[command(flatten)]
    common: CommonArgs,

    /// Stanford CoreNLP installation directory
    #[arg(long, default_value = DEFAULT_CORENLP_DIR)]
    corenlp: PathBuf,

    /// Java executable used to run the tokenizer
    #[arg(long, default_value = "java")]
    java: PathBuf,

    /// Skip tokenization (input is already one tokenized sentence per line)
    #[arg(long)]
    no_tokenize: bool,

    /// Keep intermediate files next to the input
    #[arg(long)]
    keep_intermediates: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove markup spans, junk lines and non-ASCII characters
    Sanitize {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        sanitize: SanitizeArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Keep lines whose non-white characters are mostly alphabetic
    Purify {
        /// Input file path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        purity: PurityArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args, Clone)]
struct SanitizeArgs {
    /// Characters to look ahead for the `>` closing a `<`
    #[arg(long, default_value_t = textsieve::options::DEFAULT_LOOKAHEAD)]
    lookahead: usize,

    /// Lines starting with | # ! [[ shorter than this are junk
    #[arg(long, default_value_t = textsieve::options::DEFAULT_JUNK_LENGTH)]
    junk_length: usize,
}

impl SanitizeArgs {
    fn options(&self, common: &CommonArgs) -> SanitizeOptions {
        let options = SanitizeOptions::new()
            .with_lookahead(self.lookahead)
            .with_junk_length(self.junk_length);
        if common.sequential {
            options.sequential()
        } else {
            options
        }
    }
}

#[derive(clap::Args, Clone)]
struct PurityArgs {
    /// Minimum share of alphabetic characters among non-white ones
    #[arg(long, default_value_t = textsieve::options::DEFAULT_PURITY)]
    purity: f64,

    /// Fail on lines with no non-white characters instead of dropping them
    #[arg(long)]
    strict: bool,
}

impl PurityArgs {
    fn options(&self, common: &CommonArgs) -> PurityOptions {
        let mut options = PurityOptions::new().with_purity(self.purity);
        if self.strict {
            options = options.strict();
        }
        if common.sequential {
            options = options.sequential();
        }
        options
    }
}

#[derive(clap::Args, Clone)]
struct CommonArgs {
    /// Write diagnostics (removed content) here instead of stdout
    /// (stderr when the filtered output itself goes to stdout)
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Diagnostic line format
    #[arg(long, default_value = "plain")]
    diagnostics_format: FormatMode,

    /// Process lines on a single thread
    #[arg(long)]
    sequential: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors and hide the progress spinner
    #[arg(short, long)]
    quiet: bool,
}

/// Diagnostic format
#[derive(Clone, Copy, ValueEnum)]
enum FormatMode {
    /// Removed content only, one per line
    Plain,
    /// One JSON object per line
    Json,
}

impl From<FormatMode> for DiagnosticFormat {
    fn from(mode: FormatMode) -> Self {
        match mode {
            FormatMode::Plain => DiagnosticFormat::Plain,
            FormatMode::Json => DiagnosticFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let common = match &cli.command {
        Some(Commands::Sanitize { common, .. }) | Some(Commands::Purify { common, .. }) => common,
        _ => &cli.common,
    };
    init_logging(common);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(common: &CommonArgs) {
    let level = if common.quiet {
        LevelFilter::Error
    } else {
        match common.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(mut cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.take() {
        Some(Commands::Sanitize {
            input,
            output,
            sanitize,
            common,
        }) => {
            let sanitizer = LineSanitizer::new(sanitize.options(&common))?;
            let reader = BufReader::new(File::open(&input)?);
            let mut sink = open_sink(&common, output.is_none())?;
            let stats = with_output(output.as_deref(), |writer| {
                Ok(sanitizer.sanitize_stream(reader, writer, sink.as_mut())?)
            })?;
            log::info!(
                "{} lines read, {} junk, {} written",
                stats.lines_read,
                stats.junk_lines,
                stats.lines_written
            );
        }

        Some(Commands::Purify {
            input,
            output,
            purity,
            common,
        }) => {
            let filter = PurityFilter::new(purity.options(&common))?;
            let reader = BufReader::new(File::open(&input)?);
            let mut sink = open_sink(&common, output.is_none())?;
            let stats = with_output(output.as_deref(), |writer| {
                Ok(filter.purify_stream(reader, writer, sink.as_mut())?)
            })?;
            log::info!(
                "{} lines read, {} kept, {} impure, {} degenerate",
                stats.lines_read,
                stats.lines_kept,
                stats.impure_lines,
                stats.degenerate_lines
            );
        }

        Some(Commands::Version) => print_version(),

        None => match (&cli.input, &cli.output) {
            (Some(input), Some(output)) => run_pipeline(&cli, input, output)?,
            _ => {
                use clap::CommandFactory;
                Cli::command().print_help()?;
            }
        },
    }

    Ok(())
}

/// Runs the full pipeline with the configured tokenizer.
fn run_pipeline(cli: &Cli, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = PipelineOptions::new()
        .with_sanitize(cli.sanitize.options(&cli.common))
        .with_purity(cli.purity.options(&cli.common));
    if cli.keep_intermediates {
        options = options.keep_intermediates();
    }

    let summary = if cli.no_tokenize {
        execute(Pipeline::new(IdentityTokenizer, options)?, cli, input, output)?
    } else {
        let tokenizer = CoreNlpTokenizer::new(&cli.corenlp).with_java(&cli.java);
        execute(Pipeline::new(tokenizer, options)?, cli, input, output)?
    };

    if cli.summary_json {
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.common.quiet {
        print_summary(&summary, output);
    }
    Ok(())
}

fn execute<T: Tokenizer>(
    pipeline: Pipeline<T>,
    cli: &Cli,
    input: &Path,
    output: &Path,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut sink = open_sink(&cli.common, false)?;
    let pb = (!cli.common.quiet).then(|| create_spinner("Starting..."));

    let result = pipeline.run_observed(input, output, sink.as_mut(), |stage| {
        if let Some(pb) = &pb {
            pb.set_message(format!("{}...", stage));
        }
    });

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

/// Destination of the diagnostic channel.
#[derive(Debug, PartialEq)]
enum DiagnosticTarget<'a> {
    File(&'a Path),
    Stdout,
    Stderr,
}

/// Picks the diagnostic destination. Diagnostics never share stdout with the
/// primary output.
fn diagnostic_target(common: &CommonArgs, output_on_stdout: bool) -> DiagnosticTarget<'_> {
    match &common.diagnostics {
        Some(path) => DiagnosticTarget::File(path),
        None if output_on_stdout => DiagnosticTarget::Stderr,
        None => DiagnosticTarget::Stdout,
    }
}

/// Opens the diagnostic channel.
fn open_sink(common: &CommonArgs, output_on_stdout: bool) -> io::Result<Box<dyn DiagnosticSink>> {
    let format: DiagnosticFormat = common.diagnostics_format.into();
    Ok(match diagnostic_target(common, output_on_stdout) {
        DiagnosticTarget::File(path) => {
            Box::new(WriterSink::new(BufWriter::new(File::create(path)?), format))
        }
        DiagnosticTarget::Stdout => Box::new(WriterSink::new(io::stdout(), format)),
        DiagnosticTarget::Stderr => Box::new(WriterSink::new(io::stderr(), format)),
    })
}

/// Runs `f` against the output file, or stdout when none is given.
fn with_output<T>(
    path: Option<&Path>,
    f: impl FnOnce(&mut dyn Write) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let mut writer = BufWriter::new(File::create(p)?);
            f(&mut writer)
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            f(&mut handle)
        }
    }
}

fn print_summary(summary: &RunSummary, output: &Path) {
    eprintln!("{}", "Cleaning Complete".green().bold());
    eprintln!("{}", "─".repeat(40));
    eprintln!("{}: {}", "Output".bold(), output.display());

    eprintln!("\n{}", "Sanitizer".cyan().bold());
    eprintln!("{}", "─".repeat(40));
    eprintln!("{}: {}", "Lines read".bold(), summary.sanitize.lines_read);
    eprintln!("{}: {}", "Empty".bold(), summary.sanitize.empty_lines);
    eprintln!("{}: {}", "Junk".bold(), summary.sanitize.junk_lines);
    eprintln!("{}: {}", "Bracket spans".bold(), summary.sanitize.bracket_spans);
    eprintln!("{}: {}", "Non-ASCII chars".bold(), summary.sanitize.non_ascii_chars);
    eprintln!("{}: {}", "Lines written".bold(), summary.sanitize.lines_written);

    eprintln!("\n{}", "Sentences".cyan().bold());
    eprintln!("{}", "─".repeat(40));
    eprintln!("{}: {}", "Tokenized".bold(), summary.tokenized_lines);
    eprintln!("{}: {}", "Unique".bold(), summary.unique_lines);
    eprintln!("{}: {}", "Impure".bold(), summary.purity.impure_lines);
    eprintln!("{}: {}", "Degenerate".bold(), summary.purity.degenerate_lines);
    eprintln!("{}: {}", "Kept".bold(), summary.purity.lines_kept);
}

fn print_version() {
    println!("{} {}", "textsieve".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Line-level cleaning for plain-text training corpora");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
