//! Error types for textsieve library.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for textsieve operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for textsieve library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line with no non-whitespace characters reached the purity filter
    /// while degenerate lines are configured to be fatal.
    #[error("Degenerate line {line_number}: no non-whitespace characters")]
    DegenerateLine { line_number: u64 },

    /// Option value outside its accepted range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// External tool (tokenizer installation) is not available.
    #[error("Missing external tool: {0}")]
    MissingTool(String),

    /// External tool ran but exited unsuccessfully.
    #[error("{tool} failed with {status}")]
    ToolFailed { tool: String, status: ExitStatus },

    /// Diagnostic or summary serialization error.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
