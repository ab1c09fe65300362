//! Error types for the decision oracles.
//!
//! Setup problems (bad environment, broken templates) are [`BrainError`]s.
//! Anything that goes wrong while answering a request is reported to the
//! scheduler as an [`OracleError`], so rendering failures convert into one.

use meadow_core::OracleError;

/// Errors raised while configuring or preparing an oracle.
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    /// An environment variable is present but unusable.
    #[error("config error: {0}")]
    Config(String),

    /// A prompt template file could not be read.
    #[error("failed to read template {path}: {source}")]
    TemplateFile {
        /// Path of the template file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A prompt template failed to compile or render.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<BrainError> for OracleError {
    fn from(error: BrainError) -> Self {
        Self::NoDecision(error.to_string())
    }
}
