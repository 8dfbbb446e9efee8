use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Settings could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// A pipeline run ended in failure
    #[error("Pipeline failed: {0}")]
    Pipeline(String),

    /// An external tool failed
    #[error("Tool error: {0}")]
    Tool(String),

    /// No catalog entry or workspace for the given key
    #[error("Not found: {0}")]
    NotFound(String),

    /// A user-supplied value was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CliError {
    pub(crate) fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    pub(crate) fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
