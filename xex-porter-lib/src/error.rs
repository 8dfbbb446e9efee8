use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// The single terminal error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request cannot run at all (no input, unusable output directory).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stage's tool or filesystem step failed.
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: Stage, message: String },

    /// An expected artifact was not produced.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl PipelineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn stage(stage: Stage, msg: impl Into<String>) -> Self {
        Self::StageFailed {
            stage,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Errors from invoking an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable could not be located.
    #[error("Tool not found: {tool} (set its path in settings.toml or the environment)")]
    Missing { tool: String },

    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("{tool} exited with {}: {stderr}", exit_label(.code))]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool reported success but its expected output is absent.
    #[error("{tool} produced no output at {}", .path.display())]
    NoOutput { tool: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the persist stage could not record a run. Never terminal.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] xex_porter_db::OperationError),
}

/// Errors loading or saving `settings.toml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings file root is not a table")]
    NotATable,
}

/// Errors reading or writing game profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Title ids name files, so only ASCII letters and digits are accepted.
    #[error("Invalid title id '{0}'")]
    InvalidTitleId(String),

    #[error("A profile for {title_id} already exists at {}", .path.display())]
    Exists { title_id: String, path: PathBuf },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "a signal".to_string(),
    }
}
