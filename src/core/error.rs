use thiserror::Error;

use crate::parsing::ParseError;
use crate::utils::validation::ValidationError;

/// Errors that abort a split run
#[derive(Error, Debug)]
pub enum SplitError {
    /// A named genome is missing, a label collides, or an input is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Two stages disagree about the labels or genomes they exchanged
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid name '{name}': {source}")]
    InvalidName {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("Remote transfer failed: {0}")]
    Remote(#[from] reqwest::Error),

    #[error("Task '{0}' did not complete")]
    TaskAborted(String),
}

impl SplitError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    /// Build an `ExternalTool` error from a finished process
    pub fn tool_failed(tool: impl Into<String>, output: &std::process::Output) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}
