//! Error types for the relay.
//!
//! Each layer has its own enum; [`RelayError`] records which stage of a
//! message's journey failed.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use toolwire::{ErrorData, RequestId};

/// Failure talking to the tool server process.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to start tool server {}: {source}", command.display())]
    Spawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error during {method}: {source}")]
    Io {
        method: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {method} request: {source}")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("tool server exited with {status} during {method}: {stderr}")]
    Exited {
        method: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("tool server did not finish {method} within {after:?}")]
    TimedOut { method: String, after: Duration },

    #[error("tool server produced no output for {method}")]
    EmptyOutput { method: String },

    #[error("failed to decode {method} reply: {message} (output: {output})")]
    Decode {
        method: String,
        message: String,
        output: String,
    },

    #[error("no reply with id {id} in tool server output for {method}")]
    NoReply { method: String, id: RequestId },

    #[error("tool server rejected {method}: {error}")]
    Rejected { method: String, error: ErrorData },
}

/// Failure talking to the generative model endpoint.
#[derive(Debug, Error)]
pub enum ModelApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("no response within {after:?}")]
    TimedOut { after: Duration },

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {message} (body: {body})")]
    Decode { message: String, body: String },

    #[error("response contained no candidates")]
    NoCandidates,
}

/// Failure executing the tool the model asked for.
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("tool '{tool}' was rejected: {error}")]
    Rejected { tool: String, error: ErrorData },

    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },

    #[error("tool '{tool}' returned a malformed result: {message}")]
    Malformed { tool: String, message: String },
}

/// Failure processing one user message, tagged by stage.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to get tools: {0}")]
    Tools(#[source] ChannelError),

    #[error("model API error: {0}")]
    Model(#[source] ModelApiError),

    #[error("tool execution error: {0}")]
    ToolExecution(#[source] ToolExecutionError),

    #[error("model follow-up error: {0}")]
    FollowUp(#[source] ModelApiError),
}

impl RelayError {
    /// The transport failure underneath, if this was one.
    pub fn channel_error(&self) -> Option<&ChannelError> {
        match self {
            RelayError::Tools(err) => Some(err),
            RelayError::ToolExecution(ToolExecutionError::Channel(err)) => Some(err),
            _ => None,
        }
    }

    /// The model endpoint failure underneath, if this was one.
    pub fn model_error(&self) -> Option<&ModelApiError> {
        match self {
            RelayError::Model(err) | RelayError::FollowUp(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_prefixes() {
        let err = RelayError::Tools(ChannelError::EmptyOutput {
            method: "initialize".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "failed to get tools: tool server produced no output for initialize"
        );

        let err = RelayError::FollowUp(ModelApiError::NoCandidates);
        assert_eq!(
            err.to_string(),
            "model follow-up error: response contained no candidates"
        );

        let err = RelayError::ToolExecution(ToolExecutionError::Failed {
            tool: "hello_world".to_string(),
            message: "name parameter is required".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "tool execution error: tool 'hello_world' failed: name parameter is required"
        );
    }

    #[test]
    fn test_channel_error_lookup() {
        let err = RelayError::ToolExecution(ToolExecutionError::Channel(
            ChannelError::EmptyOutput {
                method: "tools/call".to_string(),
            },
        ));
        assert!(matches!(
            err.channel_error(),
            Some(ChannelError::EmptyOutput { .. })
        ));
        assert!(err.model_error().is_none());

        let err = RelayError::Model(ModelApiError::NoCandidates);
        assert!(err.channel_error().is_none());
        assert!(matches!(err.model_error(), Some(ModelApiError::NoCandidates)));
    }
}
