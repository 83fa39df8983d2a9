// Error types for the wizard engine.
//
// User-facing text is kept apart from internal details so the console can show
// `user_message()` while logs get the full picture.

use thiserror::Error;

/// Failure of one executor (or detail-save) request.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// Request never produced an HTTP response (DNS, TLS, connection refused).
    #[error("executor unreachable: {details}")]
    Transport { details: String },

    /// Executor answered with a non-success status.
    #[error("executor rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("executor call timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Response body was not a connector descriptor.
    #[error("executor returned an unreadable response: {details}")]
    Decode { details: String },
}

impl ExecutorError {
    /// Message safe to show in the console.
    pub fn user_message(&self) -> String {
        match self {
            ExecutorError::Transport { .. } => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ExecutorError::Rejected { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            ExecutorError::Rejected { status, .. } => {
                format!("The server rejected the request (status {}).", status)
            }
            ExecutorError::Timeout { .. } => {
                "The server did not answer in time. Try again.".to_string()
            }
            ExecutorError::Decode { .. } => {
                "The server returned an unexpected response.".to_string()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Response decoded fine but lacks data the step needs to commit.
    #[error("step '{step}' received an incomplete response: {reason}")]
    MalformedResponse { step: String, reason: String },

    #[error("step '{step}' is not part of the current wizard")]
    UnknownStep { step: String },

    #[error("wizard session {session_id} is closed")]
    SessionClosed { session_id: String },
}

impl WizardError {
    pub fn user_message(&self) -> String {
        match self {
            WizardError::Executor(e) => e.user_message(),
            WizardError::MalformedResponse { .. } => {
                "The server response was incomplete; the step was not saved.".to_string()
            }
            WizardError::UnknownStep { .. } => "This step is no longer available.".to_string(),
            WizardError::SessionClosed { .. } => "The wizard was closed.".to_string(),
        }
    }

    pub fn malformed(step: &str, reason: impl Into<String>) -> Self {
        WizardError::MalformedResponse {
            step: step.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_prefers_server_message() {
        let e = ExecutorError::Rejected {
            status: 400,
            message: "Connector key is missing".to_string(),
        };
        assert_eq!(e.user_message(), "Connector key is missing");

        let e = ExecutorError::Rejected {
            status: 500,
            message: "  ".to_string(),
        };
        assert!(e.user_message().contains("500"));
    }

    #[test]
    fn transport_details_stay_out_of_user_message() {
        let e = WizardError::from(ExecutorError::Transport {
            details: "tcp connect error: 10.0.0.4:8080".to_string(),
        });
        assert!(!e.user_message().contains("10.0.0.4"));
        assert!(e.to_string().contains("10.0.0.4"));
    }
}
