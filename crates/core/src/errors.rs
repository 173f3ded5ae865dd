use thiserror::Error;

/// Request-boundary validation failures. Not recoverable within the dialog:
/// the webhook answers these with a terminal message and a 400 status.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("missing required field `sessionId`")]
    MissingSessionId,
    #[error("missing required field `phoneNumber`")]
    MissingPhoneNumber,
}

impl RequestValidationError {
    /// Caller-safe terminal message; internal detail never leaks to the
    /// handset.
    pub fn user_message(&self) -> &'static str {
        "Invalid request. Please try again."
    }
}
