//! Error types for the service-credit ledger.
//!
//! All errors use the `LEDGER_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: transient (nack, let the bus redeliver)
//! - 2xx: terminal for this message (ack, do not retry)
//! - 3xx: terminal for this actor (ack, conflict handling)
//! - 9xx: general / internal

use thiserror::Error;

use crate::UserId;

/// How the pipeline should translate an error into a bus ack/nack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Redelivery should be attempted (nack).
    Transient,
    /// The message itself is unprocessable; do not retry (ack).
    TerminalMessage,
    /// The actor cannot continue; the message must be redelivered to the
    /// eventual winner (nack), but this actor writes nothing further.
    TerminalActor,
}

/// Central error enum for all ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =================================================================
    // Transient (1xx)
    // =================================================================
    /// The target actor could not be reached within the routing timeout.
    #[error("LEDGER_ERR_100: Routing timeout for user {0}")]
    RoutingTimeout(UserId),

    /// The relational store refused the connection.
    #[error("LEDGER_ERR_101: Relational store unavailable: {reason}")]
    RelationalUnavailable { reason: String },

    /// A write-through failed and must be retried.
    #[error("LEDGER_ERR_102: Persistence write failed: {reason}")]
    PersistenceWriteFailed { reason: String },

    /// The actor for this user has not finished starting up.
    #[error("LEDGER_ERR_103: Actor not yet started for user {0}")]
    ActorNotStarted(UserId),

    // =================================================================
    // Terminal for this message (2xx)
    // =================================================================
    /// The message body could not be decoded as JSON.
    #[error("LEDGER_ERR_200: Malformed message body: {reason}")]
    MalformedBody { reason: String },

    /// The message did not carry a usable `user_id`.
    #[error("LEDGER_ERR_201: Missing or invalid user_id")]
    InvalidUserId,

    /// An entitlement referenced a bucket the ledger does not recognize.
    #[error("LEDGER_ERR_202: Unknown entitlement bucket: {bucket}")]
    UnknownBucket { bucket: String },

    /// A `jobs.complete` message's `user_id` did not match the actor it was
    /// routed to.
    #[error("LEDGER_ERR_203: Job user_id mismatch: expected {expected}, got {actual}")]
    JobUserMismatch { expected: UserId, actual: UserId },

    // =================================================================
    // Terminal for this actor (3xx)
    // =================================================================
    /// The cluster registry detected a duplicate actor and this side lost.
    #[error("LEDGER_ERR_300: Actor for user {0} lost a name-conflict resolution")]
    NameConflict(UserId),

    // =================================================================
    // General / internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("LEDGER_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("LEDGER_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("LEDGER_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("LEDGER_ERR_903: I/O error: {0}")]
    Io(String),
}

impl LedgerError {
    /// Which ack/nack treatment this error implies, per the pipeline's
    /// error-handling design.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RoutingTimeout(_)
            | Self::RelationalUnavailable { .. }
            | Self::PersistenceWriteFailed { .. }
            | Self::ActorNotStarted(_) => ErrorCategory::Transient,

            Self::MalformedBody { .. }
            | Self::InvalidUserId
            | Self::UnknownBucket { .. }
            | Self::JobUserMismatch { .. } => ErrorCategory::TerminalMessage,

            Self::NameConflict(_) => ErrorCategory::TerminalActor,

            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) | Self::Io(_) => {
                ErrorCategory::Transient
            }
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedBody {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = LedgerError::InvalidUserId;
        let msg = format!("{err}");
        assert!(msg.starts_with("LEDGER_ERR_201"), "Got: {msg}");
    }

    #[test]
    fn transient_errors_categorize_as_transient() {
        let err = LedgerError::RoutingTimeout(UserId::new());
        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[test]
    fn message_errors_categorize_as_terminal_message() {
        let err = LedgerError::UnknownBucket {
            bucket: "weird".into(),
        };
        assert_eq!(err.category(), ErrorCategory::TerminalMessage);
    }

    #[test]
    fn name_conflict_categorizes_as_terminal_actor() {
        let err = LedgerError::NameConflict(UserId::new());
        assert_eq!(err.category(), ErrorCategory::TerminalActor);
    }

    #[test]
    fn all_errors_have_ledger_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(LedgerError::InvalidUserId),
            Box::new(LedgerError::NameConflict(UserId::new())),
            Box::new(LedgerError::Internal("test".into())),
            Box::new(LedgerError::JobUserMismatch {
                expected: UserId::new(),
                actual: UserId::new(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("LEDGER_ERR_"),
                "Error missing LEDGER_ERR_ prefix: {msg}"
            );
        }
    }
}
