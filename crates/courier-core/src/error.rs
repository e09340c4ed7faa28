//! Error types for the core library.

use thiserror::Error;

use crate::ids::MessageId;
use crate::message::ValidationError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Inbound message failed validation before any identifier was assigned.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed argument (bad folder index, unparsable id, bad address).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Account has no folder set.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Message or folder entry does not exist.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Folder set or account already provisioned.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The message was stored but some fan-out deliveries failed.
    ///
    /// The message id stays valid and retrievable.
    #[error("Message {message_id} partially delivered: {}", .failures.join("; "))]
    PartialDelivery {
        /// Identifier of the stored message.
        message_id: MessageId,
        /// One description per failed delivery.
        failures: Vec<String>,
    },

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A storage invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the taxonomy bucket the transport layer maps to a status.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(ValidationError::SenderNotRegistered)
            | Self::AccountNotFound(_)
            | Self::MessageNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) | Self::InvalidArgument(_) | Self::Config(_) => {
                ErrorKind::InvalidArgument
            }
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::PartialDelivery { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Internal(format!("{what} lock poisoned"))
    }
}

/// Closed error taxonomy exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input.
    InvalidArgument,
    /// Unknown account, message, or folder entry.
    NotFound,
    /// Duplicate provisioning or registration.
    AlreadyExists,
    /// Storage invariant violation or partial fan-out.
    Internal,
}

impl ErrorKind {
    /// Stable numeric code.
    ///
    /// Positive codes are operational errors, negative codes are faults.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::AlreadyExists => 102,
            Self::InvalidArgument => 201,
            Self::NotFound => 302,
            Self::Internal => -500,
        }
    }

    /// Short human-readable text for the code.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::AlreadyExists => "Already Exists",
            Self::InvalidArgument => "Arg Invalid",
            Self::NotFound => "Not Found",
            Self::Internal => "Internal Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code(), self.text())
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
