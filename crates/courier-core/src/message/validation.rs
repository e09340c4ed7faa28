//! Inbound message validation.

use super::model::Message;
use crate::Result;
use crate::account::{AccountDirectory, is_well_formed_email};

/// Why an inbound message was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender address is empty or too long.
    InvalidSenderEmail,
    /// Recipient list is empty.
    NoRecipients,
    /// No recipient address is well-formed.
    NoValidRecipients,
    /// Sender address is not a registered account.
    SenderNotRegistered,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidSenderEmail => "Invalid sender email format",
            Self::NoRecipients => "No recipients",
            Self::NoValidRecipients => "No valid recipient email formats",
            Self::SenderNotRegistered => "Sender is not registered",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidSenderEmail | Self::SenderNotRegistered => "sender_email",
            Self::NoRecipients | Self::NoValidRecipients => "recipients",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Validate an inbound message.
///
/// Checks run in a fixed order (sender format, recipient presence, recipient
/// format, sender registration) and the first failure is returned.
///
/// # Errors
///
/// Returns the first failing check as `Error::Validation`, or the
/// directory's own error if the registration lookup fails.
pub fn validate_message(
    message: &Message,
    max_email_len: usize,
    directory: &dyn AccountDirectory,
) -> Result<()> {
    if !is_well_formed_email(&message.sender_email, max_email_len) {
        return Err(ValidationError::InvalidSenderEmail.into());
    }
    if message.recipients.is_empty() {
        return Err(ValidationError::NoRecipients.into());
    }
    if !message
        .recipients
        .iter()
        .any(|r| is_well_formed_email(r, max_email_len))
    {
        return Err(ValidationError::NoValidRecipients.into());
    }
    if !directory.account_exists(&message.sender_email)? {
        return Err(ValidationError::SenderNotRegistered.into());
    }
    Ok(())
}
