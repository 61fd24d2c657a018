//! Typed error handling for envelope extraction and batch sends.
//!
//! Two layers mirror the two ways a send can go wrong:
//! - [`EnvelopeError`]: a message's headers cannot produce a valid envelope
//! - [`SendError`]: the batch-level outcome, either a hard failure pinned to
//!   one message position or the composite "sent with skipped recipients"
//!   result, which callers can tell apart via [`SendError::is_skip_rcpt`]

use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
};

use thiserror::Error;

/// Boxed error type transports report their failures through.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rendered prefix of the composite skip error.
///
/// Kept stable so callers that match on rendered text keep working; new code
/// should call [`SendError::is_skip_rcpt`] instead of inspecting strings.
pub const SKIP_RCPT_PREFIX: &str = "gomail: email sent with skipped recipients";

/// Reasons a raw header value is not a single RFC 5322 mailbox.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The value does not parse as an address at all.
    #[error(transparent)]
    Parse(#[from] mailparse::MailParseError),

    /// The value parsed as group syntax rather than one mailbox.
    #[error("group syntax is not a single mailbox")]
    Group,

    /// The value parsed, but without both a local part and a domain.
    #[error("address is not of the form local-part@domain")]
    Incomplete,

    /// The value parsed as an address list of the wrong length.
    #[error("expected exactly one mailbox, found {0}")]
    MailboxCount(usize),
}

/// Errors produced while deriving an envelope from message headers.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// A header value failed RFC 5322 mailbox parsing.
    #[error("gomail: invalid address {value:?}: {source}")]
    InvalidAddress {
        /// The raw header value that failed to parse.
        value: String,
        #[source]
        source: AddressError,
    },

    /// Neither "Sender" nor "From" holds a value.
    #[error("gomail: invalid message, \"From\" field is absent")]
    MissingSender,
}

/// One failed delivery attempt to one recipient within a single message send.
#[derive(Debug, Error)]
#[error("could not deliver to {recipient}: {cause}")]
pub struct RcptError {
    recipient: String,
    #[source]
    cause: BoxError,
}

impl RcptError {
    /// Record that delivery to `recipient` failed with `cause`.
    pub fn new(recipient: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            recipient: recipient.into(),
            cause: cause.into(),
        }
    }

    /// The address that could not be reached.
    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// The transport's reason for the failure.
    #[must_use]
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync) {
        self.cause.as_ref()
    }
}

/// Per-recipient failures accumulated across one batch send, in batch order.
///
/// The same address may appear more than once when distinct messages fail for
/// it. One instance lives per [`send`](crate::send) call; it is created
/// empty, appended to per message, and consumed into
/// [`SendError::SkippedRecipients`] at the end of the batch.
#[derive(Debug, Default)]
pub struct RcptErrors(pub Vec<RcptError>);

impl RcptErrors {
    /// Affected recipient addresses, in batch order.
    #[must_use]
    pub fn rcpts(&self) -> Vec<&str> {
        self.iter().map(RcptError::recipient).collect()
    }

    fn affected(&self) -> String {
        self.rcpts().join(", ")
    }
}

impl Display for RcptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            Display::fmt(err, f)?;
        }
        Ok(())
    }
}

impl From<Vec<RcptError>> for RcptErrors {
    fn from(value: Vec<RcptError>) -> Self {
        Self(value)
    }
}

impl Deref for RcptErrors {
    type Target = Vec<RcptError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RcptErrors {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Extend<RcptError> for RcptErrors {
    fn extend<I: IntoIterator<Item = RcptError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for RcptErrors {
    type Item = RcptError;
    type IntoIter = std::vec::IntoIter<RcptError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Top-level error returned by a batch send.
///
/// Hard failures abort the batch at the failing message and carry its 1-based
/// position; the skip variant is only produced after every message was
/// dispatched and means delivery succeeded except for the listed recipients.
#[derive(Debug, Error)]
pub enum SendError {
    /// A message's headers could not produce a valid envelope.
    #[error("gomail: could not send email {index}: {source}")]
    Envelope {
        /// 1-based position of the failing message in the batch.
        index: usize,
        #[source]
        source: EnvelopeError,
    },

    /// The transport failed in a way not attributable to one recipient.
    #[error("gomail: could not send email {index}: {source}")]
    Transport {
        /// 1-based position of the failing message in the batch.
        index: usize,
        #[source]
        source: BoxError,
    },

    /// Delivery succeeded except for the listed recipients.
    #[error("{}: [{}], error: {}", SKIP_RCPT_PREFIX, .0.affected(), .0)]
    SkippedRecipients(RcptErrors),
}

impl SendError {
    /// Returns `true` exactly when this error came from the composite-skip
    /// path, i.e. the send itself succeeded but some recipients bounced.
    #[must_use]
    pub const fn is_skip_rcpt(&self) -> bool {
        matches!(self, Self::SkippedRecipients(_))
    }

    /// The per-recipient failures, when this is the composite skip error.
    #[must_use]
    pub const fn skipped(&self) -> Option<&RcptErrors> {
        match self {
            Self::SkippedRecipients(errors) => Some(errors),
            Self::Envelope { .. } | Self::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::error::Error as StdError;

    use super::*;

    fn refused(recipient: &str) -> RcptError {
        RcptError::new(recipient, format!("mailbox {recipient} unavailable"))
    }

    #[test]
    fn test_skip_error_rendering_starts_with_prefix() {
        let err = SendError::SkippedRecipients(vec![refused("a@example.com")].into());
        assert!(err.to_string().starts_with(SKIP_RCPT_PREFIX));
        assert_eq!(
            err.to_string(),
            "gomail: email sent with skipped recipients: [a@example.com], \
             error: could not deliver to a@example.com: mailbox a@example.com unavailable"
        );
    }

    #[test]
    fn test_skip_predicate_tracks_variant() {
        let skip = SendError::SkippedRecipients(vec![refused("a@example.com")].into());
        assert!(skip.is_skip_rcpt());
        assert!(skip.skipped().is_some());

        let hard = SendError::Transport {
            index: 1,
            source: "connection refused".into(),
        };
        assert!(!hard.is_skip_rcpt());
        assert!(hard.skipped().is_none());
        assert!(!hard.to_string().starts_with(SKIP_RCPT_PREFIX));

        let envelope = SendError::Envelope {
            index: 1,
            source: EnvelopeError::MissingSender,
        };
        assert!(!envelope.is_skip_rcpt());
    }

    #[test]
    fn test_hard_error_carries_position_and_cause() {
        let err = SendError::Transport {
            index: 3,
            source: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "gomail: could not send email 3: connection refused"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_envelope_error_is_position_wrapped() {
        let err = SendError::Envelope {
            index: 1,
            source: EnvelopeError::MissingSender,
        };
        assert_eq!(
            err.to_string(),
            "gomail: could not send email 1: gomail: invalid message, \"From\" field is absent"
        );
    }

    #[test]
    fn test_rcpts_preserves_batch_order_and_duplicates() {
        let errors: RcptErrors = vec![
            refused("b@example.com"),
            refused("a@example.com"),
            refused("b@example.com"),
        ]
        .into();
        assert_eq!(
            errors.rcpts(),
            ["b@example.com", "a@example.com", "b@example.com"]
        );
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_rcpt_error_source_chain() {
        let err = refused("a@example.com");
        assert_eq!(err.recipient(), "a@example.com");
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.cause().to_string(), "mailbox a@example.com unavailable");
    }
}
