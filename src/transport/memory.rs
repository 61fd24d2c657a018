//! In-memory transport for tests and local pipelines.

use ahash::AHashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::{BoxError, RcptError, RcptErrors},
    message::Message,
    transport::Transport,
};

/// A message captured by [`InMemory`], exactly as the transport received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    /// Envelope sender.
    pub from: String,
    /// Recipients the message was delivered to.
    pub recipients: Vec<String>,
    /// Serialized message content.
    pub body: Vec<u8>,
}

/// Refusal returned for addresses configured via [`InMemory::reject`].
#[derive(Debug, Error)]
#[error("address {0} rejected")]
pub struct Rejected(pub String);

/// Transport that stores messages in memory instead of delivering them.
///
/// Useful for unit and integration testing and for dry runs: captured
/// messages can be inspected through [`sent`](Self::sent). Addresses added
/// with [`reject`](Self::reject) are refused; a rejected envelope sender
/// fails the whole call in both modes, while a rejected recipient is either
/// a whole-call failure (skip disabled) or one reported [`RcptError`]
/// (skip enabled).
#[derive(Debug, Default)]
pub struct InMemory {
    skip_err_rcpt: bool,
    rejected: AHashSet<String>,
    sent: Vec<SentMessage>,
}

impl InMemory {
    /// Create an empty transport that accepts every address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-recipient failure reporting.
    #[must_use]
    pub fn skip_err_rcpt(mut self, skip: bool) -> Self {
        self.skip_err_rcpt = skip;
        self
    }

    /// Refuse delivery involving `address`.
    #[must_use]
    pub fn reject(mut self, address: impl Into<String>) -> Self {
        self.rejected.insert(address.into());
        self
    }

    /// The messages delivered so far, in delivery order.
    #[must_use]
    pub fn sent(&self) -> &[SentMessage] {
        &self.sent
    }

    /// Drain the captured messages.
    pub fn take_sent(&mut self) -> Vec<SentMessage> {
        std::mem::take(&mut self.sent)
    }

    fn serialize(message: &dyn Message) -> Result<Vec<u8>, BoxError> {
        let mut body = Vec::new();
        message.write_to(&mut body)?;
        Ok(body)
    }

    fn store(&mut self, from: &str, recipients: Vec<String>, body: Vec<u8>) {
        tracing::debug!(
            from,
            recipients = ?recipients,
            bytes = body.len(),
            "message stored"
        );
        self.sent.push(SentMessage {
            from: from.to_owned(),
            recipients,
            body,
        });
    }
}

#[async_trait]
impl Transport for InMemory {
    async fn send_all(
        &mut self,
        from: &str,
        recipients: &[String],
        message: &dyn Message,
    ) -> Result<(), BoxError> {
        if self.rejected.contains(from) {
            return Err(Box::new(Rejected(from.to_owned())));
        }
        if let Some(refused) = recipients
            .iter()
            .find(|recipient| self.rejected.contains(recipient.as_str()))
        {
            return Err(Box::new(Rejected(refused.clone())));
        }

        let body = Self::serialize(message)?;
        self.store(from, recipients.to_vec(), body);
        Ok(())
    }

    async fn send_skippable(
        &mut self,
        from: &str,
        recipients: &[String],
        message: &dyn Message,
    ) -> Result<RcptErrors, BoxError> {
        // A refused sender is not a recipient-scoped condition.
        if self.rejected.contains(from) {
            return Err(Box::new(Rejected(from.to_owned())));
        }

        let body = Self::serialize(message)?;
        let mut failed = RcptErrors::default();
        let mut delivered = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if self.rejected.contains(recipient.as_str()) {
                failed.push(RcptError::new(
                    recipient.clone(),
                    Rejected(recipient.clone()),
                ));
            } else {
                delivered.push(recipient.clone());
            }
        }

        if !delivered.is_empty() {
            self.store(from, delivered, body);
        }
        Ok(failed)
    }

    fn supports_skip(&self) -> bool {
        self.skip_err_rcpt
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::{self, Write};

    use pretty_assertions::assert_eq;

    use super::*;

    struct RawMessage(&'static [u8]);

    impl Message for RawMessage {
        fn field_values(&self, _name: &str) -> &[String] {
            &[]
        }

        fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
            out.write_all(self.0)
        }
    }

    fn recipients(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_send_all_captures_the_message() {
        let mut transport = InMemory::new();
        transport
            .send_all(
                "a@example.com",
                &recipients(&["b@example.com"]),
                &RawMessage(b"Subject: hi\r\n\r\nbody"),
            )
            .await
            .unwrap();

        assert_eq!(
            transport.sent(),
            [SentMessage {
                from: "a@example.com".to_owned(),
                recipients: recipients(&["b@example.com"]),
                body: b"Subject: hi\r\n\r\nbody".to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn test_send_all_fails_whole_call_on_rejected_recipient() {
        let mut transport = InMemory::new().reject("b@example.com");
        let err = transport
            .send_all(
                "a@example.com",
                &recipients(&["b@example.com", "c@example.com"]),
                &RawMessage(b"body"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "address b@example.com rejected");
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_skippable_reports_rejected_recipients() {
        let mut transport = InMemory::new()
            .skip_err_rcpt(true)
            .reject("b@example.com");
        let failed = transport
            .send_skippable(
                "a@example.com",
                &recipients(&["b@example.com", "c@example.com"]),
                &RawMessage(b"body"),
            )
            .await
            .unwrap();

        assert_eq!(failed.rcpts(), ["b@example.com"]);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.sent()[0].recipients, recipients(&["c@example.com"]));
    }

    #[tokio::test]
    async fn test_rejected_sender_is_a_hard_failure_even_when_skipping() {
        let mut transport = InMemory::new()
            .skip_err_rcpt(true)
            .reject("a@example.com");
        let err = transport
            .send_skippable(
                "a@example.com",
                &recipients(&["b@example.com"]),
                &RawMessage(b"body"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "address a@example.com rejected");
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_is_stored_when_every_recipient_is_rejected() {
        let mut transport = InMemory::new()
            .skip_err_rcpt(true)
            .reject("b@example.com");
        let failed = transport
            .send_skippable(
                "a@example.com",
                &recipients(&["b@example.com"]),
                &RawMessage(b"body"),
            )
            .await
            .unwrap();

        assert_eq!(failed.rcpts(), ["b@example.com"]);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_skip_capability_follows_the_flag() {
        assert!(!InMemory::new().supports_skip());
        assert!(InMemory::new().skip_err_rcpt(true).supports_skip());
    }
}
