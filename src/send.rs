//! Batch send orchestration.

use crate::{
    envelope::Envelope,
    error::{RcptErrors, SendError},
    message::Message,
    transport::Transport,
};

/// Send each message through `transport`, in input order.
///
/// The transport's capability is queried once for the batch; for every
/// message the envelope is derived fresh from its headers and the matching
/// entry point is invoked. Messages are dispatched strictly sequentially so
/// a failure is attributable to exactly one of them.
///
/// Per-recipient failures reported by a skip-capable transport do not abort
/// the batch; they are collected and, once every message has been
/// dispatched, surfaced together as [`SendError::SkippedRecipients`], the
/// only outcome for which [`SendError::is_skip_rcpt`] returns `true`.
///
/// # Errors
///
/// Fails fast with a position-wrapped error on the first message whose
/// envelope cannot be derived ([`SendError::Envelope`]) or whose transport
/// call fails hard ([`SendError::Transport`]); remaining messages are not
/// attempted. Otherwise returns [`SendError::SkippedRecipients`] when any
/// recipients bounced, and `Ok(())` when none did.
#[tracing::instrument(level = "debug", skip_all, fields(messages = messages.len()))]
pub async fn send<T, M>(transport: &mut T, messages: &[M]) -> Result<(), SendError>
where
    T: Transport + ?Sized,
    M: Message,
{
    // The capability is a property of the transport instance, not of any
    // message: query it once for the whole batch.
    let skip_capable = transport.supports_skip();
    let mut skipped = RcptErrors::default();

    for (position, message) in messages.iter().enumerate() {
        let index = position + 1;
        let envelope = Envelope::from_message(message)
            .map_err(|source| SendError::Envelope { index, source })?;

        tracing::debug!(
            index,
            from = envelope.sender(),
            recipients = ?envelope.recipients(),
            "dispatching message"
        );

        if skip_capable {
            let failed = transport
                .send_skippable(envelope.sender(), envelope.recipients(), message)
                .await
                .map_err(|source| SendError::Transport { index, source })?;
            skipped.extend(failed);
        } else {
            transport
                .send_all(envelope.sender(), envelope.recipients(), message)
                .await
                .map_err(|source| SendError::Transport { index, source })?;
        }
    }

    if skipped.is_empty() {
        Ok(())
    } else {
        tracing::warn!(recipients = ?skipped.rcpts(), "delivered with skipped recipients");
        Err(SendError::SkippedRecipients(skipped))
    }
}
