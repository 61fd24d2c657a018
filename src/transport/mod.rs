//! The delivery transport seam and its adapters.
//!
//! A [`Transport`] is the external collaborator that actually moves mail:
//! an SMTP client, a relay pool, a queue. This core never dials or
//! authenticates; it negotiates one capability (per-recipient failure
//! reporting) and dispatches into the matching entry point.

mod memory;

use async_trait::async_trait;

use crate::{
    error::{BoxError, RcptErrors},
    message::Message,
};

pub use memory::{InMemory, Rejected, SentMessage};

/// A delivery backend for composed messages.
///
/// Implementations own every network concern: connections, pooling, TLS,
/// authentication, timeouts. Errors they return are propagated to the caller
/// untransformed, apart from batch-position wrapping. Whether a single
/// instance may be shared across concurrent sends is the implementation's
/// contract, not this crate's.
#[async_trait]
pub trait Transport: Send {
    /// Deliver to all recipients as one atomic unit.
    ///
    /// # Errors
    ///
    /// Any failure, including a single bad recipient, is one error and the
    /// whole call counts as failed.
    async fn send_all(
        &mut self,
        from: &str,
        recipients: &[String],
        message: &dyn Message,
    ) -> Result<(), BoxError>;

    /// Deliver while tolerating per-recipient failures.
    ///
    /// Returns the recipients that could not be reached, possibly none. The
    /// default routes through [`send_all`](Self::send_all), reporting no
    /// per-recipient detail; transports that can keep delivering past a bad
    /// recipient override this.
    ///
    /// # Errors
    ///
    /// Only failures that are not attributable to a specific recipient, such
    /// as a lost connection.
    async fn send_skippable(
        &mut self,
        from: &str,
        recipients: &[String],
        message: &dyn Message,
    ) -> Result<RcptErrors, BoxError> {
        self.send_all(from, recipients, message).await?;
        Ok(RcptErrors::default())
    }

    /// Whether this transport should be driven through
    /// [`send_skippable`](Self::send_skippable).
    fn supports_skip(&self) -> bool {
        false
    }
}

/// Adapter that lets an ordinary all-or-nothing send function act as a
/// [`Transport`].
///
/// The wrapped function receives the envelope sender, the recipient list,
/// and the serialized message bytes. The resulting transport never reports
/// per-recipient failures: `supports_skip` stays `false`.
///
/// ```
/// use gomail::{BoxError, SendFn};
///
/// let mut transport = SendFn(|from: &str, to: &[String], body: &[u8]| {
///     println!("{} -> {:?} ({} bytes)", from, to, body.len());
///     Ok::<(), BoxError>(())
/// });
/// # let _ = &mut transport;
/// ```
pub struct SendFn<F>(pub F);

#[async_trait]
impl<F> Transport for SendFn<F>
where
    F: FnMut(&str, &[String], &[u8]) -> Result<(), BoxError> + Send,
{
    async fn send_all(
        &mut self,
        from: &str,
        recipients: &[String],
        message: &dyn Message,
    ) -> Result<(), BoxError> {
        let mut body = Vec::new();
        message.write_to(&mut body)?;
        (self.0)(from, recipients, &body)
    }
}
