//! Envelope derivation from message header fields.
//!
//! The envelope is the transport-level sender and recipient set, distinct
//! from the display headers shown to recipients. It is recomputed for every
//! send attempt and never outlives the call that derived it.

use mailparse::MailAddr;
use serde::Serialize;

use crate::{
    error::{AddressError, EnvelopeError},
    message::Message,
};

/// Recipient-bearing fields, in the order their addresses are merged.
const RECIPIENT_FIELDS: [&str; 3] = ["To", "Cc", "Bcc"];

/// The transport-level sender and recipients derived from a message.
///
/// Invariants: the sender is a valid RFC 5322 mailbox in canonical
/// `local-part@domain` form, and every recipient is valid and appears exactly
/// once, in order of first occurrence across the To, Cc, and Bcc fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    from: String,
    recipients: Vec<String>,
}

impl Envelope {
    /// Derive the envelope from a message's header fields.
    ///
    /// The sender comes from the first value of `"Sender"`, which always wins
    /// over `"From"` when it holds any value; `"From"` is the fallback.
    /// Recipients are the deduplicated union of the `"To"`, `"Cc"`, and
    /// `"Bcc"` values. A message with zero recipients is not an error at this
    /// layer; a transport may still reject the empty set.
    ///
    /// # Errors
    ///
    /// [`EnvelopeError::MissingSender`] when neither `"Sender"` nor `"From"`
    /// holds a value, and [`EnvelopeError::InvalidAddress`] when any value in
    /// play is not a single RFC 5322 mailbox.
    pub fn from_message<M: Message + ?Sized>(message: &M) -> Result<Self, EnvelopeError> {
        Ok(Self {
            from: sender_of(message)?,
            recipients: recipients_of(message)?,
        })
    }

    /// The envelope sender, in canonical form.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// The envelope recipients, deduplicated, in first-occurrence order.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

/// Parse one raw header value as a single RFC 5322 mailbox and return its
/// canonical `local-part@domain` form, discarding any display name and
/// comment syntax.
///
/// # Errors
///
/// [`EnvelopeError::InvalidAddress`] carrying the offending raw value and the
/// root cause when `value` is not exactly one mailbox.
pub fn parse_address(value: &str) -> Result<String, EnvelopeError> {
    let invalid = |source| EnvelopeError::InvalidAddress {
        value: value.to_owned(),
        source,
    };

    let parsed = mailparse::addrparse(value).map_err(|e| invalid(AddressError::Parse(e)))?;

    match parsed.as_slice() {
        [MailAddr::Single(single)] if is_mailbox(&single.addr) => Ok(single.addr.clone()),
        [MailAddr::Single(_)] => Err(invalid(AddressError::Incomplete)),
        [MailAddr::Group(_)] => Err(invalid(AddressError::Group)),
        addrs => Err(invalid(AddressError::MailboxCount(addrs.len()))),
    }
}

/// A canonical mailbox has a non-empty local part and a non-empty domain.
fn is_mailbox(addr: &str) -> bool {
    addr.split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

fn sender_of<M: Message + ?Sized>(message: &M) -> Result<String, EnvelopeError> {
    let mut values = message.field_values("Sender");
    if values.is_empty() {
        values = message.field_values("From");
    }

    values
        .first()
        .ok_or(EnvelopeError::MissingSender)
        .and_then(|raw| parse_address(raw))
}

fn recipients_of<M: Message + ?Sized>(message: &M) -> Result<Vec<String>, EnvelopeError> {
    let capacity = RECIPIENT_FIELDS
        .iter()
        .map(|field| message.field_values(field).len())
        .sum();
    let mut list = Vec::with_capacity(capacity);

    for field in RECIPIENT_FIELDS {
        for raw in message.field_values(field) {
            let addr = parse_address(raw)?;
            add_address(&mut list, addr);
        }
    }

    Ok(list)
}

/// Append `addr` unless an equal canonical address is already present.
///
/// The membership check is a linear scan with exact, case-sensitive string
/// equality; envelopes stay small enough (server-side recipient limits bound
/// them) that the quadratic worst case is an accepted ceiling.
fn add_address(list: &mut Vec<String>, addr: String) {
    if !list.iter().any(|existing| *existing == addr) {
        list.push(addr);
    }
}
