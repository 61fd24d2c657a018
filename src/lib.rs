//! Send orchestration for previously-composed mail messages.
//!
//! This crate is not an SMTP client: delivery happens inside a pluggable
//! [`Transport`] reached through a narrow seam. What lives here is the part
//! worth getting right once:
//!
//! - Deriving the envelope from a message's header fields: `"Sender"`
//!   overriding `"From"`, recipients folded from To/Cc/Bcc into one
//!   deduplicated, order-preserving list, every address validated as an
//!   RFC 5322 mailbox
//! - Dispatching through the transport's skip-capable or all-or-nothing
//!   entry point, negotiated via [`Transport::supports_skip`]
//! - Collecting per-recipient failures across a batch and surfacing them as
//!   one composite error, kept distinct from "the send itself failed"
//!
//! ```
//! use std::io::{self, Write};
//!
//! use gomail::{Message, send, transport::InMemory};
//!
//! struct Composed {
//!     from: Vec<String>,
//!     to: Vec<String>,
//!     body: Vec<u8>,
//! }
//!
//! impl Message for Composed {
//!     fn field_values(&self, name: &str) -> &[String] {
//!         match name {
//!             "From" => &self.from,
//!             "To" => &self.to,
//!             _ => &[],
//!         }
//!     }
//!
//!     fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
//!         out.write_all(&self.body)
//!     }
//! }
//!
//! # async fn example() -> Result<(), gomail::SendError> {
//! let message = Composed {
//!     from: vec!["orders@shop.example".into()],
//!     to: vec!["Customer <customer@mail.example>".into()],
//!     body: b"Subject: Receipt\r\n\r\nThanks!".to_vec(),
//! };
//!
//! let mut transport = InMemory::new();
//! send(&mut transport, &[message]).await?;
//! assert_eq!(transport.sent()[0].recipients, ["customer@mail.example"]);
//! # Ok(())
//! # }
//! ```

mod envelope;
mod error;
mod message;
mod send;
pub mod transport;

pub use envelope::{Envelope, parse_address};
pub use error::{
    AddressError, BoxError, EnvelopeError, RcptError, RcptErrors, SKIP_RCPT_PREFIX, SendError,
};
pub use message::Message;
pub use send::send;
pub use transport::{SendFn, Transport};
