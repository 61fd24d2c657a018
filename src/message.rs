//! The read-only surface of a composed message.
//!
//! Message construction (headers, MIME parts, attachments) happens elsewhere;
//! this core only reads header fields to derive an envelope and hands the
//! serialized content to the transport untouched.

use std::io::{self, Write};

/// A previously-composed message.
///
/// Field names are canonical and case-sensitive (`"To"`, not `"to"`); an
/// absent field yields an empty slice. Values are raw header field values in
/// their stored order.
pub trait Message: Send + Sync {
    /// The ordered raw values stored for the field `name`.
    fn field_values(&self, name: &str) -> &[String];

    /// Serialize the composed message for the transport.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error raised by `out`.
    fn write_to(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl<M: Message + ?Sized> Message for &M {
    fn field_values(&self, name: &str) -> &[String] {
        (**self).field_values(name)
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        (**self).write_to(out)
    }
}

impl<M: Message + ?Sized> Message for Box<M> {
    fn field_values(&self, name: &str) -> &[String] {
        (**self).field_values(name)
    }

    fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        (**self).write_to(out)
    }
}
