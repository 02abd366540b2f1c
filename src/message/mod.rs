//! The IRC message type and its line codec.
//!
//! [`decode`] turns one text line into a [`Message`], and [`encode`] turns a
//! [`Message`] back into a CRLF-terminated line. Both are lenient: problems
//! with the input are reported as [`Anomaly`](crate::error::Anomaly) values
//! next to the best-effort result instead of failing the call.

mod parse;
mod serialize;
mod types;

pub use self::parse::{decode, Decoded};
pub use self::serialize::{encode, Encoded, MAX_MESSAGE};
pub use self::types::Message;
