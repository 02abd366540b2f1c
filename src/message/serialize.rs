//! IRC line encoder.

use super::Message;
use crate::error::Anomaly;
use crate::util::truncate_utf8_safe;

/// Longest encoded line accepted by servers, excluding the CRLF.
pub const MAX_MESSAGE: usize = 510;

/// Result of encoding one message.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Encoded {
    /// The CRLF-terminated wire line.
    pub line: String,
    /// Problems found while encoding.
    pub anomalies: Vec<Anomaly>,
}

/// Encode a [`Message`] into a CRLF-terminated line.
///
/// The last parameter is always written in trailing form (`:text`). Symbolic
/// reply names are written as they are; they are not turned back into
/// numerics. Lines longer than [`MAX_MESSAGE`] bytes are cut at the nearest
/// character boundary and flagged with [`Anomaly::MessageTooLong`].
///
/// # Example
///
/// ```
/// use slirc_client::message::{encode, Message};
///
/// let msg = Message::privmsg("#rust", "hello world").with_prefix("bot");
/// assert_eq!(encode(&msg).line, ":bot PRIVMSG #rust :hello world\r\n");
/// ```
pub fn encode(message: &Message) -> Encoded {
    let mut anomalies = Vec::new();
    let mut line = String::with_capacity(MAX_MESSAGE + 2);

    if let Some(prefix) = &message.prefix {
        line.push(':');
        line.push_str(prefix);
        line.push(' ');
    }

    match &message.command {
        Some(command) => line.push_str(command),
        None => anomalies.push(Anomaly::MissingCommand),
    }

    if let Some((last, middle)) = message.params.split_last() {
        for param in middle {
            line.push(' ');
            line.push_str(param);
        }
        line.push_str(" :");
        line.push_str(last);
    }

    if line.len() > MAX_MESSAGE {
        anomalies.push(Anomaly::MessageTooLong {
            length: line.len(),
            limit: MAX_MESSAGE,
        });
        let keep = truncate_utf8_safe(&line, MAX_MESSAGE).len();
        line.truncate(keep);
    }

    line.push_str("\r\n");
    Encoded { line, anomalies }
}
