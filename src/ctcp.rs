//! CTCP ACTION framing.
//!
//! An action (`/me waves`) travels as a PRIVMSG whose text is wrapped in the
//! CTCP envelope `\x01ACTION waves\x01`.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp;
//!
//! let wrapped = ctcp::action("dances");
//! assert_eq!(wrapped, "\x01ACTION dances\x01");
//! assert_eq!(ctcp::parse_action(&wrapped), Some("dances"));
//! assert_eq!(ctcp::parse_action("just talking"), None);
//! ```

/// The CTCP delimiter character (`\x01`).
pub(crate) const CTCP_DELIM: char = '\x01';

/// Opening of an ACTION envelope, delimiter and trailing space included.
pub const ACTION_PREFIX: &str = "\x01ACTION ";

/// Closing of an ACTION envelope.
pub const ACTION_SUFFIX: &str = "\x01";

/// Wrap `text` in an ACTION envelope.
pub fn action(text: &str) -> String {
    let mut wrapped = String::with_capacity(ACTION_PREFIX.len() + text.len() + 1);
    wrapped.push_str(ACTION_PREFIX);
    wrapped.push_str(text);
    wrapped.push(CTCP_DELIM);
    wrapped
}

/// Unwrap an ACTION envelope.
///
/// Returns `None` unless `text` starts with `\x01ACTION ` and ends with
/// `\x01`.
pub fn parse_action(text: &str) -> Option<&str> {
    text.strip_prefix(ACTION_PREFIX)?.strip_suffix(ACTION_SUFFIX)
}
