use std::fmt;

use super::{Decoded, Encoded};

/// A structured but largely uninterpreted IRC message.
///
/// Numeric replies have already been translated to their symbolic names by the
/// decoder, so `command` reads `RPL_WELCOME` rather than `001`.
///
/// # Example
///
/// ```
/// use slirc_client::Message;
///
/// let msg = Message::privmsg("#channel", "Hello!");
/// assert_eq!(msg.encode().line, "PRIVMSG #channel :Hello!\r\n");
///
/// let decoded = Message::decode(":nick!user@host PRIVMSG #channel :Hello!");
/// let msg = decoded.message.unwrap();
/// assert_eq!(msg.source_nickname(), Some("nick"));
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Sender identity without the leading colon (`nick!user@host` or a server name).
    pub prefix: Option<String>,
    /// The command, `None` when the line carried none.
    pub command: Option<String>,
    /// Parameters in wire order; the last one may contain spaces.
    pub params: Vec<String>,
}

impl Message {
    /// Create a message from raw components.
    pub fn new<C, I, P>(prefix: Option<&str>, command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Message {
            prefix: prefix.map(str::to_owned),
            command: Some(command.into()),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    fn from_parts(command: &str, params: Vec<String>) -> Self {
        Message {
            prefix: None,
            command: Some(command.to_owned()),
            params,
        }
    }

    /// Decode one line. See [`decode`](super::decode).
    pub fn decode(line: &str) -> Decoded {
        super::decode(line)
    }

    /// Encode to a CRLF-terminated line. See [`encode`](super::encode).
    pub fn encode(&self) -> Encoded {
        super::encode(self)
    }

    /// Attach a prefix, replacing any existing one.
    #[must_use]
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// True when the command equals `command` exactly.
    pub fn is(&self, command: &str) -> bool {
        self.command.as_deref() == Some(command)
    }

    /// Get the parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Get the last parameter, usually the trailing text.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Get the parameter `back` places before the last one.
    ///
    /// `param_from_end(0)` is the last parameter, `param_from_end(1)` the one
    /// before it. Several numerics put the channel second to last.
    pub fn param_from_end(&self, back: usize) -> Option<&str> {
        let index = self.params.len().checked_sub(back + 1)?;
        self.param(index)
    }

    /// Get the bare nickname from the prefix.
    ///
    /// This is the text before `!` in `nick!user@host`, or the whole prefix
    /// when there is no `!`.
    pub fn source_nickname(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    /// Create a PRIVMSG message to a target with text
    #[must_use]
    pub fn privmsg<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Self::from_parts("PRIVMSG", vec![target.into(), text.into()])
    }

    /// Create a NICK message
    #[must_use]
    pub fn nick<N: Into<String>>(nickname: N) -> Self {
        Self::from_parts("NICK", vec![nickname.into()])
    }

    /// Create a USER message: `USER <nick> <hostname> <servername> :<realname>`.
    #[must_use]
    pub fn user(nick: &str, hostname: &str, servername: &str, realname: &str) -> Self {
        Self::new(None, "USER", [nick, hostname, servername, realname])
    }

    /// Create a JOIN message
    #[must_use]
    pub fn join<C: Into<String>>(channel: C) -> Self {
        Self::from_parts("JOIN", vec![channel.into()])
    }

    /// Create a PART message
    #[must_use]
    pub fn part<C: Into<String>>(channel: C) -> Self {
        Self::from_parts("PART", vec![channel.into()])
    }

    /// Create a QUIT message
    #[must_use]
    pub fn quit<M: Into<String>>(reason: M) -> Self {
        Self::from_parts("QUIT", vec![reason.into()])
    }

    /// Create a PONG message answering `server` on behalf of `servername`.
    #[must_use]
    pub fn pong(servername: &str, server: &str) -> Self {
        Self::new(None, "PONG", [servername, server])
    }
}

/// Compact log form: `[prefix command ['param' 'param']]`.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} [",
            self.prefix.as_deref().unwrap_or("-"),
            self.command.as_deref().unwrap_or("-")
        )?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "'{}'", param)?;
        }
        f.write_str("]]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_nickname() {
        let msg = Message::privmsg("#c", "hi").with_prefix("alice!ali@example.com");
        assert_eq!(msg.source_nickname(), Some("alice"));

        let msg = Message::privmsg("#c", "hi").with_prefix("irc.example.com");
        assert_eq!(msg.source_nickname(), Some("irc.example.com"));

        assert_eq!(Message::privmsg("#c", "hi").source_nickname(), None);
    }

    #[test]
    fn test_param_accessors() {
        let msg = Message::new(None, "RPL_TOPIC", ["me", "#rust", "Rust talk"]);
        assert_eq!(msg.param(0), Some("me"));
        assert_eq!(msg.trailing(), Some("Rust talk"));
        assert_eq!(msg.param_from_end(1), Some("#rust"));
        assert_eq!(msg.param_from_end(3), None);
        assert!(msg.is("RPL_TOPIC"));
        assert!(!msg.is("TOPIC"));
    }

    #[test]
    fn test_display() {
        let msg = Message::privmsg("#rust", "hello there").with_prefix("nick!u@h");
        assert_eq!(msg.to_string(), "[nick!u@h PRIVMSG ['#rust' 'hello there']]");

        let empty = Message::default();
        assert_eq!(empty.to_string(), "[- - []]");
    }

    #[test]
    fn test_structural_equality() {
        let a = Message::new(Some("p"), "CMD", ["x", "y"]);
        let b = Message::new(Some("p"), "CMD", ["x", "y"]);
        let c = Message::new(Some("p"), "CMD", ["y", "x"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
