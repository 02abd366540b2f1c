use crate::connection::ConnectionConfig;

/// Default reason sent with QUIT.
pub const DEFAULT_QUIT_MESSAGE: &str = "Bye!";

/// Identity and connection settings for a [`Client`](super::Client).
///
/// `nick`, `hostname`, `servername` and `realname` go out in the
/// registration handshake as `NICK <nick>` and
/// `USER <nick> <hostname> <servername> :<realname>`. `servername` is also
/// named in PONG replies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Nickname to register.
    pub nick: String,
    /// Host name sent in USER.
    pub hostname: String,
    /// Server name sent in USER and used in PONG replies.
    pub servername: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Server to dial, `host` or `host:port`.
    pub server: String,
    /// Reason sent with QUIT.
    pub quit_message: String,
    /// Socket settings.
    pub connection: ConnectionConfig,
}

impl ClientConfig {
    /// Config for `nick` on `server`, everything else defaulted.
    pub fn new<N: Into<String>, S: Into<String>>(nick: N, server: S) -> Self {
        Self {
            nick: nick.into(),
            server: server.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nick: "slirc".to_string(),
            hostname: "localhost".to_string(),
            servername: "localhost".to_string(),
            realname: "slirc client".to_string(),
            server: "localhost".to_string(),
            quit_message: DEFAULT_QUIT_MESSAGE.to_string(),
            connection: ConnectionConfig::default(),
        }
    }
}
