//! # slirc-client
//!
//! A small, blocking IRC client library: a message codec, a line-oriented
//! TCP connection, and a client state machine that reports what it sees to a
//! pluggable controller.
//!
//! ## Features
//!
//! - IRC message decoding and encoding with prefix, command and parameters
//! - Numeric replies translated to symbolic names (`353` → `RPL_NAMREPLY`)
//! - Tolerant decoding: malformed input is reported as [`Anomaly`] values
//!   next to a best-effort result instead of failing
//! - Blocking TCP connection with bounded read timeouts and bounded send retry
//! - Registration, PING/PONG, topics, names and CTCP ACTION handled for you
//! - Optional `serde` support for configuration and messages
//! - Optional `encoding` support for non-UTF-8 servers

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Decoding and encoding
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let decoded = Message::decode(":nick!user@host PRIVMSG #rust :Hello there");
//! let message = decoded.message.unwrap();
//! assert_eq!(message.source_nickname(), Some("nick"));
//! assert_eq!(message.params, vec!["#rust", "Hello there"]);
//!
//! let numeric = Message::decode(":srv 353 bot = #rust :@alice bob").message.unwrap();
//! assert_eq!(numeric.command.as_deref(), Some("RPL_NAMREPLY"));
//!
//! let encoded = Message::privmsg("#rust", "Hi!").encode();
//! assert_eq!(encoded.line, "PRIVMSG #rust :Hi!\r\n");
//! assert!(encoded.anomalies.is_empty());
//! ```
//!
//! ### Writing a bot
//!
//! ```no_run
//! use slirc_client::{Client, ClientConfig, Context, Controller};
//!
//! struct Greeter;
//!
//! impl Controller for Greeter {
//!     fn handle_message(&mut self, context: &mut Context<'_>, text: &str) {
//!         if text == "hello" {
//!             let reply = format!("hello, {}", context.nick());
//!             context.speak(&reply);
//!         }
//!     }
//! }
//!
//! # fn main() -> slirc_client::error::Result<()> {
//! let mut client = Client::new(ClientConfig::new("greeter", "irc.libera.chat"), Greeter);
//! client.connect()?;
//! client.join("#slirc");
//! client.run()
//! # }
//! ```

pub mod chan;
pub mod client;
pub mod connection;
pub mod ctcp;
pub mod error;
pub mod line;
pub mod message;
pub mod response;
pub mod util;

pub use self::chan::ChannelExt;
pub use self::client::{
    Client, ClientConfig, ClientState, Context, Controller, LoggingController, Session,
};
pub use self::connection::{Connection, ConnectionConfig, Outbound, RetryPolicy, ServerAddress};
pub use self::error::{Anomaly, ProtocolError};
pub use self::message::{Decoded, Encoded, Message};
pub use self::response::Response;
