//! IRC client state machine.
//!
//! A [`Client`] owns one [`Connection`], one [`Session`] and one
//! [`Controller`]. It is driven by calling [`Client::update`] in a loop (or
//! [`Client::run`], which does exactly that). Each update sends whatever the
//! current state calls for and then performs one bounded read, so the loop
//! never blocks for longer than [`ConnectionConfig::read_timeout`].
//!
//! ```text
//! START → OPEN → REGISTER → RUN → QUIT → CLOSE
//! ```
//!
//! # Example
//!
//! ```no_run
//! use slirc_client::{Client, ClientConfig, LoggingController};
//!
//! # fn main() -> slirc_client::error::Result<()> {
//! let config = ClientConfig::new("example_bot", "irc.libera.chat:6667");
//! let mut client = Client::new(config, LoggingController);
//! client.connect()?;
//! client.join("#example");
//! client.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ConnectionConfig::read_timeout`]: crate::connection::ConnectionConfig::read_timeout

mod config;
mod controller;
mod session;

pub use self::config::{ClientConfig, DEFAULT_QUIT_MESSAGE};
pub use self::controller::{Context, Controller, LoggingController};
pub use self::session::{ClientState, Session};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::connection::{Connection, ServerAddress};
use crate::ctcp;
use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::response::Response;

/// A single-connection IRC client.
///
/// Every method takes `&mut self`. A host that drives the loop from another
/// thread moves the whole client there.
#[derive(Debug)]
pub struct Client<C: Controller = LoggingController> {
    config: ClientConfig,
    connection: Option<Connection>,
    session: Session,
    controller: C,
}

impl<C: Controller> Client<C> {
    /// Create a client in the `START` state.
    pub fn new(config: ClientConfig, controller: C) -> Self {
        let session = Session::new(&config);
        Self {
            config,
            connection: None,
            session,
            controller,
        }
    }

    /// Connect to the configured server and move to `OPEN`.
    ///
    /// On failure the client stays where it was and the error is returned.
    pub fn connect(&mut self) -> Result<()> {
        let address = ServerAddress::parse(&self.config.server)?;
        let mut connection = Connection::new(address, self.config.connection.clone())?;
        connection.open()?;
        self.connection = Some(connection);
        self.session.set_state(ClientState::Open);
        Ok(())
    }

    /// Drop the connection and move to `CLOSE`.
    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.session.set_state(ClientState::Close);
    }

    /// Run one step of the state machine.
    ///
    /// In `OPEN` the registration messages go out; in `RUN` the outbound
    /// queue is flushed oldest first. Then one read is attempted and a decoded
    /// message is handed to [`process_message`](Self::process_message). When
    /// the connection is gone afterwards the client moves to `CLOSE`.
    ///
    /// Returns [`ProtocolError::NotConnected`] before [`connect`](Self::connect)
    /// and does nothing once `CLOSE` is reached.
    pub fn update(&mut self) -> Result<()> {
        match self.session.state() {
            ClientState::Start => return Err(ProtocolError::NotConnected),
            ClientState::Close => return Ok(()),
            _ => {}
        }

        let result = self.step();
        if !self.is_connected() {
            self.disconnect();
        }
        result
    }

    fn step(&mut self) -> Result<()> {
        match self.session.state() {
            ClientState::Open => self.register()?,
            ClientState::Run => self.flush()?,
            _ => {}
        }

        let decoded = match self.connection.as_mut() {
            Some(connection) => connection.read()?,
            None => None,
        };
        if let Some(message) = decoded.and_then(|decoded| decoded.message) {
            self.process_message(&message)?;
        }
        Ok(())
    }

    /// Call [`update`](Self::update) until the client reaches `CLOSE`.
    ///
    /// Stops early and returns the error if an update fails.
    pub fn run(&mut self) -> Result<()> {
        while self.session.state() != ClientState::Close {
            self.update()?;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_open)
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        self.connection.as_mut().ok_or(ProtocolError::NotConnected)
    }

    fn register(&mut self) -> Result<()> {
        let nick = Message::nick(self.session.nick());
        let user = Message::user(
            self.session.nick(),
            self.session.hostname(),
            self.session.servername(),
            self.session.realname(),
        );
        let connection = self.connection()?;
        connection.send(nick)?;
        connection.send(user)?;
        self.session.set_state(ClientState::Register);
        Ok(())
    }

    /// Send queued messages until the queue is empty. A message that fails
    /// to send stays at the front.
    fn flush(&mut self) -> Result<()> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(());
        };
        while let Some(message) = self.session.front().cloned() {
            connection.send(message)?;
            self.session.pop_front();
        }
        Ok(())
    }

    /// React to one inbound message.
    ///
    /// Tracks registration, topics and names, answers PING, and forwards
    /// people, messages and actions to the controller. A quit requested by
    /// the controller is carried out before this returns.
    pub fn process_message(&mut self, message: &Message) -> Result<()> {
        if self.session.state() == ClientState::Register && !message.is("NOTICE") {
            self.session.set_state(ClientState::Run);
        }

        match message.command.as_deref() {
            Some("RPL_TOPIC") => self.handle_topic(message),
            Some("RPL_NAMREPLY") => self.handle_names(message),
            Some("PRIVMSG") => self.handle_privmsg(message),
            Some("JOIN") => self.handle_join(message),
            Some("PING") => self.handle_ping(message),
            Some(other) => {
                if Response::from_name(other).is_some_and(|r| r.is_error()) {
                    warn!("Server error: {}", message);
                }
            }
            None => {}
        }

        match self.session.take_quit_request() {
            Some(reason) => self.send_quit(reason),
            None => Ok(()),
        }
    }

    fn handle_topic(&mut self, message: &Message) {
        match (message.param_from_end(1), message.trailing()) {
            (Some(channel), Some(topic)) => self.session.set_topic(channel, topic),
            _ => warn!("Malformed topic reply: {}", message),
        }
    }

    fn handle_names(&mut self, message: &Message) {
        let (Some(channel), Some(names)) = (message.param_from_end(1), message.trailing()) else {
            warn!("Malformed names reply: {}", message);
            return;
        };

        self.session.note_channel(channel);
        for name in names.split(' ').filter(|name| !name.is_empty()) {
            let (prefix, name) = match name.as_bytes()[0] {
                b'@' | b'+' => name.split_at(1),
                _ => ("", name),
            };
            self.controller
                .observe_person(&mut self.session, channel, prefix, name);
        }
    }

    fn handle_privmsg(&mut self, message: &Message) {
        let (Some(sender), Some(recipient), Some(text)) = (
            message.source_nickname(),
            message.param(0),
            message.trailing(),
        ) else {
            warn!("Malformed PRIVMSG: {}", message);
            return;
        };
        if message.params.len() < 2 {
            warn!("PRIVMSG without text: {}", message);
            return;
        }

        match ctcp::parse_action(text) {
            Some(action) => self
                .controller
                .observe_action(&mut self.session, sender, recipient, action),
            None => self
                .controller
                .observe_message(&mut self.session, sender, recipient, text),
        }
    }

    fn handle_join(&mut self, message: &Message) {
        match (message.source_nickname(), message.trailing()) {
            (Some(nick), Some(channel)) => {
                self.controller
                    .observe_person(&mut self.session, channel, "", nick)
            }
            _ => warn!("Malformed JOIN: {}", message),
        }
    }

    fn handle_ping(&mut self, message: &Message) {
        match message.trailing() {
            Some(server) => {
                let pong = Message::pong(self.session.servername(), server);
                self.session.send(pong);
            }
            None => warn!("PING without server: {}", message),
        }
    }

    fn send_quit(&mut self, reason: Option<String>) -> Result<()> {
        let reason = reason.unwrap_or_else(|| self.config.quit_message.clone());
        debug!("Quitting: {}", reason);
        self.connection()?.send(Message::quit(reason))?;
        self.session.set_state(ClientState::Quit);
        Ok(())
    }

    /// Send QUIT right away, skipping the queue, and move to `QUIT`.
    ///
    /// Messages still queued are never sent.
    pub fn quit(&mut self) -> Result<()> {
        self.send_quit(None)
    }

    /// Queue a PRIVMSG to `channel`.
    pub fn speak(&mut self, channel: &str, text: &str) {
        self.session.speak(channel, text);
    }

    /// Queue a CTCP ACTION to `channel`.
    pub fn act(&mut self, channel: &str, action: &str) {
        self.session.act(channel, action);
    }

    /// Queue a JOIN.
    pub fn join(&mut self, channel: &str) {
        self.session.join(channel);
    }

    /// Queue a PART.
    pub fn part(&mut self, channel: &str) {
        self.session.part(channel);
    }

    /// Queue an arbitrary message.
    pub fn send(&mut self, message: Message) {
        self.session.send(message);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.session.state()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session: identity, channels and outbound queue.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Known channels and their topics.
    pub fn channels(&self) -> &BTreeMap<String, Option<String>> {
        self.session.channels()
    }

    /// Topic of `channel`, if known.
    pub fn topic(&self, channel: &str) -> Option<&str> {
        self.session.topic(channel)
    }

    /// Number of queued outbound messages.
    pub fn pending(&self) -> usize {
        self.session.pending()
    }

    /// The controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// The controller, mutably.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        people: Vec<(String, String, String)>,
        messages: Vec<(String, String, String)>,
        actions: Vec<(String, String, String)>,
    }

    impl Controller for Recorder {
        fn observe_person(&mut self, _: &mut Session, channel: &str, prefix: &str, name: &str) {
            self.people
                .push((channel.to_owned(), prefix.to_owned(), name.to_owned()));
        }

        fn observe_message(&mut self, _: &mut Session, sender: &str, recipient: &str, text: &str) {
            self.messages
                .push((sender.to_owned(), recipient.to_owned(), text.to_owned()));
        }

        fn observe_action(&mut self, _: &mut Session, sender: &str, recipient: &str, action: &str) {
            self.actions
                .push((sender.to_owned(), recipient.to_owned(), action.to_owned()));
        }
    }

    fn client(state: ClientState) -> Client<Recorder> {
        let mut client = Client::new(ClientConfig::new("bot", "localhost"), Recorder::default());
        client.session.set_state(state);
        client
    }

    fn decode(line: &str) -> Message {
        Message::decode(line).message.unwrap()
    }

    fn triple(a: &str, b: &str, c: &str) -> (String, String, String) {
        (a.to_owned(), b.to_owned(), c.to_owned())
    }

    #[test]
    fn test_names_reply_prefixes() {
        let mut client = client(ClientState::Run);
        client
            .process_message(&decode(":srv 353 bot = #rust :@alice +bob carol"))
            .unwrap();

        assert_eq!(
            client.controller().people,
            vec![
                triple("#rust", "@", "alice"),
                triple("#rust", "+", "bob"),
                triple("#rust", "", "carol"),
            ]
        );
        assert_eq!(client.channels().get("#rust"), Some(&None));
    }

    #[test]
    fn test_names_reply_keeps_known_topic() {
        let mut client = client(ClientState::Run);
        client
            .process_message(&decode(":srv 332 bot #rust :All about Rust"))
            .unwrap();
        client
            .process_message(&decode(":srv 353 bot = #rust :alice"))
            .unwrap();
        assert_eq!(client.topic("#rust"), Some("All about Rust"));
    }

    #[test]
    fn test_action_is_not_a_message() {
        let mut client = client(ClientState::Run);
        client
            .process_message(&decode(":alice!a@host PRIVMSG #rust :\x01ACTION waves\x01"))
            .unwrap();
        client
            .process_message(&decode(":alice!a@host PRIVMSG bot :hello there"))
            .unwrap();

        assert_eq!(client.controller().actions, vec![triple("alice", "#rust", "waves")]);
        assert_eq!(
            client.controller().messages,
            vec![triple("alice", "bot", "hello there")]
        );
    }

    #[test]
    fn test_other_ctcp_is_a_plain_message() {
        let mut client = client(ClientState::Run);
        client
            .process_message(&decode(":alice!a@host PRIVMSG bot :\x01VERSION\x01"))
            .unwrap();

        assert!(client.controller().actions.is_empty());
        assert_eq!(
            client.controller().messages,
            vec![triple("alice", "bot", "\x01VERSION\x01")]
        );
    }

    #[test]
    fn test_join_observes_person() {
        let mut client = client(ClientState::Run);
        client
            .process_message(&decode(":carol!c@host JOIN :#rust"))
            .unwrap();
        assert_eq!(client.controller().people, vec![triple("#rust", "", "carol")]);
    }

    #[test]
    fn test_register_waits_for_non_notice() {
        let mut client = client(ClientState::Register);
        client
            .process_message(&decode(":srv NOTICE * :*** Looking up your hostname"))
            .unwrap();
        assert_eq!(client.state(), ClientState::Register);

        client
            .process_message(&decode(":srv 001 bot :Welcome"))
            .unwrap();
        assert_eq!(client.state(), ClientState::Run);
    }

    #[test]
    fn test_ping_queues_pong() {
        let mut client = client(ClientState::Run);
        client.process_message(&decode("PING :irc.example.net")).unwrap();
        assert_eq!(client.pending(), 1);
        assert_eq!(
            client.session.pop_front(),
            Some(Message::pong("localhost", "irc.example.net"))
        );
    }

    #[test]
    fn test_malformed_privmsg_is_skipped() {
        let mut client = client(ClientState::Run);
        client.process_message(&decode("PRIVMSG #rust :no prefix")).unwrap();
        client.process_message(&decode(":alice PRIVMSG :only")).unwrap();
        assert!(client.controller().messages.is_empty());
    }

    #[test]
    fn test_update_before_connect() {
        let mut client = client(ClientState::Start);
        assert!(matches!(client.update(), Err(ProtocolError::NotConnected)));
        assert_eq!(client.state(), ClientState::Start);
    }

    #[test]
    fn test_disconnect_is_terminal() {
        let mut client = client(ClientState::Run);
        client.disconnect();
        assert_eq!(client.state(), ClientState::Close);
        client.update().unwrap();
        client.run().unwrap();
        assert_eq!(client.state(), ClientState::Close);
    }
}
