use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use tracing::{debug, info};

use super::ClientConfig;
use crate::ctcp;
use crate::Message;

/// Where a client is in its lifecycle.
///
/// Transitions run one way, `Start → Open → Register → Run → Quit → Close`,
/// except that a lost connection jumps straight to `Close`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClientState {
    /// Not connected yet.
    #[default]
    Start,
    /// Connected; NICK and USER go out on the next update.
    Open,
    /// Registration sent, waiting for the server to answer.
    Register,
    /// Registered; queued messages are flushed every update.
    Run,
    /// QUIT sent, waiting for the server to hang up.
    Quit,
    /// Connection released. Terminal.
    Close,
}

impl ClientState {
    /// Upper-case name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Open => "OPEN",
            Self::Register => "REGISTER",
            Self::Run => "RUN",
            Self::Quit => "QUIT",
            Self::Close => "CLOSE",
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state owned by a client: identity, lifecycle state, known
/// channels and the outbound queue.
///
/// Controllers receive `&mut Session` in their callbacks. They can queue
/// messages and read channel data, but the lifecycle state and the channel
/// map are only changed by the client itself.
#[derive(Debug)]
pub struct Session {
    nick: String,
    hostname: String,
    servername: String,
    realname: String,
    state: ClientState,
    channels: BTreeMap<String, Option<String>>,
    queue: VecDeque<Message>,
    quit_requested: Option<Option<String>>,
}

impl Session {
    pub(crate) fn new(config: &ClientConfig) -> Self {
        Self {
            nick: config.nick.clone(),
            hostname: config.hostname.clone(),
            servername: config.servername.clone(),
            realname: config.realname.clone(),
            state: ClientState::Start,
            channels: BTreeMap::new(),
            queue: VecDeque::new(),
            quit_requested: None,
        }
    }

    /// Our nickname.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Host name sent at registration.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Server name sent at registration and in PONG replies.
    pub fn servername(&self) -> &str {
        &self.servername
    }

    /// Real name sent at registration.
    pub fn realname(&self) -> &str {
        &self.realname
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Known channels and their topics (`None` until a topic is seen).
    pub fn channels(&self) -> &BTreeMap<String, Option<String>> {
        &self.channels
    }

    /// Topic of `channel`, if known.
    pub fn topic(&self, channel: &str) -> Option<&str> {
        self.channels.get(channel)?.as_deref()
    }

    /// Number of messages waiting in the outbound queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue a message for the next flush.
    pub fn send(&mut self, message: Message) {
        debug!("Queued: {}", message);
        self.queue.push_back(message);
    }

    /// Queue a PRIVMSG to `target`.
    pub fn speak(&mut self, target: &str, text: &str) {
        self.send(Message::privmsg(target, text));
    }

    /// Queue a CTCP ACTION to `target`.
    pub fn act(&mut self, target: &str, action: &str) {
        self.send(Message::privmsg(target, ctcp::action(action)));
    }

    /// Queue a JOIN.
    pub fn join(&mut self, channel: &str) {
        self.send(Message::join(channel));
    }

    /// Queue a PART.
    pub fn part(&mut self, channel: &str) {
        self.send(Message::part(channel));
    }

    /// Ask the client to quit once the current callback returns.
    ///
    /// The QUIT skips the queue, like [`Client::quit`](super::Client::quit).
    /// Without a reason the configured quit message is used.
    pub fn request_quit(&mut self, reason: Option<&str>) {
        self.quit_requested = Some(reason.map(str::to_owned));
    }

    pub(crate) fn take_quit_request(&mut self) -> Option<Option<String>> {
        self.quit_requested.take()
    }

    pub(crate) fn set_state(&mut self, state: ClientState) {
        if self.state != state {
            info!(from = %self.state, to = %state, "state change");
            self.state = state;
        }
    }

    pub(crate) fn set_topic(&mut self, channel: &str, topic: &str) {
        self.channels.insert(channel.to_owned(), Some(topic.to_owned()));
    }

    pub(crate) fn note_channel(&mut self, channel: &str) {
        self.channels.entry(channel.to_owned()).or_insert(None);
    }

    pub(crate) fn front(&self) -> Option<&Message> {
        self.queue.front()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }
}
