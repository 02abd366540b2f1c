//! The observer seam between the client and whatever drives it.
//!
//! The client reports what it sees through the three `observe_*` callbacks
//! of [`Controller`]. The default implementations log the event, wrap it in a
//! [`Context`] and pass it on to the matching `handle_*` hook, so most
//! controllers only override the hooks they care about.

use std::collections::BTreeMap;

use tracing::info;

use super::Session;
use crate::chan::ChannelExt;

/// Receives events from a [`Client`](super::Client).
///
/// Every method has a default, so `impl Controller for MyBot {}` is a valid
/// (log-only) controller.
///
/// # Example
///
/// ```
/// use slirc_client::{Context, Controller};
///
/// struct Echo;
///
/// impl Controller for Echo {
///     fn handle_message(&mut self, context: &mut Context<'_>, text: &str) {
///         if let Some(rest) = text.strip_prefix("echo ") {
///             context.speak(rest);
///         }
///     }
/// }
/// ```
pub trait Controller {
    /// Someone is present in `channel`. `prefix` is `"@"`, `"+"` or `""`.
    fn observe_person(&mut self, session: &mut Session, channel: &str, prefix: &str, name: &str) {
        info!("See {}{} in {}", prefix, name, channel);
        self.handle_person(session, channel, prefix, name);
    }

    /// `sender` said `text` to `recipient` (a channel or our nick).
    fn observe_message(&mut self, session: &mut Session, sender: &str, recipient: &str, text: &str) {
        info!("{} says to {}, \"{}\"", sender, recipient, text);
        let mut context = Context::new(session, sender, recipient, text.to_owned());
        self.handle_message(&mut context, text);
    }

    /// `sender` performed `action` towards `recipient`.
    fn observe_action(&mut self, session: &mut Session, sender: &str, recipient: &str, action: &str) {
        info!("{} does to {}, \"{}\"", sender, recipient, action);
        let text = format!("{} {}", sender, action);
        let mut context = Context::new(session, sender, recipient, text);
        self.handle_action(&mut context, action);
    }

    /// Hook called by the default [`observe_person`](Self::observe_person).
    fn handle_person(&mut self, _session: &mut Session, _channel: &str, _prefix: &str, _name: &str) {}

    /// Hook called by the default [`observe_message`](Self::observe_message).
    fn handle_message(&mut self, _context: &mut Context<'_>, _text: &str) {}

    /// Hook called by the default [`observe_action`](Self::observe_action).
    fn handle_action(&mut self, _context: &mut Context<'_>, _action: &str) {}
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn observe_person(&mut self, session: &mut Session, channel: &str, prefix: &str, name: &str) {
        (**self).observe_person(session, channel, prefix, name);
    }

    fn observe_message(&mut self, session: &mut Session, sender: &str, recipient: &str, text: &str) {
        (**self).observe_message(session, sender, recipient, text);
    }

    fn observe_action(&mut self, session: &mut Session, sender: &str, recipient: &str, action: &str) {
        (**self).observe_action(session, sender, recipient, action);
    }

    fn handle_person(&mut self, session: &mut Session, channel: &str, prefix: &str, name: &str) {
        (**self).handle_person(session, channel, prefix, name);
    }

    fn handle_message(&mut self, context: &mut Context<'_>, text: &str) {
        (**self).handle_message(context, text);
    }

    fn handle_action(&mut self, context: &mut Context<'_>, action: &str) {
        (**self).handle_action(context, action);
    }
}

/// A controller that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingController;

impl Controller for LoggingController {}

/// One incoming message or action, with a way to answer it.
///
/// Replies go to the channel when the message was public and to the sender
/// when it was private. A context lives for a single callback.
#[derive(Debug)]
pub struct Context<'a> {
    session: &'a mut Session,
    channel: Option<String>,
    nick: String,
    text: String,
}

impl<'a> Context<'a> {
    /// Build a context for a message from `sender` to `recipient`.
    pub fn new(session: &'a mut Session, sender: &str, recipient: &str, text: String) -> Self {
        Self {
            session,
            channel: recipient.is_channel_name().then(|| recipient.to_owned()),
            nick: sender.to_owned(),
            text,
        }
    }

    /// The channel the message arrived on, `None` if it was private.
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The sender's nickname.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The message text. For actions this reads `"<sender> <action>"`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where replies go: the channel if there is one, else the sender.
    pub fn reply_target(&self) -> &str {
        self.channel.as_deref().unwrap_or(&self.nick)
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &Session {
        self.session
    }

    /// Known channels and their topics.
    pub fn channels(&self) -> &BTreeMap<String, Option<String>> {
        self.session.channels()
    }

    /// Reply with a message.
    pub fn speak(&mut self, text: &str) {
        let target = self.channel.as_deref().unwrap_or(&self.nick);
        self.session.speak(target, text);
    }

    /// Reply with an action.
    pub fn act(&mut self, action: &str) {
        let target = self.channel.as_deref().unwrap_or(&self.nick);
        self.session.act(target, action);
    }

    /// Queue a JOIN.
    pub fn join(&mut self, channel: &str) {
        self.session.join(channel);
    }

    /// Queue a PART.
    pub fn part(&mut self, channel: &str) {
        self.session.part(channel);
    }

    /// Quit once this callback returns.
    pub fn quit(&mut self, reason: Option<&str>) {
        self.session.request_quit(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::Message;

    fn session() -> Session {
        Session::new(&ClientConfig::new("bot", "irc.example.com"))
    }

    #[test]
    fn test_public_reply_goes_to_channel() {
        let mut session = session();
        let mut context = Context::new(&mut session, "alice", "#rust", "hi bot".to_owned());
        assert_eq!(context.channel(), Some("#rust"));
        assert_eq!(context.reply_target(), "#rust");
        context.speak("hi alice");
        context.act("waves");

        assert_eq!(session.pop_front(), Some(Message::privmsg("#rust", "hi alice")));
        assert_eq!(
            session.pop_front(),
            Some(Message::privmsg("#rust", "\x01ACTION waves\x01"))
        );
    }

    #[test]
    fn test_private_reply_goes_to_sender() {
        let mut session = session();
        let mut context = Context::new(&mut session, "alice", "bot", "psst".to_owned());
        assert_eq!(context.channel(), None);
        assert_eq!(context.nick(), "alice");
        context.speak("hello");

        assert_eq!(session.pop_front(), Some(Message::privmsg("alice", "hello")));
    }

    #[test]
    fn test_action_context_text() {
        struct Recorder(Vec<String>);

        impl Controller for Recorder {
            fn handle_action(&mut self, context: &mut Context<'_>, action: &str) {
                self.0.push(format!("{}|{}", context.text(), action));
            }
        }

        let mut session = session();
        let mut recorder = Recorder(Vec::new());
        recorder.observe_action(&mut session, "alice", "#rust", "waves");
        assert_eq!(recorder.0, vec!["alice waves|waves"]);
    }

    #[test]
    fn test_boxed_controller_forwards() {
        struct Counter(usize);

        impl Controller for Counter {
            fn handle_person(&mut self, _: &mut Session, _: &str, _: &str, _: &str) {
                self.0 += 1;
            }
        }

        let mut session = session();
        let mut boxed: Box<Counter> = Box::new(Counter(0));
        boxed.observe_person(&mut session, "#rust", "@", "alice");
        boxed.observe_person(&mut session, "#rust", "", "bob");
        assert_eq!(boxed.0, 2);
    }
}
