//! End-to-end tests for the client state machine against a loopback peer.
//!
//! Each test starts a scripted server on `127.0.0.1` in its own thread and
//! drives a real [`Client`] with short read timeouts until the script is
//! done.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slirc_client::{
    Client, ClientConfig, ClientState, Context, Controller, LoggingController, ProtocolError,
};

/// Server side of a loopback connection.
struct Peer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    received: Vec<String>,
}

impl Peer {
    /// Read one line, recording it without its CRLF. `None` on EOF or timeout.
    fn next_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let line = line.trim_end_matches(&['\r', '\n'][..]).to_owned();
                self.received.push(line.clone());
                Some(line)
            }
        }
    }

    fn expect_line(&mut self, expected: &str) {
        assert_eq!(self.next_line().as_deref(), Some(expected));
    }

    fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .expect("peer write");
    }

    fn register(&mut self) {
        self.expect_line("NICK :bot");
        self.expect_line("USER bot localhost localhost :slirc client");
    }
}

fn serve<F>(script: F) -> (u16, JoinHandle<Vec<String>>)
where
    F: FnOnce(&mut Peer) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("peer timeout");
        let mut peer = Peer {
            reader: BufReader::new(stream.try_clone().expect("clone")),
            writer: stream,
            received: Vec::new(),
        };
        script(&mut peer);
        peer.received
    });
    (port, handle)
}

fn config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::new("bot", format!("127.0.0.1:{}", port));
    config.connection.read_timeout = Duration::from_millis(50);
    config
}

fn drive<C, F>(client: &mut Client<C>, done: F)
where
    C: Controller,
    F: Fn(&Client<C>) -> bool,
{
    for _ in 0..400 {
        if done(&*client) {
            return;
        }
        client.update().expect("update");
    }
    panic!("client stuck in {}", client.state());
}

#[test]
fn test_registration_and_ping() {
    let (port, server) = serve(|peer| {
        peer.register();
        peer.send(":srv NOTICE * :*** Looking up your hostname");
        peer.send(":srv 001 bot :Welcome to the network");
        peer.send("PING :srv.example.net");
        peer.expect_line("PONG localhost :srv.example.net");
    });

    let mut client = Client::new(config(port), LoggingController);
    assert_eq!(client.state(), ClientState::Start);
    client.connect().expect("connect");
    assert_eq!(client.state(), ClientState::Open);

    drive(&mut client, |c| c.state() == ClientState::Run);
    drive(&mut client, |c| c.state() == ClientState::Close);

    let received = server.join().expect("server");
    assert_eq!(received.len(), 3);
}

#[test]
fn test_names_and_topic_are_tracked() {
    let (port, server) = serve(|peer| {
        peer.register();
        peer.send(":srv 001 bot :Welcome");
        peer.send(":srv 332 bot #rust :Rust talk");
        peer.send(":srv 353 bot = #rust :@alice +bob carol");
        peer.send(":srv 366 bot #rust :End of /NAMES list.");
    });

    let mut client = Client::new(config(port), LoggingController);
    client.connect().expect("connect");
    drive(&mut client, |c| c.state() == ClientState::Close);

    server.join().expect("server");
    assert_eq!(client.topic("#rust"), Some("Rust talk"));
    assert_eq!(client.channels().len(), 1);
}

#[derive(Default)]
struct Echo {
    seen: Vec<String>,
}

impl Controller for Echo {
    fn handle_message(&mut self, context: &mut Context<'_>, text: &str) {
        self.seen.push(text.to_owned());
        match text {
            "bye" => context.quit(Some("asked to leave")),
            _ => {
                let reply = format!("{}: {}", context.nick(), text);
                context.speak(&reply);
            }
        }
    }

    fn handle_action(&mut self, context: &mut Context<'_>, action: &str) {
        self.seen.push(context.text().to_owned());
        context.act(action);
    }
}

#[test]
fn test_controller_replies_and_quits() {
    let (port, server) = serve(|peer| {
        peer.register();
        peer.send(":srv 001 bot :Welcome");
        peer.send(":alice!a@example.com PRIVMSG #rust :hello");
        peer.expect_line("PRIVMSG #rust :alice: hello");
        peer.send(":alice!a@example.com PRIVMSG bot :\x01ACTION waves\x01");
        peer.expect_line("PRIVMSG alice :\x01ACTION waves\x01");
        peer.send(":alice!a@example.com PRIVMSG bot :bye");
        peer.expect_line("QUIT :asked to leave");
    });

    let mut client = Client::new(config(port), Echo::default());
    client.connect().expect("connect");
    drive(&mut client, |c| c.state() == ClientState::Quit);
    drive(&mut client, |c| c.state() == ClientState::Close);

    server.join().expect("server");
    assert_eq!(client.controller().seen, vec!["hello", "alice waves", "bye"]);
}

#[test]
fn test_quit_skips_queued_messages() {
    let (port, server) = serve(|peer| {
        peer.register();
        peer.send(":srv 001 bot :Welcome");
        peer.expect_line("QUIT :Bye!");
        peer.writer
            .set_read_timeout(Some(Duration::from_millis(300)))
            .expect("peer timeout");
        assert_eq!(peer.next_line(), None);
    });

    let mut client = Client::new(config(port), LoggingController);
    client.connect().expect("connect");
    drive(&mut client, |c| c.state() == ClientState::Run);

    client.speak("#rust", "never sent");
    client.join("#other");
    client.quit().expect("quit");
    assert_eq!(client.state(), ClientState::Quit);

    drive(&mut client, |c| c.state() == ClientState::Close);
    let received = server.join().expect("server");
    assert_eq!(received.last().map(String::as_str), Some("QUIT :Bye!"));
    assert_eq!(client.pending(), 2);
}

#[test]
fn test_register_waits_for_server() {
    let (port, server) = serve(|peer| {
        peer.register();
        peer.send(":srv NOTICE * :*** Checking ident");
        peer.send(":srv NOTICE * :*** No ident response");
        thread::sleep(Duration::from_millis(200));
    });

    let mut client = Client::new(config(port), LoggingController);
    client.connect().expect("connect");
    for _ in 0..3 {
        client.update().expect("update");
    }
    assert_eq!(client.state(), ClientState::Register);

    drive(&mut client, |c| c.state() == ClientState::Close);
    server.join().expect("server");
}

#[test]
fn test_connect_failure_keeps_start() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let mut client = Client::new(config(port), LoggingController);
    let err = client.connect().unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionFailed { .. }));
    assert_eq!(client.state(), ClientState::Start);
    assert!(matches!(client.update(), Err(ProtocolError::NotConnected)));
}
