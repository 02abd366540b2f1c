//! Integration tests for message decoding and encoding
//!
//! These tests run the codec through its public API on the wire vectors a
//! client meets in practice, and check that well-formed messages survive an
//! encode/decode round trip.

use slirc_client::{Anomaly, Message};

fn decode_clean(line: &str) -> Message {
    let decoded = Message::decode(line);
    assert!(decoded.is_clean(), "unexpected anomalies: {:?}", decoded.anomalies);
    decoded.message.expect("message")
}

#[test]
fn test_decode_prefix_and_trailing() {
    let msg = decode_clean(":prefix command :trailing param");
    assert_eq!(msg.prefix.as_deref(), Some("prefix"));
    assert_eq!(msg.command.as_deref(), Some("command"));
    assert_eq!(msg.params, vec!["trailing param"]);
}

#[test]
fn test_decode_without_prefix() {
    let msg = decode_clean("command :trailing param");
    assert_eq!(msg.prefix, None);
    assert_eq!(msg.command.as_deref(), Some("command"));
    assert_eq!(msg.params, vec!["trailing param"]);
}

#[test]
fn test_decode_numerics() {
    let known = decode_clean("001 :trailing param");
    assert_eq!(known.command.as_deref(), Some("RPL_WELCOME"));

    let unknown = decode_clean("123 :trailing param");
    assert_eq!(unknown.command.as_deref(), Some("123"));
}

#[test]
fn test_decode_extra_spaces() {
    let single = decode_clean("command param :trailing param");
    let spaced = decode_clean("command  param   :trailing param");
    assert_eq!(single.params, vec!["param", "trailing param"]);
    assert_eq!(single, spaced);
}

#[test]
fn test_decode_strips_line_terminator() {
    let msg = decode_clean("PING :irc.example.com\r\n");
    assert_eq!(msg.params, vec!["irc.example.com"]);
}

#[test]
fn test_decode_anomalies() {
    let empty = Message::decode("");
    assert_eq!(empty.message, None);
    assert_eq!(empty.anomalies, vec![Anomaly::EmptyMessage]);

    let bare = Message::decode("JOIN #rust");
    assert_eq!(bare.anomalies, vec![Anomaly::MissingTrailing]);
    assert_eq!(bare.message.unwrap().params, vec!["#rust"]);

    let headless = Message::decode(":prefix");
    assert!(headless.anomalies.contains(&Anomaly::MissingCommand));
    assert_eq!(headless.message.unwrap().command, None);
}

#[test]
fn test_encode_client_commands() {
    assert_eq!(Message::nick("bot").encode().line, "NICK :bot\r\n");
    assert_eq!(
        Message::user("bot", "host", "server", "Real Name").encode().line,
        "USER bot host server :Real Name\r\n"
    );
    assert_eq!(Message::join("#rust").encode().line, "JOIN :#rust\r\n");
    assert_eq!(
        Message::pong("localhost", "irc.example.com").encode().line,
        "PONG localhost :irc.example.com\r\n"
    );
}

#[test]
fn test_encode_truncates_long_lines() {
    let msg = Message::privmsg("#rust", "x".repeat(600));
    let encoded = msg.encode();
    assert_eq!(encoded.line.len(), 512);
    assert!(encoded.line.ends_with("\r\n"));
    assert!(matches!(
        encoded.anomalies.as_slice(),
        [Anomaly::MessageTooLong { limit: 510, .. }]
    ));
}

#[test]
fn test_message_round_trip_with_prefix() {
    let original = ":nick!user@host PRIVMSG #channel :Hello, world!";
    let message = decode_clean(original);
    let encoded = message.encode();
    assert_eq!(encoded.line, format!("{}\r\n", original));
    assert_eq!(decode_clean(&encoded.line), message);
}

#[test]
fn test_symbolic_names_are_not_reversed() {
    let message = decode_clean(":srv 353 bot = #rust :alice bob");
    let encoded = message.encode();
    assert_eq!(encoded.line, ":srv RPL_NAMREPLY bot = #rust :alice bob\r\n");
}
