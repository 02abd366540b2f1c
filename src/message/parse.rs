//! Nom-based, lenient IRC line decoder.
//!
//! Grammar handled:
//! ```text
//! [':' prefix SPACE] command {SPACE middle} [SPACE ':' trailing]
//! ```
//! Runs of spaces between tokens are collapsed. Anything that does not fit is
//! reported as an [`Anomaly`] and decoding carries on with what it has.

use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::opt,
    error::{context, VerboseError},
    sequence::preceded,
    IResult,
};

use super::Message;
use crate::error::Anomaly;
use crate::response::Response;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// Result of decoding one line: the best-effort message plus anything odd
/// noticed on the way.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Decoded {
    /// The decoded message; `None` only for an empty line.
    pub message: Option<Message>,
    /// Problems found in the line, in the order they were noticed.
    pub anomalies: Vec<Anomaly>,
}

impl Decoded {
    /// True when the line decoded without any anomaly.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

#[inline]
fn is_space(c: char) -> bool {
    c == ' '
}

fn skip_spaces(input: &str) -> &str {
    input.trim_start_matches(is_space)
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> ParseResult<&str, Option<&str>> {
    context(
        "parsing message prefix",
        opt(preceded(char(':'), take_till(is_space))),
    )(input)
}

/// Parse one space-delimited token (the command or a middle parameter).
fn parse_token(input: &str) -> ParseResult<&str, &str> {
    context("parsing token", take_till(is_space))(input)
}

/// Decode a text line into a [`Message`].
///
/// A trailing CR/LF, if still attached, is ignored. Numeric commands found in
/// the reply table are replaced by their symbolic name; other numerics stay as
/// they are.
///
/// # Example
///
/// ```
/// use slirc_client::message::decode;
///
/// let decoded = decode(":irc.example.com 001 bot :Welcome");
/// let msg = decoded.message.unwrap();
/// assert_eq!(msg.command.as_deref(), Some("RPL_WELCOME"));
/// assert_eq!(msg.params, vec!["bot", "Welcome"]);
/// assert!(decoded.anomalies.is_empty());
/// ```
pub fn decode(line: &str) -> Decoded {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.is_empty() {
        return Decoded {
            message: None,
            anomalies: vec![Anomaly::EmptyMessage],
        };
    }

    let mut anomalies = Vec::new();

    let (rest, prefix) = match parse_prefix(line) {
        Ok(parsed) => parsed,
        Err(_) => (line, None),
    };
    let rest = skip_spaces(rest);

    let (rest, command) = match parse_token(rest) {
        Ok((rest, token)) if !token.is_empty() => (rest, Some(token)),
        _ => (rest, None),
    };
    if command.is_none() {
        anomalies.push(Anomaly::MissingCommand);
    }

    let mut params = Vec::new();
    let mut rest = skip_spaces(rest);
    let mut has_trailing = false;
    while !rest.is_empty() {
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_owned());
            has_trailing = true;
            break;
        }
        let (after, param) = match parse_token(rest) {
            Ok(parsed) => parsed,
            Err(_) => ("", rest),
        };
        params.push(param.to_owned());
        rest = skip_spaces(after);
    }
    if !has_trailing {
        anomalies.push(Anomaly::MissingTrailing);
    }

    let command = command.map(|token| match token.parse::<Response>() {
        Ok(response) => response.name().to_owned(),
        Err(_) => token.to_owned(),
    });

    Decoded {
        message: Some(Message {
            prefix: prefix.map(str::to_owned),
            command,
            params,
        }),
        anomalies,
    }
}
