//! Command bot example
//!
//! Connects to a server, joins a channel and answers commands from a list of
//! friends. A command is a message ending in `?`, for example `cookie bob?`.
//!
//! ```text
//! cargo run --example command_bot -- irc.libera.chat:6667 '##slirc-test'
//! RUST_LOG=debug cargo run --example command_bot
//! ```

use std::fmt;

use slirc_client::{Client, ClientConfig, Context, Controller, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct CommandError(String);

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type CommandResult = Result<(), CommandError>;

const COMMANDS: [&str; 8] = [
    "commands", "explain", "quit", "friends", "befriend", "cookie", "join", "part",
];

struct Bot {
    friends: Vec<String>,
    last_error: Option<String>,
}

impl Bot {
    fn new() -> Self {
        Self {
            friends: vec!["edmund".to_string()],
            last_error: None,
        }
    }

    fn run_command(&mut self, context: &mut Context<'_>, line: &str) -> CommandResult {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let params: Vec<&str> = words.collect();
        info!(command, ?params, "running command");

        match command {
            "commands" => {
                no_params(&params)?;
                context.speak(&format!("Commands: {}", COMMANDS.join(", ")));
            }
            "explain" => {
                no_params(&params)?;
                let last = self
                    .last_error
                    .take()
                    .ok_or_else(|| CommandError("No last message".to_string()))?;
                context.speak(&format!("Last message: {}", last));
            }
            "quit" => {
                no_params(&params)?;
                context.speak("Ok");
                context.quit(None);
            }
            "friends" => {
                no_params(&params)?;
                context.speak(&format!("Friends: {}", self.friends.join(", ")));
            }
            "befriend" => {
                let name = one_param(&params)?;
                if self.friends.iter().any(|f| f == name) {
                    return Err(CommandError(format!("Already a friend: {}", name)));
                }
                self.friends.push(name.to_string());
                context.speak("Ok");
            }
            "cookie" => {
                let name = one_param(&params)?;
                context.act(&format!("gives cookie to {}", name));
            }
            "join" => {
                context.join(one_param(&params)?);
                context.speak("Ok");
            }
            "part" => {
                context.part(one_param(&params)?);
                context.speak("Ok");
            }
            other => return Err(CommandError(format!("Unrecognised command: {}", other))),
        }
        Ok(())
    }
}

fn no_params(params: &[&str]) -> CommandResult {
    match params {
        [] => Ok(()),
        extra => Err(CommandError(format!("Superfluous params: {}", extra.join(" ")))),
    }
}

fn one_param<'a>(params: &[&'a str]) -> Result<&'a str, CommandError> {
    match params {
        [] => Err(CommandError("Need a param".to_string())),
        [one] => Ok(*one),
        [_, extra @ ..] => Err(CommandError(format!("Superfluous params: {}", extra.join(" ")))),
    }
}

impl Controller for Bot {
    fn handle_person(&mut self, _session: &mut Session, channel: &str, prefix: &str, name: &str) {
        if self.friends.iter().any(|f| f == name) {
            info!("Friend {}{} is in {}", prefix, name, channel);
        }
    }

    fn handle_message(&mut self, context: &mut Context<'_>, text: &str) {
        let Some(line) = text.strip_suffix('?') else {
            return;
        };
        if !self.friends.iter().any(|f| f == context.nick()) {
            return;
        }

        if let Err(e) = self.run_command(context, line.trim()) {
            context.speak("...");
            info!("Message from handler: {}", e);
            self.last_error = Some(e.to_string());
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let mut args = std::env::args().skip(1);
    let server = args.next().unwrap_or_else(|| "irc.libera.chat:6667".to_string());
    let channel = args.next().unwrap_or_else(|| "##slirc-test".to_string());

    let mut config = ClientConfig::new("slircbot", server);
    config.realname = "slirc command bot".to_string();

    let mut client = Client::new(config, Bot::new());
    client.connect()?;
    client.join(&channel);
    client.run()?;

    info!("Disconnected");
    Ok(())
}
