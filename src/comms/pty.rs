//! PTY (console) channel — reads lines from stdin, prints replies to stdout.
//!
//! Plain lines are submitted as prompts. Lines starting with `/` are
//! commands:
//!
//! ```text
//! /new           start a new session (history is kept)
//! /history       list past exchanges
//! /select <id>   show a past exchange
//! /help          show this list
//! /quit          stop the program
//! ```
//!
//! Runs until `shutdown` is cancelled (Ctrl-C), stdin closes, or `/quit`.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::runtime::{Component, ComponentFuture};
use crate::chat::ChatService;
use crate::error::AppError;
use crate::session::ExchangeId;

const HELP: &str = "\
  <text>         ask the tutor
  /new           start a new session (history is kept)
  /history       list past exchanges
  /select <id>   show a past exchange
  /help          show this list
  /quit          stop the program";

/// A parsed console line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Submit(String),
    NewSession,
    History,
    Select(ExchangeId),
    Help,
    Quit,
    Invalid(String),
}

fn parse_line(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(cmd) = line.strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };
    let mut words = cmd.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("new"), None, _) => Command::NewSession,
        (Some("history"), None, _) => Command::History,
        (Some("help"), None, _) => Command::Help,
        (Some("quit" | "exit"), None, _) => Command::Quit,
        (Some("select"), Some(id), None) => match id.parse() {
            Ok(id) => Command::Select(id),
            Err(_) => Command::Invalid(format!("not an exchange id: {id}")),
        },
        (Some("select"), _, _) => Command::Invalid("usage: /select <id>".into()),
        _ => Command::Invalid(format!("unknown command: /{cmd} (try /help)")),
    }
}

pub struct PtyChannel {
    channel_id: String,
    chat: Arc<ChatService>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, chat: Arc<ChatService>) -> Self {
        Self { channel_id: channel_id.into(), chat }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.chat, shutdown))
    }
}

async fn run_pty(
    channel_id: String,
    chat: Arc<ChatService>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, provider = chat.provider_name(), "pty channel started");
    println!("─────────────────────────────────────────────");
    println!(" Japanese Language Trainer  (/help, Ctrl-C to quit)");
    println!("─────────────────────────────────────────────");
    println!("Ask me anything about Japanese!");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!(%channel_id, "pty channel shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("pty read error: {e}");
                break;
            }
            Ok(None) => {
                info!("pty stdin closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        match parse_line(&input) {
            Command::Submit(prompt) => {
                debug!(prompt_len = prompt.len(), "pty submit");
                println!("Sending...");
                // No cancellation: the call runs to completion even on Ctrl-C.
                match chat.submit(&prompt).await {
                    Ok(reply) => println!("[{}] {}", reply.id, reply.reply),
                    Err(e) => println!("! {e}"),
                }
            }
            Command::NewSession => {
                chat.new_session().await;
                println!("New chat. Ask me anything about Japanese!");
            }
            Command::History => {
                let history = chat.list_history().await;
                if history.is_empty() {
                    println!("(no chats yet)");
                }
                for entry in history {
                    println!("  Chat {}: {}", entry.id, entry.prompt);
                }
            }
            Command::Select(id) => match chat.select(id).await {
                Ok(e) => println!("> {}\n{}", e.prompt, e.response),
                Err(e) => println!("! {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => {
                info!(%channel_id, "quit requested");
                shutdown.cancel();
                break;
            }
            Command::Invalid(msg) => println!("! {msg}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_submitted_verbatim() {
        assert_eq!(parse_line("  What is です? "), Command::Submit("  What is です? ".into()));
    }

    #[test]
    fn empty_line_is_an_empty_submit() {
        assert_eq!(parse_line(""), Command::Submit(String::new()));
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_line("/new"), Command::NewSession);
        assert_eq!(parse_line("/history"), Command::History);
        assert_eq!(parse_line("/select 3"), Command::Select(3));
        assert_eq!(parse_line("/help"), Command::Help);
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/exit\r"), Command::Quit);
    }

    #[test]
    fn bad_commands_are_invalid() {
        assert!(matches!(parse_line("/select"), Command::Invalid(_)));
        assert!(matches!(parse_line("/select abc"), Command::Invalid(_)));
        assert!(matches!(parse_line("/select 1 2"), Command::Invalid(_)));
        assert!(matches!(parse_line("/nope"), Command::Invalid(_)));
    }
}
