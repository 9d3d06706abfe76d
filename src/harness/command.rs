use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use log::info;
use thiserror::Error;

use super::Harness;
use crate::api::MessagingApi;
use crate::error::OperationError;

pub const PROGRAM: &str = "whatsapp-harness";

struct CommandSpec {
    name: &'static str,
    args: &'static str,
    required: usize,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "search_contacts", args: "[query]", required: 0 },
    CommandSpec { name: "list_messages", args: "", required: 0 },
    CommandSpec { name: "list_chats", args: "[query]", required: 0 },
    CommandSpec { name: "get_chat", args: "<chat_jid>", required: 1 },
    CommandSpec { name: "get_direct_chat", args: "<phone_number>", required: 1 },
    CommandSpec { name: "get_contact_chats", args: "<jid>", required: 1 },
    CommandSpec { name: "get_last_interaction", args: "<jid>", required: 1 },
    CommandSpec { name: "get_message_context", args: "<message_id> [before] [after]", required: 1 },
    CommandSpec { name: "send_message", args: "<recipient> <message>", required: 2 },
    CommandSpec { name: "send_file", args: "<recipient> <media_path>", required: 2 },
    CommandSpec { name: "send_audio_message", args: "<recipient> <media_path>", required: 2 },
    CommandSpec { name: "download_media", args: "<message_id> <chat_jid>", required: 2 },
];

/// A single operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SearchContacts { query: String },
    ListMessages,
    ListChats { query: Option<String> },
    GetChat { chat_jid: String },
    GetDirectChat { phone_number: String },
    GetContactChats { jid: String },
    GetLastInteraction { jid: String },
    GetMessageContext { message_id: String, before: Option<usize>, after: Option<usize> },
    SendMessage { recipient: String, message: String },
    SendFile { recipient: String, media_path: PathBuf },
    SendAudioMessage { recipient: String, media_path: PathBuf },
    DownloadMedia { message_id: String, chat_jid: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Missing arguments for {command}: expected {command} {args}")]
    MissingArguments { command: &'static str, args: &'static str },
    #[error("Invalid {name} for {command}: {value} is not a non-negative integer")]
    InvalidCount {
        command: &'static str,
        name: &'static str,
        value: String,
    },
}

/// Exit status of a command-line invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The command ran, or a lookup found nothing.
    Success,
    /// The requested call failed, or the harness could not be set up.
    Failed,
    Usage,
}

impl Exit {
    pub fn of(outcome: &Result<(), OperationError>) -> Self {
        match outcome {
            Ok(()) | Err(OperationError::NotFound) => Exit::Success,
            Err(OperationError::Failed { .. }) => Exit::Failed,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::Failed => 1,
            Exit::Usage => 2,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

pub fn usage() -> Vec<String> {
    let mut lines = vec![format!("Usage: {} [command] [args...]", PROGRAM), String::new()];
    lines.push("Runs every command with sample values when no command is given.".into());
    lines.push("Commands:".into());
    lines.extend(COMMANDS.iter().map(|spec| format!("  {} {}", spec.name, spec.args).trim_end().to_string()));
    lines
}

/// The error line followed by the usage text.
pub fn usage_report(err: &UsageError) -> Vec<String> {
    let mut lines = vec![err.to_string()];
    lines.extend(usage());
    lines
}

fn parse_count(command: &'static str, name: &'static str, raw: Option<&String>) -> Result<Option<usize>, UsageError> {
    raw.map(|value| {
        value.trim().parse::<usize>().map_err(|_| UsageError::InvalidCount {
            command,
            name,
            value: value.clone(),
        })
    })
    .transpose()
}

impl Command {
    /// Matches `name` exactly against the known commands and checks that
    /// enough positional arguments were supplied. Extra arguments are ignored.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, UsageError> {
        let spec = COMMANDS
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| UsageError::Unknown(name.to_string()))?;
        if args.len() < spec.required {
            return Err(UsageError::MissingArguments {
                command: spec.name,
                args: spec.args,
            });
        }
        let arg = |idx: usize| args[idx].clone();

        let command = match spec.name {
            "search_contacts" => Command::SearchContacts {
                query: args.first().cloned().unwrap_or_default(),
            },
            "list_messages" => Command::ListMessages,
            "list_chats" => Command::ListChats {
                query: args.first().cloned(),
            },
            "get_chat" => Command::GetChat { chat_jid: arg(0) },
            "get_direct_chat" => Command::GetDirectChat { phone_number: arg(0) },
            "get_contact_chats" => Command::GetContactChats { jid: arg(0) },
            "get_last_interaction" => Command::GetLastInteraction { jid: arg(0) },
            "get_message_context" => Command::GetMessageContext {
                message_id: arg(0),
                before: parse_count(spec.name, "before", args.get(1))?,
                after: parse_count(spec.name, "after", args.get(2))?,
            },
            "send_message" => Command::SendMessage {
                recipient: arg(0),
                message: arg(1),
            },
            "send_file" => Command::SendFile {
                recipient: arg(0),
                media_path: PathBuf::from(arg(1)),
            },
            "send_audio_message" => Command::SendAudioMessage {
                recipient: arg(0),
                media_path: PathBuf::from(arg(1)),
            },
            "download_media" => Command::DownloadMedia {
                message_id: arg(0),
                chat_jid: arg(1),
            },
            other => return Err(UsageError::Unknown(other.to_string())),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SearchContacts { .. } => "search_contacts",
            Command::ListMessages => "list_messages",
            Command::ListChats { .. } => "list_chats",
            Command::GetChat { .. } => "get_chat",
            Command::GetDirectChat { .. } => "get_direct_chat",
            Command::GetContactChats { .. } => "get_contact_chats",
            Command::GetLastInteraction { .. } => "get_last_interaction",
            Command::GetMessageContext { .. } => "get_message_context",
            Command::SendMessage { .. } => "send_message",
            Command::SendFile { .. } => "send_file",
            Command::SendAudioMessage { .. } => "send_audio_message",
            Command::DownloadMedia { .. } => "download_media",
        }
    }
}

impl<A: MessagingApi, W: Write> Harness<A, W> {
    /// Runs one parsed command. `NotFound` is reported but not an error here.
    pub async fn execute(&mut self, command: Command) -> Result<(), OperationError> {
        info!("running {}", command.name());
        let outcome = match command {
            Command::SearchContacts { query } => self.search_contacts(&query).await.outcome.map(drop),
            Command::ListMessages => {
                let filter = self.default_filter(self.settings.limit);
                self.list_messages(filter).await.outcome.map(drop)
            }
            Command::ListChats { query } => {
                let chat_query = self.default_chat_query(query, self.settings.limit);
                self.list_chats(chat_query).await.outcome.map(drop)
            }
            Command::GetChat { chat_jid } => {
                let include_last_message = self.settings.include_last_message;
                self.get_chat(&chat_jid, include_last_message).await.outcome.map(drop)
            }
            Command::GetDirectChat { phone_number } => {
                self.get_direct_chat_by_contact(&phone_number).await.outcome.map(drop)
            }
            Command::GetContactChats { jid } => {
                let (limit, page) = (self.settings.limit, self.settings.page);
                self.get_contact_chats(&jid, limit, page).await.outcome.map(drop)
            }
            Command::GetLastInteraction { jid } => self.get_last_interaction(&jid).await.outcome.map(drop),
            Command::GetMessageContext { message_id, before, after } => {
                let before = before.unwrap_or(self.settings.context_before);
                let after = after.unwrap_or(self.settings.context_after);
                self.get_message_context(&message_id, before, after).await.outcome.map(drop)
            }
            Command::SendMessage { recipient, message } => {
                self.send_message(&recipient, &message).await.outcome.map(drop)
            }
            Command::SendFile { recipient, media_path } => {
                self.send_file(&recipient, &media_path).await.outcome.map(drop)
            }
            Command::SendAudioMessage { recipient, media_path } => {
                self.send_audio_message(&recipient, &media_path).await.outcome.map(drop)
            }
            Command::DownloadMedia { message_id, chat_jid } => {
                self.download_media(&message_id, &chat_jid).await.outcome.map(drop)
            }
        };
        match outcome {
            Err(OperationError::NotFound) => Ok(()),
            other => other,
        }
    }

    /// Prints a usage error. No API operation is invoked.
    pub fn usage_error(&mut self, err: &UsageError) {
        self.emit(&usage_report(err));
    }
}
