use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::is_group_jid;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Contact {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub jid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Chat {
    pub jid: Option<String>,
    pub name: Option<String>,
    pub last_message_time: Option<NaiveDateTime>,
    pub last_message: Option<String>,
}

impl Chat {
    pub fn is_group(&self) -> bool {
        self.jid.as_deref().is_some_and(is_group_jid)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub chat_jid: String,
    pub chat_name: Option<String>,
    pub sender: String,
    pub content: Option<String>,
    pub timestamp: NaiveDateTime,
    pub is_from_me: bool,
    pub media_type: Option<String>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sender = if self.is_from_me { "Me" } else { self.sender.as_str() };
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            sender,
            self.content.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageContext {
    pub message: Message,
    pub before: Vec<Message>,
    pub after: Vec<Message>,
}

/// A message as handed over by the API: either a loose mapping or a typed record.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageView {
    Mapping(Map<String, Value>),
    Record(Message),
}

impl fmt::Display for MessageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageView::Mapping(map) => write!(f, "{}", Value::Object(map.clone())),
            MessageView::Record(message) => fmt::Display::fmt(message, f),
        }
    }
}

/// A message context in either of the shapes the API may return.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContextView {
    /// Keys `message`, `before` and `after`; any of them may be missing.
    Mapping(Map<String, Value>),
    Record(MessageContext),
}

/// Fields of a message context, extracted independently of its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextParts<'a> {
    pub target_content: Option<&'a str>,
    pub before: usize,
    pub after: usize,
}

impl MessageContextView {
    pub fn parts(&self) -> ContextParts<'_> {
        match self {
            MessageContextView::Mapping(map) => {
                let len = |key: &str| map.get(key).and_then(Value::as_array).map_or(0, Vec::len);
                ContextParts {
                    target_content: map
                        .get("message")
                        .and_then(Value::as_object)
                        .and_then(|message| message.get("content"))
                        .and_then(Value::as_str),
                    before: len("before"),
                    after: len("after"),
                }
            }
            MessageContextView::Record(context) => ContextParts {
                target_content: context.message.content.as_deref(),
                before: context.before.len(),
                after: context.after.len(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageListing {
    Formatted(String),
    Records(Vec<MessageView>),
}

/// Status returned by mutating operations (send, download).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct OperationResult {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub file_path: Option<String>,
}

impl OperationResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            file_path: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageFilter {
    pub after: Option<String>,
    pub before: Option<String>,
    pub sender_phone_number: Option<String>,
    pub chat_jid: Option<String>,
    pub query: Option<String>,
    pub limit: usize,
    pub page: usize,
    pub include_context: bool,
    pub context_before: usize,
    pub context_after: usize,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            after: None,
            before: None,
            sender_phone_number: None,
            chat_jid: None,
            query: None,
            limit: 20,
            page: 0,
            include_context: false,
            context_before: 1,
            context_after: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatSort {
    #[default]
    LastActive,
    Name,
}

impl fmt::Display for ChatSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatSort::LastActive => "last_active",
            ChatSort::Name => "name",
        })
    }
}

impl FromStr for ChatSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_active" => Ok(ChatSort::LastActive),
            "name" => Ok(ChatSort::Name),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatQuery {
    pub query: Option<String>,
    pub limit: usize,
    pub page: usize,
    pub include_last_message: bool,
    pub sort_by: ChatSort,
}

impl Default for ChatQuery {
    fn default() -> Self {
        Self {
            query: None,
            limit: 20,
            page: 0,
            include_last_message: true,
            sort_by: ChatSort::LastActive,
        }
    }
}
