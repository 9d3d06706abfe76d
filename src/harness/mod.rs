//! Per-operation wrappers around a [`MessagingApi`].
//!
//! Each wrapper prints a labelled section, calls the API once and summarizes
//! the result. Failures are reported in the section and returned as an
//! [`OperationError`]; they never propagate further.

pub mod command;
pub mod orchestrate;
pub mod render;

use std::io::{self, Write};
use std::path::Path;

use log::{debug, warn};

use crate::api::MessagingApi;
use crate::api::models::{
    Chat, ChatQuery, Contact, MessageContextView, MessageFilter, MessageListing, OperationResult,
};
use crate::config::HarnessSettings;
use crate::error::{ApiError, OperationError};

/// Rendered output of one wrapper call plus its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<T> {
    pub operation: &'static str,
    pub lines: Vec<String>,
    pub outcome: Result<T, OperationError>,
}

impl<T> Report<T> {
    /// The result, or `None` when the call failed or found nothing.
    pub fn ok(self) -> Option<T> {
        self.outcome.ok()
    }
}

struct Section {
    operation: &'static str,
    lines: Vec<String>,
}

impl Section {
    fn open(operation: &'static str) -> Self {
        Self {
            operation,
            lines: render::banner(&format!("TEST: {}", operation)),
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    fn not_found(&mut self, message: &str) -> OperationError {
        self.line(message);
        OperationError::NotFound
    }

    fn fail(&mut self, err: ApiError) -> OperationError {
        warn!("{} failed: {}", self.operation, err);
        self.line(format!("ERROR: {}", err));
        OperationError::Failed {
            operation: self.operation,
            message: err.to_string(),
        }
    }
}

pub struct Harness<A, W = io::Stdout> {
    api: A,
    settings: HarnessSettings,
    out: W,
}

impl<A: MessagingApi, W: Write> Harness<A, W> {
    pub fn new(api: A, settings: HarnessSettings, out: W) -> Self {
        Self { api, settings, out }
    }

    pub fn into_parts(self) -> (A, W) {
        (self.api, self.out)
    }

    /// Message filter with only the configured defaults set.
    pub fn default_filter(&self, limit: usize) -> MessageFilter {
        MessageFilter {
            limit,
            page: self.settings.page,
            context_before: self.settings.list_context_before,
            context_after: self.settings.list_context_after,
            ..MessageFilter::default()
        }
    }

    pub fn default_chat_query(&self, query: Option<String>, limit: usize) -> ChatQuery {
        ChatQuery {
            query,
            limit,
            page: self.settings.page,
            include_last_message: self.settings.include_last_message,
            sort_by: self.settings.sort_by,
        }
    }

    fn emit(&mut self, lines: &[String]) {
        for line in lines {
            if let Err(err) = writeln!(self.out, "{}", line) {
                warn!("failed to write report: {}", err);
                return;
            }
        }
    }

    fn finish<T>(&mut self, section: Section, outcome: Result<T, OperationError>) -> Report<T> {
        debug!("{} finished, ok={}", section.operation, outcome.is_ok());
        self.emit(&section.lines);
        Report {
            operation: section.operation,
            lines: section.lines,
            outcome,
        }
    }

    pub async fn search_contacts(&mut self, query: &str) -> Report<Vec<Contact>> {
        let mut section = Section::open("search_contacts");
        section.line(format!("Query: {}", query));
        let outcome = match self.api.search_contacts(query).await {
            Ok(contacts) => {
                section.line(format!("Found {} contacts", contacts.len()));
                section.extend(contacts.iter().take(render::CONTACT_PREVIEW).map(render::contact_line));
                Ok(contacts)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn list_messages(&mut self, filter: MessageFilter) -> Report<MessageListing> {
        let mut section = Section::open("list_messages");
        section.line(format!(
            "Filters: after={}, before={}, sender={}, chat_jid={}, query={}",
            render::or_unset(filter.after.as_deref()),
            render::or_unset(filter.before.as_deref()),
            render::or_unset(filter.sender_phone_number.as_deref()),
            render::or_unset(filter.chat_jid.as_deref()),
            render::or_unset(filter.query.as_deref()),
        ));
        section.line(format!(
            "Limit: {}, Page: {}, Include context: {}",
            filter.limit, filter.page, filter.include_context
        ));
        let outcome = match self.api.list_messages(&filter).await {
            Ok(listing) => {
                match &listing {
                    MessageListing::Formatted(text) => {
                        section.line("Messages (formatted):");
                        section.extend(render::text_block(text, render::LISTING_CAP));
                    }
                    MessageListing::Records(messages) => {
                        section.line(format!("Found {} messages", messages.len()));
                        section.extend(
                            messages
                                .iter()
                                .take(render::MESSAGE_PREVIEW)
                                .map(|message| format!("  - {}", message)),
                        );
                    }
                }
                Ok(listing)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn list_chats(&mut self, query: ChatQuery) -> Report<Vec<Chat>> {
        let mut section = Section::open("list_chats");
        section.line(format!(
            "Query: {}, Limit: {}, Sort by: {}",
            render::or_unset(query.query.as_deref()),
            query.limit,
            query.sort_by
        ));
        let outcome = match self.api.list_chats(&query).await {
            Ok(chats) => {
                section.line(format!("Found {} chats", chats.len()));
                for chat in chats.iter().take(render::CHAT_PREVIEW) {
                    section.extend(render::chat_summary(chat));
                }
                Ok(chats)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn get_chat(&mut self, chat_jid: &str, include_last_message: bool) -> Report<Chat> {
        let mut section = Section::open("get_chat");
        section.line(format!("Chat JID: {}", chat_jid));
        let outcome = match self.api.get_chat(chat_jid, include_last_message).await {
            Ok(Some(chat)) => {
                section.extend(render::chat_found(&chat, true));
                Ok(chat)
            }
            Ok(None) => Err(section.not_found("Chat not found")),
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn get_direct_chat_by_contact(&mut self, phone_number: &str) -> Report<Chat> {
        let mut section = Section::open("get_direct_chat_by_contact");
        section.line(format!("Phone number: {}", phone_number));
        let outcome = match self.api.get_direct_chat_by_contact(phone_number).await {
            Ok(Some(chat)) => {
                section.extend(render::chat_found(&chat, false));
                Ok(chat)
            }
            Ok(None) => Err(section.not_found("Chat not found")),
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn get_contact_chats(&mut self, jid: &str, limit: usize, page: usize) -> Report<Vec<Chat>> {
        let mut section = Section::open("get_contact_chats");
        section.line(format!("Contact JID: {}", jid));
        let outcome = match self.api.get_contact_chats(jid, limit, page).await {
            Ok(chats) => {
                section.line(format!("Found {} chats", chats.len()));
                section.extend(chats.iter().take(render::CONTACT_CHAT_PREVIEW).map(render::chat_line));
                Ok(chats)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn get_last_interaction(&mut self, jid: &str) -> Report<String> {
        let mut section = Section::open("get_last_interaction");
        section.line(format!("Contact JID: {}", jid));
        let outcome = match self.api.get_last_interaction(jid).await {
            Ok(Some(text)) if !text.is_empty() => {
                section.line("Last interaction:");
                section.extend(render::text_block(&text, render::LAST_INTERACTION_CAP));
                Ok(text)
            }
            Ok(_) => Err(section.not_found("No interaction found")),
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn get_message_context(
        &mut self,
        message_id: &str,
        before: usize,
        after: usize,
    ) -> Report<MessageContextView> {
        let mut section = Section::open("get_message_context");
        section.line(format!("Message ID: {}", message_id));
        section.line(format!("Context: {} before, {} after", before, after));
        let outcome = match self.api.get_message_context(message_id, before, after).await {
            Ok(Some(view)) => {
                section.line("Message context retrieved:");
                section.extend(render::context_summary(&view));
                Ok(view)
            }
            Ok(None) => Err(section.not_found("Message context not found")),
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn send_message(&mut self, recipient: &str, message: &str) -> Report<OperationResult> {
        let mut section = Section::open("send_message");
        section.line(format!("Recipient: {}", recipient));
        section.line(format!("Message: {}", message));
        let outcome = match self.api.send_message(recipient, message).await {
            Ok(result) => {
                section.extend(render::operation_result(&result));
                Ok(result)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn send_file(&mut self, recipient: &str, media_path: &Path) -> Report<OperationResult> {
        let mut section = Section::open("send_file");
        section.line(format!("Recipient: {}", recipient));
        section.line(format!("Media path: {}", media_path.display()));
        let outcome = match self.api.send_file(recipient, media_path).await {
            Ok(result) => {
                section.extend(render::operation_result(&result));
                Ok(result)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn send_audio_message(&mut self, recipient: &str, media_path: &Path) -> Report<OperationResult> {
        let mut section = Section::open("send_audio_message");
        section.line(format!("Recipient: {}", recipient));
        section.line(format!("Media path: {}", media_path.display()));
        let outcome = match self.api.send_audio_message(recipient, media_path).await {
            Ok(result) => {
                section.extend(render::operation_result(&result));
                Ok(result)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }

    pub async fn download_media(&mut self, message_id: &str, chat_jid: &str) -> Report<OperationResult> {
        let mut section = Section::open("download_media");
        section.line(format!("Message ID: {}", message_id));
        section.line(format!("Chat JID: {}", chat_jid));
        let outcome = match self.api.download_media(message_id, chat_jid).await {
            Ok(result) => {
                section.extend(render::operation_result(&result));
                Ok(result)
            }
            Err(err) => Err(section.fail(err)),
        };
        self.finish(section, outcome)
    }
}
