use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::api::MessagingApi;
use crate::api::client::BridgeClient;
use crate::api::models::{
    Chat, ChatQuery, Contact, Message, MessageContextView, MessageFilter, MessageListing, OperationResult,
    TIMESTAMP_FORMAT,
};
use crate::error::ApiError;
use crate::storage::MessageStore;

/// Messaging API backed by the bridge's database and its REST endpoints.
pub struct WhatsApp {
    store: MessageStore,
    bridge: BridgeClient,
}

pub fn format_message(message: &Message, sender_name: &str, show_chat_info: bool) -> String {
    let mut out = format!("[{}] ", message.timestamp.format(TIMESTAMP_FORMAT));
    if show_chat_info {
        if let Some(chat_name) = message.chat_name.as_deref().filter(|name| !name.is_empty()) {
            out.push_str(&format!("Chat: {} ", chat_name));
        }
    }
    let sender = if message.is_from_me { "Me" } else { sender_name };
    out.push_str(&format!("From: {}: ", sender));
    if let Some(media) = &message.media_type {
        out.push_str(&format!("[{} - Message ID: {} - Chat JID: {}] ", media, message.id, message.chat_jid));
    }
    out.push_str(message.content.as_deref().unwrap_or_default());
    out
}

pub fn format_messages(messages: &[Message], names: &HashMap<String, String>, show_chat_info: bool) -> String {
    if messages.is_empty() {
        return "No messages to display.".to_string();
    }
    messages
        .iter()
        .map(|message| {
            let sender = names.get(&message.sender).map_or(message.sender.as_str(), String::as_str);
            format_message(message, sender, show_chat_info)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl WhatsApp {
    pub fn new(store: MessageStore, bridge: BridgeClient) -> Self {
        Self { store, bridge }
    }

    fn render(&self, messages: &[Message]) -> Result<String, ApiError> {
        let names = self.store.sender_names(messages)?;
        Ok(format_messages(messages, &names, true))
    }
}

impl MessagingApi for WhatsApp {
    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, ApiError> {
        self.store.search_contacts(query)
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<MessageListing, ApiError> {
        let hits = self.store.list_messages(filter)?;
        let messages = if filter.include_context {
            let mut expanded = Vec::new();
            for hit in hits {
                match self.store.message_context(&hit.id, filter.context_before, filter.context_after)? {
                    Some(context) => {
                        expanded.extend(context.before);
                        expanded.push(context.message);
                        expanded.extend(context.after);
                    }
                    None => expanded.push(hit),
                }
            }
            expanded
        } else {
            hits
        };
        debug!("list_messages rendering {} messages", messages.len());
        self.render(&messages).map(MessageListing::Formatted)
    }

    async fn list_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>, ApiError> {
        self.store.list_chats(query)
    }

    async fn get_chat(&self, chat_jid: &str, include_last_message: bool) -> Result<Option<Chat>, ApiError> {
        self.store.get_chat(chat_jid, include_last_message)
    }

    async fn get_direct_chat_by_contact(&self, phone_number: &str) -> Result<Option<Chat>, ApiError> {
        self.store.get_direct_chat_by_contact(phone_number)
    }

    async fn get_contact_chats(&self, jid: &str, limit: usize, page: usize) -> Result<Vec<Chat>, ApiError> {
        self.store.get_contact_chats(jid, limit, page)
    }

    async fn get_last_interaction(&self, jid: &str) -> Result<Option<String>, ApiError> {
        match self.store.last_interaction(jid)? {
            Some(message) => self.render(std::slice::from_ref(&message)).map(Some),
            None => Ok(None),
        }
    }

    async fn get_message_context(
        &self,
        message_id: &str,
        before: usize,
        after: usize,
    ) -> Result<Option<MessageContextView>, ApiError> {
        let context = self.store.message_context(message_id, before, after)?;
        Ok(context.map(MessageContextView::Record))
    }

    async fn send_message(&self, recipient: &str, message: &str) -> Result<OperationResult, ApiError> {
        self.bridge.send_message(recipient, message).await
    }

    async fn send_file(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        self.bridge.send_file(recipient, file_path).await
    }

    async fn send_audio_message(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        self.bridge.send_audio_message(recipient, file_path).await
    }

    async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<OperationResult, ApiError> {
        self.bridge.download_media(message_id, chat_jid).await
    }
}
