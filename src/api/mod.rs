pub mod client;
pub mod models;
pub mod whatsapp;

use std::path::Path;

use crate::error::ApiError;
use models::{
    Chat, ChatQuery, Contact, MessageContextView, MessageFilter, MessageListing, OperationResult,
};

/// The messaging operations the harness exercises.
///
/// Absent results (unknown chat, unknown message) are `Ok(None)`; `Err` is
/// reserved for calls that failed.
#[allow(async_fn_in_trait)]
pub trait MessagingApi {
    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, ApiError>;

    async fn list_messages(&self, filter: &MessageFilter) -> Result<MessageListing, ApiError>;

    async fn list_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>, ApiError>;

    async fn get_chat(&self, chat_jid: &str, include_last_message: bool) -> Result<Option<Chat>, ApiError>;

    async fn get_direct_chat_by_contact(&self, phone_number: &str) -> Result<Option<Chat>, ApiError>;

    async fn get_contact_chats(&self, jid: &str, limit: usize, page: usize) -> Result<Vec<Chat>, ApiError>;

    async fn get_last_interaction(&self, jid: &str) -> Result<Option<String>, ApiError>;

    async fn get_message_context(
        &self,
        message_id: &str,
        before: usize,
        after: usize,
    ) -> Result<Option<MessageContextView>, ApiError>;

    async fn send_message(&self, recipient: &str, message: &str) -> Result<OperationResult, ApiError>;

    async fn send_file(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError>;

    async fn send_audio_message(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError>;

    async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<OperationResult, ApiError>;
}
