#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;
use std::path::Path;

use whatsapp_harness::api::MessagingApi;
use whatsapp_harness::api::models::{
    Chat, ChatQuery, Contact, MessageContextView, MessageFilter, MessageListing, OperationResult,
};
use whatsapp_harness::config::HarnessSettings;
use whatsapp_harness::error::ApiError;
use whatsapp_harness::harness::Harness;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub args: Vec<String>,
}

/// Canned messaging API that records every call it receives.
#[derive(Default)]
pub struct MockApi {
    pub contacts: Vec<Contact>,
    pub chats: Vec<Chat>,
    pub listing: Option<MessageListing>,
    pub chat: Option<Chat>,
    pub last_interaction: Option<String>,
    pub context: Option<MessageContextView>,
    pub operation_result: OperationResult,
    pub failing: HashSet<&'static str>,
    pub failure_text: String,
    pub calls: RefCell<Vec<RecordedCall>>,
}

impl MockApi {
    pub fn failing(mut self, operation: &'static str, text: &str) -> Self {
        self.failing.insert(operation);
        self.failure_text = text.to_string();
        self
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(|call| call.operation).collect()
    }

    pub fn call(&self, operation: &str) -> Option<RecordedCall> {
        self.calls.borrow().iter().find(|call| call.operation == operation).cloned()
    }

    fn record(&self, operation: &'static str, args: Vec<String>) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(RecordedCall { operation, args });
        if self.failing.contains(operation) {
            return Err(ApiError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                self.failure_text.clone(),
            )));
        }
        Ok(())
    }
}

impl MessagingApi for MockApi {
    async fn search_contacts(&self, query: &str) -> Result<Vec<Contact>, ApiError> {
        self.record("search_contacts", vec![query.to_string()])?;
        Ok(self.contacts.clone())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<MessageListing, ApiError> {
        self.record("list_messages", vec![filter.limit.to_string(), filter.page.to_string()])?;
        Ok(self.listing.clone().unwrap_or(MessageListing::Records(Vec::new())))
    }

    async fn list_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>, ApiError> {
        self.record(
            "list_chats",
            vec![query.query.clone().unwrap_or_default(), query.limit.to_string(), query.sort_by.to_string()],
        )?;
        Ok(self.chats.clone())
    }

    async fn get_chat(&self, chat_jid: &str, include_last_message: bool) -> Result<Option<Chat>, ApiError> {
        self.record("get_chat", vec![chat_jid.to_string(), include_last_message.to_string()])?;
        Ok(self.chat.clone())
    }

    async fn get_direct_chat_by_contact(&self, phone_number: &str) -> Result<Option<Chat>, ApiError> {
        self.record("get_direct_chat_by_contact", vec![phone_number.to_string()])?;
        Ok(self.chat.clone())
    }

    async fn get_contact_chats(&self, jid: &str, limit: usize, page: usize) -> Result<Vec<Chat>, ApiError> {
        self.record("get_contact_chats", vec![jid.to_string(), limit.to_string(), page.to_string()])?;
        Ok(self.chats.clone())
    }

    async fn get_last_interaction(&self, jid: &str) -> Result<Option<String>, ApiError> {
        self.record("get_last_interaction", vec![jid.to_string()])?;
        Ok(self.last_interaction.clone())
    }

    async fn get_message_context(
        &self,
        message_id: &str,
        before: usize,
        after: usize,
    ) -> Result<Option<MessageContextView>, ApiError> {
        self.record(
            "get_message_context",
            vec![message_id.to_string(), before.to_string(), after.to_string()],
        )?;
        Ok(self.context.clone())
    }

    async fn send_message(&self, recipient: &str, message: &str) -> Result<OperationResult, ApiError> {
        self.record("send_message", vec![recipient.to_string(), message.to_string()])?;
        Ok(self.operation_result.clone())
    }

    async fn send_file(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        self.record("send_file", vec![recipient.to_string(), file_path.display().to_string()])?;
        Ok(self.operation_result.clone())
    }

    async fn send_audio_message(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        self.record("send_audio_message", vec![recipient.to_string(), file_path.display().to_string()])?;
        Ok(self.operation_result.clone())
    }

    async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<OperationResult, ApiError> {
        self.record("download_media", vec![message_id.to_string(), chat_jid.to_string()])?;
        Ok(self.operation_result.clone())
    }
}

pub fn harness(api: MockApi) -> Harness<MockApi, Vec<u8>> {
    Harness::new(api, HarnessSettings::default(), Vec::new())
}

pub fn output(harness: Harness<MockApi, Vec<u8>>) -> (MockApi, String) {
    let (api, out) = harness.into_parts();
    (api, String::from_utf8(out).unwrap())
}

pub fn contact(name: &str, phone: &str) -> Contact {
    Contact {
        name: Some(name.to_string()),
        phone_number: Some(phone.to_string()),
        jid: Some(format!("{}@s.whatsapp.net", phone.trim_start_matches('+'))),
    }
}

pub fn chat(name: &str, jid: &str, last_message: Option<&str>) -> Chat {
    Chat {
        name: Some(name.to_string()),
        jid: Some(jid.to_string()),
        last_message: last_message.map(str::to_string),
        ..Chat::default()
    }
}
