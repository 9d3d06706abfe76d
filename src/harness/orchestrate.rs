use std::io::Write;

use log::info;

use super::{Harness, Report, render};
use crate::api::MessagingApi;
use crate::error::OperationError;

const MANUAL_OPERATIONS: &[(&str, &str)] = &[
    ("get_message_context", "requires a message_id"),
    ("send_message", "requires recipient and message"),
    ("send_file", "requires recipient and media_path"),
    ("send_audio_message", "requires recipient and media_path"),
    ("download_media", "requires message_id and chat_jid"),
];

/// Operations a [`Harness::run_all`] pass executed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

impl RunSummary {
    fn record<T>(&mut self, report: &Report<T>) {
        self.executed.push(report.operation);
        if matches!(report.outcome, Err(OperationError::Failed { .. })) {
            self.failed.push(report.operation);
        }
    }
}

impl<A: MessagingApi, W: Write> Harness<A, W> {
    /// Runs every operation that can be exercised with sample values, feeding
    /// identifiers found by earlier steps into later ones.
    pub async fn run_all(&mut self) -> RunSummary {
        info!("running all operations with sample values");
        let mut summary = RunSummary::default();
        self.emit(&render::banner("RUNNING ALL WHATSAPP TOOL TESTS"));

        let sample_query = self.settings.sample_query.clone();
        let contacts = self.search_contacts(&sample_query).await;
        summary.record(&contacts);
        let (sample_jid, sample_phone) = contacts
            .ok()
            .and_then(|found| found.into_iter().next())
            .map(|contact| (contact.jid.unwrap_or_default(), contact.phone_number.unwrap_or_default()))
            .unwrap_or_default();

        let chat_query = self.default_chat_query(Some(sample_query), self.settings.run_all_chat_limit);
        let chats = self.list_chats(chat_query).await;
        summary.record(&chats);
        let sample_chat_jid = chats
            .ok()
            .and_then(|found| found.into_iter().next())
            .and_then(|chat| chat.jid)
            .unwrap_or_default();

        let filter = self.default_filter(self.settings.run_all_message_limit);
        let messages = self.list_messages(filter).await;
        summary.record(&messages);

        if !sample_chat_jid.is_empty() {
            let include_last_message = self.settings.include_last_message;
            let report = self.get_chat(&sample_chat_jid, include_last_message).await;
            summary.record(&report);
        }

        if !sample_phone.is_empty() {
            let report = self.get_direct_chat_by_contact(&sample_phone).await;
            summary.record(&report);
        }

        if !sample_jid.is_empty() {
            let (limit, page) = (self.settings.limit, self.settings.page);
            let report = self.get_contact_chats(&sample_jid, limit, page).await;
            summary.record(&report);

            let report = self.get_last_interaction(&sample_jid).await;
            summary.record(&report);
        }

        let mut closing = render::banner("TESTS COMPLETE");
        closing.push(String::new());
        closing.push("Note: Some tests require specific parameters:".into());
        closing.extend(
            MANUAL_OPERATIONS
                .iter()
                .map(|(operation, needs)| format!("  - {}: {}", operation, needs)),
        );
        closing.push(String::new());
        closing.push("You can call these operations individually with your own parameters.".into());
        self.emit(&closing);

        summary
    }
}
