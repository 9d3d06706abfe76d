//! Text rendering for harness reports: truncation, placeholders and the
//! per-entity summary lines.

use crate::api::models::{Chat, Contact, MessageContextView, OperationResult};

pub const TRUNCATION_MARKER: &str = "...";
pub const RULE_WIDTH: usize = 60;

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_MESSAGE: &str = "No message";
pub const UNSET: &str = "none";

pub const CONTACT_PREVIEW: usize = 5;
pub const CHAT_PREVIEW: usize = 5;
pub const CONTACT_CHAT_PREVIEW: usize = 3;
pub const MESSAGE_PREVIEW: usize = 3;

pub const LAST_MESSAGE_CAP: usize = 50;
pub const CHAT_DETAIL_CAP: usize = 100;
pub const CONTEXT_TARGET_CAP: usize = 100;
pub const LAST_INTERACTION_CAP: usize = 300;
pub const LISTING_CAP: usize = 500;

/// Cuts `text` to `cap` characters, appending the marker only when something was cut.
pub fn truncate(text: &str, cap: usize) -> String {
    match text.char_indices().nth(cap) {
        Some((end, _)) => format!("{}{}", &text[..end], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

pub fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

pub fn or_unset(value: Option<&str>) -> &str {
    or_placeholder(value, UNSET)
}

pub fn banner(title: &str) -> Vec<String> {
    let rule = "=".repeat(RULE_WIDTH);
    vec![String::new(), rule.clone(), title.to_string(), rule]
}

pub fn contact_line(contact: &Contact) -> String {
    format!(
        "  - {}: {}",
        or_placeholder(contact.name.as_deref(), UNKNOWN),
        or_placeholder(contact.phone_number.as_deref(), NOT_AVAILABLE)
    )
}

pub fn chat_summary(chat: &Chat) -> Vec<String> {
    let mut lines = vec![format!(
        "  - {} ({})",
        or_placeholder(chat.name.as_deref(), UNKNOWN),
        or_placeholder(chat.jid.as_deref(), NOT_AVAILABLE)
    )];
    match chat.last_message.as_deref() {
        None => lines.push(format!("    Last: {}", NO_MESSAGE)),
        Some("") => {}
        Some(text) => lines.push(format!("    Last: {}", truncate(text, LAST_MESSAGE_CAP))),
    }
    lines
}

pub fn chat_line(chat: &Chat) -> String {
    format!(
        "  - {}: {}",
        or_placeholder(chat.name.as_deref(), UNKNOWN),
        or_placeholder(chat.jid.as_deref(), NOT_AVAILABLE)
    )
}

pub fn chat_found(chat: &Chat, with_last_message: bool) -> Vec<String> {
    let mut lines = vec![
        format!("Chat found: {}", or_placeholder(chat.name.as_deref(), UNKNOWN)),
        format!("JID: {}", or_placeholder(chat.jid.as_deref(), NOT_AVAILABLE)),
    ];
    if with_last_message {
        if let Some(text) = chat.last_message.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("Last message: {}", truncate(text, CHAT_DETAIL_CAP)));
        }
    }
    lines
}

/// Same output for both context shapes.
pub fn context_summary(view: &MessageContextView) -> Vec<String> {
    let parts = view.parts();
    let target = truncate(or_placeholder(parts.target_content, NOT_AVAILABLE), CONTEXT_TARGET_CAP);
    vec![
        format!("  Target message: {}", target),
        format!("  Messages before: {}", parts.before),
        format!("  Messages after: {}", parts.after),
    ]
}

pub fn operation_result(result: &OperationResult) -> Vec<String> {
    let mut lines = vec![
        format!("Success: {}", result.success),
        format!("Status: {}", or_placeholder(result.message.as_deref(), NOT_AVAILABLE)),
    ];
    if let Some(path) = result.file_path.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("File path: {}", path));
    }
    lines
}

/// Truncated multi-line text, one entry per line.
pub fn text_block(text: &str, cap: usize) -> Vec<String> {
    truncate(text, cap).lines().map(str::to_string).collect()
}
