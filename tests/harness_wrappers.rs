mod common;

use chrono::NaiveDateTime;
use common::{MockApi, chat, contact, harness, output};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use whatsapp_harness::api::models::{
    Message, MessageContext, MessageContextView, MessageListing, MessageView, OperationResult,
};
use whatsapp_harness::error::OperationError;

fn message(content: &str) -> Message {
    Message {
        id: "ABC".into(),
        chat_jid: "1555@s.whatsapp.net".into(),
        chat_name: Some("Papa".into()),
        sender: "1555".into(),
        content: Some(content.into()),
        timestamp: NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
        is_from_me: false,
        media_type: None,
    }
}

#[tokio::test]
async fn search_contacts_prints_one_line_per_contact() {
    let api = MockApi {
        contacts: vec![contact("Papa", "+1555")],
        ..MockApi::default()
    };
    let mut h = harness(api);
    let report = h.search_contacts("papa").await;

    let rule = "=".repeat(60);
    assert_eq!(
        report.lines,
        [
            "",
            rule.as_str(),
            "TEST: search_contacts",
            rule.as_str(),
            "Query: papa",
            "Found 1 contacts",
            "  - Papa: +1555",
        ]
    );
    assert_eq!(report.lines.iter().filter(|line| line.starts_with("  - ")).count(), 1);
    assert_eq!(report.ok().map(|found| found.len()), Some(1));

    let (_, printed) = output(h);
    assert!(printed.contains("  - Papa: +1555\n"));
}

#[tokio::test]
async fn contact_preview_is_capped_and_placeholders_fill_gaps() {
    let mut contacts: Vec<_> = (0..7).map(|i| contact(&format!("C{}", i), &format!("+{}", i))).collect();
    contacts[0].name = None;
    contacts[0].phone_number = None;
    let mut h = harness(MockApi { contacts, ..MockApi::default() });
    let report = h.search_contacts("c").await;

    assert!(report.lines.contains(&"Found 7 contacts".to_string()));
    assert!(report.lines.contains(&"  - Unknown: N/A".to_string()));
    assert_eq!(report.lines.iter().filter(|line| line.starts_with("  - ")).count(), 5);
}

#[tokio::test]
async fn failed_send_reports_error_and_returns_no_result() {
    let api = MockApi::default().failing("send_message", "connection refused by bridge");
    let mut h = harness(api);
    let report = h.send_message("123@s.whatsapp.net", "hi").await;

    let last = report.lines.last().unwrap().clone();
    assert!(last.starts_with("ERROR: "));
    assert!(last.contains("connection refused by bridge"));
    assert!(matches!(
        report.outcome,
        Err(OperationError::Failed { operation: "send_message", .. })
    ));
    assert_eq!(report.ok(), None);
}

#[tokio::test]
async fn send_result_lines_follow_operation_result() {
    let api = MockApi {
        operation_result: OperationResult::failed("Recipient must be provided"),
        ..MockApi::default()
    };
    let mut h = harness(api);
    let report = h.send_message("", "hi").await;
    assert_eq!(
        &report.lines[4..],
        ["Recipient: ", "Message: hi", "Success: false", "Status: Recipient must be provided"]
    );
    assert!(report.outcome.is_ok());
}

#[tokio::test]
async fn download_prints_file_path_when_present() {
    let api = MockApi {
        operation_result: OperationResult {
            success: true,
            message: Some("Media downloaded successfully".into()),
            file_path: Some("/store/ABC.jpg".into()),
        },
        ..MockApi::default()
    };
    let mut h = harness(api);
    let report = h.download_media("ABC", "1555@s.whatsapp.net").await;
    assert_eq!(report.lines.last().map(String::as_str), Some("File path: /store/ABC.jpg"));
}

#[tokio::test]
async fn missing_chat_is_not_found_rather_than_failure() {
    let mut h = harness(MockApi::default());
    let report = h.get_chat("nobody@s.whatsapp.net", true).await;
    assert_eq!(report.lines.last().map(String::as_str), Some("Chat not found"));
    assert_eq!(report.outcome, Err(OperationError::NotFound));
}

#[tokio::test]
async fn chat_detail_truncates_last_message() {
    let long = "m".repeat(150);
    let api = MockApi {
        chat: Some(chat("Papa", "1555@s.whatsapp.net", Some(&long))),
        ..MockApi::default()
    };
    let mut h = harness(api);
    let report = h.get_chat("1555@s.whatsapp.net", true).await;
    assert_eq!(
        &report.lines[5..],
        [
            "Chat found: Papa".to_string(),
            "JID: 1555@s.whatsapp.net".to_string(),
            format!("Last message: {}...", "m".repeat(100)),
        ]
    );
}

#[tokio::test]
async fn list_chats_shows_last_message_preview() {
    let api = MockApi {
        chats: vec![
            chat("Papa", "1555@s.whatsapp.net", Some("see you at dinner")),
            chat("Mama", "1666@s.whatsapp.net", None),
        ],
        ..MockApi::default()
    };
    let mut h = harness(api);
    let query = h.default_chat_query(Some("a".into()), 5);
    let report = h.list_chats(query).await;
    assert_eq!(
        &report.lines[4..],
        [
            "Query: a, Limit: 5, Sort by: last_active",
            "Found 2 chats",
            "  - Papa (1555@s.whatsapp.net)",
            "    Last: see you at dinner",
            "  - Mama (1666@s.whatsapp.net)",
            "    Last: No message",
        ]
    );
}

#[tokio::test]
async fn formatted_listing_is_capped_at_500_characters() {
    let text = "x".repeat(600);
    let api = MockApi {
        listing: Some(MessageListing::Formatted(text)),
        ..MockApi::default()
    };
    let mut h = harness(api);
    let filter = h.default_filter(5);
    let report = h.list_messages(filter).await;
    assert_eq!(report.lines[4], "Filters: after=none, before=none, sender=none, chat_jid=none, query=none");
    assert_eq!(report.lines[5], "Limit: 5, Page: 0, Include context: false");
    assert_eq!(report.lines[6], "Messages (formatted):");
    assert_eq!(report.lines[7], format!("{}...", "x".repeat(500)));
}

#[tokio::test]
async fn record_listing_previews_three_messages() {
    let Value::Object(map) = json!({ "content": "from a mapping" }) else {
        unreachable!()
    };
    let views = vec![
        MessageView::Record(message("one")),
        MessageView::Mapping(map),
        MessageView::Record(message("three")),
        MessageView::Record(message("four")),
    ];
    let api = MockApi {
        listing: Some(MessageListing::Records(views)),
        ..MockApi::default()
    };
    let mut h = harness(api);
    let filter = h.default_filter(5);
    let report = h.list_messages(filter).await;
    assert_eq!(
        &report.lines[6..],
        [
            "Found 4 messages",
            "  - [2024-05-01 10:00:00] 1555: one",
            "  - {\"content\":\"from a mapping\"}",
            "  - [2024-05-01 10:00:00] 1555: three",
        ]
    );
}

#[tokio::test]
async fn message_context_output_is_identical_for_both_shapes() {
    let target = "t".repeat(130);
    let record = MessageContextView::Record(MessageContext {
        message: message(&target),
        before: vec![message("b1"), message("b2"), message("b3")],
        after: vec![message("a1")],
    });
    let Value::Object(map) = json!({
        "message": { "content": target, "id": "ABC" },
        "before": [{ "content": "b1" }, { "content": "b2" }, { "content": "b3" }],
        "after": [{ "content": "a1" }],
    }) else {
        unreachable!()
    };
    let mapping = MessageContextView::Mapping(map);

    let mut from_record = harness(MockApi { context: Some(record), ..MockApi::default() });
    let mut from_mapping = harness(MockApi { context: Some(mapping), ..MockApi::default() });
    let a = from_record.get_message_context("ABC", 3, 3).await;
    let b = from_mapping.get_message_context("ABC", 3, 3).await;

    assert_eq!(a.lines, b.lines);
    assert_eq!(
        &a.lines[4..],
        [
            "Message ID: ABC".to_string(),
            "Context: 3 before, 3 after".to_string(),
            "Message context retrieved:".to_string(),
            format!("  Target message: {}...", "t".repeat(100)),
            "  Messages before: 3".to_string(),
            "  Messages after: 1".to_string(),
        ]
    );
}

#[tokio::test]
async fn last_interaction_absent_is_reported_neutrally() {
    let mut h = harness(MockApi::default());
    let report = h.get_last_interaction("1555@s.whatsapp.net").await;
    assert_eq!(report.lines.last().map(String::as_str), Some("No interaction found"));
    assert_eq!(report.outcome, Err(OperationError::NotFound));
}
