use std::path::Path;

use log::debug;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::api::models::OperationResult;
use crate::error::ApiError;
use crate::utils::normalize_url;

pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8080/api";

/// HTTP client for the WhatsApp bridge's REST API.
pub struct BridgeClient {
    pub http: HttpClient,
    base_api: String,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    path: Option<String>,
}

enum BridgeReply {
    Accepted(BridgeResponse),
    Rejected(OperationResult),
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_api = Self::base_api(&normalize_url(base_url));
        Url::parse(&base_api)?;
        Ok(Self {
            http: HttpClient::new(),
            base_api,
        })
    }

    fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") { trimmed.to_string() } else { format!("{}/api", trimmed) }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_api, path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<BridgeReply, ApiError> {
        let endpoint = self.endpoint(path);
        debug!("POST {}", endpoint);
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Ok(BridgeReply::Rejected(OperationResult::failed(format!(
                "Error: HTTP {} - {}",
                status.as_u16(),
                text.trim()
            ))));
        }
        Ok(BridgeReply::Accepted(resp.json::<BridgeResponse>().await?))
    }

    fn into_send_result(reply: BridgeReply) -> OperationResult {
        match reply {
            BridgeReply::Accepted(resp) => OperationResult {
                success: resp.success,
                message: resp.message,
                file_path: None,
            },
            BridgeReply::Rejected(result) => result,
        }
    }

    pub async fn send_message(&self, recipient: &str, message: &str) -> Result<OperationResult, ApiError> {
        if recipient.trim().is_empty() {
            return Ok(OperationResult::failed("Recipient must be provided"));
        }
        let body = json!({ "recipient": recipient, "message": message });
        self.post("send", body).await.map(Self::into_send_result)
    }

    pub async fn send_file(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        if recipient.trim().is_empty() {
            return Ok(OperationResult::failed("Recipient must be provided"));
        }
        if !file_path.is_file() {
            return Ok(OperationResult::failed(format!(
                "Media file not found: {}",
                file_path.display()
            )));
        }
        let body = json!({ "recipient": recipient, "media_path": file_path.to_string_lossy() });
        self.post("send", body).await.map(Self::into_send_result)
    }

    /// Sends a voice message. The bridge only plays Opus in an Ogg container,
    /// so other formats are refused here.
    pub async fn send_audio_message(&self, recipient: &str, file_path: &Path) -> Result<OperationResult, ApiError> {
        let is_ogg = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ogg"));
        if file_path.is_file() && !is_ogg {
            return Ok(OperationResult::failed(format!(
                "Audio file must be in .ogg Opus format, conversion is not supported: {}",
                file_path.display()
            )));
        }
        self.send_file(recipient, file_path).await
    }

    pub async fn download_media(&self, message_id: &str, chat_jid: &str) -> Result<OperationResult, ApiError> {
        let body = json!({ "message_id": message_id, "chat_jid": chat_jid });
        let result = match self.post("download", body).await? {
            BridgeReply::Accepted(resp) if resp.success => OperationResult {
                success: true,
                message: Some("Media downloaded successfully".into()),
                file_path: resp.path,
            },
            BridgeReply::Accepted(resp) => match resp.message {
                Some(reason) => OperationResult::failed(format!("Failed to download media: {}", reason)),
                None => OperationResult::failed("Failed to download media"),
            },
            BridgeReply::Rejected(result) => result,
        };
        debug!("download_media finished, success={}", result.success);
        Ok(result)
    }
}
