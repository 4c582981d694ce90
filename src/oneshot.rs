use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transcript::HistoryRecord;

const PROMPT: &str = "Transcribe the speech in this audio in its original \
language, then translate it into Malayalam. Respond with JSON containing \
only the transcription and translation fields.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

/// The schema-shaped reply: both fields required by the declared schema.
#[derive(Debug, Deserialize)]
struct FileReply {
    transcription: String,
    translation: String,
}

/// Sends a whole audio file in one request and parses the structured
/// reply. No streaming, no session, no teardown on failure.
pub struct FileTranscriber {
    client: Client,
    api_key: String,
    model: String,
}

impl FileTranscriber {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: config.api_key.clone(),
            model: config.file_model.clone(),
        }
    }

    /// Raw file bytes go up as a single inline base64 part, no PCM
    /// reframing. The declared response schema makes the reply directly
    /// parseable.
    pub async fn transcribe(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<HistoryRecord, ClientError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(bytes),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: json!({
                    "type": "OBJECT",
                    "properties": {
                        "transcription": { "type": "STRING" },
                        "translation": { "type": "STRING" }
                    },
                    "required": ["transcription", "translation"]
                }),
            },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        info!("one-shot transcription: {} bytes of {}", bytes.len(), mime_type);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ClientError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::Transport(format!(
                "service returned {status}: {detail}"
            )));
        }

        let body = response.text().await.map_err(ClientError::transport)?;
        parse_response(&body)
    }
}

/// Parses the full response body down to a history record. Split out from
/// the HTTP call so the parsing rules are testable offline.
pub fn parse_response(body: &str) -> Result<HistoryRecord, ClientError> {
    let envelope: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ClientError::ResponseFormat(format!("invalid response envelope: {e}")))?;

    let text = envelope
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| ClientError::ResponseFormat("no candidate text in response".into()))?;

    parse_reply(&text)
}

/// Parses the schema-shaped payload itself.
pub fn parse_reply(text: &str) -> Result<HistoryRecord, ClientError> {
    let reply: FileReply = serde_json::from_str(text)
        .map_err(|e| ClientError::ResponseFormat(format!("invalid reply JSON: {e}")))?;

    if reply.transcription.trim().is_empty() && reply.translation.trim().is_empty() {
        return Err(ClientError::ResponseFormat(
            "empty transcription and translation".into(),
        ));
    }
    Ok(HistoryRecord {
        user: reply.transcription,
        translation: reply.translation,
    })
}

/// Extension-based media type for the accepted upload kinds, with a
/// generic fallback for anything else the picker lets through.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("aac") => "audio/aac",
        Some("ogg") => "audio/ogg",
        Some("wma") => "audio/x-ms-wma",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
