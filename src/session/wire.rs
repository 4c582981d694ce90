use serde::{Deserialize, Serialize};

use crate::audio::encoder::EncodedFrame;
use crate::session::event::SessionEvent;

pub const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Pins the translation target. The session speaks Malayalam back no
/// matter what language comes in.
pub const SYSTEM_INSTRUCTION: &str = "You are a simultaneous interpreter. \
Whatever the user says, in any language, respond by speaking only its \
Malayalam translation. Do not answer questions, do not add commentary, \
translate exactly what was said.";

pub fn live_url(api_key: &str) -> String {
    format!("{LIVE_ENDPOINT}?key={api_key}")
}

// ── Client → server ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SetupMessage {
    pub setup: Setup,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    pub model: String,
    pub generation_config: GenerationConfig,
    pub system_instruction: SystemInstruction,
    pub input_audio_transcription: Enabled,
    pub output_audio_transcription: Enabled,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// Serializes to `{}`: presence of the field turns the feature on.
#[derive(Debug, Serialize)]
pub struct Enabled {}

pub fn setup_message(model: &str) -> SetupMessage {
    SetupMessage {
        setup: Setup {
            model: format!("models/{model}"),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
            },
            system_instruction: SystemInstruction {
                parts: vec![TextPart {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            input_audio_transcription: Enabled {},
            output_audio_transcription: Enabled {},
        },
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputMessage {
    pub realtime_input: RealtimeInput,
}

#[derive(Debug, Serialize)]
pub struct RealtimeInput {
    pub media: MediaChunk,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaChunk {
    pub mime_type: String,
    pub data: String,
}

pub fn realtime_input(frame: EncodedFrame) -> RealtimeInputMessage {
    RealtimeInputMessage {
        realtime_input: RealtimeInput {
            media: MediaChunk {
                mime_type: frame.mime_type.to_string(),
                data: frame.data,
            },
        },
    }
}

// ── Server → client ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub setup_complete: Option<serde_json::Value>,
    pub server_content: Option<ServerContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
    #[serde(default)]
    pub turn_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct Transcription {
    pub text: Option<String>,
}

impl ServerMessage {
    /// Flattens one wire message into ordered session events. Transcription
    /// deltas come before the turn boundary so the accumulator sees the
    /// final fragment of a turn before committing it.
    pub fn into_events(self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.setup_complete.is_some() {
            events.push(SessionEvent::Open);
        }
        if let Some(content) = self.server_content {
            if let Some(text) = content.input_transcription.and_then(|t| t.text) {
                if !text.is_empty() {
                    events.push(SessionEvent::InputDelta(text));
                }
            }
            if let Some(text) = content.output_transcription.and_then(|t| t.text) {
                if !text.is_empty() {
                    events.push(SessionEvent::OutputDelta(text));
                }
            }
            if content.turn_complete {
                events.push(SessionEvent::TurnComplete);
            }
        }
        events
    }
}
