use anyhow::{anyhow, Result};

/// Default model for the live bidirectional session.
pub const LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";
/// Default model for one-shot file transcription.
pub const FILE_MODEL: &str = "gemini-2.5-flash";

/// Injected at construction; no ambient globals. The credential is the
/// only required field.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub live_model: String,
    pub file_model: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            live_model: LIVE_MODEL.to_string(),
            file_model: FILE_MODEL.to_string(),
        }
    }

    /// Reads GEMINI_API_KEY (required) and optional model overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY is not set"))?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("MOZHI_LIVE_MODEL") {
            config.live_model = model;
        }
        if let Ok(model) = std::env::var("MOZHI_FILE_MODEL") {
            config.file_model = model;
        }
        Ok(config)
    }
}
