use std::env;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    /// BCP-47 language tag for playback
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SpeechConfig {
    pub fn new() -> Self {
        let lang = env::var("SMRITI_SPEECH_LANG").unwrap_or_else(|_| "en-US".to_string());

        let rate = env::var("SMRITI_SPEECH_RATE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.9);

        let pitch = env::var("SMRITI_SPEECH_PITCH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1.0);

        let volume = env::var("SMRITI_SPEECH_VOLUME")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1.0);

        Self {
            lang,
            rate,
            pitch,
            volume,
        }
    }
}
