pub mod speaker;

pub use speaker::Speaker;

/// Playback configuration for one utterance, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Per-call overrides; unset fields fall back to the speaker defaults,
/// then to the hard-coded fallbacks.
#[derive(Debug, Clone, Default)]
pub struct SpeakOptions {
    pub lang: Option<String>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("speech engine failure: {0}")]
    Engine(String),

    #[error("playback interrupted")]
    Interrupted,
}

/// Platform speech backend.
///
/// `speak` resolves when playback ends and errs on engine failure; a
/// `cancel` while an utterance plays makes the pending `speak` settle with
/// [`PlaybackError::Interrupted`].
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, utterance: Utterance) -> Result<(), PlaybackError>;

    /// Cancel the in-flight utterance, if any
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);
}
