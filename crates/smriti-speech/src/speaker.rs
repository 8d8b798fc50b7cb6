use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::{PlaybackError, SpeakOptions, SpeechEngine, Utterance};

const FALLBACK_LANG: &str = "en-US";
const FALLBACK_RATE: f32 = 0.9;
const FALLBACK_PITCH: f32 = 1.0;
const FALLBACK_VOLUME: f32 = 1.0;

/// Stateful wrapper over a [`SpeechEngine`].
///
/// At most one utterance is active; starting a new one cancels the
/// previous. `speak` returns once playback has finished.
pub struct Speaker<E: SpeechEngine> {
    engine: E,
    defaults: SpeakOptions,
    speaking: AtomicBool,
    /// An utterance handle is held from speak start until it settles;
    /// `resume` is only meaningful while this is set.
    holds_utterance: AtomicBool,
    /// Bumped per speak call; a superseded call must not touch the flags
    /// on its way out.
    generation: AtomicU64,
}

impl<E: SpeechEngine> Speaker<E> {
    pub fn new(engine: E) -> Self {
        Self::with_defaults(engine, SpeakOptions::default())
    }

    pub fn with_defaults(engine: E, defaults: SpeakOptions) -> Self {
        Self {
            engine,
            defaults,
            speaking: AtomicBool::new(false),
            holds_utterance: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak `text`, cancelling any in-flight utterance first. Resolves
    /// when playback ends; a playback failure or interruption errs.
    pub async fn speak(
        &self,
        text: &str,
        options: Option<SpeakOptions>,
    ) -> Result<(), PlaybackError> {
        self.stop();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let utterance = self.configure(text, options);
        self.speaking.store(true, Ordering::SeqCst);
        self.holds_utterance.store(true, Ordering::SeqCst);

        let result = self.engine.speak(utterance).await;

        // an overlapping speak owns the flags now; leave them to it
        if self.generation.load(Ordering::SeqCst) == generation {
            self.speaking.store(false, Ordering::SeqCst);
            self.holds_utterance.store(false, Ordering::SeqCst);
        }

        if let Err(err) = &result {
            tracing::debug!("utterance did not finish: {err}");
        }
        result
    }

    /// Cancel playback immediately if speaking.
    pub fn stop(&self) {
        if self.speaking.swap(false, Ordering::SeqCst) {
            self.engine.cancel();
        }
    }

    pub fn pause(&self) {
        if self.is_speaking() {
            self.engine.pause();
        }
    }

    /// Resume a paused utterance; a no-op unless one is held.
    pub fn resume(&self) {
        if self.holds_utterance.load(Ordering::SeqCst) {
            self.engine.resume();
        }
    }

    fn configure(&self, text: &str, options: Option<SpeakOptions>) -> Utterance {
        let options = options.unwrap_or_default();
        Utterance {
            text: text.to_string(),
            lang: options
                .lang
                .or_else(|| self.defaults.lang.clone())
                .unwrap_or_else(|| FALLBACK_LANG.to_string()),
            rate: options.rate.or(self.defaults.rate).unwrap_or(FALLBACK_RATE),
            pitch: options
                .pitch
                .or(self.defaults.pitch)
                .unwrap_or(FALLBACK_PITCH),
            volume: options
                .volume
                .or(self.defaults.volume)
                .unwrap_or(FALLBACK_VOLUME),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Notify;
    use tokio::time::timeout;

    use super::*;

    #[derive(Default)]
    struct FakeEngine {
        spoken: Mutex<Vec<Utterance>>,
        cancels: AtomicUsize,
        pauses: AtomicUsize,
        resumes: AtomicUsize,
        fail: AtomicBool,
        /// When set, `speak` stays pending until `cancel` fires.
        hold_until_cancel: AtomicBool,
        cancelled: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl SpeechEngine for FakeEngine {
        async fn speak(&self, utterance: Utterance) -> Result<(), PlaybackError> {
            self.spoken.lock().unwrap().push(utterance);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PlaybackError::Engine("synth exploded".to_string()));
            }
            if self.hold_until_cancel.load(Ordering::SeqCst) {
                self.cancelled.notified().await;
                return Err(PlaybackError::Interrupted);
            }
            Ok(())
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            self.cancelled.notify_waiters();
        }

        fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.resumes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn overrides_beat_defaults_beat_fallbacks() {
        let speaker = Speaker::with_defaults(
            FakeEngine::default(),
            SpeakOptions {
                lang: Some("bn-BD".to_string()),
                rate: Some(1.2),
                ..Default::default()
            },
        );

        speaker
            .speak(
                "cavalry",
                Some(SpeakOptions {
                    rate: Some(0.5),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();

        let spoken = speaker.engine.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "cavalry");
        assert_eq!(spoken[0].lang, "bn-BD"); // instance default
        assert_eq!(spoken[0].rate, 0.5); // per-call override
        assert_eq!(spoken[0].pitch, 1.0); // fallback
        assert_eq!(spoken[0].volume, 1.0); // fallback
    }

    #[tokio::test]
    async fn plain_speaker_uses_hardcoded_fallbacks() {
        let speaker = Speaker::new(FakeEngine::default());
        speaker.speak("archer", None).await.unwrap();

        let spoken = speaker.engine.spoken.lock().unwrap();
        assert_eq!(spoken[0].lang, "en-US");
        assert_eq!(spoken[0].rate, 0.9);
    }

    #[tokio::test]
    async fn a_new_utterance_cancels_the_previous_one() {
        let engine = FakeEngine::default();
        engine.hold_until_cancel.store(true, Ordering::SeqCst);
        let speaker = Arc::new(Speaker::new(engine));

        let first = {
            let speaker = speaker.clone();
            tokio::spawn(async move { speaker.speak("first", None).await })
        };
        // let the first utterance reach the engine
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(speaker.is_speaking());

        speaker.engine.hold_until_cancel.store(false, Ordering::SeqCst);
        speaker.speak("second", None).await.unwrap();

        let first_result = timeout(Duration::from_secs(1), first)
            .await
            .expect("first speak settles")
            .expect("task not cancelled");
        assert!(matches!(first_result, Err(PlaybackError::Interrupted)));
        assert_eq!(speaker.engine.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(speaker.engine.spoken.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn an_interrupted_speak_leaves_its_successor_speaking() {
        let engine = FakeEngine::default();
        engine.hold_until_cancel.store(true, Ordering::SeqCst);
        let speaker = Arc::new(Speaker::new(engine));

        let first = {
            let speaker = speaker.clone();
            tokio::spawn(async move { speaker.speak("first", None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // second takes over while first's cleanup is still pending
        let second = {
            let speaker = speaker.clone();
            tokio::spawn(async move { speaker.speak("second", None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let first_result = timeout(Duration::from_secs(1), first)
            .await
            .expect("first speak settles")
            .expect("task not cancelled");
        assert!(matches!(first_result, Err(PlaybackError::Interrupted)));
        assert!(
            speaker.is_speaking(),
            "the superseded utterance must not clear the active one's flags"
        );

        speaker.stop();
        let second_result = timeout(Duration::from_secs(1), second)
            .await
            .expect("second speak settles")
            .expect("task not cancelled");
        assert!(matches!(second_result, Err(PlaybackError::Interrupted)));
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn stop_is_a_noop_when_idle() {
        let speaker = Speaker::new(FakeEngine::default());
        speaker.stop();
        assert_eq!(speaker.engine.cancels.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pause_and_resume_require_an_active_utterance() {
        let speaker = Speaker::new(FakeEngine::default());

        speaker.pause();
        speaker.resume();
        assert_eq!(speaker.engine.pauses.load(Ordering::SeqCst), 0);
        assert_eq!(speaker.engine.resumes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pause_and_resume_delegate_while_speaking() {
        let engine = FakeEngine::default();
        engine.hold_until_cancel.store(true, Ordering::SeqCst);
        let speaker = Arc::new(Speaker::new(engine));

        let pending = {
            let speaker = speaker.clone();
            tokio::spawn(async move { speaker.speak("held", None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        speaker.pause();
        speaker.resume();
        assert_eq!(speaker.engine.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(speaker.engine.resumes.load(Ordering::SeqCst), 1);

        speaker.stop();
        let result = timeout(Duration::from_secs(1), pending)
            .await
            .expect("speak settles")
            .expect("task not cancelled");
        assert!(matches!(result, Err(PlaybackError::Interrupted)));
        assert!(!speaker.is_speaking());
    }

    #[tokio::test]
    async fn engine_failures_surface_as_playback_errors() {
        let engine = FakeEngine::default();
        engine.fail.store(true, Ordering::SeqCst);
        let speaker = Speaker::new(engine);

        let result = speaker.speak("doomed", None).await;
        assert!(matches!(result, Err(PlaybackError::Engine(_))));
        assert!(!speaker.is_speaking());
    }
}
