use crate::blink::BlinkSuppressor;
use crate::collaborators::{Collaborators, Notification};
use crate::conversation_state::{ConversationState, ConversationStateMachine};
use crate::model::{ModelSlot, PlaybackOutcome, PlaybackSignal};
use avatar_realtime_types::audio::wav_data_uri;
use avatar_realtime_types::events::client::AudioPlayStartEvent;
use avatar_realtime_types::events::server::AudioEvent;
use avatar_realtime_types::{ClientEvent, DisplayText, Expression};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Speak function error: {0}")]
    Speak(String),
    #[error("Audio playback error: {0}")]
    Renderer(String),
    #[error("playback signal dropped before the clip finished")]
    SignalDropped,
    #[error("playback did not finish within {0:?}")]
    TimedOut(Duration),
}

/// One clip to play, with the text and expression that go with it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTask {
    audio_payload: String,
    display_text: Option<DisplayText>,
    expression_hint: Option<Vec<Expression>>,
    forwarded: bool,
}

impl From<&AudioEvent> for AudioTask {
    fn from(event: &AudioEvent) -> Self {
        Self {
            audio_payload: event.audio().to_string(),
            display_text: event.display_text().cloned(),
            expression_hint: event.expressions().map(<[Expression]>::to_vec),
            forwarded: event.forwarded(),
        }
    }
}

/// What a running [`AudioTask`] reads and calls. State is read when the task
/// runs, never when it was queued.
#[derive(Clone)]
pub struct PlaybackContext {
    pub state: ConversationStateMachine,
    pub model: ModelSlot,
    pub blink: BlinkSuppressor,
    pub collaborators: Collaborators,
    pub playback_timeout: Option<Duration>,
}

impl AudioTask {
    pub fn new(audio_payload: &str) -> Self {
        Self {
            audio_payload: audio_payload.to_string(),
            display_text: None,
            expression_hint: None,
            forwarded: false,
        }
    }

    pub fn audio_payload(&self) -> &str {
        &self.audio_payload
    }

    pub fn display_text(&self) -> Option<&DisplayText> {
        self.display_text.as_ref()
    }

    pub fn expression_hint(&self) -> Option<&[Expression]> {
        self.expression_hint.as_deref()
    }

    pub fn forwarded(&self) -> bool {
        self.forwarded
    }

    /// Plays the clip and performs its side effects. Never fails; every error
    /// is logged or reported through the notifier and the task still resolves.
    pub async fn play(self, ctx: PlaybackContext) {
        // Subscribe before the state check so an interrupt landing after it is still seen.
        let mut interrupts = ctx.state.interrupt_signal();
        let state = ctx.state.current();
        if state == ConversationState::Interrupted {
            tracing::warn!("audio playback blocked, state: {}", state);
            return;
        }

        let collaborators = &ctx.collaborators;
        if let Some(display_text) = &self.display_text {
            collaborators.chat.append_response(&display_text.text);
            collaborators.chat.append_ai_message(
                &display_text.text,
                display_text.name.clone(),
                display_text.avatar.clone(),
            );
            if !self.audio_payload.is_empty() {
                collaborators.subtitle.set_subtitle_text(&display_text.text);
            }
            if !self.forwarded {
                collaborators
                    .outbound
                    .send(ClientEvent::AudioPlayStart(AudioPlayStartEvent::new(
                        display_text.clone(),
                    )));
            }
        }

        let Some(model) = ctx.model.current() else {
            tracing::error!("avatar model not loaded, skipping audio");
            return;
        };
        if self.audio_payload.is_empty() {
            return;
        }

        ctx.blink.suppress(model.as_ref());
        let expression = self.expression_hint.and_then(|hint| hint.into_iter().next());
        let result = match model.speak(wav_data_uri(&self.audio_payload), expression) {
            Ok(signal) => tokio::select! {
                biased;
                _ = interrupted(&mut interrupts) => {
                    tracing::debug!("playback interrupted");
                    Ok(())
                }
                result = wait_for_signal(signal, ctx.playback_timeout) => result,
            },
            Err(e) => Err(PlaybackError::Speak(e.to_string())),
        };

        match result {
            Ok(()) => tracing::debug!("voiceline is over"),
            Err(e @ (PlaybackError::Speak(_) | PlaybackError::Renderer(_))) => {
                tracing::error!("{}", e);
                collaborators.notifier.notify(Notification::error(e.to_string()));
            }
            Err(e @ PlaybackError::TimedOut(_)) => {
                tracing::warn!("{}, stopping the clip", e);
                model.stop_speaking();
            }
            Err(e @ PlaybackError::SignalDropped) => tracing::warn!("{}", e),
        }

        // Restore onto whatever is loaded now; a reloaded model gets nothing back.
        match ctx.model.current() {
            Some(current) => ctx.blink.restore(current.as_ref()),
            None => ctx.blink.discard(),
        }
    }
}

async fn interrupted(interrupts: &mut watch::Receiver<u64>) {
    if interrupts.changed().await.is_err() {
        // The state machine is gone; nothing can interrupt any more.
        std::future::pending::<()>().await;
    }
}

async fn wait_for_signal(
    signal: PlaybackSignal,
    timeout: Option<Duration>,
) -> Result<(), PlaybackError> {
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, signal)
            .await
            .map_err(|_| PlaybackError::TimedOut(limit))?,
        None => signal.await,
    };
    match outcome {
        Ok(PlaybackOutcome::Finished) => Ok(()),
        Ok(PlaybackOutcome::Failed(reason)) => Err(PlaybackError::Renderer(reason)),
        Err(_) => Err(PlaybackError::SignalDropped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blink::BlinkUpdate;
    use crate::collaborators::NotificationKind;
    use crate::model::{MockAvatarModel, ModelInstanceId};
    use crate::testing::{Call, FakeModel, RecordingFrontend, wait_until};
    use std::sync::Arc;

    fn context(frontend: &Arc<RecordingFrontend>, state: ConversationState) -> PlaybackContext {
        PlaybackContext {
            state: ConversationStateMachine::with_state(state),
            model: ModelSlot::new(),
            blink: BlinkSuppressor::new(),
            collaborators: frontend.collaborators(),
            playback_timeout: None,
        }
    }

    fn spoken_task(payload: &str, text: &str) -> AudioTask {
        let event = AudioEvent::new(payload)
            .with_display_text(DisplayText::new(text).with_speaker("Mao", Some("mao.png")))
            .with_expressions(vec![Expression::Index(3), Expression::Index(1)]);
        AudioTask::from(&event)
    }

    #[tokio::test]
    async fn test_play_runs_side_effects_then_speaks() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let model = FakeModel::auto_finishing();
        ctx.model.install(model.clone());

        // --- Act ---
        spoken_task("UklGRg==", "Hi").play(ctx.clone()).await;

        // --- Assert ---
        assert_eq!(
            frontend.calls(),
            vec![
                Call::AppendResponse("Hi".into()),
                Call::AiMessage("Hi".into(), Some("Mao".into()), Some("mao.png".into())),
                Call::Subtitle("Hi".into()),
                Call::Send(ClientEvent::AudioPlayStart(AudioPlayStartEvent::new(
                    DisplayText::new("Hi").with_speaker("Mao", Some("mao.png"))
                ))),
            ]
        );
        assert_eq!(
            model.spoken(),
            vec![(
                "data:audio/wav;base64,UklGRg==".to_string(),
                Some(Expression::Index(3))
            )]
        );
        assert_eq!(model.blink_swaps(), 2);
        assert!(model.has_original_blink());
        assert!(!ctx.blink.is_suppressed());
    }

    #[tokio::test]
    async fn test_interrupted_state_skips_everything() {
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::Interrupted);
        let model = FakeModel::auto_finishing();
        ctx.model.install(model.clone());

        spoken_task("UklGRg==", "Hi").play(ctx).await;

        assert!(frontend.calls().is_empty());
        assert!(model.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_never_touches_blink() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let model = FakeModel::auto_finishing();
        ctx.model.install(model.clone());

        // --- Act ---
        spoken_task("", "text only").play(ctx).await;

        // --- Assert ---
        assert_eq!(model.blink_swaps(), 0);
        assert!(model.spoken().is_empty());
        let calls = frontend.calls();
        assert!(calls.contains(&Call::AppendResponse("text only".into())));
        assert!(
            !calls.iter().any(|call| matches!(call, Call::Subtitle(_))),
            "no subtitle without audio"
        );
    }

    #[tokio::test]
    async fn test_forwarded_audio_is_not_relayed() {
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        ctx.model.install(FakeModel::auto_finishing());
        let event = AudioEvent::new("UklGRg==")
            .with_display_text(DisplayText::new("relayed"))
            .with_forwarded(true);

        AudioTask::from(&event).play(ctx).await;

        assert!(
            !frontend
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Send(_)))
        );
    }

    #[tokio::test]
    async fn test_missing_model_resolves_after_text_side_effects() {
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);

        spoken_task("UklGRg==", "Hi").play(ctx.clone()).await;

        assert!(frontend.calls().contains(&Call::AppendResponse("Hi".into())));
        assert!(!ctx.blink.is_suppressed());
    }

    #[tokio::test]
    async fn test_speak_error_is_notified_and_blink_restored() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let id = ModelInstanceId::next();
        let mut model = MockAvatarModel::new();
        model.expect_instance_id().return_const(id);
        model
            .expect_replace_blink_update()
            .times(2)
            .returning(|_| Some(Arc::new(|_: f32| {}) as BlinkUpdate));
        model
            .expect_speak()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("decoder missing")));
        ctx.model.install(Arc::new(model));

        // --- Act ---
        AudioTask::new("UklGRg==").play(ctx.clone()).await;

        // --- Assert ---
        assert_eq!(
            frontend.calls(),
            vec![Call::Notify(
                "Speak function error: decoder missing".into(),
                NotificationKind::Error
            )]
        );
        assert!(!ctx.blink.is_suppressed());
    }

    #[tokio::test]
    async fn test_renderer_failure_counts_as_finished() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let model = FakeModel::new();
        ctx.model.install(model.clone());

        // --- Act ---
        let playing = tokio::spawn(AudioTask::new("UklGRg==").play(ctx.clone()));
        wait_until(|| model.pending() == 1).await;
        model.fail_next("bad header");
        playing.await.unwrap();

        // --- Assert ---
        assert_eq!(
            frontend.calls(),
            vec![Call::Notify(
                "Audio playback error: bad header".into(),
                NotificationKind::Error
            )]
        );
        assert!(model.has_original_blink());
    }

    #[tokio::test]
    async fn test_interrupt_mid_playback_restores_blink_once() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let model = FakeModel::new();
        ctx.model.install(model.clone());
        let playing = tokio::spawn(AudioTask::new("UklGRg==").play(ctx.clone()));
        wait_until(|| model.pending() == 1).await;
        assert!(ctx.blink.is_suppressed());

        // --- Act ---
        ctx.state.interrupt();
        playing.await.unwrap();

        // --- Assert ---
        assert_eq!(model.blink_swaps(), 2);
        assert!(model.has_original_blink());
        assert!(!ctx.blink.is_suppressed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_a_stuck_clip() {
        // --- Arrange ---
        let frontend = RecordingFrontend::new();
        let mut ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        ctx.playback_timeout = Some(Duration::from_secs(5));
        let model = FakeModel::new();
        ctx.model.install(model.clone());

        // --- Act ---
        AudioTask::new("UklGRg==").play(ctx.clone()).await;

        // --- Assert ---
        assert_eq!(model.stop_count(), 1);
        assert!(model.has_original_blink());
    }

    #[tokio::test]
    async fn test_dropped_signal_resolves_the_task() {
        let frontend = RecordingFrontend::new();
        let ctx = context(&frontend, ConversationState::ThinkingSpeaking);
        let model = FakeModel::new();
        ctx.model.install(model.clone());

        let playing = tokio::spawn(AudioTask::new("UklGRg==").play(ctx.clone()));
        wait_until(|| model.pending() == 1).await;
        model.drop_pending();
        playing.await.unwrap();

        assert!(frontend.calls().is_empty());
        assert!(!ctx.blink.is_suppressed());
    }
}
