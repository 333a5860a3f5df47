//! A frontend without a screen or speakers.
//!
//! The headless model "plays" each clip by waiting for as long as the WAV
//! header says the clip lasts, so the backend sees realistic pacing. Every
//! other collaborator call is written to the log.

use anyhow::{Context, Result};
use avatar_core::{
    AvatarModel, BlinkUpdate, ChatHistory, Collaborators, Microphone, ModelInstanceId, ModelSlot,
    Notification, NotificationKind, Notifier, Outbound, PlaybackOutcome, PlaybackSignal,
    SessionSettings, Subtitle,
};
use avatar_realtime::types::audio::payload_from_data_uri;
use avatar_realtime::types::{ChatMessage, ConfigFile, Expression, HistoryInfo, ModelInfo};
use base64::Engine;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Length of a WAV clip according to its header.
pub fn wav_duration(bytes: &[u8]) -> Result<Duration> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).context("Failed to read WAV header")?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        anyhow::bail!("WAV header has a zero sample rate");
    }
    // `duration` counts frames, i.e. samples per channel.
    let frames = reader.duration();
    Ok(Duration::from_secs_f64(
        frames as f64 / spec.sample_rate as f64,
    ))
}

type Completion = Arc<Mutex<Option<oneshot::Sender<PlaybackOutcome>>>>;

struct Playing {
    done: Completion,
    timer: JoinHandle<()>,
}

fn finish(done: &Completion) {
    let sender = done.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = sender {
        let _ = tx.send(PlaybackOutcome::Finished);
    }
}

pub struct HeadlessModel {
    id: ModelInstanceId,
    info: ModelInfo,
    blink: Mutex<BlinkUpdate>,
    expression: Mutex<Option<Expression>>,
    playing: Mutex<Option<Playing>>,
}

impl HeadlessModel {
    pub fn new(info: ModelInfo) -> Self {
        Self {
            id: ModelInstanceId::next(),
            info,
            blink: Mutex::new(Arc::new(|_: f32| {}) as BlinkUpdate),
            expression: Mutex::new(None),
            playing: Mutex::new(None),
        }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn expression(&self) -> Option<Expression> {
        self.expression
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AvatarModel for HeadlessModel {
    fn instance_id(&self) -> ModelInstanceId {
        self.id
    }

    fn speak(&self, audio_uri: String, expression: Option<Expression>) -> Result<PlaybackSignal> {
        let payload = payload_from_data_uri(&audio_uri)
            .ok_or_else(|| anyhow::anyhow!("unsupported audio uri"))?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("Failed to decode base64 audio")?;
        let duration = wav_duration(&bytes)?;

        if let Some(expression) = expression {
            self.set_expression(expression)?;
        }

        // A new clip replaces whatever was still playing.
        self.stop_speaking();

        let (tx, rx) = oneshot::channel();
        let done: Completion = Arc::new(Mutex::new(Some(tx)));
        let timer_done = done.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            finish(&timer_done);
        });
        tracing::info!("{} speaking for {:?}", self.id, duration);
        *self.playing.lock().unwrap_or_else(PoisonError::into_inner) = Some(Playing { done, timer });
        Ok(rx)
    }

    fn stop_speaking(&self) {
        let playing = self
            .playing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(playing) = playing {
            playing.timer.abort();
            finish(&playing.done);
            tracing::debug!("{} stopped speaking", self.id);
        }
    }

    fn replace_blink_update(&self, update: BlinkUpdate) -> Option<BlinkUpdate> {
        let mut blink = self.blink.lock().unwrap_or_else(PoisonError::into_inner);
        Some(std::mem::replace(&mut *blink, update))
    }

    fn expressions(&self) -> Vec<String> {
        // A headless model only knows the names the backend put in its model info.
        self.info
            .extra()
            .get("emotionMap")
            .and_then(|map| map.as_object())
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn set_expression(&self, expression: Expression) -> Result<()> {
        tracing::debug!("{} expression: {}", self.id, expression);
        *self.expression.lock().unwrap_or_else(PoisonError::into_inner) = Some(expression);
        Ok(())
    }
}

/// Logs every collaborator call and keeps just enough state to answer queries.
pub struct HeadlessFrontend {
    slot: ModelSlot,
    auto_start_mic: bool,
    mic_open: AtomicBool,
    response: Mutex<String>,
}

impl HeadlessFrontend {
    pub fn new(slot: ModelSlot, auto_start_mic: bool) -> Arc<Self> {
        Arc::new(Self {
            slot,
            auto_start_mic,
            mic_open: AtomicBool::new(false),
            response: Mutex::new(String::new()),
        })
    }

    pub fn collaborators(self: &Arc<Self>, outbound: Arc<dyn Outbound>) -> Collaborators {
        Collaborators {
            chat: self.clone(),
            subtitle: self.clone(),
            notifier: self.clone(),
            microphone: self.clone(),
            settings: self.clone(),
            outbound,
        }
    }

    pub fn mic_open(&self) -> bool {
        self.mic_open.load(Ordering::SeqCst)
    }

    fn response(&self) -> std::sync::MutexGuard<'_, String> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChatHistory for HeadlessFrontend {
    fn append_response(&self, text: &str) {
        self.response().push_str(text);
    }

    fn full_response(&self) -> String {
        self.response().clone()
    }

    fn clear_response(&self) {
        self.response().clear();
    }

    fn append_ai_message(&self, text: &str, name: Option<String>, _avatar: Option<String>) {
        tracing::info!("{}: {}", name.as_deref().unwrap_or("AI"), text);
    }

    fn append_human_message(&self, text: &str) {
        tracing::info!("Human: {}", text);
    }

    fn set_messages(&self, messages: Vec<ChatMessage>) {
        tracing::info!("loaded {} message(s)", messages.len());
    }

    fn set_history_list(&self, histories: Vec<HistoryInfo>) {
        tracing::info!("{} stored conversation(s)", histories.len());
    }

    fn prepend_history(&self, history: HistoryInfo) {
        tracing::debug!("new conversation {}", history.uid);
    }

    fn set_current_history_uid(&self, uid: &str) {
        tracing::info!("current conversation: {}", uid);
    }

    fn set_force_new_message(&self, force: bool) {
        tracing::debug!("force new message: {}", force);
    }
}

impl Subtitle for HeadlessFrontend {
    fn set_subtitle_text(&self, text: &str) {
        tracing::info!("subtitle: {}", text);
    }
}

impl Notifier for HeadlessFrontend {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => tracing::error!("{}", notification.title),
            NotificationKind::Warning => tracing::warn!("{}", notification.title),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!("{}", notification.title)
            }
        }
    }
}

impl Microphone for HeadlessFrontend {
    fn start_mic(&self) {
        self.mic_open.store(true, Ordering::SeqCst);
        tracing::info!("microphone on");
    }

    fn stop_mic(&self) {
        self.mic_open.store(false, Ordering::SeqCst);
        tracing::info!("microphone off");
    }

    fn auto_start_on_conversation_end(&self) -> bool {
        self.auto_start_mic
    }
}

impl SessionSettings for HeadlessFrontend {
    fn set_model_info(&self, model_info: ModelInfo) {
        tracing::info!("loading model {}", model_info.url());
        if let Some(previous) = self.slot.install(Arc::new(HeadlessModel::new(model_info))) {
            previous.stop_speaking();
        }
    }

    fn set_conf_name(&self, name: &str) {
        tracing::info!("character: {}", name);
    }

    fn set_conf_uid(&self, uid: &str) {
        tracing::debug!("conf uid: {}", uid);
    }

    fn set_config_files(&self, configs: Vec<ConfigFile>) {
        tracing::info!("{} character config(s) available", configs.len());
    }

    fn set_background_files(&self, files: Vec<String>) {
        tracing::debug!("{} background(s) available", files.len());
    }

    fn set_self_uid(&self, uid: &str) {
        tracing::info!("client uid: {}", uid);
    }

    fn set_group_members(&self, members: Vec<String>) {
        tracing::info!("group members: {:?}", members);
    }

    fn set_is_owner(&self, is_owner: bool) {
        tracing::debug!("group owner: {}", is_owner);
    }
}
