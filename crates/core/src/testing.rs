//! Hand-written doubles for tests that care about call order across several
//! collaborators at once, where per-trait mocks get unwieldy.

use crate::blink::BlinkUpdate;
use crate::collaborators::{
    ChatHistory, Collaborators, Microphone, Notification, NotificationKind, Notifier, Outbound,
    SessionSettings, Subtitle,
};
use crate::model::{AvatarModel, ModelInstanceId, PlaybackOutcome, PlaybackSignal};
use anyhow::Result;
use avatar_realtime_types::{ChatMessage, ClientEvent, ConfigFile, Expression, HistoryInfo, ModelInfo};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Polls `condition` until it holds, failing the test after a second.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

pub(crate) struct FakeModel {
    id: ModelInstanceId,
    auto_finish: bool,
    original_blink: BlinkUpdate,
    blink: Mutex<BlinkUpdate>,
    blink_swaps: AtomicUsize,
    spoken: Mutex<Vec<(String, Option<Expression>)>>,
    pending: Mutex<VecDeque<oneshot::Sender<PlaybackOutcome>>>,
    stops: AtomicUsize,
}

impl FakeModel {
    /// A model whose clips play until the test finishes them.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    /// A model whose clips finish as soon as they start.
    pub(crate) fn auto_finishing() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(auto_finish: bool) -> Self {
        let original: BlinkUpdate = Arc::new(|_: f32| {});
        Self {
            id: ModelInstanceId::next(),
            auto_finish,
            original_blink: original.clone(),
            blink: Mutex::new(original),
            blink_swaps: AtomicUsize::new(0),
            spoken: Mutex::new(vec![]),
            pending: Mutex::new(VecDeque::new()),
            stops: AtomicUsize::new(0),
        }
    }

    pub(crate) fn spoken(&self) -> Vec<(String, Option<Expression>)> {
        self.spoken.lock().unwrap().clone()
    }

    /// Payloads spoken so far, with the data URI prefix removed.
    pub(crate) fn spoken_payloads(&self) -> Vec<String> {
        self.spoken()
            .into_iter()
            .map(|(uri, _)| {
                avatar_realtime_types::audio::payload_from_data_uri(&uri)
                    .unwrap_or(&uri)
                    .to_string()
            })
            .collect()
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub(crate) fn finish_next(&self) {
        self.complete_next(PlaybackOutcome::Finished);
    }

    pub(crate) fn fail_next(&self, reason: &str) {
        self.complete_next(PlaybackOutcome::Failed(reason.to_string()));
    }

    /// Drops every pending completion sender without sending.
    pub(crate) fn drop_pending(&self) {
        self.pending.lock().unwrap().clear();
    }

    pub(crate) fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn blink_swaps(&self) -> usize {
        self.blink_swaps.load(Ordering::SeqCst)
    }

    pub(crate) fn has_original_blink(&self) -> bool {
        let current = self.blink.lock().unwrap();
        Arc::as_ptr(&*current) as *const () == Arc::as_ptr(&self.original_blink) as *const ()
    }

    fn complete_next(&self, outcome: PlaybackOutcome) {
        let next = self.pending.lock().unwrap().pop_front();
        if let Some(tx) = next {
            let _ = tx.send(outcome);
        }
    }
}

impl AvatarModel for FakeModel {
    fn instance_id(&self) -> ModelInstanceId {
        self.id
    }

    fn speak(&self, audio_uri: String, expression: Option<Expression>) -> Result<PlaybackSignal> {
        self.spoken.lock().unwrap().push((audio_uri, expression));
        let (tx, rx) = oneshot::channel();
        if self.auto_finish {
            let _ = tx.send(PlaybackOutcome::Finished);
        } else {
            self.pending.lock().unwrap().push_back(tx);
        }
        Ok(rx)
    }

    fn stop_speaking(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        for tx in self.pending.lock().unwrap().drain(..) {
            let _ = tx.send(PlaybackOutcome::Finished);
        }
    }

    fn replace_blink_update(&self, update: BlinkUpdate) -> Option<BlinkUpdate> {
        self.blink_swaps.fetch_add(1, Ordering::SeqCst);
        Some(std::mem::replace(&mut *self.blink.lock().unwrap(), update))
    }

    fn expressions(&self) -> Vec<String> {
        vec!["neutral".to_string(), "smile".to_string()]
    }

    fn set_expression(&self, _expression: Expression) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    AppendResponse(String),
    ClearResponse,
    AiMessage(String, Option<String>, Option<String>),
    HumanMessage(String),
    Messages(Vec<ChatMessage>),
    HistoryList(Vec<HistoryInfo>),
    PrependHistory(String),
    CurrentHistoryUid(String),
    ForceNewMessage(bool),
    Subtitle(String),
    Notify(String, NotificationKind),
    StartMic,
    StopMic,
    ModelInfo(ModelInfo),
    ConfName(String),
    ConfUid(String),
    ConfigFiles(Vec<ConfigFile>),
    BackgroundFiles(Vec<String>),
    SelfUid(String),
    GroupMembers(Vec<String>),
    IsOwner(bool),
    Send(ClientEvent),
}

/// Implements every collaborator trait and records each call in order.
pub(crate) struct RecordingFrontend {
    calls: Mutex<Vec<Call>>,
    response: Mutex<String>,
    auto_start_mic: bool,
}

impl RecordingFrontend {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_auto_start_mic(false)
    }

    pub(crate) fn with_auto_start_mic(auto_start_mic: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(vec![]),
            response: Mutex::new(String::new()),
            auto_start_mic,
        })
    }

    pub(crate) fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            chat: self.clone(),
            subtitle: self.clone(),
            notifier: self.clone(),
            microphone: self.clone(),
            settings: self.clone(),
            outbound: self.clone(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<ClientEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ChatHistory for RecordingFrontend {
    fn append_response(&self, text: &str) {
        self.response.lock().unwrap().push_str(text);
        self.record(Call::AppendResponse(text.to_string()));
    }

    fn full_response(&self) -> String {
        self.response.lock().unwrap().clone()
    }

    fn clear_response(&self) {
        self.response.lock().unwrap().clear();
        self.record(Call::ClearResponse);
    }

    fn append_ai_message(&self, text: &str, name: Option<String>, avatar: Option<String>) {
        self.record(Call::AiMessage(text.to_string(), name, avatar));
    }

    fn append_human_message(&self, text: &str) {
        self.record(Call::HumanMessage(text.to_string()));
    }

    fn set_messages(&self, messages: Vec<ChatMessage>) {
        self.record(Call::Messages(messages));
    }

    fn set_history_list(&self, histories: Vec<HistoryInfo>) {
        self.record(Call::HistoryList(histories));
    }

    fn prepend_history(&self, history: HistoryInfo) {
        self.record(Call::PrependHistory(history.uid));
    }

    fn set_current_history_uid(&self, uid: &str) {
        self.record(Call::CurrentHistoryUid(uid.to_string()));
    }

    fn set_force_new_message(&self, force: bool) {
        self.record(Call::ForceNewMessage(force));
    }
}

impl Subtitle for RecordingFrontend {
    fn set_subtitle_text(&self, text: &str) {
        self.record(Call::Subtitle(text.to_string()));
    }
}

impl Notifier for RecordingFrontend {
    fn notify(&self, notification: Notification) {
        self.record(Call::Notify(notification.title, notification.kind));
    }
}

impl Microphone for RecordingFrontend {
    fn start_mic(&self) {
        self.record(Call::StartMic);
    }

    fn stop_mic(&self) {
        self.record(Call::StopMic);
    }

    fn auto_start_on_conversation_end(&self) -> bool {
        self.auto_start_mic
    }
}

impl SessionSettings for RecordingFrontend {
    fn set_model_info(&self, model_info: ModelInfo) {
        self.record(Call::ModelInfo(model_info));
    }

    fn set_conf_name(&self, name: &str) {
        self.record(Call::ConfName(name.to_string()));
    }

    fn set_conf_uid(&self, uid: &str) {
        self.record(Call::ConfUid(uid.to_string()));
    }

    fn set_config_files(&self, configs: Vec<ConfigFile>) {
        self.record(Call::ConfigFiles(configs));
    }

    fn set_background_files(&self, files: Vec<String>) {
        self.record(Call::BackgroundFiles(files));
    }

    fn set_self_uid(&self, uid: &str) {
        self.record(Call::SelfUid(uid.to_string()));
    }

    fn set_group_members(&self, members: Vec<String>) {
        self.record(Call::GroupMembers(members));
    }

    fn set_is_owner(&self, is_owner: bool) {
        self.record(Call::IsOwner(is_owner));
    }
}

impl Outbound for RecordingFrontend {
    fn send(&self, event: ClientEvent) {
        self.record(Call::Send(event));
    }
}
