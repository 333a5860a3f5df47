use crate::audio_task::{AudioTask, PlaybackContext};
use crate::blink::BlinkSuppressor;
use crate::collaborators::{Collaborators, Notification};
use crate::completion::{SynthCompleteFlag, spawn_completion_watcher};
use crate::config::CoreConfig;
use crate::conversation_state::{ConversationState, ConversationStateMachine, ControlCommand};
use crate::interrupt::InterruptController;
use crate::model::ModelSlot;
use crate::task_queue::TaskQueue;
use avatar_realtime_types::events::server::{
    AudioEvent, GroupUpdateEvent, NewHistoryCreatedEvent, SetModelAndConfEvent,
};
use avatar_realtime_types::{ClientEvent, HistoryInfo, ServerEvent};
use chrono::SecondsFormat;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Joins a model URL without a scheme onto `base_url`; absolute URLs pass through.
pub fn normalize_model_url(base_url: &str, model_url: &str) -> String {
    if url::Url::parse(model_url).is_ok() {
        return model_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        model_url.trim_start_matches('/')
    )
}

/// Dispatches backend events to the state machine, the playback queue and the
/// collaborators. Events are handled one at a time, in arrival order.
pub struct Router {
    config: CoreConfig,
    state: ConversationStateMachine,
    queue: TaskQueue,
    model: ModelSlot,
    blink: BlinkSuppressor,
    collaborators: Collaborators,
    interrupts: InterruptController,
    synth_complete: SynthCompleteFlag,
}

impl Router {
    pub fn new(config: CoreConfig, collaborators: Collaborators, model: ModelSlot) -> Self {
        let state = ConversationStateMachine::new();
        let queue = TaskQueue::new();
        let interrupts = InterruptController::new(
            state.clone(),
            queue.clone(),
            model.clone(),
            collaborators.clone(),
        );
        Self {
            config,
            state,
            queue,
            model,
            blink: BlinkSuppressor::new(),
            collaborators,
            interrupts,
            synth_complete: SynthCompleteFlag::new(),
        }
    }

    pub fn state(&self) -> &ConversationStateMachine {
        &self.state
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn model_slot(&self) -> &ModelSlot {
        &self.model
    }

    pub fn synth_complete(&self) -> &SynthCompleteFlag {
        &self.synth_complete
    }

    /// For local interrupts, e.g. the user starting to talk over the avatar.
    pub fn interrupt_controller(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn playback_context(&self) -> PlaybackContext {
        PlaybackContext {
            state: self.state.clone(),
            model: self.model.clone(),
            blink: self.blink.clone(),
            collaborators: self.collaborators.clone(),
            playback_timeout: self.config.playback_timeout(),
        }
    }

    /// Starts the task that sends `frontend-playback-complete` after each synth-complete.
    pub fn spawn_completion_watcher(&self) -> JoinHandle<()> {
        spawn_completion_watcher(
            self.queue.clone(),
            self.synth_complete.clone(),
            self.collaborators.outbound.clone(),
        )
    }

    /// Handles events until the connection closes.
    pub async fn run(&self, mut events: broadcast::Receiver<ServerEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let closing = matches!(event, ServerEvent::Close { .. });
                    self.handle(event);
                    if closing {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("router lagged behind, {} event(s) skipped", skipped);
                }
                Err(RecvError::Closed) => {
                    tracing::info!("event stream ended");
                    break;
                }
            }
        }
    }

    /// Decodes and handles one raw text frame. Malformed frames are logged and ignored.
    pub fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => self.handle(event),
            Err(e) => tracing::warn!("ignoring malformed message: {}", e),
        }
    }

    pub fn handle(&self, event: ServerEvent) {
        tracing::debug!("handling {}", event.kind());
        let collaborators = &self.collaborators;
        match event {
            ServerEvent::Control(control) => match control.text() {
                Some(text) => self.handle_control(text),
                None => tracing::debug!("control message without text"),
            },
            ServerEvent::SetModelAndConf(event) => self.set_model_and_conf(&event),
            ServerEvent::FullText(event) => {
                if let Some(text) = event.text() {
                    collaborators.subtitle.set_subtitle_text(text);
                }
            }
            ServerEvent::ConfigFiles(event) => {
                if let Some(configs) = event.configs() {
                    collaborators.settings.set_config_files(configs.to_vec());
                }
            }
            ServerEvent::ConfigSwitched {} => {
                self.state.set(ConversationState::Idle);
                collaborators.subtitle.set_subtitle_text("New Character Loaded");
                collaborators
                    .notifier
                    .notify(Notification::success("Character switched"));
                collaborators.outbound.send(ClientEvent::FetchHistoryList {});
                collaborators.outbound.send(ClientEvent::CreateNewHistory {});
            }
            ServerEvent::BackgroundFiles(event) => {
                if let Some(files) = event.files() {
                    collaborators.settings.set_background_files(files.to_vec());
                }
            }
            ServerEvent::Audio(event) => self.submit_audio(&event),
            ServerEvent::HistoryData(event) => {
                if let Some(messages) = event.messages() {
                    collaborators.chat.set_messages(messages.to_vec());
                }
                collaborators
                    .notifier
                    .notify(Notification::success("History loaded"));
            }
            ServerEvent::NewHistoryCreated(event) => self.new_history_created(&event),
            ServerEvent::HistoryDeleted(event) => {
                let notification = if event.success() {
                    Notification::success("History deleted successfully")
                } else {
                    Notification::error("Failed to delete history")
                };
                collaborators.notifier.notify(notification);
            }
            ServerEvent::HistoryList(event) => {
                if let Some(histories) = event.histories() {
                    collaborators.chat.set_history_list(histories.to_vec());
                    if let Some(first) = histories.first() {
                        collaborators.chat.set_current_history_uid(&first.uid);
                    }
                }
            }
            ServerEvent::UserInputTranscription(event) => {
                if let Some(text) = event.text() {
                    tracing::info!("user said: {}", text);
                    collaborators.chat.append_human_message(text);
                }
            }
            ServerEvent::Error(event) => {
                tracing::error!("backend error: {}", event.message());
                collaborators
                    .notifier
                    .notify(Notification::error(event.message()));
            }
            ServerEvent::GroupUpdate(event) => self.group_update(&event),
            ServerEvent::GroupOperationResult(event) => {
                let notification = if event.success() {
                    Notification::success(event.message())
                } else {
                    Notification::error(event.message())
                };
                collaborators.notifier.notify(notification);
            }
            ServerEvent::BackendSynthComplete {} => self.synth_complete.set(),
            ServerEvent::ConversationChainEnd {} => {
                if !self.queue.has_task() {
                    self.state
                        .transition(ConversationState::ThinkingSpeaking, ConversationState::Idle);
                }
            }
            ServerEvent::ForceNewMessage {} => collaborators.chat.set_force_new_message(true),
            ServerEvent::InterruptSignal(_) => self.interrupts.interrupt(false),
            ServerEvent::Close { reason } => {
                tracing::info!("connection closed: {:?}", reason);
            }
            ServerEvent::Unknown => tracing::warn!("unknown message type"),
        }
    }

    fn handle_control(&self, text: &str) {
        let command = match text.parse::<ControlCommand>() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("{}", e);
                return;
            }
        };
        match command {
            ControlCommand::StartMic => {
                tracing::info!("starting microphone");
                self.collaborators.microphone.start_mic();
            }
            ControlCommand::StopMic => {
                tracing::info!("stopping microphone");
                self.collaborators.microphone.stop_mic();
            }
            ControlCommand::ConversationChainStart => {
                self.state.set(ConversationState::ThinkingSpeaking);
                self.queue.clear_queue();
                self.collaborators.chat.clear_response();
            }
            ControlCommand::ConversationChainEnd => {
                // Runs after every clip queued so far has played.
                let state = self.state.clone();
                let microphone = self.collaborators.microphone.clone();
                self.queue.add_task(move || async move {
                    let finished = state
                        .transition(ConversationState::ThinkingSpeaking, ConversationState::Idle);
                    if finished && microphone.auto_start_on_conversation_end() {
                        microphone.start_mic();
                    }
                });
            }
        }
    }

    fn set_model_and_conf(&self, event: &SetModelAndConfEvent) {
        let settings = &self.collaborators.settings;
        self.state.set(ConversationState::Loading);
        if let Some(name) = event.conf_name() {
            settings.set_conf_name(name);
        }
        if let Some(uid) = event.conf_uid() {
            tracing::info!("conf uid: {}", uid);
            settings.set_conf_uid(uid);
        }
        if let Some(uid) = event.client_uid() {
            settings.set_self_uid(uid);
        }
        // A conf-only update keeps whatever model is already loaded.
        if let Some(info) = event.model_info() {
            let url = normalize_model_url(self.config.base_url(), info.url());
            settings.set_model_info(info.clone().with_url(url));
        }
        self.state.set(ConversationState::Idle);
    }

    fn submit_audio(&self, event: &AudioEvent) {
        let state = self.state.current();
        let text = event.display_text().map(|display| display.text.as_str());
        if state.blocks_audio() {
            tracing::info!("audio playback intercepted ({}), sentence: {:?}", state, text);
            return;
        }

        tracing::debug!("adding audio task {:?} to queue", text);
        let task = AudioTask::from(event);
        let ctx = self.playback_context();
        self.queue.add_task(move || task.play(ctx));
    }

    fn new_history_created(&self, event: &NewHistoryCreatedEvent) {
        let collaborators = &self.collaborators;
        self.state.set(ConversationState::Idle);
        collaborators
            .subtitle
            .set_subtitle_text("New Conversation Started");
        let Some(uid) = event.history_uid() else {
            return;
        };
        collaborators.chat.set_current_history_uid(uid);
        collaborators.chat.set_messages(vec![]);
        let now = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        collaborators.chat.prepend_history(HistoryInfo::new(uid, &now));
        collaborators
            .notifier
            .notify(Notification::success("New chat history created"));
    }

    fn group_update(&self, event: &GroupUpdateEvent) {
        let settings = &self.collaborators.settings;
        if let Some(members) = event.members() {
            tracing::debug!("group members: {:?}", members);
            settings.set_group_members(members.to_vec());
        }
        if let Some(is_owner) = event.is_owner() {
            settings.set_is_owner(is_owner);
        }
    }
}
