use crate::blink::BlinkUpdate;
use anyhow::Result;
use avatar_realtime_types::Expression;
#[cfg(test)]
use mockall::automock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// How one `speak` call ended, as reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Failed(String),
}

/// Resolves once when the clip passed to [`AvatarModel::speak`] stops playing.
pub type PlaybackSignal = oneshot::Receiver<PlaybackOutcome>;

/// Identity of one loaded model. A reload always yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelInstanceId(u64);

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

impl ModelInstanceId {
    pub fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ModelInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

// The rendered avatar, as far as the playback path needs it. Lip sync,
// motion and drawing all live behind this trait; the core only hands it a
// clip and waits for the clip to end.
#[cfg_attr(test, automock)]
pub trait AvatarModel: Send + Sync {
    fn instance_id(&self) -> ModelInstanceId;

    /// Starts playing `audio_uri` with lip sync. Errors here mean playback never started.
    fn speak(&self, audio_uri: String, expression: Option<Expression>) -> Result<PlaybackSignal>;

    /// Halts the current clip. The pending [`PlaybackSignal`] still fires.
    fn stop_speaking(&self);

    /// Swaps the eye-blink update hook and hands back the previous one.
    fn replace_blink_update(&self, update: BlinkUpdate) -> Option<BlinkUpdate>;

    fn expressions(&self) -> Vec<String>;

    fn set_expression(&self, expression: Expression) -> Result<()>;
}

/// The currently installed avatar model, if any.
///
/// Also serves as the debug inspector for expressions: it only answers while a
/// model is installed and goes quiet once the slot is cleared.
#[derive(Clone, Default)]
pub struct ModelSlot {
    current: Arc<Mutex<Option<Arc<dyn AvatarModel>>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `model`, replacing (and returning) whatever was loaded before.
    pub fn install(&self, model: Arc<dyn AvatarModel>) -> Option<Arc<dyn AvatarModel>> {
        tracing::info!("installing avatar {}", model.instance_id());
        self.lock().replace(model)
    }

    pub fn current(&self) -> Option<Arc<dyn AvatarModel>> {
        self.lock().clone()
    }

    /// Expression names of the installed model; `None` when nothing is loaded.
    pub fn expressions(&self) -> Option<Vec<String>> {
        self.current().map(|model| model.expressions())
    }

    pub fn set_expression(&self, expression: Expression) -> Result<()> {
        match self.current() {
            Some(model) => model.set_expression(expression),
            None => Err(anyhow::anyhow!("no avatar model loaded")),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<dyn AvatarModel>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
