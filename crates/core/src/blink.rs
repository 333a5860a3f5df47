//! Eye-blink suppression while the avatar speaks.
//!
//! Blinking mid-word looks wrong, so the playback path swaps the model's blink
//! hook for a no-op before `speak` and puts the original back afterwards. The
//! saved hook is tagged with the model instance it came from; if the model is
//! reloaded in between, the saved hook belongs to a dead model and is dropped
//! instead of being installed on the new one.

use crate::model::{AvatarModel, ModelInstanceId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-frame eye-blink update hook; the argument is the frame delta in seconds.
pub type BlinkUpdate = Arc<dyn Fn(f32) + Send + Sync>;

struct SuppressionToken {
    model: ModelInstanceId,
    original: BlinkUpdate,
}

#[derive(Clone, Default)]
pub struct BlinkSuppressor {
    token: Arc<Mutex<Option<SuppressionToken>>>,
}

impl BlinkSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables blinking on `model`, remembering the hook it had.
    pub fn suppress(&self, model: &dyn AvatarModel) {
        let id = model.instance_id();
        let mut token = self.lock();
        if token.as_ref().is_some_and(|saved| saved.model != id) {
            tracing::debug!("discarding blink hook saved from a previous model");
            *token = None;
        }

        let noop: BlinkUpdate = Arc::new(|_: f32| {});
        let previous = model.replace_blink_update(noop);
        // Suppressing twice must not save the no-op as the "original".
        if token.is_none() {
            if let Some(original) = previous {
                *token = Some(SuppressionToken { model: id, original });
            }
        }
    }

    /// Puts the saved hook back on `model`. Happens at most once per suppression.
    pub fn restore(&self, model: &dyn AvatarModel) {
        let Some(saved) = self.lock().take() else {
            return;
        };
        if saved.model != model.instance_id() {
            tracing::debug!(
                "blink hook belongs to {}, not restoring onto {}",
                saved.model,
                model.instance_id()
            );
            return;
        }
        model.replace_blink_update(saved.original);
    }

    /// Forgets the saved hook without installing it anywhere.
    pub fn discard(&self) {
        if self.lock().take().is_some() {
            tracing::debug!("discarded saved blink hook");
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SuppressionToken>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
