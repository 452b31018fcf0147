//! Auto-expiring status messages.
//!
//! A [`Notice`] holds at most one message. Posting a new message replaces
//! the old one and restarts the expiry window. When a tokio runtime is
//! available a background task clears the message on expiry; without one,
//! expiry is only observed lazily by [`Notice::current`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long the single-import confirmation stays visible.
pub const CONFIRMATION_MS: u64 = 3000;

/// How long the bulk import summary stays visible.
pub const SUMMARY_MS: u64 = 5000;

#[derive(Debug)]
struct Posted {
    message: String,
    expires_at: Instant,
    generation: u64,
}

/// A cancellable, self-clearing status message.
#[derive(Debug, Default)]
pub struct Notice {
    slot: Arc<Mutex<Option<Posted>>>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl Notice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `message` for `ttl`, superseding any previous message.
    pub fn post(&mut self, message: impl Into<String>, ttl: Duration) {
        self.cancel_timer();
        self.generation += 1;
        let generation = self.generation;

        *lock(&self.slot) = Some(Posted {
            message: message.into(),
            expires_at: Instant::now() + ttl,
            generation,
        });

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let slot = Arc::clone(&self.slot);
            self.timer = Some(runtime.spawn(async move {
                tokio::time::sleep(ttl).await;
                let mut posted = lock(&slot);
                if posted.as_ref().is_some_and(|p| p.generation == generation) {
                    *posted = None;
                }
            }));
        }
    }

    /// The visible message, if any.
    pub fn current(&self) -> Option<String> {
        lock(&self.slot)
            .as_ref()
            .filter(|posted| posted.expires_at > Instant::now())
            .map(|posted| posted.message.clone())
    }

    pub fn clear(&mut self) {
        self.cancel_timer();
        *lock(&self.slot) = None;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Notice {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

fn lock(slot: &Mutex<Option<Posted>>) -> MutexGuard<'_, Option<Posted>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
