//! Cancellable phase timers.
//!
//! A timer is a spawned task that sleeps and then posts
//! [`SessionSignal::TimerFired`] to the session inbox. Cancelling aborts the
//! task, so a cancelled timer never posts.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::actor::SessionSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Informational notice before the guess phase ends.
    Warning,
    /// End of the guess phase.
    GuessPhase,
    /// End of the accusation phase.
    VotePhase,
}

#[derive(Debug)]
pub struct Timers {
    signals: mpsc::UnboundedSender<SessionSignal>,
    armed: HashMap<TimerKind, JoinHandle<()>>,
}

impl Timers {
    #[must_use]
    pub fn new(signals: mpsc::UnboundedSender<SessionSignal>) -> Self {
        Self {
            signals,
            armed: HashMap::new(),
        }
    }

    /// Arms `kind` to fire after `delay`, replacing any timer of that kind.
    pub fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);
        let signals = self.signals.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The session may already be gone.
            let _ = signals.send(SessionSignal::TimerFired(kind));
        });
        debug!(?kind, delay_seconds = delay.as_secs(), "timer armed");
        self.armed.insert(kind, handle);
    }

    /// Cancels `kind`. Returns whether a timer was still pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.armed.remove(&kind) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.armed.drain() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed
            .get(&kind)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
