//! Cancellable one-second tick task driving the countdown.
//!
//! Each `start` spawns a fresh task under a new generation number and a new
//! [`CancellationToken`]; the previous task is always cancelled first. Ticks
//! carry the session id and generation they were spawned for, so a tick
//! that was already queued when its task was cancelled is recognisable as
//! stale and dropped by the reconciler.

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc::WeakSender;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::reconciler::Input;

pub struct CountdownTicker {
    period: Duration,
    generation: u64,
    token: Option<CancellationToken>,
}

impl CountdownTicker {
    /// Create an idle ticker firing every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            token: None,
        }
    }

    /// Spawn a tick task for `session`, cancelling any previous one.
    ///
    /// The task holds only a weak sender so it never keeps the reconciler's
    /// input queue alive on its own.
    pub fn start(&mut self, session: Uuid, inputs: WeakSender<Input>) {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(tx) = inputs.upgrade() else { break };
                        if tx.send(Input::Tick { session, generation }).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("countdown ticker generation {generation} stopped");
        });

        self.token = Some(token);
    }

    /// Cancel the running task, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    /// Whether a tick task is running.
    pub fn is_active(&self) -> bool {
        self.token.is_some()
    }

    /// Whether a tick belongs to the currently running task.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_active() && generation == self.generation
    }

    /// Generation of the most recent task.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
