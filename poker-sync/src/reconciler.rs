//! Session reconciler: the single-queue event loop around [`Session`].
//!
//! ```text
//!  ReconcilerHandle ──Action──┐
//!  transport events ──────────┼──► mpsc<Input> ──► Reconciler::handle()
//!  CountdownTicker ───Tick────┘                        │
//!                                    ┌─────────────────┼────────────────┐
//!                                    ▼                 ▼                ▼
//!                             Session (pure)     Transport::send   watch<SessionSnapshot>
//! ```
//!
//! Every input is handled to completion before the next one is read, so
//! sub-stores need no locking. Inputs are processed in delivery order with
//! no buffering or reordering. Missed events are not replayed: the next
//! full snapshot from the server resynchronizes state.

use log::{debug, info, warn};
use poker_core::{Action, Request, Session, SessionSnapshot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::ticker::CountdownTicker;
use crate::transport::{Transport, TransportEvent};

/// Everything the reconciler reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Action(Action),
    Transport(TransportEvent),
    Tick { session: Uuid, generation: u64 },
    Shutdown,
}

/// Error returned when the reconciler is no longer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Reconciler stopped")]
pub struct ReconcilerClosed;

pub struct Reconciler<T: Transport> {
    session: Session,
    /// Identity of the current session instance; changes on room switch or leave.
    session_id: Uuid,
    transport: T,
    ticker: CountdownTicker,
    inputs: mpsc::WeakSender<Input>,
    input_rx: mpsc::Receiver<Input>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<T: Transport> Reconciler<T> {
    /// Create a reconciler and the handle used to drive and observe it.
    pub fn new(transport: T, config: &ClientConfig) -> (Self, ReconcilerHandle) {
        let (input_tx, input_rx) = mpsc::channel(config.channel_capacity.max(1));
        let session = Session::new(config.countdown_secs);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let reconciler = Self {
            session,
            session_id: Uuid::new_v4(),
            transport,
            ticker: CountdownTicker::new(config.tick_interval),
            inputs: input_tx.downgrade(),
            input_rx,
            snapshot_tx,
        };
        let handle = ReconcilerHandle {
            input_tx,
            snapshot_rx,
        };
        (reconciler, handle)
    }

    /// Create a reconciler, attach `events` and run it on a new task.
    pub fn spawn(
        transport: T,
        events: mpsc::Receiver<TransportEvent>,
        config: &ClientConfig,
    ) -> (ReconcilerHandle, JoinHandle<()>) {
        let (reconciler, handle) = Self::new(transport, config);
        handle.attach(events);
        let task = tokio::spawn(reconciler.run());
        (handle, task)
    }

    /// Process inputs until shutdown or until every sender is gone.
    pub async fn run(mut self) {
        while let Some(input) = self.input_rx.recv().await {
            if !self.handle(input) {
                break;
            }
        }
        self.ticker.cancel();
        debug!("reconciler for session {} stopped", self.session_id);
    }

    /// Handle one input. Returns `false` on shutdown.
    pub fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Action(action) => self.on_action(action),
            Input::Transport(TransportEvent::Server(event)) => {
                debug!("applying {}", event.name());
                self.session.apply(event);
            }
            Input::Transport(TransportEvent::Ack { kind, ack }) => {
                if ack.success {
                    info!("{kind} acknowledged");
                } else {
                    warn!(
                        "{kind} rejected: {}",
                        ack.message.as_deref().unwrap_or("no response from server")
                    );
                }
            }
            Input::Tick {
                session,
                generation,
            } => {
                if session != self.session_id || !self.ticker.is_current(generation) {
                    debug!("dropping stale countdown tick (generation {generation})");
                    return true;
                }
                let requests = self.session.tick();
                self.send_all(requests);
            }
            Input::Shutdown => {
                self.ticker.cancel();
                return false;
            }
        }
        self.sync_ticker();
        self.publish();
        true
    }

    fn on_action(&mut self, action: Action) {
        let previous_room = self.session.room().to_string();
        let previous_user = self.session.user().to_string();
        let requests = self.session.dispatch(action);

        if self.session.room() != previous_room || self.session.user() != previous_user {
            // New session instance: nothing from the old one may fire into it.
            self.ticker.cancel();
            self.session_id = Uuid::new_v4();
            debug!(
                "session {} bound to room '{}' as '{}'",
                self.session_id,
                self.session.room(),
                self.session.user()
            );
        }
        self.send_all(requests);
    }

    fn send_all(&mut self, requests: Vec<Request>) {
        for request in requests {
            let kind = request.kind();
            debug!("sending {kind} for room {}", request.room());
            if let Err(e) = self.transport.send(request) {
                warn!("failed to send {kind}: {e}");
            }
        }
    }

    /// Keep the tick task in step with the countdown's running flag.
    fn sync_ticker(&mut self) {
        let running = self.session.countdown().is_running();
        if running && !self.ticker.is_active() {
            self.ticker.start(self.session_id, self.inputs.clone());
        } else if !running && self.ticker.is_active() {
            self.ticker.cancel();
        }
    }

    fn publish(&self) {
        let next = self.session.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Current session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Identity of the current session instance.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Whether a countdown tick task is running.
    pub fn ticker_active(&self) -> bool {
        self.ticker.is_active()
    }
}

/// Cloneable front door to a running reconciler.
#[derive(Clone)]
pub struct ReconcilerHandle {
    input_tx: mpsc::Sender<Input>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl ReconcilerHandle {
    /// Queue a local action.
    pub async fn dispatch(&self, action: Action) -> Result<(), ReconcilerClosed> {
        self.input_tx
            .send(Input::Action(action))
            .await
            .map_err(|_| ReconcilerClosed)
    }

    /// Ask the server to create `room`.
    pub async fn create_room(&self, room: impl Into<String>) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::CreateRoom { room: room.into() }).await
    }

    /// Join `room` as `user`.
    pub async fn join(
        &self,
        room: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::Join {
            room: room.into(),
            user: user.into(),
        })
        .await
    }

    /// Cast a vote in the joined room.
    pub async fn cast_vote(&self, value: impl Into<String>) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::CastVote(value.into())).await
    }

    /// Request the reveal of all votes.
    pub async fn reveal(&self) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::Reveal).await
    }

    /// Reset the round.
    pub async fn reset(&self) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::Reset).await
    }

    /// Send a chat message.
    pub async fn send_chat(&self, message: impl Into<String>) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::SendChat(message.into())).await
    }

    /// Start the auto-reveal countdown.
    pub async fn start_countdown(&self) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::StartCountdown).await
    }

    /// Edit the local story title and description.
    pub async fn set_story(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::SetStory {
            title: title.into(),
            description: description.into(),
        })
        .await
    }

    /// Leave the room and discard the session.
    pub async fn leave(&self) -> Result<(), ReconcilerClosed> {
        self.dispatch(Action::Leave).await
    }

    /// Stop the reconciler and cancel its countdown task.
    pub async fn shutdown(&self) -> Result<(), ReconcilerClosed> {
        self.input_tx
            .send(Input::Shutdown)
            .await
            .map_err(|_| ReconcilerClosed)
    }

    /// Forward a transport's events into the reconciler queue.
    pub fn attach(&self, mut events: mpsc::Receiver<TransportEvent>) -> JoinHandle<()> {
        let input_tx = self.input_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if input_tx.send(Input::Transport(event)).await.is_err() {
                    break;
                }
            }
        })
    }

    /// Observe snapshots; the receiver sees every published change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }
}
