//! End-to-end reconciler scenarios over the in-memory transport.
//!
//! The test plays the session server: it feeds broadcasts into the
//! transport event channel and inspects the requests the reconciler sent.

use indexmap::IndexMap;
use poker_core::{ChatMessage, Request, RequestKind, ServerEvent, SessionSnapshot, VoteView};
use poker_sync::{ClientConfig, MemoryTransport, Reconciler, ReconcilerHandle, TransportEvent};
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout, Duration};

fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

struct Harness {
    handle: ReconcilerHandle,
    transport: MemoryTransport,
    server: mpsc::Sender<TransportEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

fn start(config: ClientConfig) -> Harness {
    let transport = MemoryTransport::new();
    let (server, events) = mpsc::channel(64);
    let (handle, _task) = Reconciler::spawn(transport.clone(), events, &config);
    let snapshots = handle.subscribe();
    Harness {
        handle,
        transport,
        server,
        snapshots,
    }
}

impl Harness {
    async fn broadcast(&self, event: ServerEvent) {
        self.server.send(TransportEvent::Server(event)).await.unwrap();
    }

    /// Wait until the published snapshot satisfies `pred`.
    async fn wait_for<F>(&mut self, pred: F) -> SessionSnapshot
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let result = timeout(Duration::from_secs(2), async {
            loop {
                {
                    let snap = self.snapshots.borrow_and_update();
                    if pred(&*snap) {
                        return (*snap).clone();
                    }
                }
                self.snapshots.changed().await.unwrap();
            }
        })
        .await;
        result.expect("snapshot condition not reached in time")
    }

    /// Let the reconciler drain its queue.
    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_join_vote_reveal_scenario() {
    let mut h = start(ClientConfig::default());

    h.handle.join("R1", "Alice").await.unwrap();
    h.broadcast(ServerEvent::Roster(map(&[("Alice", "not-voted")]))).await;
    let snap = h.wait_for(|s| s.participants.len() == 1).await;
    assert_eq!(snap.participants[0].name, "Alice");
    assert_eq!(snap.participants[0].label, "not voted");

    h.handle.start_countdown().await.unwrap();
    h.handle.cast_vote("8").await.unwrap();
    let snap = h.wait_for(|s| s.my_vote.as_deref() == Some("8")).await;
    assert!(!snap.revealed);
    assert_eq!(snap.votes, VoteView::Hidden { voters: vec![] });
    assert!(snap.countdown.is_running());

    h.broadcast(ServerEvent::VotesRevealed(map(&[("Alice", "8"), ("Bob", "5")])))
        .await;
    let snap = h.wait_for(|s| s.revealed).await;
    assert_eq!(snap.average, Some(6.5));
    assert!(!snap.countdown.is_running());

    assert_eq!(
        h.transport.sent(),
        vec![
            Request::JoinRoom {
                room: "R1".into(),
                user: "Alice".into()
            },
            Request::CastVote {
                room: "R1".into(),
                user: "Alice".into(),
                value: "8".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_progress_snapshot_hides_values() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();

    h.broadcast(ServerEvent::VotesProgress(Some(map(&[("Bob", "13")]))))
        .await;
    let snap = h
        .wait_for(|s| matches!(&s.votes, VoteView::Hidden { voters } if !voters.is_empty()))
        .await;
    assert_eq!(snap.average, None);
    assert!(!snap.revealed);

    // A malformed progress payload empties the ledger instead of failing
    h.broadcast(ServerEvent::VotesProgress(None)).await;
    h.settle().await;
    assert_eq!(h.handle.snapshot().votes, VoteView::Hidden { voters: vec![] });
}

#[tokio::test]
async fn test_chat_batches_are_deduplicated() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();
    h.handle.send_chat("hello").await.unwrap();

    let first = vec![ChatMessage::new("Alice", "hello")];
    let second = vec![
        ChatMessage::new("Alice", "hello"),
        ChatMessage::new("Bob", "hi Alice"),
    ];
    h.broadcast(ServerEvent::ChatBatch(first)).await;
    h.broadcast(ServerEvent::ChatBatch(second.clone())).await;
    h.broadcast(ServerEvent::ChatBatch(second.clone())).await;

    let snap = h.wait_for(|s| s.chat.len() == 2).await;
    h.settle().await;
    assert_eq!(h.handle.snapshot().chat, snap.chat);
    assert_eq!(snap.chat, second);

    let chats = h
        .transport
        .sent()
        .into_iter()
        .filter(|r| r.kind() == RequestKind::SendChat)
        .count();
    assert_eq!(chats, 1);
}

#[tokio::test]
async fn test_reset_after_reveal() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();
    h.handle.cast_vote("3").await.unwrap();
    h.broadcast(ServerEvent::VotesRevealed(map(&[("Alice", "3")]))).await;
    h.wait_for(|s| s.revealed).await;

    h.handle.reset().await.unwrap();
    let snap = h.wait_for(|s| !s.revealed).await;
    assert_eq!(snap.average, None);
    assert_eq!(snap.my_vote, None);
    assert_eq!(snap.votes, VoteView::Hidden { voters: vec![] });
    assert_eq!(snap.countdown.remaining(), 120);
    assert!(!snap.countdown.is_running());
}

#[tokio::test]
async fn test_roster_snapshots_replace() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();

    h.broadcast(ServerEvent::Roster(map(&[("A", "voted"), ("B", "voting")])))
        .await;
    h.wait_for(|s| s.participants.len() == 2).await;

    h.broadcast(ServerEvent::Roster(map(&[("A", "voted")]))).await;
    let snap = h.wait_for(|s| s.participants.len() == 1).await;
    assert_eq!(snap.participants[0].name, "A");
}

#[tokio::test]
async fn test_connection_diagnostics_do_not_touch_state() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();
    h.broadcast(ServerEvent::Roster(map(&[("Alice", "voting")]))).await;
    let before = h.wait_for(|s| s.participants.len() == 1).await;

    h.broadcast(ServerEvent::ConnectionError("socket hang up".into()))
        .await;
    h.broadcast(ServerEvent::Connected).await;
    h.settle().await;
    assert_eq!(h.handle.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn test_auto_reveal_on_expiry() {
    let h = start(ClientConfig::default().with_countdown_secs(3));
    h.handle.join("R1", "Alice").await.unwrap();
    h.handle.start_countdown().await.unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let reveals: Vec<Request> = h
        .transport
        .sent()
        .into_iter()
        .filter(|r| r.kind() == RequestKind::RevealVotes)
        .collect();
    assert_eq!(reveals, vec![Request::RevealVotes { room: "R1".into() }]);

    // Reset must leave the countdown stopped at the configured value
    h.handle.reset().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let snap = h.handle.snapshot();
    assert_eq!(snap.countdown.remaining(), 3);
    assert!(!snap.countdown.is_running());

    let reveals = h
        .transport
        .sent()
        .into_iter()
        .filter(|r| r.kind() == RequestKind::RevealVotes)
        .count();
    assert_eq!(reveals, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_countdown_cancels_pending_reveal() {
    let h = start(ClientConfig::default().with_countdown_secs(3));
    h.handle.join("R1", "Alice").await.unwrap();
    h.handle.start_countdown().await.unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    h.handle.reset().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(h
        .transport
        .sent()
        .iter()
        .all(|r| r.kind() != RequestKind::RevealVotes));
}

#[tokio::test]
async fn test_leave_discards_session() {
    let mut h = start(ClientConfig::default());
    h.handle.join("R1", "Alice").await.unwrap();
    h.broadcast(ServerEvent::ChatBatch(vec![ChatMessage::new("Bob", "hi")]))
        .await;
    h.wait_for(|s| s.chat.len() == 1).await;

    h.handle.leave().await.unwrap();
    let snap = h.wait_for(|s| s.room.is_empty()).await;
    assert!(snap.chat.is_empty());

    // Late broadcasts for the old room are ignored
    h.broadcast(ServerEvent::ChatBatch(vec![ChatMessage::new("Bob", "bye")]))
        .await;
    h.settle().await;
    assert!(h.handle.snapshot().chat.is_empty());
}
