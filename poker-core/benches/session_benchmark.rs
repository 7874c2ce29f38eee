use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poker_core::{ChatLog, ChatMessage, ServerEvent, Session, Action, VoteLedger, VoteMap};

fn history(n: usize) -> Vec<ChatMessage> {
    (0..n)
        .map(|i| ChatMessage::new(format!("user{}", i % 8), format!("message {i}")))
        .collect()
}

fn bench_chat_merge_fresh(c: &mut Criterion) {
    let batch = history(1_000);

    c.bench_function("chat_merge_1000_fresh", |b| {
        b.iter(|| {
            let mut log = ChatLog::new();
            black_box(log.merge(black_box(batch.clone())));
        })
    });
}

fn bench_chat_merge_resent_history(c: &mut Criterion) {
    // Server rebroadcasts the whole history; only the tail is new
    let mut log = ChatLog::new();
    log.merge(history(999));
    let batch = history(1_000);

    c.bench_function("chat_merge_1000_resent", |b| {
        b.iter(|| {
            let mut log = log.clone();
            black_box(log.merge(black_box(batch.clone())));
        })
    });
}

fn bench_reveal_average(c: &mut Criterion) {
    let deck = ["1", "2", "3", "5", "8", "13", "21", "?"];
    let votes: VoteMap = (0..64)
        .map(|i| (format!("user{i}"), deck[i % deck.len()].to_string()))
        .collect();

    c.bench_function("reveal_average_64", |b| {
        b.iter(|| {
            let mut ledger = VoteLedger::new();
            ledger.apply_reveal_snapshot(black_box(votes.clone()));
            black_box(ledger.average());
        })
    });
}

fn bench_session_snapshot(c: &mut Criterion) {
    let mut session = Session::default();
    session.dispatch(Action::Join {
        room: "R1".into(),
        user: "Alice".into(),
    });
    session.apply(ServerEvent::ChatBatch(history(200)));

    c.bench_function("session_snapshot_200_chat", |b| {
        b.iter(|| black_box(session.snapshot()))
    });
}

criterion_group!(
    benches,
    bench_chat_merge_fresh,
    bench_chat_merge_resent_history,
    bench_reveal_average,
    bench_session_snapshot,
);
criterion_main!(benches);
