//! Integration tests for channel reconciliation, join pacing and reconnects.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{
    MockConnector, MockSession, RunningAgent, SharedSource, at, read_log, settings, settle,
};
use slirc_logd::clock::ManualClock;
use tokio::time::Instant;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(at(2024, 1, 1, 12, 0, 0)))
}

fn channels(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("#c{:02}", i)).collect()
}

async fn take_joins(session: &mut MockSession, count: usize) -> Vec<String> {
    let mut joins = Vec::with_capacity(count);
    for _ in 0..count {
        let line = session.next_line().await;
        let channel = line
            .strip_prefix("JOIN ")
            .unwrap_or_else(|| panic!("expected JOIN, got {line}"));
        joins.push(channel.to_string());
    }
    joins
}

#[tokio::test(start_paused = true)]
async fn reload_parts_removed_and_joins_added() {
    let dir = tempfile::tempdir().unwrap();
    let source = SharedSource::new(["#a", "#b", "#c"]);
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(settings(dir.path()), connector, source.clone(), clock());

    let mut session = network.accept().await;
    session.welcome();
    assert_eq!(take_joins(&mut session, 3).await, vec!["#a", "#b", "#c"]);

    source.set(["#b", "#c", "#d"]);
    session.say("#b", "pajlada", "!logreload");
    assert_eq!(
        session.next_line().await,
        "PRIVMSG #b :pajlada, reloading channels"
    );
    assert_eq!(session.next_line().await, "PART #a");
    assert_eq!(session.next_line().await, "JOIN #d");

    settle().await;
    assert!(session.sent_lines().is_empty());
    agent.stop().await;
}

#[tokio::test(start_paused = true)]
async fn reload_from_non_admin_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let source = SharedSource::new(["#a"]);
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(settings(dir.path()), connector, source.clone(), clock());

    let mut session = network.accept().await;
    session.welcome();
    assert_eq!(take_joins(&mut session, 1).await, vec!["#a"]);

    source.set(Vec::<String>::new());
    session.say("#a", "forsen", "!logreload");
    settle().await;
    assert!(session.sent_lines().is_empty());
    agent.stop().await;
}

#[tokio::test(start_paused = true)]
async fn joins_are_paced_in_batches() {
    let dir = tempfile::tempdir().unwrap();
    let wanted = channels(85);
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(
        settings(dir.path()),
        connector,
        SharedSource::new(&wanted),
        clock(),
    );

    let mut session = network.accept().await;
    let start = Instant::now();
    session.welcome();

    let mut times = Vec::new();
    let mut joined = Vec::new();
    for _ in 0..85 {
        joined.extend(take_joins(&mut session, 1).await);
        times.push(start.elapsed());
    }

    // Each desired channel exactly once, in order
    assert_eq!(joined, wanted);

    let wait = Duration::from_secs(20);
    assert!(times[..40].iter().all(|t| *t < wait));
    assert!(times[40..80].iter().all(|t| *t >= wait && *t < wait * 2));
    assert!(times[80..].iter().all(|t| *t >= wait * 2));

    settle().await;
    assert!(session.sent_lines().is_empty());
    agent.stop().await;
}

#[tokio::test(start_paused = true)]
async fn reconnect_rejoins_and_reopens_logs() {
    let dir = tempfile::tempdir().unwrap();
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(
        settings(dir.path()),
        connector,
        SharedSource::new(["#a", "#b", "#c"]),
        clock(),
    );

    let mut first = network.accept().await;
    first.welcome();
    assert_eq!(take_joins(&mut first, 3).await, vec!["#a", "#b", "#c"]);
    first.say("#a", "alice", "before");
    settle().await;

    let dropped = Instant::now();
    first.drop_link("connection reset");

    let mut second = network.accept().await;
    assert!(dropped.elapsed() >= Duration::from_secs(5));
    assert!(second.generation() > first.generation());

    second.welcome();
    assert_eq!(take_joins(&mut second, 3).await, vec!["#a", "#b", "#c"]);
    second.say("#a", "alice", "after");
    second.joined("#c", "bob");
    settle().await;
    agent.stop().await;

    assert_eq!(
        read_log(dir.path(), "2024-01-01-#a.log"),
        "12:00:00 <alice> before\n12:00:00 <alice> after\n"
    );
    assert_eq!(
        read_log(dir.path(), "joins/2024-01-01-#c.log"),
        "12:00:00 JOIN bob\n"
    );
}

#[tokio::test(start_paused = true)]
async fn drain_interrupted_by_disconnect_resumes_on_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let wanted = channels(50);
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(
        settings(dir.path()),
        connector,
        SharedSource::new(&wanted),
        clock(),
    );

    let mut first = network.accept().await;
    let start = Instant::now();
    first.welcome();
    let first_batch = take_joins(&mut first, 40).await;
    assert_eq!(first_batch, wanted[..40].to_vec());

    first.drop_link("ping timeout");
    let mut second = network.accept().await;
    second.welcome();

    // Membership does not survive the break: every channel is joined again,
    // once, and not before the batch pause is over.
    let rejoined = take_joins(&mut second, 50).await;
    assert!(start.elapsed() >= Duration::from_secs(20));
    let unique: BTreeSet<&String> = rejoined.iter().collect();
    assert_eq!(unique.len(), 50);
    assert_eq!(unique, wanted.iter().collect::<BTreeSet<_>>());

    settle().await;
    assert!(first.sent_lines().is_empty());
    assert!(second.sent_lines().is_empty());
    agent.stop().await;
}

#[tokio::test(start_paused = true)]
async fn events_from_old_session_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(
        settings(dir.path()),
        connector,
        SharedSource::new(["#test"]),
        clock(),
    );

    let mut first = network.accept().await;
    first.welcome();
    assert_eq!(take_joins(&mut first, 1).await, vec!["#test"]);
    first.drop_link("eof");

    let mut second = network.accept().await;
    first.say("#test", "ghost", "boo");
    first.welcome();
    second.welcome();
    assert_eq!(take_joins(&mut second, 1).await, vec!["#test"]);
    second.say("#test", "alice", "live");
    settle().await;
    agent.stop().await;

    assert_eq!(
        read_log(dir.path(), "2024-01-01-#test.log"),
        "12:00:00 <alice> live\n"
    );
}

#[tokio::test(start_paused = true)]
async fn source_failure_keeps_membership() {
    let dir = tempfile::tempdir().unwrap();
    let source = SharedSource::new(["#a", "#b"]);
    let (connector, mut network) = MockConnector::new();
    let agent = RunningAgent::start(settings(dir.path()), connector, source.clone(), clock());

    let mut session = network.accept().await;
    session.welcome();
    assert_eq!(take_joins(&mut session, 2).await, vec!["#a", "#b"]);

    source.set(Vec::<String>::new());
    source.fail(true);
    session.say("#a", "pajlada", "!logreload");
    assert_eq!(
        session.next_line().await,
        "PRIVMSG #a :pajlada, reloading channels"
    );
    settle().await;
    assert!(session.sent_lines().is_empty());

    source.fail(false);
    session.say("#a", "pajlada", "!logreload");
    assert_eq!(
        session.next_line().await,
        "PRIVMSG #a :pajlada, reloading channels"
    );
    assert_eq!(session.next_line().await, "PART #a");
    assert_eq!(session.next_line().await, "PART #b");
    agent.stop().await;
}

#[tokio::test(start_paused = true)]
async fn refused_connections_retry_at_fixed_interval() {
    let dir = tempfile::tempdir().unwrap();
    let (connector, mut network) = MockConnector::new();
    connector.refuse_next(2);
    let start = Instant::now();
    let agent = RunningAgent::start(
        settings(dir.path()),
        connector,
        SharedSource::new(["#test"]),
        clock(),
    );

    let mut session = network.accept().await;
    let waited = start.elapsed();
    assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
    session.welcome();
    assert_eq!(take_joins(&mut session, 1).await, vec!["#test"]);
    agent.stop().await;
}
