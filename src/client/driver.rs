//! Bridges the store and the terminal to the client's event loop.
//!
//! Store calls run on their own tokio tasks and terminal input is read on a
//! blocking thread. Everything reports back over one channel, so the loop
//! only ever waits on that channel.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::state::Command;
use crate::application::task_store::{StoreResult, Subscription, TaskStore};
use crate::domain::error::StoreError;
use crate::domain::task::Snapshot;

const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum ClientEvent {
    Snapshot(Arc<Snapshot>),
    Finished { command: Command, result: Result<(), StoreError> },
    /// Subscribing failed; the feed retries on its own.
    FeedFailed(StoreError),
    Key(KeyEvent),
    Redraw,
}

pub async fn execute<S: TaskStore>(store: &S, command: &Command) -> StoreResult<()> {
    match command {
        Command::Add(text) => store.add(text.clone()).await.map(|_| ()),
        Command::Toggle(id) => store.toggle(*id).await,
        Command::Edit { id, text } => store.edit(*id, text.clone()).await,
        Command::Remove(id) => store.remove(*id).await,
    }
}

pub fn spawn_command<S: TaskStore + Clone>(store: &S, command: Command, events: UnboundedSender<ClientEvent>) -> JoinHandle<()> {
    let store = store.clone();
    tokio::spawn(async move {
        let result = execute(&store, &command).await;
        if let Err(e) = &result { warn!(verb = command.verb(), error = %e, "command failed"); }
        let _ = events.send(ClientEvent::Finished { command, result });
    })
}

/// Forwards the subscription's snapshots, starting with the current one.
/// Returns `false` once the receiving side is gone.
pub async fn forward_snapshots(subscription: Subscription, events: &UnboundedSender<ClientEvent>) -> bool {
    let Subscription { snapshot, mut updates } = subscription;
    if events.send(ClientEvent::Snapshot(Arc::new(snapshot))).is_err() { return false; }
    while let Some(snapshot) = updates.recv().await {
        if events.send(ClientEvent::Snapshot(snapshot)).is_err() { return false; }
    }
    debug!("snapshot feed ended");
    true
}

/// Keeps a subscription open, resubscribing every `retry` after a failure.
/// Each failure is reported so the UI can show it.
pub async fn run_snapshot_feed<S: TaskStore>(store: S, retry: Duration, events: UnboundedSender<ClientEvent>) {
    loop {
        match store.subscribe().await {
            Ok(subscription) => {
                if !forward_snapshots(subscription, &events).await { return; }
            }
            Err(e) => {
                warn!(error = %e, "subscription failed");
                if events.send(ClientEvent::FeedFailed(e)).is_err() { return; }
            }
        }
        tokio::time::sleep(retry).await;
    }
}

pub fn spawn_snapshot_feed<S: TaskStore + Clone>(store: &S, retry: Duration, events: UnboundedSender<ClientEvent>) -> JoinHandle<()> {
    tokio::spawn(run_snapshot_feed(store.clone(), retry, events))
}

/// Pumps terminal events from `next` into the channel until the receiver
/// is dropped or reading fails.
pub fn read_terminal_events(mut next: impl FnMut(Duration) -> io::Result<Option<Event>>, events: UnboundedSender<ClientEvent>) {
    while !events.is_closed() {
        let forwarded = match next(INPUT_POLL) {
            Ok(Some(Event::Key(key))) => events.send(ClientEvent::Key(key)),
            Ok(Some(Event::Resize(..))) => events.send(ClientEvent::Redraw),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "terminal input failed");
                return;
            }
        };
        if forwarded.is_err() { return; }
    }
}

pub fn spawn_terminal_input(events: UnboundedSender<ClientEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || read_terminal_events(poll_terminal, events))
}

fn poll_terminal(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? { event::read().map(Some) } else { Ok(None) }
}

/// Periodically asks the store to pick up writes made by other processes.
pub fn spawn_resync<S: TaskStore + Clone>(store: &S, period: Duration) -> JoinHandle<()> {
    let store = store.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = store.refresh().await { warn!(error = %e, "resync failed"); }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::task_store::TaskStoreImpl;
    use crate::domain::repository::TaskRepository;
    use crate::infrastructure::sqlite_repo::SqliteTaskRepository;
    use crate::domain::task::TaskId;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    async fn store() -> TaskStoreImpl<SqliteTaskRepository> {
        let repo = SqliteTaskRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        TaskStoreImpl::new(repo)
    }

    async fn next_snapshot(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Arc<Snapshot> {
        loop {
            if let ClientEvent::Snapshot(s) = rx.recv().await.unwrap() { return s; }
        }
    }

    #[tokio::test]
    async fn feed_starts_with_current_snapshot_then_follows_changes() {
        let store = store().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_snapshot_feed(&store, Duration::from_millis(10), tx.clone());

        assert!(next_snapshot(&mut rx).await.tasks.is_empty());

        spawn_command(&store, Command::Add("Buy milk".into()), tx).await.unwrap();
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].text, "Buy milk");
    }

    #[tokio::test]
    async fn finished_event_carries_the_store_result() {
        let store = store().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let missing = crate::domain::task::TaskId::generate();
        spawn_command(&store, Command::Edit { id: missing, text: "Y".into() }, tx).await.unwrap();
        match rx.recv().await.unwrap() {
            ClientEvent::Finished { command, result } => {
                assert_eq!(command.verb(), "edit");
                assert!(matches!(result, Err(StoreError::NotFound(id)) if id == missing));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn execute_toggles_through_the_store() {
        let store = store().await;
        let id = store.add("X".into()).await.unwrap();
        execute(&store, &Command::Toggle(id)).await.unwrap();
        assert!(store.list().await.unwrap()[0].completed);
        execute(&store, &Command::Remove(id)).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[derive(Clone)]
    struct FlakySubscribe {
        inner: TaskStoreImpl<SqliteTaskRepository>,
        failures_left: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl TaskStore for FlakySubscribe {
        async fn list(&self) -> StoreResult<Vec<crate::domain::task::Task>> { self.inner.list().await }
        async fn add(&self, text: String) -> StoreResult<TaskId> { self.inner.add(text).await }
        async fn toggle(&self, id: TaskId) -> StoreResult<()> { self.inner.toggle(id).await }
        async fn edit(&self, id: TaskId, text: String) -> StoreResult<()> { self.inner.edit(id, text).await }
        async fn remove(&self, id: TaskId) -> StoreResult<()> { self.inner.remove(id).await }
        async fn subscribe(&self) -> StoreResult<Subscription> {
            if self.failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                return Err(StoreError::Storage(anyhow::anyhow!("database is locked")));
            }
            self.inner.subscribe().await
        }
        async fn refresh(&self) -> StoreResult<()> { self.inner.refresh().await }
    }

    #[tokio::test]
    async fn failed_subscription_is_reported_then_retried() {
        let store = FlakySubscribe { inner: store().await, failures_left: Arc::new(AtomicUsize::new(1)) };
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_snapshot_feed(&store, Duration::from_millis(10), tx);

        match rx.recv().await.unwrap() {
            ClientEvent::FeedFailed(e) => assert!(e.to_string().contains("database is locked")),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(next_snapshot(&mut rx).await.tasks.is_empty());
    }

    #[test]
    fn terminal_keys_and_resizes_reach_the_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut script = VecDeque::from([
            Ok(Some(Event::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)))),
            Ok(None),
            Ok(Some(Event::Resize(80, 24))),
            Err(io::Error::other("terminal closed")),
        ]);
        read_terminal_events(|_| script.pop_front().unwrap_or(Ok(None)), tx);

        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Key(key)) if key.code == KeyCode::Char('a')));
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Redraw)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn terminal_reader_stops_when_the_loop_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut polls = 0;
        read_terminal_events(|_| { polls += 1; Ok(None) }, tx);
        assert_eq!(polls, 0);
    }
}
