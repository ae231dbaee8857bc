use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::snapshot_hub::{SnapshotHub, SnapshotReceiver};
use crate::domain::error::StoreError;
use crate::domain::repository::TaskRepository;
use crate::domain::task::{Snapshot, Task, TaskId};

pub type StoreResult<T> = Result<T, StoreError>;

/// Live view of the collection: the snapshot current at subscription time
/// plus every snapshot published afterwards.
pub struct Subscription {
    pub snapshot: Snapshot,
    pub updates: SnapshotReceiver,
}

#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn list(&self) -> StoreResult<Vec<Task>>;
    async fn add(&self, text: String) -> StoreResult<TaskId>;
    /// Missing ids are ignored.
    async fn toggle(&self, id: TaskId) -> StoreResult<()>;
    /// Fails with [`StoreError::NotFound`] when the id is missing.
    async fn edit(&self, id: TaskId, text: String) -> StoreResult<()>;
    /// Missing ids are ignored.
    async fn remove(&self, id: TaskId) -> StoreResult<()>;
    async fn subscribe(&self) -> StoreResult<Subscription>;
    /// Re-reads the collection and publishes it if it changed behind the
    /// store's back (another process sharing the database).
    async fn refresh(&self) -> StoreResult<()>;
}

#[derive(Default)]
struct Published {
    version: u64,
    tasks: Option<Vec<Task>>,
}

#[derive(Clone)]
pub struct TaskStoreImpl<R: TaskRepository> {
    repo: R,
    hub: SnapshotHub,
    published: Arc<Mutex<Published>>,
}

impl<R: TaskRepository> TaskStoreImpl<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, hub: SnapshotHub::new(), published: Arc::new(Mutex::new(Published::default())) }
    }

    // Caller holds the `published` lock, so versions go out in write order.
    async fn publish(&self, published: &mut Published) -> StoreResult<Snapshot> {
        let tasks = self.repo.list().await?;
        Ok(self.publish_tasks(published, tasks))
    }

    // The write is already committed; a failed re-read must not turn it into
    // an error. The next refresh publishes what was missed.
    async fn publish_after_write(&self, published: &mut Published) {
        if let Err(e) = self.publish(published).await {
            warn!(error = %e, "write applied but snapshot not published");
        }
    }

    fn publish_tasks(&self, published: &mut Published, tasks: Vec<Task>) -> Snapshot {
        published.version += 1;
        published.tasks = Some(tasks.clone());
        let snapshot = Snapshot { version: published.version, tasks };
        self.hub.publish(Arc::new(snapshot.clone()));
        snapshot
    }

    async fn publish_if_changed(&self, published: &mut Published) -> StoreResult<Snapshot> {
        let tasks = self.repo.list().await?;
        if published.tasks.as_ref() == Some(&tasks) {
            return Ok(Snapshot { version: published.version, tasks });
        }
        Ok(self.publish_tasks(published, tasks))
    }
}

#[async_trait]
impl<R: TaskRepository> TaskStore for TaskStoreImpl<R> {
    async fn list(&self) -> StoreResult<Vec<Task>> { Ok(self.repo.list().await?) }

    async fn add(&self, text: String) -> StoreResult<TaskId> {
        let mut published = self.published.lock().await;
        let task = self.repo.insert(text).await?;
        info!(id = %task.id, "task added");
        self.publish_after_write(&mut published).await;
        Ok(task.id)
    }

    async fn toggle(&self, id: TaskId) -> StoreResult<()> {
        let mut published = self.published.lock().await;
        if !self.repo.toggle(id).await? {
            debug!(%id, "toggle on missing task ignored");
            return Ok(());
        }
        info!(%id, "task toggled");
        self.publish_after_write(&mut published).await;
        Ok(())
    }

    async fn edit(&self, id: TaskId, text: String) -> StoreResult<()> {
        let mut published = self.published.lock().await;
        if !self.repo.set_text(id, text).await? {
            return Err(StoreError::NotFound(id));
        }
        info!(%id, "task edited");
        self.publish_after_write(&mut published).await;
        Ok(())
    }

    async fn remove(&self, id: TaskId) -> StoreResult<()> {
        let mut published = self.published.lock().await;
        if !self.repo.remove(id).await? {
            debug!(%id, "remove on missing task ignored");
            return Ok(());
        }
        info!(%id, "task removed");
        self.publish_after_write(&mut published).await;
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        let mut published = self.published.lock().await;
        let snapshot = self.publish_if_changed(&mut published).await?;
        let updates = self.hub.subscribe();
        Ok(Subscription { snapshot, updates })
    }

    async fn refresh(&self) -> StoreResult<()> {
        let mut published = self.published.lock().await;
        self.publish_if_changed(&mut published).await?;
        Ok(())
    }
}
