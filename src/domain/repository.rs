use async_trait::async_trait;
use super::task::{Task, TaskId};

/// Persistence seam. Every method touches at most one record.
#[async_trait]
pub trait TaskRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn insert(&self, text: String) -> anyhow::Result<Task>;
    /// All tasks in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<Task>>;
    /// Flips `completed`; `false` when no task has this id.
    async fn toggle(&self, id: TaskId) -> anyhow::Result<bool>;
    async fn set_text(&self, id: TaskId, text: String) -> anyhow::Result<bool>;
    async fn remove(&self, id: TaskId) -> anyhow::Result<bool>;
}
