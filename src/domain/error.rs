use thiserror::Error;

use super::task::TaskId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
