pub mod snapshot_hub;
pub mod task_store;
