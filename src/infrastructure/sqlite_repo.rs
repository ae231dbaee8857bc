use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TaskRepository,
    task::{Task, TaskId},
};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTaskRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn init(&self) -> Result<()> {
        // `seq` carries insertion order; AUTOINCREMENT keeps it from being reused.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tasks (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                text TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, text: String) -> Result<Task> {
        let id = TaskId::generate();
        sqlx::query("INSERT INTO tasks (id, text, completed) VALUES (?1, ?2, 0)")
            .bind(id.to_string())
            .bind(&text)
            .execute(&*self.pool)
            .await?;
        Ok(Task { id, text, completed: false })
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query("SELECT id, text, completed FROM tasks ORDER BY seq ASC")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    async fn toggle(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("UPDATE tasks SET completed = NOT completed WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_text(&self, id: TaskId, text: String) -> Result<bool> {
        let result = sqlx::query("UPDATE tasks SET text = ?2 WHERE id = ?1")
            .bind(id.to_string())
            .bind(text)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_task(row: SqliteRow) -> Result<Task> {
    let id: String = row.try_get("id")?;
    let text: String = row.try_get("text")?;
    let completed: bool = row.try_get("completed")?;
    let id = id.parse::<TaskId>().with_context(|| format!("stored task id {id:?} is not a uuid"))?;
    Ok(Task { id, text, completed })
}

/// Makes sure a file-backed SQLite URL points at an existing file, creating
/// parent directories as needed. In-memory URLs are left alone.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        // Windows absolute paths arrive as /C:/path
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p)
                .with_context(|| format!("creating database file {}", p.display()))?;
        }
    }
    Ok(())
}
