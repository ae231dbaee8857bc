use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{routing::{get, post, put}, Json, Router};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::application::task_store::{Subscription, TaskStore};
use crate::domain::task::{Snapshot, TaskId};
use crate::http::types::{ApiError, CreatedBody, ListBody, TextBody};

#[derive(Clone)]
pub struct AppState<S: TaskStore> {
    pub store: S,
    /// Flips to `true` when the server is stopping; open event streams end then.
    pub shutdown: watch::Receiver<bool>,
}

pub fn router<S: TaskStore + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/tasks", post(add_task::<S>).get(list_tasks::<S>))
        .route("/tasks/events", get(task_events::<S>))
        .route("/tasks/:id", put(edit_task::<S>).delete(remove_task::<S>))
        .route("/tasks/:id/toggle", post(toggle_task::<S>))
        .with_state(state)
}

async fn list_tasks<S: TaskStore>(State(state): State<AppState<S>>) -> Result<Json<ListBody>, ApiError> {
    let items = state.store.list().await?;
    Ok(Json(ListBody { items }))
}

async fn add_task<S: TaskStore>(State(state): State<AppState<S>>, payload: Result<Json<TextBody>, JsonRejection>) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let id = state.store.add(body.text).await?;
    Ok((StatusCode::CREATED, Json(CreatedBody { id })))
}

async fn toggle_task<S: TaskStore>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.toggle(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn edit_task<S: TaskStore>(State(state): State<AppState<S>>, Path(id): Path<String>, payload: Result<Json<TextBody>, JsonRejection>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    state.store.edit(id, body.text).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_task<S: TaskStore>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.store.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Server-sent events: the current snapshot first, then one event per change.
async fn task_events<S: TaskStore>(State(state): State<AppState<S>>) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let Subscription { snapshot, updates } = state.store.subscribe().await?;
    debug!(version = snapshot.version, "event stream opened");
    let first = stream::once(std::future::ready(Arc::new(snapshot)));
    let rest = stream::unfold(updates, |mut updates| async move {
        updates.recv().await.map(|snapshot| (snapshot, updates))
    });
    let mut shutdown = state.shutdown.clone();
    let stopped = async move {
        let signalled = shutdown.wait_for(|stopping| *stopping).await.is_ok();
        if !signalled {
            // Sender gone without a shutdown: keep streaming.
            std::future::pending::<()>().await;
        }
    };
    let events = first
        .chain(rest)
        .take_until(stopped)
        .filter_map(|snapshot| std::future::ready(snapshot_event(&snapshot).map(Ok::<_, Infallible>)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn snapshot_event(snapshot: &Snapshot) -> Option<Event> {
    match Event::default().event("snapshot").id(snapshot.version.to_string()).json_data(snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(version = snapshot.version, error = %e, "skipping snapshot that failed to serialize");
            None
        }
    }
}

fn parse_id(s: &str) -> Result<TaskId, ApiError> { s.parse().map_err(|_| ApiError::bad_request("invalid id")) }
