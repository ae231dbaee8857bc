use tasks::application::task_store::TaskStoreImpl;
use tasks::config::Config;
use tasks::domain::repository::TaskRepository;
use tasks::http::routing::{self, tasks as task_routes};
use tasks::infrastructure::sqlite_repo::{prepare_sqlite_file, SqliteTaskRepository};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    prepare_sqlite_file(&config.database_url)?;
    let repo = SqliteTaskRepository::connect(&config.database_url).await?;
    repo.init().await?;
    let store = TaskStoreImpl::new(repo);
    let (shutdown_tx, shutdown) = watch::channel(false);
    let router = routing::app(task_routes::router(task_routes::AppState { store, shutdown }));

    let addr = config.bind_addr;
    tracing::info!(%addr, database_url = %config.database_url, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
    let _ = shutdown.send(true);
}
