use todo_backend::application::todo_service::TodoServiceImpl;
use todo_backend::config::Config;
use todo_backend::domain::repository::TodoRepository;
use todo_backend::http::routing::{self, todos};
use todo_backend::infrastructure::sqlite_repo::SqliteTodoRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    let repo = SqliteTodoRepository::connect_lazy(&config.database_url)?;
    // Keep serving when the store is down; each request retries schema setup until it is back.
    match repo.init().await {
        Ok(()) => tracing::info!("todo store ready"),
        Err(err) => tracing::error!(error = ?err, "todo store unavailable at startup"),
    }
    let service = TodoServiceImpl::new(repo);
    let todos_router = todos::router(todos::AppState { service });
    let router = routing::app(todos_router, config.allowed_origin.clone());

    let addr = config.listen_addr();
    tracing::info!(%addr, allowed_origin = ?config.allowed_origin, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
