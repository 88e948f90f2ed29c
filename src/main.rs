//! Process entry point. Generalizes the teacher's `main.rs` (`dotenvy`
//! then a single `api::start()` call) into the full core: load config,
//! construct every long-lived handle once, then run the HTTP surface
//! (Event Intake + management API) and the Worker Pool as sibling tasks
//! under one `tokio::select!`, so either one exiting brings the process
//! down cleanly.

use std::sync::Arc;
use std::time::Duration;

use review_api::AppState;
use review_cache::InMemoryFindingCache;
use review_config::Config;
use review_forge::InstallationTokenCache;
use review_metrics::Metrics;
use review_queue::{BackoffPolicy, JobQueue};
use review_store::Store;
use review_worker::{ForgeResolver, WorkerPool, WorkerState};
use review_workspace::Workspace;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Mirrors the teacher's `dotenvy::dotenv()?` at startup; unlike the
    // teacher we tolerate a missing `.env` (a container with env vars
    // injected directly has no file to load).
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(Config::from_env()?);

    let store = Arc::new(Store::new());
    let queue = Arc::new(JobQueue::new(BackoffPolicy::default()));
    let metrics = Arc::new(Metrics::new());
    let cache = Arc::new(InMemoryFindingCache::new());
    let workspace = Arc::new(Workspace::new(config.repos_path.clone().into(), config.max_repo_age_hours));
    let http = reqwest::Client::builder().user_agent("review-core/0.1").build()?;

    let github_tokens = match (&config.github_app_id, &config.github_private_key_path) {
        (Some(app_id), Some(key_path)) => {
            let app_id: i64 = app_id.parse().map_err(|e| anyhow::anyhow!("GITHUB_APP_ID must be an integer: {e}"))?;
            let pem = std::fs::read(key_path)
                .map_err(|e| anyhow::anyhow!("failed to read GITHUB_PRIVATE_KEY_PATH {key_path:?}: {e}"))?;
            Some(Arc::new(InstallationTokenCache::new(http.clone(), review_forge::GITHUB_DEFAULT_API.to_string(), app_id, pem)))
        }
        _ => {
            tracing::warn!("GITHUB_APP_ID/GITHUB_PRIVATE_KEY_PATH not set; GitHub-hosted reviews will fail admission at resolve time");
            None
        }
    };

    let forge = Arc::new(ForgeResolver::new(http.clone(), github_tokens, config.gitlab_token.clone(), config.gitlab_api_base.clone()));

    let app_state = Arc::new(AppState::new(config.clone(), store.clone(), queue.clone(), metrics.clone()));

    let worker_state = WorkerState {
        config: config.clone(),
        store: store.clone(),
        workspace: workspace.clone(),
        cache: cache.clone(),
        metrics: metrics.clone(),
        queue: queue.clone(),
        forge,
        http,
    };
    let review_timeout = Duration::from_millis(config.review_timeout_ms);
    let pool = Arc::new(WorkerPool::new(worker_state, config.max_concurrent_reviews, review_timeout, Duration::from_secs(30)));

    let workspace_sweeper = workspace.clone();
    let sweep_interval = Duration::from_secs(3600);
    let sweep_handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let removed = workspace_sweeper.sweep_expired().await;
            if removed > 0 {
                tracing::info!(removed, "workspace sweep removed stale clones");
            }
        }
    });

    let pool_for_run = pool.clone();
    let worker_handle = tokio::spawn(async move { pool_for_run.run().await });
    let server_handle = tokio::spawn(review_api::serve(app_state));

    tokio::select! {
        res = server_handle => {
            tracing::error!(?res, "http server task exited");
        }
        res = worker_handle => {
            tracing::error!(?res, "worker pool task exited");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining worker pool");
            pool.shutdown();
        }
    }

    sweep_handle.abort();
    Ok(())
}

/// Waits for SIGINT (Ctrl-C) or, on unix, SIGTERM — the two signals a
/// container orchestrator or an interactive shell actually sends.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
