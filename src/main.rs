use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use miko_news::api::{AppState, router};
use miko_news::cards::{CardRenderer, RandomTheme};
use miko_news::channels::LarkClient;
use miko_news::config::{AppConfig, LogConfig};
use miko_news::pipeline::{DefaultStrategy, Dispatcher, SubmissionStrategy};
use miko_news::store::{LibSqlBackend, SubmissionStore};

/// Install the global subscriber: stderr always, plus a daily-rolling file
/// when a log directory is configured. The guard must outlive the program.
fn init_tracing(log: &LogConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &log.path {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "miko-news.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config
        .ensure_dirs()
        .context("Failed to create data directories")?;
    let _log_guard = init_tracing(&config.log);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "MikoNews starting");

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn SubmissionStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Lark ─────────────────────────────────────────────────────────────
    let lark = Arc::new(LarkClient::new(config.lark.clone()));

    if config.submission.group_chats.is_empty() {
        tracing::warn!("GROUP_CHATS is empty; submissions will be stored but not forwarded");
    }

    // ── Strategies ───────────────────────────────────────────────────────
    let submissions = SubmissionStrategy::new(Arc::clone(&store), lark.clone(), lark.clone())
        .with_trigger(config.submission.trigger.clone())
        .with_destinations(config.submission.group_chats.clone())
        .with_renderer(CardRenderer::new(
            config.submission.themes.clone(),
            Box::new(RandomTheme),
        ));
    let dispatcher = Dispatcher::builder()
        .register(submissions)
        .register(DefaultStrategy)
        .build();
    tracing::info!(
        strategies = ?dispatcher.strategy_names(),
        trigger = %config.submission.trigger,
        group_chats = config.submission.group_chats.len(),
        "Dispatcher ready"
    );

    // ── HTTP ─────────────────────────────────────────────────────────────
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
        store,
        verification_token: config.lark.verification_token.clone(),
        event_timeout: config.server.event_timeout,
    };
    if state.verification_token.is_none() {
        tracing::warn!("FEISHU_VERIFICATION_TOKEN not set; event callbacks are not authenticated");
    }

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(port = config.server.port, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;

    tracing::info!("MikoNews stopped");
    Ok(())
}
