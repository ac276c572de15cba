mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::database;
use crate::core::error::AppError;
use crate::core::guard::AdminGuard;
use crate::features::dialogue::{Dispatcher, Engine, PgReviewStore};
use crate::modules::telegram::TelegramBoundary;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(AppError::Config)?;

    let pool = database::create_pool(&config.database).await?;
    database::init_schema(&pool).await?;
    tracing::info!(
        "connected to database '{}' at {}",
        config.database.name,
        config.database.host
    );

    if config.bot.admin_ids.is_empty() {
        tracing::warn!("ADMIN_IDS is empty; every event will be rejected");
    }

    let engine = Engine::new(PgReviewStore::new(pool));
    let guard = AdminGuard::new(config.bot.admin_ids.iter().copied());
    let boundary = TelegramBoundary::new(&config.bot.token);
    let dispatcher = Dispatcher::new(engine, boundary, guard);

    tracing::info!(
        "admin console started, {} administrator(s) allowed",
        config.bot.admin_ids.len()
    );
    dispatcher.run().await?;
    Ok(())
}
