use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use mobile_master::config::{self, CliArgs};
use mobile_master::state::AppState;
use mobile_master::{create_app, db, run_migrations};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Sets up stdout logging plus an optional daily-rolling log file
///
/// The returned guard flushes the file writer and must be held until exit.
fn init_tracing(args: &CliArgs, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_filter = if args.debug {
        "mobile_master=debug,tower_http=debug"
    } else {
        "mobile_master=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let (file_writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mobile-master.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(fmt::layer().json())
            .with(file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w)))
            .init();
    } else {
        registry
            .with(fmt::layer())
            .with(file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w)))
            .init();
    }

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap so its env fallbacks can see the values
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let config = config::get_config(&args);
    let _log_guard = init_tracing(&args, config.log_dir.as_deref());

    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let pool = Arc::new(db::init_pool(&config.database_url).context("Failed to open database")?);
    {
        let mut conn = pool.get().context("Failed to get a database connection")?;
        run_migrations(&mut conn)?;
    }

    let state = AppState::new(pool, &config);

    // Prune expired rate-limit hits so neither store grows without bound
    let limiters = [state.login_limiter.clone(), state.api_limiter.clone()];
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let now = Utc::now();
            for limiter in &limiters {
                let purged = limiter.purge_expired(now);
                if purged > 0 {
                    debug!("Purged {} expired rate-limit entries", purged);
                }
            }
        }
    });

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
