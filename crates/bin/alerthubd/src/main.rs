//! `alerthubd` entry point.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use alerthub_adapter_storage_sqlite_sqlx::{SqliteRuleStore, SqliteUserDirectory};
use alerthub_adapter_virtual::{
    InMemoryRealtimeStore, InMemoryRuleStore, InMemoryUserDirectory, LoggingPushSender, seed,
};
use alerthub_app::ports::{RuleStore, UserDirectory};
use alerthubd::config::{Backend, Config};
use alerthubd::engine::Engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let realtime = Arc::new(InMemoryRealtimeStore::default());
    if let Some(path) = &config.seed.realtime_file {
        let value = seed::load_realtime(path).context("seeding realtime store")?;
        realtime.set("/", value);
        tracing::info!(path = %path.display(), "realtime store seeded");
    }

    let rule_seed = match &config.seed.rules_file {
        Some(path) => seed::load_rules(path).context("loading seed rules")?,
        None => Vec::new(),
    };
    let user_seed = match &config.seed.users_file {
        Some(path) => seed::load_users(path).context("loading seed users")?,
        None => Vec::new(),
    };
    tracing::info!(
        rules = rule_seed.len(),
        users = user_seed.len(),
        "seed data loaded"
    );

    match config.backend()? {
        Backend::Memory => {
            let rules = Arc::new(InMemoryRuleStore::default());
            rules.put_all(rule_seed.into_iter().map(|doc| (doc.id, doc.data)));
            let users = InMemoryUserDirectory::with_users(user_seed);
            serve(&config, rules, realtime, users).await
        }
        Backend::Sqlite => {
            let db = alerthub_adapter_storage_sqlite_sqlx::Config {
                database_url: config.storage.database_url.clone(),
            }
            .build()
            .await
            .context("opening database")?;
            let rules = SqliteRuleStore::new(db.pool().clone())
                .with_poll_interval(config.rule_poll_interval());
            for doc in &rule_seed {
                rules.upsert(doc).await?;
            }
            let users = SqliteUserDirectory::new(db.pool().clone());
            for user in &user_seed {
                users.upsert(user).await?;
            }
            serve(&config, Arc::new(rules), realtime, users).await
        }
    }
}

async fn serve<RuleS, UD>(
    config: &Config,
    rules: Arc<RuleS>,
    realtime: Arc<InMemoryRealtimeStore>,
    users: UD,
) -> anyhow::Result<()>
where
    RuleS: RuleStore + Send + Sync + 'static,
    UD: UserDirectory + Send + Sync + 'static,
{
    let engine = Engine::start(config, rules, realtime, users, LoggingPushSender::default());
    let app = engine.router();

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "alerthubd listening");

    let (server_stop, server_stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = server_stopped.await;
            })
            .await
    });

    wait_for_signal().await?;
    tracing::info!("shutting down");

    engine.shutdown().await;
    let _ = server_stop.send(());
    server.await??;
    Ok(())
}

async fn wait_for_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
        _ = sigint.recv() => tracing::info!("received SIGINT"),
    }
    Ok(())
}
