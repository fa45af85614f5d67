//! Lobbyforge server binary.
//!
//! Run with:
//! ```not_rust
//! lobbyforge
//! lobbyforge --config lobbyforge.toml
//! lobbyforge --config lobbyforge.toml --bind 0.0.0.0:3003
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lobbyforge::logging;
use lobbyforge::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "lobbyforge")]
#[command(about = "Room lobby coordinator for multiplayer web games", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `server.bind`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LobbyConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LobbyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    logging::init(&config.server.log_level);
    tracing::info!(
        bind = %config.server.bind,
        backend = ?config.storage.backend,
        recovery = ?config.storage.recovery,
        "starting Lobbyforge"
    );

    let builder = LobbyServerBuilder::new()
        .bind(&config.server.bind)
        .config(config.room_config())
        .recovery(config.storage.recovery)
        .idle_timeout(config.idle_timeout());

    match config.storage.backend {
        StorageBackend::Memory => {
            let server = builder
                .build(InMemoryRoomStore::new(), InMemoryMatchRecorder::new())
                .await?;
            serve(server).await
        }
        StorageBackend::Sqlite => {
            let db = Database::new(&config.storage.path)
                .await
                .with_context(|| format!("opening {}", config.storage.path))?;
            let server = builder.build(db.rooms(), db.matches()).await?;
            let result = serve(server).await;
            db.close().await;
            result
        }
    }
}

/// Runs `server` until it fails or the process receives Ctrl-C.
async fn serve<S: RoomStore, M: MatchRecorder>(
    server: LobbyServer<S, M>,
) -> anyhow::Result<()> {
    tracing::info!(addr = %server.local_addr()?, "listening");
    tokio::select! {
        result = server.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl-C")?;
            tracing::info!("shutting down");
        }
    }
    Ok(())
}
