use std::sync::Arc;

use contentsync::telemetry::DrainOutcome;
use contentsync::{ContentSync, MemoryCache, SqliteStore, SyncConfig};

#[tokio::main]
async fn main() {
    contentsync::init_tracing();
    if let Err(error) = run().await {
        eprintln!("contentsync failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let mut drain_once = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--drain-once" => drain_once = true,
            other => return Err(format!("unknown argument '{other}'. Use --help")),
        }
    }

    let config = SyncConfig::from_env().map_err(|e| e.to_string())?;
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .map_err(|e| format!("failed to create data directory {}: {e}", data_dir.display()))?;
    let store = Arc::new(SqliteStore::open(config.db_path()).map_err(|e| e.to_string())?);
    let cache = Arc::new(MemoryCache::new());

    let sync = ContentSync::new(config, store, cache).map_err(|e| e.to_string())?;
    tracing::info!(
        session_id = %sync.session_id().await,
        stream = %sync.config().stream_url(),
        events = %sync.config().events_url(),
        "contentsync ready"
    );

    if drain_once {
        match sync.drain_now().await {
            DrainOutcome::Completed {
                delivered,
                dropped,
                remaining,
            } => println!("delivered {delivered}, dropped {dropped}, still queued {remaining}"),
            DrainOutcome::Empty => println!("queue empty"),
            DrainOutcome::Busy => println!("another drain is running"),
        }
        return Ok(());
    }

    sync.start();
    let mut states = sync.stream().subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                tracing::info!(%state, "push stream state changed");
            }
        }
    }

    sync.stop();
    tracing::info!(pending = sync.pending_events().await, "contentsync stopped");
    Ok(())
}

fn print_help() {
    println!(
        "contentsync\n\n\
         Keeps the push stream open and replays queued telemetry until Ctrl-C.\n\n\
         Options:\n  \
           --drain-once   replay the telemetry queue once and exit\n  \
           -h, --help     show this help\n\n\
         Environment:\n  \
           CONTENTSYNC_API_BASE, CONTENTSYNC_AUTH_TOKEN, CONTENTSYNC_SOURCE,\n  \
           CONTENTSYNC_DATA_DIR, CONTENTSYNC_RECONNECT_DELAY_MS,\n  \
           CONTENTSYNC_DRAIN_INTERVAL_MS, CONTENTSYNC_QUEUE_CAPACITY,\n  \
           CONTENTSYNC_DISCARD_REJECTED, RUST_LOG"
    );
}
