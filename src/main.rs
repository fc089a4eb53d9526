use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Command, USAGE, parse_command, run_command};

use calshare::{
    CalendarStore, HttpCalendarClient,
    api::SessionStorage,
    storage::{SqliteStorage, config::Config},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = setup_logging();

    let command = match parse_command(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load_or_create()?;
    let sessions = SessionStorage::new(config.session.token_cache.clone());
    let session = sessions.load()?;
    let storage = SqliteStorage::open(&config.storage.database)?;
    let api = HttpCalendarClient::new(config.api.url.clone());

    let mut store = CalendarStore::new(api, storage, session);
    store.get_local_calendars()?;

    run_command(command, &mut store, &sessions)
        .await
        .inspect_err(|e| tracing::error!("Command failed: {:#}", e))
}

/// Buffered lines reach the file only once the returned guard is dropped.
fn log_file_writer(log_dir: &Path) -> (NonBlocking, WorkerGuard) {
    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "calshare.log");
    tracing_appender::non_blocking(file_appender)
}

fn setup_logging() -> WorkerGuard {
    let (non_blocking, guard) = log_file_writer(&Config::config_dir());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!("calshare started");
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_log_line_is_flushed_when_guard_drops() {
        let dir = tempfile::tempdir().unwrap();
        let (writer, guard) = log_file_writer(dir.path());
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("Command failed: offline");
        });
        drop(guard);

        let contents: String = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        assert!(contents.contains("Command failed: offline"));
    }
}
