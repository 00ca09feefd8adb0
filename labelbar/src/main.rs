//! labelbar: terminal review bar for labelling tasks.
//!
//! Entry point for the `labelbar` binary. Wires together the configuration
//! (`config`), log file (`logging`), terminal lifecycle (`tui`), unified event
//! bus (`event`), application state (`app`), rendering (`ui`) and the SQLite
//! review store from `labelbar-core`.
//!
//! ```text
//! labelbar [TASK.toml]
//! ```
//!
//! With a path, the task is imported (if new) and opened. Without one the most
//! recently imported task is reopened.
//!
//! # Startup sequence (order matters)
//!
//! 1. Load config and start the log file, then log any config error. Read-only,
//!    safe before terminal init.
//! 2. Open the database, import the task, load the stores. Failures here are
//!    reported on a normal terminal.
//! 3. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 4. Create the event channel and `spawn_event_task()`.
//!
//! `restore_tui()` is called after the event loop exits (quit key, SIGTERM,
//! or channel close). Inside the loop `?` is only used in the Render arm; draw
//! errors propagate out of the loop after the terminal is restored.

mod app;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use labelbar_core::comments::SqliteCommentStore;
use labelbar_core::db;
use labelbar_core::store::ReviewStore;
use labelbar_core::types::TaskSeed;

use crate::app::AppState;
use crate::event::AppEvent;
use crate::ui::keybindings::{KeyAction, handle_key};

/// Opens the database and resolves which task to show.
async fn open_task(config: &config::Config, seed_path: Option<&str>) -> std::io::Result<AppState> {
    std::fs::create_dir_all(&config.data_dir)?;
    let db_path = config.data_dir.join("reviews.db");
    let conn = db::open_db(&db_path.to_string_lossy())
        .await
        .map_err(std::io::Error::other)?;

    let task_id = match seed_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let seed: TaskSeed = toml::from_str(&raw).map_err(std::io::Error::other)?;
            let imported = db::import_task(&conn, &seed)
                .await
                .map_err(std::io::Error::other)?;
            tracing::info!(task = %seed.id, imported, "task seed read");
            seed.id
        }
        None => db::latest_task_id(&conn).await.map_err(std::io::Error::other)?,
    };

    let store = Arc::new(
        ReviewStore::open(conn.clone(), &task_id)
            .await
            .map_err(std::io::Error::other)?,
    );
    let comments = Arc::new(SqliteCommentStore::new(conn));
    if let Some(annotation) = store.selected() {
        comments
            .open_session(&annotation.id)
            .await
            .map_err(std::io::Error::other)?;
    }
    Ok(AppState::new(store, comments, config))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let (config, config_error) = match config::load() {
        Ok(config) => (config, None),
        Err(e) => (config::Config::default(), Some(e)),
    };
    std::fs::create_dir_all(&config.data_dir)?;
    logging::init(&config.data_dir)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "labelbar starting");
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "config unusable, using defaults");
    }

    let theme = theme::Theme::from_name(&config.theme);
    let seed_path = std::env::args().nth(1);
    let mut state = open_task(&config, seed_path.as_deref()).await?;

    // Panic hook first so it is the innermost hook and restores the terminal.
    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let tx = handler.tx;
    let mut rx = handler.rx;

    state.spawn_command(app::Command::RefreshRevisions, tx.clone());

    // Exits only via `break`, so `restore_tui()` below is always reached.
    let mut result = Ok(());
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when the
            // terminal is quiet.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    tracing::info!("SIGTERM received");
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                let follow_up = match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &state, &theme)) {
                            result = Err(e);
                            break 'event_loop;
                        }
                        None
                    }
                    Some(AppEvent::Key(key)) => match handle_key(key, &mut state) {
                        KeyAction::Quit => break 'event_loop,
                        KeyAction::Command(command) => Some(command),
                        KeyAction::Continue => None,
                    },
                    Some(AppEvent::Tick) => {
                        state.tick();
                        None
                    }
                    // ratatui picks up the new size from frame.area() on the next Render.
                    Some(AppEvent::Resize(_, _)) => None,
                    Some(AppEvent::ActionFinished { id, outcome }) => state.action_finished(id, outcome),
                    Some(AppEvent::CommentCommitted(r)) => {
                        state.comment_committed(r);
                        None
                    }
                    Some(AppEvent::GroundTruthToggled(r)) => {
                        state.ground_truth_toggled(r);
                        None
                    }
                    Some(AppEvent::RevisionsLoaded(r)) => {
                        state.revisions_loaded(r);
                        None
                    }
                    Some(AppEvent::Quit) | None => break 'event_loop,
                };
                if let Some(command) = follow_up {
                    state.spawn_command(command, tx.clone());
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    tracing::info!("labelbar exiting");
    result
}
