//! revu — terminal client for the code-review mentoring platform.
//!
//! Entry point for the `revu` binary. Wires together the terminal lifecycle
//! (`tui`), unified event bus (`event`), screen renderers (`ui`), theme
//! system (`theme`), and the backend gateway (`revu-core`).
//!
//! # Startup sequence (order matters)
//!
//! 1. Parse CLI arguments and load config — read-only, safe before terminal
//!    init, and parse errors must print to a usable terminal.
//! 2. Start file logging. The terminal belongs to the UI once raw mode is
//!    on, so tracing output goes to `revu.log` in the config directory.
//! 3. Build the `ApiClient` and install any stored bearer token.
//! 4. `install_panic_hook()` — installed before `init_tui` so it is the
//!    innermost hook. Restores the terminal before the panic message prints.
//! 5. `register_sigterm()` — returns `Arc<AtomicBool>` polled in the event loop.
//! 6. `init_tui()` — enters alternate screen and enables raw mode.
//! 7. Create event channel, `spawn_event_task()`, and `state.start()` to kick
//!    off session resolution.
//!
//! # Safety
//!
//! `restore_tui()` is called after the event loop exits (normal quit, 'q'
//! key, SIGTERM, channel close, or a draw error). Draw errors `break` out of
//! the loop rather than `?`-ing past the restore call; the panic hook covers
//! unexpected panics.

mod app;
mod config;
mod editor;
mod event;
mod highlight;
mod net;
mod review;
mod theme;
mod tui;
mod ui;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use revu_core::api::ApiClient;

use ui::keybindings::KeyAction;

/// Terminal client for the code-review mentoring platform.
#[derive(Debug, Parser)]
#[command(name = "revu", version, about)]
struct Args {
    /// Review request id to open straight away, skipping the list.
    submission: Option<i64>,

    /// Gateway base URL, overriding the config file.
    #[arg(long, value_name = "URL")]
    server: Option<String>,
}

/// Routes tracing output to `revu.log` in the config directory.
///
/// Logging is best-effort: an unwritable config directory disables it rather
/// than aborting startup. The returned guard must stay alive for the process
/// lifetime or buffered log lines are lost.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let dir = config::config_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, "revu.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("revu=info,revu_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::load();
    let theme = theme::Theme::from_name(config.theme_name());
    let _log_guard = init_logging();

    let server = args.server.as_deref().unwrap_or_else(|| config.server_url()).to_owned();
    let base = Url::parse(&server).with_context(|| format!("invalid server URL: {server}"))?;
    let api = Arc::new(ApiClient::new(base));

    let auth_path = config::auth_path();
    match revu_core::auth::load(&auth_path) {
        Ok(Some(stored)) => api.set_token(Some(stored.access_token)),
        Ok(None) => {}
        Err(err) => warn!(error = %err, "stored credentials unreadable, starting signed out"),
    }
    info!(server = %server, "starting");

    // Hook before init_tui so the panic path restores the terminal first.
    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut state = app::AppState::new(api, handler.tx.clone(), auth_path, args.submission);
    let mut rx = handler.rx;
    state.start();

    // Every exit from the loop is a `break`. Draw errors are stashed rather
    // than `?`-ed so the restore call below always runs.
    let mut draw_error: Option<std::io::Error> = None;
    'event_loop: loop {
        tokio::select! {
            // Heartbeat arm: polls the SIGTERM flag even when no terminal
            // events arrive. rx.recv() alone would park a quiescent terminal
            // forever and the flag would never be seen.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        // The only draw() in the program; every frame starts here.
                        if let Err(err) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_error = Some(err);
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if ui::keybindings::handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => {
                        if ui::keybindings::handle_mouse(mouse, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Tick) => state.on_tick(),
                    Some(event::AppEvent::Net(result)) => state.handle_net(*result),
                    Some(event::AppEvent::Highlighted(result)) => state.apply_highlight(*result),
                    Some(event::AppEvent::Resize(_, _)) => {
                        // Nothing to do: the next Render reads the new size
                        // from frame.area().
                    }
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                }
                // Re-check the flag per event so a busy terminal still quits
                // within one event cycle instead of waiting on the heartbeat.
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    // Single restore point for every exit: quit keys, SIGTERM, channel close,
    // draw errors. Panics restore through the hook instead.
    tui::restore_tui()?;
    if let Some(err) = draw_error {
        return Err(err).context("terminal draw failed");
    }
    Ok(())
}
