//! Terminal lifecycle management for revu.
//!
//! The TUI renders to **stderr**, not stdout. stdout stays clean for shell
//! pipelines, and log output goes to a file (the terminal is owned by the UI
//! once raw mode is on). Rendering goes through `BufWriter<Stderr>` so escape
//! sequences are batched into fewer write(2) syscalls per frame.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use signal_hook::flag::register;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// The terminal type used by revu.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Initialise the terminal for TUI rendering.
///
/// Enables raw mode, enters the alternate screen, and turns on mouse capture.
/// Call [`restore_tui`] at every exit path.
///
/// # Errors
///
/// Returns `Err` if `enable_raw_mode`, `execute!`, or `Terminal::new` fails.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Restore the terminal to its pre-TUI state.
///
/// Disables raw mode and leaves the alternate screen. Idempotent, and must be
/// called at every exit path — including the panic hook — because ratatui
/// does not auto-restore the terminal on `Drop`.
///
/// # Errors
///
/// Returns `Err` if `disable_raw_mode` or `execute!` fails. The panic hook
/// uses `let _ = restore_tui();` — best-effort only at that point.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before the panic prints.
///
/// Must be called **before** [`init_tui`]. Chains onto any previously
/// installed hook so the default panic printer still runs after the terminal
/// is restored. Without this, a panic leaves the shell in raw mode with the
/// alternate screen active and the message invisible.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal first so the panic message is readable.
        let _ = restore_tui();
        original_hook(panic_info);
    }));
}

/// Register a SIGTERM handler that sets an `AtomicBool` flag.
///
/// Returns an `Arc<AtomicBool>` that flips to `true` when the process
/// receives SIGTERM. The main event loop polls this flag on a heartbeat.
///
/// # Panics
///
/// Panics if the OS refuses to register the signal handler — treated as a
/// fatal initialisation error rather than a recoverable condition.
pub fn register_sigterm() -> Arc<AtomicBool> {
    let term = Arc::new(AtomicBool::new(false));
    // signal_hook::flag::register only stores into the AtomicBool from the
    // handler, which is async-signal-safe.
    register(SIGTERM, Arc::clone(&term)).expect("Failed to register SIGTERM handler");
    term
}
