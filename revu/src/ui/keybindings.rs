//! Keybinding dispatcher.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns
//! a `KeyAction` telling the event loop whether to continue or quit. The
//! dispatcher branches first on `state.mode` so that Help, ConfirmQuit,
//! Profile, Insert, and Normal all have isolated handler functions; Normal
//! mode then branches on the current screen.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crate::app::{AppState, ConfirmAction, Mode, PanelFocus, RequestField, Screen};
use crate::editor::handle_edit_key;
use crate::review::SessionPhase;

/// Control-flow signal returned from the key dispatcher.
///
/// The event loop checks this after every keypress: `Quit` tears down the
/// terminal and exits; `Continue` immediately requests another render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Continue the event loop normally — request another render.
    Continue,
    /// Exit cleanly.
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// Mutates `state` in place and returns a `KeyAction` signalling whether to
/// continue or quit. The event loop should call this once per received key
/// and then redraw regardless of the return value (except on `Quit`).
///
/// # Arguments
///
/// * `key`   — the raw crossterm key event (code + modifiers)
/// * `state` — mutable reference to all UI state
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    // Ctrl-c works from every mode. A second Ctrl-c on the confirmation
    // overlay forces the exit.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        if state.mode == Mode::ConfirmQuit {
            return KeyAction::Quit;
        }
        return if state.request_quit() { KeyAction::Quit } else { KeyAction::Continue };
    }

    match state.mode {
        Mode::Help => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm(key, state),
        Mode::Profile => handle_profile(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Normal => match state.screen {
            Screen::Login => handle_login(key, state),
            Screen::Reviews => handle_reviews(key, state),
            Screen::NewRequest => handle_request_form(key, state),
            Screen::Review => handle_review(key, state),
        },
    }
}

// ---------------------------------------------------------------------------
// Login screen
// ---------------------------------------------------------------------------

/// The sign-in form is modeless: printable keys go straight into the active
/// field, Tab and the arrows switch fields, Enter submits.
fn handle_login(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Enter => {
            state.submit_login();
            KeyAction::Continue
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
            state.login.switch_field();
            KeyAction::Continue
        }
        KeyCode::Esc => {
            if state.request_quit() {
                KeyAction::Quit
            } else {
                KeyAction::Continue
            }
        }
        _ => {
            handle_edit_key(state.login.active_editor_mut(), key);
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Reviews list screen
// ---------------------------------------------------------------------------

fn handle_reviews(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Enter => {
            state.open_selected_review();
            KeyAction::Continue
        }
        KeyCode::Char('n') => {
            state.reviews_next_page();
            KeyAction::Continue
        }
        KeyCode::Char('p') => {
            state.reviews_prev_page();
            KeyAction::Continue
        }
        KeyCode::Char('r') => {
            state.fetch_reviews(state.reviews.page_index);
            KeyAction::Continue
        }
        KeyCode::Char('c') => {
            state.open_new_request();
            KeyAction::Continue
        }
        KeyCode::Char('P') => {
            state.mode = Mode::Profile;
            KeyAction::Continue
        }
        KeyCode::Char('X') => {
            state.sign_out();
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::Help;
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.request_quit() {
                KeyAction::Quit
            } else {
                KeyAction::Continue
            }
        }
        _ => KeyAction::Continue,
    }
}

// ---------------------------------------------------------------------------
// New request form
// ---------------------------------------------------------------------------

/// Modeless form like the login screen. Ctrl-s submits, Esc backs out keeping
/// the draft, Up/Down (or j/k) drive the branch and reviewer pickers.
fn handle_request_form(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('s') if ctrl => {
            state.submit_request_form();
            return KeyAction::Continue;
        }
        KeyCode::Esc => {
            state.close_request_form();
            return KeyAction::Continue;
        }
        _ => {}
    }

    let Some(form) = state.request_form.as_mut() else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Tab => form.field = form.field.next(),
        KeyCode::BackTab => form.field = form.field.prev(),
        KeyCode::Up => match form.field {
            RequestField::Branch => form.cycle_branch(false),
            RequestField::Reviewer => form.cycle_reviewer(false),
            _ => {}
        },
        KeyCode::Down => match form.field {
            RequestField::Branch => form.cycle_branch(true),
            RequestField::Reviewer => form.cycle_reviewer(true),
            _ => {}
        },
        KeyCode::Enter => {
            if form.field == RequestField::Details {
                form.details.insert_newline();
            } else {
                form.field = form.field.next();
            }
        }
        _ => match form.field {
            RequestField::GitUrl => {
                if handle_edit_key(&mut form.git_url, key) {
                    form.note_url_edited();
                }
            }
            RequestField::Details => {
                handle_edit_key(&mut form.details, key);
            }
            RequestField::Branch => match key.code {
                KeyCode::Char('j') => form.cycle_branch(true),
                KeyCode::Char('k') => form.cycle_branch(false),
                _ => {}
            },
            RequestField::Reviewer => match key.code {
                KeyCode::Char('j') => form.cycle_reviewer(true),
                KeyCode::Char('k') => form.cycle_reviewer(false),
                _ => {}
            },
        },
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Review screen, Normal mode
// ---------------------------------------------------------------------------

/// Delegates scroll keys to `handle_scroll_key`, then handles focus movement
/// and the panel-specific actions inline. A session that failed to bootstrap
/// only answers to retry, leave and help.
fn handle_review(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let failed = state
        .session
        .as_ref()
        .is_some_and(|s| matches!(s.phase, SessionPhase::Failed(_)));
    if failed {
        match key.code {
            KeyCode::Char('r') => state.retry_session(),
            KeyCode::Char('q') | KeyCode::Esc => state.leave_review(),
            KeyCode::Char('?') => {
                state.help_scroll = 0;
                state.mode = Mode::Help;
            }
            _ => {}
        }
        return KeyAction::Continue;
    }

    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        // Panel focus
        KeyCode::Char('H') => state.focus = state.focus.prev(),
        KeyCode::Char('L') => state.focus = state.focus.next(),

        // Files panel
        KeyCode::Enter | KeyCode::Char('l') if state.focus == PanelFocus::Files => {
            state.activate_tree_row()
        }
        KeyCode::Char('h') if state.focus == PanelFocus::Files => state.collapse_tree_row(),

        // Code panel
        KeyCode::Enter if state.focus == PanelFocus::Code => {
            if let Some(session) = state.session.as_mut() {
                session.toggle_active_line();
            }
        }
        KeyCode::Char('r') if state.focus == PanelFocus::Code => state.retry_file(),

        // Comments panel
        KeyCode::Char('r') if state.focus == PanelFocus::Comments => {
            if let Some(session) = state.session.as_mut() {
                if session.begin_reply() {
                    state.mode = Mode::Insert;
                }
            }
        }

        // Composers reachable from any panel
        KeyCode::Char('c') => {
            if let Some(session) = state.session.as_mut() {
                if session.begin_comment() {
                    state.mode = Mode::Insert;
                }
            }
        }
        KeyCode::Char('R') => {
            if let Some(session) = state.session.as_mut() {
                if session.begin_review() {
                    state.mode = Mode::Insert;
                }
            }
        }
        KeyCode::Char('v') => {
            if let Some(session) = state.session.as_mut() {
                session.toggle_pin_general();
            }
        }

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::Help;
        }
        KeyCode::Char('q') | KeyCode::Esc => state.request_leave_review(),
        _ => {}
    }
    KeyAction::Continue
}

/// Handles scroll-related keys in Normal mode: j / k / g / G and Ctrl combos.
///
/// Returns `Some(KeyAction)` when the key was consumed, `None` when the key
/// should fall through to the rest of the Normal handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') if !ctrl => {
            state.scroll_down(1);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('k') if !ctrl => {
            state.scroll_up(1);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('g') => {
            state.scroll_top();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('G') => {
            state.scroll_bottom();
            Some(KeyAction::Continue)
        }
        KeyCode::Char('d') if ctrl => {
            let n = state.half_page();
            state.scroll_down(n);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('u') if ctrl => {
            let n = state.half_page();
            state.scroll_up(n);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('f') if ctrl => {
            let n = state.full_page();
            state.scroll_down(n);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('b') if ctrl => {
            let n = state.full_page();
            state.scroll_up(n);
            Some(KeyAction::Continue)
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Insert mode (composers)
// ---------------------------------------------------------------------------

/// Routes keys into the topmost open composer. `Esc` closes it and returns to
/// Normal mode; `Ctrl-s` sends.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => {
            if let Some(session) = state.session.as_mut() {
                session.close_editor();
            }
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Char('s') if ctrl => {
            let review_open = state.session.as_ref().is_some_and(|s| s.review_editor.is_some());
            if review_open {
                state.submit_review();
            } else {
                state.submit_comment();
            }
            KeyAction::Continue
        }
        KeyCode::Enter => {
            if let Some(editor) = state.session.as_mut().and_then(|s| s.active_editor_mut()) {
                editor.insert_newline();
            }
            KeyAction::Continue
        }
        _ => {
            if let Some(editor) = state.session.as_mut().and_then(|s| s.active_editor_mut()) {
                handle_edit_key(editor, key);
            }
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Overlay modes
// ---------------------------------------------------------------------------

/// Handles a key event while the help overlay is visible.
///
/// Any of `?`, `Esc`, or `q` dismisses the overlay and returns to Normal
/// mode. All other keys are silently ignored.
fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => {
            state.help_scroll = state.help_scroll.saturating_add(1);
            KeyAction::Continue
        }
        KeyCode::Char('k') => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
            KeyAction::Continue
        }
        KeyCode::Char('g') => {
            state.help_scroll = 0;
            KeyAction::Continue
        }
        KeyCode::Char('G') => {
            state.help_scroll = u16::MAX;
            KeyAction::Continue
        }
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

/// `y` / `Y` confirms the pending action; `n` / `N` / `Esc` cancels.
fn handle_confirm(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => match state.confirm.take() {
            Some(ConfirmAction::LeaveReview) => {
                state.mode = Mode::Normal;
                state.leave_review();
                KeyAction::Continue
            }
            Some(ConfirmAction::Quit) | None => KeyAction::Quit,
        },
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.cancel_confirm();
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_profile(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('P') => {
            state.mode = Mode::Normal;
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// Left click on a review panel sets focus to that panel. Scroll wheel
/// up/down moves the focused panel by 3 lines (matching typical terminal
/// scroll speed). Wheel events while the help overlay is open scroll the
/// overlay instead.
///
/// # Arguments
///
/// * `mouse` — the crossterm mouse event
/// * `state` — mutable reference to all UI state
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            handle_mouse_click(mouse.column, mouse.row, state)
        }
        MouseEventKind::ScrollUp => {
            if state.mode == Mode::Help {
                state.help_scroll = state.help_scroll.saturating_sub(3);
            } else {
                state.scroll_up(3);
            }
            KeyAction::Continue
        }
        MouseEventKind::ScrollDown => {
            if state.mode == Mode::Help {
                state.help_scroll = state.help_scroll.saturating_add(3);
            } else {
                state.scroll_down(3);
            }
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

/// Sets panel focus based on the clicked screen position.
///
/// Checks each cached panel rect in `state.panel_rects`. Panels with zero
/// width are skipped so collapsed panels cannot receive focus via click.
/// Clicks only matter on the review screen; the other screens have a single
/// interactive surface.
fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) -> KeyAction {
    if state.screen != Screen::Review {
        return KeyAction::Continue;
    }
    let pos = Position { x: col, y: row };
    let [tree, code, comments] = state.panel_rects;

    if tree.width > 0 && tree.contains(pos) {
        state.focus = PanelFocus::Files;
    } else if code.contains(pos) {
        state.focus = PanelFocus::Code;
    } else if comments.width > 0 && comments.contains(pos) {
        state.focus = PanelFocus::Comments;
    }

    KeyAction::Continue
}
