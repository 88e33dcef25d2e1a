//! UI rendering module.
//!
//! This is the module root for `ui/`. It re-exports `render()` as the single
//! entry point called by the event loop's `terminal.draw()` closure and
//! dispatches to one renderer per screen.
//!
//! All layout arithmetic lives in `layout.rs`. The review screen's three
//! panels live in `file_tree.rs`, `code_view.rs` and `comments.rs`; the
//! remaining screens have one file each. Overlays (help, confirm, profile,
//! review composer) are rendered last so they sit on top.

mod layout;
pub mod code_view;
pub mod comments;
pub mod file_tree;
pub mod help;
pub mod keybindings;
pub mod login;
pub mod request_form;
pub mod review_editor;
pub mod reviews_list;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Clear, Paragraph, Wrap},
};

use crate::app::{AppState, AuthContext, ConfirmAction, Mode, Screen};
use crate::review::SessionPhase;
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, panel_block, render_status_bar};

/// Renders one complete frame for the current screen, then any overlay.
///
/// Called exactly once per `AppEvent::Render` inside `terminal.draw()`. This
/// is the only location where `terminal.draw()` is called in the application —
/// never call it from anywhere else.
///
/// Viewport heights and panel rects are written back into `state` before the
/// panels render, so scroll distances and mouse hit-testing on the *next*
/// keypress use the current geometry. The one-frame lag is imperceptible in
/// practice.
///
/// # Arguments
///
/// * `frame` — current render frame provided by `terminal.draw()`
/// * `state` — mutable reference to app state (viewport heights are cached here)
/// * `theme` — active color theme
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    if matches!(state.auth, AuthContext::Loading) {
        render_splash(frame, theme);
        return;
    }

    if state.screen == Screen::Review {
        render_review_screen(frame, state, theme);
    } else {
        let [body, status_bar] = frame
            .area()
            .layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));
        match state.screen {
            Screen::Login => login::render_login(frame, body, state, theme),
            Screen::Reviews => {
                state.reviews_viewport = inner_rect(body).height;
                reviews_list::render_reviews(frame, body, state, theme);
            }
            Screen::NewRequest => request_form::render_request_form(frame, body, state, theme),
            Screen::Review => {}
        }
        render_status_bar(frame, status_bar, state, theme);
    }

    // Overlays last, so they sit on top of everything the screen drew.
    match state.mode {
        Mode::Help => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => render_confirm_quit(frame, state, theme),
        Mode::Profile => render_profile(frame, state, theme),
        Mode::Normal | Mode::Insert => {}
    }
}

/// Renders the three review panels plus the status bar, or the failure card
/// when the session could not bootstrap.
fn render_review_screen(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [tree_area, code_area, comments_area, status_area] = compute_layout(frame);

    // Cache geometry BEFORE rendering panels so the next keypress and mouse
    // click use it. inner_rect() strips the 1-cell border on each side.
    state.panel_rects = [tree_area, code_area, comments_area];
    state.tree_viewport = inner_rect(tree_area).height;
    state.code_viewport = inner_rect(code_area).height;
    state.comments_viewport = inner_rect(comments_area).height;

    let focus = state.focus;
    let insert_mode = state.mode == Mode::Insert;

    if let Some(session) = state.session.as_mut() {
        if let SessionPhase::Failed(message) = &session.phase {
            let area = tree_area.union(code_area).union(comments_area);
            render_session_failed(frame, area, message, theme);
        } else {
            if tree_area.width > 0 {
                file_tree::render_file_tree(frame, tree_area, focus, session, theme);
            }
            code_view::render_code(frame, code_area, focus, session, theme);
            if comments_area.width > 0 {
                comments::render_comments(frame, comments_area, focus, session, insert_mode, theme);
            }
            review_editor::render_review_editor(frame, session, insert_mode, theme);
        }
    }

    render_status_bar(frame, status_area, state, theme);
}

/// Full-width card shown when the review bootstrap failed outright.
fn render_session_failed(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let block = panel_block("Review", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::styled("Could not load this review.", Style::default().fg(theme.error)),
        Line::raw(message.to_owned()),
        Line::raw(""),
        Line::styled("r retry · Esc back to the list", Style::default().fg(theme.text_dim)),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Minimal centered card shown while the stored token is being validated.
fn render_splash(frame: &mut Frame, theme: &Theme) {
    let area = frame.area().centered(Constraint::Length(30), Constraint::Length(3));
    let block = panel_block("revu", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Line::styled(
            "Resolving session...",
            Style::default().fg(theme.text_dim),
        )),
        inner,
    );
}

/// Confirmation card for quitting or leaving a review with unsaved drafts.
fn render_confirm_quit(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame.area().centered(Constraint::Length(48), Constraint::Length(5));
    frame.render_widget(Clear, area);
    let block = panel_block("Unsaved drafts", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let question = match state.confirm {
        Some(ConfirmAction::LeaveReview) => "Leave this review and drop your drafts?",
        _ => "Quit and drop your drafts?",
    };
    let lines = vec![
        Line::raw(question),
        Line::raw(""),
        Line::styled("y yes · n or Esc stay", Style::default().fg(theme.text_dim)),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Small card with the signed-in account's details.
fn render_profile(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(user) = state.signed_in_user() else {
        return;
    };
    let area = frame.area().centered(Constraint::Length(48), Constraint::Length(8));
    frame.render_widget(Clear, area);
    let block = panel_block("Profile", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Line::raw(user.email.clone()),
        Line::raw(user.role.label().to_owned()),
        Line::styled(
            format!("member since {}", user.created_at.format("%Y-%m-%d")),
            Style::default().fg(theme.text_dim),
        ),
        Line::raw(""),
        Line::styled("Esc close", Style::default().fg(theme.text_dim)),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
