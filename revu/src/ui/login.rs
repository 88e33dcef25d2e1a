//! Sign-in screen renderer.
//!
//! Centered card with email and password fields. The form is modeless: keys
//! go straight into the active field, so the terminal cursor always sits in
//! it. The password field renders bullets only.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Clear, Paragraph},
};

use crate::app::{AppState, LoginField};
use crate::editor::EditorState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the sign-in card centered in `area`.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the screen body (the status bar is excluded by the caller)
/// * `state` — app state providing the login form
/// * `theme` — active color theme
pub fn render_login(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let card = area.centered(Constraint::Length(54), Constraint::Length(14));
    frame.render_widget(Clear, card);
    let block = panel_block("revu · sign in", true, theme);
    let inner = inner_rect(card);
    frame.render_widget(block, card);

    let [email_area, password_area, _, status_area, hint_area, register_area] =
        inner.layout(&Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ]));

    render_field(
        frame,
        email_area,
        "Email",
        &state.login.email,
        state.login.field == LoginField::Email,
        theme,
    );
    render_field(
        frame,
        password_area,
        "Password",
        &state.login.password,
        state.login.field == LoginField::Password,
        theme,
    );

    let status = if state.login.in_flight {
        Line::styled("Signing in...", Style::default().fg(theme.text_dim))
    } else if let Some(message) = &state.login.error {
        Line::styled(message.clone(), Style::default().fg(theme.error))
    } else {
        Line::raw("")
    };
    frame.render_widget(Paragraph::new(status), status_area);
    frame.render_widget(
        Paragraph::new(Line::styled(
            "Enter sign in · Tab next field · Esc quit",
            Style::default().fg(theme.text_dim),
        )),
        hint_area,
    );
    frame.render_widget(
        Paragraph::new(Line::styled(
            "No account? Register on the web app first.",
            Style::default().fg(theme.text_dim),
        )),
        register_area,
    );
}

/// Renders one single-line input box and, when active, parks the terminal
/// cursor inside it. Long values scroll horizontally to keep the cursor
/// visible.
fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    editor: &EditorState,
    active: bool,
    theme: &Theme,
) {
    let block = panel_block(label, active, theme);
    let text_area = inner_rect(area);
    frame.render_widget(block, area);

    let (_, col) = editor.cursor_rowcol();
    let width = text_area.width;
    let hscroll = if width > 0 { col.saturating_sub(width - 1) } else { 0 };
    frame.render_widget(
        Paragraph::new(editor.display()).scroll((0, hscroll)),
        text_area,
    );

    if active && width > 0 {
        frame.set_cursor_position((text_area.x + (col - hscroll).min(width - 1), text_area.y));
    }
}
