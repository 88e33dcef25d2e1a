//! Final review composer overlay.
//!
//! Centered modal over the review screen while the final review is being
//! written. Publishing is a whole-submission action, so the modal floats
//! above the three panels instead of docking into one of them.

use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::Style,
    text::Line,
    widgets::{Clear, Paragraph},
};

use crate::review::ReviewSession;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the publish-review modal when its editor is open.
///
/// Skipped entirely below 40 columns, like the help overlay at its own
/// threshold: a modal that cannot fit its hint row is worse than none.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `session` — review session holding the editor, error and in-flight flag
/// * `insert_mode` — `true` when the app is in insert mode (owns the cursor)
/// * `theme` — active color theme
pub fn render_review_editor(
    frame: &mut Frame,
    session: &ReviewSession,
    insert_mode: bool,
    theme: &Theme,
) {
    let Some(editor) = &session.review_editor else {
        return;
    };
    if frame.area().width < 40 {
        return;
    }

    let modal = frame
        .area()
        .centered(Constraint::Percentage(70), Constraint::Percentage(70));
    frame.render_widget(Clear, modal);

    let title = match &session.submission {
        Some(submission) => format!("Publish review · {}", submission.repo_name()),
        None => "Publish review".to_owned(),
    };
    let block = panel_block(&title, true, theme);
    let inner = inner_rect(modal);
    frame.render_widget(block, modal);

    let [text_area, status_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let (rows, (cursor_row, cursor_col)) = editor.wrapped_display(text_area.width as usize);
    let scroll = cursor_row.saturating_sub(text_area.height.saturating_sub(1));
    frame.render_widget(Paragraph::new(rows.join("\n")).scroll((scroll, 0)), text_area);

    let status = if session.saving_review {
        Line::styled("Publishing...", Style::default().fg(theme.text_dim))
    } else if let Some(message) = &session.review_error {
        Line::styled(message.clone(), Style::default().fg(theme.error))
    } else {
        Line::styled(
            "Ctrl-s publish · Esc close (draft is kept)",
            Style::default().fg(theme.text_dim),
        )
    };
    frame.render_widget(Paragraph::new(status), status_area);

    if insert_mode && text_area.width > 0 {
        frame.set_cursor_position((
            text_area.x + cursor_col.min(text_area.width.saturating_sub(1)),
            text_area.y + cursor_row.saturating_sub(scroll),
        ));
    }
}
