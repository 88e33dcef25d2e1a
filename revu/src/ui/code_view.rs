//! Code panel renderer.
//!
//! Renders the centre code panel using a List widget with manual virtual
//! scrolling. Only lines[code_scroll..code_scroll+viewport] are materialized
//! per frame, so rendering stays O(viewport) regardless of file length. Each
//! row carries a right-aligned line number, a comment-count gutter cell, and
//! the line content (highlighted when the syntect pass has landed, raw until
//! then).

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use revu_core::fs::format_size;

use crate::app::PanelFocus;
use crate::review::{FileView, OpenFile, ReviewSession, SessionPhase};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the code centre panel.
///
/// The panel title carries the open file's path, line count, size and detected
/// language. Placeholders cover the no-file, loading and failed states; load
/// failures keep the rest of the screen interactive and hint at `r` to retry.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the centre panel (includes borders)
/// * `focus` — current panel focus (determines border style)
/// * `session` — review session supplying the open file and scroll state
/// * `theme` — active color theme
pub fn render_code(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    session: &ReviewSession,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Code;
    let inner = inner_rect(area);

    match &session.file {
        FileView::None => {
            let block = panel_block("Code", is_focused, theme);
            frame.render_widget(block, area);
            render_no_file(frame, inner, session, theme);
        }
        FileView::Loading { path } => {
            let block = panel_block("Code", is_focused, theme);
            frame.render_widget(block, area);
            let msg = format!("Loading {path}...");
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(theme.text_dim)), inner);
        }
        FileView::Failed { path, error } => {
            let block = panel_block("Code", is_focused, theme);
            frame.render_widget(block, area);
            let lines = vec![
                Line::styled(format!("Could not load {path}"), Style::default().fg(theme.error)),
                Line::raw(error.clone()),
                Line::raw(""),
                Line::styled("Press r to retry.", Style::default().fg(theme.text_dim)),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
        FileView::Ready(file) => {
            let title = format!(
                "{}  [{} lines · {} · {}]",
                file.path,
                file.lines.len(),
                format_size(file.size),
                file.language
            );
            let block = panel_block(&title, is_focused, theme);
            frame.render_widget(block, area);
            render_file(frame, inner, session, file, theme);
        }
    }
}

/// Placeholder for the no-file state: the request details while the review is
/// still bootstrapping would be noise, so this shows the ask once Ready and a
/// short loading note before that.
fn render_no_file(frame: &mut Frame, inner: Rect, session: &ReviewSession, theme: &Theme) {
    let mut lines: Vec<Line> = Vec::new();
    match (&session.phase, &session.submission) {
        (SessionPhase::Ready, Some(submission)) => {
            lines.push(Line::from(vec![
                Span::styled(
                    submission.repo_name().to_owned(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {} ", submission.branch),
                    Style::default().fg(theme.text_dim),
                ),
                Span::styled(
                    format!("[{}]", submission.status.label()),
                    Style::default().fg(status_color(submission.status, theme)),
                ),
            ]));
            lines.push(Line::raw(""));
            for row in submission.request_details.split('\n') {
                lines.push(Line::raw(row.to_owned()));
            }
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                "Select a file from the tree to start reading.",
                Style::default().fg(theme.text_dim),
            ));
        }
        _ => {
            lines.push(Line::styled("Loading review...", Style::default().fg(theme.text_dim)));
        }
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn status_color(status: revu_core::types::SubmissionStatus, theme: &Theme) -> ratatui::style::Color {
    use revu_core::types::SubmissionStatus;
    match status {
        SubmissionStatus::Pending => theme.status_pending,
        SubmissionStatus::Canceled => theme.status_canceled,
        SubmissionStatus::Reviewed => theme.status_reviewed,
    }
}

/// Renders the visible window of an open file.
///
/// Gutter format per row: `{line number:>width} {count} ` where `count` is the
/// number of top-level comments anchored to that line (blank when zero, `+`
/// past nine). The cursor row brightens its line number; the active line gets
/// a full-row background.
fn render_file(
    frame: &mut Frame,
    inner: Rect,
    session: &ReviewSession,
    file: &OpenFile,
    theme: &Theme,
) {
    let viewport = inner.height as usize;
    let total = file.lines.len();
    let start = session.code_scroll.min(total.saturating_sub(1));
    let end = (start + viewport).min(total);

    let counts = session.file_comments.line_counts(&file.path);
    let number_width = total.to_string().len().max(3);

    let items: Vec<ListItem> = (start..end)
        .map(|index| {
            let line_no = index + 1;
            let is_cursor = index == session.cursor_line;
            let is_active = session.active_line == Some(line_no as u32);

            let count = counts.get(&(line_no as u32)).copied().unwrap_or(0);
            let marker = match count {
                0 => " ".to_owned(),
                1..=9 => count.to_string(),
                _ => "+".to_owned(),
            };

            let number_style = if is_cursor {
                Style::default().fg(theme.line_number_cursor).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.line_number)
            };

            let mut spans = vec![
                Span::styled(format!("{line_no:>number_width$} "), number_style),
                Span::styled(marker, Style::default().fg(theme.comment_marker)),
                Span::raw(" "),
            ];
            match &file.highlighted {
                Some(lines) => spans.extend(lines[index].spans.iter().cloned()),
                None => spans.push(Span::raw(file.lines[index].clone())),
            }

            let item = ListItem::new(Line::from(spans));
            if is_active {
                item.style(Style::default().bg(theme.active_line_bg))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items);
    frame.render_widget(list, inner);
}
