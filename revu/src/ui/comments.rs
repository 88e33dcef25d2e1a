//! Comments panel renderer.
//!
//! Renders the right-hand panel for the active comment scope: top-level
//! threads in server order with their replies indented underneath, and the
//! comment/reply composer docked at the bottom while one is open. Thread text
//! is wrapped manually so one display row equals one scroll step, which keeps
//! j/k navigation and the selected-thread snap exact.

use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use revu_core::comments::{CommentScope, CommentStore};
use revu_core::types::Comment;

use crate::app::PanelFocus;
use crate::editor::EditorState;
use crate::review::ReviewSession;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the comments right panel for the session's active scope.
///
/// The panel title names the scope and thread count, e.g. `Line 12 comments (3)`.
/// When a composer is open it takes the bottom rows of the panel and, in insert
/// mode, owns the terminal cursor.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the right panel (includes borders)
/// * `focus` — current panel focus (determines border style)
/// * `session` — mutable review session (scroll position is clamped in place)
/// * `insert_mode` — `true` when the app is in insert mode
/// * `theme` — active color theme
pub fn render_comments(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    session: &mut ReviewSession,
    insert_mode: bool,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Comments;
    let scope = session.scope();
    let count = session.store_for(&scope).scoped_count(&scope);

    let mut title = match &scope {
        CommentScope::General => format!("General comments ({count})"),
        CommentScope::File(_) => format!("File comments ({count})"),
        CommentScope::Line(_, line) => format!("Line {line} comments ({count})"),
    };
    if session.pinned_general {
        title.push_str(" [pinned]");
    }

    let block = panel_block(&title, is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let composer_open = session.comment_editor.is_some() || session.reply_editor.is_some();
    let composer_height = if composer_open { 7.min(inner.height) } else { 0 };
    let [list_area, composer_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(composer_height)]));

    let error = match &scope {
        CommentScope::General => session.general_error.clone(),
        CommentScope::File(_) | CommentScope::Line(_, _) => session.file_comments_error.clone(),
    };

    // Build every display row up front; offsets[i] is the first row of thread i.
    let store = session.store_for(&scope);
    let threads = store.scoped(&scope);
    let (mut lines, offsets) = thread_lines(
        store,
        &threads,
        session.selected_thread,
        list_area.width as usize,
        theme,
    );
    drop(threads);

    if let Some(message) = error {
        let mut prefixed = vec![
            Line::styled(message, Style::default().fg(theme.error)),
            Line::raw(""),
        ];
        prefixed.append(&mut lines);
        lines = prefixed;
    }

    // Keep the selected thread's header row inside the viewport, then clamp.
    let viewport = list_area.height;
    if let Some(&start) = offsets.get(session.selected_thread) {
        let start = start as u16;
        if start < session.comments_scroll {
            session.comments_scroll = start;
        } else if viewport > 0 && start >= session.comments_scroll + viewport {
            session.comments_scroll = start + 1 - viewport;
        }
    }
    let max_scroll = (lines.len() as u16).saturating_sub(viewport);
    session.comments_scroll = session.comments_scroll.min(max_scroll);

    frame.render_widget(
        Paragraph::new(lines).scroll((session.comments_scroll, 0)),
        list_area,
    );

    if composer_open {
        render_composer(frame, composer_area, session, insert_mode, theme);
    }
}

/// Flattens the scope's threads into display rows.
///
/// Returns the rows plus the starting row index of each thread, used to snap
/// the scroll position to the selected thread.
fn thread_lines(
    store: &CommentStore,
    threads: &[&Comment],
    selected: usize,
    width: usize,
    theme: &Theme,
) -> (Vec<Line<'static>>, Vec<usize>) {
    let width = width.max(8);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    if threads.is_empty() {
        lines.push(Line::styled(
            "No comments here yet.",
            Style::default().fg(theme.text_dim),
        ));
        lines.push(Line::styled(
            "Press c to start a thread.",
            Style::default().fg(theme.text_dim),
        ));
        return (lines, offsets);
    }

    for (index, comment) in threads.iter().enumerate() {
        offsets.push(lines.len());
        let is_selected = index == selected;
        let marker = if is_selected {
            Span::styled("▌ ", Style::default().fg(theme.border_active))
        } else {
            Span::raw("  ")
        };

        let mut header_style = Style::default().fg(theme.comment_author);
        if is_selected {
            header_style = header_style.add_modifier(Modifier::BOLD);
        }
        let mut header = vec![
            marker.clone(),
            Span::styled(comment.author.name.clone(), header_style),
            Span::styled(
                format!(" · {}", relative_time(comment.created_at)),
                Style::default().fg(theme.comment_meta),
            ),
        ];
        if comment.is_edited {
            header.push(Span::styled(" (edited)", Style::default().fg(theme.comment_meta)));
        }
        lines.push(Line::from(header));

        for row in wrap_plain(&comment.content, width.saturating_sub(2)) {
            lines.push(Line::from(vec![marker.clone(), Span::raw(row)]));
        }

        for reply in store.replies(&comment.id) {
            let mut reply_header = vec![
                Span::raw("    ↳ "),
                Span::styled(reply.author.name.clone(), Style::default().fg(theme.comment_author)),
                Span::styled(
                    format!(" · {}", relative_time(reply.created_at)),
                    Style::default().fg(theme.comment_meta),
                ),
            ];
            if reply.is_edited {
                reply_header.push(Span::styled(" (edited)", Style::default().fg(theme.comment_meta)));
            }
            lines.push(Line::from(reply_header));
            for row in wrap_plain(&reply.content, width.saturating_sub(6)) {
                lines.push(Line::from(vec![Span::raw("      "), Span::raw(row)]));
            }
        }
        lines.push(Line::raw(""));
    }
    (lines, offsets)
}

/// Renders the docked comment/reply composer with its status row.
fn render_composer(
    frame: &mut Frame,
    area: Rect,
    session: &ReviewSession,
    insert_mode: bool,
    theme: &Theme,
) {
    let (title, editor): (String, &EditorState) = match (&session.reply_editor, &session.comment_editor) {
        (Some((parent_id, editor)), _) => {
            let author = session
                .file_comments
                .get(parent_id)
                .or_else(|| session.general.get(parent_id))
                .map(|c| c.author.name.clone())
                .unwrap_or_else(|| "comment".to_owned());
            (format!("Reply to {author}"), editor)
        }
        (None, Some(editor)) => {
            let title = match session.scope() {
                CommentScope::General => "New general comment".to_owned(),
                CommentScope::File(_) => "New file comment".to_owned(),
                CommentScope::Line(_, line) => format!("New comment on line {line}"),
            };
            (title, editor)
        }
        (None, None) => return,
    };

    let block = Block::bordered()
        .title(title)
        .style(Style::default().fg(theme.text).bg(theme.background))
        .border_style(Style::default().fg(theme.border_active));
    let composer_inner = inner_rect(area);
    frame.render_widget(block, area);

    let [text_area, status_area] =
        composer_inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let (rows, (cursor_row, cursor_col)) = editor.wrapped_display(text_area.width as usize);
    let text_scroll = cursor_row.saturating_sub(text_area.height.saturating_sub(1));
    frame.render_widget(
        Paragraph::new(rows.join("\n")).scroll((text_scroll, 0)),
        text_area,
    );

    let status = if session.comment_in_flight {
        Line::styled("Sending...", Style::default().fg(theme.text_dim))
    } else if let Some(message) = &session.composer_error {
        Line::styled(message.clone(), Style::default().fg(theme.error))
    } else {
        Line::styled("Ctrl-s send · Esc cancel", Style::default().fg(theme.text_dim))
    };
    frame.render_widget(Paragraph::new(status), status_area);

    if insert_mode && session.review_editor.is_none() && text_area.width > 0 {
        frame.set_cursor_position((
            text_area.x + cursor_col.min(text_area.width.saturating_sub(1)),
            text_area.y + cursor_row.saturating_sub(text_scroll),
        ));
    }
}

/// Greedy word wrap at `width` columns. Words longer than the width are
/// hard-broken. One input newline is one row boundary.
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for logical in text.split('\n') {
        if logical.chars().count() <= width {
            rows.push(logical.to_owned());
            continue;
        }
        let mut current = String::new();
        let mut count = 0usize;
        for word in logical.split(' ') {
            let word_len = word.chars().count();
            if count > 0 && count + 1 + word_len > width {
                rows.push(std::mem::take(&mut current));
                count = 0;
            }
            if word_len > width {
                for ch in word.chars() {
                    if count == width {
                        rows.push(std::mem::take(&mut current));
                        count = 0;
                    }
                    current.push(ch);
                    count += 1;
                }
            } else {
                if count > 0 {
                    current.push(' ');
                    count += 1;
                }
                current.push_str(word);
                count += word_len;
            }
        }
        rows.push(current);
    }
    rows
}

/// Compact "how long ago" label for comment headers.
fn relative_time(t: DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(t);
    if delta.num_minutes() < 1 {
        "just now".to_owned()
    } else if delta.num_hours() < 1 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_days() < 1 {
        format!("{}h ago", delta.num_hours())
    } else if delta.num_days() < 30 {
        format!("{}d ago", delta.num_days())
    } else {
        t.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn wrap_breaks_on_words_and_hard_breaks_long_ones() {
        assert_eq!(wrap_plain("a bb ccc", 5), vec!["a bb", "ccc"]);
        assert_eq!(wrap_plain("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_plain("one\ntwo", 10), vec!["one", "two"]);
        assert_eq!(wrap_plain("", 4), vec![""]);
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(relative_time(now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5)), "5m ago");
        assert_eq!(relative_time(now - Duration::hours(3)), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2)), "2d ago");
        let old = now - Duration::days(90);
        assert_eq!(relative_time(old), old.format("%Y-%m-%d").to_string());
    }
}
