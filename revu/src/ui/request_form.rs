//! New review request form renderer.
//!
//! Full-screen form with four fields: repository URL, branch picker, reviewer
//! picker and the free-text request details. The branch picker fills itself
//! from the debounced branch lookup once the URL points at a supported
//! provider; both pickers cycle with Up/Down.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, BranchChoices, RequestField, RequestForm};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Renders the request form into `area`.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the screen body (the status bar is excluded by the caller)
/// * `state` — app state; the form itself lives in `state.request_form`
/// * `theme` — active color theme
pub fn render_request_form(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(form) = &state.request_form else {
        return;
    };

    let block = panel_block("New review request", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let [url_area, branch_area, reviewer_area, details_area, status_area] =
        inner.layout(&Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ]));

    render_url_field(frame, url_area, form, theme);
    render_branch_field(frame, branch_area, form, theme);
    render_reviewer_field(frame, reviewer_area, form, theme);
    render_details_field(frame, details_area, form, theme);

    let status = if form.in_flight {
        Line::styled("Submitting...", Style::default().fg(theme.text_dim))
    } else if let Some(message) = &form.error {
        Line::styled(message.clone(), Style::default().fg(theme.error))
    } else {
        Line::styled(
            "Tab next field · ↑/↓ pick · Ctrl-s submit · Esc back",
            Style::default().fg(theme.text_dim),
        )
    };
    frame.render_widget(Paragraph::new(status), status_area);
}

fn render_url_field(frame: &mut Frame, area: Rect, form: &RequestForm, theme: &Theme) {
    let active = form.field == RequestField::GitUrl;
    let block = panel_block("Repository URL", active, theme);
    let text_area = inner_rect(area);
    frame.render_widget(block, area);

    let (_, col) = form.git_url.cursor_rowcol();
    let width = text_area.width;
    let hscroll = if width > 0 { col.saturating_sub(width - 1) } else { 0 };
    frame.render_widget(
        Paragraph::new(form.git_url.display()).scroll((0, hscroll)),
        text_area,
    );
    if active && width > 0 {
        frame.set_cursor_position((text_area.x + (col - hscroll).min(width - 1), text_area.y));
    }
}

fn render_branch_field(frame: &mut Frame, area: Rect, form: &RequestForm, theme: &Theme) {
    let active = form.field == RequestField::Branch;
    let block = panel_block("Branch", active, theme);
    let text_area = inner_rect(area);
    frame.render_widget(block, area);

    let line = match &form.branches {
        BranchChoices::NotAsked => Line::styled(
            "Paste a github.com, gitlab.com or bitbucket.org URL above.",
            Style::default().fg(theme.text_dim),
        ),
        BranchChoices::Loading => {
            Line::styled("Fetching branches...", Style::default().fg(theme.text_dim))
        }
        BranchChoices::Failed(message) => {
            Line::styled(message.clone(), Style::default().fg(theme.error))
        }
        BranchChoices::Loaded(list) if list.branches.is_empty() => {
            Line::styled("No branches found.", Style::default().fg(theme.text_dim))
        }
        BranchChoices::Loaded(list) => {
            let branch = &list.branches[form.branch_index.min(list.branches.len() - 1)];
            let mut spans = vec![
                Span::raw("◂ "),
                Span::styled(branch.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" ▸"),
                Span::styled(
                    format!("  ({}/{})", form.branch_index + 1, list.branches.len()),
                    Style::default().fg(theme.text_dim),
                ),
            ];
            if branch.is_default || branch.name == list.default_branch {
                spans.push(Span::styled(" default", Style::default().fg(theme.success)));
            }
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(line), text_area);
}

fn render_reviewer_field(frame: &mut Frame, area: Rect, form: &RequestForm, theme: &Theme) {
    let active = form.field == RequestField::Reviewer;
    let block = panel_block("Reviewer", active, theme);
    let text_area = inner_rect(area);
    frame.render_widget(block, area);

    let line = if let Some(message) = &form.reviewers_error {
        Line::styled(message.clone(), Style::default().fg(theme.error))
    } else {
        match &form.reviewers {
            None => Line::styled("Loading reviewers...", Style::default().fg(theme.text_dim)),
            Some(page) if page.content.is_empty() => {
                Line::styled("No reviewers available.", Style::default().fg(theme.text_dim))
            }
            Some(page) => {
                let reviewer = &page.content[form.reviewer_index.min(page.content.len() - 1)];
                let mut spans = vec![
                    Span::raw("◂ "),
                    Span::styled(
                        reviewer.user.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" ▸"),
                    Span::styled(
                        format!("  ({}/{})", form.reviewer_index + 1, page.content.len()),
                        Style::default().fg(theme.text_dim),
                    ),
                ];
                if let Some(bio) = &reviewer.bio {
                    let snippet: String = bio.chars().take(40).collect();
                    spans.push(Span::styled(
                        format!("  {snippet}"),
                        Style::default().fg(theme.text_dim),
                    ));
                }
                Line::from(spans)
            }
        }
    };
    frame.render_widget(Paragraph::new(line), text_area);
}

fn render_details_field(frame: &mut Frame, area: Rect, form: &RequestForm, theme: &Theme) {
    let active = form.field == RequestField::Details;
    let block = panel_block("What should the reviewer focus on?", active, theme);
    let text_area = inner_rect(area);
    frame.render_widget(block, area);

    let (rows, (cursor_row, cursor_col)) = form.details.wrapped_display(text_area.width as usize);
    let scroll = cursor_row.saturating_sub(text_area.height.saturating_sub(1));
    frame.render_widget(Paragraph::new(rows.join("\n")).scroll((scroll, 0)), text_area);

    if active && text_area.width > 0 {
        frame.set_cursor_position((
            text_area.x + cursor_col.min(text_area.width.saturating_sub(1)),
            text_area.y + cursor_row.saturating_sub(scroll),
        ));
    }
}
