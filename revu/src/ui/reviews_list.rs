//! Review-request list screen renderer.
//!
//! Full-width list of the signed-in user's review requests, one row per
//! request, with a pagination footer in the bottom border. Rows carry the
//! repository name, a colored status badge, branch, both parties and the
//! request age.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use revu_core::types::{Review, SubmissionStatus};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the review-request list into `area`.
///
/// Shows `Loading...` while a page fetch is in flight, the fetch error when
/// one failed, and a call to action when the account has no requests yet.
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the list (includes borders)
/// * `state` — mutable app state providing the page and its ListState
/// * `theme` — active color theme
pub fn render_reviews(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = match &state.reviews.page {
        Some(page) if page.total_pages > 0 => format!(
            "Review requests (page {}/{} · {} total)",
            page.page + 1,
            page.total_pages,
            page.total_elements
        ),
        _ => "Review requests".to_owned(),
    };
    let block = panel_block(&title, true, theme)
        .title_bottom(Line::styled(
            " Enter open · c new request · n/p page · r refresh · P profile · X sign out · ? help ",
            Style::default().fg(theme.text_dim),
        ));

    let items: Vec<ListItem> = if let Some(message) = &state.reviews.error {
        vec![
            ListItem::new(Line::styled(message.clone(), Style::default().fg(theme.error))),
            ListItem::new(Line::styled(
                "Press r to retry.",
                Style::default().fg(theme.text_dim),
            )),
        ]
    } else if state.reviews.loading && state.reviews.page.is_none() {
        vec![ListItem::new(Line::styled(
            "Loading...",
            Style::default().fg(theme.text_dim),
        ))]
    } else {
        match &state.reviews.page {
            Some(page) if !page.content.is_empty() => {
                page.content.iter().map(|review| review_row(review, theme)).collect()
            }
            _ => vec![ListItem::new(Line::styled(
                "No review requests yet. Press c to create one.",
                Style::default().fg(theme.text_dim),
            ))],
        }
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, area, &mut state.reviews.list);
}

/// One list row: `#41 widgets [PENDING] feature/parser  alice → bob · 2d ago`.
fn review_row(review: &Review, theme: &Theme) -> ListItem<'static> {
    let submission = &review.submission;
    let status_color = match submission.status {
        SubmissionStatus::Pending => theme.status_pending,
        SubmissionStatus::Canceled => theme.status_canceled,
        SubmissionStatus::Reviewed => theme.status_reviewed,
    };

    let spans = vec![
        Span::styled(
            format!("#{:<5}", submission.id),
            Style::default().fg(theme.text_dim),
        ),
        Span::styled(
            submission.repo_name().to_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" [{}]", submission.status.label()),
            Style::default().fg(status_color),
        ),
        Span::styled(
            format!(" {}", submission.branch),
            Style::default().fg(theme.text_dim),
        ),
        Span::raw(format!(
            "  {} → {}",
            submission.reviewee.user.name, submission.reviewer.user.name
        )),
        Span::styled(
            format!("  {}", submission.created_at.format("%Y-%m-%d")),
            Style::default().fg(theme.text_dim),
        ),
    ];
    ListItem::new(Line::from(spans))
}
