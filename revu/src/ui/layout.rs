//! Geometry shared by the review screen: the three-panel split, panel
//! borders, and the status bar.
//!
//! Everything here is recomputed inside `terminal.draw()` each frame, so a
//! resize needs no bookkeeping. Adjacent panels overlap by one column
//! (`Spacing::Overlap(1)`) and their blocks merge borders with
//! `MergeStrategy::Fuzzy`, which draws correct junctions even where a thick
//! focused border meets a plain one.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, AuthContext, Mode};
use crate::theme::Theme;

/// Splits the frame into `[tree, code, comments, status_bar]`.
///
/// Under 120 columns the tree and comments panels collapse to zero width and
/// the code panel takes the whole row; callers skip rendering a zero-width
/// panel. At 120 and above the split is 22 / 50 / 28.
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let horizontal = if term_width >= 120 {
        Layout::horizontal([
            Constraint::Percentage(22),
            Constraint::Percentage(50),
            Constraint::Percentage(28),
        ])
        .spacing(Spacing::Overlap(1))
    } else {
        Layout::horizontal([
            Constraint::Length(0),
            Constraint::Fill(1),
            Constraint::Length(0),
        ])
        .spacing(Spacing::Overlap(1))
    };

    let [tree, code, comments] = main_area.layout(&horizontal);

    [tree, code, comments, status_bar]
}

/// A panel's interior: the outer rect minus its one-cell border.
///
/// The render pass caches these heights in `AppState` so the key handlers can
/// size half-page and full-page jumps without waiting for the next frame.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// The standard panel frame: thick border in the active color when focused,
/// plain border in the inactive color otherwise. Fuzzy merging keeps the
/// junction glyphs right where the two border weights meet. The base style
/// paints the theme's text and background across the whole panel, so themed
/// backgrounds cover panel interiors and not just styled spans.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &'a Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .style(Style::default().fg(theme.text).bg(theme.background))
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// The one-row status bar: mode badge, then the transient status message,
/// with the signed-in user right-aligned.
///
/// The overlays (`Help`, `ConfirmQuit`, `Profile`) show `NORMAL`; they sit on
/// top of normal mode rather than being modes of their own as far as the
/// badge is concerned.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal | Mode::Help | Mode::ConfirmQuit | Mode::Profile => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];
    if let Some(message) = state.status_message() {
        spans.push(Span::raw(" "));
        spans.push(Span::raw(message.to_owned()));
    }

    let right = match &state.auth {
        AuthContext::Ready(user) => format!(" {} ({}) ", user.name, user.role.label()),
        AuthContext::Loading | AuthContext::SignedOut => String::new(),
    };
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let pad = (area.width as usize).saturating_sub(used + right.chars().count());
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(right, Style::default().add_modifier(Modifier::BOLD)));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
