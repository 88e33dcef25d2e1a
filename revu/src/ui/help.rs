//! Help overlay renderer.
//!
//! Provides `render_help_overlay()` which draws a centred modal box over the
//! current screen using ratatui's `Clear` widget to erase the background
//! first. The overlay is rendered inside the same `terminal.draw()` closure
//! as everything else, so no second draw call is needed.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal.
///
/// Erases the overlay area with `Clear`, then draws a bordered `Block` and a
/// `Paragraph` containing all keybinding descriptions. The paragraph scrolls
/// vertically by `help_scroll` rows, enabling navigation of long help text on
/// short terminals.
///
/// If the terminal is narrower than 60 columns the overlay is skipped to
/// avoid a zero-height `Rect` panic.
///
/// # Arguments
///
/// * `frame` — current render frame provided by `terminal.draw()`
/// * `theme` — active color theme (supplies `border_active` for the modal border)
/// * `help_scroll` — vertical scroll offset; j/k in Help mode mutate this field
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    // Erase the background behind the modal before drawing content.
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to dismiss) ")
        .style(ratatui::style::Style::default().fg(theme.text).bg(theme.background))
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

/// Builds the help text as a multi-line `Text` value, grouped by screen.
fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Move down / up one step"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-f / b    Full page down / up"),
        Line::from("  H / L         Move panel focus left / right"),
        Line::from(""),
        Line::from("Review requests"),
        Line::from("  Enter         Open the selected request"),
        Line::from("  n / p         Next / previous page"),
        Line::from("  r             Refresh the current page"),
        Line::from("  c             New review request"),
        Line::from("  P             Show profile"),
        Line::from("  X             Sign out"),
        Line::from(""),
        Line::from("New request form"),
        Line::from("  Tab / S-Tab   Next / previous field"),
        Line::from("  Up / Down     Pick a branch or reviewer"),
        Line::from("  Ctrl-s        Submit the request"),
        Line::from("  Esc           Back (the draft is kept)"),
        Line::from(""),
        Line::from("Files panel"),
        Line::from("  Enter / l     Open file, or expand / collapse a directory"),
        Line::from("  h             Collapse directory, or jump to the parent"),
        Line::from(""),
        Line::from("Code panel"),
        Line::from("  Enter         Toggle the comment line under the cursor"),
        Line::from("  r             Retry a failed file load"),
        Line::from(""),
        Line::from("Comments panel"),
        Line::from("  j / k         Select next / previous thread"),
        Line::from("  c             New comment in the current scope"),
        Line::from("  r             Reply to the selected thread"),
        Line::from("  v             Pin / unpin general comments"),
        Line::from(""),
        Line::from("Review"),
        Line::from("  R             Write / publish the final review"),
        Line::from("  Ctrl-s        Send (in any composer)"),
        Line::from("  Esc           Close composer, or leave the review"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q             Back / quit (confirms if drafts exist)"),
        Line::from("  Ctrl-c        Quit from anywhere"),
    ])
}
