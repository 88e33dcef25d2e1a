//! File tree panel renderer.
//!
//! Renders the expandable project tree for the open review. Each row shows an
//! expand chevron for non-empty directories, the entry name, and a dimmed size
//! for files. Rows are produced from `FileTree::visible_rows` so collapsed
//! directories contribute nothing.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use revu_core::fs::format_size;

use crate::app::PanelFocus;
use crate::review::{ReviewSession, SessionPhase};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

/// Renders the file-tree left panel.
///
/// Uses `render_stateful_widget` so the ListState selection highlight is applied.
/// File count is shown in the panel title block (e.g., "Files (12)").
///
/// # Arguments
///
/// * `frame` — current render frame
/// * `area` — the `Rect` for the left panel (includes borders)
/// * `focus` — current panel focus (determines border style)
/// * `session` — mutable review session providing the tree and its ListState
/// * `theme` — active color theme
pub fn render_file_tree(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    session: &mut ReviewSession,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Files;
    let title = if session.total_files > 0 {
        format!("Files ({})", session.total_files)
    } else {
        "Files".to_owned()
    };
    let block = panel_block(&title, is_focused, theme);

    let items: Vec<ListItem> = if session.tree.is_empty() {
        let msg = match session.phase {
            SessionPhase::Ready => "No files",
            _ => "Loading...",
        };
        vec![ListItem::new(Line::raw(msg))]
    } else {
        let open = session.open_path().map(str::to_owned);
        session
            .tree
            .visible_rows()
            .into_iter()
            .map(|index| tree_row_item(session, index, open.as_deref(), theme))
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(list, area, &mut session.tree_list);
}

/// Converts one visible tree row into a styled ListItem.
///
/// Format: `  ▾ src` for an expanded directory, `    main.py  4.2 KB` for a
/// file. Indentation is two spaces per depth level. The currently open file
/// gets a `●` marker after its name.
fn tree_row_item(
    session: &ReviewSession,
    index: usize,
    open_path: Option<&str>,
    theme: &Theme,
) -> ListItem<'static> {
    let node = session.tree.node(index);
    let indent = "  ".repeat(node.depth);
    let chevron = if node.is_dir() && node.has_children() {
        if session.tree.is_expanded(&node.path) { "▾ " } else { "▸ " }
    } else {
        "  "
    };

    let name_style = if node.is_dir() {
        Style::default().fg(theme.tree_directory).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.tree_file)
    };

    let mut spans = vec![
        Span::raw(indent),
        Span::raw(chevron),
        Span::styled(node.name.clone(), name_style),
    ];
    if !node.is_dir() {
        if open_path == Some(node.path.as_str()) {
            spans.push(Span::styled(" ●", Style::default().fg(theme.border_active)));
        }
        if let Some(size) = node.size {
            spans.push(Span::styled(
                format!("  {}", format_size(size)),
                Style::default().fg(theme.text_dim),
            ));
        }
    }
    ListItem::new(Line::from(spans))
}
