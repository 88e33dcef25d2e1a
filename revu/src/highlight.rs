//! Background syntax highlighting for the code panel.
//!
//! Highlighting runs in `tokio::task::spawn_blocking` — syntect over a whole
//! file is CPU work that would otherwise stall the event loop. The result
//! comes back over the app event channel as owned `Line<'static>` values,
//! one per newline-split line of the file, so the renderer can swap them in
//! without re-splitting. The renderer never waits for this: it shows raw
//! lines until (and unless) a matching result arrives.
//!
//! Results are tagged with the file path and the fetch sequence number that
//! produced the content. The applier drops results whose tag no longer
//! matches the open file, so rapid file switches cannot paint stale spans.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Finished highlight job for one file snapshot.
#[derive(Debug)]
pub struct HighlightResult {
    pub path: String,
    /// Sequence number of the file fetch this content came from.
    pub seq: u64,
    /// One entry per newline-split line of the content.
    pub lines: Vec<Line<'static>>,
}

/// Maps a file path to the language label shown in the code panel header and
/// used to pick a syntect grammar. Unknown extensions are `"text"`, which
/// skips highlighting entirely.
pub fn language_for_path(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = file_name.rsplit('.').next().unwrap_or(file_name).to_ascii_lowercase();
    match ext.as_str() {
        "js" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "py" => "python",
        "java" => "java",
        "cpp" | "cxx" | "cc" | "h" => "cpp",
        "c" => "c",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" | "htm" => "html",
        "xml" => "xml",
        "json" => "json",
        "md" | "markdown" => "markdown",
        "yaml" | "yml" => "yaml",
        "sql" => "sql",
        "sh" | "bash" | "zsh" | "fish" => "bash",
        "ps1" => "powershell",
        "rb" => "ruby",
        "php" => "php",
        "go" => "go",
        "rs" => "rust",
        "kt" => "kotlin",
        "swift" => "swift",
        "dart" => "dart",
        "scala" => "scala",
        "clj" => "clojure",
        "r" => "r",
        "vim" => "vimscript",
        "dockerfile" => "docker",
        "tf" => "terraform",
        _ => "text",
    }
}

/// Spawns a highlight job for one file snapshot. Plain-text files never
/// spawn — raw rendering already is the final form for them.
pub fn spawn_highlight(tx: UnboundedSender<AppEvent>, path: String, seq: u64, content: String) {
    let language = language_for_path(&path);
    if language == "text" {
        return;
    }
    tokio::task::spawn_blocking(move || {
        let lines = highlight_lines(&content, language);
        let _ = tx.send(AppEvent::Highlighted(Box::new(HighlightResult { path, seq, lines })));
    });
}

/// Highlights full file content into one owned `Line` per newline-split
/// line. Length always equals `content.split('\n').count()` — the renderer
/// relies on a 1:1 row mapping with its raw lines.
pub fn highlight_lines(content: &str, language: &str) -> Vec<Line<'static>> {
    let theme = TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next());
    let Some(theme) = theme else {
        return content.split('\n').map(|l| Line::raw(l.to_owned())).collect();
    };
    let syntax = PS
        .find_syntax_by_token(language)
        .unwrap_or_else(|| PS.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, theme);
    content
        .split('\n')
        .map(|raw| Line::from(build_syntect_spans(raw, &mut highlighter, &PS)))
        .collect()
}

/// Builds syntect-highlighted spans for a single line of code.
///
/// Returns owned `Vec<Span<'static>>`. Falls back to a plain unstyled span
/// on highlight errors, so one bad line never loses its text.
fn build_syntect_spans(
    code: &str,
    highlighter: &mut HighlightLines,
    ps: &SyntaxSet,
) -> Vec<Span<'static>> {
    let ranges = highlighter.highlight_line(code, ps).unwrap_or_default();
    let spans: Vec<Span<'static>> =
        ranges.into_iter().map(|(style, text)| syntect_to_span(style, text)).collect();
    if spans.is_empty() {
        vec![Span::raw(code.to_owned())]
    } else {
        spans
    }
}

/// Converts one syntect style+text range into an owned ratatui span.
///
/// Alpha 0 in a syntect color means "unset" — those channels are left to the
/// terminal default instead of painting black.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::Color as SC;
    let to_color = |c: SC| -> Option<Color> {
        if c.a > 0 { Some(Color::Rgb(c.r, c.g, c.b)) } else { None }
    };
    let mut ratatui_style = Style::default();
    if let Some(fg) = to_color(style.foreground) {
        ratatui_style = ratatui_style.fg(fg);
    }
    if style.font_style.contains(syntect::highlighting::FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(syntect::highlighting::FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(syntect::highlighting::FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), ratatui_style)
}
