//! Color theme system for revu.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI
//! surface revu renders. Two built-in themes are provided:
//!
//! - `dark` — ANSI 16 colors only, so it works on any terminal including
//!   256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` — Catppuccin Mocha palette in RGB; needs truecolor.

use ratatui::style::Color;

/// All color values used across revu's UI surfaces.
///
/// Every field is a `ratatui::style::Color`. Callers use `theme.field`
/// directly inside `Style::default().fg(theme.border_active)`.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the currently focused panel.
    pub border_active: Color,
    /// Border color for unfocused panels.
    pub border_inactive: Color,

    // File tree
    /// Directory names in the tree panel.
    pub tree_directory: Color,
    /// File names in the tree panel.
    pub tree_file: Color,

    // Code panel
    /// Gutter line numbers.
    pub line_number: Color,
    /// Gutter line number on the cursor row.
    pub line_number_cursor: Color,
    /// Background of the active (annotated) line.
    pub active_line_bg: Color,
    /// Gutter marker for lines that carry comments.
    pub comment_marker: Color,

    // Comments panel
    /// Comment author names.
    pub comment_author: Color,
    /// Timestamps, reply arrows, and the edited badge.
    pub comment_meta: Color,

    // Submission status badges
    /// PENDING badge.
    pub status_pending: Color,
    /// CANCELED badge.
    pub status_canceled: Color,
    /// REVIEWED badge.
    pub status_reviewed: Color,

    // Status bar
    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar foreground (general text).
    pub status_bar_fg: Color,
    /// Mode indicator color when in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color when in INSERT mode.
    pub status_mode_insert: Color,

    // General
    /// Inline and fatal error text.
    pub error: Color,
    /// Success and confirmation text.
    pub success: Color,
    /// Field labels, hints, placeholders.
    pub text_dim: Color,
    /// Default body text inside panels.
    pub text: Color,
    /// Background painted behind panel interiors.
    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    ///
    /// Works on all terminals: 16-color, 256-color, and truecolor. Suitable
    /// as the default when color capability is unknown.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            tree_directory: Color::Blue,
            tree_file: Color::Reset,

            line_number: Color::DarkGray,
            line_number_cursor: Color::Cyan,
            active_line_bg: Color::DarkGray,
            comment_marker: Color::Yellow,

            comment_author: Color::Cyan,
            comment_meta: Color::DarkGray,

            status_pending: Color::Yellow,
            status_canceled: Color::Red,
            status_reviewed: Color::Green,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            error: Color::Red,
            success: Color::Green,
            text_dim: Color::DarkGray,
            text: Color::Reset,
            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Colors degrade to the nearest ANSI 256-color approximation on
    /// non-truecolor terminals; use `dark()` there for full fidelity.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        // Catppuccin Mocha palette (selected subset)
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let teal = Color::Rgb(148, 226, 213);     // #94e2d5
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68);    // #313244
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            tree_directory: blue,
            tree_file: text,

            line_number: overlay1,
            line_number_cursor: lavender,
            active_line_bg: surface0,
            comment_marker: yellow,

            comment_author: teal,
            comment_meta: overlay1,

            status_pending: peach,
            status_canceled: red,
            status_reviewed: green,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            error: red,
            success: green,
            text_dim: overlay1,
            text,
            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never
    /// prevents startup. Called before the terminal is initialised, so the
    /// fallback warning may still go to stderr.
    ///
    /// # Arguments
    ///
    /// * `name` — theme name from config, e.g. `"dark"` or `"catppuccin-mocha"`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                eprintln!("revu: unknown theme '{}', falling back to 'dark'", other);
                Self::dark()
            }
        }
    }
}
