//! Minimal text input state shared by every typed field in the app: the
//! sign-in form, the comment and reply composers, the request form, and the
//! final review editor.
//!
//! The cursor is a byte offset that always sits on a `char` boundary.
//! Multi-line editors accept inserted newlines; single-line editors ignore
//! them. Masked editors render bullets but keep the real text.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub struct EditorState {
    text: String,
    cursor: usize,
    multiline: bool,
    masked: bool,
}

impl EditorState {
    pub fn single_line() -> Self {
        Self { text: String::new(), cursor: 0, multiline: false, masked: false }
    }

    pub fn multiline() -> Self {
        Self { text: String::new(), cursor: 0, multiline: true, masked: false }
    }

    pub fn masked() -> Self {
        Self { text: String::new(), cursor: 0, multiline: false, masked: true }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_owned();
        self.cursor = self.text.len();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the text is empty or whitespace only. Submission paths
    /// check this before anything touches the network.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn insert(&mut self, ch: char) {
        if ch == '\n' && !self.multiline {
            return;
        }
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn insert_newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    /// Start of the current line (start of text for single-line editors).
    pub fn move_home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map(|i| i + 1).unwrap_or(0);
    }

    /// End of the current line (end of text for single-line editors).
    pub fn move_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len());
    }

    /// Text as the widget should draw it. Masked editors show one bullet per
    /// character.
    pub fn display(&self) -> String {
        if self.masked {
            self.text.chars().map(|_| '\u{2022}').collect()
        } else {
            self.text.clone()
        }
    }

    /// Cursor position as (row, column) in characters, for
    /// `Frame::set_cursor_position` after the widget renders.
    pub fn cursor_rowcol(&self) -> (u16, u16) {
        let before = &self.text[..self.cursor];
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().unwrap_or(before).chars().count();
        (row as u16, col as u16)
    }

    /// Display rows wrapped at `width` columns, plus the cursor's (row, col)
    /// within those rows. Character wrap, so the cursor maps exactly onto
    /// what the composer draws.
    pub fn wrapped_display(&self, width: usize) -> (Vec<String>, (u16, u16)) {
        let width = width.max(1);
        let display = self.display();
        let mut rows: Vec<String> = Vec::new();
        let mut cursor_pos = (0u16, 0u16);
        let mut current = String::new();
        let mut current_chars = 0usize;
        // `display()` maps chars 1:1 onto `text`, so the byte offsets of
        // `text` locate the cursor even in masked fields.
        let mut byte = 0usize;

        for (ch, raw) in display.chars().zip(self.text.chars()) {
            if ch == '\n' {
                if byte == self.cursor {
                    cursor_pos = (rows.len() as u16, current_chars as u16);
                }
                rows.push(std::mem::take(&mut current));
                current_chars = 0;
            } else {
                if current_chars == width {
                    rows.push(std::mem::take(&mut current));
                    current_chars = 0;
                }
                if byte == self.cursor {
                    cursor_pos = (rows.len() as u16, current_chars as u16);
                }
                current.push(ch);
                current_chars += 1;
            }
            byte += raw.len_utf8();
        }
        if self.cursor >= byte {
            cursor_pos = (rows.len() as u16, current_chars as u16);
        }
        rows.push(current);
        (rows, cursor_pos)
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }
}

/// Applies one editing key to an editor. Returns false for keys the editor
/// does not consume, so callers can layer their own bindings (submit,
/// dismiss, field switching) on top.
pub fn handle_edit_key(editor: &mut EditorState, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.insert(ch);
            true
        }
        KeyCode::Backspace => {
            editor.backspace();
            true
        }
        KeyCode::Delete => {
            editor.delete();
            true
        }
        KeyCode::Left => {
            editor.move_left();
            true
        }
        KeyCode::Right => {
            editor.move_right();
            true
        }
        KeyCode::Home => {
            editor.move_home();
            true
        }
        KeyCode::End => {
            editor.move_end();
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace_track_char_boundaries() {
        let mut ed = EditorState::single_line();
        ed.insert('a');
        ed.insert('é');
        ed.insert('b');
        assert_eq!(ed.text(), "aéb");
        ed.backspace();
        ed.backspace();
        assert_eq!(ed.text(), "a");
        ed.backspace();
        ed.backspace();
        assert_eq!(ed.text(), "");
    }

    #[test]
    fn single_line_editor_refuses_newlines() {
        let mut ed = EditorState::single_line();
        ed.insert('a');
        ed.insert_newline();
        ed.insert('b');
        assert_eq!(ed.text(), "ab");

        let mut multi = EditorState::multiline();
        multi.insert('a');
        multi.insert_newline();
        multi.insert('b');
        assert_eq!(multi.text(), "a\nb");
    }

    #[test]
    fn blank_means_whitespace_only() {
        let mut ed = EditorState::multiline();
        assert!(ed.is_blank());
        ed.insert(' ');
        ed.insert_newline();
        ed.insert('\t');
        assert!(ed.is_blank());
        ed.insert('x');
        assert!(!ed.is_blank());
    }

    #[test]
    fn masked_display_hides_text_but_keeps_value() {
        let mut ed = EditorState::masked();
        for ch in "hunter2".chars() {
            ed.insert(ch);
        }
        assert_eq!(ed.display(), "\u{2022}".repeat(7));
        assert_eq!(ed.text(), "hunter2");
    }

    #[test]
    fn home_end_and_rowcol_are_line_local() {
        let mut ed = EditorState::multiline().with_text("first\nsecond");
        assert_eq!(ed.cursor_rowcol(), (1, 6));
        ed.move_home();
        assert_eq!(ed.cursor_rowcol(), (1, 0));
        ed.move_end();
        assert_eq!(ed.cursor_rowcol(), (1, 6));
        ed.move_left();
        assert_eq!(ed.cursor_rowcol(), (1, 5));
    }

    #[test]
    fn wrapped_display_tracks_the_cursor_through_wraps() {
        let ed = EditorState::multiline().with_text("abcdef\nxy");
        let (rows, cursor) = ed.wrapped_display(4);
        assert_eq!(rows, vec!["abcd", "ef", "xy"]);
        // with_text leaves the cursor at the end of the buffer
        assert_eq!(cursor, (2, 2));

        let mut mid = EditorState::multiline().with_text("abcdef");
        mid.move_home();
        mid.move_right();
        mid.move_right();
        mid.move_right();
        mid.move_right();
        let (rows, cursor) = mid.wrapped_display(4);
        assert_eq!(rows, vec!["abcd", "ef"]);
        assert_eq!(cursor, (1, 0));
    }
}
