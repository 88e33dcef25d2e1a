//! State for one open review submission: the bootstrap phases, the file
//! tree, the open file, and both comment stores.
//!
//! A session bootstraps in a fixed order. The submission record loads first
//! (nothing renders without it), then the file tree and the general comments
//! load in parallel; the session is `Ready` once both land. Failures during
//! bootstrap fail the whole session with a retry prompt. After `Ready`,
//! failures stay local: a file that will not load shows an error in the code
//! panel, a comment listing that will not load shows one in the comments
//! panel, and the session itself never unwinds.
//!
//! File content and comment listings are fetch-and-replace with sequence
//! tags. Opening a file bumps the tags; results carrying an older tag are
//! dropped on arrival, so switching files quickly can never paint a stale
//! response over a newer one.

use ratatui::text::Line;
use ratatui::widgets::ListState;
use revu_core::comments::{CommentScope, CommentStore};
use revu_core::fs::FileTree;
use revu_core::types::{Comment, FileContent, Page, ProjectFileSystem, Submission};
use revu_core::Result;

use crate::editor::EditorState;
use crate::highlight::{language_for_path, HighlightResult};

/// Bootstrap progress for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    LoadingSubmission,
    LoadingFileSystem { tree_done: bool, general_done: bool },
    Ready,
    Failed(String),
}

/// What the code panel is showing.
#[derive(Debug)]
pub enum FileView {
    None,
    Loading { path: String },
    Ready(Box<OpenFile>),
    Failed { path: String, error: String },
}

/// A loaded file. `lines` is the newline split of the fetched content and is
/// the only line count the renderer trusts; `highlighted` arrives later from
/// the background highlighter and always has the same length as `lines`.
#[derive(Debug)]
pub struct OpenFile {
    pub path: String,
    pub size: u64,
    pub language: &'static str,
    pub lines: Vec<String>,
    pub highlighted: Option<Vec<Line<'static>>>,
}

#[derive(Debug)]
pub struct ReviewSession {
    pub submission_id: i64,
    pub phase: SessionPhase,
    pub submission: Option<Submission>,

    pub tree: FileTree,
    pub tree_list: ListState,
    pub total_files: u64,
    pub total_size: u64,

    pub file: FileView,
    pub file_comments: CommentStore,
    pub file_comments_error: Option<String>,
    pub general: CommentStore,
    pub general_error: Option<String>,

    /// Top row of the code viewport, in line indices.
    pub code_scroll: usize,
    /// 0-based cursor row in the open file.
    pub cursor_line: usize,
    /// 1-based annotated line, when one is active.
    pub active_line: Option<u32>,

    pub comments_scroll: u16,
    pub selected_thread: usize,
    /// `true` pins the comments panel to general comments while a file is
    /// open.
    pub pinned_general: bool,

    pub comment_editor: Option<EditorState>,
    pub reply_editor: Option<(String, EditorState)>,
    pub composer_error: Option<String>,
    pub comment_in_flight: bool,

    pub review_editor: Option<EditorState>,
    /// Review text carried across modal open/close so Esc never loses it.
    pub review_draft: String,
    pub review_error: Option<String>,
    pub saving_review: bool,

    /// File to re-open once a freshly reloaded session reaches `Ready`.
    pub pending_reselect: Option<String>,

    pub file_seq: u64,
    pub comments_seq: u64,
    pub general_seq: u64,
}

impl ReviewSession {
    pub fn new(submission_id: i64) -> Self {
        Self {
            submission_id,
            phase: SessionPhase::LoadingSubmission,
            submission: None,
            tree: FileTree::default(),
            tree_list: ListState::default(),
            total_files: 0,
            total_size: 0,
            file: FileView::None,
            file_comments: CommentStore::default(),
            file_comments_error: None,
            general: CommentStore::default(),
            general_error: None,
            code_scroll: 0,
            cursor_line: 0,
            active_line: None,
            comments_scroll: 0,
            selected_thread: 0,
            pinned_general: false,
            comment_editor: None,
            reply_editor: None,
            composer_error: None,
            comment_in_flight: false,
            review_editor: None,
            review_draft: String::new(),
            review_error: None,
            saving_review: false,
            pending_reselect: None,
            file_seq: 0,
            comments_seq: 0,
            general_seq: 0,
        }
    }

    /// Path the code panel is about, in any file sub-state.
    pub fn open_path(&self) -> Option<&str> {
        match &self.file {
            FileView::None => None,
            FileView::Loading { path } | FileView::Failed { path, .. } => Some(path),
            FileView::Ready(file) => Some(&file.path),
        }
    }

    pub fn open_file(&self) -> Option<&OpenFile> {
        match &self.file {
            FileView::Ready(file) => Some(file),
            _ => None,
        }
    }

    /// The scope the comments panel follows right now. An active line wins,
    /// then the open file, then general; pinning overrides all of that.
    pub fn scope(&self) -> CommentScope {
        if self.pinned_general {
            return CommentScope::General;
        }
        match self.open_file() {
            Some(file) => match self.active_line {
                Some(line) => CommentScope::Line(file.path.clone(), line),
                None => CommentScope::File(file.path.clone()),
            },
            None => CommentScope::General,
        }
    }

    pub fn store_for(&self, scope: &CommentScope) -> &CommentStore {
        match scope {
            CommentScope::General => &self.general,
            CommentScope::File(_) | CommentScope::Line(_, _) => &self.file_comments,
        }
    }

    /// Top-level threads in the active scope, server order.
    pub fn active_threads(&self) -> Vec<&Comment> {
        let scope = self.scope();
        self.store_for(&scope).scoped(&scope)
    }

    pub fn selected_thread_id(&self) -> Option<String> {
        self.active_threads().get(self.selected_thread).map(|c| c.id.clone())
    }

    // --- bootstrap -----------------------------------------------------

    pub fn apply_submission(&mut self, result: Result<Submission>) {
        match result {
            Ok(submission) => {
                self.submission = Some(submission);
                self.phase = SessionPhase::LoadingFileSystem { tree_done: false, general_done: false };
            }
            Err(err) => self.phase = SessionPhase::Failed(err.to_string()),
        }
    }

    pub fn apply_file_system(&mut self, result: Result<ProjectFileSystem>) {
        match result {
            Ok(fs) => {
                self.total_files = fs.total_files;
                self.total_size = fs.total_size;
                self.tree = FileTree::from_file_system(&fs);
                if !self.tree.is_empty() {
                    self.tree_list.select_first();
                }
                if let SessionPhase::LoadingFileSystem { tree_done, .. } = &mut self.phase {
                    *tree_done = true;
                }
                self.maybe_ready();
            }
            Err(err) => self.phase = SessionPhase::Failed(err.to_string()),
        }
    }

    /// Applies a general-comments listing. During bootstrap a failure fails
    /// the session; after `Ready` it only marks the panel, and the error
    /// message is returned so the caller can surface it.
    pub fn apply_general(&mut self, seq: u64, result: Result<Page<Comment>>) -> Option<String> {
        if seq != self.general_seq {
            return None;
        }
        match result {
            Ok(page) => {
                self.general = CommentStore::new(page.content);
                self.general_error = None;
                if let SessionPhase::LoadingFileSystem { general_done, .. } = &mut self.phase {
                    *general_done = true;
                }
                self.maybe_ready();
                self.clamp_selected_thread();
                None
            }
            Err(err) => {
                if self.phase == SessionPhase::Ready {
                    let message = err.to_string();
                    self.general_error = Some(message.clone());
                    Some(message)
                } else {
                    self.phase = SessionPhase::Failed(err.to_string());
                    None
                }
            }
        }
    }

    fn maybe_ready(&mut self) {
        if let SessionPhase::LoadingFileSystem { tree_done: true, general_done: true } = self.phase {
            self.phase = SessionPhase::Ready;
        }
    }

    // --- file sub-state ------------------------------------------------

    /// Starts loading `path` into the code panel. Resets the cursor, the
    /// active line, and the file comment store; the caller spawns the
    /// content and comment fetches under the two fresh tags.
    pub fn select_file(&mut self, path: String, file_seq: u64, comments_seq: u64) {
        self.file = FileView::Loading { path };
        self.file_seq = file_seq;
        self.comments_seq = comments_seq;
        self.cursor_line = 0;
        self.code_scroll = 0;
        self.active_line = None;
        self.selected_thread = 0;
        self.comments_scroll = 0;
        self.file_comments = CommentStore::default();
        self.file_comments_error = None;
    }

    /// Applies a fetched file. Returns `true` when the result was current
    /// and loaded, so the caller can hand the content to the highlighter.
    pub fn apply_file_content(&mut self, path: String, seq: u64, result: Result<FileContent>) -> bool {
        if seq != self.file_seq {
            return false;
        }
        match result {
            Ok(content) => {
                let lines: Vec<String> = content.content.split('\n').map(str::to_owned).collect();
                self.file = FileView::Ready(Box::new(OpenFile {
                    language: language_for_path(&path),
                    size: content.size,
                    path,
                    lines,
                    highlighted: None,
                }));
                true
            }
            Err(err) => {
                self.file = FileView::Failed { path, error: err.to_string() };
                false
            }
        }
    }

    pub fn apply_file_comments(&mut self, seq: u64, result: Result<Page<Comment>>) {
        if seq != self.comments_seq {
            return;
        }
        match result {
            Ok(page) => {
                self.file_comments = CommentStore::new(page.content);
                self.file_comments_error = None;
                self.clamp_selected_thread();
            }
            Err(err) => self.file_comments_error = Some(err.to_string()),
        }
    }

    /// Installs highlighted lines if they still describe the open snapshot.
    pub fn apply_highlight(&mut self, result: HighlightResult) {
        if result.seq != self.file_seq {
            return;
        }
        if let FileView::Ready(file) = &mut self.file {
            if file.path == result.path && file.lines.len() == result.lines.len() {
                file.highlighted = Some(result.lines);
            }
        }
    }

    // --- code cursor ---------------------------------------------------

    fn line_count(&self) -> usize {
        self.open_file().map(|f| f.lines.len()).unwrap_or(0)
    }

    pub fn cursor_down(&mut self, n: usize, viewport: usize) {
        let count = self.line_count();
        if count == 0 {
            return;
        }
        self.cursor_line = (self.cursor_line + n).min(count - 1);
        self.follow_cursor(viewport);
    }

    pub fn cursor_up(&mut self, n: usize, viewport: usize) {
        self.cursor_line = self.cursor_line.saturating_sub(n);
        self.follow_cursor(viewport);
    }

    pub fn cursor_top(&mut self, viewport: usize) {
        self.cursor_line = 0;
        self.follow_cursor(viewport);
    }

    pub fn cursor_bottom(&mut self, viewport: usize) {
        self.cursor_line = self.line_count().saturating_sub(1);
        self.follow_cursor(viewport);
    }

    fn follow_cursor(&mut self, viewport: usize) {
        if viewport == 0 {
            return;
        }
        if self.cursor_line < self.code_scroll {
            self.code_scroll = self.cursor_line;
        } else if self.cursor_line >= self.code_scroll + viewport {
            self.code_scroll = self.cursor_line + 1 - viewport;
        }
    }

    /// Toggles the annotation target: activating the cursor line, or
    /// deactivating it when it already is the active line.
    pub fn toggle_active_line(&mut self) {
        if self.open_file().is_none() {
            return;
        }
        let line = self.cursor_line as u32 + 1;
        self.active_line = if self.active_line == Some(line) { None } else { Some(line) };
        self.selected_thread = 0;
        self.comments_scroll = 0;
    }

    /// Flips the comments panel between the active scope and pinned general
    /// comments.
    pub fn toggle_pin_general(&mut self) {
        self.pinned_general = !self.pinned_general;
        self.selected_thread = 0;
        self.comments_scroll = 0;
    }

    // --- comment threads -----------------------------------------------

    pub fn thread_next(&mut self) {
        let count = self.active_threads().len();
        if count > 0 {
            self.selected_thread = (self.selected_thread + 1).min(count - 1);
        }
    }

    pub fn thread_prev(&mut self) {
        self.selected_thread = self.selected_thread.saturating_sub(1);
    }

    pub fn thread_first(&mut self) {
        self.selected_thread = 0;
    }

    pub fn thread_last(&mut self) {
        self.selected_thread = self.active_threads().len().saturating_sub(1);
    }

    fn clamp_selected_thread(&mut self) {
        let count = self.active_threads().len();
        self.selected_thread = self.selected_thread.min(count.saturating_sub(1));
    }

    // --- composers -----------------------------------------------------

    /// Opens the comment composer for the active scope. Ignored while a
    /// send is in flight.
    pub fn begin_comment(&mut self) -> bool {
        if self.comment_in_flight {
            return false;
        }
        self.reply_editor = None;
        self.comment_editor = Some(EditorState::multiline());
        self.composer_error = None;
        true
    }

    /// Opens the reply composer targeting the selected thread.
    pub fn begin_reply(&mut self) -> bool {
        if self.comment_in_flight {
            return false;
        }
        let Some(parent) = self.selected_thread_id() else { return false };
        self.comment_editor = None;
        self.reply_editor = Some((parent, EditorState::multiline()));
        self.composer_error = None;
        true
    }

    pub fn begin_review(&mut self) -> bool {
        if self.saving_review {
            return false;
        }
        self.review_editor = Some(EditorState::multiline().with_text(&self.review_draft));
        self.review_error = None;
        true
    }

    /// Whether any composer is open, regardless of its content.
    pub fn has_open_editor(&self) -> bool {
        self.review_editor.is_some()
            || self.reply_editor.is_some()
            || self.comment_editor.is_some()
    }

    /// The editor currently receiving keystrokes, topmost overlay first.
    pub fn active_editor_mut(&mut self) -> Option<&mut EditorState> {
        if let Some(editor) = self.review_editor.as_mut() {
            return Some(editor);
        }
        if let Some((_, editor)) = self.reply_editor.as_mut() {
            return Some(editor);
        }
        self.comment_editor.as_mut()
    }

    /// Closes the topmost open editor. Returns `false` when none was open.
    /// The review draft survives the close; comment drafts do not.
    pub fn close_editor(&mut self) -> bool {
        if let Some(editor) = self.review_editor.take() {
            self.review_draft = editor.text().to_owned();
            self.review_error = None;
            return true;
        }
        if self.reply_editor.take().is_some() || self.comment_editor.take().is_some() {
            self.composer_error = None;
            return true;
        }
        false
    }

    pub fn comment_sent(&mut self) {
        self.comment_in_flight = false;
        self.comment_editor = None;
        self.reply_editor = None;
        self.composer_error = None;
    }

    pub fn comment_failed(&mut self, message: String) {
        self.comment_in_flight = false;
        self.composer_error = Some(message);
    }

    /// Typed-but-unsent text in any editor; quitting warns about this.
    pub fn has_unsaved_input(&self) -> bool {
        self.comment_editor.as_ref().is_some_and(|e| !e.is_blank())
            || self.reply_editor.as_ref().is_some_and(|(_, e)| !e.is_blank())
            || self.review_editor.as_ref().is_some_and(|e| !e.is_blank())
            || !self.review_draft.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use reqwest::StatusCode;
    use revu_core::types::{
        FileNode, FileNodeKind, RevieweeProfile, ReviewerProfile, SubmissionStatus, UserRef,
    };
    use revu_core::ApiError;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 10, 30, 0).unwrap()
    }

    fn user_ref(id: i64, name: &str) -> UserRef {
        UserRef { id, name: name.to_owned(), email: None }
    }

    fn submission(id: i64) -> Submission {
        Submission {
            id,
            git_url: "https://github.com/octo/widgets.git".to_owned(),
            branch: "main".to_owned(),
            request_details: "look at the parser".to_owned(),
            status: SubmissionStatus::Pending,
            reviewee: RevieweeProfile {
                id: 7,
                preferences: None,
                user: user_ref(70, "Mina"),
                created_at: ts(),
                updated_at: ts(),
            },
            reviewer: ReviewerProfile {
                id: 3,
                preferences: None,
                bio: None,
                tags: None,
                user: user_ref(30, "Ravi"),
                created_at: ts(),
                updated_at: ts(),
            },
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn file_node(name: &str, path: &str) -> FileNode {
        FileNode {
            name: name.to_owned(),
            path: path.to_owned(),
            kind: FileNodeKind::File,
            size: Some(120),
            last_modified: None,
            children: None,
        }
    }

    fn project_fs() -> ProjectFileSystem {
        ProjectFileSystem {
            submission_id: 42,
            branch: "main".to_owned(),
            root_directory: FileNode {
                name: "widgets".to_owned(),
                path: "widgets".to_owned(),
                kind: FileNodeKind::Directory,
                size: None,
                last_modified: None,
                children: Some(vec![file_node("main.py", "widgets/main.py")]),
            },
            total_files: 1,
            total_size: 120,
        }
    }

    fn content(path: &str, text: &str) -> FileContent {
        FileContent {
            path: path.to_owned(),
            content: text.to_owned(),
            encoding: "utf-8".to_owned(),
            size: text.len() as u64,
            last_modified: None,
            line_count: None,
        }
    }

    fn comment(id: &str, path: Option<&str>, line: Option<u32>) -> Comment {
        Comment {
            id: id.to_owned(),
            submission_id: 42,
            content: format!("body of {id}"),
            file_path: path.map(str::to_owned),
            line_number: line,
            author: user_ref(30, "Ravi"),
            parent_comment_id: None,
            replies: Vec::new(),
            is_edited: false,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn page(content: Vec<Comment>) -> Page<Comment> {
        Page {
            total_pages: 1,
            total_elements: content.len() as u64,
            page: 0,
            size: 100,
            first: true,
            last: true,
            number_of_elements: content.len() as u32,
            content,
        }
    }

    fn boom() -> ApiError {
        ApiError::Status { status: StatusCode::INTERNAL_SERVER_ERROR, message: "exploded".to_owned() }
    }

    fn ready_session_with_file(text: &str) -> ReviewSession {
        let mut session = ReviewSession::new(42);
        session.apply_submission(Ok(submission(42)));
        session.apply_file_system(Ok(project_fs()));
        session.apply_general(0, Ok(page(vec![])));
        session.select_file("widgets/main.py".to_owned(), 1, 2);
        assert!(session.apply_file_content("widgets/main.py".to_owned(), 1, Ok(content("widgets/main.py", text))));
        session
    }

    #[test]
    fn bootstrap_walks_loading_phases_to_ready() {
        let mut session = ReviewSession::new(42);
        assert_eq!(session.phase, SessionPhase::LoadingSubmission);

        session.apply_submission(Ok(submission(42)));
        assert_eq!(
            session.phase,
            SessionPhase::LoadingFileSystem { tree_done: false, general_done: false }
        );

        session.apply_file_system(Ok(project_fs()));
        assert_eq!(
            session.phase,
            SessionPhase::LoadingFileSystem { tree_done: true, general_done: false }
        );

        session.apply_general(0, Ok(page(vec![comment("g1", None, None)])));
        assert_eq!(session.phase, SessionPhase::Ready);
        assert_eq!(session.general.len(), 1);
        assert_eq!(session.total_files, 1);
    }

    #[test]
    fn bootstrap_failures_fail_the_session() {
        let mut session = ReviewSession::new(42);
        session.apply_submission(Err(boom()));
        assert!(matches!(&session.phase, SessionPhase::Failed(msg) if msg.contains("exploded")));

        let mut session = ReviewSession::new(42);
        session.apply_submission(Ok(submission(42)));
        session.apply_general(0, Err(boom()));
        assert!(matches!(session.phase, SessionPhase::Failed(_)));
    }

    #[test]
    fn general_refresh_failure_after_ready_stays_ready() {
        let mut session = ready_session_with_file("x\n");
        session.general_seq = 5;
        let surfaced = session.apply_general(5, Err(boom()));
        assert_eq!(session.phase, SessionPhase::Ready);
        assert!(surfaced.is_some());
        assert!(session.general_error.is_some());
    }

    #[test]
    fn file_open_splits_lines_and_keeps_trailing_empty() {
        let session = ready_session_with_file("a\nb\n");
        let file = session.open_file().unwrap();
        assert_eq!(file.lines, ["a", "b", ""]);
        assert_eq!(file.language, "python");
    }

    #[test]
    fn stale_file_content_is_discarded() {
        let mut session = ready_session_with_file("old\n");
        session.select_file("widgets/main.py".to_owned(), 7, 8);
        assert!(!session.apply_file_content("widgets/main.py".to_owned(), 1, Ok(content("widgets/main.py", "stale"))));
        assert!(matches!(session.file, FileView::Loading { .. }));

        assert!(session.apply_file_content("widgets/main.py".to_owned(), 7, Ok(content("widgets/main.py", "fresh"))));
        assert_eq!(session.open_file().unwrap().lines, ["fresh"]);
    }

    #[test]
    fn stale_file_comments_are_discarded() {
        let mut session = ready_session_with_file("x\n");
        session.comments_seq = 9;
        session.apply_file_comments(3, Ok(page(vec![comment("c1", Some("widgets/main.py"), Some(1))])));
        assert!(session.file_comments.is_empty());

        session.apply_file_comments(9, Ok(page(vec![comment("c1", Some("widgets/main.py"), Some(1))])));
        assert_eq!(session.file_comments.len(), 1);
    }

    #[test]
    fn file_load_failure_keeps_the_session_ready() {
        let mut session = ready_session_with_file("x\n");
        session.select_file("widgets/main.py".to_owned(), 7, 8);
        session.apply_file_content("widgets/main.py".to_owned(), 7, Err(boom()));
        assert!(matches!(&session.file, FileView::Failed { error, .. } if error.contains("exploded")));
        assert_eq!(session.phase, SessionPhase::Ready);
    }

    #[test]
    fn active_line_toggles_on_the_cursor_line() {
        let mut session = ready_session_with_file("a\nb\nc\n");
        session.toggle_active_line();
        assert_eq!(session.active_line, Some(1));
        session.toggle_active_line();
        assert_eq!(session.active_line, None, "same line toggles off");

        session.cursor_down(2, 10);
        session.toggle_active_line();
        assert_eq!(session.active_line, Some(3));
        session.cursor_up(1, 10);
        session.toggle_active_line();
        assert_eq!(session.active_line, Some(2), "different line moves the anchor");
    }

    #[test]
    fn scope_tracks_file_line_and_pin() {
        let mut session = ReviewSession::new(42);
        session.apply_submission(Ok(submission(42)));
        session.apply_file_system(Ok(project_fs()));
        session.apply_general(0, Ok(page(vec![])));
        assert_eq!(session.scope(), CommentScope::General, "no file open");

        session.select_file("widgets/main.py".to_owned(), 1, 2);
        assert_eq!(session.scope(), CommentScope::General, "still loading");

        session.apply_file_content("widgets/main.py".to_owned(), 1, Ok(content("widgets/main.py", "a\nb")));
        assert_eq!(session.scope(), CommentScope::File("widgets/main.py".to_owned()));

        session.toggle_active_line();
        assert_eq!(session.scope(), CommentScope::Line("widgets/main.py".to_owned(), 1));

        session.toggle_pin_general();
        assert_eq!(session.scope(), CommentScope::General);
        session.toggle_pin_general();
        assert_eq!(session.scope(), CommentScope::Line("widgets/main.py".to_owned(), 1));
    }

    #[test]
    fn highlight_applies_only_to_the_matching_snapshot() {
        let mut session = ready_session_with_file("a\nb");
        let lines = |n: usize| (0..n).map(|_| Line::raw("x")).collect::<Vec<_>>();

        session.apply_highlight(HighlightResult {
            path: "widgets/main.py".to_owned(),
            seq: 99,
            lines: lines(2),
        });
        assert!(session.open_file().unwrap().highlighted.is_none(), "stale tag ignored");

        session.apply_highlight(HighlightResult {
            path: "widgets/other.py".to_owned(),
            seq: 1,
            lines: lines(2),
        });
        assert!(session.open_file().unwrap().highlighted.is_none(), "other file ignored");

        session.apply_highlight(HighlightResult {
            path: "widgets/main.py".to_owned(),
            seq: 1,
            lines: lines(3),
        });
        assert!(session.open_file().unwrap().highlighted.is_none(), "length mismatch ignored");

        session.apply_highlight(HighlightResult {
            path: "widgets/main.py".to_owned(),
            seq: 1,
            lines: lines(2),
        });
        assert!(session.open_file().unwrap().highlighted.is_some());
    }

    #[test]
    fn cursor_movement_drags_the_viewport() {
        let text = (1..=20).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let mut session = ready_session_with_file(&text);

        session.cursor_down(9, 5);
        assert_eq!(session.cursor_line, 9);
        assert_eq!(session.code_scroll, 5, "scroll keeps the cursor on the last row");

        session.cursor_up(9, 5);
        assert_eq!(session.code_scroll, 0);

        session.cursor_bottom(5);
        assert_eq!(session.cursor_line, 19);
        assert_eq!(session.code_scroll, 15);

        session.cursor_down(50, 5);
        assert_eq!(session.cursor_line, 19, "clamped at the last line");
    }

    #[test]
    fn composers_are_exclusive_and_guarded_in_flight() {
        let mut session = ready_session_with_file("a\n");
        session.comments_seq = 2;
        session.apply_file_comments(2, Ok(page(vec![comment("c1", Some("widgets/main.py"), None)])));

        assert!(session.begin_comment());
        assert!(session.begin_reply(), "reply replaces the comment composer");
        assert!(session.comment_editor.is_none());
        assert!(session.reply_editor.is_some());

        session.comment_in_flight = true;
        assert!(!session.begin_comment());

        session.comment_failed("too long".to_owned());
        assert!(!session.comment_in_flight);
        assert!(session.reply_editor.is_some(), "draft survives a failed send");

        session.comment_sent();
        assert!(session.reply_editor.is_none());
        assert!(session.composer_error.is_none());
    }

    #[test]
    fn unsaved_input_only_counts_real_text() {
        let mut session = ready_session_with_file("a\n");
        assert!(!session.has_unsaved_input());
        session.begin_comment();
        assert!(!session.has_unsaved_input(), "an empty composer is not unsaved work");
        if let Some(editor) = session.active_editor_mut() {
            editor.insert('h');
        }
        assert!(session.has_unsaved_input());
        session.close_editor();
        assert!(!session.has_unsaved_input());
    }

    #[test]
    fn review_draft_survives_closing_the_modal() {
        let mut session = ready_session_with_file("a\n");
        assert!(session.begin_review());
        if let Some(editor) = session.active_editor_mut() {
            for ch in "solid work".chars() {
                editor.insert(ch);
            }
        }
        session.close_editor();
        assert!(session.review_editor.is_none());
        assert!(session.has_unsaved_input(), "the draft still counts as unsaved");

        session.begin_review();
        let text = session.review_editor.as_ref().map(|e| e.text().to_owned());
        assert_eq!(text.as_deref(), Some("solid work"));
    }
}
