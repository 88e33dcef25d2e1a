//! Application state: which screen is up, who is signed in, the forms, and
//! the open review session.
//!
//! All mutation funnels through two entry points. Key and mouse handlers
//! (`keybindings`) mutate state synchronously; network results arrive as
//! [`NetResult`] values and are applied in [`AppState::handle_net`], which
//! also decides the follow-up fetches (highlighting a loaded file,
//! re-fetching a comment scope after a post, reloading the session after a
//! review is published). Nothing here blocks; every backend call is a
//! spawned task reporting back through the event channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use revu_core::api::ApiClient;
use revu_core::auth;
use revu_core::comments::CommentScope;
use revu_core::types::{
    BranchList, GitBranch, NewComment, NewSubmission, Page, Review, ReviewerProfile, User,
};
use tracing::warn;

use crate::editor::EditorState;
use crate::highlight::HighlightResult;
use crate::net::{self, NetResult, Tx};
use crate::review::{FileView, ReviewSession, SessionPhase};

/// How long a status-bar message stays up.
const STATUS_TTL: Duration = Duration::from_secs(4);
/// Idle time after the last git URL keystroke before branches are fetched.
const BRANCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Input mode, shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// An editor owns the keyboard.
    Insert,
    Help,
    ConfirmQuit,
    Profile,
}

/// Which top-level screen is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Reviews,
    NewRequest,
    Review,
}

/// Focused panel on the review screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Files,
    Code,
    Comments,
}

impl PanelFocus {
    pub fn next(self) -> Self {
        match self {
            PanelFocus::Files => PanelFocus::Code,
            PanelFocus::Code => PanelFocus::Comments,
            PanelFocus::Comments => PanelFocus::Files,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Files => PanelFocus::Comments,
            PanelFocus::Code => PanelFocus::Files,
            PanelFocus::Comments => PanelFocus::Code,
        }
    }
}

/// Where the signed-in user stands.
#[derive(Debug)]
pub enum AuthContext {
    /// A stored token is being validated against `/users/me`.
    Loading,
    SignedOut,
    Ready(User),
}

/// What a pending confirmation would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Quit,
    LeaveReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug)]
pub struct LoginForm {
    pub email: EditorState,
    pub password: EditorState,
    pub field: LoginField,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: EditorState::single_line(),
            password: EditorState::masked(),
            field: LoginField::Email,
            error: None,
            in_flight: false,
        }
    }
}

impl LoginForm {
    pub fn active_editor_mut(&mut self) -> &mut EditorState {
        match self.field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn switch_field(&mut self) {
        self.field = match self.field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

/// The paged review-request listing.
#[derive(Debug, Default)]
pub struct ReviewsList {
    pub list: ListState,
    pub page: Option<Page<Review>>,
    pub page_index: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub seq: u64,
}

impl ReviewsList {
    pub fn selected_review(&self) -> Option<&Review> {
        let page = self.page.as_ref()?;
        page.content.get(self.list.selected()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    GitUrl,
    Branch,
    Reviewer,
    Details,
}

impl RequestField {
    pub fn next(self) -> Self {
        match self {
            RequestField::GitUrl => RequestField::Branch,
            RequestField::Branch => RequestField::Reviewer,
            RequestField::Reviewer => RequestField::Details,
            RequestField::Details => RequestField::GitUrl,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            RequestField::GitUrl => RequestField::Details,
            RequestField::Branch => RequestField::GitUrl,
            RequestField::Reviewer => RequestField::Branch,
            RequestField::Details => RequestField::Reviewer,
        }
    }
}

/// Branch picker state for the request form.
#[derive(Debug)]
pub enum BranchChoices {
    NotAsked,
    Loading,
    Loaded(BranchList),
    Failed(String),
}

/// Draft of a new review request. Survives leaving the screen, so a half
/// written request is still there when the user comes back.
#[derive(Debug)]
pub struct RequestForm {
    pub git_url: EditorState,
    pub details: EditorState,
    pub field: RequestField,
    pub branches: BranchChoices,
    pub branch_index: usize,
    pub branch_seq: u64,
    pub reviewers: Option<Page<ReviewerProfile>>,
    pub reviewers_error: Option<String>,
    pub reviewer_index: usize,
    pub reviewers_seq: u64,
    /// Set on every git URL keystroke; drives the debounced branch fetch.
    pub url_edited_at: Option<Instant>,
    /// URL the current `branches` belong to, so retyping the same URL does
    /// not refetch.
    pub fetched_url: Option<String>,
    pub error: Option<String>,
    pub in_flight: bool,
}

impl Default for RequestForm {
    fn default() -> Self {
        Self {
            git_url: EditorState::single_line(),
            details: EditorState::multiline(),
            field: RequestField::GitUrl,
            branches: BranchChoices::NotAsked,
            branch_index: 0,
            branch_seq: 0,
            reviewers: None,
            reviewers_error: None,
            reviewer_index: 0,
            reviewers_seq: 0,
            url_edited_at: None,
            fetched_url: None,
            error: None,
            in_flight: false,
        }
    }
}

impl RequestForm {
    pub fn branch_names(&self) -> &[GitBranch] {
        match &self.branches {
            BranchChoices::Loaded(list) => &list.branches,
            _ => &[],
        }
    }

    pub fn selected_branch(&self) -> Option<&str> {
        self.branch_names().get(self.branch_index).map(|b| b.name.as_str())
    }

    pub fn selected_reviewer(&self) -> Option<&ReviewerProfile> {
        self.reviewers.as_ref()?.content.get(self.reviewer_index)
    }

    pub fn cycle_branch(&mut self, forward: bool) {
        let count = self.branch_names().len();
        if count == 0 {
            return;
        }
        self.branch_index = if forward {
            (self.branch_index + 1) % count
        } else {
            (self.branch_index + count - 1) % count
        };
    }

    pub fn cycle_reviewer(&mut self, forward: bool) {
        let count = self.reviewers.as_ref().map(|p| p.content.len()).unwrap_or(0);
        if count == 0 {
            return;
        }
        self.reviewer_index = if forward {
            (self.reviewer_index + 1) % count
        } else {
            (self.reviewer_index + count - 1) % count
        };
    }

    /// Marks the git URL as edited; the tick handler fetches branches once
    /// typing pauses.
    pub fn note_url_edited(&mut self) {
        self.url_edited_at = Some(Instant::now());
        self.error = None;
    }
}

/// Whether a repository URL points at one of the providers the platform can
/// clone from. The path after the host must be non-empty.
pub fn provider_allowed(url: &str) -> bool {
    let Some(rest) = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) else {
        return false;
    };
    for host in ["github.com/", "gitlab.com/", "bitbucket.org/"] {
        if let Some(path) = rest.strip_prefix(host) {
            return !path.trim_end_matches('/').is_empty();
        }
    }
    false
}

pub struct AppState {
    pub mode: Mode,
    pub screen: Screen,
    pub focus: PanelFocus,
    pub auth: AuthContext,
    pub api: Arc<ApiClient>,
    pub tx: Tx,
    pub auth_path: PathBuf,
    /// Submission id from the command line, opened once auth resolves.
    pub pending_open: Option<i64>,
    pub confirm: Option<ConfirmAction>,

    pub login: LoginForm,
    pub reviews: ReviewsList,
    pub request_form: Option<RequestForm>,
    pub session: Option<ReviewSession>,

    pub status: Option<(String, Instant)>,
    pub help_scroll: u16,

    /// Screen rectangles of the three review panels, captured during render
    /// for click-to-focus hit testing.
    pub panel_rects: [Rect; 3],
    /// Inner heights captured during render, for page-sized cursor moves.
    pub tree_viewport: u16,
    pub code_viewport: u16,
    pub comments_viewport: u16,
    pub reviews_viewport: u16,

    next_seq: u64,
}

impl AppState {
    pub fn new(api: Arc<ApiClient>, tx: Tx, auth_path: PathBuf, pending_open: Option<i64>) -> Self {
        Self {
            mode: Mode::Normal,
            screen: Screen::Login,
            focus: PanelFocus::Files,
            auth: AuthContext::SignedOut,
            api,
            tx,
            auth_path,
            pending_open,
            confirm: None,
            login: LoginForm::default(),
            reviews: ReviewsList::default(),
            request_form: None,
            session: None,
            status: None,
            help_scroll: 0,
            panel_rects: [Rect::default(); 3],
            tree_viewport: 0,
            code_viewport: 0,
            comments_viewport: 0,
            reviews_viewport: 0,
            next_seq: 0,
        }
    }

    /// Kicks off the very first fetch: validate a stored token if there is
    /// one, otherwise go straight to the sign-in screen.
    pub fn start(&mut self) {
        if self.api.has_token() {
            self.auth = AuthContext::Loading;
            net::spawn_resolve_session(self.api.clone(), self.tx.clone());
        } else {
            self.auth = AuthContext::SignedOut;
            self.screen = Screen::Login;
        }
    }

    pub fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn signed_in_user(&self) -> Option<&User> {
        match &self.auth {
            AuthContext::Ready(user) => Some(user),
            _ => None,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), Instant::now()));
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_ref().map(|(message, _)| message.as_str())
    }

    pub fn on_tick(&mut self) {
        if let Some((_, since)) = &self.status {
            if since.elapsed() >= STATUS_TTL {
                self.status = None;
            }
        }
        self.maybe_fetch_branches();
    }

    // --- navigation ----------------------------------------------------

    fn continue_after_auth(&mut self) {
        match self.pending_open.take() {
            Some(id) => self.open_review(id),
            None => {
                self.screen = Screen::Reviews;
                self.fetch_reviews(0);
            }
        }
    }

    pub fn open_review(&mut self, id: i64) {
        self.screen = Screen::Review;
        self.focus = PanelFocus::Files;
        self.mode = Mode::Normal;
        self.session = Some(ReviewSession::new(id));
        net::spawn_submission(self.api.clone(), self.tx.clone(), id);
    }

    pub fn open_selected_review(&mut self) {
        if let Some(id) = self.reviews.selected_review().map(|r| r.submission.id) {
            self.open_review(id);
        }
    }

    /// Drops the open session and returns to the listing, refreshing it so
    /// a just-published review shows its new status.
    pub fn leave_review(&mut self) {
        self.session = None;
        self.screen = Screen::Reviews;
        self.mode = Mode::Normal;
        self.fetch_reviews(self.reviews.page_index);
    }

    pub fn open_new_request(&mut self) {
        self.screen = Screen::NewRequest;
        self.mode = Mode::Normal;
        if self.request_form.is_none() {
            self.request_form = Some(RequestForm::default());
            let seq = self.next_seq();
            if let Some(form) = self.request_form.as_mut() {
                form.reviewers_seq = seq;
            }
            net::spawn_reviewers(self.api.clone(), self.tx.clone(), seq);
        }
    }

    pub fn close_request_form(&mut self) {
        // The draft stays; only the screen changes.
        self.screen = Screen::Reviews;
        self.mode = Mode::Normal;
    }

    // --- quit / leave guards --------------------------------------------

    pub fn has_unsaved_input(&self) -> bool {
        match self.screen {
            Screen::Review => self.session.as_ref().is_some_and(ReviewSession::has_unsaved_input),
            Screen::NewRequest => self
                .request_form
                .as_ref()
                .is_some_and(|f| !f.git_url.is_blank() || !f.details.is_blank()),
            _ => false,
        }
    }

    /// Returns `true` when quitting may proceed immediately; otherwise arms
    /// the confirmation overlay.
    pub fn request_quit(&mut self) -> bool {
        if self.has_unsaved_input() {
            self.mode = Mode::ConfirmQuit;
            self.confirm = Some(ConfirmAction::Quit);
            false
        } else {
            true
        }
    }

    /// Leaves the review screen, via the confirmation overlay when a draft
    /// would be lost.
    pub fn request_leave_review(&mut self) {
        if self.has_unsaved_input() {
            self.mode = Mode::ConfirmQuit;
            self.confirm = Some(ConfirmAction::LeaveReview);
        } else {
            self.leave_review();
        }
    }

    /// Dismisses the confirmation overlay, dropping back into the composer
    /// when the confirmation interrupted one.
    pub fn cancel_confirm(&mut self) {
        self.confirm = None;
        self.mode = if self.session.as_ref().is_some_and(ReviewSession::has_open_editor) {
            Mode::Insert
        } else {
            Mode::Normal
        };
    }

    // --- auth ----------------------------------------------------------

    pub fn submit_login(&mut self) {
        if self.login.in_flight {
            return;
        }
        let email = self.login.email.text().trim().to_owned();
        let password = self.login.password.text().to_owned();
        if email.is_empty() || password.is_empty() {
            self.login.error = Some("Email and password are both required".to_owned());
            return;
        }
        self.login.in_flight = true;
        self.login.error = None;
        net::spawn_sign_in(
            self.api.clone(),
            self.tx.clone(),
            self.auth_path.clone(),
            email,
            password,
        );
    }

    /// Signs out on the backend and forgets everything locally right away.
    /// The backend call failing later changes nothing here.
    pub fn sign_out(&mut self) {
        net::spawn_sign_out(self.api.clone(), self.tx.clone());
        self.forget_session_locally(None);
        self.set_status("Signed out");
    }

    fn forget_session_locally(&mut self, login_error: Option<String>) {
        if let Err(err) = auth::clear(&self.auth_path) {
            warn!(error = %err, "failed to remove stored tokens");
        }
        self.session = None;
        self.request_form = None;
        self.reviews = ReviewsList::default();
        self.auth = AuthContext::SignedOut;
        self.screen = Screen::Login;
        self.mode = Mode::Normal;
        self.focus = PanelFocus::Files;
        self.confirm = None;
        self.login = LoginForm::default();
        self.login.error = login_error;
    }

    fn handle_unauthorized(&mut self) {
        self.api.set_token(None);
        self.forget_session_locally(Some("Your session expired. Sign in again.".to_owned()));
    }

    /// True (and state already reset to the sign-in screen) when `result`
    /// failed because the credentials are no longer good.
    fn expired<T>(&mut self, result: &revu_core::Result<T>) -> bool {
        if let Err(err) = result {
            if err.is_unauthorized() {
                self.handle_unauthorized();
                return true;
            }
        }
        false
    }

    // --- reviews listing -----------------------------------------------

    pub fn fetch_reviews(&mut self, page: u32) {
        let seq = self.next_seq();
        self.reviews.seq = seq;
        self.reviews.loading = true;
        self.reviews.error = None;
        self.reviews.page_index = page;
        net::spawn_reviews(self.api.clone(), self.tx.clone(), page, seq);
    }

    pub fn reviews_next_page(&mut self) {
        if let Some(page) = &self.reviews.page {
            if !page.last {
                let next = self.reviews.page_index + 1;
                self.fetch_reviews(next);
            }
        }
    }

    pub fn reviews_prev_page(&mut self) {
        if let Some(page) = &self.reviews.page {
            if !page.first {
                let prev = self.reviews.page_index.saturating_sub(1);
                self.fetch_reviews(prev);
            }
        }
    }

    // --- request form ---------------------------------------------------

    fn maybe_fetch_branches(&mut self) {
        if self.screen != Screen::NewRequest {
            return;
        }
        let url = match self.request_form.as_mut() {
            Some(form) => {
                let Some(edited_at) = form.url_edited_at else { return };
                if edited_at.elapsed() < BRANCH_DEBOUNCE {
                    return;
                }
                form.url_edited_at = None;
                let url = form.git_url.text().trim().to_owned();
                if !provider_allowed(&url) {
                    form.branches = BranchChoices::NotAsked;
                    form.fetched_url = None;
                    return;
                }
                if form.fetched_url.as_deref() == Some(url.as_str()) {
                    return;
                }
                url
            }
            None => return,
        };
        let seq = self.next_seq();
        if let Some(form) = self.request_form.as_mut() {
            form.branches = BranchChoices::Loading;
            form.fetched_url = Some(url.clone());
            form.branch_seq = seq;
            form.branch_index = 0;
        }
        net::spawn_branches(self.api.clone(), self.tx.clone(), url, seq);
    }

    pub fn submit_request_form(&mut self) {
        let request = {
            let Some(form) = self.request_form.as_mut() else { return };
            if form.in_flight {
                return;
            }
            let url = form.git_url.text().trim().to_owned();
            if !provider_allowed(&url) {
                form.error =
                    Some("Repository must be on github.com, gitlab.com, or bitbucket.org".to_owned());
                return;
            }
            let Some(branch) = form.selected_branch().map(str::to_owned) else {
                form.error = Some("Pick a branch first".to_owned());
                return;
            };
            let Some(reviewer_id) = form.selected_reviewer().map(|r| r.id) else {
                form.error = Some("Pick a reviewer first".to_owned());
                return;
            };
            if form.details.is_blank() {
                form.error = Some("Describe what you want reviewed".to_owned());
                return;
            }
            form.in_flight = true;
            form.error = None;
            NewSubmission {
                reviewer_id,
                git_url: url,
                branch,
                request_details: form.details.text().trim().to_owned(),
            }
        };
        net::spawn_create_submission(self.api.clone(), self.tx.clone(), request);
    }

    // --- review session ------------------------------------------------

    /// Opens `path` in the code panel and fetches its content and comments
    /// under fresh sequence tags. Re-selecting the open file refreshes it.
    pub fn select_file(&mut self, path: String) {
        let Some(id) = self.session.as_ref().map(|s| s.submission_id) else { return };
        let file_seq = self.next_seq();
        let comments_seq = self.next_seq();
        if let Some(session) = self.session.as_mut() {
            session.select_file(path.clone(), file_seq, comments_seq);
        }
        net::spawn_file_content(self.api.clone(), self.tx.clone(), id, path.clone(), file_seq);
        net::spawn_file_comments(self.api.clone(), self.tx.clone(), id, path, comments_seq);
    }

    /// Enter on a tree row: directories toggle, files open.
    pub fn activate_tree_row(&mut self) {
        let path = {
            let Some(session) = self.session.as_mut() else { return };
            let rows = session.tree.visible_rows();
            let Some(selected) = session.tree_list.selected() else { return };
            let Some(&index) = rows.get(selected) else { return };
            let (is_dir, path) = {
                let node = session.tree.node(index);
                (node.is_dir(), node.path.clone())
            };
            if is_dir {
                session.tree.toggle(index);
                return;
            }
            path
        };
        self.select_file(path);
    }

    /// Left on a tree row: close an open directory, otherwise jump to the
    /// parent.
    pub fn collapse_tree_row(&mut self) {
        let Some(session) = self.session.as_mut() else { return };
        let rows = session.tree.visible_rows();
        let Some(selected) = session.tree_list.selected() else { return };
        let Some(&index) = rows.get(selected) else { return };
        let (close_here, parent) = {
            let node = session.tree.node(index);
            let close_here = node.is_dir() && session.tree.is_expanded(&node.path);
            let parent = node.path.rsplit_once('/').map(|(p, _)| p.to_owned());
            (close_here, parent)
        };
        if close_here {
            session.tree.collapse(index);
            return;
        }
        if let Some(parent) = parent {
            if let Some(parent_index) = session.tree.index_of(&parent) {
                if let Some(row) = rows.iter().position(|&i| i == parent_index) {
                    session.tree_list.select(Some(row));
                }
            }
        }
    }

    pub fn retry_session(&mut self) {
        if let Some(session) = &self.session {
            if matches!(session.phase, SessionPhase::Failed(_)) {
                let id = session.submission_id;
                self.open_review(id);
            }
        }
    }

    pub fn retry_file(&mut self) {
        let path = match self.session.as_ref().map(|s| &s.file) {
            Some(FileView::Failed { path, .. }) => path.clone(),
            _ => return,
        };
        self.select_file(path);
    }

    // --- composers -----------------------------------------------------

    /// Ctrl-s in a composer. Blank input never reaches the network; a send
    /// already in flight is left alone.
    pub fn submit_comment(&mut self) {
        enum Job {
            Comment(NewComment),
            Reply(String, String),
        }
        let job = {
            let Some(session) = self.session.as_mut() else { return };
            if session.comment_in_flight {
                return;
            }
            if let Some((parent, editor)) = &session.reply_editor {
                if editor.is_blank() {
                    session.composer_error = Some("Write something first".to_owned());
                    return;
                }
                Job::Reply(parent.clone(), editor.text().trim().to_owned())
            } else if let Some(editor) = &session.comment_editor {
                if editor.is_blank() {
                    session.composer_error = Some("Write something first".to_owned());
                    return;
                }
                let (file_path, line_number) = match session.scope() {
                    CommentScope::General => (None, None),
                    CommentScope::File(path) => (Some(path), None),
                    CommentScope::Line(path, line) => (Some(path), Some(line)),
                };
                Job::Comment(NewComment {
                    content: editor.text().trim().to_owned(),
                    file_path,
                    line_number,
                    parent_comment_id: None,
                })
            } else {
                return;
            }
        };
        let Some(id) = self.session.as_ref().map(|s| s.submission_id) else { return };
        if let Some(session) = self.session.as_mut() {
            session.comment_in_flight = true;
            session.composer_error = None;
        }
        match job {
            Job::Comment(comment) => {
                net::spawn_create_comment(self.api.clone(), self.tx.clone(), id, comment);
            }
            Job::Reply(parent, content) => {
                net::spawn_create_reply(self.api.clone(), self.tx.clone(), id, parent, content);
            }
        }
    }

    pub fn submit_review(&mut self) {
        let content = {
            let Some(session) = self.session.as_mut() else { return };
            if session.saving_review {
                return;
            }
            let Some(editor) = &session.review_editor else { return };
            if editor.is_blank() {
                session.review_error = Some("Write the review before publishing".to_owned());
                return;
            }
            session.saving_review = true;
            session.review_error = None;
            editor.text().trim().to_owned()
        };
        let Some(id) = self.session.as_ref().map(|s| s.submission_id) else { return };
        net::spawn_save_review(self.api.clone(), self.tx.clone(), id, content);
    }

    /// Returns to Normal mode unless another composer is still open. A send
    /// finishing must not yank the keyboard away from, say, the review modal
    /// the user opened while the comment was in flight.
    fn leave_insert_if_idle(&mut self) {
        if !self.session.as_ref().is_some_and(ReviewSession::has_open_editor) {
            self.mode = Mode::Normal;
        }
    }

    /// Re-fetches the store a freshly created comment belongs to. The
    /// listing that comes back is the server's truth; nothing is spliced in
    /// locally.
    fn refetch_scope(&mut self, scope: &CommentScope) {
        let Some(id) = self.session.as_ref().map(|s| s.submission_id) else { return };
        match scope {
            CommentScope::General => {
                let seq = self.next_seq();
                if let Some(session) = self.session.as_mut() {
                    session.general_seq = seq;
                }
                net::spawn_general_comments(self.api.clone(), self.tx.clone(), id, seq);
            }
            CommentScope::File(path) | CommentScope::Line(path, _) => {
                let open = self.session.as_ref().and_then(|s| s.open_path().map(str::to_owned));
                if open.as_deref() != Some(path.as_str()) {
                    return;
                }
                let seq = self.next_seq();
                if let Some(session) = self.session.as_mut() {
                    session.comments_seq = seq;
                }
                net::spawn_file_comments(self.api.clone(), self.tx.clone(), id, path.clone(), seq);
            }
        }
    }

    /// Once a session reaches `Ready`, re-opens the file a reload displaced.
    fn maybe_finish_bootstrap(&mut self) {
        let pending = match self.session.as_mut() {
            Some(session) if session.phase == SessionPhase::Ready => session.pending_reselect.take(),
            _ => return,
        };
        let Some(path) = pending else { return };
        let row = self.session.as_mut().and_then(|session| {
            let index = session.tree.reveal(&path)?;
            session.tree.visible_rows().iter().position(|&i| i == index)
        });
        if let Some(row) = row {
            if let Some(session) = self.session.as_mut() {
                session.tree_list.select(Some(row));
            }
            self.select_file(path);
        }
    }

    // --- network results -----------------------------------------------

    pub fn handle_net(&mut self, result: NetResult) {
        match result {
            NetResult::Session(result) => match result {
                Ok(user) => {
                    self.auth = AuthContext::Ready(user);
                    self.continue_after_auth();
                }
                Err(err) if err.is_unauthorized() => self.handle_unauthorized(),
                Err(err) => {
                    self.auth = AuthContext::SignedOut;
                    self.screen = Screen::Login;
                    self.login.error = Some(err.to_string());
                }
            },

            NetResult::SignIn(result) => {
                self.login.in_flight = false;
                match result {
                    Ok(user) => {
                        self.login = LoginForm::default();
                        self.auth = AuthContext::Ready(user);
                        self.continue_after_auth();
                    }
                    Err(err) => self.login.error = Some(err.to_string()),
                }
            }

            NetResult::SignOut(result) => {
                if let Err(err) = result {
                    // Already signed out locally; the backend just never
                    // heard about it.
                    warn!(error = %err, "sign-out request failed");
                }
            }

            NetResult::Reviews { page, seq, result } => {
                if seq != self.reviews.seq {
                    return;
                }
                if self.expired(&result) {
                    return;
                }
                self.reviews.loading = false;
                match result {
                    Ok(listing) => {
                        self.reviews.page_index = page;
                        self.reviews.error = None;
                        let len = listing.content.len();
                        self.reviews.page = Some(listing);
                        if len == 0 {
                            self.reviews.list.select(None);
                        } else {
                            let selected = self.reviews.list.selected().unwrap_or(0).min(len - 1);
                            self.reviews.list.select(Some(selected));
                        }
                    }
                    Err(err) => self.reviews.error = Some(err.to_string()),
                }
            }

            NetResult::Reviewers { seq, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(form) = self.request_form.as_mut() else { return };
                if seq != form.reviewers_seq {
                    return;
                }
                match result {
                    Ok(page) => {
                        form.reviewer_index = 0;
                        form.reviewers = Some(page);
                        form.reviewers_error = None;
                    }
                    Err(err) => form.reviewers_error = Some(err.to_string()),
                }
            }

            NetResult::Branches { git_url, seq, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(form) = self.request_form.as_mut() else { return };
                if seq != form.branch_seq || form.fetched_url.as_deref() != Some(git_url.as_str()) {
                    return;
                }
                match result {
                    Ok(list) => {
                        form.branch_index = list
                            .branches
                            .iter()
                            .position(|b| b.is_default || b.name == list.default_branch)
                            .unwrap_or(0);
                        form.branches = BranchChoices::Loaded(list);
                    }
                    Err(err) => form.branches = BranchChoices::Failed(err.to_string()),
                }
            }

            NetResult::SubmissionCreated(result) => {
                if self.expired(&result) {
                    return;
                }
                let Some(form) = self.request_form.as_mut() else { return };
                form.in_flight = false;
                match result {
                    Ok(submission) => {
                        self.request_form = None;
                        self.screen = Screen::Reviews;
                        self.set_status(format!("Review request #{} created", submission.id));
                        self.fetch_reviews(0);
                    }
                    Err(err) => form.error = Some(err.to_string()),
                }
            }

            NetResult::Submission { submission_id, result } => {
                match &self.session {
                    Some(session) if session.submission_id == submission_id => {}
                    _ => return,
                }
                if self.expired(&result) {
                    return;
                }
                match result {
                    Ok(submission) => {
                        let seq = self.next_seq();
                        if let Some(session) = self.session.as_mut() {
                            session.apply_submission(Ok(submission));
                            session.general_seq = seq;
                        }
                        net::spawn_file_system(self.api.clone(), self.tx.clone(), submission_id);
                        net::spawn_general_comments(
                            self.api.clone(),
                            self.tx.clone(),
                            submission_id,
                            seq,
                        );
                    }
                    Err(err) => {
                        if let Some(session) = self.session.as_mut() {
                            session.apply_submission(Err(err));
                        }
                    }
                }
            }

            NetResult::FileSystem { submission_id, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(session) = self.session.as_mut() else { return };
                if session.submission_id != submission_id {
                    return;
                }
                session.apply_file_system(result);
                self.maybe_finish_bootstrap();
            }

            NetResult::GeneralComments { submission_id, seq, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(session) = self.session.as_mut() else { return };
                if session.submission_id != submission_id {
                    return;
                }
                if let Some(message) = session.apply_general(seq, result) {
                    self.set_status(format!("Comments refresh failed: {message}"));
                }
                self.maybe_finish_bootstrap();
            }

            NetResult::FileLoaded { path, seq, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(session) = self.session.as_mut() else { return };
                if session.apply_file_content(path.clone(), seq, result) {
                    // Raw lines are showing already; highlights swap in when
                    // the background pass finishes.
                    if let Some(file) = session.open_file() {
                        crate::highlight::spawn_highlight(
                            self.tx.clone(),
                            path,
                            seq,
                            file.lines.join("\n"),
                        );
                    }
                }
            }

            NetResult::FileComments { path, seq, result } => {
                if self.expired(&result) {
                    return;
                }
                let Some(session) = self.session.as_mut() else { return };
                if session.open_path() != Some(path.as_str()) {
                    return;
                }
                session.apply_file_comments(seq, result);
            }

            NetResult::CommentCreated { submission_id, result } => {
                match &self.session {
                    Some(session) if session.submission_id == submission_id => {}
                    _ => return,
                }
                if self.expired(&result) {
                    return;
                }
                match result {
                    Ok(comment) => {
                        if let Some(session) = self.session.as_mut() {
                            session.comment_sent();
                        }
                        self.leave_insert_if_idle();
                        self.set_status("Comment posted");
                        self.refetch_scope(&CommentScope::of(&comment));
                    }
                    Err(err) => {
                        if let Some(session) = self.session.as_mut() {
                            session.comment_failed(err.to_string());
                        }
                    }
                }
            }

            NetResult::ReplyCreated { submission_id, parent_id, result } => {
                match &self.session {
                    Some(session) if session.submission_id == submission_id => {}
                    _ => return,
                }
                if self.expired(&result) {
                    return;
                }
                match result {
                    Ok(reply) => {
                        // The thread keeps the parent's scope; fall back to
                        // the reply's own fields if the parent is gone.
                        let scope = self
                            .session
                            .as_ref()
                            .and_then(|s| {
                                s.file_comments
                                    .get(&parent_id)
                                    .or_else(|| s.general.get(&parent_id))
                                    .map(CommentScope::of)
                            })
                            .unwrap_or_else(|| CommentScope::of(&reply));
                        if let Some(session) = self.session.as_mut() {
                            session.comment_sent();
                        }
                        self.leave_insert_if_idle();
                        self.set_status("Reply posted");
                        self.refetch_scope(&scope);
                    }
                    Err(err) => {
                        if let Some(session) = self.session.as_mut() {
                            session.comment_failed(err.to_string());
                        }
                    }
                }
            }

            NetResult::ReviewSaved { submission_id, result } => {
                match &self.session {
                    Some(session) if session.submission_id == submission_id => {}
                    _ => return,
                }
                if self.expired(&result) {
                    return;
                }
                match result {
                    Ok(review) => {
                        let Some(session) = self.session.as_ref() else { return };
                        let id = session.submission_id;
                        let reopen = session.open_path().map(str::to_owned);
                        self.mode = Mode::Normal;
                        self.set_status(format!(
                            "Review published for #{}",
                            review.submission.id
                        ));
                        // Full reload: statuses, comments, and the review
                        // text all changed server-side.
                        let mut fresh = ReviewSession::new(id);
                        fresh.pending_reselect = reopen;
                        self.session = Some(fresh);
                        net::spawn_submission(self.api.clone(), self.tx.clone(), id);
                    }
                    Err(err) => {
                        if let Some(session) = self.session.as_mut() {
                            session.saving_review = false;
                            session.review_error = Some(err.to_string());
                        }
                    }
                }
            }
        }
    }

    pub fn apply_highlight(&mut self, result: HighlightResult) {
        if let Some(session) = self.session.as_mut() {
            session.apply_highlight(result);
        }
    }

    // --- scrolling -----------------------------------------------------

    pub fn scroll_down(&mut self, n: usize) {
        match self.screen {
            Screen::Reviews => self.reviews.list.scroll_down_by(n as u16),
            Screen::Review => {
                let code_viewport = self.code_viewport as usize;
                let Some(session) = self.session.as_mut() else { return };
                match self.focus {
                    PanelFocus::Files => session.tree_list.scroll_down_by(n as u16),
                    PanelFocus::Code => session.cursor_down(n, code_viewport),
                    PanelFocus::Comments => {
                        for _ in 0..n {
                            session.thread_next();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        match self.screen {
            Screen::Reviews => self.reviews.list.scroll_up_by(n as u16),
            Screen::Review => {
                let code_viewport = self.code_viewport as usize;
                let Some(session) = self.session.as_mut() else { return };
                match self.focus {
                    PanelFocus::Files => session.tree_list.scroll_up_by(n as u16),
                    PanelFocus::Code => session.cursor_up(n, code_viewport),
                    PanelFocus::Comments => {
                        for _ in 0..n {
                            session.thread_prev();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn scroll_top(&mut self) {
        match self.screen {
            Screen::Reviews => self.reviews.list.select_first(),
            Screen::Review => {
                let code_viewport = self.code_viewport as usize;
                let Some(session) = self.session.as_mut() else { return };
                match self.focus {
                    PanelFocus::Files => session.tree_list.select_first(),
                    PanelFocus::Code => session.cursor_top(code_viewport),
                    PanelFocus::Comments => session.thread_first(),
                }
            }
            _ => {}
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.screen {
            Screen::Reviews => self.reviews.list.select_last(),
            Screen::Review => {
                let code_viewport = self.code_viewport as usize;
                let Some(session) = self.session.as_mut() else { return };
                match self.focus {
                    PanelFocus::Files => session.tree_list.select_last(),
                    PanelFocus::Code => session.cursor_bottom(code_viewport),
                    PanelFocus::Comments => session.thread_last(),
                }
            }
            _ => {}
        }
    }

    /// Half the focused panel's viewport, for Ctrl-d/Ctrl-u.
    pub fn half_page(&self) -> usize {
        (self.focused_viewport() / 2).max(1)
    }

    /// The focused panel's viewport, for Ctrl-f/Ctrl-b.
    pub fn full_page(&self) -> usize {
        self.focused_viewport().max(1)
    }

    fn focused_viewport(&self) -> usize {
        let height = match self.screen {
            Screen::Review => match self.focus {
                PanelFocus::Files => self.tree_viewport,
                PanelFocus::Code => self.code_viewport,
                PanelFocus::Comments => self.comments_viewport,
            },
            _ => self.reviews_viewport,
        };
        height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use reqwest::Url;
    use revu_core::types::{Comment, RevieweeProfile, Submission, SubmissionStatus, UserRef};
    use tokio::sync::mpsc;

    use crate::event::AppEvent;

    fn state() -> AppState {
        state_and_rx().0
    }

    fn state_and_rx() -> (AppState, mpsc::UnboundedReceiver<AppEvent>) {
        let api = Arc::new(ApiClient::new(Url::parse("http://localhost:8080/api").unwrap()));
        let (tx, rx) = mpsc::unbounded_channel();
        (AppState::new(api, tx, PathBuf::from("/tmp/revu-test-auth.json"), None), rx)
    }

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

    fn general_comment(id: &str, submission_id: i64) -> Comment {
        Comment {
            id: id.to_owned(),
            submission_id,
            content: "overall note".to_owned(),
            file_path: None,
            line_number: None,
            author: user_ref(30, "Ravi"),
            parent_comment_id: None,
            replies: Vec::new(),
            is_edited: false,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    /// State on the review screen with an open comment composer holding `text`.
    fn state_with_composer(submission_id: i64, text: &str) -> (AppState, mpsc::UnboundedReceiver<AppEvent>) {
        let (mut state, rx) = state_and_rx();
        state.screen = Screen::Review;
        let mut session = ReviewSession::new(submission_id);
        session.begin_comment();
        if let Some(editor) = session.active_editor_mut() {
            for ch in text.chars() {
                editor.insert(ch);
            }
        }
        state.session = Some(session);
        (state, rx)
    }

    #[test]
    fn provider_allowlist_matches_known_hosts() {
        assert!(provider_allowed("https://github.com/octo/widgets"));
        assert!(provider_allowed("http://gitlab.com/group/tool.git"));
        assert!(provider_allowed("https://bitbucket.org/team/repo"));
        assert!(!provider_allowed("https://github.com/"), "empty path");
        assert!(!provider_allowed("https://example.com/octo/widgets"));
        assert!(!provider_allowed("git@github.com:octo/widgets.git"), "ssh form");
        assert!(!provider_allowed("github.com/octo/widgets"), "scheme required");
    }

    #[test]
    fn focus_cycles_through_all_panels() {
        let mut focus = PanelFocus::Files;
        for _ in 0..3 {
            focus = focus.next();
        }
        assert_eq!(focus, PanelFocus::Files);
        assert_eq!(PanelFocus::Files.prev(), PanelFocus::Comments);
    }

    #[test]
    fn quit_guard_prompts_only_with_unsaved_drafts() {
        let mut state = state();
        assert!(state.request_quit(), "nothing typed, quit immediately");

        state.screen = Screen::Review;
        let mut session = ReviewSession::new(42);
        session.begin_comment();
        if let Some(editor) = session.active_editor_mut() {
            editor.insert('x');
        }
        state.session = Some(session);
        assert!(!state.request_quit());
        assert_eq!(state.mode, Mode::ConfirmQuit);
        assert_eq!(state.confirm, Some(ConfirmAction::Quit));

        state.cancel_confirm();
        assert_eq!(state.mode, Mode::Insert, "dismissing drops back into the composer");
        assert!(state.confirm.is_none());
    }

    #[test]
    fn status_messages_expire_on_tick() {
        let mut state = state();
        state.set_status("hello");
        state.on_tick();
        assert_eq!(state.status_message(), Some("hello"), "fresh message survives a tick");

        let Some(backdated) = Instant::now().checked_sub(STATUS_TTL + Duration::from_secs(1))
        else {
            return; // process younger than the TTL; nothing to test
        };
        state.status = Some(("old".to_owned(), backdated));
        state.on_tick();
        assert!(state.status_message().is_none());
    }

    #[test]
    fn request_field_order_is_a_cycle() {
        let mut field = RequestField::GitUrl;
        let mut seen = vec![field];
        for _ in 0..3 {
            field = field.next();
            seen.push(field);
        }
        assert_eq!(
            seen,
            [
                RequestField::GitUrl,
                RequestField::Branch,
                RequestField::Reviewer,
                RequestField::Details
            ]
        );
        assert_eq!(field.next(), RequestField::GitUrl);
        assert_eq!(RequestField::GitUrl.prev(), RequestField::Details);
    }

    #[test]
    fn blank_comment_is_rejected_before_any_request_is_made() {
        let (mut state, mut rx) = state_with_composer(42, "   \n  ");
        state.submit_comment();

        let session = state.session.as_ref().unwrap();
        assert!(!session.comment_in_flight, "nothing should be in flight");
        assert_eq!(session.composer_error.as_deref(), Some("Write something first"));
        assert!(session.comment_editor.is_some(), "draft stays open for fixing");
        assert!(rx.try_recv().is_err(), "no task was spawned, so nothing reports back");
    }

    #[test]
    fn blank_review_is_rejected_before_any_request_is_made() {
        let (mut state, mut rx) = state_and_rx();
        state.screen = Screen::Review;
        let mut session = ReviewSession::new(42);
        session.begin_review();
        if let Some(editor) = session.active_editor_mut() {
            for ch in "  \n\t".chars() {
                editor.insert(ch);
            }
        }
        state.session = Some(session);
        state.submit_review();

        let session = state.session.as_ref().unwrap();
        assert!(!session.saving_review);
        assert_eq!(session.review_error.as_deref(), Some("Write the review before publishing"));
        assert!(session.review_editor.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn comment_result_for_a_previous_submission_is_dropped() {
        // A post issued against review 1 lands after the user has moved on
        // to review 2 and started typing there.
        let (mut state, _rx) = state_with_composer(2, "half-written thought");
        state.mode = Mode::Insert;

        state.handle_net(NetResult::CommentCreated {
            submission_id: 1,
            result: Ok(general_comment("c-old", 1)),
        });

        let session = state.session.as_ref().unwrap();
        assert_eq!(session.submission_id, 2);
        assert_eq!(
            session.comment_editor.as_ref().map(|e| e.text().to_owned()).as_deref(),
            Some("half-written thought"),
            "the new session's draft must survive the stale result"
        );
        assert_eq!(state.mode, Mode::Insert);
        assert!(state.status_message().is_none(), "no 'posted' toast for a dead result");

        state.handle_net(NetResult::ReplyCreated {
            submission_id: 1,
            parent_id: "c-old".to_owned(),
            result: Ok(general_comment("r-old", 1)),
        });
        let session = state.session.as_ref().unwrap();
        assert!(session.comment_editor.is_some());
    }

    #[test]
    fn review_saved_for_a_previous_submission_does_not_replace_the_session() {
        let (mut state, _rx) = state_with_composer(2, "draft");

        state.handle_net(NetResult::ReviewSaved {
            submission_id: 1,
            result: Ok(Review {
                submission: submission(1),
                review_content: "ship it".to_owned(),
            }),
        });

        let session = state.session.as_ref().unwrap();
        assert_eq!(session.submission_id, 2, "open session is not torn down");
        assert!(session.comment_editor.is_some(), "draft survives");
        assert!(state.status_message().is_none());
    }

    #[tokio::test]
    async fn comment_result_for_the_open_submission_still_applies() {
        let (mut state, _rx) = state_with_composer(2, "done now");
        state.mode = Mode::Insert;
        if let Some(session) = state.session.as_mut() {
            session.comment_in_flight = true;
        }

        state.handle_net(NetResult::CommentCreated {
            submission_id: 2,
            result: Ok(general_comment("c-new", 2)),
        });

        let session = state.session.as_ref().unwrap();
        assert!(!session.comment_in_flight);
        assert!(session.comment_editor.is_none(), "composer closes on success");
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.status_message(), Some("Comment posted"));
    }
}
