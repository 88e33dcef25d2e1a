//! Gateway calls as fire-and-forget tokio tasks.
//!
//! Every spawn helper here clones what it needs, runs one `ApiClient` call,
//! and posts the outcome back to the event loop as an `AppEvent::Net`. The
//! UI thread never awaits a response in place; it stays responsive and picks
//! results up on its next loop turn.
//!
//! Helpers that can be re-issued while an earlier call is still in flight
//! (list pages, file content, comment listings, branch lookups) carry a
//! caller-assigned `seq` tag. The applier only accepts the result whose tag
//! matches the latest request, so slow responses cannot clobber newer ones.
//! Creation results carry the submission id they were issued against; the
//! applier drops them when the user has since opened a different review.

use std::path::PathBuf;
use std::sync::Arc;

use revu_core::api::{ApiClient, CommentQuery, ReviewerQuery};
use revu_core::auth::{self, StoredAuth};
use revu_core::types::{
    BranchList, Comment, FileContent, NewComment, NewSubmission, Page, ProjectFileSystem, Review,
    ReviewerProfile, Submission, User,
};
use revu_core::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::event::AppEvent;

pub type Tx = UnboundedSender<AppEvent>;

/// Comment listings ask for one large page; the platform threads replies
/// inside each top-level comment, so a file rarely exceeds this.
pub const COMMENT_PAGE_SIZE: u32 = 100;
/// Review requests are browsed page by page.
pub const REVIEWS_PAGE_SIZE: u32 = 10;
/// Reviewer picker loads a single page; mentors are a short list.
pub const REVIEWERS_PAGE_SIZE: u32 = 50;

/// Outcome of one gateway call, routed through `AppState::handle_net`.
#[derive(Debug)]
pub enum NetResult {
    Session(Result<User>),
    SignIn(Result<User>),
    SignOut(Result<()>),
    Reviews { page: u32, seq: u64, result: Result<Page<Review>> },
    Reviewers { seq: u64, result: Result<Page<ReviewerProfile>> },
    Branches { git_url: String, seq: u64, result: Result<BranchList> },
    SubmissionCreated(Result<Submission>),
    Submission { submission_id: i64, result: Result<Submission> },
    FileSystem { submission_id: i64, result: Result<ProjectFileSystem> },
    GeneralComments { submission_id: i64, seq: u64, result: Result<Page<Comment>> },
    FileLoaded { path: String, seq: u64, result: Result<FileContent> },
    FileComments { path: String, seq: u64, result: Result<Page<Comment>> },
    CommentCreated { submission_id: i64, result: Result<Comment> },
    ReplyCreated { submission_id: i64, parent_id: String, result: Result<Comment> },
    ReviewSaved { submission_id: i64, result: Result<Review> },
}

fn send(tx: &Tx, result: NetResult) {
    let _ = tx.send(AppEvent::Net(Box::new(result)));
}

/// Validates a stored token by fetching the profile behind it.
pub fn spawn_resolve_session(api: Arc<ApiClient>, tx: Tx) {
    tokio::spawn(async move {
        let result = api.current_user().await;
        send(&tx, NetResult::Session(result));
    });
}

/// Signs in, persists the issued tokens, then fetches the profile. A failed
/// persist is logged but does not fail the sign-in; the session still works
/// until the process exits.
pub fn spawn_sign_in(api: Arc<ApiClient>, tx: Tx, auth_path: PathBuf, email: String, password: String) {
    tokio::spawn(async move {
        let result = match api.sign_in(&email, &password).await {
            Ok(tokens) => {
                let stored = StoredAuth {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token,
                };
                if let Err(err) = auth::save(&auth_path, &stored) {
                    warn!(error = %err, "failed to persist auth tokens");
                }
                api.current_user().await
            }
            Err(err) => Err(err),
        };
        send(&tx, NetResult::SignIn(result));
    });
}

pub fn spawn_sign_out(api: Arc<ApiClient>, tx: Tx) {
    tokio::spawn(async move {
        let result = api.sign_out().await;
        send(&tx, NetResult::SignOut(result));
    });
}

pub fn spawn_reviews(api: Arc<ApiClient>, tx: Tx, page: u32, seq: u64) {
    tokio::spawn(async move {
        let result = api.reviews(page, REVIEWS_PAGE_SIZE).await;
        send(&tx, NetResult::Reviews { page, seq, result });
    });
}

pub fn spawn_reviewers(api: Arc<ApiClient>, tx: Tx, seq: u64) {
    tokio::spawn(async move {
        let result = api.reviewers(&ReviewerQuery::page(0, REVIEWERS_PAGE_SIZE)).await;
        send(&tx, NetResult::Reviewers { seq, result });
    });
}

pub fn spawn_branches(api: Arc<ApiClient>, tx: Tx, git_url: String, seq: u64) {
    tokio::spawn(async move {
        let result = api.branches(&git_url).await;
        send(&tx, NetResult::Branches { git_url, seq, result });
    });
}

pub fn spawn_create_submission(api: Arc<ApiClient>, tx: Tx, request: NewSubmission) {
    tokio::spawn(async move {
        let result = api.create_submission(&request).await;
        send(&tx, NetResult::SubmissionCreated(result));
    });
}

pub fn spawn_submission(api: Arc<ApiClient>, tx: Tx, submission_id: i64) {
    tokio::spawn(async move {
        let result = api.submission(submission_id).await;
        send(&tx, NetResult::Submission { submission_id, result });
    });
}

pub fn spawn_file_system(api: Arc<ApiClient>, tx: Tx, submission_id: i64) {
    tokio::spawn(async move {
        let result = api.file_system(submission_id).await;
        send(&tx, NetResult::FileSystem { submission_id, result });
    });
}

pub fn spawn_general_comments(api: Arc<ApiClient>, tx: Tx, submission_id: i64, seq: u64) {
    tokio::spawn(async move {
        let result = api.comments(submission_id, &CommentQuery::general(COMMENT_PAGE_SIZE)).await;
        send(&tx, NetResult::GeneralComments { submission_id, seq, result });
    });
}

pub fn spawn_file_content(api: Arc<ApiClient>, tx: Tx, submission_id: i64, path: String, seq: u64) {
    tokio::spawn(async move {
        let result = api.file_content(submission_id, &path).await;
        send(&tx, NetResult::FileLoaded { path, seq, result });
    });
}

pub fn spawn_file_comments(api: Arc<ApiClient>, tx: Tx, submission_id: i64, path: String, seq: u64) {
    tokio::spawn(async move {
        let query = CommentQuery::for_file(&path, COMMENT_PAGE_SIZE);
        let result = api.comments(submission_id, &query).await;
        send(&tx, NetResult::FileComments { path, seq, result });
    });
}

pub fn spawn_create_comment(api: Arc<ApiClient>, tx: Tx, submission_id: i64, comment: NewComment) {
    tokio::spawn(async move {
        let result = api.create_comment(submission_id, &comment).await;
        send(&tx, NetResult::CommentCreated { submission_id, result });
    });
}

pub fn spawn_create_reply(
    api: Arc<ApiClient>,
    tx: Tx,
    submission_id: i64,
    parent_id: String,
    content: String,
) {
    tokio::spawn(async move {
        let result = api.create_reply(&parent_id, &content).await;
        send(&tx, NetResult::ReplyCreated { submission_id, parent_id, result });
    });
}

pub fn spawn_save_review(api: Arc<ApiClient>, tx: Tx, submission_id: i64, content: String) {
    tokio::spawn(async move {
        let result = api.save_review(submission_id, &content).await;
        send(&tx, NetResult::ReviewSaved { submission_id, result });
    });
}
