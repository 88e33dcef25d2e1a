//! Wire types for the review backend.
//!
//! Every response body is wrapped in an [`Envelope`] (`{ "message": …,
//! "data": … }`), field names are camelCase on the wire, and timestamps are
//! ISO-8601. The structs here mirror the backend contract one-to-one; derived
//! state (comment threading, tree expansion) lives in `comments` and `fs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `{ message, data }` wrapper around every backend response.
///
/// `data` is absent on bare acknowledgements (sign-out, some 204 bodies), so
/// it is always optional here; typed accessors in `api` decide whether a
/// missing payload is an error.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: Option<T>,
}

/// Access/refresh token pair returned by sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Account role, as the backend reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Reviewer,
    Reviewee,
    Admin,
}

impl UserRole {
    /// Short badge text for the status bar and profile card.
    pub fn label(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Reviewer => "reviewer",
            UserRole::Reviewee => "reviewee",
            UserRole::Admin => "admin",
        }
    }
}

/// The signed-in account, from `GET /users/me`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user reference embedded in comments and profiles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// A reviewer profile from the reviewer directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerProfile {
    pub id: i64,
    pub preferences: Option<Vec<String>>,
    pub bio: Option<String>,
    pub tags: Option<Vec<String>>,
    pub user: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reviewee (mentee) profile embedded in submissions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevieweeProfile {
    pub id: i64,
    pub preferences: Option<Vec<String>>,
    pub user: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a review submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Canceled,
    Reviewed,
}

impl SubmissionStatus {
    /// Short badge text for list rows and headers.
    pub fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Canceled => "CANCELED",
            SubmissionStatus::Reviewed => "REVIEWED",
        }
    }
}

/// A review request: repository, branch, the ask, and both parties.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub git_url: String,
    pub branch: String,
    pub request_details: String,
    pub status: SubmissionStatus,
    pub reviewee: RevieweeProfile,
    pub reviewer: ReviewerProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Repository name derived from the git URL: the last path component with
    /// any `.git` suffix dropped. Falls back to the full URL for odd inputs.
    pub fn repo_name(&self) -> &str {
        let tail = self
            .git_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.git_url);
        let name = tail.strip_suffix(".git").unwrap_or(tail);
        if name.is_empty() { &self.git_url } else { name }
    }
}

/// A submission together with its published review text.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(rename = "reviewContent")]
    pub review_content: String,
}

/// Whether a tree node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileNodeKind {
    File,
    Directory,
}

/// One node of the submitted project's file tree, as the backend ships it:
/// children pre-nested, already in display order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileNodeKind,
    pub size: Option<u64>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    pub children: Option<Vec<FileNode>>,
}

/// The complete file tree for a submission, fetched once per session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFileSystem {
    pub submission_id: i64,
    pub branch: String,
    pub root_directory: FileNode,
    pub total_files: u64,
    pub total_size: u64,
}

/// The contents of one file, fetched on demand when it is opened.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub encoding: String,
    pub size: u64,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Advisory only. The renderer always trusts its own newline split, since
    /// this count can lag the content after force-pushes.
    pub line_count: Option<u64>,
}

/// One review comment. `file_path`/`line_number` determine its scope and
/// `parent_comment_id` marks it as a reply (replies nest exactly one level).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Server-issued opaque id (UUID text on the current backend).
    pub id: String,
    pub submission_id: i64,
    pub content: String,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
    pub author: UserRef,
    pub parent_comment_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a paginated listing. Pages are 0-based on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_pages: u32,
    pub total_elements: u64,
    pub page: u32,
    pub size: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: u32,
    pub content: Vec<T>,
}

/// A branch of a candidate repository, from the branch lookup endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitBranch {
    pub name: String,
    pub is_default: bool,
    pub last_commit: String,
    pub last_commit_date: DateTime<Utc>,
    pub last_commit_message: String,
}

/// Branch listing for a repository URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchList {
    pub git_url: String,
    pub branches: Vec<GitBranch>,
    pub default_branch: String,
}

/// Body of `POST /auth/signin`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

/// Body of `POST /review-submissions/{id}/comments`.
///
/// Scope follows from which location fields are present: neither for a
/// general comment, `file_path` alone for a file comment, both for a line
/// comment. `parent_comment_id` is accepted by the backend but the client
/// posts replies through the dedicated replies endpoint instead.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<String>,
}

/// Body of `POST /review-submissions/new`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub reviewer_id: i64,
    pub git_url: String,
    pub branch: String,
    pub request_details: String,
}

/// Body of `POST /review-submissions/{id}/reviews`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub review_submission_id: i64,
    pub review_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "gitUrl": "https://github.com/octo/widgets.git",
            "branch": "main",
            "requestDetails": "please look at the parser",
            "status": "PENDING",
            "reviewee": {
                "id": 7,
                "preferences": null,
                "user": { "id": 70, "name": "Mina", "email": "mina@example.com" },
                "createdAt": "2025-03-01T09:00:00Z",
                "updatedAt": "2025-03-01T09:00:00Z"
            },
            "reviewer": {
                "id": 3,
                "preferences": ["rust"],
                "bio": "systems person",
                "tags": ["backend"],
                "user": { "id": 30, "name": "Ravi" },
                "createdAt": "2025-02-01T09:00:00Z",
                "updatedAt": "2025-02-01T09:00:00Z"
            },
            "createdAt": "2025-04-01T10:30:00Z",
            "updatedAt": "2025-04-02T11:00:00Z"
        })
    }

    #[test]
    fn submission_decodes_and_names_repo() {
        let sub: Submission = serde_json::from_value(submission_json()).unwrap();
        assert_eq!(sub.id, 42);
        assert_eq!(sub.status, SubmissionStatus::Pending);
        assert_eq!(sub.repo_name(), "widgets");
        assert_eq!(sub.reviewer.user.name, "Ravi");
        assert!(sub.reviewer.user.email.is_none());
    }

    #[test]
    fn review_flattens_submission_fields() {
        let mut json = submission_json();
        json["reviewContent"] = serde_json::json!("LGTM");
        json["status"] = serde_json::json!("REVIEWED");
        let review: Review = serde_json::from_value(json).unwrap();
        assert_eq!(review.review_content, "LGTM");
        assert_eq!(review.submission.status, SubmissionStatus::Reviewed);
        assert_eq!(review.submission.repo_name(), "widgets");
    }

    #[test]
    fn repo_name_handles_odd_urls() {
        let mut sub: Submission = serde_json::from_value(submission_json()).unwrap();
        sub.git_url = "https://gitlab.com/group/sub/tool".to_owned();
        assert_eq!(sub.repo_name(), "tool");
        sub.git_url = "https://github.com/solo/".to_owned();
        assert_eq!(sub.repo_name(), "solo");
    }

    #[test]
    fn comment_replies_default_when_absent() {
        let comment: Comment = serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "submissionId": 42,
            "content": "looks off",
            "filePath": "src/main.py",
            "lineNumber": 2,
            "author": { "id": 30, "name": "Ravi" },
            "parentCommentId": null,
            "isEdited": false,
            "createdAt": "2025-04-01T10:30:00Z",
            "updatedAt": "2025-04-01T10:30:00Z"
        }))
        .unwrap();
        assert!(comment.replies.is_empty());
        assert_eq!(comment.line_number, Some(2));
    }

    #[test]
    fn new_comment_skips_absent_location_fields() {
        let body = NewComment {
            content: "overall note".to_owned(),
            file_path: None,
            line_number: None,
            parent_comment_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "overall note" }));
    }

    #[test]
    fn file_node_type_field_maps_to_kind() {
        let node: FileNode = serde_json::from_value(serde_json::json!({
            "name": "src",
            "path": "widgets/src",
            "type": "DIRECTORY",
            "size": null,
            "lastModified": "2025-04-01T10:30:00Z",
            "children": [
                { "name": "main.py", "path": "widgets/src/main.py", "type": "FILE", "size": 120 }
            ]
        }))
        .unwrap();
        assert_eq!(node.kind, FileNodeKind::Directory);
        let children = node.children.as_deref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind, FileNodeKind::File);
        assert!(children[0].last_modified.is_none());
    }
}
