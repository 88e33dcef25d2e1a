//! HTTP gateway to the review backend.
//!
//! Every remote operation funnels through `ApiClient::dispatch` — the one
//! place that attaches the bearer token, unwraps the `{ message, data }`
//! envelope, and maps non-success statuses to [`ApiError::Status`] carrying
//! the server's own message. The typed endpoint methods below it are thin:
//! they build a URL, pick a method, and deserialize `data`.
//!
//! The client is cheap to share: callers wrap it in `Arc` and clone the
//! handle into background tasks. No request timeout is configured — slow
//! fetches are abandoned by the caller going stale, not by the clock.

use std::sync::{PoisonError, RwLock};

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::types::{
    BranchList, Comment, Envelope, FileContent, NewComment, NewReview, NewSubmission, Page,
    ProjectFileSystem, Review, ReviewerProfile, SignIn, Submission, TokenPair, User,
};

/// Optional filters for the comment listing endpoint.
///
/// Mirrors the backend's query parameters: absent fields are simply not sent,
/// so the backend's own defaults apply.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl CommentQuery {
    /// All comments anchored to one file (line and file scoped alike).
    pub fn for_file(path: &str, size: u32) -> Self {
        Self { file_path: Some(path.to_owned()), size: Some(size), ..Self::default() }
    }

    /// General comments only (the backend treats no `filePath` as general).
    pub fn general(size: u32) -> Self {
        Self { size: Some(size), ..Self::default() }
    }
}

/// Optional filters for the reviewer directory.
///
/// `preferences` and `tags` are comma-separated match lists, forwarded
/// verbatim; absent fields are not sent so the backend's defaults apply.
#[derive(Debug, Clone, Default)]
pub struct ReviewerQuery {
    pub preferences: Option<String>,
    pub tags: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ReviewerQuery {
    /// One unfiltered page of the directory.
    pub fn page(page: u32, size: u32) -> Self {
        Self { page: Some(page), size: Some(size), ..Self::default() }
    }
}

/// Shared HTTP client for the review backend.
pub struct ApiClient {
    http: Client,
    base: Url,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Creates a client rooted at `base` (e.g. `http://localhost:8080/api`).
    ///
    /// `base` must be an http(s) URL; anything else cannot address the
    /// backend and is rejected by the caller's config parsing.
    pub fn new(base: Url) -> Self {
        Self { http: Client::new(), base, token: RwLock::new(None) }
    }

    /// Installs or clears the bearer token attached to every request.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// True when a bearer token is currently installed.
    pub fn has_token(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Builds an absolute URL by appending `segments` to the base path.
    ///
    /// Each segment is percent-encoded as a whole, so a repository-relative
    /// file path like `src/main.py` travels as one `src%2Fmain.py` segment —
    /// exactly what the backend's file endpoint expects.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // http(s) URLs always have mutable path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends one request and returns the envelope's `data` payload.
    ///
    /// Non-2xx responses become [`ApiError::Status`] with the message pulled
    /// from the error envelope (falling back to the raw body). Empty bodies
    /// on success decode as `Value::Null` so acknowledgement-only endpoints
    /// do not need a payload type.
    async fn dispatch(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value> {
        tracing::debug!(%method, %url, "backend request");
        let mut request = self.http.request(method, url);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(%status, "backend error response");
            return Err(ApiError::Status { status, message: server_message(&text) });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let envelope: Envelope<Value> = serde_json::from_str(&text)?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        decode(self.dispatch(Method::GET, url, None).await?)
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: Value) -> Result<T> {
        decode(self.dispatch(Method::POST, url, Some(body)).await?)
    }

    // -- auth ---------------------------------------------------------------

    /// Signs in and installs the returned access token on this client.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair> {
        let body = SignIn { email: email.to_owned(), password: password.to_owned() };
        let pair: TokenPair =
            self.post(self.url(&["auth", "signin"]), serde_json::to_value(&body)?).await?;
        self.set_token(Some(pair.access_token.clone()));
        Ok(pair)
    }

    /// Tells the backend to invalidate the session. The local token is
    /// cleared even when the call fails — it is already dead to the caller.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.dispatch(Method::POST, self.url(&["auth", "signout"]), None).await;
        self.set_token(None);
        result.map(|_| ())
    }

    /// Resolves the signed-in user. Fails fast when no token is installed.
    pub async fn current_user(&self) -> Result<User> {
        if !self.has_token() {
            return Err(ApiError::Unauthenticated);
        }
        self.get(self.url(&["users", "me"])).await
    }

    // -- review session -----------------------------------------------------

    /// Fetches one submission's metadata.
    pub async fn submission(&self, id: i64) -> Result<Submission> {
        self.get(self.url(&["review-submissions", &id.to_string()])).await
    }

    /// Fetches the submission's complete file tree.
    pub async fn file_system(&self, id: i64) -> Result<ProjectFileSystem> {
        self.get(self.url(&["review-submissions", &id.to_string(), "filesystem"])).await
    }

    /// Fetches one file's content. `path` is repository-relative.
    pub async fn file_content(&self, id: i64, path: &str) -> Result<FileContent> {
        self.get(self.url(&["review-submissions", &id.to_string(), "files", path])).await
    }

    /// Lists comments for a submission, optionally filtered by scope.
    pub async fn comments(&self, id: i64, query: &CommentQuery) -> Result<Page<Comment>> {
        let mut url = self.url(&["review-submissions", &id.to_string(), "comments"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(path) = &query.file_path {
                pairs.append_pair("filePath", path);
            }
            if let Some(line) = query.line_number {
                pairs.append_pair("lineNumber", &line.to_string());
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(size) = query.size {
                pairs.append_pair("size", &size.to_string());
            }
        }
        self.get(url).await
    }

    /// Creates a comment on a submission. The scope rides in the body.
    pub async fn create_comment(&self, id: i64, body: &NewComment) -> Result<Comment> {
        self.post(
            self.url(&["review-submissions", &id.to_string(), "comments"]),
            serde_json::to_value(body)?,
        )
        .await
    }

    /// Creates a reply under an existing comment.
    pub async fn create_reply(&self, comment_id: &str, content: &str) -> Result<Comment> {
        self.post(
            self.url(&["review-comments", comment_id, "replies"]),
            serde_json::json!({ "content": content }),
        )
        .await
    }

    /// Publishes the final review for a submission.
    pub async fn save_review(&self, id: i64, content: &str) -> Result<Review> {
        let body = NewReview { review_submission_id: id, review_content: content.to_owned() };
        self.post(
            self.url(&["review-submissions", &id.to_string(), "reviews"]),
            serde_json::to_value(&body)?,
        )
        .await
    }

    // -- surrounding workflow ----------------------------------------------

    /// Creates a new review request.
    pub async fn create_submission(&self, body: &NewSubmission) -> Result<Submission> {
        self.post(self.url(&["review-submissions", "new"]), serde_json::to_value(body)?).await
    }

    /// Lists the user's reviews, newest first, 0-based pages.
    pub async fn reviews(&self, page: u32, size: u32) -> Result<Page<Review>> {
        let mut url = self.url(&["reviews"]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        self.get(url).await
    }

    /// Lists reviewer profiles, optionally filtered by preference or tag.
    pub async fn reviewers(&self, query: &ReviewerQuery) -> Result<Page<ReviewerProfile>> {
        let mut url = self.url(&["reviewers"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(preferences) = &query.preferences {
                pairs.append_pair("preferences", preferences);
            }
            if let Some(tags) = &query.tags {
                pairs.append_pair("tags", tags);
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(size) = query.size {
                pairs.append_pair("size", &size.to_string());
            }
        }
        self.get(url).await
    }

    /// Looks up the branches of a candidate repository URL.
    pub async fn branches(&self, git_url: &str) -> Result<BranchList> {
        let mut url = self.url(&["git", "branches"]);
        url.query_pairs_mut().append_pair("gitUrl", git_url);
        self.get(url).await
    }
}

/// Deserializes an envelope payload, treating `null` as a missing payload.
fn decode<T: DeserializeOwned>(data: Value) -> Result<T> {
    if data.is_null() {
        return Err(ApiError::MissingData);
    }
    Ok(serde_json::from_value(data)?)
}

/// Best-effort extraction of the backend's error message from a body.
fn server_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<Envelope<Value>>(body) {
        if !envelope.message.is_empty() {
            return envelope.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() { "request failed".to_owned() } else { trimmed.to_owned() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(Url::parse("http://localhost:8080/api").unwrap())
    }

    #[test]
    fn url_joins_segments_under_base_path() {
        let url = client().url(&["review-submissions", "42", "filesystem"]);
        assert_eq!(url.as_str(), "http://localhost:8080/api/review-submissions/42/filesystem");
    }

    #[test]
    fn url_encodes_file_path_as_single_segment() {
        let url = client().url(&["review-submissions", "42", "files", "src/main.py"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/review-submissions/42/files/src%2Fmain.py"
        );
    }

    #[test]
    fn url_survives_trailing_slash_base() {
        let api = ApiClient::new(Url::parse("http://localhost:8080/api/").unwrap());
        let url = api.url(&["reviews"]);
        assert_eq!(url.as_str(), "http://localhost:8080/api/reviews");
    }

    #[test]
    fn server_message_prefers_envelope_message() {
        let body = r#"{ "message": "Review submission not found", "data": null }"#;
        assert_eq!(server_message(body), "Review submission not found");
        assert_eq!(server_message("plain failure"), "plain failure");
        assert_eq!(server_message("   "), "request failed");
    }
}
