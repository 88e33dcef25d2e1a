//! Integration tests for the HTTP gateway against a mock backend.
//!
//! Exercises: bearer header attachment, envelope unwrapping, error mapping
//! with the server's message, empty-body acknowledgements, scope query
//! parameters, file-path segment encoding, and the create-comment /
//! create-reply / save-review request bodies.

use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use revu_core::api::{ApiClient, CommentQuery, ReviewerQuery};
use revu_core::error::ApiError;

fn client_for(server: &MockServer) -> ApiClient {
    let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
    ApiClient::new(base)
}

/// `{ message, data }` wrapper the backend puts around every payload.
fn ok(data: Value) -> Value {
    json!({ "message": "success", "data": data })
}

fn submission_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "gitUrl": "https://github.com/octo/widgets.git",
        "branch": "main",
        "requestDetails": "please look at the parser",
        "status": status,
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
            "bio": null,
            "tags": null,
            "user": { "id": 30, "name": "Ravi" },
            "createdAt": "2025-02-01T09:00:00Z",
            "updatedAt": "2025-02-01T09:00:00Z"
        },
        "createdAt": "2025-04-01T10:30:00Z",
        "updatedAt": "2025-04-02T11:00:00Z"
    })
}

fn comment_json(id: &str, content: &str, file: Option<&str>, line: Option<u32>) -> Value {
    json!({
        "id": id,
        "submissionId": 42,
        "content": content,
        "filePath": file,
        "lineNumber": line,
        "author": { "id": 30, "name": "Ravi" },
        "parentCommentId": null,
        "replies": [],
        "isEdited": false,
        "createdAt": "2025-04-01T10:30:00Z",
        "updatedAt": "2025-04-01T10:30:00Z"
    })
}

fn page_json(content: Vec<Value>) -> Value {
    let n = content.len();
    json!({
        "totalPages": 1,
        "totalElements": n,
        "page": 0,
        "size": 100,
        "first": true,
        "last": true,
        "numberOfElements": n,
        "content": content
    })
}

#[tokio::test]
async fn attaches_bearer_token_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/review-submissions/42"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(submission_json(42, "PENDING"))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_token(Some("tok-123".to_owned()));

    let submission = client.submission(42).await.unwrap();
    assert_eq!(submission.id, 42);
    assert_eq!(submission.repo_name(), "widgets");
}

#[tokio::test]
async fn non_success_maps_to_status_error_with_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/review-submissions/99"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "message": "Review submission not found", "data": null })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.submission(99).await.unwrap_err();
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Review submission not found");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn sign_in_installs_token_and_sign_out_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .and(body_json(json!({ "email": "mina@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "accessToken": "tok-123",
            "refreshToken": "refresh-456"
        }))))
        .mount(&server)
        .await;
    // Sign-out acknowledges with an empty body.
    Mock::given(method("POST"))
        .and(path("/api/auth/signout"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let pair = client.sign_in("mina@example.com", "hunter2").await.unwrap();
    assert_eq!(pair.access_token, "tok-123");
    assert!(client.has_token(), "sign-in should install the token");

    client.sign_out().await.unwrap();
    assert!(!client.has_token(), "sign-out should clear the token");
}

#[tokio::test]
async fn current_user_without_token_never_hits_the_network() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated), "got {err:?}");
    assert!(err.is_unauthorized());
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "no request should have been sent"
    );
}

#[tokio::test]
async fn file_path_travels_as_one_encoded_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/review-submissions/42/files/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "path": "src/main.py",
            "content": "x=1\ny=2",
            "encoding": "utf-8",
            "size": 8,
            "lastModified": "2025-04-01T10:30:00Z",
            "lineCount": 2
        }))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let content = client.file_content(42, "src/main.py").await.unwrap();
    assert_eq!(content.content, "x=1\ny=2");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].url.path().ends_with("/files/src%2Fmain.py"),
        "slash in the path must be percent-encoded, got {}",
        requests[0].url.path()
    );
}

#[tokio::test]
async fn comment_listing_sends_scope_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/review-submissions/42/comments"))
        .and(query_param("filePath", "src/main.py"))
        .and(query_param("size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(page_json(vec![
            comment_json("c1", "check this", Some("src/main.py"), Some(2)),
        ]))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let page = client.comments(42, &CommentQuery::for_file("src/main.py", 100)).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].line_number, Some(2));
}

#[tokio::test]
async fn reviewer_listing_forwards_filters_and_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reviewers"))
        .and(query_param("preferences", "rust"))
        .and(query_param("tags", "backend"))
        .and(query_param("page", "0"))
        .and(query_param("size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(page_json(vec![json!({
            "id": 3,
            "preferences": ["rust"],
            "bio": "systems mentor",
            "tags": ["backend"],
            "user": { "id": 30, "name": "Ravi" },
            "createdAt": "2025-04-01T10:30:00Z",
            "updatedAt": "2025-04-01T10:30:00Z"
        })]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = ReviewerQuery {
        preferences: Some("rust".to_owned()),
        tags: Some("backend".to_owned()),
        ..ReviewerQuery::page(0, 50)
    };
    let page = client.reviewers(&query).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].user.name, "Ravi");
}

#[tokio::test]
async fn create_comment_sends_only_present_scope_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/review-submissions/42/comments"))
        .and(body_json(json!({
            "content": "check this",
            "filePath": "src/main.py",
            "lineNumber": 2
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok(comment_json("c9", "check this", Some("src/main.py"), Some(2)))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = revu_core::types::NewComment {
        content: "check this".to_owned(),
        file_path: Some("src/main.py".to_owned()),
        line_number: Some(2),
        parent_comment_id: None,
    };
    let created = client.create_comment(42, &body).await.unwrap();
    assert_eq!(created.id, "c9");
}

#[tokio::test]
async fn replies_post_to_the_comment_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/review-comments/c1/replies"))
        .and(body_json(json!({ "content": "thanks" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "r1",
            "submissionId": 42,
            "content": "thanks",
            "filePath": "src/main.py",
            "lineNumber": 2,
            "author": { "id": 70, "name": "Mina" },
            "parentCommentId": "c1",
            "replies": [],
            "isEdited": false,
            "createdAt": "2025-04-01T11:00:00Z",
            "updatedAt": "2025-04-01T11:00:00Z"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.create_reply("c1", "thanks").await.unwrap();
    assert_eq!(reply.parent_comment_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn save_review_posts_id_and_content() {
    let server = MockServer::start().await;
    let mut reviewed = submission_json(42, "REVIEWED");
    reviewed["reviewContent"] = json!("LGTM");
    Mock::given(method("POST"))
        .and(path("/api/review-submissions/42/reviews"))
        .and(body_json(json!({ "reviewSubmissionId": 42, "reviewContent": "LGTM" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(reviewed)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let review = client.save_review(42, "LGTM").await.unwrap();
    assert_eq!(review.review_content, "LGTM");
}

#[tokio::test]
async fn success_without_data_is_missing_data_for_typed_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "success",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_token(Some("tok".to_owned()));
    let err = client.current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::MissingData), "got {err:?}");
}

#[tokio::test]
async fn branch_lookup_encodes_the_repository_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/git/branches"))
        .and(query_param("gitUrl", "https://github.com/octo/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "gitUrl": "https://github.com/octo/widgets",
            "branches": [
                {
                    "name": "main",
                    "isDefault": true,
                    "lastCommit": "abc123",
                    "lastCommitDate": "2025-04-01T10:30:00Z",
                    "lastCommitMessage": "init"
                },
                {
                    "name": "feature/parser",
                    "isDefault": false,
                    "lastCommit": "def456",
                    "lastCommitDate": "2025-04-02T10:30:00Z",
                    "lastCommitMessage": "wip"
                }
            ],
            "defaultBranch": "main"
        }))))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let branches = client.branches("https://github.com/octo/widgets").await.unwrap();
    assert_eq!(branches.default_branch, "main");
    assert_eq!(branches.branches.len(), 2);
    assert!(branches.branches[0].is_default);
}
