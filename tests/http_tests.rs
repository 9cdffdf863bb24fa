//! HTTP endpoint integration tests.
//!
//! Drives the axum router in-process with `tower::ServiceExt::oneshot` over
//! memory-backed stores:
//! - `/health` and `/metrics`
//! - `/images` queries, content, upload, likes, ACL edits and deletion
//! - `/users` directory search

use std::collections::BTreeSet;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use imgrepo::access::QueryLimits;
use imgrepo::auth::JwtCodec;
use imgrepo::blob::BlobStore;
use imgrepo::http::{AppState, HttpOptions, router};
use imgrepo::model::{AccessLevel, Image, NewImage, NewUser, RecordId, User, fields};
use imgrepo::store::{Filter, RecordStore};

const SECRET: &[u8] = b"integration-test-secret";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
const BOUNDARY: &str = "imgrepo-test-boundary";

// =============================================================================
// Harness
// =============================================================================

struct TestApp {
    router: Router,
    records: RecordStore,
    blobs: BlobStore,
    codec: JwtCodec,
}

impl TestApp {
    fn new() -> Self {
        Self::with_options(HttpOptions::default())
    }

    fn with_options(options: HttpOptions) -> Self {
        let records = RecordStore::memory();
        let blobs = BlobStore::memory();
        let codec = JwtCodec::new(SECRET, chrono::Duration::hours(1));
        let state = AppState::new(
            records.clone(),
            blobs.clone(),
            codec.clone(),
            QueryLimits::default(),
        );
        Self {
            router: router(state, &options),
            records,
            blobs,
            codec,
        }
    }

    async fn user(&self, handle: &str) -> User {
        let new = NewUser {
            name: format!("{handle} example"),
            handle: handle.to_string(),
            email: format!("{handle}@example.com"),
            password_hash: Some("argon2-hash".to_string()),
        };
        let id = self.records.insert(&new).await.unwrap();
        new.into_user(id)
    }

    fn cookie(&self, user: &User) -> String {
        let (token, _) = self.codec.issue(user).unwrap();
        format!("token={token}")
    }

    async fn image(&self, author: &User, level: AccessLevel, secs: i64) -> RecordId {
        let new = NewImage {
            author_id: author.id,
            access_level: level,
            access_list: BTreeSet::new(),
            likes: BTreeSet::new(),
            caption: format!("taken at {secs}"),
            uploaded_at: Utc.timestamp_opt(secs, 0).unwrap(),
        };
        let id = self.records.insert(&new).await.unwrap();
        self.blobs.put(&id.to_string(), PNG).await.unwrap();
        id
    }

    async fn stored(&self, id: &RecordId) -> Option<Image> {
        self.records
            .find_one::<Image>(&Filter::eq(fields::ID, id))
            .await
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, cookie, Body::empty())
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).unwrap()
}

fn acl_request(image: &RecordId, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/images/{image}/acl"))
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a multipart upload with an optional file part and text fields.
fn upload_request(
    cookie: Option<&str>,
    file: Option<(&str, &[u8])>,
    fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/images")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn ids_of(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|image| image["_id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// System Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_disabled_returns_404() {
    let app = TestApp::new();
    let (status, _) = app.send(get("/metrics", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Image Queries
// =============================================================================

#[tokio::test]
async fn test_anonymous_user_query_sees_only_public() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let public = app.image(&alice, AccessLevel::Public, 100).await;
    app.image(&alice, AccessLevel::Private, 200).await;

    let (status, body) = app
        .send_json(get(&format!("/images?user={}", alice.id), None))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids_of(&body), vec![public.to_string()]);
    assert_eq!(body[0]["author"]["userHandle"], "alice");
    assert!(body[0]["author"].get("password").is_none());
}

#[tokio::test]
async fn test_owner_query_includes_private_newest_first() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let older = app.image(&alice, AccessLevel::Public, 100).await;
    let newer = app.image(&alice, AccessLevel::Private, 200).await;
    let cookie = app.cookie(&alice);

    let (status, body) = app.send_json(get("/images", Some(&cookie))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids_of(&body), vec![newer.to_string(), older.to_string()]);
}

#[tokio::test]
async fn test_bearer_header_is_accepted() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let private = app.image(&alice, AccessLevel::Private, 100).await;
    let (token, _) = app.codec.issue(&alice).unwrap();

    let request = Request::builder()
        .uri("/images")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (_, body) = app.send_json(request).await;

    assert_eq!(ids_of(&body), vec![private.to_string()]);
}

#[tokio::test]
async fn test_invalid_token_reads_as_anonymous() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let public = app.image(&alice, AccessLevel::Public, 100).await;
    app.image(&alice, AccessLevel::Private, 200).await;

    let (status, body) = app
        .send_json(get("/images", Some("token=not-a-jwt")))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids_of(&body), vec![public.to_string()]);
}

#[tokio::test]
async fn test_explicit_ids_ignore_limit_and_respect_visibility() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let a = app.image(&alice, AccessLevel::Public, 100).await;
    let b = app.image(&alice, AccessLevel::Public, 200).await;
    let hidden = app.image(&alice, AccessLevel::Private, 300).await;

    let uri = format!("/images?id={a},{b},{hidden}&limit=1");
    let (status, body) = app.send_json(get(&uri, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids_of(&body), vec![b.to_string(), a.to_string()]);
}

#[tokio::test]
async fn test_malformed_explicit_id_is_400() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/images?id=nope", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_time_bounds_are_exclusive() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    app.image(&alice, AccessLevel::Public, 100).await;
    let middle = app.image(&alice, AccessLevel::Public, 200).await;
    app.image(&alice, AccessLevel::Public, 300).await;

    let (_, body) = app
        .send_json(get("/images?after=100&before=300", None))
        .await;
    assert_eq!(ids_of(&body), vec![middle.to_string()]);
}

// =============================================================================
// Image Content
// =============================================================================

#[tokio::test]
async fn test_content_served_with_sniffed_type() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let id = app.image(&alice, AccessLevel::Public, 100).await;

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/images/{id}/content"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PNG);
}

#[tokio::test]
async fn test_private_content_is_404_for_strangers() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let mallory = app.user("mallory").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;
    let uri = format!("/images/{id}/content");

    let (anonymous, _) = app.send(get(&uri, None)).await;
    let (stranger, _) = app.send(get(&uri, Some(&app.cookie(&mallory)))).await;
    let (owner, _) = app.send(get(&uri, Some(&app.cookie(&alice)))).await;

    assert_eq!(anonymous, StatusCode::NOT_FOUND);
    assert_eq!(stranger, StatusCode::NOT_FOUND);
    assert_eq!(owner, StatusCode::OK);
}

#[tokio::test]
async fn test_content_with_malformed_id_is_400() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/images/xyz/content", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid image ID passed in: xyz");
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_requires_session() {
    let app = TestApp::new();
    let (status, body) = app
        .send_json(upload_request(None, Some(("image/png", PNG)), &[]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_upload_token_for_deleted_user_is_401() {
    let app = TestApp::new();
    let ghost = User {
        id: RecordId::generate(),
        name: "Ghost".to_string(),
        handle: "ghost".to_string(),
        email: "ghost@example.com".to_string(),
        password_hash: None,
    };
    let cookie = app.cookie(&ghost);

    let (status, _) = app
        .send(upload_request(Some(&cookie), Some(("image/png", PNG)), &[]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_stores_record_and_blob() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let cookie = app.cookie(&alice);
    let access_list = json!([bob.id.to_string()]).to_string();

    let (status, body) = app
        .send_json(upload_request(
            Some(&cookie),
            Some(("image/png", PNG)),
            &[
                ("accessLevel", "private"),
                ("accessListIDs", access_list.as_str()),
                ("caption", "sunset"),
            ],
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let id: RecordId = body["_id"].as_str().unwrap().parse().unwrap();
    let image = app.stored(&id).await.unwrap();
    assert_eq!(image.author_id, alice.id);
    assert_eq!(image.access_level, AccessLevel::Private);
    assert!(image.access_list.contains(&bob.id));
    assert_eq!(image.caption, "sunset");
    assert_eq!(
        app.blobs.get(&id.to_string()).await.unwrap().as_deref(),
        Some(PNG)
    );
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let cookie = app.cookie(&alice);

    let (status, body) = app
        .send_json(upload_request(
            Some(&cookie),
            Some(("text/plain", &b"hello"[..])),
            &[],
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "uploaded non-image file type");
    assert!(app.blobs.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_is_400() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let cookie = app.cookie(&alice);

    let (status, _) = app
        .send(upload_request(Some(&cookie), None, &[("caption", "nothing")]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_413() {
    let app = TestApp::with_options(HttpOptions {
        max_upload_bytes: 1024,
        request_timeout: Duration::from_secs(30),
    });
    let alice = app.user("alice").await;
    let cookie = app.cookie(&alice);
    let mut data = PNG.to_vec();
    data.resize(4096, 0);

    let (status, _) = app
        .send(upload_request(Some(&cookie), Some(("image/png", data.as_slice())), &[]))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Likes
// =============================================================================

#[tokio::test]
async fn test_double_like_conflicts() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let id = app.image(&alice, AccessLevel::Public, 100).await;
    let cookie = app.cookie(&bob);
    let uri = format!("/images/{id}/likes");

    let (first, _) = app
        .send(request(Method::PATCH, &uri, Some(&cookie), Body::empty()))
        .await;
    let (second, body) = app
        .send_json(request(Method::PATCH, &uri, Some(&cookie), Body::empty()))
        .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already liked image");
    assert_eq!(
        app.stored(&id).await.unwrap().likes,
        BTreeSet::from([bob.id])
    );
}

#[tokio::test]
async fn test_unlike_restores_likes() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let id = app.image(&alice, AccessLevel::Public, 100).await;
    let cookie = app.cookie(&alice);
    let uri = format!("/images/{id}/likes");

    app.send(request(Method::PATCH, &uri, Some(&cookie), Body::empty()))
        .await;
    let (unlike, _) = app
        .send(request(Method::DELETE, &uri, Some(&cookie), Body::empty()))
        .await;
    let (again, _) = app
        .send(request(Method::DELETE, &uri, Some(&cookie), Body::empty()))
        .await;

    assert_eq!(unlike, StatusCode::OK);
    assert_eq!(again, StatusCode::CONFLICT);
    assert!(app.stored(&id).await.unwrap().likes.is_empty());
}

#[tokio::test]
async fn test_like_hidden_image_is_404() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let mallory = app.user("mallory").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;

    let (status, _) = app
        .send(request(
            Method::PATCH,
            &format!("/images/{id}/likes"),
            Some(&app.cookie(&mallory)),
            Body::empty(),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.stored(&id).await.unwrap().likes.is_empty());
}

// =============================================================================
// Access List
// =============================================================================

#[tokio::test]
async fn test_acl_grant_then_no_op() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;
    let cookie = app.cookie(&alice);
    let body = json!({"add": [bob.id.to_string()]});

    let (granted, _) = app.send(acl_request(&id, &cookie, body.clone())).await;
    let (repeated, _) = app.send(acl_request(&id, &cookie, body)).await;

    assert_eq!(granted, StatusCode::OK);
    assert_eq!(repeated, StatusCode::NO_CONTENT);

    // Bob can now read it
    let (status, _) = app
        .send(get(&format!("/images/{id}/content"), Some(&app.cookie(&bob))))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_acl_overlap_is_400_without_write() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;
    let cookie = app.cookie(&alice);
    let user = bob.id.to_string();

    let (status, body) = app
        .send_json(acl_request(
            &id,
            &cookie,
            json!({"add": [user], "remove": [user]}),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("both add and remove"));
    assert!(app.stored(&id).await.unwrap().access_list.is_empty());
}

#[tokio::test]
async fn test_acl_by_non_owner_is_404() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let id = app.image(&alice, AccessLevel::Public, 100).await;

    let (status, _) = app
        .send(acl_request(
            &id,
            &app.cookie(&bob),
            json!({"add": [bob.id.to_string()]}),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.stored(&id).await.unwrap().access_list.is_empty());
}

#[tokio::test]
async fn test_acl_malformed_body_is_400() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;

    let request = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/images/{id}/acl"))
        .header(header::COOKIE, app.cookie(&alice))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_non_owner_delete_is_404_and_keeps_everything() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let id = app.image(&alice, AccessLevel::Public, 100).await;

    let (status, _) = app
        .send(request(
            Method::DELETE,
            &format!("/images/{id}"),
            Some(&app.cookie(&bob)),
            Body::empty(),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.stored(&id).await.is_some());
    assert!(app.blobs.get(&id.to_string()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_owner_delete_removes_record_and_blob() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let id = app.image(&alice, AccessLevel::Private, 100).await;

    let (status, _) = app
        .send(request(
            Method::DELETE,
            &format!("/images/{id}"),
            Some(&app.cookie(&alice)),
            Body::empty(),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.stored(&id).await.is_none());
    assert!(app.blobs.get(&id.to_string()).await.unwrap().is_none());
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_search_by_handle_hides_credentials() {
    let app = TestApp::new();
    app.user("alice").await;
    app.user("alicia").await;
    app.user("bob").await;

    let (status, body) = app
        .send_json(get("/users?userHandle=ali&ascending=y", None))
        .await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    let handles: Vec<&str> = users
        .iter()
        .map(|u| u["userHandle"].as_str().unwrap())
        .collect();
    assert_eq!(handles, vec!["alice", "alicia"]);
    assert!(users.iter().all(|u| u.get("password").is_none()));
    assert!(users.iter().all(|u| u.get("email").is_none()));
}

#[tokio::test]
async fn test_user_search_with_bad_id_is_400() {
    let app = TestApp::new();
    let (status, body) = app.send_json(get("/users?id=zzz", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid user id: zzz");
}
