// Integration tests for the access-control rules, driven through the full
// router in-process: registration conflicts, generic login failures,
// redirect-on-unauthenticated, friend-add outcomes, feed visibility,
// comment gating and counts, profile round-trips, upload key handling.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use mingle_server::{db::Database, router, state::AppState};

fn test_app() -> Router {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize schema");

    let uploads_dir =
        std::env::temp_dir().join(format!("mingle-test-uploads-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&uploads_dir).expect("Failed to create uploads dir");

    router(AppState::new(db, uploads_dir))
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.expect("request failed")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body was not JSON")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("X-Session-Token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Session-Token", token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, username: &str) -> StatusCode {
    let response = send(
        app,
        json_request(
            "POST",
            "/register",
            None,
            json!({
                "username": username,
                "first_name": "Test",
                "last_name": "User",
                "password": "hunter22",
            }),
        ),
    )
    .await;
    response.status()
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/login",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    let body = body_json(response).await;
    body["session_token"].as_str().expect("no token").to_string()
}

async fn create_post(app: &Router, token: &str, content: &str) {
    let boundary = "mingle-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\n{content}\r\n--{boundary}--\r\n"
    );
    let response = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/stream")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Session-Token", token)
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn add_friend(app: &Router, token: &str, username: &str) -> StatusCode {
    let response = send(
        app,
        json_request("POST", "/friends", Some(token), json!({ "username": username })),
    )
    .await;
    response.status()
}

#[tokio::test]
async fn health_check_works() {
    let app = test_app();
    let response = send(&app, get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    assert_eq!(register(&app, "alice").await, StatusCode::CREATED);
    assert_eq!(register(&app, "alice").await, StatusCode::CONFLICT);

    // Exactly one account exists: the original credentials still log in
    let token = login(&app, "alice", "hunter22").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn login_failure_is_generic() {
    let app = test_app();
    register(&app, "alice").await;

    let wrong_password = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "alice", "password": "not-it" }),
        ),
    )
    .await;
    let unknown_user = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "nobody", "password": "not-it" }),
        ),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    // Identical bodies: nothing reveals whether the username existed
    let body_a = body_json(wrong_password).await;
    let body_b = body_json(unknown_user).await;
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn unauthenticated_requests_are_redirected() {
    let app = test_app();
    for uri in ["/stream", "/friends", "/profile", "/uploads/whatever.png"] {
        let response = send(&app, get_request(uri, None)).await;
        assert_eq!(
            response.status(),
            StatusCode::SEE_OTHER,
            "{uri} should redirect when unauthenticated"
        );
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}

#[tokio::test]
async fn stale_session_is_redirected() {
    let app = test_app();
    let response = send(&app, get_request("/stream", Some("not-a-real-token"))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn friend_add_has_distinct_outcomes() {
    let app = test_app();
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice", "hunter22").await;
    let bob = login(&app, "bob", "hunter22").await;

    // Unknown target
    assert_eq!(add_friend(&app, &alice, "nobody").await, StatusCode::NOT_FOUND);
    // Self-friend always fails
    assert_eq!(
        add_friend(&app, &alice, "alice").await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    // First add succeeds
    assert_eq!(add_friend(&app, &alice, "bob").await, StatusCode::CREATED);
    // Duplicate in the same direction
    assert_eq!(add_friend(&app, &alice, "bob").await, StatusCode::CONFLICT);
    // Duplicate in the reverse direction
    assert_eq!(add_friend(&app, &bob, "alice").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn feed_shows_own_and_friend_posts_newest_first() {
    let app = test_app();
    for name in ["alice", "bob", "carol"] {
        register(&app, name).await;
    }
    let alice = login(&app, "alice", "hunter22").await;
    let bob = login(&app, "bob", "hunter22").await;
    let carol = login(&app, "carol", "hunter22").await;

    create_post(&app, &alice, "alice first").await;
    create_post(&app, &bob, "bob post").await;
    create_post(&app, &carol, "carol post").await;
    create_post(&app, &alice, "alice second").await;

    add_friend(&app, &alice, "bob").await;

    let response = send(&app, get_request("/stream", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let feed = body_json(response).await;
    let contents: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content"].as_str().unwrap())
        .collect();

    // Alice's and Bob's posts, newest first; Carol's absent
    assert_eq!(contents, vec!["alice second", "bob post", "alice first"]);

    // One directed edge suffices in the other direction too: Bob sees Alice
    let response = send(&app, get_request("/stream", Some(&bob))).await;
    let feed = body_json(response).await;
    let authors: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["author_username"].as_str().unwrap())
        .collect();
    assert!(authors.contains(&"alice"));
    assert!(!authors.contains(&"carol"));
}

#[tokio::test]
async fn comments_are_gated_on_visibility_and_counted() {
    let app = test_app();
    for name in ["alice", "bob", "carol"] {
        register(&app, name).await;
    }
    let alice = login(&app, "alice", "hunter22").await;
    let bob = login(&app, "bob", "hunter22").await;
    let carol = login(&app, "carol", "hunter22").await;

    create_post(&app, &alice, "discuss").await;
    add_friend(&app, &alice, "bob").await;

    // Find the post id through Alice's feed
    let response = send(&app, get_request("/stream", Some(&alice))).await;
    let feed = body_json(response).await;
    let post_id = feed[0]["id"].as_str().unwrap().to_string();

    // Bob (friend) can read and comment
    let response = send(&app, get_request(&format!("/comments/{post_id}"), Some(&bob))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/comments/{post_id}"),
            Some(&bob),
            json!({ "content": "nice post" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Carol (not a friend) can do neither; the post's existence is not leaked
    let response = send(&app, get_request(&format!("/comments/{post_id}"), Some(&carol))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(
        &app,
        json_request(
            "POST",
            &format!("/comments/{post_id}"),
            Some(&carol),
            json!({ "content": "sneaky" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The displayed count equals the number of comment rows
    let response = send(&app, get_request("/stream", Some(&alice))).await;
    let feed = body_json(response).await;
    assert_eq!(feed[0]["comment_count"], 1);

    let response = send(&app, get_request(&format!("/comments/{post_id}"), Some(&alice))).await;
    let page = body_json(response).await;
    assert_eq!(page["comments"].as_array().unwrap().len(), 1);
    assert_eq!(page["comments"][0]["author_username"], "bob");
}

#[tokio::test]
async fn profile_update_round_trips() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/profile",
            Some(&alice),
            json!({
                "education": "PhD",
                "employment": "Engineer",
                "favorite_music": "X",
                "favorite_movie": "Y",
                "nationality": "Z",
                "birthday": "1990-01-01",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get_request("/profile", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["education"], "PhD");
    assert_eq!(profile["employment"], "Engineer");
    assert_eq!(profile["favorite_music"], "X");
    assert_eq!(profile["favorite_movie"], "Y");
    assert_eq!(profile["nationality"], "Z");
    assert_eq!(profile["birthday"], "1990-01-01");
}

#[tokio::test]
async fn profile_update_requires_every_field() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/profile",
            Some(&alice),
            json!({
                "education": "",
                "employment": "Engineer",
                "favorite_music": "X",
                "favorite_movie": "Y",
                "nationality": "Z",
                "birthday": "1990-01-01",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn post_image_is_stored_under_generated_key_and_served() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    let boundary = "mingle-test-boundary";
    let png_bytes = b"\x89PNG\r\n\x1a\nfake image data";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"content\"\r\n\r\nwith image\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"../../Sneaky Name.PNG\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(png_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/stream")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Session-Token", &alice)
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = body_json(response).await;

    // The stored key is generated, not the client filename
    let key = post["image"].as_str().expect("post should carry an image key");
    assert!(key.ends_with(".png"));
    assert!(!key.contains("Sneaky"));
    assert!(!key.contains('/'));

    // Served back with the right content type to an authenticated requester
    let response = send(&app, get_request(&format!("/uploads/{key}"), Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn upload_keys_are_validated_before_filesystem_access() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    // Traversal attempt, percent-encoded so it survives routing
    let response = send(
        &app,
        get_request("/uploads/..%2F..%2Fetc%2Fpasswd", Some(&alice)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown key
    let response = send(
        &app,
        get_request(
            &format!("/uploads/{}.png", uuid::Uuid::new_v4()),
            Some(&alice),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    let response = send(&app, get_request("/stream", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get_request("/logout", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = send(&app, get_request("/stream", Some(&alice))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn posted_content_is_sanitized_before_storage() {
    let app = test_app();
    register(&app, "alice").await;
    let alice = login(&app, "alice", "hunter22").await;

    create_post(&app, &alice, "hello <script>alert(1)</script>world").await;

    let response = send(&app, get_request("/stream", Some(&alice))).await;
    let feed = body_json(response).await;
    assert_eq!(feed[0]["content"], "hello alert(1)world");
}
