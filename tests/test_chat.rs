mod common;

use std::sync::Arc;

use common::{FailingClient, app_with, echo_app, get, peer, request, test_config, text};
use parley::http::request::Method;

#[tokio::test]
async fn test_post_then_get_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();

    let post = request(Method::POST, "/chat")
        .header("Content-Type", "application/json")
        .body(r#"{"prompt": "What is Rust?"}"#)
        .build()
        .unwrap();
    let created = router.route(&post, peer()).await;

    assert_eq!(created.status_code, 201);
    let location = created.header("Location").unwrap().to_string();
    let id = location.strip_prefix("/chat/").unwrap().to_string();
    assert_eq!(id.len(), 16);
    assert_eq!(text(&created), format!("id={}", id));

    let fetched = router.route(&get(&location), peer()).await;

    assert_eq!(fetched.status_code, 200);
    assert_eq!(text(&fetched), "echo: What is Rust?");
    assert_eq!(fetched.header("X-Model"), Some("gpt-3.5-turbo"));
    assert_eq!(fetched.header("X-Prompt-Tokens"), Some("3"));
    assert_eq!(fetched.header("X-Completion-Tokens"), Some("5"));
    assert_eq!(fetched.header("X-Total-Tokens"), Some("8"));
    assert_eq!(fetched.header("X-Created"), Some("1700000000"));
    assert_eq!(app.sessions.len(), 1);
}

#[tokio::test]
async fn test_form_and_raw_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();

    let form = request(Method::POST, "/chat")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("prompt=hello+world%21")
        .build()
        .unwrap();
    let created = router.route(&form, peer()).await;
    let fetched = router
        .route(&get(created.header("Location").unwrap()), peer())
        .await;
    assert_eq!(text(&fetched), "echo: hello world!");

    let raw = request(Method::POST, "/chat").body("  plain prompt\n").build().unwrap();
    let created = router.route(&raw, peer()).await;
    let fetched = router
        .route(&get(created.header("Location").unwrap()), peer())
        .await;
    assert_eq!(text(&fetched), "echo: plain prompt");
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();

    for body in ["", "   ", r#"{"prompt": ""}"#] {
        let post = request(Method::POST, "/chat")
            .header("Content-Type", "application/json")
            .body(body)
            .build()
            .unwrap();
        let response = router.route(&post, peer()).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(text(&response), "Missing or empty prompt");
    }
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_json_without_prompt_field_uses_whole_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();

    let post = request(Method::POST, "/chat")
        .header("Content-Type", "application/json")
        .body(r#"{"message":"hi"}"#)
        .build()
        .unwrap();
    let created = router.route(&post, peer()).await;
    assert_eq!(created.status_code, 201);

    let fetched = router
        .route(&get(created.header("Location").unwrap()), peer())
        .await;
    assert_eq!(text(&fetched), r#"echo: {"message":"hi"}"#);
}

#[tokio::test]
async fn test_client_failure_is_stored_as_error_text() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(&test_config(dir.path()), Arc::new(FailingClient));
    let router = app.router();

    let post = request(Method::POST, "/chat").body("hi").build().unwrap();
    let created = router.route(&post, peer()).await;
    assert_eq!(created.status_code, 201);

    let fetched = router
        .route(&get(created.header("Location").unwrap()), peer())
        .await;
    assert_eq!(fetched.status_code, 200);
    assert_eq!(text(&fetched), "Error: API returned status 429");
    assert_eq!(fetched.header("X-Model"), None);
}

#[tokio::test]
async fn test_method_and_path_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();

    let listing = router.route(&get("/chat"), peer()).await;
    assert_eq!(listing.status_code, 405);
    assert_eq!(listing.header("Allow"), Some("POST"));

    let delete = request(Method::DELETE, "/chat/abc").build().unwrap();
    let response = router.route(&delete, peer()).await;
    assert_eq!(response.status_code, 405);
    assert_eq!(response.header("Allow"), Some("GET, HEAD"));

    let unknown = router.route(&get("/chat/doesnotexist"), peer()).await;
    assert_eq!(unknown.status_code, 404);
    assert_eq!(text(&unknown), "Chat session not found: doesnotexist");

    assert_eq!(router.route(&get("/chat/a/b"), peer()).await.status_code, 404);
    assert_eq!(router.route(&get("/chat/"), peer()).await.status_code, 404);
}

#[tokio::test]
async fn test_disabled_chat_answers_503() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();
    app.settings.set_enabled(false);

    let post = request(Method::POST, "/chat").body("hi").build().unwrap();
    assert_eq!(router.route(&post, peer()).await.status_code, 503);

    app.settings.set_enabled(true);
    assert_eq!(router.route(&post, peer()).await.status_code, 201);
}

#[tokio::test]
async fn test_model_change_applies_to_new_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let app = echo_app(&test_config(dir.path()));
    let router = app.router();
    app.settings.set_model("gpt-4o");

    let post = request(Method::POST, "/chat").body("hi").build().unwrap();
    let created = router.route(&post, peer()).await;
    let fetched = router
        .route(&get(created.header("Location").unwrap()), peer())
        .await;

    assert_eq!(fetched.header("X-Model"), Some("gpt-4o"));
}
