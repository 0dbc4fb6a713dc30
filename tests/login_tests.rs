//! Login flow with progressive hints
mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_third_failure_reveals_secret() {
    let app = TestApp::unlocked().await;
    let said = app.ctx.config.user_seed("said").unwrap().clone();

    let first = app
        .post_json("/login", None, json!({ "username": "said", "password": "wrong" }))
        .await;
    assert_eq!(first.status, StatusCode::UNAUTHORIZED);
    assert_eq!(first.json["attempts"], 1);
    let cookie = first.cookie().unwrap();

    let mut hints = vec![first.json["hint"].as_str().map(str::to_string)];
    for expected in 2..=3 {
        let response = app
            .post_json(
                "/login",
                Some(&cookie),
                json!({ "username": "said", "password": "wrong" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["attempts"], expected);
        hints.push(response.json["hint"].as_str().map(str::to_string));
    }

    assert_eq!(hints[0].as_deref(), Some(said.hints[0].as_str()));
    assert_eq!(hints[1].as_deref(), Some(said.hints[1].as_str()));
    assert_eq!(hints[2].as_deref(), Some(SAID_SECRET));

    let status = app.get("/login", Some(&cookie)).await;
    assert_eq!(status.json["identity"], "said");
    assert_eq!(status.json["attempts"], 3);
    assert_eq!(status.json["hint"], SAID_SECRET);

    let response = app
        .post_json(
            "/login",
            Some(&cookie),
            json!({ "username": "said", "password": SAID_SECRET }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["username"], "said");
    assert_eq!(response.json["visit_count"], 1);

    let status = app.get("/login", Some(&cookie)).await;
    assert_eq!(status.json["logged_in_as"], "said");
    assert_eq!(status.json["attempts"], 0);
}

#[tokio::test]
async fn test_identity_is_normalized() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("  FANTA ", FANTA_SECRET).await;

    let me = app.get("/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json["username"], "fanta");
    assert_eq!(me.json["partner"], "said");
    assert_eq!(me.json["visit_count"], 1);
}

#[tokio::test]
async fn test_unknown_identity_gets_no_hint() {
    let app = TestApp::unlocked().await;
    let cookie = app.failed_login("inconnu").await;

    for _ in 0..3 {
        let response = app
            .post_json(
                "/login",
                Some(&cookie),
                json!({ "username": "inconnu", "password": "x" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(response.json["hint"].is_null());
    }
}

#[tokio::test]
async fn test_switching_identity_restarts_hints() {
    let app = TestApp::unlocked().await;
    let cookie = app.failed_login("said").await;

    for username in ["said", "fanta", "said"] {
        app.post_json(
            "/login",
            Some(&cookie),
            json!({ "username": username, "password": "wrong" }),
        )
        .await;
    }

    let status = app.get("/login", Some(&cookie)).await;
    assert_eq!(status.json["identity"], "said");
    assert_eq!(status.json["attempts"], 1);
}

#[tokio::test]
async fn test_counters_are_per_session() {
    let app = TestApp::unlocked().await;
    let first = app.failed_login("said").await;
    app.post_json(
        "/login",
        Some(&first),
        json!({ "username": "said", "password": "wrong" }),
    )
    .await;

    let second = app.failed_login("said").await;
    assert_ne!(first, second);

    let status = app.get("/login", Some(&second)).await;
    assert_eq!(status.json["attempts"], 1);
    let status = app.get("/login", Some(&first)).await;
    assert_eq!(status.json["attempts"], 2);
}

#[tokio::test]
async fn test_logout_ends_session_login() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("said", SAID_SECRET).await;
    assert_eq!(app.get("/me", Some(&cookie)).await.status, StatusCode::OK);

    let response = app.post_json("/logout", Some(&cookie), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.get("/me", Some(&cookie)).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rate_limited() {
    let app = TestApp::with_config(chrono::Utc::now(), |dir| {
        let mut config = config(None, dir);
        config.rate_limit.enabled = true;
        config.rate_limit.login_rps = 2;
        config
    })
    .await;

    let mut statuses = Vec::new();
    for _ in 0..5 {
        let response = app
            .post_json(
                "/login",
                None,
                json!({ "username": "said", "password": "wrong" }),
            )
            .await;
        statuses.push(response.status);
    }

    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
    // Reads are never limited
    assert_eq!(app.get("/login", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_reads_store_no_session() {
    let app = TestApp::unlocked().await;

    for _ in 0..500 {
        let response = app.get("/login", None).await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.cookie().is_none());
    }
    assert_eq!(app.get("/locked", None).await.cookie(), None);
    assert_eq!(app.sessions.len().await, 0);

    // A session appears once something is written to it
    app.failed_login("said").await;
    assert_eq!(app.sessions.len().await, 1);
}

#[tokio::test]
async fn test_unknown_cookie_is_not_stored() {
    let app = TestApp::unlocked().await;

    let response = app.get("/login", Some("lune_session=forged")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.cookie().is_none());
    assert_eq!(app.sessions.len().await, 0);
}
