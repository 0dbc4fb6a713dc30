//! Phrases, letters, photos, mood and memories through the router
mod common;

use axum::{body::Body, http::StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_content_requires_login() {
    let app = TestApp::unlocked().await;

    for uri in ["/", "/phrases", "/photos", "/letters", "/mood", "/me", "/memories", "/calendar", "/activity"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.json["error"], "AuthenticationRequired");
    }
}

#[tokio::test]
async fn test_phrases_flow() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("said", SAID_SECRET).await;

    let created = app
        .post_json(
            "/phrases",
            Some(&cookie),
            json!({ "text": "Tu es ma lune", "tags": "Lune, Nuit" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["author"], "said");
    assert_eq!(created.json["color"], "#ffdde1");
    assert_eq!(created.json["tags"], "lune,nuit");
    let id = created.json["id"].as_i64().unwrap();

    app.post_json("/phrases", Some(&cookie), json!({ "text": "Bonne nuit", "color": "#abc" }))
        .await;

    let rejected = app
        .post_json("/phrases", Some(&cookie), json!({ "text": "x", "color": "bleu" }))
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let listing = app.get("/phrases", Some(&cookie)).await;
    assert_eq!(listing.json["total"], 2);
    assert_eq!(listing.json["total_pages"], 1);

    let tagged = app.get("/phrases?tag=lune", Some(&cookie)).await;
    assert_eq!(tagged.json["total"], 1);

    let favorite = app
        .post_json(&format!("/phrases/{}/favorite", id), Some(&cookie), json!({}))
        .await;
    assert_eq!(favorite.json["is_favorite"], true);

    let liked = app
        .post_json(&format!("/phrases/{}/like", id), Some(&cookie), json!({}))
        .await;
    assert_eq!(liked.json["likes"], 1);

    let favorites = app.get("/phrases?favorites=true", Some(&cookie)).await;
    assert_eq!(favorites.json["total"], 1);
    assert_eq!(favorites.json["items"][0]["id"], id);

    let deleted = app
        .send(request("DELETE", &format!("/phrases/{}", id), Some(&cookie), Body::empty(), None))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app
        .post_json(&format!("/phrases/{}/like", id), Some(&cookie), json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_letters_go_to_partner() {
    let app = TestApp::unlocked().await;
    let said = app.login("said", SAID_SECRET).await;
    let fanta = app.login("fanta", FANTA_SECRET).await;

    let sent = app
        .post_json(
            "/letters",
            Some(&said),
            json!({ "title": "Pour toi", "content": "Regarde la lune ce soir." }),
        )
        .await;
    assert_eq!(sent.status, StatusCode::CREATED);
    assert_eq!(sent.json["recipient"], "fanta");
    let id = sent.json["id"].as_i64().unwrap();

    let inbox = app.get("/letters", Some(&fanta)).await;
    assert_eq!(inbox.json.as_array().unwrap().len(), 1);
    assert_eq!(inbox.json[0]["is_read"], false);

    assert_eq!(app.get("/letters", Some(&said)).await.json.as_array().unwrap().len(), 0);
    assert_eq!(app.get("/letters/sent", Some(&said)).await.json.as_array().unwrap().len(), 1);

    // Only the recipient may mark it read
    let response = app
        .post_json(&format!("/letters/{}/read", id), Some(&said), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .post_json(&format!("/letters/{}/read", id), Some(&fanta), json!({}))
        .await;
    assert_eq!(response.json["is_read"], true);
}

#[tokio::test]
async fn test_mood_single_verse_and_no_content() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("fanta", FANTA_SECRET).await;

    let page = app.get("/mood", Some(&cookie)).await;
    assert_eq!(page.json["categories"], json!(["heureux", "triste"]));

    for _ in 0..2 {
        let pick = app
            .post_json("/mood", Some(&cookie), json!({ "mood": "heureux" }))
            .await;
        assert_eq!(pick.status, StatusCode::OK);
        assert_eq!(pick.json["verse"]["verse_id"], "v1");
        assert!(pick.json["notice"].is_null());
    }

    for mood in ["triste", "colere"] {
        let pick = app
            .post_json("/mood", Some(&cookie), json!({ "mood": mood }))
            .await;
        assert_eq!(pick.status, StatusCode::OK);
        assert!(pick.json["verse"].is_null());
        assert!(pick.json["notice"].is_string());
    }

    let page = app.get("/mood", Some(&cookie)).await;
    let recent = page.json["recent"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|e| e["verse_shown"] == "v1"));
}

fn multipart_body(boundary: &str, filename: &str, data: &[u8], caption: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\n{c}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = boundary,
            c = caption,
            f = filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test]
async fn test_photo_upload_and_download() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("said", SAID_SECRET).await;

    let png: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];
    let boundary = "lune-boundary";
    let content_type = format!("multipart/form-data; boundary={}", boundary);

    let uploaded = app
        .send(request(
            "POST",
            "/photos",
            Some(&cookie),
            Body::from(multipart_body(boundary, "notre soiree.png", png, "La plage")),
            Some(&content_type),
        ))
        .await;
    assert_eq!(uploaded.status, StatusCode::CREATED, "{}", uploaded.json);
    let key = uploaded.json["storage_key"].as_str().unwrap();
    assert!(key.starts_with("20251001_200000_"), "{}", key);
    assert!(key.ends_with("_notre_soiree.png"), "{}", key);
    assert_eq!(uploaded.json["caption"], "La plage");
    let id = uploaded.json["id"].as_i64().unwrap();

    let raw = app.get(&format!("/photos/{}/raw", id), Some(&cookie)).await;
    assert_eq!(raw.status, StatusCode::OK);
    assert_eq!(raw.headers["content-type"], "image/png");
    assert_eq!(raw.bytes, png);

    let listing = app.get("/photos", Some(&cookie)).await;
    assert_eq!(listing.json["total"], 1);

    let rejected = app
        .send(request(
            "POST",
            "/photos",
            Some(&cookie),
            Body::from(multipart_body(boundary, "notes.txt", b"hello", "")),
            Some(&content_type),
        ))
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let deleted = app
        .send(request("DELETE", &format!("/photos/{}", id), Some(&cookie), Body::empty(), None))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get(&format!("/photos/{}/raw", id), Some(&cookie)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::unlocked().await;
    let response = app.get("/nowhere", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json["error"], "NotFound");
}

#[tokio::test]
async fn test_memories_and_calendar() {
    let app = TestApp::unlocked().await;
    let cookie = app.login("said", SAID_SECRET).await;

    let created = app
        .post_json(
            "/memories",
            Some(&cookie),
            json!({ "title": "Premier rendez-vous", "date": "2023-10-14", "is_anniversary": true }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.json);
    assert_eq!(created.json["author"], "said");
    assert_eq!(created.json["date_memory"], "2023-10-14");

    app.post_json(
        "/memories",
        Some(&cookie),
        json!({ "title": "Pique-nique", "description": "Au parc", "date": "2025-10-03" }),
    )
    .await;
    app.post_json(
        "/memories",
        Some(&cookie),
        json!({ "title": "Autre mois", "date": "2025-11-03" }),
    )
    .await;

    let rejected = app
        .post_json("/memories", Some(&cookie), json!({ "title": "  ", "date": "2025-10-03" }))
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    assert_eq!(app.get("/memories", Some(&cookie)).await.json.as_array().unwrap().len(), 3);

    // Defaults to the clock's month, October 2025
    let grid = app.get("/calendar", Some(&cookie)).await;
    assert_eq!(grid.status, StatusCode::OK);
    assert_eq!((grid.json["year"].clone(), grid.json["month"].clone()), (json!(2025), json!(10)));

    let days: Vec<&serde_json::Value> = grid.json["weeks"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|week| week.as_array().unwrap())
        .filter(|cell| !cell.is_null())
        .collect();
    assert_eq!(days.len(), 31);
    assert_eq!(days[0]["is_today"], true);
    assert_eq!(days[2]["memories"][0]["title"], "Pique-nique");
    assert_eq!(days[13]["memories"][0]["title"], "Premier rendez-vous");
    let total: usize = days.iter().map(|d| d["memories"].as_array().unwrap().len()).sum();
    assert_eq!(total, 2);

    let november = app.get("/calendar?year=2025&month=11", Some(&cookie)).await;
    assert_eq!(november.json["month"], 11);

    let invalid = app.get("/calendar?year=2025&month=13", Some(&cookie)).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let id = created.json["id"].as_i64().unwrap();
    let deleted = app
        .send(request("DELETE", &format!("/memories/{}", id), Some(&cookie), Body::empty(), None))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let again = app
        .send(request("DELETE", &format!("/memories/{}", id), Some(&cookie), Body::empty(), None))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_handlers_record_activity() {
    let app = TestApp::unlocked().await;
    let said = app.login("said", SAID_SECRET).await;
    let fanta = app.login("fanta", FANTA_SECRET).await;

    app.post_json("/phrases", Some(&said), json!({ "text": "Tu es ma lune" }))
        .await;
    app.post_json(
        "/letters",
        Some(&said),
        json!({ "title": "Pour toi", "content": "Regarde la lune." }),
    )
    .await;
    app.post_json("/mood", Some(&fanta), json!({ "mood": "heureux" }))
        .await;
    app.post_json(
        "/memories",
        Some(&fanta),
        json!({ "title": "Plage", "date": "2025-08-15" }),
    )
    .await;

    let feed = app.get("/activity", Some(&said)).await;
    assert_eq!(feed.status, StatusCode::OK);
    let actions: Vec<(String, String)> = feed
        .json
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["username"].as_str().unwrap().to_string(),
                a["action"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    for expected in [
        ("said", "login"),
        ("fanta", "login"),
        ("said", "phrase_added"),
        ("said", "letter_sent"),
        ("fanta", "mood_checked"),
        ("fanta", "memory_added"),
    ] {
        assert!(
            actions.contains(&(expected.0.to_string(), expected.1.to_string())),
            "missing {:?} in {:?}",
            expected,
            actions
        );
    }

    let limited = app.get("/activity?limit=2", Some(&said)).await;
    assert_eq!(limited.json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_home_summarises_for_user() {
    let app = TestApp::unlocked().await;
    let said = app.login("said", SAID_SECRET).await;
    let fanta = app.login("fanta", FANTA_SECRET).await;

    app.post_json("/phrases", Some(&said), json!({ "text": "Bonne nuit" }))
        .await;
    app.post_json(
        "/letters",
        Some(&said),
        json!({ "title": "Pour toi", "content": "A demain." }),
    )
    .await;

    let home = app.get("/", Some(&fanta)).await;
    assert_eq!(home.status, StatusCode::OK);
    assert_eq!(home.json["profile"]["username"], "fanta");
    assert_eq!(home.json["phrases"]["total"], 1);
    assert_eq!(home.json["unread_letters"], 1);

    let home = app.get("/", Some(&said)).await;
    assert_eq!(home.json["unread_letters"], 0);
}
