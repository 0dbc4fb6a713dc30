//! Shared harness for router-level tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use lune::{
    blob_store::DiskBlobBackend,
    clock::FixedClock,
    config::*,
    context::AppContext,
    db::{create_memory_pool, Repositories, SqliteStore},
    mood::VerseCatalog,
    server::build_router,
    session::MemorySessionStore,
};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;
use tower::ServiceExt;

pub const SAID_SECRET: &str = "La lune est belle ce soir";
pub const FANTA_SECRET: &str = "Oui c'est vrai, elle est magnifique";
pub const OVERRIDE_NAME: &str = "lune";
pub const OVERRIDE_SECRET: &str = "cle-secrete";

pub const CATALOG: &str = r#"{
    "heureux": [{"verse_id": "v1", "type": "coran", "translation": "Et c'est Lui qui fait rire"}],
    "triste": []
}"#;

pub fn config(unlock_at: Option<DateTime<Utc>>, blob_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 0,
            public_url: None,
            upload_limit: 64 * 1024,
        },
        storage: StorageConfig {
            data_directory: blob_dir.clone(),
            static_directory: blob_dir.join("static"),
            database: DatabaseConfig::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            blobstore: BlobstoreConfig::Disk {
                location: blob_dir.clone(),
            },
        },
        access: AccessConfig {
            unlock_at,
            override_name: Some(OVERRIDE_NAME.to_string()),
            override_secret: Some(OVERRIDE_SECRET.to_string()),
        },
        users: vec![
            UserSeed {
                name: "said".to_string(),
                secret: SAID_SECRET.to_string(),
                hints: [
                    "Une declaration d'amour japonaise".to_string(),
                    "Ca commence par 'La lune...'".to_string(),
                ],
                favorite_color: "#e1f5fe".to_string(),
            },
            UserSeed {
                name: "fanta".to_string(),
                secret: FANTA_SECRET.to_string(),
                hints: [
                    "Une reponse a un compliment".to_string(),
                    "Ca commence par 'Oui c'est vrai...'".to_string(),
                ],
                favorite_color: DEFAULT_COLOR.to_string(),
            },
        ],
        mood: MoodConfig {
            catalog_path: PathBuf::from("mood_verses.json"),
            window_days: 30,
        },
        session: SessionConfig {
            idle_days: 7,
            cookie_secure: false,
        },
        keepalive: KeepaliveConfig {
            enabled: false,
            interval_secs: 600,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            login_rps: 5,
        },
        logging: LoggingConfig {
            level: "lune=debug".to_string(),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub ctx: AppContext,
    pub clock: Arc<FixedClock>,
    pub store: Arc<SqliteStore>,
    pub sessions: Arc<MemorySessionStore>,
    _blobs: TempDir,
}

impl TestApp {
    pub async fn new(unlock_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self::with_config(now, |dir| config(unlock_at, dir)).await
    }

    /// Unlocked site, evening of 2025-10-01
    pub async fn unlocked() -> Self {
        Self::new(None, Utc.with_ymd_and_hms(2025, 10, 1, 20, 0, 0).unwrap()).await
    }

    pub async fn with_config(
        now: DateTime<Utc>,
        build: impl FnOnce(PathBuf) -> ServerConfig,
    ) -> Self {
        let blobs = tempfile::tempdir().unwrap();
        let config = build(blobs.path().to_path_buf());

        let store = Arc::new(SqliteStore::new(create_memory_pool().await.unwrap()));
        let clock = Arc::new(FixedClock::new(now));
        let backend = Arc::new(DiskBlobBackend::new(blobs.path().join("uploads")));
        let sessions = Arc::new(MemorySessionStore::new());

        let ctx = AppContext::from_parts(
            config,
            Repositories::from_store(store.clone()),
            backend,
            VerseCatalog::from_json(CATALOG).unwrap(),
            sessions.clone(),
            clock.clone(),
        );
        ctx.accounts.seed_users().await.unwrap();

        Self {
            router: build_router(ctx.clone()),
            ctx,
            clock,
            store,
            sessions,
            _blobs: blobs,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            json,
            bytes: bytes.to_vec(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, cookie, Body::empty(), None)).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(request(
            "POST",
            uri,
            cookie,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    /// Fail one login and return the session cookie it started
    pub async fn failed_login(&self, username: &str) -> String {
        let response = self
            .post_json(
                "/login",
                None,
                serde_json::json!({ "username": username, "password": "wrong" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        response.cookie().expect("session cookie")
    }

    /// Log in and return the session cookie
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.json);
        response.cookie().expect("session cookie")
    }
}

pub fn request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    /// `name=value` of the session cookie set by this response
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("lune_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}
