/// Configuration management for Lune
use crate::error::{LuneError, LuneResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Main server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
    pub users: Vec<UserSeed>,
    pub mood: MoodConfig,
    pub session: SessionConfig,
    pub keepalive: KeepaliveConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable URL, used by the keepalive job
    pub public_url: Option<String>,
    /// Maximum photo upload size in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub static_directory: PathBuf,
    pub database: DatabaseConfig,
    pub blobstore: BlobstoreConfig,
}

/// Relational backend selection
#[derive(Debug, Clone)]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf },
    Postgres { url: String },
}

/// Blob storage configuration
#[derive(Debug, Clone)]
pub enum BlobstoreConfig {
    Disk {
        location: PathBuf,
    },
    Cloudinary {
        cloud_name: String,
        api_key: String,
        api_secret: String,
        folder: String,
    },
}

/// Time-lock configuration
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Instant before which the site is locked. `None` disables the lock.
    pub unlock_at: Option<DateTime<Utc>>,
    pub override_name: Option<String>,
    pub override_secret: Option<String>,
}

/// One of the two seeded identities
#[derive(Debug, Clone)]
pub struct UserSeed {
    /// Normalized (trimmed, lower-case) username
    pub name: String,
    pub secret: String,
    /// Thematic hint, then partial phrase
    pub hints: [String; 2],
    pub favorite_color: String,
}

/// Mood verse configuration
#[derive(Debug, Clone)]
pub struct MoodConfig {
    pub catalog_path: PathBuf,
    /// Trailing window, in days, during which a shown verse is avoided
    pub window_days: i64,
}

/// Session cookie configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_days: i64,
    pub cookie_secure: bool,
}

/// Self-ping configuration
#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per second allowed on the login and unlock endpoints
    pub login_rps: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

pub const DEFAULT_COLOR: &str = "#ffdde1";

/// Upper bounds keep `now - days` inside chrono's range
pub const MAX_WINDOW_DAYS: i64 = 3650;
pub const MAX_IDLE_DAYS: i64 = 365;

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> LuneResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("LUNE_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("LUNE_PORT", 5000u16)?;
        let public_url = env::var("LUNE_PUBLIC_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        let upload_limit = parse_var("LUNE_UPLOAD_LIMIT", 16 * 1024 * 1024usize)?;

        let data_directory: PathBuf = env::var("LUNE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let static_directory = env::var("LUNE_STATIC_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("static"));

        let database = match env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()) {
            Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                DatabaseConfig::Postgres {
                    url: normalize_postgres_url(&url),
                }
            }
            Some(url) => {
                return Err(LuneError::Validation(format!(
                    "Unsupported DATABASE_URL scheme: {}",
                    url.split(':').next().unwrap_or_default()
                )))
            }
            None => DatabaseConfig::Sqlite {
                path: env::var("LUNE_SQLITE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_directory.join("lune.sqlite")),
            },
        };

        let blobstore = if let Ok(cloud_name) = env::var("CLOUDINARY_CLOUD_NAME") {
            BlobstoreConfig::Cloudinary {
                cloud_name,
                api_key: env::var("CLOUDINARY_API_KEY")
                    .map_err(|_| LuneError::Validation("Cloudinary API key required".to_string()))?,
                api_secret: env::var("CLOUDINARY_API_SECRET").map_err(|_| {
                    LuneError::Validation("Cloudinary API secret required".to_string())
                })?,
                folder: env::var("LUNE_CLOUDINARY_FOLDER")
                    .unwrap_or_else(|_| "love_app".to_string()),
            }
        } else {
            BlobstoreConfig::Disk {
                location: env::var("LUNE_BLOBSTORE_DISK_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_directory.join("uploads")),
            }
        };

        let unlock_at = match env::var("LUNE_UNLOCK_AT") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_instant(&raw)?),
            _ => None,
        };

        let users = vec![load_user_seed(1)?, load_user_seed(2)?];

        let catalog_path = env::var("LUNE_VERSE_CATALOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./mood_verses.json"));

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                static_directory,
                database,
                blobstore,
            },
            access: AccessConfig {
                unlock_at,
                override_name: non_empty_var("LUNE_OVERRIDE_NAME"),
                override_secret: non_empty_var("LUNE_OVERRIDE_SECRET"),
            },
            users,
            mood: MoodConfig {
                catalog_path,
                window_days: parse_var("LUNE_MOOD_WINDOW_DAYS", 30i64)?,
            },
            session: SessionConfig {
                idle_days: parse_var("LUNE_SESSION_IDLE_DAYS", 7i64)?,
                cookie_secure: parse_var("LUNE_COOKIE_SECURE", true)?,
            },
            keepalive: KeepaliveConfig {
                enabled: parse_var("LUNE_KEEPALIVE_ENABLED", false)?,
                interval_secs: parse_var("LUNE_KEEPALIVE_INTERVAL", 600u64)?,
            },
            rate_limit: RateLimitConfig {
                enabled: parse_var("LUNE_RATE_LIMITS_ENABLED", true)?,
                login_rps: parse_var("LUNE_LOGIN_RPS", 5u32)?,
            },
            logging: LoggingConfig {
                level: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "lune=debug,tower_http=debug".to_string()),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> LuneResult<()> {
        if self.users.len() != 2 {
            return Err(LuneError::Validation(
                "Exactly two users must be configured".to_string(),
            ));
        }

        if self.users[0].name == self.users[1].name {
            return Err(LuneError::Validation(
                "The two configured users must have distinct names".to_string(),
            ));
        }

        for user in &self.users {
            if user.name.is_empty() || user.secret.is_empty() {
                return Err(LuneError::Validation(
                    "User names and secrets cannot be empty".to_string(),
                ));
            }
        }

        if self.access.unlock_at.is_some()
            && (self.access.override_name.is_none() || self.access.override_secret.is_none())
        {
            return Err(LuneError::Validation(
                "Override name and secret are required when an unlock date is set".to_string(),
            ));
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&self.mood.window_days) {
            return Err(LuneError::Validation(format!(
                "Mood window must be between 1 and {} days",
                MAX_WINDOW_DAYS
            )));
        }

        if !(1..=MAX_IDLE_DAYS).contains(&self.session.idle_days) {
            return Err(LuneError::Validation(format!(
                "Session lifetime must be between 1 and {} days",
                MAX_IDLE_DAYS
            )));
        }

        Ok(())
    }

    /// Seed for a normalized username, if it is one of the two configured users
    pub fn user_seed(&self, username: &str) -> Option<&UserSeed> {
        self.users.iter().find(|u| u.name == username)
    }

    /// The user that is not `username`
    pub fn partner_of(&self, username: &str) -> Option<&UserSeed> {
        if self.user_seed(username).is_none() {
            return None;
        }
        self.users.iter().find(|u| u.name != username)
    }
}

/// Parse an unlock instant: RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` taken as UTC
pub fn parse_instant(raw: &str) -> LuneResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(LuneError::Validation(format!("Invalid unlock instant: {}", raw)))
}

fn normalize_postgres_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

fn load_user_seed(index: u8) -> LuneResult<UserSeed> {
    let prefix = format!("LUNE_USER{}", index);
    let name = env::var(format!("{}_NAME", prefix))
        .map_err(|_| LuneError::Validation(format!("{}_NAME required", prefix)))?;
    let secret = env::var(format!("{}_SECRET", prefix))
        .map_err(|_| LuneError::Validation(format!("{}_SECRET required", prefix)))?;

    Ok(UserSeed {
        name: crate::account::normalize_identity(&name),
        secret,
        hints: [
            env::var(format!("{}_HINT1", prefix)).unwrap_or_default(),
            env::var(format!("{}_HINT2", prefix)).unwrap_or_default(),
        ],
        favorite_color: env::var(format!("{}_COLOR", prefix))
            .unwrap_or_else(|_| DEFAULT_COLOR.to_string()),
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> LuneResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| LuneError::Validation(format!("Invalid value for {}", key))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "127.0.0.1".to_string(),
            port: 5000,
            public_url: None,
            upload_limit: 1024 * 1024,
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            static_directory: PathBuf::from("./data/static"),
            database: DatabaseConfig::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            blobstore: BlobstoreConfig::Disk {
                location: PathBuf::from("./data/uploads"),
            },
        },
        access: AccessConfig {
            unlock_at: None,
            override_name: None,
            override_secret: None,
        },
        users: vec![
            UserSeed {
                name: "said".to_string(),
                secret: "La lune est belle ce soir".to_string(),
                hints: [
                    "Pense a une declaration d'amour japonaise...".to_string(),
                    "Ca commence par 'La lune...'".to_string(),
                ],
                favorite_color: "#e1f5fe".to_string(),
            },
            UserSeed {
                name: "fanta".to_string(),
                secret: "Oui c'est vrai, elle est magnifique".to_string(),
                hints: [
                    "C'est une reponse a un compliment sur la beaute...".to_string(),
                    "Ca commence par 'Oui c'est vrai...'".to_string(),
                ],
                favorite_color: DEFAULT_COLOR.to_string(),
            },
        ],
        mood: MoodConfig {
            catalog_path: PathBuf::from("./mood_verses.json"),
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
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_instant_naive() {
        let parsed = parse_instant("2025-09-27T00:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 9, 27, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_instant_rfc3339_offset() {
        let parsed = parse_instant("2025-09-27T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 9, 27, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        assert!(parse_instant("next friday").is_err());
    }

    #[test]
    fn test_postgres_url_normalized() {
        assert_eq!(
            normalize_postgres_url("postgres://u:p@host/db"),
            "postgresql://u:p@host/db"
        );
        assert_eq!(
            normalize_postgres_url("postgresql://u:p@host/db"),
            "postgresql://u:p@host/db"
        );
    }

    #[test]
    fn test_validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_override_when_locked() {
        let mut config = test_config();
        config.access.unlock_at = Some(Utc.with_ymd_and_hms(2025, 9, 27, 0, 0, 0).unwrap());
        assert!(config.validate().is_err());

        config.access.override_name = Some("gardien".to_string());
        config.access.override_secret = Some("clair de lune".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_users() {
        let mut config = test_config();
        config.users[1].name = "said".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_day_counts() {
        let mut config = test_config();
        config.mood.window_days = i64::MAX;
        assert!(matches!(config.validate(), Err(LuneError::Validation(_))));
        config.mood.window_days = MAX_WINDOW_DAYS;
        assert!(config.validate().is_ok());
        config.mood.window_days = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.session.idle_days = MAX_IDLE_DAYS + 1;
        assert!(matches!(config.validate(), Err(LuneError::Validation(_))));
        config.session.idle_days = MAX_IDLE_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partner_of() {
        let config = test_config();
        assert_eq!(config.partner_of("said").unwrap().name, "fanta");
        assert_eq!(config.partner_of("fanta").unwrap().name, "said");
        assert!(config.partner_of("stranger").is_none());
    }
}
