/// Database models
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One of the two accounts
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub favorite_color: String,
    pub visit_count: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Mood journal row: which verse a user was shown for which mood on which day
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: i64,
    pub username: String,
    pub mood: String,
    pub date: NaiveDate,
    /// Verse key (explicit id or derived composite)
    pub verse_shown: String,
}

#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub username: String,
    pub mood: String,
    pub date: NaiveDate,
    pub verse_shown: String,
}

/// Love message
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Phrase {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub color: String,
    /// Comma-separated tags
    pub tags: Option<String>,
    pub is_favorite: bool,
    pub likes: i64,
    pub is_special: bool,
}

#[derive(Debug, Clone)]
pub struct NewPhrase {
    pub text: String,
    pub author: String,
    pub color: String,
    pub tags: Option<String>,
    pub is_special: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PhraseFilter {
    pub tag: Option<String>,
    pub favorites_only: bool,
}

/// Photo metadata; the bytes live in the blob backend under `storage_key`
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub storage_key: String,
    /// Public URL when the backend serves files itself
    pub url: Option<String>,
    pub caption: Option<String>,
    pub author: String,
    pub mime_type: String,
    pub file_size: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub storage_key: String,
    pub url: Option<String>,
    pub caption: Option<String>,
    pub author: String,
    pub mime_type: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Letter {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub sender: String,
    pub recipient: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLetter {
    pub title: String,
    pub content: String,
    pub sender: String,
    pub recipient: String,
}

/// Dated memory shown on the calendar; anniversaries recur every year
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date_memory: NaiveDate,
    pub author: String,
    pub is_anniversary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMemory {
    pub title: String,
    pub description: String,
    pub date_memory: NaiveDate,
    pub author: String,
    pub is_anniversary: bool,
}

/// Activity log row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub username: String,
    pub action: String,
    pub details: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 0;
        }
        (self.total + self.per_page - 1) / self.per_page
    }
}

/// Normalized 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: i64 = 10;
    pub const MAX_PER_PAGE: i64 = 50;
    /// Far past any real listing; keeps the offset well inside `i64`
    pub const MAX_PAGE: i64 = 1_000_000;

    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        assert_eq!(
            PageRequest::new(None, None),
            PageRequest { page: 1, per_page: 10 }
        );
        assert_eq!(
            PageRequest::new(Some(0), Some(500)),
            PageRequest { page: 1, per_page: 50 }
        );
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let request = PageRequest::new(Some(i64::MAX), Some(50));
        assert_eq!(request.page, PageRequest::MAX_PAGE);
        assert_eq!(request.offset(), (PageRequest::MAX_PAGE - 1) * 50);

        let request = PageRequest::new(Some(i64::MIN), None);
        assert_eq!(request.page, 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_total_pages() {
        let page: Page<()> = Page {
            items: vec![],
            page: 1,
            per_page: 10,
            total: 21,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
