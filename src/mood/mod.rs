/// Mood verses
///
/// A user picks a mood category and is shown one verse from the catalog,
/// avoiding verses they already saw in the recent window.

mod catalog;
mod selector;
mod service;

pub use catalog::VerseCatalog;
pub use selector::{choose_verse, verse_key};
pub use service::MoodService;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One catalog record. Only the identifying fields are typed; the text
/// fields (arabic, translation, explanation, ...) pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub verse_id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference: Option<String>,

    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Verse {
    /// Verse with only an explicit id
    pub fn with_id(id: &str) -> Self {
        Self {
            verse_id: Some(id.to_string()),
            kind: None,
            source: None,
            reference: None,
            content: Map::new(),
        }
    }
}

/// Accept `"2:255"` as well as `255`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Response to a mood selection
#[derive(Debug, Clone, Serialize)]
pub struct MoodPick {
    pub mood: String,
    pub verse: Option<Verse>,
    /// Set when the category has nothing to show
    pub notice: Option<String>,
}
