/// Verse selection policy
use crate::mood::Verse;
use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;

/// Stable identity of a verse in the mood history: the explicit id when
/// present, otherwise `type-source-reference` with `unknown` placeholders.
pub fn verse_key(verse: &Verse) -> String {
    if let Some(id) = verse.verse_id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    let part = |field: &Option<String>| {
        field
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or("unknown")
            .to_string()
    };

    format!(
        "{}-{}-{}",
        part(&verse.kind),
        part(&verse.source),
        part(&verse.reference)
    )
}

/// Pick uniformly among verses not in `recent`; once every verse has been
/// seen, pick uniformly among all of them. `None` only for an empty slice.
pub fn choose_verse<'a, R: Rng + ?Sized>(
    verses: &'a [Verse],
    recent: &HashSet<String>,
    rng: &mut R,
) -> Option<&'a Verse> {
    let fresh: Vec<&Verse> = verses
        .iter()
        .filter(|v| !recent.contains(&verse_key(v)))
        .collect();

    if fresh.is_empty() {
        verses.choose(rng)
    } else {
        fresh.choose(rng).copied()
    }
}
