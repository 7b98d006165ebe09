//! Core record definitions.
//!
//! [`Thought`] and [`FavoriteSummary`] are the two persisted entities. The rest are
//! transient results from the enrichment gateway or derived views. Field names are
//! camelCase on the wire so both persistence adapters store the same document shape.

use serde::{Deserialize, Serialize};

/// A single captured idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    /// UUID v7 (time-sortable), assigned by the client at creation.
    pub id: String,
    /// Short title produced by enrichment. Never empty.
    pub title: String,
    /// Verbatim user text.
    pub content: String,
    /// Keyword tags in the order enrichment produced them. Duplicates are kept.
    pub tags: Vec<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl Thought {
    /// Build a new thought from classified output, stamping id and creation time.
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: super::new_id(),
            title: title.into(),
            content: content.into(),
            tags,
            created_at: super::now_timestamp(),
        }
    }

    /// Case-insensitive exact tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }
}

/// A generated reflection on one theme tag. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub theme: String,
    pub summary: String,
}

/// A daily summary the user chose to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSummary {
    pub id: String,
    pub theme: String,
    pub summary: String,
    /// RFC 3339 timestamp of the favorite action.
    pub favorited_at: String,
}

impl FavoriteSummary {
    pub fn from_daily(daily: &DailySummary) -> Self {
        Self {
            id: super::new_id(),
            theme: daily.theme.clone(),
            summary: daily.summary.clone(),
            favorited_at: super::now_timestamp(),
        }
    }

    /// Whether this favorite holds the same `(theme, summary)` pair.
    pub fn matches(&self, daily: &DailySummary) -> bool {
        self.theme == daily.theme && self.summary == daily.summary
    }
}

/// Gateway output for a raw piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedThought {
    pub title: String,
    /// The model's echo of the input. The session keeps the user's own text instead.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Gateway output for a query across the thought set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResult {
    pub summary: String,
    #[serde(default)]
    pub source_ids: Vec<String>,
}

/// A synthesis with its cited ids resolved to thoughts still in the store.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSynthesis {
    pub summary: String,
    pub sources: Vec<Thought>,
}

/// Tag frequency across the current thought set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagAggregate {
    pub tag: String,
    pub count: usize,
}

/// Full contents of an entity store, as written to local slots or exported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub thoughts: Vec<Thought>,
    pub favorites: Vec<FavoriteSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thought_serializes_camel_case() {
        let thought = Thought {
            id: "1".into(),
            title: "Title".into(),
            content: "body".into(),
            tags: vec!["a".into()],
            created_at: "2024-01-01T00:00:00+00:00".into(),
        };
        let json = serde_json::to_value(&thought).unwrap();
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00+00:00");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn has_tag_is_exact_and_case_insensitive() {
        let thought = Thought::new("t", "c", vec!["Planning".into()]);
        assert!(thought.has_tag("planning"));
        assert!(thought.has_tag("PLANNING"));
        assert!(!thought.has_tag("plan"));
    }

    #[test]
    fn favorite_matches_pair() {
        let daily = DailySummary {
            theme: "go".into(),
            summary: "Simple beats clever.".into(),
        };
        let fav = FavoriteSummary::from_daily(&daily);
        assert!(fav.matches(&daily));
        assert!(!fav.matches(&DailySummary {
            theme: "rust".into(),
            summary: "Simple beats clever.".into(),
        }));
    }

    #[test]
    fn synthesis_result_reads_source_ids() {
        let parsed: SynthesisResult =
            serde_json::from_str(r#"{"summary":"s","sourceIds":["a","b"]}"#).unwrap();
        assert_eq!(parsed.source_ids, vec!["a", "b"]);
    }
}
