use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A code chunk ready to be written to a scope table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    /// `file:start-end`
    pub id: String,
    pub content: String,
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkHit {
    #[serde(flatten)]
    pub record: ChunkRecord,
    pub score: f64,
}

/// A free-text note, independent of the code index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeHit {
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
    pub score: f64,
}

/// Similarity score for an L2 distance, in `(0, 1]`.
pub fn distance_to_score(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}
