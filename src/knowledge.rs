//! Free-text knowledge base stored beside the code index.
//!
//! Entries are embedded as `title\ncontent` and are never touched by code
//! re-indexing.

use crate::config::KnowledgeSettings;
use crate::db::Db;
use crate::db::models::{KnowledgeEntry, KnowledgeHit};
use crate::embedder::{Embedder, EmbedderError, cosine_similarity};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex as TokioMutex;
use tracing::info;

pub const DEFAULT_CATEGORY: &str = "general";
pub const GLOBAL_DB_FILE: &str = "knowledge.db";

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeStatus {
    pub total_entries: usize,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompactReport {
    pub removed: usize,
    pub kept: usize,
}

pub struct KnowledgeStore {
    db: Arc<TokioMutex<Db>>,
    embedder: Arc<dyn Embedder>,
    settings: KnowledgeSettings,
}

impl KnowledgeStore {
    /// Store living in an existing scope database.
    pub fn new(
        db: Arc<TokioMutex<Db>>,
        embedder: Arc<dyn Embedder>,
        settings: KnowledgeSettings,
    ) -> Self {
        Self {
            db,
            embedder,
            settings,
        }
    }

    /// Standalone store in `dir/knowledge.db`.
    pub fn open(
        dir: &Path,
        embedder: Arc<dyn Embedder>,
        settings: KnowledgeSettings,
    ) -> Result<Self, KnowledgeError> {
        std::fs::create_dir_all(dir)?;
        let db = Db::open(dir.join(GLOBAL_DB_FILE), embedder.dimensions())?;
        Ok(Self::new(Arc::new(TokioMutex::new(db)), embedder, settings))
    }

    async fn embed(&self, text: String) -> Result<Vec<f32>, KnowledgeError> {
        let embedder = Arc::clone(&self.embedder);
        let vector = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| EmbedderError::InferenceFailed(format!("embedding task failed: {e}")))??;
        Ok(vector)
    }

    /// Add an entry stamped now. `category` defaults to `general`.
    pub async fn add(
        &self,
        title: &str,
        content: &str,
        category: Option<&str>,
        tags: Vec<String>,
    ) -> Result<KnowledgeEntry, KnowledgeError> {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(12);

        let entry = KnowledgeEntry {
            id,
            title: title.to_string(),
            content: content.to_string(),
            category: category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            tags: tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            created_at: Utc::now(),
        };
        self.insert(&entry).await?;
        info!(id = %entry.id, category = %entry.category, "knowledge added");
        Ok(entry)
    }

    /// Embed and store a fully formed entry.
    pub async fn insert(&self, entry: &KnowledgeEntry) -> Result<(), KnowledgeError> {
        let vector = self.embed(format!("{}\n{}", entry.title, entry.content)).await?;
        self.db.lock().await.insert_knowledge(entry, &vector)?;
        Ok(())
    }

    /// Nearest entries to `query`, best first, without a relevance cut.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
        let vector = self.embed(query.to_string()).await?;
        let db = self.db.lock().await;
        Ok(db.search_knowledge(&vector, top_k, category)?)
    }

    /// [`search`](Self::search) minus hits below the configured relevance floor.
    pub async fn search_relevant(
        &self,
        query: &str,
        top_k: usize,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
        let floor = f64::from(self.settings.relevance_floor);
        let mut hits = self.search(query, top_k, category).await?;
        hits.retain(|h| h.score >= floor);
        Ok(hits)
    }

    /// Entries newest first.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        Ok(self.db.lock().await.list_knowledge(category)?)
    }

    pub async fn status(&self) -> Result<KnowledgeStatus, KnowledgeError> {
        let db = self.db.lock().await;
        Ok(KnowledgeStatus {
            total_entries: db.knowledge_count()?,
            categories: db.knowledge_categories()?,
        })
    }

    pub async fn remove(&self, id: &str) -> Result<bool, KnowledgeError> {
        let removed = self.db.lock().await.delete_knowledge(id)?;
        if removed {
            info!(%id, "knowledge removed");
        }
        Ok(removed)
    }

    /// Markdown dump grouped by category, categories sorted, entries newest
    /// first.
    pub async fn export(&self, category: Option<&str>) -> Result<String, KnowledgeError> {
        let entries = self.list(category).await?;

        let mut by_category: BTreeMap<&str, Vec<&KnowledgeEntry>> = BTreeMap::new();
        for entry in &entries {
            by_category.entry(&entry.category).or_default().push(entry);
        }

        let mut lines: Vec<String> = Vec::new();
        for (cat, group) in by_category {
            lines.push(format!("## {cat}"));
            for entry in group {
                if entry.tags.is_empty() {
                    lines.push(format!("### {}", entry.title));
                } else {
                    lines.push(format!("### {} [{}]", entry.title, entry.tags.join(",")));
                }
                lines.push(entry.content.clone());
                lines.push(String::new());
            }
        }
        Ok(lines.join("\n"))
    }

    /// Drop near-duplicate entries, keeping the newer of every pair whose
    /// cosine similarity reaches `threshold` (the configured one when `None`).
    pub async fn compact(&self, threshold: Option<f32>) -> Result<CompactReport, KnowledgeError> {
        let threshold = threshold.unwrap_or(self.settings.compaction_threshold);
        let mut db = self.db.lock().await;

        let mut vectors = db.knowledge_vectors()?;
        vectors.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut removed: HashSet<usize> = HashSet::new();
        for i in 0..vectors.len() {
            if removed.contains(&i) {
                continue;
            }
            for j in (i + 1)..vectors.len() {
                if removed.contains(&j) {
                    continue;
                }
                if cosine_similarity(&vectors[i].embedding, &vectors[j].embedding) >= threshold {
                    removed.insert(j);
                }
            }
        }

        let ids: Vec<String> = removed.iter().map(|&i| vectors[i].id.clone()).collect();
        if !ids.is_empty() {
            db.delete_knowledge_many(&ids)?;
        }

        let report = CompactReport {
            removed: ids.len(),
            kept: vectors.len() - ids.len(),
        };
        info!(removed = report.removed, kept = report.kept, threshold, "knowledge compacted");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::hash::HashEmbedder;
    use chrono::{TimeZone, Utc};

    fn store() -> KnowledgeStore {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(64));
        let db = Db::open_in_memory(64).unwrap();
        KnowledgeStore::new(
            Arc::new(TokioMutex::new(db)),
            embedder,
            KnowledgeSettings::default(),
        )
    }

    fn entry(id: &str, title: &str, secs: i64) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            title: title.to_string(),
            content: "Writes go through the outbox table".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: Vec::new(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = store();
        let added = store
            .add(
                "Outbox pattern",
                "All writes go through the outbox",
                None,
                vec!["arch".into(), " ".into()],
            )
            .await
            .unwrap();
        assert_eq!(added.id.len(), 12);
        assert!(added.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(added.category, "general");
        assert_eq!(added.tags, vec!["arch"]);

        let listed = store.list(None).await.unwrap();
        assert_eq!(listed, vec![added]);
    }

    #[tokio::test]
    async fn test_search_relevance_floor() {
        // unit vectors at right angles score 1/(1+sqrt 2), about 0.41
        let store = KnowledgeStore::new(
            Arc::new(TokioMutex::new(Db::open_in_memory(64).unwrap())),
            Arc::new(HashEmbedder::new(64)),
            KnowledgeSettings {
                relevance_floor: 0.5,
                ..Default::default()
            },
        );
        store
            .add("Retry policy", "http client retry backoff policy", Some("net"), vec![])
            .await
            .unwrap();
        store
            .add("Color palette", "sidebar uses muted blue tones", Some("ui"), vec![])
            .await
            .unwrap();

        let all = store.search("http client retry backoff", 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entry.title, "Retry policy");

        let relevant = store
            .search_relevant("http client retry backoff", 10, None)
            .await
            .unwrap();
        assert_eq!(relevant.len(), 1);

        let ui = store.search("retry", 10, Some("ui")).await.unwrap();
        assert_eq!(ui.len(), 1);
        assert_eq!(ui[0].entry.category, "ui");
    }

    #[tokio::test]
    async fn test_status_and_remove() {
        let store = store();
        let a = store.add("A title", "alpha content", Some("zeta"), vec![]).await.unwrap();
        store.add("B title", "beta content", Some("alpha"), vec![]).await.unwrap();

        let status = store.status().await.unwrap();
        assert_eq!(status.total_entries, 2);
        assert_eq!(status.categories, vec!["alpha", "zeta"]);

        assert!(store.remove(&a.id).await.unwrap());
        assert!(!store.remove(&a.id).await.unwrap());
        assert_eq!(store.status().await.unwrap().total_entries, 1);
    }

    #[tokio::test]
    async fn test_export_format() {
        let store = store();
        let mut first = entry("e1", "Older note", 100);
        first.category = "arch".into();
        first.tags = vec!["db".into(), "sql".into()];
        let mut second = entry("e2", "Newer note", 200);
        second.category = "arch".into();
        let third = entry("e3", "General note", 150);
        for e in [&first, &second, &third] {
            store.insert(e).await.unwrap();
        }

        let md = store.export(None).await.unwrap();
        let expected = "## arch\n\
                        ### Newer note\n\
                        Writes go through the outbox table\n\
                        \n\
                        ### Older note [db,sql]\n\
                        Writes go through the outbox table\n\
                        \n\
                        ## general\n\
                        ### General note\n\
                        Writes go through the outbox table\n";
        assert_eq!(md, expected);

        let only = store.export(Some("general")).await.unwrap();
        assert!(only.starts_with("## general\n"));
        assert!(!only.contains("## arch"));
    }

    #[tokio::test]
    async fn test_compact_keeps_newer_regardless_of_order() {
        for order in [[0usize, 1], [1, 0]] {
            let store = store();
            let entries = [entry("old00000000a", "Same", 100), entry("new00000000b", "Same", 200)];
            for &i in &order {
                store.insert(&entries[i]).await.unwrap();
            }
            store
                .insert(&KnowledgeEntry {
                    content: "completely unrelated payload".into(),
                    ..entry("other000000c", "Different", 50)
                })
                .await
                .unwrap();

            let report = store.compact(None).await.unwrap();
            assert_eq!(report, CompactReport { removed: 1, kept: 2 });

            let ids: Vec<String> = store.list(None).await.unwrap().into_iter().map(|e| e.id).collect();
            assert_eq!(ids, vec!["new00000000b", "other000000c"]);
        }
    }

    #[tokio::test]
    async fn test_compact_chain_visits_newest_first() {
        let store = store();
        for (id, secs) in [("c", 300), ("b", 200), ("a", 100)] {
            store.insert(&entry(id, "Same", secs)).await.unwrap();
        }
        let report = store.compact(Some(0.99)).await.unwrap();
        assert_eq!(report, CompactReport { removed: 2, kept: 1 });
        assert_eq!(store.list(None).await.unwrap()[0].id, "c");
    }

    #[tokio::test]
    async fn test_open_standalone_store() {
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(16));
        {
            let store =
                KnowledgeStore::open(dir.path(), Arc::clone(&embedder), KnowledgeSettings::default())
                    .unwrap();
            store.add("Persisted", "across opens", None, vec![]).await.unwrap();
        }
        let store = KnowledgeStore::open(dir.path(), embedder, KnowledgeSettings::default()).unwrap();
        assert_eq!(store.status().await.unwrap().total_entries, 1);
    }
}
