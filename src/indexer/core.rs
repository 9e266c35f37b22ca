use super::IndexError;
use super::hash_cache::{FileHashCache, HASH_CACHE_FILE, content_hash};
use super::languages::LanguageRegistry;
use super::walker::{FileWalker, LibraryMode, absolute, path_key};
use crate::config::{ChunkingConfig, Config};
use crate::db::Db;
use crate::db::models::{ChunkHit, ChunkRecord};
use crate::embedder::{Embedder, EmbedderError};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, info, warn};

pub const INDEX_DB_FILE: &str = "index.db";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub total_files: usize,
    pub indexed: usize,
    pub skipped_unchanged: usize,
    pub chunks_created: usize,
    /// Files that vanished from disk and had their records purged.
    pub removed: usize,
    /// Files that could not be read as UTF-8 text.
    pub failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub indexed: bool,
    pub total_chunks: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone)]
struct ScopeSettings {
    chunking: ChunkingConfig,
    batch_size: usize,
    min_chunk_chars: usize,
}

/// One independently indexed partition: the project, or a library root.
///
/// Owns its database and hash cache; the embedder is shared. Indexing holds
/// the cache lock for the whole run, so concurrent index calls on the same
/// scope queue up.
pub struct IndexScope {
    name: String,
    root: PathBuf,
    mode: LibraryMode,
    walker: FileWalker,
    db: Arc<TokioMutex<Db>>,
    embedder: Arc<dyn Embedder>,
    hashes: TokioMutex<FileHashCache>,
    settings: ScopeSettings,
}

impl IndexScope {
    /// Open (or create) the scope stored under `scope_dir`.
    ///
    /// A populated hash cache over a missing or empty table is cleared here.
    pub fn open(
        name: impl Into<String>,
        root: &Path,
        scope_dir: &Path,
        mode: LibraryMode,
        walker: FileWalker,
        embedder: Arc<dyn Embedder>,
        config: &Config,
    ) -> Result<Self, IndexError> {
        let name = name.into();
        std::fs::create_dir_all(scope_dir)?;

        let db = Db::open(scope_dir.join(INDEX_DB_FILE), embedder.dimensions())?;
        let mut hashes = FileHashCache::load(scope_dir.join(HASH_CACHE_FILE));
        heal_cache(&name, &db, &mut hashes);

        Ok(Self {
            name,
            root: absolute(root),
            mode,
            walker,
            db: Arc::new(TokioMutex::new(db)),
            embedder,
            hashes: TokioMutex::new(hashes),
            settings: ScopeSettings {
                chunking: config.chunking.clone(),
                batch_size: config.index.batch_size.max(1),
                min_chunk_chars: config.index.min_chunk_chars,
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shared handle to the scope database.
    pub fn db(&self) -> Arc<TokioMutex<Db>> {
        Arc::clone(&self.db)
    }

    /// Incrementally index `dir` (the scope root when `None`).
    ///
    /// Unchanged files are skipped by content hash. Every record of a changed
    /// or vanished file is replaced in one transaction, and the hash cache is
    /// saved only after that commit. An embedding failure writes nothing.
    pub async fn index_directory(&self, dir: Option<&Path>) -> Result<IndexReport, IndexError> {
        let dir = absolute(dir.unwrap_or(&self.root));
        if !dir.is_dir() {
            return Err(IndexError::MissingRoot(dir));
        }

        let mut hashes = self.hashes.lock().await;

        let files: Vec<PathBuf> = self.walker.walk(&dir, self.mode, None).collect();
        info!(scope = %self.name, files = files.len(), "indexing started");

        let mut report = IndexReport {
            total_files: files.len(),
            ..Default::default()
        };
        let mut seen = HashSet::with_capacity(files.len());
        let mut stale: Vec<String> = Vec::new();
        let mut fresh_hashes: Vec<(String, String)> = Vec::new();
        let mut records: Vec<ChunkRecord> = Vec::new();

        for file in &files {
            let key = path_key(file);
            seen.insert(key.clone());

            let content = match std::fs::read_to_string(file) {
                Ok(c) => c,
                Err(e) => {
                    debug!("skipping {}: {e}", file.display());
                    report.failed += 1;
                    continue;
                }
            };

            let hash = content_hash(&content);
            if hashes.get(&key) == Some(hash.as_str()) {
                report.skipped_unchanged += 1;
                continue;
            }

            let Some(language) = LanguageRegistry::global().detect(file) else {
                continue;
            };

            records.extend(
                language
                    .chunk(&key, &content, &self.settings.chunking)
                    .into_iter()
                    .filter(|c| c.content.trim().chars().count() >= self.settings.min_chunk_chars)
                    .map(|c| ChunkRecord {
                        id: c.id(),
                        content: c.content,
                        source: c.file,
                        start_line: c.start_line,
                        end_line: c.end_line,
                        language: language.id().to_string(),
                    }),
            );
            stale.push(key.clone());
            fresh_hashes.push((key, hash));
            report.indexed += 1;
        }

        let prefix = format!("{}/", path_key(&dir).trim_end_matches('/'));
        let vanished: Vec<String> = hashes
            .keys_under(&prefix)
            .filter(|k| !seen.contains(*k) && !Path::new(k.as_str()).exists())
            .cloned()
            .collect();
        report.removed = vanished.len();
        stale.extend(vanished.iter().cloned());

        if stale.is_empty() {
            info!(scope = %self.name, skipped = report.skipped_unchanged, "index up to date");
            return Ok(report);
        }

        let vectors = self.embed_records(&records).await?;

        {
            let mut db = self.db.lock().await;
            db.replace_sources(&stale, &records, &vectors)?;
        }

        for (key, hash) in fresh_hashes {
            hashes.insert(key, hash);
        }
        for key in &vanished {
            hashes.remove(key);
        }
        hashes.save()?;

        report.chunks_created = records.len();
        info!(
            scope = %self.name,
            indexed = report.indexed,
            skipped = report.skipped_unchanged,
            chunks = report.chunks_created,
            removed = report.removed,
            "indexing finished"
        );
        Ok(report)
    }

    /// Embed record contents in sequential batches.
    async fn embed_records(&self, records: &[ChunkRecord]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut vectors = Vec::with_capacity(records.len());
        for (i, batch) in records.chunks(self.settings.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|r| r.content.clone()).collect();
            debug!(scope = %self.name, batch = i, size = texts.len(), "embedding batch");
            vectors.extend(self.embed_blocking(texts).await?);
        }
        Ok(vectors)
    }

    async fn embed_blocking(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, IndexError> {
        let embedder = Arc::clone(&self.embedder);
        let result = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            embedder.embed_batch(&refs)
        })
        .await
        .map_err(|e| EmbedderError::InferenceFailed(format!("embedding task failed: {e}")))?;
        Ok(result?)
    }

    /// Nearest chunks to `query`, best first. A cleared scope yields nothing.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        language: Option<&str>,
    ) -> Result<Vec<ChunkHit>, IndexError> {
        let vector = self
            .embed_blocking(vec![query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| EmbedderError::InferenceFailed("no query vector".to_string()))?;

        let db = self.db.lock().await;
        Ok(db.search_chunks(&vector, top_k, language)?)
    }

    /// Counts for the scope. Never fails: store errors read as unindexed.
    pub async fn status(&self) -> IndexStatus {
        let mut hashes = self.hashes.lock().await;
        let db = self.db.lock().await;
        heal_cache(&self.name, &db, &mut hashes);

        match db.chunk_stats() {
            Ok(Some((chunks, files))) => IndexStatus {
                indexed: true,
                total_chunks: chunks,
                total_files: files,
            },
            Ok(None) => IndexStatus::default(),
            Err(e) => {
                warn!(scope = %self.name, "status query failed: {e}");
                IndexStatus::default()
            }
        }
    }

    /// Drop the code tables and forget every file hash.
    pub async fn clear(&self) -> Result<(), IndexError> {
        let mut hashes = self.hashes.lock().await;
        let db = self.db.lock().await;
        db.drop_code_tables()?;
        hashes.clear();
        hashes.save()?;
        info!(scope = %self.name, "index cleared");
        Ok(())
    }

    /// Chunk count per language, most frequent first.
    pub async fn language_distribution(&self) -> Result<Vec<(String, usize)>, IndexError> {
        let db = self.db.lock().await;
        Ok(db.language_distribution()?)
    }
}

/// Clear a populated cache sitting over a missing or empty table.
fn heal_cache(scope: &str, db: &Db, hashes: &mut FileHashCache) {
    if hashes.is_empty() {
        return;
    }
    let diverged = match db.chunk_stats() {
        Ok(None) => true,
        Ok(Some((0, _))) => true,
        Ok(Some(_)) => false,
        // an unreadable table will be rebuilt on the next run anyway
        Err(_) => true,
    };
    if diverged {
        info!(%scope, entries = hashes.len(), "hash cache diverged from table, clearing");
        hashes.clear();
        if let Err(e) = hashes.save() {
            warn!(%scope, "failed to save hash cache: {e}");
        }
    }
}
