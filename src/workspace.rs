//! Wiring for one project: the shared embedder, the project and library
//! index scopes, the knowledge stores and the derived views.

use crate::analysis::diff::{self, DiffImpact};
use crate::analysis::{SourceFile, load_sources};
use crate::config::Config;
use crate::db::models::{ChunkHit, KnowledgeEntry, KnowledgeHit};
use crate::embedder::{Embedder, create_embedder};
use crate::indexer::core::{IndexReport, IndexScope, IndexStatus};
use crate::indexer::dependencies::DependencyResolver;
use crate::indexer::walker::{FileWalker, LibraryMode, absolute};
use crate::knowledge::{KnowledgeStatus, KnowledgeStore};
use crate::snapshot;
use crate::vcs::{Git, RecentChanges};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub const PROJECT_SCOPE: &str = "project";
const LIBRARY_DIR: &str = "libs";
const SUMMARY_KNOWLEDGE: usize = 10;
const SUMMARY_COMMITS: usize = 10;

/// Result of indexing one scope inside [`Workspace::index_all`].
#[derive(Debug, Serialize)]
pub struct ScopeReport {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IndexReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Knowledge entries consulted alongside every code search.
const KNOWLEDGE_HITS: usize = 3;

/// Code hits plus the project notes relevant to the same query.
#[derive(Debug, Serialize)]
pub struct CodeSearch {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeHit>,
    pub hits: Vec<ChunkHit>,
}

#[derive(Debug, Serialize)]
pub struct ScopeStatus {
    pub scope: String,
    pub root: String,
    #[serde(flatten)]
    pub status: IndexStatus,
}

#[derive(Debug, Serialize)]
pub struct RecentKnowledge {
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub project_root: String,
    pub index: IndexStatus,
    pub libraries: Vec<ScopeStatus>,
    pub knowledge: Option<KnowledgeStatus>,
    pub language_distribution: BTreeMap<String, usize>,
    pub recent_knowledge: Vec<RecentKnowledge>,
    pub recent_git: Option<RecentChanges>,
}

pub struct Workspace {
    root: PathBuf,
    data_dir: PathBuf,
    config: Arc<Config>,
    embedder: Arc<dyn Embedder>,
    walker: FileWalker,
    project: Arc<IndexScope>,
    libraries: Vec<Arc<IndexScope>>,
    knowledge: KnowledgeStore,
    global_knowledge: Option<KnowledgeStore>,
    git: Git,
}

impl Workspace {
    /// Build the embedder from `config` and open every scope.
    pub async fn open(root: &Path, config: Config) -> Result<Self> {
        config.validate()?;
        let embedding = config.embedding.clone();
        let embedder = tokio::task::spawn_blocking(move || create_embedder(&embedding))
            .await
            .context("embedder setup task failed")??;
        Self::with_embedder(root, config, embedder)
    }

    /// Open every scope around an existing embedder.
    pub fn with_embedder(root: &Path, config: Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        let root = absolute(root);
        anyhow::ensure!(root.is_dir(), "project root not found: {}", root.display());

        let data_dir = config.data_dir_for(&root);
        let walker = FileWalker::from_config(&walker_config(&config, &data_dir), &root);

        let project = IndexScope::open(
            PROJECT_SCOPE,
            &root,
            &data_dir.join(PROJECT_SCOPE),
            LibraryMode::Exclude,
            walker.clone(),
            Arc::clone(&embedder),
            &config,
        )
        .context("opening project scope")?;

        let mut libraries = Vec::new();
        for (name, lib_root) in config
            .walker
            .library_roots
            .iter()
            .zip(config.library_paths(&root))
        {
            if !lib_root.is_dir() {
                warn!(library = %name, "library root not found, skipping");
                continue;
            }
            let scope_name = library_scope_name(name);
            let scope = IndexScope::open(
                scope_name.clone(),
                &lib_root,
                &data_dir.join(LIBRARY_DIR).join(&scope_name),
                LibraryMode::Ignore,
                walker.clone(),
                Arc::clone(&embedder),
                &config,
            )
            .with_context(|| format!("opening library scope {scope_name}"))?;
            libraries.push(Arc::new(scope));
        }

        let knowledge = KnowledgeStore::new(
            project.db(),
            Arc::clone(&embedder),
            config.knowledge.clone(),
        );
        let global_knowledge = match config.global_dir_for(&root) {
            Some(dir) => Some(
                KnowledgeStore::open(&dir, Arc::clone(&embedder), config.knowledge.clone())
                    .with_context(|| format!("opening global knowledge in {}", dir.display()))?,
            ),
            None => None,
        };

        info!(
            root = %root.display(),
            libraries = libraries.len(),
            global = global_knowledge.is_some(),
            "workspace ready"
        );
        Ok(Self {
            git: Git::new(&root),
            root,
            data_dir,
            config: Arc::new(config),
            embedder,
            walker,
            project: Arc::new(project),
            libraries,
            knowledge,
            global_knowledge,
        })
    }

    /// Rebuild every scope from `config`, keeping the embedder.
    pub fn reinitialize(&mut self, config: Config) -> Result<()> {
        let rebuilt = Self::with_embedder(&self.root, config, Arc::clone(&self.embedder))?;
        *self = rebuilt;
        info!("workspace reinitialized");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project(&self) -> &Arc<IndexScope> {
        &self.project
    }

    pub fn libraries(&self) -> &[Arc<IndexScope>] {
        &self.libraries
    }

    /// The project scope or the library scope called `name`.
    pub fn scope(&self, name: &str) -> Option<&Arc<IndexScope>> {
        std::iter::once(&self.project)
            .chain(&self.libraries)
            .find(|s| s.name() == name)
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn global_knowledge(&self) -> Option<&KnowledgeStore> {
        self.global_knowledge.as_ref()
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    /// Index the project and every library scope in parallel.
    pub async fn index_all(&self) -> Vec<ScopeReport> {
        let mut join_set = JoinSet::new();
        for scope in std::iter::once(&self.project).chain(&self.libraries) {
            let scope = Arc::clone(scope);
            join_set.spawn(async move {
                let result = scope.index_directory(None).await;
                (scope.name().to_string(), result)
            });
        }

        let mut reports = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let Ok((scope, result)) = joined else {
                warn!("indexing task panicked");
                continue;
            };
            reports.push(match result {
                Ok(report) => ScopeReport {
                    scope,
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    warn!(%scope, "indexing failed: {e}");
                    ScopeReport {
                        scope,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }
        reports.sort_by(|a, b| a.scope.cmp(&b.scope));
        reports
    }

    /// Search one scope, or every scope merged by score.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        language: Option<&str>,
        scope: Option<&str>,
    ) -> Result<Vec<ChunkHit>> {
        let top_k = top_k.unwrap_or(self.config.index.search_top_k);
        let scopes: Vec<&Arc<IndexScope>> = match scope {
            Some(name) => vec![
                self.scope(name)
                    .ok_or_else(|| anyhow!("unknown scope {name:?}"))?,
            ],
            None => std::iter::once(&self.project).chain(&self.libraries).collect(),
        };

        let mut hits = Vec::new();
        for scope in scopes {
            hits.extend(scope.search(query, top_k, language).await?);
        }
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// [`search`](Self::search) plus knowledge entries above the relevance
    /// floor. A failing knowledge store only drops the notes.
    pub async fn search_with_knowledge(
        &self,
        query: &str,
        top_k: Option<usize>,
        language: Option<&str>,
        scope: Option<&str>,
    ) -> Result<CodeSearch> {
        let hits = self.search(query, top_k, language, scope).await?;
        let knowledge = match self.knowledge.search_relevant(query, KNOWLEDGE_HITS, None).await {
            Ok(found) => found,
            Err(e) => {
                warn!("knowledge lookup failed: {e}");
                Vec::new()
            }
        };
        Ok(CodeSearch { knowledge, hits })
    }

    pub async fn statuses(&self) -> Vec<ScopeStatus> {
        let mut out = Vec::new();
        for scope in std::iter::once(&self.project).chain(&self.libraries) {
            out.push(ScopeStatus {
                scope: scope.name().to_string(),
                root: scope.root().display().to_string(),
                status: scope.status().await,
            });
        }
        out
    }

    /// Readable project files, excluding library roots.
    pub fn sources(&self, language: Option<&str>) -> Vec<SourceFile> {
        load_sources(&self.walker, &self.root, language)
    }

    pub fn dependency_resolver(&self) -> DependencyResolver {
        DependencyResolver::new(&self.root, self.walker.clone())
    }

    /// Index status, knowledge status, language mix, recent notes and recent
    /// history in one report.
    pub async fn project_summary(&self) -> ProjectSummary {
        let index = self.project.status().await;
        let libraries = self.statuses().await.into_iter().skip(1).collect();

        let knowledge = match self.knowledge.status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("knowledge status failed: {e}");
                None
            }
        };
        let language_distribution = match self.project.language_distribution().await {
            Ok(rows) => rows.into_iter().collect(),
            Err(e) => {
                warn!("language distribution failed: {e}");
                BTreeMap::new()
            }
        };
        let recent_knowledge = self
            .knowledge
            .list(None)
            .await
            .unwrap_or_default()
            .into_iter()
            .take(SUMMARY_KNOWLEDGE)
            .map(|e: KnowledgeEntry| RecentKnowledge {
                title: e.title,
                category: e.category,
                tags: e.tags,
            })
            .collect();

        ProjectSummary {
            project_root: self.root.display().to_string(),
            index,
            libraries,
            knowledge,
            language_distribution,
            recent_knowledge,
            recent_git: self.git.recent_changes(SUMMARY_COMMITS).await,
        }
    }

    /// Impact of the working tree's changes against `reference` (`HEAD` when
    /// absent).
    pub async fn analyze_diff(&self, reference: Option<&str>) -> Result<DiffImpact> {
        let text = self
            .git
            .diff(reference)
            .await
            .ok_or_else(|| anyhow!("git diff failed or timed out"))?;
        Ok(diff::analyze(
            &self.root,
            &text,
            reference.unwrap_or("HEAD"),
            &self.dependency_resolver(),
        ))
    }

    pub async fn save_snapshot(&self, data: Value) -> Result<PathBuf> {
        let branch = self.git.current_branch().await;
        let path = snapshot::save_snapshot(&self.data_dir, data, branch.as_deref())?;
        info!(path = %path.display(), "snapshot saved");
        Ok(path)
    }

    pub fn load_snapshot(&self) -> Result<Option<Value>> {
        snapshot::load_snapshot(&self.data_dir)
    }
}

/// Walker settings that also prune the data directory.
fn walker_config(config: &Config, data_dir: &Path) -> Config {
    let mut config = config.clone();
    if let Some(name) = data_dir.file_name().map(|n| n.to_string_lossy().into_owned())
        && !config.walker.ignore_dirs.contains(&name)
    {
        config.walker.ignore_dirs.push(name);
    }
    config
}

/// Directory-safe scope name for a configured library root.
fn library_scope_name(configured: &str) -> String {
    let name: String = configured
        .trim_matches(|c: char| c == '/' || c == '.')
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "lib".to_string()
    } else {
        name
    }
}
