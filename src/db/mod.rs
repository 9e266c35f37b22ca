//! Vector store on SQLite and sqlite-vec.
//!
//! One database file per index scope. The code tables are created lazily on
//! the first write so a dropped scope is distinguishable from an empty one;
//! the knowledge table always exists.
use rusqlite::{Connection, OptionalExtension, Result};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use tracing::{debug, info};

pub mod chunks;
pub mod knowledge;
pub mod models;

const KNOWLEDGE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS knowledge (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'general',
    tags TEXT NOT NULL DEFAULT '',
    created_at DATETIME NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_knowledge_category ON knowledge(category);
CREATE INDEX IF NOT EXISTS idx_knowledge_created ON knowledge(created_at);
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// A SQLite connection with sqlite-vec loaded and the knowledge schema in
/// place.
pub struct Db {
    pub(crate) conn: Connection,
    dimensions: usize,
}

impl Db {
    /// Open the database at `path` for vectors of `dimensions` floats.
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening database: {}", path.display());
        init_sqlite_vec();
        Self::init(Connection::open(path)?, dimensions)
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory(dimensions: usize) -> Result<Self> {
        init_sqlite_vec();
        Self::init(Connection::open_in_memory()?, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        debug!("sqlite-vec version: {}", vec_version);

        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch(KNOWLEDGE_SCHEMA_SQL)?;

        Ok(Self { conn, dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub(crate) fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Serialize a float32 vector into the little-endian blob sqlite-vec reads.
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Inverse of [`serialize_vector`]. Trailing partial floats are ignored.
pub fn deserialize_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
