use super::models::{KnowledgeEntry, KnowledgeHit, distance_to_score};
use super::{Db, deserialize_vector, serialize_vector};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Result, params};

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn map_entry(row: &rusqlite::Row<'_>) -> Result<KnowledgeEntry> {
    let tags: String = row.get(4)?;
    Ok(KnowledgeEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        tags: split_tags(&tags),
        created_at: row.get(5)?,
    })
}

/// Vector of one knowledge entry, as read back for compaction.
#[derive(Debug, Clone)]
pub struct KnowledgeVector {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub embedding: Vec<f32>,
}

impl Db {
    pub fn insert_knowledge(&self, entry: &KnowledgeEntry, embedding: &[f32]) -> Result<()> {
        self.conn.execute(
            "INSERT INTO knowledge (id, title, content, category, tags, created_at, embedding)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                entry.id,
                entry.title,
                entry.content,
                entry.category,
                entry.tags.join(","),
                entry.created_at,
                serialize_vector(embedding)
            ],
        )?;
        Ok(())
    }

    /// Nearest entries to `query_vector`, best first.
    pub fn search_knowledge(
        &self,
        query_vector: &[f32],
        top_k: usize,
        category: Option<&str>,
    ) -> Result<Vec<KnowledgeHit>> {
        let mut query = String::from(
            "SELECT id, title, content, category, tags, created_at,
                    vec_distance_l2(embedding, ?) AS distance
             FROM knowledge",
        );
        let mut params: Vec<Value> = vec![Value::Blob(serialize_vector(query_vector))];
        if let Some(cat) = category {
            query.push_str(" WHERE category = ?");
            params.push(Value::Text(cat.to_string()));
        }
        query.push_str(" ORDER BY distance ASC LIMIT ?");
        params.push(Value::Integer(top_k as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let distance: f64 = row.get(6)?;
            Ok(KnowledgeHit {
                entry: map_entry(row)?,
                score: distance_to_score(distance),
            })
        })?;
        rows.collect()
    }

    /// Entries newest first.
    pub fn list_knowledge(&self, category: Option<&str>) -> Result<Vec<KnowledgeEntry>> {
        let base = "SELECT id, title, content, category, tags, created_at FROM knowledge";
        let order = "ORDER BY created_at DESC, id";
        match category {
            Some(cat) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{base} WHERE category = ? {order}"))?;
                let rows = stmt.query_map(params![cat], map_entry)?;
                rows.collect()
            }
            None => {
                let mut stmt = self.conn.prepare(&format!("{base} {order}"))?;
                let rows = stmt.query_map([], map_entry)?;
                rows.collect()
            }
        }
    }

    pub fn knowledge_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM knowledge", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Distinct categories in sorted order.
    pub fn knowledge_categories(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT category FROM knowledge ORDER BY category")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    pub fn knowledge_vectors(&self) -> Result<Vec<KnowledgeVector>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at, embedding FROM knowledge")?;
        let rows = stmt.query_map([], |row| {
            let blob: Vec<u8> = row.get(2)?;
            Ok(KnowledgeVector {
                id: row.get(0)?,
                created_at: row.get(1)?,
                embedding: deserialize_vector(&blob),
            })
        })?;
        rows.collect()
    }

    /// Delete one entry. Returns whether a row was removed.
    pub fn delete_knowledge(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM knowledge WHERE id = ?", params![id])?;
        Ok(n > 0)
    }

    /// Delete many entries in one transaction.
    pub fn delete_knowledge_many(&mut self, ids: &[String]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        for id in ids {
            removed += tx.execute("DELETE FROM knowledge WHERE id = ?", params![id])?;
        }
        tx.commit()?;
        Ok(removed)
    }
}
