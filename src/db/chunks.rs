use super::models::{ChunkHit, ChunkRecord, distance_to_score};
use super::{Db, serialize_vector};
use rusqlite::types::Value;
use rusqlite::{Error, Result, Transaction, params};

const CODE_TABLE: &str = "code_chunks";
const CODE_VEC_TABLE: &str = "vec_code_chunks";

fn code_schema(dimensions: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS code_chunks (
    pk INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    content TEXT NOT NULL,
    source TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    language TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_code_source ON code_chunks(source);
CREATE INDEX IF NOT EXISTS idx_code_language ON code_chunks(language);

CREATE VIRTUAL TABLE IF NOT EXISTS vec_code_chunks USING vec0(
    embedding FLOAT[{dimensions}]
);
"#
    )
}

fn map_record(row: &rusqlite::Row<'_>) -> Result<ChunkRecord> {
    Ok(ChunkRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        source: row.get(2)?,
        start_line: row.get::<_, i64>(3)? as usize,
        end_line: row.get::<_, i64>(4)? as usize,
        language: row.get(5)?,
    })
}

fn delete_source(tx: &Transaction<'_>, source: &str) -> Result<usize> {
    // vec0 tables do not cascade
    tx.execute(
        "DELETE FROM vec_code_chunks WHERE rowid IN (SELECT pk FROM code_chunks WHERE source = ?)",
        params![source],
    )?;
    tx.execute("DELETE FROM code_chunks WHERE source = ?", params![source])
}

impl Db {
    /// Whether both code tables are present.
    pub fn code_tables_exist(&self) -> Result<bool> {
        Ok(self.table_exists(CODE_TABLE)? && self.table_exists(CODE_VEC_TABLE)?)
    }

    /// Replace every record of the `stale` sources with `records`.
    ///
    /// Runs in one transaction: either all stale rows are gone and all new
    /// rows are in, or nothing changed. Returns the number of rows removed.
    pub fn replace_sources(
        &mut self,
        stale: &[String],
        records: &[ChunkRecord],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        if records.len() != embeddings.len() {
            return Err(Error::InvalidParameterCount(embeddings.len(), records.len()));
        }

        let schema = code_schema(self.dimensions());
        let tx = self.conn.transaction()?;
        tx.execute_batch(&schema)?;

        let mut removed = 0;
        for source in stale {
            removed += delete_source(&tx, source)?;
        }

        for (record, embedding) in records.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO code_chunks (id, content, source, start_line, end_line, language)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    record.id,
                    record.content,
                    record.source,
                    record.start_line as i64,
                    record.end_line as i64,
                    record.language
                ],
            )?;
            let pk = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO vec_code_chunks (rowid, embedding) VALUES (?, ?)",
                params![pk, serialize_vector(embedding)],
            )?;
        }

        tx.commit()?;
        Ok(removed)
    }

    /// Nearest chunks to `query_vector`, best first.
    ///
    /// A scope whose tables were dropped yields no hits.
    pub fn search_chunks(
        &self,
        query_vector: &[f32],
        top_k: usize,
        language: Option<&str>,
    ) -> Result<Vec<ChunkHit>> {
        if !self.code_tables_exist()? {
            return Ok(Vec::new());
        }

        let mut query = String::from(
            r#"
            SELECT
                c.id,
                c.content,
                c.source,
                c.start_line,
                c.end_line,
                c.language,
                vec_distance_l2(v.embedding, ?) AS distance
            FROM vec_code_chunks v
            JOIN code_chunks c ON v.rowid = c.pk
            "#,
        );
        let mut params: Vec<Value> = vec![Value::Blob(serialize_vector(query_vector))];

        if let Some(lang) = language {
            query.push_str(" WHERE c.language = ?");
            params.push(Value::Text(lang.to_string()));
        }
        query.push_str(" ORDER BY distance ASC LIMIT ?");
        params.push(Value::Integer(top_k as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            let distance: f64 = row.get(6)?;
            Ok(ChunkHit {
                record: map_record(row)?,
                score: distance_to_score(distance),
            })
        })?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    /// `(chunks, distinct sources)`, or `None` when the tables are absent.
    pub fn chunk_stats(&self) -> Result<Option<(usize, usize)>> {
        if !self.code_tables_exist()? {
            return Ok(None);
        }
        let (chunks, files): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT source) FROM code_chunks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Some((chunks as usize, files as usize)))
    }

    /// Chunk count per language, most frequent first.
    pub fn language_distribution(&self) -> Result<Vec<(String, usize)>> {
        if !self.code_tables_exist()? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT language, COUNT(*) AS n FROM code_chunks GROUP BY language ORDER BY n DESC, language",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        rows.collect()
    }

    /// Records of one source file in line order.
    pub fn chunks_for_source(&self, source: &str) -> Result<Vec<ChunkRecord>> {
        if !self.code_tables_exist()? {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, content, source, start_line, end_line, language
             FROM code_chunks WHERE source = ? ORDER BY start_line, pk",
        )?;
        let rows = stmt.query_map(params![source], map_record)?;
        rows.collect()
    }

    pub fn drop_code_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS vec_code_chunks; DROP TABLE IF EXISTS code_chunks;",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, start: usize, lang: &str, content: &str) -> ChunkRecord {
        ChunkRecord {
            id: format!("{source}:{start}-{}", start + 1),
            content: content.to_string(),
            source: source.to_string(),
            start_line: start,
            end_line: start + 1,
            language: lang.to_string(),
        }
    }

    #[test]
    fn test_replace_and_search() {
        let mut db = Db::open_in_memory(3).unwrap();
        assert!(!db.code_tables_exist().unwrap());

        let records = vec![
            record("a.rs", 1, "rust", "fn a() {}"),
            record("b.py", 1, "python", "def b(): pass"),
        ];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        db.replace_sources(&[], &records, &vectors).unwrap();
        assert!(db.code_tables_exist().unwrap());

        let hits = db.search_chunks(&[1.0, 0.0, 0.0], 10, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.source, "a.rs");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!(hits[0].score > hits[1].score);

        let hits = db.search_chunks(&[1.0, 0.0, 0.0], 10, Some("python")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.language, "python");
    }

    #[test]
    fn test_replace_removes_stale_sources() {
        let mut db = Db::open_in_memory(2).unwrap();
        let old = vec![record("a.rs", 1, "rust", "old one"), record("a.rs", 5, "rust", "old two")];
        db.replace_sources(&[], &old, &[vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();

        let new = vec![record("a.rs", 2, "rust", "new")];
        let removed = db
            .replace_sources(&["a.rs".to_string()], &new, &[vec![1.0, 1.0]])
            .unwrap();
        assert_eq!(removed, 2);

        let rows = db.chunks_for_source("a.rs").unwrap();
        assert_eq!(rows, new);
        assert_eq!(db.chunk_stats().unwrap(), Some((1, 1)));
        let hits = db.search_chunks(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let mut db = Db::open_in_memory(2).unwrap();
        let records = vec![record("a.rs", 1, "rust", "x")];
        assert!(db.replace_sources(&[], &records, &[]).is_err());
        assert!(!db.code_tables_exist().unwrap());
    }

    #[test]
    fn test_drop_and_search_absent() {
        let mut db = Db::open_in_memory(2).unwrap();
        db.replace_sources(&[], &[record("a.rs", 1, "rust", "x")], &[vec![0.5, 0.5]])
            .unwrap();
        db.drop_code_tables().unwrap();

        assert!(!db.code_tables_exist().unwrap());
        assert!(db.search_chunks(&[0.5, 0.5], 5, None).unwrap().is_empty());
        assert_eq!(db.chunk_stats().unwrap(), None);
        assert!(db.language_distribution().unwrap().is_empty());
    }

    #[test]
    fn test_language_distribution() {
        let mut db = Db::open_in_memory(1).unwrap();
        let records = vec![
            record("a.rs", 1, "rust", "x"),
            record("b.rs", 1, "rust", "y"),
            record("c.go", 1, "go", "z"),
        ];
        db.replace_sources(&[], &records, &[vec![1.0], vec![2.0], vec![3.0]])
            .unwrap();
        assert_eq!(
            db.language_distribution().unwrap(),
            vec![("rust".to_string(), 2), ("go".to_string(), 1)]
        );
    }
}
