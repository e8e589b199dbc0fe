//! Classics corpus rows. Loaded offline by an ingestion script; read once at
//! startup into the in-memory index.

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::Db;

#[derive(Debug, Clone)]
pub struct ChunkRow {
    pub source: String,
    pub section: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

pub struct ClassicsStore {
    db: Db,
}

impl ClassicsStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn insert(&self, row: &ChunkRow, now: DateTime<FixedOffset>) -> Result<()> {
        let embedding_json = serde_json::to_string(&row.embedding)?;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO classics_chunks (source, section, content, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                row.source,
                row.section,
                row.content,
                embedding_json,
                now.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<ChunkRow>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT source, section, content, embedding FROM classics_chunks")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(source, section, content, embedding_json)| {
                let embedding: Vec<f32> = serde_json::from_str(&embedding_json).ok()?;
                Some(ChunkRow {
                    source,
                    section,
                    content,
                    embedding,
                })
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};

    #[test]
    fn insert_and_load_round_trip() {
        let s = ClassicsStore::new(crate::open_memory_db().unwrap());
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        s.insert(
            &ChunkRow {
                source: "A".into(),
                section: "갑목론".into(),
                content: "갑목은 곧게 자란다".into(),
                embedding: vec![0.1, 0.2, 0.3],
            },
            now,
        )
        .unwrap();
        let rows = s.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "A");
        assert_eq!(rows[0].embedding.len(), 3);
    }
}
