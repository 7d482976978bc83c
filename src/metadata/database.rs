//! SQLite-backed metadata: one row per `(container, key)`.

use super::{MetadataError, MetadataRecord, MetadataStore, RecordMap};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Row, params};
use std::path::Path;

type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS item_metadata (
    container_id  TEXT NOT NULL,
    item_key      TEXT NOT NULL,
    caption       TEXT,
    description   TEXT,
    alt           TEXT,
    custom_url    TEXT,
    custom_target TEXT,
    PRIMARY KEY (container_id, item_key)
);
"#;

const COLS: &str = "caption, description, alt, custom_url, custom_target";

/// [`MetadataStore`] over a pooled SQLite database.
#[derive(Clone)]
pub struct DatabaseStore {
    pool: DbPool,
}

impl DatabaseStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, MetadataError> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA journal_mode = WAL;"));
        Self::with_manager(manager)
    }

    /// Private in-memory database, shared by all connections of this store.
    pub fn in_memory() -> Result<Self, MetadataError> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let uri = format!("file:gallery_meta_{n}?mode=memory&cache=shared");
        Self::with_manager(SqliteConnectionManager::file(uri))
    }

    fn with_manager(manager: SqliteConnectionManager) -> Result<Self, MetadataError> {
        let pool = Pool::builder().max_size(4).build(manager)?;
        pool.get()?.execute_batch(SCHEMA)?;
        Ok(Self { pool })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MetadataRecord> {
    Ok(MetadataRecord {
        caption: row.get(0)?,
        description: row.get(1)?,
        alt: row.get(2)?,
        custom_url: row.get(3)?,
        custom_target: row.get(4)?,
    })
}

fn insert_row(
    conn: &Connection,
    container: &str,
    key: &str,
    record: &MetadataRecord,
) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO item_metadata (container_id, item_key, {COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ),
        params![
            container,
            key,
            record.caption,
            record.description,
            record.alt,
            record.custom_url,
            record.custom_target,
        ],
    )
}

impl MetadataStore for DatabaseStore {
    fn get(&self, container: &str) -> Result<RecordMap, MetadataError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT item_key, {COLS} FROM item_metadata WHERE container_id = ?1"
        ))?;
        let rows = stmt.query_map([container], |row| {
            let key: String = row.get(0)?;
            let record = MetadataRecord {
                caption: row.get(1)?,
                description: row.get(2)?,
                alt: row.get(3)?,
                custom_url: row.get(4)?,
                custom_target: row.get(5)?,
            };
            Ok((key, record))
        })?;
        Ok(rows.collect::<Result<RecordMap, _>>()?)
    }

    fn upsert(
        &self,
        container: &str,
        key: &str,
        patch: &MetadataRecord,
    ) -> Result<MetadataRecord, MetadataError> {
        let conn = self.pool.get()?;
        // COALESCE keeps the stored value for every field the patch leaves unset.
        let merged = conn.query_row(
            &format!(
                "INSERT INTO item_metadata (container_id, item_key, {COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (container_id, item_key) DO UPDATE SET
                     caption       = COALESCE(excluded.caption, item_metadata.caption),
                     description   = COALESCE(excluded.description, item_metadata.description),
                     alt           = COALESCE(excluded.alt, item_metadata.alt),
                     custom_url    = COALESCE(excluded.custom_url, item_metadata.custom_url),
                     custom_target = COALESCE(excluded.custom_target, item_metadata.custom_target)
                 RETURNING {COLS}"
            ),
            params![
                container,
                key,
                patch.caption,
                patch.description,
                patch.alt,
                patch.custom_url,
                patch.custom_target,
            ],
            record_from_row,
        )?;
        tracing::debug!("metadata upsert {container}/{key} (database)");
        Ok(merged)
    }

    fn delete(&self, container: &str, key: &str) -> Result<bool, MetadataError> {
        let conn = self.pool.get()?;
        let n = conn.execute(
            "DELETE FROM item_metadata WHERE container_id = ?1 AND item_key = ?2",
            params![container, key],
        )?;
        Ok(n > 0)
    }

    fn replace_all(&self, container: &str, records: &RecordMap) -> Result<(), MetadataError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM item_metadata WHERE container_id = ?1",
            [container],
        )?;
        for (key, record) in records {
            insert_row(&tx, container, key, record)?;
        }
        tx.commit()?;
        tracing::debug!("metadata rewrite {container}: {} records (database)", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn caption(text: &str) -> MetadataRecord {
        MetadataRecord {
            caption: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn unknown_container_is_empty() {
        let store = DatabaseStore::in_memory().unwrap();
        assert!(store.get("/nowhere").unwrap().is_empty());
    }

    #[test]
    fn upsert_merges_fields() {
        let store = DatabaseStore::in_memory().unwrap();
        store.upsert("/g", "a.jpg", &caption("Dawn")).unwrap();
        let merged = store
            .upsert(
                "/g",
                "a.jpg",
                &MetadataRecord {
                    custom_target: Some("_blank".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(merged.caption.as_deref(), Some("Dawn"));
        assert_eq!(merged.custom_target.as_deref(), Some("_blank"));
        assert_eq!(store.get("/g").unwrap()["a.jpg"], merged);
    }

    #[test]
    fn containers_are_isolated() {
        let store = DatabaseStore::in_memory().unwrap();
        store.upsert("/a", "x.jpg", &caption("a")).unwrap();
        store.upsert("/b", "x.jpg", &caption("b")).unwrap();

        assert_eq!(store.get("/a").unwrap()["x.jpg"].caption.as_deref(), Some("a"));
        assert_eq!(store.get("/b").unwrap()["x.jpg"].caption.as_deref(), Some("b"));
    }

    #[test]
    fn delete_reports_existence() {
        let store = DatabaseStore::in_memory().unwrap();
        store.upsert("/g", "a.jpg", &caption("a")).unwrap();
        assert!(store.delete("/g", "a.jpg").unwrap());
        assert!(!store.delete("/g", "a.jpg").unwrap());
        assert!(store.get("/g").unwrap().is_empty());
    }

    #[test]
    fn replace_all_swaps_container_contents() {
        let store = DatabaseStore::in_memory().unwrap();
        store.upsert("/g", "old.jpg", &caption("old")).unwrap();
        store.upsert("/other", "keep.jpg", &caption("keep")).unwrap();

        let mut records = RecordMap::new();
        records.insert("new.jpg".into(), caption("new"));
        store.replace_all("/g", &records).unwrap();

        assert_eq!(store.get("/g").unwrap(), records);
        assert_eq!(store.get("/other").unwrap().len(), 1);
    }

    #[test]
    fn file_database_persists_across_opens() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("meta.db");
        {
            let store = DatabaseStore::open(&path).unwrap();
            store.upsert("/g", "a.jpg", &caption("kept")).unwrap();
        }
        let store = DatabaseStore::open(&path).unwrap();
        assert_eq!(store.get("/g").unwrap()["a.jpg"].caption.as_deref(), Some("kept"));
    }
}
