//! SQLite storage implementation
//!
//! One writer connection behind a mutex. File-backed stores run in WAL mode
//! and serve reads from a small pool of read-only connections, so readers see
//! the last committed state and never wait on an in-flight write.
//! In-memory stores (tests) route reads through the writer connection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::{schema, CacheStats, CacheStore};
use crate::corpus;
use crate::reference::VerseRef;
use crate::verse::{ChapterRecord, Enrichment, VerseRecord};
use crate::Result;

const VERSE_COLUMNS: &str = "chapter, verse, devanagari, transliteration, translations_json, translation, \
     authoritative_json, enrichment, source_url, raw_json, fetched_at";

const CHAPTER_COLUMNS: &str =
    "chapter_number, name, name_transliterated, name_meaning, verses_count, summary, raw_json";

const MAX_IDLE_READERS: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only connections for a file-backed database
struct ReaderPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ReaderPool {
    fn checkout(&self) -> Result<Connection> {
        if let Some(conn) = lock(&self.idle).pop() {
            return Ok(conn);
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn checkin(&self, conn: Connection) {
        let mut idle = lock(&self.idle);
        if idle.len() < MAX_IDLE_READERS {
            idle.push(conn);
        }
    }
}

/// A poisoned lock only means another caller panicked mid-call; the
/// connection itself is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// SQLite-backed verse cache
pub struct SqliteStore {
    writer: Mutex<Connection>,
    readers: Option<ReaderPool>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "Opened verse cache");

        let store = Self {
            writer: Mutex::new(conn),
            readers: Some(ReaderPool {
                path: path.to_path_buf(),
                idle: Mutex::new(Vec::new()),
            }),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            writer: Mutex::new(conn),
            readers: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = lock(&self.writer);
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Journal mode of the writer connection ("wal" for file databases)
    pub fn journal_mode(&self) -> Result<String> {
        let conn = lock(&self.writer);
        Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?)
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.readers {
            Some(pool) => {
                let conn = pool.checkout()?;
                let result = f(&conn);
                pool.checkin(conn);
                result
            }
            None => f(&lock(&self.writer)),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        f(&lock(&self.writer))
    }

    // ========== Row Mapping ==========

    fn row_to_verse(row: &rusqlite::Row) -> rusqlite::Result<VerseRecord> {
        let chapter: u32 = row.get(0)?;
        let verse: u32 = row.get(1)?;
        let reference = VerseRef::new(chapter, verse).map_err(|e| conversion(0, e))?;

        let translations_json: String = row.get(4)?;
        let authoritative_json: Option<String> = row.get(6)?;
        let enrichment: String = row.get(7)?;
        let raw_json: String = row.get(9)?;
        let fetched_at: String = row.get(10)?;

        Ok(VerseRecord {
            reference,
            devanagari: row.get(2)?,
            transliteration: row.get(3)?,
            translations: serde_json::from_str(&translations_json).map_err(|e| conversion(4, e))?,
            translation: row.get(5)?,
            authoritative: authoritative_json
                .map(|json| serde_json::from_str(&json))
                .transpose()
                .map_err(|e| conversion(6, e))?,
            enrichment: enrichment.parse::<Enrichment>().map_err(|e| conversion(7, e))?,
            source_url: row.get(8)?,
            raw: serde_json::from_str(&raw_json).map_err(|e| conversion(9, e))?,
            fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| conversion(10, e))?,
        })
    }

    fn row_to_chapter(row: &rusqlite::Row) -> rusqlite::Result<ChapterRecord> {
        let raw_json: String = row.get(6)?;
        Ok(ChapterRecord {
            number: row.get(0)?,
            name: row.get(1)?,
            name_transliterated: row.get(2)?,
            name_meaning: row.get(3)?,
            verses_count: row.get(4)?,
            summary: row.get(5)?,
            raw: serde_json::from_str(&raw_json).map_err(|e| conversion(6, e))?,
        })
    }
}

fn conversion<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Make `%`, `_` and `\` match literally in a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn count(conn: &Connection, sql: &str) -> Result<usize> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

impl CacheStore for SqliteStore {
    fn get(&self, reference: VerseRef) -> Result<Option<VerseRecord>> {
        let sql = format!("SELECT {} FROM verses WHERE ref = ?1", VERSE_COLUMNS);
        self.read(|conn| {
            conn.query_row(&sql, [reference.to_key()], Self::row_to_verse)
                .optional()
                .map_err(Into::into)
        })
    }

    fn put(&self, record: &VerseRecord) -> Result<()> {
        let translations = serde_json::to_string(&record.translations)?;
        let authoritative = record
            .authoritative
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let raw = serde_json::to_string(&record.raw)?;

        self.write(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO verses (ref, chapter, verse, devanagari, transliteration,
                    translations_json, translation, authoritative_json, enrichment, source_url,
                    raw_json, fetched_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    record.reference.to_key(),
                    record.reference.chapter,
                    record.reference.verse,
                    record.devanagari,
                    record.transliteration,
                    translations,
                    record.translation,
                    authoritative,
                    record.enrichment.as_str(),
                    record.source_url,
                    raw,
                    record.fetched_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_chapter(&self, number: u8) -> Result<Option<ChapterRecord>> {
        let sql = format!("SELECT {} FROM chapters WHERE chapter_number = ?1", CHAPTER_COLUMNS);
        self.read(|conn| {
            conn.query_row(&sql, [number], Self::row_to_chapter)
                .optional()
                .map_err(Into::into)
        })
    }

    fn put_chapter(&self, chapter: &ChapterRecord) -> Result<()> {
        let raw = serde_json::to_string(&chapter.raw)?;
        self.write(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO chapters (chapter_number, name, name_transliterated,
                    name_meaning, verses_count, summary, raw_json)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    chapter.number,
                    chapter.name,
                    chapter.name_transliterated,
                    chapter.name_meaning,
                    chapter.verses_count,
                    chapter.summary,
                    raw,
                ],
            )?;
            Ok(())
        })
    }

    fn count_verses(&self) -> Result<usize> {
        self.read(|conn| count(conn, "SELECT COUNT(*) FROM verses"))
    }

    fn count_chapters(&self) -> Result<usize> {
        self.read(|conn| count(conn, "SELECT COUNT(*) FROM chapters"))
    }

    fn all_verses(&self) -> Result<Vec<VerseRecord>> {
        let sql = format!("SELECT {} FROM verses ORDER BY chapter, verse", VERSE_COLUMNS);
        self.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let verses = stmt
                .query_map([], Self::row_to_verse)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(verses)
        })
    }

    fn contains(&self, reference: VerseRef) -> Result<bool> {
        self.read(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM verses WHERE ref = ?1)",
                [reference.to_key()],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<VerseRecord>> {
        let pattern = format!("%{}%", escape_like(query.trim()));
        let sql = format!(
            "SELECT {} FROM verses
             WHERE transliteration LIKE ?1 ESCAPE '\\'
                OR translation LIKE ?1 ESCAPE '\\'
                OR devanagari LIKE ?1 ESCAPE '\\'
             ORDER BY chapter, verse
             LIMIT ?2",
            VERSE_COLUMNS
        );
        self.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let verses = stmt
                .query_map(params![pattern, limit as i64], Self::row_to_verse)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(verses)
        })
    }

    fn stats(&self) -> Result<CacheStats> {
        self.read(|conn| {
            let mut by_enrichment = BTreeMap::new();
            let mut stmt =
                conn.prepare("SELECT enrichment, COUNT(*) FROM verses GROUP BY enrichment")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (state, n) = row?;
                by_enrichment.insert(state, n as usize);
            }

            Ok(CacheStats {
                verses: count(conn, "SELECT COUNT(*) FROM verses")?,
                chapters: count(conn, "SELECT COUNT(*) FROM chapters")?,
                corpus_size: corpus::corpus_size(),
                by_enrichment,
            })
        })
    }
}
