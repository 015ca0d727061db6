//! Database schema definitions

/// SQL to create the verses table
pub const CREATE_VERSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS verses (
    ref TEXT PRIMARY KEY,
    chapter INTEGER NOT NULL,
    verse INTEGER NOT NULL,
    devanagari TEXT,
    transliteration TEXT,
    translations_json TEXT NOT NULL DEFAULT '{}',
    translation TEXT,
    authoritative_json TEXT,
    enrichment TEXT NOT NULL DEFAULT 'pending',
    source_url TEXT NOT NULL,
    raw_json TEXT NOT NULL,
    fetched_at TEXT NOT NULL
)
"#;

/// SQL to create the chapters table
pub const CREATE_CHAPTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chapters (
    chapter_number INTEGER PRIMARY KEY,
    name TEXT,
    name_transliterated TEXT,
    name_meaning TEXT,
    verses_count INTEGER NOT NULL,
    summary TEXT,
    raw_json TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_verses_chapter ON verses(chapter, verse)",
    "CREATE INDEX IF NOT EXISTS idx_verses_transliteration ON verses(transliteration)",
    "CREATE INDEX IF NOT EXISTS idx_verses_enrichment ON verses(enrichment)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_VERSES_TABLE, CREATE_CHAPTERS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
