//! Fixed corpus table
//!
//! The Bhagavad Gita is bounded: 18 chapters with a known verse count each.
//! Every valid reference, the seed plan and the "is the cache complete" check
//! are derived from this table.

/// Verse counts for chapters 1..=18, in the numbering used by the bulk source.
pub const CHAPTER_VERSE_COUNTS: [u16; 18] = [
    47, 72, 43, 42, 29, 47, 30, 28, 34, 42, 55, 20, 35, 27, 20, 24, 28, 78,
];

pub const CHAPTER_COUNT: u8 = 18;

/// Total number of verses across all chapters.
pub const fn corpus_size() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < CHAPTER_VERSE_COUNTS.len() {
        total += CHAPTER_VERSE_COUNTS[i] as usize;
        i += 1;
    }
    total
}

/// Number of verses in `chapter`, or `None` when the chapter is outside 1..=18.
pub fn verse_count(chapter: u8) -> Option<u16> {
    if chapter == 0 {
        return None;
    }
    CHAPTER_VERSE_COUNTS.get(chapter as usize - 1).copied()
}

pub fn is_valid(chapter: u8, verse: u16) -> bool {
    verse_count(chapter).is_some_and(|max| (1..=max).contains(&verse))
}
