//! Fuzzy matcher - garbled transliteration to ranked verse candidates
//!
//! Scores every cached transliteration against the query:
//! - `sequence_score`: matching-block ratio of the normalized strings
//! - `keyword_score`: share of the query's words (len >= 3) found in the candidate
//! - `score = 0.6 * sequence_score + 0.4 * keyword_score`
//!
//! Candidates under [`MIN_SCORE`] are dropped; the rest are ordered by score
//! descending, then by reference ascending. The scan is linear over the corpus,
//! which is small and fixed.

pub mod sequence;

use crate::normalize::{keywords, normalize};
use crate::reference::VerseRef;
use crate::storage::CacheStore;
use crate::verse::VerseRecord;
use crate::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;

pub const SEQUENCE_WEIGHT: f64 = 0.6;
pub const KEYWORD_WEIGHT: f64 = 0.4;
pub const MIN_SCORE: f64 = 0.25;
pub const KEYWORD_MIN_LEN: usize = 3;

/// One ranked verse candidate. Lives only for the duration of a match call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub reference: VerseRef,
    pub transliteration: String,
    pub score: f64,
    pub sequence_score: f64,
    pub keyword_score: f64,
}

/// Component scores for a normalized query/candidate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub sequence: f64,
    pub keyword: f64,
    pub combined: f64,
}

/// Score two already-normalized strings.
pub fn score_normalized(query: &str, candidate: &str) -> Scores {
    if query.is_empty() || candidate.is_empty() {
        return Scores { sequence: 0.0, keyword: 0.0, combined: 0.0 };
    }

    let sequence = sequence::ratio(query, candidate);

    let query_words = keywords(query, KEYWORD_MIN_LEN);
    let candidate_words = keywords(candidate, KEYWORD_MIN_LEN);
    let shared = query_words.intersection(&candidate_words).count();
    let keyword = shared as f64 / query_words.len().max(1) as f64;

    Scores {
        sequence,
        keyword,
        combined: SEQUENCE_WEIGHT * sequence + KEYWORD_WEIGHT * keyword,
    }
}

/// Normalize both sides, then score.
pub fn score(query: &str, candidate: &str) -> Scores {
    score_normalized(&normalize(query), &normalize(candidate))
}

/// Rank `(reference, transliteration)` pairs against a garbled query.
pub fn rank<'a, I>(garbled: &str, candidates: I, top_n: usize) -> Vec<MatchCandidate>
where
    I: IntoIterator<Item = (VerseRef, &'a str)>,
{
    let query = normalize(garbled);
    if query.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<MatchCandidate> = candidates
        .into_iter()
        .filter_map(|(reference, transliteration)| {
            let scores = score_normalized(&query, &normalize(transliteration));
            (scores.combined >= MIN_SCORE).then(|| MatchCandidate {
                reference,
                transliteration: transliteration.to_string(),
                score: scores.combined,
                sequence_score: scores.sequence,
                keyword_score: scores.keyword,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    ranked.truncate(top_n);
    ranked
}

/// Rank cached records; records without a transliteration are skipped.
pub fn rank_records(garbled: &str, records: &[VerseRecord], top_n: usize) -> Vec<MatchCandidate> {
    rank(
        garbled,
        records
            .iter()
            .filter_map(|r| r.transliteration.as_deref().map(|t| (r.reference, t))),
        top_n,
    )
}

/// Matcher over the verse cache
pub struct Matcher<'a> {
    cache: &'a dyn CacheStore,
}

impl<'a> Matcher<'a> {
    pub fn new(cache: &'a dyn CacheStore) -> Self {
        Self { cache }
    }

    /// Rank cached verses against `garbled`.
    ///
    /// Fails with [`Error::CorpusEmpty`] when nothing has been cached yet, so
    /// callers can tell "no match" apart from "nothing to match against".
    pub fn match_text(&self, garbled: &str, top_n: usize) -> Result<Vec<MatchCandidate>> {
        let records = self.cache.all_verses()?;
        if !records.iter().any(|r| r.transliteration.is_some()) {
            return Err(Error::CorpusEmpty);
        }

        let matches = rank_records(garbled, &records, top_n);
        tracing::debug!(
            corpus = records.len(),
            returned = matches.len(),
            "Ranked fuzzy match candidates"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use crate::verse::test_support::sample_record;

    const SAMPLE_VERSES: &[(u8, u16, &str)] = &[
        (2, 47, "karmaṇyevādhikāraste mā phaleṣu kadācana mā karmaphalaheturbhūrmā te saṅgo'stvakarmaṇi"),
        (9, 34, "manmanā bhava madbhakto madyājī māṁ namaskuru mām evaiṣyasi yuktvaivam ātmānaṁ matparāyaṇaḥ"),
        (15, 7, "mamaivāṁśo jīvaloke jīvabhūtaḥ sanātanaḥ manaḥṣaṣṭhānīndriyāṇi prakṛtisthāni karṣati"),
        (4, 7, "yadā yadā hi dharmasya glānirbhavati bhārata abhyutthānam adharmasya tadātmānaṁ sṛjāmyaham"),
    ];

    fn corpus() -> Vec<(VerseRef, &'static str)> {
        SAMPLE_VERSES
            .iter()
            .map(|&(c, v, t)| (VerseRef::new(c as u32, v as u32).unwrap(), t))
            .collect()
    }

    #[test]
    fn test_identical_scores_one() {
        let s = score("karmaṇyevādhikāraste mā phaleṣu", "karmaṇyevādhikāraste mā phaleṣu");
        assert_eq!(s.sequence, 1.0);
        assert_eq!(s.keyword, 1.0);
        assert_eq!(s.combined, 1.0);
    }

    #[test]
    fn test_empty_side_scores_zero() {
        assert_eq!(score("", "anything").combined, 0.0);
        assert_eq!(score("anything", "").combined, 0.0);
        assert_eq!(score("--", "...").combined, 0.0);
    }

    #[test]
    fn test_garbled_bg_9_34_short_form() {
        let garbled = "man manā bhava mad-bhākto mad-yajī mam namāskuru";
        let candidates = vec![(
            VerseRef::new(9, 34).unwrap(),
            "manmanā bhava madbhakto madyājī māṁ namaskuru",
        )];
        let matches = rank(garbled, candidates, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reference, VerseRef::new(9, 34).unwrap());
        assert!(matches[0].score >= 0.6, "score was {}", matches[0].score);
    }

    #[test]
    fn test_top_match_per_verse() {
        let cases = [
            ("man manā bhava mad-bhākto mad-yajī mam namāskuru", (9, 34)),
            ("mā mā evaṁ sa jīva-loka jīva-bhūta-sanātana", (15, 7)),
            ("kārama-ñeva-dhikāra-ste māpaleṣu", (2, 47)),
        ];
        for (garbled, (c, v)) in cases {
            let matches = rank(garbled, corpus(), 3);
            assert!(!matches.is_empty(), "{garbled}");
            assert_eq!(matches[0].reference, VerseRef::new(c, v).unwrap(), "{garbled}");
        }
    }

    #[test]
    fn test_no_overlap_returns_empty() {
        assert!(rank("zzzzz qqqq", corpus(), 5).is_empty());
    }

    #[test]
    fn test_top_n_limits_and_orders() {
        let matches = rank("bhava mam", corpus(), 2);
        assert!(matches.len() <= 2);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(rank("bhava", corpus(), 0).is_empty());
    }

    #[test]
    fn test_ties_break_by_reference() {
        let text = "yadā yadā hi dharmasya";
        let candidates = vec![
            (VerseRef::new(4, 8).unwrap(), text),
            (VerseRef::new(4, 7).unwrap(), text),
            (VerseRef::new(1, 2).unwrap(), text),
        ];
        let matches = rank(text, candidates, 5);
        let refs: Vec<String> = matches.iter().map(|m| m.reference.to_string()).collect();
        assert_eq!(refs, vec!["BG 1.2", "BG 4.7", "BG 4.8"]);
    }

    #[test]
    fn test_deterministic() {
        let garbled = "mad bhakto mam eva";
        let first = rank(garbled, corpus(), 4);
        for _ in 0..5 {
            assert_eq!(rank(garbled, corpus(), 4), first);
        }
    }

    #[test]
    fn test_matcher_reports_empty_corpus() {
        let store = SqliteStore::open_in_memory().unwrap();
        let matcher = Matcher::new(&store);
        assert!(matches!(matcher.match_text("bhava", 3), Err(Error::CorpusEmpty)));
    }

    #[test]
    fn test_matcher_over_cache() {
        let store = SqliteStore::open_in_memory().unwrap();
        for &(c, v, t) in SAMPLE_VERSES {
            store.put(&sample_record(c, v, t)).unwrap();
        }
        let matcher = Matcher::new(&store);
        let matches = matcher
            .match_text("man manā bhava mad-bhākto mad-yajī mam namāskuru", 3)
            .unwrap();
        assert_eq!(matches[0].reference.to_string(), "BG 9.34");
        assert!(matches[0].score <= 1.0);
    }
}
