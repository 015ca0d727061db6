//! Matching-block similarity
//!
//! Ratio-of-matching-blocks: repeatedly find the longest common contiguous
//! block, then recurse on the pieces to its left and right. With `M` the summed
//! block length and `T` the combined length, `ratio = 2M / T`.
//!
//! Tie-breaking in the longest-block search follows the usual convention
//! (earliest start in `a`, then earliest in `b`), so results line up with
//! other implementations of the same measure. No junk heuristic is applied.

use std::collections::HashMap;

/// Similarity of two strings in [0.0, 1.0], computed over chars.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total length of all matching blocks between `a` and `b`.
pub fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // j2len[j] = length of the match ending at a[i-1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 } + 1;
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next;
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(ratio("madbhakto", "madbhakto"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_known_values() {
        // 2 * 3 / 8 ("abcd" vs "bcde" share "bcd")
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-12);
        // blocks "a" + "b" after "cd"-split: "abxcd" / "abcd" -> ab, cd = 4
        assert!((ratio("abxcd", "abcd") - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_on_samples() {
        let pairs = [
            ("man mana bhava", "manmana bhava"),
            ("karama neva dhikara", "karmanyevadhikaraste"),
            ("qwerty", "ytrewq"),
        ];
        for (a, b) in pairs {
            let forward = ratio(a, b);
            let backward = ratio(b, a);
            assert!((0.0..=1.0).contains(&forward));
            assert!((forward - backward).abs() < 0.2, "{a} / {b}");
        }
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let a: Vec<char> = "abab".chars().collect();
        let b: Vec<char> = "ab".chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        assert_eq!(longest_match(&a, &b2j, 0, a.len(), 0, b.len()), (0, 0, 2));
    }
}
