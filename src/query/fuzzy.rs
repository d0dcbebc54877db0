//! Approximate course-name matching.
//!
//! Similarity is the Ratcliff/Obershelp ratio `2 * M / T`, where `M` is the
//! number of characters in the matching blocks found by repeatedly taking
//! the longest common substring and `T` is the combined length of both
//! strings.

use std::cmp::Ordering;

/// Returns the similarity of two strings in `[0.0, 1.0]`, compared per character.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = (2 * matching_chars(&a, &b)) as f64 / total as f64;
    ratio
}

/// Suggests up to `n` candidates whose similarity to `query` is at least `cutoff`.
///
/// Comparison is case-insensitive. Results are ranked by descending
/// similarity; equal scores keep the candidates' input order.
#[must_use]
pub fn fuzzy_suggest<'a, I>(query: &str, candidates: I, n: usize, cutoff: f64) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    if n == 0 {
        return Vec::new();
    }

    let query = query.trim().to_lowercase();
    let cutoff = cutoff.clamp(0.0, 1.0);

    let mut scored: Vec<(f64, &'a str)> = candidates
        .into_iter()
        .map(|name| (similarity(&query, &name.to_lowercase()), name))
        .filter(|(score, _)| *score >= cutoff)
        .collect();

    // Stable sort: ties stay in input order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(n);
    scored.into_iter().map(|(_, name)| name).collect()
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Finds the longest common substring, preferring the earliest start in `a`.
///
/// Returns `(start_a, start_b, len)`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let len = cur[j + 1];
            if len > best.2 {
                best = (i + 1 - len, j + 1 - len, len);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_similarity_known_values() {
        assert!(approx(similarity("abcd", "bcde"), 0.75));
        assert!(approx(similarity("abc", "abc"), 1.0));
        assert!(approx(similarity("abc", "xyz"), 0.0));
        assert!(approx(similarity("", ""), 1.0));
    }

    #[test]
    fn test_similarity_unicode() {
        // the whole query is a prefix of the name
        let score = similarity("базы данн", "базы данных");
        assert!(approx(score, 18.0 / 20.0));
    }

    #[test]
    fn test_fuzzy_suggest_cutoff_and_rank() {
        let names = [
            "Базы данных",
            "Инженерия данных",
            "Основы машинного обучения",
        ];
        let result = fuzzy_suggest("базы даных", names, 3, 0.6);
        assert_eq!(result.first(), Some(&"Базы данных"));
        assert!(!result.contains(&"Основы машинного обучения"));
    }

    #[test]
    fn test_fuzzy_suggest_ties_keep_input_order() {
        let names = ["abx", "aby", "abz"];
        let result = fuzzy_suggest("ab", names, 2, 0.5);
        assert_eq!(result, vec!["abx", "aby"]);
    }

    #[test]
    fn test_fuzzy_suggest_nothing_close() {
        let names = ["Математическая статистика"];
        assert!(fuzzy_suggest("шахматы", names, 3, 0.6).is_empty());
    }
}
