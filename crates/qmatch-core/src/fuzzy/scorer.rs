//! Approximate-substring scoring for the fuzzy index.
//!
//! A field's score is the minimum number of edits needed to turn the query
//! into *some* substring of the field, divided by the query length:
//!
//! ```text
//! score(q, f) = min_{i<=j} osa(q, f[i..j]) / |q|
//! ```
//!
//! Edits are insertions, deletions, substitutions and adjacent
//! transpositions (optimal string alignment). The match may start anywhere
//! in the field, so location is ignored. 0.0 is an exact substring.
//!
//! An entry combines the scores of every field that matched:
//!
//! ```text
//! combined = Π max(score_f, ε) ^ (weight_f * norm_f)
//! norm_f   = 1 / sqrt(token count of f)
//! ```
//!
//! Short fields and heavily weighted fields pull the product down harder,
//! and every extra matching field lowers it further.

/// Edit distance between `pattern` and its best-matching substring of `text`.
///
/// Semi-global optimal string alignment: the first row is all zeros (the
/// match may start at any offset in `text`) and the result is the minimum
/// over the last row (it may end at any offset).
pub fn approximate_substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }
    if text.is_empty() {
        return m;
    }

    let n = text.len();
    // prev2 = row i-2, prev = row i-1, cur = row i
    let mut prev2 = vec![0usize; n + 1];
    let mut prev = vec![0usize; n + 1];
    let mut cur = vec![0usize; n + 1];

    for i in 1..=m {
        cur[0] = i;
        for j in 1..=n {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);
            let mut best = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1
                && j > 1
                && pattern[i - 1] == text[j - 2]
                && pattern[i - 2] == text[j - 1]
            {
                best = best.min(prev2[j - 2] + 1);
            }
            cur[j] = best;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }

    // after the final swap the last computed row is in `prev`
    prev.iter().copied().min().unwrap_or(m)
}

/// Field score in `0.0..=1.0` (errors per query character).
#[inline]
pub fn field_score(pattern: &[char], text: &[char]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let distance = approximate_substring_distance(pattern, text);
    (distance as f64 / pattern.len() as f64).min(1.0)
}

/// Length norm of a field: `1 / sqrt(whitespace token count)`, rounded to 3 places.
#[inline]
pub fn field_norm(text: &str) -> f64 {
    let tokens = text.split_whitespace().count().max(1) as f64;
    (1000.0 / tokens.sqrt()).round() / 1000.0
}

/// Combine matched field scores into one entry score (lower is better).
///
/// Each item is `(score, weight, norm)`. Exact matches are clamped to
/// `f64::EPSILON` so they still contribute. An empty iterator yields 1.0.
pub fn combine<I>(fields: I) -> f64
where
    I: IntoIterator<Item = (f64, f64, f64)>,
{
    fields
        .into_iter()
        .map(|(score, weight, norm)| score.max(f64::EPSILON).powf(weight * norm))
        .product()
}
