//! Bounded edit distance for fuzzy term expansion.
//!
//! `|len(a) - len(b)|` is a lower bound on the edit distance, so most
//! vocabulary terms are rejected before any DP row is allocated. Inside
//! the DP, once every cell of a row exceeds the bound the rest of the
//! table cannot come back under it.

/// Largest edit distance tolerated for a term of `len` chars.
///
/// Proportional to the term length (`ratio`, e.g. `0.2`), rounded, and
/// capped at `max`. Short terms get 0 (exact only).
pub fn max_distance(len: usize, ratio: f64, max: usize) -> usize {
    if ratio <= 0.0 {
        return 0;
    }
    ((len as f64 * ratio).round() as usize).min(max)
}

/// Levenshtein distance between `a` and `b` if it is at most `max`.
///
/// Works on chars, not bytes.
pub fn bounded_distance(a: &[char], b: &[char], max: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ac) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        let mut row_min = row[0];

        for (j, bc) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ac != bc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diag + cost);
            diag = above;
            row_min = row_min.min(row[j + 1]);
        }

        if row_min > max {
            return None;
        }
    }

    let d = row[b.len()];
    (d <= max).then_some(d)
}
