// Fuzzy string scoring for tool search
//
// Scores are in 0..=100. `ratio` is the normalized indel similarity of two
// strings; `token_set_ratio` compares whitespace token sets so that word order
// and extra words in the longer text matter less.

use std::collections::BTreeSet;

/// Length of the longest common subsequence of two char slices
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Normalized similarity: 200 * LCS / (len(a) + len(b))
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

fn join_parts(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

/// Token-set similarity
///
/// A shared token set that fully covers either side scores 100; otherwise the
/// best ratio among intersection/remainder combinations is returned.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let diff_ab: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let diff_ba: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = intersection.join(" ");
    let sect_ab = join_parts(&sect, &diff_ab.join(" "));
    let sect_ba = join_parts(&sect, &diff_ba.join(" "));

    let mut best = ratio(&sect_ab, &sect_ba);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &sect_ab)).max(ratio(&sect, &sect_ba));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical() {
        assert_eq!(ratio("nmap", "nmap"), 100.0);
    }

    #[test]
    fn test_ratio_disjoint() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_ratio_typo_scores_high() {
        // "nmapp" vs "nmap": LCS 4, total 9
        let score = ratio("nmapp", "nmap");
        assert!((score - 800.0 / 9.0).abs() < 1e-9);
        assert!(score > 80.0);
    }

    #[test]
    fn test_token_set_subset_is_perfect() {
        assert_eq!(
            token_set_ratio("network scanner", "nmap network scanner used for discovery"),
            100.0
        );
    }

    #[test]
    fn test_token_set_partial_overlap() {
        let score = token_set_ratio("network scan", "nmap network scanner");
        assert!(score > 40.0, "score was {}", score);
        assert!(score < 100.0);
    }

    #[test]
    fn test_token_set_empty_input() {
        assert_eq!(token_set_ratio("", "nmap"), 0.0);
        assert_eq!(token_set_ratio("nmap", "   "), 0.0);
    }
}
