//! Exhaustive nearest-neighbour ranking.

use std::cmp::Ordering;

use crate::distance::cosine_similarity;

/// A candidate paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    /// The ranked item.
    pub item: T,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Score every candidate against `query` and keep the `k` most similar.
///
/// Results are ordered by descending similarity. Candidates with equal scores
/// keep their input order. Returns an empty list when `k` is zero or the
/// query is empty.
pub fn rank<T, V>(
    query: &[f32],
    candidates: impl IntoIterator<Item = (T, V)>,
    k: usize,
) -> Vec<Scored<T>>
where
    V: AsRef<[f32]>,
{
    if k == 0 || query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Scored<T>> = candidates
        .into_iter()
        .map(|(item, embedding)| Scored {
            score: cosine_similarity(query, embedding.as_ref()),
            item,
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<(&'static str, Vec<f32>)> {
        vec![
            ("east", vec![1.0, 0.0]),
            ("north", vec![0.0, 1.0]),
            ("north-east", vec![1.0, 1.0]),
            ("west", vec![-1.0, 0.0]),
        ]
    }

    #[test]
    fn test_orders_by_descending_similarity() {
        let hits = rank(&[1.0, 0.2], corpus(), 4);
        let names: Vec<_> = hits.iter().map(|h| h.item).collect();
        assert_eq!(names, vec!["east", "north-east", "north", "west"]);

        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_truncates_to_k() {
        assert_eq!(rank(&[1.0, 0.0], corpus(), 2).len(), 2);
        assert_eq!(rank(&[1.0, 0.0], corpus(), 10).len(), 4);
    }

    #[test]
    fn test_zero_k_and_empty_query() {
        assert!(rank(&[1.0, 0.0], corpus(), 0).is_empty());
        assert!(rank(&[], corpus(), 3).is_empty());
    }

    #[test]
    fn test_empty_candidates() {
        let empty: Vec<(u32, Vec<f32>)> = Vec::new();
        assert!(rank(&[1.0], empty, 5).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let candidates = vec![(1, vec![1.0, 0.0]), (2, vec![2.0, 0.0]), (3, vec![3.0, 0.0])];
        let hits = rank(&[1.0, 0.0], candidates, 3);
        let ids: Vec<_> = hits.iter().map(|h| h.item).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_mismatched_dimensions_score_zero() {
        let candidates = vec![("short", vec![1.0]), ("ok", vec![1.0, 0.0])];
        let hits = rank(&[1.0, 0.0], candidates, 2);
        assert_eq!(hits[0].item, "ok");
        assert_eq!(hits[1].score, 0.0);
    }
}
