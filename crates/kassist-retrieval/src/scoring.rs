//! Answer confidence heuristics.

/// Confidence reported when an answer has no supporting sources.
pub const NO_SOURCE_CONFIDENCE: f64 = 0.1;

/// Number of sources at which the coverage term stops growing.
const SATURATING_SOURCE_COUNT: f64 = 5.0;

const SIMILARITY_WEIGHT: f64 = 0.7;
const COVERAGE_WEIGHT: f64 = 0.3;

/// Confidence in an answer built from sources with the given similarities.
///
/// `avg_similarity * 0.7 + min(n / 5, 1) * 0.3`, clamped to `[0, 1]` and
/// rounded to two decimals. No sources yields [`NO_SOURCE_CONFIDENCE`].
pub fn confidence_score(similarities: &[f32]) -> f64 {
    if similarities.is_empty() {
        return NO_SOURCE_CONFIDENCE;
    }

    let n = similarities.len() as f64;
    let avg = similarities.iter().map(|&s| f64::from(s)).sum::<f64>() / n;
    let coverage = (n / SATURATING_SOURCE_COUNT).min(1.0);

    let raw = avg * SIMILARITY_WEIGHT + coverage * COVERAGE_WEIGHT;
    round2(raw.clamp(0.0, 1.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
