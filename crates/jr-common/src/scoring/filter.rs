use super::scorer::RankedResult;

/// Trim a ranked result to the ids the caller should see.
///
/// A non-zero `threshold` switches to score filtering and `max_count` is
/// ignored entirely; there is deliberately no combined top-k-above-
/// threshold mode. Without a threshold the top `max_count` ids are
/// returned in their established order.
pub fn filter_recommendations(
    results: &RankedResult,
    max_count: usize,
    threshold: Option<f64>,
) -> Vec<i64> {
    match threshold.filter(|t| *t != 0.0) {
        Some(threshold) => results
            .iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(id, _)| *id)
            .collect(),
        None => results
            .iter()
            .take(max_count)
            .map(|(id, _)| *id)
            .collect(),
    }
}
