use flinch::results::ResultEntry;

/// (attempt number, reaction ms) for every successful entry
pub fn reaction_points(entries: &[ResultEntry]) -> Vec<(f64, f64)> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.success)
        .map(|(i, e)| ((i + 1) as f64, e.reaction_ms()))
        .collect()
}

/// Compute X (attempt) and Y (reaction ms) bounds for the reaction chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let last_attempt = points.last().map_or(1.0, |p| p.0).max(1.0);
    let slowest = points.iter().map(|p| p.1).fold(0.0, f64::max);
    // Round the ceiling up to the next 100 ms so the top point stays visible
    let ceiling = ((slowest / 100.0).ceil() * 100.0).max(100.0);
    (last_attempt, ceiling)
}

pub fn format_ms(val: f64) -> String {
    format!("{val:.0}ms")
}
