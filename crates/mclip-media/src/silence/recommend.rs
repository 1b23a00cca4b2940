//! Threshold recommendation.

use mclip_models::{ThresholdRecommendation, ThresholdSilence};

/// Pick the threshold whose silence ratio is closest to `target_ratio`.
///
/// Thresholds are compared from most to least negative, and only a strictly
/// smaller distance replaces the current best, so on exact ties the stricter
/// (lower) dB value wins. Returns `None` for empty input.
pub fn recommend_threshold(
    results: &[ThresholdSilence],
    video_duration: f64,
    target_ratio: f64,
) -> Option<ThresholdRecommendation> {
    let mut ordered: Vec<&ThresholdSilence> = results.iter().collect();
    ordered.sort_by(|a, b| a.threshold_db.total_cmp(&b.threshold_db));

    let mut best: Option<(&ThresholdSilence, f64, f64)> = None;
    for result in ordered {
        let ratio = result.ratio(video_duration);
        let distance = (ratio - target_ratio).abs();
        match best {
            Some((_, _, best_distance)) if distance >= best_distance => {}
            _ => best = Some((result, ratio, distance)),
        }
    }

    best.map(|(result, ratio, _)| ThresholdRecommendation {
        threshold_db: result.threshold_db,
        ratio,
        reason: format!("closest match: ratio {ratio:.2} vs target {target_ratio:.2}"),
    })
}
