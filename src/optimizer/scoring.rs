//! Recommendation scoring for generated scenarios

use crate::config::{HorizonBand, ScoringWeights};

use super::scenarios::Scenario;

/// Score every viable scenario and return the index of the best one.
///
/// score = savings_weight * (net_savings / best net_savings)
///       + horizon_weight * band score of the payoff years
///       + sustainability_weight
///
/// Non-viable scenarios keep `score = None`. Ties go to the earlier scenario.
pub fn score_scenarios(
    scenarios: &mut [Scenario],
    weights: &ScoringWeights,
    band: &HorizonBand,
) -> Option<usize> {
    let max_savings = scenarios
        .iter()
        .filter(|s| s.is_viable)
        .filter_map(|s| s.summary.as_ref().map(|summary| summary.net_savings))
        .fold(0.0_f64, f64::max);

    let mut recommended: Option<(usize, f64)> = None;
    for (index, scenario) in scenarios.iter_mut().enumerate() {
        scenario.score = None;
        if !scenario.is_viable {
            continue;
        }
        let Some(summary) = scenario.summary.as_ref() else {
            continue;
        };

        let savings_score = if max_savings > 0.0 {
            (summary.net_savings / max_savings).max(0.0)
        } else {
            0.0
        };
        let years = summary.total_months as f64 / 12.0;
        let score = weights.savings * savings_score
            + weights.horizon * band.score(years)
            + weights.sustainability;

        scenario.score = Some(score);
        if recommended.map_or(true, |(_, best)| score > best) {
            recommended = Some((index, score));
        }
    }

    recommended.map(|(index, _)| index)
}
