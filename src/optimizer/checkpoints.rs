//! Target-year checkpoints for scenario generation

use serde::{Deserialize, Serialize};

/// Chooses which payoff horizons (in years) to search for
pub trait CheckpointPolicy: Send + Sync {
    /// Candidate target years for a mortgage whose standard schedule takes
    /// `standard_months`. Implementations may return any years; callers
    /// normalize them with [`normalize_checkpoints`].
    fn checkpoint_years(&self, standard_months: u32) -> Vec<u32>;
}

/// Built-in checkpoint policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Checkpoints {
    /// Fixed table bucketed by the standard payoff horizon
    #[default]
    Bucketed,
    /// `count` horizons spread evenly below the standard payoff
    EvenlySpaced { count: u32 },
}

/// Checkpoints for a 30-year standard horizon, scaled down for short mortgages
const REFERENCE_CHECKPOINTS: [u32; 5] = [12, 10, 8, 6, 5];

/// (minimum standard years, checkpoints)
const CHECKPOINT_TABLE: [(f64, [u32; 5]); 4] = [
    (25.0, [12, 10, 8, 6, 5]),
    (20.0, [10, 8, 6, 5, 4]),
    (15.0, [8, 6, 5, 4, 3]),
    (10.0, [6, 5, 4, 3, 2]),
];

impl CheckpointPolicy for Checkpoints {
    fn checkpoint_years(&self, standard_months: u32) -> Vec<u32> {
        let standard_years = standard_months as f64 / 12.0;
        match *self {
            Checkpoints::Bucketed => {
                let bucket = CHECKPOINT_TABLE
                    .iter()
                    .find(|(min_years, _)| standard_years >= *min_years);
                match bucket {
                    Some((_, years)) => years.to_vec(),
                    None => REFERENCE_CHECKPOINTS
                        .iter()
                        .map(|y| ((*y as f64) * standard_years / 30.0).round() as u32)
                        .collect(),
                }
            }
            Checkpoints::EvenlySpaced { count } => (1..=count)
                .rev()
                .map(|i| (standard_years * i as f64 / (count + 1) as f64).round() as u32)
                .collect(),
        }
    }
}

/// Descending, deduplicated years of at least one, each strictly shorter
/// than the standard horizon
pub fn normalize_checkpoints(mut years: Vec<u32>, standard_months: u32) -> Vec<u32> {
    years.retain(|y| *y >= 1 && y.saturating_mul(12) < standard_months);
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}
