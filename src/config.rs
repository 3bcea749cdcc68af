//! Simulation and optimizer configuration
//!
//! Defaults reproduce the reference policy: $1,000 probe granularity,
//! 20 search iterations, 40/40/20 scoring weights and a 7-15 year
//! preferred payoff band. Overrides can be loaded from a `key,value` CSV
//! (see `data/config/optimizer.csv`).

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::amortization::BALANCE_EPSILON;
use crate::error::{Result, VelocityError};
use crate::optimizer::Checkpoints;

/// Default path to the optimizer override file
pub const DEFAULT_CONFIG_PATH: &str = "data/config/optimizer.csv";

/// Cycle simulator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Balance treated as zero for both the mortgage and the HELOC
    pub epsilon: f64,

    /// Month ceiling as a multiple of the standard payoff horizon
    pub ceiling_factor: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epsilon: BALANCE_EPSILON,
            ceiling_factor: 4,
        }
    }
}

/// Target-seeking binary search settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Smallest chunk probed
    pub floor_chunk: f64,

    /// Upper bound as a fraction of the mortgage balance (also capped by the credit limit)
    pub max_balance_fraction: f64,

    /// Probes are rounded to the nearest multiple of this amount
    pub rounding_step: f64,

    /// Maximum number of probes per search
    pub max_iterations: u32,

    /// A result within this fraction of the target months is viable (at least one month)
    pub month_tolerance_fraction: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            floor_chunk: 1_000.0,
            max_balance_fraction: 0.5,
            rounding_step: 1_000.0,
            max_iterations: 20,
            month_tolerance_fraction: 0.1,
        }
    }
}

impl SearchConfig {
    /// Allowed |actual - target| in months for a viable result
    pub fn month_tolerance(&self, target_months: u32) -> u32 {
        ((target_months as f64 * self.month_tolerance_fraction).ceil() as u32).max(1)
    }
}

/// Weights blended into the recommendation score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of net savings normalized against the best viable scenario
    pub savings: f64,

    /// Weight of the payoff-horizon band score
    pub horizon: f64,

    /// Flat bonus applied to every viable scenario
    pub sustainability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            savings: 0.4,
            horizon: 0.4,
            sustainability: 0.2,
        }
    }
}

/// Preferred payoff horizon with linear penalties outside it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonBand {
    pub min_years: f64,
    pub max_years: f64,

    /// Score lost per year outside the band
    pub penalty_per_year: f64,
}

impl Default for HorizonBand {
    fn default() -> Self {
        Self {
            min_years: 7.0,
            max_years: 15.0,
            penalty_per_year: 0.1,
        }
    }
}

impl HorizonBand {
    /// 1.0 inside the band, linearly decreasing (floored at 0) outside it
    pub fn score(&self, years: f64) -> f64 {
        let distance = if years < self.min_years {
            self.min_years - years
        } else if years > self.max_years {
            years - self.max_years
        } else {
            0.0
        };
        (1.0 - distance * self.penalty_per_year).max(0.0)
    }
}

/// Goal-driven optimizer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Evenly spaced chunk amounts simulated between the floor chunk and the credit limit
    pub grid_points: u32,

    /// Balanced objective: weight of total interest relative to the balance
    pub interest_weight: f64,

    /// Balanced objective: weight of payoff months relative to 30 years
    pub time_weight: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            grid_points: 50,
            interest_weight: 0.6,
            time_weight: 0.4,
        }
    }
}

/// Complete optimizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub simulation: SimulationConfig,
    pub search: SearchConfig,
    pub scoring: ScoringWeights,
    pub band: HorizonBand,

    /// Multipliers of the optimal chunk simulated for an explicit target
    pub variation_multipliers: Vec<f64>,

    /// Checkpoint policy for five-scenario generation
    pub checkpoints: Checkpoints,

    pub objective: ObjectiveConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            search: SearchConfig::default(),
            scoring: ScoringWeights::default(),
            band: HorizonBand::default(),
            variation_multipliers: vec![0.4, 0.6, 0.8, 1.0, 1.2, 1.4],
            checkpoints: Checkpoints::default(),
            objective: ObjectiveConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Load overrides from the default location (data/config/optimizer.csv)
    pub fn from_csv() -> Result<Self> {
        Self::from_csv_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load overrides from a `key,value` CSV file on top of the defaults
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load overrides from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut config = Self::default();
        let mut reader = csv::Reader::from_reader(reader);

        for result in reader.records() {
            let record = result?;
            let key = record.get(0).unwrap_or("").trim();
            let raw = record.get(1).unwrap_or("").trim();
            config.apply(key, raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, key: &str, raw: &str) -> Result<()> {
        let value: f64 = raw
            .parse()
            .map_err(|_| VelocityError::Parse(format!("{key}: '{raw}' is not a number")))?;

        match key {
            "floor_chunk" => self.search.floor_chunk = value,
            "max_balance_fraction" => self.search.max_balance_fraction = value,
            "rounding_step" => self.search.rounding_step = value,
            "max_iterations" => self.search.max_iterations = as_count(key, value)?,
            "month_tolerance_fraction" => self.search.month_tolerance_fraction = value,
            "savings_weight" => self.scoring.savings = value,
            "horizon_weight" => self.scoring.horizon = value,
            "sustainability_weight" => self.scoring.sustainability = value,
            "band_min_years" => self.band.min_years = value,
            "band_max_years" => self.band.max_years = value,
            "band_penalty_per_year" => self.band.penalty_per_year = value,
            "epsilon" => self.simulation.epsilon = value,
            "ceiling_factor" => self.simulation.ceiling_factor = as_count(key, value)?,
            "grid_points" => self.objective.grid_points = as_count(key, value)?,
            "balanced_interest_weight" => self.objective.interest_weight = value,
            "balanced_time_weight" => self.objective.time_weight = value,
            other => {
                return Err(VelocityError::Parse(format!(
                    "unknown optimizer setting '{other}'"
                )))
            }
        }
        Ok(())
    }

    /// Sanity checks on loaded values
    pub fn validate(&self) -> Result<()> {
        if self.search.floor_chunk <= 0.0 {
            return Err(VelocityError::invalid("floor_chunk", "must be > 0"));
        }
        if self.search.rounding_step <= 0.0 {
            return Err(VelocityError::invalid("rounding_step", "must be > 0"));
        }
        if !(self.search.max_balance_fraction > 0.0 && self.search.max_balance_fraction <= 1.0) {
            return Err(VelocityError::invalid(
                "max_balance_fraction",
                "must be in (0, 1]",
            ));
        }
        if self.search.max_iterations == 0 {
            return Err(VelocityError::invalid("max_iterations", "must be > 0"));
        }
        if self.simulation.epsilon <= 0.0 {
            return Err(VelocityError::invalid("epsilon", "must be > 0"));
        }
        if self.simulation.ceiling_factor == 0 {
            return Err(VelocityError::invalid("ceiling_factor", "must be > 0"));
        }
        if self.band.min_years > self.band.max_years {
            return Err(VelocityError::invalid(
                "band_min_years",
                "must not exceed band_max_years",
            ));
        }
        let weights = [
            self.scoring.savings,
            self.scoring.horizon,
            self.scoring.sustainability,
        ];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(VelocityError::invalid("scoring", "weights must be >= 0"));
        }
        if self.objective.grid_points < 2 {
            return Err(VelocityError::invalid("grid_points", "must be >= 2"));
        }
        if self.objective.interest_weight < 0.0 || self.objective.time_weight < 0.0 {
            return Err(VelocityError::invalid(
                "balanced weights",
                "must be >= 0",
            ));
        }
        Ok(())
    }
}

fn as_count(key: &str, value: f64) -> Result<u32> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(VelocityError::Parse(format!(
            "{key}: expected a whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.search.max_iterations, 20);
        assert_eq!(config.variation_multipliers.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_horizon_band_score() {
        let band = HorizonBand::default();
        assert_eq!(band.score(10.0), 1.0);
        assert_eq!(band.score(7.0), 1.0);
        assert!((band.score(5.0) - 0.8).abs() < 1e-12);
        assert!((band.score(20.0) - 0.5).abs() < 1e-12);
        assert_eq!(band.score(40.0), 0.0);
    }

    #[test]
    fn test_month_tolerance() {
        let search = SearchConfig::default();
        assert_eq!(search.month_tolerance(120), 12);
        assert_eq!(search.month_tolerance(5), 1);
    }

    #[test]
    fn test_overrides_from_reader() {
        let csv = "key,value\nmax_iterations,12\nsavings_weight,0.5\nband_max_years,20\n";
        let config = OptimizerConfig::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(config.search.max_iterations, 12);
        assert_eq!(config.scoring.savings, 0.5);
        assert_eq!(config.band.max_years, 20.0);
        assert_eq!(config.scoring.horizon, 0.4);
    }

    #[test]
    fn test_objective_overrides() {
        let csv = "key,value\ngrid_points,25\nbalanced_time_weight,0.5\n";
        let config = OptimizerConfig::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(config.objective.grid_points, 25);
        assert_eq!(config.objective.time_weight, 0.5);
        assert_eq!(config.objective.interest_weight, 0.6);

        let csv = "key,value\ngrid_points,1\n";
        assert!(OptimizerConfig::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let csv = "key,value\nturbo_mode,1\n";
        assert!(OptimizerConfig::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_fractional_iterations_rejected() {
        let csv = "key,value\nmax_iterations,2.5\n";
        assert!(OptimizerConfig::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_default_file() {
        let config = OptimizerConfig::from_csv().expect("Failed to load optimizer.csv");
        assert_eq!(config, OptimizerConfig::default());
    }
}
