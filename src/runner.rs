//! Request dispatch and batch evaluation
//!
//! Holds one optimizer configuration and evaluates strategy requests
//! against it, singly or across many profiles in parallel.
//!
//! # Example
//! ```ignore
//! let runner = StrategyRunner::from_csv()?;
//! let outcome = runner.run(&mortgage, &heloc, &StrategyRequest::Target { target_years: 10 })?;
//! ```

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::optimizer::{
    generate_scenarios, optimize_all_objectives, optimize_chunk, strategies_for_target,
    ChunkOptimization, Objective, ScenarioSet, TargetStrategies,
};
use crate::profile::{HelocParams, MortgageParams, Profile};
use crate::simulation::{simulate_strategy, StrategyResult};

/// What to compute for a mortgage/HELOC pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StrategyRequest {
    /// Simulate a fixed chunk amount
    Simulate { chunk_amount: f64 },
    /// Find the chunk (and its variations) for a payoff horizon
    Target { target_years: u32 },
    /// Generate and score checkpoint scenarios
    Scenarios,
    /// Chunk minimizing one objective
    Objective { objective: Objective },
    /// Chunk minimizing each objective in turn
    AllObjectives,
}

/// Result of a dispatched request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "result", rename_all = "camelCase")]
pub enum StrategyOutcome {
    Simulation(StrategyResult),
    Target(TargetStrategies),
    Scenarios(ScenarioSet),
    Objective(ChunkOptimization),
    AllObjectives(Vec<ChunkOptimization>),
}

impl StrategyOutcome {
    /// Chunk amount this outcome recommends, if any
    pub fn chunk_amount(&self) -> Option<f64> {
        match self {
            StrategyOutcome::Simulation(result) => Some(result.summary.chunk_amount),
            StrategyOutcome::Target(target) => target.optimal_chunk(),
            StrategyOutcome::Scenarios(set) => set.recommended().and_then(|s| s.chunk_amount),
            StrategyOutcome::Objective(outcome) => outcome.chunk_amount,
            StrategyOutcome::AllObjectives(outcomes) => {
                most_confident(outcomes).and_then(|o| o.chunk_amount)
            }
        }
    }

    /// Payoff months of the recommended strategy, if any
    pub fn months(&self) -> Option<u32> {
        match self {
            StrategyOutcome::Simulation(result) => Some(result.months()),
            StrategyOutcome::Target(target) => target.optimal.result.as_ref().map(|r| r.months()),
            StrategyOutcome::Scenarios(set) => set
                .recommended()
                .and_then(|s| s.summary.as_ref())
                .map(|summary| summary.total_months),
            StrategyOutcome::Objective(outcome) => {
                outcome.summary.as_ref().map(|s| s.total_months)
            }
            StrategyOutcome::AllObjectives(outcomes) => most_confident(outcomes)
                .and_then(|o| o.summary.as_ref())
                .map(|s| s.total_months),
        }
    }

    /// Net interest savings of the recommended strategy, if any
    pub fn net_savings(&self) -> Option<f64> {
        match self {
            StrategyOutcome::Simulation(result) => Some(result.net_savings()),
            StrategyOutcome::Target(target) => {
                target.optimal.result.as_ref().map(|r| r.net_savings())
            }
            StrategyOutcome::Scenarios(set) => set
                .recommended()
                .and_then(|s| s.summary.as_ref())
                .map(|summary| summary.net_savings),
            StrategyOutcome::Objective(outcome) => {
                outcome.summary.as_ref().map(|s| s.net_savings)
            }
            StrategyOutcome::AllObjectives(outcomes) => most_confident(outcomes)
                .and_then(|o| o.summary.as_ref())
                .map(|s| s.net_savings),
        }
    }
}

/// Converged result with the highest confidence (earliest objective on ties)
fn most_confident(outcomes: &[ChunkOptimization]) -> Option<&ChunkOptimization> {
    outcomes
        .iter()
        .filter(|o| o.converged)
        .fold(None, |best: Option<&ChunkOptimization>, o| match best {
            Some(b) if b.confidence >= o.confidence => Some(b),
            _ => Some(o),
        })
}

/// Evaluate one request
pub fn run_request(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    request: &StrategyRequest,
    config: &OptimizerConfig,
) -> Result<StrategyOutcome> {
    match *request {
        StrategyRequest::Simulate { chunk_amount } => {
            simulate_strategy(mortgage, heloc, chunk_amount, &config.simulation)
                .map(StrategyOutcome::Simulation)
        }
        StrategyRequest::Target { target_years } => {
            strategies_for_target(mortgage, heloc, target_years, config)
                .map(StrategyOutcome::Target)
        }
        StrategyRequest::Scenarios => {
            generate_scenarios(mortgage, heloc, config).map(StrategyOutcome::Scenarios)
        }
        StrategyRequest::Objective { objective } => {
            optimize_chunk(mortgage, heloc, objective, config).map(StrategyOutcome::Objective)
        }
        StrategyRequest::AllObjectives => {
            optimize_all_objectives(mortgage, heloc, config).map(StrategyOutcome::AllObjectives)
        }
    }
}

/// One profile's outcome in a batch run
#[derive(Debug)]
pub struct ProfileOutcome {
    pub profile_id: u32,
    pub request: StrategyRequest,
    pub outcome: Result<StrategyOutcome>,
}

/// Evaluates requests against a fixed optimizer configuration
#[derive(Debug, Clone, Default)]
pub struct StrategyRunner {
    config: OptimizerConfig,
}

impl StrategyRunner {
    /// Runner with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with overrides from data/config/optimizer.csv
    pub fn from_csv() -> Result<Self> {
        Ok(Self {
            config: OptimizerConfig::from_csv()?,
        })
    }

    /// Runner with overrides from a specific file
    pub fn from_csv_path(path: &std::path::Path) -> Result<Self> {
        Ok(Self {
            config: OptimizerConfig::from_csv_path(path)?,
        })
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn run(
        &self,
        mortgage: &MortgageParams,
        heloc: &HelocParams,
        request: &StrategyRequest,
    ) -> Result<StrategyOutcome> {
        run_request(mortgage, heloc, request, &self.config)
    }

    pub fn run_profile(&self, profile: &Profile) -> Result<StrategyOutcome> {
        self.run(&profile.mortgage, &profile.heloc, &profile.request)
    }

    /// Evaluate every profile in parallel. A failing profile does not stop
    /// the batch; its error is kept in the returned outcome.
    pub fn run_batch(&self, profiles: &[Profile]) -> Vec<ProfileOutcome> {
        let outcomes: Vec<ProfileOutcome> = profiles
            .par_iter()
            .map(|profile| {
                let outcome = self.run_profile(profile);
                if let Err(e) = &outcome {
                    warn!("Profile {}: {}", profile.profile_id, e);
                }
                ProfileOutcome {
                    profile_id: profile.profile_id,
                    request: profile.request.clone(),
                    outcome,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.outcome.is_err()).count();
        info!("Evaluated {} profiles ({} failed)", outcomes.len(), failed);
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VelocityError;
    use crate::profile::{load_default_profiles, load_profiles_from_reader};

    fn reference_mortgage() -> MortgageParams {
        MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1799.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        }
    }

    #[test]
    fn test_dispatch() {
        let heloc = HelocParams::new(50_000.0, 8.0);
        let runner = StrategyRunner::new();

        let simulated = runner
            .run(
                &reference_mortgage(),
                &heloc,
                &StrategyRequest::Simulate {
                    chunk_amount: 10_000.0,
                },
            )
            .unwrap();
        assert!(matches!(simulated, StrategyOutcome::Simulation(_)));
        assert_eq!(simulated.chunk_amount(), Some(10_000.0));

        let target = runner
            .run(
                &reference_mortgage(),
                &heloc,
                &StrategyRequest::Target { target_years: 10 },
            )
            .unwrap();
        assert!(matches!(target, StrategyOutcome::Target(_)));
        assert!(target.months().is_some());
    }

    #[test]
    fn test_request_json_shape() {
        let request = StrategyRequest::Simulate {
            chunk_amount: 10_000.0,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"type":"simulate","chunkAmount":10000.0}"#);

        let parsed: StrategyRequest =
            serde_json::from_str(r#"{"type":"target","targetYears":12}"#).unwrap();
        assert_eq!(parsed, StrategyRequest::Target { target_years: 12 });
    }

    #[test]
    fn test_objective_requests() {
        let heloc = HelocParams::new(50_000.0, 8.0);
        let runner = StrategyRunner::new();

        let request: StrategyRequest =
            serde_json::from_str(r#"{"type":"objective","objective":"time"}"#).unwrap();
        assert_eq!(
            request,
            StrategyRequest::Objective {
                objective: Objective::Time
            }
        );
        let single = runner.run(&reference_mortgage(), &heloc, &request).unwrap();
        assert!(matches!(single, StrategyOutcome::Objective(_)));
        assert!(single.chunk_amount().is_some());

        let all = runner
            .run(&reference_mortgage(), &heloc, &StrategyRequest::AllObjectives)
            .unwrap();
        let StrategyOutcome::AllObjectives(outcomes) = &all else {
            panic!("expected every objective, got {all:?}");
        };
        assert_eq!(outcomes.len(), 3);
        assert!(all.net_savings().unwrap() > 0.0);
    }

    #[test]
    fn test_batch_keeps_failures() {
        let csv = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears
1,300000,6.0,1799,8000,4000,50000,8.0,,10000,
2,300000,6.0,1799,5000,4000,50000,8.0,,10000,
";
        let profiles = load_profiles_from_reader(csv.as_bytes()).unwrap();
        let outcomes = StrategyRunner::new().run_batch(&profiles);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].profile_id, 1);
        assert!(outcomes[0].outcome.is_ok());
        assert!(matches!(
            outcomes[1].outcome,
            Err(VelocityError::InsufficientCashflow { .. })
        ));
    }

    #[test]
    fn test_default_profiles_all_evaluate() {
        let profiles = load_default_profiles().expect("Failed to load profiles");
        let outcomes = StrategyRunner::new().run_batch(&profiles);

        assert_eq!(outcomes.len(), profiles.len());
        for (profile, outcome) in profiles.iter().zip(&outcomes) {
            assert_eq!(profile.profile_id, outcome.profile_id);
            assert!(outcome.outcome.is_ok(), "profile {}", outcome.profile_id);
        }
    }
}
