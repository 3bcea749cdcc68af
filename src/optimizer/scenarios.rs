//! Five-scenario generation and recommendation

use std::fmt;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::checkpoints::{normalize_checkpoints, CheckpointPolicy};
use super::scoring::score_scenarios;
use super::search::{find_chunk_for_target, TargetSearch};
use crate::amortization::standard_baseline;
use crate::config::OptimizerConfig;
use crate::error::Result;
use crate::profile::{HelocParams, MortgageParams};
use crate::simulation::{format_currency, StrategySummary};

/// How much of the credit line a chunk uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Below 30% of the credit limit
    Conservative,
    Moderate,
    /// Above 70% of the credit limit
    Aggressive,
}

impl StrategyKind {
    pub fn classify(chunk_amount: f64, credit_limit: f64) -> Self {
        if chunk_amount < credit_limit * 0.3 {
            StrategyKind::Conservative
        } else if chunk_amount > credit_limit * 0.7 {
            StrategyKind::Aggressive
        } else {
            StrategyKind::Moderate
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StrategyKind::Conservative => "conservative",
            StrategyKind::Moderate => "moderate",
            StrategyKind::Aggressive => "aggressive",
        };
        f.write_str(label)
    }
}

/// One checkpoint of scenario generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub target_years: u32,
    pub chunk_amount: Option<f64>,
    pub summary: Option<StrategySummary>,
    pub is_viable: bool,
    pub notes: Vec<String>,
    pub strategy_kind: Option<StrategyKind>,
    /// Recommendation score (viable scenarios only)
    pub score: Option<f64>,
}

impl Scenario {
    fn from_search(target_years: u32, search: TargetSearch, credit_limit: f64) -> Self {
        let strategy_kind = search
            .chunk_amount
            .map(|chunk| StrategyKind::classify(chunk, credit_limit));
        Self {
            target_years,
            chunk_amount: search.chunk_amount,
            summary: search.result.map(|r| r.summary),
            is_viable: search.is_viable,
            notes: search.notes,
            strategy_kind,
            score: None,
        }
    }
}

/// All scenarios generated for one mortgage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSet {
    pub standard_months: u32,
    pub standard_interest: f64,
    pub scenarios: Vec<Scenario>,
    /// Index into `scenarios` of the highest-scoring viable scenario
    pub recommended: Option<usize>,
}

impl ScenarioSet {
    pub fn recommended(&self) -> Option<&Scenario> {
        self.recommended.and_then(|i| self.scenarios.get(i))
    }

    pub fn viable(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|s| s.is_viable)
    }
}

/// Generate scenarios with the checkpoint policy from `config`
pub fn generate_scenarios(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &OptimizerConfig,
) -> Result<ScenarioSet> {
    generate_scenarios_with(mortgage, heloc, config, &config.checkpoints)
}

/// Generate scenarios for the checkpoint years chosen by `policy`.
///
/// Each checkpoint is searched independently (in parallel), scenarios whose
/// chunk duplicates an earlier scenario's are dropped, and the remaining
/// viable scenarios are scored.
pub fn generate_scenarios_with(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &OptimizerConfig,
    policy: &dyn CheckpointPolicy,
) -> Result<ScenarioSet> {
    mortgage.validate_for_strategy()?;
    heloc.validate()?;
    config.validate()?;

    let standard = standard_baseline(
        mortgage.balance,
        mortgage.annual_rate_pct,
        mortgage.monthly_payment,
    )?;
    let standard_months = standard.months;

    let checkpoints =
        normalize_checkpoints(policy.checkpoint_years(standard_months), standard_months);
    info!(
        "Generating scenarios for {:?} years (standard payoff {} months)",
        checkpoints, standard_months
    );

    let searches = checkpoints
        .par_iter()
        .map(|years| find_chunk_for_target(mortgage, heloc, years * 12, config))
        .collect::<Result<Vec<_>>>()?;

    let mut scenarios: Vec<Scenario> = Vec::with_capacity(searches.len());
    for (years, search) in checkpoints.iter().zip(searches) {
        let scenario = Scenario::from_search(*years, search, heloc.credit_limit);
        if let Some(chunk) = scenario.chunk_amount {
            if scenarios.iter().any(|s| s.chunk_amount == Some(chunk)) {
                info!(
                    "Dropping {}-year scenario: chunk {} already covered",
                    years,
                    format_currency(chunk)
                );
                continue;
            }
        }
        scenarios.push(scenario);
    }

    let recommended = score_scenarios(&mut scenarios, &config.scoring, &config.band);
    match recommended.and_then(|i| scenarios.get(i)) {
        Some(best) => info!(
            "Recommended {}-year scenario (chunk {:.0}, score {:.3})",
            best.target_years,
            best.chunk_amount.unwrap_or(0.0),
            best.score.unwrap_or(0.0)
        ),
        None => info!("No viable scenario to recommend"),
    }

    Ok(ScenarioSet {
        standard_months,
        standard_interest: standard.total_interest,
        scenarios,
        recommended,
    })
}
