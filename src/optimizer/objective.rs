//! Goal-driven chunk optimization
//!
//! Scans an evenly spaced grid of chunk amounts between the floor chunk and
//! the credit limit, simulates each one, and keeps the chunk that minimizes
//! the chosen [`Objective`]. Each pick carries a confidence score that is
//! penalized when the chunk sits at the edge of the range, outruns the
//! household's cashflow, or nearly exhausts the credit line.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::scenarios::StrategyKind;
use super::search::round_to_step;
use crate::amortization::MAX_SCHEDULE_MONTHS;
use crate::config::{ObjectiveConfig, OptimizerConfig};
use crate::error::{Result, VelocityError};
use crate::profile::{HelocParams, MortgageParams};
use crate::simulation::{format_currency, simulate_strategy, StrategySummary};

/// Confidence reported when no candidate could be simulated
const UNCONVERGED_CONFIDENCE: f64 = 0.3;

/// Months of net cashflow a chunk should be repayable within
const REPAYMENT_MONTHS: f64 = 3.0;

/// What the optimizer minimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Total interest (mortgage plus HELOC)
    Interest,
    /// Months to payoff, with interest as a tie-breaker
    Time,
    /// Weighted blend of interest relative to the balance and months relative to 30 years
    Balanced,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Interest, Objective::Time, Objective::Balanced];

    /// Value to minimize for a simulated strategy (lower is better)
    pub fn evaluate(
        &self,
        summary: &StrategySummary,
        balance: f64,
        config: &ObjectiveConfig,
    ) -> f64 {
        let months = summary.total_months as f64;
        match self {
            Objective::Interest => summary.total_interest,
            Objective::Time => months + summary.total_interest / 10_000.0,
            Objective::Balanced => {
                config.interest_weight * summary.total_interest / balance
                    + config.time_weight * months / MAX_SCHEDULE_MONTHS as f64
            }
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Objective::Interest => "interest",
            Objective::Time => "time",
            Objective::Balanced => "balanced",
        };
        f.write_str(label)
    }
}

impl FromStr for Objective {
    type Err = VelocityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interest" => Ok(Objective::Interest),
            "time" => Ok(Objective::Time),
            "balanced" => Ok(Objective::Balanced),
            other => Err(VelocityError::Parse(format!(
                "unknown objective '{other}' (expected interest, time or balanced)"
            ))),
        }
    }
}

/// Best chunk for one objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkOptimization {
    pub objective: Objective,
    pub lower_bound: f64,
    pub upper_bound: f64,

    /// None when no candidate in the range could be repaid
    pub chunk_amount: Option<f64>,
    pub summary: Option<StrategySummary>,
    pub objective_value: Option<f64>,
    pub strategy_kind: Option<StrategyKind>,

    /// 0-1, see [`confidence_score`]
    pub confidence: f64,
    pub converged: bool,

    /// Candidates simulated, and how many of them failed
    pub candidates: usize,
    pub failed_candidates: usize,
    pub notes: Vec<String>,
}

/// A grid point that simulated successfully
#[derive(Debug, Clone)]
struct Candidate {
    chunk_amount: f64,
    summary: StrategySummary,
}

/// Simulated grid shared by every objective
#[derive(Debug, Clone)]
struct CandidateGrid {
    lower: f64,
    upper: f64,
    feasible: Vec<Candidate>,
    failed: usize,
}

/// Find the chunk minimizing `objective` over `[floor_chunk, credit_limit]`.
///
/// # Errors
/// Only input rejections (invalid parameters, insufficient cashflow,
/// invalid configuration). A range in which no chunk can be repaid yields an
/// unconverged result.
pub fn optimize_chunk(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    objective: Objective,
    config: &OptimizerConfig,
) -> Result<ChunkOptimization> {
    let grid = evaluate_grid(mortgage, heloc, config)?;
    Ok(select(&grid, objective, mortgage, heloc, &config.objective))
}

/// Optimize every objective against one shared grid of simulations
pub fn optimize_all_objectives(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &OptimizerConfig,
) -> Result<Vec<ChunkOptimization>> {
    let grid = evaluate_grid(mortgage, heloc, config)?;
    Ok(Objective::ALL
        .iter()
        .map(|objective| select(&grid, *objective, mortgage, heloc, &config.objective))
        .collect())
}

/// Evenly spaced chunk amounts rounded to `step`, ascending and deduplicated.
/// Both ends of the range are always included.
pub fn chunk_grid(lower: f64, upper: f64, points: u32, step: f64) -> Vec<f64> {
    if points < 2 || upper <= lower {
        return vec![lower];
    }

    let last = (points - 1) as f64;
    let mut chunks: Vec<f64> = (0..points)
        .map(|i| {
            let raw = lower + (upper - lower) * i as f64 / last;
            round_to_step(raw, step).clamp(lower, upper)
        })
        .collect();
    chunks.dedup();
    chunks
}

/// Confidence in an optimized chunk (0-1).
///
/// Starts at 1 and loses 0.2 when the chunk is within 10% of either end of
/// the range, 0.3 when it exceeds three months of net cashflow, and 0.1 when
/// it uses more than 90% of the credit line.
pub fn confidence_score(
    chunk_amount: f64,
    lower: f64,
    upper: f64,
    net_cashflow: f64,
    credit_limit: f64,
) -> f64 {
    let mut score: f64 = 1.0;

    let range = upper - lower;
    if range > 0.0 {
        let position = (chunk_amount - lower) / range;
        if !(0.1..=0.9).contains(&position) {
            score -= 0.2;
        }
    }
    if chunk_amount > net_cashflow * REPAYMENT_MONTHS {
        score -= 0.3;
    }
    if credit_limit > 0.0 && chunk_amount / credit_limit > 0.9 {
        score -= 0.1;
    }

    score.clamp(0.0, 1.0)
}

fn evaluate_grid(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &OptimizerConfig,
) -> Result<CandidateGrid> {
    mortgage.validate_for_strategy()?;
    heloc.validate()?;
    config.validate()?;

    let upper = heloc.credit_limit;
    let lower = config.search.floor_chunk.min(upper);
    let chunks = chunk_grid(
        lower,
        upper,
        config.objective.grid_points,
        config.search.rounding_step,
    );

    let outcomes = chunks
        .par_iter()
        .map(|chunk| {
            match simulate_strategy(mortgage, heloc, *chunk, &config.simulation) {
                Ok(result) => Ok(Some(Candidate {
                    chunk_amount: *chunk,
                    summary: result.summary,
                })),
                Err(e) if e.is_input_rejection() => Err(e),
                Err(e) => {
                    debug!("Candidate {chunk:.0} failed: {e}");
                    Ok(None)
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let failed = outcomes.iter().filter(|c| c.is_none()).count();
    Ok(CandidateGrid {
        lower,
        upper,
        feasible: outcomes.into_iter().flatten().collect(),
        failed,
    })
}

fn select(
    grid: &CandidateGrid,
    objective: Objective,
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &ObjectiveConfig,
) -> ChunkOptimization {
    let candidates = grid.feasible.len() + grid.failed;
    let mut notes = Vec::new();

    // Ascending grid with a strict comparison keeps the smaller chunk on ties
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in &grid.feasible {
        let value = objective.evaluate(&candidate.summary, mortgage.balance, config);
        if best.map_or(true, |(_, v)| value < v) {
            best = Some((candidate, value));
        }
    }

    let Some((best, value)) = best else {
        notes.push(format!(
            "No chunk between {} and {} can be repaid from the available cashflow",
            format_currency(grid.lower),
            format_currency(grid.upper)
        ));
        info!("Objective {objective}: no sustainable chunk in {candidates} candidates");
        return ChunkOptimization {
            objective,
            lower_bound: grid.lower,
            upper_bound: grid.upper,
            chunk_amount: None,
            summary: None,
            objective_value: None,
            strategy_kind: None,
            confidence: UNCONVERGED_CONFIDENCE,
            converged: false,
            candidates,
            failed_candidates: grid.failed,
            notes,
        };
    };

    let chunk = best.chunk_amount;
    let net_cashflow = mortgage.net_cashflow();
    let confidence = confidence_score(
        chunk,
        grid.lower,
        grid.upper,
        net_cashflow,
        heloc.credit_limit,
    );

    let range = grid.upper - grid.lower;
    if range > 0.0 && !(0.1..=0.9).contains(&((chunk - grid.lower) / range)) {
        notes.push("Chunk sits at the edge of the searched range".to_string());
    }
    if chunk > net_cashflow * REPAYMENT_MONTHS {
        notes.push(format!(
            "Chunk exceeds three months of net cashflow ({})",
            format_currency(net_cashflow * REPAYMENT_MONTHS)
        ));
    }
    if chunk / heloc.credit_limit > 0.9 {
        notes.push("Chunk uses more than 90% of the credit line".to_string());
    }

    info!(
        "Objective {}: chunk {} -> {} months, {} interest (confidence {:.2})",
        objective,
        format_currency(chunk),
        best.summary.total_months,
        format_currency(best.summary.total_interest),
        confidence
    );

    ChunkOptimization {
        objective,
        lower_bound: grid.lower,
        upper_bound: grid.upper,
        chunk_amount: Some(chunk),
        summary: Some(best.summary.clone()),
        objective_value: Some(value),
        strategy_kind: Some(StrategyKind::classify(chunk, heloc.credit_limit)),
        confidence,
        converged: true,
        candidates,
        failed_candidates: grid.failed,
        notes,
    }
}
