//! Chunk-amount spread around the optimum for an explicit target horizon

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::scenarios::StrategyKind;
use super::search::{find_chunk_for_target, round_to_step, search_upper_bound, TargetSearch};
use crate::config::OptimizerConfig;
use crate::error::{Result, VelocityError};
use crate::profile::{HelocParams, MortgageParams};
use crate::simulation::{format_currency, simulate_strategy, StrategySummary};

/// Longest target horizon accepted, in years
pub const MAX_TARGET_YEARS: u32 = 30;

/// One chunk amount simulated around the optimum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkVariation {
    /// Fraction of the optimal chunk (1.0 = optimal)
    pub multiplier: f64,
    pub chunk_amount: f64,
    pub strategy_kind: StrategyKind,
    pub summary: Option<StrategySummary>,

    /// Pays off within the month tolerance of the target with positive savings
    pub is_viable: bool,
    pub notes: Vec<String>,
}

/// Optimal chunk for a target horizon plus its variation spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetStrategies {
    pub target_years: u32,
    pub optimal: TargetSearch,
    /// Empty when no viable optimal chunk exists
    pub variations: Vec<ChunkVariation>,
}

impl TargetStrategies {
    pub fn optimal_chunk(&self) -> Option<f64> {
        self.optimal.chunk_amount
    }
}

/// Search the optimal chunk for `target_years`, then simulate each configured
/// multiple of it independently.
pub fn strategies_for_target(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    target_years: u32,
    config: &OptimizerConfig,
) -> Result<TargetStrategies> {
    if !(1..=MAX_TARGET_YEARS).contains(&target_years) {
        return Err(VelocityError::invalid(
            "targetYears",
            format!("must be between 1 and {MAX_TARGET_YEARS}"),
        ));
    }
    config.validate()?;

    let target_months = target_years * 12;
    let optimal = find_chunk_for_target(mortgage, heloc, target_months, config)?;

    let Some(optimal_chunk) = optimal.chunk_amount else {
        info!("No viable chunk for a {target_years}-year target; skipping variations");
        return Ok(TargetStrategies {
            target_years,
            optimal,
            variations: Vec::new(),
        });
    };

    let tolerance = config.search.month_tolerance(target_months);
    let variations = config
        .variation_multipliers
        .par_iter()
        .map(|multiplier| {
            simulate_variation(
                mortgage,
                heloc,
                optimal_chunk,
                *multiplier,
                target_months,
                tolerance,
                config,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        "{}-year target: optimal chunk {}, {} of {} variations viable",
        target_years,
        format_currency(optimal_chunk),
        variations.iter().filter(|v| v.is_viable).count(),
        variations.len()
    );

    Ok(TargetStrategies {
        target_years,
        optimal,
        variations,
    })
}

fn simulate_variation(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    optimal_chunk: f64,
    multiplier: f64,
    target_months: u32,
    tolerance: u32,
    config: &OptimizerConfig,
) -> Result<ChunkVariation> {
    let step = config.search.rounding_step;
    let mut notes = Vec::new();

    let upper = search_upper_bound(mortgage, heloc, &config.search);

    let mut chunk = round_to_step(optimal_chunk * multiplier, step).max(step);
    if chunk > upper {
        if upper < heloc.credit_limit {
            notes.push(format!(
                "Capped at {}, the largest chunk searched",
                format_currency(upper)
            ));
        } else {
            notes.push(format!(
                "Capped at the {} credit limit",
                format_currency(heloc.credit_limit)
            ));
        }
        chunk = upper;
    }

    let (summary, is_viable) = match simulate_strategy(mortgage, heloc, chunk, &config.simulation) {
        Ok(result) => {
            let months = result.months();
            let meets_target = months <= target_months + tolerance;
            if !meets_target {
                notes.push(format!(
                    "Pays off in {months} months, past the {target_months}-month target"
                ));
            }
            if result.net_savings() <= 0.0 {
                notes.push("No interest savings over the standard schedule".to_string());
            }
            let viable = meets_target && result.net_savings() > 0.0;
            (Some(result.summary), viable)
        }
        Err(e) if e.is_input_rejection() => return Err(e),
        Err(e) => {
            notes.push(e.to_string());
            (None, false)
        }
    };

    Ok(ChunkVariation {
        multiplier,
        chunk_amount: chunk,
        strategy_kind: StrategyKind::classify(chunk, heloc.credit_limit),
        summary,
        is_viable,
        notes,
    })
}
