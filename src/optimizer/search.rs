//! Target-seeking binary search over chunk amounts
//!
//! Assumes payoff months are non-increasing in the chunk amount. The search
//! checks that assumption against every earlier probe and stops as soon as it
//! is contradicted, keeping the best probe seen so far.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{OptimizerConfig, SearchConfig};
use crate::error::{Result, VelocityError};
use crate::profile::{HelocParams, MortgageParams};
use crate::simulation::{format_currency, simulate_strategy, StrategyResult};

/// One simulated probe of the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProbe {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub chunk_amount: f64,
    /// None when the simulation failed (chunk too aggressive for the cashflow)
    pub months: Option<u32>,
    pub net_savings: Option<f64>,
}

/// Outcome of searching for the chunk that meets a target payoff horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSearch {
    pub target_months: u32,

    /// Chunk amount found (None when no viable chunk exists for the target)
    pub chunk_amount: Option<f64>,

    /// Simulation of the chosen chunk (viable searches only)
    pub result: Option<StrategyResult>,

    /// Payoff months of the closest probe, viable or not
    pub closest_months: Option<u32>,

    pub is_viable: bool,
    pub probes: Vec<SearchProbe>,
    pub notes: Vec<String>,
}

impl TargetSearch {
    fn non_viable(target_months: u32, probes: Vec<SearchProbe>, notes: Vec<String>) -> Self {
        Self {
            target_months,
            chunk_amount: None,
            result: None,
            closest_months: None,
            is_viable: false,
            probes,
            notes,
        }
    }
}

/// Round to the nearest multiple of `step`
pub(crate) fn round_to_step(amount: f64, step: f64) -> f64 {
    (amount / step).round() * step
}

/// Largest chunk the search will probe: the credit limit or
/// `max_balance_fraction` of the mortgage balance, whichever is smaller
pub(crate) fn search_upper_bound(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    search: &SearchConfig,
) -> f64 {
    heloc
        .credit_limit
        .min(search.max_balance_fraction * mortgage.balance)
}

/// Find the chunk amount whose payoff horizon is closest to `target_months`.
///
/// Probes lie in `[floor_chunk, min(credit_limit, max_balance_fraction * balance)]`,
/// rounded to `rounding_step`. A probe paying off later than the target raises
/// the lower bound, otherwise the upper bound comes down. Failed simulations
/// count as too aggressive. Failing to converge is reported through
/// `is_viable = false` and `notes`, never as an error.
///
/// # Errors
/// Only input rejections (invalid parameters, insufficient cashflow, zero target).
pub fn find_chunk_for_target(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    target_months: u32,
    config: &OptimizerConfig,
) -> Result<TargetSearch> {
    mortgage.validate_for_strategy()?;
    heloc.validate()?;
    if target_months == 0 {
        return Err(VelocityError::invalid("targetMonths", "must be >= 1"));
    }

    let search = &config.search;
    let step = search.rounding_step;
    let upper = search_upper_bound(mortgage, heloc, search);
    let mut lo = search.floor_chunk.min(upper);
    let mut hi = upper;

    let mut probes: Vec<SearchProbe> = Vec::with_capacity(search.max_iterations as usize);
    let mut notes = Vec::new();
    let mut best: Option<StrategyResult> = None;

    for iteration in 1..=search.max_iterations {
        if lo > hi {
            break;
        }
        let chunk = round_to_step((lo + hi) / 2.0, step).clamp(lo, hi);
        if probes.iter().any(|p| p.chunk_amount == chunk) {
            break;
        }

        let outcome = simulate_strategy(mortgage, heloc, chunk, &config.simulation);
        let result = match outcome {
            Ok(result) => result,
            Err(e) if e.is_input_rejection() => return Err(e),
            Err(e) => {
                debug!("Probe {iteration}: chunk {chunk:.0} failed ({e}), lowering upper bound");
                probes.push(SearchProbe {
                    iteration,
                    lower_bound: lo,
                    upper_bound: hi,
                    chunk_amount: chunk,
                    months: None,
                    net_savings: None,
                });
                hi = chunk - step;
                continue;
            }
        };

        let months = result.months();
        debug!(
            "Probe {iteration}: chunk {chunk:.0} -> {months} months (target {target_months}), bounds [{lo:.0}, {hi:.0}]"
        );

        let contradicted = probes.iter().find(|p| {
            p.months
                .is_some_and(|earlier| p.chunk_amount < chunk && earlier < months)
        });
        let violation = contradicted.map(|p| (p.chunk_amount, p.months.unwrap_or(0)));

        probes.push(SearchProbe {
            iteration,
            lower_bound: lo,
            upper_bound: hi,
            chunk_amount: chunk,
            months: Some(months),
            net_savings: Some(result.net_savings()),
        });

        if is_closer(&result, best.as_ref(), target_months) {
            best = Some(result);
        }

        if let Some((smaller_chunk, smaller_months)) = violation {
            warn!(
                "Payoff months not monotonic in chunk: {} took {} months but {} took {}; stopping search",
                format_currency(smaller_chunk),
                smaller_months,
                format_currency(chunk),
                months
            );
            notes.push(format!(
                "Search stopped early: a larger chunk ({}) took longer than a smaller one ({})",
                format_currency(chunk),
                format_currency(smaller_chunk)
            ));
            break;
        }

        if months == target_months {
            break;
        }
        if months > target_months {
            lo = chunk + step;
        } else {
            hi = chunk - step;
        }
    }

    let Some(best) = best else {
        notes.push(format!(
            "No chunk between {} and {} can be repaid from the available cashflow",
            format_currency(search.floor_chunk.min(upper)),
            format_currency(upper)
        ));
        info!("Target {target_months} months: no sustainable chunk");
        return Ok(TargetSearch::non_viable(target_months, probes, notes));
    };

    let months = best.months();
    let chunk = best.summary.chunk_amount;
    let tolerance = search.month_tolerance(target_months);

    if months.abs_diff(target_months) > tolerance {
        notes.push(format!(
            "Closest chunk {} pays off in {} months, outside {} months of the {}-month target",
            format_currency(chunk),
            months,
            tolerance,
            target_months
        ));
        info!("Target {target_months} months: not reachable (closest {months})");
        let mut outcome = TargetSearch::non_viable(target_months, probes, notes);
        outcome.closest_months = Some(months);
        return Ok(outcome);
    }

    if best.net_savings() <= 0.0 {
        notes.push(format!(
            "Chunk {} meets the target but costs {} more interest than the standard schedule",
            format_currency(chunk),
            format_currency(-best.net_savings())
        ));
        info!("Target {target_months} months: no interest savings");
        let mut outcome = TargetSearch::non_viable(target_months, probes, notes);
        outcome.closest_months = Some(months);
        return Ok(outcome);
    }

    notes.push(format!(
        "Chunk {} pays off in {} months ({} cycles), saving {}",
        format_currency(chunk),
        months,
        best.summary.total_cycles,
        format_currency(best.net_savings())
    ));
    info!(
        "Target {} months: chunk {:.0} -> {} months after {} probes",
        target_months,
        chunk,
        months,
        probes.len()
    );

    Ok(TargetSearch {
        target_months,
        chunk_amount: Some(chunk),
        closest_months: Some(months),
        result: Some(best),
        is_viable: true,
        probes,
        notes,
    })
}

/// Smaller |months - target| wins; ties go to the faster payoff
fn is_closer(candidate: &StrategyResult, best: Option<&StrategyResult>, target: u32) -> bool {
    let Some(best) = best else {
        return true;
    };
    let candidate_diff = candidate.months().abs_diff(target);
    let best_diff = best.months().abs_diff(target);
    candidate_diff < best_diff || (candidate_diff == best_diff && candidate.months() < best.months())
}
