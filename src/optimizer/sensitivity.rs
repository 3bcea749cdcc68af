//! One-at-a-time sensitivity of a chunk strategy to its inputs

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::profile::{HelocParams, MortgageParams};
use crate::simulation::{simulate_strategy, StrategySummary};

/// Default relative perturbation (10%)
pub const DEFAULT_PERTURBATION: f64 = 0.1;

/// Input perturbed in a sensitivity run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitivityParameter {
    MortgageRate,
    ChunkAmount,
    MonthlyPayment,
}

impl fmt::Display for SensitivityParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SensitivityParameter::MortgageRate => "mortgage rate",
            SensitivityParameter::ChunkAmount => "chunk amount",
            SensitivityParameter::MonthlyPayment => "monthly payment",
        };
        f.write_str(label)
    }
}

/// Change in outcome from perturbing one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensitivity {
    pub parameter: SensitivityParameter,
    pub baseline_value: f64,
    pub perturbed_value: f64,

    pub months_change: Option<i64>,
    pub interest_change: Option<f64>,
    pub months_pct: Option<f64>,
    pub interest_pct: Option<f64>,

    /// Why the perturbed strategy could not be simulated
    pub failure: Option<String>,
}

/// Baseline strategy plus one entry per perturbed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityReport {
    pub perturbation: f64,
    pub baseline: StrategySummary,
    pub sensitivities: Vec<Sensitivity>,
}

/// Perturb the mortgage rate, chunk amount and monthly payment by
/// `perturbation` (relative) and report how months and total interest move.
///
/// The chunk perturbation is capped at the credit limit. A higher payment
/// leaves less net cashflow for the HELOC, so a perturbed run can fail; that
/// is recorded in `failure` rather than returned as an error.
///
/// # Errors
/// Only when the baseline strategy itself cannot be simulated.
pub fn sensitivity_analysis(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    chunk_amount: f64,
    perturbation: f64,
    config: &SimulationConfig,
) -> Result<SensitivityReport> {
    let baseline = simulate_strategy(mortgage, heloc, chunk_amount, config)?.summary;
    let factor = 1.0 + perturbation;

    let rate = MortgageParams {
        annual_rate_pct: mortgage.annual_rate_pct * factor,
        ..*mortgage
    };
    let payment = MortgageParams {
        monthly_payment: mortgage.monthly_payment * factor,
        ..*mortgage
    };
    let chunk = (chunk_amount * factor).min(heloc.credit_limit);

    let sensitivities = vec![
        measure(
            SensitivityParameter::MortgageRate,
            mortgage.annual_rate_pct,
            rate.annual_rate_pct,
            &baseline,
            simulate_strategy(&rate, heloc, chunk_amount, config).map(|r| r.summary),
        ),
        measure(
            SensitivityParameter::ChunkAmount,
            chunk_amount,
            chunk,
            &baseline,
            simulate_strategy(mortgage, heloc, chunk, config).map(|r| r.summary),
        ),
        measure(
            SensitivityParameter::MonthlyPayment,
            mortgage.monthly_payment,
            payment.monthly_payment,
            &baseline,
            simulate_strategy(&payment, heloc, chunk_amount, config).map(|r| r.summary),
        ),
    ];

    Ok(SensitivityReport {
        perturbation,
        baseline,
        sensitivities,
    })
}

fn measure(
    parameter: SensitivityParameter,
    baseline_value: f64,
    perturbed_value: f64,
    baseline: &StrategySummary,
    perturbed: Result<StrategySummary>,
) -> Sensitivity {
    let mut sensitivity = Sensitivity {
        parameter,
        baseline_value,
        perturbed_value,
        months_change: None,
        interest_change: None,
        months_pct: None,
        interest_pct: None,
        failure: None,
    };

    match perturbed {
        Ok(summary) => {
            let months_change = summary.total_months as i64 - baseline.total_months as i64;
            let interest_change = summary.total_interest - baseline.total_interest;
            sensitivity.months_change = Some(months_change);
            sensitivity.interest_change = Some(interest_change);
            sensitivity.months_pct = percent(months_change as f64, baseline.total_months as f64);
            sensitivity.interest_pct = percent(interest_change, baseline.total_interest);
        }
        Err(e) => {
            debug!("Sensitivity to {parameter}: perturbed run failed ({e})");
            sensitivity.failure = Some(e.to_string());
        }
    }
    sensitivity
}

fn percent(change: f64, base: f64) -> Option<f64> {
    (base != 0.0).then(|| change / base * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_mortgage() -> MortgageParams {
        MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1799.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        }
    }

    fn report(chunk: f64) -> SensitivityReport {
        sensitivity_analysis(
            &reference_mortgage(),
            &HelocParams::new(50_000.0, 8.0),
            chunk,
            DEFAULT_PERTURBATION,
            &SimulationConfig::default(),
        )
        .unwrap()
    }

    fn find(report: &SensitivityReport, parameter: SensitivityParameter) -> &Sensitivity {
        report
            .sensitivities
            .iter()
            .find(|s| s.parameter == parameter)
            .unwrap()
    }

    #[test]
    fn test_directions() {
        let report = report(20_000.0);
        assert_eq!(report.sensitivities.len(), 3);

        // Higher rate costs more interest
        let rate = find(&report, SensitivityParameter::MortgageRate);
        assert!(rate.interest_change.unwrap() > 0.0);
        assert!((rate.perturbed_value - 6.6).abs() < 1e-9);

        let chunk = find(&report, SensitivityParameter::ChunkAmount);
        assert!(chunk.failure.is_none());
        assert!(chunk.months_pct.is_some());
        assert!((chunk.perturbed_value - 22_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_chunk_perturbation_capped_at_limit() {
        let report = report(50_000.0);
        let chunk = find(&report, SensitivityParameter::ChunkAmount);
        assert_eq!(chunk.perturbed_value, 50_000.0);
        assert_eq!(chunk.months_change, Some(0));
    }

    #[test]
    fn test_failed_perturbation_recorded() {
        // Net cashflow is 1 dollar; any payment increase leaves none
        let mortgage = MortgageParams {
            monthly_income: 5_800.0,
            ..reference_mortgage()
        };
        let report = sensitivity_analysis(
            &mortgage,
            &HelocParams::new(50_000.0, 0.0),
            1_000.0,
            DEFAULT_PERTURBATION,
            &SimulationConfig::default(),
        )
        .unwrap();

        let payment = find(&report, SensitivityParameter::MonthlyPayment);
        assert!(payment.failure.is_some());
        assert!(payment.months_change.is_none());
    }
}
