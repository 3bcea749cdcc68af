//! Interest and time saved by a strategy relative to the standard schedule

use serde::{Deserialize, Serialize};

use crate::amortization::StandardBaseline;
use crate::simulation::StrategySummary;

/// Savings of one strategy against the standard amortization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsComparison {
    pub interest_saved: f64,
    /// Negative when the strategy takes longer than the standard schedule
    pub months_saved: i64,
    /// interest_saved as a percentage of standard interest (0 for interest-free loans)
    pub percentage_saved: f64,
}

/// Compare a simulated strategy with the full-horizon standard payoff of the
/// same mortgage
pub fn compare_to_standard(
    standard: &StandardBaseline,
    strategy: &StrategySummary,
) -> SavingsComparison {
    let interest_saved = standard.total_interest - strategy.total_interest;
    let months_saved = standard.months as i64 - strategy.total_months as i64;
    let percentage_saved = if standard.total_interest > 0.0 {
        interest_saved / standard.total_interest * 100.0
    } else {
        0.0
    };

    SavingsComparison {
        interest_saved,
        months_saved,
        percentage_saved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::standard_baseline;
    use crate::config::SimulationConfig;
    use crate::profile::{HelocParams, MortgageParams};
    use crate::simulation::simulate_strategy;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_strategy_saves_interest_and_time() {
        let mortgage = MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1799.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        };
        let heloc = HelocParams::new(50_000.0, 8.0);
        let standard = standard_baseline(300_000.0, 6.0, 1799.0).unwrap();
        let result =
            simulate_strategy(&mortgage, &heloc, 20_000.0, &SimulationConfig::default()).unwrap();

        let savings = compare_to_standard(&standard, &result.summary);
        assert!(savings.interest_saved > 0.0);
        assert!(savings.months_saved > 0);
        assert!(savings.percentage_saved > 0.0 && savings.percentage_saved < 100.0);
        assert_abs_diff_eq!(savings.interest_saved, result.net_savings(), epsilon = 1e-6);
    }

    #[test]
    fn test_interest_free_loan_percentage() {
        let standard = standard_baseline(12_000.0, 0.0, 1000.0).unwrap();
        let summary = StrategySummary {
            chunk_amount: 1000.0,
            total_months: 8,
            total_cycles: 4,
            total_heloc_interest: 12.0,
            total_mortgage_interest: 0.0,
            total_interest: 12.0,
            standard_interest: 0.0,
            standard_months: 12,
            net_savings: -12.0,
            residual_heloc_balance: 0.0,
            heloc_clearance_months: Some(0),
        };

        let savings = compare_to_standard(&standard, &summary);
        assert_eq!(savings.months_saved, 4);
        assert_eq!(savings.percentage_saved, 0.0);
        assert_abs_diff_eq!(savings.interest_saved, -12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_slow_payment_compared_over_full_horizon() {
        let mortgage = MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1550.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        };
        let heloc = HelocParams::new(50_000.0, 8.0);
        let standard = standard_baseline(300_000.0, 6.0, 1550.0).unwrap();
        let result =
            simulate_strategy(&mortgage, &heloc, 1_000.0, &SimulationConfig::default()).unwrap();

        let savings = compare_to_standard(&standard, &result.summary);
        assert_eq!(
            savings.months_saved,
            689 - result.summary.total_months as i64
        );
        assert_abs_diff_eq!(savings.interest_saved, result.net_savings(), epsilon = 1e-6);
        assert!(savings.interest_saved > 450_000.0);
    }
}
