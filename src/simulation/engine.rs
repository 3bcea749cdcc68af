//! Month-by-month HELOC cycle simulator

use log::debug;

use super::cycles::{format_currency, CycleAction, CycleEntry, StrategyResult, StrategySummary};
use super::state::{CycleState, SimulationState};
use crate::amortization::{
    monthly_rate, standard_baseline, standard_payoff_months, StandardBaseline,
};
use crate::config::SimulationConfig;
use crate::error::{Result, VelocityError};
use crate::profile::{HelocParams, MortgageParams};

/// Per-call constants derived once from the inputs
#[derive(Debug, Clone, Copy)]
struct MonthInputs {
    chunk_amount: f64,
    mortgage_rate: f64,
    heloc_rate: f64,
    monthly_payment: f64,
    net_cashflow: f64,
    epsilon: f64,
}

/// Validation performed once before any month is simulated
pub fn validate_strategy_inputs(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    chunk_amount: f64,
) -> Result<()> {
    mortgage.validate_for_strategy()?;
    heloc.validate()?;

    if !chunk_amount.is_finite() || chunk_amount <= 0.0 {
        return Err(VelocityError::invalid("chunkAmount", "must be > 0"));
    }
    if chunk_amount > heloc.credit_limit {
        return Err(VelocityError::ChunkExceedsLimit {
            chunk: chunk_amount,
            limit: heloc.credit_limit,
        });
    }
    Ok(())
}

/// Simulate a velocity banking strategy with a fixed chunk amount.
///
/// Each month, in order: mortgage interest on the opening balance, the
/// contractual payment, then either a HELOC draw (when the line is empty)
/// or a HELOC paydown from net cashflow. The ledger ends with a
/// `Complete` entry in the month the mortgage balance reaches zero.
///
/// # Errors
/// Input rejections (`InsufficientCashflow`, `ChunkExceedsLimit`,
/// `NonAmortizingPayment`, `InvalidInput`) before the first month;
/// `HelocCannotBePaidDown` or `IterationCeiling` during the run.
pub fn simulate_strategy(
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    chunk_amount: f64,
    config: &SimulationConfig,
) -> Result<StrategyResult> {
    validate_strategy_inputs(mortgage, heloc, chunk_amount)?;

    let standard = standard_baseline(
        mortgage.balance,
        mortgage.annual_rate_pct,
        mortgage.monthly_payment,
    )?;
    let ceiling = standard.months.max(1).saturating_mul(config.ceiling_factor);

    let inputs = MonthInputs {
        chunk_amount,
        mortgage_rate: monthly_rate(mortgage.annual_rate_pct),
        heloc_rate: monthly_rate(heloc.annual_rate_pct),
        monthly_payment: mortgage.monthly_payment,
        net_cashflow: mortgage.net_cashflow(),
        epsilon: config.epsilon,
    };

    let mut state = SimulationState::new(mortgage.balance, heloc, config.epsilon);
    let mut entries = Vec::with_capacity(standard.months as usize);

    while !state.is_paid_off() {
        if state.month >= ceiling {
            return Err(VelocityError::IterationCeiling {
                ceiling,
                mortgage_balance: state.mortgage_balance,
                heloc_balance: state.heloc_balance,
            });
        }
        state.month += 1;
        entries.push(simulate_month(&mut state, &inputs)?);
    }

    let summary = summarize(
        chunk_amount,
        &entries,
        &standard,
        mortgage,
        heloc,
        config,
    );
    debug!(
        "Chunk {:.0}: {} months, {} pulls, net savings {:.2}",
        chunk_amount, summary.total_months, summary.total_cycles, summary.net_savings
    );

    Ok(StrategyResult { entries, summary })
}

/// Advance one month and record it
fn simulate_month(state: &mut SimulationState, p: &MonthInputs) -> Result<CycleEntry> {
    let opening_mortgage = state.mortgage_balance;
    let opening_heloc = state.heloc_balance;
    let mut entry = CycleEntry::new(state.month, opening_mortgage);

    // 1. Interest on the beginning-of-month balance, before any reduction
    entry.mortgage_interest = opening_mortgage * p.mortgage_rate;

    // 2. Contractual payment
    entry.mortgage_principal = (p.monthly_payment - entry.mortgage_interest).min(opening_mortgage);
    state.mortgage_balance = opening_mortgage - entry.mortgage_principal;

    // 3./4. Draw a chunk when the line is empty, otherwise pay it down
    if state.phase == CycleState::Accumulating && state.mortgage_balance > p.epsilon {
        let effective_chunk = p.chunk_amount.min(state.mortgage_balance);
        entry.heloc_draw = effective_chunk;
        state.mortgage_balance -= effective_chunk;
        state.heloc_balance = opening_heloc + effective_chunk;
        entry.action = CycleAction::Pull;
        entry.description = format!(
            "Pull {} from HELOC to pay down mortgage",
            format_currency(effective_chunk)
        );
    } else if opening_heloc > p.epsilon {
        let interest = opening_heloc * p.heloc_rate;
        let owed = opening_heloc + interest;
        if p.net_cashflow < owed && p.net_cashflow <= interest {
            return Err(VelocityError::HelocCannotBePaidDown {
                month: state.month,
                balance: opening_heloc,
                interest,
                cashflow: p.net_cashflow,
            });
        }

        entry.heloc_interest = interest;
        entry.heloc_payment = p.net_cashflow.min(owed);
        state.heloc_balance = owed - entry.heloc_payment;
        entry.action = CycleAction::Paydown;
        entry.description = format!(
            "Pay down HELOC with {} cashflow",
            format_currency(entry.heloc_payment)
        );
    }
    state.settle_heloc(p.epsilon);

    // 5. Retire the mortgage, sweeping any sub-epsilon residual into principal
    if state.mortgage_balance <= p.epsilon {
        entry.mortgage_principal += state.mortgage_balance;
        state.mortgage_balance = 0.0;
        state.phase = CycleState::PaidOff;
        entry.action = CycleAction::Complete;
        entry.description = if entry.heloc_draw > 0.0 {
            format!(
                "Mortgage paid off with a final {} HELOC pull",
                format_currency(entry.heloc_draw)
            )
        } else {
            "Mortgage paid off".to_string()
        };
    }

    entry.mortgage_payment = entry.mortgage_interest + entry.mortgage_principal;
    entry.heloc_balance = state.heloc_balance;
    entry.mortgage_balance = state.mortgage_balance;
    Ok(entry)
}

fn summarize(
    chunk_amount: f64,
    entries: &[CycleEntry],
    standard: &StandardBaseline,
    mortgage: &MortgageParams,
    heloc: &HelocParams,
    config: &SimulationConfig,
) -> StrategySummary {
    let total_heloc_interest: f64 = entries.iter().map(|e| e.heloc_interest).sum();
    let total_mortgage_interest: f64 = entries.iter().map(|e| e.mortgage_interest).sum();
    let total_interest = total_heloc_interest + total_mortgage_interest;
    let total_cycles = entries.iter().filter(|e| e.heloc_draw > 0.0).count() as u32;

    let residual_heloc_balance = entries.last().map(|e| e.heloc_balance).unwrap_or(0.0);

    // Once the mortgage is gone its payment joins the surplus cashflow
    let heloc_clearance_months = if residual_heloc_balance <= config.epsilon {
        Some(0)
    } else {
        standard_payoff_months(
            residual_heloc_balance,
            heloc.annual_rate_pct,
            mortgage.net_cashflow() + mortgage.monthly_payment,
        )
        .ok()
    };

    StrategySummary {
        chunk_amount,
        total_months: entries.last().map(|e| e.month).unwrap_or(0),
        total_cycles,
        total_heloc_interest,
        total_mortgage_interest,
        total_interest,
        standard_interest: standard.total_interest,
        standard_months: standard.months,
        net_savings: standard.total_interest - total_interest,
        residual_heloc_balance,
        heloc_clearance_months,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn reference_mortgage() -> MortgageParams {
        MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1799.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        }
    }

    fn reference_heloc() -> HelocParams {
        HelocParams::new(50_000.0, 8.0)
    }

    fn simulate(chunk: f64) -> StrategyResult {
        simulate_strategy(
            &reference_mortgage(),
            &reference_heloc(),
            chunk,
            &SimulationConfig::default(),
        )
        .expect("simulation should succeed")
    }

    #[test]
    fn test_first_cycle_balance() {
        let result = simulate(10_000.0);
        let first = &result.entries[0];

        assert_eq!(first.action, CycleAction::Pull);
        assert_abs_diff_eq!(first.mortgage_interest, 1500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.mortgage_principal, 299.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.heloc_draw, 10_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.mortgage_balance, 289_701.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.heloc_balance, 10_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_month_interest_independent_of_chunk() {
        for chunk in [1_000.0, 10_000.0, 25_000.0, 50_000.0] {
            let result = simulate(chunk);
            assert_abs_diff_eq!(result.entries[0].mortgage_interest, 1500.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_paydown_follows_pull() {
        let result = simulate(10_000.0);
        let second = &result.entries[1];

        assert_eq!(second.action, CycleAction::Paydown);
        assert_eq!(second.heloc_draw, 0.0);
        // HELOC interest on the opening 10,000 at 8%
        assert_abs_diff_eq!(second.heloc_interest, 10_000.0 * 0.08 / 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(second.heloc_payment, 2201.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            second.heloc_balance,
            10_000.0 + 10_000.0 * 0.08 / 12.0 - 2201.0,
            epsilon = 1e-9
        );
        // Mortgage interest uses the post-chunk balance carried into month 2
        assert_abs_diff_eq!(second.mortgage_interest, 289_701.0 * 0.005, epsilon = 1e-6);
    }

    #[test]
    fn test_heloc_empty_before_each_pull() {
        let result = simulate(10_000.0);
        for window in result.entries.windows(2) {
            if window[1].heloc_draw > 0.0 {
                assert!(window[0].heloc_balance <= SimulationConfig::default().epsilon);
            }
        }
        assert!(result.summary.total_cycles > 1);
    }

    #[test]
    fn test_small_balance_completes_immediately() {
        let mortgage = MortgageParams {
            balance: 5_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 500.0,
            monthly_income: 6_000.0,
            monthly_expenses: 2_000.0,
        };
        let heloc = HelocParams::new(10_000.0, 8.0);
        let result =
            simulate_strategy(&mortgage, &heloc, 5_000.0, &SimulationConfig::default()).unwrap();

        assert!(result.summary.total_months >= 1 && result.summary.total_months <= 2);
        let last = result.entries.last().unwrap();
        assert_eq!(last.action, CycleAction::Complete);
        assert_eq!(last.mortgage_balance, 0.0);
        // Effective chunk is clamped to what was left after the regular payment
        assert_abs_diff_eq!(result.entries[0].heloc_draw, 4_525.0, epsilon = 1e-9);
    }

    #[test]
    fn test_insufficient_cashflow_rejected() {
        let mut mortgage = reference_mortgage();
        mortgage.monthly_income = 5_799.0;
        let err = simulate_strategy(
            &mortgage,
            &reference_heloc(),
            10_000.0,
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, VelocityError::InsufficientCashflow { .. }));
        assert!(err.is_input_rejection());
    }

    #[test]
    fn test_chunk_over_limit_rejected() {
        let err = simulate_strategy(
            &reference_mortgage(),
            &reference_heloc(),
            50_001.0,
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, VelocityError::ChunkExceedsLimit { .. }));
    }

    #[test]
    fn test_heloc_that_cannot_be_paid_down() {
        // 50k at 60% accrues 2,500/month against 2,201 of cashflow
        let heloc = HelocParams::new(50_000.0, 60.0);
        let err = simulate_strategy(
            &reference_mortgage(),
            &heloc,
            50_000.0,
            &SimulationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VelocityError::HelocCannotBePaidDown { month: 2, .. }
        ));
        assert!(!err.is_input_rejection());
    }

    #[test]
    fn test_starting_heloc_balance_paid_down_first() {
        let heloc = HelocParams::new(50_000.0, 8.0).with_starting_balance(3_000.0);
        let result = simulate_strategy(
            &reference_mortgage(),
            &heloc,
            10_000.0,
            &SimulationConfig::default(),
        )
        .unwrap();

        assert_eq!(result.entries[0].action, CycleAction::Paydown);
        assert_eq!(result.entries[1].action, CycleAction::Paydown);
        assert_eq!(result.entries[2].action, CycleAction::Pull);
    }

    #[test]
    fn test_savings_against_standard() {
        let result = simulate(30_000.0);
        assert!(result.summary.total_months < result.summary.standard_months);
        assert!(result.summary.net_savings > 0.0);
        assert_abs_diff_eq!(
            result.summary.total_interest,
            result.summary.total_heloc_interest + result.summary.total_mortgage_interest,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_savings_use_full_standard_horizon() {
        // 1,550 covers interest but runs well past the 360-month schedule guard
        let mortgage = MortgageParams {
            monthly_payment: 1550.0,
            ..reference_mortgage()
        };
        let result = simulate_strategy(
            &mortgage,
            &reference_heloc(),
            1_000.0,
            &SimulationConfig::default(),
        )
        .unwrap();
        let baseline = standard_baseline(300_000.0, 6.0, 1550.0).unwrap();
        let summary = &result.summary;

        assert_eq!(summary.standard_months, 689);
        assert_eq!(summary.standard_interest, baseline.total_interest);
        assert!(summary.standard_interest > 760_000.0);
        assert_abs_diff_eq!(
            summary.net_savings,
            summary.standard_interest - summary.total_interest,
            epsilon = 1e-6
        );
        assert!(summary.net_savings > 450_000.0);
    }

    #[test]
    fn test_idempotent() {
        let a = simulate(12_000.0);
        let b = simulate(12_000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_residual_heloc_clearance() {
        let result = simulate(50_000.0);
        let summary = &result.summary;
        if summary.residual_heloc_balance > 0.01 {
            let months = summary.heloc_clearance_months.expect("clearable");
            assert!(months >= 1);
        } else {
            assert_eq!(summary.heloc_clearance_months, Some(0));
        }
    }

    #[test]
    fn test_smallest_chunk_fits_inside_standard_horizon() {
        let config = SimulationConfig {
            ceiling_factor: 1,
            ..SimulationConfig::default()
        };
        let result =
            simulate_strategy(&reference_mortgage(), &reference_heloc(), 1_000.0, &config).unwrap();
        assert!(result.months() <= result.summary.standard_months);
        assert_eq!(result.pulls().count() as u32, result.summary.total_cycles);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_ledger_invariants(
            balance in 20_000u32..600_000,
            rate_bp in 0u32..900,
            payment_slack in 50u32..1_500,
            net_cashflow in 800u32..5_000,
            heloc_rate_bp in 0u32..1_200,
            chunk_thousands in 1u32..50,
        ) {
            let balance = balance as f64;
            let annual_rate_pct = rate_bp as f64 / 100.0;
            let monthly_payment =
                balance * monthly_rate(annual_rate_pct) + payment_slack as f64 + balance / 1_000.0;
            let monthly_expenses = 3_000.0;
            let mortgage = MortgageParams {
                balance,
                annual_rate_pct,
                monthly_payment,
                monthly_income: monthly_expenses + monthly_payment + net_cashflow as f64,
                monthly_expenses,
            };
            let heloc = HelocParams::new(50_000.0, heloc_rate_bp as f64 / 100.0);
            let chunk = chunk_thousands as f64 * 1_000.0;
            let config = SimulationConfig::default();

            let result = simulate_strategy(&mortgage, &heloc, chunk, &config).unwrap();
            let r = monthly_rate(annual_rate_pct);

            let mut previous = balance;
            let mut retired = 0.0;
            for (i, entry) in result.entries.iter().enumerate() {
                prop_assert_eq!(entry.month, i as u32 + 1);
                prop_assert_eq!(entry.opening_mortgage_balance, previous);
                // Interest always on the opening balance
                prop_assert!((entry.mortgage_interest - previous * r).abs() < 1e-9);
                prop_assert!(entry.mortgage_balance >= 0.0);
                prop_assert!(entry.mortgage_balance <= previous);
                prop_assert!(entry.heloc_balance >= 0.0);
                if entry.heloc_draw > 0.0 && entry.action == CycleAction::Pull {
                    let before_pull = previous - entry.mortgage_principal;
                    prop_assert!((entry.heloc_draw - chunk.min(before_pull)).abs() < 1e-6);
                }
                retired += entry.principal_retired();
                previous = entry.mortgage_balance;
            }

            let last = result.entries.last().unwrap();
            prop_assert_eq!(last.action, CycleAction::Complete);
            prop_assert_eq!(last.mortgage_balance, 0.0);
            prop_assert!(result.entries[..result.entries.len() - 1]
                .iter()
                .all(|e| e.action != CycleAction::Complete));
            prop_assert!((retired - balance).abs() <= config.epsilon);
        }
    }
}
