//! Standard (no-chunk) amortization schedule

use log::warn;
use serde::{Deserialize, Serialize};

use super::{monthly_rate, standard_payoff_months, BALANCE_EPSILON, MAX_SCHEDULE_MONTHS};
use crate::error::{Result, VelocityError};

/// A single month of the standard schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationEntry {
    pub month: u32,
    /// Amount actually paid (interest + principal)
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    /// Balance after this month's payment
    pub balance: f64,
}

/// Complete standard schedule with totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub entries: Vec<AmortizationEntry>,
    pub total_payments: f64,
    pub total_interest: f64,
    pub months_to_payoff: u32,

    /// True when the 360-month guard stopped the schedule with balance remaining
    pub reached_cap: bool,

    /// Balance left when the schedule stopped (0 unless `reached_cap`)
    pub remaining_balance: f64,
}

/// Generate the standard amortization schedule.
///
/// Interest each month is charged on the beginning-of-month balance.
/// The schedule stops once the balance is within [`BALANCE_EPSILON`] of zero,
/// or after [`MAX_SCHEDULE_MONTHS`], in which case `reached_cap` is set.
///
/// # Arguments
/// * `principal` - Opening balance
/// * `annual_rate_pct` - Annual interest rate as a percentage
/// * `monthly_payment` - Contractual monthly payment
pub fn standard_amortization(
    principal: f64,
    annual_rate_pct: f64,
    monthly_payment: f64,
) -> Result<AmortizationSchedule> {
    if !principal.is_finite() || principal < 0.0 {
        return Err(VelocityError::invalid("principal", "must be >= 0"));
    }
    if !monthly_payment.is_finite() || monthly_payment <= 0.0 {
        return Err(VelocityError::invalid("monthlyPayment", "must be > 0"));
    }

    let r = monthly_rate(annual_rate_pct);
    let first_interest = principal * r;
    if principal > BALANCE_EPSILON && monthly_payment <= first_interest {
        return Err(VelocityError::NonAmortizingPayment {
            payment: monthly_payment,
            interest: first_interest,
        });
    }

    let mut entries = Vec::new();
    let mut balance = principal;
    let mut month = 0;
    let mut total_interest = 0.0;
    let mut total_principal = 0.0;

    while balance > BALANCE_EPSILON && month < MAX_SCHEDULE_MONTHS {
        month += 1;

        let interest = balance * r;
        let principal_paid = (monthly_payment - interest).min(balance);
        balance -= principal_paid;
        total_interest += interest;
        total_principal += principal_paid;

        entries.push(AmortizationEntry {
            month,
            payment: interest + principal_paid,
            principal: principal_paid,
            interest,
            balance: balance.max(0.0),
        });
    }

    let reached_cap = balance > BALANCE_EPSILON;
    if reached_cap {
        warn!(
            "Standard schedule hit the {}-month guard with {:.2} outstanding (payment {:.2})",
            MAX_SCHEDULE_MONTHS, balance, monthly_payment
        );
    }

    Ok(AmortizationSchedule {
        entries,
        total_payments: total_interest + total_principal,
        total_interest,
        months_to_payoff: month,
        reached_cap,
        remaining_balance: if reached_cap { balance } else { 0.0 },
    })
}

/// Standard payoff carried to completion, the reference every savings
/// figure is measured against.
///
/// Unlike [`AmortizationSchedule`] it is never cut off at
/// [`MAX_SCHEDULE_MONTHS`]: months come from the closed form and interest
/// keeps accruing on whatever the capped schedule left outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardBaseline {
    pub months: u32,
    pub total_interest: f64,
}

/// Full-horizon months and interest of the standard schedule
pub fn standard_baseline(
    principal: f64,
    annual_rate_pct: f64,
    monthly_payment: f64,
) -> Result<StandardBaseline> {
    let schedule = standard_amortization(principal, annual_rate_pct, monthly_payment)?;
    let months = standard_payoff_months(principal, annual_rate_pct, monthly_payment)?;

    let mut total_interest = schedule.total_interest;
    if schedule.reached_cap {
        let r = monthly_rate(annual_rate_pct);
        let mut balance = schedule.remaining_balance;
        let mut month = schedule.months_to_payoff;
        // Closed-form horizon bounds the tail
        while balance > BALANCE_EPSILON && month <= months {
            month += 1;
            let interest = balance * r;
            total_interest += interest;
            balance -= (monthly_payment - interest).min(balance);
        }
    }

    Ok(StandardBaseline {
        months,
        total_interest,
    })
}
