//! Amortization primitives: payment formula, payoff horizon, standard schedule
//!
//! Rates are annual percentages (6.0 = 6%) converted to a monthly decimal
//! rate with [`monthly_rate`]. Every other module uses the same convention.

mod schedule;

pub use schedule::{
    standard_amortization, standard_baseline, AmortizationEntry, AmortizationSchedule,
    StandardBaseline,
};

use crate::error::{Result, VelocityError};
use chrono::{Months, NaiveDate};

/// Balance at or below which a loan is treated as retired
pub const BALANCE_EPSILON: f64 = 1e-2;

/// Runaway guard for the standard schedule (30 years)
pub const MAX_SCHEDULE_MONTHS: u32 = 360;

/// Convert an annual percentage rate to a monthly decimal rate
pub fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 12.0 / 100.0
}

/// Fixed monthly payment that retires `principal` in `months` payments.
///
/// # Arguments
/// * `principal` - Loan principal
/// * `annual_rate_pct` - Annual interest rate as a percentage
/// * `months` - Number of payments (must be >= 1)
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, months: u32) -> Result<f64> {
    if months == 0 {
        return Err(VelocityError::invalid("months", "must be >= 1"));
    }

    let r = monthly_rate(annual_rate_pct);
    if r == 0.0 {
        return Ok(principal / months as f64);
    }

    let growth = (1.0 + r).powi(months as i32);
    Ok(principal * (r * growth) / (growth - 1.0))
}

/// Months needed to retire `balance` with a fixed `payment`.
///
/// Closed form `n = -ln(1 - r*P/M) / ln(1 + r)`, rounded up.
/// Rejected when the payment does not cover the first month's interest.
pub fn standard_payoff_months(balance: f64, annual_rate_pct: f64, payment: f64) -> Result<u32> {
    if payment.is_nan() || payment <= 0.0 {
        return Err(VelocityError::invalid("payment", "must be > 0"));
    }
    if balance <= 0.0 {
        return Ok(0);
    }

    let r = monthly_rate(annual_rate_pct);
    if r == 0.0 {
        return Ok((balance / payment - 1e-9).ceil() as u32);
    }

    let interest = r * balance;
    if interest >= payment {
        return Err(VelocityError::NonAmortizingPayment { payment, interest });
    }

    let n = -(1.0 - interest / payment).ln() / (1.0 + r).ln();
    Ok((n - 1e-9).ceil().max(1.0) as u32)
}

/// Calendar month in which a loan starting at `start` makes its final payment.
///
/// Month 1 is the month after `start`.
pub fn payoff_date(start: NaiveDate, months_to_payoff: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(months_to_payoff))
}
