//! Mortgage and HELOC parameter sets consumed by the simulator and optimizer

use serde::{Deserialize, Serialize};

use crate::amortization::monthly_rate;
use crate::error::{Result, VelocityError};

/// Mortgage terms plus the household cashflow that funds HELOC paydown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageParams {
    /// Outstanding principal balance
    pub balance: f64,

    /// Annual interest rate as a percentage (6.0 = 6%)
    pub annual_rate_pct: f64,

    /// Contractual monthly payment (principal + interest)
    pub monthly_payment: f64,

    /// Monthly household income
    pub monthly_income: f64,

    /// Monthly household expenses, excluding the mortgage payment
    pub monthly_expenses: f64,
}

impl MortgageParams {
    /// Income left over after expenses and the contractual mortgage payment
    pub fn net_cashflow(&self) -> f64 {
        self.monthly_income - self.monthly_expenses - self.monthly_payment
    }

    /// Interest charged in the first month on the opening balance
    pub fn first_month_interest(&self) -> f64 {
        self.balance * monthly_rate(self.annual_rate_pct)
    }

    /// Range checks on every field
    pub fn validate(&self) -> Result<()> {
        require_finite("balance", self.balance)?;
        require_finite("annualRatePct", self.annual_rate_pct)?;
        require_finite("monthlyPayment", self.monthly_payment)?;
        require_finite("monthlyIncome", self.monthly_income)?;
        require_finite("monthlyExpenses", self.monthly_expenses)?;

        if self.balance <= 0.0 {
            return Err(VelocityError::invalid("balance", "must be > 0"));
        }
        if self.annual_rate_pct < 0.0 {
            return Err(VelocityError::invalid("annualRatePct", "must be >= 0"));
        }
        if self.monthly_payment <= 0.0 {
            return Err(VelocityError::invalid("monthlyPayment", "must be > 0"));
        }
        if self.monthly_income <= 0.0 {
            return Err(VelocityError::invalid("monthlyIncome", "must be > 0"));
        }
        if self.monthly_expenses < 0.0 {
            return Err(VelocityError::invalid("monthlyExpenses", "must be >= 0"));
        }
        Ok(())
    }

    /// Validation required before any HELOC strategy is evaluated:
    /// ranges, an amortizing payment and strictly positive net cashflow
    pub fn validate_for_strategy(&self) -> Result<()> {
        self.validate()?;

        let interest = self.first_month_interest();
        if self.monthly_payment <= interest {
            return Err(VelocityError::NonAmortizingPayment {
                payment: self.monthly_payment,
                interest,
            });
        }

        let net = self.net_cashflow();
        if net <= 0.0 {
            return Err(VelocityError::InsufficientCashflow {
                income: self.monthly_income,
                expenses: self.monthly_expenses,
                payment: self.monthly_payment,
                net,
            });
        }
        Ok(())
    }
}

/// Home-equity line of credit used to fund chunk payments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelocParams {
    /// Maximum drawable balance
    pub credit_limit: f64,

    /// Annual interest rate as a percentage
    pub annual_rate_pct: f64,

    /// Balance outstanding when the strategy starts
    #[serde(default)]
    pub starting_balance: f64,

    /// Lender minimum payment (informational, not used by the payoff logic)
    #[serde(default)]
    pub minimum_payment: f64,
}

impl HelocParams {
    pub fn new(credit_limit: f64, annual_rate_pct: f64) -> Self {
        Self {
            credit_limit,
            annual_rate_pct,
            starting_balance: 0.0,
            minimum_payment: 0.0,
        }
    }

    pub fn with_starting_balance(mut self, balance: f64) -> Self {
        self.starting_balance = balance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_finite("creditLimit", self.credit_limit)?;
        require_finite("helocRatePct", self.annual_rate_pct)?;
        require_finite("startingBalance", self.starting_balance)?;
        require_finite("minimumPayment", self.minimum_payment)?;

        if self.credit_limit <= 0.0 {
            return Err(VelocityError::invalid("creditLimit", "must be > 0"));
        }
        if self.annual_rate_pct < 0.0 {
            return Err(VelocityError::invalid("helocRatePct", "must be >= 0"));
        }
        if self.starting_balance < 0.0 {
            return Err(VelocityError::invalid("startingBalance", "must be >= 0"));
        }
        if self.starting_balance > self.credit_limit {
            return Err(VelocityError::invalid(
                "startingBalance",
                format!(
                    "{:.2} exceeds credit limit {:.2}",
                    self.starting_balance, self.credit_limit
                ),
            ));
        }
        Ok(())
    }
}

fn require_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VelocityError::invalid(field, "must be a finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn mortgage() -> MortgageParams {
        MortgageParams {
            balance: 300_000.0,
            annual_rate_pct: 6.0,
            monthly_payment: 1799.0,
            monthly_income: 8000.0,
            monthly_expenses: 4000.0,
        }
    }

    #[test]
    fn test_net_cashflow() {
        assert_abs_diff_eq!(mortgage().net_cashflow(), 2201.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mortgage().first_month_interest(), 1500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_cashflow_rejected() {
        let mut m = mortgage();
        m.monthly_expenses = 8000.0 - 1799.0;
        let err = m.validate_for_strategy().unwrap_err();
        assert!(matches!(err, VelocityError::InsufficientCashflow { .. }));
    }

    #[test]
    fn test_payment_below_interest_rejected() {
        let mut m = mortgage();
        m.monthly_payment = 1500.0;
        let err = m.validate_for_strategy().unwrap_err();
        assert!(matches!(err, VelocityError::NonAmortizingPayment { .. }));
    }

    #[test]
    fn test_heloc_starting_balance_over_limit() {
        let heloc = HelocParams::new(10_000.0, 8.0).with_starting_balance(12_000.0);
        assert!(heloc.validate().is_err());
        assert!(HelocParams::new(10_000.0, 8.0).validate().is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut m = mortgage();
        m.annual_rate_pct = f64::NAN;
        assert!(m.validate().is_err());
    }
}
