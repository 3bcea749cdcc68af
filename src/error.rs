//! Error type shared by the amortization engine, cycle simulator and optimizer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VelocityError>;

#[derive(Debug, Error)]
pub enum VelocityError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Insufficient cashflow: income {income:.2} - expenses {expenses:.2} - payment {payment:.2} = {net:.2}, must be positive"
    )]
    InsufficientCashflow {
        income: f64,
        expenses: f64,
        payment: f64,
        net: f64,
    },

    #[error("Chunk exceeds credit limit: chunk {chunk:.2} > limit {limit:.2}")]
    ChunkExceedsLimit { chunk: f64, limit: f64 },

    #[error("Payment does not amortize: payment {payment:.2} <= first-month interest {interest:.2}")]
    NonAmortizingPayment { payment: f64, interest: f64 },

    #[error(
        "HELOC cannot be paid down: month {month}, balance {balance:.2} accrues {interest:.2} against cashflow {cashflow:.2}"
    )]
    HelocCannotBePaidDown {
        month: u32,
        balance: f64,
        interest: f64,
        cashflow: f64,
    },

    #[error(
        "Simulation exceeded {ceiling} months (mortgage balance {mortgage_balance:.2}, HELOC balance {heloc_balance:.2})"
    )]
    IterationCeiling {
        ceiling: u32,
        mortgage_balance: f64,
        heloc_balance: f64,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VelocityError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        VelocityError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for deterministic validation failures raised before any month is simulated
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            VelocityError::InvalidInput { .. }
                | VelocityError::InsufficientCashflow { .. }
                | VelocityError::ChunkExceedsLimit { .. }
                | VelocityError::NonAmortizingPayment { .. }
        )
    }
}
