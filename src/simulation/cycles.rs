//! Ledger output structures for cycle simulations

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What happened in a simulated month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleAction {
    /// A chunk was drawn from the HELOC and applied to the mortgage
    Pull,
    /// Surplus cashflow went to the HELOC balance, no draw
    Paydown,
    /// The mortgage balance reached zero this month (always the last entry)
    Complete,
}

impl fmt::Display for CycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleAction::Pull => "pull",
            CycleAction::Paydown => "paydown",
            CycleAction::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// One simulated calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEntry {
    /// 1-based month index
    pub month: u32,
    pub action: CycleAction,
    pub description: String,

    // Mortgage
    pub opening_mortgage_balance: f64,
    pub mortgage_interest: f64,
    /// Principal retired by the contractual payment (excludes the chunk)
    pub mortgage_principal: f64,
    /// Interest + regular principal paid this month
    pub mortgage_payment: f64,

    // HELOC
    pub heloc_draw: f64,
    pub heloc_interest: f64,
    pub heloc_payment: f64,

    // End of month
    pub heloc_balance: f64,
    pub mortgage_balance: f64,
}

impl CycleEntry {
    /// Create an entry with all amounts zeroed
    pub fn new(month: u32, opening_mortgage_balance: f64) -> Self {
        Self {
            month,
            action: CycleAction::Paydown,
            description: String::new(),
            opening_mortgage_balance,
            mortgage_interest: 0.0,
            mortgage_principal: 0.0,
            mortgage_payment: 0.0,
            heloc_draw: 0.0,
            heloc_interest: 0.0,
            heloc_payment: 0.0,
            heloc_balance: 0.0,
            mortgage_balance: opening_mortgage_balance,
        }
    }

    /// Total principal retired this month (regular payment + chunk)
    pub fn principal_retired(&self) -> f64 {
        self.mortgage_principal + self.heloc_draw
    }
}

/// Aggregate totals for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySummary {
    pub chunk_amount: f64,
    pub total_months: u32,
    /// Number of months with a HELOC draw
    pub total_cycles: u32,
    pub total_heloc_interest: f64,
    pub total_mortgage_interest: f64,
    pub total_interest: f64,

    /// Interest paid under the standard (no-chunk) schedule
    pub standard_interest: f64,
    pub standard_months: u32,

    /// standard_interest - total_interest
    pub net_savings: f64,

    /// HELOC balance outstanding on the month the mortgage is retired
    pub residual_heloc_balance: f64,

    /// Months to clear that residual once the mortgage payment is freed up
    pub heloc_clearance_months: Option<u32>,
}

/// Complete strategy simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub entries: Vec<CycleEntry>,
    pub summary: StrategySummary,
}

impl StrategyResult {
    pub fn months(&self) -> u32 {
        self.summary.total_months
    }

    pub fn net_savings(&self) -> f64 {
        self.summary.net_savings
    }

    /// Entries in which a chunk was drawn
    pub fn pulls(&self) -> impl Iterator<Item = &CycleEntry> {
        self.entries.iter().filter(|e| e.heloc_draw > 0.0)
    }
}

/// Write the month-by-month ledger as CSV
pub fn write_ledger_csv<W: Write>(writer: W, entries: &[CycleEntry]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in entries {
        csv_writer.serialize(entry)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Whole-dollar amount with thousands separators, e.g. `$10,000`
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}
