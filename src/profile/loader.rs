//! Load household profiles (mortgage + HELOC + request) from CSV

use super::{HelocParams, MortgageParams};
use crate::error::{Result, VelocityError};
use crate::runner::StrategyRequest;
use csv::Reader;
use std::path::Path;

/// Default location of the sample profiles file
pub const DEFAULT_PROFILES_PATH: &str = "data/profiles.csv";

/// Raw CSV row matching profiles.csv columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "ProfileID")]
    profile_id: u32,
    #[serde(rename = "Balance")]
    balance: f64,
    #[serde(rename = "RatePct")]
    rate_pct: f64,
    #[serde(rename = "MonthlyPayment")]
    monthly_payment: f64,
    #[serde(rename = "MonthlyIncome")]
    monthly_income: f64,
    #[serde(rename = "MonthlyExpenses")]
    monthly_expenses: f64,
    #[serde(rename = "HelocLimit")]
    heloc_limit: f64,
    #[serde(rename = "HelocRatePct")]
    heloc_rate_pct: f64,
    #[serde(rename = "HelocBalance", default)]
    heloc_balance: Option<f64>,
    #[serde(rename = "ChunkAmount", default)]
    chunk_amount: Option<f64>,
    #[serde(rename = "TargetYears", default)]
    target_years: Option<u32>,
    /// interest, time, balanced or all
    #[serde(rename = "Objective", default)]
    objective: Option<String>,
}

/// One household to evaluate
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub profile_id: u32,
    pub mortgage: MortgageParams,
    pub heloc: HelocParams,
    pub request: StrategyRequest,
}

impl CsvRow {
    fn into_profile(self) -> Result<Profile> {
        let objective = self
            .objective
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let request = match (self.chunk_amount, self.target_years, objective) {
            (Some(chunk_amount), None, None) => StrategyRequest::Simulate { chunk_amount },
            (None, Some(target_years), None) => StrategyRequest::Target { target_years },
            (None, None, Some(name)) if name.eq_ignore_ascii_case("all") => {
                StrategyRequest::AllObjectives
            }
            (None, None, Some(name)) => StrategyRequest::Objective {
                objective: name.parse()?,
            },
            (None, None, None) => StrategyRequest::Scenarios,
            _ => {
                return Err(VelocityError::Parse(format!(
                    "profile {}: ChunkAmount, TargetYears and Objective are mutually exclusive",
                    self.profile_id
                )))
            }
        };

        Ok(Profile {
            profile_id: self.profile_id,
            mortgage: MortgageParams {
                balance: self.balance,
                annual_rate_pct: self.rate_pct,
                monthly_payment: self.monthly_payment,
                monthly_income: self.monthly_income,
                monthly_expenses: self.monthly_expenses,
            },
            heloc: HelocParams::new(self.heloc_limit, self.heloc_rate_pct)
                .with_starting_balance(self.heloc_balance.unwrap_or(0.0)),
            request,
        })
    }
}

/// Load all profiles from a CSV file
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<Profile>> {
    let reader = Reader::from_path(path)?;
    collect_profiles(reader)
}

/// Load profiles from any reader (e.g., string buffer, stdin)
pub fn load_profiles_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Profile>> {
    collect_profiles(Reader::from_reader(reader))
}

/// Load profiles from the default data/profiles.csv location
pub fn load_default_profiles() -> Result<Vec<Profile>> {
    load_profiles(DEFAULT_PROFILES_PATH)
}

fn collect_profiles<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<Profile>> {
    let mut profiles = Vec::new();
    for result in reader.deserialize() {
        let row: CsvRow = result?;
        profiles.push(row.into_profile()?);
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Objective;

    const SAMPLE: &str = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears
1,300000,6.0,1799,8000,4000,50000,8.0,,10000,
2,300000,6.0,1799,8000,4000,50000,8.0,2500,,10
3,180000,5.5,1250,6500,3500,30000,9.0,,,
";

    #[test]
    fn test_load_from_reader() {
        let profiles = load_profiles_from_reader(SAMPLE.as_bytes()).expect("parse profiles");
        assert_eq!(profiles.len(), 3);

        assert_eq!(
            profiles[0].request,
            StrategyRequest::Simulate {
                chunk_amount: 10_000.0
            }
        );
        assert_eq!(profiles[0].heloc.starting_balance, 0.0);

        assert_eq!(profiles[1].request, StrategyRequest::Target { target_years: 10 });
        assert_eq!(profiles[1].heloc.starting_balance, 2500.0);

        assert_eq!(profiles[2].request, StrategyRequest::Scenarios);
        assert_eq!(profiles[2].mortgage.monthly_payment, 1250.0);
    }

    #[test]
    fn test_conflicting_request_columns() {
        let csv = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears
9,300000,6.0,1799,8000,4000,50000,8.0,,10000,10
";
        assert!(load_profiles_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_objective_column() {
        let csv = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears,Objective
1,300000,6.0,1799,8000,4000,50000,8.0,,,,Interest
2,300000,6.0,1799,8000,4000,50000,8.0,,,,all
3,300000,6.0,1799,8000,4000,50000,8.0,,,,
";
        let profiles = load_profiles_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(
            profiles[0].request,
            StrategyRequest::Objective {
                objective: Objective::Interest
            }
        );
        assert_eq!(profiles[1].request, StrategyRequest::AllObjectives);
        assert_eq!(profiles[2].request, StrategyRequest::Scenarios);

        let csv = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears,Objective
1,300000,6.0,1799,8000,4000,50000,8.0,,,10,time
";
        assert!(load_profiles_from_reader(csv.as_bytes()).is_err());
        let csv = "\
ProfileID,Balance,RatePct,MonthlyPayment,MonthlyIncome,MonthlyExpenses,HelocLimit,HelocRatePct,HelocBalance,ChunkAmount,TargetYears,Objective
1,300000,6.0,1799,8000,4000,50000,8.0,,,,cheapest
";
        assert!(load_profiles_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_default_profiles() {
        let profiles = load_default_profiles().expect("Failed to load profiles");
        assert!(!profiles.is_empty());
        assert_eq!(profiles[0].profile_id, 1);
    }
}
