//! Velocity Banking - HELOC cycle simulation and chunk optimization for mortgage payoff
//!
//! This library provides:
//! - Standard amortization (payment formula, payoff horizon, full schedule)
//! - Month-by-month HELOC pull/paydown cycle simulation
//! - Target-seeking chunk search, scenario generation and scoring
//! - Goal-driven chunk optimization (interest, time or a balanced blend)
//! - Savings comparison and sensitivity analysis
//! - CSV loaders for profiles and optimizer settings

pub mod amortization;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod profile;
pub mod runner;
pub mod savings;
pub mod simulation;

// Re-export commonly used types
pub use amortization::{
    monthly_payment, payoff_date, standard_amortization, standard_baseline,
    standard_payoff_months, AmortizationSchedule, StandardBaseline,
};
pub use config::{
    HorizonBand, ObjectiveConfig, OptimizerConfig, ScoringWeights, SearchConfig, SimulationConfig,
};
pub use error::{Result, VelocityError};
pub use optimizer::{
    find_chunk_for_target, generate_scenarios, optimize_all_objectives, optimize_chunk,
    sensitivity_analysis, strategies_for_target, ChunkOptimization, Objective, Scenario,
    ScenarioSet, StrategyKind, TargetSearch, TargetStrategies,
};
pub use profile::{HelocParams, MortgageParams, Profile};
pub use runner::{run_request, StrategyOutcome, StrategyRequest, StrategyRunner};
pub use savings::{compare_to_standard, SavingsComparison};
pub use simulation::{simulate_strategy, CycleAction, CycleEntry, StrategyResult, StrategySummary};
