//! HELOC velocity-banking cycle simulation

mod cycles;
mod engine;
mod state;

pub use cycles::{
    format_currency, write_ledger_csv, CycleAction, CycleEntry, StrategyResult, StrategySummary,
};
pub use engine::{simulate_strategy, validate_strategy_inputs};
pub use state::{CycleState, SimulationState};
