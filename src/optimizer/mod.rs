//! Chunk optimizer
//!
//! Every optimizer operation drives the cycle simulator:
//! - `find_chunk_for_target`: binary search for the chunk meeting a payoff horizon
//! - `generate_scenarios`: searches a handful of checkpoint horizons and recommends one
//! - `strategies_for_target`: optimal chunk for one horizon plus a spread around it
//! - `optimize_chunk`: grid scan for the chunk minimizing interest, time or a blend
//! - `sensitivity_analysis`: how a fixed strategy reacts to perturbed inputs

mod checkpoints;
mod objective;
mod scenarios;
mod scoring;
mod search;
mod sensitivity;
mod variations;

pub use checkpoints::{normalize_checkpoints, CheckpointPolicy, Checkpoints};
pub use objective::{
    chunk_grid, confidence_score, optimize_all_objectives, optimize_chunk, ChunkOptimization,
    Objective,
};
pub use scenarios::{
    generate_scenarios, generate_scenarios_with, Scenario, ScenarioSet, StrategyKind,
};
pub use scoring::score_scenarios;
pub use search::{find_chunk_for_target, SearchProbe, TargetSearch};
pub use sensitivity::{
    sensitivity_analysis, Sensitivity, SensitivityParameter, SensitivityReport,
    DEFAULT_PERTURBATION,
};
pub use variations::{strategies_for_target, ChunkVariation, TargetStrategies, MAX_TARGET_YEARS};
