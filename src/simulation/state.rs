//! Balance tracking for a single cycle simulation

use crate::profile::HelocParams;

/// Where the strategy stands between months
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// HELOC is empty; the next month draws a chunk
    Accumulating,
    /// HELOC carries a balance being paid down from net cashflow
    Pulled,
    /// Mortgage retired (terminal)
    PaidOff,
}

/// Mutable balances carried from one month to the next
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Last simulated month (0 before the first month)
    pub month: u32,
    pub mortgage_balance: f64,
    pub heloc_balance: f64,
    pub phase: CycleState,
}

impl SimulationState {
    /// Initialize from the opening balances
    pub fn new(mortgage_balance: f64, heloc: &HelocParams, epsilon: f64) -> Self {
        let phase = if heloc.starting_balance > epsilon {
            CycleState::Pulled
        } else {
            CycleState::Accumulating
        };
        Self {
            month: 0,
            mortgage_balance,
            heloc_balance: heloc.starting_balance,
            phase,
        }
    }

    pub fn is_paid_off(&self) -> bool {
        self.phase == CycleState::PaidOff
    }

    /// Phase after a month's HELOC activity, unless the mortgage was retired
    pub fn settle_heloc(&mut self, epsilon: f64) {
        self.phase = if self.heloc_balance > epsilon {
            CycleState::Pulled
        } else {
            CycleState::Accumulating
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase_follows_heloc_balance() {
        let empty = HelocParams::new(50_000.0, 8.0);
        let state = SimulationState::new(300_000.0, &empty, 0.01);
        assert_eq!(state.phase, CycleState::Accumulating);

        let drawn = HelocParams::new(50_000.0, 8.0).with_starting_balance(4_000.0);
        let state = SimulationState::new(300_000.0, &drawn, 0.01);
        assert_eq!(state.phase, CycleState::Pulled);
        assert_eq!(state.heloc_balance, 4_000.0);
    }

    #[test]
    fn test_settle_heloc() {
        let heloc = HelocParams::new(50_000.0, 8.0).with_starting_balance(100.0);
        let mut state = SimulationState::new(1_000.0, &heloc, 0.01);
        state.heloc_balance = 0.0;
        state.settle_heloc(0.01);
        assert_eq!(state.phase, CycleState::Accumulating);
        assert!(!state.is_paid_off());
    }
}
