//! Cycle state machine.

use std::fmt;

/// State of one lifecycle run.
///
/// Forward path: `Building -> Entered -> Protected -> Held -> Closed`.
/// `Failed` is reachable from every non-terminal state when a gateway
/// error aborts the transition out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Candidates ranked, entry batch under construction.
    Building,
    /// Entry batch accepted, fills being fetched.
    Entered,
    /// Protective stops live for every fill.
    Protected,
    /// Waiting out the holding window with positions live.
    Held,
    /// Exits submitted and stops cancelled.
    Closed,
    /// A gateway error aborted the cycle mid-flight.
    Failed,
}

impl CycleState {
    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Check whether moving to `next` follows the state machine.
    pub fn can_transition_to(&self, next: CycleState) -> bool {
        match (self, next) {
            (Self::Building, Self::Entered)
            | (Self::Entered, Self::Protected)
            | (Self::Protected, Self::Held)
            | (Self::Held, Self::Closed) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "BUILDING"),
            Self::Entered => write!(f, "ENTERED"),
            Self::Protected => write!(f, "PROTECTED"),
            Self::Held => write!(f, "HELD"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        assert!(CycleState::Building.can_transition_to(CycleState::Entered));
        assert!(CycleState::Entered.can_transition_to(CycleState::Protected));
        assert!(CycleState::Protected.can_transition_to(CycleState::Held));
        assert!(CycleState::Held.can_transition_to(CycleState::Closed));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!CycleState::Building.can_transition_to(CycleState::Protected));
        assert!(!CycleState::Entered.can_transition_to(CycleState::Held));
        assert!(!CycleState::Building.can_transition_to(CycleState::Closed));
    }

    #[test]
    fn test_failure_reachable_from_any_live_state() {
        for state in [
            CycleState::Building,
            CycleState::Entered,
            CycleState::Protected,
            CycleState::Held,
        ] {
            assert!(state.can_transition_to(CycleState::Failed));
        }
        assert!(!CycleState::Closed.can_transition_to(CycleState::Failed));
        assert!(!CycleState::Failed.can_transition_to(CycleState::Failed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(CycleState::Closed.is_terminal());
        assert!(CycleState::Failed.is_terminal());
        assert!(!CycleState::Held.is_terminal());
    }
}
