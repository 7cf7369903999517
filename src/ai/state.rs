//! Director states

use serde::{Deserialize, Serialize};

/// What an AI combatant is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DirectorState {
    /// Nothing in range, no route, no formation
    #[default]
    Idle,
    /// Walking a looping waypoint route
    Patrolling,
    /// Opponent inside aggro range but out of reach
    Chasing,
    /// Opponent inside weapon range, attack loop running
    Attacking,
    /// Heading back to a formation slot or a pre-flee position
    Returning,
    /// Running to a fear destination; ignores opponents until the timer ends
    Fleeing,
}

impl DirectorState {
    /// Does the director skip its per-tick decision pass?
    pub fn is_locked(&self) -> bool {
        matches!(self, DirectorState::Fleeing)
    }
}

impl std::fmt::Display for DirectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DirectorState::Idle => "idle",
            DirectorState::Patrolling => "patrolling",
            DirectorState::Chasing => "chasing",
            DirectorState::Attacking => "attacking",
            DirectorState::Returning => "returning",
            DirectorState::Fleeing => "fleeing",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(DirectorState::default(), DirectorState::Idle);
    }

    #[test]
    fn test_only_fleeing_is_locked() {
        assert!(DirectorState::Fleeing.is_locked());
        assert!(!DirectorState::Attacking.is_locked());
    }
}
