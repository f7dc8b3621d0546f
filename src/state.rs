//! Lifecycle state support for domain status enums
//!
//! Status enums (invitation, case, lead) implement [`State`] so the
//! services can guard transitions uniformly and produce consistent
//! `InvalidStateTransition` errors.

use crate::errors::{DomainError, DomainResult};
use std::fmt::Debug;

/// Trait for types that act as lifecycle states
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging and error messages
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }

    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;
}

/// Guard a transition, returning the target state on success
///
/// Terminal states reject every transition regardless of target.
pub fn guard_transition<S: State>(from: &S, to: S) -> DomainResult<S> {
    if from.is_terminal() || !from.can_transition_to(&to) {
        return Err(DomainError::InvalidStateTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    }
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Phase {
        Open,
        Closed,
    }

    impl State for Phase {
        fn name(&self) -> &'static str {
            match self {
                Phase::Open => "Open",
                Phase::Closed => "Closed",
            }
        }

        fn is_terminal(&self) -> bool {
            matches!(self, Phase::Closed)
        }

        fn can_transition_to(&self, target: &Self) -> bool {
            matches!((self, target), (Phase::Open, Phase::Closed))
        }
    }

    #[test]
    fn test_guard_allows_declared_transition() {
        let next = guard_transition(&Phase::Open, Phase::Closed).unwrap();
        assert_eq!(next, Phase::Closed);
    }

    #[test]
    fn test_guard_rejects_from_terminal() {
        let err = guard_transition(&Phase::Closed, Phase::Open).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidStateTransition { ref from, ref to }
                if from == "Closed" && to == "Open"
        ));
    }

    #[test]
    fn test_guard_rejects_undeclared_transition() {
        assert!(guard_transition(&Phase::Open, Phase::Open).is_err());
    }
}
