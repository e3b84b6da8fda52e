//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of a single checkout attempt.
///
/// State transitions:
/// ```text
/// Loading ──► Validating ──┬──► Committing ──┬──► Confirmed
///    │            │        │                 └──► Failed
///    │            │        └──► Rejected
///    └────────────┴──► Rejected | Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Reading the cart, the buyer and the inventory snapshot.
    #[default]
    Loading,

    /// Comparing every cart line against the snapshot.
    Validating,

    /// The cart cannot be ordered as-is; nothing was written (terminal state).
    Rejected,

    /// Writing the order inside one transaction.
    Committing,

    /// The order is durable and the cart has been cleared (terminal state).
    Confirmed,

    /// An error stopped the attempt; nothing was written (terminal state).
    Failed,
}

impl CheckoutState {
    /// Returns true if moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (Loading, Validating | Rejected | Failed)
                | (Validating, Committing | Rejected | Failed)
                | (Committing, Confirmed | Failed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Rejected | CheckoutState::Confirmed | CheckoutState::Failed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Loading => "Loading",
            CheckoutState::Validating => "Validating",
            CheckoutState::Rejected => "Rejected",
            CheckoutState::Committing => "Committing",
            CheckoutState::Confirmed => "Confirmed",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_loading() {
        assert_eq!(CheckoutState::default(), CheckoutState::Loading);
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(CheckoutState::Loading.can_transition_to(CheckoutState::Validating));
        assert!(CheckoutState::Validating.can_transition_to(CheckoutState::Committing));
        assert!(CheckoutState::Committing.can_transition_to(CheckoutState::Confirmed));
    }

    #[test]
    fn test_rejection_only_before_commit() {
        assert!(CheckoutState::Loading.can_transition_to(CheckoutState::Rejected));
        assert!(CheckoutState::Validating.can_transition_to(CheckoutState::Rejected));
        assert!(!CheckoutState::Committing.can_transition_to(CheckoutState::Rejected));
    }

    #[test]
    fn test_no_shortcuts_or_exits_from_terminal() {
        assert!(!CheckoutState::Loading.can_transition_to(CheckoutState::Committing));
        assert!(!CheckoutState::Validating.can_transition_to(CheckoutState::Confirmed));
        for terminal in [
            CheckoutState::Rejected,
            CheckoutState::Confirmed,
            CheckoutState::Failed,
        ] {
            assert!(!terminal.can_transition_to(CheckoutState::Loading));
            assert!(!terminal.can_transition_to(CheckoutState::Committing));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!CheckoutState::Loading.is_terminal());
        assert!(!CheckoutState::Validating.is_terminal());
        assert!(!CheckoutState::Committing.is_terminal());
        assert!(CheckoutState::Rejected.is_terminal());
        assert!(CheckoutState::Confirmed.is_terminal());
        assert!(CheckoutState::Failed.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckoutState::Loading.to_string(), "Loading");
        assert_eq!(CheckoutState::Committing.to_string(), "Committing");
        assert_eq!(CheckoutState::Confirmed.to_string(), "Confirmed");
    }

    #[test]
    fn test_serialization() {
        let state = CheckoutState::Validating;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: CheckoutState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
