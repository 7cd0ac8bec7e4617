//! Status enums that guard their own transitions.
//!
//! A status implementing [`StateMachine`] declares which moves are
//! legal; callers then change state through `transition_to` instead of
//! assigning variants directly.

use super::ValidationError;

/// Contract for a status enum with an explicit transition table.
///
/// Implementors supply the table twice, as a predicate and as an
/// enumeration, and the provided methods keep every state change
/// inside it:
///
/// ```ignore
/// let next = subscription.status.transition_to(SubscriptionStatus::Active)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Whether moving from `self` to `target` is allowed.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable from `self` in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Validated state change. The only sanctioned way to move.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "status",
                format!("{:?} does not transition to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// True when no transition leaves this state.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Requested,
        Settled,
        Voided,
    }

    impl StateMachine for Phase {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Phase::*;
            matches!(
                (self, target),
                (Requested, Settled) | (Requested, Voided) | (Settled, Voided)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Phase::*;
            match self {
                Requested => vec![Settled, Voided],
                Settled => vec![Voided],
                Voided => vec![],
            }
        }
    }

    #[test]
    fn legal_transition_returns_the_target() {
        assert_eq!(
            Phase::Requested.transition_to(Phase::Settled),
            Ok(Phase::Settled)
        );
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let result = Phase::Voided.transition_to(Phase::Settled);
        assert!(matches!(
            result,
            Err(ValidationError::InvalidFormat { ref field, .. }) if field == "status"
        ));
    }

    #[test]
    fn terminal_state_has_no_exits() {
        assert!(Phase::Voided.is_terminal());
        assert!(!Phase::Requested.is_terminal());
    }

    #[test]
    fn predicate_and_enumeration_agree() {
        let all = [Phase::Requested, Phase::Settled, Phase::Voided];
        for from in all {
            for to in all {
                let listed = from.valid_transitions().contains(&to);
                assert_eq!(
                    from.can_transition_to(&to),
                    listed,
                    "table mismatch for {:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }
}
