use crate::error::ReconcileError;
use crate::reconcile::state::{FlowEvent, ReconcileState};

/// The complete transition table of a payment attempt. Anything not listed
/// is rejected and leaves the current state untouched.
pub fn next_state(from: ReconcileState, event: FlowEvent) -> Result<ReconcileState, ReconcileError> {
    use FlowEvent as E;
    use ReconcileState as S;

    let to = match (from, event) {
        (S::Idle, E::BeginOrder) => S::OrderPending,
        (S::OrderPending, E::OrderFailed) => S::Idle,
        (S::OrderPending, E::GatewayUnavailable) => S::Idle,
        (S::OrderPending, E::GatewayOpened) => S::GatewayOpen,
        (S::GatewayOpen, E::GatewaySucceeded) => S::SuccessSignal,
        (S::GatewayOpen, E::GatewayFailed) => S::FailureSignal,
        (S::GatewayOpen, E::GatewayDismissed) => S::Dismissed,
        (S::FailureSignal, E::UserNotified) => S::Idle,
        (S::Dismissed, E::UserNotified) => S::Idle,
        (S::SuccessSignal, E::VerificationStarted) => S::Verifying,
        (S::Verifying, E::Confirmed) => S::ConfirmedPaid,
        (S::Verifying, E::RetriesExhausted) => S::PresumedProcessing,
        (S::ConfirmedPaid, E::RefreshTriggered) => S::Settled,
        (S::PresumedProcessing, E::RefreshTriggered) => S::Settled,
        (S::Settled, E::Reset) => S::Idle,
        (from, event) => return Err(ReconcileError::InvalidTransition { from, event }),
    };

    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use FlowEvent as E;
    use ReconcileState as S;

    fn walk(events: &[FlowEvent]) -> Result<ReconcileState, ReconcileError> {
        events.iter().try_fold(S::Idle, |s, e| next_state(s, *e))
    }

    #[test]
    fn success_path_reaches_settled_then_idle() {
        let end = walk(&[
            E::BeginOrder,
            E::GatewayOpened,
            E::GatewaySucceeded,
            E::VerificationStarted,
            E::RetriesExhausted,
            E::RefreshTriggered,
        ]);
        assert_eq!(end, Ok(S::Settled));
        assert_eq!(next_state(S::Settled, E::Reset), Ok(S::Idle));
    }

    #[test]
    fn failure_and_dismissal_skip_verification() {
        assert_eq!(
            walk(&[E::BeginOrder, E::GatewayOpened, E::GatewayFailed, E::UserNotified]),
            Ok(S::Idle)
        );
        assert_eq!(
            walk(&[E::BeginOrder, E::GatewayOpened, E::GatewayDismissed, E::UserNotified]),
            Ok(S::Idle)
        );
        assert!(next_state(S::FailureSignal, E::VerificationStarted).is_err());
        assert!(next_state(S::Dismissed, E::VerificationStarted).is_err());
    }

    #[test]
    fn begin_order_only_from_idle() {
        for s in [
            S::OrderPending,
            S::GatewayOpen,
            S::SuccessSignal,
            S::Verifying,
            S::ConfirmedPaid,
            S::PresumedProcessing,
            S::Settled,
        ] {
            assert_eq!(
                next_state(s, E::BeginOrder),
                Err(ReconcileError::InvalidTransition { from: s, event: E::BeginOrder })
            );
        }
    }

    #[test]
    fn verifying_cannot_be_dismissed() {
        assert!(next_state(S::Verifying, E::GatewayDismissed).is_err());
        assert!(next_state(S::Verifying, E::Reset).is_err());
    }
}
