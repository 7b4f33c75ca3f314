use crate::reconcile::state::{FlowEvent, ReconcileState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentFlowError {
    #[error("nothing is due")]
    NothingDue,
    #[error("a payment is already in progress")]
    PaymentInFlight,
    #[error("could not create payment order: {0}")]
    OrderCreation(String),
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("payment gateway not configured: {0}")]
    Configuration(String),
}

impl PaymentFlowError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NothingDue => "NOTHING_DUE",
            Self::PaymentInFlight => "PAYMENT_IN_FLIGHT",
            Self::OrderCreation(_) => "ORDER_CREATION_FAILED",
            Self::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            Self::Configuration(_) => "GATEWAY_NOT_CONFIGURED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("verification already running for payment {0}")]
    AlreadyVerifying(String),
    #[error("invalid transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: ReconcileState,
        event: FlowEvent,
    },
}
