use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileState {
    Idle,
    OrderPending,
    GatewayOpen,
    SuccessSignal,
    FailureSignal,
    Dismissed,
    Verifying,
    ConfirmedPaid,
    PresumedProcessing,
    Settled,
}

impl ReconcileState {
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, ReconcileState::Idle)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowEvent {
    BeginOrder,
    OrderFailed,
    GatewayUnavailable,
    GatewayOpened,
    GatewaySucceeded,
    GatewayFailed,
    GatewayDismissed,
    UserNotified,
    VerificationStarted,
    Confirmed,
    RetriesExhausted,
    RefreshTriggered,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum Resolution {
    ConfirmedPaid,
    PresumedProcessing,
    Failed { reason: String },
    Dismissed,
}

impl Resolution {
    pub fn counts_as_paid(&self) -> bool {
        matches!(self, Resolution::ConfirmedPaid | Resolution::PresumedProcessing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub state: ReconcileState,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub last_resolution: Option<Resolution>,
    pub verify_calls: u32,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl FlowSnapshot {
    pub fn new() -> Self {
        Self {
            state: ReconcileState::Idle,
            payment_id: None,
            order_id: None,
            last_resolution: None,
            verify_calls: 0,
            updated_at: chrono::Utc::now(),
        }
    }
}

impl Default for FlowSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
