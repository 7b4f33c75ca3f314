use serde::{Deserialize, Serialize};

/// Gateway-ready charge descriptor for a single attempt. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount_in_paise: i64,
    pub currency: String,
    #[serde(default, alias = "keyId", alias = "razorpayKeyId")]
    pub gateway_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub verified: bool,
    #[serde(default)]
    pub status: String,
}

pub const PAID_STATUS: &str = "PAID";

impl VerificationResponse {
    pub fn is_confirmed_paid(&self) -> bool {
        self.verified && self.status == PAID_STATUS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "kind")]
pub enum AttemptOutcome {
    Answered { verified: bool, status: String },
    TransportError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationAttempt {
    pub attempt_index: u32,
    pub outcome: AttemptOutcome,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl VerificationAttempt {
    pub fn confirmed(&self) -> bool {
        matches!(
            &self.outcome,
            AttemptOutcome::Answered { verified: true, status } if status == PAID_STATUS
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
