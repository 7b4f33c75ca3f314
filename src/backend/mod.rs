use crate::domain::due::DuePayment;
use crate::domain::payment::{PaymentOrder, VerificationResponse};
use anyhow::Result;

pub mod http;
pub mod mock;

#[async_trait::async_trait]
pub trait SocietyBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_next_due(&self) -> Result<DuePayment>;

    async fn create_order(&self, payment_id: &str) -> Result<PaymentOrder>;

    /// Read-only; safe to call any number of times.
    async fn verify_payment(&self, payment_id: &str) -> Result<VerificationResponse>;
}
