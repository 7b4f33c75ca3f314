use crate::backend::SocietyBackend;
use crate::domain::payment::{AttemptOutcome, VerificationAttempt};
use crate::error::ReconcileError;
use crate::reconcile::policy::{AttemptDirective, VerificationLoop, VerificationPolicy};
use crate::reconcile::state::Resolution;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub payment_id: String,
    /// Either `ConfirmedPaid` or `PresumedProcessing`; verification never denies.
    pub resolution: Resolution,
    pub attempts: Vec<VerificationAttempt>,
}

#[derive(Clone)]
pub struct Reconciler {
    pub backend: Arc<dyn SocietyBackend>,
    pub policy: VerificationPolicy,
    active: Arc<Mutex<HashSet<String>>>,
}

struct ActiveGuard {
    active: Arc<Mutex<HashSet<String>>>,
    payment_id: String,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.payment_id);
    }
}

impl Reconciler {
    pub fn new(backend: Arc<dyn SocietyBackend>, policy: VerificationPolicy) -> Self {
        Self {
            backend,
            policy,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_verifying(&self, payment_id: &str) -> bool {
        self.active.lock().contains(payment_id)
    }

    fn claim(&self, payment_id: &str) -> Result<ActiveGuard, ReconcileError> {
        let mut active = self.active.lock();
        if !active.insert(payment_id.to_string()) {
            return Err(ReconcileError::AlreadyVerifying(payment_id.to_string()));
        }
        Ok(ActiveGuard {
            active: self.active.clone(),
            payment_id: payment_id.to_string(),
        })
    }

    pub async fn verify(&self, payment_id: &str) -> Result<VerificationReport, ReconcileError> {
        let _guard = self.claim(payment_id)?;

        tokio::time::sleep(self.policy.settle_delay).await;

        let mut state = VerificationLoop::new(self.policy.clone());
        let mut attempts = Vec::new();
        loop {
            let attempt_index = state.attempt_index;
            let outcome = match self.backend.verify_payment(payment_id).await {
                Ok(resp) => AttemptOutcome::Answered {
                    verified: resp.verified,
                    status: resp.status,
                },
                Err(e) => {
                    tracing::warn!(payment_id, attempt_index, "verification call failed: {}", e);
                    AttemptOutcome::TransportError {
                        message: e.to_string(),
                    }
                }
            };
            tracing::debug!(payment_id, attempt_index, ?outcome, "verification attempt");

            let directive = state.record(&outcome);
            attempts.push(VerificationAttempt {
                attempt_index,
                outcome,
                at: chrono::Utc::now(),
            });

            match directive {
                AttemptDirective::Confirmed => {
                    tracing::info!(payment_id, attempts = attempts.len(), "payment confirmed paid");
                    return Ok(VerificationReport {
                        payment_id: payment_id.to_string(),
                        resolution: Resolution::ConfirmedPaid,
                        attempts,
                    });
                }
                AttemptDirective::RetryAfter(delay) => tokio::time::sleep(delay).await,
                AttemptDirective::Exhausted => {
                    tracing::info!(
                        payment_id,
                        attempts = attempts.len(),
                        "verification budget exhausted, presuming payment is processing"
                    );
                    return Ok(VerificationReport {
                        payment_id: payment_id.to_string(),
                        resolution: Resolution::PresumedProcessing,
                        attempts,
                    });
                }
            }
        }
    }
}
