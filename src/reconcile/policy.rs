use crate::domain::payment::{AttemptOutcome, PAID_STATUS};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub max_retries: u32,
    pub settle_delay: Duration,
    pub retry_delay: Duration,
    pub presumed_refresh_delay: Duration,
    pub catch_up_refresh_delay: Duration,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            settle_delay: Duration::from_secs(2),
            retry_delay: Duration::from_secs(2),
            presumed_refresh_delay: Duration::from_secs(5),
            catch_up_refresh_delay: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptDirective {
    Confirmed,
    RetryAfter(Duration),
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct VerificationLoop {
    pub attempt_index: u32,
    pub policy: VerificationPolicy,
}

impl VerificationLoop {
    pub fn new(policy: VerificationPolicy) -> Self {
        Self {
            attempt_index: 0,
            policy,
        }
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempt_index < self.policy.max_retries
    }

    pub fn record(&mut self, outcome: &AttemptOutcome) -> AttemptDirective {
        self.attempt_index += 1;

        if is_confirmation(outcome) {
            return AttemptDirective::Confirmed;
        }
        if self.has_attempts_left() {
            AttemptDirective::RetryAfter(self.policy.retry_delay)
        } else {
            AttemptDirective::Exhausted
        }
    }
}

fn is_confirmation(outcome: &AttemptOutcome) -> bool {
    match outcome {
        AttemptOutcome::Answered { verified, status } => *verified && status == PAID_STATUS,
        AttemptOutcome::TransportError { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered(verified: bool, status: &str) -> AttemptOutcome {
        AttemptOutcome::Answered {
            verified,
            status: status.to_string(),
        }
    }

    #[test]
    fn success_short_circuits() {
        let mut l = VerificationLoop::new(VerificationPolicy::default());
        assert_eq!(l.record(&answered(true, "PAID")), AttemptDirective::Confirmed);
        assert_eq!(l.attempt_index, 1);
    }

    #[test]
    fn verified_without_paid_status_is_not_confirmation() {
        let mut l = VerificationLoop::new(VerificationPolicy::default());
        assert_eq!(
            l.record(&answered(true, "PENDING")),
            AttemptDirective::RetryAfter(Duration::from_secs(2))
        );
    }

    #[test]
    fn transport_errors_count_as_unconfirmed_until_cap() {
        let mut l = VerificationLoop::new(VerificationPolicy::default());
        let boom = AttemptOutcome::TransportError {
            message: "connection reset".to_string(),
        };
        assert!(matches!(l.record(&boom), AttemptDirective::RetryAfter(_)));
        assert!(matches!(l.record(&answered(false, "PENDING")), AttemptDirective::RetryAfter(_)));
        assert_eq!(l.record(&boom), AttemptDirective::Exhausted);
        assert!(!l.has_attempts_left());
    }
}
