use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notice {
    DueLoadFailed { message: String },
    OrderCreationFailed { message: String },
    GatewayUnavailable { message: String },
    PaymentFailed { reason: String },
    PaymentDismissed,
    PaymentConfirmed,
    PaymentProcessing,
    SandboxAmount { charged_paise: i64, due_paise: i64 },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::DueLoadFailed { message } => format!("Could not load your dues: {}", message),
            Notice::OrderCreationFailed { message } => format!("Could not start the payment: {}", message),
            Notice::GatewayUnavailable { message } => {
                format!("Payment gateway is unavailable right now: {}", message)
            }
            Notice::PaymentFailed { reason } => reason.clone(),
            Notice::PaymentDismissed => "Payment cancelled".to_string(),
            Notice::PaymentConfirmed => "Payment successful".to_string(),
            Notice::PaymentProcessing => {
                "Payment successful, it is being processed and will reflect shortly".to_string()
            }
            Notice::SandboxAmount {
                charged_paise,
                due_paise,
            } => format!(
                "Test mode: charging {} instead of {}. The full amount is still recorded against your due.",
                crate::presentation::due_view::format_inr(crate::domain::due::from_paise(*charged_paise)),
                crate::presentation::due_view::format_inr(crate::domain::due::from_paise(*due_paise)),
            ),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::DueLoadFailed { .. }
                | Notice::OrderCreationFailed { .. }
                | Notice::GatewayUnavailable { .. }
                | Notice::PaymentFailed { .. }
        )
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

const NOTICE_LOG_CAPACITY: usize = 64;

#[derive(Clone, Default)]
pub struct NoticeLog {
    inner: Arc<Mutex<VecDeque<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.inner.lock().drain(..).collect()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner.lock().iter().cloned().collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(?notice, "{}", notice.message());
        } else {
            tracing::info!(?notice, "{}", notice.message());
        }

        let mut inner = self.inner.lock();
        if inner.len() == NOTICE_LOG_CAPACITY {
            inner.pop_front();
        }
        inner.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_notice_carries_gateway_reason_verbatim() {
        let n = Notice::PaymentFailed {
            reason: "insufficient funds".to_string(),
        };
        assert_eq!(n.message(), "insufficient funds");
        assert!(n.is_error());
        assert!(!Notice::PaymentProcessing.is_error());
    }

    #[test]
    fn log_is_bounded_and_drains() {
        let log = NoticeLog::new();
        for _ in 0..(NOTICE_LOG_CAPACITY + 5) {
            log.notify(Notice::PaymentDismissed);
        }
        log.notify(Notice::PaymentConfirmed);
        assert_eq!(log.snapshot().len(), NOTICE_LOG_CAPACITY);
        let drained = log.drain();
        assert_eq!(drained.last(), Some(&Notice::PaymentConfirmed));
        assert!(log.drain().is_empty());
    }
}
