use crate::backend::SocietyBackend;
use crate::domain::due::DuePayment;
use crate::domain::payment::{PaymentOrder, VerificationResponse, PAID_STATUS};
use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct MockBackend {
    pub due: Mutex<DuePayment>,
    pub verify_script: Mutex<VecDeque<Result<VerificationResponse, String>>>,
    pub order_error: Mutex<Option<String>>,
    pub order_amount_override: Mutex<Option<i64>>,
    pub gateway_key_id: Mutex<Option<String>>,
    pub verify_latency: Mutex<Option<Duration>>,
    pub due_latency: Mutex<Option<Duration>>,
    pub fail_due_loads: AtomicBool,
    pub settled: AtomicBool,
    pub get_due_calls: AtomicU32,
    pub create_order_calls: AtomicU32,
    pub verify_calls: AtomicU32,
    verifies_in_flight: AtomicU32,
    pub max_concurrent_verifies: AtomicU32,
}

impl MockBackend {
    pub fn with_due(due: DuePayment) -> Self {
        Self {
            due: Mutex::new(due),
            gateway_key_id: Mutex::new(Some("rzp_test_mock".to_string())),
            ..Default::default()
        }
    }

    pub fn script_verify(&self, responses: Vec<Result<VerificationResponse, String>>) {
        self.verify_script.lock().extend(responses);
    }

    pub fn settle(&self) {
        self.settled.store(true, Ordering::SeqCst);
        let mut due = self.due.lock();
        let payment_id = due.payment_id.clone();
        *due = DuePayment {
            payment_id,
            ..DuePayment::nothing_due()
        };
    }

    pub fn verify_count(&self) -> u32 {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn due_count(&self) -> u32 {
        self.get_due_calls.load(Ordering::SeqCst)
    }

    pub fn order_count(&self) -> u32 {
        self.create_order_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SocietyBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_next_due(&self) -> Result<DuePayment> {
        self.get_due_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_due_loads.load(Ordering::SeqCst) {
            bail!("mock due load failure");
        }
        let due = self.due.lock().clone();
        let latency = *self.due_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(due)
    }

    async fn create_order(&self, payment_id: &str) -> Result<PaymentOrder> {
        self.create_order_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.order_error.lock().clone() {
            bail!(message);
        }

        let due = self.due.lock().clone();
        if due.payable_id() != Some(payment_id) {
            bail!("payment {} is not payable", payment_id);
        }

        let override_paise = *self.order_amount_override.lock();
        let amount_in_paise = match override_paise {
            Some(paise) => paise,
            None => due.total_in_paise()?,
        };
        Ok(PaymentOrder {
            order_id: format!("order_mock_{}", uuid::Uuid::new_v4().simple()),
            amount_in_paise,
            currency: "INR".to_string(),
            gateway_key_id: self.gateway_key_id.lock().clone(),
        })
    }

    async fn verify_payment(&self, _payment_id: &str) -> Result<VerificationResponse> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.verifies_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_verifies
            .fetch_max(now_in_flight, Ordering::SeqCst);

        let latency = *self.verify_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.verify_script.lock().pop_front();
        self.verifies_in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Ok(resp)) => Ok(resp),
            Some(Err(message)) => Err(anyhow!(message)),
            None if self.settled.load(Ordering::SeqCst) => Ok(VerificationResponse {
                verified: true,
                status: PAID_STATUS.to_string(),
            }),
            None => Ok(VerificationResponse {
                verified: false,
                status: "PENDING".to_string(),
            }),
        }
    }
}
