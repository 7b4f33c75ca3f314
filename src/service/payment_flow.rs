use crate::backend::SocietyBackend;
use crate::domain::due::DuePayment;
use crate::domain::payment::{PaymentOrder, Prefill};
use crate::error::{PaymentFlowError, ReconcileError};
use crate::gateways::{GatewayAdapter, TerminalEvent};
use crate::presentation::due_view::{is_test_key, payment_description, sandbox_notice};
use crate::reconcile::state::{FlowEvent, FlowSnapshot, ReconcileState, Resolution};
use crate::reconcile::transitions::next_state;
use crate::reconcile::verifier::{Reconciler, VerificationReport};
use crate::service::due_refresher::DueRefresher;
use crate::service::notifier::{Notice, Notifier};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub resolution: Resolution,
    pub order_id: String,
    pub gateway_payment_ref: Option<String>,
    pub verification: Option<VerificationReport>,
    pub scheduled_refreshes: Vec<Duration>,
}

#[derive(Clone)]
pub struct PaymentFlow {
    pub backend: Arc<dyn SocietyBackend>,
    pub gateway: GatewayAdapter,
    pub reconciler: Reconciler,
    pub refresher: DueRefresher,
    pub notifier: Arc<dyn Notifier>,
    snapshot: Arc<Mutex<FlowSnapshot>>,
}

impl PaymentFlow {
    pub fn new(
        backend: Arc<dyn SocietyBackend>,
        gateway: GatewayAdapter,
        reconciler: Reconciler,
        refresher: DueRefresher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            gateway,
            reconciler,
            refresher,
            notifier,
            snapshot: Arc::new(Mutex::new(FlowSnapshot::new())),
        }
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.snapshot.lock().clone()
    }

    pub fn state(&self) -> ReconcileState {
        self.snapshot.lock().state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state().is_in_flight()
    }

    fn transition(&self, event: FlowEvent) -> Result<ReconcileState, ReconcileError> {
        let mut snapshot = self.snapshot.lock();
        let from = snapshot.state;
        let to = next_state(from, event)?;
        snapshot.state = to;
        snapshot.updated_at = chrono::Utc::now();
        tracing::info!(payment_id = ?snapshot.payment_id, ?from, ?to, ?event, "payment flow transition");
        Ok(to)
    }

    fn advance(&self, event: FlowEvent) {
        if let Err(e) = self.transition(event) {
            tracing::error!("payment flow out of step: {}", e);
        }
    }

    fn begin(&self, payment_id: &str) -> Result<(), PaymentFlowError> {
        let mut snapshot = self.snapshot.lock();
        let Ok(to) = next_state(snapshot.state, FlowEvent::BeginOrder) else {
            tracing::info!(payment_id, state = ?snapshot.state, "payment already in flight, ignoring");
            return Err(PaymentFlowError::PaymentInFlight);
        };
        *snapshot = FlowSnapshot {
            state: to,
            payment_id: Some(payment_id.to_string()),
            ..FlowSnapshot::new()
        };
        tracing::info!(payment_id, "payment flow started");
        Ok(())
    }

    fn abort(&self, event: FlowEvent, err: PaymentFlowError) -> PaymentFlowError {
        self.advance(event);
        let notice = match &err {
            PaymentFlowError::OrderCreation(message) => Some(Notice::OrderCreationFailed {
                message: message.clone(),
            }),
            PaymentFlowError::GatewayUnavailable(message) | PaymentFlowError::Configuration(message) => {
                Some(Notice::GatewayUnavailable {
                    message: message.clone(),
                })
            }
            PaymentFlowError::NothingDue | PaymentFlowError::PaymentInFlight => None,
        };
        if let Some(notice) = notice {
            self.notifier.notify(notice);
        }
        err
    }

    fn finish(&self, resolution: &Resolution, event: FlowEvent) {
        self.snapshot.lock().last_resolution = Some(resolution.clone());
        self.advance(event);
    }

    fn claim(&self, due: &DuePayment) -> Result<String, PaymentFlowError> {
        let payment_id = due
            .payable_id()
            .ok_or(PaymentFlowError::NothingDue)?
            .to_string();
        self.begin(&payment_id)?;
        Ok(payment_id)
    }

    /// Claims the flow now and runs the attempt in a background task, so
    /// dropping the caller cannot strand the flow half-way.
    pub fn start(
        &self,
        due: DuePayment,
        prefill: Prefill,
    ) -> Result<JoinHandle<Result<FlowOutcome, PaymentFlowError>>, PaymentFlowError> {
        let payment_id = self.claim(&due)?;
        let this = self.clone();
        Ok(tokio::spawn(async move {
            this.run(payment_id, &due, &prefill).await
        }))
    }

    pub async fn pay(&self, due: &DuePayment, prefill: &Prefill) -> Result<FlowOutcome, PaymentFlowError> {
        let payment_id = self.claim(due)?;
        self.run(payment_id, due, prefill).await
    }

    async fn run(
        &self,
        payment_id: String,
        due: &DuePayment,
        prefill: &Prefill,
    ) -> Result<FlowOutcome, PaymentFlowError> {
        let order = match self.backend.create_order(&payment_id).await {
            Ok(order) if order.amount_in_paise > 0 => order,
            Ok(order) => {
                return Err(self.abort(
                    FlowEvent::OrderFailed,
                    PaymentFlowError::OrderCreation(format!(
                        "order {} has non-positive amount {}",
                        order.order_id, order.amount_in_paise
                    )),
                ))
            }
            Err(e) => {
                return Err(self.abort(FlowEvent::OrderFailed, PaymentFlowError::OrderCreation(e.to_string())))
            }
        };
        self.snapshot.lock().order_id = Some(order.order_id.clone());
        tracing::info!(payment_id = %payment_id, order_id = %order.order_id, amount_in_paise = order.amount_in_paise, "order created");

        let test_mode = self
            .gateway
            .resolve_key(&order)
            .map(|key| is_test_key(&key))
            .unwrap_or(false);
        if let Some(notice) = sandbox_notice(due, &order, test_mode) {
            self.notifier.notify(notice);
        }

        let session = match self
            .gateway
            .launch(&order, prefill, &payment_description(due))
            .await
        {
            Ok(session) => session,
            Err(e) => return Err(self.abort(FlowEvent::GatewayUnavailable, e)),
        };
        self.advance(FlowEvent::GatewayOpened);

        match session.outcome().await {
            TerminalEvent::Failure { reason } => {
                self.advance(FlowEvent::GatewayFailed);
                self.notifier.notify(Notice::PaymentFailed {
                    reason: reason.clone(),
                });
                let resolution = Resolution::Failed { reason };
                self.finish(&resolution, FlowEvent::UserNotified);
                Ok(FlowOutcome {
                    resolution,
                    order_id: order.order_id,
                    gateway_payment_ref: None,
                    verification: None,
                    scheduled_refreshes: Vec::new(),
                })
            }
            TerminalEvent::Dismissed => {
                self.advance(FlowEvent::GatewayDismissed);
                self.notifier.notify(Notice::PaymentDismissed);
                self.finish(&Resolution::Dismissed, FlowEvent::UserNotified);
                Ok(FlowOutcome {
                    resolution: Resolution::Dismissed,
                    order_id: order.order_id,
                    gateway_payment_ref: None,
                    verification: None,
                    scheduled_refreshes: Vec::new(),
                })
            }
            TerminalEvent::Success { gateway_payment_ref } => {
                self.advance(FlowEvent::GatewaySucceeded);
                Ok(self.settle(&payment_id, order, gateway_payment_ref).await)
            }
        }
    }

    async fn settle(&self, payment_id: &str, order: PaymentOrder, gateway_payment_ref: String) -> FlowOutcome {
        self.advance(FlowEvent::VerificationStarted);

        let report = match self.reconciler.verify(payment_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(payment_id, "verification skipped: {}", e);
                VerificationReport {
                    payment_id: payment_id.to_string(),
                    resolution: Resolution::PresumedProcessing,
                    attempts: Vec::new(),
                }
            }
        };
        self.snapshot.lock().verify_calls = report.attempts.len() as u32;

        let mut scheduled_refreshes = Vec::new();
        if report.resolution == Resolution::ConfirmedPaid {
            self.advance(FlowEvent::Confirmed);
            self.notifier.notify(Notice::PaymentConfirmed);
            self.advance(FlowEvent::RefreshTriggered);
            let _ = self.refresher.refresh().await;
        } else {
            self.advance(FlowEvent::RetriesExhausted);
            self.notifier.notify(Notice::PaymentProcessing);
            self.advance(FlowEvent::RefreshTriggered);
            let policy = &self.reconciler.policy;
            for delay in [policy.presumed_refresh_delay, policy.catch_up_refresh_delay] {
                self.refresher.schedule(delay);
                scheduled_refreshes.push(delay);
            }
        }

        let resolution = report.resolution.clone();
        self.finish(&resolution, FlowEvent::Reset);
        FlowOutcome {
            resolution,
            order_id: order.order_id,
            gateway_payment_ref: Some(gateway_payment_ref).filter(|r| !r.is_empty()),
            verification: Some(report),
            scheduled_refreshes,
        }
    }

    pub async fn reverify(&self, payment_id: &str) -> Result<VerificationReport, ReconcileError> {
        self.reconciler.verify(payment_id).await
    }
}
