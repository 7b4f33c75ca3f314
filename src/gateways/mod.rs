use crate::domain::payment::{PaymentOrder, Prefill};
use crate::error::PaymentFlowError;
use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{oneshot, OnceCell};

pub mod hosted;
pub mod mock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: String,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// Exactly one of these ends every checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalEvent {
    Success { gateway_payment_ref: String },
    Failure { reason: String },
    Dismissed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NativeCheckoutEvent {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

const DEFAULT_FAILURE_REASON: &str = "Payment failed";

impl NativeCheckoutEvent {
    pub fn into_terminal(self) -> Option<TerminalEvent> {
        match self.event.as_str() {
            "payment.success" | "handler" => Some(TerminalEvent::Success {
                gateway_payment_ref: self
                    .payload
                    .get("razorpay_payment_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            }),
            "payment.failed" | "payment.error" => Some(TerminalEvent::Failure {
                reason: failure_reason(&self.payload),
            }),
            "modal.ondismiss" | "dismiss" | "close" => Some(TerminalEvent::Dismissed),
            _ => None,
        }
    }
}

fn failure_reason(payload: &serde_json::Value) -> String {
    payload
        .pointer("/error/description")
        .or_else(|| payload.get("description"))
        .or_else(|| payload.get("reason"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_FAILURE_REASON)
        .to_string()
}

/// The native callback hooks handed to a widget. Every hook funnels into one
/// slot, so only the first call across all clones resolves the checkout.
#[derive(Clone)]
pub struct CheckoutHandlers {
    order_id: String,
    slot: Arc<Mutex<Option<oneshot::Sender<TerminalEvent>>>>,
}

impl CheckoutHandlers {
    fn new(order_id: &str, tx: oneshot::Sender<TerminalEvent>) -> Self {
        Self {
            order_id: order_id.to_string(),
            slot: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn on_success(&self, gateway_payment_ref: &str) -> bool {
        self.fire(TerminalEvent::Success {
            gateway_payment_ref: gateway_payment_ref.to_string(),
        })
    }

    pub fn on_failed(&self, reason: &str) -> bool {
        self.fire(TerminalEvent::Failure {
            reason: reason.to_string(),
        })
    }

    pub fn on_error(&self, reason: &str) -> bool {
        self.on_failed(reason)
    }

    pub fn on_dismiss(&self) -> bool {
        self.fire(TerminalEvent::Dismissed)
    }

    pub fn dispatch(&self, native: NativeCheckoutEvent) -> bool {
        let name = native.event.clone();
        match native.into_terminal() {
            Some(event) => self.fire(event),
            None => {
                tracing::debug!(order_id = %self.order_id, event = %name, "non-terminal checkout event");
                false
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.lock().is_none()
    }

    fn fire(&self, event: TerminalEvent) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            tracing::warn!(order_id = %self.order_id, ?event, "ignoring checkout signal after terminal event");
            return false;
        };
        tracing::info!(order_id = %self.order_id, ?event, "checkout terminal event");
        let _ = tx.send(event);
        true
    }
}

#[async_trait::async_trait]
pub trait CheckoutWidget: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<()>;

    fn open(&self, options: CheckoutOptions, handlers: CheckoutHandlers) -> Result<()>;
}

pub struct CheckoutSession {
    pub order_id: String,
    rx: oneshot::Receiver<TerminalEvent>,
}

impl CheckoutSession {
    pub async fn outcome(self) -> TerminalEvent {
        match self.rx.await {
            Ok(event) => event,
            Err(_) => {
                tracing::warn!(order_id = %self.order_id, "checkout closed without a signal, treating as dismissed");
                TerminalEvent::Dismissed
            }
        }
    }
}

#[derive(Clone)]
pub struct GatewayAdapter {
    pub widget: Arc<dyn CheckoutWidget>,
    pub fallback_key_id: Option<String>,
    pub merchant_name: String,
    loaded: Arc<OnceCell<()>>,
}

impl GatewayAdapter {
    pub fn new(widget: Arc<dyn CheckoutWidget>, fallback_key_id: Option<String>, merchant_name: &str) -> Self {
        Self {
            widget,
            fallback_key_id,
            merchant_name: merchant_name.to_string(),
            loaded: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Concurrent callers wait on the same in-flight load; a failed load
    /// leaves the adapter unloaded so the next attempt tries again.
    pub async fn ensure_loaded(&self) -> Result<(), PaymentFlowError> {
        self.loaded
            .get_or_try_init(|| self.widget.load())
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(widget = self.widget.name(), "checkout script load failed: {}", e);
                PaymentFlowError::GatewayUnavailable(e.to_string())
            })
    }

    pub fn resolve_key(&self, order: &PaymentOrder) -> Result<String, PaymentFlowError> {
        order
            .gateway_key_id
            .as_deref()
            .or(self.fallback_key_id.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| PaymentFlowError::Configuration("gateway key id is missing".to_string()))
    }

    pub fn checkout_options(
        &self,
        order: &PaymentOrder,
        prefill: &Prefill,
        description: &str,
    ) -> Result<CheckoutOptions, PaymentFlowError> {
        Ok(CheckoutOptions {
            key: self.resolve_key(order)?,
            amount: order.amount_in_paise,
            currency: order.currency.clone(),
            order_id: order.order_id.clone(),
            name: self.merchant_name.clone(),
            description: description.to_string(),
            prefill: prefill.clone(),
        })
    }

    pub async fn launch(
        &self,
        order: &PaymentOrder,
        prefill: &Prefill,
        description: &str,
    ) -> Result<CheckoutSession, PaymentFlowError> {
        let options = self.checkout_options(order, prefill, description)?;
        self.ensure_loaded().await?;

        let (tx, rx) = oneshot::channel();
        let handlers = CheckoutHandlers::new(&order.order_id, tx);
        self.widget
            .open(options, handlers)
            .map_err(|e| PaymentFlowError::GatewayUnavailable(e.to_string()))?;

        Ok(CheckoutSession {
            order_id: order.order_id.clone(),
            rx,
        })
    }

    pub async fn open(
        &self,
        order: &PaymentOrder,
        prefill: &Prefill,
        description: &str,
    ) -> Result<TerminalEvent, PaymentFlowError> {
        Ok(self.launch(order, prefill, description).await?.outcome().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn native(event: &str, payload: serde_json::Value) -> NativeCheckoutEvent {
        NativeCheckoutEvent {
            event: event.to_string(),
            payload,
        }
    }

    #[test]
    fn maps_native_events() {
        assert_eq!(
            native("payment.success", json!({"razorpay_payment_id": "pay_X"})).into_terminal(),
            Some(TerminalEvent::Success {
                gateway_payment_ref: "pay_X".to_string()
            })
        );
        assert_eq!(
            native("payment.failed", json!({"error": {"description": "insufficient funds"}}))
                .into_terminal(),
            Some(TerminalEvent::Failure {
                reason: "insufficient funds".to_string()
            })
        );
        assert_eq!(
            native("payment.error", json!({})).into_terminal(),
            Some(TerminalEvent::Failure {
                reason: DEFAULT_FAILURE_REASON.to_string()
            })
        );
        assert_eq!(native("modal.ondismiss", json!(null)).into_terminal(), Some(TerminalEvent::Dismissed));
        assert_eq!(native("payment.authorized", json!({})).into_terminal(), None);
    }

    #[tokio::test]
    async fn only_first_handler_call_resolves() {
        let (tx, rx) = oneshot::channel();
        let handlers = CheckoutHandlers::new("order_1", tx);
        let other = handlers.clone();

        assert!(handlers.on_failed("card declined"));
        assert!(!other.on_success("pay_late"));
        assert!(!handlers.on_dismiss());
        assert!(other.is_resolved());

        assert_eq!(
            rx.await.unwrap(),
            TerminalEvent::Failure {
                reason: "card declined".to_string()
            }
        );
    }
}
