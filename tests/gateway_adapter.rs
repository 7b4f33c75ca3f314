use rent_payments::domain::payment::{PaymentOrder, Prefill};
use rent_payments::error::PaymentFlowError;
use rent_payments::gateways::mock::{CheckoutScript, ScriptedCheckout};
use rent_payments::gateways::{GatewayAdapter, TerminalEvent};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn concurrent_loads_share_one_fetch() {
    let checkout = Arc::new(
        ScriptedCheckout::new(CheckoutScript::Dismiss).with_load_latency(Duration::from_millis(300)),
    );
    let adapter = GatewayAdapter::new(checkout.clone(), None, "Test Society");
    let other = adapter.clone();

    let (a, b) = tokio::join!(adapter.ensure_loaded(), other.ensure_loaded());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(checkout.load_count(), 1);
    assert!(adapter.is_loaded());

    adapter.open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent").await.unwrap();
    other.open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent").await.unwrap();
    assert_eq!(checkout.load_count(), 1);
    assert_eq!(checkout.open_count(), 2);
}

#[tokio::test]
async fn failed_load_is_retried_on_next_open() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::Dismiss));
    *checkout.load_failure.lock() = Some("network down".to_string());
    let adapter = GatewayAdapter::new(checkout.clone(), None, "Test Society");

    let err = adapter
        .open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap_err();
    assert_eq!(err, PaymentFlowError::GatewayUnavailable("network down".to_string()));
    assert_eq!(checkout.open_count(), 0);
    assert!(!adapter.is_loaded());

    *checkout.load_failure.lock() = None;
    let event = adapter
        .open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap();
    assert_eq!(event, TerminalEvent::Dismissed);
    assert_eq!(checkout.load_count(), 2);
}

#[tokio::test]
async fn misbehaving_widget_still_yields_one_event() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::FireAll("pay_1".to_string())));
    let adapter = GatewayAdapter::new(checkout, None, "Test Society");

    let event = adapter
        .open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap();
    assert_eq!(
        event,
        TerminalEvent::Success {
            gateway_payment_ref: "pay_1".to_string()
        }
    );
}

#[tokio::test]
async fn silent_widget_resolves_as_dismissed() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::Vanish));
    let adapter = GatewayAdapter::new(checkout, None, "Test Society");

    let event = adapter
        .open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap();
    assert_eq!(event, TerminalEvent::Dismissed);
}

#[tokio::test]
async fn payment_error_hook_reports_failure_reason() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::Error("bank timeout".to_string())));
    let adapter = GatewayAdapter::new(checkout, None, "Test Society");

    let event = adapter
        .open(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap();
    assert_eq!(
        event,
        TerminalEvent::Failure {
            reason: "bank timeout".to_string()
        }
    );
}

#[tokio::test]
async fn held_handlers_ignore_late_signals() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::Hold));
    let adapter = GatewayAdapter::new(checkout.clone(), None, "Test Society");

    let session = adapter
        .launch(&order(Some("rzp_test_k")), &Prefill::default(), "Rent")
        .await
        .unwrap();
    let handlers = checkout.held_handlers().unwrap();
    assert_eq!(handlers.order_id(), "order_1");

    assert!(handlers.on_dismiss());
    assert!(!handlers.on_success("pay_late"));
    assert_eq!(session.outcome().await, TerminalEvent::Dismissed);
}

#[tokio::test]
async fn key_falls_back_to_configured_key() {
    let checkout = Arc::new(ScriptedCheckout::new(CheckoutScript::Dismiss));
    let configured = GatewayAdapter::new(checkout.clone(), Some("rzp_live_fallback".to_string()), "Test Society");
    configured
        .open(&order(None), &Prefill::default(), "Rent")
        .await
        .unwrap();
    assert_eq!(
        checkout.last_options.lock().as_ref().map(|o| o.key.clone()),
        Some("rzp_live_fallback".to_string())
    );

    let unconfigured = GatewayAdapter::new(checkout.clone(), None, "Test Society");
    let err = unconfigured
        .open(&order(Some("  ")), &Prefill::default(), "Rent")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentFlowError::Configuration(_)));
    assert_eq!(checkout.load_count(), 1);
}

fn order(key: Option<&str>) -> PaymentOrder {
    PaymentOrder {
        order_id: "order_1".to_string(),
        amount_in_paise: 100_000,
        currency: "INR".to_string(),
        gateway_key_id: key.map(ToString::to_string),
    }
}
