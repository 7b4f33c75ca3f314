use axum::routing::{get, post};
use axum::Router;
use rent_payments::backend::http::HttpBackend;
use rent_payments::backend::mock::MockBackend;
use rent_payments::backend::SocietyBackend;
use rent_payments::config::{AppConfig, BackendMode};
use rent_payments::domain::due::DuePayment;
use rent_payments::gateways::hosted::HostedCheckout;
use rent_payments::gateways::GatewayAdapter;
use rent_payments::reconcile::verifier::Reconciler;
use rent_payments::service::due_refresher::DueRefresher;
use rent_payments::service::notifier::{NoticeLog, Notifier};
use rent_payments::service::payment_flow::PaymentFlow;
use rent_payments::AppState;
use chrono::Datelike;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let backend: Arc<dyn SocietyBackend> = match cfg.backend_mode {
        BackendMode::Http => Arc::new(HttpBackend::new(
            &cfg.backend_base_url,
            cfg.backend_api_token.clone(),
            cfg.gateway_timeout_ms,
        )),
        BackendMode::Mock => {
            tracing::warn!("BACKEND_MODE=mock, serving a demo due");
            Arc::new(MockBackend::with_due(demo_due()))
        }
    };

    let notices = NoticeLog::new();
    let notifier: Arc<dyn Notifier> = Arc::new(notices.clone());
    let hosted_checkout = Arc::new(
        HostedCheckout::new(&cfg.checkout_script_url, cfg.gateway_timeout_ms)
            .with_session_ttl(Duration::from_millis(cfg.checkout_session_ttl_ms)),
    );
    hosted_checkout.spawn_expiry(Duration::from_secs(30));
    let gateway = GatewayAdapter::new(
        hosted_checkout.clone(),
        cfg.gateway_key_id.clone(),
        &cfg.merchant_name,
    );
    let refresher = DueRefresher::new(backend.clone(), notifier.clone());
    let reconciler = Reconciler::new(backend.clone(), cfg.verification_policy());
    let flow = PaymentFlow::new(backend, gateway, reconciler, refresher.clone(), notifier);

    if let Err(e) = refresher.refresh().await {
        tracing::warn!("initial due load failed, will retry on demand: {}", e);
    }

    let state = AppState {
        flow,
        hosted_checkout,
        notices,
    };

    let app = Router::new()
        .route("/health", get(rent_payments::http::handlers::payments::health))
        .route("/due", get(rent_payments::http::handlers::due::get_due))
        .route("/due/refresh", post(rent_payments::http::handlers::due::refresh_due))
        .route("/payments/pay", post(rent_payments::http::handlers::payments::pay))
        .route(
            "/payments/checkout",
            get(rent_payments::http::handlers::payments::checkout_session),
        )
        .route(
            "/payments/checkout/:order_id/events",
            post(rent_payments::http::handlers::payments::checkout_event),
        )
        .route("/payments/state", get(rent_payments::http::handlers::payments::flow_state))
        .route("/ops/readiness", get(rent_payments::http::handlers::ops::readiness))
        .route("/ops/liveness", get(rent_payments::http::handlers::ops::liveness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn demo_due() -> DuePayment {
    let today = chrono::Utc::now().date_naive();
    DuePayment {
        payment_id: Some("demo_rent_1".to_string()),
        has_due: true,
        base_amount: rust_decimal::Decimal::from(12_000),
        late_fee_amount: rust_decimal::Decimal::ZERO,
        total_amount: rust_decimal::Decimal::from(12_000),
        period_month: Some(today.month()),
        period_year: Some(today.year()),
        is_overdue: false,
        grace_period_ends: None,
    }
}
