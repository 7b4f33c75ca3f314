use crate::domain::payment::{err, Prefill};
use crate::error::PaymentFlowError;
use crate::gateways::NativeCheckoutEvent;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PayRequest {
    #[serde(default)]
    pub prefill: Prefill,
}

pub async fn pay(State(state): State<AppState>, body: Option<Json<PayRequest>>) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    if state.flow.is_in_flight() {
        return flow_error(PaymentFlowError::PaymentInFlight).into_response();
    }

    let due = match state.flow.refresher.current_or_load().await {
        Ok(due) => due,
        Err(e) => {
            return (StatusCode::BAD_GATEWAY, Json(err("DUE_LOAD_FAILED", &e.to_string()))).into_response()
        }
    };
    let payment_id = due.payment_id.clone();

    match state.flow.start(due, req.prefill) {
        Ok(handle) => {
            tokio::spawn(async move {
                match handle.await {
                    Ok(Ok(outcome)) => {
                        tracing::info!(order_id = %outcome.order_id, resolution = ?outcome.resolution, "payment attempt finished")
                    }
                    Ok(Err(e)) => tracing::warn!("payment attempt aborted: {}", e),
                    Err(e) => tracing::error!("payment task panicked: {}", e),
                }
            });
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({ "paymentId": payment_id })),
            )
                .into_response()
        }
        Err(e) => flow_error(e).into_response(),
    }
}

pub async fn checkout_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.hosted_checkout.open_session() {
        Some(options) => (StatusCode::OK, Json(options)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(err("NO_OPEN_CHECKOUT", "no checkout is open"))).into_response(),
    }
}

pub async fn checkout_event(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(event): Json<NativeCheckoutEvent>,
) -> impl IntoResponse {
    match state.hosted_checkout.deliver(&order_id, event) {
        Ok(resolved) => (StatusCode::OK, Json(serde_json::json!({ "resolved": resolved }))).into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(err("UNKNOWN_CHECKOUT", &e.to_string()))).into_response(),
    }
}

pub async fn flow_state(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "flow": state.flow.snapshot(),
            "notices": state.notices.drain(),
        })),
    )
        .into_response()
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn flow_error(e: PaymentFlowError) -> (StatusCode, Json<crate::domain::payment::ErrorEnvelope>) {
    let status = match e {
        PaymentFlowError::PaymentInFlight => StatusCode::CONFLICT,
        PaymentFlowError::NothingDue => StatusCode::UNPROCESSABLE_ENTITY,
        PaymentFlowError::OrderCreation(_) => StatusCode::BAD_GATEWAY,
        PaymentFlowError::GatewayUnavailable(_) | PaymentFlowError::Configuration(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(err(e.code(), &e.to_string())))
}
