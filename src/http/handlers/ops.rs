use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let due_loaded = state.flow.refresher.last_loaded_at().await.is_some();
    let gateway_loaded = state.flow.gateway.is_loaded();

    let status = if due_loaded {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": due_loaded,
            "due_loaded": due_loaded,
            "gateway_loaded": gateway_loaded,
            "backend": state.flow.backend.name(),
            "flow_state": state.flow.state(),
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}
