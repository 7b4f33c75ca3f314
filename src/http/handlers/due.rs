use crate::domain::due::DuePayment;
use crate::domain::payment::err;
use crate::presentation::due_view::DueView;
use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub due: DuePayment,
    pub view: DueView,
    pub stale: bool,
    pub loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn respond(state: &AppState, due: DuePayment, stale: bool) -> DueResponse {
    DueResponse {
        view: DueView::from_due(&due, state.flow.is_in_flight()),
        due,
        stale,
        loaded_at: state.flow.refresher.last_loaded_at().await,
    }
}

pub async fn get_due(State(state): State<AppState>) -> impl IntoResponse {
    match state.flow.refresher.current_or_load().await {
        Ok(due) => (axum::http::StatusCode::OK, Json(respond(&state, due, false).await)).into_response(),
        Err(e) => (
            axum::http::StatusCode::BAD_GATEWAY,
            Json(err("DUE_LOAD_FAILED", &e.to_string())),
        )
            .into_response(),
    }
}

/// Manual refresh; a failure keeps showing the last due, marked stale.
pub async fn refresh_due(State(state): State<AppState>) -> impl IntoResponse {
    match state.flow.refresher.refresh().await {
        Ok(due) => (axum::http::StatusCode::OK, Json(respond(&state, due, false).await)).into_response(),
        Err(e) => match state.flow.refresher.current().await {
            Some(previous) => {
                (axum::http::StatusCode::OK, Json(respond(&state, previous, true).await)).into_response()
            }
            None => (
                axum::http::StatusCode::BAD_GATEWAY,
                Json(err("DUE_LOAD_FAILED", &e.to_string())),
            )
                .into_response(),
        },
    }
}
