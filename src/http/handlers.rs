//! Todo endpoint handlers.
//!
//! # Endpoints
//! - `GET /todos`: every stored item, unordered
//! - `POST /todos`: store the body as a new item, `201` with the stored copy
//! - `GET /todos/{id}`: one item or an empty `404`
//! - `DELETE /todos/{id}`: `200` with no body, or an empty `404`
//! - `GET /welcome`: plain-text banner identifying this instance

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::field;
use uuid::Uuid;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::{metrics, tracing::current_trace_id};
use crate::store::TodoItem;

pub async fn list(State(state): State<AppState>) -> Json<Vec<TodoItem>> {
    Json(state.store.get_all())
}

pub async fn create(
    State(state): State<AppState>,
    Json(item): Json<TodoItem>,
) -> (StatusCode, Json<TodoItem>) {
    let stored = {
        let span = tracing::info_span!("NewTodo", itemId = field::Empty);
        let _guard = span.enter();
        let stored = state.store.insert(item);
        span.record("itemId", field::display(stored.id));
        stored
    };

    tracing::info!(item_id = %stored.id, "New item added");
    metrics::record_item_created();

    (StatusCode::CREATED, Json(stored))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TodoItem>, ApiError> {
    Ok(Json(state.store.get(&id)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.store.delete(&id) {
        Ok(_) => {
            tracing::info!(item_id = %id, "Todo deleted");
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::warn!(item_id = %id, "Todo not found");
            Err(e.into())
        }
    }
}

pub async fn welcome(State(state): State<AppState>) -> String {
    let instance = &state.instance;
    let trace_id = current_trace_id().unwrap_or_else(|| "none".to_string());
    format!(
        "Welcome to {} ({})\nhost: {}\ninstance: {}\ntrace: {}\n",
        instance.service, instance.environment, instance.host, instance.id, trace_id
    )
}
