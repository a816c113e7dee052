//! Call endpoint: JSON in, typed dispatch, JSON out.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use buoy_core::{values_from_json, CallRequest, ErrorKind, Signature};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceExt;

use super::AppState;

/// Request body for `POST /call/{operation}`.
#[derive(Debug, Deserialize)]
pub struct CallBody {
    /// Positional arguments. Omitted means no arguments.
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

/// HTTP status reported for each failure kind.
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnknownOperation => StatusCode::NOT_FOUND,
        ErrorKind::ArgumentTypeMismatch => StatusCode::BAD_REQUEST,
        ErrorKind::DuplicateOperation => StatusCode::CONFLICT,
        ErrorKind::ReturnTypeMismatch | ErrorKind::HandlerFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Handles `POST /call/{operation}`.
///
/// Success: `200 {"value": ...}`. Failure: `{"kind": ..., "message": ...}`
/// with the status from [`status_for`]. A body that is not a JSON
/// `{"args": [...]}` object, or arguments that have no value-model
/// counterpart, are rejected with `400` and kind `invalid_argument` before
/// dispatch.
pub async fn call_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    body: Result<Json<CallBody>, JsonRejection>,
) -> Response {
    let Some(_guard) = state.shutdown.try_admit() else {
        let message = format!("server is {}", state.shutdown.health_state().as_str());
        return failure(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message);
    };

    let args = match body {
        Ok(Json(body)) => body.args,
        Err(rejection) => {
            return failure(StatusCode::BAD_REQUEST, INVALID_ARGUMENT, rejection.body_text());
        }
    };
    let args = match values_from_json(args) {
        Ok(args) => args,
        Err(err) => return failure(StatusCode::BAD_REQUEST, INVALID_ARGUMENT, err.to_string()),
    };

    match state
        .pipeline
        .clone()
        .oneshot(CallRequest::new(operation, args))
        .await
    {
        Ok(value) => Json(json!({ "value": value.to_json() })).into_response(),
        Err(err) => (status_for(err.kind()), Json(err.to_failure())).into_response(),
    }
}

/// Kind reported for requests rejected before they become a call.
const INVALID_ARGUMENT: &str = "invalid_argument";

fn failure(status: StatusCode, kind: &str, message: String) -> Response {
    (status, Json(json!({ "kind": kind, "message": message }))).into_response()
}

/// Handles `GET /operations`: every registered signature in registration order.
pub async fn operations_handler(State(state): State<AppState>) -> Json<Vec<Signature>> {
    Json(state.registry.operations())
}
