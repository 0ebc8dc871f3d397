use axum::http::StatusCode;
use axum::Json;
use axum::response::IntoResponse;
use serde_json::json;

pub async fn page_not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "Oops looks like you landed at the wrong endpoint"})),
    )
}
