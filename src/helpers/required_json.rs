//! JSON body extractor that also enforces `validator` rules.
//!
//! The body is decoded as JSON whatever the `Content-Type` says. Every
//! failure (unreadable body, malformed JSON, missing field, or a field that
//! fails validation) collapses into one 400 with a generic message. The
//! specific reason is logged, never returned.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::FromRequest;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::warn;
use validator::Validate;

pub const INVALID_BODY_MESSAGE: &str = "Invalid JSON or missing fields";

pub struct RequiredJson<T>(pub T);

pub enum RequiredJsonRejection {
    Body(BytesRejection),
    Json(serde_json::Error),
    Validation(validator::ValidationErrors),
}

impl IntoResponse for RequiredJsonRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Body(rejection) => warn!("Error reading request body: {}", rejection),
            Self::Json(e) => warn!("Error binding JSON: {}", e),
            Self::Validation(errors) => warn!("Error validating JSON: {}", errors),
        }

        (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": INVALID_BODY_MESSAGE})),
        ).into_response()
    }
}

#[async_trait]
impl<S, B, T> FromRequest<S, B> for RequiredJson<T>
where
    T: DeserializeOwned + Validate,
    Bytes: FromRequest<S, B, Rejection = BytesRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = RequiredJsonRejection;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(RequiredJsonRejection::Body)?;

        let value: T = serde_json::from_slice(&bytes)
            .map_err(RequiredJsonRejection::Json)?;

        value
            .validate()
            .map_err(RequiredJsonRejection::Validation)?;

        Ok(RequiredJson(value))
    }
}
