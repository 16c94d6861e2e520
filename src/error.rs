use axum::body::Bytes;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unreadable body ({status}): {message}")]
    Body { status: StatusCode, message: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_sqlite::InteractError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Clients get no detail back for rejected input.
            AppError::Validation(msg) => {
                tracing::warn!(error = %msg, "request rejected");
                return StatusCode::BAD_REQUEST.into_response();
            }
            AppError::MalformedPayload(msg) => {
                tracing::warn!(error = %msg, "malformed payload rejected");
                return StatusCode::BAD_REQUEST.into_response();
            }
            AppError::Body { status, message } => {
                tracing::warn!(status = status.as_u16(), error = %message, "request body rejected");
                return (*status).into_response();
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "internal server error"
            }
            AppError::Pool(e) => {
                tracing::error!(error = %e, "pool error");
                "internal server error"
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "internal server error"
            }
        };

        let body = json!({ "error": message });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON extractor that logs deserialization errors before rejecting.
///
/// Unlike `axum::Json<T>` it does not require a `Content-Type` header, since
/// tracking snippets often post with `text/plain` to avoid CORS preflights.
pub struct LoggedJson<T>(pub T);

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            let status = rejection.status();
            tracing::warn!(
                path = %path,
                status = status.as_u16(),
                error = %rejection,
                "failed to read request body"
            );
            AppError::Body {
                status,
                message: rejection.body_text(),
            }
        })?;

        match serde_json::from_slice::<T>(&body) {
            Ok(value) => Ok(LoggedJson(value)),
            Err(e) => {
                tracing::warn!(
                    path = %path,
                    bytes = body.len(),
                    error = %e,
                    "JSON parse error (client sent malformed payload)"
                );
                Err(AppError::MalformedPayload(e.to_string()))
            }
        }
    }
}
