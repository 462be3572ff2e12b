use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Domain errors surfaced by the handlers. Everything renders as
/// `{"message": ..., "success": false}`; dependency failures keep their
/// detail in the server logs only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("database error")]
    Database(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// Malformed or incomplete JSON bodies are validation failures and must wear
// the same envelope as in-handler checks, not axum's plain-text 422.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        // A unique-violation on users.email is the backstop for the
        // read-then-insert race; report it as a duplicate, not a 500.
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            return ApiError::Conflict("user already exists".into());
        }
        ApiError::Database(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(m)
            | ApiError::Conflict(m)
            | ApiError::InvalidToken(m)
            | ApiError::Authentication(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ApiError::Database(e) => {
                error!(error = %e, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };
        (status, Json(json!({ "message": message, "success": false }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_structured_body() {
        let res = ApiError::Validation("name, email and password are required".into())
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "name, email and password are required");
    }

    #[tokio::test]
    async fn json_rejection_wears_the_validation_envelope() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        #[derive(serde::Deserialize)]
        #[allow(dead_code)]
        struct Payload {
            name: String,
        }

        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .expect("request");
        let rejection = Json::<Payload>::from_request(req, &())
            .await
            .err()
            .expect("body without required fields must be rejected");

        let err = ApiError::from(rejection);
        assert!(matches!(err, ApiError::Validation(_)));

        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let res = ApiError::Unauthorized("authentication required".into()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dependency_failures_never_leak_detail() {
        let res = ApiError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert_eq!(body["message"], "Something went wrong");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn internal_anyhow_is_masked_too() {
        let res = ApiError::Internal(anyhow::anyhow!("smtp connection refused")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert!(!body["message"]
            .as_str()
            .unwrap()
            .contains("smtp connection refused"));
    }
}
