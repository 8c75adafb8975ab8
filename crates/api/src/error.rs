use airport_models::AirportError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Handler error: an `AirportError` rendered as its HTTP status and body.
#[derive(Debug)]
pub struct ApiError(pub AirportError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AirportError> for ApiError {
    fn from(error: AirportError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error_type = self.0.error_type(), "Request failed: {}", self.0);
        }

        let mut response = (status, Json(self.0.to_error_shape())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"api\""),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_map_to_500_without_challenge() {
        let response = ApiError(AirportError::DatabaseError {
            reason: "connection refused".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ApiError(AirportError::NotAuthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            "Bearer realm=\"api\""
        );
    }

    #[test]
    fn unsupported_media_type_is_415() {
        let response = ApiError(AirportError::UnsupportedMediaType {
            media_type: "text/plain".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
