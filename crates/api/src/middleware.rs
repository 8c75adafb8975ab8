use crate::error::ApiError;
use crate::state::AppState;
use airport_metrics::TracingService;
use airport_models::{AirportError, FieldErrors, User, NON_FIELD_ERRORS};
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_path_to_error::Segment;
use std::time::Instant;

pub const REQUIRED: &str = "This field is required.";

/// The authenticated caller, resolved from `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// An authenticated caller with `is_staff` set.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, AirportError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AirportError::NotAuthenticated)?;
    let value = header.to_str().map_err(|_| AirportError::InvalidToken {
        reason: "Invalid Authorization header".to_string(),
    })?;

    let mut words = value.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        (Some(scheme), None, None) if scheme.eq_ignore_ascii_case("bearer") => {
            Err(AirportError::InvalidToken {
                reason: "No credentials provided".to_string(),
            })
        }
        (Some(scheme), _, _) if scheme.eq_ignore_ascii_case("bearer") => {
            Err(AirportError::InvalidToken {
                reason: "Credentials string should not contain spaces".to_string(),
            })
        }
        // Other schemes are not ours to judge.
        _ => Err(AirportError::NotAuthenticated),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let result = match bearer_token(parts) {
            Ok(token) => state.accounts.authenticate(token).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                if matches!(e, AirportError::InvalidToken { .. }) {
                    state.metrics.record_auth_failure();
                    TracingService::log_auth_failure(&e.to_string());
                }
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AirportError::PermissionDenied.into());
        }
        Ok(StaffUser(user))
    }
}

/// Numeric `:id` path segment. Anything else is a 404, like an unknown id.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let not_found = || AirportError::NotFound {
            resource: "object",
            id: 0,
        };
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;
        let id = raw.parse::<i64>().map_err(|_| not_found())?;
        Ok(ResourceId(id))
    }
}

/// JSON body extractor whose failures render as `AirportError` bodies.
///
/// An empty body reads as `{}` so missing fields are reported per field.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Drops serde_json's trailing " at line X column Y".
fn without_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(index) => &message[..index],
        None => message,
    }
}

pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AirportError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };

    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = field_path(e.path());
        json_error(path, e.into_inner())
    })?;
    deserializer
        .end()
        .map_err(|e| json_error(Vec::new(), e))?;
    Ok(value)
}

/// `tickets[0].row` becomes `["tickets", "0", "row"]`.
fn field_path(path: &serde_path_to_error::Path) -> Vec<String> {
    path.iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Map { key } => Some(key.clone()),
            Segment::Enum { variant } => Some(variant.clone()),
            Segment::Unknown => None,
        })
        .collect()
}

fn json_error(mut path: Vec<String>, error: serde_json::Error) -> AirportError {
    let message = error.to_string();
    let message = without_position(&message);
    if error.classify() != Category::Data {
        return AirportError::Malformed {
            reason: message.to_string(),
        };
    }

    let mut errors = FieldErrors::new();
    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        path.push(field.to_string());
        errors.insert(path.join("."), vec![REQUIRED.to_string()]);
    } else if path.is_empty() || message.starts_with("unknown field") {
        errors.insert(NON_FIELD_ERRORS.to_string(), vec![format!("{message}.")]);
    } else {
        errors.insert(path.join("."), vec![type_error(message)]);
    }
    AirportError::Validation(errors)
}

/// Field message for a value of the wrong type or out of range.
fn type_error(message: &str) -> String {
    let expected = message
        .rsplit_once(", expected ")
        .map(|(_, expected)| expected)
        .unwrap_or_default();
    let bounds = match expected {
        "i32" => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
        "i64" => Some((i64::MIN, i64::MAX)),
        _ => None,
    };

    match (expected, bounds) {
        (_, Some((min, max))) => match message.strip_prefix("invalid value: integer `") {
            Some(rest) if rest.starts_with('-') => {
                format!("Ensure this value is greater than or equal to {min}.")
            }
            Some(_) => format!("Ensure this value is less than or equal to {max}."),
            None => "A valid integer is required.".to_string(),
        },
        ("a string", _) => "Not a valid string.".to_string(),
        ("a boolean", _) => "Must be a valid boolean.".to_string(),
        ("a sequence", _) => "Expected a list of items.".to_string(),
        _ => format!("{message}."),
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AirportError::Malformed {
                reason: e.body_text(),
            })?;

        match content_type {
            Some(content_type) if !is_json(&content_type) => {
                Err(AirportError::UnsupportedMediaType {
                    media_type: content_type,
                }
                .into())
            }
            None if !bytes.is_empty() => Err(AirportError::UnsupportedMediaType {
                media_type: String::new(),
            }
            .into()),
            _ => Ok(ApiJson(parse_json(&bytes)?)),
        }
    }
}

/// Counts every response by method and status.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    state.metrics.record_request(
        &method,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use airport_models::{AirplaneRequest, OrderRequest};

    #[test]
    fn missing_fields_are_reported_per_field() {
        let err = parse_json::<AirplaneRequest>(br#"{"name": "Boeing", "rows": 10, "seats_in_row": 6}"#)
            .unwrap_err();
        match err {
            AirportError::Validation(errors) => {
                assert_eq!(errors["airplane_type"], vec![REQUIRED]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn syntax_errors_are_malformed() {
        let err = parse_json::<AirplaneRequest>(b"{\"name\": ").unwrap_err();
        assert!(matches!(err, AirportError::Malformed { .. }));
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn type_errors_are_keyed_by_field_path() {
        let err = parse_json::<AirplaneRequest>(
            br#"{"name": "Boeing", "rows": "ten", "seats_in_row": 6, "airplane_type": 1}"#,
        )
        .unwrap_err();
        match err {
            AirportError::Validation(errors) => {
                assert_eq!(errors["rows"], vec!["A valid integer is required."]);
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = parse_json::<OrderRequest>(
            br#"{"tickets": [{"row": 1, "seat": 1, "flight": 1}, {"row": 99999999999, "seat": 2, "flight": 1}]}"#,
        )
        .unwrap_err();
        match err {
            AirportError::Validation(errors) => {
                assert_eq!(
                    errors["tickets.1.row"],
                    vec!["Ensure this value is less than or equal to 2147483647."]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_nested_fields_are_keyed_by_path() {
        let err = parse_json::<OrderRequest>(br#"{"tickets": [{"row": 1, "flight": 1}]}"#)
            .unwrap_err();
        match err {
            AirportError::Validation(errors) => {
                assert_eq!(errors["tickets.0.seat"], vec![REQUIRED]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let err = parse_json::<OrderRequest>(br#"{"tickets": []} extra"#).unwrap_err();
        assert!(matches!(err, AirportError::Malformed { .. }));
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let err = parse_json::<AirplaneRequest>(b"").unwrap_err();
        assert!(matches!(err, AirportError::Validation(_)));
    }

    #[test]
    fn json_content_types() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json("multipart/form-data; boundary=x"));
    }
}
