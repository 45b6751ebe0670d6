//! Problem+json error rendering for the control API.

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::proxy::ProxyError;

/// RFC 7807 problem document.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("https://portway.dev/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            code,
        }
    }
}

/// API error rendered as `application/problem+json`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        let status = StatusCode::BAD_REQUEST;
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        let status = StatusCode::NOT_FOUND;
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        let status = StatusCode::CONFLICT;
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        let message = err.to_string();
        match err {
            ProxyError::AlreadyExists(_) => ApiError::conflict("already_exists", message),
            ProxyError::MappingNotFound(_) => ApiError::not_found("mapping_not_found", message),
            ProxyError::AliasNotFound(_) => ApiError::not_found("alias_not_found", message),
            ProxyError::Bind { .. } => ApiError::bad_request("bind_error", message),
            ProxyError::InvalidAddress(_) => ApiError::bad_request("invalid_address", message),
            // Data-plane errors never surface through the control API
            _ => ApiError::internal("internal_error", message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_mapping() {
        let err: ApiError = ProxyError::AlreadyExists("127.0.0.1:9000".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.problem.code, "already_exists");

        let err: ApiError = ProxyError::MappingNotFound("127.0.0.1:9000".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.problem.code, "mapping_not_found");

        let err: ApiError = ProxyError::Bind {
            addr: "127.0.0.1:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.problem.code, "bind_error");
    }

    #[test]
    fn test_problem_details_shape() {
        let err = ApiError::not_found("alias_not_found", "no alias named backend");
        assert_eq!(err.problem.status, 404);
        assert_eq!(err.problem.title, "Not Found");
        assert!(err.problem.r#type.ends_with("alias_not_found"));
    }
}
