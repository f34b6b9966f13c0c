//! Error types for the API client.
//!
//! # Design
//! Every failure surfaces synchronously as one `ApiError`. Local construction
//! problems (bad base URL, oversized batch, unserializable payload) never
//! reach the network. Non-2xx responses become `ApiError::Http`, which keeps
//! the numeric status so callers can branch on it (404, 429, ...) and run
//! their own retry policy. Nothing here is retried or swallowed.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL could not be parsed or does not use http/https.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The request is absent, unbound, or carries invalid parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// More items than the API accepts in one request.
    #[error("batch of {len} exceeds the limit of {max} items per request")]
    BatchTooLarge { len: usize, max: usize },

    #[error("rate limit must be at least one request per second")]
    InvalidRateLimit,

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// A configuration value is present but unusable.
    #[error("invalid configuration {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("cannot marshal body: {0}")]
    Serialization(String),

    /// The server could not be reached.
    #[error("HTTP request failure on {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A 2xx response body is not valid JSON for the expected shape.
    #[error("JSON decode failed on {url}:\n{body}\nerror: {message}")]
    Deserialization {
        url: String,
        body: String,
        message: String,
    },

    #[error("field is not date time")]
    NotDateTime,

    #[error("cannot parse date time: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}

/// A non-2xx response, with the vendor's explanation of the status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status {status}, err: HTTP request failure on {url}:\n{status}\n{explanation}\n\nBody: {body}")]
pub struct HttpError {
    pub status: u16,
    pub url: String,
    pub explanation: &'static str,
    pub body: String,
}

impl HttpError {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            explanation: status_explanation(status),
            body: body.into(),
        }
    }
}

/// Human-readable meaning of the status codes the API documents.
pub fn status_explanation(status: u16) -> &'static str {
    match status {
        400 => "The request encoding is invalid; the request can't be parsed as a valid JSON.",
        401 => "Accessing a protected resource without authorization or with invalid credentials.",
        402 => "The account associated with the API key making requests hits a quota that can be increased by upgrading the account plan.",
        403 => "Accessing a protected resource with API credentials that don't have access to that resource.",
        404 => "Route or resource is not found. This error is returned when the request hits an undefined route, or if the resource doesn't exist (e.g. has been deleted).",
        413 => "Too Large The request exceeded the maximum allowed payload size. You shouldn't encounter this under normal use.",
        422 => "The request data is invalid. This includes most of the base-specific validations. You will receive a detailed error message and code pointing to the exact issue.",
        500 => "Error The server encountered an unexpected condition.",
        502 => "The servers are restarting or an unexpected outage is in progress. You should generally not receive this error, and requests are safe to retry.",
        503 => "The server could not process your request in time. The server could be temporarily unavailable, or it could have timed out processing your request. You should retry the request with backoffs.",
        _ => "Unknown status text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_carries_status_explanation_and_body() {
        let err = HttpError::new(400, "/v0/app/tbl", "body");
        let expected = "status 400, err: HTTP request failure on /v0/app/tbl:\n400\n\
The request encoding is invalid; the request can't be parsed as a valid JSON.\n\nBody: body";
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn every_documented_status_has_its_own_explanation() {
        let table = [
            (400, "The request encoding is invalid"),
            (401, "Accessing a protected resource without authorization"),
            (402, "The account associated with the API key making requests hits a quota"),
            (403, "Accessing a protected resource with API credentials that don't have access"),
            (404, "Route or resource is not found."),
            (413, "Too Large The request exceeded the maximum allowed payload size."),
            (422, "The request data is invalid."),
            (500, "Error The server encountered an unexpected condition."),
            (502, "The servers are restarting or an unexpected outage is in progress."),
            (503, "The server could not process your request in time."),
        ];
        for (status, prefix) in table {
            let explanation = status_explanation(status);
            assert!(explanation.starts_with(prefix), "{status}: {explanation}");
            assert_eq!(HttpError::new(status, "u", "").explanation, explanation);
        }
    }

    #[test]
    fn unmapped_status_gets_generic_text() {
        assert_eq!(status_explanation(418), "Unknown status text");
        assert_eq!(status_explanation(429), "Unknown status text");
    }

    #[test]
    fn status_code_only_for_http_errors() {
        let http: ApiError = HttpError::new(404, "u", "").into();
        assert_eq!(http.status_code(), Some(404));
        assert!(http.is_not_found());
        assert!(!http.is_rate_limited());

        let local = ApiError::InvalidRequest("nope".to_string());
        assert_eq!(local.status_code(), None);
        assert!(!local.is_not_found());
    }

    #[test]
    fn rate_limited_is_429() {
        let err: ApiError = HttpError::new(429, "u", "").into();
        assert!(err.is_rate_limited());
    }
}
