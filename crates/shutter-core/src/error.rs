//! Failure classification shared by every service in the crate.

use std::error::Error;
use std::fmt;

/// What went wrong while talking to the photo API.
///
/// `HttpStatus` keeps the original status code and raw body so callers can
/// inspect what the server actually said; `Decode` and `Network` keep the
/// underlying error as their source.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be constructed locally (bad base URL, missing
    /// credentials, no stored token).
    InvalidRequest(String),
    /// The most recently attempted authorization code was re-submitted
    /// before any exchange succeeded.
    DuplicateRequest,
    /// 2xx response with an empty body where one was required.
    NoData,
    /// Non-2xx response.
    HttpStatus { status: u16, body: String },
    /// The body arrived but did not match the expected shape.
    Decode(serde_json::Error),
    /// Transport-level failure (DNS, connect, TLS, timeout).
    Network(reqwest::Error),
    /// The request was superseded by a newer one and cancelled.
    Cancelled,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            ApiError::DuplicateRequest => write!(f, "duplicate authorization request"),
            ApiError::NoData => write!(f, "empty response body"),
            ApiError::HttpStatus { status, body } => {
                if body.is_empty() {
                    write!(f, "HTTP {status}")
                } else {
                    write!(f, "HTTP {status}: {body}")
                }
            }
            ApiError::Decode(err) => write!(f, "failed to decode response: {err}"),
            ApiError::Network(err) => write!(f, "network failure: {err}"),
            ApiError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Decode(err) => Some(err),
            ApiError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err)
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: HTTP errors render the status and preserve the raw body.
    #[test]
    fn test_http_status_display() {
        let err = ApiError::HttpStatus {
            status: 403,
            body: "Rate Limit Exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 403: Rate Limit Exceeded");

        let bare = ApiError::HttpStatus {
            status: 500,
            body: String::new(),
        };
        assert_eq!(bare.to_string(), "HTTP 500");
    }

    /// Test: decode errors keep the serde error as their source.
    #[test]
    fn test_decode_source() {
        let serde_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ApiError::from(serde_err);
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to decode response"));
    }

    /// Test: the local-failure variants have no source.
    #[test]
    fn test_local_variants() {
        assert!(ApiError::DuplicateRequest.source().is_none());
        assert!(ApiError::NoData.source().is_none());
        assert!(ApiError::Cancelled.source().is_none());
        assert_eq!(
            ApiError::InvalidRequest("no stored token".to_string()).to_string(),
            "invalid request: no stored token"
        );
    }
}
