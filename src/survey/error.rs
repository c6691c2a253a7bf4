//! Survey service error types

use reqwest::StatusCode;
use thiserror::Error;

/// Survey service error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SurveyError {
    pub kind: SurveyErrorKind,
    pub message: String,
}

impl SurveyError {
    pub fn new(kind: SurveyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::Auth, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::InvalidRequest, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::ServerError, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::Decode, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(SurveyErrorKind::Unknown, message)
    }

    /// Classify a non-2xx response
    pub(super) fn from_status(status: StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::auth(format!("Authentication failed: {body}")),
            404 => Self::not_found(format!("Not found: {body}")),
            400 | 422 => Self::invalid_request(format!("Invalid request: {body}")),
            500..=599 => Self::server_error(format!("Server error: {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        }
    }

    /// Classify a failure to get any response at all
    pub(super) fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {e}"))
        } else {
            Self::unknown(format!("Request failed: {e}"))
        }
    }
}

/// Error classification, drives which prompt the user sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyErrorKind {
    /// Unreachable service or timeout
    Network,
    /// Rejected credential (401, 403), usually an expired token
    Auth,
    /// Unknown survey or session (404)
    NotFound,
    /// Bad request (400, 422)
    InvalidRequest,
    /// Server error (5xx)
    ServerError,
    /// Response body did not match the expected shape
    Decode,
    /// Unknown error
    Unknown,
}

impl SurveyErrorKind {
    /// Whether pressing the same button again may succeed
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Network | Self::ServerError)
    }
}
