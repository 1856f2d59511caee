//! Error types for request signing and verification.

use http::StatusCode;
use thiserror::Error;

/// Reasons a signed request is rejected by the verifier.
///
/// Each variant corresponds to one step of the verification pipeline, in the
/// order the steps run. Malformed input maps to `400 Bad Request` with a
/// message; everything that would reveal whether a public key is registered
/// maps to a bare `401 Unauthorized`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// `X-Signature` or `X-Credentials` is absent.
    #[error("missing signature or credentials header")]
    MissingHeaders,

    /// The credential string is not `{publicKey}.{timestamp}.{algorithm}`.
    #[error("Wrong Format for Credentials")]
    MalformedCredentials,

    /// No secret is registered for the public key.
    #[error("unknown client")]
    UnknownClient,

    /// The timestamp field does not match `YYYY-MM-DDTHH:MM:SSZ`.
    #[error("Invalid Timestamp")]
    MalformedTimestamp,

    /// The timestamp is outside the freshness window.
    #[error("Timestamp Expired. Valid for {max_age_minutes} minutes")]
    ExpiredTimestamp {
        /// Width of the freshness window, in whole minutes.
        max_age_minutes: u64,
    },

    /// The recomputed digest differs from `X-Signature`.
    #[error("signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    /// HTTP status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedCredentials | Self::MalformedTimestamp | Self::ExpiredTimestamp { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::MissingHeaders | Self::UnknownClient | Self::SignatureMismatch => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    /// Short, stable name of the variant, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingHeaders => "missing_headers",
            Self::MalformedCredentials => "malformed_credentials",
            Self::UnknownClient => "unknown_client",
            Self::MalformedTimestamp => "malformed_timestamp",
            Self::ExpiredTimestamp { .. } => "expired_timestamp",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }

    /// The externally visible outcome for this error.
    ///
    /// Authentication failures carry no message so a caller cannot tell an
    /// unknown client from a bad signature.
    pub fn rejection(&self) -> Rejection {
        let status = self.status();
        if status == StatusCode::BAD_REQUEST {
            Rejection::new(status, Some(self.to_string()))
        } else {
            Rejection::new(status, None)
        }
    }
}

/// A rejected request as the client sees it: a status and an optional message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    status: StatusCode,
    message: Option<String>,
}

impl Rejection {
    /// Create a rejection from a status and optional message.
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// HTTP status of the rejection.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error message, if the rejection carries one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Response body: `{"error": <message>}`, or empty when there is no message.
    pub fn body(&self) -> String {
        match &self.message {
            Some(message) => serde_json::json!({ "error": message }).to_string(),
            None => String::new(),
        }
    }
}

impl From<AuthError> for Rejection {
    fn from(error: AuthError) -> Self {
        error.rejection()
    }
}

/// Errors raised by the signing HTTP client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// Base URL or request path could not be parsed
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// A signed header value is not a valid HTTP header value
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The request could not be signed
    #[error(transparent)]
    Signing(#[from] SignError),

    /// No API credentials were configured on the client
    #[error("Missing credentials: public and secret key required for signed requests")]
    MissingCredentials,
}

/// Errors producing a signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    /// The secret key was refused by the HMAC implementation
    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Errors loading verifier configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration variable holds an unusable value
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Name of the variable
        var: String,
        /// The rejected value
        value: String,
    },
}
