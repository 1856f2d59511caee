//! API client keys and the `X-Credentials` header codec.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};

use crate::auth::Timestamp;
use crate::error::AuthError;

/// Separator between the fields of the credential and signing strings.
pub const FIELD_SEPARATOR: char = '.';

/// A registered API client: a public identifier and its shared secret.
#[derive(Clone)]
pub struct ApiClient {
    /// The public key (sent in cleartext with every request)
    pub public_key: String,
    /// The secret key (never transmitted, used as the HMAC key)
    secret_key: SecretString,
}

impl ApiClient {
    /// Create a client from a public key and secret.
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: SecretString::from(secret_key.into()),
        }
    }

    /// Get the secret key for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.secret_key
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Signature algorithms a credential string can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// HMAC with SHA-256, hex encoded.
    #[default]
    HmacSha256,
}

impl Algorithm {
    /// The tag as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            _ => Err(AuthError::MalformedCredentials),
        }
    }
}

/// Decoded `X-Credentials` header: `{publicKey}.{timestamp}.{algorithm}`.
///
/// Decoding only checks the shape. The timestamp is kept as raw text so the
/// verifier can resolve the client before judging the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Client identifier.
    pub public_key: String,
    /// Timestamp text, not yet parsed.
    pub timestamp: String,
    /// Algorithm tag, not yet interpreted.
    pub algorithm: String,
}

impl Credential {
    /// Split a credential string into its three fields.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedCredentials`] unless the string holds
    /// exactly three non-empty dot-separated fields.
    ///
    /// # Example
    ///
    /// ```rust
    /// use signed_request_auth::auth::Credential;
    ///
    /// let credential = Credential::decode("mobile_app.2017-05-14T17:54:16Z.HMAC-SHA256").unwrap();
    /// assert_eq!(credential.public_key, "mobile_app");
    /// assert!(Credential::decode("mobile_app.2017-05-14T17:54:16Z").is_err());
    /// ```
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let mut fields = raw.split(FIELD_SEPARATOR);
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(public_key), Some(timestamp), Some(algorithm), None)
                if !public_key.is_empty() && !timestamp.is_empty() && !algorithm.is_empty() =>
            {
                Ok(Self {
                    public_key: public_key.to_string(),
                    timestamp: timestamp.to_string(),
                    algorithm: algorithm.to_string(),
                })
            }
            _ => Err(AuthError::MalformedCredentials),
        }
    }

    /// Render a credential string for the signing side.
    pub fn encode(public_key: &str, timestamp: Timestamp, algorithm: Algorithm) -> String {
        format!("{public_key}{FIELD_SEPARATOR}{timestamp}{FIELD_SEPARATOR}{algorithm}")
    }
}
