//! Verification of signed requests.

use std::sync::Arc;

use http::{HeaderMap, Method, Request};
use serde::Serialize;

use crate::auth::{
    Clock, Credential, SystemClock, Timestamp, TimestampPolicy, X_CREDENTIALS, X_SIGNATURE,
    compute_digest_with, digests_match,
};
use crate::config::VerifierConfig;
use crate::error::{AuthError, ConfigError};
use crate::store::ClientSecretStore;

/// The client a request was verified as coming from.
///
/// Lives only as long as the request it was attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AuthenticatedIdentity {
    /// Public key of the authenticated client.
    pub public_key: String,
}

/// The parts of a request that take part in verification.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    /// HTTP method, any case.
    pub method: &'a str,
    /// Request path without the query string.
    pub path: &'a str,
    /// Value of `X-Signature`, if present.
    pub signature: Option<&'a str>,
    /// Value of `X-Credentials`, if present.
    pub credentials: Option<&'a str>,
}

impl<'a> SignedRequest<'a> {
    /// Pick the signature headers out of a header map.
    ///
    /// Headers that are not valid visible ASCII are treated as absent.
    pub fn from_headers(method: &'a Method, path: &'a str, headers: &'a HeaderMap) -> Self {
        Self {
            method: method.as_str(),
            path,
            signature: header_str(headers, &X_SIGNATURE),
            credentials: header_str(headers, &X_CREDENTIALS),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &http::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Checks signed requests against a client registry and the current time.
///
/// The verifier holds no mutable state; share one instance across all
/// request handlers.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use signed_request_auth::auth::{ApiClient, SystemClock, Timestamp, sign};
/// use signed_request_auth::store::MemoryClientStore;
/// use signed_request_auth::verifier::{AuthVerifier, SignedRequest};
///
/// let store = Arc::new(MemoryClientStore::from_clients([
///     ApiClient::new("mobile_app", "$secret$"),
/// ]));
/// let verifier = AuthVerifier::new(store);
///
/// let timestamp = Timestamp::now(&SystemClock);
/// let signed = sign("mobile_app", "$secret$", "GET", "/book/edit", timestamp).unwrap();
/// let identity = verifier
///     .verify(&SignedRequest {
///         method: "GET",
///         path: "/book/edit",
///         signature: Some(&signed.signature),
///         credentials: Some(&signed.credentials),
///     })
///     .unwrap();
/// assert_eq!(identity.public_key, "mobile_app");
/// ```
#[derive(Clone)]
pub struct AuthVerifier {
    store: Arc<dyn ClientSecretStore>,
    clock: Arc<dyn Clock>,
    policy: TimestampPolicy,
}

impl AuthVerifier {
    /// Create a verifier with the default window and the system clock.
    pub fn new(store: Arc<dyn ClientSecretStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            policy: VerifierConfig::default().policy(),
        }
    }

    /// Create a verifier builder.
    pub fn builder(store: Arc<dyn ClientSecretStore>) -> AuthVerifierBuilder {
        AuthVerifierBuilder::new(store)
    }

    /// The freshness policy in force.
    pub fn policy(&self) -> TimestampPolicy {
        self.policy
    }

    /// Verify a request.
    ///
    /// Steps run in a fixed order and the first failure is returned:
    /// headers present, credentials well formed, client known, timestamp well
    /// formed, timestamp fresh, signature matches.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing step.
    pub fn verify(&self, request: &SignedRequest<'_>) -> Result<AuthenticatedIdentity, AuthError> {
        let (Some(signature), Some(credentials)) = (request.signature, request.credentials) else {
            return Err(AuthError::MissingHeaders);
        };

        let credential = Credential::decode(credentials)?;

        let secret_key = self
            .store
            .lookup(&credential.public_key)
            .ok_or(AuthError::UnknownClient)?;

        let timestamp = Timestamp::parse(&credential.timestamp)?;
        self.policy.check(timestamp, self.clock.now())?;

        let expected = compute_digest_with(&secret_key, request.method, request.path, timestamp)
            .map_err(|_| AuthError::SignatureMismatch)?;
        if !digests_match(signature, &expected) {
            return Err(AuthError::SignatureMismatch);
        }

        Ok(AuthenticatedIdentity {
            public_key: credential.public_key,
        })
    }

    /// Verify from a method, path and header map.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_headers(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.verify(&SignedRequest::from_headers(method, path, headers))
    }

    /// Verify an `http::Request`. The query string is not signed.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_request<B>(
        &self,
        request: &Request<B>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.verify_headers(request.method(), request.uri().path(), request.headers())
    }
}

impl std::fmt::Debug for AuthVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthVerifier")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthVerifier`].
pub struct AuthVerifierBuilder {
    store: Arc<dyn ClientSecretStore>,
    clock: Option<Arc<dyn Clock>>,
    config: VerifierConfig,
}

impl AuthVerifierBuilder {
    /// Create a builder with default settings.
    pub fn new(store: Arc<dyn ClientSecretStore>) -> Self {
        Self {
            store,
            clock: None,
            config: VerifierConfig::default(),
        }
    }

    /// Set the clock freshness is judged against (useful for testing).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Apply a full configuration.
    pub fn config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the freshness window. Checked by [`build`](Self::build).
    pub fn max_age(mut self, max_age: std::time::Duration) -> Self {
        self.config.max_age_secs = max_age.as_secs();
        self
    }

    /// Build the verifier.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the window is not a positive
    /// whole number of minutes.
    pub fn build(self) -> Result<AuthVerifier, ConfigError> {
        self.config.validate()?;
        Ok(AuthVerifier {
            store: self.store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            policy: self.config.policy(),
        })
    }
}
