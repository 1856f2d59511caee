//! # Signed Request Auth
//!
//! Stateless HMAC-SHA256 request signing for HTTP APIs.
//!
//! ## Protocol
//!
//! Every protected request carries two headers:
//!
//! ```text
//! X-Credentials: mobile_app.2017-05-14T17:54:16Z.HMAC-SHA256
//! X-Signature:   hex(HMAC-SHA256(secret_key, "GET./book/edit.2017-05-14T17:54:16Z"))
//! ```
//!
//! The server looks up the secret for the public key, checks the timestamp is
//! less than five minutes old, recomputes the digest and compares it in
//! constant time. Nothing is stored between requests.
//!
//! ## Features
//!
//! - Signing primitives and the credential header codec ([`auth`])
//! - A verifier with a typed rejection for every failure ([`AuthVerifier`])
//! - A route guard over `http` request/response types ([`SignatureGuard`])
//! - A client that signs outgoing requests ([`client::SigningClient`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use http::{Request, Response, StatusCode};
//! use signed_request_auth::auth::{ApiClient, SystemClock, sign_now};
//! use signed_request_auth::store::MemoryClientStore;
//! use signed_request_auth::{AuthVerifier, SignatureGuard};
//!
//! let client = ApiClient::new("mobile_app", "$secret$");
//! let store = Arc::new(MemoryClientStore::from_clients([client.clone()]));
//! let guard = SignatureGuard::new(Arc::new(AuthVerifier::new(store)), |_: Request<()>| {
//!     Response::new(String::from("{}"))
//! });
//!
//! let signed = sign_now(&client, "GET", "/book/edit", &SystemClock).unwrap();
//! let request = Request::get("/book/edit")
//!     .header("X-Signature", signed.signature)
//!     .header("X-Credentials", signed.credentials)
//!     .body(())
//!     .unwrap();
//!
//! assert_eq!(guard.handle(request).status(), StatusCode::OK);
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod store;
pub mod verifier;

// Re-export commonly used types at crate root
pub use config::VerifierConfig;
pub use error::{AuthError, ClientError, ConfigError, Rejection, SignError};
pub use guard::SignatureGuard;
pub use store::{ClientSecretStore, MemoryClientStore};
pub use verifier::{AuthVerifier, AuthenticatedIdentity, SignedRequest};

/// Result type alias using AuthError
pub type Result<T> = std::result::Result<T, AuthError>;
