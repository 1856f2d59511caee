//! HMAC-SHA256 request signatures.
//!
//! A signed request carries two headers:
//!
//! ```text
//! X-Credentials: <public_key>.<timestamp>.<algorithm>
//! X-Signature:   hex(HMAC-SHA256(secret_key, <METHOD>.<path>.<timestamp>))
//! ```
//!
//! The signing string is never transmitted; both sides rebuild it from the
//! request line and the credential timestamp.

use hmac::{Hmac, Mac};
use http::HeaderName;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::{Algorithm, ApiClient, Clock, Credential, FIELD_SEPARATOR, Timestamp};
use crate::error::SignError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex digest.
pub const X_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

/// Header carrying the credential string.
pub const X_CREDENTIALS: HeaderName = HeaderName::from_static("x-credentials");

/// Build the canonical signing string `METHOD.path.timestamp`.
///
/// The method is uppercased; the path is used verbatim and must not include
/// the query string.
pub fn signing_string(method: &str, path: &str, timestamp: Timestamp) -> String {
    format!(
        "{}{FIELD_SEPARATOR}{path}{FIELD_SEPARATOR}{timestamp}",
        method.to_uppercase()
    )
}

/// Compute the lowercase hex HMAC-SHA256 digest of a request.
///
/// # Errors
///
/// Returns [`SignError::InvalidKey`] if the HMAC implementation refuses the
/// key. HMAC-SHA256 accepts keys of any length, including empty ones.
///
/// # Example
///
/// ```rust
/// use signed_request_auth::auth::{Timestamp, compute_digest};
///
/// let timestamp = Timestamp::parse("2017-05-14T17:54:16Z").unwrap();
/// let digest = compute_digest("$secret$", "GET", "/book/edit", timestamp).unwrap();
/// assert_eq!(
///     digest,
///     "7cf0991ea078b63abed2e1b51485719e6aa3ecf4c3118a1c668e77df9fdfb40f"
/// );
/// ```
pub fn compute_digest(
    secret_key: &str,
    method: &str,
    path: &str,
    timestamp: Timestamp,
) -> Result<String, SignError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(signing_string(method, path, timestamp).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare a presented signature with the expected one in constant time.
pub fn digests_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub(crate) fn compute_digest_with(
    secret_key: &SecretString,
    method: &str,
    path: &str,
    timestamp: Timestamp,
) -> Result<String, SignError> {
    compute_digest(secret_key.expose_secret(), method, path, timestamp)
}

/// The two header values of a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `X-Signature`.
    pub signature: String,
    /// Value for `X-Credentials`.
    pub credentials: String,
}

/// Sign a request at an explicit timestamp.
///
/// Returns the digest and the credential string. This is the client-side
/// counterpart of the verifier and carries no authority on its own.
///
/// # Errors
///
/// See [`compute_digest`].
///
/// # Example
///
/// ```rust
/// use signed_request_auth::auth::{Timestamp, sign};
///
/// let timestamp = Timestamp::parse("2017-05-14T17:54:16Z").unwrap();
/// let signed = sign("mobile_app", "$secret$", "post", "/book", timestamp).unwrap();
/// assert_eq!(signed.credentials, "mobile_app.2017-05-14T17:54:16Z.HMAC-SHA256");
/// assert_eq!(signed.signature.len(), 64);
/// ```
pub fn sign(
    public_key: &str,
    secret_key: &str,
    method: &str,
    path: &str,
    timestamp: Timestamp,
) -> Result<SignedHeaders, SignError> {
    Ok(SignedHeaders {
        signature: compute_digest(secret_key, method, path, timestamp)?,
        credentials: Credential::encode(public_key, timestamp, Algorithm::HmacSha256),
    })
}

/// Sign a request with the current time from `clock`.
///
/// # Errors
///
/// See [`compute_digest`].
pub fn sign_now(
    client: &ApiClient,
    method: &str,
    path: &str,
    clock: &dyn Clock,
) -> Result<SignedHeaders, SignError> {
    sign(
        &client.public_key,
        client.expose_secret(),
        method,
        path,
        Timestamp::now(clock),
    )
}
