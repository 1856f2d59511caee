//! Request signing primitives.
//!
//! This module provides:
//! - API client keys with secure secret storage
//! - The `X-Credentials` header codec
//! - Timestamps, clocks and the freshness window for replay protection
//! - HMAC-SHA256 digest computation for signed requests

mod credentials;
mod signature;
mod timestamp;

pub use credentials::{Algorithm, ApiClient, Credential, FIELD_SEPARATOR};
pub use signature::{
    SignedHeaders, X_CREDENTIALS, X_SIGNATURE, compute_digest, digests_match, sign, sign_now,
    signing_string,
};
pub use timestamp::{Clock, DEFAULT_MAX_AGE, ManualClock, SystemClock, Timestamp, TimestampPolicy};

pub(crate) use signature::compute_digest_with;
