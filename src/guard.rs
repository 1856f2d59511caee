//! Route guard that only lets signed requests through.
//!
//! [`SignatureGuard`] wraps a handler. Each request is verified first; on
//! success the [`AuthenticatedIdentity`] is attached to the request's
//! extensions and the handler runs, otherwise the rejection is returned
//! without calling it.
//!
//! ```rust
//! use std::sync::Arc;
//! use http::{Request, Response, StatusCode};
//! use signed_request_auth::{AuthVerifier, AuthenticatedIdentity, SignatureGuard};
//! use signed_request_auth::store::MemoryClientStore;
//!
//! let verifier = Arc::new(AuthVerifier::new(Arc::new(MemoryClientStore::new())));
//! let guard = SignatureGuard::new(verifier, |request: Request<()>| {
//!     let identity = request.extensions().get::<AuthenticatedIdentity>();
//!     Response::new(format!("hello {:?}", identity.map(|i| &i.public_key)))
//! });
//!
//! let response = guard.handle(Request::new(()));
//! assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//! ```

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response};
use tracing::{debug, trace};

use crate::error::Rejection;
use crate::verifier::{AuthVerifier, AuthenticatedIdentity};

/// MIME type of rejection bodies.
pub const JSON_MIME_TYPE: &str = "application/json";

impl Rejection {
    /// Render as an HTTP response. Bodies are JSON; empty bodies carry no
    /// content type.
    pub fn into_response(self) -> Response<String> {
        let mut response = Response::new(self.body());
        *response.status_mut() = self.status();
        if self.message().is_some() {
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME_TYPE));
        }
        response
    }
}

/// A handler that requires a valid signature.
#[derive(Clone)]
pub struct SignatureGuard<H> {
    verifier: Arc<AuthVerifier>,
    handler: H,
}

impl<H> SignatureGuard<H> {
    /// Wrap `handler` so it only sees verified requests.
    pub fn new(verifier: Arc<AuthVerifier>, handler: H) -> Self {
        Self { verifier, handler }
    }

    /// The verifier this guard consults.
    pub fn verifier(&self) -> &AuthVerifier {
        &self.verifier
    }

    /// Verify `request` and either delegate to the handler or reject.
    pub fn handle<B>(&self, mut request: Request<B>) -> Response<String>
    where
        H: Fn(Request<B>) -> Response<String>,
    {
        match self.verifier.verify_request(&request) {
            Ok(identity) => {
                trace!(public_key = %identity.public_key, "Signed request authenticated");
                request.extensions_mut().insert::<AuthenticatedIdentity>(identity);
                (self.handler)(request)
            }
            Err(error) => {
                debug!(
                    method = %request.method(),
                    path = request.uri().path(),
                    reason = error.kind(),
                    "Signed request rejected"
                );
                error.rejection().into_response()
            }
        }
    }
}

impl<H> std::fmt::Debug for SignatureGuard<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureGuard")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
