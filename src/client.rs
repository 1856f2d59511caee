//! HTTP client that signs every request it sends.

use std::sync::Arc;

use http::Method;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use reqwest_tracing::TracingMiddleware;
use tracing::debug;
use url::Url;

use crate::auth::{ApiClient, Clock, SystemClock, X_CREDENTIALS, X_SIGNATURE, sign_now};
use crate::error::ClientError;

/// Default base URL, for a service on the local machine.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// An HTTP client that attaches `X-Credentials` and `X-Signature` headers.
///
/// The signature covers the method, the path of the final URL (without its
/// query string) and the time of the call, so a request built here must be
/// sent within the server's freshness window.
///
/// # Example
///
/// ```rust,no_run
/// use signed_request_auth::auth::ApiClient;
/// use signed_request_auth::client::SigningClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SigningClient::builder()
///         .base_url("http://127.0.0.1:8080")
///         .credentials(ApiClient::new("mobile_app", "$secret$"))
///         .build()?;
///
///     let response = client.get("/book/edit").await?;
///     println!("Status: {}", response.status());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SigningClient {
    http_client: ClientWithMiddleware,
    base_url: Url,
    credentials: Option<Arc<ApiClient>>,
    clock: Arc<dyn Clock>,
}

impl SigningClient {
    /// Create a new client builder.
    pub fn builder() -> SigningClientBuilder {
        SigningClientBuilder::new()
    }

    /// The base URL request paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Prepare a signed request.
    ///
    /// # Errors
    ///
    /// Fails if no credentials are configured, the path does not form a valid
    /// URL, the key cannot be used for signing, or the signed values are not
    /// valid header values.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ClientError::MissingCredentials)?;

        let url = self.base_url.join(path)?;
        let signed = sign_now(credentials, method.as_str(), url.path(), self.clock.as_ref())?;

        debug!(
            method = %method,
            path = url.path(),
            public_key = %credentials.public_key,
            "Signing request"
        );

        Ok(self
            .http_client
            .request(method, url)
            .header(X_SIGNATURE, HeaderValue::from_str(&signed.signature)?)
            .header(X_CREDENTIALS, HeaderValue::from_str(&signed.credentials)?))
    }

    /// Send a signed request with no body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request); also fails on transport errors.
    pub async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, ClientError> {
        Ok(self.request(method, path)?.send().await?)
    }

    /// Send a signed GET request.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.send(Method::GET, path).await
    }

    /// Send a signed POST request with no body.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        self.send(Method::POST, path).await
    }
}

impl std::fmt::Debug for SigningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

/// Builder for [`SigningClient`].
pub struct SigningClientBuilder {
    base_url: String,
    credentials: Option<Arc<ApiClient>>,
    clock: Option<Arc<dyn Clock>>,
    user_agent: Option<String>,
    max_retries: u32,
}

impl SigningClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: None,
            clock: None,
            user_agent: None,
            max_retries: 3,
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API client keys requests are signed with.
    pub fn credentials(mut self, credentials: ApiClient) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Set the clock used to timestamp signatures.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Url`] if the base URL cannot be parsed.
    pub fn build(self) -> Result<SigningClient, ClientError> {
        let base_url = Url::parse(&self.base_url)?;

        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("signed-request-auth/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("signed-request-auth"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(SigningClient {
            http_client,
            base_url,
            credentials: self.credentials,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

impl Default for SigningClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
