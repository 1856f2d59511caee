use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use signed_request_auth::auth::{ApiClient, ManualClock, X_CREDENTIALS, X_SIGNATURE};
use signed_request_auth::client::SigningClient;
use signed_request_auth::store::MemoryClientStore;
use signed_request_auth::{AuthVerifier, ClientError};

/// Answers the way a guarded route would: 200 with the client's identity, or
/// the verifier's rejection.
struct VerifyingResponder {
    verifier: AuthVerifier,
}

impl Respond for VerifyingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match self
            .verifier
            .verify_headers(&request.method, request.url.path(), &request.headers)
        {
            Ok(identity) => ResponseTemplate::new(200).set_body_json(identity),
            Err(error) => {
                let rejection = error.rejection();
                ResponseTemplate::new(rejection.status().as_u16()).set_body_string(rejection.body())
            }
        }
    }
}

fn registry() -> Arc<MemoryClientStore> {
    Arc::new(MemoryClientStore::from_clients([ApiClient::new(
        "mobile_app",
        "$secret$",
    )]))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn guarded_server(clock: Arc<ManualClock>) -> MockServer {
    init_tracing();
    let server = MockServer::start().await;
    let verifier = AuthVerifier::builder(registry()).clock(clock).build().unwrap();

    Mock::given(path("/book/edit"))
        .respond_with(VerifyingResponder { verifier })
        .mount(&server)
        .await;

    server
}

fn build_client(server: &MockServer, client: ApiClient, clock: Arc<ManualClock>) -> SigningClient {
    SigningClient::builder()
        .base_url(server.uri())
        .credentials(client)
        .clock(clock)
        .max_retries(0)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_signed_get_is_accepted() {
    let clock = Arc::new(ManualClock::starting_now());
    let server = guarded_server(clock.clone()).await;
    let client = build_client(&server, ApiClient::new("mobile_app", "$secret$"), clock);

    let response = client.get("/book/edit").await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "public_key": "mobile_app" }));
}

#[tokio::test]
async fn test_query_string_is_not_signed() {
    let clock = Arc::new(ManualClock::starting_now());
    let server = guarded_server(clock.clone()).await;
    let client = build_client(&server, ApiClient::new("mobile_app", "$secret$"), clock);

    let response = client.get("/book/edit?page=2&sort=title").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let clock = Arc::new(ManualClock::starting_now());
    let server = guarded_server(clock.clone()).await;
    let client = build_client(&server, ApiClient::new("mobile_app", "$SPOOFING$"), clock);

    let response = client.get("/book/edit").await.unwrap();
    assert_eq!(response.status(), 401);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_clock_behind_server_is_expired() {
    let server_clock = Arc::new(ManualClock::starting_now());
    let server = guarded_server(server_clock.clone()).await;

    let client_clock = Arc::new(ManualClock::starting_now());
    client_clock.rewind(Duration::from_secs(10 * 60));
    let client = build_client(&server, ApiClient::new("mobile_app", "$secret$"), client_clock);

    let response = client.get("/book/edit").await.unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "Timestamp Expired. Valid for 5 minutes" })
    );
}

#[tokio::test]
async fn test_headers_reach_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/book"))
        .and(header_exists("x-signature"))
        .and(header_exists("x-credentials"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::starting_now());
    let client = build_client(&server, ApiClient::new("mobile_app", "$secret$"), clock.clone());
    let response = client.post("/book").await.unwrap();
    assert_eq!(response.status(), 200);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.headers[X_SIGNATURE].len(), 64);
    assert!(request.headers[X_CREDENTIALS]
        .to_str()
        .unwrap()
        .starts_with("mobile_app."));

    // The captured request still verifies on its own.
    let verifier = AuthVerifier::builder(registry()).clock(clock).build().unwrap();
    let identity = verifier
        .verify_headers(&request.method, request.url.path(), &request.headers)
        .unwrap();
    assert_eq!(identity.public_key, "mobile_app");
}

#[tokio::test]
async fn test_missing_credentials_fails_before_sending() {
    let server = MockServer::start().await;
    let client = SigningClient::builder()
        .base_url(server.uri())
        .build()
        .unwrap();

    let result = client.get("/book/edit").await;
    assert!(matches!(result, Err(ClientError::MissingCredentials)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
