use std::sync::Arc;
use std::time::Duration;

use http::{Method, Request, Response, StatusCode};

use signed_request_auth::auth::{ApiClient, Clock, ManualClock, Timestamp, sign};
use signed_request_auth::store::MemoryClientStore;
use signed_request_auth::{AuthVerifier, AuthenticatedIdentity, SignatureGuard};

const PUBLIC_KEY: &str = "mobile_app";
const SECRET_KEY: &str = "$secret$";

type Handler = fn(Request<()>) -> Response<String>;

/// A small book API: `GET /book` is public, `POST /book` and
/// `GET /book/edit` require a signature.
struct BookApi {
    guarded: SignatureGuard<Handler>,
    clock: Arc<ManualClock>,
}

fn json_ok(request: Request<()>) -> Response<String> {
    let body = match request.extensions().get::<AuthenticatedIdentity>() {
        Some(identity) => serde_json::json!({ "client": identity.public_key }).to_string(),
        None => "{}".to_string(),
    };
    Response::new(body)
}

impl BookApi {
    fn new() -> Self {
        let store = Arc::new(MemoryClientStore::from_clients([ApiClient::new(
            PUBLIC_KEY, SECRET_KEY,
        )]));
        let clock = Arc::new(ManualClock::starting_now());
        let verifier = AuthVerifier::builder(store).clock(clock.clone()).build().unwrap();
        let verifier = Arc::new(verifier);
        Self {
            guarded: SignatureGuard::new(verifier, json_ok as Handler),
            clock,
        }
    }

    fn handle(&self, request: Request<()>) -> Response<String> {
        match (request.method(), request.uri().path()) {
            (&Method::GET, "/book") => json_ok(request),
            (&Method::POST, "/book") | (&Method::GET, "/book/edit") => self.guarded.handle(request),
            _ => {
                let mut response = Response::new("{}".to_string());
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::now(&*self.clock)
    }
}

fn request(method: Method, path: &str, headers: &[(&str, &str)]) -> Request<()> {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(()).unwrap()
}

fn error_body(response: &Response<String>) -> serde_json::Value {
    serde_json::from_str(response.body()).unwrap()
}

#[test]
fn test_not_auth_required_get() {
    let api = BookApi::new();
    let response = api.handle(request(Method::GET, "/book", &[]));
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_auth_required_get_works_correctly() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "GET", "/book/edit", api.now()).unwrap();
    let response = api.handle(request(
        Method::GET,
        "/book/edit",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(error_body(&response), serde_json::json!({ "client": "mobile_app" }));
}

#[test]
fn test_auth_required_post_works_correctly() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "POST", "/book", api.now()).unwrap();
    let response = api.handle(request(
        Method::POST,
        "/book",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_auth_required_get_without_sending_headers_fails() {
    let api = BookApi::new();
    let response = api.handle(request(Method::GET, "/book/edit", &[]));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.body().is_empty());
}

#[test]
fn test_auth_required_missing_header_fails() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "POST", "/book", api.now()).unwrap();
    let response = api.handle(request(
        Method::POST,
        "/book",
        &[("X-Credentials", signed.credentials.as_str())],
    ));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_auth_required_wrong_credentials_format_fails() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "POST", "/book", api.now()).unwrap();
    let parts: Vec<&str> = signed.credentials.split('.').collect();

    let shapes = [
        format!("{}.{}", parts[0], parts[1]),
        format!("{}.extra", signed.credentials),
        ".".to_string(),
        String::new(),
    ];
    for credentials in &shapes {
        let response = api.handle(request(
            Method::POST,
            "/book",
            &[("X-Signature", signed.signature.as_str()), ("X-Credentials", credentials.as_str())],
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(&response),
            serde_json::json!({ "error": "Wrong Format for Credentials" })
        );
    }
}

#[test]
fn test_auth_required_wrong_timestamp_format_fails() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "POST", "/book", api.now()).unwrap();
    let parts: Vec<&str> = signed.credentials.split('.').collect();
    let credentials = format!("{}.INVALID.{}", parts[0], parts[2]);

    let response = api.handle(request(
        Method::POST,
        "/book",
        &[("X-Signature", signed.signature.as_str()), ("X-Credentials", credentials.as_str())],
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(&response), serde_json::json!({ "error": "Invalid Timestamp" }));
}

#[test]
fn test_auth_required_expired_timestamp_fails() {
    let api = BookApi::new();
    let ten_minutes_ago =
        Timestamp::from_datetime(api.clock.now() - time::Duration::minutes(10));
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "POST", "/book", ten_minutes_ago).unwrap();

    let response = api.handle(request(
        Method::POST,
        "/book",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(&response),
        serde_json::json!({ "error": "Timestamp Expired. Valid for 5 minutes" })
    );
}

#[test]
fn test_auth_required_wrong_public_key_fails() {
    let api = BookApi::new();
    let signed = sign("INVALID", SECRET_KEY, "POST", "/book", api.now()).unwrap();
    let response = api.handle(request(
        Method::POST,
        "/book",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.body().is_empty());
}

#[test]
fn test_auth_required_spoofed_secret_key() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, "$SPOOFING$", "POST", "/book", api.now()).unwrap();
    let response = api.handle(request(
        Method::POST,
        "/book",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.body().is_empty());
}

#[test]
fn test_replay_after_window_and_tampered_signature() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "GET", "/book/edit", api.now()).unwrap();
    let send = |signature: &str| {
        api.handle(request(
            Method::GET,
            "/book/edit",
            &[("X-Signature", signature), ("X-Credentials", signed.credentials.as_str())],
        ))
    };

    assert_eq!(send(&signed.signature).status(), StatusCode::OK);

    let mut tampered = signed.signature.clone().into_bytes();
    tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(tampered).unwrap();
    assert_eq!(send(&tampered).status(), StatusCode::UNAUTHORIZED);

    api.clock.advance(Duration::from_secs(10 * 60));
    let response = send(&signed.signature);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(&response),
        serde_json::json!({ "error": "Timestamp Expired. Valid for 5 minutes" })
    );
}

#[test]
fn test_signature_is_bound_to_route() {
    let api = BookApi::new();
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "GET", "/book/edit", api.now()).unwrap();
    let response = api.handle(request(
        Method::POST,
        "/book",
        &[
            ("X-Signature", signed.signature.as_str()),
            ("X-Credentials", signed.credentials.as_str()),
        ],
    ));
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
fn test_concurrent_verification() {
    let api = Arc::new(BookApi::new());
    let signed = sign(PUBLIC_KEY, SECRET_KEY, "GET", "/book/edit", api.now()).unwrap();
    let mut handles = vec![];

    for _ in 0..4 {
        let api = api.clone();
        let signed = signed.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..100 {
                let response = api.handle(request(
                    Method::GET,
                    "/book/edit",
                    &[
                        ("X-Signature", signed.signature.as_str()),
                        ("X-Credentials", signed.credentials.as_str()),
                    ],
                ));
                assert_eq!(response.status(), StatusCode::OK);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_verifier_is_shareable() {
    assert_send_sync::<AuthVerifier>();
    assert_send_sync::<SignatureGuard<Handler>>();
}
