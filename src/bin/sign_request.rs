//! Print the headers for a signed request, for building test fixtures.
//!
//! ```text
//! sign-request mobile_app '$secret$' GET /book/edit
//! sign-request mobile_app '$secret$' POST /book --timestamp 2017-05-14T17:54:16Z
//! ```

use clap::Parser;
use signed_request_auth::auth::{SystemClock, Timestamp, sign};

/// Sign a request with a public/secret key pair.
#[derive(Parser, Debug)]
#[command(name = "sign-request", version, about)]
struct Arguments {
    /// Public key
    public_key: String,

    /// Secret key
    secret_key: String,

    /// HTTP method
    method: String,

    /// Request path, without query string
    path: String,

    /// Sign at this time (YYYY-MM-DDTHH:MM:SSZ) instead of now
    #[arg(short, long)]
    timestamp: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Arguments::parse();

    let timestamp = match args.timestamp.as_deref() {
        Some(text) => Timestamp::parse(text)
            .map_err(|e| anyhow::anyhow!("{e}: expected YYYY-MM-DDTHH:MM:SSZ, got {text:?}"))?,
        None => Timestamp::now(&SystemClock),
    };

    tracing::debug!(%timestamp, method = %args.method, path = %args.path, "Signing fixture");

    let signed = sign(
        &args.public_key,
        &args.secret_key,
        &args.method,
        &args.path,
        timestamp,
    )?;
    println!("Credentials: \"{}\"", signed.credentials);
    println!("Signature: \"{}\"", signed.signature);

    Ok(())
}
