//! Copy one object within a bucket, carrying the bucket's SSE policy.
//!
//! Startup sequence:
//! 1. Initialise the tracing subscriber.
//! 2. Assemble the secret store from `SSE_ALGORITHM` / `SSE_KEY`.
//! 3. Build the S3 client from the default AWS credential chain.
//! 4. Open the store handle (policy resolution happens here) and copy.
//!
//! Usage: `copy_with_sse <bucket> <source-key> <dest-key>`

use anyhow::{Context, Result};
use sse_store::resolver::{SERVER_SIDE_ENCRYPTION_ALGORITHM, SERVER_SIDE_ENCRYPTION_KEY};
use sse_store::{ConfigSecretStore, SseObjectStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(bucket), Some(source_key), Some(dest_key)) = (args.next(), args.next(), args.next())
    else {
        anyhow::bail!("usage: copy_with_sse <bucket> <source-key> <dest-key>");
    };

    // A real deployment layers files and a credential store here; for the
    // example the two global options come straight from the environment.
    let mut builder = config::Config::builder();
    if let Ok(algorithm) = std::env::var("SSE_ALGORITHM") {
        builder = builder.set_override(SERVER_SIDE_ENCRYPTION_ALGORITHM, algorithm)?;
    }
    if let Ok(key) = std::env::var("SSE_KEY") {
        builder = builder.set_override(SERVER_SIDE_ENCRYPTION_KEY, key)?;
    }
    let settings = builder.build().context("failed to build configuration")?;
    let secret_store = ConfigSecretStore::new(settings);

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_s3::Client::new(&sdk_config);

    let store = SseObjectStore::open(client, bucket, &secret_store)?;
    info!(encryption = %store.secrets(), "resolved policy");

    store.copy_object(&source_key, &dest_key).await?;
    info!("copy complete");
    Ok(())
}
