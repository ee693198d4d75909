use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use resizer_core::{HandlerConfig, S3Storage};
use resizer_lambda::{function_handler, ImageTransformHandler};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // CloudWatch 側でタイムスタンプが付くため時刻は出さない
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let config = HandlerConfig::from_env()?;
    tracing::info!(
        variants = config.variants.len(),
        output_bucket = ?config.output_bucket,
        watched_prefixes = ?config.guard.watched_prefixes(),
        concurrency = config.concurrency,
        "configuration loaded"
    );

    let storage = S3Storage::from_env().await;
    let handler = ImageTransformHandler::new(Arc::new(storage), Arc::new(config));

    run(service_fn(|event: LambdaEvent<Value>| function_handler(event, &handler))).await
}
