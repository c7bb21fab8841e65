use std::sync::Arc;

use button_events_core::config::{ConsumerConfig, WarehouseConfig};
use button_events_core::contract::ConsumeSummary;
use button_events_core::transform::UuidRowIdSource;
use button_events_lambda::adapters::queue::EventQueue;
use button_events_lambda::adapters::secrets::{KmsSecretResolver, SecretResolver};
use button_events_lambda::adapters::sqs::SqsEventQueue;
use button_events_lambda::adapters::warehouse::RedshiftLoader;
use button_events_lambda::handlers::consume::handle_consume;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::from(format!("{name} must be configured")))
}

fn consumer_config_from_env() -> Result<ConsumerConfig, Error> {
    let port = required_env("REDSHIFT_PORT")?
        .parse::<u16>()
        .map_err(|error| Error::from(format!("REDSHIFT_PORT is not a valid port: {error}")))?;

    let warehouse = WarehouseConfig {
        host: required_env("REDSHIFT_HOST")?,
        port,
        database: required_env("REDSHIFT_DB")?,
        table_name: required_env("REDSHIFT_TABLE_NAME")?,
        user: required_env("REDSHIFT_USERNAME")?,
    };

    let config = ConsumerConfig::new(required_env("SQS_URL")?, warehouse);
    config
        .validate()
        .map_err(|error| Error::from(error.to_string()))?;
    Ok(config)
}

async fn handle_request(_event: LambdaEvent<Value>) -> Result<ConsumeSummary, Error> {
    let config = consumer_config_from_env()?;
    let encrypted_password = required_env("REDSHIFT_PASSWORD")?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let credential = KmsSecretResolver::new(aws_sdk_kms::Client::new(&aws_config))
        .resolve(&encrypted_password)
        .await
        .map_err(Error::from)?;

    let queue: Arc<dyn EventQueue> = Arc::new(SqsEventQueue::new(
        aws_sdk_sqs::Client::new(&aws_config),
        config.queue_url.clone(),
    ));
    let loader = RedshiftLoader::new(config.warehouse.clone(), credential);
    let mut ids = UuidRowIdSource;

    handle_consume(&config, &queue, &loader, &mut ids)
        .await
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    lambda_runtime::run(service_fn(handle_request)).await
}
