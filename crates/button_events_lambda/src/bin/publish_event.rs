use button_events_core::config::PublisherConfig;
use button_events_core::contract::PublishSummary;
use button_events_lambda::adapters::notify::SnsAlertNotifier;
use button_events_lambda::adapters::sqs::SqsEventQueue;
use button_events_lambda::handlers::publish::handle_publish;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn required_env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::from(format!("{name} must be configured")))
}

fn publisher_config_from_env() -> Result<PublisherConfig, Error> {
    let config = PublisherConfig {
        queue_url: required_env("SQS_URL")?,
        alert_topic_arn: required_env("SNS_TOPIC")?,
    };
    config
        .validate()
        .map_err(|error| Error::from(error.to_string()))?;
    Ok(config)
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<PublishSummary, Error> {
    let config = publisher_config_from_env()?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let queue = SqsEventQueue::new(
        aws_sdk_sqs::Client::new(&aws_config),
        config.queue_url.clone(),
    );
    let notifier = SnsAlertNotifier::new(
        aws_sdk_sns::Client::new(&aws_config),
        config.alert_topic_arn.clone(),
    );

    handle_publish(event.payload, &queue, &notifier, Utc::now())
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
