use async_trait::async_trait;

/// Capability seam over the alert topic used for low-battery warnings.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn publish_alert(&self, subject: &str, body: &str) -> Result<(), String>;
}

/// `AlertNotifier` backed by an SNS topic.
#[derive(Debug, Clone)]
pub struct SnsAlertNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsAlertNotifier {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl AlertNotifier for SnsAlertNotifier {
    async fn publish_alert(&self, subject: &str, body: &str) -> Result<(), String> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to publish alert: {error}"))
    }
}
