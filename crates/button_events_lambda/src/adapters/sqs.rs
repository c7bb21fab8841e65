use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, MessageAttributeValue};
use button_events_core::contract::{DeleteEntry, RawMessage, MESSAGE_ATTRIBUTE_NAMES};

use crate::adapters::queue::EventQueue;

/// `EventQueue` backed by an SQS queue.
#[derive(Debug, Clone)]
pub struct SqsEventQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsEventQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    fn string_attribute(value: &str) -> Result<MessageAttributeValue, String> {
        MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .map_err(|error| format!("failed to build message attribute: {error}"))
    }
}

#[async_trait]
impl EventQueue for SqsEventQueue {
    async fn receive_batch(&self, max_messages: usize) -> Result<Vec<RawMessage>, String> {
        let mut request = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages as i32);
        for name in MESSAGE_ATTRIBUTE_NAMES {
            request = request.message_attribute_names(name);
        }

        let response = request
            .send()
            .await
            .map_err(|error| format!("failed to receive messages: {error}"))?;

        let messages = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|message| {
                let attributes: HashMap<String, String> = message
                    .message_attributes
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(name, value)| {
                        value.string_value.map(|text| (name, text))
                    })
                    .collect();
                RawMessage {
                    message_id: message.message_id.unwrap_or_default(),
                    receipt_handle: message.receipt_handle.unwrap_or_default(),
                    attributes,
                }
            })
            .collect();

        Ok(messages)
    }

    async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<(), String> {
        let mut batch = Vec::with_capacity(entries.len());
        for entry in entries {
            let request_entry = DeleteMessageBatchRequestEntry::builder()
                .id(&entry.id)
                .receipt_handle(&entry.receipt_handle)
                .build()
                .map_err(|error| format!("failed to build delete entry: {error}"))?;
            batch.push(request_entry);
        }

        self.client
            .delete_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(batch))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to delete message batch: {error}"))
    }

    async fn send_event(
        &self,
        serial_number: &str,
        click_type: &str,
        date_time: &str,
        body: &str,
    ) -> Result<(), String> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_attributes("serialNumber", Self::string_attribute(serial_number)?)
            .message_attributes("clickType", Self::string_attribute(click_type)?)
            .message_attributes("dateTime", Self::string_attribute(date_time)?)
            .message_body(body)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to send message: {error}"))
    }
}
