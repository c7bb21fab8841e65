use button_events_core::battery::{is_low_voltage, parse_voltage_mv};
use button_events_core::contract::{ButtonEvent, PublishSummary};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::adapters::notify::AlertNotifier;
use crate::adapters::queue::EventQueue;

/// Timestamp format the warehouse expects for the dateTime attribute.
pub const WAREHOUSE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A hard error that aborts the publish invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError {
    message: String,
}

impl PublishError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PublishError {}

/// One publish invocation: stamp the event with the current time, send it to
/// the queue as the three named attributes, then decode the battery reading
/// and raise a low-voltage alert when it falls below the threshold.
pub async fn handle_publish(
    payload: Value,
    queue: &dyn EventQueue,
    notifier: &dyn AlertNotifier,
    now: DateTime<Utc>,
) -> Result<PublishSummary, PublishError> {
    let event: ButtonEvent = serde_json::from_value(payload)
        .map_err(|error| PublishError::new(format!("malformed button event: {error}")))?;

    let date_time = now.format(WAREHOUSE_TIME_FORMAT).to_string();
    let body = format!(
        "Message from ({}) with clickType ({})",
        event.serial_number, event.click_type
    );
    queue
        .send_event(&event.serial_number, &event.click_type, &date_time, &body)
        .await
        .map_err(PublishError::new)?;
    info!(
        "published event from serialNumber ({})",
        event.serial_number
    );

    let millivolts = parse_voltage_mv(&event.battery_voltage)
        .map_err(|error| PublishError::new(error.to_string()))?;
    let low_battery = is_low_voltage(millivolts);
    if low_battery {
        let subject = format!(
            "WARNING: IoT Button ({}) has low voltage",
            event.serial_number
        );
        let alert_body = format!(
            "Low voltage has been detected on IoT Button ({}).\n\nCurrent voltage: {}",
            event.serial_number, event.battery_voltage
        );
        notifier
            .publish_alert(&subject, &alert_body)
            .await
            .map_err(PublishError::new)?;
    }

    Ok(PublishSummary {
        status: "Message sent to queue".to_string(),
        low_battery_alert: low_battery,
    })
}
