use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Message attribute carrying the button serial number.
pub const ATTR_SERIAL_NUMBER: &str = "serialNumber";
/// Message attribute carrying the click type.
pub const ATTR_CLICK_TYPE: &str = "clickType";
/// Message attribute carrying the event timestamp.
pub const ATTR_DATE_TIME: &str = "dateTime";

/// The attribute names every receive call requests from the queue.
pub const MESSAGE_ATTRIBUTE_NAMES: [&str; 3] =
    [ATTR_SERIAL_NUMBER, ATTR_CLICK_TYPE, ATTR_DATE_TIME];

/// One message as handed over by the queue: an opaque handle id, the receipt
/// token needed to delete it, and its named string attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub attributes: HashMap<String, String>,
}

impl RawMessage {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The (handle id, receipt token) pair used to acknowledge this message,
    /// copied regardless of whether the message parses.
    pub fn delete_entry(&self) -> DeleteEntry {
        DeleteEntry {
            id: self.message_id.clone(),
            receipt_handle: self.receipt_handle.clone(),
        }
    }
}

/// Result of one fetcher task: zero or more messages, or an error.
pub type FetchResult = Result<Vec<RawMessage>, String>;

/// Acknowledgement handle for one consumed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub id: String,
    pub receipt_handle: String,
}

/// A warehouse row derived from a message that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub id: String,
    pub date_time: String,
    pub serial_number: String,
    pub click_code: i32,
}

/// Incoming publisher payload, as sent by the button integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonEvent {
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    #[serde(rename = "clickType")]
    pub click_type: String,
    #[serde(rename = "batteryVoltage")]
    pub battery_voltage: String,
}

/// Consumer invocation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub status: String,
    pub messages_consumed: usize,
    pub rows_loaded: usize,
}

impl ConsumeSummary {
    /// Summary for an invocation that found the queue empty.
    pub fn empty_queue() -> Self {
        Self {
            status: "No new messages on queue".to_string(),
            messages_consumed: 0,
            rows_loaded: 0,
        }
    }
}

/// Publisher invocation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishSummary {
    pub status: String,
    pub low_battery_alert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str) -> RawMessage {
        RawMessage {
            message_id: id.to_string(),
            receipt_handle: format!("{id}-receipt"),
            attributes: HashMap::from([(ATTR_SERIAL_NUMBER.to_string(), "SN-1".to_string())]),
        }
    }

    #[test]
    fn delete_entry_copies_handle_and_receipt() {
        let entry = message("m-1").delete_entry();
        assert_eq!(entry.id, "m-1");
        assert_eq!(entry.receipt_handle, "m-1-receipt");
    }

    #[test]
    fn button_event_uses_wire_field_names() {
        let event: ButtonEvent = serde_json::from_str(
            r#"{"serialNumber":"SN-7","clickType":"SINGLE","batteryVoltage":"1604mv"}"#,
        )
        .expect("event should parse");

        assert_eq!(event.serial_number, "SN-7");
        assert_eq!(event.click_type, "SINGLE");
        assert_eq!(event.battery_voltage, "1604mv");
    }
}
