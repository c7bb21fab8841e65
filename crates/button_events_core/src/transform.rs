use uuid::Uuid;

use crate::click::click_code;
use crate::contract::{
    DeleteEntry, ParsedRow, RawMessage, ATTR_CLICK_TYPE, ATTR_DATE_TIME, ATTR_SERIAL_NUMBER,
};

/// Source of fresh row identifiers. Ids must be unique within one batch.
pub trait RowIdSource {
    fn next_row_id(&mut self) -> Result<String, String>;
}

/// Default id source backed by random v4 uuids.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRowIdSource;

impl RowIdSource for UuidRowIdSource {
    fn next_row_id(&mut self) -> Result<String, String> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Why a message produced no row. The message is still acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingAttribute { attribute: &'static str },
    UnknownClickType { click_type: String },
    IdGeneration { click_code: i32, error: String },
}

/// One message that was consumed but yielded no row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSkip {
    pub serial_number: String,
    pub reason: SkipReason,
}

impl std::fmt::Display for TransformSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            SkipReason::MissingAttribute { attribute } => write!(
                f,
                "message from serialNumber ({}) is missing attribute ({attribute})",
                self.serial_number
            ),
            SkipReason::UnknownClickType { click_type } => write!(
                f,
                "unsupported clickType ({click_type}) received from serialNumber ({})",
                self.serial_number
            ),
            SkipReason::IdGeneration { click_code, error } => write!(
                f,
                "could not generate id for serialNumber ({}) with state ({click_code}): {error}",
                self.serial_number
            ),
        }
    }
}

/// Rows and acknowledgement entries produced by one transform pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub rows: Vec<ParsedRow>,
    pub deletes: Vec<DeleteEntry>,
    pub skips: Vec<TransformSkip>,
}

/// Validate and convert every message independently. This stage never fails
/// the batch: a message that cannot be converted is recorded as a skip, and
/// its delete entry is emitted regardless, because the policy is to always
/// drain the queue of the messages we already took.
pub fn transform_messages(
    messages: &[RawMessage],
    ids: &mut dyn RowIdSource,
) -> TransformOutcome {
    let mut rows = Vec::with_capacity(messages.len());
    let mut deletes = Vec::with_capacity(messages.len());
    let mut skips = Vec::new();

    for message in messages {
        deletes.push(message.delete_entry());

        let serial_number = match message.attribute(ATTR_SERIAL_NUMBER) {
            Some(value) => value.to_string(),
            None => {
                skips.push(TransformSkip {
                    serial_number: String::new(),
                    reason: SkipReason::MissingAttribute {
                        attribute: ATTR_SERIAL_NUMBER,
                    },
                });
                continue;
            }
        };

        let Some(date_time) = message.attribute(ATTR_DATE_TIME) else {
            skips.push(TransformSkip {
                serial_number,
                reason: SkipReason::MissingAttribute {
                    attribute: ATTR_DATE_TIME,
                },
            });
            continue;
        };

        let Some(click_type) = message.attribute(ATTR_CLICK_TYPE) else {
            skips.push(TransformSkip {
                serial_number,
                reason: SkipReason::MissingAttribute {
                    attribute: ATTR_CLICK_TYPE,
                },
            });
            continue;
        };

        let Some(code) = click_code(click_type) else {
            skips.push(TransformSkip {
                serial_number,
                reason: SkipReason::UnknownClickType {
                    click_type: click_type.to_string(),
                },
            });
            continue;
        };

        let id = match ids.next_row_id() {
            Ok(value) => value,
            Err(error) => {
                skips.push(TransformSkip {
                    serial_number,
                    reason: SkipReason::IdGeneration {
                        click_code: code,
                        error,
                    },
                });
                continue;
            }
        };

        rows.push(ParsedRow {
            id,
            date_time: date_time.to_string(),
            serial_number,
            click_code: code,
        });
    }

    TransformOutcome {
        rows,
        deletes,
        skips,
    }
}
