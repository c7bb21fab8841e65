use async_trait::async_trait;
use button_events_core::contract::{DeleteEntry, RawMessage};

/// Capability seam over the message queue. The consume handler fans out over
/// `receive_batch`, the publisher uses `send_event`, and acknowledgement goes
/// through `delete_batch` with at most the backend's per-call entry limit.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// One bounded-size receive call. May return fewer messages than
    /// requested, including none.
    async fn receive_batch(&self, max_messages: usize) -> Result<Vec<RawMessage>, String>;

    /// Delete one chunk of consumed messages.
    async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<(), String>;

    /// Publish one button event as the three named string attributes plus a
    /// human-readable body.
    async fn send_event(
        &self,
        serial_number: &str,
        click_type: &str,
        date_time: &str,
        body: &str,
    ) -> Result<(), String>;
}
