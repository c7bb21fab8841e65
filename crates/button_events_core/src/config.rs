//! Explicit pipeline configuration, constructed once at startup and passed by
//! reference into each component. Validation happens in full before any
//! component is built.

/// Fetchers launched per consume invocation.
pub const DEFAULT_FETCHER_COUNT: usize = 50;
/// Messages requested per receive call (the queue's per-call maximum).
pub const DEFAULT_RECEIVE_BATCH_SIZE: usize = 10;
/// Entries per delete call (the queue's per-call maximum).
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 10;
/// Fetcher failures tolerated before the fetch phase is reported degraded.
pub const DEFAULT_FETCH_WARN_THRESHOLD: usize = 10;

/// A required setting is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn empty(setting: &str) -> Self {
        Self::new(format!("{setting} cannot be empty"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Connection settings for the warehouse cluster. The password travels
/// separately as a resolved credential, never inside the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub table_name: String,
    pub user: String,
}

impl WarehouseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::empty("warehouse host"));
        }
        if self.database.is_empty() {
            return Err(ConfigError::empty("warehouse database"));
        }
        if self.table_name.is_empty() {
            return Err(ConfigError::empty("warehouse table name"));
        }
        if self.user.is_empty() {
            return Err(ConfigError::empty("warehouse user"));
        }
        Ok(())
    }
}

/// Settings for the consume side: where to drain from, where to load to, and
/// the fan-out limits. The limits default to the queue backend's per-call
/// maximums and are configuration rather than literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub queue_url: String,
    pub warehouse: WarehouseConfig,
    pub fetcher_count: usize,
    pub receive_batch_size: usize,
    pub delete_batch_size: usize,
    pub fetch_warn_threshold: usize,
}

impl ConsumerConfig {
    /// Config with the default fan-out limits.
    pub fn new(queue_url: impl Into<String>, warehouse: WarehouseConfig) -> Self {
        Self {
            queue_url: queue_url.into(),
            warehouse,
            fetcher_count: DEFAULT_FETCHER_COUNT,
            receive_batch_size: DEFAULT_RECEIVE_BATCH_SIZE,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
            fetch_warn_threshold: DEFAULT_FETCH_WARN_THRESHOLD,
        }
    }

    /// Maximum messages one invocation can consume.
    pub fn max_messages_per_invocation(&self) -> usize {
        self.fetcher_count * self.receive_batch_size
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_url.is_empty() {
            return Err(ConfigError::empty("queue URL"));
        }
        if self.fetcher_count == 0 {
            return Err(ConfigError::new("fetcher count must be at least 1"));
        }
        if self.receive_batch_size == 0 {
            return Err(ConfigError::new("receive batch size must be at least 1"));
        }
        if self.delete_batch_size == 0 {
            return Err(ConfigError::new("delete batch size must be at least 1"));
        }
        self.warehouse.validate()
    }
}

/// Settings for the publish side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    pub queue_url: String,
    pub alert_topic_arn: String,
}

impl PublisherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_url.is_empty() {
            return Err(ConfigError::empty("queue URL"));
        }
        if self.alert_topic_arn.is_empty() {
            return Err(ConfigError::empty("alert topic ARN"));
        }
        Ok(())
    }
}
