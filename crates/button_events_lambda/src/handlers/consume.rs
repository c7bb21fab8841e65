use std::sync::Arc;

use button_events_core::aggregate::{aggregate_fetches, FetchDisposition, FetchError, FetchSummary};
use button_events_core::chunking::plan_delete_batches;
use button_events_core::config::ConsumerConfig;
use button_events_core::contract::{ConsumeSummary, DeleteEntry, FetchResult};
use button_events_core::insert::build_insert_statement;
use button_events_core::transform::{transform_messages, RowIdSource, TransformOutcome};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::adapters::queue::EventQueue;
use crate::adapters::warehouse::WarehouseLoader;

/// Every delete chunk failed; nothing was acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckError {
    pub failed_batches: usize,
    pub last_error: String,
}

impl std::fmt::Display for AckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "all {} delete batches failed, last error: {}",
            self.failed_batches, self.last_error
        )
    }
}

impl std::error::Error for AckError {}

/// A hard error that aborts the consume invocation. Transform issues never
/// appear here; they are always soft.
#[derive(Debug)]
pub enum ConsumeError {
    Fetch(FetchError),
    Load(String),
    Ack(AckError),
}

impl std::fmt::Display for ConsumeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsumeError::Fetch(error) => write!(f, "fetch failed: {error}"),
            ConsumeError::Load(error) => write!(f, "warehouse load failed: {error}"),
            ConsumeError::Ack(error) => write!(f, "acknowledge failed: {error}"),
        }
    }
}

impl std::error::Error for ConsumeError {}

/// Launch the configured number of fetchers concurrently, each issuing one
/// bounded-size receive call, and join all of them before classifying the
/// phase. A fetcher that panics counts as a failed fetcher.
pub async fn fetch_all(
    config: &ConsumerConfig,
    queue: &Arc<dyn EventQueue>,
) -> Result<FetchSummary, FetchError> {
    let mut fetchers = JoinSet::new();
    for _ in 0..config.fetcher_count {
        let queue = Arc::clone(queue);
        let max_messages = config.receive_batch_size;
        fetchers.spawn(async move { queue.receive_batch(max_messages).await });
    }

    let mut results: Vec<FetchResult> = Vec::with_capacity(config.fetcher_count);
    while let Some(joined) = fetchers.join_next().await {
        results.push(joined.unwrap_or_else(|error| Err(format!("fetcher task failed: {error}"))));
    }

    aggregate_fetches(results, config.fetch_warn_threshold)
}

/// Chunk the acknowledgement entries to the backend's per-call limit and
/// delete the chunks concurrently, best-effort: failed chunks are logged and
/// the rest keep going. Fails only when every chunk failed.
pub async fn delete_all(
    config: &ConsumerConfig,
    queue: &Arc<dyn EventQueue>,
    entries: Vec<DeleteEntry>,
) -> Result<(), AckError> {
    let batches = plan_delete_batches(&entries, config.delete_batch_size);
    if batches.is_empty() {
        return Ok(());
    }

    let total_batches = batches.len();
    let mut deleters = JoinSet::new();
    for batch in batches {
        let queue = Arc::clone(queue);
        deleters.spawn(async move { queue.delete_batch(&batch).await });
    }

    let mut failed = 0usize;
    let mut last_error = String::new();
    while let Some(joined) = deleters.join_next().await {
        let result = joined.unwrap_or_else(|error| Err(format!("delete task failed: {error}")));
        if let Err(error) = result {
            warn!("could not delete a batch of queue messages: {error}");
            failed += 1;
            last_error = error;
        }
    }

    if failed == total_batches {
        return Err(AckError {
            failed_batches: failed,
            last_error,
        });
    }
    Ok(())
}

/// One consume invocation: fetch, transform, load, acknowledge.
///
/// Transform never aborts the batch; every consumed message is acknowledged
/// whether or not it produced a row. A load failure aborts before any delete
/// is issued, leaving the messages to the queue's redelivery policy.
pub async fn handle_consume(
    config: &ConsumerConfig,
    queue: &Arc<dyn EventQueue>,
    loader: &dyn WarehouseLoader,
    ids: &mut dyn RowIdSource,
) -> Result<ConsumeSummary, ConsumeError> {
    let summary = fetch_all(config, queue).await.map_err(ConsumeError::Fetch)?;
    if let FetchDisposition::Degraded {
        failed_fetchers,
        last_error,
    } = &summary.disposition
    {
        warn!(
            "{failed_fetchers} of {} queue fetchers failed, last error: {last_error}",
            config.fetcher_count
        );
    }
    info!("consumed {} messages from queue", summary.messages.len());

    if summary.messages.is_empty() {
        return Ok(ConsumeSummary::empty_queue());
    }

    let TransformOutcome {
        rows,
        deletes,
        skips,
    } = transform_messages(&summary.messages, ids);
    for skip in &skips {
        warn!("{skip}");
    }

    // A batch where nothing parsed still gets acknowledged; there is no
    // statement worth sending for it.
    if !rows.is_empty() {
        let statement = build_insert_statement(&config.warehouse.table_name, &rows);
        loader
            .execute(&statement)
            .await
            .map_err(ConsumeError::Load)?;
    }

    let messages_consumed = deletes.len();
    let rows_loaded = rows.len();
    delete_all(config, queue, deletes)
        .await
        .map_err(ConsumeError::Ack)?;

    Ok(ConsumeSummary {
        status: "Messages pushed to warehouse".to_string(),
        messages_consumed,
        rows_loaded,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use button_events_core::config::WarehouseConfig;
    use button_events_core::contract::{
        RawMessage, ATTR_CLICK_TYPE, ATTR_DATE_TIME, ATTR_SERIAL_NUMBER,
    };
    use button_events_core::transform::UuidRowIdSource;

    use super::*;

    struct StubQueue {
        receive_results: Mutex<VecDeque<Result<Vec<RawMessage>, String>>>,
        delete_results: Mutex<VecDeque<Result<(), String>>>,
        deleted_batches: Mutex<Vec<Vec<DeleteEntry>>>,
    }

    impl StubQueue {
        fn new(receive_results: Vec<Result<Vec<RawMessage>, String>>) -> Self {
            Self {
                receive_results: Mutex::new(receive_results.into()),
                delete_results: Mutex::new(VecDeque::new()),
                deleted_batches: Mutex::new(Vec::new()),
            }
        }

        fn with_delete_results(self, results: Vec<Result<(), String>>) -> Self {
            *self.delete_results.lock().expect("poisoned mutex") = results.into();
            self
        }

        fn deleted_batches(&self) -> Vec<Vec<DeleteEntry>> {
            self.deleted_batches.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl EventQueue for StubQueue {
        async fn receive_batch(&self, _max_messages: usize) -> Result<Vec<RawMessage>, String> {
            self.receive_results
                .lock()
                .expect("poisoned mutex")
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn delete_batch(&self, entries: &[DeleteEntry]) -> Result<(), String> {
            self.deleted_batches
                .lock()
                .expect("poisoned mutex")
                .push(entries.to_vec());
            self.delete_results
                .lock()
                .expect("poisoned mutex")
                .pop_front()
                .unwrap_or(Ok(()))
        }

        async fn send_event(
            &self,
            _serial_number: &str,
            _click_type: &str,
            _date_time: &str,
            _body: &str,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    struct StubLoader {
        statements: Mutex<Vec<String>>,
        error: Option<String>,
    }

    impl StubLoader {
        fn new() -> Self {
            Self {
                statements: Mutex::new(Vec::new()),
                error: None,
            }
        }

        fn failing(error: &str) -> Self {
            Self {
                statements: Mutex::new(Vec::new()),
                error: Some(error.to_string()),
            }
        }

        fn statements(&self) -> Vec<String> {
            self.statements.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl WarehouseLoader for StubLoader {
        async fn execute(&self, statement: &str) -> Result<(), String> {
            self.statements
                .lock()
                .expect("poisoned mutex")
                .push(statement.to_string());
            match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }

    fn test_config(fetcher_count: usize) -> ConsumerConfig {
        let mut config = ConsumerConfig::new(
            "https://queue.example/q",
            WarehouseConfig {
                host: "cluster.example.internal".to_string(),
                port: 5439,
                database: "events".to_string(),
                table_name: "button_clicks".to_string(),
                user: "loader".to_string(),
            },
        );
        config.fetcher_count = fetcher_count;
        config
    }

    fn message(id: &str, serial: &str, click_type: &str) -> RawMessage {
        RawMessage {
            message_id: id.to_string(),
            receipt_handle: format!("{id}-receipt"),
            attributes: HashMap::from([
                (ATTR_SERIAL_NUMBER.to_string(), serial.to_string()),
                (ATTR_CLICK_TYPE.to_string(), click_type.to_string()),
                (
                    ATTR_DATE_TIME.to_string(),
                    "2018-03-04 10:11:12.000000".to_string(),
                ),
            ]),
        }
    }

    fn entries(count: usize) -> Vec<DeleteEntry> {
        (0..count)
            .map(|i| DeleteEntry {
                id: format!("m-{i}"),
                receipt_handle: format!("m-{i}-receipt"),
            })
            .collect()
    }

    #[tokio::test]
    async fn fetch_all_collects_messages_from_every_fetcher() {
        let config = test_config(3);
        let queue: Arc<dyn EventQueue> = Arc::new(StubQueue::new(vec![
            Ok(vec![message("m-1", "SN-1", "SINGLE"), message("m-2", "SN-2", "LONG")]),
            Ok(Vec::new()),
            Ok(vec![message("m-3", "SN-3", "DOUBLE")]),
        ]));

        let summary = fetch_all(&config, &queue).await.expect("fetch should pass");
        assert_eq!(summary.messages.len(), 3);
        assert_eq!(summary.disposition, FetchDisposition::Clean);
    }

    #[tokio::test]
    async fn fetch_all_keeps_partial_results_when_some_fetchers_fail() {
        let config = test_config(3);
        let queue: Arc<dyn EventQueue> = Arc::new(StubQueue::new(vec![
            Err("connection reset".to_string()),
            Ok(vec![message("m-1", "SN-1", "SINGLE")]),
            Err("connection reset".to_string()),
        ]));

        let summary = fetch_all(&config, &queue).await.expect("fetch should pass");
        assert_eq!(summary.messages.len(), 1);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_every_fetcher_fails() {
        let config = test_config(3);
        let queue: Arc<dyn EventQueue> = Arc::new(StubQueue::new(vec![
            Err("connection reset (1)".to_string()),
            Err("connection reset (2)".to_string()),
            Err("connection reset (3)".to_string()),
        ]));

        let error = fetch_all(&config, &queue).await.expect_err("should fail");
        assert_eq!(error.failed_fetchers, 3);
        assert!(error.last_error.contains("connection reset"));
    }

    #[tokio::test]
    async fn delete_all_issues_one_call_per_chunk() {
        let config = test_config(1);
        let stub = Arc::new(StubQueue::new(Vec::new()));
        let queue: Arc<dyn EventQueue> = stub.clone();

        delete_all(&config, &queue, entries(25))
            .await
            .expect("delete should pass");

        let mut sizes: Vec<usize> = stub.deleted_batches().iter().map(Vec::len).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn delete_all_tolerates_partial_chunk_failure() {
        let config = test_config(1);
        let stub = Arc::new(
            StubQueue::new(Vec::new())
                .with_delete_results(vec![Err("delete refused".to_string()), Ok(())]),
        );
        let queue: Arc<dyn EventQueue> = stub.clone();

        delete_all(&config, &queue, entries(20))
            .await
            .expect("partial failure should not fail the step");
        assert_eq!(stub.deleted_batches().len(), 2);
    }

    #[tokio::test]
    async fn delete_all_fails_when_every_chunk_fails() {
        let config = test_config(1);
        let stub = Arc::new(StubQueue::new(Vec::new()).with_delete_results(vec![
            Err("delete refused (1)".to_string()),
            Err("delete refused (2)".to_string()),
        ]));
        let queue: Arc<dyn EventQueue> = stub.clone();

        let error = delete_all(&config, &queue, entries(20))
            .await
            .expect_err("should fail");
        assert_eq!(error.failed_batches, 2);
        assert!(error.to_string().contains("all 2 delete batches failed"));
    }

    #[tokio::test]
    async fn handle_consume_short_circuits_on_empty_queue() {
        let config = test_config(3);
        let stub = Arc::new(StubQueue::new(Vec::new()));
        let queue: Arc<dyn EventQueue> = stub.clone();
        let loader = StubLoader::new();

        let summary = handle_consume(&config, &queue, &loader, &mut UuidRowIdSource)
            .await
            .expect("should pass");

        assert_eq!(summary, ConsumeSummary::empty_queue());
        assert!(loader.statements().is_empty());
        assert!(stub.deleted_batches().is_empty());
    }

    #[tokio::test]
    async fn handle_consume_loads_rows_and_acknowledges_everything() {
        let config = test_config(1);
        let stub = Arc::new(StubQueue::new(vec![Ok(vec![
            message("m-1", "SN-1", "SINGLE"),
            message("m-2", "SN-2", "UNKNOWN"),
            message("m-3", "SN-3", "LONG"),
        ])]));
        let queue: Arc<dyn EventQueue> = stub.clone();
        let loader = StubLoader::new();

        let summary = handle_consume(&config, &queue, &loader, &mut UuidRowIdSource)
            .await
            .expect("should pass");

        assert_eq!(summary.messages_consumed, 3);
        assert_eq!(summary.rows_loaded, 2);

        let statements = loader.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("INSERT INTO button_clicks VALUES "));
        assert!(statements[0].contains("'SN-1'"));
        assert!(!statements[0].contains("'SN-2'"));

        let deleted: usize = stub.deleted_batches().iter().map(Vec::len).sum();
        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn handle_consume_leaves_messages_undeleted_on_load_failure() {
        let config = test_config(1);
        let stub = Arc::new(StubQueue::new(vec![Ok(vec![message(
            "m-1", "SN-1", "SINGLE",
        )])]));
        let queue: Arc<dyn EventQueue> = stub.clone();
        let loader = StubLoader::failing("cluster unavailable");

        let error = handle_consume(&config, &queue, &loader, &mut UuidRowIdSource)
            .await
            .expect_err("should fail");

        assert!(matches!(error, ConsumeError::Load(_)));
        assert!(stub.deleted_batches().is_empty());
    }

    #[tokio::test]
    async fn handle_consume_acknowledges_a_batch_where_nothing_parsed() {
        let config = test_config(1);
        let stub = Arc::new(StubQueue::new(vec![Ok(vec![
            message("m-1", "SN-1", "UNKNOWN"),
            message("m-2", "SN-2", "UNKNOWN"),
        ])]));
        let queue: Arc<dyn EventQueue> = stub.clone();
        let loader = StubLoader::new();

        let summary = handle_consume(&config, &queue, &loader, &mut UuidRowIdSource)
            .await
            .expect("should pass");

        assert_eq!(summary.messages_consumed, 2);
        assert_eq!(summary.rows_loaded, 0);
        assert!(loader.statements().is_empty());
        let deleted: usize = stub.deleted_batches().iter().map(Vec::len).sum();
        assert_eq!(deleted, 2);
    }
}
