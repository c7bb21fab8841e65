use crate::contract::{FetchResult, RawMessage};

/// All fetchers failed; the fetch phase as a whole is a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub failed_fetchers: usize,
    pub last_error: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "all {} queue fetchers failed, last error: {}",
            self.failed_fetchers, self.last_error
        )
    }
}

impl std::error::Error for FetchError {}

/// How the fetch phase went when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Failures stayed at or below the warn threshold.
    Clean,
    /// More fetchers failed than the warn threshold allows; the caller should
    /// record this for observability. Successful messages are still included.
    Degraded {
        failed_fetchers: usize,
        last_error: String,
    },
}

/// Aggregated outcome of one fan-out fetch phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub messages: Vec<RawMessage>,
    pub disposition: FetchDisposition,
}

/// Fan-in over all fetcher results, in the order they completed.
///
/// Messages from successful fetchers are concatenated as-is; no ordering
/// across fetchers is guaranteed or meaningful. Failure policy is three-tier:
/// every fetcher failed is an error carrying the count and the last error
/// text, more than `warn_threshold` failures is a degraded success, and
/// anything at or below the threshold is a clean success.
pub fn aggregate_fetches(
    results: Vec<FetchResult>,
    warn_threshold: usize,
) -> Result<FetchSummary, FetchError> {
    let total = results.len();
    let mut messages = Vec::new();
    let mut failed = 0usize;
    let mut last_error = String::new();

    for result in results {
        match result {
            Ok(batch) => messages.extend(batch),
            Err(error) => {
                failed += 1;
                last_error = error;
            }
        }
    }

    if total > 0 && failed == total {
        return Err(FetchError {
            failed_fetchers: failed,
            last_error,
        });
    }

    let disposition = if failed > warn_threshold {
        FetchDisposition::Degraded {
            failed_fetchers: failed,
            last_error,
        }
    } else {
        FetchDisposition::Clean
    };

    Ok(FetchSummary {
        messages,
        disposition,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn message(id: &str) -> RawMessage {
        RawMessage {
            message_id: id.to_string(),
            receipt_handle: format!("{id}-receipt"),
            attributes: HashMap::new(),
        }
    }

    fn mixed_results(successes: usize, failures: usize) -> Vec<FetchResult> {
        let mut results: Vec<FetchResult> = Vec::new();
        for i in 0..successes {
            results.push(Ok(vec![message(&format!("m-{i}"))]));
        }
        for i in 0..failures {
            results.push(Err(format!("receive failed ({i})")));
        }
        results
    }

    #[test]
    fn concatenates_all_messages_when_every_fetcher_succeeds() {
        let results: Vec<FetchResult> = vec![
            Ok(vec![message("a"), message("b")]),
            Ok(Vec::new()),
            Ok(vec![message("c")]),
        ];

        let summary = aggregate_fetches(results, 10).expect("aggregation should pass");
        assert_eq!(summary.messages.len(), 3);
        assert_eq!(summary.disposition, FetchDisposition::Clean);
    }

    #[test]
    fn fails_when_every_fetcher_fails() {
        let error = aggregate_fetches(mixed_results(0, 50), 10).expect_err("should fail");
        assert_eq!(error.failed_fetchers, 50);
        assert_eq!(error.last_error, "receive failed (49)");
        assert!(error.to_string().contains("all 50"));
    }

    #[test]
    fn failures_at_the_threshold_stay_clean() {
        let summary = aggregate_fetches(mixed_results(40, 10), 10).expect("should pass");
        assert_eq!(summary.messages.len(), 40);
        assert_eq!(summary.disposition, FetchDisposition::Clean);
    }

    #[test]
    fn failures_above_the_threshold_degrade_but_keep_messages() {
        let summary = aggregate_fetches(mixed_results(39, 11), 10).expect("should pass");
        assert_eq!(summary.messages.len(), 39);
        assert_eq!(
            summary.disposition,
            FetchDisposition::Degraded {
                failed_fetchers: 11,
                last_error: "receive failed (10)".to_string(),
            }
        );
    }

    #[test]
    fn empty_result_set_is_clean() {
        let summary = aggregate_fetches(Vec::new(), 10).expect("should pass");
        assert!(summary.messages.is_empty());
        assert_eq!(summary.disposition, FetchDisposition::Clean);
    }
}
