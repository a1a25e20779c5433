//! Per-action call accounting for the API client
//!
//! Every attempt made by [`crate::ApiClient::call`] is recorded under its
//! action name, failures also under their error code, so retry logs can say
//! how often an action has been failing and why.

use crate::error::SdkError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStats {
    pub calls: u64,
    pub failures: u64,
    /// Consecutive failures since the last success
    pub failure_streak: u64,
    pub failures_by_code: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default)]
pub struct CallStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub last_request: Option<Instant>,
    pub actions: BTreeMap<String, ActionStats>,
}

impl CallStats {
    pub fn action(&self, action: &str) -> Option<&ActionStats> {
        self.actions.get(action)
    }

    /// Failures with exactly `code` across all actions
    pub fn failures_with_code(&self, code: &str) -> u64 {
        self.actions
            .values()
            .filter_map(|a| a.failures_by_code.get(code))
            .sum()
    }
}

#[derive(Clone, Default)]
pub struct CallRecorder {
    stats: Arc<RwLock<CallStats>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempt of `action`, returning its failure streak
    pub async fn record(&self, action: &str, result: Result<(), &SdkError>) -> u64 {
        let mut stats = self.stats.write().await;
        stats.total_requests += 1;
        stats.last_request = Some(Instant::now());
        if result.is_err() {
            stats.failed_requests += 1;
        }

        let entry = stats.actions.entry(action.to_string()).or_default();
        entry.calls += 1;
        match result {
            Ok(()) => entry.failure_streak = 0,
            Err(err) => {
                entry.failures += 1;
                entry.failure_streak += 1;
                *entry.failures_by_code.entry(err.code.clone()).or_default() += 1;
            }
        }
        entry.failure_streak
    }

    pub async fn snapshot(&self) -> CallStats {
        self.stats.read().await.clone()
    }
}
