use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// A single named sub-task for [`parallel_exec`]. Boxed so a node can hand
/// in a heterogeneous batch (one future per analyst, one per data source).
pub type ParallelTask = Pin<Box<dyn Future<Output = serde_json::Value> + Send>>;

/// Runs named sub-tasks concurrently, each under its own `timeout`, and
/// collects a mapping of results. Used by nodes that advertise
/// `parallel = true` instead of running their sub-work sequentially.
/// A sub-task is expected to fail soft internally (never return an error
/// future); the only failure this primitive itself reports is a timeout.
pub async fn parallel_exec(
    tasks: Vec<(String, ParallelTask)>,
    timeout: Duration,
) -> HashMap<String, Result<serde_json::Value, Elapsed>> {
    let handles: Vec<_> = tasks
        .into_iter()
        .map(|(name, fut)| tokio::spawn(async move { (name, tokio::time::timeout(timeout, fut).await) }))
        .collect();

    let mut out = HashMap::new();
    for handle in handles {
        match handle.await {
            Ok((name, result)) => {
                out.insert(name, result);
            }
            Err(e) => {
                tracing::warn!(error = %e, "parallel sub-task panicked; dropped from results");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn all_tasks_complete_within_timeout() {
        let tasks: Vec<(String, ParallelTask)> = vec![
            ("fast".to_string(), Box::pin(async { serde_json::json!(1) })),
            ("slow".to_string(), Box::pin(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                serde_json::json!(2)
            })),
        ];
        let results = parallel_exec(tasks, Duration::from_secs(5)).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results["fast"].as_ref().unwrap(), &serde_json::json!(1));
        assert_eq!(results["slow"].as_ref().unwrap(), &serde_json::json!(2));
    }

    #[tokio::test(start_paused = true)]
    async fn a_task_exceeding_timeout_reports_elapsed() {
        let tasks: Vec<(String, ParallelTask)> = vec![("hangs".to_string(), Box::pin(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            serde_json::json!("never")
        }))];
        let results = parallel_exec(tasks, Duration::from_millis(50)).await;
        assert!(results["hangs"].is_err());
    }
}
