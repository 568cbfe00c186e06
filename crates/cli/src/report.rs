use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const REPORTS_DIR_NAME: &str = "reports";
pub const RESULTS_FILE_NAME: &str = "test-results.json";

/// One entry in the append-only run log consumed by the dashboard. The
/// pool core never touches this file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub environment: String,
    pub test: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp_unix_ms: u64,
}

impl TestResult {
    pub fn passed(environment: &str, test: &str) -> Self {
        Self {
            environment: environment.to_string(),
            test: test.to_string(),
            status: "passed".to_string(),
            message: None,
            timestamp_unix_ms: 0,
        }
    }

    pub fn failed(environment: &str, test: &str, message: String) -> Self {
        Self {
            environment: environment.to_string(),
            test: test.to_string(),
            status: "failed".to_string(),
            message: Some(message),
            timestamp_unix_ms: 0,
        }
    }
}

#[must_use]
pub fn results_path(data_dir: &Path) -> PathBuf {
    data_dir.join(REPORTS_DIR_NAME).join(RESULTS_FILE_NAME)
}

/// Append one entry, stamping it at append time.
pub async fn append_result(data_dir: &Path, mut result: TestResult) -> Result<()> {
    let path = results_path(data_dir);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut results = read_results(data_dir).await?;
    result.timestamp_unix_ms = unix_now_ms();
    results.push(result);

    let bytes = serde_json::to_vec_pretty(&results)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

/// Entries in append order; an absent log reads as empty.
pub async fn read_results(data_dir: &Path) -> Result<Vec<TestResult>> {
    let path = results_path(data_dir);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

/// Most recent first, the order the dashboard shows.
pub async fn read_results_recent_first(data_dir: &Path) -> Result<Vec<TestResult>> {
    let mut results = read_results(data_dir).await?;
    results.reverse();
    Ok(results)
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|dur| u64::try_from(dur.as_millis()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_preserves_order_and_stamps_entries() {
        let dir = tempfile::TempDir::new().expect("tempdir");

        append_result(dir.path(), TestResult::passed("qa", "exercise"))
            .await
            .expect("first append");
        append_result(
            dir.path(),
            TestResult::failed("dev", "exercise", "pool exhausted".into()),
        )
        .await
        .expect("second append");

        let results = read_results(dir.path()).await.expect("read");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].environment, "qa");
        assert_eq!(results[1].status, "failed");
        assert!(results.iter().all(|r| r.timestamp_unix_ms > 0));

        let recent = read_results_recent_first(dir.path()).await.expect("read");
        assert_eq!(recent[0].environment, "dev");
    }

    #[tokio::test]
    async fn missing_log_reads_as_empty() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let results = read_results(dir.path()).await.expect("read");
        assert!(results.is_empty());
    }
}
