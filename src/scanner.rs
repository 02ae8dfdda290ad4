use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::metrics::SubkeyMetrics;
use crate::parse::parse_entity;
use crate::types::ValidityCounts;
use crate::validity::evaluate;

/// Outcome of a single pass over the key directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files whose counts were published, in processing order.
    pub published: Vec<String>,
    /// Files skipped because they could not be read or parsed.
    pub failed: Vec<String>,
}

/// Periodically evaluates every key file in a directory and publishes the
/// counts to [`SubkeyMetrics`].
///
/// # Example
///
/// ```no_run
/// # async fn example() -> gpg_subkey_exporter::Result<()> {
/// use std::time::Duration;
/// use gpg_subkey_exporter::{Scanner, SubkeyMetrics};
///
/// let metrics = SubkeyMetrics::new()?;
/// let scanner = Scanner::new("/dev/shm/gpg", metrics.clone());
/// tokio::spawn(async move { scanner.run(Duration::from_secs(15)).await });
/// # Ok(())
/// # }
/// ```
pub struct Scanner {
    keys_dir: PathBuf,
    metrics: SubkeyMetrics,
}

impl Scanner {
    pub fn new(keys_dir: impl Into<PathBuf>, metrics: SubkeyMetrics) -> Self {
        Self {
            keys_dir: keys_dir.into(),
            metrics,
        }
    }

    /// Scans the key directory forever, once per `period`.
    ///
    /// The first scan starts immediately. A scan that outlasts `period`
    /// delays the next one rather than overlapping it.
    pub async fn run(&self, period: Duration) {
        info!(
            keys_dir = %self.keys_dir.display(),
            interval_secs = period.as_secs(),
            "watching key directory"
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.scan_once().await {
                Ok(report) => debug!(
                    published = report.published.len(),
                    failed = report.failed.len(),
                    "key directory scanned"
                ),
                Err(err) => error!(error = %err, "key directory scan failed"),
            }
        }
    }

    /// Runs one pass over the key directory.
    ///
    /// Files are processed one at a time, sorted by name. Subdirectories
    /// are skipped. A file that cannot be read or parsed is logged and left
    /// out of this pass; its previously published gauges are kept. If the
    /// directory itself cannot be listed no gauge is touched.
    pub async fn scan_once(&self) -> Result<ScanReport> {
        let files = self.list_files().await?;
        let mut report = ScanReport::default();

        for (name, path) in files {
            match evaluate_file(&path).await {
                Ok(counts) => {
                    self.metrics.publish(&name, &counts);
                    debug!(
                        file = %name,
                        current = counts.current,
                        one_week = counts.one_week,
                        two_weeks = counts.two_weeks,
                        "published subkey counts"
                    );
                    report.published.push(name);
                }
                Err(err) => {
                    error!(file = %name, error = %err, "skipping key file");
                    report.failed.push(name);
                }
            }
        }

        Ok(report)
    }

    async fn list_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let read_dir_error = |source| Error::ReadDir {
            path: self.keys_dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.keys_dir)
            .await
            .map_err(read_dir_error)?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
            let path = entry.path();
            // Follows symlinks, so a link to a directory is skipped too.
            if let Ok(metadata) = tokio::fs::metadata(&path).await
                && metadata.is_dir()
            {
                debug!(path = %path.display(), "skipping directory");
                continue;
            }
            files.push((entry.file_name().to_string_lossy().into_owned(), path));
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }
}

async fn evaluate_file(path: &Path) -> Result<ValidityCounts> {
    let bytes = tokio::fs::read(path).await.map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let entity = parse_entity(&bytes)?;
    Ok(evaluate(&entity))
}
