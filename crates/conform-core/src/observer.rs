//! Per-file timing hooks.
//!
//! The dispatch and remediation stages report timings to a [`RunObserver`].
//! The default observer discards them; [`TimingLog`] appends them to a plain
//! text file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::classify::Category;

/// Receives timing notifications from concurrently running tasks.
pub trait RunObserver: Send + Sync {
    /// One entry was verified and classified.
    fn entry_classified(&self, _name: &str, _category: Category, _elapsed: Duration) {}

    /// One misclassified entry was copied into `target`.
    fn entry_copied(&self, _name: &str, _target: &Path, _elapsed: Duration) {}

    /// Every entry has been classified.
    fn dispatch_finished(&self, _elapsed: Duration) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Observer writing one line per notification to a timing file.
///
/// ```text
/// Start Time Tracking
/// Processing y_array.json took 0.0031 seconds
/// Copy n_object.json took 0.0002 seconds
/// ```
///
/// Notifications only enqueue a line; a writer task owns the file, so the
/// dispatch and copy tasks never wait on disk I/O.
#[derive(Debug)]
pub struct TimingLog {
    path: PathBuf,
    tx: mpsc::UnboundedSender<Record>,
}

#[derive(Debug)]
enum Record {
    Line(String),
    Flush(oneshot::Sender<io::Result<()>>),
}

impl TimingLog {
    /// Truncate or create `path`, write the header line and start the writer
    /// task on the current runtime.
    pub async fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let mut out = BufWriter::new(File::create(&path).await?);
        out.write_all(b"Start Time Tracking\n").await?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_records(path.clone(), out, rx));
        Ok(Self { path, tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: String) {
        if self.tx.send(Record::Line(line)).is_err() {
            warn!(path = %self.path.display(), "timing log writer has stopped");
        }
    }

    /// Wait until every line recorded so far is on disk.
    ///
    /// Reports the first write error since the previous flush.
    pub async fn flush(&self) -> io::Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(Record::Flush(done))
            .map_err(|_| writer_stopped())?;
        wait.await.map_err(|_| writer_stopped())?
    }
}

fn writer_stopped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "timing log writer has stopped")
}

async fn write_records(
    path: PathBuf,
    mut out: BufWriter<File>,
    mut rx: mpsc::UnboundedReceiver<Record>,
) {
    let mut pending_error: Option<io::Error> = None;

    while let Some(record) = rx.recv().await {
        match record {
            Record::Line(line) => {
                if let Err(e) = out.write_all(line.as_bytes()).await {
                    warn!(path = %path.display(), error = %e, "failed to write timing log");
                    if pending_error.is_none() {
                        pending_error = Some(e);
                    }
                }
            }
            Record::Flush(done) => {
                let result = match pending_error.take() {
                    Some(e) => Err(e),
                    None => out.flush().await,
                };
                let _ = done.send(result);
            }
        }
    }

    if let Err(e) = out.flush().await {
        warn!(path = %path.display(), error = %e, "failed to flush timing log");
    }
}

impl RunObserver for TimingLog {
    fn entry_classified(&self, name: &str, _category: Category, elapsed: Duration) {
        self.append(format!(
            "Processing {} took {:.4} seconds\n",
            name,
            elapsed.as_secs_f64()
        ));
    }

    fn entry_copied(&self, name: &str, _target: &Path, elapsed: Duration) {
        self.append(format!(
            "Copy {} took {:.4} seconds\n",
            name,
            elapsed.as_secs_f64()
        ));
    }

    fn dispatch_finished(&self, elapsed: Duration) {
        self.append(format!(
            "\nTotal processing time for files: {:.4} seconds\n",
            elapsed.as_secs_f64()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_timing_log_format() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("times.txt");

        let log = TimingLog::create(&path).await.unwrap();
        log.entry_classified("y1.json", Category::PassedCorrectly, Duration::from_millis(1500));
        log.entry_copied("n2.json", tmp.path(), Duration::from_millis(2));
        log.dispatch_finished(Duration::from_secs(3));
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "Start Time Tracking");
        assert_eq!(lines[1], "Processing y1.json took 1.5000 seconds");
        assert_eq!(lines[2], "Copy n2.json took 0.0020 seconds");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Total processing time for files: 3.0000 seconds");
    }

    #[tokio::test]
    async fn test_timing_log_recreated_each_run() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("times.txt");
        std::fs::write(&path, "stale\n").unwrap();

        let log = TimingLog::create(&path).await.unwrap();
        assert_eq!(log.path(), path.as_path());
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Start Time Tracking\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_timing_log_collects_lines_from_many_tasks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("times.txt");
        let log = std::sync::Arc::new(TimingLog::create(&path).await.unwrap());

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let log = std::sync::Arc::clone(&log);
            tasks.spawn(async move {
                log.entry_classified(
                    &format!("y{}.json", i),
                    Category::PassedCorrectly,
                    Duration::from_millis(1),
                );
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }
        log.flush().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("Processing ")).count(), 32);
        assert!(content.lines().all(|l| l == "Start Time Tracking" || l.ends_with(" seconds")));
    }

    #[test]
    fn test_noop_observer_accepts_everything() {
        let observer = NoopObserver;
        observer.entry_classified("y1.json", Category::PassedCorrectly, Duration::ZERO);
        observer.dispatch_finished(Duration::ZERO);
    }
}
