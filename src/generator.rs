//! Continuous random-insert load generator
//!
//! Inserts `{"date", "count", "value"}` records into a sink at a fixed
//! interval until cancelled. The progress writer gets a `Running ` banner,
//! then a `.` every fifth insert. Inserts run on the blocking pool.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::observability::{log_event_with_fields, Event};
use crate::record::Record;
use crate::store::{RecordSink, SourceError, SourceResult};

/// Inserts between progress dots
pub const PROGRESS_EVERY: u64 = 5;

/// Written to the progress writer before the first insert
pub const BANNER: &str = "Running ";

/// Upper bound (inclusive) of the random `value` field
pub const MAX_VALUE: u32 = 9999;

/// Errors that end an insert loop
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Insert failed and the retry budget is spent
    #[error("GENERATOR_INSERT_FAILED: insert {count} failed after {attempts} attempt(s): {source}")]
    Insert {
        count: u64,
        attempts: u32,
        #[source]
        source: SourceError,
    },

    /// Progress output could not be written
    #[error("GENERATOR_PROGRESS_FAILED: {0}")]
    Progress(#[from] std::io::Error),

    /// Blocking insert task panicked or was cancelled
    #[error("GENERATOR_TASK_FAILED: {0}")]
    Task(String),
}

impl GeneratorError {
    pub fn code(&self) -> &'static str {
        match self {
            GeneratorError::Insert { .. } => "GENERATOR_INSERT_FAILED",
            GeneratorError::Progress(_) => "GENERATOR_PROGRESS_FAILED",
            GeneratorError::Task(_) => "GENERATOR_TASK_FAILED",
        }
    }
}

/// Loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub interval: Duration,
    pub write_retries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            write_retries: 0,
        }
    }
}

/// Builds the `count`-th generated record
pub fn random_record<R: Rng + ?Sized>(count: u64, rng: &mut R) -> Record {
    Record::new()
        .with(
            "date",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .with("count", count)
        .with("value", rng.gen_range(0..=MAX_VALUE))
}

/// Random-insert loop bound to one sink and collection
pub struct LoadGenerator {
    sink: Arc<dyn RecordSink>,
    collection: String,
    config: GeneratorConfig,
}

impl LoadGenerator {
    pub fn new(
        sink: Arc<dyn RecordSink>,
        collection: impl Into<String>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            sink,
            collection: collection.into(),
            config,
        }
    }

    /// Inserts until `cancel` fires and returns the number of records
    /// inserted. Cancellation is checked between inserts and during sleeps.
    pub async fn run<W: Write>(
        &self,
        progress: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64, GeneratorError> {
        let interval_ms = self.config.interval.as_millis().to_string();
        log_event_with_fields(
            Event::GeneratorStart,
            &[
                ("collection", &self.collection),
                ("interval_ms", &interval_ms),
            ],
        );

        let result = self.insert_loop(progress, cancel).await;

        let inserted = match &result {
            Ok(count) => count.to_string(),
            Err(GeneratorError::Insert { count, .. }) => (count - 1).to_string(),
            Err(_) => "unknown".to_string(),
        };
        log_event_with_fields(
            Event::GeneratorStop,
            &[("collection", &self.collection), ("inserted", &inserted)],
        );
        result
    }

    async fn insert_loop<W: Write>(
        &self,
        progress: &mut W,
        cancel: &CancellationToken,
    ) -> Result<u64, GeneratorError> {
        progress.write_all(BANNER.as_bytes())?;
        progress.flush()?;

        let mut count = 0u64;
        while !cancel.is_cancelled() {
            let next = count + 1;
            let record = random_record(next, &mut rand::thread_rng());
            if !self.insert_with_retry(next, record, cancel).await? {
                break;
            }
            count = next;

            if count % PROGRESS_EVERY == 0 {
                progress.write_all(b".")?;
                progress.flush()?;
            }

            if !self.pause(cancel).await {
                break;
            }
        }
        Ok(count)
    }

    /// Returns false if cancelled while backing off
    async fn insert_with_retry(
        &self,
        count: u64,
        record: Record,
        cancel: &CancellationToken,
    ) -> Result<bool, GeneratorError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.insert_once(record.clone()).await? {
                Ok(()) => return Ok(true),
                Err(source) if attempt > self.config.write_retries => {
                    return Err(GeneratorError::Insert {
                        count,
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    log_event_with_fields(
                        Event::InsertRetry,
                        &[
                            ("attempt", &attempt.to_string()),
                            ("code", e.code()),
                            ("collection", &self.collection),
                        ],
                    );
                    if !self.pause(cancel).await {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// One insert on the blocking pool; the outer error is the task's
    async fn insert_once(&self, record: Record) -> Result<SourceResult<()>, GeneratorError> {
        let sink = Arc::clone(&self.sink);
        let collection = self.collection.clone();
        tokio::task::spawn_blocking(move || sink.insert(&collection, record))
            .await
            .map_err(|e| GeneratorError::Task(e.to_string()))
    }

    /// Sleeps one interval; false if cancelled first
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.interval) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RecordSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` inserts, then accepts
    struct FlakySink {
        failures: u32,
        calls: AtomicU32,
        inner: MemoryStore,
    }

    impl RecordSink for FlakySink {
        fn insert(&self, collection: &str, record: Record) -> SourceResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(SourceError::io(
                    "append",
                    std::io::Error::from(std::io::ErrorKind::TimedOut),
                ));
            }
            self.inner.insert(collection, record)
        }
    }

    fn fast() -> GeneratorConfig {
        GeneratorConfig {
            interval: Duration::from_millis(1),
            write_retries: 0,
        }
    }

    #[test]
    fn test_random_record_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 1..50 {
            let record = random_record(n, &mut rng);
            assert_eq!(record.get("count").and_then(|v| v.as_u64()), Some(n));
            let value = record.get("value").and_then(|v| v.as_u64()).unwrap();
            assert!(value <= MAX_VALUE as u64);
            let date = record.get("date").and_then(|v| v.as_str()).unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
        }
    }

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let generator = LoadGenerator::new(store.clone(), "records", fast());
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            stopper.cancel();
        });

        let mut progress = Vec::new();
        let inserted = generator.run(&mut progress, &cancel).await.unwrap();

        assert!(inserted > 0);
        let records = store.query("records").unwrap();
        assert_eq!(records.len() as u64, inserted);
        let dots = progress.strip_prefix(BANNER.as_bytes()).unwrap();
        assert_eq!(dots.len() as u64, inserted / PROGRESS_EVERY);
        assert!(dots.iter().all(|b| *b == b'.'));

        let counts: Vec<u64> = records
            .iter()
            .filter_map(|r| r.get("count").and_then(|v| v.as_u64()))
            .collect();
        assert_eq!(counts, (1..=inserted).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_inserts_nothing() {
        let store = Arc::new(MemoryStore::new());
        let generator = LoadGenerator::new(store.clone(), "records", fast());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut progress = Vec::new();
        let inserted = generator.run(&mut progress, &cancel).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(store.count("records").unwrap(), 0);
        assert_eq!(progress, BANNER.as_bytes());
    }

    #[tokio::test]
    async fn test_write_failure_stops_without_retries() {
        let sink = Arc::new(FlakySink {
            failures: 1,
            calls: AtomicU32::new(0),
            inner: MemoryStore::new(),
        });
        let generator = LoadGenerator::new(sink.clone(), "records", fast());

        let err = generator
            .run(&mut std::io::sink(), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            GeneratorError::Insert { count, attempts, .. } => {
                assert_eq!(count, 1);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    /// Panics on every insert
    struct PanickingSink;

    impl RecordSink for PanickingSink {
        fn insert(&self, _collection: &str, _record: Record) -> SourceResult<()> {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_insert_runs_off_the_async_thread() {
        let generator = LoadGenerator::new(Arc::new(PanickingSink), "records", fast());

        // A panic on the blocking pool surfaces as an error, not an unwind
        let err = generator
            .run(&mut std::io::sink(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "GENERATOR_TASK_FAILED");
    }

    #[tokio::test]
    async fn test_retries_recover() {
        let sink = Arc::new(FlakySink {
            failures: 2,
            calls: AtomicU32::new(0),
            inner: MemoryStore::new(),
        });
        let config = GeneratorConfig {
            write_retries: 2,
            ..fast()
        };
        let generator = LoadGenerator::new(sink.clone(), "records", config);
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stopper.cancel();
        });

        let inserted = generator.run(&mut std::io::sink(), &cancel).await.unwrap();
        assert!(inserted > 0);
        assert_eq!(sink.inner.count("records").unwrap() as u64, inserted);
    }
}
