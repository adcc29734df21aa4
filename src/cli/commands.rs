//! CLI command implementations
//!
//! Each binary loads its config, opens the store it needs and hands it to
//! the runner or generator. Ctrl-C cancels the work through a token.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::generator::LoadGenerator;
use crate::mot::mot_facets;
use crate::observability::Logger;
use crate::runner::{AggregationRunner, Report};
use crate::store::{FileStore, RecordSink, RecordSource};

use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{finish_progress, print_report};

/// Run the MOT facets against the configured collection
pub async fn aggregate(config: &Config, cancel: &CancellationToken) -> CliResult<Report> {
    let store = FileStore::open(config.data_path(), &config.database)?;
    let source: Arc<dyn RecordSource> = Arc::new(store);
    let facets = mot_facets(config.include_makes)?;

    let mut runner = AggregationRunner::new();
    if let Some(deadline) = config.deadline() {
        runner = runner.with_deadline(deadline);
    }

    Ok(runner
        .run(source, &config.collection, &facets, cancel)
        .await?)
}

/// Insert random records into the configured collection until cancelled.
/// Returns the number of records inserted.
pub async fn insert<W: io::Write>(
    config: &Config,
    progress: &mut W,
    cancel: &CancellationToken,
) -> CliResult<u64> {
    let store = FileStore::open(config.data_path(), &config.insert_database)?;
    let sink: Arc<dyn RecordSink> = Arc::new(store);
    let generator = LoadGenerator::new(
        sink,
        config.insert_collection.clone(),
        config.generator_config(),
    );

    let inserted = generator.run(progress, cancel).await;
    finish_progress(progress)?;
    Ok(inserted?)
}

/// `mot-facets` entry point
pub fn mot_facets_command(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let report = block_on_cancellable(|cancel| async move { aggregate(&config, &cancel).await })?;
    print_report(&report)
}

/// `random-inserts` entry point
pub fn random_inserts_command(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let inserted = block_on_cancellable(|cancel| async move {
        insert(&config, &mut io::stdout(), &cancel).await
    })?;
    Logger::info("INSERTS_FINISHED", &[("inserted", &inserted.to_string())]);
    Ok(())
}

/// Runs `work` on a fresh runtime with a token that Ctrl-C cancels
fn block_on_cancellable<F, Fut, T>(work: F) -> CliResult<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = CliResult<T>>,
{
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                Logger::info("INTERRUPT_RECEIVED", &[]);
                on_signal.cancel();
            }
        });
        work(cancel).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_in(tmp: &TempDir) -> Config {
        Config {
            data_dir: tmp.path().display().to_string(),
            insert_interval_ms: 1,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_aggregate_empty_collection() {
        let tmp = TempDir::new().unwrap();
        let report = aggregate(&config_in(&tmp), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.len(), 2);
        assert!(report.facets().all(|f| report.get(f).unwrap().is_empty()));
    }

    #[tokio::test]
    async fn test_aggregate_reads_collection_file() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let dir = tmp.path().join("mot");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("testresults.jsonl"),
            concat!(
                "{\"FuelType\":\"PE\",\"Make\":\"FORD\",\"Model\":\"FIESTA\"}\n",
                "{\"FuelType\":\"DI\",\"Make\":\"FORD\",\"Model\":\"FOCUS\"}\n",
            ),
        )
        .unwrap();

        let report = aggregate(&config, &CancellationToken::new()).await.unwrap();
        assert_eq!(report.get("CategorisedCarsByFuelType").unwrap().len(), 2);
        assert_eq!(
            report.get("BucketedCarMakesByAmountOfUniqueModels").unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_insert_until_cancelled() {
        let tmp = TempDir::new().unwrap();
        let config = config_in(&tmp);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stopper.cancel();
        });

        let mut progress = Vec::new();
        let inserted = insert(&config, &mut progress, &cancel).await.unwrap();
        assert!(progress.ends_with(b"\n"));

        let store = FileStore::open(tmp.path(), "testdb").unwrap();
        assert_eq!(store.query("records").unwrap().len() as u64, inserted);
    }
}
