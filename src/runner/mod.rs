//! Aggregation runner
//!
//! A run validates every facet, reads one snapshot of the collection, then
//! executes all facets in parallel blocking tasks over that shared snapshot.
//! The first facet failure aborts the remaining tasks and fails the run; a
//! run either returns a complete report or an error.

mod errors;
mod report;

pub use errors::AggregationError;
pub use report::Report;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::pipeline::FacetSet;
use crate::record::Record;
use crate::store::RecordSource;

/// Executes facet sets against a record source
#[derive(Debug, Clone, Default)]
pub struct AggregationRunner {
    deadline: Option<Duration>,
}

impl AggregationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails runs that take longer than `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Runs every facet of `facets` over `collection`.
    ///
    /// Configuration errors are reported before the source is read.
    /// Cancelling `cancel` or passing the deadline abandons the run.
    pub async fn run(
        &self,
        source: Arc<dyn RecordSource>,
        collection: &str,
        facets: &FacetSet,
        cancel: &CancellationToken,
    ) -> Result<Report, AggregationError> {
        for facet in facets.iter() {
            facet.validate().map_err(|error| AggregationError::Facet {
                facet: facet.name().to_string(),
                error,
            })?;
        }

        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let facet_count = facets.len().to_string();
        log_event_with_fields(
            Event::AggregationStart,
            &[
                ("collection", collection),
                ("facets", &facet_count),
                ("run_id", &run_id),
            ],
        );

        let work = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::timeout(deadline, execute(source, collection, facets, &run_id))
                        .await
                        .map_err(|_| AggregationError::DeadlineExceeded(deadline))?
                }
                None => execute(source, collection, facets, &run_id).await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AggregationError::Cancelled),
            result = work => result,
        };

        match &result {
            Ok(_) => {
                let elapsed = started.elapsed().as_millis().to_string();
                log_event_with_fields(
                    Event::AggregationComplete,
                    &[("elapsed_ms", &elapsed), ("run_id", &run_id)],
                );
            }
            Err(e @ (AggregationError::Cancelled | AggregationError::DeadlineExceeded(_))) => {
                log_event_with_fields(
                    Event::AggregationCancelled,
                    &[("reason", e.code()), ("run_id", &run_id)],
                );
            }
            Err(_) => {}
        }
        result
    }
}

async fn execute(
    source: Arc<dyn RecordSource>,
    collection: &str,
    facets: &FacetSet,
    run_id: &str,
) -> Result<Report, AggregationError> {
    let snapshot = {
        let collection = collection.to_string();
        tokio::task::spawn_blocking(move || source.query(&collection))
            .await
            .map_err(|e| AggregationError::Task(e.to_string()))??
    };
    let snapshot = Arc::new(snapshot);
    log_event_with_fields(
        Event::SnapshotTaken,
        &[("records", &snapshot.len().to_string()), ("run_id", run_id)],
    );

    // Dropping the set (early return, cancellation, timeout) aborts the rest
    let mut tasks = JoinSet::new();
    for (index, facet) in facets.iter().enumerate() {
        let facet = facet.clone();
        let snapshot = Arc::clone(&snapshot);
        let run_id = run_id.to_string();
        tasks.spawn_blocking(move || {
            let scope = ObservationScope::with_fields(
                "FACET",
                &[("facet", facet.name()), ("run_id", &run_id)],
            );
            let result = facet.execute(Vec::clone(&snapshot));
            match &result {
                Ok(records) => scope.complete_with_fields(&[("records", &records.len().to_string())]),
                Err(e) => scope.fail(e.code()),
            }
            (index, facet.name().to_string(), result)
        });
    }

    let mut outputs: Vec<Option<(String, Vec<Record>)>> = vec![None; facets.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, name, result) = joined.map_err(|e| AggregationError::Task(e.to_string()))?;
        // The facet's scope has already logged FACET_COMPLETE or FACET_FAILED
        match result {
            Ok(records) => outputs[index] = Some((name, records)),
            Err(error) => {
                tasks.abort_all();
                return Err(AggregationError::Facet { facet: name, error });
            }
        }
    }

    let mut report = Report::new();
    for (name, records) in outputs.into_iter().flatten() {
        report.insert(name, records);
    }
    Ok(report)
}
