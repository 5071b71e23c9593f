use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use super::{Passage, RelationExtractor};
use crate::error::ExtractionError;
use crate::graph::KnowledgeGraph;

/// Default cap on simultaneously in-flight extraction calls
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Default context hint passed with every passage
pub const DEFAULT_CONTEXT: &str = "Scientific passage";

/// Point-in-time view of the shared progress counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub total_elapsed: Duration,
}

#[derive(Debug, Default)]
struct ProgressCounters {
    completed: usize,
    failed: usize,
    total_elapsed: Duration,
}

/// Progress counters shared by every worker of one run.
///
/// Each update takes the lock once, so `completed` moves by exactly one per
/// passage no matter how workers interleave.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    counters: Mutex<ProgressCounters>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            counters: Mutex::new(ProgressCounters::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_of(&self, counters: &ProgressCounters) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: counters.completed,
            failed: counters.failed,
            total: self.total,
            total_elapsed: counters.total_elapsed,
        }
    }

    /// Count a successful call and add its duration to the running total
    pub fn record_success(&self, elapsed: Duration) -> ProgressSnapshot {
        let mut counters = self.lock();
        counters.completed += 1;
        counters.total_elapsed += elapsed;
        self.snapshot_of(&counters)
    }

    /// Count a failed call; failures contribute no time
    pub fn record_failure(&self) -> ProgressSnapshot {
        let mut counters = self.lock();
        counters.completed += 1;
        counters.failed += 1;
        self.snapshot_of(&counters)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let counters = self.lock();
        self.snapshot_of(&counters)
    }
}

/// A passage whose extraction failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassageFailure {
    pub index: usize,
    pub message: String,
}

enum PassageOutcome {
    Extracted(usize),
    Failed(PassageFailure),
}

/// Result of a full extraction run
#[derive(Debug)]
pub struct ExtractionReport {
    pub graph: KnowledgeGraph,
    pub passages: usize,
    pub completed: usize,
    pub total_relations: usize,
    pub empty_passages: usize,
    pub failures: Vec<PassageFailure>,
    /// Sum of per-call durations of successful extractions
    pub total_extraction_time: Duration,
    pub wall_clock: Duration,
}

impl ExtractionReport {
    pub fn average_extraction_time(&self) -> Option<Duration> {
        let successes = self.completed.saturating_sub(self.failures.len());
        if successes == 0 {
            return None;
        }
        Some(self.total_extraction_time / successes as u32)
    }
}

/// Runs a relation extractor over many passages with bounded concurrency
/// and merges everything into one graph.
pub struct ExtractionPipeline {
    extractor: Arc<dyn RelationExtractor>,
    concurrency: usize,
    context: Arc<str>,
}

impl ExtractionPipeline {
    pub fn new(extractor: Arc<dyn RelationExtractor>) -> Self {
        Self {
            extractor,
            concurrency: DEFAULT_CONCURRENCY,
            context: Arc::from(DEFAULT_CONTEXT),
        }
    }

    /// Cap on in-flight extraction calls, clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Arc::from(context);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatch every passage up front and wait for all of them.
    ///
    /// Per-passage failures are recorded in the report and never abort the
    /// run. Completion order is arbitrary; the resulting graph does not
    /// depend on it.
    pub async fn run(&self, passages: Vec<Passage>) -> ExtractionReport {
        let started = Instant::now();
        let total = passages.len();

        tracing::info!(
            "Extracting relations from {} passage(s) with concurrency {}",
            total,
            self.concurrency
        );

        let graph = Arc::new(KnowledgeGraph::new());
        let progress = Arc::new(ProgressTracker::new(total));
        let semaphore = Arc::new(Semaphore::new(self.concurrency.min(total.max(1))));

        let mut handles = Vec::with_capacity(total);
        for passage in passages {
            let index = passage.index;
            let task = process_passage(
                passage,
                Arc::clone(&self.extractor),
                Arc::clone(&self.context),
                Arc::clone(&semaphore),
                Arc::clone(&graph),
                Arc::clone(&progress),
            );
            handles.push((index, tokio::spawn(task)));
        }

        let mut total_relations = 0;
        let mut empty_passages = 0;
        let mut failures = Vec::new();

        for (index, handle) in handles {
            match handle.await {
                Ok(PassageOutcome::Extracted(0)) => empty_passages += 1,
                Ok(PassageOutcome::Extracted(count)) => total_relations += count,
                Ok(PassageOutcome::Failed(failure)) => failures.push(failure),
                Err(e) => {
                    // Every panic site before progress is recorded runs under
                    // catch_unwind, so a dead task has not been counted yet
                    progress.record_failure();
                    tracing::error!("Worker for entry {} did not finish: {}", index + 1, e);
                    failures.push(PassageFailure {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        let final_progress = progress.snapshot();
        let wall_clock = started.elapsed();

        tracing::info!(
            "Extracted {} relations from {} entries ({} failed, {} without relations)",
            total_relations,
            total,
            failures.len(),
            empty_passages
        );

        let graph = Arc::try_unwrap(graph).unwrap_or_else(|shared| (*shared).clone());

        ExtractionReport {
            graph,
            passages: total,
            completed: final_progress.completed,
            total_relations,
            empty_passages,
            failures,
            total_extraction_time: final_progress.total_elapsed,
            wall_clock,
        }
    }
}

async fn process_passage(
    passage: Passage,
    extractor: Arc<dyn RelationExtractor>,
    context: Arc<str>,
    semaphore: Arc<Semaphore>,
    graph: Arc<KnowledgeGraph>,
    progress: Arc<ProgressTracker>,
) -> PassageOutcome {
    let entry = passage.index + 1;

    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return fail(&progress, passage.index, e.to_string()),
    };

    tracing::info!("Processing entry {}", entry);

    let work = extract_and_merge(&passage, extractor.as_ref(), &context, &graph);
    let result = AssertUnwindSafe(work)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            Err(ExtractionError::Provider(
                "extraction task panicked".to_string(),
            ))
        });

    let (elapsed, merged) = match result {
        Ok(done) => done,
        Err(e) => return fail(&progress, passage.index, e.to_string()),
    };

    let snapshot = progress.record_success(elapsed);
    tracing::info!(
        "Completed {} of {} | time taken: {:.2}s | total time so far: {:.2}s",
        snapshot.completed,
        snapshot.total,
        elapsed.as_secs_f64(),
        snapshot.total_elapsed.as_secs_f64()
    );

    PassageOutcome::Extracted(merged)
}

/// Call the extractor and merge its triples. Returns the call's duration and
/// the number of triples merged.
async fn extract_and_merge(
    passage: &Passage,
    extractor: &dyn RelationExtractor,
    context: &str,
    graph: &KnowledgeGraph,
) -> Result<(Duration, usize), ExtractionError> {
    let call_started = Instant::now();
    // The external call runs without holding any shared lock
    let triples = extractor.extract(&passage.text, context).await?;
    let elapsed = call_started.elapsed();

    if triples.is_empty() {
        tracing::warn!("No relations extracted from entry {}", passage.index + 1);
        return Ok((elapsed, 0));
    }

    for triple in &triples {
        tracing::debug!("  {}", triple);
    }

    Ok((elapsed, graph.merge_triples(&triples)))
}

fn fail(progress: &ProgressTracker, index: usize, message: String) -> PassageOutcome {
    let snapshot = progress.record_failure();
    tracing::warn!("Error in entry {}: {}", index + 1, message);
    tracing::info!(
        "Completed {} of {} (with errors)",
        snapshot.completed,
        snapshot.total
    );
    PassageOutcome::Failed(PassageFailure { index, message })
}
