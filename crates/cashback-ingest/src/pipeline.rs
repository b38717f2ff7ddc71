//! Ingestion pipeline
//!
//! One producer reads the upload sequentially (tokenize, reassemble, map) and
//! feeds a bounded queue. A fixed pool of writer workers takes jobs off the
//! queue and hands each one to the [`JobSink`] exactly once.
//!
//! ```text
//! bytes -> RowReader -> reassemble -> map_row -> [queue] -> worker 0..N -> sink
//!                                                   |
//!                                       CompletionTracker (one ticket per job)
//! ```
//!
//! The queue gives back-pressure: a slow sink throttles reading. Rows are
//! queued in file order but inserts complete in any order.
//!
//! Cancellation (explicit or through the configured deadline) stops the
//! reader and stops new inserts; jobs already queued are drained and counted
//! as cancelled, so the tracker still reaches zero.

use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::IngestResult;
use crate::mapper::map_row;
use crate::models::IngestJob;
use crate::reader::{strip_bom, RowReader};
use crate::reassemble::{reassemble, Reassembled};
use crate::storage::JobSink;
use crate::tracker::{CompletionTicket, CompletionTracker};

/// A job on its way to a worker, with the ticket that accounts for it
struct QueuedJob {
    job: IngestJob,
    ticket: CompletionTicket,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<QueuedJob>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Debug, Default)]
struct AttemptCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl AttemptCounters {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Succeeded => &self.succeeded,
            Outcome::Failed => &self.failed,
            Outcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct ReadStats {
    rows_read: u64,
    rows_discarded: u64,
    stopped_at_blank_row: bool,
    read_error: Option<String>,
}

/// Outcome of one ingestion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Data rows read after the header
    pub rows_read: u64,
    /// Rows that became jobs
    pub rows_accepted: u64,
    /// Rows with too few columns
    pub rows_discarded: u64,
    /// Whether a blank row ended the input early
    pub stopped_at_blank_row: bool,
    /// Tokenizer error that ended the input, if any
    pub read_error: Option<String>,
    pub inserts_succeeded: u64,
    pub inserts_failed: u64,
    /// Jobs skipped because the ingestion was cancelled
    pub inserts_cancelled: u64,
    /// Completion signals received, always equal to `rows_accepted`
    pub completions: u64,
    pub cancelled: bool,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Elapsed wall-clock time rounded up to whole seconds
    pub fn elapsed_seconds_ceil(&self) -> u64 {
        self.elapsed.as_secs_f64().ceil() as u64
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}

/// Reads one upload and writes every accepted row through a [`JobSink`]
pub struct IngestPipeline<S> {
    sink: Arc<S>,
    config: PipelineConfig,
}

impl<S: JobSink> IngestPipeline<S> {
    /// Fails with [`IngestError::Config`](crate::IngestError::Config) when
    /// `config` has no workers or no queue capacity
    pub fn new(sink: S, config: PipelineConfig) -> IngestResult<Self> {
        config.validate()?;

        Ok(Self {
            sink: Arc::new(sink),
            config,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Ingest `input` (the raw file bytes) and wait for every job to be
    /// attempted.
    ///
    /// Never fails: field errors, short rows and failed inserts are logged
    /// and counted in the summary.
    pub async fn run(&self, input: &[u8], cancel: CancellationToken) -> IngestSummary {
        let start = Instant::now();

        let deadline = self.config.request_timeout().map(|timeout| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(timeout_secs = timeout.as_secs(), "Ingestion deadline reached, cancelling");
                cancel.cancel();
            })
        });

        info!(
            workers = self.config.workers,
            queue_capacity = self.config.queue_capacity,
            bytes = input.len(),
            "Starting ingestion"
        );

        let tracker = CompletionTracker::new();
        let counters = Arc::new(AttemptCounters::default());
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let queue: JobQueue = Arc::new(Mutex::new(rx));

        let workers: Vec<_> = (0..self.config.workers)
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    Arc::clone(&queue),
                    Arc::clone(&self.sink),
                    Arc::clone(&counters),
                    cancel.clone(),
                    self.config.progress_interval,
                ))
            })
            .collect();

        // Only workers hold the receiver, so the queue closes if they all die
        drop(queue);

        let read = produce(input, tx, &tracker, &cancel).await;

        tracker.wait().await;

        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Writer worker terminated abnormally");
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let summary = IngestSummary {
            rows_read: read.rows_read,
            rows_accepted: tracker.registered(),
            rows_discarded: read.rows_discarded,
            stopped_at_blank_row: read.stopped_at_blank_row,
            read_error: read.read_error,
            inserts_succeeded: counters.succeeded.load(Ordering::Relaxed),
            inserts_failed: counters.failed.load(Ordering::Relaxed),
            inserts_cancelled: counters.cancelled.load(Ordering::Relaxed),
            completions: tracker.signalled(),
            cancelled: cancel.is_cancelled(),
            elapsed: start.elapsed(),
        };

        info!(
            rows_read = summary.rows_read,
            rows_accepted = summary.rows_accepted,
            rows_discarded = summary.rows_discarded,
            inserts_succeeded = summary.inserts_succeeded,
            inserts_failed = summary.inserts_failed,
            inserts_cancelled = summary.inserts_cancelled,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Ingestion finished"
        );

        summary
    }
}

/// Read, reassemble and map rows, queueing one job per accepted row.
/// Dropping `tx` on return closes the queue.
async fn produce(
    input: &[u8],
    tx: mpsc::Sender<QueuedJob>,
    tracker: &CompletionTracker,
    cancel: &CancellationToken,
) -> ReadStats {
    let mut reader = RowReader::new(strip_bom(input));
    let mut stats = ReadStats::default();

    while !cancel.is_cancelled() {
        let (line, raw) = match reader.next_row().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Stopped reading input");
                stats.read_error = Some(e.to_string());
                break;
            },
        };
        stats.rows_read += 1;

        let canonical = match reassemble(&raw) {
            Reassembled::Row(row) => row,
            Reassembled::EndOfData => {
                debug!(line, "Blank row, treating as end of data");
                stats.stopped_at_blank_row = true;
                break;
            },
        };

        let Some(mapped) = map_row(&canonical, line) else {
            debug!(line, columns = canonical.len(), "Row has too few columns, skipping");
            stats.rows_discarded += 1;
            continue;
        };

        // Register before queueing so the count never under-reports
        let queued = QueuedJob {
            job: mapped.record.into_job(line),
            ticket: tracker.register(),
        };

        if let Err(mpsc::error::SendError(lost)) = tx.send(queued).await {
            error!(line = lost.job.line(), "Job queue closed, no workers left");
            break;
        }
    }

    stats
}

async fn run_worker<S: JobSink>(
    index: usize,
    queue: JobQueue,
    sink: Arc<S>,
    counters: Arc<AttemptCounters>,
    cancel: CancellationToken,
    progress_interval: u64,
) {
    let mut attempted: u64 = 0;

    loop {
        // Hold the lock only while taking one job
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };

        let Some(QueuedJob { job, ticket }) = next else {
            break;
        };

        let outcome = if cancel.is_cancelled() {
            Outcome::Cancelled
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Outcome::Cancelled,
                result = sink.insert(&job) => match result {
                    Ok(()) => Outcome::Succeeded,
                    Err(e) => {
                        error!(
                            worker = index,
                            line = job.line(),
                            values = ?job.values(),
                            error = %e,
                            "Insert failed"
                        );
                        Outcome::Failed
                    },
                },
            }
        };

        counters.record(outcome);
        ticket.complete();

        attempted += 1;
        if progress_interval > 0 && attempted % progress_interval == 0 {
            info!(worker = index, attempted, "Worker progress");
        }
    }

    debug!(worker = index, attempted, "Worker finished");
}
