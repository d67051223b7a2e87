use super::link::WorkerLink;
use super::protocol::{Assignment, WorkerId};
use crate::annotated;
use crate::classify::ClassifierHandle;
use crate::config::RunSettings;
use crate::corpus::{Columns, Corpus};
use crate::partition::partition;
use crate::report::Report;
use crate::worker::{self, PartialTally};
use crate::{Error, Result};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::{debug, error, info};

#[derive(derive_more::Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[display("idle")]
    Idle,
    #[display("dispatching")]
    Dispatching,
    #[display("worker-running")]
    WorkerRunning,
    #[display("collecting")]
    Collecting,
    #[display("merged")]
    Merged,
    #[display("reporting")]
    Reporting,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Dispatching => "dispatching",
            Phase::WorkerRunning => "worker-running",
            Phase::Collecting => "collecting",
            Phase::Merged => "merged",
            Phase::Reporting => "reporting",
        }
    }

    /// Phases only move forward, one step at a time.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Dispatching)
                | (Phase::Dispatching, Phase::WorkerRunning)
                | (Phase::WorkerRunning, Phase::Collecting)
                | (Phase::Collecting, Phase::Merged)
                | (Phase::Merged, Phase::Reporting)
        )
    }
}

/// The outcome of a complete run.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub totals: PartialTally,
    pub report: Report,
}

/// Applies partials in slot order no matter the order they arrive in, so the
/// merged table iterates keys exactly as a single scan of the corpus would.
struct MergeQueue {
    totals: PartialTally,
    next: usize,
    waiting: BTreeMap<usize, PartialTally>,
}

impl MergeQueue {
    fn new() -> Self {
        Self {
            totals: PartialTally::default(),
            next: 0,
            waiting: BTreeMap::new(),
        }
    }

    fn push(&mut self, slot: usize, tally: PartialTally) {
        self.waiting.insert(slot, tally);
        while let Some(ready) = self.waiting.remove(&self.next) {
            self.totals.merge(ready);
            self.next += 1;
        }
    }

    /// The merged totals, provided every one of `expected` slots arrived.
    fn finish(self, expected: usize) -> Result<PartialTally> {
        if self.next != expected || !self.waiting.is_empty() {
            return Err(Error::General(format!(
                "merged {} of {expected} partials",
                self.next
            )));
        }
        Ok(self.totals)
    }
}

/// Worker 0: splits the corpus, runs the first range itself, and folds the
/// partials from every link into one tally.
pub struct Coordinator {
    phase: Phase,
    settings: RunSettings,
    classifier: ClassifierHandle,
}

impl Coordinator {
    pub fn new(settings: RunSettings, classifier: ClassifierHandle) -> Self {
        Self {
            phase: Phase::Idle,
            settings,
            classifier,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(Error::InvalidPhase {
                from: self.phase.name(),
                to: next.name(),
            });
        }
        debug!(from = %self.phase, to = %next, "phase change");
        self.phase = next;
        Ok(())
    }

    /// Run one reduction over `corpus`, with `links` as workers 1..=n.
    /// Any failure aborts every link and no report is produced.
    pub async fn run<L: WorkerLink>(
        &mut self,
        corpus: &Corpus,
        columns: Columns,
        mut links: Vec<L>,
    ) -> Result<Reduction> {
        let started = std::time::Instant::now();
        match self.reduce(corpus, columns, &mut links).await {
            Ok(totals) => {
                self.advance(Phase::Reporting)?;
                if let Some(path) = self.settings.output.as_ref().filter(|_| self.settings.classify) {
                    annotated::write(path, corpus.header(), &totals.rows).await?;
                }
                let workers = links.len() + 1;
                let report = Report::build(
                    &totals,
                    self.settings.top_k,
                    workers,
                    corpus.buffer().len(),
                    started.elapsed(),
                );
                info!(
                    workers,
                    records = totals.records,
                    skipped = totals.skipped,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "reduction complete"
                );
                Ok(Reduction { totals, report })
            }
            Err(e) => {
                error!(error = %e, phase = %self.phase, "run failed, aborting workers");
                for link in links.iter_mut() {
                    link.abort().await;
                }
                Err(e)
            }
        }
    }

    async fn reduce<L: WorkerLink>(
        &mut self,
        corpus: &Corpus,
        columns: Columns,
        links: &mut [L],
    ) -> Result<PartialTally> {
        self.advance(Phase::Dispatching)?;
        let slots = links.len() + 1;
        let ranges = partition(
            corpus.buffer(),
            corpus.data_start(),
            slots,
            self.settings.max_record_bytes,
        )?;
        for (link, range) in links.iter_mut().zip(&ranges[1..]) {
            let assignment = Assignment {
                worker: link.worker(),
                columns,
                range: *range,
                chunk: corpus.slice(range),
                classify: self.settings.classify,
                keep_rows: self.settings.keeps_rows(),
            };
            debug!(worker = %link.worker(), offset = range.offset, bytes = range.length, "dispatching");
            link.dispatch(assignment).await?;
        }
        let deadline = Instant::now() + self.settings.collect_timeout;

        self.advance(Phase::WorkerRunning)?;
        let own = Assignment {
            worker: WorkerId::COORDINATOR,
            columns,
            range: ranges[0],
            chunk: corpus.slice(&ranges[0]),
            classify: self.settings.classify,
            keep_rows: self.settings.keeps_rows(),
        };
        let own_tally = worker::execute(&own, &self.classifier).await?;
        debug!(records = own_tally.records, "own range done");

        self.advance(Phase::Collecting)?;
        let mut queue = MergeQueue::new();
        queue.push(0, own_tally);

        let wait = self.settings.collect_timeout;
        let mut pending: FuturesUnordered<_> = links
            .iter_mut()
            .enumerate()
            .map(|(i, link)| async move {
                let worker = link.worker();
                let tally = tokio::time::timeout_at(deadline, link.collect())
                    .await
                    .map_err(|_| Error::WorkerTimeout {
                        worker,
                        waited: wait,
                    })??;
                Ok::<_, Error>((i + 1, worker, tally))
            })
            .collect();
        while let Some(arrived) = pending.next().await {
            let (slot, worker, tally) = arrived?;
            debug!(%worker, records = tally.records, "partial received");
            queue.push(slot, tally);
        }
        drop(pending);

        let totals = queue.finish(slots)?;
        self.advance(Phase::Merged)?;
        Ok(totals)
    }
}
