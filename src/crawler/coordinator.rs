//! Crawler coordinator - the round-based scheduler loop
//!
//! Each round crawls one direction of the graph:
//! - Select the frontier for the round's source type
//! - Partition it across the configured workers and dispatch them
//! - Join all workers before summarizing
//! - Mark the direction complete when its eligible population runs out
//! - Back off when the external quota is exhausted
//!
//! Rounds alternate between `stars` and `gazers` until both directions are
//! complete or the round budget is spent.

use crate::config::{BackoffTrigger, Config};
use crate::crawler::frontier::{select_frontier, SelectionPolicy};
use crate::crawler::partition::partition;
use crate::crawler::{
    ChunkOutcome, CrawlMode, CrawlWorker, ResultMerger, RoundTally, SimilarityRanker,
    TargetFetcher,
};
use crate::output::{end_symbol_line, ProgressLog};
use crate::state::SchedulerPhase;
use crate::storage::GraphStore;
use crate::CrawlError;
use chrono::Utc;
use std::sync::Arc;

/// What happened in one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub mode: CrawlMode,

    /// Sources selected for this round
    pub selected: usize,

    /// Worker chunks dispatched
    pub chunks: usize,

    /// Chunks that reported exhausted quota
    pub exhausted_chunks: usize,

    pub tally: RoundTally,

    /// The frontier was empty: no eligible source of this mode's type is left
    pub complete: bool,
}

/// What happened over a whole `run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub rounds: u32,
    pub backoffs: u32,
    pub stars: RoundTally,
    pub gazers: RoundTally,

    /// Both directions finished before the round budget ran out
    pub completed: bool,
}

/// Decides whether the scheduler pauses after `round`
///
/// Rounds that dispatched nothing never trigger a pause.
pub fn should_back_off(trigger: BackoffTrigger, round: &RoundSummary) -> bool {
    if round.chunks == 0 {
        return false;
    }
    match trigger {
        BackoffTrigger::AllExhausted => round.exhausted_chunks == round.chunks,
        BackoffTrigger::AnyExhausted => round.exhausted_chunks > 0,
        BackoffTrigger::EveryRound => true,
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    store: GraphStore,
    worker: CrawlWorker,
    phase: SchedulerPhase,
    progress: ProgressLog,
}

impl Coordinator {
    /// Creates a coordinator over `store` using the given collaborators
    pub fn new(
        config: Config,
        store: GraphStore,
        fetcher: Arc<dyn TargetFetcher>,
        ranker: Arc<dyn SimilarityRanker>,
    ) -> Self {
        let merger = ResultMerger::new(store.clone(), ranker, config.crawler.costars_threshold);
        let worker = CrawlWorker::new(fetcher, Arc::new(merger), config.crawler.progress_symbols);
        let progress = ProgressLog::new(config.crawler.log_frequency);

        Self {
            config: Arc::new(config),
            store,
            worker,
            phase: SchedulerPhase::Idle,
            progress,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Inserts never-crawled statuses for `ids` that are not yet known
    pub fn seed(&self, ids: &[String]) -> Result<usize, CrawlError> {
        let created = self.store.seed(ids)?;
        if created > 0 {
            tracing::info!("Seeded {} new nodes", created);
        }
        Ok(created)
    }

    /// Runs rounds until both directions are complete or the budget is spent
    pub async fn run(&mut self) -> Result<CrawlSummary, CrawlError> {
        let config = Arc::clone(&self.config);
        let max_rounds = config.crawler.max_rounds;
        self.seed(&config.seed.nodes)?;

        tracing::info!(
            "Starting crawl: {} workers, {} day freshness, round budget {}",
            config.crawler.parallel_workers,
            config.crawler.freshness_days,
            max_rounds
        );

        let mut summary = CrawlSummary::default();
        let mut stars_complete = false;
        let mut gazers_complete = false;
        let mut mode = CrawlMode::Stars;

        if max_rounds == 0 {
            self.transition(SchedulerPhase::Done)?;
            return Ok(summary);
        }

        loop {
            let mode_complete = match mode {
                CrawlMode::Stars => stars_complete,
                CrawlMode::Gazers => gazers_complete,
            };
            if mode_complete {
                mode = mode.other();
            }

            let round = self.run_round(mode).await?;
            summary.rounds += 1;
            self.progress.record(mode, &round.tally);
            match mode {
                CrawlMode::Stars => summary.stars.absorb(&round.tally),
                CrawlMode::Gazers => summary.gazers.absorb(&round.tally),
            }

            if round.complete {
                set_complete(mode, true, &mut stars_complete, &mut gazers_complete);
            }
            if round.tally.discovered > 0 {
                // New targets re-arm the opposite direction
                set_complete(mode.other(), false, &mut stars_complete, &mut gazers_complete);
            }

            if stars_complete && gazers_complete {
                summary.completed = true;
                self.transition(SchedulerPhase::Done)?;
                tracing::info!("Both directions complete after {} rounds", summary.rounds);
                break;
            }

            if should_back_off(config.backoff.trigger, &round) {
                self.transition(SchedulerPhase::BackingOff)?;
                summary.backoffs += 1;
                tracing::info!(
                    "Backing off for {}s ({} of {} chunks out of quota)",
                    config.backoff.duration_secs,
                    round.exhausted_chunks,
                    round.chunks
                );
                tokio::time::sleep(config.backoff.duration()).await;
            }

            if summary.rounds >= max_rounds {
                self.transition(SchedulerPhase::Done)?;
                tracing::info!("Round budget of {} exhausted", max_rounds);
                break;
            }

            self.transition(SchedulerPhase::NextRound)?;
            mode = mode.other();
        }

        tracing::info!(
            "Crawl finished: stars {} ok / {} failed, gazers {} ok / {} failed, {} discovered",
            summary.stars.succeeded,
            summary.stars.failed,
            summary.gazers.succeeded,
            summary.gazers.failed,
            summary.stars.discovered + summary.gazers.discovered
        );

        Ok(summary)
    }

    /// Runs one round for `mode`, ending in the `Summarizing` phase
    pub async fn run_round(&mut self, mode: CrawlMode) -> Result<RoundSummary, CrawlError> {
        self.transition(SchedulerPhase::SelectingFrontier)?;

        let policy = SelectionPolicy::for_mode(&self.config, mode);
        let selected = select_frontier(&self.store, mode, &policy, Utc::now())?;
        let selected_count = selected.len();

        if selected.is_empty() {
            self.transition(SchedulerPhase::Summarizing)?;
            tracing::info!("{}: no eligible {} sources", mode, mode.source_kind());
            return Ok(RoundSummary {
                mode,
                selected: 0,
                chunks: 0,
                exhausted_chunks: 0,
                tally: RoundTally::default(),
                complete: true,
            });
        }

        self.transition(SchedulerPhase::Dispatching)?;
        let chunks = partition(selected, self.config.crawler.parallel_workers as usize);
        let chunk_count = chunks.len();
        tracing::debug!(
            "{}: dispatching {} sources in {} chunks",
            mode,
            selected_count,
            chunk_count
        );

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let worker = self.worker.clone();
                tokio::spawn(async move { worker.run_chunk(mode, chunk).await })
            })
            .collect();

        self.transition(SchedulerPhase::AwaitingWorkers)?;
        let mut outcomes: Vec<ChunkOutcome> = Vec::with_capacity(chunk_count);
        let mut first_error: Option<CrawlError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => {
                    first_error.get_or_insert(CrawlError::Storage(e));
                }
                Err(e) => {
                    first_error.get_or_insert(CrawlError::Worker(e.to_string()));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        self.transition(SchedulerPhase::Summarizing)?;
        let mut tally = RoundTally::default();
        for outcome in &outcomes {
            tally.absorb(&outcome.tally);
        }
        let exhausted_chunks = outcomes.iter().filter(|o| !o.queries_left).count();

        if self.config.crawler.progress_symbols {
            end_symbol_line();
        }
        tracing::info!(
            "{} round: {} selected, {} success, {} fail, {} discovered{}",
            mode,
            selected_count,
            tally.succeeded,
            tally.failed,
            tally.discovered,
            if exhausted_chunks > 0 {
                format!(", {}/{} chunks out of quota", exhausted_chunks, chunk_count)
            } else {
                String::new()
            }
        );

        Ok(RoundSummary {
            mode,
            selected: selected_count,
            chunks: chunk_count,
            exhausted_chunks,
            tally,
            complete: false,
        })
    }

    fn transition(&mut self, next: SchedulerPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Scheduler phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

fn set_complete(mode: CrawlMode, value: bool, stars: &mut bool, gazers: &mut bool) {
    match mode {
        CrawlMode::Stars => *stars = value,
        CrawlMode::Gazers => *gazers = value,
    }
}
