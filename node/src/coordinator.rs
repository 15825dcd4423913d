//! Round scheduler: turns pending transactions into appended blocks.
//!
//! Every `round_duration` tick starts a round unless one is still running.
//! A round drains a batch from the pool, builds the block on the blocking
//! thread pool, appends it and announces it. The scheduler loop receives
//! finished builds over a channel so it keeps ticking (and counting skips)
//! while the nonce search runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use sdupi_consensus::{ConsensusError, ConsensusMode, RoundOutcome, RoundState, RoundStats};
use sdupi_crypto::ProducerIdentity;
use sdupi_ledger::{BlockBuilder, BuiltBlock, ChainTip};
use sdupi_transactions::Transaction;
use sdupi_work::DifficultyPrefix;

use crate::context::NodeContext;

/// Knobs for block production.
#[derive(Clone, Debug)]
pub struct RoundSettings {
    pub round_duration: Duration,
    pub batch_size: usize,
    pub difficulty: DifficultyPrefix,
    pub max_iterations: u64,
}

/// A drained batch and the tip it builds on.
struct RoundJob {
    round: u64,
    tip: ChainTip,
    transactions: Vec<Transaction>,
}

/// A finished (or failed) build coming back from the blocking pool.
struct BuildResult {
    round: u64,
    /// The batch, kept so a panicked build can be requeued.
    transactions: Vec<Transaction>,
    built: Option<BuiltBlock>,
    elapsed: Duration,
}

pub struct ConsensusCoordinator {
    ctx: NodeContext,
    builder: Arc<BlockBuilder>,
    producer: Arc<ProducerIdentity>,
    settings: RoundSettings,
    state: Mutex<RoundState>,
}

impl ConsensusCoordinator {
    /// Fails for consensus modes that cannot run.
    pub fn new(
        mode: ConsensusMode,
        ctx: NodeContext,
        producer: Arc<ProducerIdentity>,
        settings: RoundSettings,
    ) -> Result<Self, ConsensusError> {
        mode.ensure_supported()?;
        Ok(Self {
            builder: Arc::new(BlockBuilder::new(ctx.clock.clone())),
            ctx,
            producer,
            settings,
            state: Mutex::new(RoundState::new()),
        })
    }

    pub fn producer(&self) -> &ProducerIdentity {
        &self.producer
    }

    pub async fn stats(&self) -> RoundStats {
        self.state.lock().await.stats()
    }

    /// Run one full round inline and return how it ended.
    pub async fn run_round(&self) -> RoundOutcome {
        let job = match self.prepare_round().await {
            Ok(job) => job,
            Err(outcome) => return outcome,
        };
        let result = self.build(job).await;
        self.complete_round(result).await
    }

    /// Spawn the scheduler loop. It exits when `shutdown` fires.
    pub fn spawn(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (done_tx, mut done_rx) = mpsc::channel::<BuildResult>(1);
            let mut ticker = tokio::time::interval(self.settings.round_duration);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; rounds start one period in.
            ticker.tick().await;

            tracing::info!(
                round_ms = self.settings.round_duration.as_millis() as u64,
                batch_size = self.settings.batch_size,
                difficulty = %self.settings.difficulty.as_str(),
                producer = %self.producer.id(),
                "round scheduler started"
            );

            let mut building = false;
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!("round scheduler stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Ok(job) = self.prepare_round().await {
                            building = true;
                            let this = self.clone();
                            let tx = done_tx.clone();
                            tokio::spawn(async move {
                                let result = this.build(job).await;
                                let _ = tx.send(result).await;
                            });
                        }
                    }
                    Some(result) = done_rx.recv() => {
                        building = false;
                        self.complete_round(result).await;
                    }
                }
            }

            // Settle the in-flight round so its batch is appended or requeued.
            if building {
                if let Some(result) = done_rx.recv().await {
                    let outcome = self.complete_round(result).await;
                    tracing::info!(?outcome, "in-flight round settled on shutdown");
                }
            }
        })
    }

    /// Start a round and drain its batch. `Err` carries the outcome of a
    /// round that ends here (skipped or empty).
    async fn prepare_round(&self) -> Result<RoundJob, RoundOutcome> {
        let mut state = self.state.lock().await;
        let round = match state.begin() {
            Ok(round) => round,
            Err(e) => {
                self.ctx.metrics.rounds_skipped.inc();
                tracing::debug!(reason = %e, "round tick skipped");
                return Err(RoundOutcome::Skipped);
            }
        };

        let transactions = self.ctx.pool.lock().await.drain_batch(self.settings.batch_size);
        if transactions.is_empty() {
            state.finish(&RoundOutcome::Empty);
            tracing::trace!(round, "round empty");
            return Err(RoundOutcome::Empty);
        }

        let tip = self.ctx.ledger.read().await.chain_tip();
        if let Err(e) = state.start_building() {
            tracing::warn!(round, error = %e, "round state out of step");
        }
        Ok(RoundJob {
            round,
            tip,
            transactions,
        })
    }

    /// Run the nonce search on the blocking pool. No lock is held.
    async fn build(&self, job: RoundJob) -> BuildResult {
        let RoundJob {
            round,
            tip,
            transactions,
        } = job;
        let builder = self.builder.clone();
        let producer = self.producer.clone();
        let difficulty = self.settings.difficulty.clone();
        let max_iterations = self.settings.max_iterations;
        let batch = transactions.clone();

        let started = Instant::now();
        let joined = tokio::task::spawn_blocking(move || {
            builder.build(tip, batch, &producer, &difficulty, max_iterations)
        })
        .await;
        let elapsed = started.elapsed();

        match joined {
            Ok(built) => BuildResult {
                round,
                transactions: Vec::new(),
                built: Some(built),
                elapsed,
            },
            Err(e) => {
                tracing::error!(round, error = %e, "block build task failed");
                BuildResult {
                    round,
                    transactions,
                    built: None,
                    elapsed,
                }
            }
        }
    }

    /// Append the built block (or recover from a failed build) and end the round.
    async fn complete_round(&self, result: BuildResult) -> RoundOutcome {
        let BuildResult {
            round,
            transactions,
            built,
            elapsed,
        } = result;
        let mut state = self.state.lock().await;
        if let Err(e) = state.start_appending() {
            tracing::warn!(round, error = %e, "round state out of step");
        }

        let outcome = match built {
            Some(built) => self.append(round, built, elapsed).await,
            None => {
                let requeued = self.requeue(transactions).await;
                RoundOutcome::Rejected {
                    index: 0,
                    reason: "block build task failed".to_string(),
                    requeued,
                }
            }
        };
        state.finish(&outcome);
        outcome
    }

    async fn append(&self, round: u64, built: BuiltBlock, elapsed: Duration) -> RoundOutcome {
        let metrics = &self.ctx.metrics;
        metrics.nonce_search_ms.observe(elapsed.as_secs_f64() * 1000.0);

        let work = built.work;
        let block = built.block;
        let index = block.index;
        let hash = block.hash;
        let count = block.transactions.len();

        let appended = {
            let mut ledger = self.ctx.ledger.write().await;
            let result = ledger.append(block.clone());
            if result.is_ok() {
                metrics.chain_height.set(ledger.height() as i64);
            }
            result
        };

        match appended {
            Ok(()) => {
                metrics.blocks_produced.inc();
                // Copies re-admitted while the block was building.
                let purged = self
                    .ctx
                    .pool
                    .lock()
                    .await
                    .remove_confirmed(block.transactions.iter().map(|tx| &tx.hash));
                if purged > 0 {
                    tracing::debug!(index, purged, "confirmed transactions purged from pool");
                }
                if let Some(timeout) = work.timeout() {
                    metrics.target_misses.inc();
                    tracing::warn!(index, error = %timeout, matched = work.matched, "difficulty target missed");
                }
                self.ctx.tracker.lock().await.record(count);
                match self.ctx.peers.announce_block(&block).await {
                    Ok(sent) => tracing::debug!(index, sent = sent.sent, failed = sent.failed, "block announced"),
                    Err(e) => tracing::warn!(index, error = %e, "failed to announce block"),
                }
                tracing::info!(
                    round,
                    index,
                    hash = %hash,
                    transactions = count,
                    nonce = work.nonce,
                    iterations = work.iterations,
                    "block produced"
                );
                RoundOutcome::Produced {
                    index,
                    hash,
                    transactions: count,
                    met_target: work.met_target,
                    iterations: work.iterations,
                }
            }
            Err(e) => {
                metrics.blocks_rejected.inc();
                let requeued = self.requeue(block.transactions).await;
                tracing::warn!(round, index, error = %e, requeued, "candidate block rejected");
                RoundOutcome::Rejected {
                    index,
                    reason: e.to_string(),
                    requeued,
                }
            }
        }
    }

    /// Return transactions not already on chain to the head of the pool.
    async fn requeue(&self, transactions: Vec<Transaction>) -> usize {
        let unconfirmed: Vec<Transaction> = {
            let ledger = self.ctx.ledger.read().await;
            transactions
                .into_iter()
                .filter(|tx| !ledger.contains_transaction(&tx.hash))
                .collect()
        };
        self.ctx.pool.lock().await.requeue_front(unconfirmed)
    }
}
