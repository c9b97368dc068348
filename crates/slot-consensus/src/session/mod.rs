//! # Authoring Session
//!
//! Tick-driven state machine that owns the epoch state and the per-slot
//! claims, and is the only writer of the block stream.
//!
//! ```text
//! Uninitialized ─► ConfiguringEpoch ─► AwaitingSlot ─► ClaimingSlot
//!                        ▲                  ▲  ▲            │
//!                        │ epoch boundary   │  └── lost ────┤
//!                        └──────────────────┤               ▼ won
//!                                           └──────── BuildingBlock
//! any ── shutdown ──► Stopped
//! ```
//!
//! One tokio task runs [`Session::run`]; builds are strictly sequential.
//! Shutdown is observed between ticks and while a sealed block waits for
//! space on the block channel. In the latter case the block is discarded and
//! its extrinsics are requeued before the loop exits.

use crate::config::SlotConsensusConfig;
use crate::domain::{
    calculate_threshold, estimate_slot_time, load_configuration, run_lottery, seal_header,
    slot_of, AuthoritySet, BlockBuilder, BuiltBlock, EpochConfiguration, Slot, SlotClaim,
    Threshold,
};
use crate::error::{Result, SlotConsensusError};
use crate::metrics::Metrics;
use crate::ports::{AuthorityKeyPair, ChainView, ExecutionEngine, TimeSource};
use crate::queue::TransactionQueue;
use shared_types::{Block, BlockHeader, Hash, PendingTransaction};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};


/// Session lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, no configuration loaded yet
    Uninitialized,
    /// Loading the epoch configuration
    ConfiguringEpoch,
    /// Waiting for the next slot
    AwaitingSlot,
    /// Running the lottery
    ClaimingSlot,
    /// Building, sealing and emitting a block
    BuildingBlock,
    /// Terminal
    Stopped,
}

/// Collaborators of a session
pub struct SessionDependencies<E, C> {
    /// Execution engine
    pub engine: Arc<E>,
    /// Local block tree
    pub chain: Arc<C>,
    /// Shared pending-transaction queue
    pub queue: Arc<TransactionQueue>,
    /// Authority key
    pub keypair: Arc<dyn AuthorityKeyPair>,
    /// Wall clock
    pub time: Arc<dyn TimeSource>,
    /// Metrics sink
    pub metrics: Arc<Metrics>,
}

struct EpochState {
    /// `None` until the first slot of the session pins it
    index: Option<u64>,
    config: EpochConfiguration,
    authorities: AuthoritySet,
    /// `None` when this node does not author in the epoch
    threshold: Option<Threshold>,
}

/// Slot authoring session
pub struct Session<E: ExecutionEngine, C: ChainView> {
    config: SlotConsensusConfig,
    deps: SessionDependencies<E, C>,
    state: SessionState,
    epoch: Option<EpochState>,
    claims: HashMap<u64, SlotClaim>,
    last_slot: Option<u64>,
    blocks: mpsc::Sender<Block>,
    /// Set while [`Session::run`] drives the session
    shutdown: Option<watch::Receiver<bool>>,
}

impl<E: ExecutionEngine, C: ChainView> Session<E, C> {
    /// Create a session emitting sealed blocks on `blocks`
    pub fn new(
        config: SlotConsensusConfig,
        deps: SessionDependencies<E, C>,
        blocks: mpsc::Sender<Block>,
    ) -> Self {
        Self {
            config,
            deps,
            state: SessionState::Uninitialized,
            epoch: None,
            claims: HashMap::new(),
            last_slot: None,
            blocks,
            shutdown: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Active epoch configuration
    pub fn epoch_configuration(&self) -> Option<&EpochConfiguration> {
        self.epoch.as_ref().map(|e| &e.config)
    }

    /// Index of the active epoch, once pinned by a slot
    pub fn epoch_index(&self) -> Option<u64> {
        self.epoch.as_ref().and_then(|e| e.index)
    }

    /// Lottery threshold for the active epoch
    pub fn threshold(&self) -> Option<Threshold> {
        self.epoch.as_ref().and_then(|e| e.threshold)
    }

    /// This node's position in the active authority set
    pub fn authority_index(&self) -> Option<u32> {
        self.epoch
            .as_ref()
            .and_then(|e| e.authorities.authority_index)
    }

    /// Claims won but not yet consumed
    pub fn pending_claims(&self) -> usize {
        self.claims.len()
    }

    /// Load the first epoch configuration.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        self.configure_epoch(None).await
    }

    /// Load configuration and recompute the threshold.
    ///
    /// On a load failure the previous epoch state is kept, so the next tick
    /// retries. A threshold failure installs the epoch with authoring halted.
    async fn configure_epoch(&mut self, slot: Option<u64>) -> Result<()> {
        self.state = SessionState::ConfiguringEpoch;

        let config = match load_configuration(self.deps.engine.as_ref()).await {
            Ok(config) => config,
            Err(err) => {
                self.deps.metrics.record_configuration_failure();
                self.state = SessionState::AwaitingSlot;
                return Err(err);
            }
        };

        let index = slot.map(|s| config.epoch_of(s));
        let authorities = AuthoritySet::derive(&config, &self.deps.keypair.public_key());
        let (threshold, outcome) = match authorities.authority_index {
            None => {
                info!(
                    "[{}] local key is not an authority in epoch {:?}, observing only",
                    crate::LOG_TARGET,
                    index
                );
                (None, Ok(()))
            }
            Some(authority_index) => match calculate_threshold(
                config.c1,
                config.c2,
                authority_index as usize,
                &config.weights(),
            ) {
                Ok(threshold) => (Some(threshold), Ok(())),
                Err(err) => {
                    error!(
                        "[{}] authoring halted for epoch {:?}: {}",
                        crate::LOG_TARGET,
                        index,
                        err
                    );
                    (None, Err(err))
                }
            },
        };

        info!(
            "[{}] configured epoch {:?}: {} authorities, authority index {:?}",
            crate::LOG_TARGET,
            index,
            config.authorities.len(),
            authorities.authority_index
        );
        self.epoch = Some(EpochState {
            index,
            config,
            authorities,
            threshold,
        });
        self.state = SessionState::AwaitingSlot;
        outcome
    }

    async fn ensure_epoch(&mut self, slot: u64) -> Result<()> {
        if let Some(epoch) = &mut self.epoch {
            let index = epoch.config.epoch_of(slot);
            match epoch.index {
                Some(current) if current == index => return Ok(()),
                None => {
                    epoch.index = Some(index);
                    return Ok(());
                }
                Some(current) => {
                    info!(
                        "[{}] epoch boundary at slot {}: {} -> {}",
                        crate::LOG_TARGET,
                        slot,
                        current,
                        index
                    );
                }
            }
        }
        self.configure_epoch(Some(slot)).await
    }

    fn best_header(&self) -> Result<BlockHeader> {
        self.deps
            .chain
            .best_hash()
            .and_then(|hash| self.deps.chain.block(&hash))
            .map(|observed| observed.header)
            .ok_or_else(|| SlotConsensusError::ChainViewUnavailable("no best block".into()))
    }

    /// Next slot to evaluate at wall-clock `now`.
    ///
    /// The start comes from the chain's median drift; with no usable chain
    /// the wall clock is used. Slots that already ended are skipped.
    fn next_slot(&self, now: u64) -> Option<Slot> {
        let duration = self.epoch.as_ref()?.config.slot_duration;
        let after_best = self
            .best_header()
            .ok()
            .map(|header| slot_of(&header) + 1)
            .unwrap_or(0);
        let after_last = self.last_slot.map(|s| s + 1).unwrap_or(0);
        let floor = after_best.max(after_last);

        match estimate_slot_time(
            floor,
            self.deps.chain.as_ref(),
            self.config.slot_time_window,
            duration,
        ) {
            Ok(start) => {
                let missed = if start.saturating_add(duration) <= now {
                    (now - start) / duration
                } else {
                    0
                };
                if missed > 0 {
                    debug!("[{}] skipping {} passed slots", crate::LOG_TARGET, missed);
                }
                Some(Slot {
                    number: floor + missed,
                    start: start + missed * duration,
                    duration,
                })
            }
            Err(err) => {
                debug!(
                    "[{}] slot estimation unavailable ({}), using wall clock",
                    crate::LOG_TARGET,
                    err
                );
                let number = floor.max(now / duration);
                Some(Slot {
                    number,
                    start: number.saturating_mul(duration),
                    duration,
                })
            }
        }
    }

    /// Advance the state machine by one slot.
    ///
    /// Returns the hash of the emitted block, or `None` when the slot was
    /// not won or this node does not author.
    pub async fn tick(&mut self, slot: Slot) -> Result<Option<Hash>> {
        self.last_slot = Some(slot.number);
        self.ensure_epoch(slot.number).await?;

        if !self.config.authoring_enabled {
            return Ok(None);
        }
        let Some(epoch) = &self.epoch else {
            return Err(SlotConsensusError::ConfigurationUnavailable(
                "no epoch configuration".into(),
            ));
        };
        let (Some(threshold), Some(authority_index)) =
            (epoch.threshold, epoch.authorities.authority_index)
        else {
            return Ok(None);
        };

        self.state = SessionState::ClaimingSlot;
        let won = match run_lottery(
            self.deps.keypair.as_ref(),
            &epoch.config.randomness,
            &threshold,
            slot.number,
        ) {
            Ok(won) => won,
            Err(err) => {
                warn!("[{}] lottery failed for slot {}: {}", crate::LOG_TARGET, slot.number, err);
                self.deps.metrics.record_slot_evaluated(false);
                self.state = SessionState::AwaitingSlot;
                return Ok(None);
            }
        };
        self.deps.metrics.record_slot_evaluated(won.is_some());

        let Some(claim) = won else {
            self.state = SessionState::AwaitingSlot;
            return Ok(None);
        };
        self.claims.insert(slot.number, claim);

        self.state = SessionState::BuildingBlock;
        let result = self.author_block(&slot, authority_index).await;
        self.claims.remove(&slot.number);
        self.state = SessionState::AwaitingSlot;

        if let Err(err) = &result {
            self.deps.metrics.record_build_failure();
            warn!("[{}] slot {} skipped: {}", crate::LOG_TARGET, slot.number, err);
        }
        result.map(Some)
    }

    fn restore_applied(&self, applied: Vec<PendingTransaction>) {
        if applied.is_empty() {
            return;
        }
        self.deps.metrics.record_requeued(applied.len());
        self.deps.queue.push_front_all(applied);
    }

    async fn author_block(&mut self, slot: &Slot, authority_index: u32) -> Result<Hash> {
        let parent = self.best_header()?;
        let claim = self.claims.remove(&slot.number);

        let builder = BlockBuilder::new(
            self.deps.engine.as_ref(),
            self.deps.queue.as_ref(),
            self.config.block_limits,
            self.deps.metrics.as_ref(),
        );
        let BuiltBlock { mut block, applied } = builder
            .build_block(&parent, slot, claim, authority_index)
            .await?;

        let sealed = seal_header(&mut block.header, self.deps.keypair.as_ref())
            .and_then(|_| block.header.hash().map_err(SlotConsensusError::from));
        let hash = match sealed {
            Ok(hash) => hash,
            Err(err) => {
                self.restore_applied(applied);
                return Err(err);
            }
        };

        let reserved = match self.shutdown.as_mut() {
            Some(shutdown) => tokio::select! {
                permit = self.blocks.reserve() => Some(permit),
                _ = shutdown_requested(shutdown) => None,
            },
            None => Some(self.blocks.reserve().await),
        };
        let permit = match reserved {
            Some(Ok(permit)) => permit,
            Some(Err(_)) => {
                self.restore_applied(applied);
                return Err(SlotConsensusError::ChannelClosed);
            }
            None => {
                self.restore_applied(applied);
                return Err(SlotConsensusError::ShuttingDown);
            }
        };

        let count = block.body.len();
        let number = block.header.number;
        permit.send(block);

        self.deps.metrics.record_block_authored(count);
        info!(
            "[{}] sealed block #{} for slot {} ({} extrinsics)",
            crate::LOG_TARGET,
            number,
            slot.number,
            count
        );
        Ok(hash)
    }

    /// Wait for `delay` or a shutdown signal. Returns true on shutdown.
    async fn wait(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
        let changed = tokio::select! {
            _ = tokio::time::sleep(delay) => None,
            changed = shutdown.changed() => Some(changed.is_err()),
        };
        match changed {
            None => false,
            Some(true) => true,
            Some(false) => *shutdown.borrow(),
        }
    }

    /// Drive the slot loop until `shutdown` flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[{}] authoring session starting", crate::LOG_TARGET);
        self.shutdown = Some(shutdown.clone());
        let retry = Duration::from_millis(self.config.retry_delay_ms);

        loop {
            if *shutdown.borrow() {
                break;
            }

            if self.epoch.is_none() {
                if let Err(err) = self.configure_epoch(None).await {
                    warn!("[{}] {}", crate::LOG_TARGET, err);
                }
            }

            let now = self.deps.time.now();
            let Some(slot) = self.next_slot(now) else {
                if Self::wait(&mut shutdown, retry).await {
                    break;
                }
                continue;
            };

            if slot.start > now
                && Self::wait(&mut shutdown, Duration::from_millis(slot.start - now)).await
            {
                break;
            }

            match self.tick(slot).await {
                Ok(Some(hash)) => debug!(
                    "[{}] emitted block 0x{}",
                    crate::LOG_TARGET,
                    hash[..4].iter().map(|b| format!("{b:02x}")).collect::<String>()
                ),
                Ok(None) => {}
                Err(SlotConsensusError::ChannelClosed) => {
                    warn!("[{}] block channel closed, stopping", crate::LOG_TARGET);
                    break;
                }
                Err(SlotConsensusError::ShuttingDown) => break,
                Err(err) if err.is_critical() => {
                    error!("[{}] slot {}: {}", crate::LOG_TARGET, slot.number, err)
                }
                Err(err) => debug!("[{}] slot {}: {}", crate::LOG_TARGET, slot.number, err),
            }
        }

        self.state = SessionState::Stopped;
        info!("[{}] authoring session stopped", crate::LOG_TARGET);
    }
}

impl<E, C> Session<E, C>
where
    E: ExecutionEngine + 'static,
    C: ChainView + 'static,
{
    /// Spawn the slot loop on the current tokio runtime
    pub fn start(self) -> SessionHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        SessionHandle { shutdown, task }
    }
}

/// Resolves once shutdown is requested or the handle is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Handle to a running session
pub struct SessionHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Returns true once the loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request shutdown and wait for the loop to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            error!("[{}] session task failed: {}", crate::LOG_TARGET, err);
        }
    }
}
