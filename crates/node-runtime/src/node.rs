//! # Development Node
//!
//! Wires one slot authoring session to the in-memory adapters:
//!
//! ```text
//!   feeder ──push──→ TransactionQueue ──drain──→ Session ──Block──→ importer
//!                                                   ↑                  │
//!                                                   └─ InMemoryChainView ←┘
//! ```
//!
//! The importer checks each seal against the local authority key before
//! appending the header to the block tree, so the next slot builds on it.

use crate::config::{NodeConfig, DEMO_RECEIVER, DEMO_SENDER};
use anyhow::{Context, Result};
use shared_crypto::{Sr25519KeyPair, Sr25519PublicKey};
use shared_types::{Block, PendingTransaction};
use slot_consensus::adapters::RuntimeState;
use slot_consensus::{
    verify_sealed_header, Call, EpochConfigurationRaw, InMemoryChainView,
    InMemoryExecutionEngine, Metrics, Session, SessionDependencies, SessionHandle,
    SystemTimeSource, TimeSource, TransactionQueue,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A single-authority chain held entirely in memory.
pub struct DevNode {
    config: NodeConfig,
    keypair: Arc<Sr25519KeyPair>,
    engine: Arc<InMemoryExecutionEngine>,
    chain: Arc<InMemoryChainView>,
    queue: Arc<TransactionQueue>,
    metrics: Arc<Metrics>,
    time: Arc<dyn TimeSource>,
}

impl DevNode {
    /// Build genesis from `config` with the local key as sole authority.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let keypair = Arc::new(
            Sr25519KeyPair::from_seed(config.authority_seed).context("Invalid authority seed")?,
        );
        let genesis = &config.genesis;
        let consensus = EpochConfigurationRaw {
            slot_duration: genesis.slot_duration_ms,
            epoch_length: genesis.epoch_length,
            c1: genesis.c1,
            c2: genesis.c2,
            authority_keys: vec![keypair.public_key().as_bytes().to_vec()],
            authority_weights: vec![1],
            randomness: genesis.randomness.to_vec(),
            secondary_slots: false,
        };
        let engine = Arc::new(
            InMemoryExecutionEngine::new(
                consensus,
                RuntimeState::with_balances(genesis.endowed.iter().copied()),
            )
            .context("Failed to build genesis state")?,
        );

        let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let genesis_header = engine.genesis_header();
        let chain = Arc::new(
            InMemoryChainView::with_genesis(genesis_header, time.now())
                .context("Failed to import genesis")?,
        );

        info!(
            "Genesis created: authority={}, slot={}ms, epoch={} slots, c={}/{}",
            hex::encode(keypair.public_key().as_bytes()),
            genesis.slot_duration_ms,
            genesis.epoch_length,
            genesis.c1,
            genesis.c2
        );

        Ok(Self {
            config,
            keypair,
            engine,
            chain,
            queue: Arc::new(TransactionQueue::new()),
            metrics: Arc::new(Metrics::new()),
            time,
        })
    }

    /// Public key of the local authority
    pub fn public_key(&self) -> Sr25519PublicKey {
        self.keypair.public_key()
    }

    /// Block tree
    pub fn chain(&self) -> Arc<InMemoryChainView> {
        Arc::clone(&self.chain)
    }

    /// Pending transaction queue
    pub fn queue(&self) -> Arc<TransactionQueue> {
        Arc::clone(&self.queue)
    }

    /// Execution engine
    pub fn engine(&self) -> Arc<InMemoryExecutionEngine> {
        Arc::clone(&self.engine)
    }

    /// Authoring counters
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Spawn the session, the block importer and, if enabled, the feeder.
    pub fn start(&self) -> RunningNode {
        let (blocks_tx, blocks_rx) = mpsc::channel(self.config.consensus.block_channel_capacity);
        let deps = SessionDependencies {
            engine: Arc::clone(&self.engine),
            chain: Arc::clone(&self.chain),
            queue: Arc::clone(&self.queue),
            keypair: self.keypair.clone(),
            time: Arc::clone(&self.time),
            metrics: Arc::clone(&self.metrics),
        };
        let session = Session::new(self.config.consensus.clone(), deps, blocks_tx).start();

        let importer = tokio::spawn(import_blocks(
            blocks_rx,
            Arc::clone(&self.chain),
            self.public_key(),
            Arc::clone(&self.time),
        ));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let feeder = self.config.demo_transfers.then(|| {
            let period = Duration::from_millis(self.config.genesis.slot_duration_ms);
            tokio::spawn(feed_transfers(Arc::clone(&self.queue), period, shutdown_rx))
        });

        info!("Slot authoring started");
        RunningNode {
            session,
            importer,
            feeder,
            shutdown,
        }
    }
}

/// Tasks of a started node.
pub struct RunningNode {
    session: SessionHandle,
    importer: JoinHandle<()>,
    feeder: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl RunningNode {
    /// Shutdown the node gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Stop the feeder
    /// 2. Stop the session, which closes the block channel
    /// 3. Let the importer drain what was already emitted
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown.send(true) {
            debug!("Feeder already gone: {}", e);
        }
        if let Some(feeder) = self.feeder {
            if let Err(e) = feeder.await {
                error!("Feeder task failed: {}", e);
            }
        }

        self.session.stop().await;

        if let Err(e) = self.importer.await {
            error!("Importer task failed: {}", e);
        }

        info!("Shutdown complete");
    }
}

async fn import_blocks(
    mut blocks: mpsc::Receiver<Block>,
    chain: Arc<InMemoryChainView>,
    authority: Sr25519PublicKey,
    time: Arc<dyn TimeSource>,
) {
    while let Some(block) = blocks.recv().await {
        let number = block.header.number;
        if !verify_sealed_header(&block.header, &authority) {
            warn!("Rejecting block #{}: bad seal", number);
            continue;
        }

        let slot = block.header.slot_number();
        match chain.import(block.header, time.now()) {
            Ok(hash) => info!(
                "Imported block #{} slot={:?} extrinsics={} hash={}",
                number,
                slot,
                block.body.len(),
                hex::encode(&hash[..8])
            ),
            Err(e) => warn!("Failed to import block #{}: {}", number, e),
        }
    }
    debug!("Block channel closed, importer exiting");
}

async fn feed_transfers(
    queue: Arc<TransactionQueue>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    let mut forward = true;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (from, to) = if forward {
                    (DEMO_SENDER, DEMO_RECEIVER)
                } else {
                    (DEMO_RECEIVER, DEMO_SENDER)
                };
                forward = !forward;
                let call = Call::Transfer { from, to, amount: 1 };
                queue.push(PendingTransaction::with_default_validity(call.encode()));
            }
            _ = shutdown.changed() => break,
        }
    }
}
