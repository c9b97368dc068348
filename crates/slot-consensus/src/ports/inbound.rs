//! Inbound ports (driving side - API)

use shared_types::PendingTransaction;

/// Primary port: transaction ingestion into the authoring queue
pub trait TransactionSubmitter: Send + Sync {
    /// Queue a transaction behind everything already pending at its priority
    fn submit(&self, transaction: PendingTransaction);

    /// Number of pending transactions
    fn pending_count(&self) -> usize;
}
