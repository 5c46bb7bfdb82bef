pub mod batch;
pub mod commitment;
pub mod error;
pub mod events;
pub mod metrics;
pub mod transaction;

pub use batch::{Batch, BatchParams, BatchStatus, OrderingMethod};
pub use commitment::{BatchId, Commitment, CommitmentHash, UserAddress};
pub use error::BatchError;
pub use events::{DomainEvent, EventData};
pub use metrics::MevMetrics;
pub use transaction::{RevealedTransaction, TransactionData};
