// fairbatch: off-chain coordinator for commit-reveal batch auctions.
//
// Users publish binding, content-hiding commitments while a batch's
// commitment window is open, reveal the underlying transactions during the
// reveal window, and a deterministic ordering over the revealed set is fixed
// at finalization. Because nobody can read transaction contents before the
// ordering is locked in, content-based front-running, sandwiching and
// back-running are structurally prevented.

pub mod api;
pub mod bridge;
pub mod clock;
pub mod commitment_hash;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod numeric;
pub mod repository;
pub mod service_metrics;
pub mod usecases;

pub use error::CoordinatorError;
pub use usecases::{CoordinatorContext, Envelope};
