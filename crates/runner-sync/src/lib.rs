//! # Runner Sync
//!
//! Client-side mirror of a Mindora Runner player.
//!
//! The game contract is the system of record, but its per-stage flags can
//! lag behind the player record right after a write, and individual reads
//! can fail. This crate turns whatever reads are available into one
//! consistent [`PlayerProjection`]:
//!
//! - [`ledger`] defines the read/write seams; [`soroban`] implements them over
//!   the contract clients.
//! - [`reconcile`] decides which stages count as completed and why.
//! - [`claims`] derives the claimed-reward sets.
//! - [`projection`] owns the projection and rebuilds it on every event.
//! - [`pipeline`] runs session submissions and reward issuance.
//! - [`GameSync`] ties them together for one connected wallet.

pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod reconcile;
pub mod soroban;
mod sync;

pub use claims::{aggregate_claims, ClaimSets};
pub use config::{RewardTier, SyncConfig};
pub use error::{Result, SyncError};
pub use leaderboard::{aggregate_sessions, LeaderboardEntry};
pub use ledger::{RewardService, RunnerLedger, RunnerReads, RunnerWrites};
pub use model::{Fetch, PlayerRecord, Receipt, RewardHalf, SessionInput, SessionRecord, StageFlags, TxId};
pub use pipeline::{HalfOutcome, Phase, RewardOutcome, Step};
pub use projection::{DataSource, PlayerProjection, ProjectionStore, Snapshot, StoreEvent};
pub use reconcile::{resolve_completion, Completion, Evidence};
pub use sync::{GameSync, SessionReport};
