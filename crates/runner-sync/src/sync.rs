use std::collections::BTreeMap;

use mindora_runner::MAX_BOARD_ENTRIES;

use crate::cache::ReadCache;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::leaderboard::{aggregate_sessions, display_name, LeaderboardEntry};
use crate::ledger::{RewardService, RunnerLedger};
use crate::model::{Fetch, Receipt, SessionInput, SessionRecord, TxId};
use crate::pipeline::{issue_rewards, Phase, RewardOutcome, SessionPipeline};
use crate::projection::{PlayerProjection, ProjectionStore, Snapshot, StoreEvent};

/// What a confirmed session submission produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub receipt: Receipt,
    /// Present when the run completed its stage and rewards were attempted.
    pub rewards: Option<RewardOutcome>,
}

/// Keeps one player's projection in step with the ledger.
///
/// Every write goes send → confirm → projection event → forced re-read, in
/// that order, on the calling thread.
pub struct GameSync<L, M> {
    ledger: L,
    rewards: M,
    config: SyncConfig,
    cache: ReadCache,
    store: ProjectionStore,
    pipeline: SessionPipeline,
    unsettled: BTreeMap<u32, RewardOutcome>,
}

impl<L: RunnerLedger, M: RewardService> GameSync<L, M> {
    pub fn new(ledger: L, rewards: M, config: SyncConfig) -> Self {
        let cache = ReadCache::new(config.cache_ttl);
        let store = ProjectionStore::new(config.cumulative_thresholds());
        Self {
            ledger,
            rewards,
            config,
            cache,
            store,
            pipeline: SessionPipeline::new(),
            unsettled: BTreeMap::new(),
        }
    }

    pub fn projection(&self) -> &PlayerProjection {
        self.store.projection()
    }

    pub fn store(&self) -> &ProjectionStore {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        self.pipeline.phase()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn reward_service(&self) -> &M {
        &self.rewards
    }

    pub fn reward_service_mut(&mut self) -> &mut M {
        &mut self.rewards
    }

    /// Stages whose last reward attempt left a half missing.
    pub fn unsettled_rewards(&self) -> &BTreeMap<u32, RewardOutcome> {
        &self.unsettled
    }

    // ─── Reads ─────────────────────────────────────────────────────────────

    /// Re-read the player, serving from cache where it is still fresh.
    pub fn refresh(&mut self) -> &PlayerProjection {
        let player = match self.cache.player() {
            Some(record) => Fetch::Ready(record),
            None => {
                let fetched = Fetch::from(self.ledger.player());
                match &fetched {
                    Fetch::Ready(record) => self.cache.store_player(record.clone()),
                    Fetch::Failed(e) => log::warn!("[SYNC] player read failed: {}", e),
                }
                fetched
            }
        };

        let flags = match self.cache.flags() {
            Some(flags) => flags,
            None => {
                let flags = self.ledger.stage_flags(self.config.stage_count());
                self.cache.store_flags(flags.clone());
                flags
            }
        };

        self.store.apply(StoreEvent::Refreshed(Snapshot { player, flags }))
    }

    /// Drop cached reads and re-read everything.
    pub fn force_refresh(&mut self) -> &PlayerProjection {
        self.cache.invalidate();
        self.refresh()
    }

    pub fn disconnect(&mut self) {
        self.cache.invalidate();
        self.unsettled.clear();
        self.store.apply(StoreEvent::Disconnected);
    }

    /// General leaderboard, one entry per player, with display names.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let fetch = MAX_BOARD_ENTRIES.saturating_mul(self.config.stage_count());
        let sessions = self.ledger.general_leaderboard(fetch)?;
        Ok(self.named(&sessions))
    }

    pub fn stage_leaderboard(&self, stage: u32) -> Result<Vec<LeaderboardEntry>> {
        if self.config.reward(stage).is_none() {
            return Err(SyncError::UnknownStage(stage));
        }
        let sessions = self.ledger.stage_leaderboard(stage, MAX_BOARD_ENTRIES)?;
        Ok(self.named(&sessions))
    }

    fn named(&self, sessions: &[SessionRecord]) -> Vec<LeaderboardEntry> {
        let mut entries = aggregate_sessions(sessions, self.config.leaderboard_limit as usize);
        for entry in &mut entries {
            let username = match self.ledger.player_of(&entry.player) {
                Ok(record) => record.username,
                Err(e) => {
                    log::debug!("[SYNC] no name for {}: {}", entry.player, e);
                    String::new()
                }
            };
            entry.username = display_name(&entry.player, &username);
        }
        entries
    }

    // ─── Writes ────────────────────────────────────────────────────────────

    pub fn register(&mut self, username: &str) -> Result<&PlayerProjection> {
        let tx = self.ledger.register_player(username)?;
        let receipt = self.ledger.await_confirmation(tx)?;
        log::info!(
            "[SYNC] registered player:{} name:{}",
            self.ledger.wallet(),
            username
        );

        self.store.apply(StoreEvent::Registered {
            username: username.to_string(),
            registration_time: receipt.ledger_timestamp,
        });
        Ok(self.force_refresh())
    }

    /// Send a session write without waiting for it. The projection is left
    /// alone until `confirm_session`.
    pub fn begin_session(&mut self, input: SessionInput) -> Result<TxId> {
        self.pipeline.submit(&mut self.ledger, input)
    }

    /// Wait for the pending session, apply it, issue rewards for a completed
    /// stage if configured, then re-read.
    pub fn confirm_session(&mut self) -> Result<SessionReport> {
        let (input, receipt) = self.pipeline.confirm(&mut self.ledger)?;
        self.cache.invalidate();

        let token_reward = self
            .config
            .reward(input.stage)
            .map_or(0, |tier| tier.quest_tokens);
        self.store.apply(StoreEvent::SessionConfirmed {
            input: input.clone(),
            token_reward,
        });

        let rewards = if input.stage_completed && self.config.auto_issue_rewards {
            let outcome = self.run_rewards(input.stage);
            match &outcome {
                Ok(outcome) => self.pipeline.rewards_issued(outcome),
                Err(e) => {
                    log::error!("[SESSION] rewards not issued stage:{} error:{}", input.stage, e);
                    self.pipeline.rewards_failed(e.clone());
                }
            }
            outcome.ok()
        } else {
            None
        };

        self.force_refresh();
        self.pipeline.settle();
        Ok(SessionReport { receipt, rewards })
    }

    pub fn submit_session(&mut self, input: SessionInput) -> Result<SessionReport> {
        self.begin_session(input)?;
        self.confirm_session()
    }

    /// Claim both halves of a stage reward. Halves already claimed on chain
    /// are skipped, so a retry after a partial failure only redoes the
    /// missing half.
    pub fn claim_rewards(&mut self, stage: u32) -> Result<RewardOutcome> {
        let outcome = self.run_rewards(stage);
        self.force_refresh();
        outcome
    }

    pub fn purchase_item(&mut self, item_type: &str, cost: u64) -> Result<Receipt> {
        let tx = self.ledger.purchase_item(item_type, cost)?;
        let receipt = self.ledger.await_confirmation(tx)?;
        log::info!("[SYNC] purchased item:{} cost:{}", item_type, cost);

        self.cache.invalidate();
        self.store.apply(StoreEvent::PurchaseConfirmed { cost });
        self.force_refresh();
        Ok(receipt)
    }

    fn run_rewards(&mut self, stage: u32) -> Result<RewardOutcome> {
        let outcome = issue_rewards(&mut self.ledger, &mut self.rewards, &self.config, stage)?;
        self.cache.invalidate();

        for half in outcome.issued() {
            self.store.apply(StoreEvent::ClaimConfirmed { stage, half });
        }
        if outcome.is_complete() {
            self.unsettled.remove(&stage);
        } else {
            for half in outcome.missing() {
                log::warn!("[SYNC] stage:{} {} reward still missing", stage, half);
            }
            self.unsettled.insert(stage, outcome.clone());
        }
        Ok(outcome)
    }
}
