//! The local player projection and its single writer.
//!
//! `ProjectionStore` keeps the last raw `Snapshot` and derives the
//! `PlayerProjection` from it. Events edit the snapshot and the projection
//! is rebuilt from scratch every time, so two events arriving back to back
//! can never leave a half-updated record behind.

use std::collections::BTreeSet;

use mindora_runner::{COMPLETION_MULTIPLIER, REGISTRATION_BONUS};

use crate::claims::{aggregate_claims, ClaimSets};
use crate::error::SyncError;
use crate::model::{Fetch, PlayerRecord, RewardHalf, SessionInput, StageFlags};
use crate::reconcile::{resolve_completion, Completion};

/// Raw upstream reads, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub player: Fetch<PlayerRecord>,
    pub flags: StageFlags,
}

impl Snapshot {
    /// No wallet connected.
    pub fn disconnected(stage_count: u32) -> Self {
        Self {
            player: Fetch::Failed(SyncError::Transport("wallet disconnected".to_string())),
            flags: StageFlags::unresolved(stage_count),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Built from a successful player read.
    Chain,
    /// The player read failed; fields hold the unregistered default.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerProjection {
    pub source: DataSource,
    pub username: String,
    pub is_registered: bool,
    /// Never below 1, even for unregistered players.
    pub current_stage: u32,
    pub total_score: u64,
    pub in_game_coins: u64,
    pub quest_tokens_earned: u64,
    pub total_games_played: u32,
    pub registration_time: u64,
    pub completion: Completion,
    pub claims: ClaimSets,
}

impl PlayerProjection {
    pub fn build(snapshot: &Snapshot, thresholds: &[u64]) -> Self {
        let (source, record) = match &snapshot.player {
            Fetch::Ready(record) => (DataSource::Chain, record.clone()),
            Fetch::Failed(_) => (DataSource::Unavailable, PlayerRecord::default()),
        };

        let (completion, claims) = if record.is_registered {
            (
                resolve_completion(
                    &snapshot.flags.completed,
                    record.current_stage,
                    record.quest_tokens_earned,
                    thresholds,
                ),
                aggregate_claims(&snapshot.flags.tokens_claimed, &snapshot.flags.nft_claimed),
            )
        } else {
            (Completion::default(), ClaimSets::default())
        };

        Self {
            source,
            username: record.username,
            is_registered: record.is_registered,
            current_stage: record.current_stage.max(1),
            total_score: record.total_score,
            in_game_coins: record.in_game_coins,
            quest_tokens_earned: record.quest_tokens_earned,
            total_games_played: record.total_games_played,
            registration_time: record.registration_time,
            completion,
            claims,
        }
    }

    pub fn completed_stages(&self) -> BTreeSet<u32> {
        self.completion.stages()
    }

    pub fn is_unlocked(&self, stage: u32) -> bool {
        stage >= 1 && stage <= self.current_stage
    }

    /// A claim action makes sense: the stage is done and some half is still
    /// outstanding.
    pub fn can_claim(&self, stage: u32) -> bool {
        self.completion.contains(stage) && !self.claims.is_fully_claimed(stage)
    }
}

/// Logical events that change what the player looks like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A fresh read replaced the snapshot.
    Refreshed(Snapshot),
    Registered {
        username: String,
        registration_time: u64,
    },
    /// A session write was confirmed. `token_reward` is what the stage pays
    /// on first completion.
    SessionConfirmed {
        input: SessionInput,
        token_reward: u64,
    },
    ClaimConfirmed {
        stage: u32,
        half: RewardHalf,
    },
    PurchaseConfirmed {
        cost: u64,
    },
    Disconnected,
}

pub struct ProjectionStore {
    thresholds: Vec<u64>,
    snapshot: Snapshot,
    projection: PlayerProjection,
    revision: u64,
}

impl ProjectionStore {
    pub fn new(thresholds: Vec<u64>) -> Self {
        let snapshot = Snapshot::disconnected(thresholds.len() as u32);
        let projection = PlayerProjection::build(&snapshot, &thresholds);
        Self {
            thresholds,
            snapshot,
            projection,
            revision: 0,
        }
    }

    pub fn projection(&self) -> &PlayerProjection {
        &self.projection
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Bumped on every applied event.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one event and rebuild the projection.
    pub fn apply(&mut self, event: StoreEvent) -> &PlayerProjection {
        let stage_count = self.thresholds.len() as u32;
        match event {
            StoreEvent::Refreshed(snapshot) => self.snapshot = snapshot,
            StoreEvent::Disconnected => self.snapshot = Snapshot::disconnected(stage_count),
            StoreEvent::Registered {
                username,
                registration_time,
            } => {
                self.snapshot.player = Fetch::Ready(PlayerRecord {
                    username,
                    is_registered: true,
                    current_stage: 1,
                    in_game_coins: REGISTRATION_BONUS,
                    registration_time,
                    ..PlayerRecord::default()
                });
                let mut flags = StageFlags::unresolved(stage_count);
                for stage in 1..=stage_count {
                    flags.set_completed(stage, false);
                    flags.set_tokens_claimed(stage, false);
                    flags.set_nft_claimed(stage, false);
                }
                self.snapshot.flags = flags;
            }
            StoreEvent::SessionConfirmed { input, token_reward } => {
                let already_completed = input
                    .stage
                    .checked_sub(1)
                    .and_then(|i| self.snapshot.flags.completed.get(i as usize))
                    == Some(&Some(true));
                let first_completion = input.stage_completed && !already_completed;
                if let Fetch::Ready(record) = &mut self.snapshot.player {
                    let coins = if input.stage_completed {
                        input.coins_collected.saturating_mul(COMPLETION_MULTIPLIER)
                    } else {
                        input.coins_collected
                    };
                    record.total_score = record.total_score.saturating_add(input.final_score);
                    record.in_game_coins = record.in_game_coins.saturating_add(coins);
                    record.total_games_played = record.total_games_played.saturating_add(1);
                    if first_completion {
                        record.quest_tokens_earned =
                            record.quest_tokens_earned.saturating_add(token_reward);
                        if input.stage < stage_count && record.current_stage <= input.stage {
                            record.current_stage = input.stage + 1;
                        }
                    }
                }
                if input.stage_completed {
                    self.snapshot.flags.set_completed(input.stage, true);
                }
            }
            StoreEvent::ClaimConfirmed { stage, half } => match half {
                RewardHalf::Tokens => self.snapshot.flags.set_tokens_claimed(stage, true),
                RewardHalf::Nft => self.snapshot.flags.set_nft_claimed(stage, true),
            },
            StoreEvent::PurchaseConfirmed { cost } => {
                if let Fetch::Ready(record) = &mut self.snapshot.player {
                    record.in_game_coins = record.in_game_coins.saturating_sub(cost);
                }
            }
        }

        self.revision += 1;
        self.projection = PlayerProjection::build(&self.snapshot, &self.thresholds);
        &self.projection
    }
}
