//! Host-side mirrors of the contract records.

use crate::error::SyncError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub username: String,
    pub is_registered: bool,
    pub current_stage: u32,
    pub total_score: u64,
    pub in_game_coins: u64,
    pub quest_tokens_earned: u64,
    pub total_games_played: u32,
    pub registration_time: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    /// Wallet address of the player.
    pub player: String,
    pub stage: u32,
    pub score: u64,
    pub coins_collected: u64,
    pub stage_completed: bool,
    pub timestamp: u64,
}

/// Results of one finished run, as sent to `save_game_session`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionInput {
    pub stage: u32,
    pub final_score: u64,
    pub coins_collected: u64,
    pub questions_correct: u32,
    pub stage_completed: bool,
}

impl SessionInput {
    /// A completed run always carries at least one correct answer; the quiz
    /// tally can still be empty when the run ends on the same tick as the
    /// last answer.
    pub fn normalized(mut self) -> Self {
        if self.stage_completed && self.questions_correct == 0 {
            log::warn!(
                "[SESSION] stage:{} completed with empty answer tally, submitting 1",
                self.stage
            );
            self.questions_correct = 1;
        }
        self
    }
}

/// Per-stage flags, index `stage - 1`. `None` is a sub-read that has not
/// settled (or failed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub completed: Vec<Option<bool>>,
    pub tokens_claimed: Vec<Option<bool>>,
    pub nft_claimed: Vec<Option<bool>>,
}

impl StageFlags {
    pub fn unresolved(stage_count: u32) -> Self {
        let n = stage_count as usize;
        Self {
            completed: vec![None; n],
            tokens_claimed: vec![None; n],
            nft_claimed: vec![None; n],
        }
    }

    /// Every sub-read has produced an answer.
    pub fn is_settled(&self) -> bool {
        self.completed
            .iter()
            .chain(&self.tokens_claimed)
            .chain(&self.nft_claimed)
            .all(Option::is_some)
    }

    pub fn stage_count(&self) -> u32 {
        self.completed.len() as u32
    }

    fn slot(flags: &mut [Option<bool>], stage: u32) -> Option<&mut Option<bool>> {
        let index = stage.checked_sub(1)? as usize;
        flags.get_mut(index)
    }

    pub fn set_completed(&mut self, stage: u32, value: bool) {
        if let Some(slot) = Self::slot(&mut self.completed, stage) {
            *slot = Some(value);
        }
    }

    pub fn set_tokens_claimed(&mut self, stage: u32, value: bool) {
        if let Some(slot) = Self::slot(&mut self.tokens_claimed, stage) {
            *slot = Some(value);
        }
    }

    pub fn set_nft_claimed(&mut self, stage: u32, value: bool) {
        if let Some(slot) = Self::slot(&mut self.nft_claimed, stage) {
            *slot = Some(value);
        }
    }
}

/// Outcome of a read that may not have reached the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetch<T> {
    Ready(T),
    Failed(SyncError),
}

impl<T> Fetch<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetch::Ready(value) => Some(value),
            Fetch::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetch::Failed(_))
    }
}

impl<T> From<crate::error::Result<T>> for Fetch<T> {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(value) => Fetch::Ready(value),
            Err(err) => Fetch::Failed(err),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId(pub u64);

/// Proof that a write was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx: TxId,
    pub ledger_timestamp: u64,
}

/// The two independently minted parts of a stage reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RewardHalf {
    Tokens,
    Nft,
}

impl RewardHalf {
    pub fn all() -> [RewardHalf; 2] {
        [RewardHalf::Tokens, RewardHalf::Nft]
    }
}

impl std::fmt::Display for RewardHalf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardHalf::Tokens => f.write_str("tokens"),
            RewardHalf::Nft => f.write_str("nft"),
        }
    }
}
