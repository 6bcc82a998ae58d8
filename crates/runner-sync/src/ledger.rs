//! Seams to the outside world: the game contract and the reward service.
//!
//! Reads and writes are split so a read-only view can be handed around
//! without write access. Every call is bound to the connected wallet, except
//! `player_of`, which looks up other players for leaderboard names.

use crate::error::Result;
use crate::model::{PlayerRecord, Receipt, SessionInput, SessionRecord, StageFlags, TxId};

pub trait RunnerReads {
    /// Address of the connected wallet.
    fn wallet(&self) -> String;

    /// The connected player's record. Unknown wallets read as the
    /// unregistered default, not as an error.
    fn player(&self) -> Result<PlayerRecord>;

    fn player_of(&self, address: &str) -> Result<PlayerRecord>;

    fn stage_completed(&self, stage: u32) -> Result<bool>;
    fn tokens_claimed(&self, stage: u32) -> Result<bool>;
    fn nft_claimed(&self, stage: u32) -> Result<bool>;

    /// All per-stage flags in one value.
    ///
    /// The default issues the per-stage reads one by one and leaves a flag
    /// `None` when its read fails, so callers see partial state instead of a
    /// guessed `false`.
    fn stage_flags(&self, stage_count: u32) -> StageFlags {
        let mut flags = StageFlags::unresolved(stage_count);
        for stage in 1..=stage_count {
            match self.stage_completed(stage) {
                Ok(value) => flags.set_completed(stage, value),
                Err(e) => log::warn!("[SYNC] completion read failed stage:{} error:{}", stage, e),
            }
            match self.tokens_claimed(stage) {
                Ok(value) => flags.set_tokens_claimed(stage, value),
                Err(e) => log::warn!("[SYNC] token claim read failed stage:{} error:{}", stage, e),
            }
            match self.nft_claimed(stage) {
                Ok(value) => flags.set_nft_claimed(stage, value),
                Err(e) => log::warn!("[SYNC] nft claim read failed stage:{} error:{}", stage, e),
            }
        }
        flags
    }

    /// Best sessions across all stages, not aggregated per player.
    fn general_leaderboard(&self, limit: u32) -> Result<Vec<SessionRecord>>;

    fn stage_leaderboard(&self, stage: u32, limit: u32) -> Result<Vec<SessionRecord>>;
}

/// Writes return as soon as they are sent; `await_confirmation` blocks until
/// the ledger has applied (or refused) them.
pub trait RunnerWrites {
    fn register_player(&mut self, username: &str) -> Result<TxId>;
    fn save_game_session(&mut self, input: &SessionInput) -> Result<TxId>;
    fn claim_tokens(&mut self, stage: u32) -> Result<TxId>;
    fn claim_nft(&mut self, stage: u32) -> Result<TxId>;
    fn purchase_item(&mut self, item_type: &str, cost: u64) -> Result<TxId>;
    fn await_confirmation(&mut self, tx: TxId) -> Result<Receipt>;
}

pub trait RunnerLedger: RunnerReads + RunnerWrites {}

impl<T: RunnerReads + RunnerWrites> RunnerLedger for T {}

/// The token-minting service. The two mints are independent: one may land
/// while the other does not. Coins are minted against a stage so a retry
/// can tell which stage's coins already landed.
pub trait RewardService {
    fn has_stage_coins(&self, stage: u32) -> Result<bool>;
    fn owns_badge(&self, badge_name: &str) -> Result<bool>;
    fn mint_quest_coins(&mut self, stage: u32, amount: u64) -> Result<bool>;
    fn mint_badge(&mut self, badge_name: &str) -> Result<bool>;
}
