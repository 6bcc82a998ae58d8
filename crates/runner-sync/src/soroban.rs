//! Ledger seams over the Soroban contract clients.
//!
//! Calls run through the generated `try_*` client methods so that a
//! contract error comes back as `SyncError::Rejected` and anything the host
//! could not complete or decode as `SyncError::Transport`. The `Env` must be
//! able to authorize the player (and the minter) for writes to pass.

use std::collections::BTreeMap;
use std::fmt::Debug;

use mindora_runner::MindoraRunnerClient;
use quest_rewards::QuestRewardsClient;
use soroban_sdk::{Address, Env, InvokeError, String as SorobanString};

use crate::error::{Result, SyncError};
use crate::ledger::{RewardService, RunnerReads, RunnerWrites};
use crate::model::{PlayerRecord, Receipt, SessionInput, SessionRecord, StageFlags, TxId};

fn settle<T, C: Debug, E: Debug>(
    op: &str,
    result: std::result::Result<std::result::Result<T, C>, std::result::Result<E, InvokeError>>,
) -> Result<T> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(SyncError::Transport(format!("{op}: undecodable result {e:?}"))),
        Err(Ok(e)) => Err(SyncError::Rejected(format!("{op}: {e:?}"))),
        Err(Err(e)) => Err(SyncError::Transport(format!("{op}: {e:?}"))),
    }
}

pub(crate) fn to_std(value: &SorobanString) -> String {
    let mut buf = vec![0u8; value.len() as usize];
    value.copy_into_slice(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn address_string(address: &Address) -> String {
    to_std(&address.to_string())
}

fn player_record(raw: mindora_runner::PlayerRecord) -> PlayerRecord {
    PlayerRecord {
        username: to_std(&raw.username),
        is_registered: raw.is_registered,
        current_stage: raw.current_stage,
        total_score: raw.total_score,
        in_game_coins: raw.in_game_coins,
        quest_tokens_earned: raw.quest_tokens_earned,
        total_games_played: raw.total_games_played,
        registration_time: raw.registration_time,
    }
}

fn session_records(raw: soroban_sdk::Vec<mindora_runner::SessionRecord>) -> Vec<SessionRecord> {
    raw.iter()
        .map(|s| SessionRecord {
            player: address_string(&s.player),
            stage: s.stage,
            score: s.score,
            coins_collected: s.coins_collected,
            stage_completed: s.stage_completed,
            timestamp: s.timestamp,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Game contract
// ═══════════════════════════════════════════════════════════════════════════════

/// The game contract as seen by one player.
///
/// Writes execute as soon as they are sent; the outcome is parked under a
/// `TxId` until `await_confirmation` collects it.
pub struct ContractLedger<'a> {
    env: &'a Env,
    client: MindoraRunnerClient<'a>,
    player: Address,
    next_tx: u64,
    pending: BTreeMap<TxId, u64>,
}

impl<'a> ContractLedger<'a> {
    pub fn new(env: &'a Env, contract_id: &Address, player: Address) -> Self {
        Self {
            env,
            client: MindoraRunnerClient::new(env, contract_id),
            player,
            next_tx: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn player_address(&self) -> &Address {
        &self.player
    }

    fn sent(&mut self, op: &str) -> TxId {
        self.next_tx += 1;
        let tx = TxId(self.next_tx);
        self.pending.insert(tx, self.env.ledger().timestamp());
        log::debug!("[SYNC] sent {} tx:{}", op, tx.0);
        tx
    }
}

impl RunnerReads for ContractLedger<'_> {
    fn wallet(&self) -> String {
        address_string(&self.player)
    }

    fn player(&self) -> Result<PlayerRecord> {
        settle("get_player", self.client.try_get_player(&self.player)).map(player_record)
    }

    // `address` must be a strkey obtained from the ledger itself.
    fn player_of(&self, address: &str) -> Result<PlayerRecord> {
        let address = Address::from_string(&SorobanString::from_str(self.env, address));
        settle("get_player", self.client.try_get_player(&address)).map(player_record)
    }

    fn stage_completed(&self, stage: u32) -> Result<bool> {
        settle(
            "is_stage_completed",
            self.client.try_is_stage_completed(&self.player, &stage),
        )
    }

    fn tokens_claimed(&self, stage: u32) -> Result<bool> {
        settle(
            "are_tokens_claimed",
            self.client.try_are_tokens_claimed(&self.player, &stage),
        )
    }

    fn nft_claimed(&self, stage: u32) -> Result<bool> {
        settle(
            "is_nft_claimed",
            self.client.try_is_nft_claimed(&self.player, &stage),
        )
    }

    /// One `get_player_state` call instead of three reads per stage.
    fn stage_flags(&self, stage_count: u32) -> StageFlags {
        let mut flags = StageFlags::unresolved(stage_count);
        match settle(
            "get_player_state",
            self.client.try_get_player_state(&self.player),
        ) {
            Ok(state) => {
                for status in state.stages.iter() {
                    flags.set_completed(status.stage, status.completed);
                    flags.set_tokens_claimed(status.stage, status.tokens_claimed);
                    flags.set_nft_claimed(status.stage, status.nft_claimed);
                }
            }
            Err(e) => log::warn!("[SYNC] player state read failed: {}", e),
        }
        flags
    }

    fn general_leaderboard(&self, limit: u32) -> Result<Vec<SessionRecord>> {
        settle(
            "get_general_leaderboard",
            self.client.try_get_general_leaderboard(&limit),
        )
        .map(session_records)
    }

    fn stage_leaderboard(&self, stage: u32, limit: u32) -> Result<Vec<SessionRecord>> {
        settle(
            "get_stage_leaderboard",
            self.client.try_get_stage_leaderboard(&stage, &limit),
        )
        .map(session_records)
    }
}

impl RunnerWrites for ContractLedger<'_> {
    fn register_player(&mut self, username: &str) -> Result<TxId> {
        let name = SorobanString::from_str(self.env, username);
        settle(
            "register_player",
            self.client.try_register_player(&self.player, &name),
        )?;
        Ok(self.sent("register_player"))
    }

    fn save_game_session(&mut self, input: &SessionInput) -> Result<TxId> {
        settle(
            "save_game_session",
            self.client.try_save_game_session(
                &self.player,
                &input.stage,
                &input.final_score,
                &input.coins_collected,
                &input.questions_correct,
                &input.stage_completed,
            ),
        )?;
        Ok(self.sent("save_game_session"))
    }

    fn claim_tokens(&mut self, stage: u32) -> Result<TxId> {
        settle(
            "claim_tokens",
            self.client.try_claim_tokens(&self.player, &stage),
        )?;
        Ok(self.sent("claim_tokens"))
    }

    fn claim_nft(&mut self, stage: u32) -> Result<TxId> {
        settle("claim_nft", self.client.try_claim_nft(&self.player, &stage))?;
        Ok(self.sent("claim_nft"))
    }

    fn purchase_item(&mut self, item_type: &str, cost: u64) -> Result<TxId> {
        let item = SorobanString::from_str(self.env, item_type);
        settle(
            "purchase_item",
            self.client.try_purchase_item(&self.player, &item, &cost),
        )?;
        Ok(self.sent("purchase_item"))
    }

    fn await_confirmation(&mut self, tx: TxId) -> Result<Receipt> {
        let ledger_timestamp = self
            .pending
            .remove(&tx)
            .ok_or(SyncError::UnknownTransaction(tx.0))?;
        Ok(Receipt {
            tx,
            ledger_timestamp,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Reward service
// ═══════════════════════════════════════════════════════════════════════════════

/// The rewards contract, minting to one recipient as `minter`.
pub struct ContractRewards<'a> {
    env: &'a Env,
    client: QuestRewardsClient<'a>,
    minter: Address,
    recipient: Address,
}

impl<'a> ContractRewards<'a> {
    pub fn new(env: &'a Env, contract_id: &Address, minter: Address, recipient: Address) -> Self {
        Self {
            env,
            client: QuestRewardsClient::new(env, contract_id),
            minter,
            recipient,
        }
    }
}

impl RewardService for ContractRewards<'_> {
    fn has_stage_coins(&self, stage: u32) -> Result<bool> {
        settle(
            "has_stage_coins",
            self.client.try_has_stage_coins(&self.recipient, &stage),
        )
    }

    fn owns_badge(&self, badge_name: &str) -> Result<bool> {
        let name = SorobanString::from_str(self.env, badge_name);
        settle("has_badge", self.client.try_has_badge(&self.recipient, &name))
    }

    fn mint_quest_coins(&mut self, stage: u32, amount: u64) -> Result<bool> {
        settle(
            "mint_quest_coins",
            self.client
                .try_mint_quest_coins(&self.minter, &self.recipient, &stage, &amount),
        )
    }

    fn mint_badge(&mut self, badge_name: &str) -> Result<bool> {
        let name = SorobanString::from_str(self.env, badge_name);
        settle(
            "mint_badge",
            self.client.try_mint_badge(&self.minter, &self.recipient, &name),
        )
    }
}
