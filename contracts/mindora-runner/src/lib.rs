#![no_std]

//! # Mindora Runner
//!
//! On-chain state for the Mindora Runner educational runner game.
//! Each wallet registers once, then saves one record per finished run.
//!
//! ## Game flow
//! 1. `register_player` creates the player record with a coin bonus and
//!    unlocks stage 1.
//! 2. Every run ends with `save_game_session`. Score and coins accumulate;
//!    a completing run with at least one correct quiz answer marks the
//!    stage completed, credits its QuestCoin reward to `quest_tokens_earned`
//!    and unlocks the next stage.
//! 3. Rewards for a completed stage are claimed in two independent halves:
//!    `claim_tokens` and `claim_nft`. The claim flags gate minting on the
//!    reward service, so both claims are idempotent per stage.
//!
//! ## Stage flags
//! Per player, the completed / tokens-claimed / nft-claimed flags of all
//! stages are packed into three `u32` bitmasks, bit `stage - 1` per stage.
//! `get_player_state` returns all of them in a single read.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, BytesN, Env,
    String, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvPlayerRegistered {
    pub player: Address,
    pub username: String,
}

#[contractevent]
pub struct EvGameSessionSaved {
    pub player: Address,
    pub stage: u32,
    pub score: u64,
    pub coins_collected: u64,
    pub completed: bool,
}

#[contractevent]
pub struct EvStageCompleted {
    pub player: Address,
    pub stage: u32,
    pub quest_tokens_earned: u64,
}

#[contractevent]
pub struct EvTokensClaimed {
    pub player: Address,
    pub stage: u32,
    pub token_amount: u64,
}

#[contractevent]
pub struct EvNftClaimed {
    pub player: Address,
    pub stage: u32,
    pub badge_name: String,
}

#[contractevent]
pub struct EvItemPurchased {
    pub player: Address,
    pub item_type: String,
    pub cost: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RunnerError {
    AdminNotSet = 1,
    AlreadyRegistered = 2,
    NotRegistered = 3,
    InvalidUsername = 4,
    InvalidStage = 5,
    StageLocked = 6,
    NoCorrectAnswers = 7,
    StageNotCompleted = 8,
    InsufficientCoins = 9,
    InvalidCost = 10,
    InvalidItem = 11,
    NumericalOverflow = 12,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Player state & storage keys
// ═══════════════════════════════════════════════════════════════════════════════

/// A player's persistent record. Unknown addresses read as the zero record
/// with `is_registered == false`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
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

/// One saved run, as kept on the stage leaderboards.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionRecord {
    pub player: Address,
    pub stage: u32,
    pub score: u64,
    pub coins_collected: u64,
    pub stage_completed: bool,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageStatus {
    pub stage: u32,
    pub completed: bool,
    pub tokens_claimed: bool,
    pub nft_claimed: bool,
}

/// Batched view: the player record plus every stage's flags.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerState {
    pub player: PlayerRecord,
    pub stages: Vec<StageStatus>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StageReward {
    pub stage: u32,
    pub quest_tokens: u64,
    pub badge_name: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameStats {
    pub total_players: u32,
    pub total_games_played: u32,
}

/// Stage flags packed as bitmasks (bit `stage - 1`).
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StageProgress {
    pub completed: u32,
    pub tokens_claimed: u32,
    pub nft_claimed: u32,
}

#[contracttype]
#[derive(Clone)]
enum StorageKey {
    Admin,
    Player(Address),
    Progress(Address),
    StageBoard(u32),
    TotalPlayers,
    TotalGames,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

pub const STAGE_COUNT: u32 = 3;

/// QuestCoin units credited for completing stage 1, 2 and 3.
pub const STAGE_TOKEN_REWARDS: [u64; STAGE_COUNT as usize] = [20, 50, 100];

pub const STAGE_BADGE_NAMES: [&str; STAGE_COUNT as usize] =
    ["Explorer Badge", "Adventurer Badge", "Master Badge"];

/// In-game coins granted on registration.
pub const REGISTRATION_BONUS: u64 = 100;

/// Coins collected in a completing run are credited this many times.
pub const COMPLETION_MULTIPLIER: u64 = 2;

pub const MAX_USERNAME_LEN: u32 = 32;
pub const MAX_ITEM_TYPE_LEN: u32 = 32;

/// Sessions kept per stage leaderboard.
pub const MAX_BOARD_ENTRIES: u32 = 50;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Player data TTL: 120 days
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60;

/// TTL for player data in ledgers: 120 * 24 * 60 * 60 / 5 = 2,073,600 ledgers
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct MindoraRunner;

#[contractimpl]
impl MindoraRunner {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor & Registration
    // ───────────────────────────────────────────────────────────────────────────

    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&StorageKey::Admin, &admin);
        env.storage().instance().set(&StorageKey::TotalPlayers, &0u32);
        env.storage().instance().set(&StorageKey::TotalGames, &0u32);
    }

    /// Register the calling wallet. Usernames are set once and never change.
    pub fn register_player(env: Env, player: Address, username: String) -> Result<(), RunnerError> {
        player.require_auth();

        if username.len() == 0 || username.len() > MAX_USERNAME_LEN {
            return Err(RunnerError::InvalidUsername);
        }
        if Self::load_player(&env, &player).is_some() {
            return Err(RunnerError::AlreadyRegistered);
        }

        let record = PlayerRecord {
            username: username.clone(),
            is_registered: true,
            current_stage: 1,
            total_score: 0,
            in_game_coins: REGISTRATION_BONUS,
            quest_tokens_earned: 0,
            total_games_played: 0,
            registration_time: env.ledger().timestamp(),
        };
        Self::write_player(&env, &player, &record);

        let total: u32 = env.storage().instance().get(&StorageKey::TotalPlayers).unwrap_or(0);
        env.storage()
            .instance()
            .set(&StorageKey::TotalPlayers, &(total + 1));

        EvPlayerRegistered { player, username }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Sessions
    // ───────────────────────────────────────────────────────────────────────────

    /// Save a finished run. A stage can be played once it is unlocked,
    /// i.e. `stage <= current_stage`.
    pub fn save_game_session(
        env: Env,
        player: Address,
        stage: u32,
        final_score: u64,
        coins_collected: u64,
        questions_correct: u32,
        stage_completed: bool,
    ) -> Result<(), RunnerError> {
        player.require_auth();
        Self::require_valid_stage(stage)?;

        let mut record = Self::require_registered(&env, &player)?;
        if stage > record.current_stage {
            return Err(RunnerError::StageLocked);
        }
        if stage_completed && questions_correct == 0 {
            return Err(RunnerError::NoCorrectAnswers);
        }

        let coins_credit = if stage_completed {
            coins_collected
                .checked_mul(COMPLETION_MULTIPLIER)
                .ok_or(RunnerError::NumericalOverflow)?
        } else {
            coins_collected
        };

        record.total_score = record
            .total_score
            .checked_add(final_score)
            .ok_or(RunnerError::NumericalOverflow)?;
        record.in_game_coins = record
            .in_game_coins
            .checked_add(coins_credit)
            .ok_or(RunnerError::NumericalOverflow)?;
        record.total_games_played = record
            .total_games_played
            .checked_add(1)
            .ok_or(RunnerError::NumericalOverflow)?;

        let mut progress = Self::load_progress(&env, &player);
        let bit = Self::stage_bit(stage);
        if stage_completed && progress.completed & bit == 0 {
            progress.completed |= bit;
            record.quest_tokens_earned = record
                .quest_tokens_earned
                .checked_add(Self::token_reward(stage))
                .ok_or(RunnerError::NumericalOverflow)?;
            if stage < STAGE_COUNT && record.current_stage <= stage {
                record.current_stage = stage + 1;
            }
            Self::write_progress(&env, &player, &progress);

            EvStageCompleted {
                player: player.clone(),
                stage,
                quest_tokens_earned: record.quest_tokens_earned,
            }
            .publish(&env);
        }

        Self::write_player(&env, &player, &record);

        let games: u32 = env.storage().instance().get(&StorageKey::TotalGames).unwrap_or(0);
        env.storage()
            .instance()
            .set(&StorageKey::TotalGames, &games.saturating_add(1));

        let session = SessionRecord {
            player: player.clone(),
            stage,
            score: final_score,
            coins_collected,
            stage_completed,
            timestamp: env.ledger().timestamp(),
        };
        Self::insert_into_board(&env, &session);

        EvGameSessionSaved {
            player,
            stage,
            score: final_score,
            coins_collected,
            completed: stage_completed,
        }
        .publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Claims
    // ───────────────────────────────────────────────────────────────────────────

    /// Mark the QuestCoin reward of a completed stage as issued.
    /// Returns `false` (and emits nothing) when it was already claimed.
    pub fn claim_tokens(env: Env, player: Address, stage: u32) -> Result<bool, RunnerError> {
        player.require_auth();
        let mut progress = Self::require_completed(&env, &player, stage)?;

        let bit = Self::stage_bit(stage);
        if progress.tokens_claimed & bit != 0 {
            return Ok(false);
        }
        progress.tokens_claimed |= bit;
        Self::write_progress(&env, &player, &progress);

        EvTokensClaimed {
            player,
            stage,
            token_amount: Self::token_reward(stage),
        }
        .publish(&env);
        Ok(true)
    }

    /// Mark the badge reward of a completed stage as issued.
    /// Returns `false` (and emits nothing) when it was already claimed.
    pub fn claim_nft(env: Env, player: Address, stage: u32) -> Result<bool, RunnerError> {
        player.require_auth();
        let mut progress = Self::require_completed(&env, &player, stage)?;

        let bit = Self::stage_bit(stage);
        if progress.nft_claimed & bit != 0 {
            return Ok(false);
        }
        progress.nft_claimed |= bit;
        Self::write_progress(&env, &player, &progress);

        EvNftClaimed {
            player,
            stage,
            badge_name: Self::badge_name(&env, stage),
        }
        .publish(&env);
        Ok(true)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Purchases
    // ───────────────────────────────────────────────────────────────────────────

    pub fn purchase_item(
        env: Env,
        player: Address,
        item_type: String,
        cost: u64,
    ) -> Result<(), RunnerError> {
        player.require_auth();

        if item_type.len() == 0 || item_type.len() > MAX_ITEM_TYPE_LEN {
            return Err(RunnerError::InvalidItem);
        }
        if cost == 0 {
            return Err(RunnerError::InvalidCost);
        }

        let mut record = Self::require_registered(&env, &player)?;
        record.in_game_coins = record
            .in_game_coins
            .checked_sub(cost)
            .ok_or(RunnerError::InsufficientCoins)?;
        Self::write_player(&env, &player, &record);

        EvItemPurchased {
            player,
            item_type,
            cost,
        }
        .publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Reads
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_player(env: Env, player: Address) -> PlayerRecord {
        Self::load_player(&env, &player).unwrap_or_else(|| Self::unregistered(&env))
    }

    pub fn is_stage_completed(env: Env, player: Address, stage: u32) -> bool {
        Self::flag(&env, &player, stage, |p| p.completed)
    }

    pub fn are_tokens_claimed(env: Env, player: Address, stage: u32) -> bool {
        Self::flag(&env, &player, stage, |p| p.tokens_claimed)
    }

    pub fn is_nft_claimed(env: Env, player: Address, stage: u32) -> bool {
        Self::flag(&env, &player, stage, |p| p.nft_claimed)
    }

    /// Player record and the flags of every stage in one read.
    pub fn get_player_state(env: Env, player: Address) -> PlayerState {
        let record = Self::load_player(&env, &player).unwrap_or_else(|| Self::unregistered(&env));
        let progress = Self::load_progress(&env, &player);

        let mut stages = Vec::new(&env);
        for stage in 1..=STAGE_COUNT {
            let bit = Self::stage_bit(stage);
            stages.push_back(StageStatus {
                stage,
                completed: progress.completed & bit != 0,
                tokens_claimed: progress.tokens_claimed & bit != 0,
                nft_claimed: progress.nft_claimed & bit != 0,
            });
        }

        PlayerState {
            player: record,
            stages,
        }
    }

    /// Best sessions of one stage, score descending.
    pub fn get_stage_leaderboard(env: Env, stage: u32, limit: u32) -> Vec<SessionRecord> {
        let board = Self::load_board(&env, stage);
        let n = if limit < board.len() { limit } else { board.len() };

        let mut result = Vec::new(&env);
        for i in 0..n {
            if let Some(session) = board.get(i) {
                result.push_back(session);
            }
        }
        result
    }

    /// Best sessions across all stages, score descending. Sessions are not
    /// aggregated per player.
    pub fn get_general_leaderboard(env: Env, limit: u32) -> Vec<SessionRecord> {
        let mut merged: Vec<SessionRecord> = Vec::new(&env);
        for stage in 1..=STAGE_COUNT {
            for session in Self::load_board(&env, stage).iter() {
                let at = Self::insertion_point(&merged, &session);
                merged.insert(at, session);
            }
        }

        while merged.len() > limit {
            merged.pop_back();
        }
        merged
    }

    pub fn get_game_stats(env: Env) -> GameStats {
        GameStats {
            total_players: env.storage().instance().get(&StorageKey::TotalPlayers).unwrap_or(0),
            total_games_played: env.storage().instance().get(&StorageKey::TotalGames).unwrap_or(0),
        }
    }

    pub fn get_stage_reward(env: Env, stage: u32) -> Result<StageReward, RunnerError> {
        Self::require_valid_stage(stage)?;
        Ok(StageReward {
            stage,
            quest_tokens: Self::token_reward(stage),
            badge_name: Self::badge_name(&env, stage),
        })
    }

    pub fn registration_bonus(_env: Env) -> u64 {
        REGISTRATION_BONUS
    }

    pub fn completion_multiplier(_env: Env) -> u64 {
        COMPLETION_MULTIPLIER
    }

    pub fn stage_count(_env: Env) -> u32 {
        STAGE_COUNT
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, RunnerError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), RunnerError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.storage().instance().set(&StorageKey::Admin, &new_admin);
        Ok(())
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), RunnerError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_valid_stage(stage: u32) -> Result<(), RunnerError> {
        if stage == 0 || stage > STAGE_COUNT {
            return Err(RunnerError::InvalidStage);
        }
        Ok(())
    }

    fn require_registered(env: &Env, player: &Address) -> Result<PlayerRecord, RunnerError> {
        Self::load_player(env, player).ok_or(RunnerError::NotRegistered)
    }

    /// Common claim precondition. Returns the player's current progress.
    fn require_completed(
        env: &Env,
        player: &Address,
        stage: u32,
    ) -> Result<StageProgress, RunnerError> {
        Self::require_valid_stage(stage)?;
        Self::require_registered(env, player)?;
        let progress = Self::load_progress(env, player);
        if progress.completed & Self::stage_bit(stage) == 0 {
            return Err(RunnerError::StageNotCompleted);
        }
        Ok(progress)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Stage table
    // ═══════════════════════════════════════════════════════════════════════════

    // Callers validate `stage` first.
    fn stage_bit(stage: u32) -> u32 {
        1 << (stage - 1)
    }

    fn token_reward(stage: u32) -> u64 {
        STAGE_TOKEN_REWARDS[(stage - 1) as usize]
    }

    fn badge_name(env: &Env, stage: u32) -> String {
        String::from_str(env, STAGE_BADGE_NAMES[(stage - 1) as usize])
    }

    fn flag(env: &Env, player: &Address, stage: u32, select: fn(&StageProgress) -> u32) -> bool {
        if Self::require_valid_stage(stage).is_err() {
            return false;
        }
        select(&Self::load_progress(env, player)) & Self::stage_bit(stage) != 0
    }

    fn unregistered(env: &Env) -> PlayerRecord {
        PlayerRecord {
            username: String::from_str(env, ""),
            is_registered: false,
            current_stage: 0,
            total_score: 0,
            in_game_coins: 0,
            quest_tokens_earned: 0,
            total_games_played: 0,
            registration_time: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Leaderboards
    // ═══════════════════════════════════════════════════════════════════════════

    /// Keep a stage board sorted by score (then coins) descending, trimmed to
    /// `MAX_BOARD_ENTRIES`.
    fn insert_into_board(env: &Env, session: &SessionRecord) {
        let mut board = Self::load_board(env, session.stage);

        let at = Self::insertion_point(&board, session);
        if at >= MAX_BOARD_ENTRIES {
            return;
        }
        board.insert(at, session.clone());

        while board.len() > MAX_BOARD_ENTRIES {
            board.pop_back();
        }

        let key = StorageKey::StageBoard(session.stage);
        env.storage().persistent().set(&key, &board);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }

    /// First index whose entry ranks strictly below `session`; equal entries
    /// keep their insertion order.
    fn insertion_point(board: &Vec<SessionRecord>, session: &SessionRecord) -> u32 {
        for i in 0..board.len() {
            if let Some(existing) = board.get(i) {
                let ranks_higher = session.score > existing.score
                    || (session.score == existing.score
                        && session.coins_collected > existing.coins_collected);
                if ranks_higher {
                    return i;
                }
            }
        }
        board.len()
    }

    fn load_board(env: &Env, stage: u32) -> Vec<SessionRecord> {
        env.storage()
            .persistent()
            .get(&StorageKey::StageBoard(stage))
            .unwrap_or_else(|| Vec::new(env))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn load_player(env: &Env, player: &Address) -> Option<PlayerRecord> {
        env.storage()
            .persistent()
            .get(&StorageKey::Player(player.clone()))
    }

    fn write_player(env: &Env, player: &Address, record: &PlayerRecord) {
        let key = StorageKey::Player(player.clone());
        env.storage().persistent().set(&key, record);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
        // Keep instance storage (admin, counters) alive
        env.storage().instance().extend_ttl(TTL_LEDGERS, TTL_LEDGERS);
    }

    fn load_progress(env: &Env, player: &Address) -> StageProgress {
        env.storage()
            .persistent()
            .get(&StorageKey::Progress(player.clone()))
            .unwrap_or_default()
    }

    fn write_progress(env: &Env, player: &Address, progress: &StageProgress) {
        let key = StorageKey::Progress(player.clone());
        env.storage().persistent().set(&key, progress);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }

    fn load_admin(env: &Env) -> Result<Address, RunnerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Admin)
            .ok_or(RunnerError::AdminNotSet)
    }
}
