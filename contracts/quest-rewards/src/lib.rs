#![no_std]

//! # Quest Rewards Contract
//!
//! Reward service for Mindora Runner. Mints two kinds of units to players:
//! fungible QuestCoins and named badges (one per name per owner).
//!
//! Minting is done by the admin or by authorized minters. The two mint
//! calls are independent; each reports success with a `bool` and nothing
//! links a coin mint to a badge mint, so callers track both halves
//! themselves. Coins are minted against a stage and at most once per
//! owner and stage.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error,
    Address, Env, String, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BadgeRecord {
    pub serial: u64,
    pub name: String,
    pub minted_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    /// Addresses allowed to mint besides the admin
    Minters,
    /// QuestCoin balance: DataKey::Balance(owner) → u64
    Balance(Address),
    /// Owned badges: DataKey::Badges(owner) → Vec<BadgeRecord>
    Badges(Address),
    /// Stage coin marker: DataKey::StageCoins(owner, stage) → bool
    StageCoins(Address, u32),
    TotalSupply,
    /// Last badge serial handed out
    BadgeSerial,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RewardsError {
    NotAdmin = 1,
    NotAuthorized = 2,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvQuestCoinsMinted {
    pub to: Address,
    pub stage: u32,
    pub amount: u64,
    pub new_balance: u64,
}

#[contractevent]
pub struct EvBadgeMinted {
    pub to: Address,
    pub serial: u64,
    pub name: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Holdings TTL: 120 days
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct QuestRewards;

#[contractimpl]
impl QuestRewards {
    /// Initialize with admin address
    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        let minters: Vec<Address> = Vec::new(&env);
        env.storage().instance().set(&DataKey::Minters, &minters);
        env.storage().instance().set(&DataKey::TotalSupply, &0u64);
        env.storage().instance().set(&DataKey::BadgeSerial, &0u64);
    }

    /// Allow `minter` (typically the game's reward operator) to mint.
    pub fn authorize_minter(env: Env, caller: Address, minter: Address) {
        Self::require_admin(&env, &caller);
        let mut minters = Self::minters(&env);
        if !minters.contains(&minter) {
            minters.push_back(minter);
            env.storage().instance().set(&DataKey::Minters, &minters);
        }
    }

    pub fn revoke_minter(env: Env, caller: Address, minter: Address) {
        Self::require_admin(&env, &caller);
        let mut minters = Self::minters(&env);
        if let Some(idx) = minters.first_index_of(&minter) {
            minters.remove(idx);
            env.storage().instance().set(&DataKey::Minters, &minters);
        }
    }

    /// Credit `amount` QuestCoins to `to` for `stage`. Returns false for a
    /// zero amount or when `to` was already credited for that stage.
    pub fn mint_quest_coins(
        env: Env,
        minter: Address,
        to: Address,
        stage: u32,
        amount: u64,
    ) -> bool {
        Self::require_minter(&env, &minter);
        if amount == 0 || Self::has_stage_coins(env.clone(), to.clone(), stage) {
            return false;
        }

        let marker = DataKey::StageCoins(to.clone(), stage);
        env.storage().persistent().set(&marker, &true);
        env.storage()
            .persistent()
            .extend_ttl(&marker, TTL_LEDGERS, TTL_LEDGERS);

        let new_balance = Self::balance(env.clone(), to.clone()).saturating_add(amount);
        let key = DataKey::Balance(to.clone());
        env.storage().persistent().set(&key, &new_balance);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);

        let supply = Self::total_supply(env.clone()).saturating_add(amount);
        env.storage().instance().set(&DataKey::TotalSupply, &supply);
        env.storage().instance().extend_ttl(TTL_LEDGERS, TTL_LEDGERS);

        EvQuestCoinsMinted {
            to,
            stage,
            amount,
            new_balance,
        }
        .publish(&env);
        true
    }

    /// Mint a badge called `badge_name` to `to`. Returns false when the name
    /// is empty or `to` already holds a badge with that name.
    pub fn mint_badge(env: Env, minter: Address, to: Address, badge_name: String) -> bool {
        Self::require_minter(&env, &minter);
        if badge_name.len() == 0 {
            return false;
        }

        let mut owned = Self::badges(env.clone(), to.clone());
        if owned.iter().any(|b| b.name == badge_name) {
            return false;
        }

        let serial: u64 = env
            .storage()
            .instance()
            .get(&DataKey::BadgeSerial)
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&DataKey::BadgeSerial, &serial);
        env.storage().instance().extend_ttl(TTL_LEDGERS, TTL_LEDGERS);

        owned.push_back(BadgeRecord {
            serial,
            name: badge_name.clone(),
            minted_at: env.ledger().timestamp(),
        });
        let key = DataKey::Badges(to.clone());
        env.storage().persistent().set(&key, &owned);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);

        EvBadgeMinted {
            to,
            serial,
            name: badge_name,
        }
        .publish(&env);
        true
    }

    pub fn balance(env: Env, owner: Address) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::Balance(owner))
            .unwrap_or(0)
    }

    /// Whether `owner` has been credited QuestCoins for `stage`.
    pub fn has_stage_coins(env: Env, owner: Address, stage: u32) -> bool {
        env.storage()
            .persistent()
            .get(&DataKey::StageCoins(owner, stage))
            .unwrap_or(false)
    }

    pub fn badges(env: Env, owner: Address) -> Vec<BadgeRecord> {
        env.storage()
            .persistent()
            .get(&DataKey::Badges(owner))
            .unwrap_or(Vec::new(&env))
    }

    pub fn has_badge(env: Env, owner: Address, name: String) -> bool {
        Self::badges(env, owner).iter().any(|b| b.name == name)
    }

    pub fn total_supply(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::TotalSupply)
            .unwrap_or(0)
    }

    pub fn is_minter(env: Env, addr: Address) -> bool {
        Self::admin(&env) == addr || Self::minters(&env).contains(&addr)
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn admin(env: &Env) -> Address {
        match env.storage().instance().get(&DataKey::Admin) {
            Some(admin) => admin,
            None => panic_with_error!(env, RewardsError::NotAdmin),
        }
    }

    fn minters(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Minters)
            .unwrap_or(Vec::new(env))
    }

    fn require_admin(env: &Env, caller: &Address) {
        caller.require_auth();
        if *caller != Self::admin(env) {
            panic_with_error!(env, RewardsError::NotAdmin);
        }
    }

    fn require_minter(env: &Env, minter: &Address) {
        minter.require_auth();
        if *minter != Self::admin(env) && !Self::minters(env).contains(minter) {
            panic_with_error!(env, RewardsError::NotAuthorized);
        }
    }
}

#[cfg(test)]
mod test;
