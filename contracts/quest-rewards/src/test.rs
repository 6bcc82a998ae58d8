#![cfg(test)]

use crate::{QuestRewards, QuestRewardsClient};
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, Env, String};

// ════════════════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════════════════

fn setup() -> (Env, QuestRewardsClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    env.ledger().set(soroban_sdk::testutils::LedgerInfo {
        timestamp: 1_700_000_000,
        protocol_version: 25,
        sequence_number: 100,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: u32::MAX / 2,
        min_persistent_entry_ttl: u32::MAX / 2,
        max_entry_ttl: u32::MAX / 2,
    });

    let admin = Address::generate(&env);
    let contract_id = env.register(QuestRewards, (&admin,));
    let client = QuestRewardsClient::new(&env, &contract_id);

    (env, client, admin)
}

// ════════════════════════════════════════════════════════════════════════════
//  Minter management
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_admin_is_implicit_minter() {
    let (env, client, admin) = setup();
    assert!(client.is_minter(&admin));
    assert!(!client.is_minter(&Address::generate(&env)));
}

#[test]
fn test_authorize_and_revoke_minter() {
    let (env, client, admin) = setup();
    let operator = Address::generate(&env);

    client.authorize_minter(&admin, &operator);
    assert!(client.is_minter(&operator));

    // Authorizing twice is a no-op
    client.authorize_minter(&admin, &operator);
    client.revoke_minter(&admin, &operator);
    assert!(!client.is_minter(&operator));
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn test_non_admin_cannot_authorize() {
    let (env, client, _admin) = setup();
    let stranger = Address::generate(&env);
    client.authorize_minter(&stranger, &stranger);
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn test_unauthorized_mint_rejected() {
    let (env, client, _admin) = setup();
    let stranger = Address::generate(&env);
    client.mint_quest_coins(&stranger, &stranger, &1, &10);
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn test_revoked_minter_rejected() {
    let (env, client, admin) = setup();
    let operator = Address::generate(&env);
    let player = Address::generate(&env);

    client.authorize_minter(&admin, &operator);
    client.revoke_minter(&admin, &operator);
    client.mint_badge(&operator, &player, &String::from_str(&env, "Explorer Badge"));
}

// ════════════════════════════════════════════════════════════════════════════
//  QuestCoins
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mint_coins_accumulates() {
    let (env, client, admin) = setup();
    let operator = Address::generate(&env);
    let player = Address::generate(&env);
    client.authorize_minter(&admin, &operator);

    assert!(client.mint_quest_coins(&operator, &player, &1, &20));
    assert!(client.mint_quest_coins(&operator, &player, &2, &50));
    assert_eq!(client.balance(&player), 70);
    assert_eq!(client.total_supply(), 70);
}

#[test]
fn test_stage_coins_minted_once_per_owner() {
    let (env, client, admin) = setup();
    let p1 = Address::generate(&env);
    let p2 = Address::generate(&env);

    assert!(!client.has_stage_coins(&p1, &2));
    assert!(client.mint_quest_coins(&admin, &p1, &2, &50));
    assert!(client.has_stage_coins(&p1, &2));
    assert!(!client.has_stage_coins(&p1, &1));

    assert!(!client.mint_quest_coins(&admin, &p1, &2, &50));
    assert_eq!(client.balance(&p1), 50);

    assert!(client.mint_quest_coins(&admin, &p2, &2, &50));
    assert!(client.mint_quest_coins(&admin, &p1, &1, &20));
    assert_eq!(client.balance(&p1), 70);
    assert_eq!(client.total_supply(), 120);
}

#[test]
fn test_zero_mint_reports_failure() {
    let (env, client, admin) = setup();
    let player = Address::generate(&env);

    assert!(!client.mint_quest_coins(&admin, &player, &1, &0));
    assert_eq!(client.balance(&player), 0);
    assert!(!client.has_stage_coins(&player, &1));
    assert_eq!(client.total_supply(), 0);
}

// ════════════════════════════════════════════════════════════════════════════
//  Badges
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mint_badge_records_serial() {
    let (env, client, admin) = setup();
    let p1 = Address::generate(&env);
    let p2 = Address::generate(&env);
    let explorer = String::from_str(&env, "Explorer Badge");

    assert!(client.mint_badge(&admin, &p1, &explorer));
    assert!(client.mint_badge(&admin, &p2, &explorer));

    let owned = client.badges(&p2);
    assert_eq!(owned.len(), 1);
    let badge = owned.get(0).unwrap();
    assert_eq!(badge.serial, 2);
    assert_eq!(badge.name, explorer);
    assert_eq!(badge.minted_at, 1_700_000_000);
    assert!(client.has_badge(&p1, &explorer));
}

#[test]
fn test_badge_names_unique_per_owner() {
    let (env, client, admin) = setup();
    let player = Address::generate(&env);
    let explorer = String::from_str(&env, "Explorer Badge");
    let master = String::from_str(&env, "Master Badge");

    assert!(client.mint_badge(&admin, &player, &explorer));
    assert!(!client.mint_badge(&admin, &player, &explorer));
    assert!(client.mint_badge(&admin, &player, &master));

    assert_eq!(client.badges(&player).len(), 2);
    assert!(!client.has_badge(&player, &String::from_str(&env, "Adventurer Badge")));
}

#[test]
fn test_empty_badge_name_reports_failure() {
    let (env, client, admin) = setup();
    let player = Address::generate(&env);

    assert!(!client.mint_badge(&admin, &player, &String::from_str(&env, "")));
    assert_eq!(client.badges(&player).len(), 0);
}

#[test]
fn test_coin_and_badge_mints_are_independent() {
    let (env, client, admin) = setup();
    let player = Address::generate(&env);

    assert!(client.mint_quest_coins(&admin, &player, &1, &20));
    assert_eq!(client.badges(&player).len(), 0);

    assert!(client.mint_badge(&admin, &player, &String::from_str(&env, "Explorer Badge")));
    assert_eq!(client.balance(&player), 20);
}
