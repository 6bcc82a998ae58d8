//! Session submission and reward issuance.
//!
//! A submission moves `Idle → Submitted → Confirmed → RewardsIssued →
//! Settled`; any step can end in `Failed` instead. Nothing is retried
//! automatically: the caller re-triggers.

use crate::config::{RewardTier, SyncConfig};
use crate::error::{Result, SyncError};
use crate::ledger::{RewardService, RunnerLedger};
use crate::model::{Receipt, RewardHalf, SessionInput, TxId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Submit,
    Confirm,
    IssueRewards,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitted(TxId),
    Confirmed(Receipt),
    RewardsIssued,
    Settled,
    Failed { step: Step, error: SyncError },
}

pub struct SessionPipeline {
    phase: Phase,
    pending: Option<SessionInput>,
}

impl Default for SessionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPipeline {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// A submission has been sent and not yet settled or failed.
    pub fn in_flight(&self) -> bool {
        matches!(
            self.phase,
            Phase::Submitted(_) | Phase::Confirmed(_) | Phase::RewardsIssued
        )
    }

    /// Send the session write. Rejects a second submission while one is in
    /// flight.
    pub fn submit<L: RunnerLedger>(&mut self, ledger: &mut L, input: SessionInput) -> Result<TxId> {
        if self.in_flight() {
            return Err(SyncError::SubmissionInFlight);
        }
        let input = input.normalized();

        match ledger.save_game_session(&input) {
            Ok(tx) => {
                log::info!(
                    "[SESSION] submitted tx:{} stage:{} score:{} coins:{} completed:{}",
                    tx.0,
                    input.stage,
                    input.final_score,
                    input.coins_collected,
                    input.stage_completed
                );
                self.phase = Phase::Submitted(tx);
                self.pending = Some(input);
                Ok(tx)
            }
            Err(e) => {
                log::error!("[SESSION] submit failed stage:{} error:{}", input.stage, e);
                self.fail(Step::Submit, e.clone());
                Err(e)
            }
        }
    }

    /// Wait for the pending write. Returns the submitted input with its
    /// receipt.
    pub fn confirm<L: RunnerLedger>(&mut self, ledger: &mut L) -> Result<(SessionInput, Receipt)> {
        let tx = match self.phase {
            Phase::Submitted(tx) => tx,
            _ => return Err(SyncError::NoSubmission),
        };
        let input = self.pending.clone().ok_or(SyncError::NoSubmission)?;

        match ledger.await_confirmation(tx) {
            Ok(receipt) => {
                log::info!("[SESSION] confirmed tx:{} stage:{}", tx.0, input.stage);
                self.phase = Phase::Confirmed(receipt.clone());
                Ok((input, receipt))
            }
            Err(e) => {
                log::error!("[SESSION] confirmation failed tx:{} error:{}", tx.0, e);
                self.fail(Step::Confirm, e.clone());
                Err(e)
            }
        }
    }

    /// Record the reward step. An incomplete outcome fails the submission
    /// at `IssueRewards`; the session itself stays saved.
    pub fn rewards_issued(&mut self, outcome: &RewardOutcome) {
        if outcome.is_complete() {
            self.phase = Phase::RewardsIssued;
        } else {
            let error = outcome
                .first_failure()
                .cloned()
                .unwrap_or(SyncError::MintRefused(format!("stage {} rewards", outcome.stage)));
            self.fail(Step::IssueRewards, error);
        }
    }

    pub fn rewards_failed(&mut self, error: SyncError) {
        self.fail(Step::IssueRewards, error);
    }

    pub fn settle(&mut self) {
        if !matches!(self.phase, Phase::Failed { .. }) {
            self.phase = Phase::Settled;
        }
        self.pending = None;
    }

    fn fail(&mut self, step: Step, error: SyncError) {
        self.phase = Phase::Failed { step, error };
        self.pending = None;
    }
}

// ─── Reward issuance ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HalfOutcome {
    /// The claim flag was already set; nothing was done.
    AlreadyClaimed,
    /// Claimed now. `minted` is false when the reward service already held
    /// the units from an earlier attempt.
    Issued { minted: bool },
    Failed(SyncError),
}

impl HalfOutcome {
    pub fn is_settled(&self) -> bool {
        !matches!(self, HalfOutcome::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardOutcome {
    pub stage: u32,
    pub tokens: HalfOutcome,
    pub nft: HalfOutcome,
}

impl RewardOutcome {
    pub fn is_complete(&self) -> bool {
        self.tokens.is_settled() && self.nft.is_settled()
    }

    pub fn half(&self, half: RewardHalf) -> &HalfOutcome {
        match half {
            RewardHalf::Tokens => &self.tokens,
            RewardHalf::Nft => &self.nft,
        }
    }

    /// Halves that still need another attempt.
    pub fn missing(&self) -> Vec<RewardHalf> {
        RewardHalf::all()
            .into_iter()
            .filter(|half| !self.half(*half).is_settled())
            .collect()
    }

    /// Halves claimed during this attempt.
    pub fn issued(&self) -> Vec<RewardHalf> {
        RewardHalf::all()
            .into_iter()
            .filter(|half| matches!(self.half(*half), HalfOutcome::Issued { .. }))
            .collect()
    }

    fn first_failure(&self) -> Option<&SyncError> {
        [&self.tokens, &self.nft].into_iter().find_map(|half| match half {
            HalfOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }
}

/// Mint and claim both halves of a stage reward.
///
/// Each half re-reads its claim flag first and stops there if it is set.
/// Otherwise the reward service is checked for units left behind by an
/// earlier attempt whose claim never landed, the mint is skipped if they
/// are there, and the claim is written and confirmed. The halves do not
/// depend on each other.
pub fn issue_rewards<L: RunnerLedger, M: RewardService>(
    ledger: &mut L,
    rewards: &mut M,
    config: &SyncConfig,
    stage: u32,
) -> Result<RewardOutcome> {
    let tier = config.reward(stage).ok_or(SyncError::UnknownStage(stage))?;
    if !ledger.stage_completed(stage)? {
        return Err(SyncError::StageNotCompleted(stage));
    }

    let tokens = issue_half(ledger, rewards, tier, RewardHalf::Tokens);
    let nft = issue_half(ledger, rewards, tier, RewardHalf::Nft);
    let outcome = RewardOutcome { stage, tokens, nft };

    if outcome.is_complete() {
        log::info!("[REWARDS] stage:{} settled", stage);
    } else {
        log::warn!("[REWARDS] stage:{} partial, missing:{:?}", stage, outcome.missing());
    }
    Ok(outcome)
}

fn issue_half<L: RunnerLedger, M: RewardService>(
    ledger: &mut L,
    rewards: &mut M,
    tier: &RewardTier,
    half: RewardHalf,
) -> HalfOutcome {
    let stage = tier.stage;
    let claimed = match half {
        RewardHalf::Tokens => ledger.tokens_claimed(stage),
        RewardHalf::Nft => ledger.nft_claimed(stage),
    };
    match claimed {
        Ok(true) => return HalfOutcome::AlreadyClaimed,
        Ok(false) => {}
        // An unreadable flag is treated as unclaimed; the service check
        // below still prevents a second mint.
        Err(e) => log::warn!("[REWARDS] stage:{} {} flag unreadable: {}", stage, half, e),
    }

    let landed = match half {
        RewardHalf::Tokens => rewards.has_stage_coins(stage),
        RewardHalf::Nft => rewards.owns_badge(&tier.badge_name),
    };
    let landed = match landed {
        Ok(landed) => landed,
        Err(e) => {
            log::error!("[REWARDS] stage:{} {} holdings unreadable: {}", stage, half, e);
            return HalfOutcome::Failed(e);
        }
    };

    if !landed {
        let minted = match half {
            RewardHalf::Tokens => rewards.mint_quest_coins(stage, tier.quest_tokens),
            RewardHalf::Nft => rewards.mint_badge(&tier.badge_name),
        };
        match minted {
            Ok(true) => log::info!("[REWARDS] stage:{} {} minted", stage, half),
            Ok(false) => {
                log::error!("[REWARDS] stage:{} {} mint refused", stage, half);
                return HalfOutcome::Failed(SyncError::MintRefused(format!(
                    "stage {stage} {half}"
                )));
            }
            Err(e) => {
                log::error!("[REWARDS] stage:{} {} mint failed: {}", stage, half, e);
                return HalfOutcome::Failed(e);
            }
        }
    } else {
        log::info!("[REWARDS] stage:{} {} already held, skipping mint", stage, half);
    }

    let sent = match half {
        RewardHalf::Tokens => ledger.claim_tokens(stage),
        RewardHalf::Nft => ledger.claim_nft(stage),
    };
    match sent.and_then(|tx| ledger.await_confirmation(tx)) {
        Ok(_) => HalfOutcome::Issued { minted: !landed },
        Err(e) => {
            log::error!("[REWARDS] stage:{} {} claim failed: {}", stage, half, e);
            HalfOutcome::Failed(e)
        }
    }
}
