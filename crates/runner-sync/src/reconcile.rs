//! Stage completion from partially overlapping evidence.
//!
//! The explicit per-stage flag is the only authoritative source. The other
//! rules exist for the window after a write where flags lag behind the
//! player record, and are tagged so callers and tests can tell them apart.

use std::collections::{BTreeMap, BTreeSet};

/// Why a stage counts as completed, strongest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Evidence {
    /// The contract's completion flag is set.
    Flag,
    /// The player's current stage is past this one.
    CurrentStage,
    /// Earned tokens reach this stage's cumulative reward total.
    TokenThreshold,
    /// Nothing else matched but the player is beyond stage 1.
    LastResort,
}

impl Evidence {
    pub fn is_authoritative(self) -> bool {
        self == Evidence::Flag
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completion {
    evidence: BTreeMap<u32, Evidence>,
}

impl Completion {
    /// Completed stages in ascending order.
    pub fn stages(&self) -> BTreeSet<u32> {
        self.evidence.keys().copied().collect()
    }

    pub fn contains(&self, stage: u32) -> bool {
        self.evidence.contains_key(&stage)
    }

    pub fn evidence(&self, stage: u32) -> Option<Evidence> {
        self.evidence.get(&stage).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// At least one stage rests on a heuristic.
    pub fn is_degraded(&self) -> bool {
        self.evidence.values().any(|e| !e.is_authoritative())
    }

    fn mark(&mut self, stage: u32, evidence: Evidence) {
        self.evidence.entry(stage).or_insert(evidence);
    }
}

/// Resolve the completed stages, first matching rule per stage:
///
/// 1. the completion flag is `Some(true)`;
/// 2. some flag is set and `current_stage > stage`;
/// 3. nothing is completed yet and `tokens_earned` reaches the stage's
///    cumulative threshold (always a prefix of stages);
/// 4. nothing is completed yet and `current_stage > 1`: stage 1 only.
///
/// Rule 2 needs at least one explicit flag to anchor it. With no flag
/// visible at all the record alone is not trusted beyond rules 3 and 4.
///
/// Unresolved flags (`None`) count as not completed. The result depends only
/// on the arguments.
pub fn resolve_completion(
    flags: &[Option<bool>],
    current_stage: u32,
    tokens_earned: u64,
    thresholds: &[u64],
) -> Completion {
    let stage_count = flags.len().max(thresholds.len()) as u32;
    let mut completion = Completion::default();

    for (i, flag) in flags.iter().enumerate() {
        if *flag == Some(true) {
            completion.mark(i as u32 + 1, Evidence::Flag);
        }
    }

    if !completion.is_empty() {
        for stage in 1..current_stage.min(stage_count + 1) {
            if !completion.contains(stage) {
                log::warn!(
                    "[RECONCILE] stage:{} inferred from current_stage:{}",
                    stage,
                    current_stage
                );
                completion.mark(stage, Evidence::CurrentStage);
            }
        }
        return completion;
    }

    for (i, threshold) in thresholds.iter().enumerate() {
        if tokens_earned < *threshold {
            break;
        }
        completion.mark(i as u32 + 1, Evidence::TokenThreshold);
    }
    if !completion.is_empty() {
        log::warn!(
            "[RECONCILE] stages:{:?} inferred from tokens_earned:{}",
            completion.stages(),
            tokens_earned
        );
        return completion;
    }

    if current_stage > 1 && stage_count >= 1 {
        log::warn!(
            "[RECONCILE] stage:1 assumed, current_stage:{} with no other evidence",
            current_stage
        );
        completion.mark(1, Evidence::LastResort);
    }

    completion
}
