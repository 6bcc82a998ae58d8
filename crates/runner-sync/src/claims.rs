use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClaimSets {
    pub tokens_claimed: BTreeSet<u32>,
    pub nft_claimed: BTreeSet<u32>,
    /// Stages with both halves claimed.
    pub fully_claimed: BTreeSet<u32>,
}

impl ClaimSets {
    pub fn is_fully_claimed(&self, stage: u32) -> bool {
        self.fully_claimed.contains(&stage)
    }
}

/// Derive the claim sets from the per-stage claim flags (index `stage - 1`).
/// Anything but `Some(true)` reads as unclaimed, which at worst re-offers a
/// claim the contract will treat as a no-op.
pub fn aggregate_claims(tokens: &[Option<bool>], nft: &[Option<bool>]) -> ClaimSets {
    fn claimed(flags: &[Option<bool>]) -> BTreeSet<u32> {
        flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == Some(true))
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    let tokens_claimed = claimed(tokens);
    let nft_claimed = claimed(nft);
    let fully_claimed = tokens_claimed.intersection(&nft_claimed).copied().collect();

    ClaimSets {
        tokens_claimed,
        nft_claimed,
        fully_claimed,
    }
}
