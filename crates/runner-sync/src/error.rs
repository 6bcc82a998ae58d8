use thiserror::Error;

/// Failures surfaced by the sync layer.
///
/// `Transport` and `Rejected` keep "the call never landed" apart from
/// "the contract said no", which matters for deciding whether a read means
/// anything at all.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// The call did not produce a usable answer (host error, decode failure,
    /// network loss).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The contract rejected the call.
    #[error("rejected by contract: {0}")]
    Rejected(String),
    /// A write was confirmed as failed or reverted.
    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),
    /// The reward service answered a mint with `false`.
    #[error("reward service refused to mint {0}")]
    MintRefused(String),
    #[error("a session submission is already in flight")]
    SubmissionInFlight,
    #[error("no session submission is in flight")]
    NoSubmission,
    #[error("player is not registered")]
    NotRegistered,
    #[error("stage {0} is not completed")]
    StageNotCompleted(u32),
    #[error("stage {0} does not exist")]
    UnknownStage(u32),
    #[error("no pending transaction #{0}")]
    UnknownTransaction(u64),
}

pub type Result<T> = std::result::Result<T, SyncError>;
