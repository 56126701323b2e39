use thiserror::Error;

use crate::ledger::LedgerError;

/// Failures surfaced by duel commands: CONFLICT/VALIDATION kinds,
/// scoped to the coinflip/RPS aggregate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DuelError {
    #[error("stake must be positive")]
    InvalidStake,
    #[error("rps round count must be 1, 3, or 5")]
    InvalidRoundCount,
    #[error("duel is not open for acceptance")]
    NotOpen,
    #[error("creator cannot accept their own duel")]
    SelfAccept,
    #[error("duel is not awaiting a commitment")]
    NotCommitting,
    #[error("duel is not awaiting a reveal")]
    NotRevealing,
    #[error("agent is not a participant in this duel")]
    NotParticipant,
    #[error("this side already committed for this round")]
    AlreadyCommitted,
    #[error("this side already revealed for this round")]
    AlreadyRevealed,
    #[error("only the creator may cancel an open duel")]
    NotCreator,
    #[error("duel has already concluded")]
    AlreadyConcluded,
    #[error("ledger rejected the transfer: {0}")]
    Ledger(#[from] LedgerError),
}
