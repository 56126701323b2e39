use thiserror::Error;

use crate::engine::nl::errors::{ActionError, StateError};
use crate::ledger::LedgerError;

/// Failures surfaced by table commands: CONFLICT/VALIDATION/NOT_FOUND
/// kinds, scoped to the poker table aggregate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("buy-in {0} is outside the table's configured range")]
    BuyInOutOfRange(String),
    #[error("agent is already seated at this table")]
    AlreadySeated,
    #[error("no free seat at this table")]
    NoFreeSeat,
    #[error("agent is not seated at this table")]
    NotSeated,
    #[error("seat is active in an ongoing hand and cannot leave")]
    SeatActiveInHand,
    #[error("no hand is in progress")]
    NoHandInProgress,
    #[error("a hand is already in progress")]
    HandAlreadyInProgress,
    #[error("fewer than two seats hold chips")]
    NotEnoughPlayers,
    #[error("it is not this agent's turn to act")]
    NotYourTurn,
    #[error("illegal action: {0:?}")]
    IllegalAction(ActionError),
    #[error("internal invariant violation: {0:?}")]
    InvariantViolation(StateError),
    #[error("ledger rejected the transfer: {0}")]
    Ledger(#[from] LedgerError),
}

impl From<ActionError> for TableError {
    fn from(e: ActionError) -> Self {
        TableError::IllegalAction(e)
    }
}

impl From<StateError> for TableError {
    fn from(e: StateError) -> Self {
        TableError::InvariantViolation(e)
    }
}
