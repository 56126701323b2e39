use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("unknown agent")]
    UnknownAgent,
    #[error("rate limited: too many withdrawals in the current window")]
    RateLimited,
    #[error("invalid amount: {0}")]
    Validation(String),
}
