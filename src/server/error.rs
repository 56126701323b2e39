//! Maps the command surface's typed failures onto HTTP error kinds.
//! HTTP routing itself is out of scope; this is just enough of a boundary
//! that a caller gets a machine-readable kind and a message rather than a
//! generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::commands::CommandError;
use crate::duel::DuelError;
use crate::ledger::LedgerError;
use crate::table::TableError;

const LOG_TARGET: &str = "server::error";

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    InsufficientFunds,
    RateLimited,
    Forfeit,
    Internal,
}

#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError { kind: ErrorKind::NotFound, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError { kind: ErrorKind::Validation, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError { kind: ErrorKind::Internal, message: message.into() }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let kind = match err {
            LedgerError::InsufficientFunds => ErrorKind::InsufficientFunds,
            LedgerError::UnknownAgent => ErrorKind::NotFound,
            LedgerError::RateLimited => ErrorKind::RateLimited,
            LedgerError::Validation(_) => ErrorKind::Validation,
        };
        ApiError { kind, message: err.to_string() }
    }
}

impl From<TableError> for ApiError {
    fn from(err: TableError) -> Self {
        if let TableError::Ledger(inner) = err {
            return inner.into();
        }
        let kind = match err {
            TableError::BuyInOutOfRange(_) => ErrorKind::Validation,
            TableError::InvariantViolation(_) => ErrorKind::Internal,
            TableError::AlreadySeated
            | TableError::NoFreeSeat
            | TableError::NotSeated
            | TableError::SeatActiveInHand
            | TableError::NoHandInProgress
            | TableError::HandAlreadyInProgress
            | TableError::NotEnoughPlayers
            | TableError::NotYourTurn
            | TableError::IllegalAction(_) => ErrorKind::Conflict,
            TableError::Ledger(_) => unreachable!("handled above"),
        };
        ApiError { kind, message: err.to_string() }
    }
}

impl From<DuelError> for ApiError {
    fn from(err: DuelError) -> Self {
        if let DuelError::Ledger(inner) = err {
            return inner.into();
        }
        let kind = match err {
            DuelError::InvalidStake | DuelError::InvalidRoundCount => ErrorKind::Validation,
            DuelError::NotOpen
            | DuelError::SelfAccept
            | DuelError::NotCommitting
            | DuelError::NotRevealing
            | DuelError::NotParticipant
            | DuelError::AlreadyCommitted
            | DuelError::AlreadyRevealed
            | DuelError::NotCreator
            | DuelError::AlreadyConcluded => ErrorKind::Conflict,
            DuelError::Ledger(_) => unreachable!("handled above"),
        };
        ApiError { kind, message: err.to_string() }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownTable => ApiError::not_found("no table with that id"),
            CommandError::UnknownDuel => ApiError::not_found("no duel with that id"),
            CommandError::Table(e) => e.into(),
            CommandError::Duel(e) => e.into(),
            CommandError::Ledger(e) => e.into(),
            CommandError::Forfeited => ApiError {
                kind: ErrorKind::Forfeit,
                message: err.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Forfeit => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => {
                error!(target = LOG_TARGET, message = %self.message, "internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { kind: self.kind, message: self.message })).into_response()
    }
}
