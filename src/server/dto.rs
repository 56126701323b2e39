//! Request/response bodies for the thin HTTP surface over the command
//! dispatcher. Wire amounts are decimal strings (`Money`'s own
//! `Display`/`FromStr`); wire cards are the two-character rank+suit strings
//! already produced by `cards::Card::wire()`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::duel::{Duel, DuelKind, DuelStatus, RpsChoice};
use crate::engine::nl::types::Chips;
use crate::money::{Currency, Money};
use crate::shuffler::Digest32;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub agent: AgentId,
    pub display_name: String,
    pub buy_in: Money,
}

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    pub agent: Option<AgentId>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActRequest {
    Fold,
    Check,
    Call,
    BetTo { to: Chips },
    RaiseTo { to: Chips },
    AllIn,
}

impl From<ActRequest> for crate::engine::nl::PlayerAction {
    fn from(req: ActRequest) -> Self {
        use crate::engine::nl::PlayerAction as PA;
        match req {
            ActRequest::Fold => PA::Fold,
            ActRequest::Check => PA::Check,
            ActRequest::Call => PA::Call,
            ActRequest::BetTo { to } => PA::BetTo { to },
            ActRequest::RaiseTo { to } => PA::RaiseTo { to },
            ActRequest::AllIn => PA::AllIn,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActBody {
    pub agent: AgentId,
    #[serde(flatten)]
    pub action: ActRequest,
}

#[derive(Debug, Deserialize)]
pub struct LeaveBody {
    pub agent: AgentId,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub agent: AgentId,
    pub currency: Currency,
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub agent: AgentId,
    pub currency: Currency,
    pub amount: Money,
    pub destination: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Money,
}

#[derive(Debug, Deserialize)]
pub struct CoinflipCreateRequest {
    pub agent: AgentId,
    pub stake: Money,
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct RpsCreateRequest {
    pub agent: AgentId,
    pub stake: Money,
    pub rounds: u8,
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct DuelIdBody {
    pub agent: AgentId,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub agent: AgentId,
    pub hash: Digest32,
}

#[derive(Debug, Deserialize)]
pub struct RevealRequest {
    pub agent: AgentId,
    pub choice: RpsChoice,
    pub nonce: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub kind: DuelKind,
    pub agent: AgentId,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct OpenListQuery {
    pub kind: DuelKind,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub currency: Currency,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub agent: AgentId,
}

#[derive(Debug, Serialize)]
pub struct DuelView {
    pub id: Uuid,
    pub kind: DuelKind,
    pub creator: AgentId,
    pub acceptor: Option<AgentId>,
    pub stake: Money,
    pub currency: Currency,
    pub rounds: u8,
    pub status: DuelStatus,
    pub round_index: u8,
    pub creator_score: u8,
    pub acceptor_score: u8,
    pub winner: Option<AgentId>,
    pub payout: Option<Money>,
    pub rake: Option<Money>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Duel> for DuelView {
    fn from(d: Duel) -> Self {
        DuelView {
            id: d.id,
            kind: d.kind,
            creator: d.creator,
            acceptor: d.acceptor,
            stake: d.stake,
            currency: d.currency,
            rounds: d.rounds,
            status: d.status,
            round_index: d.round_index,
            creator_score: d.creator_score,
            acceptor_score: d.acceptor_score,
            winner: d.winner,
            payout: d.payout,
            rake: d.rake,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub currency: Currency,
    pub deposits: Money,
    pub withdrawals: Money,
    pub wallets: Money,
    pub table_chips: Money,
    pub duel_escrows: Money,
    pub rake: Money,
    pub residual: Money,
    pub holds: bool,
}
