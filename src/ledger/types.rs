use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::money::{Currency, Money};

pub type TxnId = Uuid;

/// What moved the money. Every state transition
/// that moves money goes through exactly one `adjust` per participant tagged
/// with one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnKind {
    Deposit,
    Withdrawal,
    SeatBuyIn,
    SeatCashout,
    DuelEscrowOut,
    DuelEscrowIn,
    PotPayout,
    Rake,
}

/// What the transaction is attached to, for audit trails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    Table { table_id: String, hand_id: Option<Uuid> },
    Duel { duel_id: Uuid },
    External(String),
}

/// Append-only transaction row. `post_balance` is always the running
/// balance for (agent, currency) immediately after this row is applied.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub agent: AgentId,
    pub kind: TxnKind,
    pub currency: Currency,
    pub amount: Money,
    pub post_balance: Money,
    pub reference: Reference,
    pub note: Option<String>,
    pub time: DateTime<Utc>,
}

/// The six aggregates needed to verify the global money invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub deposits: Money,
    pub withdrawals: Money,
    pub wallets: Money,
    pub table_chips: Money,
    pub duel_escrows: Money,
    pub rake: Money,
}

impl AuditReport {
    /// `deposits - withdrawals = wallets + table_chips + duel_escrows + rake`.
    /// Returns the signed residual; zero means the invariant holds.
    pub fn residual(&self) -> Money {
        (self.deposits - self.withdrawals)
            - (self.wallets + self.table_chips + self.duel_escrows + self.rake)
    }

    pub fn holds(&self) -> bool {
        self.residual() == Money::ZERO
    }
}

/// Append-only rake record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RakeEntry {
    pub game_kind: String,
    pub game_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub pot_size: Money,
    pub time: DateTime<Utc>,
}
