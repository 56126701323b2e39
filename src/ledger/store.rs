//! In-memory ledger storage: all mutable state sits behind one
//! `parking_lot::RwLock`, and every public operation takes the write lock
//! for the duration of its single atomic step. There is no multi-statement
//! transaction here because `adjust` only ever touches one (agent, currency)
//! balance plus two append-only logs at a time.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::agent::AgentId;
use crate::money::{Currency, Money};

use super::types::{RakeEntry, Transaction};

#[derive(Default)]
struct Inner {
    balances: HashMap<(AgentId, Currency), Money>,
    known_agents: std::collections::HashSet<AgentId>,
    transactions: Vec<Transaction>,
    rake_log: Vec<RakeEntry>,
}

#[derive(Default)]
pub struct LedgerStore {
    inner: RwLock<Inner>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_agent(&self, agent: &AgentId) {
        self.inner.write().known_agents.insert(agent.clone());
    }

    pub fn is_known(&self, agent: &AgentId) -> bool {
        self.inner.read().known_agents.contains(agent)
    }

    pub fn balance(&self, agent: &AgentId, currency: Currency) -> Money {
        self.inner
            .read()
            .balances
            .get(&(agent.clone(), currency))
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Applies a balance delta and appends the resulting transaction row
    /// atomically under the write lock. The caller has already validated
    /// sufficiency; this never fails.
    pub fn apply(&self, key: (AgentId, Currency), delta: Money, build_txn: impl FnOnce(Money) -> Transaction) -> Transaction {
        let mut guard = self.inner.write();
        let current = guard.balances.get(&key).copied().unwrap_or(Money::ZERO);
        let new_balance = current + delta;
        guard.balances.insert(key, new_balance);
        let txn = build_txn(new_balance);
        guard.transactions.push(txn.clone());
        txn
    }

    pub fn record_rake(&self, entry: RakeEntry) {
        self.inner.write().rake_log.push(entry);
    }

    pub fn transactions_for(&self, agent: &AgentId) -> Vec<Transaction> {
        self.inner
            .read()
            .transactions
            .iter()
            .filter(|t| &t.agent == agent)
            .cloned()
            .collect()
    }

    pub fn all_wallet_balances(&self, currency: Currency) -> Money {
        self.inner
            .read()
            .balances
            .iter()
            .filter(|((_, c), _)| *c == currency)
            .fold(Money::ZERO, |acc, (_, m)| acc + *m)
    }

    pub fn sum_deposits(&self, currency: Currency) -> Money {
        self.sum_kind(currency, super::types::TxnKind::Deposit)
    }

    pub fn sum_withdrawals(&self, currency: Currency) -> Money {
        // withdrawal amounts are stored negative; the aggregate is a
        // non-negative magnitude.
        self.inner
            .read()
            .transactions
            .iter()
            .filter(|t| t.currency == currency && t.kind == super::types::TxnKind::Withdrawal)
            .fold(Money::ZERO, |acc, t| acc - t.amount)
    }

    pub fn sum_rake(&self, currency: Currency) -> Money {
        self.inner
            .read()
            .rake_log
            .iter()
            .filter(|r| r.currency == currency)
            .fold(Money::ZERO, |acc, r| acc + r.amount)
    }

    fn sum_kind(&self, currency: Currency, kind: super::types::TxnKind) -> Money {
        self.inner
            .read()
            .transactions
            .iter()
            .filter(|t| t.currency == currency && t.kind == kind)
            .fold(Money::ZERO, |acc, t| acc + t.amount)
    }

    pub fn withdrawals_since(&self, agent: &AgentId, currency: Currency, since: chrono::DateTime<chrono::Utc>) -> usize {
        self.inner
            .read()
            .transactions
            .iter()
            .filter(|t| {
                &t.agent == agent
                    && t.currency == currency
                    && t.kind == super::types::TxnKind::Withdrawal
                    && t.time >= since
            })
            .count()
    }
}
