//! Command dispatch: the one place that knows about tables, duels,
//! the ledger, the event bus and the scheduler all at once. Each aggregate is
//! kept behind its own lock (`DashMap<_, Mutex<_>>`) so commands against
//! different tables or duels never contend, while commands against the same
//! aggregate serialize through that lock, the single-writer region the
//! engines assume.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::agent::AgentId;
use crate::duel::{Duel, DuelEffects, DuelError, DuelKind, DuelStatus, DuelTimings, RpsChoice};
use crate::engine::nl::PlayerAction;
use crate::events::{DuelEvent, EventHub};
use crate::ledger::{AuditReport, Ledger, LedgerError, Reference, Transaction, TxnKind};
use crate::money::{Currency, Money};
use crate::scheduler::{Clock, DeadlineKey, DeadlineWheel, SystemClock};
use crate::shuffler::Digest32;
use crate::table::{Table, TableConfig, TableEffects, TableError, TableTimings};
use crate::table::view::{PrivateTableView, PublicTableView};

const TABLE_PREFIX: &str = "table:";
const DUEL_PREFIX: &str = "duel:";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no table with that id")]
    UnknownTable,
    #[error("no duel with that id")]
    UnknownDuel,
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Duel(#[from] DuelError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The caller's own reveal forfeited the game: the mutation already
    /// committed (opponent paid, rake recorded) but the command itself is
    /// rejected to the caller who sent the mismatching reveal (the
    /// FORFEIT error kind).
    #[error("reveal did not match the commitment; this side forfeits the game")]
    Forfeited,
}

/// Minimum deposit accepted by the wallet surface.
pub const MIN_DEPOSIT: Money = Money::from_cents(1);

pub struct World<C: Clock = SystemClock> {
    pub ledger: Ledger,
    pub events: EventHub,
    scheduler: DeadlineWheel<C>,
    tables: DashMap<String, Arc<Mutex<Table>>>,
    duels: DashMap<Uuid, Arc<Mutex<Duel>>>,
    duel_timings: DuelTimings,
    action_deadlines: DashMap<String, DateTime<Utc>>,
}

impl<C: Clock> World<C> {
    pub fn new(clock: C) -> Self {
        World {
            ledger: Ledger::new(),
            events: EventHub::new(),
            scheduler: DeadlineWheel::new(clock),
            tables: DashMap::new(),
            duels: DashMap::new(),
            duel_timings: DuelTimings::default(),
            action_deadlines: DashMap::new(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.scheduler.now()
    }

    // ---- table registry ----

    pub fn create_table(&self, config: TableConfig, timings: TableTimings) {
        let id = config.id.clone();
        self.tables.insert(id, Arc::new(Mutex::new(Table::new(config, timings))));
    }

    fn table_handle(&self, table_id: &str) -> Result<Arc<Mutex<Table>>, CommandError> {
        self.tables.get(table_id).map(|e| e.clone()).ok_or(CommandError::UnknownTable)
    }

    /// `list-tables()`: every table's public projection, in no
    /// particular order.
    pub fn list_tables(&self) -> Vec<PublicTableView> {
        self.tables.iter().map(|e| e.value().lock().observe()).collect()
    }

    pub fn join(&self, table_id: &str, agent: AgentId, display_name: String, buy_in: Money) -> Result<PublicTableView, CommandError> {
        self.register_if_new(&agent);
        let handle = self.table_handle(table_id)?;
        let now = self.now();
        let mut table = handle.lock();
        let effects = table.seat_player(&self.ledger, agent, display_name, buy_in, now)?;
        self.apply_table_effects(table_id, effects);
        Ok(table.observe())
    }

    pub fn leave(&self, table_id: &str, agent: &AgentId) -> Result<(), CommandError> {
        let handle = self.table_handle(table_id)?;
        let now = self.now();
        let mut table = handle.lock();
        let effects = table.leave(&self.ledger, agent, now)?;
        self.apply_table_effects(table_id, effects);
        Ok(())
    }

    /// Admin/test-only.
    pub fn start_hand(&self, table_id: &str) -> Result<(), CommandError> {
        let handle = self.table_handle(table_id)?;
        let now = self.now();
        let mut table = handle.lock();
        let effects = table.start_hand(now)?;
        self.apply_table_effects(table_id, effects);
        Ok(())
    }

    pub fn act(&self, table_id: &str, agent: &AgentId, action: PlayerAction) -> Result<(), CommandError> {
        let handle = self.table_handle(table_id)?;
        let now = self.now();
        let mut table = handle.lock();
        let effects = table.act(&self.ledger, agent, action, now)?;
        self.apply_table_effects(table_id, effects);
        Ok(())
    }

    pub fn observe(&self, table_id: &str) -> Result<PublicTableView, CommandError> {
        let handle = self.table_handle(table_id)?;
        let deadline = self.action_deadlines.get(table_id).map(|d| *d);
        Ok(handle.lock().observe_with_deadline(deadline))
    }

    pub fn observe_as(&self, table_id: &str, agent: &AgentId) -> Result<PrivateTableView, CommandError> {
        let handle = self.table_handle(table_id)?;
        let deadline = self.action_deadlines.get(table_id).map(|d| *d);
        Ok(handle.lock().observe_as(agent, deadline))
    }

    fn apply_table_effects(&self, table_id: &str, effects: TableEffects) {
        let bus = self.events.table(table_id);
        for event in effects.events {
            bus.publish(event);
        }
        for (agent, event) in effects.private {
            self.events.private.publish_to(&agent, event);
        }
        for (reason, at) in effects.schedule {
            self.scheduler.schedule(DeadlineKey::new(format!("{TABLE_PREFIX}{table_id}"), reason), at);
            if reason == crate::table::REASON_ACTION_TIMEOUT {
                self.action_deadlines.insert(table_id.to_string(), at);
            }
        }
        for reason in effects.cancel {
            self.scheduler.cancel(&DeadlineKey::new(format!("{TABLE_PREFIX}{table_id}"), reason));
            if reason == crate::table::REASON_ACTION_TIMEOUT {
                self.action_deadlines.remove(table_id);
            }
        }
    }

    // ---- duel registry ----

    fn duel_handle(&self, id: Uuid) -> Result<Arc<Mutex<Duel>>, CommandError> {
        self.duels.get(&id).map(|e| e.clone()).ok_or(CommandError::UnknownDuel)
    }

    pub fn coinflip_create(&self, creator: AgentId, stake: Money, currency: Currency) -> Result<Uuid, CommandError> {
        self.register_if_new(&creator);
        let id = Uuid::new_v4();
        let now = self.now();
        let (duel, effects) = Duel::create(&self.ledger, id, DuelKind::Coinflip, creator, stake, currency, None, &self.duel_timings, now)?;
        self.duels.insert(id, Arc::new(Mutex::new(duel)));
        self.apply_duel_effects(id, effects);
        Ok(id)
    }

    pub fn rps_create(&self, creator: AgentId, stake: Money, rounds: u8, currency: Currency) -> Result<Uuid, CommandError> {
        self.register_if_new(&creator);
        let id = Uuid::new_v4();
        let now = self.now();
        let (duel, effects) = Duel::create(&self.ledger, id, DuelKind::Rps, creator, stake, currency, Some(rounds), &self.duel_timings, now)?;
        self.duels.insert(id, Arc::new(Mutex::new(duel)));
        self.apply_duel_effects(id, effects);
        Ok(id)
    }

    pub fn duel_accept(&self, id: Uuid, acceptor: AgentId) -> Result<(), CommandError> {
        self.register_if_new(&acceptor);
        let handle = self.duel_handle(id)?;
        let now = self.now();
        let mut duel = handle.lock();
        let effects = duel.accept(&self.ledger, acceptor, &self.duel_timings, now)?;
        self.apply_duel_effects(id, effects);
        Ok(())
    }

    pub fn duel_cancel(&self, id: Uuid, agent: &AgentId) -> Result<(), CommandError> {
        let handle = self.duel_handle(id)?;
        let mut duel = handle.lock();
        let effects = duel.cancel(&self.ledger, agent)?;
        self.apply_duel_effects(id, effects);
        Ok(())
    }

    pub fn rps_commit(&self, id: Uuid, agent: &AgentId, hash: Digest32) -> Result<(), CommandError> {
        let handle = self.duel_handle(id)?;
        let now = self.now();
        let mut duel = handle.lock();
        let effects = duel.commit(agent, hash, &self.duel_timings, now)?;
        self.apply_duel_effects(id, effects);
        Ok(())
    }

    /// `rps.reveal`: a hash mismatch still mutates the duel to
    /// `forfeited` and pays the opponent, but the command is rejected back to
    /// the caller who sent the bad reveal (FORFEIT is a distinct error kind
    /// from a plain no-op validation failure).
    pub fn rps_reveal(&self, id: Uuid, agent: &AgentId, choice: RpsChoice, nonce: &str) -> Result<(), CommandError> {
        let handle = self.duel_handle(id)?;
        let now = self.now();
        let mut duel = handle.lock();
        let effects = duel.reveal(&self.ledger, agent, choice, nonce, &self.duel_timings, now)?;
        let forfeited = effects.events.iter().any(|e| matches!(e, DuelEvent::Forfeited { forfeiting_agent, .. } if forfeiting_agent == agent));
        self.apply_duel_effects(id, effects);
        if forfeited {
            return Err(CommandError::Forfeited);
        }
        Ok(())
    }

    pub fn duel_get(&self, id: Uuid) -> Result<Duel, CommandError> {
        let handle = self.duel_handle(id)?;
        Ok(handle.lock().clone())
    }

    pub fn duel_open_list(&self, kind: DuelKind) -> Vec<Duel> {
        self.duels
            .iter()
            .filter_map(|e| {
                let duel = e.value().lock();
                (duel.kind == kind && duel.status == DuelStatus::Open).then(|| duel.clone())
            })
            .collect()
    }

    /// `coinflip.history`/`rps.history`: every duel of that kind
    /// this agent took part in, most recent first, capped at `limit`.
    pub fn duel_history(&self, kind: DuelKind, agent: &AgentId, limit: usize) -> Vec<Duel> {
        let mut history: Vec<Duel> = self
            .duels
            .iter()
            .filter_map(|e| {
                let duel = e.value().lock();
                (duel.kind == kind && duel.involves(agent)).then(|| duel.clone())
            })
            .collect();
        history.sort_unstable_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        history
    }

    fn apply_duel_effects(&self, id: Uuid, effects: DuelEffects) {
        for event in effects.events {
            self.events.duels.publish(event);
        }
        for (reason, at) in effects.schedule {
            self.scheduler.schedule(DeadlineKey::new(format!("{DUEL_PREFIX}{id}"), reason), at);
        }
        for reason in effects.cancel {
            self.scheduler.cancel(&DeadlineKey::new(format!("{DUEL_PREFIX}{id}"), reason));
        }
    }

    // ---- wallet ----

    fn register_if_new(&self, agent: &AgentId) {
        self.ledger.register_agent(agent);
    }

    pub fn deposit(&self, agent: AgentId, currency: Currency, amount: Money) -> Result<Money, CommandError> {
        if amount < MIN_DEPOSIT {
            return Err(CommandError::Ledger(LedgerError::Validation("deposit must exceed the minimum".into())));
        }
        self.register_if_new(&agent);
        let (balance, _) = self.ledger.adjust(&agent, currency, amount, TxnKind::Deposit, Reference::External("deposit".into()), None)?;
        Ok(balance)
    }

    pub fn withdraw(&self, agent: AgentId, currency: Currency, amount: Money, destination: String) -> Result<Money, CommandError> {
        let (balance, _) = self.ledger.adjust(&agent, currency, -amount, TxnKind::Withdrawal, Reference::External(destination), None)?;
        Ok(balance)
    }

    pub fn transactions_for(&self, agent: &AgentId) -> Vec<Transaction> {
        self.ledger.transactions_for(agent)
    }

    // ---- audit ----

    /// Assembles the full six-term money invariant by combining the ledger's
    /// own books with the chips and escrows currently held by live tables and
    /// duels, state the ledger's aggregate boundary does not see directly
    /// (`Ledger::partial_audit` doc comment).
    pub fn audit(&self, currency: Currency) -> AuditReport {
        let mut report = self.ledger.partial_audit(currency);

        report.table_chips = self
            .tables
            .iter()
            .map(|e| e.value().lock().chips_in_play(currency))
            .fold(Money::ZERO, |acc, m| acc + m);

        let duel_escrows: Money = self
            .duels
            .iter()
            .map(|e| {
                let duel = e.value().lock();
                duel.escrow(currency)
            })
            .fold(Money::ZERO, |acc, m| acc + m);
        report.duel_escrows = duel_escrows;

        report
    }

    // ---- scheduler integration ( "Insert via nested
    // single-writer within callback") ----

    /// Drains every deadline due at the current clock time and dispatches it
    /// back through the owning aggregate's own command path, never straight
    /// into engine logic from the timer.
    pub fn tick(&self) {
        for key in self.scheduler.drain_due() {
            if let Some(table_id) = key.aggregate_id.strip_prefix(TABLE_PREFIX) {
                if let Some(handle) = self.tables.get(table_id).map(|e| e.clone()) {
                    let now = self.now();
                    let mut table = handle.lock();
                    if let Ok(effects) = table.handle_deadline(&self.ledger, &key.reason, now) {
                        drop(table);
                        self.apply_table_effects(table_id, effects);
                    }
                }
            } else if let Some(duel_id) = key.aggregate_id.strip_prefix(DUEL_PREFIX).and_then(|s| s.parse::<Uuid>().ok()) {
                if let Some(handle) = self.duels.get(&duel_id).map(|e| e.clone()) {
                    let now = self.now();
                    let mut duel = handle.lock();
                    if let Ok(effects) = duel.handle_deadline(&self.ledger, &key.reason, now) {
                        drop(duel);
                        self.apply_duel_effects(duel_id, effects);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::TableStakes;
    use crate::rake::RakeCapTable;
    use crate::scheduler::TestClock;

    fn base_time() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn world_at(now: DateTime<Utc>) -> World<TestClock> {
        World::new(TestClock::at(now))
    }

    fn sample_table_config() -> TableConfig {
        TableConfig {
            id: "t1".into(),
            name: "Test Table".into(),
            stakes: TableStakes { small_blind: 50, big_blind: 100 },
            min_buy_in: Money::from_cents(5_000),
            max_buy_in: Money::from_cents(20_000),
            max_seats: 6,
            currency: Currency::Primary,
            rake_caps: RakeCapTable::default(),
        }
    }

    #[test]
    fn join_seats_a_player_and_debits_the_ledger() {
        let world = world_at(base_time());
        world.create_table(sample_table_config(), TableTimings::default());
        let alice = AgentId::from("alice");
        world.deposit(alice.clone(), Currency::Primary, Money::from_cents(50_000)).unwrap();

        let view = world.join("t1", alice.clone(), "Alice".into(), Money::from_cents(10_000)).unwrap();
        assert_eq!(view.seats.len(), 1);
        assert_eq!(world.ledger.balance(&alice, Currency::Primary), Money::from_cents(40_000));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let world = world_at(base_time());
        let err = world.observe("ghost").unwrap_err();
        assert!(matches!(err, CommandError::UnknownTable));
    }

    #[test]
    fn coinflip_round_trip_resolves_on_accept() {
        let world = world_at(base_time());
        let w1 = AgentId::from("W1");
        let w2 = AgentId::from("W2");
        world.deposit(w1.clone(), Currency::Primary, Money::from_cents(10_000)).unwrap();
        world.deposit(w2.clone(), Currency::Primary, Money::from_cents(10_000)).unwrap();

        let id = world.coinflip_create(w1.clone(), Money::from_cents(100), Currency::Primary).unwrap();
        world.duel_accept(id, w2.clone()).unwrap();

        let duel = world.duel_get(id).unwrap();
        assert_eq!(duel.status, DuelStatus::Completed);
        assert!(duel.winner.is_some());

        let history = world.duel_history(DuelKind::Coinflip, &w1, 10);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn rps_reveal_mismatch_is_rejected_to_caller_but_still_forfeits() {
        let world = world_at(base_time());
        let creator = AgentId::from("creator");
        let acceptor = AgentId::from("acceptor");
        world.deposit(creator.clone(), Currency::Primary, Money::from_cents(10_000)).unwrap();
        world.deposit(acceptor.clone(), Currency::Primary, Money::from_cents(10_000)).unwrap();

        let id = world.rps_create(creator.clone(), Money::from_cents(100), 3, Currency::Primary).unwrap();
        world.duel_accept(id, acceptor.clone()).unwrap();

        let creator_hash = crate::shuffler::sha256(&[b"rock", b":", b"N1"]);
        let acceptor_hash = crate::shuffler::sha256(&[b"scissors", b":", b"N2"]);
        world.rps_commit(id, &creator, creator_hash).unwrap();
        world.rps_commit(id, &acceptor, acceptor_hash).unwrap();

        let err = world.rps_reveal(id, &creator, RpsChoice::Paper, "N1").unwrap_err();
        assert!(matches!(err, CommandError::Forfeited));

        let duel = world.duel_get(id).unwrap();
        assert_eq!(duel.status, DuelStatus::Forfeited);
        assert_eq!(duel.winner, Some(acceptor));
    }
}
