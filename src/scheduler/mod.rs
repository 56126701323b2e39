//! Deadline scheduler: a monotonic deadline wheel keyed
//! by `(aggregate_id, reason)`. Rescheduling the same key replaces its
//! pending deadline rather than creating a second entry, and everything the
//! wheel fires is dispatched back through the same single-writer region that
//! owns the aggregate, never straight into game logic from a timer thread.
//!
//! Time itself is behind a [`Clock`] trait so tests can advance a
//! deterministic [`TestClock`] instead of racing the wall clock, the same
//! reason the shuffle RNG in this crate is kept seedable rather than
//! reaching for `thread_rng()` everywhere.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to, for deterministic tests of timed
/// actions and duel timeouts.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl TestClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        TestClock { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.now.lock();
        *guard += delta;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeadlineKey {
    pub aggregate_id: String,
    pub reason: String,
}

impl DeadlineKey {
    pub fn new(aggregate_id: impl Into<String>, reason: impl Into<String>) -> Self {
        DeadlineKey { aggregate_id: aggregate_id.into(), reason: reason.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    at: DateTime<Utc>,
    key: DeadlineKey,
    generation: u64,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at)
    }
}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A monotonic wheel of pending deadlines. Entries are invalidated by
/// generation count on reschedule/cancel so stale heap entries are skipped
/// rather than physically removed (cheap cancel-by-superseding, same idea as
/// a lazy-deletion priority queue).
pub struct DeadlineWheel<C: Clock> {
    clock: C,
    heap: Mutex<BinaryHeap<Reverse<Entry>>>,
    generations: RwLock<HashMap<DeadlineKey, u64>>,
}

impl<C: Clock> DeadlineWheel<C> {
    pub fn new(clock: C) -> Self {
        DeadlineWheel {
            clock,
            heap: Mutex::new(BinaryHeap::new()),
            generations: RwLock::new(HashMap::new()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Schedules (or reschedules) `key` to fire at `at`. Idempotent: calling
    /// this again for the same key replaces the previous deadline.
    pub fn schedule(&self, key: DeadlineKey, at: DateTime<Utc>) {
        let generation = {
            let mut gens = self.generations.write();
            let gen = gens.entry(key.clone()).or_insert(0);
            *gen += 1;
            *gen
        };
        self.heap.lock().push(Reverse(Entry { at, key, generation }));
    }

    pub fn cancel(&self, key: &DeadlineKey) {
        let mut gens = self.generations.write();
        if let Some(gen) = gens.get_mut(key) {
            *gen += 1;
        }
    }

    /// Pops every entry whose deadline is at or before the clock's current
    /// time and whose generation is still current, draining stale/cancelled
    /// entries along the way.
    pub fn drain_due(&self) -> Vec<DeadlineKey> {
        let now = self.clock.now();
        let mut due = Vec::new();
        let mut heap = self.heap.lock();
        let gens = self.generations.read();
        while let Some(Reverse(top)) = heap.peek() {
            if top.at > now {
                break;
            }
            let Reverse(entry) = heap.pop().unwrap();
            if gens.get(&entry.key).copied() == Some(entry.generation) {
                due.push(entry.key);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_time() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn fires_only_once_due_deadline_has_passed() {
        let clock = TestClock::at(base_time());
        let wheel = DeadlineWheel::new(clock.clone());
        let key = DeadlineKey::new("table-1", "action_timeout");
        wheel.schedule(key.clone(), base_time() + Duration::seconds(30));

        assert!(wheel.drain_due().is_empty());
        clock.advance(Duration::seconds(31));
        assert_eq!(wheel.drain_due(), vec![key]);
    }

    #[test]
    fn rescheduling_replaces_rather_than_duplicates() {
        let clock = TestClock::at(base_time());
        let wheel = DeadlineWheel::new(clock.clone());
        let key = DeadlineKey::new("table-1", "action_timeout");
        wheel.schedule(key.clone(), base_time() + Duration::seconds(10));
        wheel.schedule(key.clone(), base_time() + Duration::seconds(60));

        clock.advance(Duration::seconds(20));
        assert!(wheel.drain_due().is_empty(), "first schedule must be superseded");

        clock.advance(Duration::seconds(60));
        assert_eq!(wheel.drain_due(), vec![key]);
    }

    #[test]
    fn cancel_suppresses_a_pending_deadline() {
        let clock = TestClock::at(base_time());
        let wheel = DeadlineWheel::new(clock.clone());
        let key = DeadlineKey::new("duel-1", "reveal_timeout");
        wheel.schedule(key.clone(), base_time() + Duration::seconds(10));
        wheel.cancel(&key);

        clock.advance(Duration::seconds(20));
        assert!(wheel.drain_due().is_empty());
    }
}
