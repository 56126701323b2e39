//! Event bus: every table has its own channel, every agent has
//! a private channel for information that must never reach the table feed
//! (hole cards), and duel lifecycle events fan out on one global channel.
//!
//! A concurrent map from subscriber id to a bounded `tokio::sync::mpsc::Sender`,
//! published to with `try_send` so a slow or dead subscriber never blocks the
//! aggregate's single-writer loop; it just drops the message. Best effort,
//! non-blocking, order preserved per subscriber.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::agent::AgentId;

pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        SubscriberId(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Public event broadcast on a table's channel. Hole cards never appear
/// here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    HandStarted { table_id: String, hand_id: Uuid, button_seat: u8, shuffle_hash: String },
    StreetDealt { table_id: String, hand_id: Uuid, street: String, community: Vec<String> },
    ActionTaken { table_id: String, hand_id: Uuid, seat: u8, action: String, amount: Option<String> },
    PotsUpdated { table_id: String, hand_id: Uuid, main_pot: String, side_pots: Vec<String> },
    PotAwarded { table_id: String, hand_id: Uuid, seat: u8, amount: String },
    HandEnded { table_id: String, hand_id: Uuid, shuffle_seed: String },
    SeatJoined { table_id: String, seat: u8, agent: AgentId },
    SeatLeft { table_id: String, seat: u8 },
}

/// Private event delivered only to the one agent it concerns: hole cards at
/// deal time, and the result of their own showdown if they mucked.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrivateEvent {
    HoleCards { table_id: String, hand_id: Uuid, cards: [String; 2] },
}

/// Global duel lifecycle event, broadcast on one shared
/// channel regardless of game kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DuelEvent {
    Opened { duel_id: Uuid, kind: String, creator: AgentId, stake: String },
    Accepted { duel_id: Uuid, acceptor: AgentId },
    Cancelled { duel_id: Uuid },
    RoundCommitted { duel_id: Uuid, round: u8, agent: AgentId },
    RoundRevealed { duel_id: Uuid, round: u8, agent: AgentId, choice: String },
    Resolved { duel_id: Uuid, winner: Option<AgentId>, payout: String, rake: String },
    Forfeited { duel_id: Uuid, forfeiting_agent: AgentId },
    Expired { duel_id: Uuid },
}

struct Channel<E> {
    subscribers: DashMap<SubscriberId, mpsc::Sender<E>>,
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Channel { subscribers: DashMap::new() }
    }
}

impl<E: Clone> Channel<E> {
    fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<E>) {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.subscribers.insert(id, tx);
        (id, rx)
    }

    fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.remove(&id);
    }

    /// Best-effort fan-out: a full or closed subscriber channel is dropped
    /// silently rather than blocking the publisher.
    fn publish(&self, event: E) {
        self.subscribers.retain(|_, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

#[derive(Default)]
pub struct TableBus {
    channel: Channel<TableEvent>,
}

impl TableBus {
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<TableEvent>) {
        self.channel.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.channel.unsubscribe(id);
    }

    pub fn publish(&self, event: TableEvent) {
        self.channel.publish(event);
    }
}

#[derive(Default)]
pub struct DuelBus {
    channel: Channel<DuelEvent>,
}

impl DuelBus {
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<DuelEvent>) {
        self.channel.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.channel.unsubscribe(id);
    }

    pub fn publish(&self, event: DuelEvent) {
        self.channel.publish(event);
    }
}

/// Per-agent private channels, keyed by agent id rather than a fixed
/// subscriber id: an agent may have several live connections (e.g. two
/// browser tabs), each gets its own sender.
#[derive(Default)]
pub struct PrivateBus {
    subscribers: DashMap<AgentId, Vec<(SubscriberId, mpsc::Sender<PrivateEvent>)>>,
}

impl PrivateBus {
    pub fn subscribe(&self, agent: &AgentId) -> (SubscriberId, mpsc::Receiver<PrivateEvent>) {
        let id = SubscriberId::new();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.subscribers.entry(agent.clone()).or_default().push((id, tx));
        (id, rx)
    }

    pub fn unsubscribe(&self, agent: &AgentId, id: SubscriberId) {
        if let Some(mut list) = self.subscribers.get_mut(agent) {
            list.retain(|(sid, _)| *sid != id);
        }
    }

    pub fn publish_to(&self, agent: &AgentId, event: PrivateEvent) {
        if let Some(mut list) = self.subscribers.get_mut(agent) {
            list.retain(|(_, tx)| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
        }
    }
}

/// Registry of per-table buses, created lazily on first reference.
#[derive(Default)]
pub struct EventHub {
    tables: DashMap<String, Arc<TableBus>>,
    pub duels: Arc<DuelBus>,
    pub private: Arc<PrivateBus>,
}

impl EventHub {
    pub fn new() -> Self {
        EventHub {
            tables: DashMap::new(),
            duels: Arc::new(DuelBus::default()),
            private: Arc::new(PrivateBus::default()),
        }
    }

    pub fn table(&self, table_id: &str) -> Arc<TableBus> {
        self.tables
            .entry(table_id.to_string())
            .or_insert_with(|| Arc::new(TableBus::default()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn table_events_are_delivered_in_order_per_subscriber() {
        let bus = TableBus::default();
        let (_id, mut rx) = bus.subscribe();
        bus.publish(TableEvent::SeatJoined { table_id: "t1".into(), seat: 0, agent: AgentId::from("alice") });
        bus.publish(TableEvent::SeatLeft { table_id: "t1".into(), seat: 0 });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first, TableEvent::SeatJoined { .. }));
        assert!(matches!(second, TableEvent::SeatLeft { .. }));
    }

    #[tokio::test]
    async fn private_events_do_not_leak_across_agents() {
        let bus = PrivateBus::default();
        let alice = AgentId::from("alice");
        let bob = AgentId::from("bob");
        let (_a, mut rx_alice) = bus.subscribe(&alice);
        let (_b, mut rx_bob) = bus.subscribe(&bob);

        bus.publish_to(&alice, PrivateEvent::HoleCards {
            table_id: "t1".into(),
            hand_id: Uuid::new_v4(),
            cards: ["Ah".into(), "Kd".into()],
        });

        assert!(rx_alice.try_recv().is_ok());
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribed_listener_stops_receiving() {
        let bus = TableBus::default();
        let (id, mut rx) = bus.subscribe();
        bus.unsubscribe(id);
        bus.publish(TableEvent::SeatLeft { table_id: "t1".into(), seat: 2 });
        assert!(rx.try_recv().is_err());
    }
}
