use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::engine::nl::types::{Chips, SeatId, TableStakes};
use crate::money::{Currency, Money};
use crate::rake::RakeCapTable;

/// Table configuration is immutable for the table's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableConfig {
    pub id: String,
    pub name: String,
    pub stakes: TableStakes,
    pub min_buy_in: Money,
    pub max_buy_in: Money,
    pub max_seats: SeatId,
    pub currency: Currency,
    #[serde(skip)]
    pub rake_caps: RakeCapTable,
}

/// Deadlines the table engine schedules through the scheduler: how
/// long an idle table waits before auto-starting once it has enough chips
/// on the felt, how long the acting seat gets before a forced check/fold,
/// and how long the table pauses between hands.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TableTimings {
    #[serde(with = "duration_seconds")]
    pub auto_start_delay: Duration,
    #[serde(with = "duration_seconds")]
    pub action_timeout: Duration,
    #[serde(with = "duration_seconds")]
    pub next_hand_delay: Duration,
}

impl Default for TableTimings {
    /// Auto-start 3-5s after the second buy-in, a 30s action clock, a short
    /// pause before the next hand.
    fn default() -> Self {
        TableTimings {
            auto_start_delay: Duration::seconds(4),
            action_timeout: Duration::seconds(30),
            next_hand_delay: Duration::seconds(3),
        }
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}

/// Chips are integer-denominated in the table's currency units; a chip is
/// exactly one cent of `currency` under this fixed-point model, so
/// conversion to/from `Money` is a direct cast.
pub fn money_to_chips(amount: Money) -> Chips {
    amount.cents().max(0) as Chips
}

pub fn chips_to_money(chips: Chips) -> Money {
    Money::from_cents(chips as i64)
}

impl TableConfig {
    pub fn buy_in_in_range(&self, amount: Money) -> bool {
        amount >= self.min_buy_in && amount <= self.max_buy_in
    }

    /// Labels this table's stakes for the rake-cap lookup, keyed by a
    /// blind-level string, e.g. "0.50/1.00".
    pub fn blind_level_label(&self) -> String {
        format!(
            "{}/{}",
            chips_to_money(self.stakes.small_blind),
            chips_to_money(self.stakes.big_blind)
        )
    }
}
