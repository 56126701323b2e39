//! Rake calculation: coinflip takes a flat 4% of the pot, RPS a
//! flat 5%, and poker 5% per pot subject to a no-flop-no-drop rule and a
//! blind-level/player-count cap table. All rounding is half-away-from-zero
//! via [`Money::mul_rate_round`].

use std::collections::HashMap;

use crate::money::Money;

pub const COINFLIP_RAKE_NUM: i64 = 4;
pub const RPS_RAKE_NUM: i64 = 5;
pub const POKER_RAKE_NUM: i64 = 5;
const RAKE_DENOM: i64 = 100;

pub fn coinflip_rake(pot: Money) -> Money {
    pot.mul_rate_round(COINFLIP_RAKE_NUM, RAKE_DENOM)
}

pub fn rps_rake(pot: Money) -> Money {
    pot.mul_rate_round(RPS_RAKE_NUM, RAKE_DENOM)
}

/// Caps the rake a single pot may contribute, keyed by (blind level label,
/// number of players who saw the flop, clamped to 2..=6). Table stakes name
/// their blind level (e.g. "1/2", "5/10"); an unlisted level falls back to
/// `default_cap`.
#[derive(Clone, Debug)]
pub struct RakeCapTable {
    caps: HashMap<(String, u8), Money>,
    default_cap: Money,
}

impl Default for RakeCapTable {
    /// An unbounded cap (no table configured) leaves rake at the flat
    /// percentage; callers that want a real cap use `with_entry`.
    fn default() -> Self {
        RakeCapTable::new(Money::from_cents(i64::MAX))
    }
}

impl RakeCapTable {
    pub fn new(default_cap: Money) -> Self {
        RakeCapTable { caps: HashMap::new(), default_cap }
    }

    pub fn with_entry(mut self, blind_level: impl Into<String>, player_count: u8, cap: Money) -> Self {
        self.caps.insert((blind_level.into(), clamp_players(player_count)), cap);
        self
    }

    pub fn cap_for(&self, blind_level: &str, player_count: u8) -> Money {
        self.caps
            .get(&(blind_level.to_string(), clamp_players(player_count)))
            .copied()
            .unwrap_or(self.default_cap)
    }
}

fn clamp_players(n: u8) -> u8 {
    n.clamp(2, 6)
}

/// Poker rake for a single pot: no rake is taken if the pot never saw
/// a flop, otherwise 5% of the pot capped by the blind-level/player-count
/// table.
pub fn poker_pot_rake(pot: Money, saw_flop: bool, blind_level: &str, player_count: u8, caps: &RakeCapTable) -> Money {
    if !saw_flop || pot <= Money::ZERO {
        return Money::ZERO;
    }
    let raw = pot.mul_rate_round(POKER_RAKE_NUM, RAKE_DENOM);
    let cap = caps.cap_for(blind_level, player_count);
    if raw > cap {
        cap
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coinflip_rake_is_four_percent() {
        assert_eq!(coinflip_rake(Money::from_cents(10_000)), Money::from_cents(400));
    }

    #[test]
    fn rps_rake_is_five_percent() {
        assert_eq!(rps_rake(Money::from_cents(10_000)), Money::from_cents(500));
    }

    #[test]
    fn no_flop_no_drop() {
        let caps = RakeCapTable::new(Money::from_cents(1_000_00));
        let rake = poker_pot_rake(Money::from_cents(5_000), false, "1/2", 6, &caps);
        assert_eq!(rake, Money::ZERO);
    }

    #[test]
    fn poker_rake_is_capped_at_blind_level() {
        let caps = RakeCapTable::new(Money::from_cents(1_000)).with_entry("1/2", 6, Money::from_cents(300));
        // 5% of 10000 cents ($100.00) = $5.00 (500 cents), capped to $3.00
        let rake = poker_pot_rake(Money::from_cents(10_000), true, "1/2", 6, &caps);
        assert_eq!(rake, Money::from_cents(300));
    }

    #[test]
    fn poker_rake_uncapped_when_below_cap() {
        let caps = RakeCapTable::new(Money::from_cents(1_000_00)).with_entry("1/2", 6, Money::from_cents(300));
        let rake = poker_pot_rake(Money::from_cents(1_000), true, "1/2", 6, &caps);
        assert_eq!(rake, Money::from_cents(50));
    }

    #[test]
    fn player_count_outside_range_clamps_into_table() {
        let caps = RakeCapTable::new(Money::from_cents(1_000_00)).with_entry("1/2", 2, Money::from_cents(100));
        // 9 players clamps to 6 which has no entry so falls back to default
        let rake = poker_pot_rake(Money::from_cents(10_000), true, "1/2", 9, &caps);
        assert_eq!(rake, Money::from_cents(1_000_00).min(Money::from_cents(500)));
    }
}
