use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::cards::Card;
use crate::engine::nl::types::{Chips, SeatId};

/// A seat's status between hands and during a hand.
/// `Active`/`Folded`/`AllIn` only have meaning while a hand is in
/// progress; a seat not in a hand is always `SittingOut`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    SittingOut,
    Active,
    Folded,
    AllIn,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Seat {
    pub seat: SeatId,
    pub agent: AgentId,
    pub display_name: String,
    pub chips: Chips,
    pub status: SeatStatus,
    pub hole_cards: Option<[Card; 2]>,
    pub bet_this_street: Chips,
    pub total_this_hand: Chips,
    pub last_action: Option<String>,
}

impl Seat {
    pub fn new(seat: SeatId, agent: AgentId, display_name: String, chips: Chips) -> Self {
        Seat {
            seat,
            agent,
            display_name,
            chips,
            status: SeatStatus::SittingOut,
            hole_cards: None,
            bet_this_street: 0,
            total_this_hand: 0,
            last_action: None,
        }
    }

    pub fn reset_for_new_hand(&mut self) {
        self.hole_cards = None;
        self.bet_this_street = 0;
        self.total_this_hand = 0;
        self.last_action = None;
        self.status = if self.chips > 0 { SeatStatus::Active } else { SeatStatus::SittingOut };
    }

    /// Returns a seat to `SittingOut` once a hand has concluded; chips are
    /// left untouched.
    pub fn clear_after_hand(&mut self) {
        self.hole_cards = None;
        self.bet_this_street = 0;
        self.total_this_hand = 0;
        self.last_action = None;
        self.status = SeatStatus::SittingOut;
    }
}
