use serde::{Deserialize, Serialize};

use super::events::NormalizedAction;

pub type Chips = u64;
pub type SeatId = u8; // 0..max_seats, max_seats <= 6
pub type PlayerId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,     // can act this round
    Folded,     // out of hand
    AllIn,      // cannot act; still eligible for pots
    SittingOut, // not dealt in
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub seat: SeatId,
    pub player_id: Option<PlayerId>,

    pub stack: Chips,                // uncommitted chips behind
    pub committed_this_round: Chips, // on the current street
    pub committed_total: Chips,      // across all streets completed so far (not including this one)

    pub status: PlayerStatus,
    pub has_acted_this_round: bool,
}

impl PlayerState {
    pub fn new(seat: SeatId, stack: Chips) -> Self {
        Self {
            seat,
            player_id: None,
            stack,
            committed_this_round: 0,
            committed_total: 0,
            status: PlayerStatus::Active,
            has_acted_this_round: false,
        }
    }

    /// Total chips this player has put in the pot across every street,
    /// including the one in progress.
    pub fn total_contribution(&self) -> Chips {
        self.committed_total.saturating_add(self.committed_this_round)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: Vec<SeatId>, // seats that can win this pot
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pots {
    pub main: Pot,
    pub sides: Vec<Pot>,
}

impl Default for Pots {
    fn default() -> Self {
        Self {
            main: Pot { amount: 0, eligible: vec![] },
            sides: vec![],
        }
    }
}

impl Pots {
    pub fn total(&self) -> Chips {
        self.main.amount + self.sides.iter().map(|p| p.amount).sum::<Chips>()
    }

    pub fn all(&self) -> impl Iterator<Item = &Pot> {
        std::iter::once(&self.main).chain(self.sides.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStakes {
    pub small_blind: Chips,
    pub big_blind: Chips,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandConfig {
    pub stakes: TableStakes,
    pub num_seats: SeatId,
    pub button: SeatId,
    pub small_blind_seat: SeatId,
    pub big_blind_seat: SeatId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub street: Street,
    pub seat: SeatId,
    pub action: NormalizedAction,
    pub price_to_call_before: Chips,
    pub current_bet_to_match_after: Chips,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog(pub Vec<ActionLogEntry>);
