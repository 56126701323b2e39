//! Public and private table projections: the public view is what
//! every table-channel subscriber sees, the private view layers on a
//! specific agent's hole cards and legal-action set. Hole cards never enter
//! `PublicSeatView`, only a card count, so the table feed can show "dealt
//! in" without ever leaking what was dealt.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::engine::nl::types::{Chips, SeatId};
use crate::table::seat::{Seat, SeatStatus};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicSeatView {
    pub seat: SeatId,
    pub agent: AgentId,
    pub display_name: String,
    pub chips: Chips,
    pub bet_this_street: Chips,
    pub total_this_hand: Chips,
    pub status: SeatStatus,
    pub last_action: Option<String>,
    pub card_count: u8,
}

impl From<&Seat> for PublicSeatView {
    fn from(seat: &Seat) -> Self {
        PublicSeatView {
            seat: seat.seat,
            agent: seat.agent.clone(),
            display_name: seat.display_name.clone(),
            chips: seat.chips,
            bet_this_street: seat.bet_this_street,
            total_this_hand: seat.total_this_hand,
            status: seat.status,
            last_action: seat.last_action.clone(),
            card_count: seat.hole_cards.map_or(0, |_| 2),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PotView {
    pub amount: String,
    pub eligible: Vec<SeatId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentTurn {
    pub seat: SeatId,
    pub deadline: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublicTableView {
    pub table_id: String,
    pub name: String,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_seats: SeatId,
    pub currency: crate::money::Currency,
    pub seats: Vec<PublicSeatView>,
    pub dealer_seat: Option<SeatId>,
    pub community: Vec<String>,
    pub main_pot: Option<PotView>,
    pub side_pots: Vec<PotView>,
    pub street: Option<String>,
    pub current_turn: Option<CurrentTurn>,
    pub current_bet: Option<Chips>,
    pub hand_id: Option<Uuid>,
    pub shuffle_hash: Option<String>,
    pub hand_in_progress: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegalActionsView {
    pub may_fold: bool,
    pub may_check: bool,
    pub call_amount: Option<Chips>,
    pub raise_to_min: Option<Chips>,
    pub raise_to_max: Option<Chips>,
    pub may_all_in: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrivateTableView {
    #[serde(flatten)]
    pub public: PublicTableView,
    pub my_seat: Option<SeatId>,
    pub my_hole_cards: Option<[String; 2]>,
    pub legal_actions: Option<LegalActionsView>,
}
