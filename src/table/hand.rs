use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cards::{evaluate_best_hand, Card};
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::{Chips, SeatId, Street};
use crate::shuffler::CommittedShuffle;

/// One hand in progress: the committed shuffle, the betting state machine,
/// and the community cards dealt so far.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveHand {
    pub hand_id: Uuid,
    pub shuffle_hash: crate::shuffler::Digest32,
    #[serde(skip)]
    pub shuffle: Option<CommittedShuffle>,
    pub betting: BettingState,
    pub hole_cards: HashMap<SeatId, [Card; 2]>,
    pub community: Vec<Card>,
    pub next_card_index: usize,
}

impl ActiveHand {
    /// Deals two hole cards to each seat in `order` (dealer-rotation order,
    /// hand start), one card per seat per pass.
    pub fn deal_hole_cards(shuffle: &CommittedShuffle, order: &[SeatId]) -> (HashMap<SeatId, [Card; 2]>, usize) {
        let mut dealt: HashMap<SeatId, Vec<Card>> = order.iter().map(|&s| (s, Vec::with_capacity(2))).collect();
        let mut idx = 0;
        for _ in 0..2 {
            for &seat in order {
                dealt.get_mut(&seat).unwrap().push(shuffle.deck[idx]);
                idx += 1;
            }
        }
        let hole = dealt
            .into_iter()
            .map(|(seat, cards)| (seat, [cards[0], cards[1]]))
            .collect();
        (hole, idx)
    }

    pub fn deal_next_street(&mut self) {
        let shuffle = self.shuffle.as_ref().expect("shuffle retained until hand completes");
        let n = match self.betting.street {
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
            Street::Preflop | Street::Showdown => 0,
        };
        for _ in 0..n {
            self.community.push(shuffle.deck[self.next_card_index]);
            self.next_card_index += 1;
        }
    }

    pub fn saw_flop(&self) -> bool {
        self.community.len() >= 3
    }
}

/// Result of evaluating one pot at showdown: winning seats and the per-seat
/// share they're credited.
#[derive(Clone, Debug)]
pub struct PotSettlement {
    pub winners: Vec<SeatId>,
    pub rake: crate::money::Money,
    pub shares: HashMap<SeatId, crate::money::Money>,
}

/// Evaluates one pot: among `eligible` seats, the best 7-card hand wins; ties
/// split the pot equally with any odd cent going to the first winner in
/// `act_order` (earliest-to-act-postflop showdown).
pub fn settle_pot(
    pot_amount: Chips,
    eligible: &[SeatId],
    hole_cards: &HashMap<SeatId, [Card; 2]>,
    community: &[Card],
    act_order: &[SeatId],
    rake: crate::money::Money,
) -> PotSettlement {
    use crate::money::Money;
    use crate::table::config::chips_to_money;

    let pot_money = chips_to_money(pot_amount);
    let payable = if pot_money > rake { pot_money - rake } else { Money::ZERO };
    let rake = if pot_money > rake { rake } else { pot_money };

    let mut best: Option<(SeatId, _)> = None;
    let mut winners = Vec::new();

    for &seat in eligible {
        let hole = hole_cards[&seat];
        let seven = [hole[0], hole[1], community[0], community[1], community[2], community[3], community[4]];
        let evaluated = evaluate_best_hand(seven);
        match &best {
            None => {
                best = Some((seat, evaluated));
                winners = vec![seat];
            }
            Some((_, b)) if evaluated > *b => {
                best = Some((seat, evaluated));
                winners = vec![seat];
            }
            Some((_, b)) if evaluated == *b => {
                winners.push(seat);
            }
            _ => {}
        }
    }

    winners.sort_by_key(|s| act_order.iter().position(|x| x == s).unwrap_or(usize::MAX));

    let n = winners.len() as i64;
    let base_cents = payable.cents() / n;
    let remainder = payable.cents() % n;
    let mut shares = HashMap::new();
    for (i, &seat) in winners.iter().enumerate() {
        let extra = if i == 0 { remainder } else { 0 };
        shares.insert(seat, Money::from_cents(base_cents + extra));
    }

    PotSettlement { winners, rake, shares }
}
