use super::rules::NoLimitRules;
use super::state::BettingState;
use super::types::{Chips, PlayerStatus, SeatId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegalActions {
    pub may_fold: bool,
    pub may_check: bool,
    pub call_amount: Option<Chips>,
    /// Legal `RaiseTo` targets, whether this is the street's first voluntary
    /// bet (`current_bet_to_match == 0`) or a raise over an existing one —
    /// uses one formula for both.
    pub raise_to_range: Option<std::ops::RangeInclusive<Chips>>,
    pub may_all_in: bool,
}

impl LegalActions {
    pub fn none() -> Self {
        Self::default()
    }
}

pub fn legal_actions_for(state: &BettingState, seat: SeatId) -> LegalActions {
    let Some(p) = state.players.iter().find(|p| p.seat == seat) else {
        return LegalActions::none();
    };
    if p.status != PlayerStatus::Active || state.betting_locked_all_in || seat != state.to_act {
        return LegalActions::none();
    }

    let price = BettingState::price_to_call(state, seat);
    let barred = state.raise_reopen_barred.contains(&seat);
    LegalActions {
        may_fold: true,
        may_check: price == 0,
        call_amount: if price > 0 { Some(price.min(p.stack)) } else { None },
        raise_to_range: if barred { None } else { BettingState::raise_to_bounds(state, seat) },
        may_all_in: p.stack > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::types::{HandConfig, PlayerState, Pots, Street, TableStakes};

    fn two_player_preflop() -> BettingState {
        let mut sb = PlayerState::new(0, 100);
        sb.committed_this_round = 1;
        let mut bb = PlayerState::new(1, 100);
        bb.committed_this_round = 2;
        BettingState {
            street: Street::Preflop,
            button: 0,
            first_to_act: 0,
            to_act: 0,
            current_bet_to_match: 2,
            last_full_raise_amount: 2,
            last_aggressor: Some(1),
            players: vec![sb, bb],
            pots: Pots::default(),
            cfg: HandConfig {
                stakes: TableStakes { small_blind: 1, big_blind: 2 },
                num_seats: 2,
                button: 0,
                small_blind_seat: 0,
                big_blind_seat: 1,
            },
            pending_to_match: vec![0],
            betting_locked_all_in: false,
            raise_reopen_barred: vec![],
            action_log: Default::default(),
        }
    }

    #[test]
    fn heads_up_small_blind_faces_a_call_not_a_check() {
        let state = two_player_preflop();
        let legals = legal_actions_for(&state, 0);
        assert!(!legals.may_check);
        assert_eq!(legals.call_amount, Some(1));
        assert!(legals.raise_to_range.is_some());
    }

    #[test]
    fn acting_out_of_turn_yields_no_legal_actions() {
        let state = two_player_preflop();
        let legals = legal_actions_for(&state, 1);
        assert_eq!(legals, LegalActions::none());
    }
}
