use super::actions::PlayerAction;
use super::errors::{ActionError, StateError};
use super::events::{GameEvent, NormalizedAction};
use super::legals::{legal_actions_for, LegalActions};
use super::rules::NoLimitRules;
use super::seating::Seating;
use super::state::BettingState;
use super::types::{ActionLog, ActionLogEntry, Chips, HandConfig, PlayerState, PlayerStatus, Pots, SeatId, Street};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Continued { events: Vec<GameEvent>, next_to_act: SeatId },
    StreetEnd { events: Vec<GameEvent>, street: Street },
    HandEnd { events: Vec<GameEvent>, winner: SeatId, pots: Pots },
}

pub trait BettingEngineNL {
    fn new_after_deal(cfg: HandConfig, players: Vec<PlayerState>) -> BettingState;
    fn legal_actions(state: &BettingState, seat: SeatId) -> LegalActions;
    fn apply_action(state: &mut BettingState, seat: SeatId, action: PlayerAction) -> Result<Transition, ActionError>;
    fn advance_street(state: &mut BettingState) -> Result<Street, StateError>;
}

pub struct BettingEngine;

fn only_one_player_remaining(state: &BettingState) -> Option<SeatId> {
    let mut remaining = state.players.iter().filter(|p| p.status != PlayerStatus::Folded).map(|p| p.seat);
    let first = remaining.next()?;
    if remaining.next().is_none() { Some(first) } else { None }
}

fn all_active_all_in(state: &BettingState) -> bool {
    state
        .players
        .iter()
        .filter(|p| p.status != PlayerStatus::Folded)
        .all(|p| p.status != PlayerStatus::Active)
}

impl BettingEngineNL for BettingEngine {
    /// Builds the preflop betting state right after blinds have been posted
    ///: `players` already carry their blind
    /// contributions in `committed_this_round`.
    fn new_after_deal(cfg: HandConfig, players: Vec<PlayerState>) -> BettingState {
        let street = Street::Preflop;
        let current_bet_to_match = players.iter().map(|p| p.committed_this_round).max().unwrap_or(0);
        let mut state = BettingState {
            street,
            button: cfg.button,
            first_to_act: cfg.big_blind_seat,
            to_act: cfg.big_blind_seat,
            current_bet_to_match,
            last_full_raise_amount: cfg.stakes.big_blind,
            last_aggressor: Some(cfg.big_blind_seat),
            players,
            pots: Pots::default(),
            cfg,
            pending_to_match: Vec::new(),
            betting_locked_all_in: false,
            raise_reopen_barred: Vec::new(),
            action_log: ActionLog::default(),
        };
        state.first_to_act = state.compute_first_to_act(street);
        state.to_act = state.first_to_act;
        state.pending_to_match = state
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active && p.committed_this_round < state.current_bet_to_match)
            .map(|p| p.seat)
            .collect();
        state.refresh_pots();
        state
    }

    fn legal_actions(state: &BettingState, seat: SeatId) -> LegalActions {
        legal_actions_for(state, seat)
    }

    fn apply_action(state: &mut BettingState, seat: SeatId, action: PlayerAction) -> Result<Transition, ActionError> {
        if state.to_act != seat {
            return Err(ActionError::NotPlayersTurn);
        }
        let idx = state.seat_index(seat);
        if state.players[idx].status != PlayerStatus::Active {
            return Err(ActionError::ActorCannotAct);
        }

        let price_before = BettingState::price_to_call(state, seat);
        let normalized = apply_one(state, idx, seat, action, price_before)?;

        state.players[idx].has_acted_this_round = true;
        state.action_log.0.push(ActionLogEntry {
            street: state.street,
            seat,
            action: normalized.clone(),
            price_to_call_before: price_before,
            current_bet_to_match_after: state.current_bet_to_match,
        });

        let mut events = vec![GameEvent::ActionApplied { seat, action: normalized }];
        let before_pots = state.pots.clone();
        state.refresh_pots();
        if state.pots != before_pots {
            events.push(GameEvent::PotUpdated);
        }

        if let Some(winner) = only_one_player_remaining(state) {
            events.push(GameEvent::HandEndedByFolds { winner, pots: state.pots.clone() });
            return Ok(Transition::HandEnd { events, winner, pots: state.pots.clone() });
        }

        if all_active_all_in(state) && state.recompute_lock_if_all_in().is_some() {
            events.push(GameEvent::AllPlayersAllIn);
        }

        let next = state.next_actor(seat);
        if state.pending_to_match.is_empty() {
            events.push(GameEvent::StreetEnded { street: state.street });
            return Ok(Transition::StreetEnd { events, street: state.street });
        }
        state.to_act = next;
        Ok(Transition::Continued { events, next_to_act: next })
    }

    fn advance_street(state: &mut BettingState) -> Result<Street, StateError> {
        let next = match state.street {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River => Street::Showdown,
            Street::Showdown => return Err(StateError::InvalidTransition),
        };
        state.reset_per_street(next);
        Ok(next)
    }
}

fn apply_one(
    state: &mut BettingState,
    idx: usize,
    seat: SeatId,
    action: PlayerAction,
    price: Chips,
) -> Result<NormalizedAction, ActionError> {
    match action {
        PlayerAction::Fold => {
            state.players[idx].status = PlayerStatus::Folded;
            state.pending_to_match.retain(|s| *s != seat);
            Ok(NormalizedAction::Fold)
        }
        PlayerAction::Check => {
            if price > 0 {
                return Err(ActionError::CannotCheckFacingBet);
            }
            state.pending_to_match.retain(|s| *s != seat);
            Ok(NormalizedAction::Check)
        }
        PlayerAction::Call => {
            let stack = state.players[idx].stack;
            let call_amt = price.min(stack);
            state.players[idx].stack -= call_amt;
            state.players[idx].committed_this_round += call_amt;
            let full = call_amt == price;
            if state.players[idx].stack == 0 {
                state.players[idx].status = PlayerStatus::AllIn;
            }
            state.pending_to_match.retain(|s| *s != seat);
            Ok(NormalizedAction::Call { call_amount: call_amt, full_call: full })
        }
        PlayerAction::BetTo { to } | PlayerAction::RaiseTo { to } => apply_raise_to(state, idx, seat, to),
        PlayerAction::AllIn => apply_all_in(state, idx, seat, price),
    }
}

fn apply_raise_to(state: &mut BettingState, idx: usize, seat: SeatId, to: Chips) -> Result<NormalizedAction, ActionError> {
    if state.raise_reopen_barred.contains(&seat) {
        return Err(ActionError::IllegalAction);
    }
    let min = state
        .current_bet_to_match
        .saturating_add(state.cfg.stakes.big_blind.max(state.last_full_raise_amount));
    if to < min {
        return Err(ActionError::RaiseBelowMinimum);
    }
    let needed = to.saturating_sub(state.players[idx].committed_this_round);
    if needed > state.players[idx].stack {
        return Err(ActionError::InsufficientChips);
    }
    let opening = state.current_bet_to_match == 0;
    state.players[idx].stack -= needed;
    state.players[idx].committed_this_round = to;
    if state.players[idx].stack == 0 {
        state.players[idx].status = PlayerStatus::AllIn;
    }
    let raise_amount = to - state.current_bet_to_match;
    state.last_full_raise_amount = raise_amount;
    state.last_aggressor = Some(seat);
    state.current_bet_to_match = to;
    // A full raise reopens action for everyone, including seats a prior
    // short all-in had barred from re-raising.
    state.raise_reopen_barred.clear();
    state.pending_to_match = state
        .players
        .iter()
        .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
        .map(|p| p.seat)
        .collect();
    if opening {
        Ok(NormalizedAction::Bet { to })
    } else {
        Ok(NormalizedAction::Raise { to, raise_amount, full_raise: true })
    }
}

fn apply_all_in(state: &mut BettingState, idx: usize, seat: SeatId, price: Chips) -> Result<NormalizedAction, ActionError> {
    let stack = state.players[idx].stack;
    if stack == 0 {
        return Err(ActionError::InsufficientChips);
    }
    let total_to = state.players[idx].committed_this_round + stack;
    state.players[idx].stack = 0;
    state.players[idx].committed_this_round = total_to;
    state.players[idx].status = PlayerStatus::AllIn;

    if total_to <= state.current_bet_to_match {
        let call_amount = stack.min(price);
        state.pending_to_match.retain(|s| *s != seat);
        return Ok(NormalizedAction::AllInAsCall { call_amount, full_call: total_to == state.current_bet_to_match });
    }

    let raise_amount = total_to - state.current_bet_to_match;
    let full = BettingState::is_full_raise(state, raise_amount);
    state.current_bet_to_match = total_to;
    if full {
        state.last_full_raise_amount = raise_amount;
        state.last_aggressor = Some(seat);
        state.raise_reopen_barred.clear();
        state.pending_to_match = state
            .players
            .iter()
            .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
            .map(|p| p.seat)
            .collect();
    } else {
        // Short all-in: players who already acted this street may only
        // call/fold the new total, not raise again.
        for p in state.players.iter().filter(|p| p.seat != seat && p.status == PlayerStatus::Active && p.has_acted_this_round) {
            if !state.raise_reopen_barred.contains(&p.seat) {
                state.raise_reopen_barred.push(p.seat);
            }
        }
        state.pending_to_match = state
            .players
            .iter()
            .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
            .filter(|p| p.committed_this_round < total_to)
            .map(|p| p.seat)
            .collect();
    }
    Ok(NormalizedAction::AllInAsRaise { to: total_to, raise_amount, full_raise: full })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::types::TableStakes;

    fn blinds_posted(stacks: [Chips; 3]) -> BettingState {
        // 3-handed: button=0, sb=1, bb=2
        let mut players: Vec<PlayerState> = stacks
            .iter()
            .enumerate()
            .map(|(i, &s)| PlayerState::new(i as SeatId, s))
            .collect();
        players[1].stack -= 1;
        players[1].committed_this_round = 1;
        players[2].stack -= 2;
        players[2].committed_this_round = 2;
        let cfg = HandConfig {
            stakes: TableStakes { small_blind: 1, big_blind: 2 },
            num_seats: 3,
            button: 0,
            small_blind_seat: 1,
            big_blind_seat: 2,
        };
        BettingEngine::new_after_deal(cfg, players)
    }

    #[test]
    fn three_way_all_in_produces_main_and_side_pot() {
        // A(button)=10, B(sb)=25, C(bb)=100 at 0.5/1.0 blinds scaled to whole chips here
        let mut state = blinds_posted([10, 25, 100]);
        // Button (seat 0) acts first preflop 3-handed and shoves for 10.
        state.to_act = 0;
        let t = BettingEngine::apply_action(&mut state, 0, PlayerAction::AllIn).unwrap();
        assert!(matches!(t, Transition::Continued { .. }));

        // SB (seat 1) already committed 1, is all-in for the rest of 24 -> total 25.
        let t = BettingEngine::apply_action(&mut state, 1, PlayerAction::AllIn).unwrap();
        assert!(matches!(t, Transition::Continued { .. }));

        // BB (seat 2) calls to 25.
        let t = BettingEngine::apply_action(&mut state, 2, PlayerAction::Call).unwrap();
        match t {
            Transition::StreetEnd { .. } | Transition::HandEnd { .. } => {}
            other => panic!("expected street to seal, got {other:?}"),
        }

        assert_eq!(state.pots.main.amount, 30);
        assert_eq!(state.pots.main.eligible, vec![0, 1, 2]);
        assert_eq!(state.pots.sides.len(), 1);
        assert_eq!(state.pots.sides[0].amount, 30);
        assert_eq!(state.pots.sides[0].eligible, vec![1, 2]);
    }

    #[test]
    fn short_all_in_does_not_reopen_action_for_prior_caller() {
        // SB (seat 1) carries a short stack; everyone else is deep.
        let mut state = blinds_posted([1000, 25, 1000]);
        state.to_act = 0;
        BettingEngine::apply_action(&mut state, 0, PlayerAction::Call).unwrap(); // button calls to 2
        state.to_act = 2;
        BettingEngine::apply_action(&mut state, 2, PlayerAction::RaiseTo { to: 20 }).unwrap(); // BB raises big, last_full_raise_amount=18
        state.to_act = 0;
        BettingEngine::apply_action(&mut state, 0, PlayerAction::Call).unwrap(); // button calls to 20
        // SB (already committed 1, 24 left) can only go all-in for a total of 25,
        // a raise of 5 over 20 -- short of the 18 needed for a full raise.
        state.to_act = 1;
        BettingEngine::apply_action(&mut state, 1, PlayerAction::AllIn).unwrap();
        assert!(state.raise_reopen_barred.contains(&0));
        assert!(state.raise_reopen_barred.contains(&2));
        let legals = BettingEngine::legal_actions(&state, 0);
        assert!(legals.raise_to_range.is_none());
    }

    #[test]
    fn fold_to_one_ends_hand_immediately() {
        let mut state = blinds_posted([1000, 1000, 1000]);
        state.to_act = 0;
        BettingEngine::apply_action(&mut state, 0, PlayerAction::RaiseTo { to: 6 }).unwrap();
        state.to_act = 1;
        BettingEngine::apply_action(&mut state, 1, PlayerAction::Fold).unwrap();
        state.to_act = 2;
        let t = BettingEngine::apply_action(&mut state, 2, PlayerAction::Fold).unwrap();
        match t {
            Transition::HandEnd { winner, .. } => assert_eq!(winner, 0),
            other => panic!("expected hand to end by folds, got {other:?}"),
        }
        assert_eq!(state.street, Street::Preflop, "no flop was dealt: no-flop-no-drop applies");
    }
}
