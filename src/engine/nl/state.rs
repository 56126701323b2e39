use serde::{Deserialize, Serialize};

use super::errors::{InvariantCheck, StateError};
use super::events::GameEvent;
use super::types::{ActionLog, Chips, HandConfig, PlayerState, PlayerStatus, Pots, SeatId, Street};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BettingState {
    // Street and turn order:
    pub street: Street,
    pub button: SeatId,
    pub first_to_act: SeatId,
    pub to_act: SeatId,

    // Open/raise accounting:
    pub current_bet_to_match: Chips, // highest committed_this_round among active seats
    pub last_full_raise_amount: Chips, // NL min-raise size for this round
    pub last_aggressor: Option<SeatId>,

    // Players & pots:
    pub players: Vec<PlayerState>,
    pub pots: Pots,

    // Rules for this hand:
    pub cfg: HandConfig,

    // Flow helpers:
    pub pending_to_match: Vec<SeatId>, // active, non-all-in seats that still owe
    pub betting_locked_all_in: bool,
    /// Seats that already acted this street before a short (non-full) all-in
    /// raised the bet; they may call or fold but not raise again until the
    /// next street.
    pub raise_reopen_barred: Vec<SeatId>,

    pub action_log: ActionLog,
}

impl BettingState {
    pub fn player(&self, seat: SeatId) -> &PlayerState {
        self.players.iter().find(|p| p.seat == seat).expect("seat must exist")
    }

    pub fn seat_index(&self, seat: SeatId) -> usize {
        self.players
            .iter()
            .position(|p| p.seat == seat)
            .expect("seat must exist")
    }

    pub fn active_non_allin_seats(&self) -> Vec<SeatId> {
        self.players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active)
            .map(|p| p.seat)
            .collect()
    }

    /// Seats still eligible to contest a pot: not folded, not sitting out.
    pub fn seats_still_in(&self) -> Vec<SeatId> {
        self.players
            .iter()
            .filter(|p| p.status != PlayerStatus::Folded && p.status != PlayerStatus::SittingOut)
            .map(|p| p.seat)
            .collect()
    }

    pub fn recompute_lock_if_all_in(&mut self) -> Option<GameEvent> {
        let any_active = self.players.iter().any(|p| p.status == PlayerStatus::Active);
        if !any_active {
            self.betting_locked_all_in = true;
            Some(GameEvent::AllPlayersAllIn)
        } else {
            None
        }
    }

    pub fn refresh_pots(&mut self) {
        if let Ok(p) = self.compute_pots() {
            self.pots = p;
        }
    }

    /// Seals the current street's bets into `committed_total` and resets
    /// per-street accounting for the next street.
    pub fn reset_per_street(&mut self, street: Street) {
        for p in &mut self.players {
            p.committed_total = p.committed_total.saturating_add(p.committed_this_round);
            p.committed_this_round = 0;
            if p.status == PlayerStatus::Active {
                p.has_acted_this_round = false;
            }
        }
        self.street = street;
        self.current_bet_to_match = 0;
        self.last_full_raise_amount = self.cfg.stakes.big_blind;
        self.last_aggressor = None;

        self.first_to_act = self.compute_first_to_act(street);
        self.to_act = self.first_to_act;
        self.pending_to_match = self
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Active)
            .map(|p| p.seat)
            .collect();
        self.betting_locked_all_in = false;
        self.raise_reopen_barred.clear();

        self.refresh_pots();
    }
}

impl InvariantCheck for BettingState {
    fn validate_invariants(&self) -> Result<(), StateError> {
        let folded: std::collections::HashSet<_> = self
            .players
            .iter()
            .filter(|p| p.status == PlayerStatus::Folded)
            .map(|p| p.seat)
            .collect();
        for pot in self.pots.all() {
            for sid in &pot.eligible {
                if folded.contains(sid) {
                    return Err(StateError::InvariantViolation(
                        "folded seat must not appear in any pot's eligibility set",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::events::NormalizedAction;
    use crate::engine::nl::types::{self, TableStakes};

    fn sample_state() -> BettingState {
        let stakes = TableStakes { small_blind: 1, big_blind: 2 };
        let cfg = HandConfig {
            stakes,
            num_seats: 3,
            button: 0,
            small_blind_seat: 1,
            big_blind_seat: 2,
        };
        let players = vec![
            PlayerState { seat: 0, player_id: Some(1), stack: 900, committed_this_round: 50, committed_total: 150, status: PlayerStatus::Active, has_acted_this_round: true },
            PlayerState { seat: 1, player_id: Some(2), stack: 750, committed_this_round: 40, committed_total: 120, status: PlayerStatus::AllIn, has_acted_this_round: true },
        ];
        let main_pot = types::Pot { amount: 200, eligible: vec![0, 1] };
        let pots = Pots { main: main_pot, sides: vec![types::Pot { amount: 40, eligible: vec![0] }] };
        let action_log = ActionLog(vec![types::ActionLogEntry {
            street: Street::Turn,
            seat: 0,
            action: NormalizedAction::Raise { to: 90, raise_amount: 40, full_raise: true },
            price_to_call_before: 50,
            current_bet_to_match_after: 90,
        }]);

        BettingState {
            street: Street::Turn,
            button: 0,
            first_to_act: 0,
            to_act: 0,
            current_bet_to_match: 90,
            last_full_raise_amount: 40,
            last_aggressor: Some(0),
            players,
            pots,
            cfg,
            pending_to_match: vec![0],
            betting_locked_all_in: false,
            raise_reopen_barred: vec![],
            action_log,
        }
    }

    #[test]
    fn betting_state_round_trips_with_serde() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: BettingState = serde_json::from_str(&json).unwrap();
        assert_eq!(state.current_bet_to_match, back.current_bet_to_match);
        assert_eq!(state.players.len(), back.players.len());
    }

    #[test]
    fn invariant_rejects_folded_seat_in_eligibility() {
        let mut state = sample_state();
        state.players[1].status = PlayerStatus::Folded;
        assert!(state.validate_invariants().is_err());
    }
}
