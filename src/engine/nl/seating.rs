use super::state::BettingState;
use super::types::{PlayerStatus, SeatId, Street};

pub trait Seating {
    fn next_actor(&self, from: SeatId) -> SeatId;
    fn compute_first_to_act(&self, street: Street) -> SeatId;
}

impl Seating for BettingState {
    /// Walks forward from `from` around the table (wrapping at
    /// `cfg.num_seats`), returning the first seat still `Active`. With at
    /// most 6 configured seats this always terminates within one lap.
    fn next_actor(&self, from: SeatId) -> SeatId {
        let num_seats = self.cfg.num_seats.max(1);
        let mut seat = from;
        for _ in 0..num_seats {
            seat = (seat + 1) % num_seats;
            if let Some(p) = self.players.iter().find(|p| p.seat == seat) {
                if p.status == PlayerStatus::Active {
                    return seat;
                }
            }
        }
        from
    }

    fn compute_first_to_act(&self, street: Street) -> SeatId {
        match street {
            Street::Preflop => self.next_actor(self.cfg.big_blind_seat),
            _ => self.next_actor(self.cfg.button),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::types::{HandConfig, PlayerState, Pots, TableStakes};

    fn state_with(statuses: &[PlayerStatus]) -> BettingState {
        let players = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut p = PlayerState::new(i as SeatId, 1000);
                p.status = *s;
                p
            })
            .collect();
        BettingState {
            street: Street::Preflop,
            button: 0,
            first_to_act: 0,
            to_act: 0,
            current_bet_to_match: 0,
            last_full_raise_amount: 0,
            last_aggressor: None,
            players,
            pots: Pots::default(),
            cfg: HandConfig {
                stakes: TableStakes { small_blind: 1, big_blind: 2 },
                num_seats: statuses.len() as SeatId,
                button: 0,
                small_blind_seat: 1,
                big_blind_seat: 2,
            },
            pending_to_match: vec![],
            betting_locked_all_in: false,
            raise_reopen_barred: vec![],
            action_log: Default::default(),
        }
    }

    #[test]
    fn next_actor_skips_folded_and_wraps() {
        let state = state_with(&[PlayerStatus::Active, PlayerStatus::Folded, PlayerStatus::Active]);
        assert_eq!(state.next_actor(0), 2);
        assert_eq!(state.next_actor(2), 0);
    }
}
