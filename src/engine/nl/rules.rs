use super::state::BettingState;
use super::types::{Chips, PlayerStatus, SeatId};

pub trait NoLimitRules {
    fn price_to_call(state: &BettingState, seat: SeatId) -> Chips;
    /// Legal range for a `RaiseTo`/`BetTo` action regardless of whether the
    /// street has an existing bet: a raise to T is legal iff
    /// T ≥ current-bet + max(BB, last-raise-size); the same formula covers
    /// the unopened case since `current_bet_to_match` is 0 and
    /// `last_full_raise_amount` is seeded to BB at street start.
    fn raise_to_bounds(state: &BettingState, seat: SeatId) -> Option<std::ops::RangeInclusive<Chips>>;
    fn is_full_raise(state: &BettingState, raise_amount: Chips) -> bool;
}

impl NoLimitRules for BettingState {
    fn price_to_call(state: &BettingState, seat: SeatId) -> Chips {
        let p = state.player(seat);
        if p.status != PlayerStatus::Active {
            return 0;
        }
        state.current_bet_to_match.saturating_sub(p.committed_this_round)
    }

    fn raise_to_bounds(state: &BettingState, seat: SeatId) -> Option<std::ops::RangeInclusive<Chips>> {
        let p = state.players.iter().find(|p| p.seat == seat)?;
        if p.status != PlayerStatus::Active {
            return None;
        }
        let min_increment = state.cfg.stakes.big_blind.max(state.last_full_raise_amount);
        let min = state.current_bet_to_match.saturating_add(min_increment);
        let max = p.committed_this_round + p.stack;
        if max <= state.current_bet_to_match || max < min {
            // A player who cannot reach a full raise can still move all-in
            // for less; that path goes through `PlayerAction::AllIn`, not
            // this range.
            return None;
        }
        Some(min..=max)
    }

    fn is_full_raise(state: &BettingState, raise_amount: Chips) -> bool {
        raise_amount >= state.cfg.stakes.big_blind.max(state.last_full_raise_amount)
    }
}

impl BettingState {
    /// Side-pot construction: sort contribution levels
    /// ascending; for each distinct level C among players still carrying it,
    /// the pot at that tier is `(C - prev) * (players whose total >= C)`,
    /// eligible to win it = those players minus anyone folded. Folded
    /// players' money still counts toward pot amounts, it just can't be won
    /// by them.
    pub fn compute_pots(&self) -> Result<super::types::Pots, super::errors::StateError> {
        use super::types::{Pot, Pots};

        let contrib: Vec<(SeatId, Chips, PlayerStatus)> = self
            .players
            .iter()
            .filter(|p| p.status != PlayerStatus::SittingOut)
            .map(|p| (p.seat, p.total_contribution(), p.status))
            .collect();

        let mut levels: Vec<Chips> = contrib.iter().map(|(_, c, _)| *c).filter(|&c| c > 0).collect();
        levels.sort_unstable();
        levels.dedup();
        if levels.is_empty() {
            return Ok(Pots::default());
        }

        let mut pots = Vec::new();
        let mut prev: Chips = 0;
        for level in levels {
            let carriers: Vec<&(SeatId, Chips, PlayerStatus)> =
                contrib.iter().filter(|(_, c, _)| *c >= level).collect();
            let amount = (level - prev).saturating_mul(carriers.len() as Chips);
            let mut eligible: Vec<SeatId> = carriers
                .iter()
                .filter(|(_, _, s)| *s != PlayerStatus::Folded)
                .map(|(sid, _, _)| *sid)
                .collect();
            eligible.sort_unstable();
            pots.push(Pot { amount, eligible });
            prev = level;
        }

        let main = pots.remove(0);
        Ok(Pots { main, sides: pots })
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{HandConfig, PlayerState, Pots, TableStakes};
    use super::super::state::BettingState;
    use super::super::types::{PlayerStatus, Street};
    use super::*;

    fn seat_with(seat: SeatId, total: Chips, status: PlayerStatus) -> PlayerState {
        let mut p = PlayerState::new(seat, 0);
        p.committed_total = total;
        p.status = status;
        p
    }

    fn bare_state(players: Vec<PlayerState>) -> BettingState {
        BettingState {
            street: Street::Preflop,
            button: 0,
            first_to_act: 0,
            to_act: 0,
            current_bet_to_match: 0,
            last_full_raise_amount: 1,
            last_aggressor: None,
            players,
            pots: Pots::default(),
            cfg: HandConfig {
                stakes: TableStakes { small_blind: 1, big_blind: 2 },
                num_seats: 3,
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
    fn three_way_all_in_side_pot() {
        // A=10 all-in, B=25 all-in, C=25 (called, 100 stack remains behind)
        let players = vec![
            seat_with(0, 10, PlayerStatus::AllIn),
            seat_with(1, 25, PlayerStatus::AllIn),
            seat_with(2, 25, PlayerStatus::Active),
        ];
        let state = bare_state(players);
        let pots = state.compute_pots().unwrap();
        assert_eq!(pots.main.amount, 30);
        assert_eq!(pots.main.eligible, vec![0, 1, 2]);
        assert_eq!(pots.sides.len(), 1);
        assert_eq!(pots.sides[0].amount, 30);
        assert_eq!(pots.sides[0].eligible, vec![1, 2]);
    }

    #[test]
    fn folded_contribution_counts_toward_main_pot_but_not_eligibility() {
        let players = vec![
            seat_with(0, 10, PlayerStatus::Folded),
            seat_with(1, 10, PlayerStatus::Active),
        ];
        let state = bare_state(players);
        let pots = state.compute_pots().unwrap();
        assert_eq!(pots.main.amount, 20);
        assert_eq!(pots.main.eligible, vec![1]);
    }
}
