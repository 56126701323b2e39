//! Hold'em table aggregate: owns seating, the current hand's
//! betting state, and the committed shuffle. A `Table` is the single-writer
//! region for one table id; callers are expected to hold it behind a
//! lock (see `commands::World`) so at most one command mutates it at a time.
//!
//! Every method that moves money takes `&Ledger` and performs exactly one
//! `adjust` per participant in the same call, following the same rule as
//! `ledger/mod.rs`: engines never touch balances except through the ledger.

pub mod config;
pub mod error;
pub mod hand;
pub mod seat;
pub mod view;

pub use config::{money_to_chips, chips_to_money, TableConfig, TableTimings};
pub use error::TableError;
pub use hand::{settle_pot, ActiveHand};
pub use seat::{Seat, SeatStatus};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::engine::nl::{
    BettingEngine, BettingEngineNL, HandConfig, LegalActions, PlayerAction, PlayerState,
    PlayerStatus, Pots, SeatId, Street, Transition,
};
use crate::events::{PrivateEvent, TableEvent};
use crate::ledger::{Ledger, Reference, TxnKind};
use crate::money::Money;
use crate::rake::poker_pot_rake;
use crate::shuffler::CommittedShuffle;
use crate::table::view::{CurrentTurn, LegalActionsView, PotView, PrivateTableView, PublicTableView};

pub const REASON_AUTO_START: &str = "table-auto-start";
pub const REASON_ACTION_TIMEOUT: &str = "table-action-timeout";
pub const REASON_NEXT_HAND: &str = "table-next-hand";

/// Side effects of a table command: events to publish, hole cards to
/// deliver privately, and scheduler deadlines to set or cancel. The caller
/// (`commands::World`) owns the event bus and the scheduler; `Table` only
/// describes what should happen: aggregates hold only opaque ids, never a
/// handle back into the scheduler.
#[derive(Default)]
pub struct TableEffects {
    pub events: Vec<TableEvent>,
    pub private: Vec<(AgentId, PrivateEvent)>,
    pub schedule: Vec<(&'static str, DateTime<Utc>)>,
    pub cancel: Vec<&'static str>,
}

impl TableEffects {
    fn new() -> Self {
        Self::default()
    }
}

pub struct Table {
    pub config: TableConfig,
    pub timings: TableTimings,
    seats: Vec<Option<Seat>>,
    hand: Option<ActiveHand>,
    dealer_button: Option<SeatId>,
}

impl Table {
    pub fn new(config: TableConfig, timings: TableTimings) -> Self {
        let max_seats = config.max_seats as usize;
        Table {
            config,
            timings,
            seats: vec![None; max_seats],
            hand: None,
            dealer_button: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn hand_in_progress(&self) -> bool {
        self.hand.is_some()
    }

    /// Total chips currently on this table, in its own currency: every
    /// seat's stack, plus whatever has left a stack this street but hasn't
    /// been folded into `pots` yet, plus the pots themselves: the
    /// `table_chips` term of the global money invariant.
    pub fn chips_in_play(&self, currency: crate::money::Currency) -> Money {
        if currency != self.config.currency {
            return Money::ZERO;
        }
        let seats_total: u64 = self.seats.iter().flatten().map(|s| s.chips).sum();
        let in_flight: u64 = self.hand.as_ref().map_or(0, |h| {
            h.betting.players.iter().map(|p| p.committed_this_round).sum::<u64>() + h.betting.pots.total()
        });
        chips_to_money(seats_total + in_flight)
    }

    fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.get(id as usize).and_then(|s| s.as_ref())
    }

    fn seat_mut(&mut self, id: SeatId) -> Option<&mut Seat> {
        self.seats.get_mut(id as usize).and_then(|s| s.as_mut())
    }

    fn seat_for_agent(&self, agent: &AgentId) -> Option<SeatId> {
        self.seats
            .iter()
            .flatten()
            .find(|s| &s.agent == agent)
            .map(|s| s.seat)
    }

    fn lowest_free_seat(&self) -> Option<SeatId> {
        self.seats.iter().position(|s| s.is_none()).map(|i| i as SeatId)
    }

    fn seats_with_chips(&self) -> Vec<SeatId> {
        self.seats.iter().flatten().filter(|s| s.chips > 0).map(|s| s.seat).collect()
    }

    // ---- seating ----

    pub fn seat_player(
        &mut self,
        ledger: &Ledger,
        agent: AgentId,
        display_name: String,
        buy_in: Money,
        now: DateTime<Utc>,
    ) -> Result<TableEffects, TableError> {
        if !self.config.buy_in_in_range(buy_in) {
            return Err(TableError::BuyInOutOfRange(buy_in.to_string()));
        }
        if self.seat_for_agent(&agent).is_some() {
            return Err(TableError::AlreadySeated);
        }
        let seat_id = self.lowest_free_seat().ok_or(TableError::NoFreeSeat)?;

        ledger.adjust(
            &agent,
            self.config.currency,
            -buy_in,
            TxnKind::SeatBuyIn,
            Reference::Table { table_id: self.config.id.clone(), hand_id: None },
            None,
        )?;

        self.seats[seat_id as usize] =
            Some(Seat::new(seat_id, agent.clone(), display_name, money_to_chips(buy_in)));

        let mut effects = TableEffects::new();
        effects.events.push(TableEvent::SeatJoined { table_id: self.config.id.clone(), seat: seat_id, agent });

        if self.hand.is_none() && self.seats_with_chips().len() >= 2 {
            effects.schedule.push((REASON_AUTO_START, now + self.timings.auto_start_delay));
        }
        Ok(effects)
    }

    pub fn leave(&mut self, ledger: &Ledger, agent: &AgentId, now: DateTime<Utc>) -> Result<TableEffects, TableError> {
        let seat_id = self.seat_for_agent(agent).ok_or(TableError::NotSeated)?;
        let seat = self.seat(seat_id).expect("seat_for_agent found it");
        if self.hand.is_some() && seat.status == SeatStatus::Active {
            return Err(TableError::SeatActiveInHand);
        }

        let refund = chips_to_money(seat.chips);
        ledger.adjust(
            agent,
            self.config.currency,
            refund,
            TxnKind::SeatCashout,
            Reference::Table { table_id: self.config.id.clone(), hand_id: None },
            None,
        )?;

        self.seats[seat_id as usize] = None;
        let mut effects = TableEffects::new();
        effects.events.push(TableEvent::SeatLeft { table_id: self.config.id.clone(), seat: seat_id });
        if self.hand.is_none() && self.seats_with_chips().len() < 2 {
            effects.cancel.push(REASON_AUTO_START);
        }
        let _ = now;
        Ok(effects)
    }

    // ---- hand lifecycle ----

    pub fn start_hand(&mut self, now: DateTime<Utc>) -> Result<TableEffects, TableError> {
        if self.hand.is_some() {
            return Err(TableError::HandAlreadyInProgress);
        }
        let mut eligible = self.seats_with_chips();
        if eligible.len() < 2 {
            return Err(TableError::NotEnoughPlayers);
        }
        eligible.sort_unstable();

        let button = self.next_dealer_button(&eligible);
        for &sid in &eligible {
            self.seat_mut(sid).expect("eligible seat exists").reset_for_new_hand();
        }

        let (sb_seat, bb_seat) = if eligible.len() == 2 {
            let other = *eligible.iter().find(|&&s| s != button).unwrap();
            (button, other)
        } else {
            let sb = next_active_seat(button, &eligible);
            let bb = next_active_seat(sb, &eligible);
            (sb, bb)
        };
        let deal_order = rotate_to_start(&eligible, sb_seat);

        let shuffle = CommittedShuffle::new();
        let (hole_cards, next_card_index) = ActiveHand::deal_hole_cards(&shuffle, &deal_order);
        for &sid in &eligible {
            if let Some(cards) = hole_cards.get(&sid) {
                self.seat_mut(sid).unwrap().hole_cards = Some(*cards);
            }
        }

        let mut players: Vec<PlayerState> = eligible
            .iter()
            .map(|&sid| PlayerState::new(sid, self.seat(sid).unwrap().chips))
            .collect();
        for p in players.iter_mut() {
            if p.seat == sb_seat {
                post_blind(p, self.config.stakes.small_blind);
            }
            if p.seat == bb_seat {
                post_blind(p, self.config.stakes.big_blind);
            }
        }

        let cfg = HandConfig {
            stakes: self.config.stakes.clone(),
            num_seats: self.config.max_seats,
            button,
            small_blind_seat: sb_seat,
            big_blind_seat: bb_seat,
        };
        let betting = BettingEngine::new_after_deal(cfg, players);
        let to_act = betting.to_act;

        let hand_id = Uuid::new_v4();
        let hand = ActiveHand {
            hand_id,
            shuffle_hash: shuffle.hash,
            shuffle: Some(shuffle),
            betting,
            hole_cards: hole_cards.clone(),
            community: Vec::new(),
            next_card_index,
        };
        let shuffle_hash_hex = hex::encode(hand.shuffle_hash.0);
        self.hand = Some(hand);
        self.dealer_button = Some(button);
        self.sync_seats_from_betting();

        let mut effects = TableEffects::new();
        effects.events.push(TableEvent::HandStarted {
            table_id: self.config.id.clone(),
            hand_id,
            button_seat: button,
            shuffle_hash: shuffle_hash_hex,
        });
        for &sid in &eligible {
            let agent = self.seat(sid).unwrap().agent.clone();
            let cards = hole_cards[&sid];
            effects.private.push((
                agent,
                PrivateEvent::HoleCards {
                    table_id: self.config.id.clone(),
                    hand_id,
                    cards: [cards[0].to_string(), cards[1].to_string()],
                },
            ));
        }
        effects.schedule.push((REASON_ACTION_TIMEOUT, now + self.timings.action_timeout));
        effects.cancel.push(REASON_AUTO_START);
        effects.cancel.push(REASON_NEXT_HAND);
        let _ = to_act;
        Ok(effects)
    }

    fn next_dealer_button(&self, eligible: &[SeatId]) -> SeatId {
        match self.dealer_button {
            None => *eligible.iter().min().expect("at least two eligible seats"),
            Some(prev) => next_active_seat(prev, eligible),
        }
    }

    // ---- acting ----

    pub fn act(
        &mut self,
        ledger: &Ledger,
        agent: &AgentId,
        action: PlayerAction,
        now: DateTime<Utc>,
    ) -> Result<TableEffects, TableError> {
        let seat_id = self.seat_for_agent(agent).ok_or(TableError::NotSeated)?;
        let hand = self.hand.as_ref().ok_or(TableError::NoHandInProgress)?;
        if hand.betting.to_act != seat_id {
            return Err(TableError::NotYourTurn);
        }
        self.apply_action_as_seat(ledger, seat_id, action, now)
    }

    /// Applies the deadline-mandated action for the acting seat: check if
    /// legal, otherwise fold.
    pub fn apply_action_timeout(&mut self, ledger: &Ledger, now: DateTime<Utc>) -> Result<TableEffects, TableError> {
        let hand = self.hand.as_ref().ok_or(TableError::NoHandInProgress)?;
        let seat_id = hand.betting.to_act;
        let legals = BettingEngine::legal_actions(&hand.betting, seat_id);
        let action = if legals.may_check { PlayerAction::Check } else { PlayerAction::Fold };
        self.apply_action_as_seat(ledger, seat_id, action, now)
    }

    fn apply_action_as_seat(
        &mut self,
        ledger: &Ledger,
        seat_id: SeatId,
        action: PlayerAction,
        now: DateTime<Utc>,
    ) -> Result<TableEffects, TableError> {
        let hand = self.hand.as_mut().ok_or(TableError::NoHandInProgress)?;
        let pots_before = hand.betting.pots.clone();
        let transition = BettingEngine::apply_action(&mut hand.betting, seat_id, action)?;
        self.sync_seats_from_betting();

        let mut effects = TableEffects::new();
        let (label, amount) = describe_transition(&transition);
        if let Some(seat) = self.seat_mut(seat_id) {
            seat.last_action = Some(label.clone());
        }
        let hand_id = self.hand.as_ref().unwrap().hand_id;
        effects.events.push(TableEvent::ActionTaken {
            table_id: self.config.id.clone(),
            hand_id,
            seat: seat_id,
            action: label,
            amount,
        });
        if self.hand.as_ref().unwrap().betting.pots != pots_before {
            self.push_pots_updated(&mut effects, hand_id);
        }

        match transition {
            Transition::Continued { next_to_act, .. } => {
                effects.schedule.push((REASON_ACTION_TIMEOUT, now + self.timings.action_timeout));
                let _ = next_to_act;
                Ok(effects)
            }
            Transition::StreetEnd { .. } => {
                self.advance_after_street_end(ledger, now, &mut effects)?;
                Ok(effects)
            }
            Transition::HandEnd { winner, pots, .. } => {
                self.settle_fold_win(ledger, winner, pots, now, &mut effects);
                Ok(effects)
            }
        }
    }

    fn push_pots_updated(&self, effects: &mut TableEffects, hand_id: Uuid) {
        let Some(hand) = self.hand.as_ref() else { return };
        effects.events.push(TableEvent::PotsUpdated {
            table_id: self.config.id.clone(),
            hand_id,
            main_pot: chips_to_money(hand.betting.pots.main.amount).to_string(),
            side_pots: hand.betting.pots.sides.iter().map(|p| chips_to_money(p.amount).to_string()).collect(),
        });
    }

    fn advance_after_street_end(
        &mut self,
        ledger: &Ledger,
        now: DateTime<Utc>,
        effects: &mut TableEffects,
    ) -> Result<(), TableError> {
        let hand = self.hand.as_mut().expect("street end implies a hand in progress");
        let next_street = BettingEngineNL::advance_street(&mut hand.betting)?;
        if next_street == Street::Showdown {
            self.settle_showdown(ledger, now, effects);
            return Ok(());
        }
        hand.deal_next_street();
        let hand_id = hand.hand_id;
        let community: Vec<String> = hand.community.iter().map(|c| c.to_string()).collect();
        let to_act = hand.betting.to_act;
        self.sync_seats_from_betting();

        effects.events.push(TableEvent::StreetDealt {
            table_id: self.config.id.clone(),
            hand_id,
            street: street_label(next_street).to_string(),
            community,
        });
        effects.schedule.push((REASON_ACTION_TIMEOUT, now + self.timings.action_timeout));
        let _ = to_act;
        Ok(())
    }

    /// Showdown settlement: every pot,
    /// earliest to latest, is awarded to its best hand(s) after rake.
    fn settle_showdown(&mut self, ledger: &Ledger, now: DateTime<Utc>, effects: &mut TableEffects) {
        let Some(hand) = self.hand.take() else { return };
        let hand_id = hand.hand_id;
        let saw_flop = hand.saw_flop();
        let num_dealt = hand.hole_cards.len() as u8;
        let blind_level = self.config.blind_level_label();

        let in_hand: std::collections::HashSet<SeatId> = hand.betting.seats_still_in().into_iter().collect();
        let ring = rotate_to_start(&full_ring(self.config.max_seats), hand.betting.first_to_act);
        let act_order: Vec<SeatId> = ring.into_iter().filter(|s| in_hand.contains(s)).collect();

        let mut payouts: HashMap<SeatId, Money> = HashMap::new();
        let mut total_rake = Money::ZERO;
        let mut total_pot = Money::ZERO;
        for pot in hand.betting.pots.all() {
            if pot.amount == 0 {
                continue;
            }
            let pot_money = chips_to_money(pot.amount);
            total_pot += pot_money;
            let rake = poker_pot_rake(pot_money, saw_flop, &blind_level, num_dealt, &self.config.rake_caps);
            let settlement = settle_pot(pot.amount, &pot.eligible, &hand.hole_cards, &hand.community, &act_order, rake);
            total_rake += settlement.rake;
            for (&seat, &share) in &settlement.shares {
                *payouts.entry(seat).or_insert(Money::ZERO) += share;
                effects.events.push(TableEvent::PotAwarded {
                    table_id: self.config.id.clone(),
                    hand_id,
                    seat,
                    amount: share.to_string(),
                });
            }
        }
        if total_rake > Money::ZERO {
            ledger.record_rake("poker", &hand_id.to_string(), total_rake, self.config.currency, total_pot);
        }

        for (&seat_id, &amount) in payouts.iter() {
            if let Some(seat) = self.seat_mut(seat_id) {
                seat.chips += money_to_chips(amount);
            }
        }

        effects.events.push(TableEvent::HandEnded {
            table_id: self.config.id.clone(),
            hand_id,
            shuffle_seed: hand.shuffle.as_ref().map(|s| hex::encode(s.seed.0)).unwrap_or_default(),
        });
        self.finish_hand(&hand, effects, now);
    }

    /// Fold-to-one settlement: if at any point during betting only one
    /// non-folded player remains, that player wins all pots unconditionally
    /// and rake is applied once.
    fn settle_fold_win(&mut self, ledger: &Ledger, winner: SeatId, pots: Pots, now: DateTime<Utc>, effects: &mut TableEffects) {
        let Some(hand) = self.hand.take() else { return };
        let hand_id = hand.hand_id;
        let saw_flop = hand.saw_flop();
        let num_dealt = hand.hole_cards.len() as u8;
        let blind_level = self.config.blind_level_label();

        let total = chips_to_money(pots.total());
        let rake = poker_pot_rake(total, saw_flop, &blind_level, num_dealt, &self.config.rake_caps);
        let payout = if total > rake { total - rake } else { Money::ZERO };
        let rake = if total > rake { rake } else { total };

        if let Some(seat) = self.seat_mut(winner) {
            seat.chips += money_to_chips(payout);
        }
        if rake > Money::ZERO {
            ledger.record_rake("poker", &hand_id.to_string(), rake, self.config.currency, total);
        }

        effects.events.push(TableEvent::PotAwarded {
            table_id: self.config.id.clone(),
            hand_id,
            seat: winner,
            amount: payout.to_string(),
        });
        effects.events.push(TableEvent::HandEnded {
            table_id: self.config.id.clone(),
            hand_id,
            shuffle_seed: hand.shuffle.as_ref().map(|s| hex::encode(s.seed.0)).unwrap_or_default(),
        });
        effects.cancel.push(REASON_ACTION_TIMEOUT);
        self.finish_hand(&hand, effects, now);
    }

    fn finish_hand(&mut self, hand: &ActiveHand, effects: &mut TableEffects, now: DateTime<Utc>) {
        for &seat_id in hand.hole_cards.keys() {
            if let Some(seat) = self.seat_mut(seat_id) {
                seat.clear_after_hand();
            }
        }
        self.hand = None;
        effects.cancel.push(REASON_ACTION_TIMEOUT);
        if self.seats_with_chips().len() >= 2 {
            effects.schedule.push((REASON_NEXT_HAND, now + self.timings.next_hand_delay));
        }
    }

    fn sync_seats_from_betting(&mut self) {
        let Some(hand) = self.hand.as_ref() else { return };
        let snapshot: Vec<(SeatId, u64, u64, u64, PlayerStatus)> = hand
            .betting
            .players
            .iter()
            .map(|p| (p.seat, p.stack, p.committed_this_round, p.total_contribution(), p.status))
            .collect();
        for (seat_id, stack, bet, total, status) in snapshot {
            if let Some(seat) = self.seat_mut(seat_id) {
                seat.chips = stack;
                seat.bet_this_street = bet;
                seat.total_this_hand = total;
                seat.status = match status {
                    PlayerStatus::Active => SeatStatus::Active,
                    PlayerStatus::Folded => SeatStatus::Folded,
                    PlayerStatus::AllIn => SeatStatus::AllIn,
                    PlayerStatus::SittingOut => SeatStatus::SittingOut,
                };
            }
        }
    }

    // ---- scheduler integration ----

    /// Dispatches a fired scheduler deadline into this aggregate's
    /// single-writer region, same as any externally-issued command.
    pub fn handle_deadline(&mut self, ledger: &Ledger, reason: &str, now: DateTime<Utc>) -> Result<TableEffects, TableError> {
        match reason {
            REASON_AUTO_START | REASON_NEXT_HAND => self.start_hand(now),
            REASON_ACTION_TIMEOUT => self.apply_action_timeout(ledger, now),
            other => {
                debug_assert!(false, "unknown table deadline reason: {other}");
                Ok(TableEffects::new())
            }
        }
    }

    // ---- projections ----

    pub fn observe(&self) -> PublicTableView {
        let hand = self.hand.as_ref();
        PublicTableView {
            table_id: self.config.id.clone(),
            name: self.config.name.clone(),
            small_blind: self.config.stakes.small_blind,
            big_blind: self.config.stakes.big_blind,
            max_seats: self.config.max_seats,
            currency: self.config.currency,
            seats: self.seats.iter().flatten().map(Into::into).collect(),
            dealer_seat: self.dealer_button,
            community: hand.map(|h| h.community.iter().map(|c| c.to_string()).collect()).unwrap_or_default(),
            main_pot: hand.map(|h| PotView {
                amount: chips_to_money(h.betting.pots.main.amount).to_string(),
                eligible: h.betting.pots.main.eligible.clone(),
            }),
            side_pots: hand
                .map(|h| {
                    h.betting
                        .pots
                        .sides
                        .iter()
                        .map(|p| PotView { amount: chips_to_money(p.amount).to_string(), eligible: p.eligible.clone() })
                        .collect()
                })
                .unwrap_or_default(),
            street: hand.map(|h| street_label(h.betting.street).to_string()),
            current_turn: None,
            current_bet: hand.map(|h| h.betting.current_bet_to_match),
            hand_id: hand.map(|h| h.hand_id),
            shuffle_hash: hand.map(|h| hex::encode(h.shuffle_hash.0)),
            hand_in_progress: hand.is_some(),
        }
    }

    /// Like `observe`, but also attaches `deadline` for the current turn.
    pub fn observe_with_deadline(&self, deadline: Option<DateTime<Utc>>) -> PublicTableView {
        let mut view = self.observe();
        if let (Some(hand), Some(deadline)) = (self.hand.as_ref(), deadline) {
            view.current_turn = Some(CurrentTurn { seat: hand.betting.to_act, deadline });
        }
        view
    }

    pub fn observe_as(&self, agent: &AgentId, deadline: Option<DateTime<Utc>>) -> PrivateTableView {
        let public = self.observe_with_deadline(deadline);
        let my_seat = self.seat_for_agent(agent);
        let my_hole_cards = my_seat
            .and_then(|sid| self.seat(sid))
            .and_then(|s| s.hole_cards)
            .map(|cards| [cards[0].to_string(), cards[1].to_string()]);
        let legal_actions = match (my_seat, self.hand.as_ref()) {
            (Some(sid), Some(hand)) if hand.betting.to_act == sid => {
                Some(to_legal_actions_view(BettingEngine::legal_actions(&hand.betting, sid)))
            }
            _ => None,
        };
        PrivateTableView { public, my_seat, my_hole_cards, legal_actions }
    }
}

fn post_blind(p: &mut PlayerState, amount: u64) {
    let posted = amount.min(p.stack);
    p.stack -= posted;
    p.committed_this_round = posted;
    if p.stack == 0 {
        p.status = PlayerStatus::AllIn;
    }
}

fn next_active_seat(from: SeatId, sorted: &[SeatId]) -> SeatId {
    sorted.iter().copied().find(|&s| s > from).unwrap_or(sorted[0])
}

fn rotate_to_start(sorted: &[SeatId], start: SeatId) -> Vec<SeatId> {
    let pos = sorted.iter().position(|&s| s == start).unwrap_or(0);
    let mut out = sorted[pos..].to_vec();
    out.extend_from_slice(&sorted[..pos]);
    out
}

fn full_ring(max_seats: SeatId) -> Vec<SeatId> {
    (0..max_seats).collect()
}

fn street_label(street: Street) -> &'static str {
    match street {
        Street::Preflop => "preflop",
        Street::Flop => "flop",
        Street::Turn => "turn",
        Street::River => "river",
        Street::Showdown => "showdown",
    }
}

fn describe_transition(transition: &Transition) -> (String, Option<String>) {
    use crate::engine::nl::NormalizedAction::*;
    let action = match transition {
        Transition::Continued { events, .. }
        | Transition::StreetEnd { events, .. }
        | Transition::HandEnd { events, .. } => events.iter().find_map(|e| match e {
            crate::engine::nl::GameEvent::ActionApplied { action, .. } => Some(action),
            _ => None,
        }),
    };
    match action {
        Some(Fold) => ("fold".to_string(), None),
        Some(Check) => ("check".to_string(), None),
        Some(Call { call_amount, .. }) => ("call".to_string(), Some(chips_to_money(*call_amount).to_string())),
        Some(Bet { to }) => ("bet".to_string(), Some(chips_to_money(*to).to_string())),
        Some(Raise { to, .. }) => ("raise".to_string(), Some(chips_to_money(*to).to_string())),
        Some(AllInAsCall { call_amount, .. }) => ("all_in".to_string(), Some(chips_to_money(*call_amount).to_string())),
        Some(AllInAsBet { to }) => ("all_in".to_string(), Some(chips_to_money(*to).to_string())),
        Some(AllInAsRaise { to, .. }) => ("all_in".to_string(), Some(chips_to_money(*to).to_string())),
        None => ("unknown".to_string(), None),
    }
}

fn to_legal_actions_view(legals: LegalActions) -> LegalActionsView {
    LegalActionsView {
        may_fold: legals.may_fold,
        may_check: legals.may_check,
        call_amount: legals.call_amount,
        raise_to_min: legals.raise_to_range.as_ref().map(|r| *r.start()),
        raise_to_max: legals.raise_to_range.as_ref().map(|r| *r.end()),
        may_all_in: legals.may_all_in,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentId;
    use crate::engine::nl::TableStakes;
    use crate::ledger::Ledger;
    use crate::money::Currency;
    use crate::rake::RakeCapTable;

    fn base_time() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn fresh_table() -> Table {
        let config = TableConfig {
            id: "t1".into(),
            name: "Test Table".into(),
            stakes: TableStakes { small_blind: 50, big_blind: 100 },
            min_buy_in: Money::from_cents(5_000),
            max_buy_in: Money::from_cents(20_000),
            max_seats: 6,
            currency: Currency::Primary,
            rake_caps: RakeCapTable::default(),
        };
        Table::new(config, TableTimings::default())
    }

    fn seated_ledger_with(agents: &[&str], stake_cents: i64) -> Ledger {
        let ledger = Ledger::new();
        for a in agents {
            let id = AgentId::from(*a);
            ledger.register_agent(&id);
            ledger
                .adjust(&id, Currency::Primary, Money::from_cents(stake_cents), TxnKind::Deposit, Reference::External("seed".into()), None)
                .unwrap();
        }
        ledger
    }

    #[test]
    fn two_players_seat_and_auto_start_schedules_hand() {
        let mut table = fresh_table();
        let ledger = seated_ledger_with(&["alice", "bob"], 100_00);
        let now = base_time();

        table.seat_player(&ledger, AgentId::from("alice"), "Alice".into(), Money::from_cents(10_000), now).unwrap();
        let effects = table
            .seat_player(&ledger, AgentId::from("bob"), "Bob".into(), Money::from_cents(10_000), now)
            .unwrap();
        assert!(effects.schedule.iter().any(|(r, _)| *r == REASON_AUTO_START));
    }

    #[test]
    fn heads_up_hand_start_posts_blinds_and_deals_cards() {
        let mut table = fresh_table();
        let ledger = seated_ledger_with(&["alice", "bob"], 100_00);
        let now = base_time();
        table.seat_player(&ledger, AgentId::from("alice"), "Alice".into(), Money::from_cents(10_000), now).unwrap();
        table.seat_player(&ledger, AgentId::from("bob"), "Bob".into(), Money::from_cents(10_000), now).unwrap();

        let effects = table.start_hand(now).unwrap();
        assert!(effects.events.iter().any(|e| matches!(e, TableEvent::HandStarted { .. })));
        assert_eq!(effects.private.len(), 2);

        let view = table.observe();
        assert!(view.hand_in_progress);
        // heads-up: dealer (seat 0) posts SB and acts first preflop.
        assert_eq!(view.current_bet, Some(100));
    }

    #[test]
    fn fold_to_one_ends_hand_and_schedules_next_hand() {
        let mut table = fresh_table();
        let ledger = seated_ledger_with(&["alice", "bob"], 100_00);
        let now = base_time();
        table.seat_player(&ledger, AgentId::from("alice"), "Alice".into(), Money::from_cents(10_000), now).unwrap();
        table.seat_player(&ledger, AgentId::from("bob"), "Bob".into(), Money::from_cents(10_000), now).unwrap();
        table.start_hand(now).unwrap();

        // seat 0 (alice) is button/SB and acts first heads-up preflop.
        let acting_seat = table.observe().current_turn;
        assert!(acting_seat.is_none()); // observe() without deadline doesn't populate current_turn

        let to_act_agent = {
            let view = table.observe_as(&AgentId::from("alice"), None);
            if view.legal_actions.is_some() { AgentId::from("alice") } else { AgentId::from("bob") }
        };
        let effects = table.act(&ledger, &to_act_agent, PlayerAction::Fold, now).unwrap();
        assert!(effects.events.iter().any(|e| matches!(e, TableEvent::HandEnded { .. })));
        assert!(effects.schedule.iter().any(|(r, _)| *r == REASON_NEXT_HAND));
        assert!(!table.hand_in_progress());
    }
}
