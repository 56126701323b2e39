//! Commit-reveal duel engine shared by coinflip and RPS. A
//! `Duel` is the single-writer region for one game id, same contract as
//! `table::Table`: every method that moves money takes `&Ledger` and returns
//! a `DuelEffects` describing what to publish and what to (re)schedule.

pub mod error;
pub mod types;

pub use error::DuelError;
pub use types::{majority_threshold, valid_rps_round_count, DuelKind, DuelStatus, DuelTimings, RpsChoice};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::events::DuelEvent;
use crate::ledger::{Ledger, Reference, TxnKind};
use crate::money::{Currency, Money};
use crate::rake::{coinflip_rake, rps_rake};
use crate::shuffler::{coinflip_commitment, coinflip_result, creator_wins, sha256, Digest32, Seed};

pub const REASON_OPEN_EXPIRY: &str = "duel-open-expiry";
pub const REASON_COMMIT_TIMEOUT: &str = "duel-commit-timeout";
pub const REASON_REVEAL_TIMEOUT: &str = "duel-reveal-timeout";

#[derive(Default)]
pub struct DuelEffects {
    pub events: Vec<DuelEvent>,
    pub schedule: Vec<(&'static str, DateTime<Utc>)>,
    pub cancel: Vec<&'static str>,
}

impl DuelEffects {
    fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug)]
pub struct Duel {
    pub id: Uuid,
    pub kind: DuelKind,
    pub creator: AgentId,
    pub acceptor: Option<AgentId>,
    pub stake: Money,
    pub currency: Currency,
    pub rounds: u8,
    pub status: DuelStatus,
    pub round_index: u8,
    pub creator_score: u8,
    pub acceptor_score: u8,
    pub creator_commit: Option<Digest32>,
    pub acceptor_commit: Option<Digest32>,
    pub creator_reveal: Option<RpsChoice>,
    pub acceptor_reveal: Option<RpsChoice>,
    pub coinflip_secret: Option<Seed>,
    pub coinflip_hash: Option<Digest32>,
    pub winner: Option<AgentId>,
    pub payout: Option<Money>,
    pub rake: Option<Money>,
    pub created_at: DateTime<Utc>,
}

impl Duel {
    /// Whether `agent` can see this duel in `coinflip.history`/`rps.history`:
    /// either side of the game, at any status.
    pub fn involves(&self, agent: &AgentId) -> bool {
        &self.creator == agent || self.acceptor.as_ref() == Some(agent)
    }

    /// Stake currently held in this duel's escrow, in `currency`: one stake
    /// while only the creator has staked, two stakes through the
    /// commit/reveal phases, none once the game has concluded one way or
    /// another.
    pub fn escrow(&self, currency: Currency) -> Money {
        if currency != self.currency {
            return Money::ZERO;
        }
        match self.status {
            DuelStatus::Open => self.stake,
            DuelStatus::Committing | DuelStatus::Revealing => self.stake + self.stake,
            DuelStatus::Completed | DuelStatus::Cancelled | DuelStatus::Expired | DuelStatus::Forfeited => Money::ZERO,
        }
    }
}

impl Duel {
    /// `create`: validates stake and round count, escrows the
    /// creator's stake in one ledger adjust, and for coinflip immediately
    /// publishes the commitment hash.
    pub fn create(
        ledger: &Ledger,
        id: Uuid,
        kind: DuelKind,
        creator: AgentId,
        stake: Money,
        currency: Currency,
        rounds: Option<u8>,
        timings: &DuelTimings,
        now: DateTime<Utc>,
    ) -> Result<(Duel, DuelEffects), DuelError> {
        if !stake.is_positive() {
            return Err(DuelError::InvalidStake);
        }
        let rounds = match kind {
            DuelKind::Coinflip => 1,
            DuelKind::Rps => {
                let r = rounds.unwrap_or(1);
                if !valid_rps_round_count(r) {
                    return Err(DuelError::InvalidRoundCount);
                }
                r
            }
        };

        ledger.adjust(
            &creator,
            currency,
            -stake,
            TxnKind::DuelEscrowOut,
            Reference::Duel { duel_id: id },
            None,
        )?;

        let (coinflip_secret, coinflip_hash) = match kind {
            DuelKind::Coinflip => {
                let secret = Seed::random();
                let hash = coinflip_commitment(&secret);
                (Some(secret), Some(hash))
            }
            DuelKind::Rps => (None, None),
        };

        let duel = Duel {
            id,
            kind,
            creator: creator.clone(),
            acceptor: None,
            stake,
            currency,
            rounds,
            status: DuelStatus::Open,
            round_index: 1,
            creator_score: 0,
            acceptor_score: 0,
            creator_commit: None,
            acceptor_commit: None,
            creator_reveal: None,
            acceptor_reveal: None,
            coinflip_secret,
            coinflip_hash,
            winner: None,
            payout: None,
            rake: None,
            created_at: now,
        };

        let mut effects = DuelEffects::new();
        effects.events.push(DuelEvent::Opened { duel_id: id, kind: kind.label().to_string(), creator, stake: stake.to_string() });
        effects.schedule.push((REASON_OPEN_EXPIRY, now + timings.open_window));
        Ok((duel, effects))
    }

    fn side_of(&self, agent: &AgentId) -> Option<Side> {
        if &self.creator == agent {
            Some(Side::Creator)
        } else if self.acceptor.as_ref() == Some(agent) {
            Some(Side::Acceptor)
        } else {
            None
        }
    }

    /// `accept`: fails on a non-open or self-accept; escrows the
    /// acceptor's stake; coinflip resolves immediately, RPS opens its first
    /// commit phase.
    pub fn accept(
        &mut self,
        ledger: &Ledger,
        acceptor: AgentId,
        timings: &DuelTimings,
        now: DateTime<Utc>,
    ) -> Result<DuelEffects, DuelError> {
        if self.status != DuelStatus::Open {
            return Err(DuelError::NotOpen);
        }
        if acceptor == self.creator {
            return Err(DuelError::SelfAccept);
        }

        ledger.adjust(
            &acceptor,
            self.currency,
            -self.stake,
            TxnKind::DuelEscrowOut,
            Reference::Duel { duel_id: self.id },
            None,
        )?;
        self.acceptor = Some(acceptor.clone());

        let mut effects = DuelEffects::new();
        effects.events.push(DuelEvent::Accepted { duel_id: self.id, acceptor });
        effects.cancel.push(REASON_OPEN_EXPIRY);

        match self.kind {
            DuelKind::Coinflip => self.resolve_coinflip(ledger, now, &mut effects)?,
            DuelKind::Rps => {
                self.status = DuelStatus::Committing;
                effects.schedule.push((REASON_COMMIT_TIMEOUT, now + timings.commit_window));
            }
        }
        Ok(effects)
    }

    fn resolve_coinflip(&mut self, ledger: &Ledger, _now: DateTime<Utc>, effects: &mut DuelEffects) -> Result<(), DuelError> {
        let secret = self.coinflip_secret.clone().expect("coinflip duel always carries a secret");
        let acceptor = self.acceptor.clone().expect("accept sets the acceptor before resolving");
        let result = coinflip_result(&secret, &self.creator.to_string(), &acceptor.to_string());
        let winner = if creator_wins(&result) { self.creator.clone() } else { acceptor };

        let pot = self.stake + self.stake;
        let rake = coinflip_rake(pot);
        let payout = pot - rake;

        ledger.adjust(&winner, self.currency, payout, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        ledger.record_rake("coinflip", &self.id.to_string(), rake, self.currency, pot);

        self.status = DuelStatus::Completed;
        self.winner = Some(winner.clone());
        self.payout = Some(payout);
        self.rake = Some(rake);
        effects.events.push(DuelEvent::Resolved { duel_id: self.id, winner: Some(winner), payout: payout.to_string(), rake: rake.to_string() });
        Ok(())
    }

    /// `rps.commit`: each side
    /// commits at most once per round; once both arrive, advance to reveal.
    pub fn commit(
        &mut self,
        agent: &AgentId,
        hash: Digest32,
        timings: &DuelTimings,
        now: DateTime<Utc>,
    ) -> Result<DuelEffects, DuelError> {
        if self.status != DuelStatus::Committing {
            return Err(DuelError::NotCommitting);
        }
        let side = self.side_of(agent).ok_or(DuelError::NotParticipant)?;
        match side {
            Side::Creator if self.creator_commit.is_some() => return Err(DuelError::AlreadyCommitted),
            Side::Acceptor if self.acceptor_commit.is_some() => return Err(DuelError::AlreadyCommitted),
            Side::Creator => self.creator_commit = Some(hash),
            Side::Acceptor => self.acceptor_commit = Some(hash),
        }

        let mut effects = DuelEffects::new();
        effects.events.push(DuelEvent::RoundCommitted { duel_id: self.id, round: self.round_index, agent: agent.clone() });

        if self.creator_commit.is_some() && self.acceptor_commit.is_some() {
            self.status = DuelStatus::Revealing;
            effects.cancel.push(REASON_COMMIT_TIMEOUT);
            effects.schedule.push((REASON_REVEAL_TIMEOUT, now + timings.reveal_window));
        }
        Ok(effects)
    }

    /// `reveal`: a hash mismatch is not a no-op
    /// failure. The revealing side forfeits immediately and the opponent is
    /// paid out, exactly as a timeout forfeit would. The command
    /// still reports success to the caller since the server correctly
    /// processed the reveal; the forfeit is visible in the returned events.
    pub fn reveal(
        &mut self,
        ledger: &Ledger,
        agent: &AgentId,
        choice: RpsChoice,
        nonce: &str,
        timings: &DuelTimings,
        now: DateTime<Utc>,
    ) -> Result<DuelEffects, DuelError> {
        if self.status != DuelStatus::Revealing {
            return Err(DuelError::NotRevealing);
        }
        let side = self.side_of(agent).ok_or(DuelError::NotParticipant)?;
        let (commit, reveal_slot) = match side {
            Side::Creator => (self.creator_commit, &mut self.creator_reveal),
            Side::Acceptor => (self.acceptor_commit, &mut self.acceptor_reveal),
        };
        if reveal_slot.is_some() {
            return Err(DuelError::AlreadyRevealed);
        }
        let stored = commit.expect("revealing implies both sides already committed");
        let computed = sha256(&[choice.wire().as_bytes(), b":", nonce.as_bytes()]);

        let mut effects = DuelEffects::new();
        if computed.0 != stored.0 {
            self.forfeit(ledger, agent.clone(), now, &mut effects)?;
            return Ok(effects);
        }

        *reveal_slot = Some(choice);
        effects.events.push(DuelEvent::RoundRevealed { duel_id: self.id, round: self.round_index, agent: agent.clone(), choice: choice.wire().to_string() });

        let (Some(creator_choice), Some(acceptor_choice)) = (self.creator_reveal, self.acceptor_reveal) else {
            return Ok(effects);
        };

        effects.cancel.push(REASON_REVEAL_TIMEOUT);
        if creator_choice == acceptor_choice {
            self.start_next_round(false, timings, now, &mut effects);
            return Ok(effects);
        }

        if creator_choice.beats(acceptor_choice) {
            self.creator_score += 1;
        } else {
            self.acceptor_score += 1;
        }

        let threshold = majority_threshold(self.rounds);
        if self.creator_score >= threshold || self.acceptor_score >= threshold {
            let winner = if self.creator_score >= threshold { self.creator.clone() } else { self.acceptor.clone().expect("acceptor set once accepted") };
            self.finish_rps(ledger, winner, &mut effects)?;
        } else {
            self.start_next_round(true, timings, now, &mut effects);
        }
        Ok(effects)
    }

    fn start_next_round(&mut self, advance: bool, timings: &DuelTimings, now: DateTime<Utc>, effects: &mut DuelEffects) {
        if advance {
            self.round_index += 1;
        }
        self.creator_commit = None;
        self.acceptor_commit = None;
        self.creator_reveal = None;
        self.acceptor_reveal = None;
        self.status = DuelStatus::Committing;
        effects.schedule.push((REASON_COMMIT_TIMEOUT, now + timings.commit_window));
    }

    fn finish_rps(&mut self, ledger: &Ledger, winner: AgentId, effects: &mut DuelEffects) -> Result<(), DuelError> {
        let pot = self.stake + self.stake;
        let rake = rps_rake(pot);
        let payout = pot - rake;
        ledger.adjust(&winner, self.currency, payout, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        ledger.record_rake("rps", &self.id.to_string(), rake, self.currency, pot);

        self.status = DuelStatus::Completed;
        self.winner = Some(winner.clone());
        self.payout = Some(payout);
        self.rake = Some(rake);
        effects.events.push(DuelEvent::Resolved { duel_id: self.id, winner: Some(winner), payout: payout.to_string(), rake: rake.to_string() });
        Ok(())
    }

    /// The opponent of `loser` wins the duel outright:
    /// used for a reveal hash mismatch and for commit/reveal timeouts where
    /// exactly one side acted.
    fn forfeit(&mut self, ledger: &Ledger, loser: AgentId, now: DateTime<Utc>, effects: &mut DuelEffects) -> Result<(), DuelError> {
        let _ = now;
        let winner = if loser == self.creator {
            self.acceptor.clone().expect("forfeit only happens after acceptance")
        } else {
            self.creator.clone()
        };

        let pot = self.stake + self.stake;
        let rake = match self.kind {
            DuelKind::Coinflip => coinflip_rake(pot),
            DuelKind::Rps => rps_rake(pot),
        };
        let payout = pot - rake;
        ledger.adjust(&winner, self.currency, payout, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        ledger.record_rake(self.kind.label(), &self.id.to_string(), rake, self.currency, pot);

        self.status = DuelStatus::Forfeited;
        self.winner = Some(winner.clone());
        self.payout = Some(payout);
        self.rake = Some(rake);
        effects.events.push(DuelEvent::Forfeited { duel_id: self.id, forfeiting_agent: loser });
        effects.events.push(DuelEvent::Resolved { duel_id: self.id, winner: Some(winner), payout: payout.to_string(), rake: rake.to_string() });
        Ok(())
    }

    /// `cancel`: creator-only, open-status-only, full refund.
    pub fn cancel(&mut self, ledger: &Ledger, agent: &AgentId) -> Result<DuelEffects, DuelError> {
        if agent != &self.creator {
            return Err(DuelError::NotCreator);
        }
        if self.status != DuelStatus::Open {
            return Err(DuelError::AlreadyConcluded);
        }
        ledger.adjust(&self.creator, self.currency, self.stake, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        self.status = DuelStatus::Cancelled;

        let mut effects = DuelEffects::new();
        effects.events.push(DuelEvent::Cancelled { duel_id: self.id });
        effects.cancel.push(REASON_OPEN_EXPIRY);
        Ok(effects)
    }

    /// Dispatches a fired scheduler deadline into this aggregate's
    /// single-writer region.
    pub fn handle_deadline(&mut self, ledger: &Ledger, reason: &str, now: DateTime<Utc>) -> Result<DuelEffects, DuelError> {
        let mut effects = DuelEffects::new();
        match reason {
            REASON_OPEN_EXPIRY if self.status == DuelStatus::Open => {
                ledger.adjust(&self.creator, self.currency, self.stake, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
                self.status = DuelStatus::Expired;
                effects.events.push(DuelEvent::Expired { duel_id: self.id });
            }
            REASON_COMMIT_TIMEOUT if self.status == DuelStatus::Committing => {
                self.resolve_commit_timeout(ledger, now, &mut effects)?;
            }
            REASON_REVEAL_TIMEOUT if self.status == DuelStatus::Revealing => {
                self.resolve_reveal_timeout(ledger, now, &mut effects)?;
            }
            _ => {}
        }
        Ok(effects)
    }

    fn resolve_commit_timeout(&mut self, ledger: &Ledger, now: DateTime<Utc>, effects: &mut DuelEffects) -> Result<(), DuelError> {
        match (self.creator_commit, self.acceptor_commit) {
            (None, None) => self.refund_both_as_expired(ledger, effects)?,
            (Some(_), None) => self.forfeit(ledger, self.acceptor.clone().expect("committing implies accepted"), now, effects)?,
            (None, Some(_)) => self.forfeit(ledger, self.creator.clone(), now, effects)?,
            (Some(_), Some(_)) => {}
        }
        Ok(())
    }

    fn resolve_reveal_timeout(&mut self, ledger: &Ledger, now: DateTime<Utc>, effects: &mut DuelEffects) -> Result<(), DuelError> {
        match (self.creator_reveal, self.acceptor_reveal) {
            (None, None) => self.refund_both_as_expired(ledger, effects)?,
            (Some(_), None) => self.forfeit(ledger, self.acceptor.clone().expect("revealing implies accepted"), now, effects)?,
            (None, Some(_)) => self.forfeit(ledger, self.creator.clone(), now, effects)?,
            (Some(_), Some(_)) => {}
        }
        Ok(())
    }

    fn refund_both_as_expired(&mut self, ledger: &Ledger, effects: &mut DuelEffects) -> Result<(), DuelError> {
        let acceptor = self.acceptor.clone().expect("commit/reveal phases only happen after acceptance");
        ledger.adjust(&self.creator, self.currency, self.stake, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        ledger.adjust(&acceptor, self.currency, self.stake, TxnKind::DuelEscrowIn, Reference::Duel { duel_id: self.id }, None)?;
        self.status = DuelStatus::Expired;
        effects.events.push(DuelEvent::Expired { duel_id: self.id });
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Creator,
    Acceptor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    fn base_time() -> DateTime<Utc> {
        "2026-01-01T00:00:00Z".parse().unwrap()
    }

    fn ledger_with(agents: &[&str], cents: i64) -> Ledger {
        let ledger = Ledger::new();
        for a in agents {
            let id = AgentId::from(*a);
            ledger.register_agent(&id);
            ledger.adjust(&id, Currency::Primary, Money::from_cents(cents), TxnKind::Deposit, Reference::External("seed".into()), None).unwrap();
        }
        ledger
    }

    #[test]
    fn coinflip_provable_fairness() {
        let ledger = ledger_with(&["W1", "W2"], 10_00);
        let timings = DuelTimings::default();
        let now = base_time();
        let id = Uuid::new_v4();

        let (mut duel, _) = Duel::create(&ledger, id, DuelKind::Coinflip, AgentId::from("W1"), Money::from_cents(100), Currency::Primary, None, &timings, now).unwrap();
        duel.coinflip_secret = Some(Seed::from_bytes([0xAA; 32]));
        duel.coinflip_hash = Some(coinflip_commitment(duel.coinflip_secret.as_ref().unwrap()));

        let effects = duel.accept(&ledger, AgentId::from("W2"), &timings, now).unwrap();
        assert_eq!(duel.status, DuelStatus::Completed);
        assert_eq!(duel.rake, Some(Money::from_cents(8)));
        assert_eq!(duel.payout, Some(Money::from_cents(192)));
        assert!(effects.events.iter().any(|e| matches!(e, DuelEvent::Resolved { .. })));
    }

    #[test]
    fn duplicate_accept_on_completed_coinflip_is_rejected_unchanged() {
        let ledger = ledger_with(&["W1", "W2", "W3"], 10_00);
        let timings = DuelTimings::default();
        let now = base_time();
        let id = Uuid::new_v4();

        let (mut duel, _) = Duel::create(&ledger, id, DuelKind::Coinflip, AgentId::from("W1"), Money::from_cents(100), Currency::Primary, None, &timings, now).unwrap();
        duel.coinflip_secret = Some(Seed::from_bytes([0xAA; 32]));
        duel.coinflip_hash = Some(coinflip_commitment(duel.coinflip_secret.as_ref().unwrap()));
        duel.accept(&ledger, AgentId::from("W2"), &timings, now).unwrap();

        let status_before = duel.status;
        let winner_before = duel.winner.clone();
        let payout_before = duel.payout;
        let rake_before = duel.rake;

        let err = duel.accept(&ledger, AgentId::from("W3"), &timings, now).unwrap_err();
        assert!(matches!(err, DuelError::NotOpen));
        assert_eq!(duel.status, status_before);
        assert_eq!(duel.winner, winner_before);
        assert_eq!(duel.payout, payout_before);
        assert_eq!(duel.rake, rake_before);
        assert_eq!(duel.acceptor, Some(AgentId::from("W2")), "the late caller never becomes acceptor");
    }

    #[test]
    fn rps_forfeit_on_hash_mismatch() {
        let ledger = ledger_with(&["creator", "acceptor"], 10_00);
        let timings = DuelTimings::default();
        let now = base_time();
        let id = Uuid::new_v4();

        let (mut duel, _) = Duel::create(&ledger, id, DuelKind::Rps, AgentId::from("creator"), Money::from_cents(100), Currency::Primary, Some(3), &timings, now).unwrap();
        duel.accept(&ledger, AgentId::from("acceptor"), &timings, now).unwrap();

        let real_commit = sha256(&[b"rock", b":", b"N1"]);
        duel.commit(&AgentId::from("creator"), real_commit, &timings, now).unwrap();
        let acceptor_commit = sha256(&[b"scissors", b":", b"N2"]);
        duel.commit(&AgentId::from("acceptor"), acceptor_commit, &timings, now).unwrap();
        assert_eq!(duel.status, DuelStatus::Revealing);

        // creator claims to have committed "rock:N1" but reveals paper -- mismatch.
        let effects = duel.reveal(&ledger, &AgentId::from("creator"), RpsChoice::Paper, "N1", &timings, now).unwrap();
        assert_eq!(duel.status, DuelStatus::Forfeited);
        assert_eq!(duel.winner, Some(AgentId::from("acceptor")));
        assert_eq!(duel.rake, Some(Money::from_cents(10))); // 5% of 200
        assert_eq!(duel.payout, Some(Money::from_cents(190)));
        assert!(effects.events.iter().any(|e| matches!(e, DuelEvent::Forfeited { .. })));
    }

    #[test]
    fn rps_tie_round_replays_with_cleared_commitments() {
        let ledger = ledger_with(&["creator", "acceptor"], 10_00);
        let timings = DuelTimings::default();
        let now = base_time();
        let id = Uuid::new_v4();

        let (mut duel, _) = Duel::create(&ledger, id, DuelKind::Rps, AgentId::from("creator"), Money::from_cents(100), Currency::Primary, Some(1), &timings, now).unwrap();
        duel.accept(&ledger, AgentId::from("acceptor"), &timings, now).unwrap();

        let commit_c = sha256(&[b"rock", b":", b"NC"]);
        let commit_a = sha256(&[b"rock", b":", b"NA"]);
        duel.commit(&AgentId::from("creator"), commit_c, &timings, now).unwrap();
        duel.commit(&AgentId::from("acceptor"), commit_a, &timings, now).unwrap();

        duel.reveal(&ledger, &AgentId::from("creator"), RpsChoice::Rock, "NC", &timings, now).unwrap();
        let effects = duel.reveal(&ledger, &AgentId::from("acceptor"), RpsChoice::Rock, "NA", &timings, now).unwrap();

        assert_eq!(duel.status, DuelStatus::Committing);
        assert_eq!(duel.round_index, 1, "a tie replays the same round number");
        assert_eq!(duel.creator_score, 0);
        assert!(effects.schedule.iter().any(|(r, _)| *r == REASON_COMMIT_TIMEOUT));
    }

    #[test]
    fn open_duel_cancel_refunds_creator() {
        let ledger = ledger_with(&["creator"], 10_00);
        let timings = DuelTimings::default();
        let now = base_time();
        let id = Uuid::new_v4();

        let (mut duel, _) = Duel::create(&ledger, id, DuelKind::Coinflip, AgentId::from("creator"), Money::from_cents(500), Currency::Primary, None, &timings, now).unwrap();
        assert_eq!(ledger.balance(&AgentId::from("creator"), Currency::Primary), Money::from_cents(500));

        duel.cancel(&ledger, &AgentId::from("creator")).unwrap();
        assert_eq!(duel.status, DuelStatus::Cancelled);
        assert_eq!(ledger.balance(&AgentId::from("creator"), Currency::Primary), Money::from_cents(1000));
    }
}
