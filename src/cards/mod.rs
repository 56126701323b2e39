//! 52-card model and best-of-5-from-7 Hold'em hand evaluator.

mod evaluator;

pub use evaluator::{evaluate_best_hand, EvaluatedHand};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type Rank = u8; // 2..=14, Ace high

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    fn wire_char(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    fn from_wire_char(c: char) -> Option<Self> {
        match c {
            'c' => Some(Suit::Clubs),
            'd' => Some(Suit::Diamonds),
            'h' => Some(Suit::Hearts),
            's' => Some(Suit::Spades),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed card string: {0}")]
pub struct CardParseError(String);

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        debug_assert!((2..=14).contains(&rank), "rank out of range: {rank}");
        Card { rank, suit }
    }

    fn rank_char(rank: Rank) -> char {
        match rank {
            2..=9 => (b'0' + rank) as char,
            10 => 'T',
            11 => 'J',
            12 => 'Q',
            13 => 'K',
            14 => 'A',
            _ => unreachable!("rank out of range: {rank}"),
        }
    }

    fn rank_from_char(c: char) -> Option<Rank> {
        match c {
            '2'..='9' => Some(c as u8 - b'0'),
            'T' | 't' => Some(10),
            'J' | 'j' => Some(11),
            'Q' | 'q' => Some(12),
            'K' | 'k' => Some(13),
            'A' | 'a' => Some(14),
            _ => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Card::rank_char(self.rank), self.suit.wire_char())
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Card({self})")
    }
}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(rank_c), Some(suit_c), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(CardParseError(s.to_string()));
        };
        let rank = Card::rank_from_char(rank_c).ok_or_else(|| CardParseError(s.to_string()))?;
        let suit = Suit::from_wire_char(suit_c).ok_or_else(|| CardParseError(s.to_string()))?;
        Ok(Card::new(rank, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Card::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// The canonical 52-card deck in a fixed, deterministic order: suits
/// Clubs, Diamonds, Hearts, Spades; within a suit, ranks 2..=14.
pub fn canonical_deck() -> [Card; 52] {
    let mut deck = [Card::new(2, Suit::Clubs); 52];
    let mut i = 0;
    for suit in [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades] {
        for rank in 2..=14 {
            deck[i] = Card::new(rank, suit);
            i += 1;
        }
    }
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn card_string_round_trips() {
        for s in ["Ah", "Td", "2c", "Ks", "9h"] {
            let card: Card = s.parse().unwrap();
            assert_eq!(card.to_string(), s);
        }
    }

    #[test]
    fn rejects_malformed_strings() {
        for s in ["", "A", "Ahh", "1h", "Ax"] {
            assert!(s.parse::<Card>().is_err(), "expected error for {s}");
        }
    }

    #[test]
    fn canonical_deck_has_52_unique_cards() {
        let deck = canonical_deck();
        let mut seen = std::collections::HashSet::new();
        for c in deck {
            assert!(seen.insert((c.rank, c.suit)));
        }
        assert_eq!(seen.len(), 52);
    }

    proptest! {
        /// Round-trip and idempotence: every card in the canonical
        /// deck parses back out of its own display string.
        #[test]
        fn any_canonical_card_round_trips(idx in 0usize..52) {
            let card = canonical_deck()[idx];
            let parsed: Card = card.to_string().parse().unwrap();
            prop_assert_eq!(parsed, card);
        }
    }
}
