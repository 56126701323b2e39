//! Committed shuffler: a hash of the shuffle seed is published
//! before any card is dealt, the seed is retained and later revealed so any
//! observer can reproduce the shuffle and check the commitment. The server
//! itself is the trusted shuffler here: a seed is drawn with a cryptographic
//! RNG, a deterministic PRNG is derived from that seed, and the commitment
//! is published before use.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cards::{canonical_deck, Card};

pub const SEED_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed(#[serde(with = "hex_bytes")] pub [u8; SEED_LEN]);

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seed({})", hex::encode(self.0))
    }
}

impl Seed {
    pub fn random() -> Self {
        let mut bytes = [0u8; SEED_LEN];
        rand::thread_rng().fill(&mut bytes);
        Seed(bytes)
    }

    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Seed(bytes)
    }
}

mod hex_bytes {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let vec = hex::decode(&s).map_err(serde::de::Error::custom)?;
        vec.try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// A 32-byte SHA-256 digest, hex-encoded over the wire.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest32(#[serde(with = "hex_bytes")] pub [u8; 32]);

impl std::fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

pub fn sha256(parts: &[&[u8]]) -> Digest32 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Digest32(hasher.finalize().into())
}

/// Deterministic Fisher-Yates over the canonical deck, seeded from `seed`.
/// Two calls with the same seed always produce the same ordering,
/// independent of wall-clock or thread scheduling.
pub fn shuffle_deck(seed: &Seed) -> [Card; 52] {
    let mut rng = StdRng::from_seed(seed.0);
    let mut deck = canonical_deck();
    for i in (1..deck.len()).rev() {
        let j = rng.gen_range(0..=i);
        deck.swap(i, j);
    }
    deck
}

/// A committed shuffle: the hash is public from the moment the hand begins;
/// the seed is retained so the deal can be reproduced and verified once the
/// hand completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommittedShuffle {
    pub hash: Digest32,
    pub seed: Seed,
    pub deck: [Card; 52],
}

impl CommittedShuffle {
    pub fn new() -> Self {
        let seed = Seed::random();
        Self::from_seed(seed)
    }

    pub fn from_seed(seed: Seed) -> Self {
        let hash = sha256(&[&seed.0]);
        let deck = shuffle_deck(&seed);
        CommittedShuffle { hash, seed, deck }
    }

    /// Recomputes SHA-256(seed) and checks it against the published hash.
    pub fn verify(&self) -> bool {
        sha256(&[&self.seed.0]).0 == self.hash.0
    }
}

impl Default for CommittedShuffle {
    fn default() -> Self {
        Self::new()
    }
}

/// Coinflip fairness: the creator commits to a
/// secret before acceptance; on acceptance the result hash mixes in both
/// wallet ids so neither party could have biased it alone.
pub fn coinflip_commitment(secret: &Seed) -> Digest32 {
    sha256(&[&secret.0])
}

pub fn coinflip_result(secret: &Seed, creator_wallet: &str, acceptor_wallet: &str) -> Digest32 {
    sha256(&[&secret.0, creator_wallet.as_bytes(), acceptor_wallet.as_bytes()])
}

/// Creator wins iff byte[0] of the result hash is even.
pub fn creator_wins(result: &Digest32) -> bool {
    result.0[0] % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_deterministic_given_same_seed() {
        let seed = Seed::random();
        assert_eq!(shuffle_deck(&seed), shuffle_deck(&seed));
    }

    #[test]
    fn different_seeds_almost_always_differ() {
        let a = shuffle_deck(&Seed::random());
        let b = shuffle_deck(&Seed::random());
        assert_ne!(a, b);
    }

    #[test]
    fn committed_shuffle_verifies_hash_of_seed() {
        let committed = CommittedShuffle::new();
        assert!(committed.verify());
    }

    #[test]
    fn coinflip_provable_fairness() {
        let secret = Seed::from_bytes([0xAA; 32]);
        let hash = coinflip_commitment(&secret);
        assert_eq!(hash.0, sha256(&[&secret.0]).0);

        let result = coinflip_result(&secret, "W1", "W2");
        // S5 describes the mechanics; the actual parity depends on SHA-256
        // output bytes, so we only assert the function is well-defined and
        // deterministic, not a specific winner.
        let again = coinflip_result(&secret, "W1", "W2");
        assert_eq!(result.0, again.0);
        let _ = creator_wins(&result);
    }
}
