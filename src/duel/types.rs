use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelKind {
    Coinflip,
    Rps,
}

impl DuelKind {
    pub fn label(self) -> &'static str {
        match self {
            DuelKind::Coinflip => "coinflip",
            DuelKind::Rps => "rps",
        }
    }
}

/// Lifecycle of one duel game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelStatus {
    Open,
    Committing,
    Revealing,
    Completed,
    Cancelled,
    Expired,
    Forfeited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    /// True if `self` beats `other` under standard rock-paper-scissors rules.
    pub fn beats(self, other: RpsChoice) -> bool {
        use RpsChoice::*;
        matches!((self, other), (Rock, Scissors) | (Scissors, Paper) | (Paper, Rock))
    }

    pub fn wire(self) -> &'static str {
        match self {
            RpsChoice::Rock => "rock",
            RpsChoice::Paper => "paper",
            RpsChoice::Scissors => "scissors",
        }
    }
}

impl std::str::FromStr for RpsChoice {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(RpsChoice::Rock),
            "paper" => Ok(RpsChoice::Paper),
            "scissors" => Ok(RpsChoice::Scissors),
            _ => Err(()),
        }
    }
}

/// Deadlines the duel engine schedules through the scheduler: how
/// long an unaccepted duel stays open, and how long each RPS phase gets
/// before the non-responder is refunded or forfeited.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DuelTimings {
    #[serde(with = "duration_seconds")]
    pub open_window: Duration,
    #[serde(with = "duration_seconds")]
    pub commit_window: Duration,
    #[serde(with = "duration_seconds")]
    pub reveal_window: Duration,
}

impl Default for DuelTimings {
    /// A 5-minute open window, short commit/reveal clocks for RPS rounds.
    fn default() -> Self {
        DuelTimings {
            open_window: Duration::seconds(300),
            commit_window: Duration::seconds(30),
            reveal_window: Duration::seconds(30),
        }
    }
}

mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}

pub fn majority_threshold(rounds: u8) -> u8 {
    rounds.div_ceil(2)
}

pub fn valid_rps_round_count(rounds: u8) -> bool {
    matches!(rounds, 1 | 3 | 5)
}
