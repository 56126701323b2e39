use serde::{Deserialize, Serialize};

use super::types::Chips;

/// What a seat's owner sends in for their turn (the `act`
/// command). `BetTo`/`RaiseTo` are the same move under the hood — the
/// engine only cares whether the pot is open (`current_bet_to_match > 0`) —
/// kept as separate wire variants so a client can label its button "bet" vs
/// "raise" without the engine caring which one it sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    BetTo { to: Chips },
    RaiseTo { to: Chips },
    AllIn,
}
