//! Notices raised alongside applied actions.

use courtside_core::{PlayerId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the scorekeeper should be told about. Alerts never block the
/// action that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Alert {
    /// A player's foul counters now disqualify them.
    PlayerDisqualified {
        /// Team of the player.
        side: Side,
        /// The player.
        player_id: PlayerId,
        /// Jersey number, for display.
        jersey: u8,
    },
    /// A player reached the personal-foul limit.
    PlayerFouledOut {
        /// Team of the player.
        side: Side,
        /// The player.
        player_id: PlayerId,
        /// Jersey number, for display.
        jersey: u8,
    },
    /// A head coach is disqualified.
    CoachDisqualified {
        /// Team of the coach.
        side: Side,
    },
    /// A team just reached the foul bonus for the quarter.
    TeamInBonus {
        /// Team in the bonus.
        side: Side,
        /// Quarter the fouls were charged in.
        quarter: u8,
    },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::PlayerDisqualified { side, jersey, .. } => {
                write!(f, "#{jersey} ({side}) is disqualified")
            }
            Alert::PlayerFouledOut { side, jersey, .. } => {
                write!(f, "#{jersey} ({side}) has fouled out")
            }
            Alert::CoachDisqualified { side } => write!(f, "{side} coach is disqualified"),
            Alert::TeamInBonus { side, quarter } => {
                write!(f, "{side} is in the bonus in quarter {quarter}")
            }
        }
    }
}
