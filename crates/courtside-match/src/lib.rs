//! # Courtside Match
//!
//! The match state machine: two team sheets, the lifecycle
//! (`scheduled -> in_progress -> finished`, with `in_progress <-> suspended`),
//! quarter changes and every scoring request a scorekeeper can make.
//!
//! [`MatchEngine`] owns a [`Match`], its [`Ledger`](courtside_ledger::Ledger)
//! and the counters derived from it. Requests carry an
//! [`ActionIntent`](courtside_rules::ActionIntent); an undo annuls the most
//! recent matching ledger entry and retracts its effect.
//!
//! ## Example
//!
//! ```rust
//! use courtside_core::{MatchId, PlayerId, Side, TeamId};
//! use courtside_match::{Match, MatchEngine, RosterEntry, TeamSheet};
//! use courtside_rules::{ActionIntent, PointValue};
//!
//! let mut engine = MatchEngine::new(Match::new(
//!     MatchId::generate(),
//!     TeamSheet::new(TeamId::generate(), "Lions"),
//!     TeamSheet::new(TeamId::generate(), "Tigers"),
//! ));
//!
//! let mut shooter = None;
//! for side in Side::BOTH {
//!     let roster: Vec<RosterEntry> = (4..9)
//!         .map(|n| RosterEntry::new(PlayerId::generate(), format!("#{n}"), n))
//!         .collect();
//!     let ids: Vec<PlayerId> = roster.iter().map(|r| r.player_id).collect();
//!     engine.call_up(side, roster).unwrap();
//!     engine.select_starters(side, &ids).unwrap();
//!     shooter.get_or_insert(ids[0]);
//! }
//!
//! engine.start().unwrap();
//! let shooter = shooter.unwrap();
//! engine.record_point(Side::Home, &shooter, PointValue::Three, ActionIntent::Do).unwrap();
//! assert_eq!(engine.score(Side::Home), 3);
//!
//! engine.record_point(Side::Home, &shooter, PointValue::Three, ActionIntent::Undo).unwrap();
//! assert_eq!(engine.score(Side::Home), 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod alert;
mod engine;
mod error;
mod game;
mod record;
mod roster;
mod state;

pub use alert::Alert;
pub use engine::{Applied, MatchEngine};
pub use error::MatchError;
pub use game::Match;
pub use record::{MatchPatch, MatchRecord};
pub use roster::{PlayerLine, RosterEntry, TeamSheet, MAX_CALL_UP, MAX_JERSEY, ON_COURT};
pub use state::MatchState;

/// Result type for match operations.
pub type Result<T> = std::result::Result<T, MatchError>;
