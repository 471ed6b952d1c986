//! # Courtside Core
//!
//! Foundational types for the Courtside live basketball scoring engine.
//!
//! Every other crate in the workspace speaks in terms of these types:
//!
//! - Identifier newtypes ([`MatchId`], [`TeamId`], [`PlayerId`], [`ActionId`], [`DeviceId`])
//! - The two sides of a match ([`Side`])
//! - Millisecond-precision client timestamps ([`Timestamp`])
//! - A small error type for parsing and persistence failures
//!
//! ## Example
//!
//! ```rust
//! use courtside_core::{ActionId, Side, Timestamp};
//!
//! let id = ActionId::generate();
//! let parsed: ActionId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! assert_eq!(Side::Home.opponent(), Side::Away);
//! assert!(Timestamp::now().as_millis() > 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod side;
pub mod timestamp;

pub use error::{Error, Result};
pub use id::{ActionId, DeviceId, MatchId, PlayerId, TeamId};
pub use side::Side;
pub use timestamp::Timestamp;
