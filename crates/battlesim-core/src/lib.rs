//! # Battlesim Core
//!
//! Deterministic timed-combat simulation between creatures with types, stats,
//! energy and moves.
//!
//! This crate provides the event-driven battle engine for raid/gym battles
//! (players with parties against defending bosses) and one-on-one PvP duels,
//! plus the aggregation layer that turns single runs into averages, shield
//! decision trees and battle matrices.
//!
//! ## Architecture
//!
//! - **Configuration**: [`config::GameMaster`], the read-only rule set (type
//!   chart, weather boosts, stat stages, timing constants)
//! - **Model**: [`entity`] moves and combatants, [`party`] parties and players
//! - **Decisions**: [`strategy`] pure functions from a state snapshot to an
//!   [`action::Action`]
//! - **Scheduler**: [`battle`] event queues that advance simulated time
//! - **Aggregation**: [`aggregate`] single, averaged and branching runs
//! - **Encoding**: [`request`] decoding and [`report`] encoding
//!
//! ## Usage
//!
//! ```rust
//! use battlesim_core::config::GameMaster;
//! use battlesim_core::request::Request;
//!
//! let gm = GameMaster::standard();
//! let request = Request::from_json(&gm, r#"{
//!     "battleMode": "raid",
//!     "timelimit": 30000,
//!     "players": [
//!         { "team": 0, "parties": [{ "pokemon": [{
//!             "pokeType1": "fire", "attack": 200, "defense": 150, "maxHP": 150,
//!             "fmove": { "pokeType": "fire", "power": 10, "energy": 8, "duration": 1000, "dws": 500 },
//!             "cmoves": [{ "pokeType": "fire", "power": 90, "energy": -50, "duration": 3000, "dws": 2500 }]
//!         }] }] },
//!         { "team": 1, "parties": [{ "pokemon": [{
//!             "pokeType1": "grass", "attack": 180, "defense": 180, "maxHP": 5000,
//!             "strategy": "DEFENDER",
//!             "fmove": { "pokeType": "grass", "power": 10, "energy": 8, "duration": 1000, "dws": 500 },
//!             "cmoves": [{ "pokeType": "grass", "power": 90, "energy": -50, "duration": 3000, "dws": 2500 }]
//!         }] }] }
//!     ]
//! }"#)?;
//! let report = request.run(&gm)?;
//! println!("{}", report.to_json(true)?);
//! # Ok::<(), battlesim_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod aggregate;
pub mod battle;
pub mod config;
pub mod damage;
pub mod entity;
pub mod error;
pub mod party;
pub mod report;
pub mod request;
pub mod strategy;
pub mod timeline;

pub use error::{Error, ErrorKind, Result};

/// Simulated time in milliseconds.
pub type Time = i32;

#[cfg(test)]
mod tests;
