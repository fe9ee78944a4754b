//! Port implementations.
//!
//! `live` talks to the real world, `recording` wraps a live adapter and
//! captures its interactions to a cassette, `replaying` serves a cassette
//! back, and `memory` holds in-process stand-ins for tests and dry runs.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;
