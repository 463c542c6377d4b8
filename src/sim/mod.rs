//! Deterministic progression simulation
//!
//! The push pipeline and its state. This module must stay pure and
//! deterministic:
//! - Seeded RNG only
//! - Time enters exclusively through `tick(dt)`
//! - No rendering, I/O or platform dependencies

pub mod engine;
pub mod state;

pub use engine::ProgressEngine;
pub use state::{ComboState, ProgressState, PushSample};
