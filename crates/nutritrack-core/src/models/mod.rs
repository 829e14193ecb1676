//! Domain models for the NutriTrack engine.

mod food_intake;
mod patient;
mod scores;
mod session;

pub use food_intake::*;
pub use patient::*;
pub use scores::*;
pub use session::*;
