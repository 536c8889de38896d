//! Shared test doubles for the Insider chat game engine.

mod clock;
mod gateway;
mod rng;

pub use clock::{FixedClock, TokioClock};
pub use gateway::{ScriptedGateway, Sent};
pub use rng::{MockRng, SequenceRng};
