//! Application services: the game slot, timers, dialogs and the session
//! actor that drives one game over a messaging gateway.

pub mod actor;
pub mod bot;
pub mod config;
pub mod dialogs;
pub mod engine;
pub mod slot;
pub mod timers;
