//! Insider Core — shared abstractions for the chat game engine.
//!
//! This crate defines the traits and types the game context depends on:
//! time, randomness, domain events, and the messaging gateway contract.
//! It contains no chat-platform code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod gateway;
pub mod rng;
