//! Console host for the Insider game engine.
//!
//! Reads chat lines from stdin, feeds mentions to the bot and prints
//! everything the bot says to stdout.

pub mod config;
pub mod console;
pub mod error;
