//! Game rules and the session aggregate. No I/O lives here.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod replies;
pub mod roles;
pub mod text;
pub mod votes;
pub mod word_pool;
