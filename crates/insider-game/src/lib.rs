//! Insider — the hidden-role word game played over chat.
//!
//! One Master knows the secret word and answers the group's questions, one
//! Insider secretly knows it too and steers the guessing. Once the word is
//! found everybody votes on who the Insider was, with as much time as the
//! guessing took.

pub mod application;
pub mod domain;
