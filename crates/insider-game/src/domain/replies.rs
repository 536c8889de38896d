//! Recognizing answers to scripted prompts.
//!
//! Patterns match case-insensitively anywhere in the reply, first pattern
//! wins, which is how chat users actually answer ("STOP!", "ok stop").

/// What the Master answered to the stop/quit prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterReply {
    /// The group guessed the word.
    Stop,
    /// The Master cancels the game.
    Quit,
}

impl MasterReply {
    /// Recognizes a reply, or `None` if the prompt should be repeated.
    #[must_use]
    pub fn parse(reply: &str) -> Option<Self> {
        let reply = reply.to_lowercase();
        if reply.contains("stop") {
            Some(Self::Stop)
        } else if reply.contains("quit") {
            Some(Self::Quit)
        } else {
            None
        }
    }
}

/// Answer to "do you want to know who the Insider was?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealAnswer {
    /// Reveal the Insider.
    Yes,
    /// Keep it secret.
    No,
}

impl RevealAnswer {
    /// Recognizes a reply, or `None` if it was neither yes nor no.
    #[must_use]
    pub fn parse(reply: &str) -> Option<Self> {
        let reply = reply.to_lowercase();
        if reply.contains("yes") {
            Some(Self::Yes)
        } else if reply.contains("no") {
            Some(Self::No)
        } else {
            None
        }
    }
}
