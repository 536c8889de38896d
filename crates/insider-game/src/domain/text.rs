//! Everything the bot says.

use std::time::Duration;

use super::votes::Tally;

pub const WELCOME: &str = "Welcome to Insider";
pub const MASTER_PROMPT: &str = "If the participants guess the word please respond STOP in this thread. To cancel the game respond QUIT in this thread.";
pub const MASTER_STOP_ACK: &str = "Ok!";
pub const MASTER_QUIT_ACK: &str = "Terminating game.";
pub const GAME_ENDED: &str = "The game has ended";
pub const VOTES_REQUESTED: &str =
    "I have sent you all a direct message, please reply in that thread.";
pub const VOTE_PROMPT: &str = "Please vote for the insider here. Please only respond with the name of the insider, Spongebot is not smart enough to handle other inputs.";
pub const VOTE_RECORDED: &str = "Vote recorded. Thanks!";
pub const REVEAL_PROMPT: &str =
    "Times up! Game over. Do you want to know the identity of the insider? Yes or No.";
pub const NO_REVEAL: &str = "Ok. HoPe It WaS fUn!";
pub const REVEAL_FALLBACK: &str = "that wasn't yes or no! goodbye.";
pub const TIEBREAK: &str = "The master will cast the tiebreaking vote.";
pub const THANKS: &str = "Thanks for playing.";
pub const SOMETHING_WENT_WRONG: &str = "This is embarrassing, but something has gone wrong!";
pub const NEED_MORE_PLAYERS: &str = "We need more players";
pub const GAME_IN_PROGRESS: &str = "Error: Insider game in progress";
pub const NO_WORDS_LEFT: &str = "Error: there are no words left to play with";
pub const CHANNEL_GREETING: &str = "HeLlO! i'M sPoNgEbOt!";

/// Alternates case by character position: even positions lowercase, odd
/// positions uppercase. `"hello"` becomes `"hElLo"`.
#[must_use]
pub fn alternate_case(text: &str) -> String {
    text.chars()
        .enumerate()
        .flat_map(|(i, c)| {
            let mapped: Vec<char> = if i % 2 == 0 {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            mapped
        })
        .collect()
}

/// Platform mention markup for a user id.
#[must_use]
pub fn mention(user: &str) -> String {
    format!("<@{user}>")
}

/// "5 minutes", "1 minute", "90 seconds".
#[must_use]
pub fn describe_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let (amount, unit) = if seconds >= 60 && seconds % 60 == 0 {
        (seconds / 60, "minute")
    } else {
        (seconds, "second")
    };
    if amount == 1 {
        format!("{amount} {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

#[must_use]
pub fn master_is(master: &str) -> String {
    format!("The Master for this game is: {}", mention(master))
}

#[must_use]
pub fn game_starts(guess_duration: Duration) -> String {
    format!(
        "The Insider knows who they are... The game starts now! You have {}.",
        describe_duration(guess_duration)
    )
}

#[must_use]
pub fn insider_notice(word: &str) -> String {
    format!("Hello! You are the Insider for this game. The word is: {word}")
}

#[must_use]
pub fn master_notice(word: &str) -> String {
    format!("Hello! You are the Master for this game. The word is: {word}")
}

#[must_use]
pub fn time_warning(remaining: Duration) -> String {
    format!(
        "There are {} seconds remaining in the game.",
        remaining.as_secs()
    )
}

#[must_use]
pub fn guess_time_expired(word: &str) -> String {
    format!("Times up! Game over. The secret word for this game was: {word}")
}

#[must_use]
pub fn insider_was(insider: &str) -> String {
    format!("The Insider for this game was: {}", mention(insider))
}

#[must_use]
pub fn word_guessed(elapsed_seconds: u64) -> String {
    format!(
        "Congratulations. You correctly guessed the word in {elapsed_seconds} seconds. \
         You will have that much time to identify the insider."
    )
}

#[must_use]
pub fn reveal_insider(insider: &str) -> String {
    format!("Great! The insider for this game was {}!", mention(insider))
}

/// The result announcement after every vote came in.
#[must_use]
pub fn tally_result(tally: &Tally, insider: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);
    if tally.accused.is_empty() {
        lines.push("The votes have been tabulated! Nobody cast a vote.".to_owned());
    } else if tally.tied {
        lines.push(format!(
            "The votes have been tabulated! There is a tie. {} are accused of being the insider",
            tally.accused_list()
        ));
        lines.push(TIEBREAK.to_owned());
    } else {
        lines.push(format!(
            "The votes have been tabulated! {} has been identified as the Insider",
            tally.accused_list()
        ));
    }
    lines.push(format!(
        "In fact, the Insider for this game was: {}!",
        mention(insider)
    ));
    lines.push(THANKS.to_owned());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::votes::tabulate;

    #[test]
    fn test_alternate_case_of_hello() {
        assert_eq!(alternate_case("hello"), "hElLo");
    }

    #[test]
    fn test_alternate_case_counts_spaces_and_punctuation() {
        assert_eq!(alternate_case("HI there!"), "hI ThErE!");
    }

    #[test]
    fn test_alternate_case_of_reveal_fallback() {
        assert_eq!(
            alternate_case(REVEAL_FALLBACK),
            "tHaT WaSn't yEs oR No! GoOdByE."
        );
    }

    #[test]
    fn test_describe_duration_prefers_whole_minutes() {
        assert_eq!(describe_duration(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_duration(Duration::from_secs(1)), "1 second");
    }

    #[test]
    fn test_tally_result_for_clear_winner() {
        let lines = tally_result(&tabulate(&["<@P2>", "<@P2>", "<@P4>"]), "P2");

        assert_eq!(
            lines,
            vec![
                "The votes have been tabulated! <@P2> has been identified as the Insider",
                "In fact, the Insider for this game was: <@P2>!",
                "Thanks for playing.",
            ]
        );
    }

    #[test]
    fn test_tally_result_for_tie_defers_to_master() {
        let lines = tally_result(&tabulate(&["A", "B"]), "C");

        assert_eq!(
            lines[0],
            "The votes have been tabulated! There is a tie. A & B are accused of being the insider"
        );
        assert_eq!(lines[1], TIEBREAK);
    }
}
