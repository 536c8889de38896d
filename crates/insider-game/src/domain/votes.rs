//! Vote tabulation.
//!
//! Votes are free text and counted verbatim: "alice", "Alice" and "<@alice>"
//! are three different suspects. There is no matching against the roster.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Outcome of counting the accusation votes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Votes per accused text.
    pub counts: BTreeMap<String, usize>,
    /// Everyone with the highest count.
    pub accused: BTreeSet<String>,
    /// More than one suspect shares the highest count. The engine does not
    /// break ties; the Master decides.
    pub tied: bool,
}

impl Tally {
    /// Highest number of votes any suspect received.
    #[must_use]
    pub fn top_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Total number of votes counted.
    #[must_use]
    pub fn total_votes(&self) -> usize {
        self.counts.values().sum()
    }

    /// Accused suspects joined for announcement, e.g. `"alice & bob"`.
    #[must_use]
    pub fn accused_list(&self) -> String {
        self.accused
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" & ")
    }
}

/// Counts raw votes and finds the plurality. The result does not depend on
/// the order the votes arrived in.
#[must_use]
pub fn tabulate<S: AsRef<str>>(votes: &[S]) -> Tally {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for vote in votes {
        *counts.entry(vote.as_ref().to_owned()).or_insert(0) += 1;
    }

    let top = counts.values().copied().max().unwrap_or(0);
    let accused: BTreeSet<String> = counts
        .iter()
        .filter(|&(_, &count)| count == top)
        .map(|(suspect, _)| suspect.clone())
        .collect();
    let tied = accused.len() > 1;

    Tally {
        counts,
        accused,
        tied,
    }
}
