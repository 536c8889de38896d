//! Role assignment.

use insider_core::error::DomainError;
use insider_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};

/// Smallest roster that can host a game: a Master, an Insider and at least
/// one plain Player.
pub const MIN_PLAYERS: usize = 3;

/// The hidden role a participant plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Knows the word and answers the group's questions.
    Master,
    /// Knows the word in secret and must avoid being voted out.
    Insider,
    /// Knows nothing and votes.
    Player,
}

/// Roles handed out for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The Master.
    pub master: String,
    /// The Insider.
    pub insider: String,
    /// Everyone else, in roster order.
    pub players: Vec<String>,
}

impl RoleAssignment {
    /// Every participant: the Players followed by the Master and the Insider.
    #[must_use]
    pub fn everyone(&self) -> Vec<String> {
        let mut everyone = self.players.clone();
        everyone.push(self.master.clone());
        everyone.push(self.insider.clone());
        everyone
    }

    /// The role `participant` plays, if they are part of the game.
    #[must_use]
    pub fn role_of(&self, participant: &str) -> Option<Role> {
        if self.master == participant {
            Some(Role::Master)
        } else if self.insider == participant {
            Some(Role::Insider)
        } else if self.players.iter().any(|p| p == participant) {
            Some(Role::Player)
        } else {
            None
        }
    }
}

/// Picks the Master uniformly from the roster, then the Insider uniformly
/// from who is left. The remainder become Players.
///
/// # Errors
///
/// Returns `DomainError::InsufficientPlayers` if the roster has fewer than
/// [`MIN_PLAYERS`] entries.
pub fn assign_roles(
    roster: &[String],
    rng: &mut dyn DeterministicRng,
) -> Result<RoleAssignment, DomainError> {
    let insufficient = || DomainError::InsufficientPlayers {
        required: MIN_PLAYERS,
        actual: roster.len(),
    };
    if roster.len() < MIN_PLAYERS {
        return Err(insufficient());
    }

    let mut remaining = roster.to_vec();
    let master = remaining.remove(rng.next_index(remaining.len()).ok_or_else(insufficient)?);
    let insider = remaining.remove(rng.next_index(remaining.len()).ok_or_else(insufficient)?);

    Ok(RoleAssignment {
        master,
        insider,
        players: remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insider_core::rng::SystemRng;
    use insider_test_support::SequenceRng;

    fn roster(size: usize) -> Vec<String> {
        (1..=size).map(|i| format!("P{i}")).collect()
    }

    #[test]
    fn test_assign_roles_uses_rng_over_full_then_remaining_roster() {
        let mut rng = SequenceRng::new(vec![2, 0]);

        let roles = assign_roles(&roster(5), &mut rng).unwrap();

        assert_eq!(roles.master, "P3");
        assert_eq!(roles.insider, "P1");
        assert_eq!(roles.players, vec!["P2", "P4", "P5"]);
    }

    #[test]
    fn test_assign_roles_always_yields_one_master_and_one_distinct_insider() {
        let mut rng = SystemRng::seeded(2026);
        for size in MIN_PLAYERS..=9 {
            let roster = roster(size);
            for _ in 0..200 {
                let roles = assign_roles(&roster, &mut rng).unwrap();

                assert_ne!(roles.master, roles.insider);
                assert!(roster.contains(&roles.master));
                assert!(roster.contains(&roles.insider));
                assert_eq!(roles.players.len(), size - 2);
                assert!(!roles.players.contains(&roles.master));
                assert!(!roles.players.contains(&roles.insider));

                let mut everyone = roles.everyone();
                everyone.sort();
                let mut expected = roster.clone();
                expected.sort();
                assert_eq!(everyone, expected);
            }
        }
    }

    #[test]
    fn test_assign_roles_with_two_players_returns_insufficient_players() {
        let mut rng = SystemRng::seeded(1);

        let result = assign_roles(&roster(2), &mut rng);

        match result {
            Err(DomainError::InsufficientPlayers { required, actual }) => {
                assert_eq!(required, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected InsufficientPlayers, got {other:?}"),
        }
    }

    #[test]
    fn test_role_of_reports_each_role() {
        let roles = RoleAssignment {
            master: "M".to_owned(),
            insider: "I".to_owned(),
            players: vec!["A".to_owned()],
        };

        assert_eq!(roles.role_of("M"), Some(Role::Master));
        assert_eq!(roles.role_of("I"), Some(Role::Insider));
        assert_eq!(roles.role_of("A"), Some(Role::Player));
        assert_eq!(roles.role_of("Z"), None);
    }
}
