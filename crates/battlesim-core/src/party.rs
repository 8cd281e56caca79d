//! Parties and players for multi-creature (raid/gym) battles.
//!
//! A [`Party`] stores up to [`MAX_PARTY_SIZE`] combatants inline. The active
//! member is an index into that storage ([`PartyState::head`]), never a
//! reference, so parties can be cloned freely between runs.

use arrayvec::ArrayVec;

use crate::entity::{Combatant, CombatantState};
use crate::error::InputError;
use crate::Time;

/// Maximum number of combatants in one party.
pub const MAX_PARTY_SIZE: usize = 6;

// =============================================================================
// Definitions
// =============================================================================

/// An ordered, fixed-capacity group of combatants fighting one after another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Party {
    members: ArrayVec<Combatant, MAX_PARTY_SIZE>,
    /// Revive the whole party once every member has fainted.
    pub revive: bool,
    /// Extra delay before this party enters after the previous one is
    /// exhausted.
    pub enter_delay: Time,
}

impl Party {
    /// Creates an empty party without revives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::PartyFull`] when the party already holds
    /// [`MAX_PARTY_SIZE`] members.
    pub fn try_push(&mut self, combatant: Combatant) -> Result<(), InputError> {
        self.members
            .try_push(combatant)
            .map_err(|_| InputError::PartyFull {
                capacity: MAX_PARTY_SIZE,
            })
    }

    /// Members in entry order.
    #[must_use]
    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the party has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl TryFrom<Vec<Combatant>> for Party {
    type Error = InputError;

    fn try_from(members: Vec<Combatant>) -> Result<Self, Self::Error> {
        let mut party = Self::new();
        for member in members {
            party.try_push(member)?;
        }
        Ok(party)
    }
}

/// One participant of a PvE battle.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Parties, used in order.
    pub parties: Vec<Party>,
    /// Team identifier. Team 0 attacks, every other team defends.
    pub team: u32,
    /// Multiplier on the attack stat of every member.
    pub attack_multiplier: f64,
    /// Multiplier on final damage, simulating identical copies of this
    /// player.
    pub clone_multiplier: u32,
}

impl Player {
    /// Creates a player with neutral multipliers.
    #[must_use]
    pub fn new(team: u32, parties: Vec<Party>) -> Self {
        Self {
            parties,
            team,
            attack_multiplier: 1.0,
            clone_multiplier: 1,
        }
    }

    /// Returns `true` if this player is on the attacking team.
    #[must_use]
    pub fn is_attacker(&self) -> bool {
        self.team == 0
    }

    /// Checks that the player can field at least one combatant and that every
    /// member is valid.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found.
    pub fn validate(&self, index: usize) -> Result<(), InputError> {
        if self.parties.is_empty() {
            return Err(InputError::NoParties { player: index });
        }
        if self.clone_multiplier == 0 {
            return Err(InputError::ZeroCloneMultiplier { player: index });
        }
        for (p, party) in self.parties.iter().enumerate() {
            if party.is_empty() {
                return Err(InputError::EmptyParty {
                    player: index,
                    party: p,
                });
            }
            party.members().iter().try_for_each(Combatant::validate)?;
        }
        Ok(())
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Runtime state of one party inside a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyState {
    /// Per-member state, parallel to [`Party::members`].
    pub members: ArrayVec<CombatantState, MAX_PARTY_SIZE>,
    /// Index of the active member.
    pub head: usize,
}

impl PartyState {
    /// Fresh state for every member of `party`.
    #[must_use]
    pub fn new(party: &Party, max_energy: i32) -> Self {
        Self {
            members: party
                .members()
                .iter()
                .map(|c| CombatantState::new(c, max_energy))
                .collect(),
            head: 0,
        }
    }

    /// The active member.
    #[must_use]
    pub fn head(&self) -> &CombatantState {
        &self.members[self.head]
    }

    /// The active member, mutably.
    pub fn head_mut(&mut self) -> &mut CombatantState {
        &mut self.members[self.head]
    }

    /// First living member after the head, if any.
    #[must_use]
    pub fn next_alive(&self) -> Option<usize> {
        (self.head + 1..self.members.len()).find(|&i| self.members[i].is_alive())
    }

    /// Returns `true` if any member is alive.
    #[must_use]
    pub fn any_alive(&self) -> bool {
        self.members.iter().any(CombatantState::is_alive)
    }

    /// Heals every member and resets the head to the first member.
    pub fn revive(&mut self) {
        for member in &mut self.members {
            member.heal();
        }
        self.head = 0;
    }
}
