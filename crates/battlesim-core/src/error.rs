//! Error types for configuration loading, request validation and decoding.
//!
//! Errors are split the way they are detected:
//!
//! - [`ConfigError`]: the rule set itself is malformed or a name does not
//!   resolve against it (unknown type, weather, strategy, stage bounds).
//! - [`InputError`]: the combatants or request parameters are unusable
//!   (empty party, missing moves, unsupported aggregation).
//! - [`Error`]: umbrella type returned by the public API, which also carries
//!   JSON decoding failures.
//!
//! All of them are raised before a battle starts. Once a run begins it is a
//! closed state machine and cannot fail.

/// Classification used by callers that need to branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The configuration store rejected a value or name.
    Configuration,
    /// The request or a combatant definition is invalid.
    Validation,
    /// The input document could not be decoded.
    Decode,
}

impl ErrorKind {
    /// Returns a short lowercase label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Decode => "decode",
        }
    }
}

/// Errors raised while building or querying the configuration store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// More types were declared than the store supports.
    #[error("too many types ({count}, max {max})")]
    TooManyTypes {
        /// Number of types requested.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// A type name does not exist in the effectiveness table.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A weather name does not exist in the weather table.
    #[error("unknown weather '{0}'")]
    UnknownWeather(String),

    /// A strategy name does not match any predefined strategy.
    #[error("unknown {family} strategy '{name}'")]
    UnknownStrategy {
        /// `PvE` or `PvP`.
        family: &'static str,
        /// The rejected name.
        name: String,
    },

    /// A battle mode name is not recognised.
    #[error("unknown battle mode '{0}'")]
    UnknownBattleMode(String),

    /// An aggregation mode name is not recognised.
    #[error("unknown aggregation '{0}'")]
    UnknownAggregation(String),

    /// A branch policy name is not recognised.
    #[error("unknown branch policy '{0}'")]
    UnknownBranchPolicy(String),

    /// A stage value lies outside the configured bounds.
    #[error("invalid stage ({stage}, min {min}, max {max})")]
    InvalidStage {
        /// The rejected stage.
        stage: i32,
        /// Configured minimum stage.
        min: i32,
        /// Configured maximum stage.
        max: i32,
    },

    /// Minimum stage is greater than maximum stage.
    #[error("min_stage ({min}) > max_stage ({max})")]
    StageBoundsOrder {
        /// Requested minimum stage.
        min: i32,
        /// Requested maximum stage.
        max: i32,
    },

    /// Too many stages between the bounds.
    #[error("too many stages ({count}, max {max})")]
    TooManyStages {
        /// Number of stages requested.
        count: usize,
        /// Maximum supported.
        max: usize,
    },

    /// A stage multiplier table has the wrong number of entries.
    #[error("{table} multiplier table has {found} entries, expected {expected}")]
    StageTableLength {
        /// Which table (`attack` or `defense`).
        table: &'static str,
        /// Entries required by the stage bounds.
        expected: usize,
        /// Entries supplied.
        found: usize,
    },
}

/// Errors raised while validating combatants and requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The request contains no players.
    #[error("battle has no players")]
    NoPlayers,

    /// Every player is on the same team, so nobody can be attacked.
    #[error("battle needs at least two teams")]
    SingleTeam,

    /// A player has no parties.
    #[error("player {player} has no parties")]
    NoParties {
        /// Player index.
        player: usize,
    },

    /// A party has no members.
    #[error("player {player} party {party} is empty")]
    EmptyParty {
        /// Player index.
        player: usize,
        /// Party index.
        party: usize,
    },

    /// A party would exceed its fixed capacity.
    #[error("party is full ({capacity} members max)")]
    PartyFull {
        /// Party capacity.
        capacity: usize,
    },

    /// A combatant has no charged moves.
    #[error("combatant has no charged moves")]
    NoChargedMoves,

    /// A combatant stat is not strictly positive.
    #[error("combatant {stat} must be positive, got {value}")]
    NonPositiveStat {
        /// Stat name.
        stat: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A move has negative power.
    #[error("move power must not be negative, got {0}")]
    NegativePower(i32),

    /// A move's cast duration is not positive.
    #[error("move duration must be positive, got {0}ms")]
    NonPositiveDuration(i32),

    /// A move's timing is inconsistent.
    #[error("move damage window {damage_window}ms is outside its duration {duration}ms")]
    DamageWindowOutOfRange {
        /// Damage window offset.
        damage_window: i32,
        /// Move duration.
        duration: i32,
    },

    /// A player's clone multiplier is zero.
    #[error("player {player} clone multiplier must be at least 1")]
    ZeroCloneMultiplier {
        /// Player index.
        player: usize,
    },

    /// A PvP request does not name exactly two combatants.
    #[error("pvp battle needs exactly 2 combatants, got {0}")]
    DuelistCount(usize),

    /// The aggregation mode is not available for this battle mode.
    #[error("aggregation '{aggregation}' is not supported for {mode} battles")]
    UnsupportedAggregation {
        /// Aggregation mode name.
        aggregation: &'static str,
        /// Battle mode name.
        mode: &'static str,
    },

    /// Average aggregation requested with zero runs.
    #[error("numSims must be at least 1")]
    ZeroSimulations,

    /// The battle matrix has no combatants on either axis.
    #[error("battle matrix has no combatants")]
    EmptyMatrix,

    /// A time limit is not positive.
    #[error("time limit must be positive, got {0}ms")]
    NonPositiveTimeLimit(i32),
}

/// Top-level error returned by the public API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration store error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request validation error.
    #[error(transparent)]
    Input(#[from] InputError),

    /// JSON decoding error.
    #[error("failed to decode document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Input(_) => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        let config: Error = ConfigError::UnknownType("shadow".into()).into();
        assert_eq!(config.kind(), ErrorKind::Configuration);

        let input: Error = InputError::NoPlayers.into();
        assert_eq!(input.kind(), ErrorKind::Validation);

        let decode: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(decode.kind(), ErrorKind::Decode);
    }

    #[test]
    fn messages_carry_context() {
        let err = ConfigError::InvalidStage {
            stage: 5,
            min: -4,
            max: 4,
        };
        assert_eq!(err.to_string(), "invalid stage (5, min -4, max 4)");

        let err = InputError::EmptyParty { player: 1, party: 0 };
        assert_eq!(err.to_string(), "player 1 party 0 is empty");
    }
}
