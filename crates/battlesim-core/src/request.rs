//! Request decoding: JSON documents to validated battle inputs.
//!
//! A request names its `battleMode` and carries the fields of that mode.
//! Decoding happens in two steps: serde reads the raw document, then every
//! name (types, weather, strategies, aggregation) is resolved against a
//! [`GameMaster`]. After that the battle layer only sees indices and enums.
//!
//! # Example
//!
//! ```
//! use battlesim_core::config::GameMaster;
//! use battlesim_core::request::Request;
//!
//! let gm = GameMaster::standard();
//! let request = Request::from_json(&gm, r#"{
//!     "battleMode": "pvp",
//!     "numShields": 1,
//!     "pokemon": [
//!         { "pokeType1": "water", "attack": 120, "defense": 110, "maxHP": 130,
//!           "fmove": { "pokeType": "water", "power": 3, "energy": 3, "duration": 500 },
//!           "cmoves": [{ "pokeType": "water", "power": 70, "energy": -40, "duration": 500 }] },
//!         { "pokeType1": "fire", "attack": 125, "defense": 100, "maxHP": 125,
//!           "fmove": { "pokeType": "fire", "power": 4, "energy": 4, "duration": 500 },
//!           "cmoves": [{ "pokeType": "fire", "power": 80, "energy": -45, "duration": 500 }] }
//!     ]
//! }"#).unwrap();
//!
//! let report = request.run(&gm).unwrap();
//! assert!(report.to_json(false).unwrap().contains("\"branches\""));
//! ```

use std::str::FromStr;

use serde::Deserialize;

use crate::aggregate::{self, Aggregation, BranchPolicy, MatrixShields};
use crate::battle::{DuelSettings, PveSettings, PVE_TIME_LIMIT, PVP_TIME_LIMIT};
use crate::config::GameMaster;
use crate::entity::{Combatant, Duelist, Move, MoveEffect};
use crate::error::{ConfigError, InputError, Result};
use crate::party::{Party, Player};
use crate::report::Report;
use crate::strategy::{PveStrategy, PvpStrategy};
use crate::Time;

// =============================================================================
// Decoded requests
// =============================================================================

/// Raid or gym battle.
#[derive(Debug, Clone, PartialEq)]
pub struct PveRequest {
    /// Participants; team 0 attacks.
    pub players: Vec<Player>,
    /// Environment.
    pub settings: PveSettings,
    /// Aggregation mode.
    pub aggregation: Aggregation,
    /// Runs for [`Aggregation::Average`].
    pub num_sims: u32,
    /// Seed of run 0.
    pub seed: u64,
}

/// One-on-one PvP duel.
#[derive(Debug, Clone, PartialEq)]
pub struct PvpRequest {
    /// The two sides.
    pub duelists: [Duelist; 2],
    /// Run options.
    pub settings: DuelSettings,
    /// Aggregation mode.
    pub aggregation: Aggregation,
    /// Runs for [`Aggregation::Average`].
    pub num_sims: u32,
    /// Fork combination for [`Aggregation::Branching`].
    pub policy: BranchPolicy,
    /// Seed of run 0.
    pub seed: u64,
}

/// Batch of branching duels.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRequest {
    /// Row duelists.
    pub rows: Vec<Duelist>,
    /// Column duelists.
    pub cols: Vec<Duelist>,
    /// Run options.
    pub settings: DuelSettings,
    /// Shield setting.
    pub shields: MatrixShields,
    /// Fork combination.
    pub policy: BranchPolicy,
    /// Seed of every cell.
    pub seed: u64,
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `pve`, `raid` or `gym`.
    Pve(PveRequest),
    /// `pvp`.
    Pvp(PvpRequest),
    /// `battlematrix`.
    Matrix(MatrixRequest),
}

impl Request {
    /// Decodes and resolves a request document.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed JSON, a configuration error for
    /// unknown names and an input error for unusable values.
    pub fn from_json(gm: &GameMaster, document: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(document)?;
        let mode = value
            .get("battleMode")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("pve")
            .to_ascii_lowercase();

        match mode.as_str() {
            "pve" | "raid" | "gym" => {
                let doc: PveDocument = serde_json::from_value(value)?;
                Ok(Self::Pve(doc.resolve(gm)?))
            }
            "pvp" => {
                let doc: PvpDocument = serde_json::from_value(value)?;
                Ok(Self::Pvp(doc.resolve(gm)?))
            }
            "battlematrix" => {
                let doc: MatrixDocument = serde_json::from_value(value)?;
                Ok(Self::Matrix(doc.resolve(gm)?))
            }
            _ => Err(ConfigError::UnknownBattleMode(mode).into()),
        }
    }

    /// Overrides the request seed.
    pub fn set_seed(&mut self, seed: u64) {
        match self {
            Self::Pve(r) => r.seed = seed,
            Self::Pvp(r) => r.seed = seed,
            Self::Matrix(r) => r.seed = seed,
        }
    }

    /// Mode name, for logs.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Pve(_) => "pve",
            Self::Pvp(_) => "pvp",
            Self::Matrix(_) => "battlematrix",
        }
    }

    /// Runs the request.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from the battle layer. Nothing fails once
    /// the runs have started.
    pub fn run(&self, gm: &GameMaster) -> Result<Report> {
        match self {
            Self::Pve(r) => aggregate::simulate_pve(
                gm,
                &r.players,
                r.settings,
                r.aggregation,
                r.num_sims,
                r.seed,
            )
            .map(Report::from_aggregate),
            Self::Pvp(r) => aggregate::simulate_duel(
                gm,
                &r.duelists,
                r.settings,
                r.aggregation,
                r.num_sims,
                r.policy,
                r.seed,
            )
            .map(Report::from_aggregate),
            Self::Matrix(r) => aggregate::battle_matrix(
                gm,
                &r.rows,
                &r.cols,
                r.settings,
                r.shields,
                r.policy,
                r.seed,
            )
            .map(|cells| Report::from_matrix(&cells)),
        }
    }
}

// =============================================================================
// Documents
// =============================================================================

fn one() -> u32 {
    1
}

fn one_f64() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveDocument {
    #[serde(alias = "type")]
    poke_type: String,
    #[serde(default)]
    power: i32,
    #[serde(default, alias = "energyDelta")]
    energy: i32,
    duration: Time,
    /// Missing damage windows land at the end of the cast.
    #[serde(default, alias = "damageWindow")]
    dws: Option<Time>,
    #[serde(default)]
    effect: Option<MoveEffect>,
}

impl MoveDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<Move, ConfigError> {
        let mv = Move::new(
            gm.type_index(&self.poke_type)?,
            self.power,
            self.energy,
            self.duration,
            self.dws.unwrap_or(self.duration),
        );
        Ok(match self.effect {
            Some(effect) => mv.with_effect(effect),
            None => mv,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CombatantDocument {
    #[serde(rename = "pokeType1")]
    poke_type1: String,
    #[serde(rename = "pokeType2", default)]
    poke_type2: Option<String>,
    attack: f64,
    defense: f64,
    #[serde(rename = "maxHP")]
    max_hp: i32,
    #[serde(default, alias = "startingEnergy")]
    energy: i32,
    fmove: MoveDocument,
    cmoves: Vec<MoveDocument>,
    #[serde(default)]
    immortal: bool,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default = "one")]
    copies: u32,
}

impl CombatantDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<Combatant> {
        let charged = self
            .cmoves
            .iter()
            .map(|m| m.resolve(gm))
            .collect::<Result<Vec<_>, _>>()?;
        if charged.is_empty() {
            return Err(InputError::NoChargedMoves.into());
        }
        let strategy = match &self.strategy {
            Some(name) => PveStrategy::from_str(name)?,
            None => PveStrategy::default(),
        };
        let combatant = Combatant {
            primary_type: gm.type_index(&self.poke_type1)?,
            secondary_type: match &self.poke_type2 {
                Some(name) => gm.optional_type_index(name)?,
                None => None,
            },
            attack: self.attack,
            defense: self.defense,
            max_hp: self.max_hp,
            starting_energy: self.energy,
            fast_move: self.fmove.resolve(gm)?,
            charged_moves: charged,
            immortal: self.immortal,
            strategy,
        };
        combatant.validate()?;
        Ok(combatant)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartyDocument {
    pokemon: Vec<CombatantDocument>,
    #[serde(default)]
    revive: bool,
    #[serde(default)]
    enter_delay: Time,
}

impl PartyDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<Party> {
        let mut party = Party::new();
        party.revive = self.revive;
        party.enter_delay = self.enter_delay;
        for doc in &self.pokemon {
            let combatant = doc.resolve(gm)?;
            // Copies beyond the party capacity fail with `PartyFull`.
            for _ in 0..doc.copies {
                party.try_push(combatant.clone())?;
            }
        }
        Ok(party)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerDocument {
    parties: Vec<PartyDocument>,
    #[serde(default)]
    team: u32,
    #[serde(default = "one_f64")]
    attack_multiplier: f64,
    #[serde(default = "one")]
    clone_multiplier: u32,
}

impl PlayerDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<Player> {
        let parties = self
            .parties
            .iter()
            .map(|p| p.resolve(gm))
            .collect::<Result<Vec<_>>>()?;
        let mut player = Player::new(self.team, parties);
        player.attack_multiplier = self.attack_multiplier;
        player.clone_multiplier = self.clone_multiplier;
        Ok(player)
    }
}

fn aggregation(name: Option<&str>, default: Aggregation) -> Result<Aggregation, ConfigError> {
    name.map_or(Ok(default), Aggregation::from_str)
}

fn branch_policy(name: Option<&str>) -> Result<BranchPolicy, ConfigError> {
    name.map_or(Ok(BranchPolicy::default()), BranchPolicy::from_str)
}

fn pvp_strategy(name: Option<&str>) -> Result<PvpStrategy, ConfigError> {
    name.map_or(Ok(PvpStrategy::default()), PvpStrategy::from_str)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PveDocument {
    players: Vec<PlayerDocument>,
    #[serde(default, rename = "timelimit", alias = "timeLimit")]
    time_limit: Option<Time>,
    #[serde(default)]
    weather: Option<String>,
    #[serde(default, rename = "backgroundDPS")]
    background_dps: f64,
    #[serde(default = "one")]
    num_sims: u32,
    #[serde(default)]
    enable_log: bool,
    #[serde(default)]
    aggregation: Option<String>,
    #[serde(default)]
    seed: u64,
}

impl PveDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<PveRequest> {
        let players = self
            .players
            .iter()
            .map(|p| p.resolve(gm))
            .collect::<Result<Vec<_>>>()?;
        let weather = match &self.weather {
            Some(name) => gm.weather_index(name)?,
            None => None,
        };
        Ok(PveRequest {
            players,
            settings: PveSettings {
                time_limit: self.time_limit.unwrap_or(PVE_TIME_LIMIT),
                weather,
                background_dps: self.background_dps,
                enable_log: self.enable_log,
            },
            aggregation: aggregation(self.aggregation.as_deref(), Aggregation::None)?,
            num_sims: self.num_sims,
            seed: self.seed,
        })
    }
}

/// `numShields` of a duel: one count for both sides, or one per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ShieldCounts {
    Both(u32),
    PerSide([u32; 2]),
}

impl Default for ShieldCounts {
    fn default() -> Self {
        Self::Both(2)
    }
}

impl ShieldCounts {
    fn per_side(self) -> [u32; 2] {
        match self {
            Self::Both(n) => [n, n],
            Self::PerSide(pair) => pair,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PvpDocument {
    pokemon: Vec<CombatantDocument>,
    #[serde(default)]
    strategies: Vec<String>,
    #[serde(default)]
    num_shields: ShieldCounts,
    #[serde(default, rename = "timelimit", alias = "timeLimit")]
    time_limit: Option<Time>,
    #[serde(default = "one")]
    num_sims: u32,
    #[serde(default)]
    aggregation: Option<String>,
    #[serde(default)]
    branch_policy: Option<String>,
    #[serde(default)]
    enable_log: bool,
    #[serde(default)]
    seed: u64,
}

impl PvpDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<PvpRequest> {
        let [first, second] = self.pokemon.as_slice() else {
            return Err(InputError::DuelistCount(self.pokemon.len()).into());
        };
        let shields = self.num_shields.per_side();
        let duelist = |doc: &CombatantDocument, side: usize| -> Result<Duelist> {
            Ok(Duelist {
                combatant: doc.resolve(gm)?,
                strategy: pvp_strategy(self.strategies.get(side).map(String::as_str))?,
                shields: shields[side],
            })
        };
        Ok(PvpRequest {
            duelists: [duelist(first, 0)?, duelist(second, 1)?],
            settings: DuelSettings {
                time_limit: self.time_limit.unwrap_or(PVP_TIME_LIMIT),
                enable_log: self.enable_log,
            },
            aggregation: aggregation(self.aggregation.as_deref(), Aggregation::Branching)?,
            num_sims: self.num_sims,
            policy: branch_policy(self.branch_policy.as_deref())?,
            seed: self.seed,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatrixDocument {
    #[serde(default)]
    row_pokemon: Vec<CombatantDocument>,
    #[serde(default)]
    col_pokemon: Vec<CombatantDocument>,
    #[serde(default, alias = "avergeByShield")]
    average_by_shield: bool,
    #[serde(default)]
    num_shields: Option<u32>,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    branch_policy: Option<String>,
    #[serde(default, rename = "timelimit", alias = "timeLimit")]
    time_limit: Option<Time>,
    #[serde(default)]
    seed: u64,
}

impl MatrixDocument {
    fn resolve(&self, gm: &GameMaster) -> Result<MatrixRequest> {
        let strategy = pvp_strategy(self.strategy.as_deref())?;
        let duelists = |docs: &[CombatantDocument]| -> Result<Vec<Duelist>> {
            docs.iter()
                .map(|doc| -> Result<Duelist> {
                    Ok(Duelist {
                        combatant: doc.resolve(gm)?,
                        strategy,
                        shields: 0,
                    })
                })
                .collect()
        };
        let mut rows = duelists(&self.row_pokemon)?;
        let mut cols = duelists(&self.col_pokemon)?;
        // A missing axis mirrors the other one.
        if rows.is_empty() {
            rows.clone_from(&cols);
        } else if cols.is_empty() {
            cols.clone_from(&rows);
        }
        let shields = if self.average_by_shield {
            MatrixShields::AverageByShield
        } else {
            MatrixShields::Fixed(self.num_shields.unwrap_or(0))
        };
        Ok(MatrixRequest {
            rows,
            cols,
            settings: DuelSettings {
                time_limit: self.time_limit.unwrap_or(PVP_TIME_LIMIT),
                enable_log: false,
            },
            shields,
            policy: branch_policy(self.branch_policy.as_deref())?,
            seed: self.seed,
        })
    }
}
