//! Configuration store: type chart, weather boosts, stat stages and timing
//! constants.
//!
//! A [`GameMaster`] is built once (programmatically or from a game-master JSON
//! document), then shared by reference with every battle. Nothing mutates it
//! while simulations run, so the same value can be read from any number of
//! rayon workers at once, and two battles can run under different rule sets
//! side by side.
//!
//! # Example
//!
//! ```
//! use battlesim_core::config::{GameMaster, StatKind};
//!
//! let mut gm = GameMaster::new(&["fire", "grass", "water"]).unwrap();
//! gm.set_effectiveness("fire", "grass", 1.6).unwrap();
//! gm.set_boosted_weather("fire", "sunny").unwrap();
//! gm.set_stage_bounds(-1, 1).unwrap();
//! gm.set_stage_multiplier(StatKind::Attack, 1, 1.25).unwrap();
//!
//! let fire = gm.type_index("fire").unwrap();
//! let grass = gm.type_index("grass").unwrap();
//! assert_eq!(gm.effectiveness(fire, grass), 1.6);
//! assert_eq!(gm.stage_multiplier(StatKind::Attack, 1).unwrap(), 1.25);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::Time;

/// Maximum number of types a store can hold.
pub const MAX_TYPES: usize = 64;

/// Maximum number of stat stages between the bounds (inclusive).
pub const MAX_STAGES: usize = 32;

/// Type names of the stock game. Used for a neutral store when no
/// game-master document is available.
pub const STANDARD_TYPES: [&str; 18] = [
    "normal", "fighting", "flying", "poison", "ground", "rock", "bug", "ghost", "steel", "fire",
    "water", "grass", "electric", "psychic", "ice", "dragon", "dark", "fairy",
];

/// Weather names of the stock game.
pub const STANDARD_WEATHERS: [&str; 7] =
    ["clear", "rainy", "partly_cloudy", "cloudy", "windy", "snow", "fog"];

/// Names that decode to "no type" / "no weather".
const NONE_NAMES: [&str; 2] = ["", "none"];

// =============================================================================
// Identifiers
// =============================================================================

/// Index of a type in the configuration store.
///
/// Resolved from a type name once, at load time.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeIndex(u16);

impl TypeIndex {
    /// Returns the raw table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIndex({})", self.0)
    }
}

/// Index of a weather condition in the configuration store.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeatherIndex(u16);

impl WeatherIndex {
    /// Returns the raw table index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for WeatherIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeatherIndex({})", self.0)
    }
}

/// Which stat a stage applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Attack stat.
    Attack,
    /// Defense stat.
    Defense,
}

// =============================================================================
// Constants
// =============================================================================

/// Named timing and scalar constants.
///
/// Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BattleConstants {
    /// Energy cap for every combatant.
    pub max_energy: i32,
    /// How long a dodge keeps the dodger busy.
    pub dodge_duration: Time,
    /// How long a dodge protects against incoming damage.
    pub dodge_window: Time,
    /// Delay before the next party member enters after a faint or switch.
    pub swap_duration: Time,
    /// PvP quick-swap cooldown.
    pub switching_cooldown: Time,
    /// Delay before a player's next party (or revived party) rejoins.
    pub rejoin_duration: Time,
    /// Item menu animation time.
    pub item_menu_animation_time: Time,
    /// Revive time per party member.
    pub max_revive_time_per_pokemon: Time,
    /// Same-type attack bonus.
    pub same_type_attack_bonus_multiplier: f64,
    /// Weather-boosted move bonus.
    pub weather_attack_bonus_multiplier: f64,
    /// PvP fast move bonus.
    pub pvp_fast_attack_bonus_multiplier: f64,
    /// PvP charged move bonus.
    pub pvp_charged_attack_bonus_multiplier: f64,
    /// Fraction of damage removed by a successful dodge.
    pub dodge_damage_reduction_percent: f64,
    /// Energy gained per point of health lost.
    pub energy_delta_per_health_lost: f64,
    /// Minimum pause between two moves of a pre-committing defender.
    pub defender_min_delay: Time,
    /// Maximum pause between two moves of a pre-committing defender.
    pub defender_max_delay: Time,
    /// Period of background damage ticks.
    pub background_damage_interval: Time,
    /// Damage taken through a PvP shield.
    pub pvp_shielded_damage: i32,
}

impl Default for BattleConstants {
    fn default() -> Self {
        Self {
            max_energy: 100,
            dodge_duration: 500,
            dodge_window: 700,
            swap_duration: 1000,
            switching_cooldown: 60_000,
            rejoin_duration: 10_000,
            item_menu_animation_time: 2000,
            max_revive_time_per_pokemon: 1000,
            same_type_attack_bonus_multiplier: 1.2,
            weather_attack_bonus_multiplier: 1.2,
            pvp_fast_attack_bonus_multiplier: 1.3,
            pvp_charged_attack_bonus_multiplier: 1.3,
            dodge_damage_reduction_percent: 0.75,
            energy_delta_per_health_lost: 0.5,
            defender_min_delay: 1500,
            defender_max_delay: 2500,
            background_damage_interval: 1000,
            pvp_shielded_damage: 1,
        }
    }
}

// =============================================================================
// GameMaster
// =============================================================================

/// Immutable rule set consumed by every battle.
#[derive(Debug, Clone, PartialEq)]
pub struct GameMaster {
    type_names: Vec<String>,
    /// Row-major `[attacking][defending]` multipliers.
    effectiveness: Vec<f64>,
    boosted_weather: Vec<Option<WeatherIndex>>,
    weather_names: Vec<String>,
    min_stage: i32,
    max_stage: i32,
    attack_stage_multipliers: Vec<f64>,
    defense_stage_multipliers: Vec<f64>,
    constants: BattleConstants,
}

impl Default for GameMaster {
    fn default() -> Self {
        Self {
            type_names: Vec::new(),
            effectiveness: Vec::new(),
            boosted_weather: Vec::new(),
            weather_names: Vec::new(),
            min_stage: 0,
            max_stage: 0,
            attack_stage_multipliers: vec![1.0],
            defense_stage_multipliers: vec![1.0],
            constants: BattleConstants::default(),
        }
    }
}

impl GameMaster {
    /// Creates a store with the given types, neutral effectiveness, no weather
    /// boosts, a single stage (0, multiplier 1.0) and default constants.
    ///
    /// Type names are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TooManyTypes`] if more than [`MAX_TYPES`] names
    /// are given.
    pub fn new<S: AsRef<str>>(type_names: &[S]) -> Result<Self, ConfigError> {
        if type_names.len() > MAX_TYPES {
            return Err(ConfigError::TooManyTypes {
                count: type_names.len(),
                max: MAX_TYPES,
            });
        }
        let n = type_names.len();
        Ok(Self {
            type_names: type_names
                .iter()
                .map(|name| normalize(name.as_ref()))
                .collect(),
            effectiveness: vec![1.0; n * n],
            boosted_weather: vec![None; n],
            ..Self::default()
        })
    }

    /// Neutral store over [`STANDARD_TYPES`] and [`STANDARD_WEATHERS`]: every
    /// matchup is 1.0 and no weather boosts anything.
    #[must_use]
    pub fn standard() -> Self {
        let n = STANDARD_TYPES.len();
        let mut gm = Self {
            type_names: STANDARD_TYPES.iter().map(|name| (*name).to_string()).collect(),
            effectiveness: vec![1.0; n * n],
            boosted_weather: vec![None; n],
            ..Self::default()
        };
        for weather in STANDARD_WEATHERS {
            gm.add_weather(weather);
        }
        gm
    }

    /// Returns the timing and scalar constants.
    #[must_use]
    pub fn constants(&self) -> &BattleConstants {
        &self.constants
    }

    /// Mutable access to the constants, for loading.
    pub fn constants_mut(&mut self) -> &mut BattleConstants {
        &mut self.constants
    }

    /// Replaces the constants (builder style).
    #[must_use]
    pub fn with_constants(mut self, constants: BattleConstants) -> Self {
        self.constants = constants;
        self
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Number of configured types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.type_names.len()
    }

    /// Name of a type.
    #[must_use]
    pub fn type_name(&self, index: TypeIndex) -> Option<&str> {
        self.type_names.get(index.index()).map(String::as_str)
    }

    /// Resolves a type name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] if the name is not configured.
    pub fn type_index(&self, name: &str) -> Result<TypeIndex, ConfigError> {
        let key = normalize(name);
        self.type_names
            .iter()
            .position(|candidate| *candidate == key)
            .map(to_type_index)
            .ok_or_else(|| ConfigError::UnknownType(name.to_string()))
    }

    /// Resolves an optional type name, where `""` and `"none"` mean no type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] for any other unknown name.
    pub fn optional_type_index(&self, name: &str) -> Result<Option<TypeIndex>, ConfigError> {
        if is_none_name(name) {
            Ok(None)
        } else {
            self.type_index(name).map(Some)
        }
    }

    /// Sets the multiplier of an attacking type against a defending type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] if either name is not configured.
    pub fn set_effectiveness(
        &mut self,
        attacking: &str,
        defending: &str,
        multiplier: f64,
    ) -> Result<(), ConfigError> {
        let atk = self.type_index(attacking)?;
        let def = self.type_index(defending)?;
        let n = self.type_count();
        self.effectiveness[atk.index() * n + def.index()] = multiplier;
        Ok(())
    }

    /// Multiplier of an attacking type against a defending type.
    ///
    /// Indices from a different store fall back to 1.0.
    #[must_use]
    pub fn effectiveness(&self, attacking: TypeIndex, defending: TypeIndex) -> f64 {
        let n = self.type_count();
        if attacking.index() < n && defending.index() < n {
            self.effectiveness[attacking.index() * n + defending.index()]
        } else {
            1.0
        }
    }

    // -------------------------------------------------------------------------
    // Weather
    // -------------------------------------------------------------------------

    /// Registers a weather name, returning its index. Re-registering returns
    /// the existing index.
    pub fn add_weather(&mut self, name: &str) -> WeatherIndex {
        let key = normalize(name);
        if let Some(pos) = self.weather_names.iter().position(|w| *w == key) {
            return to_weather_index(pos);
        }
        self.weather_names.push(key);
        to_weather_index(self.weather_names.len() - 1)
    }

    /// Resolves a weather name, where `""` and `"none"` mean no weather.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownWeather`] for unknown names.
    pub fn weather_index(&self, name: &str) -> Result<Option<WeatherIndex>, ConfigError> {
        if is_none_name(name) {
            return Ok(None);
        }
        let key = normalize(name);
        self.weather_names
            .iter()
            .position(|w| *w == key)
            .map(|pos| Some(to_weather_index(pos)))
            .ok_or_else(|| ConfigError::UnknownWeather(name.to_string()))
    }

    /// Name of a weather condition.
    #[must_use]
    pub fn weather_name(&self, index: WeatherIndex) -> Option<&str> {
        self.weather_names.get(index.index()).map(String::as_str)
    }

    /// Marks `type_name` as boosted by `weather_name`, registering the weather
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownType`] if the type is not configured.
    pub fn set_boosted_weather(
        &mut self,
        type_name: &str,
        weather_name: &str,
    ) -> Result<WeatherIndex, ConfigError> {
        let t = self.type_index(type_name)?;
        let weather = self.add_weather(weather_name);
        self.boosted_weather[t.index()] = Some(weather);
        Ok(weather)
    }

    /// Weather that boosts moves of the given type, if any.
    #[must_use]
    pub fn boosted_weather(&self, t: TypeIndex) -> Option<WeatherIndex> {
        self.boosted_weather.get(t.index()).copied().flatten()
    }

    // -------------------------------------------------------------------------
    // Stages
    // -------------------------------------------------------------------------

    /// Configured `(min, max)` stage bounds.
    #[must_use]
    pub fn stage_bounds(&self) -> (i32, i32) {
        (self.min_stage, self.max_stage)
    }

    /// Sets the stage bounds and resets both multiplier tables to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::StageBoundsOrder`] if `min > max`, or
    /// [`ConfigError::TooManyStages`] if the range exceeds [`MAX_STAGES`].
    pub fn set_stage_bounds(&mut self, min: i32, max: i32) -> Result<(), ConfigError> {
        if min > max {
            return Err(ConfigError::StageBoundsOrder { min, max });
        }
        let count = usize::try_from(i64::from(max) - i64::from(min) + 1).unwrap_or(usize::MAX);
        if count > MAX_STAGES {
            return Err(ConfigError::TooManyStages {
                count,
                max: MAX_STAGES,
            });
        }
        self.min_stage = min;
        self.max_stage = max;
        self.attack_stage_multipliers = vec![1.0; count];
        self.defense_stage_multipliers = vec![1.0; count];
        Ok(())
    }

    /// Sets the multiplier of one stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] if `stage` is out of bounds.
    pub fn set_stage_multiplier(
        &mut self,
        kind: StatKind,
        stage: i32,
        multiplier: f64,
    ) -> Result<(), ConfigError> {
        let slot = self.stage_slot(stage)?;
        self.table_mut(kind)[slot] = multiplier;
        Ok(())
    }

    /// Multiplier of one stage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] if `stage` is out of bounds.
    pub fn stage_multiplier(&self, kind: StatKind, stage: i32) -> Result<f64, ConfigError> {
        let slot = self.stage_slot(stage)?;
        Ok(self.table(kind)[slot])
    }

    /// Multiplier of a stage after clamping it into bounds. Used by the
    /// damage calculator, whose stages are clamped on every mutation.
    #[must_use]
    pub fn clamped_stage_multiplier(&self, kind: StatKind, stage: i32) -> f64 {
        let clamped = self.clamp_stage(stage);
        // Bounds were validated when the table was built, so the slot exists.
        let slot = usize::try_from(clamped - self.min_stage).unwrap_or(0);
        self.table(kind).get(slot).copied().unwrap_or(1.0)
    }

    /// Clamps a stage into the configured bounds.
    #[must_use]
    pub fn clamp_stage(&self, stage: i32) -> i32 {
        stage.clamp(self.min_stage, self.max_stage)
    }

    fn stage_slot(&self, stage: i32) -> Result<usize, ConfigError> {
        if stage < self.min_stage || stage > self.max_stage {
            return Err(ConfigError::InvalidStage {
                stage,
                min: self.min_stage,
                max: self.max_stage,
            });
        }
        Ok(usize::try_from(stage - self.min_stage).unwrap_or(0))
    }

    fn table(&self, kind: StatKind) -> &[f64] {
        match kind {
            StatKind::Attack => &self.attack_stage_multipliers,
            StatKind::Defense => &self.defense_stage_multipliers,
        }
    }

    fn table_mut(&mut self, kind: StatKind) -> &mut [f64] {
        match kind {
            StatKind::Attack => &mut self.attack_stage_multipliers,
            StatKind::Defense => &mut self.defense_stage_multipliers,
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Decodes a game-master JSON document.
    ///
    /// Types and weathers are indexed in name order, so the same document
    /// always yields the same indices.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed JSON and a configuration error for
    /// unknown names or inconsistent stage settings.
    pub fn from_json(document: &str) -> Result<Self> {
        let doc: GameMasterDocument = serde_json::from_str(document)?;
        Ok(Self::from_document(&doc)?)
    }

    fn from_document(doc: &GameMasterDocument) -> Result<Self, ConfigError> {
        let names: Vec<&str> = doc.type_effectiveness.keys().map(String::as_str).collect();
        let mut gm = Self::new(&names)?;

        for (attacking, row) in &doc.type_effectiveness {
            for (defending, multiplier) in row {
                gm.set_effectiveness(attacking, defending, *multiplier)?;
            }
        }

        for (weather, boosted) in &doc.weather_settings {
            gm.add_weather(weather);
            for type_name in boosted {
                gm.set_boosted_weather(type_name, weather)?;
            }
        }

        doc.pve.apply(&mut gm.constants);
        doc.pvp.apply(&mut gm.constants);

        let min = doc.pvp.minimum_stat_stage.unwrap_or(gm.min_stage);
        let max = doc.pvp.maximum_stat_stage.unwrap_or(gm.max_stage);
        gm.set_stage_bounds(min, max)?;
        let expected = gm.attack_stage_multipliers.len();
        for (kind, table, label) in [
            (StatKind::Attack, &doc.pvp.attack_buff_multiplier, "attack"),
            (StatKind::Defense, &doc.pvp.defense_buff_multiplier, "defense"),
        ] {
            let Some(values) = table else { continue };
            if values.len() != expected {
                return Err(ConfigError::StageTableLength {
                    table: label,
                    expected,
                    found: values.len(),
                });
            }
            gm.table_mut(kind).copy_from_slice(values);
        }

        Ok(gm)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn is_none_name(name: &str) -> bool {
    let key = normalize(name);
    NONE_NAMES.contains(&key.as_str())
}

fn to_type_index(pos: usize) -> TypeIndex {
    // Bounded by MAX_TYPES.
    TypeIndex(u16::try_from(pos).unwrap_or(u16::MAX))
}

fn to_weather_index(pos: usize) -> WeatherIndex {
    WeatherIndex(u16::try_from(pos).unwrap_or(u16::MAX))
}

// =============================================================================
// Game-master document
// =============================================================================

#[derive(Debug, Deserialize)]
struct GameMasterDocument {
    #[serde(rename = "TypeEffectiveness")]
    type_effectiveness: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(rename = "WeatherSettings", default)]
    weather_settings: BTreeMap<String, Vec<String>>,
    #[serde(rename = "PvEBattleSettings", default)]
    pve: PveSettingsDocument,
    #[serde(rename = "PvPBattleSettings", default)]
    pvp: PvpSettingsDocument,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PveSettingsDocument {
    same_type_attack_bonus_multiplier: Option<f64>,
    #[serde(alias = "maximumEnergy")]
    max_energy: Option<f64>,
    energy_delta_per_health_lost: Option<f64>,
    dodge_duration_ms: Option<f64>,
    dodge_window_ms: Option<f64>,
    dodge_damage_reduction_percent: Option<f64>,
    swap_duration_ms: Option<f64>,
    weather_attack_bonus_multiplier: Option<f64>,
    rejoin_duration_ms: Option<f64>,
    item_menu_animation_time_ms: Option<f64>,
    max_revive_time_per_pokemon_ms: Option<f64>,
}

impl PveSettingsDocument {
    fn apply(&self, c: &mut BattleConstants) {
        set_f64(&mut c.same_type_attack_bonus_multiplier, self.same_type_attack_bonus_multiplier);
        set_i32(&mut c.max_energy, self.max_energy);
        set_f64(&mut c.energy_delta_per_health_lost, self.energy_delta_per_health_lost);
        set_i32(&mut c.dodge_duration, self.dodge_duration_ms);
        set_i32(&mut c.dodge_window, self.dodge_window_ms);
        set_f64(&mut c.dodge_damage_reduction_percent, self.dodge_damage_reduction_percent);
        set_i32(&mut c.swap_duration, self.swap_duration_ms);
        set_f64(&mut c.weather_attack_bonus_multiplier, self.weather_attack_bonus_multiplier);
        set_i32(&mut c.rejoin_duration, self.rejoin_duration_ms);
        set_i32(&mut c.item_menu_animation_time, self.item_menu_animation_time_ms);
        set_i32(&mut c.max_revive_time_per_pokemon, self.max_revive_time_per_pokemon_ms);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PvpSettingsDocument {
    same_type_attack_bonus_multiplier: Option<f64>,
    max_energy: Option<f64>,
    fast_attack_bonus_multiplier: Option<f64>,
    charge_attack_bonus_multiplier: Option<f64>,
    quick_swap_cooldown_duration_seconds: Option<f64>,
    minimum_stat_stage: Option<i32>,
    maximum_stat_stage: Option<i32>,
    attack_buff_multiplier: Option<Vec<f64>>,
    defense_buff_multiplier: Option<Vec<f64>>,
}

impl PvpSettingsDocument {
    fn apply(&self, c: &mut BattleConstants) {
        set_f64(&mut c.same_type_attack_bonus_multiplier, self.same_type_attack_bonus_multiplier);
        set_i32(&mut c.max_energy, self.max_energy);
        set_f64(&mut c.pvp_fast_attack_bonus_multiplier, self.fast_attack_bonus_multiplier);
        set_f64(&mut c.pvp_charged_attack_bonus_multiplier, self.charge_attack_bonus_multiplier);
        set_i32(
            &mut c.switching_cooldown,
            self.quick_swap_cooldown_duration_seconds.map(|s| s * 1000.0),
        );
    }
}

fn set_f64(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn set_i32(slot: &mut i32, value: Option<f64>) {
    if let Some(v) = value {
        *slot = v.round() as i32;
    }
}
