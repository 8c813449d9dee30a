//! Data models for recipes, boost state and calculation results

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a recipe belongs to a factory or a mine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
    Factory,
    Mine,
}

impl RecipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeKind::Factory => "factory",
            RecipeKind::Mine => "mine",
        }
    }

    /// Parse the stored form; anything unrecognised is a factory
    pub fn from_db(s: &str) -> Self {
        if s.eq_ignore_ascii_case("mine") {
            RecipeKind::Mine
        } else {
            RecipeKind::Factory
        }
    }
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol and an amount of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub symbol: String,
    pub amount: f64,
}

impl Ingredient {
    pub fn new(symbol: impl Into<String>, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
        }
    }
}

/// One factory or mine level: what it consumes, what it makes, how long it takes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub kind: RecipeKind,
    pub output_symbol: String,
    pub level: u32,
    pub duration_sec: f64, // 0 = instantaneous
    pub output_per_craft: f64,
    pub input1: Ingredient,
    pub input2: Option<Ingredient>,
    pub xp_per_craft: f64,
    pub upgrade_cost: Option<Ingredient>,
    pub event: Option<String>,
}

/// Player upgrade state used to derive multipliers.
///
/// With `auto_apply` set, levels come from the per-symbol maps (live account
/// data or a saved profile). Otherwise the two manual values apply to every
/// recipe regardless of symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostState {
    pub auto_apply: bool,
    pub workshop_levels: BTreeMap<String, i64>,
    pub mastery_levels: BTreeMap<String, i64>,
    pub manual_workshop_percent: f64,
    pub manual_mastery_level: f64,
}

impl BoostState {
    /// Boost state driven by per-symbol levels. Keys are upper-cased.
    pub fn live(workshop: BTreeMap<String, i64>, mastery: BTreeMap<String, i64>) -> Self {
        Self {
            auto_apply: true,
            workshop_levels: uppercase_keys(workshop),
            mastery_levels: uppercase_keys(mastery),
            ..Self::default()
        }
    }

    /// Boost state driven by the manual override pair
    pub fn manual(workshop_percent: f64, mastery_level: f64) -> Self {
        Self {
            auto_apply: false,
            manual_workshop_percent: workshop_percent,
            manual_mastery_level: mastery_level,
            ..Self::default()
        }
    }
}

/// Upper-case every key of a level map. On collision the larger level wins.
pub fn uppercase_keys(levels: BTreeMap<String, i64>) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for (symbol, level) in levels {
        let entry = out.entry(symbol.trim().to_uppercase()).or_insert(level);
        *entry = (*entry).max(level);
    }
    out
}

/// Scaling factors applied to a recipe's base numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub duration_mult: f64,
    pub input_mult: f64,
    pub output_mult: f64,
}

impl Multipliers {
    pub const IDENTITY: Multipliers = Multipliers {
        duration_mult: 1.0,
        input_mult: 1.0,
        output_mult: 1.0,
    };
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Economics of a single craft, in COIN
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerCraft {
    pub output_amount: f64,
    pub input1_amount: f64,
    pub input2_amount: f64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub roi: f64,
}

/// Economics of running one building around the clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerDay {
    pub crafts_per_day: f64,
    pub output_per_day: f64,
    pub revenue_per_day: f64,
    pub cost_per_day: f64,
    pub profit_per_day: f64,
    pub roi: f64,
}

/// What a stockpile of the first input turns into
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StartWithInput1 {
    pub crafts: u64,
    pub required_input2: f64,
    pub output: f64,
    pub time_sec: f64,
}

/// What a stockpile of the second input turns into
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StartWithInput2 {
    pub crafts: u64,
    pub required_input1: f64,
    pub output: f64,
    pub time_sec: f64,
}

/// A saved set of boost levels plus worker and factory configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub workshop: BTreeMap<String, i64>,
    pub mastery: BTreeMap<String, i64>,
    pub workers: u8,
    pub factory_count: u32,
    pub updated_at: String,
}

impl Profile {
    /// Boost state that applies this profile's levels per symbol
    pub fn boost_state(&self) -> BoostState {
        BoostState::live(self.workshop.clone(), self.mastery.clone())
    }
}

/// Fields to write when saving a profile. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub workshop: Option<BTreeMap<String, i64>>,
    pub mastery: Option<BTreeMap<String, i64>>,
    pub workers: Option<i64>,
    pub factory_count: Option<i64>,
}
