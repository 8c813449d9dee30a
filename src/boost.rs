//! Workshop and mastery boost resolution
//!
//! Turns a player's upgrade levels into the duration and input multipliers
//! applied to a recipe. Boost curves are empirical game balance data and are
//! kept as literal tables indexed by level.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::models::{BoostState, Multipliers, Recipe};

/// Highest workshop or mastery level
pub const MAX_LEVEL: usize = 10;

/// Processing class of a commodity, selecting its workshop boost curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    One,
    Two,
    Three,
    Four,
}

// Workshop boost percent, indexed by level 0..=10
const TIER_1_BOOST: [f64; MAX_LEVEL + 1] = [
    0.0, 11.0, 23.0, 35.0, 47.0, 59.0, 69.0, 79.0, 85.0, 92.0, 100.0,
];
const TIER_2_BOOST: [f64; MAX_LEVEL + 1] = [
    0.0, 10.0, 20.0, 30.0, 39.0, 47.0, 54.0, 61.0, 69.0, 75.0, 82.0,
];
const TIER_3_BOOST: [f64; MAX_LEVEL + 1] = [
    0.0, 9.0, 18.0, 25.0, 32.0, 39.0, 45.0, 52.0, 56.0, 61.0, 67.0,
];
const TIER_4_BOOST: [f64; MAX_LEVEL + 1] = [
    0.0, 8.0, 15.0, 22.0, 28.0, 33.0, 37.0, 41.0, 45.0, 49.0, 54.0,
];

// Mastery yield bonus percent, indexed by level 0..=10
const MASTERY_YIELD_BONUS_PERCENT: [f64; MAX_LEVEL + 1] = [
    100.0, 102.0, 102.9, 103.3, 103.7, 104.2, 104.4, 104.6, 104.8, 105.0, 105.3,
];

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::One, Tier::Two, Tier::Three, Tier::Four];

    pub fn number(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
            Tier::Four => 4,
        }
    }

    /// Symbols belonging to this tier
    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            Tier::One => &["MUD", "CLAY", "SAND"],
            Tier::Two => &[
                "COPPER", "SEAWATER", "HEAT", "ALGAE", "LAVA", "CERAMICS", "STEEL", "OXYGEN",
                "GLASS",
            ],
            Tier::Three => &[
                "GAS", "STONE", "STEAM", "SCREWS", "FUEL", "CEMENT", "OIL", "ACID", "SULFUR",
            ],
            Tier::Four => &["PLASTICS", "FIBERGLASS", "ENERGY", "HYDROGEN", "DYNAMITE"],
        }
    }

    /// Workshop boost percent for levels 0..=10
    pub fn boost_table(self) -> &'static [f64; MAX_LEVEL + 1] {
        match self {
            Tier::One => &TIER_1_BOOST,
            Tier::Two => &TIER_2_BOOST,
            Tier::Three => &TIER_3_BOOST,
            Tier::Four => &TIER_4_BOOST,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.number())
    }
}

/// Classify a symbol. Unknown symbols have no tier.
pub fn tier_of(symbol: &str) -> Option<Tier> {
    let symbol = symbol.trim().to_uppercase();
    Tier::ALL
        .into_iter()
        .find(|tier| tier.symbols().contains(&symbol.as_str()))
}

/// Clamp a raw level into a table index. Non-finite values count as 0 and
/// fractional levels round down.
pub fn clamp_level(raw: f64) -> usize {
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, MAX_LEVEL as f64).trunc() as usize
}

/// Case-insensitive level lookup, 0 when absent
pub fn level_for(levels: &BTreeMap<String, i64>, symbol: &str) -> i64 {
    let key = symbol.trim().to_uppercase();
    levels
        .get(&key)
        .or_else(|| {
            levels
                .iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(&key))
                .map(|(_, level)| level)
        })
        .copied()
        .unwrap_or(0)
}

/// Workshop boost percent a player has for a symbol
pub fn workshop_percent(symbol: &str, workshop_levels: &BTreeMap<String, i64>) -> f64 {
    let Some(tier) = tier_of(symbol) else {
        return 0.0;
    };
    let level = clamp_level(level_for(workshop_levels, symbol) as f64);
    tier.boost_table()[level]
}

/// Duration multiplier for a workshop speed boost.
///
/// The percent is a speed increase, so 100% halves the craft time.
pub fn duration_multiplier(percent: f64) -> f64 {
    let p = if percent.is_finite() { percent.max(0.0) } else { 0.0 };
    1.0 / (1.0 + p / 100.0)
}

/// Input multiplier for a mastery level
pub fn mastery_input_multiplier(level: f64) -> f64 {
    let bonus = MASTERY_YIELD_BONUS_PERCENT[clamp_level(level)];
    let reduction = ((bonus - 100.0) / 100.0).max(0.0);
    (1.0 - reduction).max(0.0)
}

/// Resolve the multipliers for one recipe under one boost state.
///
/// Live levels are keyed on the recipe's output symbol. Compute this once per
/// evaluation and pass the same triple to every projection.
pub fn multipliers_for_recipe(recipe: &Recipe, boost: &BoostState) -> Multipliers {
    let symbol = recipe.output_symbol.trim().to_uppercase();

    let (workshop, mastery) = if boost.auto_apply {
        (
            workshop_percent(&symbol, &boost.workshop_levels),
            level_for(&boost.mastery_levels, &symbol) as f64,
        )
    } else {
        (boost.manual_workshop_percent, boost.manual_mastery_level)
    };

    let mults = Multipliers {
        duration_mult: duration_multiplier(workshop),
        input_mult: mastery_input_multiplier(mastery),
        output_mult: 1.0,
    };
    debug!(
        recipe = %recipe.id,
        auto = boost.auto_apply,
        workshop_percent = workshop,
        mastery_level = mastery,
        ?mults,
        "resolved multipliers"
    );
    mults
}
