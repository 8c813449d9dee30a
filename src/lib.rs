//! Craft World production calculator
//!
//! Boost-adjusted profitability for factories and mines: resolve a player's
//! workshop and mastery levels into multipliers, then project per-craft,
//! per-day and "start with N units" economics against a COIN price table.

pub mod account;
pub mod boost;
pub mod calculator;
pub mod data;
pub mod db;
pub mod error;
pub mod models;
pub mod prices;

pub use boost::{Tier, multipliers_for_recipe, tier_of};
pub use calculator::{
    Evaluation, evaluate, per_craft, per_day, start_with_input1, start_with_input2,
};
pub use models::{BoostState, Ingredient, Multipliers, Recipe, RecipeKind};
pub use prices::PriceTable;
