//! Database schema and operations

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

use crate::error::ProfileError;
use crate::models::{Ingredient, Profile, ProfileUpdate, Recipe, RecipeKind, uppercase_keys};

pub const MAX_PROFILE_NAME: usize = 64;
pub const MAX_WORKERS: i64 = 4;
pub const MAX_FACTORY_COUNT: i64 = 999_999;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Factory and mine levels
        CREATE TABLE IF NOT EXISTS recipes (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            output_symbol TEXT NOT NULL,
            level INTEGER NOT NULL,
            duration_sec REAL NOT NULL,
            output_per_craft REAL NOT NULL,
            input1_symbol TEXT NOT NULL,
            input1_amount REAL NOT NULL,
            input2_symbol TEXT,
            input2_amount REAL,
            xp_per_craft REAL NOT NULL,
            upgrade_cost_symbol TEXT,
            upgrade_cost_amount REAL,
            event TEXT
        );

        -- Saved boost levels and building configuration
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            workshop TEXT NOT NULL DEFAULT '{}',
            mastery TEXT NOT NULL DEFAULT '{}',
            workers INTEGER NOT NULL DEFAULT 0,
            factory_count INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_recipes_output ON recipes(output_symbol);
        CREATE INDEX IF NOT EXISTS idx_recipes_kind ON recipes(kind);
        "#,
    )?;
    Ok(())
}

/// Insert or replace a recipe
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO recipes (id, kind, output_symbol, level, duration_sec,
             output_per_craft, input1_symbol, input1_amount, input2_symbol, input2_amount,
             xp_per_craft, upgrade_cost_symbol, upgrade_cost_amount, event)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            &recipe.id,
            recipe.kind.as_str(),
            &recipe.output_symbol,
            recipe.level,
            recipe.duration_sec,
            recipe.output_per_craft,
            &recipe.input1.symbol,
            recipe.input1.amount,
            recipe.input2.as_ref().map(|i| &i.symbol),
            recipe.input2.as_ref().map(|i| i.amount),
            recipe.xp_per_craft,
            recipe.upgrade_cost.as_ref().map(|i| &i.symbol),
            recipe.upgrade_cost.as_ref().map(|i| i.amount),
            &recipe.event,
        ],
    )?;
    Ok(())
}

/// Remove all imported recipes (for re-import)
pub fn clear_recipes(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM recipes", [])?;
    Ok(())
}

const RECIPE_COLUMNS: &str = "id, kind, output_symbol, level, duration_sec, output_per_craft,
     input1_symbol, input1_amount, input2_symbol, input2_amount, xp_per_craft,
     upgrade_cost_symbol, upgrade_cost_amount, event";

fn ingredient(symbol: Option<String>, amount: Option<f64>) -> Option<Ingredient> {
    symbol.map(|s| Ingredient::new(s, amount.unwrap_or(0.0)))
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    let kind: String = row.get(1)?;
    Ok(Recipe {
        id: row.get(0)?,
        kind: RecipeKind::from_db(&kind),
        output_symbol: row.get(2)?,
        level: row.get(3)?,
        duration_sec: row.get(4)?,
        output_per_craft: row.get(5)?,
        input1: Ingredient::new(row.get::<_, String>(6)?, row.get(7)?),
        input2: ingredient(row.get(8)?, row.get(9)?),
        xp_per_craft: row.get(10)?,
        upgrade_cost: ingredient(row.get(11)?, row.get(12)?),
        event: row.get(13)?,
    })
}

/// Look up a recipe by ID (case-insensitive)
pub fn get_recipe(conn: &Connection, id: &str) -> Result<Option<Recipe>> {
    let recipe = conn
        .query_row(
            &format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1 COLLATE NOCASE"),
            [id.trim()],
            recipe_from_row,
        )
        .optional()?;
    Ok(recipe)
}

/// List recipes ordered by output symbol and level, optionally of one kind
pub fn list_recipes(conn: &Connection, kind: Option<RecipeKind>) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes
         WHERE ?1 IS NULL OR kind = ?1
         ORDER BY output_symbol, level, id"
    ))?;

    let rows = stmt.query_map([kind.map(|k| k.as_str())], recipe_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Check profile fields against their allowed ranges
pub fn validate_profile(update: &ProfileUpdate) -> Result<(), ProfileError> {
    let len = update.name.trim().chars().count();
    if len == 0 || len > MAX_PROFILE_NAME {
        return Err(ProfileError::InvalidName {
            len,
            max: MAX_PROFILE_NAME,
        });
    }
    if let Some(workers) = update.workers {
        if !(0..=MAX_WORKERS).contains(&workers) {
            return Err(ProfileError::InvalidWorkers {
                got: workers,
                max: MAX_WORKERS,
            });
        }
    }
    if let Some(count) = update.factory_count {
        if !(1..=MAX_FACTORY_COUNT).contains(&count) {
            return Err(ProfileError::InvalidFactoryCount {
                got: count,
                max: MAX_FACTORY_COUNT,
            });
        }
    }
    Ok(())
}

fn levels_to_json(levels: BTreeMap<String, i64>) -> Result<String> {
    Ok(serde_json::to_string(&uppercase_keys(levels))?)
}

/// Create a profile or update the supplied fields of an existing one
pub fn upsert_profile(conn: &Connection, update: ProfileUpdate) -> Result<Profile> {
    validate_profile(&update)?;
    let name = update.name.trim().to_string();

    let existing = get_profile(conn, &name)?;
    let (workshop, mastery, workers, factory_count) = match existing {
        Some(p) => (
            update.workshop.unwrap_or(p.workshop),
            update.mastery.unwrap_or(p.mastery),
            update.workers.unwrap_or(i64::from(p.workers)),
            update.factory_count.unwrap_or(i64::from(p.factory_count)),
        ),
        None => (
            update.workshop.unwrap_or_default(),
            update.mastery.unwrap_or_default(),
            update.workers.unwrap_or(0),
            update.factory_count.unwrap_or(1),
        ),
    };

    conn.execute(
        "INSERT INTO profiles (name, workshop, mastery, workers, factory_count, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, strftime('%Y-%m-%d %H:%M:%f', 'now'))
         ON CONFLICT(name) DO UPDATE SET
             workshop = excluded.workshop,
             mastery = excluded.mastery,
             workers = excluded.workers,
             factory_count = excluded.factory_count,
             updated_at = excluded.updated_at",
        (
            &name,
            levels_to_json(workshop)?,
            levels_to_json(mastery)?,
            workers,
            factory_count,
        ),
    )?;
    info!(profile = %name, "saved profile");

    get_profile(conn, &name)?.with_context(|| format!("profile '{name}' missing after save"))
}

const PROFILE_COLUMNS: &str = "id, name, workshop, mastery, workers, factory_count, updated_at";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    let parse_levels = |idx: usize| -> rusqlite::Result<BTreeMap<String, i64>> {
        let json: String = row.get(idx)?;
        serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };

    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        workshop: parse_levels(2)?,
        mastery: parse_levels(3)?,
        workers: row.get(4)?,
        factory_count: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Look up a profile by name
pub fn get_profile(conn: &Connection, name: &str) -> Result<Option<Profile>> {
    let profile = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE name = ?1"),
            [name.trim()],
            profile_from_row,
        )
        .optional()?;
    Ok(profile)
}

/// List profiles, most recently updated first
pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY updated_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], profile_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Delete a profile by name. Returns whether one existed.
pub fn delete_profile(conn: &Connection, name: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM profiles WHERE name = ?1", [name.trim()])?;
    if deleted > 0 {
        info!(profile = %name.trim(), "deleted profile");
    }
    Ok(deleted > 0)
}
