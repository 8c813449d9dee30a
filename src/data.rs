//! Recipe ingestion from factory and mine CSV tables
//!
//! Rows are keyed by `<SYMBOL>_<LEVEL>` identifiers. Durations arrive as
//! `HH:MM:SS`, numbers may carry thousands separators, and anything that
//! does not parse becomes 0 instead of failing the load.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::error::DataError;
use crate::models::{Ingredient, Recipe, RecipeKind};

static HMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?):(\d+(?:\.\d+)?):(\d+(?:\.\d+)?)$").expect("valid duration regex")
});

/// One row of a factory/mine table as it appears on disk
#[derive(Debug, Default, Deserialize)]
struct RawRecipeRow {
    #[serde(rename = "ID", default)]
    id: Option<String>,
    #[serde(rename = "DURATION", default)]
    duration: Option<String>,
    #[serde(rename = "OUTPUT", default)]
    output: Option<String>,
    #[serde(rename = "INPUT 1 SYMBOL", default)]
    input1_symbol: Option<String>,
    #[serde(rename = "INPUT 1 AMOUNT", default)]
    input1_amount: Option<String>,
    #[serde(rename = "INPUT 2 SYMBOL", default)]
    input2_symbol: Option<String>,
    #[serde(rename = "INPUT 2 AMOUNT", default)]
    input2_amount: Option<String>,
    #[serde(rename = "XP PER OUTPUT", default)]
    xp_per_output: Option<String>,
    #[serde(rename = "COST SYMBOL", default)]
    cost_symbol: Option<String>,
    #[serde(rename = "COST AMOUNT", default)]
    cost_amount: Option<String>,
    #[serde(rename = "EVENT", default)]
    event: Option<String>,
}

/// Parse a number, stripping thousands separators. Unparsable input is 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Convert `HH:MM:SS` to seconds. Anything else is 0.
pub fn parse_duration_hms(raw: &str) -> f64 {
    let Some(cap) = HMS_RE.captures(raw.trim()) else {
        return 0.0;
    };
    let part = |i: usize| cap[i].parse::<f64>().unwrap_or(0.0);
    part(1) * 3600.0 + part(2) * 60.0 + part(3)
}

/// Split `<SYMBOL>_<LEVEL>` into its output symbol and level
pub fn split_recipe_id(id: &str) -> (String, u32) {
    let mut parts = id.split('_');
    let symbol = parts.next().unwrap_or_default().trim().to_string();
    let level = parts
        .next()
        .map(parse_number)
        .filter(|l| *l >= 0.0 && *l <= u32::MAX as f64)
        .map_or(0, |l| l.trunc() as u32);
    (symbol, level)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn number(field: &Option<String>) -> f64 {
    field.as_deref().map_or(0.0, parse_number)
}

impl RawRecipeRow {
    fn into_recipe(self, kind: RecipeKind) -> Option<Recipe> {
        let id = non_empty(&self.id)?.to_string();
        let (output_symbol, level) = split_recipe_id(&id);

        let input2 = non_empty(&self.input2_symbol)
            .map(|symbol| Ingredient::new(symbol, number(&self.input2_amount)));
        let upgrade_cost = non_empty(&self.cost_symbol)
            .map(|symbol| Ingredient::new(symbol, number(&self.cost_amount)));

        Some(Recipe {
            kind,
            output_symbol,
            level,
            duration_sec: self.duration.as_deref().map_or(0.0, parse_duration_hms),
            output_per_craft: number(&self.output),
            input1: Ingredient::new(
                non_empty(&self.input1_symbol).unwrap_or_default(),
                number(&self.input1_amount),
            ),
            input2,
            xp_per_craft: number(&self.xp_per_output),
            upgrade_cost,
            event: non_empty(&self.event).map(str::to_string),
            id,
        })
    }
}

/// Read every recipe from a CSV table. Rows without an ID or that cannot be
/// decoded are skipped; only read failures are errors.
pub fn read_recipes<R: Read>(reader: R, kind: RecipeKind) -> Result<Vec<Recipe>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut recipes = Vec::new();
    for (index, row) in rdr.deserialize::<RawRecipeRow>().enumerate() {
        match row {
            Ok(raw) => match raw.into_recipe(kind) {
                Some(recipe) => recipes.push(recipe),
                None => warn!(row = index + 2, "skipping row without an ID"),
            },
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => warn!(row = index + 2, error = %e, "skipping malformed row"),
        }
    }
    Ok(recipes)
}

pub fn read_recipes_from_path(path: &Path, kind: RecipeKind) -> Result<Vec<Recipe>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_recipes(file, kind)
}

/// Recipe kind implied by a file name: anything mentioning "mine" is a mine table
pub fn kind_for_path(path: &Path) -> RecipeKind {
    let stem = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();
    if stem.contains("mine") {
        RecipeKind::Mine
    } else {
        RecipeKind::Factory
    }
}

/// Find all CSV tables under a directory, or the path itself if it is a file
pub fn find_csv_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    files
}

/// Import every table under `path` into the database.
///
/// All tables are read before anything is written, and the optional clear
/// plus every upsert run in one transaction: a failed import leaves the
/// stored recipes untouched.
pub fn import_to_database(
    conn: &Connection,
    path: &Path,
    kind: Option<RecipeKind>,
    clear: bool,
) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    let files = find_csv_files(path);
    if files.is_empty() {
        bail!("No CSV files found at {}", path.display());
    }
    info!(path = %path.display(), files = files.len(), "importing recipe tables");

    let mut tables = Vec::with_capacity(files.len());
    for file in &files {
        let kind = kind.unwrap_or_else(|| kind_for_path(file));
        let recipes = read_recipes_from_path(file, kind)
            .with_context(|| format!("Failed to load {}", file.display()))?;
        tables.push((file, kind, recipes));
    }

    let tx = conn.unchecked_transaction()?;
    if clear {
        info!("clearing existing recipes");
        db::clear_recipes(&tx)?;
    }
    for (file, kind, recipes) in &tables {
        for recipe in recipes {
            db::upsert_recipe(&tx, recipe)?;
            match kind {
                RecipeKind::Factory => stats.factories += 1,
                RecipeKind::Mine => stats.mines += 1,
            }
        }
        stats.files += 1;
        info!(file = %file.display(), %kind, recipes = recipes.len(), "imported");
    }
    tx.commit()?;

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub factories: usize,
    pub mines: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} recipes from {} files ({} factories, {} mines)",
            self.factories + self.mines,
            self.files,
            self.factories,
            self.mines
        )
    }
}
