//! Craft World Production Calculator
//!
//! Command-line front end: import recipe tables, manage boost profiles and
//! evaluate recipe profitability.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use craftworld_calculator::account::{self, LevelSource};
use craftworld_calculator::boost;
use craftworld_calculator::calculator::{self, format_duration};
use craftworld_calculator::data;
use craftworld_calculator::db;
use craftworld_calculator::models::{BoostState, ProfileUpdate, RecipeKind};
use craftworld_calculator::prices::PriceTable;

#[derive(Parser)]
#[command(name = "craftcalc")]
#[command(about = "Production profitability calculator for Craft World factories and mines")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "CRAFTCALC_DB", default_value = "craftworld.db")]
    database: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Factory,
    Mine,
}

impl From<KindArg> for RecipeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Factory => RecipeKind::Factory,
            KindArg::Mine => RecipeKind::Mine,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import factory/mine CSV tables (a file, or every .csv under a directory)
    Import {
        path: PathBuf,

        /// Recipe kind; inferred from each file name when omitted
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Clear existing recipes before import
        #[arg(long)]
        clear: bool,
    },

    /// List all recipes in the database
    ListRecipes {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Show details for a specific recipe
    Recipe {
        /// Recipe ID, e.g. "MUD_3"
        id: String,
    },

    /// Print the price table derived from a market payload
    Prices {
        /// Exchange price list JSON, or a flat {"SYMBOL": price} object
        file: PathBuf,
    },

    /// Calculate profitability for a recipe
    Calc {
        /// Recipe ID, e.g. "MUD_3"
        id: String,

        /// Exchange price list JSON, or a flat {"SYMBOL": price} object
        #[arg(short, long)]
        prices: PathBuf,

        /// Apply the levels stored in a saved profile
        #[arg(
            long,
            conflicts_with_all = ["workshop", "mastery", "workshop_percent", "mastery_level"]
        )]
        profile: Option<String>,

        /// Account workshop payload to apply per symbol
        #[arg(long, conflicts_with_all = ["workshop_percent", "mastery_level"])]
        workshop: Option<PathBuf>,

        /// Account proficiency payload to apply per symbol
        #[arg(long, conflicts_with_all = ["workshop_percent", "mastery_level"])]
        mastery: Option<PathBuf>,

        /// Manual workshop boost percent, applied to every recipe
        #[arg(long, default_value = "0")]
        workshop_percent: f64,

        /// Manual mastery level (0-10), applied to every recipe
        #[arg(long, default_value = "0")]
        mastery_level: f64,

        /// Starting stock of the first input
        #[arg(long, default_value = "100")]
        start_input1: f64,

        /// Starting stock of the second input
        #[arg(long, default_value = "100")]
        start_input2: f64,

        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved boost profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Create a profile, or update the given fields of an existing one
    Save {
        name: String,

        /// Workers assigned (0-4)
        #[arg(long)]
        workers: Option<i64>,

        /// Number of factories (1-999999)
        #[arg(long)]
        factories: Option<i64>,

        /// Account workshop payload or flat {"SYMBOL": level} object
        #[arg(long)]
        workshop: Option<PathBuf>,

        /// Account proficiency payload or flat {"SYMBOL": level} object
        #[arg(long)]
        mastery: Option<PathBuf>,
    },

    /// List profiles, most recently updated first
    List,

    /// Show a profile's levels
    Show {
        name: String,

        /// Print the stored profile as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a profile
    Delete { name: String },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { path, kind, clear } => {
            let stats =
                data::import_to_database(&conn, &path, kind.map(RecipeKind::from), clear)?;
            println!("{}", stats);
        }

        Commands::ListRecipes { kind } => {
            let recipes = db::list_recipes(&conn, kind.map(RecipeKind::from))?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' first.");
            } else {
                println!(
                    "{:<16} {:<8} {:>9} {:>8}  {}",
                    "Recipe", "Kind", "Duration", "Output", "Inputs"
                );
                println!("{}", "-".repeat(64));
                for r in recipes {
                    let mut inputs = format!("{} {}", r.input1.amount, r.input1.symbol);
                    if let Some(in2) = &r.input2 {
                        inputs.push_str(&format!(" + {} {}", in2.amount, in2.symbol));
                    }
                    println!(
                        "{:<16} {:<8} {:>9} {:>8}  {}",
                        r.id,
                        r.kind,
                        format_duration(r.duration_sec),
                        r.output_per_craft,
                        inputs
                    );
                }
            }
        }

        Commands::Recipe { id } => {
            let Some(r) = db::get_recipe(&conn, &id)? else {
                bail!("Recipe '{}' not found", id);
            };
            println!("Recipe: {}", r.id);
            println!("  Kind: {}", r.kind);
            println!("  Output: {} {} per craft", r.output_per_craft, r.output_symbol);
            match boost::tier_of(&r.output_symbol) {
                Some(tier) => println!("  Tier: {}", tier),
                None => println!("  Tier: none (no workshop boost)"),
            }
            println!("  Level: {}", r.level);
            println!("  Duration: {} ({}s)", format_duration(r.duration_sec), r.duration_sec);
            println!("  Inputs:");
            println!("    {} {}", r.input1.amount, r.input1.symbol);
            if let Some(in2) = &r.input2 {
                println!("    {} {}", in2.amount, in2.symbol);
            }
            println!("  XP per craft: {}", r.xp_per_craft);
            if let Some(cost) = &r.upgrade_cost {
                println!("  Upgrade cost: {} {}", cost.amount, cost.symbol);
            }
            if let Some(event) = &r.event {
                println!("  Event: {}", event);
            }
        }

        Commands::Prices { file } => {
            let table = PriceTable::from_path(&file)?;
            println!("{:<12} {:>16}", "Symbol", "COIN/unit");
            println!("{}", "-".repeat(29));
            for (symbol, price) in table.iter() {
                println!("{:<12} {:>16.6}", symbol, price);
            }
        }

        Commands::Calc {
            id,
            prices,
            profile,
            workshop,
            mastery,
            workshop_percent,
            mastery_level,
            start_input1,
            start_input2,
            json,
        } => {
            let recipe = db::get_recipe(&conn, &id)?
                .with_context(|| format!("Recipe '{}' not found", id))?;
            let prices = PriceTable::from_path(&prices)?;

            let boost = if let Some(name) = profile {
                db::get_profile(&conn, &name)?
                    .with_context(|| format!("Profile '{}' not found", name))?
                    .boost_state()
            } else if workshop.is_some() || mastery.is_some() {
                let workshop = match workshop {
                    Some(path) => account::levels_from_path(&path, LevelSource::Workshop)?,
                    None => Default::default(),
                };
                let mastery = match mastery {
                    Some(path) => account::levels_from_path(&path, LevelSource::Mastery)?,
                    None => Default::default(),
                };
                BoostState::live(workshop, mastery)
            } else {
                BoostState::manual(workshop_percent, mastery_level)
            };

            let evaluation =
                calculator::evaluate(&recipe, &prices, &boost, start_input1, start_input2);

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                println!("{}", evaluation);
                println!("Price table covers {} symbols.", prices.len());
            }
        }

        Commands::Profile { action } => match action {
            ProfileCommand::Save {
                name,
                workers,
                factories,
                workshop,
                mastery,
            } => {
                let update = ProfileUpdate {
                    name,
                    workshop: workshop
                        .map(|p| account::levels_from_path(&p, LevelSource::Workshop))
                        .transpose()?,
                    mastery: mastery
                        .map(|p| account::levels_from_path(&p, LevelSource::Mastery))
                        .transpose()?,
                    workers,
                    factory_count: factories,
                };
                let saved = db::upsert_profile(&conn, update)?;
                println!(
                    "Saved '{}': {} workers, {} factories, {} workshop and {} mastery levels",
                    saved.name,
                    saved.workers,
                    saved.factory_count,
                    saved.workshop.len(),
                    saved.mastery.len()
                );
            }

            ProfileCommand::List => {
                let profiles = db::list_profiles(&conn)?;
                if profiles.is_empty() {
                    println!("No profiles yet.");
                } else {
                    println!(
                        "{:<24} {:>7} {:>10}  {}",
                        "Profile", "Workers", "Factories", "Updated"
                    );
                    println!("{}", "-".repeat(68));
                    for p in profiles {
                        println!(
                            "{:<24} {:>7} {:>10}  {}",
                            p.name, p.workers, p.factory_count, p.updated_at
                        );
                    }
                }
            }

            ProfileCommand::Show { name, json } => {
                let Some(p) = db::get_profile(&conn, &name)? else {
                    bail!("Profile '{}' not found", name);
                };
                if json {
                    println!("{}", serde_json::to_string_pretty(&p)?);
                    return Ok(());
                }
                println!("Profile: {}", p.name);
                println!("  Workers: {}", p.workers);
                println!("  Factories: {}", p.factory_count);
                println!("  Updated: {}", p.updated_at);
                println!("  Workshop:");
                for (symbol, level) in &p.workshop {
                    println!(
                        "    {:<12} level {:>2}  (+{}% speed)",
                        symbol,
                        level,
                        boost::workshop_percent(symbol, &p.workshop)
                    );
                }
                println!("  Mastery:");
                for (symbol, level) in &p.mastery {
                    println!(
                        "    {:<12} level {:>2}  (x{:.3} input)",
                        symbol,
                        level,
                        boost::mastery_input_multiplier(*level as f64)
                    );
                }
            }

            ProfileCommand::Delete { name } => {
                if db::delete_profile(&conn, &name)? {
                    println!("Deleted profile '{}'", name);
                } else {
                    println!("Profile '{}' not found", name);
                }
            }
        },
    }

    Ok(())
}
