//! Live boost levels from account payloads
//!
//! Accepts the workshop and proficiency query responses (wrapped in `data`
//! or bare), or a flat `{ "SYMBOL": level }` object. Symbols are upper-cased
//! and unreadable levels become 0. Entries without a usable symbol are
//! skipped; an error envelope is reported rather than read as levels.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DataError;
use crate::prices::value_as_f64;

// Keys that mark a query response rather than a flat level map
const ENVELOPE_KEYS: [&str; 3] = ["data", "account", "errors"];

#[derive(Debug, Deserialize)]
struct WorkshopEntry {
    #[serde(default)]
    symbol: Value,
    #[serde(default)]
    level: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProficiencyEntry {
    #[serde(default)]
    symbol: Value,
    #[serde(default)]
    collected_amount: Value,
    #[serde(default)]
    claimed_level: Value,
}

#[derive(Debug, Default, Deserialize)]
struct Account {
    #[serde(default)]
    workshop: Option<Vec<WorkshopEntry>>,
    #[serde(default)]
    proficiencies: Option<Vec<ProficiencyEntry>>,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    #[serde(default)]
    account: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct QueryError {
    #[serde(default)]
    message: Value,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    #[serde(default)]
    data: Option<AccountData>,
    #[serde(default)]
    account: Option<Account>,
    #[serde(default)]
    errors: Option<Vec<QueryError>>,
}

/// Which level list to read from an account payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    Workshop,
    Mastery,
}

impl LevelSource {
    fn label(self) -> &'static str {
        match self {
            LevelSource::Workshop => "workshop",
            LevelSource::Mastery => "proficiency",
        }
    }
}

/// Whole level from a loosely typed JSON value, 0 when unreadable
fn level_from_value(value: &Value) -> i64 {
    value_as_f64(value)
        .filter(|l| l.is_finite())
        .map_or(0, |l| l.trunc() as i64)
}

fn insert_level(levels: &mut BTreeMap<String, i64>, symbol: &Value, level: i64) {
    let Some(symbol) = symbol.as_str().map(|s| s.trim().to_uppercase()) else {
        debug!(%symbol, "skipping entry without a symbol");
        return;
    };
    if symbol.is_empty() {
        return;
    }
    levels.insert(symbol, level);
}

fn error_messages(errors: &[QueryError]) -> String {
    errors
        .iter()
        .map(|e| match &e.message {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse a level map of the given kind from a JSON payload
pub fn levels_from_json_str(
    json: &str,
    source: LevelSource,
) -> Result<BTreeMap<String, i64>, DataError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(map) = &value else {
        return Err(DataError::Payload {
            what: "account",
            reason: "expected a JSON object".to_string(),
        });
    };

    let mut levels = BTreeMap::new();

    if !ENVELOPE_KEYS.iter().any(|k| map.contains_key(*k)) {
        for (symbol, level) in map {
            insert_level(&mut levels, &Value::from(symbol.as_str()), level_from_value(level));
        }
        return Ok(levels);
    }

    let envelope: AccountEnvelope = serde_json::from_value(value)?;
    if let Some(errors) = envelope.errors.as_deref().filter(|e| !e.is_empty()) {
        return Err(DataError::Upstream(error_messages(errors)));
    }

    let account = match (envelope.data, envelope.account) {
        (Some(data), _) => data.account,
        (None, Some(account)) => Some(account),
        (None, None) => {
            return Err(DataError::Payload {
                what: "account",
                reason: "response carries no data".to_string(),
            });
        }
    };

    let Some(account) = account else {
        warn!(source = source.label(), "account payload has no account data");
        return Ok(levels);
    };

    match source {
        LevelSource::Workshop => {
            for entry in account.workshop.iter().flatten() {
                insert_level(&mut levels, &entry.symbol, level_from_value(&entry.level));
            }
        }
        LevelSource::Mastery => {
            for entry in account.proficiencies.iter().flatten() {
                debug!(symbol = %entry.symbol, collected = %entry.collected_amount, "proficiency");
                insert_level(&mut levels, &entry.symbol, level_from_value(&entry.claimed_level));
            }
        }
    }

    debug!(source = source.label(), count = levels.len(), "parsed account levels");
    Ok(levels)
}

pub fn levels_from_path(
    path: &Path,
    source: LevelSource,
) -> Result<BTreeMap<String, i64>, DataError> {
    let json = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    levels_from_json_str(&json, source)
}
