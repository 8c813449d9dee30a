//! Price table construction from market data
//!
//! Prices are expressed in COIN per unit. COIN itself is always worth 1 and
//! symbols missing from the table price at 0.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DataError;

/// The commodity every price is expressed in
pub const REFERENCE_SYMBOL: &str = "COIN";

/// Symbol to COIN-per-unit mapping
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    prices: BTreeMap<String, f64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::from_pairs(std::iter::empty::<(&str, f64)>())
    }
}

/// One quote from the exchange price list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePrice {
    #[serde(default)]
    pub reference_symbol: Option<String>,
    #[serde(default)]
    pub amount: Value,
}

/// Exchange price list as returned by the game's market query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePriceList {
    pub base_symbol: String,
    #[serde(default)]
    pub prices: Vec<ExchangePrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceListData {
    exchange_price_list: Option<ExchangePriceList>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PricePayload {
    Wrapped { data: PriceListData },
    Bare {
        #[serde(rename = "exchangePriceList")]
        exchange_price_list: ExchangePriceList,
    },
    Flat(BTreeMap<String, f64>),
}

/// Read a number that may arrive as a JSON number or a numeric string
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

impl PriceTable {
    /// Build a table from explicit prices. COIN is pinned to 1.
    pub fn from_pairs<S: AsRef<str>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        let mut prices: BTreeMap<String, f64> = pairs
            .into_iter()
            .map(|(symbol, price)| (symbol.as_ref().trim().to_uppercase(), price))
            .collect();
        prices.insert(REFERENCE_SYMBOL.to_string(), 1.0);
        Self { prices }
    }

    /// Derive a table from an exchange price list.
    ///
    /// When the base is COIN every quote is "COIN per reference unit" and is
    /// inverted. Otherwise only the quote against COIN prices the base.
    pub fn from_exchange_list(list: &ExchangePriceList) -> Self {
        let base = list.base_symbol.trim().to_uppercase();
        let mut prices = BTreeMap::new();

        for quote in &list.prices {
            let reference = quote
                .reference_symbol
                .as_deref()
                .map(|r| r.trim().to_uppercase())
                .unwrap_or_default();
            let amount = value_as_f64(&quote.amount).filter(|a| a.is_finite() && *a > 0.0);
            let Some(amount) = amount.filter(|_| !reference.is_empty()) else {
                debug!(reference = %reference, amount = %quote.amount, "skipping unusable quote");
                continue;
            };

            if base == REFERENCE_SYMBOL {
                prices.insert(reference, 1.0 / amount);
            } else if reference == REFERENCE_SYMBOL {
                prices.insert(base.clone(), amount);
            }
        }

        Self::from_pairs(prices)
    }

    /// Parse a price payload: a wrapped or bare exchange price list, or a
    /// flat `{ "SYMBOL": price }` object
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let payload: PricePayload = serde_json::from_str(json)?;
        let list = match payload {
            PricePayload::Wrapped { data } => data.exchange_price_list,
            PricePayload::Bare {
                exchange_price_list,
            } => Some(exchange_price_list),
            PricePayload::Flat(prices) => {
                return Ok(Self::from_pairs(
                    prices.into_iter().filter(|(_, p)| p.is_finite()),
                ));
            }
        };

        match list {
            Some(list) => Ok(Self::from_exchange_list(&list)),
            None => {
                warn!("price payload has no exchange price list; only COIN is priced");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let json = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// COIN per unit of `symbol`, 0 when unknown
    pub fn price(&self, symbol: &str) -> f64 {
        self.prices
            .get(&symbol.trim().to_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.prices.iter().map(|(s, p)| (s.as_str(), *p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_base_inverts_quotes() {
        let table = PriceTable::from_json_str(
            r#"{"data":{"exchangePriceList":{"baseSymbol":"COIN","prices":[
                {"referenceSymbol":"MUD","amount":4,"recommendation":null},
                {"referenceSymbol":"SAND","amount":"0.5"}
            ]}}}"#,
        )
        .unwrap();
        assert_eq!(table.price("MUD"), 0.25);
        assert_eq!(table.price("SAND"), 2.0);
        assert_eq!(table.price("COIN"), 1.0);
    }

    #[test]
    fn non_coin_base_prices_only_itself() {
        let table = PriceTable::from_json_str(
            r#"{"exchangePriceList":{"baseSymbol":"MUD","prices":[
                {"referenceSymbol":"COIN","amount":0.3},
                {"referenceSymbol":"SAND","amount":9}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(table.price("MUD"), 0.3);
        assert_eq!(table.price("SAND"), 0.0);
    }

    #[test]
    fn unusable_amounts_are_skipped() {
        let table = PriceTable::from_json_str(
            r#"{"exchangePriceList":{"baseSymbol":"COIN","prices":[
                {"referenceSymbol":"MUD","amount":0},
                {"referenceSymbol":"CLAY","amount":-2},
                {"referenceSymbol":"SAND","amount":null},
                {"referenceSymbol":"GLASS","amount":"n/a"},
                {"referenceSymbol":"","amount":5}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.price("COIN"), 1.0);
    }

    #[test]
    fn quote_without_reference_is_skipped() {
        let table = PriceTable::from_json_str(
            r#"{"data":{"exchangePriceList":{"baseSymbol":"COIN","prices":[
                {"referenceSymbol":"MUD","amount":4},
                {"referenceSymbol":null,"amount":2},
                {"amount":8}
            ]}}}"#,
        )
        .unwrap();
        assert_eq!(table.price("MUD"), 0.25);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn coin_stays_pinned_to_one() {
        let table = PriceTable::from_json_str(
            r#"{"exchangePriceList":{"baseSymbol":"COIN","prices":[
                {"referenceSymbol":"COIN","amount":3}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(table.price("COIN"), 1.0);

        let flat = PriceTable::from_pairs([("COIN", 7.0)]);
        assert_eq!(flat.price("COIN"), 1.0);
    }

    #[test]
    fn flat_map_is_accepted() {
        let table = PriceTable::from_json_str(r#"{"wood": 2, "MUD": 1}"#).unwrap();
        assert_eq!(table.price("WOOD"), 2.0);
        assert_eq!(table.price("mud"), 1.0);
    }

    #[test]
    fn missing_list_yields_coin_only() {
        let table = PriceTable::from_json_str(r#"{"data":{"exchangePriceList":null}}"#).unwrap();
        assert_eq!(table, PriceTable::default());
        assert_eq!(table.price("MUD"), 0.0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(PriceTable::from_json_str("[1, 2, 3]").is_err());
        assert!(PriceTable::from_json_str("not json").is_err());
    }
}
