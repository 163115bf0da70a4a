use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

use crate::pricing::FallbackReason;
use crate::selection::SelectionKey;

/// One physical printing of a card as listed in the price catalog
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    /// Filled in from the catalog's set key when loading
    #[serde(rename = "set_name", default)]
    pub set: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(
        rename = "tcgplayerProductId",
        alias = "productId",
        default,
        deserialize_with = "deserialize_product_id"
    )]
    pub product_id: Option<u64>,
    #[serde(rename = "tcgplayerLowPrice", default, deserialize_with = "deserialize_price")]
    pub low: Option<String>,
    #[serde(rename = "tcgplayerMidPrice", default, deserialize_with = "deserialize_price")]
    pub mid: Option<String>,
    #[serde(rename = "tcgplayerHighPrice", default, deserialize_with = "deserialize_price")]
    pub high: Option<String>,
    #[serde(rename = "tcgplayerMarketPrice", default, deserialize_with = "deserialize_price")]
    pub market: Option<String>,
    /// Filled in from the catalog array the entry was listed in
    #[serde(skip_deserializing, default)]
    pub is_foil: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(f64),
}

/// Accepts prices written either as decimal strings or as JSON numbers
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    Ok(raw.map(|price| match price {
        RawPrice::Text(text) => text,
        RawPrice::Number(value) => value.to_string(),
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Number(u64),
    Text(String),
}

/// Accepts product ids written as numbers or numeric strings
fn deserialize_product_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawProductId>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawProductId::Number(id)) => Ok(Some(id)),
        Some(RawProductId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawProductId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid product id '{text}'"))),
    }
}

/// A parsed deck list line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLine {
    pub quantity: u32,
    /// Card name as typed, used both for display and as the merge key
    pub card_name: String,
}

impl DeckLine {
    pub fn new(quantity: u32, card_name: impl Into<String>) -> Self {
        Self {
            quantity,
            card_name: card_name.into(),
        }
    }
}

/// Whether a row stands for a whole deck line or one copy of a split line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum RowKind {
    Aggregated,
    SplitUnit(usize),
}

/// One output row of a calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDetail {
    pub card_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    pub selected_set: String,
    pub is_foil: bool,
    pub product_id: Option<u64>,
    /// Selected set has a non-foil printing
    pub has_non_foil: bool,
    /// Selected set has a foil printing
    pub has_foil: bool,
    /// Some set carries both a foil and a non-foil printing
    pub has_both_in_any_set: bool,
    pub fallback: Option<FallbackReason>,
    pub kind: RowKind,
}

impl RowDetail {
    /// Key under which this row's selection is stored
    pub fn key(&self) -> SelectionKey {
        match self.kind {
            RowKind::Aggregated => SelectionKey::aggregate(&self.card_name),
            RowKind::SplitUnit(index) => SelectionKey::unit(&self.card_name, index),
        }
    }

    pub fn using_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn is_split(&self) -> bool {
        matches!(self.kind, RowKind::SplitUnit(_))
    }

    pub fn split_index(&self) -> Option<usize> {
        match self.kind {
            RowKind::SplitUnit(index) => Some(index),
            RowKind::Aggregated => None,
        }
    }
}

/// Caller-side orderings for presenting rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSort {
    Name,
    /// Most expensive line first
    LineTotal,
    Set,
}

/// Totals and rows for one deck list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalculationResult {
    pub total_price: f64,
    pub total_cards: u64,
    pub rows: Vec<RowDetail>,
    pub not_found_names: Vec<String>,
}

impl CalculationResult {
    /// Builds a result from rows, deriving the totals
    pub fn from_rows(rows: Vec<RowDetail>, not_found_names: Vec<String>) -> Self {
        let total_price = rows.iter().map(|row| row.line_total).sum();
        let total_cards = rows.iter().map(|row| u64::from(row.quantity)).sum();
        Self {
            total_price,
            total_cards,
            rows,
            not_found_names,
        }
    }

    /// Single message listing every card that had no catalog match
    pub fn not_found_message(&self) -> Option<String> {
        if self.not_found_names.is_empty() {
            return None;
        }
        Some(format!(
            "Could not find {} card(s): {}",
            self.not_found_names.len(),
            self.not_found_names.join(", ")
        ))
    }

    /// Returns a copy with rows reordered; ties keep their original order
    pub fn sorted_by(&self, sort: RowSort) -> Self {
        let mut sorted = self.clone();
        match sort {
            RowSort::Name => sorted
                .rows
                .sort_by(|a, b| a.card_name.to_lowercase().cmp(&b.card_name.to_lowercase())),
            RowSort::LineTotal => sorted.rows.sort_by(|a, b| {
                b.line_total
                    .partial_cmp(&a.line_total)
                    .unwrap_or(Ordering::Equal)
            }),
            RowSort::Set => sorted.rows.sort_by(|a, b| a.selected_set.cmp(&b.selected_set)),
        }
        sorted
    }
}
