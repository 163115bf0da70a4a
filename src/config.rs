//! Game configuration for the price calculator
//!
//! Holds the per-game knobs: how sets are ordered by release, how the
//! game's deck-builder export marks its sections, and the default variant
//! and price tier.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigResult;
use crate::parser::HeaderDialect;
use crate::pricing::PriceTier;
use crate::selection::RecencyOrder;

/// Section header rules as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderDialectConfig {
    /// Regular expression matching section header lines
    pub pattern: String,
    /// Header labels to drop even when the pattern does not match them
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Settings for one game
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricerConfig {
    /// Set names from oldest to newest
    pub recency_order: Option<Vec<String>>,
    pub header_dialect: Option<HeaderDialectConfig>,
    pub prefer_foil: bool,
    pub price_tier: PriceTier,
}

impl PricerConfig {
    /// Built-in profile for Sorcery: Contested Realm
    pub fn sorcery() -> Self {
        let sets = [
            "Alpha",
            "Beta",
            "Dust Reward Promos",
            "Arthurian Legends Promo",
            "Arthurian Legends",
            "Dragonlord",
            "Gothic",
        ];
        let sections = [
            "Avatar",
            "Aura",
            "Artifact",
            "Minion",
            "Magic",
            "Site",
            "Spellbook",
            "Atlas",
            "Collection",
            "Maybeboard",
            "Sideboard",
        ];

        Self {
            recency_order: Some(sets.iter().map(|s| s.to_string()).collect()),
            header_dialect: Some(HeaderDialectConfig {
                pattern: format!(r"(?i)^(?:{})(?:\s*\(\d+\))?$", sections.join("|")),
                ignore: sections.iter().map(|s| s.to_string()).collect(),
            }),
            prefer_foil: false,
            price_tier: PriceTier::Market,
        }
    }

    /// Parses a config from JSON text; missing fields take their defaults
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        log::info!("Loading game config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn recency(&self) -> Option<RecencyOrder> {
        self.recency_order
            .as_ref()
            .map(|sets| RecencyOrder::new(sets.iter().cloned()))
    }

    /// Compiles the header dialect, if one is configured
    pub fn header(&self) -> ConfigResult<Option<HeaderDialect>> {
        self.header_dialect
            .as_ref()
            .map(|config| HeaderDialect::new(&config.pattern, &config.ignore))
            .transpose()
    }
}
