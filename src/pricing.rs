//! Price tier resolution
//!
//! Picks the unit price for a catalog entry at the requested tier and falls
//! back to the low price when the tier is not tracked for that printing.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::CatalogEntry;

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
}

/// Catalog price column a calculation is based on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Low,
    Mid,
    High,
    #[default]
    Market,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Low => "low",
            PriceTier::Mid => "mid",
            PriceTier::High => "high",
            PriceTier::Market => "market",
        }
    }

    pub fn all() -> &'static [PriceTier] {
        &[
            PriceTier::Low,
            PriceTier::Mid,
            PriceTier::High,
            PriceTier::Market,
        ]
    }

    /// Raw catalog value for this tier
    pub fn field<'a>(&self, entry: &'a CatalogEntry) -> Option<&'a str> {
        match self {
            PriceTier::Low => entry.low.as_deref(),
            PriceTier::Mid => entry.mid.as_deref(),
            PriceTier::High => entry.high.as_deref(),
            PriceTier::Market => entry.market.as_deref(),
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(PriceTier::Low),
            "mid" => Ok(PriceTier::Mid),
            "high" => Ok(PriceTier::High),
            "market" => Ok(PriceTier::Market),
            other => Err(format!(
                "unknown price tier '{other}' (expected low, mid, high or market)"
            )),
        }
    }
}

/// Why a row is priced from the low column instead of the requested tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MarketUntracked,
    MidUnavailable,
    HighUnavailable,
}

impl FallbackReason {
    pub fn message(&self) -> &'static str {
        match self {
            FallbackReason::MarketUntracked => "market price not tracked, using low price",
            FallbackReason::MidUnavailable => "mid price unavailable, using low price",
            FallbackReason::HighUnavailable => "high price unavailable, using low price",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Unit price picked for one printing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPrice {
    pub unit_price: f64,
    pub fallback: Option<FallbackReason>,
}

/// Parses the leading decimal number of a price string.
///
/// Leading whitespace is skipped and anything after the number is ignored.
/// Input without a leading number yields NaN.
pub fn parse_price(raw: &str) -> f64 {
    LEADING_NUMBER
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Numeric value of an optional price field, with unknown prices as 0
pub fn price_value(raw: Option<&str>) -> f64 {
    let value = raw.map(parse_price).unwrap_or(f64::NAN);
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn market_untracked(raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") | Some("0") | Some("0.00") => true,
        Some(value) => {
            let parsed = parse_price(value);
            parsed.is_nan() || parsed == 0.0
        }
    }
}

fn tier_unavailable(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => {
            let parsed = parse_price(value);
            parsed.is_nan() || parsed == 0.0
        }
    }
}

/// Resolves the unit price of `entry` at `tier`.
///
/// Market, mid and high fall back to the low price when untracked. A zero
/// or unreadable low price is a legitimate "unknown" and is returned as 0
/// without a fallback flag.
pub fn resolve_price(entry: &CatalogEntry, tier: PriceTier) -> ResolvedPrice {
    let requested = tier.field(entry);
    let fallback = match tier {
        PriceTier::Market if market_untracked(requested) => Some(FallbackReason::MarketUntracked),
        PriceTier::Mid if tier_unavailable(requested) => Some(FallbackReason::MidUnavailable),
        PriceTier::High if tier_unavailable(requested) => Some(FallbackReason::HighUnavailable),
        _ => None,
    };

    let field = match fallback {
        Some(reason) => {
            debug!(
                "{} ({}): {}",
                entry.name,
                entry.set,
                reason.message()
            );
            entry.low.as_deref()
        }
        None => requested,
    };

    ResolvedPrice {
        unit_price: price_value(field),
        fallback,
    }
}

#[cfg(test)]
#[path = "pricing_tests.rs"]
mod tests;
