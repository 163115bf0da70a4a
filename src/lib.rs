//! Deck Pricing - trading card deck list price calculator
//!
//! Parses pasted deck lists, finds every set each card was printed in,
//! picks a printing per row and prices the deck at a chosen price tier.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod formatters;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod pricing;
pub mod selection;

// Re-export commonly used items
pub use catalog::{Catalog, ResolvedMatch, SetListing, SetMatch};
pub use config::{HeaderDialectConfig, PricerConfig};
pub use engine::DeckPricer;
pub use error::{CatalogError, ConfigError, EngineError, Result};
pub use formatters::{format_price, format_price_report, write_csv};
pub use models::{CalculationResult, CatalogEntry, DeckLine, RowDetail, RowKind, RowSort};
pub use normalize::normalize_name;
pub use parser::{parse_deck_list, HeaderDialect, MAX_LINE_QUANTITY};
pub use pricing::{FallbackReason, PriceTier};
pub use selection::{RecencyOrder, Selection, SelectionKey};
