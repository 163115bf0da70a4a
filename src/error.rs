//! Error types for deck_pricing
//!
//! Expected outcomes of a calculation (unparseable lines, unknown cards,
//! missing prices) are reported as data in the result, not through these types.

use thiserror::Error;

use crate::selection::SelectionKey;

/// Errors raised while loading a price catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Catalog is not valid JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Top level of the catalog is not a set-name keyed object
    #[error("Invalid catalog: {0}")]
    InvalidShape(String),
}

/// Errors raised while loading or compiling a game configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Header detection pattern is not a valid regular expression
    #[error("Invalid header pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Errors returned by [`crate::engine::DeckPricer`] commands
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Input uses the header dialect and has to go through the format step first
    #[error("Deck list contains section headers, format it before calculating")]
    UnformattedInput,
    /// A command that edits rows was issued before any calculation
    #[error("No deck list has been calculated yet")]
    NoCalculation,
    /// No row is keyed by this selection key
    #[error("Unknown row: {0}")]
    UnknownRow(SelectionKey),
    /// Card is not part of the current deck list
    #[error("Card not in deck list: {0}")]
    UnknownCard(String),
    /// Card has no printing in the requested set
    #[error("{card} is not available in set {set}")]
    SetNotAvailable { card: String, set: String },
    /// Requested foil/non-foil variant does not exist in the selected set
    #[error("{card} has no {variant} printing in set {set}")]
    VariantUnavailable {
        card: String,
        set: String,
        variant: &'static str,
    },
    /// Unsplit was requested for a line that is not split
    #[error("Card is not split: {0}")]
    NotSplit(String),
    /// Unexpected inconsistency; the pass was aborted and the prior result kept
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for catalog loading
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Result alias for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for engine commands
pub type Result<T> = std::result::Result<T, EngineError>;
