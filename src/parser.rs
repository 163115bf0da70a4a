//! Deck list text parsing.
//!
//! Understands three line dialects:
//! - `2 Card Name` (spaced quantity)
//! - `2x Card Name` (x-suffixed quantity)
//! - deck-builder exports with section headers, where a line is either a
//!   header, `2Card Name` with the quantity glued to the name, or a bare name.
//!
//! Header-dialect input is converted to spaced lines by [`format_header_list`]
//! before it is priced.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::HashMap;

use crate::error::ConfigResult;
use crate::models::DeckLine;

lazy_static! {
    static ref SPACED_QUANTITY: Regex = Regex::new(r"^(\d+)\s+(.+)$").unwrap();
    static ref X_QUANTITY: Regex = Regex::new(r"(?i)^(\d+)\s*x\s+(.+)$").unwrap();
    static ref GLUED_QUANTITY: Regex = Regex::new(r"^(\d+)(\D.*)$").unwrap();
    static ref DIGITS_ONLY: Regex = Regex::new(r"^\d+$").unwrap();
    static ref TRAILING_COUNT: Regex = Regex::new(r"\s*(?:\(\s*\d+\s*\)|\d+)\s*$").unwrap();
}

/// Largest number of copies one deck line may ask for.
///
/// Lines above it are skipped and merged duplicates are clamped to it, which
/// keeps a split line to at most this many rows.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Which dialect a whole input was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Section-headed export that needs the format step
    Header,
    /// One `N Name` or `Nx Name` entry per line
    Quantity,
}

/// Section header rules for one game's deck-builder export
#[derive(Debug, Clone)]
pub struct HeaderDialect {
    pattern: Regex,
    ignore: Vec<String>,
}

impl HeaderDialect {
    pub fn new(pattern: &str, ignore: &[String]) -> ConfigResult<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            ignore: ignore.iter().map(|label| label.trim().to_lowercase()).collect(),
        })
    }

    /// Returns true if the header detection pattern matches this line
    pub fn matches_header(&self, line: &str) -> bool {
        self.pattern.is_match(line.trim())
    }

    /// Returns true if the line is a section marker that must not become a card
    pub fn is_section_marker(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if self.matches_header(trimmed) {
            return true;
        }
        let label = TRAILING_COUNT.replace(trimmed, "").to_lowercase();
        !label.is_empty() && self.ignore.iter().any(|ignored| *ignored == label)
    }
}

/// Decides which dialect `text` is written in
pub fn detect_dialect(text: &str, header: Option<&HeaderDialect>) -> Dialect {
    match header {
        Some(dialect) if text.lines().any(|line| dialect.matches_header(line)) => {
            Dialect::Header
        }
        _ => Dialect::Quantity,
    }
}

fn parse_quantity(digits: &str) -> Option<u32> {
    digits
        .parse::<u32>()
        .ok()
        .filter(|quantity| (1..=MAX_LINE_QUANTITY).contains(quantity))
}

fn entry_from(quantity: &str, name: &str) -> Option<DeckLine> {
    let quantity = parse_quantity(quantity)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(DeckLine::new(quantity, name))
}

/// Parses one line in the spaced or x-suffixed dialect.
///
/// Returns `None` for lines neither dialect understands, including a zero
/// quantity or one above [`MAX_LINE_QUANTITY`].
pub fn parse_line(line: &str) -> Option<DeckLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(caps) = SPACED_QUANTITY.captures(line) {
        return entry_from(&caps[1], &caps[2]);
    }
    if let Some(caps) = X_QUANTITY.captures(line) {
        return entry_from(&caps[1], &caps[2]);
    }

    debug!("Skipping unparseable line: {line}");
    None
}

/// Parses one line of a header-dialect export.
///
/// Section markers and digit-only lines are dropped. A bare name counts as
/// one copy.
pub fn parse_header_line(line: &str, dialect: &HeaderDialect) -> Option<DeckLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if dialect.is_section_marker(line) {
        debug!("Dropping section header: {line}");
        return None;
    }
    if DIGITS_ONLY.is_match(line) {
        debug!("Dropping ambiguous quantity-only line: {line}");
        return None;
    }
    if let Some(caps) = GLUED_QUANTITY.captures(line) {
        return entry_from(&caps[1], &caps[2]);
    }
    Some(DeckLine::new(1, line))
}

/// Adds `line` to `entries`, merging it into an earlier line with the same
/// raw name so the merged line keeps the first occurrence's position.
fn merge_into(entries: &mut Vec<DeckLine>, positions: &mut HashMap<String, usize>, line: DeckLine) {
    match positions.get(&line.card_name) {
        Some(&index) => {
            let merged = entries[index].quantity.saturating_add(line.quantity);
            entries[index].quantity = merged.min(MAX_LINE_QUANTITY);
        }
        None => {
            positions.insert(line.card_name.clone(), entries.len());
            entries.push(line);
        }
    }
}

fn collect_merged<I>(lines: I) -> Vec<DeckLine>
where
    I: IntoIterator<Item = DeckLine>,
{
    let mut entries = Vec::new();
    let mut positions = HashMap::new();
    for line in lines {
        merge_into(&mut entries, &mut positions, line);
    }
    entries
}

/// Parses spaced/x-suffixed text into deduplicated deck lines.
///
/// Unparseable lines are skipped. Duplicate names (compared exactly as typed)
/// are summed into the first occurrence.
pub fn parse_deck_list(text: &str) -> Vec<DeckLine> {
    collect_merged(text.lines().filter_map(parse_line))
}

/// Converts a header-dialect export into deduplicated deck lines
pub fn format_header_list(text: &str, dialect: &HeaderDialect) -> Vec<DeckLine> {
    let entries = collect_merged(
        text.lines()
            .filter_map(|line| parse_header_line(line, dialect)),
    );
    debug!("Formatted header list into {} entries", entries.len());
    entries
}

/// Renders deck lines in the spaced dialect, one per line
pub fn render_deck_lines(lines: &[DeckLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} {}", line.quantity, line.card_name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
