//! Deck list price calculation session
//!
//! [`DeckPricer`] owns the catalog and the per-session state (last input,
//! matched lines, selections and splits) and turns deck list text into a
//! [`CalculationResult`].
//!
//! There are two ways a result gets refreshed:
//! - a full resolve (`calculate`, `split`, `unsplit`) re-parses the input,
//!   re-matches every line, seeds missing selections and prices every row;
//! - a reprice (`recompute`, `set_price_tier`, `select_set`, `select_foil`)
//!   keeps the matched lines and only re-derives prices and flags.

use log::{debug, error, info};

use crate::catalog::{Catalog, ResolvedMatch};
use crate::config::PricerConfig;
use crate::error::{ConfigResult, EngineError, Result};
use crate::models::{CalculationResult, DeckLine, RowDetail, RowKind};
use crate::parser::{self, Dialect, HeaderDialect};
use crate::pricing::{resolve_price, PriceTier, ResolvedPrice};
use crate::selection::{RecencyOrder, Selection, SelectionKey, SelectionStore};

/// A deck line together with every set its card was found in
#[derive(Debug, Clone)]
struct MatchedLine {
    line: DeckLine,
    matched: ResolvedMatch,
}

impl MatchedLine {
    fn card_name(&self) -> &str {
        &self.line.card_name
    }

    /// Row keys this line currently expands to
    fn keys(&self, split: bool) -> Vec<(SelectionKey, RowKind, u32)> {
        if split {
            (0..self.line.quantity as usize)
                .map(|index| {
                    (
                        SelectionKey::unit(self.card_name(), index),
                        RowKind::SplitUnit(index),
                        1,
                    )
                })
                .collect()
        } else {
            vec![(
                SelectionKey::aggregate(self.card_name()),
                RowKind::Aggregated,
                self.line.quantity,
            )]
        }
    }
}

/// Prices one row from its selection
fn price_row(
    line: &MatchedLine,
    kind: RowKind,
    quantity: u32,
    selection: &Selection,
    tier: PriceTier,
) -> Result<RowDetail> {
    let set_match = line.matched.set(&selection.set).ok_or_else(|| {
        EngineError::Internal(format!(
            "selection for {} points at set {} which has no printing",
            line.card_name(),
            selection.set
        ))
    })?;

    // Only a card with no printing of either variant has no entry here
    let entry = set_match.variant(selection.is_foil);
    let price = entry.map(|entry| resolve_price(entry, tier)).unwrap_or(ResolvedPrice {
        unit_price: 0.0,
        fallback: None,
    });

    Ok(RowDetail {
        card_name: line.card_name().to_string(),
        quantity,
        unit_price: price.unit_price,
        line_total: price.unit_price * f64::from(quantity),
        selected_set: selection.set.clone(),
        is_foil: selection.is_foil,
        product_id: entry.and_then(|entry| entry.product_id),
        has_non_foil: set_match.non_foil.is_some(),
        has_foil: set_match.foil.is_some(),
        has_both_in_any_set: line.matched.has_both_in_any_set(),
        fallback: price.fallback,
        kind,
    })
}

/// Prices every row of `lines` from existing selections, in line order
fn price_rows(lines: &[MatchedLine], selections: &SelectionStore, tier: PriceTier) -> Result<Vec<RowDetail>> {
    let mut rows = Vec::with_capacity(lines.len());
    for line in lines {
        for (key, kind, quantity) in line.keys(selections.is_split(line.card_name())) {
            let selection = selections
                .get(&key)
                .ok_or_else(|| EngineError::Internal(format!("no selection stored for {key}")))?;
            rows.push(price_row(line, kind, quantity, selection, tier)?);
        }
    }
    Ok(rows)
}

/// Deck list price calculator with its session state
#[derive(Debug)]
pub struct DeckPricer {
    catalog: Catalog,
    recency: Option<RecencyOrder>,
    header: Option<HeaderDialect>,
    prefer_foil: bool,
    price_tier: PriceTier,
    selections: SelectionStore,
    input: Option<String>,
    lines: Vec<MatchedLine>,
    result: Option<CalculationResult>,
}

impl DeckPricer {
    /// Creates a session over `catalog` using the game settings in `config`
    pub fn new(catalog: Catalog, config: &PricerConfig) -> ConfigResult<Self> {
        Ok(Self {
            catalog,
            recency: config.recency(),
            header: config.header()?,
            prefer_foil: config.prefer_foil,
            price_tier: config.price_tier,
            selections: SelectionStore::new(),
            input: None,
            lines: Vec::new(),
            result: None,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn price_tier(&self) -> PriceTier {
        self.price_tier
    }

    pub fn prefer_foil(&self) -> bool {
        self.prefer_foil
    }

    /// Latest successful result
    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    pub fn selection(&self, key: &SelectionKey) -> Option<&Selection> {
        self.selections.get(key)
    }

    pub fn is_split(&self, card_name: &str) -> bool {
        self.selections.is_split(card_name)
    }

    /// Returns true if `text` is a header-dialect export that must be
    /// passed through [`format_input`](Self::format_input) first
    pub fn needs_formatting(&self, text: &str) -> bool {
        parser::detect_dialect(text, self.header.as_ref()) == Dialect::Header
    }

    /// Rewrites deck list text as one `N Name` line per card.
    ///
    /// Header-dialect exports are converted; other input is re-rendered with
    /// unparseable lines removed. Duplicate names are merged either way.
    pub fn format_input(&self, text: &str) -> String {
        let lines = match self.header.as_ref() {
            Some(header) if self.needs_formatting(text) => parser::format_header_list(text, header),
            _ => parser::parse_deck_list(text),
        };
        parser::render_deck_lines(&lines)
    }

    /// Prices a deck list from scratch
    pub fn calculate(&mut self, text: &str) -> Result<&CalculationResult> {
        if self.needs_formatting(text) {
            return Err(EngineError::UnformattedInput);
        }
        self.resolve(text.to_string(), self.selections.clone())
    }

    /// Re-derives prices for the current rows without re-parsing
    pub fn recompute(&mut self) -> Result<&CalculationResult> {
        let result = self.reprice(&self.selections)?;
        Ok(&*self.result.insert(result))
    }

    /// Switches the price tier and reprices.
    ///
    /// The tier is kept even when nothing has been calculated yet, in which
    /// case `NoCalculation` is returned.
    pub fn set_price_tier(&mut self, tier: PriceTier) -> Result<&CalculationResult> {
        debug!("Price tier set to {tier}");
        self.price_tier = tier;
        self.recompute()
    }

    /// Changes the variant preference for rows seeded from now on
    pub fn set_prefer_foil(&mut self, prefer_foil: bool) {
        self.prefer_foil = prefer_foil;
    }

    /// Moves a row to another set and reprices
    pub fn select_set(&mut self, key: &SelectionKey, set: &str) -> Result<&CalculationResult> {
        let line = self.row_line(key)?;
        let mut selections = self.selections.clone();
        selections.select_set(key, set, &self.lines[line].matched)?;
        self.commit_reprice(selections)
    }

    /// Switches a row between foil and non-foil and reprices
    pub fn select_foil(&mut self, key: &SelectionKey, is_foil: bool) -> Result<&CalculationResult> {
        let line = self.row_line(key)?;
        let mut selections = self.selections.clone();
        selections.select_foil(key, is_foil, &self.lines[line].matched)?;
        self.commit_reprice(selections)
    }

    /// Expands a deck line into one independently selectable row per copy
    pub fn split(&mut self, card_name: &str) -> Result<&CalculationResult> {
        self.line_index(card_name)
            .ok_or_else(|| EngineError::UnknownCard(card_name.to_string()))?;
        let input = self.input.clone().ok_or(EngineError::NoCalculation)?;

        info!("Splitting {card_name}");
        let mut selections = self.selections.clone();
        selections.split(card_name);
        self.resolve(input, selections)
    }

    /// Collapses a split line back into one row with its original selection
    pub fn unsplit(&mut self, card_name: &str) -> Result<&CalculationResult> {
        let input = self.input.clone().ok_or(EngineError::NoCalculation)?;

        info!("Unsplitting {card_name}");
        let mut selections = self.selections.clone();
        selections.unsplit(card_name)?;
        self.resolve(input, selections)
    }

    /// Drops the input, result, selections and splits
    pub fn clear(&mut self) {
        self.selections.clear();
        self.input = None;
        self.lines.clear();
        self.result = None;
    }

    fn line_index(&self, card_name: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.card_name() == card_name)
    }

    /// Index of the line that currently produces the row keyed by `key`
    fn row_line(&self, key: &SelectionKey) -> Result<usize> {
        if self.result.is_none() {
            return Err(EngineError::NoCalculation);
        }
        let unknown = || EngineError::UnknownRow(key.clone());
        let index = self.line_index(key.card_name()).ok_or_else(unknown)?;
        let split = self.selections.is_split(key.card_name());

        let exists = match key {
            SelectionKey::Aggregate(_) => !split,
            SelectionKey::Unit(_, unit) => split && *unit < self.lines[index].line.quantity as usize,
        };
        if exists {
            Ok(index)
        } else {
            Err(unknown())
        }
    }

    /// Prices the current lines from `selections` without touching the session
    fn reprice(&self, selections: &SelectionStore) -> Result<CalculationResult> {
        if self.result.is_none() {
            return Err(EngineError::NoCalculation);
        }
        let rows = price_rows(&self.lines, selections, self.price_tier)
            .inspect_err(|e| error!("Recompute aborted: {e}"))?;
        let not_found = self
            .result
            .as_ref()
            .map(|result| result.not_found_names.clone())
            .unwrap_or_default();
        Ok(CalculationResult::from_rows(rows, not_found))
    }

    /// Reprices from edited selections and keeps them only if that succeeds
    fn commit_reprice(&mut self, selections: SelectionStore) -> Result<&CalculationResult> {
        let result = self.reprice(&selections)?;
        self.selections = selections;
        Ok(&*self.result.insert(result))
    }

    /// Full pass: parse, match, seed and price.
    ///
    /// Seeds into the given copy of the selections and only commits it when
    /// every row priced, so a failed pass leaves the previous state in place.
    fn resolve(&mut self, input: String, mut selections: SelectionStore) -> Result<&CalculationResult> {
        let deck = parser::parse_deck_list(&input);
        let mut lines = Vec::with_capacity(deck.len());
        let mut not_found = Vec::new();

        for line in deck {
            match self.catalog.find_matches(&line.card_name) {
                Some(matched) => lines.push(MatchedLine { line, matched }),
                None => {
                    debug!("No catalog match for {}", line.card_name);
                    not_found.push(line.card_name);
                }
            }
        }

        for line in &lines {
            for (key, _, _) in line.keys(selections.is_split(line.card_name())) {
                selections.get_or_seed(&key, &line.matched, self.prefer_foil, self.recency.as_ref());
            }
        }

        let rows = price_rows(&lines, &selections, self.price_tier)
            .inspect_err(|e| error!("Calculation aborted: {e}"))?;
        let result = CalculationResult::from_rows(rows, not_found);
        info!(
            "Priced {} card(s) in {} row(s) at {} tier: {:.2} total, {} not found",
            result.total_cards,
            result.rows.len(),
            self.price_tier,
            result.total_price,
            result.not_found_names.len()
        );

        self.selections = selections;
        self.lines = lines;
        self.input = Some(input);
        Ok(&*self.result.insert(result))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
