//! Per-row set and variant selection
//!
//! Every priced row has a [`Selection`] saying which set's printing and which
//! variant (foil or non-foil) it is priced from. Selections are seeded by
//! [`default_selection`] the first time a row is resolved and afterwards only
//! change through explicit edits or the split/unsplit transitions.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::catalog::{ResolvedMatch, SetMatch};
use crate::error::{EngineError, Result};

/// Identifies one selectable row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKey {
    /// A whole deck line
    Aggregate(String),
    /// One physical copy of a split deck line, indexed from 0
    Unit(String, usize),
}

impl SelectionKey {
    pub fn aggregate(card_name: impl Into<String>) -> Self {
        SelectionKey::Aggregate(card_name.into())
    }

    pub fn unit(card_name: impl Into<String>, index: usize) -> Self {
        SelectionKey::Unit(card_name.into(), index)
    }

    pub fn card_name(&self) -> &str {
        match self {
            SelectionKey::Aggregate(name) | SelectionKey::Unit(name, _) => name,
        }
    }

    pub fn unit_index(&self) -> Option<usize> {
        match self {
            SelectionKey::Aggregate(_) => None,
            SelectionKey::Unit(_, index) => Some(*index),
        }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionKey::Aggregate(name) => write!(f, "{name}"),
            SelectionKey::Unit(name, index) => write!(f, "{name} #{}", index + 1),
        }
    }
}

/// Set and variant a row is priced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub set: String,
    pub is_foil: bool,
}

impl Selection {
    pub fn new(set: impl Into<String>, is_foil: bool) -> Self {
        Self {
            set: set.into(),
            is_foil,
        }
    }
}

/// Oldest-to-newest ordering of set names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecencyOrder {
    rank: HashMap<String, usize>,
}

impl RecencyOrder {
    pub fn new<I, S>(oldest_to_newest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rank = HashMap::new();
        for (index, set) in oldest_to_newest.into_iter().enumerate() {
            // A set listed twice keeps its newest position
            rank.insert(set.into(), index);
        }
        Self { rank }
    }

    /// Position in the ordering; unknown sets rank below every listed set
    pub fn rank(&self, set: &str) -> Option<usize> {
        self.rank.get(set).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.rank.is_empty()
    }
}

/// Picks the most recent candidate set.
///
/// Without an ordering the first candidate wins. With one, the highest rank
/// wins and ties keep the earlier candidate.
fn most_recent<'a, I>(candidates: I, recency: Option<&RecencyOrder>) -> Option<&'a SetMatch>
where
    I: IntoIterator<Item = &'a SetMatch>,
{
    let mut best: Option<&SetMatch> = None;
    for candidate in candidates {
        best = match (best, recency) {
            (None, _) => Some(candidate),
            (Some(current), Some(order)) if order.rank(&candidate.set) > order.rank(&current.set) => {
                Some(candidate)
            }
            (current, _) => current,
        };
    }
    best
}

/// Default set and variant for a freshly resolved row.
///
/// Takes the most recent set carrying the preferred variant, then the most
/// recent set carrying the other variant. If neither exists the most recent
/// set of any kind is used as foil. Returns `None` only for an empty match.
pub fn default_selection(
    matched: &ResolvedMatch,
    prefer_foil: bool,
    recency: Option<&RecencyOrder>,
) -> Option<Selection> {
    for is_foil in [prefer_foil, !prefer_foil] {
        if let Some(found) = most_recent(matched.sets_with_variant(is_foil), recency) {
            return Some(Selection::new(found.set.clone(), is_foil));
        }
    }

    most_recent(&matched.sets, recency).map(|found| Selection::new(found.set.clone(), true))
}

/// All selections of one pricing session plus the split state of its lines
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    selections: HashMap<SelectionKey, Selection>,
    /// Split lines, with the aggregate selection saved when they were split
    split_lines: HashMap<String, Option<Selection>>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SelectionKey) -> Option<&Selection> {
        self.selections.get(key)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Returns the stored selection for `key`, seeding it on first use.
    ///
    /// A stored selection pointing at a set the card is no longer found in
    /// is replaced by a fresh default.
    pub fn get_or_seed(
        &mut self,
        key: &SelectionKey,
        matched: &ResolvedMatch,
        prefer_foil: bool,
        recency: Option<&RecencyOrder>,
    ) -> Option<Selection> {
        if let Some(existing) = self.selections.get(key) {
            if matched.set(&existing.set).is_some() {
                return Some(existing.clone());
            }
        }

        let seeded = default_selection(matched, prefer_foil, recency)?;
        log::debug!(
            "Seeded {key} with {} ({})",
            seeded.set,
            if seeded.is_foil { "foil" } else { "non-foil" }
        );
        self.selections.insert(key.clone(), seeded.clone());
        Some(seeded)
    }

    /// Moves an existing selection to another set.
    ///
    /// Keeps the current variant when the new set has it, otherwise switches
    /// to the variant the new set does have.
    pub fn select_set(&mut self, key: &SelectionKey, set: &str, matched: &ResolvedMatch) -> Result<&Selection> {
        let target = matched.set(set).ok_or_else(|| EngineError::SetNotAvailable {
            card: key.card_name().to_string(),
            set: set.to_string(),
        })?;
        let selection = self
            .selections
            .get_mut(key)
            .ok_or_else(|| EngineError::UnknownRow(key.clone()))?;

        selection.set = set.to_string();
        if !target.has_variant(selection.is_foil) {
            selection.is_foil = !selection.is_foil;
        }
        Ok(selection)
    }

    /// Switches an existing selection between foil and non-foil
    pub fn select_foil(&mut self, key: &SelectionKey, is_foil: bool, matched: &ResolvedMatch) -> Result<&Selection> {
        let selection = self
            .selections
            .get_mut(key)
            .ok_or_else(|| EngineError::UnknownRow(key.clone()))?;

        let available = matched
            .set(&selection.set)
            .is_some_and(|set| set.has_variant(is_foil));
        if !available {
            return Err(EngineError::VariantUnavailable {
                card: key.card_name().to_string(),
                set: selection.set.clone(),
                variant: if is_foil { "foil" } else { "non-foil" },
            });
        }

        selection.is_foil = is_foil;
        Ok(selection)
    }

    pub fn is_split(&self, card_name: &str) -> bool {
        self.split_lines.contains_key(card_name)
    }

    /// Marks a line as split, saving its aggregate selection the first time
    pub fn split(&mut self, card_name: &str) {
        let aggregate = SelectionKey::aggregate(card_name);
        self.split_lines
            .entry(card_name.to_string())
            .or_insert_with(|| self.selections.get(&aggregate).cloned());
    }

    /// Collapses a split line back to one row.
    ///
    /// Drops every per-copy selection and restores the aggregate selection
    /// saved by [`split`](Self::split).
    pub fn unsplit(&mut self, card_name: &str) -> Result<()> {
        let original = self
            .split_lines
            .remove(card_name)
            .ok_or_else(|| EngineError::NotSplit(card_name.to_string()))?;

        self.selections
            .retain(|key, _| !matches!(key, SelectionKey::Unit(name, _) if name == card_name));

        let aggregate = SelectionKey::aggregate(card_name);
        match original {
            Some(selection) => {
                self.selections.insert(aggregate, selection);
            }
            None => {
                self.selections.remove(&aggregate);
            }
        }
        Ok(())
    }

    /// Forgets every selection and split
    pub fn clear(&mut self) {
        self.selections.clear();
        self.split_lines.clear();
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
