//! Price catalog loading and card lookup
//!
//! The catalog is the pricing pipeline's JSON output: an object keyed by set
//! name, each set listing its non-foil and foil printings. It is loaded once
//! and never modified afterwards.

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};
use crate::models::CatalogEntry;
use crate::normalize::normalize_name;

/// Suffix the catalog appends to the names of foil printings
pub const FOIL_SUFFIX: &str = "(Foil)";

/// Printings of one set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetListing {
    pub name: String,
    pub non_foil: Vec<CatalogEntry>,
    pub foil: Vec<CatalogEntry>,
}

impl SetListing {
    pub fn new(name: impl Into<String>, non_foil: Vec<CatalogEntry>, foil: Vec<CatalogEntry>) -> Self {
        let name = name.into();
        let tag = |entries: Vec<CatalogEntry>, is_foil: bool| {
            entries
                .into_iter()
                .map(|mut entry| {
                    entry.set = name.clone();
                    entry.is_foil = is_foil;
                    entry
                })
                .collect::<Vec<_>>()
        };
        let non_foil = tag(non_foil, false);
        let foil = tag(foil, true);
        Self {
            name,
            non_foil,
            foil,
        }
    }
}

/// Set body as stored in the catalog file. Sealed and precon lists are ignored.
///
/// Entries stay undecoded here so one bad printing does not cost the whole set.
#[derive(Debug, Deserialize)]
struct RawSet {
    #[serde(rename = "nonFoil", default)]
    non_foil: Vec<Value>,
    #[serde(default)]
    foil: Vec<Value>,
}

/// Decodes the printings of one catalog array, skipping entries that do not decode
fn decode_entries(set_name: &str, variant: &str, values: Vec<Value>) -> Vec<CatalogEntry> {
    let mut entries = Vec::with_capacity(values.len());
    for (position, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<CatalogEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping {variant} entry {position} of set '{set_name}': {e}"),
        }
    }
    entries
}

/// Printings of one card within one set
#[derive(Debug, Clone, PartialEq)]
pub struct SetMatch {
    pub set: String,
    pub non_foil: Option<CatalogEntry>,
    pub foil: Option<CatalogEntry>,
}

impl SetMatch {
    /// Printing of the requested variant, if this set has it
    pub fn variant(&self, is_foil: bool) -> Option<&CatalogEntry> {
        if is_foil {
            self.foil.as_ref()
        } else {
            self.non_foil.as_ref()
        }
    }

    pub fn has_variant(&self, is_foil: bool) -> bool {
        self.variant(is_foil).is_some()
    }

    pub fn has_both(&self) -> bool {
        self.non_foil.is_some() && self.foil.is_some()
    }
}

/// Every set a card name was found in, in catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub card_name: String,
    pub sets: Vec<SetMatch>,
}

impl ResolvedMatch {
    pub fn set(&self, set: &str) -> Option<&SetMatch> {
        self.sets.iter().find(|candidate| candidate.set == set)
    }

    /// Sets carrying the requested variant, in catalog order
    pub fn sets_with_variant(&self, is_foil: bool) -> impl Iterator<Item = &SetMatch> + '_ {
        self.sets
            .iter()
            .filter(move |candidate| candidate.has_variant(is_foil))
    }

    pub fn has_both_in_any_set(&self) -> bool {
        self.sets.iter().any(SetMatch::has_both)
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|candidate| candidate.set.as_str()).collect()
    }
}

/// Position of a card's first printing per variant within one set
#[derive(Debug, Clone, Copy)]
struct IndexedSet {
    set: usize,
    non_foil: Option<usize>,
    foil: Option<usize>,
}

/// Loaded price catalog with a lookup index by normalized card name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sets: Vec<SetListing>,
    index: HashMap<String, Vec<IndexedSet>>,
}

/// Comparison form of a foil printing's name
fn foil_lookup_name(name: &str) -> String {
    let trimmed = name.trim_end();
    normalize_name(trimmed.strip_suffix(FOIL_SUFFIX).unwrap_or(trimmed))
}

impl Catalog {
    /// Builds a catalog from already decoded sets, keeping their order
    pub fn from_sets(sets: Vec<SetListing>) -> Self {
        let mut index: HashMap<String, Vec<IndexedSet>> = HashMap::new();

        for (set_idx, listing) in sets.iter().enumerate() {
            let names = listing
                .non_foil
                .iter()
                .map(|entry| (normalize_name(&entry.name), false))
                .chain(listing.foil.iter().map(|entry| (foil_lookup_name(&entry.name), true)));
            let mut positions = [0usize; 2];

            for (key, is_foil) in names {
                let position = positions[usize::from(is_foil)];
                positions[usize::from(is_foil)] += 1;

                let hits = index.entry(key).or_default();
                if hits.last().map_or(true, |hit| hit.set != set_idx) {
                    hits.push(IndexedSet {
                        set: set_idx,
                        non_foil: None,
                        foil: None,
                    });
                }
                let Some(slot) = hits.last_mut() else {
                    continue;
                };
                // First printing in the array wins; later duplicates are not indexed
                let variant = if is_foil { &mut slot.foil } else { &mut slot.non_foil };
                if variant.is_none() {
                    *variant = Some(position);
                }
            }
        }

        Self { sets, index }
    }

    /// Parses a catalog from its JSON text
    pub fn from_json_str(content: &str) -> CatalogResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Parses a catalog from a JSON reader
    pub fn from_reader<R: Read>(reader: R) -> CatalogResult<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// Loads a catalog from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        info!("Loading price catalog from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;

        info!(
            "Loaded {} printings across {} sets",
            catalog.len(),
            catalog.set_count()
        );
        Ok(catalog)
    }

    fn from_value(value: Value) -> CatalogResult<Self> {
        let Value::Object(map) = value else {
            return Err(CatalogError::InvalidShape(
                "expected an object keyed by set name".to_string(),
            ));
        };

        let mut sets = Vec::with_capacity(map.len());
        for (set_name, body) in map {
            match serde_json::from_value::<RawSet>(body) {
                Ok(raw) => {
                    let non_foil = decode_entries(&set_name, "nonFoil", raw.non_foil);
                    let foil = decode_entries(&set_name, "foil", raw.foil);
                    sets.push(SetListing::new(set_name, non_foil, foil));
                }
                Err(e) => warn!("Skipping set '{set_name}', could not decode its listings: {e}"),
            }
        }

        Ok(Self::from_sets(sets))
    }

    pub fn sets(&self) -> &[SetListing] {
        &self.sets
    }

    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|listing| listing.name.as_str()).collect()
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Total number of printings
    pub fn len(&self) -> usize {
        self.sets
            .iter()
            .map(|listing| listing.non_foil.len() + listing.foil.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds every set printing `name`.
    ///
    /// Names are compared in normalized form; foil printings are compared
    /// with their "(Foil)" suffix removed. Within one set the first printing
    /// of each variant wins. Returns `None` when no set has the card.
    pub fn find_matches(&self, name: &str) -> Option<ResolvedMatch> {
        let key = normalize_name(name);
        let hits = self.index.get(&key)?;

        let sets: Vec<SetMatch> = hits
            .iter()
            .filter_map(|hit| {
                let listing = self.sets.get(hit.set)?;
                Some(SetMatch {
                    set: listing.name.clone(),
                    non_foil: hit.non_foil.and_then(|i| listing.non_foil.get(i)).cloned(),
                    foil: hit.foil.and_then(|i| listing.foil.get(i)).cloned(),
                })
            })
            .collect();

        if sets.is_empty() {
            return None;
        }

        debug!("Matched '{}' in {} set(s)", name, sets.len());
        Some(ResolvedMatch {
            card_name: name.to_string(),
            sets,
        })
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
