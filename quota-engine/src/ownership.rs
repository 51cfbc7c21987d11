//! Ownership scanning
//!
//! The owned-shiny set is a point-in-time snapshot of storage plus roster. It
//! is always rebuilt from scratch: deposits, withdrawals, and releases move
//! individuals between the two sources at any time, so patching it
//! incrementally drifts from the truth.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::runtime::{CollectionSource, Individual, SlotRead};
use crate::species::{SpeciesId, SpeciesKind, SpeciesTable};

/// Species currently held in shiny form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnedShinySet {
    #[serde(default)]
    species: BTreeSet<SpeciesId>,
    /// Individuals held per species.
    #[serde(default)]
    counts: BTreeMap<SpeciesId, u32>,
    #[serde(default)]
    scanned_at: Option<DateTime<Utc>>,
    /// Slots skipped during the scan that produced this snapshot.
    #[serde(default)]
    skipped_slots: u32,
}

impl OwnedShinySet {
    #[must_use]
    pub fn contains(&self, species: &SpeciesId) -> bool {
        self.species.contains(species)
    }

    #[must_use]
    pub const fn species(&self) -> &BTreeSet<SpeciesId> {
        &self.species
    }

    #[must_use]
    pub fn count(&self, species: &SpeciesId) -> u32 {
        self.counts.get(species).copied().unwrap_or(0)
    }

    /// Total shiny individuals across all species.
    #[must_use]
    pub fn individuals(&self) -> u32 {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    #[must_use]
    pub const fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.scanned_at
    }

    #[must_use]
    pub const fn skipped_slots(&self) -> u32 {
        self.skipped_slots
    }

    fn add(&mut self, table: &SpeciesTable, individual: &Individual) {
        let id = table.identify(&individual.species, individual.form.as_deref());
        // A specific form also counts as the species itself.
        if let SpeciesKind::Form { base, .. } = table.classify(&id) {
            let base = base.clone();
            self.bump(base);
        }
        self.bump(id);
    }

    fn bump(&mut self, id: SpeciesId) {
        *self.counts.entry(id.clone()).or_insert(0) += 1;
        self.species.insert(id);
    }
}

/// Rebuild the owned-shiny set from every storage page and the roster.
///
/// Unreadable slots and pages are skipped; the scan never aborts.
pub fn rescan(source: &impl CollectionSource, table: &SpeciesTable) -> OwnedShinySet {
    let mut owned = OwnedShinySet::default();
    let pages = source.storage_page_count().unwrap_or_else(|err| {
        log::warn!("storage page count unreadable, scanning roster only: {err}");
        0
    });

    for page in 0..pages {
        match source.storage_page(page) {
            Ok(slots) => collect_slots(&mut owned, table, slots, "storage"),
            Err(err) => {
                log::warn!("storage page {page} unreadable, skipping: {err}");
                owned.skipped_slots += 1;
            }
        }
    }
    match source.roster() {
        Ok(slots) => collect_slots(&mut owned, table, slots, "roster"),
        Err(err) => {
            log::warn!("roster unreadable, skipping: {err}");
            owned.skipped_slots += 1;
        }
    }

    owned.scanned_at = Some(Utc::now());
    log::info!(
        "shinies in storage+roster: {} individuals, {} species",
        owned.individuals(),
        owned.len()
    );
    owned
}

fn collect_slots(
    owned: &mut OwnedShinySet,
    table: &SpeciesTable,
    slots: Vec<SlotRead>,
    source: &str,
) {
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Ok(Some(individual)) if individual.is_shiny => owned.add(table, &individual),
            Ok(_) => {}
            Err(err) => {
                log::warn!("{source} slot {index} unreadable, skipping: {err}");
                owned.skipped_slots += 1;
            }
        }
    }
}
