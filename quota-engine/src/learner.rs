//! Encounter learning
//!
//! Remembers, per encounter context, every species ever observed there, and
//! per location every form of the form-collectible species. Both tables only
//! grow; re-observing something is a no-op.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::context::{EncounterContext, LocationId};
use crate::species::{SpeciesId, SpeciesKind, SpeciesTable};

/// Species observed per encounter context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnedTable(BTreeMap<EncounterContext, BTreeSet<SpeciesId>>);

impl LearnedTable {
    #[must_use]
    pub fn get(&self, context: &EncounterContext) -> Option<&BTreeSet<SpeciesId>> {
        self.0.get(context)
    }

    /// Contexts learned at a location, in method order.
    pub fn at_location<'a>(
        &'a self,
        location: &'a LocationId,
    ) -> impl Iterator<Item = (&'a EncounterContext, &'a BTreeSet<SpeciesId>)> + 'a {
        self.0.iter().filter(move |(ctx, _)| &ctx.location == location)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, context: &EncounterContext, species: SpeciesId) -> bool {
        if self.0.get(context).is_some_and(|set| set.contains(&species)) {
            return false;
        }
        self.0.entry(context.clone()).or_default().insert(species)
    }
}

/// Forms of the form-collectible species observed per location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservedForms(BTreeMap<LocationId, BTreeSet<String>>);

impl ObservedForms {
    #[must_use]
    pub fn at(&self, location: &LocationId) -> Option<&BTreeSet<String>> {
        self.0.get(location)
    }

    fn insert(&mut self, location: &LocationId, form: &str) -> bool {
        let form = form.trim().to_uppercase();
        if self.0.get(location).is_some_and(|forms| forms.contains(&form)) {
            return false;
        }
        self.0.entry(location.clone()).or_default().insert(form)
    }
}

/// Which persisted tables have unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyTables {
    pub learned: bool,
    pub forms: bool,
}

impl DirtyTables {
    #[must_use]
    pub const fn any(self) -> bool {
        self.learned || self.forms
    }
}

/// Owner of the learned and observed-forms tables.
#[derive(Debug, Clone, Default)]
pub struct EncounterLearner {
    learned: LearnedTable,
    forms: ObservedForms,
    dirty: DirtyTables,
}

impl EncounterLearner {
    #[must_use]
    pub const fn new(learned: LearnedTable, forms: ObservedForms) -> Self {
        Self {
            learned,
            forms,
            dirty: DirtyTables {
                learned: false,
                forms: false,
            },
        }
    }

    /// Record one encounter. Returns whether any table changed.
    pub fn record_encounter(
        &mut self,
        context: &EncounterContext,
        species: &SpeciesId,
        table: &SpeciesTable,
    ) -> bool {
        let mut changed = false;
        if let SpeciesKind::Form { form, .. } = table.classify(species)
            && self.forms.insert(&context.location, form)
        {
            self.dirty.forms = true;
            changed = true;
            log::debug!("observed form {form} at {}", context.location);
        }
        if self.learned.insert(context, species.clone()) {
            self.dirty.learned = true;
            changed = true;
            log::info!("learned {species} on {context}");
        }
        changed
    }

    /// Merge species from a static encounter table into a context.
    ///
    /// Returns whether anything new was added.
    pub fn seed<'a>(
        &mut self,
        context: &EncounterContext,
        species: impl IntoIterator<Item = &'a SpeciesId>,
        table: &SpeciesTable,
    ) -> bool {
        let mut changed = false;
        for id in species {
            changed |= self.record_encounter(context, id, table);
        }
        if changed {
            log::info!("learned table seeded for {context}");
        }
        changed
    }

    /// Species learned for a context (empty if never hunted).
    #[must_use]
    pub fn learned_for(&self, context: &EncounterContext) -> BTreeSet<SpeciesId> {
        self.learned.get(context).cloned().unwrap_or_default()
    }

    #[must_use]
    pub const fn learned(&self) -> &LearnedTable {
        &self.learned
    }

    #[must_use]
    pub const fn observed_forms(&self) -> &ObservedForms {
        &self.forms
    }

    /// Report and clear which tables need persisting.
    pub fn take_dirty(&mut self) -> DirtyTables {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncounterMethod;
    use crate::species::{FamilyId, SpeciesEntry};

    fn table() -> SpeciesTable {
        SpeciesTable::from_entries(
            [SpeciesEntry {
                id: "UNOWN".into(),
                family: FamilyId(201),
                stage: 0,
                branch: None,
            }],
            Some("UNOWN".into()),
        )
        .unwrap()
    }

    fn ctx(location: &str) -> EncounterContext {
        EncounterContext::new(LocationId::new(location), EncounterMethod::Ground)
    }

    #[test]
    fn recording_is_idempotent_and_monotonic() {
        let table = table();
        let mut learner = EncounterLearner::default();
        let route = ctx("ROUTE_102");
        assert!(learner.record_encounter(&route, &"RALTS".into(), &table));
        assert!(!learner.record_encounter(&route, &"RALTS".into(), &table));
        assert!(learner.record_encounter(&route, &"SEEDOT".into(), &table));
        assert_eq!(learner.learned_for(&route).len(), 2);
        assert!(learner.learned_for(&ctx("ROUTE_103")).is_empty());

        let dirty = learner.take_dirty();
        assert!(dirty.learned && !dirty.forms);
        assert!(!learner.take_dirty().any());
    }

    #[test]
    fn forms_are_tracked_per_location() {
        let table = table();
        let mut learner = EncounterLearner::default();
        let chamber = ctx("TANOBY_CHAMBER_1");
        learner.record_encounter(&chamber, &"UNOWN-A".into(), &table);
        learner.record_encounter(&chamber, &"UNOWN-E".into(), &table);
        learner.record_encounter(&chamber, &"UNOWN-A".into(), &table);

        let forms = learner.observed_forms().at(&chamber.location).unwrap();
        assert_eq!(forms.iter().map(String::as_str).collect::<Vec<_>>(), ["A", "E"]);
        assert!(learner.observed_forms().at(&LocationId::new("TANOBY_CHAMBER_2")).is_none());
        assert!(learner.take_dirty().forms);
    }

    #[test]
    fn seeding_merges_without_shrinking() {
        let table = table();
        let mut learner = EncounterLearner::default();
        let route = ctx("ROUTE_104");
        learner.record_encounter(&route, &"WINGULL".into(), &table);
        let seeded: Vec<SpeciesId> = vec!["TAILLOW".into(), "WINGULL".into()];
        assert!(learner.seed(&route, &seeded, &table));
        assert!(!learner.seed(&route, &seeded, &table));
        assert_eq!(learner.learned_for(&route).len(), 2);
    }

    #[test]
    fn learned_table_serializes_with_context_keys() {
        let table = table();
        let mut learner = EncounterLearner::default();
        learner.record_encounter(&ctx("ROUTE_101"), &"POOCHYENA".into(), &table);
        let json = serde_json::to_string(learner.learned()).unwrap();
        assert_eq!(json, r#"{"ROUTE_101/GROUND":["POOCHYENA"]}"#);
        let back: LearnedTable = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, learner.learned());
    }
}
