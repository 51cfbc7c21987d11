//! Route order reference data
//!
//! The ordered list of locations the navigator walks, each with the
//! capabilities needed to reach it and an optional known story gate.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::capability::{Capability, CapabilitySet};
use crate::context::LocationId;
use crate::species::{ReferenceError, SpeciesId};

/// A story event that blocks progression until its flag is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGate {
    pub flag: String,
    #[serde(default)]
    pub note: String,
}

impl StoryGate {
    /// The gate applies while its flag is not held.
    #[must_use]
    pub fn applies(&self, capabilities: &CapabilitySet) -> bool {
        !capabilities.holds(&Capability::Flag(self.flag.clone()))
    }
}

/// One location in the route order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub location: LocationId,
    #[serde(default)]
    pub requires: BTreeSet<Capability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_gate: Option<StoryGate>,
    /// Species offered as static encounters here (gifts, legendaries).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statics: Vec<SpeciesId>,
}

impl RouteEntry {
    #[must_use]
    pub fn new(location: impl Into<LocationId>) -> Self {
        Self {
            location: location.into(),
            requires: BTreeSet::new(),
            story_gate: None,
            statics: Vec::new(),
        }
    }

    #[must_use]
    pub fn requiring(mut self, capability: Capability) -> Self {
        self.requires.insert(capability);
        self
    }

    #[must_use]
    pub fn gated(mut self, flag: impl Into<String>, note: impl Into<String>) -> Self {
        self.story_gate = Some(StoryGate {
            flag: flag.into(),
            note: note.into(),
        });
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryDoc {
    Name(LocationId),
    Entry(RouteEntry),
}

impl From<EntryDoc> for RouteEntry {
    fn from(doc: EntryDoc) -> Self {
        match doc {
            EntryDoc::Name(location) => Self::new(location),
            EntryDoc::Entry(entry) => entry,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RouteDoc {
    List(Vec<EntryDoc>),
    Wrapped { order: Vec<EntryDoc> },
}

/// Immutable ordered route.
#[derive(Debug, Clone, Default)]
pub struct RouteOrder {
    entries: Vec<RouteEntry>,
    index: BTreeMap<LocationId, usize>,
}

impl RouteOrder {
    /// Build a route from ordered entries.
    ///
    /// # Errors
    ///
    /// Returns an error if a location is listed twice.
    pub fn new(entries: Vec<RouteEntry>) -> Result<Self, ReferenceError> {
        let mut index = BTreeMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.location.clone(), i).is_some() {
                return Err(ReferenceError::DuplicateLocation(
                    entry.location.to_string(),
                ));
            }
        }
        Ok(Self { entries, index })
    }

    /// Parse a route document: either a bare list or `{"order": [...]}`, where
    /// each entry is a location name or a full entry object.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a location repeats.
    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let entries = match serde_json::from_str::<RouteDoc>(json)? {
            RouteDoc::List(entries) | RouteDoc::Wrapped { order: entries } => entries,
        };
        Self::new(entries.into_iter().map(RouteEntry::from).collect())
    }

    #[must_use]
    pub fn position_of(&self, location: &LocationId) -> Option<usize> {
        self.index.get(location).copied()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&RouteEntry> {
        self.entries.get(position)
    }

    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_list_and_wrapped_documents() {
        let bare = RouteOrder::from_json(r#"["littleroot_town", "ROUTE_101"]"#).unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare.position_of(&"ROUTE_101".into()), Some(1));

        let wrapped = RouteOrder::from_json(
            r#"{ "order": [
                "ROUTE_104",
                { "location": "ROUTE_105", "requires": ["surf", "badge:5"] },
                { "location": "ROUTE_119", "story_gate": { "flag": "DEFEATED_WALLY", "note": "rival on the bridge" } }
            ] }"#,
        )
        .unwrap();
        let surf_route = wrapped.get(1).unwrap();
        assert!(surf_route.requires.contains(&Capability::Surf));
        assert!(surf_route.requires.contains(&Capability::Badge(5)));
        assert!(wrapped.get(2).unwrap().story_gate.is_some());
    }

    #[test]
    fn rejects_repeated_locations_and_bad_capabilities() {
        assert!(matches!(
            RouteOrder::from_json(r#"["ROUTE_101", "route_101"]"#),
            Err(ReferenceError::DuplicateLocation(_))
        ));
        assert!(RouteOrder::from_json(r#"[{ "location": "X", "requires": ["jetpack"] }]"#).is_err());
    }

    #[test]
    fn story_gate_applies_until_flag_is_held() {
        let gate = StoryGate {
            flag: "GOT_DEVON_GOODS".into(),
            note: String::new(),
        };
        assert!(gate.applies(&CapabilitySet::default()));
        let caps: CapabilitySet = [Capability::Flag("GOT_DEVON_GOODS".into())]
            .into_iter()
            .collect();
        assert!(!gate.applies(&caps));
    }
}
