//! Species reference table
//!
//! Read-only lookup from a species identifier to its evolutionary family, stage
//! depth, and (for families that split) branch. The table is supplied
//! externally as JSON; nothing in the engine mutates it.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Every form the form-collectible species can take.
pub const FORM_ALPHABET: [&str; 28] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "!", "?",
];

/// Canonical species identifier: trimmed, upper case, forms written `BASE-FORM`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SpeciesId(String);

impl SpeciesId {
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier for one form of this species.
    #[must_use]
    pub fn with_form(&self, form: &str) -> Self {
        Self(format!("{}-{}", self.0, form.trim().to_uppercase()))
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SpeciesId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SpeciesId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<SpeciesId> for String {
    fn from(value: SpeciesId) -> Self {
        value.0
    }
}

/// Evolutionary family identifier (the base form's index in the reference data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FamilyId(pub u16);

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Distinguishes divergent lineages after a family splits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub String);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesEntry {
    pub id: SpeciesId,
    pub family: FamilyId,
    /// Depth from the base form (0 = base).
    #[serde(default)]
    pub stage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchId>,
}

/// How a species identifier relates to the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesKind<'a> {
    /// A regular species with a known family.
    Known(&'a SpeciesEntry),
    /// One specific form of the form-collectible species.
    Form { base: &'a SpeciesId, form: &'a str },
    /// The form-collectible species with its form unknown.
    AnyForm(&'a SpeciesId),
    /// Not present in the table; treated as its own singleton family.
    Unlisted,
}

/// Errors raised when reference data is inconsistent.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("species {0} is listed more than once")]
    DuplicateSpecies(SpeciesId),
    #[error("form-collectible species {0} is not in the species table")]
    UnknownFormSpecies(SpeciesId),
    #[error("location {0} appears more than once in the route order")]
    DuplicateLocation(String),
}

#[derive(Debug, Deserialize)]
struct SpeciesTableDoc {
    #[serde(default)]
    form_species: Option<SpeciesId>,
    species: Vec<SpeciesEntry>,
}

/// Immutable species reference data.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    entries: BTreeMap<SpeciesId, SpeciesEntry>,
    families: BTreeMap<FamilyId, Vec<SpeciesId>>,
    form_species: Option<SpeciesId>,
}

impl SpeciesTable {
    /// Build a table from parsed entries.
    ///
    /// # Errors
    ///
    /// Returns an error if a species is listed twice or the form-collectible
    /// species is not itself a table entry.
    pub fn from_entries(
        entries: impl IntoIterator<Item = SpeciesEntry>,
        form_species: Option<SpeciesId>,
    ) -> Result<Self, ReferenceError> {
        let mut table = Self::default();
        for entry in entries {
            let id = entry.id.clone();
            table.families.entry(entry.family).or_default().push(id.clone());
            if table.entries.insert(id.clone(), entry).is_some() {
                return Err(ReferenceError::DuplicateSpecies(id));
            }
        }
        for members in table.families.values_mut() {
            members.sort();
        }
        if let Some(form) = &form_species
            && !table.entries.contains_key(form)
        {
            return Err(ReferenceError::UnknownFormSpecies(form.clone()));
        }
        table.form_species = form_species;
        Ok(table)
    }

    /// Load the reference table from its JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the data is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let doc: SpeciesTableDoc = serde_json::from_str(json)?;
        Self::from_entries(doc.species, doc.form_species)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn lookup(&self, id: &SpeciesId) -> Option<&SpeciesEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub const fn form_species(&self) -> Option<&SpeciesId> {
        self.form_species.as_ref()
    }

    /// All species of a family, sorted.
    #[must_use]
    pub fn family_members(&self, family: FamilyId) -> &[SpeciesId] {
        self.families.get(&family).map_or(&[], Vec::as_slice)
    }

    /// Species sharing a family, stage, and branch.
    pub fn stage_members<'a>(
        &'a self,
        family: FamilyId,
        stage: u8,
        branch: Option<&'a BranchId>,
    ) -> impl Iterator<Item = &'a SpeciesId> + 'a {
        self.family_members(family).iter().filter(move |id| {
            self.entries
                .get(*id)
                .is_some_and(|entry| entry.stage == stage && entry.branch.as_ref() == branch)
        })
    }

    /// Distinct (stage, branch) pairs present in a family.
    #[must_use]
    pub fn family_stages(&self, family: FamilyId) -> BTreeSet<(u8, Option<&BranchId>)> {
        self.family_members(family)
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| (entry.stage, entry.branch.as_ref()))
            .collect()
    }

    /// Classify an identifier against the table.
    #[must_use]
    pub fn classify<'a>(&'a self, id: &'a SpeciesId) -> SpeciesKind<'a> {
        if let Some(base) = &self.form_species {
            if id == base {
                return SpeciesKind::AnyForm(base);
            }
            if let Some(form) = id
                .as_str()
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('-'))
                .filter(|form| !form.is_empty())
            {
                return SpeciesKind::Form { base, form };
            }
        }
        self.entries
            .get(id)
            .map_or(SpeciesKind::Unlisted, SpeciesKind::Known)
    }

    /// Canonical identifier for a runtime-reported species name and optional form.
    #[must_use]
    pub fn identify(&self, name: &str, form: Option<&str>) -> SpeciesId {
        let id = SpeciesId::new(name);
        match (&self.form_species, form.map(str::trim).filter(|f| !f.is_empty())) {
            (Some(base), Some(form)) if *base == id => id.with_form(form),
            _ => id,
        }
    }
}
