//! Quota evaluation
//!
//! A context's learned species are grouped into requirement units according
//! to the quota variant, then each unit is checked against the owned-shiny
//! set. Grouping is driven entirely by the species reference table: adding a
//! branching family is a data change.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::species::{BranchId, FORM_ALPHABET, FamilyId, SpeciesId, SpeciesKind, SpeciesTable};

/// Completion rule applied to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaVariant {
    /// One unit per evolutionary family.
    #[default]
    Standard,
    /// One unit per evolution stage, branches counted independently.
    Living,
}

impl QuotaVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Living => "living",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Std",
            Self::Living => "Living",
        }
    }
}

impl fmt::Display for QuotaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Variant plus the grouping options that go with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaRules {
    pub variant: QuotaVariant,
    /// Living variant: require every stage of each learned family, not only
    /// the learned stages.
    pub expand_living_families: bool,
}

impl From<QuotaVariant> for QuotaRules {
    fn from(variant: QuotaVariant) -> Self {
        Self {
            variant,
            expand_living_families: false,
        }
    }
}

/// Identity of one requirement unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitKey {
    Family {
        family: FamilyId,
    },
    Stage {
        family: FamilyId,
        stage: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<BranchId>,
    },
    /// One form of the form-collectible species.
    Form {
        species: SpeciesId,
        form: String,
    },
    /// A species missing from the reference table stands alone.
    Unlisted {
        species: SpeciesId,
    },
}

impl UnitKey {
    #[must_use]
    pub fn form(&self) -> Option<&str> {
        match self {
            Self::Form { form, .. } => Some(form),
            _ => None,
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Family { family } => write!(f, "family {family}"),
            Self::Stage {
                family,
                stage,
                branch: Some(branch),
            } => write!(f, "family {family} stage {stage} ({branch})"),
            Self::Stage { family, stage, .. } => write!(f, "family {family} stage {stage}"),
            Self::Form { species, form } => write!(f, "{species}-{form}"),
            Self::Unlisted { species } => write!(f, "{species}"),
        }
    }
}

/// One requirement unit: satisfied when any member is owned shiny.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementUnit {
    pub key: UnitKey,
    /// Species whose shiny ownership satisfies the unit, sorted.
    pub members: SmallVec<[SpeciesId; 4]>,
    /// Learned species that produced the unit, sorted.
    pub learned: SmallVec<[SpeciesId; 2]>,
}

impl RequirementUnit {
    #[must_use]
    pub fn is_satisfied_by(&self, owned: &BTreeSet<SpeciesId>) -> bool {
        self.members.iter().any(|member| owned.contains(member))
    }

    /// Name used in missing-unit reports.
    #[must_use]
    pub fn label(&self) -> String {
        if matches!(self.key, UnitKey::Form { .. }) {
            return self.key.to_string();
        }
        self.learned
            .first()
            .or_else(|| self.members.first())
            .map_or_else(|| self.key.to_string(), ToString::to_string)
    }
}

#[derive(Default)]
struct UnitBuilder {
    members: BTreeSet<SpeciesId>,
    learned: BTreeSet<SpeciesId>,
}

/// Requirement units derived for one context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaRequirement {
    pub variant: QuotaVariant,
    pub units: Vec<RequirementUnit>,
}

impl QuotaRequirement {
    /// Group learned species into units.
    #[must_use]
    pub fn derive(
        learned: &BTreeSet<SpeciesId>,
        rules: QuotaRules,
        table: &SpeciesTable,
    ) -> Self {
        let mut units: BTreeMap<UnitKey, UnitBuilder> = BTreeMap::new();
        for species in learned {
            match table.classify(species) {
                SpeciesKind::Known(entry) => match rules.variant {
                    QuotaVariant::Standard => {
                        let unit = units
                            .entry(UnitKey::Family {
                                family: entry.family,
                            })
                            .or_default();
                        unit.members
                            .extend(table.family_members(entry.family).iter().cloned());
                        unit.learned.insert(species.clone());
                    }
                    QuotaVariant::Living => {
                        if rules.expand_living_families {
                            for (stage, branch) in table.family_stages(entry.family) {
                                let unit = units
                                    .entry(stage_key(entry.family, stage, branch))
                                    .or_default();
                                unit.members.extend(
                                    table.stage_members(entry.family, stage, branch).cloned(),
                                );
                            }
                        }
                        let unit = units
                            .entry(stage_key(entry.family, entry.stage, entry.branch.as_ref()))
                            .or_default();
                        unit.members.extend(
                            table
                                .stage_members(entry.family, entry.stage, entry.branch.as_ref())
                                .cloned(),
                        );
                        unit.learned.insert(species.clone());
                    }
                },
                SpeciesKind::Form { base, form } => {
                    let unit = units
                        .entry(UnitKey::Form {
                            species: base.clone(),
                            form: form.to_string(),
                        })
                        .or_default();
                    unit.members.insert(species.clone());
                    unit.learned.insert(species.clone());
                }
                SpeciesKind::AnyForm(base) => {
                    for form in FORM_ALPHABET {
                        let unit = units
                            .entry(UnitKey::Form {
                                species: base.clone(),
                                form: form.to_string(),
                            })
                            .or_default();
                        unit.members.insert(base.with_form(form));
                        unit.learned.insert(species.clone());
                    }
                }
                SpeciesKind::Unlisted => {
                    log::debug!("{species} is not in the species table; counting it alone");
                    let unit = units
                        .entry(UnitKey::Unlisted {
                            species: species.clone(),
                        })
                        .or_default();
                    unit.members.insert(species.clone());
                    unit.learned.insert(species.clone());
                }
            }
        }

        Self {
            variant: rules.variant,
            units: units
                .into_iter()
                .map(|(key, unit)| RequirementUnit {
                    key,
                    members: unit.members.into_iter().collect(),
                    learned: unit.learned.into_iter().collect(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Check every unit against the owned set.
    #[must_use]
    pub fn evaluate(&self, owned: &BTreeSet<SpeciesId>) -> QuotaReport {
        let mut missing = Vec::new();
        let mut completed = BTreeSet::new();
        for unit in &self.units {
            if unit.is_satisfied_by(owned) {
                completed.extend(unit.learned.iter().cloned());
            } else {
                missing.push(unit.clone());
            }
        }
        let total = self.units.len();
        QuotaReport {
            variant: self.variant,
            satisfied: total - missing.len(),
            total,
            missing,
            completed: completed.into_iter().collect(),
        }
    }
}

fn stage_key(family: FamilyId, stage: u8, branch: Option<&BranchId>) -> UnitKey {
    UnitKey::Stage {
        family,
        stage,
        branch: branch.cloned(),
    }
}

/// Progress of one context against its quota.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaReport {
    pub variant: QuotaVariant,
    pub missing: Vec<RequirementUnit>,
    pub satisfied: usize,
    pub total: usize,
    /// Learned species whose unit is already satisfied.
    #[serde(default)]
    pub completed: Vec<SpeciesId>,
}

impl QuotaReport {
    /// Nothing learned yet: complete on paper, but not meaningful.
    #[must_use]
    pub const fn is_vacuous(&self) -> bool {
        self.total == 0
    }

    /// Every unit satisfied and at least one unit exists.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.is_vacuous() && self.missing.is_empty()
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    /// Learned species that no longer need catching.
    #[must_use]
    pub fn completed_species(&self) -> &[SpeciesId] {
        &self.completed
    }

    /// Short `NAME×1` breakdown of missing units.
    #[must_use]
    pub fn missing_summary(&self, limit: usize) -> String {
        let mut parts: Vec<String> = self
            .missing
            .iter()
            .take(limit)
            .map(|unit| format!("{}×1", unit.label()))
            .collect();
        if self.missing.len() > limit {
            parts.push("…".to_string());
        }
        parts.join(", ")
    }
}

/// Derive and evaluate in one step.
#[must_use]
pub fn evaluate(
    learned: &BTreeSet<SpeciesId>,
    owned: &BTreeSet<SpeciesId>,
    variant: QuotaVariant,
    table: &SpeciesTable,
) -> QuotaReport {
    QuotaRequirement::derive(learned, variant.into(), table).evaluate(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::SpeciesEntry;

    fn entry(id: &str, family: u16, stage: u8, branch: Option<&str>) -> SpeciesEntry {
        SpeciesEntry {
            id: id.into(),
            family: FamilyId(family),
            stage,
            branch: branch.map(|b| BranchId(b.to_string())),
        }
    }

    fn table() -> SpeciesTable {
        SpeciesTable::from_entries(
            [
                entry("RALTS", 280, 0, None),
                entry("KIRLIA", 280, 1, None),
                entry("GARDEVOIR", 280, 2, None),
                entry("ODDISH", 43, 0, None),
                entry("GLOOM", 43, 1, None),
                entry("VILEPLUME", 43, 2, Some("petal")),
                entry("BELLOSSOM", 43, 2, Some("sun")),
                entry("UNOWN", 201, 0, None),
            ],
            Some("UNOWN".into()),
        )
        .unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<SpeciesId> {
        ids.iter().map(|id| SpeciesId::new(id)).collect()
    }

    #[test]
    fn standard_family_satisfied_by_any_member() {
        let table = table();
        let learned = set(&["RALTS"]);
        for owned in [&["RALTS"][..], &["KIRLIA"][..], &["GARDEVOIR"][..]] {
            let report = evaluate(&learned, &set(owned), QuotaVariant::Standard, &table);
            assert_eq!((report.satisfied, report.total), (1, 1));
            assert!(report.is_complete());
        }
        let report = evaluate(&learned, &set(&["ODDISH"]), QuotaVariant::Standard, &table);
        assert_eq!(report.missing_count(), 1);
        assert_eq!(report.missing[0].members.len(), 3);
    }

    #[test]
    fn living_counts_each_stage() {
        let table = table();
        let learned = set(&["RALTS", "KIRLIA", "GARDEVOIR"]);
        let report = evaluate(
            &learned,
            &set(&["RALTS", "GARDEVOIR"]),
            QuotaVariant::Living,
            &table,
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.missing_count(), 1);
        assert_eq!(report.missing[0].label().as_str(), "KIRLIA");
    }

    #[test]
    fn branches_split_living_but_not_standard() {
        let table = table();
        let learned = set(&["VILEPLUME", "BELLOSSOM"]);
        let owned = set(&["BELLOSSOM"]);

        let living = evaluate(&learned, &owned, QuotaVariant::Living, &table);
        assert_eq!((living.satisfied, living.total), (1, 2));
        assert_eq!(living.missing[0].label().as_str(), "VILEPLUME");

        let standard = evaluate(&learned, &owned, QuotaVariant::Standard, &table);
        assert!(standard.is_complete());
    }

    #[test]
    fn expanded_living_requires_whole_family() {
        let table = table();
        let rules = QuotaRules {
            variant: QuotaVariant::Living,
            expand_living_families: true,
        };
        let requirement = QuotaRequirement::derive(&set(&["ODDISH"]), rules, &table);
        assert_eq!(requirement.len(), 4);
        let report = requirement.evaluate(&set(&["ODDISH", "GLOOM"]));
        assert_eq!(report.missing_count(), 2);
    }

    #[test]
    fn empty_learned_set_is_vacuous() {
        let report = evaluate(&BTreeSet::new(), &set(&["RALTS"]), QuotaVariant::Living, &table());
        assert_eq!((report.satisfied, report.total), (0, 0));
        assert!(report.is_vacuous());
        assert!(!report.is_complete());
    }

    #[test]
    fn forms_and_unlisted_species_stand_alone() {
        let table = table();
        let report = evaluate(
            &set(&["UNOWN-A", "UNOWN-E", "MISSINGNO"]),
            &set(&["UNOWN-E", "UNOWN"]),
            QuotaVariant::Standard,
            &table,
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.satisfied, 1);
        assert_eq!(report.completed_species(), &[SpeciesId::new("UNOWN-E")]);

        let bare = QuotaRequirement::derive(&set(&["UNOWN"]), QuotaVariant::Living.into(), &table);
        assert_eq!(bare.len(), FORM_ALPHABET.len());
    }

    #[test]
    fn missing_summary_is_bounded() {
        let table = table();
        let report = evaluate(
            &set(&["RALTS", "ODDISH", "UNOWN-B"]),
            &BTreeSet::new(),
            QuotaVariant::Standard,
            &table,
        );
        assert_eq!(report.missing_summary(2), "ODDISH×1, RALTS×1, …");
    }
}
