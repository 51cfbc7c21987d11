//! Capability snapshot
//!
//! Derives the set of traversal and story capabilities from raw save-state
//! fields. The raw document is loosely typed and differs between runtimes, so
//! every read goes through [`SaveView`], which yields a typed value or
//! [`Field::Absent`] and never an error. Absent data always means "not held".
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::runtime::CapabilitySource;

/// Highest badge number read from save data.
pub const BADGE_COUNT: u8 = 8;

/// A single unlocked traversal or story ability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Capability {
    Badge(u8),
    Cut,
    Flash,
    RockSmash,
    Strength,
    Surf,
    Fly,
    Dive,
    Waterfall,
    OldRod,
    GoodRod,
    SuperRod,
    AnyRod,
    MachBike,
    AcroBike,
    /// Story/event flag set in the save.
    Flag(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Badge(n) => write!(f, "badge:{n}"),
            Self::Flag(name) => write!(f, "flag:{name}"),
            Self::Cut => f.write_str("cut"),
            Self::Flash => f.write_str("flash"),
            Self::RockSmash => f.write_str("rock_smash"),
            Self::Strength => f.write_str("strength"),
            Self::Surf => f.write_str("surf"),
            Self::Fly => f.write_str("fly"),
            Self::Dive => f.write_str("dive"),
            Self::Waterfall => f.write_str("waterfall"),
            Self::OldRod => f.write_str("old_rod"),
            Self::GoodRod => f.write_str("good_rod"),
            Self::SuperRod => f.write_str("super_rod"),
            Self::AnyRod => f.write_str("any_rod"),
            Self::MachBike => f.write_str("mach_bike"),
            Self::AcroBike => f.write_str("acro_bike"),
        }
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(n) = raw.strip_prefix("badge:") {
            return n
                .parse::<u8>()
                .ok()
                .filter(|n| (1..=BADGE_COUNT).contains(n))
                .map(Self::Badge)
                .ok_or_else(|| format!("invalid badge number in `{s}`"));
        }
        if let Some(flag) = raw.strip_prefix("flag:") {
            if flag.is_empty() {
                return Err(format!("empty flag name in `{s}`"));
            }
            return Ok(Self::Flag(flag.to_string()));
        }
        match raw.to_lowercase().as_str() {
            "cut" => Ok(Self::Cut),
            "flash" => Ok(Self::Flash),
            "rock_smash" => Ok(Self::RockSmash),
            "strength" => Ok(Self::Strength),
            "surf" => Ok(Self::Surf),
            "fly" => Ok(Self::Fly),
            "dive" => Ok(Self::Dive),
            "waterfall" => Ok(Self::Waterfall),
            "old_rod" => Ok(Self::OldRod),
            "good_rod" => Ok(Self::GoodRod),
            "super_rod" => Ok(Self::SuperRod),
            "any_rod" => Ok(Self::AnyRod),
            "mach_bike" => Ok(Self::MachBike),
            "acro_bike" => Ok(Self::AcroBike),
            _ => Err(format!("unknown capability `{s}`")),
        }
    }
}

impl TryFrom<String> for Capability {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(value: Capability) -> Self {
        value.to_string()
    }
}

/// Field moves: capability, gating badge, move name as it appears in save data.
const FIELD_MOVES: [(Capability, u8, &str); 8] = [
    (Capability::Cut, 1, "CUT"),
    (Capability::Flash, 2, "FLASH"),
    (Capability::RockSmash, 3, "ROCK SMASH"),
    (Capability::Strength, 4, "STRENGTH"),
    (Capability::Surf, 5, "SURF"),
    (Capability::Fly, 6, "FLY"),
    (Capability::Dive, 7, "DIVE"),
    (Capability::Waterfall, 8, "WATERFALL"),
];

const KEY_ITEMS: [(Capability, &str); 5] = [
    (Capability::OldRod, "Old Rod"),
    (Capability::GoodRod, "Good Rod"),
    (Capability::SuperRod, "Super Rod"),
    (Capability::MachBike, "Mach Bike"),
    (Capability::AcroBike, "Acro Bike"),
];

/// Result of a single save-state read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl<T> Field<T> {
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Self::Present(value) => value,
            Self::Absent => default,
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or(T::default())
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Schema-with-defaults accessor over a raw save-state document.
#[derive(Debug, Clone, Copy)]
pub struct SaveView<'a> {
    doc: &'a Value,
}

impl<'a> SaveView<'a> {
    #[must_use]
    pub const fn new(doc: &'a Value) -> Self {
        Self { doc }
    }

    /// Badges held, read from a list of booleans or an integer bitmask.
    #[must_use]
    pub fn badges(&self) -> Field<BTreeSet<u8>> {
        match self.doc.get("badges") {
            Some(Value::Array(list)) => Field::Present(
                list.iter()
                    .take(usize::from(BADGE_COUNT))
                    .zip(1..=BADGE_COUNT)
                    .filter(|(held, _)| held.as_bool() == Some(true))
                    .map(|(_, n)| n)
                    .collect(),
            ),
            Some(Value::Number(mask)) => mask
                .as_u64()
                .map(|mask| {
                    (1..=BADGE_COUNT)
                        .filter(|n| mask & (1_u64 << (n - 1)) != 0)
                        .collect::<BTreeSet<u8>>()
                })
                .into(),
            _ => Field::Absent,
        }
    }

    /// Bag count for a key item.
    #[must_use]
    pub fn item_count(&self, name: &str) -> Field<u64> {
        self.doc
            .get("items")
            .and_then(|items| items.get(name))
            .and_then(Value::as_u64)
            .into()
    }

    /// Upper-cased move names known by any roster member.
    ///
    /// Members whose data is malformed are skipped.
    #[must_use]
    pub fn roster_moves(&self) -> Field<BTreeSet<String>> {
        let Some(Value::Array(members)) = self.doc.get("party") else {
            return Field::Absent;
        };
        let moves = members
            .iter()
            .filter_map(|member| member.get("moves").and_then(Value::as_array))
            .flatten()
            .filter_map(|mv| {
                mv.as_str()
                    .or_else(|| mv.get("name").and_then(Value::as_str))
                    .map(normalize_move_name)
            })
            .collect();
        Field::Present(moves)
    }

    /// Story flags set in the save.
    #[must_use]
    pub fn flags(&self) -> Field<BTreeSet<String>> {
        let Some(Value::Array(flags)) = self.doc.get("flags") else {
            return Field::Absent;
        };
        Field::Present(
            flags
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }
}

fn normalize_move_name(raw: &str) -> String {
    raw.trim().to_uppercase().replace(['_', '-'], " ")
}

/// Knobs for capability derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityRules {
    /// Field moves need a roster member that knows the move, not just the badge.
    pub require_party_move: bool,
}

impl Default for CapabilityRules {
    fn default() -> Self {
        Self {
            require_party_move: true,
        }
    }
}

/// Set of unlocked capabilities at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    #[must_use]
    pub fn holds(&self, capability: &Capability) -> bool {
        self.0.contains(capability)
    }

    /// Required capabilities that are not held, in order.
    #[must_use]
    pub fn missing<'a>(&self, required: impl IntoIterator<Item = &'a Capability>) -> Vec<Capability> {
        required
            .into_iter()
            .filter(|cap| !self.holds(cap))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Derive capabilities from a raw save-state document.
#[must_use]
pub fn compute_capabilities(raw: &Value, rules: CapabilityRules) -> CapabilitySet {
    let view = SaveView::new(raw);
    let badges = view.badges().unwrap_or_default();
    let moves = view.roster_moves().unwrap_or_default();
    let mut caps = BTreeSet::new();

    caps.extend(badges.iter().copied().map(Capability::Badge));
    for (cap, badge, move_name) in FIELD_MOVES {
        let knows = !rules.require_party_move || moves.contains(move_name);
        if badges.contains(&badge) && knows {
            caps.insert(cap);
        }
    }
    for (cap, item) in KEY_ITEMS {
        if view.item_count(item).unwrap_or(0) > 0 {
            caps.insert(cap);
        }
    }
    if [Capability::OldRod, Capability::GoodRod, Capability::SuperRod]
        .iter()
        .any(|rod| caps.contains(rod))
    {
        caps.insert(Capability::AnyRod);
    }
    caps.extend(view.flags().unwrap_or_default().into_iter().map(Capability::Flag));

    CapabilitySet(caps)
}

/// Cached capability snapshot with explicit invalidation.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCache {
    rules: CapabilityRules,
    snapshot: Option<CapabilitySet>,
}

impl CapabilityCache {
    #[must_use]
    pub const fn new(rules: CapabilityRules) -> Self {
        Self {
            rules,
            snapshot: None,
        }
    }

    /// Last snapshot, recomputing from the runtime if none is cached.
    ///
    /// A failing accessor is treated as an empty save document: every
    /// capability reads as absent.
    pub fn get_cached(&mut self, source: &impl CapabilitySource) -> &CapabilitySet {
        let rules = self.rules;
        self.snapshot.get_or_insert_with(|| {
            let raw = source.save_fields().unwrap_or_else(|err| {
                log::warn!("save-state fields unreadable, treating capabilities as absent: {err}");
                Value::Null
            });
            let caps = compute_capabilities(&raw, rules);
            log::debug!(
                "capabilities recomputed: {}",
                caps.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );
            caps
        })
    }

    /// Force the next [`Self::get_cached`] to recompute.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    #[must_use]
    pub const fn peek(&self) -> Option<&CapabilitySet> {
        self.snapshot.as_ref()
    }
}
