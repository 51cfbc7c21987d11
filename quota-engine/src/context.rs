//! Encounter contexts: a location paired with a normalised encounter method.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::capability::Capability;

/// Location identifier as reported by the runtime (trimmed, upper case).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LocationId(String);

impl LocationId {
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<LocationId> for String {
    fn from(value: LocationId) -> Self {
        value.0
    }
}

/// Normalised encounter method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterMethod {
    Ground,
    Surf,
    OldRod,
    GoodRod,
    SuperRod,
    /// All rods in one bucket, or a fishing encounter whose rod is unknown.
    Rod,
    RockSmash,
    Static,
    Safari,
}

impl EncounterMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ground => "GROUND",
            Self::Surf => "SURF",
            Self::OldRod => "OLD_ROD",
            Self::GoodRod => "GOOD_ROD",
            Self::SuperRod => "SUPER_ROD",
            Self::Rod => "ROD",
            Self::RockSmash => "ROCK_SMASH",
            Self::Static => "STATIC",
            Self::Safari => "SAFARI",
        }
    }

    #[must_use]
    pub const fn is_rod(self) -> bool {
        matches!(self, Self::OldRod | Self::GoodRod | Self::SuperRod | Self::Rod)
    }

    /// Capability needed to hunt with this method at all.
    #[must_use]
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Self::Surf => Some(Capability::Surf),
            Self::OldRod => Some(Capability::OldRod),
            Self::GoodRod => Some(Capability::GoodRod),
            Self::SuperRod => Some(Capability::SuperRod),
            Self::Rod => Some(Capability::AnyRod),
            Self::RockSmash => Some(Capability::RockSmash),
            Self::Ground | Self::Static | Self::Safari => None,
        }
    }

    /// Map a raw runtime method code onto a normalised method.
    ///
    /// Returns `None` for codes that do not describe a huntable encounter.
    #[must_use]
    pub fn normalize(raw: &str, grouping: RodGrouping) -> Option<Self> {
        let code = raw.trim().to_uppercase().replace([' ', '-'], "_");
        let method = match code.as_str() {
            "GRASS" | "WALKING" | "LAND" | "GROUND" | "CAVE" | "SPIN" => Self::Ground,
            "SURF" | "SURFING" | "WATER" => Self::Surf,
            "OLD_ROD" => Self::OldRod,
            "GOOD_ROD" => Self::GoodRod,
            "SUPER_ROD" => Self::SuperRod,
            "ROD" | "FISHING" | "FISH" => Self::Rod,
            "ROCK_SMASH" | "ROCKSMASH" | "SMASH" => Self::RockSmash,
            "STATIC" | "STARTER" | "GIFT" | "GIFTPOKEMON" | "GIFT_POKEMON" | "EVENT" => {
                Self::Static
            }
            "SAFARI" | "SAFARI_ZONE" => Self::Safari,
            _ => return None,
        };
        Some(grouping.apply(method))
    }
}

impl fmt::Display for EncounterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncounterMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GROUND" => Ok(Self::Ground),
            "SURF" => Ok(Self::Surf),
            "OLD_ROD" => Ok(Self::OldRod),
            "GOOD_ROD" => Ok(Self::GoodRod),
            "SUPER_ROD" => Ok(Self::SuperRod),
            "ROD" => Ok(Self::Rod),
            "ROCK_SMASH" => Ok(Self::RockSmash),
            "STATIC" => Ok(Self::Static),
            "SAFARI" => Ok(Self::Safari),
            _ => Err(()),
        }
    }
}

/// How rod encounters are bucketed into contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RodGrouping {
    /// Each rod keeps its own context.
    PerRod,
    /// Every rod shares one `Rod` context.
    #[default]
    Merged,
    /// Rod encounters count toward the location's `Surf` context.
    WithWater,
}

impl RodGrouping {
    #[must_use]
    pub const fn apply(self, method: EncounterMethod) -> EncounterMethod {
        if !method.is_rod() {
            return method;
        }
        match self {
            Self::PerRod => method,
            Self::Merged => EncounterMethod::Rod,
            Self::WithWater => EncounterMethod::Surf,
        }
    }
}

/// A distinct hunting scope: where, and how.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncounterContext {
    pub location: LocationId,
    pub method: EncounterMethod,
}

impl EncounterContext {
    #[must_use]
    pub const fn new(location: LocationId, method: EncounterMethod) -> Self {
        Self { location, method }
    }

    /// Serialised key used by the persisted learned table.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.location, self.method)
    }
}

impl fmt::Display for EncounterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.location, self.method)
    }
}

impl TryFrom<String> for EncounterContext {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (location, method) = value
            .rsplit_once('/')
            .ok_or_else(|| format!("context key `{value}` has no method"))?;
        let method = method
            .parse()
            .map_err(|()| format!("context key `{value}` has unknown method"))?;
        Ok(Self::new(LocationId::new(location), method))
    }
}

impl From<EncounterContext> for String {
    fn from(value: EncounterContext) -> Self {
        value.key()
    }
}
