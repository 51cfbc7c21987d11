//! Seams to the external runtime: save-state reads, collection contents,
//! movement, and the hand-off to manual control.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::LocationId;

/// Failure reported by a runtime accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("runtime accessor unavailable: {0}")]
    Unavailable(String),
    #[error("slot {slot} could not be read: {reason}")]
    SlotUnreadable { slot: usize, reason: String },
}

/// One creature as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub species: String,
    /// Visual form, for species whose forms are tracked separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default)]
    pub is_shiny: bool,
}

impl Individual {
    #[must_use]
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            form: None,
            is_shiny: false,
        }
    }

    #[must_use]
    pub fn shiny(mut self) -> Self {
        self.is_shiny = true;
        self
    }

    #[must_use]
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }
}

/// Result of reading a single storage or roster slot; `Ok(None)` is an empty slot.
pub type SlotRead = Result<Option<Individual>, RuntimeError>;

/// Read-only access to raw save-state fields.
pub trait CapabilitySource {
    /// Current save-state fields as a loosely-typed document.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot expose save data right now.
    fn save_fields(&self) -> Result<serde_json::Value, RuntimeError>;
}

/// Read-only access to long-term storage pages and the active roster.
pub trait CollectionSource {
    /// Number of storage pages.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    fn storage_page_count(&self) -> Result<usize, RuntimeError>;

    /// Every slot of one storage page.
    ///
    /// # Errors
    ///
    /// Returns an error if the whole page cannot be read.
    fn storage_page(&self, page: usize) -> Result<Vec<SlotRead>, RuntimeError>;

    /// Every slot of the active roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be read.
    fn roster(&self) -> Result<Vec<SlotRead>, RuntimeError>;
}

/// Outcome of a single movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelOutcome {
    Arrived,
    Blocked,
    /// No position change before the delegate gave up.
    Timeout,
}

/// Low-level movement primitives.
pub trait MovementDelegate {
    fn travel_to(&mut self, location: &LocationId) -> TravelOutcome;
}

/// Hands control to a human operator.
pub trait ControlHandoff {
    fn request_manual_control(&mut self, reason: &str);
}

/// Everything the engine needs from the runtime.
pub trait Runtime: CapabilitySource + CollectionSource + MovementDelegate + ControlHandoff {}

impl<T> Runtime for T where T: CapabilitySource + CollectionSource + MovementDelegate + ControlHandoff {}
