//! Narrows form units to the forms a location actually spawns.
use crate::context::EncounterContext;
use crate::learner::ObservedForms;
use crate::quota::{QuotaRequirement, UnitKey};

/// Restricts form-collectible units to the forms seen at a location.
#[derive(Debug, Clone, Copy)]
pub struct ChamberScoper<'a> {
    forms: &'a ObservedForms,
}

impl<'a> ChamberScoper<'a> {
    #[must_use]
    pub const fn new(forms: &'a ObservedForms) -> Self {
        Self { forms }
    }

    /// Keep non-form units as they are and form units only when their form was
    /// observed at the context's location.
    ///
    /// A location with no observed forms keeps no form units at all.
    #[must_use]
    pub fn scope_requirement(
        &self,
        context: &EncounterContext,
        full: QuotaRequirement,
    ) -> QuotaRequirement {
        let observed = self.forms.at(&context.location);
        let before = full.units.len();
        let units: Vec<_> = full
            .units
            .into_iter()
            .filter(|unit| match &unit.key {
                UnitKey::Form { form, .. } => observed.is_some_and(|forms| forms.contains(form)),
                _ => true,
            })
            .collect();
        if units.len() != before {
            log::debug!(
                "scoped {context} to {} of {before} units by observed forms",
                units.len()
            );
        }
        QuotaRequirement {
            variant: full.variant,
            units,
        }
    }
}
