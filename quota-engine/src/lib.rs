//! Shiny Quota Engine
//!
//! Tracks which species appear in each encounter context, derives a per-context
//! shiny collection quota from evolutionary family data, and decides when the
//! player may move on to the next location of a fixed route order. Runtime
//! access (save data, storage boxes, movement) goes through the traits in
//! [`runtime`]; persistence goes through [`TableStorage`].

pub mod capability;
pub mod config;
pub mod context;
pub mod engine;
pub mod learner;
pub mod navigator;
pub mod ownership;
pub mod quota;
pub mod route;
pub mod runtime;
pub mod scoper;
pub mod species;
pub mod status;
pub mod store;

// Re-export commonly used types
pub use capability::{
    Capability, CapabilityCache, CapabilityRules, CapabilitySet, Field, SaveView,
    compute_capabilities,
};
pub use config::{ConfigError, OnQuotaAction, QuotaConfig, RetryPolicy};
pub use context::{EncounterContext, EncounterMethod, LocationId, RodGrouping};
pub use engine::{BacklogEntry, EngineError, QuotaEngine};
pub use learner::{EncounterLearner, LearnedTable, ObservedForms};
pub use navigator::{BlockReason, Decision, Navigator, NavigatorState, NavigatorStatus};
pub use ownership::{OwnedShinySet, rescan};
pub use quota::{
    QuotaReport, QuotaRequirement, QuotaRules, QuotaVariant, RequirementUnit, UnitKey, evaluate,
};
pub use route::{RouteEntry, RouteOrder, StoryGate};
pub use runtime::{
    CapabilitySource, CollectionSource, ControlHandoff, Individual, MovementDelegate, Runtime,
    RuntimeError, SlotRead, TravelOutcome,
};
pub use scoper::ChamberScoper;
pub use species::{
    BranchId, FORM_ALPHABET, FamilyId, ReferenceError, SpeciesEntry, SpeciesId, SpeciesTable,
};
pub use status::StatusLine;
pub use store::{FileStorage, MemoryStorage, StoreError, Table, TableStorage};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[derive(Default)]
    struct FixtureRuntime {
        save: Value,
        roster: Vec<SlotRead>,
        trips: Vec<LocationId>,
    }

    impl CapabilitySource for FixtureRuntime {
        fn save_fields(&self) -> Result<Value, RuntimeError> {
            Ok(self.save.clone())
        }
    }

    impl CollectionSource for FixtureRuntime {
        fn storage_page_count(&self) -> Result<usize, RuntimeError> {
            Ok(0)
        }

        fn storage_page(&self, _page: usize) -> Result<Vec<SlotRead>, RuntimeError> {
            Ok(Vec::new())
        }

        fn roster(&self) -> Result<Vec<SlotRead>, RuntimeError> {
            Ok(self.roster.clone())
        }
    }

    impl MovementDelegate for FixtureRuntime {
        fn travel_to(&mut self, location: &LocationId) -> TravelOutcome {
            self.trips.push(location.clone());
            TravelOutcome::Arrived
        }
    }

    impl ControlHandoff for FixtureRuntime {
        fn request_manual_control(&mut self, _reason: &str) {}
    }

    fn species() -> Arc<SpeciesTable> {
        Arc::new(
            SpeciesTable::from_json(
                r#"{ "species": [
                    { "id": "POOCHYENA", "family": 261 },
                    { "id": "MIGHTYENA", "family": 261, "stage": 1 }
                ] }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn engine_learns_catches_and_moves_on() {
        let route = Arc::new(RouteOrder::from_json(r#"["ROUTE_101", "ROUTE_102"]"#).unwrap());
        let storage = MemoryStorage::default();
        let runtime = FixtureRuntime {
            save: json!({ "badges": [] }),
            ..FixtureRuntime::default()
        };
        let mut engine =
            QuotaEngine::new(runtime, storage.clone(), QuotaConfig::default(), species(), route)
                .unwrap();

        engine.on_map_transition("route_101");
        let status = engine.on_encounter_start("ROUTE_101", "GRASS", &Individual::new("Poochyena"));
        assert_eq!((status.satisfied, status.total), (0, 1));
        assert!(engine.runtime().trips.is_empty());

        engine
            .runtime_mut()
            .roster
            .push(Ok(Some(Individual::new("MIGHTYENA").shiny())));
        let status = engine.on_catch_confirmed(None);
        assert_eq!(status.satisfied, 1);
        assert_eq!(status.navigator, NavigatorStatus::Traveling);
        assert!(engine.runtime().trips.is_empty());

        engine.on_encounter_finished();
        assert_eq!(engine.runtime().trips, vec![LocationId::new("ROUTE_102")]);
        assert_eq!(engine.navigator().position, Some(1));
        assert!(storage.raw(Table::Learned).is_some());
        assert!(storage.raw(Table::Navigator).is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = QuotaConfig::default();
        config.retry.max_attempts = 0;
        let result = QuotaEngine::new(
            FixtureRuntime::default(),
            MemoryStorage::default(),
            config,
            species(),
            Arc::new(RouteOrder::default()),
        );
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
