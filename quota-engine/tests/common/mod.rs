#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use quota_engine::{
    CapabilitySource, CollectionSource, ControlHandoff, Individual, LocationId, MemoryStorage,
    MovementDelegate, QuotaConfig, QuotaEngine, RouteOrder, RuntimeError, SlotRead,
    SpeciesTable, TravelOutcome,
};
use serde_json::{Value, json};

pub const SPECIES_JSON: &str = include_str!("../fixtures/species.json");
pub const ROUTE_JSON: &str = include_str!("../fixtures/route.json");

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn species() -> Arc<SpeciesTable> {
    Arc::new(SpeciesTable::from_json(SPECIES_JSON).unwrap())
}

pub fn route() -> Arc<RouteOrder> {
    Arc::new(RouteOrder::from_json(ROUTE_JSON).unwrap())
}

/// Runtime double with scripted travel outcomes and a mutable save document.
#[derive(Debug)]
pub struct ScriptedRuntime {
    pub save: Value,
    pub pages: Vec<Vec<SlotRead>>,
    pub roster: Vec<SlotRead>,
    pub outcomes: VecDeque<TravelOutcome>,
    pub trips: Vec<LocationId>,
    pub handoffs: Vec<String>,
}

impl ScriptedRuntime {
    pub fn new(save: Value) -> Self {
        Self {
            save,
            pages: vec![Vec::new()],
            roster: Vec::new(),
            outcomes: VecDeque::new(),
            trips: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    pub fn deposit(&mut self, individual: Individual) {
        self.pages[0].push(Ok(Some(individual)));
    }
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self::new(json!({ "badges": 0 }))
    }
}

impl CapabilitySource for ScriptedRuntime {
    fn save_fields(&self) -> Result<Value, RuntimeError> {
        Ok(self.save.clone())
    }
}

impl CollectionSource for ScriptedRuntime {
    fn storage_page_count(&self) -> Result<usize, RuntimeError> {
        Ok(self.pages.len())
    }

    fn storage_page(&self, page: usize) -> Result<Vec<SlotRead>, RuntimeError> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| RuntimeError::Unavailable(format!("no page {page}")))
    }

    fn roster(&self) -> Result<Vec<SlotRead>, RuntimeError> {
        Ok(self.roster.clone())
    }
}

impl MovementDelegate for ScriptedRuntime {
    fn travel_to(&mut self, location: &LocationId) -> TravelOutcome {
        self.trips.push(location.clone());
        self.outcomes.pop_front().unwrap_or(TravelOutcome::Arrived)
    }
}

impl ControlHandoff for ScriptedRuntime {
    fn request_manual_control(&mut self, reason: &str) {
        self.handoffs.push(reason.to_string());
    }
}

pub fn engine(
    config: QuotaConfig,
    runtime: ScriptedRuntime,
) -> QuotaEngine<ScriptedRuntime, MemoryStorage> {
    init_logging();
    QuotaEngine::new(runtime, MemoryStorage::default(), config, species(), route()).unwrap()
}
