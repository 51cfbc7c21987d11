//! The quota engine
//!
//! Owns the learned, owned, observed-forms, and navigator tables for one
//! profile and wires runtime events through learning, ownership scanning,
//! quota evaluation, and navigation. Every handler runs to completion and
//! returns the resulting [`StatusLine`].
use anyhow::Context;
use log::Level;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::capability::CapabilityCache;
use crate::config::{ConfigError, QuotaConfig};
use crate::context::{EncounterContext, EncounterMethod, LocationId};
use crate::learner::{EncounterLearner, LearnedTable, ObservedForms};
use crate::navigator::{Decision, Navigator, NavigatorState, QuotaSignal};
use crate::ownership::{OwnedShinySet, rescan};
use crate::quota::{QuotaReport, QuotaRequirement, RequirementUnit};
use crate::route::RouteOrder;
use crate::runtime::{Individual, Runtime};
use crate::scoper::ChamberScoper;
use crate::species::{ReferenceError, SpeciesId, SpeciesTable};
use crate::status::StatusLine;
use crate::store::{self, FileStorage, Table, TableStorage};

/// Errors raised while constructing an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Missing units for one already-visited context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklogEntry {
    pub context: EncounterContext,
    pub missing: Vec<RequirementUnit>,
}

/// (context, satisfied, total) as last reported to the navigator.
type Progress = (Option<EncounterContext>, usize, usize);

/// Quota tracking and navigation for one profile.
pub struct QuotaEngine<R, S>
where
    R: Runtime,
    S: TableStorage,
{
    runtime: R,
    storage: S,
    config: QuotaConfig,
    species: Arc<SpeciesTable>,
    route: Arc<RouteOrder>,
    learner: EncounterLearner,
    owned: OwnedShinySet,
    pending_scan: bool,
    capabilities: CapabilityCache,
    navigator: Navigator,
    saved_navigator: NavigatorState,
    location: Option<LocationId>,
    context: Option<EncounterContext>,
    encounter_active: bool,
    last_progress: Option<Progress>,
}

impl<R, S> QuotaEngine<R, S>
where
    R: Runtime,
    S: TableStorage,
{
    /// Restore an engine from its storage.
    ///
    /// Missing or corrupt tables start empty. An interrupted trip resumes as
    /// `Idle`. The stored ownership snapshot is only a placeholder until the
    /// first encounter or tick rescans the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration violates its bounds.
    pub fn new(
        runtime: R,
        storage: S,
        config: QuotaConfig,
        species: Arc<SpeciesTable>,
        route: Arc<RouteOrder>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if route.is_empty() {
            log::warn!("route order is empty; navigation will never travel");
        }

        let learned: LearnedTable = store::load_or_default(&storage, Table::Learned);
        let forms: ObservedForms = store::load_or_default(&storage, Table::ObservedForms);
        let owned: OwnedShinySet = store::load_or_default(&storage, Table::Owned);
        let loaded: NavigatorState = store::load_or_default(&storage, Table::Navigator);
        let restored = loaded.clone().restored();
        if restored != loaded {
            save(&storage, Table::Navigator, &restored);
        }

        log::info!(
            "quota engine ready: {} contexts learned, {} shiny species owned, variant {}",
            learned.len(),
            owned.len(),
            config.variant
        );

        Ok(Self {
            runtime,
            storage,
            config,
            species,
            route,
            learner: EncounterLearner::new(learned, forms),
            pending_scan: true,
            owned,
            capabilities: CapabilityCache::new(config.capability_rules()),
            navigator: Navigator::new(restored.clone(), config.retry, config.on_quota),
            saved_navigator: restored,
            location: None,
            context: None,
            encounter_active: false,
            last_progress: None,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &QuotaConfig {
        &self.config
    }

    #[must_use]
    pub const fn runtime(&self) -> &R {
        &self.runtime
    }

    pub const fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn learner(&self) -> &EncounterLearner {
        &self.learner
    }

    #[must_use]
    pub const fn owned(&self) -> &OwnedShinySet {
        &self.owned
    }

    #[must_use]
    pub const fn navigator(&self) -> &NavigatorState {
        self.navigator.state()
    }

    #[must_use]
    pub const fn context(&self) -> Option<&EncounterContext> {
        self.context.as_ref()
    }

    #[must_use]
    pub const fn location(&self) -> Option<&LocationId> {
        self.location.as_ref()
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        log::log!(level, "{message}");
    }

    /// A wild or static encounter began.
    pub fn on_encounter_start(
        &mut self,
        location: &str,
        raw_method: &str,
        individual: &Individual,
    ) -> StatusLine {
        self.encounter_active = true;
        if self.pending_scan {
            self.rescan_owned();
        }
        let location = LocationId::new(location);
        if self.location.as_ref() != Some(&location) {
            self.enter_location(location.clone());
        }

        let Some(method) = EncounterMethod::normalize(raw_method, self.config.rod_grouping) else {
            log::warn!("unknown encounter method `{raw_method}` at {location}; not learning");
            return self.status();
        };
        let context = EncounterContext::new(location, method);
        let species = self
            .species
            .identify(&individual.species, individual.form.as_deref());
        self.trace(format_args!("encounter {species} on {context}"));
        self.learner
            .record_encounter(&context, &species, &self.species);
        self.context = Some(context);
        self.persist_learned();

        self.reevaluate(false);
        self.status()
    }

    /// A catch was confirmed; rescans ownership before re-evaluating.
    pub fn on_catch_confirmed(&mut self, individual: Option<&Individual>) -> StatusLine {
        if let Some(caught) = individual {
            self.trace(format_args!(
                "caught {}{}",
                caught.species,
                if caught.is_shiny { " (shiny)" } else { "" }
            ));
        }
        self.rescan_owned();
        self.reevaluate(false);
        self.status()
    }

    /// The encounter ended; starts any trip it deferred.
    pub fn on_encounter_finished(&mut self) -> StatusLine {
        self.encounter_active = false;
        let decision = self.navigator.resume(&self.route, &mut self.runtime);
        self.apply(decision);
        self.status()
    }

    /// The player entered a new map.
    pub fn on_map_transition(&mut self, location: &str) -> StatusLine {
        let location = LocationId::new(location);
        if self.location.as_ref() == Some(&location) {
            return self.status();
        }
        self.trace(format_args!("map transition to {location}"));
        self.navigator.on_map_transition(&location, &self.route);
        self.enter_location(location);
        self.refresh_capabilities();
        self.persist_navigator();
        self.reevaluate(true);
        self.status()
    }

    pub fn on_tick(&mut self) -> StatusLine {
        if self.pending_scan {
            self.rescan_owned();
            self.reevaluate(false);
        }
        let decision = self
            .navigator
            .tick(&self.route, self.encounter_active, &mut self.runtime);
        self.apply(decision);
        self.status()
    }

    /// Operator acknowledgment of a block; re-reads capabilities and
    /// re-evaluates.
    pub fn acknowledge_block(&mut self) -> StatusLine {
        if self.navigator.acknowledge() {
            self.sync_position();
            self.capabilities.invalidate();
            self.persist_navigator();
            self.reevaluate(true);
        }
        self.status()
    }

    /// Abort any trip or block.
    pub fn cancel_navigation(&mut self) -> StatusLine {
        if self.navigator.cancel() {
            self.persist_navigator();
        }
        self.status()
    }

    /// Drop the cached capability snapshot, e.g. after a badge or item change.
    pub fn invalidate_capabilities(&mut self) -> StatusLine {
        if self.refresh_capabilities() {
            self.persist_navigator();
            self.reevaluate(true);
        }
        self.status()
    }

    /// Rebuild the owned-shiny set from the runtime.
    pub fn refresh_ownership(&mut self) -> StatusLine {
        self.rescan_owned();
        self.reevaluate(false);
        self.status()
    }

    /// Progress of the current context.
    #[must_use]
    pub fn current_report(&self) -> QuotaReport {
        self.context
            .as_ref()
            .map_or_else(
                || QuotaReport {
                    variant: self.config.variant,
                    ..QuotaReport::default()
                },
                |context| self.report_for(context),
            )
    }

    /// Learned species of the current context whose unit is already met.
    #[must_use]
    pub fn completed_species(&self) -> Vec<SpeciesId> {
        self.current_report().completed
    }

    /// Missing units over route entries up to the confirmed position, limited
    /// to encounter methods the current capabilities allow.
    pub fn backlog(&mut self) -> Vec<BacklogEntry> {
        let Some(position) = self.navigator.position() else {
            return Vec::new();
        };
        let capabilities = self.capabilities.get_cached(&self.runtime).clone();
        let mut backlog = Vec::new();
        for entry in self.route.entries().iter().take(position + 1) {
            for (context, _) in self.learner.learned().at_location(&entry.location) {
                let usable = context
                    .method
                    .required_capability()
                    .is_none_or(|cap| capabilities.holds(&cap));
                if !usable {
                    continue;
                }
                let report = self.report_for(context);
                if !report.missing.is_empty() {
                    backlog.push(BacklogEntry {
                        context: context.clone(),
                        missing: report.missing,
                    });
                }
            }
        }
        for item in &backlog {
            self.trace(format_args!(
                "{} backlog: {} missing",
                item.context,
                item.missing.len()
            ));
        }
        backlog
    }

    /// Current status without handling an event.
    #[must_use]
    pub fn status(&self) -> StatusLine {
        let report = self.current_report();
        let line = StatusLine::new(
            self.context.as_ref(),
            &report,
            self.navigator.status(),
            self.navigator.block(),
        );
        self.trace(format_args!("{line}"));
        line
    }

    fn report_for(&self, context: &EncounterContext) -> QuotaReport {
        let full = QuotaRequirement::derive(
            &self.learner.learned_for(context),
            self.config.quota_rules(),
            &self.species,
        );
        ChamberScoper::new(self.learner.observed_forms())
            .scope_requirement(context, full)
            .evaluate(self.owned.species())
    }

    fn enter_location(&mut self, location: LocationId) {
        let seeded = match self
            .route
            .position_of(&location)
            .and_then(|index| self.route.get(index))
        {
            Some(entry) if !entry.statics.is_empty() => {
                let context = EncounterContext::new(location.clone(), EncounterMethod::Static);
                self.learner.seed(&context, &entry.statics, &self.species)
            }
            _ => false,
        };
        if seeded {
            self.persist_learned();
        }
        self.context = None;
        self.location = Some(location);
    }

    fn rescan_owned(&mut self) {
        self.owned = rescan(&self.runtime, &self.species);
        self.pending_scan = false;
        save(&self.storage, Table::Owned, &self.owned);
    }

    /// Recompute capabilities and let a precondition block clear itself.
    fn refresh_capabilities(&mut self) -> bool {
        self.capabilities.invalidate();
        let capabilities = self.capabilities.get_cached(&self.runtime);
        let cleared = self
            .navigator
            .on_capabilities_changed(capabilities, &self.route);
        if cleared {
            self.sync_position();
        }
        cleared
    }

    /// Confirm the player's current map against the route once a block no
    /// longer holds transitions back.
    fn sync_position(&mut self) {
        if let Some(location) = &self.location
            && self.navigator.on_map_transition(location, &self.route)
        {
            self.last_progress = None;
        }
    }

    /// Hand the current quota to the navigator when it changed, or always when
    /// `force` is set.
    fn reevaluate(&mut self, force: bool) {
        let report = self.current_report();
        let progress = (self.context.clone(), report.satisfied, report.total);
        if !force && self.last_progress.as_ref() == Some(&progress) {
            return;
        }
        self.last_progress = Some(progress);
        if report.is_complete() {
            log::info!(
                "quota met on {}",
                self.context
                    .as_ref()
                    .map_or_else(|| "UNKNOWN".to_string(), ToString::to_string)
            );
        } else if !report.is_vacuous() {
            self.trace(format_args!(
                "{} missing ({}): {}",
                report.variant.label(),
                report.missing_count(),
                report.missing_summary(5)
            ));
        }

        let capabilities = self.capabilities.get_cached(&self.runtime).clone();
        let signal = QuotaSignal {
            complete: report.is_complete(),
            vacuous: report.is_vacuous(),
            location: self.location.as_ref(),
            encounter_active: self.encounter_active,
        };
        let decision =
            self.navigator
                .on_quota_changed(signal, &capabilities, &self.route, &mut self.runtime);
        self.apply(decision);
    }

    fn apply(&mut self, decision: Decision) {
        if let Decision::Arrived(location) = decision {
            log::info!("arrived at {location}");
            self.enter_location(location);
            self.refresh_capabilities();
            self.last_progress = None;
        }
        self.persist_navigator();
    }

    fn persist_learned(&mut self) {
        let dirty = self.learner.take_dirty();
        if dirty.learned {
            save(&self.storage, Table::Learned, self.learner.learned());
        }
        if dirty.forms {
            save(&self.storage, Table::ObservedForms, self.learner.observed_forms());
        }
    }

    fn persist_navigator(&mut self) {
        let state = self.navigator.state();
        if !state.same_as(&self.saved_navigator) {
            save(&self.storage, Table::Navigator, state);
            self.saved_navigator = state.clone();
        }
    }
}

impl<R> QuotaEngine<R, FileStorage>
where
    R: Runtime,
{
    /// Open a file-backed engine: configuration, species table, and route
    /// order are read from their JSON files, and tables live under
    /// `profile_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any input file is missing or invalid, or the
    /// profile directory cannot be created.
    pub fn open(
        runtime: R,
        profile_dir: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
        species_path: impl AsRef<Path>,
        route_path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let config = QuotaConfig::load(config_path)?;
        let species = read_reference(species_path.as_ref(), SpeciesTable::from_json)?;
        let route = read_reference(route_path.as_ref(), RouteOrder::from_json)?;
        let storage = FileStorage::open(profile_dir.as_ref()).with_context(|| {
            format!("Failed to open profile {}", profile_dir.as_ref().display())
        })?;
        Ok(Self::new(
            runtime,
            storage,
            config,
            Arc::new(species),
            Arc::new(route),
        )?)
    }
}

fn read_reference<T>(
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, ReferenceError>,
) -> anyhow::Result<T> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&json).with_context(|| format!("Invalid reference data in {}", path.display()))
}

fn save<T, S>(storage: &S, table: Table, value: &T)
where
    T: Serialize,
    S: TableStorage,
{
    if let Err(err) = store::persist(storage, table, value) {
        log::error!("{err:#}");
    }
}
