//! Route navigation state machine
//!
//! Decides, after each quota change, whether to keep hunting, travel to the
//! next route entry, or stop and wait for the operator. Travel only ever
//! targets the entry right after the last confirmed position, and only while
//! the current quota is complete.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::{Capability, CapabilitySet};
use crate::config::{OnQuotaAction, RetryPolicy};
use crate::context::LocationId;
use crate::route::{RouteEntry, RouteOrder};
use crate::runtime::{ControlHandoff, MovementDelegate, TravelOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigatorStatus {
    #[default]
    Idle,
    Evaluating,
    Traveling,
    Blocked,
    ArrivedAndHunting,
}

impl NavigatorStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Evaluating => "evaluating",
            Self::Traveling => "traveling",
            Self::Blocked => "blocked",
            Self::ArrivedAndHunting => "hunting",
        }
    }
}

impl fmt::Display for NavigatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the navigator stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// The next entry needs capabilities that are not held.
    MissingCapabilities {
        location: LocationId,
        missing: Vec<Capability>,
    },
    /// A known story event stands between here and the next entry.
    StoryGate {
        location: LocationId,
        flag: String,
        #[serde(default)]
        note: String,
    },
    /// Travel failed on every allowed attempt.
    Obstructed { location: LocationId, attempts: u32 },
}

impl BlockReason {
    /// Precondition blocks can clear themselves once capabilities change.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingCapabilities { .. } | Self::StoryGate { .. })
    }

    #[must_use]
    pub const fn location(&self) -> &LocationId {
        match self {
            Self::MissingCapabilities { location, .. }
            | Self::StoryGate { location, .. }
            | Self::Obstructed { location, .. } => location,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCapabilities { location, missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "{location} needs {}", names.join(", "))
            }
            Self::StoryGate { location, flag, note } if note.is_empty() => {
                write!(f, "{location} gated until {flag}")
            }
            Self::StoryGate { location, note, .. } => write!(f, "{location} gated: {note}"),
            Self::Obstructed { location, attempts } => {
                write!(f, "travel to {location} failed {attempts} times")
            }
        }
    }
}

/// Persisted navigator state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigatorState {
    /// Index of the last confirmed route entry.
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub status: NavigatorStatus,
    #[serde(default)]
    pub retry_count: u32,
    /// Ticks left before the next travel attempt.
    #[serde(default)]
    pub cooldown: u32,
    #[serde(default)]
    pub target: Option<usize>,
    #[serde(default)]
    pub block: Option<BlockReason>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NavigatorState {
    /// State as it should resume after a restart: an interrupted evaluation
    /// or trip starts over from `Idle`; position and blocks survive.
    #[must_use]
    pub fn restored(mut self) -> Self {
        if matches!(
            self.status,
            NavigatorStatus::Traveling | NavigatorStatus::Evaluating
        ) {
            log::info!("navigator was {} at shutdown, resuming idle", self.status);
            self.status = NavigatorStatus::Idle;
            self.target = None;
            self.retry_count = 0;
            self.cooldown = 0;
        }
        self
    }

    /// Same logical state, ignoring the timestamp.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.position == other.position
            && self.status == other.status
            && self.retry_count == other.retry_count
            && self.cooldown == other.cooldown
            && self.target == other.target
            && self.block == other.block
    }
}

/// Inputs describing the current quota for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct QuotaSignal<'a> {
    /// Every unit of the current context is satisfied, and there is at least one.
    pub complete: bool,
    /// The current context has no units at all (nothing learned yet).
    pub vacuous: bool,
    pub location: Option<&'a LocationId>,
    pub encounter_active: bool,
}

/// Outcome of a navigator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to do.
    Unchanged,
    /// Keep hunting where the player is.
    Hunt,
    /// Quota met on the last route entry.
    RouteComplete,
    /// Quota met; control handed to the operator.
    HandedOff,
    /// Travel is pending until the current encounter ends.
    Deferred,
    Arrived(LocationId),
    /// A travel attempt failed; retrying after the cooldown.
    Retrying { attempt: u32, cooldown: u32 },
    Waiting { remaining: u32 },
    Blocked(BlockReason),
}

/// The navigator: persisted state plus its fixed policy.
#[derive(Debug, Clone)]
pub struct Navigator {
    state: NavigatorState,
    retry: RetryPolicy,
    on_quota: OnQuotaAction,
}

impl Navigator {
    #[must_use]
    pub const fn new(state: NavigatorState, retry: RetryPolicy, on_quota: OnQuotaAction) -> Self {
        Self {
            state,
            retry,
            on_quota,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &NavigatorState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> NavigatorStatus {
        self.state.status
    }

    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        self.state.position
    }

    #[must_use]
    pub const fn block(&self) -> Option<&BlockReason> {
        self.state.block.as_ref()
    }

    fn set_status(&mut self, status: NavigatorStatus) {
        if self.state.status != status {
            log::info!("navigator {} -> {}", self.state.status, status);
            self.state.status = status;
        }
        self.state.updated_at = Some(Utc::now());
    }

    fn reset_retry(&mut self) {
        self.state.retry_count = 0;
        self.state.cooldown = 0;
    }

    fn enter_blocked(&mut self, reason: BlockReason, io: &mut impl ControlHandoff) -> Decision {
        log::warn!("navigation blocked: {reason}");
        io.request_manual_control(&reason.to_string());
        self.state.target = None;
        self.state.cooldown = 0;
        self.state.block = Some(reason.clone());
        self.set_status(NavigatorStatus::Blocked);
        Decision::Blocked(reason)
    }

    fn hunt(&mut self) -> Decision {
        self.reset_retry();
        self.state.target = None;
        self.set_status(NavigatorStatus::ArrivedAndHunting);
        Decision::Hunt
    }

    /// Re-evaluate after the quota state changed.
    pub fn on_quota_changed<IO>(
        &mut self,
        signal: QuotaSignal<'_>,
        capabilities: &CapabilitySet,
        route: &RouteOrder,
        io: &mut IO,
    ) -> Decision
    where
        IO: MovementDelegate + ControlHandoff,
    {
        match self.state.status {
            NavigatorStatus::Blocked => return Decision::Unchanged,
            NavigatorStatus::Traveling => {
                // Only the quota left behind at the confirmed position can
                // call a trip off; anything else keeps the retry sequence.
                let departure = self
                    .state
                    .position
                    .and_then(|position| route.get(position))
                    .map(|entry| &entry.location);
                if signal.complete || signal.vacuous || departure != signal.location {
                    return Decision::Unchanged;
                }
                log::info!("quota reopened mid-trip, staying to hunt");
                return self.hunt();
            }
            _ => {}
        }
        self.set_status(NavigatorStatus::Evaluating);

        if !signal.complete {
            return self.hunt();
        }
        let Some(position) = self.state.position else {
            log::debug!("no confirmed route position yet");
            return self.hunt();
        };
        let at_position = route
            .get(position)
            .is_some_and(|entry| Some(&entry.location) == signal.location);
        if !at_position {
            log::debug!("player is away from the confirmed route position");
            return self.hunt();
        }
        let next = position + 1;
        let Some(entry) = route.get(next) else {
            self.hunt();
            log::info!("route exhausted at position {position}");
            return Decision::RouteComplete;
        };
        if let Some(reason) = precondition_block(entry, capabilities) {
            return self.enter_blocked(reason, io);
        }
        if self.on_quota == OnQuotaAction::Manual {
            io.request_manual_control(&format!(
                "quota complete; next stop {}",
                entry.location
            ));
            self.state.target = None;
            self.set_status(NavigatorStatus::Idle);
            return Decision::HandedOff;
        }

        self.state.target = Some(next);
        self.reset_retry();
        self.set_status(NavigatorStatus::Traveling);
        if signal.encounter_active {
            log::debug!("travel to {} deferred until the encounter ends", entry.location);
            return Decision::Deferred;
        }
        self.attempt(route, io)
    }

    fn attempt<IO>(&mut self, route: &RouteOrder, io: &mut IO) -> Decision
    where
        IO: MovementDelegate + ControlHandoff,
    {
        let Some((target, entry)) = self
            .state
            .target
            .and_then(|target| route.get(target).map(|entry| (target, entry)))
        else {
            log::warn!("travel target vanished from the route");
            self.reset_retry();
            self.state.target = None;
            self.set_status(NavigatorStatus::Idle);
            return Decision::Unchanged;
        };

        match io.travel_to(&entry.location) {
            TravelOutcome::Arrived => {
                self.arrive(target);
                Decision::Arrived(entry.location.clone())
            }
            outcome @ (TravelOutcome::Blocked | TravelOutcome::Timeout) => {
                self.state.retry_count += 1;
                let attempt = self.state.retry_count;
                log::warn!(
                    "travel to {} attempt {attempt}/{} failed: {outcome:?}",
                    entry.location,
                    self.retry.max_attempts
                );
                if attempt >= self.retry.max_attempts {
                    return self.enter_blocked(
                        BlockReason::Obstructed {
                            location: entry.location.clone(),
                            attempts: attempt,
                        },
                        io,
                    );
                }
                let cooldown = self.retry.backoff_for(attempt);
                self.state.cooldown = cooldown;
                self.state.updated_at = Some(Utc::now());
                Decision::Retrying { attempt, cooldown }
            }
        }
    }

    fn arrive(&mut self, target: usize) {
        self.state.position = Some(target);
        self.state.target = None;
        self.reset_retry();
        self.set_status(NavigatorStatus::ArrivedAndHunting);
    }

    /// Advance the retry cooldown and retry travel when it runs out.
    pub fn tick<IO>(&mut self, route: &RouteOrder, encounter_active: bool, io: &mut IO) -> Decision
    where
        IO: MovementDelegate + ControlHandoff,
    {
        if self.state.status != NavigatorStatus::Traveling {
            return Decision::Unchanged;
        }
        if self.state.cooldown > 0 {
            self.state.cooldown -= 1;
            return Decision::Waiting {
                remaining: self.state.cooldown,
            };
        }
        if encounter_active {
            return Decision::Deferred;
        }
        self.attempt(route, io)
    }

    /// Start a trip that was deferred by an encounter, if no cooldown is pending.
    pub fn resume<IO>(&mut self, route: &RouteOrder, io: &mut IO) -> Decision
    where
        IO: MovementDelegate + ControlHandoff,
    {
        if self.state.status == NavigatorStatus::Traveling && self.state.cooldown == 0 {
            self.attempt(route, io)
        } else {
            Decision::Unchanged
        }
    }

    /// Track the player's position from a map transition.
    ///
    /// Returns whether the confirmed position changed.
    pub fn on_map_transition(&mut self, location: &LocationId, route: &RouteOrder) -> bool {
        let Some(index) = route.position_of(location) else {
            return false;
        };
        if self.state.status == NavigatorStatus::Traveling && self.state.target == Some(index) {
            log::info!("arrived at {location} by map transition");
            self.arrive(index);
            return true;
        }
        let confirms = match self.state.position {
            None => true,
            Some(position) => {
                index == position + 1 && self.state.status != NavigatorStatus::Blocked
            }
        };
        if confirms {
            log::info!("route position confirmed at {location} ({index})");
            self.state.position = Some(index);
            self.state.updated_at = Some(Utc::now());
        }
        confirms
    }

    /// Clear a precondition block the given capabilities now satisfy.
    ///
    /// Returns whether the navigator left `Blocked`.
    pub fn on_capabilities_changed(
        &mut self,
        capabilities: &CapabilitySet,
        route: &RouteOrder,
    ) -> bool {
        let Some(reason) = self.state.block.as_ref().filter(|r| r.is_precondition()) else {
            return false;
        };
        let cleared = route
            .position_of(reason.location())
            .and_then(|index| route.get(index))
            .is_none_or(|entry| precondition_block(entry, capabilities).is_none());
        if cleared {
            log::info!("precondition cleared: {reason}");
            self.unblock();
        }
        cleared
    }

    /// Operator acknowledgment of a block. Returns whether one was cleared.
    pub fn acknowledge(&mut self) -> bool {
        if self.state.status != NavigatorStatus::Blocked {
            return false;
        }
        log::info!("block acknowledged by operator");
        self.unblock();
        true
    }

    /// Abort travel or a block and return to `Idle`.
    pub fn cancel(&mut self) -> bool {
        if !matches!(
            self.state.status,
            NavigatorStatus::Traveling | NavigatorStatus::Blocked
        ) {
            return false;
        }
        log::info!("navigation cancelled");
        self.unblock();
        true
    }

    fn unblock(&mut self) {
        self.state.block = None;
        self.state.target = None;
        self.reset_retry();
        self.set_status(NavigatorStatus::Idle);
    }
}

fn precondition_block(entry: &RouteEntry, capabilities: &CapabilitySet) -> Option<BlockReason> {
    let missing = capabilities.missing(&entry.requires);
    if !missing.is_empty() {
        return Some(BlockReason::MissingCapabilities {
            location: entry.location.clone(),
            missing,
        });
    }
    entry
        .story_gate
        .as_ref()
        .filter(|gate| gate.applies(capabilities))
        .map(|gate| BlockReason::StoryGate {
            location: entry.location.clone(),
            flag: gate.flag.clone(),
            note: gate.note.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ScriptedIo {
        outcomes: VecDeque<TravelOutcome>,
        trips: Vec<LocationId>,
        handoffs: Vec<String>,
    }

    impl MovementDelegate for ScriptedIo {
        fn travel_to(&mut self, location: &LocationId) -> TravelOutcome {
            self.trips.push(location.clone());
            self.outcomes.pop_front().unwrap_or(TravelOutcome::Arrived)
        }
    }

    impl ControlHandoff for ScriptedIo {
        fn request_manual_control(&mut self, reason: &str) {
            self.handoffs.push(reason.to_string());
        }
    }

    fn route() -> RouteOrder {
        RouteOrder::new(vec![
            RouteEntry::new("ROUTE_101"),
            RouteEntry::new("ROUTE_102"),
            RouteEntry::new("ROUTE_103").requiring(Capability::Surf),
        ])
        .unwrap()
    }

    fn navigator(position: Option<usize>) -> Navigator {
        Navigator::new(
            NavigatorState {
                position,
                ..NavigatorState::default()
            },
            RetryPolicy {
                max_attempts: 3,
                base_backoff_ticks: 2,
                max_backoff_ticks: 3,
            },
            OnQuotaAction::Navigate,
        )
    }

    fn signal(complete: bool, location: &LocationId) -> QuotaSignal<'_> {
        QuotaSignal {
            complete,
            vacuous: false,
            location: Some(location),
            encounter_active: false,
        }
    }

    #[test]
    fn incomplete_quota_never_travels() {
        let route = route();
        let here = LocationId::new("ROUTE_101");
        let mut nav = navigator(Some(0));
        let mut io = ScriptedIo::default();
        let decision = nav.on_quota_changed(signal(false, &here), &CapabilitySet::default(), &route, &mut io);
        assert_eq!(decision, Decision::Hunt);
        assert_eq!(nav.status(), NavigatorStatus::ArrivedAndHunting);
        assert!(io.trips.is_empty());
    }

    #[test]
    fn complete_quota_travels_one_step() {
        let route = route();
        let here = LocationId::new("ROUTE_101");
        let mut nav = navigator(Some(0));
        let mut io = ScriptedIo::default();
        let decision = nav.on_quota_changed(signal(true, &here), &CapabilitySet::default(), &route, &mut io);
        assert_eq!(decision, Decision::Arrived(LocationId::new("ROUTE_102")));
        assert_eq!(nav.position(), Some(1));
        assert_eq!(io.trips, vec![LocationId::new("ROUTE_102")]);

        // Away from the confirmed position: stay put.
        let elsewhere = LocationId::new("ROUTE_101");
        let decision = nav.on_quota_changed(signal(true, &elsewhere), &CapabilitySet::default(), &route, &mut io);
        assert_eq!(decision, Decision::Hunt);
        assert_eq!(io.trips.len(), 1);
    }

    #[test]
    fn three_obstructions_block_once() {
        let route = route();
        let here = LocationId::new("ROUTE_101");
        let mut nav = navigator(Some(0));
        let mut io = ScriptedIo {
            outcomes: VecDeque::from(vec![TravelOutcome::Blocked; 5]),
            ..ScriptedIo::default()
        };
        let caps = CapabilitySet::default();
        assert_eq!(
            nav.on_quota_changed(signal(true, &here), &caps, &route, &mut io),
            Decision::Retrying {
                attempt: 1,
                cooldown: 2
            }
        );
        let mut blocked = 0;
        for _ in 0..20 {
            if let Decision::Blocked(BlockReason::Obstructed { attempts, .. }) =
                nav.tick(&route, false, &mut io)
            {
                assert_eq!(attempts, 3);
                blocked += 1;
            }
        }
        assert_eq!(blocked, 1);
        assert_eq!(io.trips.len(), 3);
        assert_eq!(io.handoffs.len(), 1);
        assert_eq!(nav.status(), NavigatorStatus::Blocked);
        assert_eq!(nav.state().retry_count, 3);

        // Further quota changes do nothing until acknowledged.
        assert_eq!(
            nav.on_quota_changed(signal(true, &here), &caps, &route, &mut io),
            Decision::Unchanged
        );
        assert!(nav.acknowledge());
        assert_eq!(nav.status(), NavigatorStatus::Idle);
        assert_eq!(nav.state().retry_count, 0);
        assert_eq!(io.trips.len(), 3);
    }

    #[test]
    fn missing_capability_blocks_then_resumes() {
        let route = route();
        let here = LocationId::new("ROUTE_102");
        let mut nav = navigator(Some(1));
        let mut io = ScriptedIo::default();
        let decision = nav.on_quota_changed(signal(true, &here), &CapabilitySet::default(), &route, &mut io);
        assert!(matches!(
            decision,
            Decision::Blocked(BlockReason::MissingCapabilities { .. })
        ));
        assert!(io.trips.is_empty());
        assert_eq!(io.handoffs.len(), 1);

        assert!(!nav.on_capabilities_changed(&CapabilitySet::default(), &route));
        let surf: CapabilitySet = [Capability::Surf].into_iter().collect();
        assert!(nav.on_capabilities_changed(&surf, &route));
        assert_eq!(nav.status(), NavigatorStatus::Idle);
        assert_eq!(
            nav.on_quota_changed(signal(true, &here), &surf, &route, &mut io),
            Decision::Arrived(LocationId::new("ROUTE_103"))
        );
    }

    #[test]
    fn pending_retry_survives_leaving_the_departure_point() {
        let route = route();
        let here = LocationId::new("ROUTE_101");
        let gatehouse = LocationId::new("ROUTE_101_GATEHOUSE");
        let mut nav = navigator(Some(0));
        let mut io = ScriptedIo {
            outcomes: VecDeque::from(vec![TravelOutcome::Timeout]),
            ..ScriptedIo::default()
        };
        let caps = CapabilitySet::default();
        assert!(matches!(
            nav.on_quota_changed(signal(true, &here), &caps, &route, &mut io),
            Decision::Retrying { attempt: 1, .. }
        ));

        let nothing_learned = QuotaSignal {
            vacuous: true,
            ..signal(false, &gatehouse)
        };
        assert_eq!(
            nav.on_quota_changed(nothing_learned, &caps, &route, &mut io),
            Decision::Unchanged
        );
        assert_eq!(
            nav.on_quota_changed(signal(false, &gatehouse), &caps, &route, &mut io),
            Decision::Unchanged
        );
        assert_eq!(nav.status(), NavigatorStatus::Traveling);
        assert_eq!(nav.state().retry_count, 1);

        assert_eq!(
            nav.on_quota_changed(signal(false, &here), &caps, &route, &mut io),
            Decision::Hunt
        );
        assert_eq!(nav.state().retry_count, 0);
    }

    #[test]
    fn obstruction_does_not_auto_resume() {
        let route = route();
        let mut nav = navigator(Some(0));
        nav.state.status = NavigatorStatus::Blocked;
        nav.state.block = Some(BlockReason::Obstructed {
            location: "ROUTE_102".into(),
            attempts: 3,
        });
        let surf: CapabilitySet = [Capability::Surf].into_iter().collect();
        assert!(!nav.on_capabilities_changed(&surf, &route));
        assert!(nav.cancel());
        assert_eq!(nav.status(), NavigatorStatus::Idle);
    }

    #[test]
    fn map_transitions_confirm_only_the_next_position() {
        let route = route();
        let mut nav = navigator(None);
        assert!(nav.on_map_transition(&"ROUTE_102".into(), &route));
        assert_eq!(nav.position(), Some(1));
        assert!(!nav.on_map_transition(&"ROUTE_101".into(), &route));
        assert!(!nav.on_map_transition(&"PETALBURG_CITY".into(), &route));
        assert!(nav.on_map_transition(&"ROUTE_103".into(), &route));
        assert_eq!(nav.position(), Some(2));
    }

    #[test]
    fn route_end_and_manual_handoff() {
        let route = route();
        let mut io = ScriptedIo::default();
        let last = LocationId::new("ROUTE_103");
        let mut nav = navigator(Some(2));
        assert_eq!(
            nav.on_quota_changed(signal(true, &last), &CapabilitySet::default(), &route, &mut io),
            Decision::RouteComplete
        );

        let here = LocationId::new("ROUTE_101");
        let mut manual = Navigator::new(
            NavigatorState {
                position: Some(0),
                ..NavigatorState::default()
            },
            RetryPolicy::default(),
            OnQuotaAction::Manual,
        );
        assert_eq!(
            manual.on_quota_changed(signal(true, &here), &CapabilitySet::default(), &route, &mut io),
            Decision::HandedOff
        );
        assert_eq!(manual.status(), NavigatorStatus::Idle);
        assert!(io.trips.is_empty());
        assert_eq!(io.handoffs.len(), 1);
    }

    #[test]
    fn encounter_defers_travel_until_tick() {
        let route = route();
        let here = LocationId::new("ROUTE_101");
        let mut nav = navigator(Some(0));
        let mut io = ScriptedIo::default();
        let busy = QuotaSignal {
            encounter_active: true,
            ..signal(true, &here)
        };
        assert_eq!(
            nav.on_quota_changed(busy, &CapabilitySet::default(), &route, &mut io),
            Decision::Deferred
        );
        assert_eq!(nav.tick(&route, true, &mut io), Decision::Deferred);
        assert!(io.trips.is_empty());
        assert_eq!(
            nav.tick(&route, false, &mut io),
            Decision::Arrived(LocationId::new("ROUTE_102"))
        );
    }

    #[test]
    fn restore_resets_in_flight_states() {
        let traveling = NavigatorState {
            position: Some(4),
            status: NavigatorStatus::Traveling,
            retry_count: 2,
            cooldown: 10,
            target: Some(5),
            ..NavigatorState::default()
        }
        .restored();
        assert_eq!(traveling.status, NavigatorStatus::Idle);
        assert_eq!(traveling.position, Some(4));
        assert_eq!((traveling.retry_count, traveling.target), (0, None));

        let blocked = NavigatorState {
            status: NavigatorStatus::Blocked,
            retry_count: 3,
            ..NavigatorState::default()
        }
        .restored();
        assert_eq!(blocked.status, NavigatorStatus::Blocked);
        assert_eq!(blocked.retry_count, 3);
    }
}
