//! The simulation aggregate.
//!
//! [`Simulation`] owns every piece of mutable state: the agent and world
//! registries, the action machine and its tasks, the sensory memory, the
//! decision broker, and the trigger queue. All mutation happens through
//! `&mut self`, on one logical thread. The async runner in
//! [`runner`](crate::runner) drives it with timers and feeds oracle answers
//! back in; tests drive it directly with explicit simulation times.
//!
//! Decision requests are not sent from here. They are queued in an outbox
//! and collected with [`Simulation::take_requests`], which keeps this type
//! free of I/O.

use std::time::Duration;

use meadow_agents::{
    ActionError, ActionEvent, ActionMachine, AgentRegistry, messaging,
};
use meadow_types::{
    ActionKind, AgentId, CompletedAction, Position, WorldEvent,
};
use meadow_world::WorldRegistry;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::broker::DecisionBroker;
use crate::collection::collect_coins;
use crate::config::{ConfigError, SimulationConfig};
use crate::decision::{DecisionOutcome, DecisionRequest};
use crate::observer::{NoOpObserver, WorldObserver};
use crate::sensory::{SensorySystem, build_snapshot};
use crate::trigger::{Trigger, TriggerQueue};

/// Text of the notification every agent receives once the last coin is
/// picked up.
pub const ALL_COINS_COLLECTED_NOTICE: &str =
    "All coins have been collected. There are no more coins to find.";

/// Tunables the simulation consults every cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Radius within which agents and objects are perceived.
    pub observation_radius: f64,
    /// Radius within which a coin is picked up.
    pub collection_radius: f64,
    /// Idle time after which the watchdog forces a decision.
    pub stuck_threshold: Duration,
    /// Spacing between the initial decision requests on start.
    pub initial_stagger: Duration,
}

impl SimulationSettings {
    /// Extract the settings from a loaded configuration.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            observation_radius: config.sensing.observation_radius,
            collection_radius: config.sensing.collection_radius,
            stuck_threshold: Duration::from_millis(config.timing.stuck_threshold_ms),
            initial_stagger: Duration::from_millis(config.timing.initial_stagger_ms),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            observation_radius: 1.0,
            collection_radius: 0.5,
            stuck_threshold: Duration::from_secs(5),
            initial_stagger: Duration::from_millis(300),
        }
    }
}

/// A decision request waiting to be sent to the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDecision {
    /// The request.
    pub request: DecisionRequest,
    /// How long to wait before sending it.
    pub delay: Duration,
}

/// Serializable summary of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    /// Agent id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current action.
    pub action: ActionKind,
    /// Current position.
    pub position: Position,
    /// Coins picked up so far.
    pub coins_collected: u32,
    /// Whether the agent is waiting on the oracle.
    pub decision_in_flight: bool,
    /// Unread messages.
    pub inbox_len: usize,
}

/// Serializable summary of the whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStatus {
    /// Whether the scheduler is driving the simulation.
    pub running: bool,
    /// Simulation time in milliseconds.
    pub simulation_time_ms: u64,
    /// Uncollected coins.
    pub coins_remaining: u32,
    /// Every agent, in roster order.
    pub agents: Vec<AgentStatus>,
}

/// The event-driven simulation core.
pub struct Simulation {
    agents: AgentRegistry,
    world: WorldRegistry,
    machine: ActionMachine,
    sensory: SensorySystem,
    broker: DecisionBroker,
    triggers: TriggerQueue,
    observer: Box<dyn WorldObserver>,
    settings: SimulationSettings,
    running: bool,
    coins_announced: bool,
    outbox: Vec<PendingDecision>,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("agents", &self.agents.len())
            .field("running", &self.running)
            .field("pending_triggers", &self.triggers.len())
            .field("outbox", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Assemble a stopped simulation from its parts.
    pub fn new(
        agents: AgentRegistry,
        world: WorldRegistry,
        machine: ActionMachine,
        settings: SimulationSettings,
    ) -> Self {
        Self {
            agents,
            world,
            machine,
            sensory: SensorySystem::new(),
            broker: DecisionBroker::new(),
            triggers: TriggerQueue::new(),
            observer: Box::new(NoOpObserver),
            settings,
            running: false,
            coins_announced: false,
            outbox: Vec::new(),
        }
    }

    /// Build a stopped simulation from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the roster or coin layout is
    /// unusable.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let agents = AgentRegistry::new(config.profiles())?;
        let world = WorldRegistry::new(
            &config.world.landmarks,
            config.coin_layout()?,
            config.world.seed,
        );
        Ok(Self::new(
            agents,
            world,
            ActionMachine::new(config.action_timings()),
            SimulationSettings::from_config(config),
        ))
    }

    /// Replace the event observer.
    #[must_use]
    pub fn with_observer(mut self, observer: impl WorldObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// The agent registry.
    pub const fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// The world object registry.
    pub const fn world(&self) -> &WorldRegistry {
        &self.world
    }

    /// The action machine.
    pub const fn machine(&self) -> &ActionMachine {
        &self.machine
    }

    /// The settings in use.
    pub const fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Whether the scheduler is driving the simulation.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Take every decision request queued since the last call.
    pub fn take_requests(&mut self) -> Vec<PendingDecision> {
        std::mem::take(&mut self.outbox)
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Start the simulation at `now`.
    ///
    /// Every agent is coerced to `Idle` and given an initial decision
    /// request, staggered by the configured spacing. Returns `false` if
    /// the simulation was already running.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.running {
            debug!("start ignored, simulation already running");
            return false;
        }
        self.running = true;
        let events = self.machine.idle_all(&mut self.agents, now);
        self.handle_action_events(events);
        self.emit(WorldEvent::SimulationStarted);
        info!(agents = self.agents.len(), "simulation started");

        let mut delay = Duration::ZERO;
        for id in self.agents.ids().to_vec() {
            debug!(agent_id = %id, trigger = Trigger::Initial.name(), "trigger routed");
            self.request(&id, now, delay);
            delay = delay.saturating_add(self.settings.initial_stagger);
        }
        true
    }

    /// Stop the simulation.
    ///
    /// Cancels every scheduled task and pending trigger and releases every
    /// in-flight decision mark; agent state is otherwise left as it is.
    /// Requests already handed to the oracle may still answer, but their
    /// ids no longer match, so the answers are discarded. Safe to call
    /// when already stopped. Returns `false` in that case.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.machine.cancel_all();
        self.triggers.clear();
        self.outbox.clear();
        let abandoned = self.agents.release_pending_decisions();
        if !self.running {
            return false;
        }
        self.running = false;
        self.emit(WorldEvent::SimulationStopped);
        info!(
            cancelled_tasks = cancelled,
            abandoned_decisions = abandoned,
            "simulation stopped"
        );
        true
    }

    /// Stop, then restore every agent to its configured initial state and
    /// regenerate the collectibles.
    pub fn reset(&mut self) {
        self.stop();
        self.agents.reset_to_initial();
        let objects = self.world.regenerate().to_vec();
        self.sensory.clear();
        self.coins_announced = false;

        self.emit(WorldEvent::SimulationReset);
        self.emit(WorldEvent::ObjectsGenerated { objects });
        for id in self.agents.ids().to_vec() {
            self.emit_agent(&id);
        }
        info!(
            agents = self.agents.len(),
            coins = self.world.coins_remaining(),
            "simulation reset"
        );
    }

    /// Ask the oracle for a decision for `id` right away.
    ///
    /// Does nothing and returns `false` unless the simulation is running,
    /// the agent exists, is `Idle`, and has no decision in flight.
    pub fn force_decision(&mut self, id: &AgentId, now: Duration) -> bool {
        if !self.running {
            return false;
        }
        let Some(agent) = self.agents.get(id) else {
            warn!(agent_id = %id, "forced decision for unknown agent ignored");
            return false;
        };
        if !agent.action.is_idle() {
            debug!(agent_id = %id, action = agent.action.kind().as_str(), "forced decision ignored, agent busy");
            return false;
        }
        debug!(agent_id = %id, trigger = Trigger::Forced.name(), "trigger routed");
        self.request(id, now, Duration::ZERO)
    }

    // -------------------------------------------------------------------
    // Cycles
    // -------------------------------------------------------------------

    /// Run one observation cycle at `now`.
    ///
    /// Diffs every agent's surroundings first, then resolves coin
    /// collection, announces an emptied world, runs the watchdog, and
    /// finally dispatches the accumulated triggers.
    pub fn observation_cycle(&mut self, now: Duration) {
        if !self.running {
            return;
        }

        for id in self.agents.ids().to_vec() {
            let Some(agent) = self.agents.get(&id) else {
                continue;
            };
            let snapshot = build_snapshot(
                agent,
                &self.agents,
                &self.world,
                self.settings.observation_radius,
                now,
            );
            let diff = self.sensory.observe(&snapshot);
            if diff.is_empty() {
                continue;
            }
            debug!(
                agent_id = %id,
                new_agents = diff.new_agents.len(),
                agents_left = diff.agents_left.len(),
                new_objects = diff.new_objects.len(),
                objects_left = diff.objects_left.len(),
                "observation changed"
            );
            for trigger in diff.into_triggers() {
                self.triggers.push(id.clone(), trigger);
            }
        }

        for collection in collect_coins(
            &mut self.agents,
            &mut self.world,
            self.settings.collection_radius,
        ) {
            self.emit(WorldEvent::ObjectCollected {
                object_id: collection.object_id,
                collected_by: collection.agent_id.clone(),
            });
            self.emit(WorldEvent::ActionCompleted {
                agent_id: collection.agent_id.clone(),
                action: CompletedAction::CollectCoin,
            });
            self.triggers.push(
                collection.agent_id,
                Trigger::ActionCompletion(CompletedAction::CollectCoin),
            );
        }

        if !self.coins_announced && self.world.all_collected() {
            self.coins_announced = true;
            messaging::notify_all(&mut self.agents, ALL_COINS_COLLECTED_NOTICE);
            self.emit(WorldEvent::AllCoinsCollected);
            info!("all coins collected");
            for id in self.agents.ids().to_vec() {
                self.triggers.push(id, Trigger::AllCoinsCollected);
            }
        }

        self.run_watchdog(now);
        self.dispatch(now);
    }

    fn run_watchdog(&mut self, now: Duration) {
        let threshold = self.settings.stuck_threshold;
        let stuck: Vec<AgentId> = self
            .agents
            .all()
            .filter(|a| a.action.is_idle() && !a.decision_in_flight())
            .filter(|a| {
                let since = a.last_decision_at.map_or(a.idle_since, |t| t.max(a.idle_since));
                now.saturating_sub(since) > threshold
            })
            .map(|a| a.id.clone())
            .collect();
        for id in stuck {
            info!(agent_id = %id, "agent idle past threshold, forcing decision");
            self.triggers.push(id, Trigger::Watchdog);
        }
    }

    /// Advance movement, speech, and rest timers to `now`.
    pub fn advance_frame(&mut self, now: Duration) {
        if !self.running {
            return;
        }
        let events = self.machine.advance(&mut self.agents, now);
        if events.is_empty() {
            return;
        }
        self.handle_action_events(events);
        self.dispatch(now);
    }

    /// Feed an oracle answer back in.
    ///
    /// Stale answers and oracle failures only clear the in-flight mark.
    /// A decision that arrives while the simulation is stopped is
    /// discarded. Malformed decisions leave the agent `Idle`.
    pub fn apply_outcome(&mut self, outcome: DecisionOutcome, now: Duration) {
        let agent_id = outcome.agent_id.clone();
        let Some(decision) = self.broker.finish(&mut self.agents, outcome) else {
            return;
        };
        if !self.running {
            debug!(agent_id = %agent_id, "simulation stopped, decision discarded");
            return;
        }

        match self.machine.apply(&mut self.agents, &agent_id, &decision, now) {
            Ok(events) => self.handle_action_events(events),
            Err(ActionError::MalformedDecision { reason }) => {
                error!(agent_id = %agent_id, decision = %decision.summary(), reason = %reason, "malformed decision ignored");
            }
            Err(ActionError::Agent(e)) => {
                warn!(agent_id = %agent_id, error = %e, "decision for unknown agent ignored");
            }
        }
        self.dispatch(now);
    }

    // -------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------

    fn handle_action_events(&mut self, events: Vec<ActionEvent>) {
        for event in events {
            match event {
                ActionEvent::Updated(id) => self.emit_agent(&id),
                ActionEvent::Completed { agent_id, action } => {
                    self.emit_agent(&agent_id);
                    self.emit(WorldEvent::ActionCompleted {
                        agent_id: agent_id.clone(),
                        action,
                    });
                    self.triggers.push(agent_id, Trigger::ActionCompletion(action));
                }
                ActionEvent::TextDelivered { from, to } => {
                    self.triggers.push(to, Trigger::ReceivedText { from });
                }
                ActionEvent::Observed(id) => {
                    self.sensory.forget(&id);
                    self.emit_agent(&id);
                }
            }
        }
    }

    /// Route every queued trigger to the broker.
    fn dispatch(&mut self, now: Duration) {
        while let Some((id, trigger)) = self.triggers.pop() {
            let Some((idle, in_flight)) = self
                .agents
                .get(&id)
                .map(|a| (a.action.is_idle(), a.decision_in_flight()))
            else {
                warn!(agent_id = %id, trigger = trigger.name(), "trigger for unknown agent dropped");
                continue;
            };
            if in_flight {
                debug!(agent_id = %id, trigger = trigger.name(), "decision in flight, trigger dropped");
                continue;
            }
            if trigger.interrupts() {
                match self.machine.interrupt(&mut self.agents, &id, now) {
                    Ok(true) => self.emit_agent(&id),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(agent_id = %id, error = %e, "interrupt failed");
                        continue;
                    }
                }
            } else if !idle {
                debug!(agent_id = %id, trigger = trigger.name(), "agent busy, trigger ignored");
                continue;
            }
            debug!(agent_id = %id, trigger = trigger.name(), "trigger routed");
            self.request(&id, now, Duration::ZERO);
        }
    }

    fn request(&mut self, id: &AgentId, now: Duration, delay: Duration) -> bool {
        match self.broker.begin(
            &mut self.agents,
            &self.world,
            id,
            self.settings.observation_radius,
            now,
        ) {
            Ok(Some(request)) => {
                self.outbox.push(PendingDecision { request, delay });
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(agent_id = %id, error = %e, "decision request failed");
                false
            }
        }
    }

    // -------------------------------------------------------------------
    // Events and status
    // -------------------------------------------------------------------

    fn emit(&mut self, event: WorldEvent) {
        self.observer.on_event(&event);
    }

    fn emit_agent(&mut self, id: &AgentId) {
        let Some(agent) = self.agents.get(id) else {
            return;
        };
        let event = WorldEvent::AgentUpdated {
            agent_id: agent.id.clone(),
            position: agent.position,
            action: agent.action.kind(),
            utterance: agent.utterance.clone(),
        };
        self.emit(event);
    }

    /// A serializable summary at simulation time `now`.
    pub fn status(&self, now: Duration) -> SimulationStatus {
        SimulationStatus {
            running: self.running,
            simulation_time_ms: u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
            coins_remaining: self.world.coins_remaining(),
            agents: self
                .agents
                .all()
                .map(|a| AgentStatus {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    action: a.action.kind(),
                    position: a.position,
                    coins_collected: a.coins_collected,
                    decision_in_flight: a.decision_in_flight(),
                    inbox_len: a.inbox.len(),
                })
                .collect(),
        }
    }
}
