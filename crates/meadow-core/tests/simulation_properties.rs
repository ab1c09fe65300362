//! Integration tests for the simulation core.
//!
//! Each test drives a [`Simulation`] through its public lifecycle with
//! explicit simulation times, answering decision requests by hand where a
//! real run would use the oracle. The last test runs the full async
//! scheduler under paused tokio time.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use meadow_agents::{ActionMachine, ActionTimings, AgentRegistry};
use meadow_core::decision::{DecisionOutcome, ScriptedOracle};
use meadow_core::observer::RecordingObserver;
use meadow_core::operator::control_channel;
use meadow_core::runner::{RunnerConfig, run_simulation};
use meadow_core::simulation::PendingDecision;
use meadow_core::{Simulation, SimulationConfig, SimulationSettings};
use meadow_types::{
    ActionKind, AgentColor, AgentId, AgentProfile, CompletedAction, Decision, ObjectId,
    ObjectKind, Position, WorldEvent, WorldObject,
};
use meadow_world::{CoinLayout, WorldRegistry};

const EPSILON: f64 = 1e-6;

fn profile(id: &str, name: &str, x: f64, z: f64) -> AgentProfile {
    AgentProfile {
        id: AgentId::new(id),
        name: name.to_owned(),
        personality: String::from("Even-tempered"),
        color: AgentColor::Yellow,
        initial_position: Position::new(x, 0.6, z),
    }
}

fn coin(x: f64, z: f64) -> WorldObject {
    WorldObject {
        id: ObjectId::new(),
        name: String::from("Coin 1"),
        position: Position::new(x, 0.0, z),
        kind: ObjectKind::Collectible,
        collected: false,
    }
}

/// Alice at the origin, Bob far away on the other side of the meadow.
fn meadow(objects: Vec<WorldObject>) -> (Simulation, RecordingObserver) {
    let agents = AgentRegistry::new(vec![
        profile("agent1", "Alice", 0.0, 0.0),
        profile("agent2", "Bob", -3.0, -3.0),
    ])
    .unwrap();
    let world = WorldRegistry::from_objects(objects, CoinLayout::new(3, 4.0).unwrap(), 11);
    let recorder = RecordingObserver::new();
    let sim = Simulation::new(
        agents,
        world,
        ActionMachine::new(ActionTimings::default()),
        SimulationSettings::default(),
    )
    .with_observer(recorder.clone());
    (sim, recorder)
}

fn alice() -> AgentId {
    AgentId::new("agent1")
}

fn bob() -> AgentId {
    AgentId::new("agent2")
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn find(pending: &[PendingDecision], id: &AgentId) -> PendingDecision {
    pending
        .iter()
        .find(|p| &p.request.agent_id == id)
        .cloned()
        .unwrap()
}

fn answer(sim: &mut Simulation, pending: &PendingDecision, decision: Decision, now: Duration) {
    sim.apply_outcome(
        DecisionOutcome {
            agent_id: pending.request.agent_id.clone(),
            decision_id: pending.request.decision_id,
            result: Ok(decision),
        },
        now,
    );
}

fn assert_goal_only_while_moving(sim: &Simulation) {
    for agent in sim.agents().all() {
        assert_eq!(
            agent.action.goal_target().is_some(),
            agent.action.kind() == ActionKind::Moving,
            "agent {} has goal {:?} while {:?}",
            agent.id,
            agent.action.goal_target(),
            agent.action.kind()
        );
    }
}

#[test]
fn at_most_one_decision_in_flight_per_agent() {
    let (mut sim, _) = meadow(vec![coin(0.8, 0.0)]);
    sim.start(Duration::ZERO);
    let first = sim.take_requests();
    assert_eq!(first.len(), 2);

    // Observation changes, forced requests, and the watchdog all fire while
    // the first requests are still outstanding.
    for step in 1..=14 {
        let now = ms(step * 500);
        sim.observation_cycle(now);
        assert!(!sim.force_decision(&alice(), now));
        assert!(sim.take_requests().is_empty());
    }

    answer(&mut sim, &find(&first, &alice()), Decision::idle(), ms(7100));
    assert!(!sim.agents().get(&alice()).unwrap().decision_in_flight());
    assert!(sim.agents().get(&bob()).unwrap().decision_in_flight());
}

#[test]
fn goal_target_exists_only_while_moving() {
    let (mut sim, _) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    assert_goal_only_while_moving(&sim);

    answer(&mut sim, &find(&pending, &alice()), Decision::approach("Bob"), ms(10));
    answer(&mut sim, &find(&pending, &bob()), Decision::idle(), ms(10));
    assert_goal_only_while_moving(&sim);
    assert_eq!(
        sim.agents().get(&alice()).unwrap().action.kind(),
        ActionKind::Moving
    );

    let mut now = ms(10);
    while now < ms(6000) {
        now = now.saturating_add(ms(50));
        sim.advance_frame(now);
        assert_goal_only_while_moving(&sim);
    }
    assert!(sim.agents().get(&alice()).unwrap().action.is_idle());
}

#[test]
fn stop_twice_equals_stop_once() {
    let (mut sim, recorder) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &alice()), Decision::move_to(3.0, 0.0), ms(100));
    sim.advance_frame(ms(600));

    sim.stop();
    let once = sim.status(ms(700));
    let events_once = recorder.events().len();
    sim.stop();
    let twice = sim.status(ms(700));

    assert_eq!(once, twice);
    assert_eq!(recorder.events().len(), events_once);
    assert!(sim.machine().tasks().is_empty());

    // Agent state is left as it was, mid-walk.
    let alice_state = sim.agents().get(&alice()).unwrap();
    assert_eq!(alice_state.action.kind(), ActionKind::Moving);
    assert!(alice_state.position.x > 0.0);
}

#[test]
fn stop_on_a_stopped_simulation_is_harmless() {
    let (mut sim, recorder) = meadow(Vec::new());
    assert!(!sim.stop());
    assert!(!sim.stop());
    assert!(recorder.events().is_empty());
}

#[test]
fn reset_round_trips_to_initial_state() {
    let (mut sim, recorder) = meadow(vec![coin(0.3, 0.0)]);
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &bob()), Decision::move_to(-1.0, -1.0), ms(100));
    sim.observation_cycle(ms(500));
    sim.advance_frame(ms(900));
    assert_eq!(sim.agents().get(&alice()).unwrap().coins_collected, 1);

    sim.reset();

    for agent in sim.agents().all() {
        let initial = sim.agents().profile(&agent.id).unwrap().initial_position;
        assert_eq!(agent.position, initial);
        assert_eq!(agent.coins_collected, 0);
        assert!(agent.action.is_idle());
        assert!(!agent.decision_in_flight());
        assert!(agent.inbox.is_empty());
    }
    assert_eq!(sim.world().coins_remaining(), 3);

    let generated = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, WorldEvent::ObjectsGenerated { .. }))
        .count();
    assert_eq!(generated, 1);

    // Answers to requests issued before the reset are discarded.
    answer(&mut sim, &find(&pending, &alice()), Decision::move_to(2.0, 2.0), ms(1000));
    assert!(sim.agents().get(&alice()).unwrap().action.is_idle());
}

#[test]
fn move_from_origin_completes_once_at_target() {
    let (mut sim, recorder) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &alice()), Decision::move_to(4.0, 0.0), Duration::ZERO);

    // distance 4 at 2 units/s
    let mut now = Duration::ZERO;
    while now < ms(2000) {
        now = now.saturating_add(ms(50));
        sim.advance_frame(now);
    }
    let arrived = sim.agents().get(&alice()).unwrap();
    assert!((arrived.position.x - 4.0).abs() < EPSILON);
    assert!(arrived.position.z.abs() < EPSILON);

    for _ in 0..20 {
        now = now.saturating_add(ms(50));
        sim.advance_frame(now);
    }
    let completions = recorder
        .events()
        .into_iter()
        .filter(|e| {
            *e == WorldEvent::ActionCompleted {
                agent_id: alice(),
                action: CompletedAction::Move,
            }
        })
        .count();
    assert_eq!(completions, 1);

    // The completion turned into exactly one new request.
    let follow_up = sim.take_requests();
    assert_eq!(follow_up.len(), 1);
    assert_eq!(follow_up.first().unwrap().request.agent_id, alice());
}

#[test]
fn text_lands_in_inbox_and_is_read_once() {
    let (mut sim, _) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();

    // Bob is still waiting on the oracle, so the received_text trigger is
    // dropped and the message waits in the inbox.
    answer(&mut sim, &find(&pending, &alice()), Decision::text("Bob", "hi"), ms(100));
    let inbox = &sim.agents().get(&bob()).unwrap().inbox;
    assert_eq!(inbox.len(), 1);
    let message = inbox.first().unwrap();
    assert_eq!(message.sender, "Alice");
    assert_eq!(message.message, "hi");

    let alice_state = sim.agents().get(&alice()).unwrap();
    assert_eq!(alice_state.action.kind(), ActionKind::Speaking);
    assert_eq!(alice_state.utterance.as_deref(), Some("hi"));

    answer(&mut sim, &find(&pending, &bob()), Decision::observe(), ms(200));
    assert!(sim.force_decision(&bob(), ms(300)));
    let requests = sim.take_requests();
    let request = &requests.first().unwrap().request;
    assert_eq!(request.messages.len(), 1);
    assert!(sim.agents().get(&bob()).unwrap().inbox.is_empty());

    // Speech ends after the display window.
    sim.advance_frame(ms(2700));
    let alice_state = sim.agents().get(&alice()).unwrap();
    assert!(alice_state.action.is_idle());
    assert!(alice_state.utterance.is_none());
}

#[test]
fn text_to_unknown_agent_still_speaks() {
    let (mut sim, _) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &alice()), Decision::text("Carol", "hello?"), ms(100));

    let alice_state = sim.agents().get(&alice()).unwrap();
    assert_eq!(alice_state.action.kind(), ActionKind::Speaking);
    assert!(sim.agents().get(&bob()).unwrap().inbox.is_empty());
}

#[test]
fn nearby_coin_is_collected_exactly_once() {
    let c = coin(0.3, 0.0);
    let (mut sim, recorder) = meadow(vec![c.clone(), coin(3.5, 3.5)]);
    sim.start(Duration::ZERO);

    sim.observation_cycle(ms(500));
    assert!(sim.world().get(c.id).unwrap().collected);
    assert_eq!(sim.agents().get(&alice()).unwrap().coins_collected, 1);

    sim.observation_cycle(ms(1000));
    sim.observation_cycle(ms(1500));
    assert_eq!(sim.agents().get(&alice()).unwrap().coins_collected, 1);
    let collected = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, WorldEvent::ObjectCollected { object_id, .. } if *object_id == c.id))
        .count();
    assert_eq!(collected, 1);
    assert!(!recorder.events().contains(&WorldEvent::AllCoinsCollected));
}

#[test]
fn watchdog_forces_a_decision_after_stuck_threshold() {
    let (mut sim, _) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    for pending in sim.take_requests() {
        answer(&mut sim, &pending, Decision::observe(), Duration::ZERO);
    }

    let mut forced_at = None;
    for step in 1..=12 {
        let now = ms(step * 500);
        sim.observation_cycle(now);
        if !sim.take_requests().is_empty() && forced_at.is_none() {
            forced_at = Some(now);
        }
    }
    let forced_at = forced_at.unwrap();
    assert!(forced_at > Duration::from_secs(5));
    assert!(forced_at <= Duration::from_secs(6));
}

#[test]
fn coin_coming_into_view_interrupts_a_walk() {
    let c = coin(2.7, 0.0);
    let (mut sim, recorder) = meadow(vec![c.clone()]);
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &alice()), Decision::move_to(4.0, 0.0), Duration::ZERO);
    answer(&mut sim, &find(&pending, &bob()), Decision::idle(), Duration::ZERO);

    // At x = 1.0 the coin is still 1.7 away.
    sim.advance_frame(ms(500));
    sim.observation_cycle(ms(500));
    assert_eq!(
        sim.agents().get(&alice()).unwrap().action.kind(),
        ActionKind::Moving
    );
    assert!(sim.take_requests().is_empty());

    // At x = 2.0 it is 0.7 away: inside the observation radius only.
    sim.advance_frame(ms(1000));
    sim.observation_cycle(ms(1000));

    let walker = sim.agents().get(&alice()).unwrap();
    assert!(walker.action.is_idle());
    assert!(walker.action.goal_target().is_none());
    assert!((walker.position.x - 2.0).abs() < EPSILON);
    assert!(walker.decision_in_flight());
    assert!(sim.machine().tasks().get(&alice()).is_none());
    assert!(!sim.world().get(c.id).unwrap().collected);

    let requests = sim.take_requests();
    assert_eq!(requests.len(), 1);
    let request = &find(&requests, &alice()).request;
    assert_eq!(request.snapshot.object_ids().collect::<Vec<_>>(), [c.id]);

    // Interrupted, not completed.
    assert!(!recorder.events().contains(&WorldEvent::ActionCompleted {
        agent_id: alice(),
        action: CompletedAction::Move,
    }));
}

#[test]
fn agent_arriving_nearby_does_not_disturb_a_rest() {
    let (mut sim, _) = meadow(Vec::new());
    sim.start(Duration::ZERO);
    let pending = sim.take_requests();
    answer(&mut sim, &find(&pending, &alice()), Decision::idle(), Duration::ZERO);
    answer(&mut sim, &find(&pending, &bob()), Decision::move_to(-0.5, 0.0), Duration::ZERO);

    // Bob covers the 3.9 units in under two seconds.
    for step in 1..=4 {
        let now = ms(step * 500);
        sim.advance_frame(now);
        sim.observation_cycle(now);

        let resting = sim.agents().get(&alice()).unwrap();
        assert_eq!(resting.action.kind(), ActionKind::Resting);
        assert!(!resting.decision_in_flight());
        assert!(
            sim.take_requests()
                .iter()
                .all(|p| p.request.agent_id != alice())
        );
    }
    let alice_at = sim.agents().get(&alice()).unwrap().position;
    let bob_at = sim.agents().get(&bob()).unwrap().position;
    assert!(alice_at.within(&bob_at, 1.0));

    // The rest runs its full course, and the next request sees Bob.
    sim.advance_frame(ms(5000));
    let requests = sim.take_requests();
    let request = &find(&requests, &alice()).request;
    assert_eq!(request.snapshot.agent_ids().collect::<Vec<_>>(), [&bob()]);
}

#[tokio::test(start_paused = true)]
async fn simulation_can_run_again_after_abandoned_decisions() {
    let mut config = SimulationConfig::default();
    config.world.coin_count = 0;
    let mut sim = Simulation::from_config(&config).unwrap();
    let first_run = RunnerConfig {
        max_real_time: Some(Duration::from_secs(1)),
        ..RunnerConfig::from_config(&config)
    };

    // The first run ends while both requests are still with the oracle.
    let slow = Arc::new(
        ScriptedOracle::decisions([Decision::idle(), Decision::idle()])
            .with_delay(Duration::from_secs(10)),
    );
    let (_first_handle, rx) = control_channel(4);
    let result = run_simulation(&mut sim, Arc::clone(&slow), &first_run, rx)
        .await
        .unwrap();
    assert_eq!(slow.calls().await.len(), 2);
    assert!(result.status.agents.iter().all(|a| !a.decision_in_flight));
    assert!(sim.agents().all().all(|a| !a.decision_in_flight()));

    let second_run = RunnerConfig {
        max_real_time: Some(Duration::from_secs(3)),
        ..first_run
    };
    let fresh = Arc::new(ScriptedOracle::decisions([Decision::idle(), Decision::idle()]));
    let (_second_handle, rx) = control_channel(4);
    run_simulation(&mut sim, Arc::clone(&fresh), &second_run, rx)
        .await
        .unwrap();

    let asked: Vec<AgentId> = fresh
        .calls()
        .await
        .into_iter()
        .map(|c| c.agent_id)
        .collect();
    assert_eq!(asked, [alice(), bob()]);
}

#[tokio::test(start_paused = true)]
async fn scheduler_moves_agent_and_reports_completion() {
    let mut config = SimulationConfig::default();
    config.world.coin_count = 0;
    let recorder = RecordingObserver::new();
    let mut sim = Simulation::from_config(&config)
        .unwrap()
        .with_observer(recorder.clone());

    // Alice asks first; Bob's request is staggered behind hers.
    let oracle = Arc::new(ScriptedOracle::decisions([
        Decision::move_to(-2.0, 3.0),
        Decision::idle(),
    ]));
    let runner = RunnerConfig {
        max_real_time: Some(Duration::from_secs(2)),
        ..RunnerConfig::from_config(&config)
    };
    let (_handle, rx) = control_channel(4);

    let result = run_simulation(&mut sim, Arc::clone(&oracle), &runner, rx)
        .await
        .unwrap();

    let alice_state = sim.agents().get(&alice()).unwrap();
    assert!((alice_state.position.x + 2.0).abs() < EPSILON);
    assert!((alice_state.position.z - 3.0).abs() < EPSILON);
    assert_eq!(
        sim.agents().get(&bob()).unwrap().action.kind(),
        ActionKind::Resting
    );

    let events = recorder.events();
    let completions = events
        .iter()
        .filter(|e| {
            **e == WorldEvent::ActionCompleted {
                agent_id: alice(),
                action: CompletedAction::Move,
            }
        })
        .count();
    assert_eq!(completions, 1);
    assert_eq!(events.first(), Some(&WorldEvent::SimulationStarted));
    assert_eq!(events.last(), Some(&WorldEvent::SimulationStopped));
    assert!(result.cycles >= 4);

    let calls = oracle.calls().await;
    assert_eq!(calls.first().map(|c| c.agent_id.clone()), Some(alice()));
    assert_eq!(calls.get(1).map(|c| c.agent_id.clone()), Some(bob()));
}
