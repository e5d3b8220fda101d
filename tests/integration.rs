//! End-to-end tests for the cogcore agent.
//!
//! These drive the agent core over an in-memory graph the way a host would:
//! through the lifecycle trait, the component closures and the status snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cogcore::agent::{AgentCore, GoalCategory, Lifecycle, Priority, TaskStatus};
use cogcore::belief::BeliefValue;
use cogcore::config::CoreConfig;
use cogcore::graph::{GraphStore, InMemoryGraph, NodeKind};
use cogcore::knowledge::ConfidenceLevel;

fn test_agent(config: CoreConfig) -> (Arc<InMemoryGraph>, AgentCore) {
    let graph = Arc::new(InMemoryGraph::new());
    let mut agent = AgentCore::new(graph.clone(), config);
    agent.init().unwrap();
    (graph, agent)
}

fn quiet_config() -> CoreConfig {
    let mut config = CoreConfig::default();
    config.cycle.interval_ms = 50;
    config.cycle.pause_poll_ms = 10;
    config
}

#[test]
fn concept_registration_is_idempotent() {
    let (graph, agent) = test_agent(CoreConfig::default());
    let (first, second) = agent
        .with_knowledge(|k| {
            let a = k.register_concept("Robot", None).unwrap();
            let b = k.register_concept("Robot", None).unwrap();
            (a, b)
        })
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(graph.by_name(NodeKind::Concept, "Robot").len(), 1);
}

#[test]
fn repeated_revision_stays_in_bounds() {
    let mut belief = BeliefValue::new(0.2, 0.1);
    let evidence = BeliefValue::new(1.0, 1.0);
    for _ in 0..200 {
        belief = belief.revise(&evidence);
        assert!((0.0..=1.0).contains(&belief.strength()));
        assert!((0.0..=1.0).contains(&belief.confidence()));
    }
    assert!(belief.strength() > 0.9);
}

#[test]
fn dependency_gates_task_selection() {
    let (_, agent) = test_agent(CoreConfig::default());
    agent
        .with_tasks(|t| {
            let a = t.create_task("A", Priority::Low, None).unwrap();
            let b = t.create_task("B", Priority::Critical, None).unwrap();
            t.add_task_dependency(b, a).unwrap();

            assert_eq!(t.get_next_task(), Some(a));
            assert_eq!(t.task_status(a), Some(TaskStatus::Pending));

            t.complete_task(a, true).unwrap();
            assert_eq!(t.get_next_task(), Some(b));
            assert!(t.add_task_dependency(a, b).is_err());
        })
        .unwrap();
}

#[test]
fn highest_priority_ready_task_wins() {
    let (_, agent) = test_agent(CoreConfig::default());
    agent
        .with_tasks(|t| {
            let _low = t.create_task("low", Priority::Low, None).unwrap();
            let critical = t.create_task("critical", Priority::Critical, None).unwrap();
            let _medium = t.create_task("medium", Priority::Medium, None).unwrap();
            assert_eq!(t.get_next_task(), Some(critical));
        })
        .unwrap();
}

#[test]
fn problem_goal_decomposes_into_chained_steps() {
    let (_, agent) = test_agent(CoreConfig::default());
    let goal = agent.set_goal("solve the problem", true).unwrap();
    agent
        .with_tasks(|t| {
            let subgoals = t.subgoals_of(goal);
            let names: Vec<&str> = subgoals
                .iter()
                .map(|s| t.goal_description(*s).unwrap())
                .collect();
            assert_eq!(names, GoalCategory::ProblemSolving.template());
            assert_eq!(names.len(), 6);

            let tasks: Vec<_> = subgoals
                .iter()
                .map(|s| t.find_task_for_goal(*s).unwrap())
                .collect();
            assert!(t.task(tasks[0]).unwrap().dependencies.is_empty());
            for pair in tasks.windows(2) {
                assert_eq!(t.task(pair[1]).unwrap().dependencies, vec![pair[0]]);
            }

            assert_eq!(t.is_goal_achieved(goal).unwrap().strength(), 0.0);
        })
        .unwrap();
}

#[test]
fn achievement_never_drops_while_working_through_a_goal() {
    let (_, agent) = test_agent(CoreConfig::default());
    let goal = agent.set_goal("learn rust", true).unwrap();
    agent
        .with_tasks(|t| {
            let mut last = t.is_goal_achieved(goal).unwrap().strength();
            while let Some(task) = t.get_next_task() {
                t.complete_task(task, true).unwrap();
                let now = t.is_goal_achieved(goal).unwrap().strength();
                assert!(now >= last, "achievement dropped from {last} to {now}");
                last = now;
            }
            assert!((last - 1.0).abs() < 1e-9);
        })
        .unwrap();
}

#[test]
fn frequent_terms_form_concepts() {
    let (graph, agent) = test_agent(CoreConfig::default());
    let formed = agent
        .with_knowledge(|k| {
            let items: Vec<_> = (0..10)
                .map(|i| {
                    let text = if i < 4 {
                        format!("item widget {i}")
                    } else {
                        format!("item gadget{i} {i}")
                    };
                    k.add_fact(&text, ConfidenceLevel::Medium).unwrap()
                })
                .collect();
            k.form_concepts_from(&items).unwrap()
        })
        .unwrap();

    let names: Vec<String> = formed.iter().filter_map(|c| graph.name(*c)).collect();
    assert!(names.iter().any(|n| n == "Concept_widget"));
    assert!(!names.iter().any(|n| n == "Concept_gadget5"));

    let widget = agent
        .with_knowledge(|k| k.concept("Concept_widget"))
        .unwrap()
        .unwrap();
    assert_eq!(graph.neighbors(widget).unwrap().len(), 4);
}

#[test]
fn opposing_beliefs_about_a_subject_are_flagged() {
    let (graph, agent) = test_agent(CoreConfig::default());
    let hot = graph.add_node(NodeKind::Concept, "Sun is hot").unwrap();
    let cold = graph.add_node(NodeKind::Concept, "Sun is cold").unwrap();
    graph.set_belief(hot, BeliefValue::new(0.9, 0.8)).unwrap();
    graph.set_belief(cold, BeliefValue::new(0.2, 0.8)).unwrap();

    let flagged = agent
        .with_knowledge(|k| k.validate_knowledge_consistency().unwrap())
        .unwrap();
    assert!(flagged.contains(&hot));
    assert!(flagged.contains(&cold));

    graph.set_belief(cold, BeliefValue::new(0.9, 0.8)).unwrap();
    let flagged = agent
        .with_knowledge(|k| k.validate_knowledge_consistency().unwrap())
        .unwrap();
    assert!(!flagged.contains(&hot));
    assert!(!flagged.contains(&cold));
}

#[test]
fn driver_runs_cycles_and_freezes_while_paused() {
    let (_, mut agent) = test_agent(quiet_config());
    agent.start().unwrap();
    std::thread::sleep(Duration::from_millis(250));
    let sched = agent.scheduler().unwrap();
    assert!(sched.cycle_count() >= 3, "only {} cycles", sched.cycle_count());

    agent.pause().unwrap();
    std::thread::sleep(Duration::from_millis(100));
    let frozen = agent.scheduler().unwrap().cycle_count();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(agent.scheduler().unwrap().cycle_count(), frozen);

    agent.resume().unwrap();
    agent.stop().unwrap();
    assert!(!agent.scheduler().unwrap().is_running());
}

#[test]
fn driver_completes_a_decomposed_goal() {
    let mut config = quiet_config();
    config.cycle.interval_ms = 10;
    let (_, mut agent) = test_agent(config);
    let goal = agent.set_goal("build a shed", true).unwrap();
    agent.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut achieved = 0.0;
    while Instant::now() < deadline {
        achieved = agent
            .with_tasks(|t| t.is_goal_achieved(goal).unwrap().strength())
            .unwrap();
        if achieved >= 1.0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    agent.stop().unwrap();
    assert!((achieved - 1.0).abs() < 1e-9, "goal only reached {achieved}");

    let status = agent.status();
    assert_eq!(status.current_goal, Some(goal));
    assert_eq!(status.tasks.unwrap().queue_depth, 0);
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("agent.toml");

    let mut config = CoreConfig::default();
    config.agent.name = "rover".into();
    config.cycle.interval_ms = 250;
    config.knowledge.semantic_integration = false;
    config.save(&path).unwrap();

    let loaded = CoreConfig::load(&path).unwrap();
    assert_eq!(loaded.agent.name, "rover");
    assert_eq!(loaded.cycle.interval_ms, 250);
    assert!(!loaded.knowledge.semantic_integration);

    let (graph, agent) = test_agent(loaded);
    assert_eq!(graph.name(agent.agent_self().unwrap()).as_deref(), Some("rover"));
}
