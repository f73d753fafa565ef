use kyroinfer::{
    Discrete, ExecutionError, InferError, InferenceEngine, Regime, ResolutionMode, Traversal,
};

fn engine_with(rules: &str, known: &[&str]) -> InferenceEngine {
    let mut engine = InferenceEngine::new();
    engine.load_rules(rules).unwrap();
    for atom in known {
        engine.add_knowledge(atom).unwrap();
        engine.change_knowledge(atom, 1.0).unwrap();
    }
    engine
}

#[test]
fn forward_dfs_saturates_simple_chain() {
    let mut engine = engine_with("a -> b\na & b -> c\n", &["a"]);

    let res = engine.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();

    assert_eq!(res.as_tuple(), (2, true));
    assert!(!res.inconsistent);
    assert!(engine.check_knowledge("b"));
    assert!(engine.check_knowledge("c"));
    assert_eq!(engine.discrete("c"), Some(Discrete::Positive));
    assert_eq!(res.trace.fired_rules().count(), 2);
}

#[test]
fn derived_negation_forces_opposite() {
    let mut engine = engine_with("d -> non-a\n", &[]);
    assert!(engine.build_opposition_closure().unwrap());
    engine.add_knowledge("d").unwrap();
    engine.change_knowledge("d", 1.0).unwrap();

    let res = engine.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();

    assert!(res.success);
    assert_eq!(engine.belief("non-a"), Some(1.0));
    assert_eq!(engine.belief("a"), Some(-1.0));
    assert!(engine.check_knowledge("a"));
}

#[test]
fn second_saturation_adds_nothing() {
    let rules = "a -> b\nb -> c\nb & c -> d\nx -> y\n";
    for mode in [ResolutionMode::FORWARD_DFS, ResolutionMode::FORWARD_BFS] {
        let mut engine = engine_with(rules, &["a"]);
        let first = engine.resolve(mode, false).unwrap();
        assert_eq!(first.new_facts.len(), 3, "{mode}");

        let second = engine.resolve(mode, false).unwrap();
        assert!(second.new_facts.is_empty(), "{mode}");
        assert!(!second.success, "{mode}");
    }
}

#[test]
fn dfs_and_bfs_reach_the_same_base() {
    let rules = "\
        # shipping-like chain
        a -> b
        a & b -> c
        c -> d
        d & b -> e
        z -> e
    ";
    let mut dfs = engine_with(rules, &["a"]);
    let mut bfs = engine_with(rules, &["a"]);
    dfs.resolve(ResolutionMode::FORWARD_DFS, true).unwrap();
    bfs.resolve(ResolutionMode::FORWARD_BFS, true).unwrap();

    let mut left = dfs.base_view();
    let mut right = bfs.base_view();
    left.sort();
    right.sort();
    assert_eq!(left, right);
    assert_eq!(left, vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn memory_mode_fires_each_rule_once() {
    let mut engine = engine_with("a -> b\nb -> c\na & c -> d\n", &["a"]);
    let res = engine.resolve(ResolutionMode::FORWARD_DFS, true).unwrap();

    assert!(res.success);
    assert!(res.fire_counts.values().all(|n| *n == 1));
    assert_eq!(res.memorized_rules.len(), 3);
    for atom in engine.base_view() {
        assert_eq!(engine.discrete(&atom), Some(Discrete::Positive), "{atom}");
    }
}

#[test]
fn contradiction_is_reported_not_raised() {
    let mut engine = engine_with("d -> non-a\n", &["a", "d"]);
    engine.build_opposition_closure().unwrap();
    assert_eq!(engine.belief("non-a"), Some(-1.0));

    let res = engine.resolve(ResolutionMode::FORWARD_BFS, false).unwrap();

    assert!(res.inconsistent);
    assert!(!res.success);
    assert_eq!(res.rules_fired, 1);
    assert!(engine.is_inconsistent());
    assert!(res.to_string().ends_with("result: inconsistent"));
}

#[test]
fn mixed_regime_is_rejected() {
    let mut engine = engine_with("a -> b\n", &["a"]);
    for traversal in [Traversal::DepthFirst, Traversal::BreadthFirst] {
        let err = engine
            .resolve(ResolutionMode::new(Regime::Mixed, traversal), false)
            .unwrap_err();
        assert!(matches!(
            err,
            InferError::Execution(ExecutionError::UnsupportedRegime { .. })
        ));
    }
    assert!(!engine.check_knowledge("b"));
}

#[test]
fn goal_directed_forward_run() {
    let mut engine = engine_with("a -> b\nb -> c\nc -> d\n", &["a"]);
    assert!(engine.add_goal("c"));

    let res = engine.resolve(ResolutionMode::FORWARD_BFS, false).unwrap();

    assert!(res.success);
    assert!(engine.get_goals().is_empty());
    assert!(engine.check_knowledge("c"));
    assert!(!engine.check_knowledge("d"));
}

#[test]
fn malformed_rule_set_is_rejected_whole() {
    let mut engine = InferenceEngine::new();
    let err = engine.load_rules("a -> b\nthis is not a rule\n").unwrap_err();
    assert!(err.is_validation());
    assert!(engine.rules_view().is_empty());
}

#[test]
fn resolution_report_serializes() {
    let mut engine = engine_with("a -> b\n", &["a"]);
    let res = engine.resolve(ResolutionMode::FORWARD_DFS, true).unwrap();
    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(json["method"], "forward_dfs");
    assert_eq!(json["new_facts"][0], "b");
    assert_eq!(json["fingerprint"], engine.store().fingerprint());
}
