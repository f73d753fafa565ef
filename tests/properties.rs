use proptest::prelude::*;

use kyroinfer::{aggregate, InferenceEngine, ProofTrace, ResolutionMode, RuleId};

/// A rule over `x0..x7`: one to three antecedent indexes and a consequent index.
fn rule_strategy() -> impl Strategy<Value = (Vec<usize>, usize)> {
    (prop::collection::vec(0..8_usize, 1..4), 0..8_usize)
}

fn rule_text(rules: &[(Vec<usize>, usize)]) -> String {
    rules
        .iter()
        .map(|(left, right)| {
            let left: Vec<String> = left.iter().map(|i| format!("x{i}")).collect();
            format!("{} -> x{right}\n", left.join(" & "))
        })
        .collect()
}

fn saturated(rules: &str, known: &[usize], mode: ResolutionMode) -> (InferenceEngine, Vec<String>) {
    let mut engine = InferenceEngine::new();
    engine.load_rules(rules).unwrap();
    for i in known {
        let atom = format!("x{i}");
        engine.add_knowledge(&atom).unwrap();
        engine.change_knowledge(&atom, 1.0).unwrap();
    }
    engine.resolve(mode, false).unwrap();
    let mut base = engine.base_view();
    base.sort();
    (engine, base)
}

proptest! {
    #[test]
    fn aggregate_is_commutative(x in -1.0..=1.0_f64, y in -1.0..=1.0_f64) {
        prop_assert_eq!(aggregate(x, y, 3), aggregate(y, x, 3));
    }

    #[test]
    fn aggregate_stays_in_range(x in -1.0..=1.0_f64, y in -1.0..=1.0_f64) {
        let z = aggregate(x, y, 3);
        prop_assert!((-1.0..=1.0).contains(&z), "aggregate({}, {}) = {}", x, y, z);
    }

    #[test]
    fn opposite_factors_cancel(x in -1.0..=1.0_f64) {
        prop_assert_eq!(aggregate(x, -x, 3), 0.0);
    }
}

proptest! {
    #[test]
    fn opposition_is_an_involution(
        rules in prop::collection::vec(
            (prop::collection::vec((0..6_usize, any::<bool>()), 1..3), (0..6_usize, any::<bool>())),
            1..8,
        )
    ) {
        let literal = |(i, negated): &(usize, bool)| {
            if *negated { format!("non-x{i}") } else { format!("x{i}") }
        };
        let text: String = rules
            .iter()
            .map(|(left, right)| {
                let left: Vec<String> = left.iter().map(literal).collect();
                format!("{} -> {}\n", left.join(" & "), literal(right))
            })
            .collect();

        let mut engine = InferenceEngine::new();
        engine.load_rules(&text).unwrap();
        prop_assert!(engine.build_opposition_closure().unwrap());

        for atom in engine.positive_atoms() {
            let negated = format!("non-{atom}");
            prop_assert_eq!(engine.get_opposite(&atom), Some(negated.as_str()));
            prop_assert_eq!(engine.get_opposite(&negated), Some(atom.as_str()));
        }
        for atom in engine.negative_atoms() {
            let opposite = engine.get_opposite(&atom).map(str::to_string);
            prop_assert!(opposite.is_some(), "{} left unpaired", atom);
            if let Some(opposite) = opposite {
                prop_assert_eq!(engine.get_opposite(&opposite), Some(atom.as_str()));
            }
        }
    }
}

proptest! {
    #[test]
    fn second_forward_run_adds_nothing(
        rules in prop::collection::vec(rule_strategy(), 1..12),
        known in prop::collection::vec(0..8_usize, 1..4),
    ) {
        let text = rule_text(&rules);
        for mode in [ResolutionMode::FORWARD_DFS, ResolutionMode::FORWARD_BFS] {
            let (mut engine, before) = saturated(&text, &known, mode);
            let again = engine.resolve(mode, false).unwrap();
            prop_assert!(again.new_facts.is_empty(), "{}: {:?}", mode, again.new_facts);
            let mut after = engine.base_view();
            after.sort();
            prop_assert_eq!(before, after);
        }
    }

    #[test]
    fn dfs_and_bfs_agree(
        rules in prop::collection::vec(rule_strategy(), 1..12),
        known in prop::collection::vec(0..8_usize, 1..4),
    ) {
        let text = rule_text(&rules);
        let (_, dfs) = saturated(&text, &known, ResolutionMode::FORWARD_DFS);
        let (_, bfs) = saturated(&text, &known, ResolutionMode::FORWARD_BFS);
        prop_assert_eq!(dfs, bfs);
    }
}

proptest! {
    #[test]
    fn trace_remove_pops_the_last_entry(outcomes in prop::collection::vec(any::<bool>(), 1..20)) {
        let mut trace = ProofTrace::new();
        for (n, fired) in outcomes.iter().enumerate() {
            let rule = RuleId::new(u32::try_from(n).unwrap());
            if *fired {
                trace.add(rule, format!("x{n}"), 1.0);
            } else {
                trace.add_failure(rule, format!("x{n}"));
            }
        }

        let before = trace.entries().to_vec();
        let len = before.len();
        prop_assert_eq!(trace.remove(), before.last().cloned());
        prop_assert_eq!(trace.len(), len - 1);
        prop_assert_eq!(trace.entries(), &before[..len - 1]);
    }
}
