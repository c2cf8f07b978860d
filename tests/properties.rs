mod common;

use common::NetworkBuilder;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{HashMap, HashSet};
use syncytium_lib::Endpoint;

#[derive(Debug, Clone)]
enum Op {
    Tick,
    Praise(usize),
    Add,
    Remove(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Tick),
        2 => (0usize..8).prop_map(Op::Praise),
        1 => Just(Op::Add),
        1 => (0usize..8).prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_invariants_hold_under_random_operations(
        ops in proptest::collection::vec(op_strategy(), 1..40),
        seed in 0u64..1_000,
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let outcome: Result<(), TestCaseError> = rt.block_on(async move {
            let mut network = NetworkBuilder::new().with_seed(seed).build();
            network.initialize(6);

            let mut ages: HashMap<_, u32> = HashMap::new();
            let mut frozen: HashMap<_, (u32, u64)> = HashMap::new();

            for op in ops {
                match op {
                    Op::Tick => network.tick().await,
                    Op::Praise(i) => {
                        let ids: Vec<_> = network.snapshot().cells.keys().cloned().collect();
                        if !ids.is_empty() {
                            let target = ids[i % ids.len()].clone();
                            let _ = network
                                .send_message(
                                    Endpoint::User,
                                    Endpoint::Cell(target),
                                    "thank you, helpful work",
                                )
                                .await;
                        }
                    }
                    Op::Add => {
                        let _ = network.add_cell(None, None);
                    }
                    Op::Remove(i) => {
                        let ids: Vec<_> = network.snapshot().cells.keys().cloned().collect();
                        if !ids.is_empty() {
                            let _ = network.remove_cell(&ids[i % ids.len()]);
                        }
                    }
                }

                let snapshot = network.snapshot();
                let registered: HashSet<_> = snapshot.cells.keys().cloned().collect();
                let grid = network.config().world.grid_size;

                for (id, cell) in &snapshot.cells {
                    if let Some(previous) = ages.get(id) {
                        prop_assert!(cell.age >= *previous, "age decreased for {id}");
                    }
                    if let Some((age, version)) = frozen.get(id) {
                        prop_assert_eq!(cell.age, *age, "dead cell aged: {}", id);
                        prop_assert_eq!(cell.version, *version, "dead cell mutated: {}", id);
                    }
                    prop_assert!(cell.history.is_consistent(), "history broken for {id}");
                    prop_assert!(
                        cell.liked_cells.iter().all(|liked| registered.contains(liked)),
                        "dangling liked id on {id}"
                    );
                    prop_assert!((0.0..=grid).contains(&cell.position.x));
                    prop_assert!((0.0..=grid).contains(&cell.position.y));
                }

                ages = snapshot
                    .cells
                    .iter()
                    .map(|(id, c)| (id.clone(), c.age))
                    .collect();
                frozen = snapshot
                    .cells
                    .iter()
                    .filter(|(_, c)| !c.is_alive)
                    .map(|(id, c)| (id.clone(), (c.age, c.version)))
                    .collect();
            }
            Ok(())
        });
        outcome?;
    }
}
