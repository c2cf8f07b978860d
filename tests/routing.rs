mod common;

use common::{spawn_at, FailingPlanner, NetworkBuilder, ScriptedPlanner};
use std::sync::Arc;
use syncytium_lib::{CellId, DeliveryMode, Endpoint, HistoryKind};

// Long enough to trip the routing policy even between direct neighbors.
const LONG_CONTENT: &str = "please forward this measurement batch to the archive";

#[tokio::test]
async fn unreachable_target_returns_source_only_path() {
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 5.0)
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let c = spawn_at(&mut network, "Memory Keeper", 90.0, 90.0);

    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(c.clone()), LONG_CONTENT)
        .await
        .unwrap();

    assert_eq!(outcome.mode, DeliveryMode::Unreachable);
    assert_eq!(outcome.path, vec![a]);
    assert!(outcome.rationale.contains("unreachable"));
    // The message never reached the far cell.
    assert!(network
        .cell(&c)
        .unwrap()
        .history
        .entries()
        .all(|e| e.kind != HistoryKind::Received));
}

#[tokio::test]
async fn multi_hop_chain_reacts_only_at_the_final_hop() {
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 25.0)
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let b = spawn_at(&mut network, "Memory Keeper", 20.0, 0.0);
    let c = spawn_at(&mut network, "Memory Keeper", 40.0, 0.0);

    let outcome = network
        .send_message(
            Endpoint::Cell(a.clone()),
            Endpoint::Cell(c.clone()),
            "thank you, that relay was genuinely helpful",
        )
        .await
        .unwrap();

    assert_eq!(outcome.mode, DeliveryMode::Routed);
    assert_eq!(outcome.path, vec![a.clone(), b.clone(), c.clone()]);

    // Both hops received the message...
    for hop in [&b, &c] {
        assert!(network
            .cell(hop)
            .unwrap()
            .history
            .entries()
            .any(|e| e.kind == HistoryKind::Received));
    }
    // ...but only the final hop ran the sentiment reaction.
    assert!(network.cell(&c).unwrap().liked_cells.contains(&a));
    assert!(!network.cell(&b).unwrap().liked_cells.contains(&a));
}

#[tokio::test]
async fn garbage_planner_output_is_post_validated() {
    let bogus = CellId::from("c-bogus0");
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 25.0)
        .with_planner(Arc::new(ScriptedPlanner {
            path: vec![bogus.clone()],
        }))
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let c = spawn_at(&mut network, "Memory Keeper", 20.0, 0.0);

    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(c.clone()), LONG_CONTENT)
        .await
        .unwrap();

    // The dead hop is filtered and the direct edge rescues delivery.
    assert_eq!(outcome.path, vec![a, c.clone()]);
    assert!(network
        .cell(&c)
        .unwrap()
        .history
        .entries()
        .any(|e| e.kind == HistoryKind::Received));
}

#[tokio::test]
async fn planner_failure_degrades_to_direct_delivery() {
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 25.0)
        .with_planner(Arc::new(FailingPlanner))
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let c = spawn_at(&mut network, "Memory Keeper", 20.0, 0.0);

    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(c.clone()), LONG_CONTENT)
        .await
        .unwrap();

    assert_eq!(outcome.path, vec![a, c.clone()]);
    assert!(network
        .cell(&c)
        .unwrap()
        .history
        .entries()
        .any(|e| e.kind == HistoryKind::Received));
}

#[tokio::test]
async fn absent_target_falls_back_to_nearest_living_neighbor() {
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 25.0)
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let b = spawn_at(&mut network, "Memory Keeper", 10.0, 0.0);
    let gone = spawn_at(&mut network, "Memory Keeper", 20.0, 0.0);
    network.remove_cell(&gone).unwrap();

    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(gone), LONG_CONTENT)
        .await
        .unwrap();

    assert_eq!(outcome.path.last(), Some(&b));
    assert!(network
        .cell(&b)
        .unwrap()
        .history
        .entries()
        .any(|e| e.kind == HistoryKind::Received));
}

#[tokio::test]
async fn short_messages_between_neighbors_go_direct() {
    let mut network = NetworkBuilder::new()
        .with_config(|c| c.messaging.comm_radius = 25.0)
        .build();
    let a = spawn_at(&mut network, "Memory Keeper", 0.0, 0.0);
    let b = spawn_at(&mut network, "Memory Keeper", 10.0, 0.0);

    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(b.clone()), "ping")
        .await
        .unwrap();

    assert_eq!(outcome.mode, DeliveryMode::Direct);
    assert_eq!(outcome.path, vec![a, b]);
}

#[tokio::test]
async fn self_send_is_a_trivial_path() {
    let mut network = NetworkBuilder::new().build();
    let a = spawn_at(&mut network, "Memory Keeper", 50.0, 50.0);
    let outcome = network
        .send_message(Endpoint::Cell(a.clone()), Endpoint::Cell(a.clone()), "note to self")
        .await
        .unwrap();
    assert_eq!(outcome.path, vec![a]);
}
