use gate_defence_core::{
    BoosterKind, Command, NodeId, NodeKind, PathNode, PlaceableItem, PlacementError, SlotId,
    TowerKind, TowerSlot, Vec2,
};
use gate_defence_system_builder::{Anchor, Builder, Surroundings};

fn slots() -> Vec<TowerSlot> {
    vec![
        TowerSlot {
            id: SlotId::new(0),
            position: Vec2::new(100.0, 100.0),
        },
        TowerSlot {
            id: SlotId::new(1),
            position: Vec2::new(140.0, 100.0),
        },
    ]
}

fn nodes() -> Vec<PathNode> {
    vec![PathNode {
        id: NodeId::Main(4),
        position: Vec2::new(300.0, 50.0),
        kind: NodeKind::Obstacle,
    }]
}

#[test]
fn confirm_without_placement_is_rejected() {
    let mut builder = Builder::new();
    assert_eq!(builder.confirm(), Err(PlacementError::NoActivePlacement));
    assert!(!builder.cancel(), "nothing to cancel");
}

#[test]
fn tower_placement_snaps_to_closest_free_slot() {
    let slots = slots();
    let nodes = nodes();
    let surroundings = Surroundings {
        free_slots: &slots,
        free_nodes: &nodes,
        snap_radius: 30.0,
    };
    let mut builder = Builder::new();
    builder.begin(PlaceableItem::Tower(TowerKind::Regular));

    let preview = builder
        .move_pointer(Vec2::new(128.0, 110.0), &surroundings)
        .expect("placement is active");
    assert_eq!(
        preview.snapped.map(|(anchor, _)| anchor),
        Some(Anchor::Slot(SlotId::new(1))),
        "pointer is closer to the second slot"
    );

    assert_eq!(
        builder.confirm(),
        Ok(Command::PlaceTower {
            kind: TowerKind::Regular,
            slot: SlotId::new(1),
        })
    );
    assert_eq!(
        builder.active_item(),
        None,
        "a successful confirmation ends the placement"
    );
}

#[test]
fn invalid_location_keeps_placement_active() {
    let slots = slots();
    let surroundings = Surroundings {
        free_slots: &slots,
        free_nodes: &[],
        snap_radius: 30.0,
    };
    let mut builder = Builder::new();
    builder.begin(PlaceableItem::Tower(TowerKind::Archer));

    let _ = builder.move_pointer(Vec2::new(500.0, 500.0), &surroundings);
    assert_eq!(builder.confirm(), Err(PlacementError::InvalidLocation));
    assert_eq!(
        builder.active_item(),
        Some(PlaceableItem::Tower(TowerKind::Archer))
    );

    let _ = builder.move_pointer(Vec2::new(101.0, 99.0), &surroundings);
    assert_eq!(
        builder.confirm(),
        Ok(Command::PlaceTower {
            kind: TowerKind::Archer,
            slot: SlotId::new(0),
        })
    );
}

#[test]
fn obstacle_placement_targets_free_obstacle_nodes() {
    let slots = slots();
    let nodes = nodes();
    let surroundings = Surroundings {
        free_slots: &slots,
        free_nodes: &nodes,
        snap_radius: 30.0,
    };
    let mut builder = Builder::new();
    builder.begin(PlaceableItem::Booster(BoosterKind::Roadblock));

    let preview = builder
        .move_pointer(Vec2::new(100.0, 100.0), &surroundings)
        .expect("placement is active");
    assert!(!preview.is_valid(), "boosters never snap onto tower slots");

    let _ = builder.move_pointer(Vec2::new(310.0, 60.0), &surroundings);
    assert_eq!(
        builder.confirm(),
        Ok(Command::PlaceObstacle {
            kind: BoosterKind::Roadblock,
            node: NodeId::Main(4),
        })
    );
}

#[test]
fn refresh_drops_anchors_taken_since_the_pointer_moved() {
    let slots = slots();
    let mut builder = Builder::new();
    builder.begin(PlaceableItem::Tower(TowerKind::Regular));
    let _ = builder.move_pointer(
        Vec2::new(100.0, 100.0),
        &Surroundings {
            free_slots: &slots,
            free_nodes: &[],
            snap_radius: 30.0,
        },
    );

    let remaining = &slots[1..];
    let preview = builder
        .refresh(&Surroundings {
            free_slots: remaining,
            free_nodes: &[],
            snap_radius: 30.0,
        })
        .expect("placement is active");
    assert!(
        !preview.is_valid(),
        "the only slot in reach became occupied"
    );
    assert_eq!(builder.confirm(), Err(PlacementError::InvalidLocation));
}

#[test]
fn begin_replaces_and_cancel_clears() {
    let mut builder = Builder::new();
    builder.begin(PlaceableItem::Tower(TowerKind::Regular));
    builder.begin(PlaceableItem::Booster(BoosterKind::Roadblock));
    assert_eq!(
        builder.active_item(),
        Some(PlaceableItem::Booster(BoosterKind::Roadblock))
    );

    assert!(builder.cancel());
    assert_eq!(builder.preview(), None);
    assert_eq!(builder.confirm(), Err(PlacementError::NoActivePlacement));
}
