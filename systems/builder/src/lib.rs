#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system that turns pointer movement into placement commands.
//!
//! The [`Builder`] holds at most one active [`PlacementStrategy`]. Each
//! strategy snaps the pointer onto the closest free anchor it understands
//! (tower slots or obstacle nodes) and translates the chosen anchor into a
//! world command. Economy checks stay with the world, which rejects
//! unaffordable commands without touching the balance.

use gate_defence_core::{
    BoosterKind, Command, NodeId, PathNode, PlaceableItem, PlacementError, SlotId, TowerKind,
    TowerSlot, Vec2,
};

/// Free placement anchors captured from the world for a single frame.
#[derive(Clone, Copy, Debug)]
pub struct Surroundings<'a> {
    /// Tower slots that do not hold a tower.
    pub free_slots: &'a [TowerSlot],
    /// Obstacle nodes that do not hold a booster.
    pub free_nodes: &'a [PathNode],
    /// Maximum distance between the pointer and a snapped anchor.
    pub snap_radius: f32,
}

/// Map location a placement may bind to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// A tower slot.
    Slot(SlotId),
    /// An obstacle node of the path graph.
    Node(NodeId),
}

/// Declarative preview of the active placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Item being placed.
    pub item: PlaceableItem,
    /// Last pointer position reported by the adapter.
    pub pointer: Vec2,
    /// Snapped anchor and its position; `None` when nothing is in reach.
    pub snapped: Option<(Anchor, Vec2)>,
}

impl PlacementPreview {
    /// Reports whether confirming now would produce a command.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.snapped.is_some()
    }

    /// Position the view should draw the preview at.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.snapped.map_or(self.pointer, |(_, position)| position)
    }
}

/// Behaviour shared by every kind of placeable item.
pub trait PlacementStrategy: std::fmt::Debug {
    /// Item placed by the strategy.
    fn item(&self) -> PlaceableItem;

    /// Picks the anchor the pointer snaps to, if any.
    fn snap(&self, pointer: Vec2, surroundings: &Surroundings<'_>) -> Option<(Anchor, Vec2)>;

    /// Builds the world command for a snapped anchor.
    fn command(&self, anchor: Anchor) -> Result<Command, PlacementError>;
}

/// Places towers on free tower slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerStrategy {
    kind: TowerKind,
}

impl TowerStrategy {
    /// Creates a strategy for the provided tower kind.
    #[must_use]
    pub const fn new(kind: TowerKind) -> Self {
        Self { kind }
    }
}

impl PlacementStrategy for TowerStrategy {
    fn item(&self) -> PlaceableItem {
        PlaceableItem::Tower(self.kind)
    }

    fn snap(&self, pointer: Vec2, surroundings: &Surroundings<'_>) -> Option<(Anchor, Vec2)> {
        closest(
            pointer,
            surroundings.snap_radius,
            surroundings
                .free_slots
                .iter()
                .map(|slot| (Anchor::Slot(slot.id), slot.position)),
        )
    }

    fn command(&self, anchor: Anchor) -> Result<Command, PlacementError> {
        match anchor {
            Anchor::Slot(slot) => Ok(Command::PlaceTower {
                kind: self.kind,
                slot,
            }),
            Anchor::Node(_) => Err(PlacementError::InvalidLocation),
        }
    }
}

/// Drops boosters on free obstacle nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleStrategy {
    kind: BoosterKind,
}

impl ObstacleStrategy {
    /// Creates a strategy for the provided booster kind.
    #[must_use]
    pub const fn new(kind: BoosterKind) -> Self {
        Self { kind }
    }
}

impl PlacementStrategy for ObstacleStrategy {
    fn item(&self) -> PlaceableItem {
        PlaceableItem::Booster(self.kind)
    }

    fn snap(&self, pointer: Vec2, surroundings: &Surroundings<'_>) -> Option<(Anchor, Vec2)> {
        closest(
            pointer,
            surroundings.snap_radius,
            surroundings
                .free_nodes
                .iter()
                .map(|node| (Anchor::Node(node.id), node.position)),
        )
    }

    fn command(&self, anchor: Anchor) -> Result<Command, PlacementError> {
        match anchor {
            Anchor::Node(node) => Ok(Command::PlaceObstacle {
                kind: self.kind,
                node,
            }),
            Anchor::Slot(_) => Err(PlacementError::InvalidLocation),
        }
    }
}

/// Selects the strategy that handles an item.
#[must_use]
pub fn strategy_for(item: PlaceableItem) -> Box<dyn PlacementStrategy> {
    match item {
        PlaceableItem::Tower(kind) => Box::new(TowerStrategy::new(kind)),
        PlaceableItem::Booster(kind) => Box::new(ObstacleStrategy::new(kind)),
    }
}

/// Closest anchor within `radius` of the pointer. The first of several
/// equidistant anchors wins.
fn closest(
    pointer: Vec2,
    radius: f32,
    anchors: impl Iterator<Item = (Anchor, Vec2)>,
) -> Option<(Anchor, Vec2)> {
    let radius_sq = radius * radius;
    let mut best: Option<(f32, Anchor, Vec2)> = None;
    for (anchor, position) in anchors {
        let distance_sq = pointer.distance_squared(position);
        if distance_sq > radius_sq {
            continue;
        }
        match best {
            Some((current, _, _)) if current <= distance_sq => {}
            _ => best = Some((distance_sq, anchor, position)),
        }
    }
    best.map(|(_, anchor, position)| (anchor, position))
}

/// Placement controller holding a single active strategy.
#[derive(Debug, Default)]
pub struct Builder {
    active: Option<Placement>,
}

#[derive(Debug)]
struct Placement {
    strategy: Box<dyn PlacementStrategy>,
    pointer: Vec2,
    snapped: Option<(Anchor, Vec2)>,
}

impl Builder {
    /// Creates a controller with no active placement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts placing an item, replacing any placement already in progress.
    pub fn begin(&mut self, item: PlaceableItem) {
        self.begin_with(strategy_for(item));
    }

    /// Starts placing with a custom strategy.
    pub fn begin_with(&mut self, strategy: Box<dyn PlacementStrategy>) {
        self.active = Some(Placement {
            strategy,
            pointer: Vec2::ZERO,
            snapped: None,
        });
    }

    /// Item currently being placed.
    #[must_use]
    pub fn active_item(&self) -> Option<PlaceableItem> {
        self.active
            .as_ref()
            .map(|placement| placement.strategy.item())
    }

    /// Records a new pointer position and re-evaluates the snap.
    pub fn move_pointer(
        &mut self,
        pointer: Vec2,
        surroundings: &Surroundings<'_>,
    ) -> Option<PlacementPreview> {
        let placement = self.active.as_mut()?;
        placement.pointer = pointer;
        placement.snapped = placement.strategy.snap(pointer, surroundings);
        self.preview()
    }

    /// Re-evaluates the snap at the last pointer position. Anchors occupied
    /// since the pointer last moved drop out here.
    pub fn refresh(&mut self, surroundings: &Surroundings<'_>) -> Option<PlacementPreview> {
        let pointer = self.active.as_ref()?.pointer;
        self.move_pointer(pointer, surroundings)
    }

    /// Current preview, if a placement is active.
    #[must_use]
    pub fn preview(&self) -> Option<PlacementPreview> {
        self.active.as_ref().map(|placement| PlacementPreview {
            item: placement.strategy.item(),
            pointer: placement.pointer,
            snapped: placement.snapped,
        })
    }

    /// Confirms the active placement.
    ///
    /// A successful confirmation ends the placement. An invalid location keeps
    /// it active so the player can move the pointer and retry.
    pub fn confirm(&mut self) -> Result<Command, PlacementError> {
        let placement = self
            .active
            .as_ref()
            .ok_or(PlacementError::NoActivePlacement)?;
        let (anchor, _) = placement
            .snapped
            .ok_or(PlacementError::InvalidLocation)?;
        let command = placement.strategy.command(anchor)?;
        self.active = None;
        Ok(command)
    }

    /// Abandons the active placement. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_defence_core::NodeKind;

    fn slot(id: u32, x: f32, y: f32) -> TowerSlot {
        TowerSlot {
            id: SlotId::new(id),
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn closest_prefers_nearest_anchor() {
        let anchors = [
            (Anchor::Slot(SlotId::new(0)), Vec2::new(20.0, 0.0)),
            (Anchor::Slot(SlotId::new(1)), Vec2::new(5.0, 0.0)),
        ];
        assert_eq!(
            closest(Vec2::ZERO, 30.0, anchors.into_iter()),
            Some((Anchor::Slot(SlotId::new(1)), Vec2::new(5.0, 0.0)))
        );
    }

    #[test]
    fn closest_keeps_first_of_equidistant_anchors() {
        let anchors = [
            (Anchor::Slot(SlotId::new(4)), Vec2::new(-10.0, 0.0)),
            (Anchor::Slot(SlotId::new(2)), Vec2::new(10.0, 0.0)),
        ];
        assert_eq!(
            closest(Vec2::ZERO, 30.0, anchors.into_iter()).map(|(anchor, _)| anchor),
            Some(Anchor::Slot(SlotId::new(4)))
        );
    }

    #[test]
    fn closest_honours_radius() {
        let anchors = [(Anchor::Slot(SlotId::new(0)), Vec2::new(31.0, 0.0))];
        assert_eq!(closest(Vec2::ZERO, 30.0, anchors.into_iter()), None);
    }

    #[test]
    fn strategies_reject_foreign_anchors() {
        let tower = TowerStrategy::new(TowerKind::Regular);
        assert_eq!(
            tower.command(Anchor::Node(NodeId::Main(1))),
            Err(PlacementError::InvalidLocation)
        );

        let obstacle = ObstacleStrategy::new(BoosterKind::Roadblock);
        assert_eq!(
            obstacle.command(Anchor::Slot(SlotId::new(1))),
            Err(PlacementError::InvalidLocation)
        );
    }

    #[test]
    fn tower_strategy_ignores_obstacle_nodes() {
        let nodes = [PathNode {
            id: NodeId::Main(2),
            position: Vec2::ZERO,
            kind: NodeKind::Obstacle,
        }];
        let slots = [slot(0, 100.0, 100.0)];
        let surroundings = Surroundings {
            free_slots: &slots,
            free_nodes: &nodes,
            snap_radius: 30.0,
        };

        let strategy = TowerStrategy::new(TowerKind::Archer);
        assert_eq!(strategy.snap(Vec2::ZERO, &surroundings), None);
        assert_eq!(
            strategy.snap(Vec2::new(90.0, 95.0), &surroundings),
            Some((Anchor::Slot(SlotId::new(0)), Vec2::new(100.0, 100.0)))
        );
    }

    #[test]
    fn preview_reports_snapped_position() {
        let slots = [slot(0, 50.0, 50.0)];
        let surroundings = Surroundings {
            free_slots: &slots,
            free_nodes: &[],
            snap_radius: 30.0,
        };
        let mut builder = Builder::new();
        builder.begin(PlaceableItem::Tower(TowerKind::Regular));

        let preview = builder
            .move_pointer(Vec2::new(45.0, 40.0), &surroundings)
            .expect("placement is active");
        assert!(preview.is_valid());
        assert_eq!(preview.position(), Vec2::new(50.0, 50.0));

        let preview = builder
            .move_pointer(Vec2::new(200.0, 40.0), &surroundings)
            .expect("placement is active");
        assert!(!preview.is_valid());
        assert_eq!(preview.position(), Vec2::new(200.0, 40.0));
    }
}
