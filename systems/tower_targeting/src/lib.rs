#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that assigns enemy targets to towers.
//!
//! Every tower picks the live enemy that is *furthest* from it while still
//! inside its range. Enemies further away from a tower have usually walked
//! past it, so the rule tends to pick the enemy nearest to the gate among
//! those the tower can reach. Equal distances resolve to the enemy that
//! spawned first.

use gate_defence_core::{EnemyId, EnemyView, TowerTarget, TowerView, Vec2};

/// Stateless targeting system that reuses scratch buffers between ticks.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided snapshots.
    ///
    /// `out` is cleared first and then receives at most one target per tower,
    /// in tower identifier order.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if enemies.is_empty() {
            return;
        }

        self.prepare_enemies(enemies);
        if self.enemy_workspace.is_empty() {
            return;
        }

        for tower in towers.iter() {
            if tower.range <= 0.0 {
                continue;
            }
            let range_sq = tower.range * tower.range;

            let mut best: Option<BestCandidate> = None;
            for enemy in &self.enemy_workspace {
                let distance_sq = tower.position.distance_squared(enemy.position);
                if distance_sq > range_sq {
                    continue;
                }

                let candidate = BestCandidate {
                    distance_sq,
                    enemy: enemy.id,
                    position: enemy.position,
                };
                match best {
                    Some(current) if !candidate.precedes(&current) => {}
                    _ => best = Some(candidate),
                }
            }

            if let Some(best) = best {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: best.enemy,
                    tower_position: tower.position,
                    enemy_position: best.position,
                });
            }
        }
    }

    fn prepare_enemies(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());
        for snapshot in enemies.iter() {
            if snapshot.hp <= 0 {
                continue;
            }
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    distance_sq: f32,
    enemy: EnemyId,
    position: Vec2,
}

impl BestCandidate {
    /// Candidates are visited in spawn order, so only a strictly larger
    /// distance displaces the current pick.
    fn precedes(&self, other: &Self) -> bool {
        self.distance_sq > other.distance_sq
    }
}

#[cfg(test)]
mod tests {
    use super::{TowerTarget, TowerTargeting};
    use gate_defence_core::{
        EnemyId, EnemyKind, EnemySnapshot, EnemyView, Handle, SlotId, TowerId, TowerKind,
        TowerSnapshot, TowerView, Vec2,
    };

    fn tower(id: u32, position: Vec2, range: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Regular,
            slot: SlotId::new(id),
            position,
            range,
        }
    }

    fn enemy(index: u32, position: Vec2) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::from_handle(Handle::new(index, 0)),
            kind: EnemyKind::Regular,
            position,
            hp: 10,
            max_hp: 10,
            target_node: None,
            scale: 1.0,
            show_health_bar: false,
            flashing: false,
        }
    }

    fn id(index: u32) -> EnemyId {
        EnemyId::from_handle(Handle::new(index, 0))
    }

    #[test]
    fn furthest_enemy_in_range_wins() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(20.0, 0.0)),
            enemy(1, Vec2::new(0.0, 90.0)),
            enemy(2, Vec2::new(50.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tower, TowerId::new(0));
        assert_eq!(out[0].enemy, id(1));
        assert_eq!(out[0].tower_position, Vec2::ZERO);
        assert_eq!(out[0].enemy_position, Vec2::new(0.0, 90.0));
    }

    #[test]
    fn enemies_beyond_range_are_ignored() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(30.0, 0.0)),
            enemy(1, Vec2::new(150.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, id(0), "the distant enemy is out of range");
    }

    #[test]
    fn enemy_exactly_on_range_boundary_is_targeted() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![enemy(0, Vec2::new(100.0, 0.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
    }

    #[test]
    fn equidistant_enemies_resolve_to_earliest_spawned() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, Vec2::new(-60.0, 0.0)),
            enemy(3, Vec2::new(60.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, id(7));
    }

    #[test]
    fn dead_enemies_are_never_targeted() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 100.0)]);
        let mut dead = enemy(0, Vec2::new(80.0, 0.0));
        dead.hp = 0;
        let enemies = EnemyView::from_snapshots(vec![dead, enemy(1, Vec2::new(10.0, 0.0))]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemy, id(1));
    }

    #[test]
    fn every_tower_chooses_independently() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![
            tower(1, Vec2::new(200.0, 0.0), 60.0),
            tower(0, Vec2::ZERO, 60.0),
        ]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(0, Vec2::new(40.0, 0.0)),
            enemy(1, Vec2::new(170.0, 0.0)),
        ]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].tower, TowerId::new(0));
        assert_eq!(out[0].enemy, id(0));
        assert_eq!(out[1].tower, TowerId::new(1));
        assert_eq!(out[1].enemy, id(1));
    }

    #[test]
    fn stale_targets_are_cleared_when_nothing_is_in_range() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 50.0)]);
        let enemies = EnemyView::from_snapshots(vec![enemy(0, Vec2::new(300.0, 0.0))]);

        let mut out = vec![TowerTarget {
            tower: TowerId::new(9),
            enemy: id(9),
            tower_position: Vec2::ZERO,
            enemy_position: Vec2::ZERO,
        }];
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty());

        system.handle(&towers, &EnemyView::default(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_range_tower_never_targets() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, Vec2::ZERO, 0.0)]);
        let enemies = EnemyView::from_snapshots(vec![enemy(0, Vec2::ZERO)]);

        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty());
    }
}
