//! Pooled enemy state and path following.

use std::time::Duration;

use gate_defence_core::{EnemyKind, EnemyStats, NodeId, NodeKind, PathNode, Vec2};
use rand::Rng;

use crate::pool::Poolable;

/// Arguments that configure a freshly activated enemy.
#[derive(Clone, Debug)]
pub(crate) struct EnemySetup {
    pub(crate) kind: EnemyKind,
    pub(crate) stats: EnemyStats,
    pub(crate) speed: f32,
    pub(crate) scale: f32,
    pub(crate) ignore_slowdown: bool,
    pub(crate) show_health_bar: bool,
    pub(crate) path: Vec<PathNode>,
}

/// Outcome of advancing an enemy for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stride {
    /// The enemy has no target and stays put.
    Idle,
    /// The enemy moved toward its target.
    Walking,
    /// The enemy stepped onto the last node of its path.
    Finished,
}

/// Outcome of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wound {
    /// The enemy was already dead; nothing changed.
    Ignored,
    /// The enemy survived the hit.
    Damaged,
    /// The hit brought the enemy to zero hit points or below.
    Killed,
}

/// Walking enemy stored in the world's enemy pool.
#[derive(Clone, Debug, Default)]
pub(crate) struct Enemy {
    kind: EnemyKind,
    hp: i32,
    max_hp: i32,
    reward: u32,
    damage_to_player: u32,
    speed: f32,
    scale: f32,
    ignore_slowdown: bool,
    show_health_bar: bool,
    position: Vec2,
    path: Vec<PathNode>,
    target_index: usize,
    target_point: Option<Vec2>,
    last_reached: Option<NodeId>,
    flash: Duration,
    finished: bool,
}

impl Poolable for Enemy {
    type Args = EnemySetup;

    fn reset(&mut self, setup: EnemySetup) {
        let hp = i32::try_from(setup.stats.hp).unwrap_or(i32::MAX);
        self.kind = setup.kind;
        self.hp = hp;
        self.max_hp = hp;
        self.reward = setup.stats.reward;
        self.damage_to_player = setup.stats.damage_to_player;
        self.speed = setup.speed;
        self.scale = setup.scale;
        self.ignore_slowdown = setup.ignore_slowdown;
        self.show_health_bar = setup.show_health_bar;
        self.position = setup.path.first().map_or(Vec2::ZERO, |node| node.position);
        self.last_reached = setup.path.first().map(|node| node.id);
        self.path = setup.path;
        // The spawn point is the first node, so walking starts toward the second.
        self.target_index = 1;
        self.target_point = None;
        self.flash = Duration::ZERO;
        self.finished = false;
    }

    fn clean(&mut self) {
        self.path.clear();
        self.target_point = None;
        self.last_reached = None;
    }
}

impl Enemy {
    pub(crate) const fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub(crate) const fn hp(&self) -> i32 {
        self.hp
    }

    pub(crate) const fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub(crate) const fn reward(&self) -> u32 {
        self.reward
    }

    pub(crate) const fn damage_to_player(&self) -> u32 {
        self.damage_to_player
    }

    pub(crate) const fn scale(&self) -> f32 {
        self.scale
    }

    pub(crate) const fn show_health_bar(&self) -> bool {
        self.show_health_bar
    }

    pub(crate) const fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn is_flashing(&self) -> bool {
        !self.flash.is_zero()
    }

    /// Alive enemies can be targeted and hit.
    pub(crate) const fn is_alive(&self) -> bool {
        self.hp > 0 && !self.finished
    }

    /// Node the enemy currently walks toward.
    pub(crate) fn target_node(&self) -> Option<NodeId> {
        if self.target_point.is_none() {
            return None;
        }
        self.path.get(self.target_index).map(|node| node.id)
    }

    /// Picks a jittered point around the current target node.
    pub(crate) fn aim<R: Rng>(&mut self, rng: &mut R, jitter_radius: f32) {
        self.target_point = self
            .path
            .get(self.target_index)
            .map(|node| node.position + jitter(rng, jitter_radius));
    }

    /// Moves the enemy toward its target point.
    pub(crate) fn advance<R: Rng>(
        &mut self,
        dt: Duration,
        detour_slowdown: f32,
        jitter_radius: f32,
        rng: &mut R,
    ) -> Stride {
        self.flash = self.flash.saturating_sub(dt);

        let Some(target) = self.target_point else {
            return Stride::Idle;
        };

        let step = self.current_speed(detour_slowdown) * dt.as_secs_f32();
        let offset = target - self.position;
        let distance = offset.length();

        if distance < step || distance <= f32::EPSILON {
            self.position = target;
            self.last_reached = self.path.get(self.target_index).map(|node| node.id);
            self.target_index += 1;
            if self.target_index >= self.path.len() {
                self.target_point = None;
                self.finished = true;
                return Stride::Finished;
            }
            self.aim(rng, jitter_radius);
        } else {
            self.position += offset / distance * step;
        }

        Stride::Walking
    }

    /// Subtracts hit points; hits on a dead enemy are ignored.
    pub(crate) fn take_damage(&mut self, amount: u32, flash: Duration) -> Wound {
        if self.hp <= 0 {
            return Wound::Ignored;
        }

        self.hp = self
            .hp
            .saturating_sub(i32::try_from(amount).unwrap_or(i32::MAX));
        self.flash = flash;

        if self.hp <= 0 {
            Wound::Killed
        } else {
            Wound::Damaged
        }
    }

    /// Reports whether the node lies ahead of the enemy on its current path.
    pub(crate) fn route_contains(&self, node: NodeId) -> bool {
        self.target_point.is_some()
            && self
                .path
                .iter()
                .skip(self.target_index)
                .any(|candidate| candidate.id == node)
    }

    /// Nodes still ahead of the enemy, its current target first.
    pub(crate) fn remaining_route(&self) -> Vec<NodeId> {
        if self.target_point.is_none() {
            return Vec::new();
        }
        self.path
            .iter()
            .skip(self.target_index)
            .map(|node| node.id)
            .collect()
    }

    /// Node a fresh route should start from when `blocked` was just closed.
    ///
    /// An enemy heading straight for the blocked node backs up to the last
    /// node it stood on; every other enemy keeps walking toward its current
    /// target.
    pub(crate) fn reroute_origin(&self, blocked: NodeId) -> Option<NodeId> {
        let target = self.target_node()?;
        if target == blocked {
            return self.last_reached;
        }
        Some(target)
    }

    /// Replaces the path and restarts walking from its first node.
    pub(crate) fn update_path<R: Rng>(
        &mut self,
        path: Vec<PathNode>,
        rng: &mut R,
        jitter_radius: f32,
    ) {
        self.path = path;
        self.target_index = 0;
        self.aim(rng, jitter_radius);
    }

    fn current_speed(&self, detour_slowdown: f32) -> f32 {
        let on_detour = self
            .path
            .get(self.target_index)
            .is_some_and(|node| node.kind == NodeKind::Detour);
        if on_detour && !self.ignore_slowdown {
            self.speed * detour_slowdown
        } else {
            self.speed
        }
    }
}

fn jitter<R: Rng>(rng: &mut R, radius: f32) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.gen_range(-radius..=radius),
        rng.gen_range(-radius..=radius),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn straight_path(kinds: &[NodeKind]) -> Vec<PathNode> {
        kinds
            .iter()
            .enumerate()
            .map(|(index, &kind)| PathNode {
                id: NodeId::Main(index as u32),
                position: Vec2::new(index as f32 * 100.0, 0.0),
                kind,
            })
            .collect()
    }

    fn setup(hp: u32, ignore_slowdown: bool, path: Vec<PathNode>) -> EnemySetup {
        EnemySetup {
            kind: EnemyKind::Regular,
            stats: EnemyStats {
                hp,
                reward: 11,
                damage_to_player: 1,
            },
            speed: 100.0,
            scale: 1.0,
            ignore_slowdown,
            show_health_bar: true,
            path,
        }
    }

    fn spawned(hp: u32, ignore_slowdown: bool, kinds: &[NodeKind]) -> Enemy {
        let mut enemy = Enemy::default();
        enemy.reset(setup(hp, ignore_slowdown, straight_path(kinds)));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        enemy.aim(&mut rng, 0.0);
        enemy
    }

    #[test]
    fn starts_at_first_node_heading_for_second() {
        let enemy = spawned(10, false, &[NodeKind::Default; 3]);
        assert_eq!(enemy.position(), Vec2::ZERO);
        assert_eq!(enemy.target_node(), Some(NodeId::Main(1)));
        assert!(enemy.is_alive());
    }

    #[test]
    fn two_hits_kill_exactly_once() {
        let mut enemy = spawned(50, false, &[NodeKind::Default; 2]);
        let flash = Duration::from_millis(150);

        assert_eq!(enemy.take_damage(30, flash), Wound::Damaged);
        assert_eq!(enemy.hp(), 20);
        assert!(enemy.is_flashing());
        assert_eq!(enemy.take_damage(30, flash), Wound::Killed);
        assert_eq!(enemy.hp(), -10);
        assert_eq!(enemy.take_damage(30, flash), Wound::Ignored);
        assert_eq!(enemy.hp(), -10);
        assert!(!enemy.is_alive());
    }

    #[test]
    fn walks_to_finish() {
        let mut enemy = spawned(10, false, &[NodeKind::Default; 3]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let dt = Duration::from_millis(500);

        assert_eq!(enemy.advance(dt, 0.35, 0.0, &mut rng), Stride::Walking);
        assert!((enemy.position().x - 50.0).abs() < 1e-3);

        let mut outcome = Stride::Walking;
        for _ in 0..10 {
            outcome = enemy.advance(dt, 0.35, 0.0, &mut rng);
            if outcome == Stride::Finished {
                break;
            }
        }
        assert_eq!(outcome, Stride::Finished);
        assert!(!enemy.is_alive());
        assert_eq!(enemy.advance(dt, 0.35, 0.0, &mut rng), Stride::Idle);
    }

    #[test]
    fn detour_nodes_slow_regular_enemies_only() {
        let kinds = [NodeKind::Default, NodeKind::Detour, NodeKind::Default];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let dt = Duration::from_millis(100);

        let mut regular = spawned(10, false, &kinds);
        let _ = regular.advance(dt, 0.35, 0.0, &mut rng);
        assert!((regular.position().x - 3.5).abs() < 1e-3);

        let mut powerful = spawned(10, true, &kinds);
        let _ = powerful.advance(dt, 0.35, 0.0, &mut rng);
        assert!((powerful.position().x - 10.0).abs() < 1e-3);
    }

    #[test]
    fn jitter_stays_within_radius() {
        let mut enemy = spawned(10, false, &[NodeKind::Default; 2]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..32 {
            enemy.aim(&mut rng, 8.0);
            let point = enemy.target_point.expect("target");
            assert!((point.x - 100.0).abs() <= 8.0);
            assert!(point.y.abs() <= 8.0);
        }
    }

    #[test]
    fn reroute_origin_backs_up_when_heading_into_the_block() {
        let enemy = spawned(10, false, &[NodeKind::Default; 4]);
        assert!(enemy.route_contains(NodeId::Main(2)));
        assert!(!enemy.route_contains(NodeId::Main(0)));
        assert_eq!(enemy.reroute_origin(NodeId::Main(1)), Some(NodeId::Main(0)));
        assert_eq!(enemy.reroute_origin(NodeId::Main(2)), Some(NodeId::Main(1)));
    }

    #[test]
    fn reroute_origin_uses_last_reached_node_after_a_path_swap() {
        let mut enemy = spawned(10, false, &[NodeKind::Default; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let _ = enemy.advance(Duration::from_millis(1500), 0.35, 0.0, &mut rng);
        assert_eq!(enemy.target_node(), Some(NodeId::Main(2)));

        let ahead = straight_path(&[NodeKind::Default; 4])
            .into_iter()
            .skip(2)
            .collect();
        enemy.update_path(ahead, &mut rng, 0.0);
        assert_eq!(enemy.target_node(), Some(NodeId::Main(2)));
        assert_eq!(enemy.remaining_route(), vec![NodeId::Main(2), NodeId::Main(3)]);
        assert_eq!(enemy.reroute_origin(NodeId::Main(2)), Some(NodeId::Main(1)));
    }

    #[test]
    fn update_path_restarts_at_first_node() {
        let mut enemy = spawned(10, false, &[NodeKind::Default; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let fresh = straight_path(&[NodeKind::Default; 2]);
        enemy.update_path(fresh, &mut rng, 0.0);
        assert_eq!(enemy.target_node(), Some(NodeId::Main(0)));
    }

    #[test]
    fn pooled_enemies_forget_previous_life() {
        let mut pool = Pool::<Enemy>::new();
        let first = pool.get(setup(5, false, straight_path(&[NodeKind::Default; 3])));
        if let Some(enemy) = pool.resolve_mut(first) {
            let _ = enemy.take_damage(5, Duration::ZERO);
        }
        assert!(pool.put(first));

        let second = pool.get(setup(9, false, straight_path(&[NodeKind::Default; 3])));
        let enemy = pool.resolve(second).expect("recycled enemy");
        assert_eq!(enemy.hp(), 9);
        assert!(enemy.is_alive());
        assert_eq!(enemy.target_node(), None);
    }
}
