#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gate Defence.
//!
//! The world owns the path graph, every pooled entity, the tower registry,
//! the economy ledger and the gate. It is mutated exclusively through
//! [`apply`] and observed through the [`query`] module.

mod economy;
mod effects;
mod enemies;
mod navigation;
mod pool;
mod projectiles;
mod towers;

use std::{collections::BTreeSet, time::Duration};

use gate_defence_core::{
    BoosterKind, CoinId, Command, ConfigError, EnemyId, EnemyKind, EnemyStats, Event, GameConfig,
    MovementTuning, NodeId, NodeKind, PlaceableItem, PlacementError, PlayState, ProjectileId,
    ProjectileTuning, Registry, SlotId, SoundCue, TowerId, TowerKind, TowerSlot, Vec2,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::{
    economy::Ledger,
    effects::Coin,
    enemies::{Enemy, EnemySetup, Stride, Wound},
    projectiles::{Flight, Launch, Projectile},
    towers::TowerRegistry,
};

pub use navigation::{PathEdge, PathGraph, DETOUR_EDGE_WEIGHT, MAIN_EDGE_WEIGHT};
pub use pool::{Pool, Poolable};

/// Authoritative simulation state.
#[derive(Debug)]
pub struct World {
    registry: Registry,
    graph: PathGraph,
    slots: Vec<TowerSlot>,
    snap_radius: f32,
    obstacles: BTreeSet<NodeId>,
    towers: TowerRegistry,
    enemies: Pool<Enemy>,
    projectiles: Pool<Projectile>,
    coins: Pool<Coin>,
    ledger: Ledger,
    gate_hp: u32,
    play_state: PlayState,
    movement: MovementTuning,
    projectile_tuning: ProjectileTuning,
    damage_flash: Duration,
    coin_flight: Duration,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Builds a world from validated configuration.
    ///
    /// Configuration bugs surface here, before the first tick.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Registry::from_config(config)?;

        let slots = config
            .map
            .tower_slots
            .iter()
            .enumerate()
            .map(|(index, &position)| TowerSlot {
                id: SlotId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                position,
            })
            .collect();

        Ok(Self {
            registry,
            graph: PathGraph::from_map(&config.map),
            slots,
            snap_radius: config.map.snap_radius,
            obstacles: BTreeSet::new(),
            towers: TowerRegistry::new(),
            enemies: Pool::new(),
            projectiles: Pool::new(),
            coins: Pool::new(),
            ledger: Ledger::new(config.economy.initial_balance),
            gate_hp: config.gate.max_hp,
            play_state: PlayState::Running,
            movement: config.movement.clone(),
            projectile_tuning: config.projectiles.clone(),
            damage_flash: Duration::from_millis(config.movement.damage_flash_ms),
            coin_flight: Duration::from_millis(config.effects.coin_flight_ms),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick_index: 0,
        })
    }

    fn is_defeated(&self) -> bool {
        self.play_state == PlayState::Defeated
    }

    fn move_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut arrived = Vec::new();
        for handle in self.enemies.handles() {
            let Some(enemy) = self.enemies.resolve_mut(handle) else {
                continue;
            };
            let stride = enemy.advance(
                dt,
                self.movement.detour_slowdown,
                self.movement.jitter_radius,
                &mut self.rng,
            );
            if stride == Stride::Finished {
                arrived.push(handle);
            }
        }

        for handle in arrived {
            let Some(damage) = self.enemies.resolve(handle).map(Enemy::damage_to_player) else {
                continue;
            };
            let _ = self.enemies.put(handle);
            let enemy = EnemyId::from_handle(handle);
            debug!(?enemy, damage, "enemy reached the gate");
            out_events.push(Event::EnemyReachedGoal { enemy, damage });
            self.damage_gate(damage, out_events);
        }
    }

    fn damage_gate(&mut self, damage: u32, out_events: &mut Vec<Event>) {
        if self.is_defeated() {
            return;
        }

        self.gate_hp = self.gate_hp.saturating_sub(damage);
        out_events.push(Event::GateDamaged { hp: self.gate_hp });
        out_events.push(Event::SoundRequested {
            cue: SoundCue::GateHit,
        });

        if self.gate_hp == 0 {
            self.play_state = PlayState::Defeated;
            info!(tick = self.tick_index, "the gate fell");
            out_events.push(Event::GameOver);
        }
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, stats: EnemyStats, out_events: &mut Vec<Event>) {
        if self.is_defeated() {
            return;
        }

        let traits = match self.registry.enemy(kind) {
            Ok(traits) => traits,
            Err(error) => {
                warn!(%error, "enemy spawn skipped");
                out_events.push(Event::SpawnAborted { kind });
                return;
            }
        };

        let path = self.graph.find_path(self.graph.start(), self.graph.finish());
        let Some(position) = path.first().map(|node| node.position) else {
            warn!(?kind, "no route to the gate; spawn aborted");
            out_events.push(Event::SpawnAborted { kind });
            return;
        };

        let handle = self.enemies.get(EnemySetup {
            kind,
            stats,
            speed: traits.speed,
            scale: traits.scale_multiplier,
            ignore_slowdown: traits.ignore_slowdown,
            show_health_bar: traits.show_health_bar,
            path,
        });
        if let Some(enemy) = self.enemies.resolve_mut(handle) {
            enemy.aim(&mut self.rng, self.movement.jitter_radius);
        }

        let enemy = EnemyId::from_handle(handle);
        debug!(?enemy, ?kind, hp = stats.hp, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            position,
            scale: traits.scale_multiplier,
            texture: traits.texture.clone(),
        });
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.is_defeated() {
            return;
        }

        let mut killed = Vec::new();
        for handle in self.projectiles.handles() {
            let Some(projectile) = self.projectiles.resolve_mut(handle) else {
                continue;
            };
            let target_position = projectile
                .target()
                .and_then(|target| self.enemies.resolve(target.handle()))
                .filter(|enemy| enemy.is_alive())
                .map(Enemy::position);
            let flight = projectile.advance(target_position, dt, &self.projectile_tuning);

            let projectile = ProjectileId::from_handle(handle);
            match flight {
                Flight::Airborne => {}
                Flight::Lost => {
                    let _ = self.projectiles.put(handle);
                    debug!(?projectile, "projectile lost its target");
                    out_events.push(Event::ProjectileDiscarded { projectile });
                }
                Flight::Hit { target, damage } => {
                    let _ = self.projectiles.put(handle);
                    out_events.push(Event::ProjectileHit {
                        projectile,
                        target,
                        damage,
                    });

                    let Some(enemy) = self.enemies.resolve_mut(target.handle()) else {
                        continue;
                    };
                    let wound = enemy.take_damage(damage, self.damage_flash);
                    if wound == Wound::Ignored {
                        continue;
                    }
                    out_events.push(Event::EnemyDamaged {
                        enemy: target,
                        hp: enemy.hp(),
                        max_hp: enemy.max_hp(),
                    });
                    if wound == Wound::Killed {
                        killed.push(target);
                    }
                }
            }
        }

        for target in killed {
            self.release_killed(target, out_events);
        }
    }

    fn release_killed(&mut self, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.resolve(target.handle()) else {
            return;
        };
        let (kind, position, reward) = (enemy.kind(), enemy.position(), enemy.reward());
        let _ = self.enemies.put(target.handle());

        self.ledger.add(reward);
        debug!(enemy = ?target, ?kind, reward, "enemy killed");
        out_events.push(Event::EnemyKilled {
            enemy: target,
            kind,
            position,
            reward,
        });
        out_events.push(self.balance_event());
        out_events.push(Event::SoundRequested {
            cue: SoundCue::EnemyKilled,
        });

        let coin = self.coins.get((position, self.coin_flight));
        out_events.push(Event::CoinDropped {
            coin: CoinId::from_handle(coin),
            position,
        });
    }

    fn fire(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        if self.is_defeated() {
            return;
        }

        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if !state.is_ready() {
            return;
        }
        let Some(aim) = self
            .enemies
            .resolve(target.handle())
            .filter(|enemy| enemy.is_alive())
            .map(Enemy::position)
        else {
            return;
        };

        let origin = state.position - Vec2::new(0.0, self.projectile_tuning.launch_offset);
        let handle = self.projectiles.get(Launch {
            kind: state.projectile,
            target,
            damage: state.damage,
            speed: state.projectile_speed,
            origin,
            aim,
        });
        state.cooldown = state.fire_rate;

        out_events.push(Event::ProjectileFired {
            projectile: ProjectileId::from_handle(handle),
            tower,
            target,
            kind: state.projectile,
        });
    }

    fn advance_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for handle in self.coins.handles() {
            let landed = self
                .coins
                .resolve_mut(handle)
                .is_some_and(|coin| coin.advance(dt));
            if landed && self.coins.put(handle) {
                out_events.push(Event::CoinCollected {
                    coin: CoinId::from_handle(handle),
                });
            }
        }
    }

    fn place_tower(&mut self, kind: TowerKind, slot: SlotId, out_events: &mut Vec<Event>) {
        match self.try_place_tower(kind, slot) {
            Ok((tower, position)) => {
                info!(?tower, ?kind, %slot, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    slot,
                    position,
                });
                out_events.push(self.balance_event());
                let cue = if kind.requires_building_animation() {
                    SoundCue::BuildStarted
                } else {
                    SoundCue::TowerBuilt
                };
                out_events.push(Event::SoundRequested { cue });
            }
            Err(reason) => reject(PlaceableItem::Tower(kind), reason, out_events),
        }
    }

    fn try_place_tower(
        &mut self,
        kind: TowerKind,
        slot: SlotId,
    ) -> Result<(TowerId, Vec2), PlacementError> {
        if self.is_defeated() {
            return Err(PlacementError::GameOver);
        }
        let position = self
            .slots
            .get(slot.get() as usize)
            .map(|candidate| candidate.position)
            .ok_or(PlacementError::UnknownSlot)?;
        if self.towers.is_occupied(slot) {
            return Err(PlacementError::SlotOccupied);
        }
        let config = self
            .registry
            .tower(kind)
            .map_err(|_| PlacementError::InvalidLocation)?;
        if !self.ledger.spend(config.price) {
            return Err(PlacementError::InsufficientFunds);
        }

        Ok((self.towers.insert(kind, slot, position, config), position))
    }

    fn place_obstacle(&mut self, kind: BoosterKind, node: NodeId, out_events: &mut Vec<Event>) {
        match self.try_place_obstacle(kind, node) {
            Ok(position) => {
                info!(?kind, %node, "obstacle placed");
                out_events.push(Event::ObstaclePlaced {
                    kind,
                    node,
                    position,
                });
                out_events.push(self.balance_event());
                out_events.push(Event::SoundRequested {
                    cue: SoundCue::RoadblockPlaced,
                });
                self.reroute_enemies(node, out_events);
            }
            Err(reason) => reject(PlaceableItem::Booster(kind), reason, out_events),
        }
    }

    fn try_place_obstacle(
        &mut self,
        kind: BoosterKind,
        node: NodeId,
    ) -> Result<Vec2, PlacementError> {
        if self.is_defeated() {
            return Err(PlacementError::GameOver);
        }
        let position = self
            .graph
            .node(node)
            .filter(|candidate| candidate.kind == NodeKind::Obstacle)
            .map(|candidate| candidate.position)
            .ok_or(PlacementError::NotAnObstacleNode)?;
        if self.obstacles.contains(&node) {
            return Err(PlacementError::NodeOccupied);
        }
        let price = self
            .registry
            .booster(kind)
            .map(|booster| booster.price)
            .map_err(|_| PlacementError::InvalidLocation)?;

        let _ = self.graph.set_node_blocked(node, true);
        if self
            .graph
            .find_path(self.graph.start(), self.graph.finish())
            .is_empty()
        {
            let _ = self.graph.set_node_blocked(node, false);
            return Err(PlacementError::SealsPath);
        }
        if !self.ledger.spend(price) {
            let _ = self.graph.set_node_blocked(node, false);
            return Err(PlacementError::InsufficientFunds);
        }

        let _ = self.obstacles.insert(node);
        Ok(position)
    }

    /// Gives a fresh route to every enemy whose remaining path crosses `blocked`.
    fn reroute_enemies(&mut self, blocked: NodeId, out_events: &mut Vec<Event>) {
        let finish = self.graph.finish();
        for handle in self.enemies.handles() {
            let Some(origin) = self
                .enemies
                .resolve(handle)
                .filter(|enemy| enemy.route_contains(blocked))
                .and_then(|enemy| enemy.reroute_origin(blocked))
            else {
                continue;
            };

            let enemy_id = EnemyId::from_handle(handle);
            let path = self.graph.find_path(origin, finish);
            if path.is_empty() {
                warn!(enemy = ?enemy_id, %origin, "no route left; enemy keeps its path");
                out_events.push(Event::EnemyStranded { enemy: enemy_id });
                continue;
            }

            if let Some(enemy) = self.enemies.resolve_mut(handle) {
                enemy.update_path(path, &mut self.rng, self.movement.jitter_radius);
                out_events.push(Event::EnemyRerouted { enemy: enemy_id });
            }
        }
    }

    fn grant_reward(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        self.ledger.add(amount);
        out_events.push(self.balance_event());
    }

    fn balance_event(&self) -> Event {
        Event::BalanceChanged {
            balance: self.ledger.balance(),
            total_earned: self.ledger.total_earned(),
        }
    }
}

fn reject(item: PlaceableItem, reason: PlacementError, out_events: &mut Vec<Event>) {
    info!(?item, ?reason, "placement rejected");
    out_events.push(Event::PlacementRejected { item, reason });
    out_events.push(Event::SoundRequested {
        cue: SoundCue::PlacementFailed,
    });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            if !world.is_defeated() {
                world.move_enemies(dt, out_events);
            }
        }
        Command::SpawnEnemy { kind, stats } => world.spawn_enemy(kind, stats, out_events),
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::AdvanceTowers { dt } => {
            if !world.is_defeated() {
                world.towers.advance(dt);
            }
        }
        Command::FireProjectile { tower, target } => world.fire(tower, target, out_events),
        Command::AdvanceEffects { dt } => world.advance_effects(dt, out_events),
        Command::PlaceTower { kind, slot } => world.place_tower(kind, slot, out_events),
        Command::PlaceObstacle { kind, node } => world.place_obstacle(kind, node, out_events),
        Command::GrantReward { amount } => world.grant_reward(amount, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gate_defence_core::{
        CoinId, EnemyId, EnemySnapshot, EnemyView, NodeId, NodeKind, PathNode, PlayState,
        ProjectileId, ProjectileSnapshot, Registry, TowerCooldownView, TowerSlot, TowerView, Vec2,
    };

    use super::{Enemy, PathGraph, World};

    fn snapshot(id: EnemyId, enemy: &Enemy) -> EnemySnapshot {
        EnemySnapshot {
            id,
            kind: enemy.kind(),
            position: enemy.position(),
            hp: enemy.hp(),
            max_hp: enemy.max_hp(),
            target_node: enemy.target_node(),
            scale: enemy.scale(),
            show_health_bar: enemy.show_health_bar(),
            flashing: enemy.is_flashing(),
        }
    }

    /// Captures every live enemy in spawn order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|(handle, enemy)| snapshot(EnemyId::from_handle(handle), enemy))
                .collect(),
        )
    }

    /// Captures a single enemy; `None` once the handle went stale.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world
            .enemies
            .resolve(id.handle())
            .map(|enemy| snapshot(id, enemy))
    }

    /// Nodes the enemy still has to walk, its current target first.
    ///
    /// Empty once the handle went stale or the enemy stopped walking.
    #[must_use]
    pub fn enemy_route(world: &World, id: EnemyId) -> Vec<NodeId> {
        world
            .enemies
            .resolve(id.handle())
            .map(Enemy::remaining_route)
            .unwrap_or_default()
    }

    /// Number of enemies currently on the map.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures every placed tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Captures the cooldown and construction state of every tower.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        TowerCooldownView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.cooldown_snapshot())
                .collect(),
        )
    }

    /// Captures every projectile in flight in launch order.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|(handle, projectile)| ProjectileSnapshot {
                id: ProjectileId::from_handle(handle),
                kind: projectile.kind(),
                position: projectile.position(),
                height: projectile.height(),
                rotation: projectile.rotation(),
            })
            .collect()
    }

    /// Number of coins still flying to the wallet.
    #[must_use]
    pub fn coin_count(world: &World) -> usize {
        world.coins.len()
    }

    /// Positions of the coins still flying to the wallet.
    #[must_use]
    pub fn coin_positions(world: &World) -> Vec<(CoinId, Vec2)> {
        world
            .coins
            .iter()
            .map(|(handle, coin)| (CoinId::from_handle(handle), coin.position()))
            .collect()
    }

    /// Money currently available.
    #[must_use]
    pub fn balance(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Money earned over the whole session.
    #[must_use]
    pub fn total_earned(world: &World) -> u32 {
        world.ledger.total_earned()
    }

    /// Remaining gate hit points.
    #[must_use]
    pub fn gate_hp(world: &World) -> u32 {
        world.gate_hp
    }

    /// Whether the gate still stands.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Every tower slot on the map.
    #[must_use]
    pub fn tower_slots(world: &World) -> &[TowerSlot] {
        &world.slots
    }

    /// Tower slots that do not hold a tower yet.
    #[must_use]
    pub fn free_tower_slots(world: &World) -> Vec<TowerSlot> {
        world
            .slots
            .iter()
            .filter(|slot| !world.towers.is_occupied(slot.id))
            .copied()
            .collect()
    }

    /// Obstacle nodes that do not hold a booster yet.
    #[must_use]
    pub fn free_obstacle_nodes(world: &World) -> Vec<PathNode> {
        world
            .graph
            .nodes()
            .iter()
            .filter(|node| node.kind == NodeKind::Obstacle && !world.obstacles.contains(&node.id))
            .copied()
            .collect()
    }

    /// Number of obstacle nodes holding a booster.
    #[must_use]
    pub fn obstacle_count(world: &World) -> usize {
        world.obstacles.len()
    }

    /// Radius within which placement snaps onto a slot or node.
    #[must_use]
    pub fn snap_radius(world: &World) -> f32 {
        world.snap_radius
    }

    /// Read access to the path graph.
    #[must_use]
    pub fn path_graph(world: &World) -> &PathGraph {
        &world.graph
    }

    /// Cheapest route between two nodes under the current blocking state.
    #[must_use]
    pub fn find_path(world: &World, start: NodeId, end: NodeId) -> Vec<PathNode> {
        world.graph.find_path(start, end)
    }

    /// Registry of tower, enemy and booster configuration.
    #[must_use]
    pub fn registry(world: &World) -> &Registry {
        &world.registry
    }
}
