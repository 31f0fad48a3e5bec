#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gate Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and subscribers to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with new
//! command batches.

mod config;
mod registry;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use config::{
    BoosterConfig, BuildingConfig, DetourConfig, EconomyConfig, EffectsTuning, EnemyTypeConfig,
    GameConfig, GateConfig, MapConfig, MovementTuning, ProjectileTuning, TowerConfig, WaveTuning,
};
pub use glam::Vec2;
pub use registry::{ConfigError, Registry};

/// Describes whether the defended gate still stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// The simulation advances normally.
    Running,
    /// The gate fell; only the clock advances and placements are refused.
    Defeated,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and moves every live enemy.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an enemy of the provided kind enters at the start node.
    SpawnEnemy {
        /// Type of enemy to spawn; movement traits come from the registry.
        kind: EnemyKind,
        /// Wave-scaled stats assigned to the enemy.
        stats: EnemyStats,
    },
    /// Moves every projectile in flight and resolves hits.
    AdvanceProjectiles {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Counts down tower cooldowns and construction timers.
    AdvanceTowers {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Requests that a tower launches a projectile at the provided enemy.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy the projectile homes onto.
        target: EnemyId,
    },
    /// Advances presentation-only effects such as coin drops.
    AdvanceEffects {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Requests construction of a tower on a slot.
    PlaceTower {
        /// Kind of tower to construct.
        kind: TowerKind,
        /// Slot the tower occupies.
        slot: SlotId,
    },
    /// Requests that a booster obstacle is dropped on an obstacle node.
    PlaceObstacle {
        /// Kind of booster to place.
        kind: BoosterKind,
        /// Obstacle node that becomes blocked.
        node: NodeId,
    },
    /// Credits the player's balance outside of kill rewards.
    GrantReward {
        /// Amount of money credited.
        amount: u32,
    },
}

/// Events broadcast by the world and systems after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Handle assigned to the enemy.
        enemy: EnemyId,
        /// Type of the spawned enemy.
        kind: EnemyKind,
        /// World position of the start node.
        position: Vec2,
        /// Scale the view should apply to the enemy sprite.
        scale: f32,
        /// Texture alias resolved from the registry.
        texture: String,
    },
    /// Reports that a spawn was skipped because the goal is unreachable.
    SpawnAborted {
        /// Type of the enemy that could not be spawned.
        kind: EnemyKind,
    },
    /// Reports that an enemy lost health.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Remaining hit points, possibly negative.
        hp: i32,
        /// Hit points the enemy spawned with.
        max_hp: i32,
    },
    /// Reports that an enemy died and was released.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Position at the moment of death.
        position: Vec2,
        /// Money credited to the player.
        reward: u32,
    },
    /// Reports that an enemy walked into the gate and was released.
    EnemyReachedGoal {
        /// Enemy that finished its path.
        enemy: EnemyId,
        /// Damage dealt to the gate.
        damage: u32,
    },
    /// Reports that an enemy received a fresh path after an obstacle placement.
    EnemyRerouted {
        /// Enemy that changed its route.
        enemy: EnemyId,
    },
    /// Reports that rerouting found no route; the enemy keeps its old path.
    EnemyStranded {
        /// Enemy that could not be rerouted.
        enemy: EnemyId,
    },
    /// Reports the gate's remaining health after a hit.
    GateDamaged {
        /// Remaining gate hit points.
        hp: u32,
    },
    /// Announces that the gate fell. Emitted at most once.
    GameOver,
    /// Reports a change in the player's balance.
    BalanceChanged {
        /// Money currently available.
        balance: u32,
        /// Money earned over the whole session.
        total_earned: u32,
    },
    /// Confirms that a tower was constructed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Kind of the tower.
        kind: TowerKind,
        /// Slot the tower occupies.
        slot: SlotId,
        /// World position of the slot.
        position: Vec2,
    },
    /// Confirms that an obstacle blocked a path node.
    ObstaclePlaced {
        /// Kind of booster placed.
        kind: BoosterKind,
        /// Node that is now blocked.
        node: NodeId,
        /// World position of the node.
        position: Vec2,
    },
    /// Reports that a placement attempt was refused. Balance is untouched.
    PlacementRejected {
        /// Item whose placement failed.
        item: PlaceableItem,
        /// Specific reason for the rejection.
        reason: PlacementError,
    },
    /// Confirms that a projectile left a tower.
    ProjectileFired {
        /// Handle of the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy being tracked.
        target: EnemyId,
        /// Motion model of the projectile.
        kind: ProjectileKind,
    },
    /// Reports that a projectile struck its target.
    ProjectileHit {
        /// Projectile that hit.
        projectile: ProjectileId,
        /// Enemy that was struck.
        target: EnemyId,
        /// Damage applied.
        damage: u32,
    },
    /// Reports that a projectile lost its target and was released silently.
    ProjectileDiscarded {
        /// Projectile that was dropped.
        projectile: ProjectileId,
    },
    /// Reports that a coin dropped where an enemy died.
    CoinDropped {
        /// Handle of the coin effect.
        coin: CoinId,
        /// Drop position.
        position: Vec2,
    },
    /// Reports that a coin finished its flight to the wallet.
    CoinCollected {
        /// Handle of the coin effect.
        coin: CoinId,
    },
    /// Requests that the sound service plays a cue.
    SoundRequested {
        /// Cue to play.
        cue: SoundCue,
    },
    /// Announces that a new wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of enemies scheduled for the wave.
        total: u32,
    },
    /// Announces a transition of the wave state machine.
    WaveStateChanged {
        /// Current wave number.
        wave: u32,
        /// State that became active.
        state: WaveState,
    },
    /// Reports the time left before the next wave starts automatically.
    WaveTimerUpdated {
        /// Remaining time.
        remaining: Duration,
    },
    /// Reports kill progress within the current wave.
    KillProgress {
        /// Current wave number.
        wave: u32,
        /// Enemies killed in the wave so far.
        killed: u32,
        /// Enemies scheduled for the wave.
        total: u32,
    },
    /// Reports that every enemy of a wave died before the timer elapsed.
    WaveCleared {
        /// Wave that was cleared.
        wave: u32,
        /// Bonus credited for clearing early.
        bonus: u32,
    },
}

/// Cues forwarded to the sound service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A tower finished instantly.
    TowerBuilt,
    /// A tower began its construction animation.
    BuildStarted,
    /// A roadblock was dropped onto the path.
    RoadblockPlaced,
    /// A placement attempt was refused.
    PlacementFailed,
    /// An enemy died.
    EnemyKilled,
    /// The gate took damage.
    GateHit,
}

/// States of the wave orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveState {
    /// No wave is active; waiting for an explicit start.
    Idle,
    /// Enemies are being released from the spawn queue.
    Spawning,
    /// The queue is empty; waiting for kills or the next-wave timer.
    Waiting,
}

/// Generational handle into a pooled collection.
///
/// A handle only resolves while the slot it names still holds the same
/// generation, so a handle to a released entity never aliases a recycled one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Creates a handle from raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the pool.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot held when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Non-owning reference to a pooled enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(Handle);

impl EnemyId {
    /// Wraps a pool handle.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    /// Underlying pool handle.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.0
    }
}

/// Non-owning reference to a pooled projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(Handle);

impl ProjectileId {
    /// Wraps a pool handle.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    /// Underlying pool handle.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.0
    }
}

/// Non-owning reference to a pooled coin effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoinId(Handle);

impl CoinId {
    /// Wraps a pool handle.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    /// Underlying pool handle.
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a fixed tower slot, equal to its index in the map's slot list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot_{}", self.0)
    }
}

/// Identifier of a node in the path graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeId {
    /// Node emitted for a main-path waypoint.
    Main(u32),
    /// Node emitted for a detour waypoint, namespaced by its obstacle index.
    Detour {
        /// Main-path index of the obstacle the detour bypasses.
        obstacle: u32,
        /// Position of the waypoint within the detour.
        index: u32,
    },
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main(index) => write!(f, "node_{index}"),
            Self::Detour { obstacle, index } => write!(f, "detour_{obstacle}_{index}"),
        }
    }
}

/// Role of a node in the path graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain main-path waypoint.
    Default,
    /// Main-path waypoint that may be blocked by a booster.
    Obstacle,
    /// Waypoint of an alternative route around an obstacle.
    Detour,
}

/// Point of the enemy travel graph. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathNode {
    /// Unique identifier.
    pub id: NodeId,
    /// World position.
    pub position: Vec2,
    /// Role within the graph.
    pub kind: NodeKind,
}

/// Fixed map position where a tower may be built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSlot {
    /// Identifier of the slot.
    pub id: SlotId,
    /// World position of the slot.
    pub position: Vec2,
}

/// Types of enemies that walk toward the gate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy slowed down by detours.
    #[default]
    Regular,
    /// Sturdier enemy that appears in later waves and ignores slowdown.
    Powerful,
}

impl EnemyKind {
    /// Every enemy kind the registry must describe.
    pub const ALL: [EnemyKind; 2] = [EnemyKind::Regular, EnemyKind::Powerful];
}

/// Types of towers that can be constructed on slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Stone tower lobbing arcing shells.
    Regular,
    /// Archer tower shooting straight arrows after a construction animation.
    Archer,
}

impl TowerKind {
    /// Every tower kind the registry must describe.
    pub const ALL: [TowerKind; 2] = [TowerKind::Regular, TowerKind::Archer];

    /// Reports whether the kind plays a construction animation before firing.
    #[must_use]
    pub const fn requires_building_animation(self) -> bool {
        matches!(self, Self::Archer)
    }
}

/// Types of boosters that can be dropped on obstacle nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoosterKind {
    /// Blocks an obstacle node, forcing enemies onto its detour.
    Roadblock,
}

impl BoosterKind {
    /// Every booster kind the registry must describe.
    pub const ALL: [BoosterKind; 1] = [BoosterKind::Roadblock];
}

/// Motion model used by a projectile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Straight homing flight facing the direction of travel.
    #[default]
    Linear,
    /// Homing flight lifted by a parabola and spinning.
    Arc,
}

/// Item the player may place on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceableItem {
    /// A tower bound to a tower slot.
    Tower(TowerKind),
    /// A booster bound to an obstacle node.
    Booster(BoosterKind),
}

/// Wave-scaled stats handed to a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnemyStats {
    /// Starting hit points.
    pub hp: u32,
    /// Money credited when the enemy dies.
    pub reward: u32,
    /// Damage dealt to the gate when the enemy finishes its path.
    pub damage_to_player: u32,
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// Confirmation arrived while nothing was being placed.
    NoActivePlacement,
    /// The pointer is not within snapping range of a free target.
    InvalidLocation,
    /// The tower slot already holds a tower.
    SlotOccupied,
    /// The obstacle node already holds an obstacle.
    NodeOccupied,
    /// The requested node is not an obstacle node.
    NotAnObstacleNode,
    /// The requested slot does not exist on the map.
    UnknownSlot,
    /// The balance does not cover the item's price.
    InsufficientFunds,
    /// Blocking the node would cut every route to the gate.
    SealsPath,
    /// The gate fell; the session no longer accepts placements.
    GameOver,
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Handle of the enemy.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Vec2,
    /// Remaining hit points.
    pub hp: i32,
    /// Hit points the enemy spawned with.
    pub max_hp: i32,
    /// Node the enemy is walking toward, if any.
    pub target_node: Option<NodeId>,
    /// Scale the view applies to the sprite.
    pub scale: f32,
    /// Whether the view draws a health bar.
    pub show_health_bar: bool,
    /// Whether the damage flash is still visible.
    pub flashing: bool,
}

/// Read-only snapshot describing every live enemy in spawn order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view, preserving the provided spawn order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of live enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Slot the tower occupies.
    pub slot: SlotId,
    /// World position of the tower.
    pub position: Vec2,
    /// Targeting radius in world units.
    pub range: f32,
}

/// Read-only snapshot describing all towers placed on the map.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Cooldown state of a single tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerCooldownSnapshot {
    /// Tower described by the snapshot.
    pub tower: TowerId,
    /// Kind of the tower.
    pub kind: TowerKind,
    /// Time left before the tower may fire again.
    pub ready_in: Duration,
    /// Whether the construction animation is still playing.
    pub building: bool,
}

impl TowerCooldownSnapshot {
    /// A tower fires once its cooldown elapsed and it is fully built.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.ready_in.is_zero() && !self.building
    }
}

/// Read-only snapshot of every tower cooldown, sorted by tower identifier.
#[derive(Clone, Debug, Default)]
pub struct TowerCooldownView {
    snapshots: Vec<TowerCooldownSnapshot>,
}

impl TowerCooldownView {
    /// Creates a new cooldown view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerCooldownSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.tower);
        Self { snapshots }
    }

    /// Looks up the snapshot of a single tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerCooldownSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.tower)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Whether the tower exists and may fire this tick.
    #[must_use]
    pub fn can_fire(&self, tower: TowerId) -> bool {
        self.get(tower).is_some_and(TowerCooldownSnapshot::can_fire)
    }

    /// Iterator over the cooldown snapshots in tower order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerCooldownSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerCooldownSnapshot> {
        self.snapshots
    }
}

/// Assignment of an enemy to a tower for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that holds the target.
    pub tower: TowerId,
    /// Enemy selected by the tower.
    pub enemy: EnemyId,
    /// Position of the tower.
    pub tower_position: Vec2,
    /// Position of the enemy when it was selected.
    pub enemy_position: Vec2,
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Handle of the projectile.
    pub id: ProjectileId,
    /// Motion model.
    pub kind: ProjectileKind,
    /// Ground position, without the arc lift.
    pub position: Vec2,
    /// Height of the arc above the ground position.
    pub height: f32,
    /// Sprite rotation in radians.
    pub rotation: f32,
}
