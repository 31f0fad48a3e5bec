//! Static configuration consumed once when a session is built.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BoosterKind, ConfigError, EnemyKind, ProjectileKind, TowerKind};

/// Complete description of a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed feeding every random stream of the simulation.
    pub seed: u64,
    /// Path waypoints, detours and tower slots.
    pub map: MapConfig,
    /// Tower registry entries.
    pub towers: BTreeMap<TowerKind, TowerConfig>,
    /// Enemy registry entries.
    pub enemies: BTreeMap<EnemyKind, EnemyTypeConfig>,
    /// Booster registry entries.
    pub boosters: BTreeMap<BoosterKind, BoosterConfig>,
    /// Starting economy.
    pub economy: EconomyConfig,
    /// Defended structure.
    pub gate: GateConfig,
    /// Wave escalation constants.
    pub waves: WaveTuning,
    /// Enemy movement constants.
    pub movement: MovementTuning,
    /// Projectile ballistics constants.
    pub projectiles: ProjectileTuning,
    /// Presentation effect timings.
    pub effects: EffectsTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x6a7e_d3fe_4c1b_0925,
            map: MapConfig::default(),
            towers: BTreeMap::from([
                (
                    TowerKind::Regular,
                    TowerConfig {
                        price: 100,
                        damage: 15,
                        range: 140.0,
                        fire_rate_ms: 2_000,
                        projectile_speed: 180.0,
                        projectile: ProjectileKind::Arc,
                        texture: "regular_tower".to_owned(),
                        projectile_texture: "projectile".to_owned(),
                        building: None,
                    },
                ),
                (
                    TowerKind::Archer,
                    TowerConfig {
                        price: 200,
                        damage: 10,
                        range: 180.0,
                        fire_rate_ms: 1_200,
                        projectile_speed: 360.0,
                        projectile: ProjectileKind::Linear,
                        texture: "archer_tower_anim".to_owned(),
                        projectile_texture: "arrow".to_owned(),
                        building: Some(BuildingConfig {
                            animation: "archer_tower_building".to_owned(),
                            duration_ms: 2_000,
                        }),
                    },
                ),
            ]),
            enemies: BTreeMap::from([
                (
                    EnemyKind::Regular,
                    EnemyTypeConfig {
                        speed: 90.0,
                        scale_multiplier: 1.8,
                        hp_multiplier: 1.0,
                        reward_multiplier: 1.0,
                        ignore_slowdown: false,
                        show_health_bar: false,
                        texture: "monster".to_owned(),
                    },
                ),
                (
                    EnemyKind::Powerful,
                    EnemyTypeConfig {
                        speed: 66.0,
                        scale_multiplier: 2.2,
                        hp_multiplier: 2.5,
                        reward_multiplier: 2.0,
                        ignore_slowdown: true,
                        show_health_bar: true,
                        texture: "monster_powerful".to_owned(),
                    },
                ),
            ]),
            boosters: BTreeMap::from([(
                BoosterKind::Roadblock,
                BoosterConfig {
                    price: 150,
                    texture: "roadblock_booster".to_owned(),
                },
            )]),
            economy: EconomyConfig::default(),
            gate: GateConfig::default(),
            waves: WaveTuning::default(),
            movement: MovementTuning::default(),
            projectiles: ProjectileTuning::default(),
            effects: EffectsTuning::default(),
        }
    }
}

impl GameConfig {
    /// Checks the map layout and tuning values.
    ///
    /// Registry entries are checked separately by [`crate::Registry::from_config`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map.validate()?;
        self.waves.validate()?;
        self.movement.validate()?;
        self.projectiles.validate()
    }
}

/// Static layout of the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Main-path waypoints from the spawn point to the gate.
    pub waypoints: Vec<Vec2>,
    /// Alternative routes around obstacle nodes.
    pub detours: Vec<DetourConfig>,
    /// Positions where towers may be built.
    pub tower_slots: Vec<Vec2>,
    /// Radius within which the pointer snaps onto a slot or node.
    pub snap_radius: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        const MAIN_PATH: [(f32, f32); 44] = [
            (848.0, 761.0),
            (761.0, 689.0),
            (727.0, 593.0),
            (687.0, 515.0),
            (614.0, 453.0),
            (455.0, 368.0),
            (473.0, 319.0),
            (551.0, 306.0),
            (631.0, 284.0),
            (645.0, 246.0),
            (609.0, 203.0),
            (529.0, 181.0),
            (453.0, 192.0),
            (397.0, 232.0),
            (339.0, 335.0),
            (348.0, 402.0),
            (411.0, 473.0),
            (404.0, 504.0),
            (373.0, 522.0),
            (315.0, 507.0),
            (246.0, 480.0),
            (201.0, 504.0),
            (190.0, 551.0),
            (212.0, 591.0),
            (306.0, 634.0),
            (384.0, 634.0),
            (455.0, 591.0),
            (482.0, 544.0),
            (515.0, 480.0),
            (716.0, 342.0),
            (776.0, 346.0),
            (832.0, 386.0),
            (850.0, 435.0),
            (836.0, 491.0),
            (792.0, 527.0),
            (620.0, 585.0),
            (591.0, 634.0),
            (576.0, 707.0),
            (542.0, 754.0),
            (466.0, 801.0),
            (368.0, 803.0),
            (306.0, 772.0),
            (226.0, 692.0),
            (232.0, 634.0),
        ];

        Self {
            waypoints: MAIN_PATH.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            detours: vec![
                DetourConfig {
                    obstacle_index: 5,
                    enter_index: 4,
                    exit_index: 6,
                    waypoints: vec![Vec2::new(575.0, 395.0), Vec2::new(530.0, 340.0)],
                },
                DetourConfig {
                    obstacle_index: 17,
                    enter_index: 16,
                    exit_index: 18,
                    waypoints: vec![Vec2::new(440.0, 505.0), Vec2::new(410.0, 545.0)],
                },
                DetourConfig {
                    obstacle_index: 38,
                    enter_index: 37,
                    exit_index: 39,
                    waypoints: vec![Vec2::new(605.0, 760.0), Vec2::new(540.0, 800.0)],
                },
            ],
            tower_slots: vec![
                Vec2::new(520.0, 420.0),
                Vec2::new(690.0, 560.0),
                Vec2::new(300.0, 440.0),
                Vec2::new(560.0, 240.0),
                Vec2::new(250.0, 560.0),
                Vec2::new(650.0, 480.0),
                Vec2::new(420.0, 700.0),
                Vec2::new(780.0, 420.0),
            ],
            snap_radius: 30.0,
        }
    }
}

impl MapConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.waypoints.len() < 2 {
            return Err(ConfigError::EmptyPath);
        }

        let count = self.waypoints.len();
        for detour in &self.detours {
            let indices = [detour.obstacle_index, detour.enter_index, detour.exit_index];
            if indices.iter().any(|index| *index >= count) {
                return Err(ConfigError::DetourIndexOutOfRange {
                    obstacle_index: detour.obstacle_index,
                    waypoint_count: count,
                });
            }
            if detour.waypoints.is_empty() {
                return Err(ConfigError::DetourWithoutWaypoints {
                    obstacle_index: detour.obstacle_index,
                });
            }
        }

        if self.snap_radius <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "map.snap_radius",
            });
        }

        Ok(())
    }
}

/// Alternative sub-path around an obstacle node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetourConfig {
    /// Main-path index of the node the detour bypasses.
    pub obstacle_index: usize,
    /// Main-path index where the detour branches off.
    pub enter_index: usize,
    /// Main-path index where the detour rejoins.
    pub exit_index: usize,
    /// Intermediate detour waypoints, in walking order.
    pub waypoints: Vec<Vec2>,
}

/// Registry entry describing a tower kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerConfig {
    /// Purchase price.
    pub price: u32,
    /// Damage per projectile.
    pub damage: u32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Delay between shots in milliseconds.
    pub fire_rate_ms: u64,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Projectile motion model.
    pub projectile: ProjectileKind,
    /// Texture alias of the tower sprite.
    pub texture: String,
    /// Texture alias of the projectile sprite.
    pub projectile_texture: String,
    /// Construction animation, required by kinds that play one.
    #[serde(default)]
    pub building: Option<BuildingConfig>,
}

impl TowerConfig {
    /// Delay between shots.
    #[must_use]
    pub fn fire_rate(&self) -> Duration {
        Duration::from_millis(self.fire_rate_ms)
    }

    /// Time during which the tower may not fire after placement.
    #[must_use]
    pub fn build_time(&self) -> Duration {
        self.building
            .as_ref()
            .map_or(Duration::ZERO, |building| Duration::from_millis(building.duration_ms))
    }
}

/// Construction animation played by some tower kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingConfig {
    /// Animation name looked up in the animation registry.
    pub animation: String,
    /// Duration of the animation in milliseconds.
    pub duration_ms: u64,
}

/// Registry entry describing an enemy kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTypeConfig {
    /// Base speed in world units per second.
    pub speed: f32,
    /// Sprite scale applied by the view.
    pub scale_multiplier: f32,
    /// Multiplier applied to the wave's base hit points.
    pub hp_multiplier: f32,
    /// Multiplier applied to the wave's base reward.
    pub reward_multiplier: f32,
    /// Whether detours slow the enemy down.
    pub ignore_slowdown: bool,
    /// Whether the view draws a health bar.
    pub show_health_bar: bool,
    /// Texture alias of the enemy sprite.
    pub texture: String,
}

/// Registry entry describing a booster kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoosterConfig {
    /// Purchase price.
    pub price: u32,
    /// Texture alias of the booster sprite.
    pub texture: String,
}

/// Starting economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Money available when the session starts.
    pub initial_balance: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_balance: 500,
        }
    }
}

/// Defended structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Hit points of the gate.
    pub max_hp: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { max_hp: 20 }
    }
}

/// Wave escalation constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Enemies spawned in the first wave.
    pub first_spawn_count: u32,
    /// Enemies added for every subsequent wave.
    pub enemies_per_wave: u32,
    /// Spawn interval before any reduction, in seconds.
    pub spawn_interval_base_secs: f32,
    /// Spawn interval reduction per wave, in seconds.
    pub spawn_interval_step_secs: f32,
    /// Lower bound of the spawn interval, in seconds.
    pub spawn_interval_min_secs: f32,
    /// Time added after the spawn budget before the next wave, in seconds.
    pub between_waves_buffer_secs: f32,
    /// Hit points of a regular enemy in the first wave.
    pub base_hp: f32,
    /// Geometric hit point growth per wave.
    pub hp_growth: f32,
    /// Reward of a regular enemy before the per-wave increment.
    pub base_reward: u32,
    /// Reward added per wave.
    pub reward_per_wave: u32,
    /// Damage every enemy deals to the gate.
    pub damage_to_player: u32,
    /// First wave that may include powerful enemies.
    pub powerful_threshold_wave: u32,
    /// Minimum powerful enemies per eligible wave.
    pub powerful_min: u32,
    /// Maximum powerful enemies per eligible wave.
    pub powerful_max: u32,
    /// Money credited per whole second left when a wave is cleared early.
    pub early_clear_bonus_per_second: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            first_spawn_count: 5,
            enemies_per_wave: 2,
            spawn_interval_base_secs: 1.2,
            spawn_interval_step_secs: 0.05,
            spawn_interval_min_secs: 0.8,
            between_waves_buffer_secs: 10.0,
            base_hp: 15.0,
            hp_growth: 1.2,
            base_reward: 10,
            reward_per_wave: 1,
            damage_to_player: 1,
            powerful_threshold_wave: 6,
            powerful_min: 1,
            powerful_max: 2,
            early_clear_bonus_per_second: 1,
        }
    }
}

impl WaveTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_interval_min_secs <= 0.0 || self.spawn_interval_base_secs <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "waves.spawn_interval",
            });
        }
        if self.between_waves_buffer_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "waves.between_waves_buffer_secs",
            });
        }
        if self.base_hp <= 0.0 || self.hp_growth <= 0.0 {
            return Err(ConfigError::InvalidValue { field: "waves.hp" });
        }
        if self.powerful_min > self.powerful_max {
            return Err(ConfigError::InvalidValue {
                field: "waves.powerful_min",
            });
        }
        Ok(())
    }
}

/// Enemy movement constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Maximum per-axis offset applied to every waypoint an enemy walks to.
    pub jitter_radius: f32,
    /// Speed multiplier applied while walking toward a detour node.
    pub detour_slowdown: f32,
    /// Duration of the damage flash in milliseconds.
    pub damage_flash_ms: u64,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            jitter_radius: 8.0,
            detour_slowdown: 0.35,
            damage_flash_ms: 150,
        }
    }
}

impl MovementTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.detour_slowdown > 0.0 && self.detour_slowdown <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "movement.detour_slowdown",
            });
        }
        if self.jitter_radius < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "movement.jitter_radius",
            });
        }
        Ok(())
    }
}

/// Projectile ballistics constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Fixed part of the hit threshold, in world units.
    pub hit_radius: f32,
    /// Peak height scale of arcing projectiles.
    pub arc_amplitude: f32,
    /// Coefficient of the parabola `coefficient * amplitude * p * (1 - p)`.
    pub arc_coefficient: f32,
    /// Spin of arcing projectiles in radians per second.
    pub spin_rate: f32,
    /// Vertical offset above the tower base where projectiles appear.
    pub launch_offset: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            hit_radius: 10.0,
            arc_amplitude: 60.0,
            arc_coefficient: 4.0,
            spin_rate: 10.0,
            launch_offset: 40.0,
        }
    }
}

impl ProjectileTuning {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.hit_radius <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "projectiles.hit_radius",
            });
        }
        Ok(())
    }
}

/// Presentation effect timings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsTuning {
    /// Time a dropped coin takes to reach the wallet, in milliseconds.
    pub coin_flight_ms: u64,
}

impl Default for EffectsTuning {
    fn default() -> Self {
        Self {
            coin_flight_ms: 2_500,
        }
    }
}
