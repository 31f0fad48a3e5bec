//! Explicit type-to-config registry built once at startup.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    BoosterConfig, BoosterKind, EnemyKind, EnemyTypeConfig, GameConfig, PlaceableItem,
    TowerConfig, TowerKind,
};

/// Configuration bugs detected while building a session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The main path has fewer than two waypoints.
    #[error("map path needs at least two waypoints")]
    EmptyPath,
    /// A detour refers to a waypoint that does not exist.
    #[error("detour around waypoint {obstacle_index} refers past the {waypoint_count} main-path waypoints")]
    DetourIndexOutOfRange {
        /// Obstacle index declared by the detour.
        obstacle_index: usize,
        /// Number of main-path waypoints.
        waypoint_count: usize,
    },
    /// A detour declares no waypoints of its own.
    #[error("detour around waypoint {obstacle_index} has no waypoints")]
    DetourWithoutWaypoints {
        /// Obstacle index declared by the detour.
        obstacle_index: usize,
    },
    /// No registry entry exists for a tower kind.
    #[error("config for tower type {0:?} not found")]
    MissingTower(TowerKind),
    /// No registry entry exists for an enemy kind.
    #[error("config for enemy type {0:?} not found")]
    MissingEnemy(EnemyKind),
    /// No registry entry exists for a booster kind.
    #[error("config for booster type {0:?} not found")]
    MissingBooster(BoosterKind),
    /// A registry entry names an empty texture alias.
    #[error("missing texture alias for {owner}")]
    MissingTexture {
        /// Registry entry owning the alias.
        owner: String,
    },
    /// A tower kind that plays a construction animation names none.
    #[error("missing animation name for tower type {0:?}")]
    MissingAnimation(TowerKind),
    /// A tuning value is outside its permitted range.
    #[error("invalid configuration value for `{field}`")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
    },
}

/// Read-only lookup from item kinds to their configuration.
///
/// Every kind declared by the core enums is guaranteed to resolve once the
/// registry was constructed, so lookups only fail for registries built by hand
/// in tests.
#[derive(Clone, Debug)]
pub struct Registry {
    towers: BTreeMap<TowerKind, TowerConfig>,
    enemies: BTreeMap<EnemyKind, EnemyTypeConfig>,
    boosters: BTreeMap<BoosterKind, BoosterConfig>,
}

impl Registry {
    /// Builds the registry, rejecting missing entries, aliases and animations.
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        for kind in TowerKind::ALL {
            let tower = config
                .towers
                .get(&kind)
                .ok_or(ConfigError::MissingTower(kind))?;
            require_alias(&tower.texture, || format!("tower {kind:?}"))?;
            require_alias(&tower.projectile_texture, || {
                format!("projectile of tower {kind:?}")
            })?;
            if kind.requires_building_animation() {
                let has_animation = tower
                    .building
                    .as_ref()
                    .is_some_and(|building| !building.animation.is_empty());
                if !has_animation {
                    return Err(ConfigError::MissingAnimation(kind));
                }
            }
        }

        for kind in EnemyKind::ALL {
            let enemy = config
                .enemies
                .get(&kind)
                .ok_or(ConfigError::MissingEnemy(kind))?;
            require_alias(&enemy.texture, || format!("enemy {kind:?}"))?;
            if enemy.speed <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "enemies.speed",
                });
            }
        }

        for kind in BoosterKind::ALL {
            let booster = config
                .boosters
                .get(&kind)
                .ok_or(ConfigError::MissingBooster(kind))?;
            require_alias(&booster.texture, || format!("booster {kind:?}"))?;
        }

        Ok(Self {
            towers: config.towers.clone(),
            enemies: config.enemies.clone(),
            boosters: config.boosters.clone(),
        })
    }

    /// Looks up the configuration of a tower kind.
    pub fn tower(&self, kind: TowerKind) -> Result<&TowerConfig, ConfigError> {
        self.towers.get(&kind).ok_or(ConfigError::MissingTower(kind))
    }

    /// Looks up the configuration of an enemy kind.
    pub fn enemy(&self, kind: EnemyKind) -> Result<&EnemyTypeConfig, ConfigError> {
        self.enemies
            .get(&kind)
            .ok_or(ConfigError::MissingEnemy(kind))
    }

    /// Looks up the configuration of a booster kind.
    pub fn booster(&self, kind: BoosterKind) -> Result<&BoosterConfig, ConfigError> {
        self.boosters
            .get(&kind)
            .ok_or(ConfigError::MissingBooster(kind))
    }

    /// Price of a placeable item.
    pub fn price(&self, item: PlaceableItem) -> Result<u32, ConfigError> {
        match item {
            PlaceableItem::Tower(kind) => self.tower(kind).map(|tower| tower.price),
            PlaceableItem::Booster(kind) => self.booster(kind).map(|booster| booster.price),
        }
    }
}

fn require_alias(alias: &str, owner: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if alias.trim().is_empty() {
        return Err(ConfigError::MissingTexture { owner: owner() });
    }
    Ok(())
}
