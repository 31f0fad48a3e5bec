//! Authoritative tower state management utilities.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use gate_defence_core::{
    ProjectileKind, SlotId, TowerConfig, TowerCooldownSnapshot, TowerId, TowerKind,
    TowerSnapshot, Vec2,
};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Slot the tower occupies.
    pub(crate) slot: SlotId,
    /// World position of the slot.
    pub(crate) position: Vec2,
    pub(crate) range: f32,
    pub(crate) damage: u32,
    pub(crate) fire_rate: Duration,
    pub(crate) projectile: ProjectileKind,
    pub(crate) projectile_speed: f32,
    /// Time left before the tower may fire again.
    pub(crate) cooldown: Duration,
    /// Time left on the construction animation.
    pub(crate) building: Duration,
}

impl TowerState {
    /// Reports whether the tower may launch a projectile right now.
    pub(crate) fn is_ready(&self) -> bool {
        self.cooldown.is_zero() && self.building.is_zero()
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            slot: self.slot,
            position: self.position,
            range: self.range,
        }
    }

    pub(crate) fn cooldown_snapshot(&self) -> TowerCooldownSnapshot {
        TowerCooldownSnapshot {
            tower: self.id,
            kind: self.kind,
            ready_in: self.cooldown,
            building: !self.building.is_zero(),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    occupied: BTreeSet<SlotId>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            occupied: BTreeSet::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn is_occupied(&self, slot: SlotId) -> bool {
        self.occupied.contains(&slot)
    }

    /// Stores a tower on a free slot. Towers start with no cooldown, so they
    /// fire as soon as construction finishes.
    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        slot: SlotId,
        position: Vec2,
        config: &TowerConfig,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));

        let building = if kind.requires_building_animation() {
            config.build_time()
        } else {
            Duration::ZERO
        };

        let _ = self.occupied.insert(slot);
        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                kind,
                slot,
                position,
                range: config.range,
                damage: config.damage,
                fire_rate: config.fire_rate(),
                projectile: config.projectile,
                projectile_speed: config.projectile_speed,
                cooldown: Duration::ZERO,
                building,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    /// Counts down cooldowns and construction timers.
    pub(crate) fn advance(&mut self, dt: Duration) {
        for tower in self.entries.values_mut() {
            tower.cooldown = tower.cooldown.saturating_sub(dt);
            tower.building = tower.building.saturating_sub(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gate_defence_core::GameConfig;

    fn config(kind: TowerKind) -> TowerConfig {
        GameConfig::default().towers[&kind].clone()
    }

    fn state(registry: &TowerRegistry, id: TowerId) -> Option<&TowerState> {
        registry.iter().find(|tower| tower.id == id)
    }

    #[test]
    fn registry_allocates_sequential_identifiers_and_occupies_slots() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(
            TowerKind::Regular,
            SlotId::new(0),
            Vec2::ZERO,
            &config(TowerKind::Regular),
        );
        let second = registry.insert(
            TowerKind::Regular,
            SlotId::new(3),
            Vec2::ONE,
            &config(TowerKind::Regular),
        );

        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert!(registry.is_occupied(SlotId::new(3)));
        assert!(!registry.is_occupied(SlotId::new(1)));
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn regular_tower_is_ready_immediately() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(
            TowerKind::Regular,
            SlotId::new(0),
            Vec2::ZERO,
            &config(TowerKind::Regular),
        );
        assert!(state(&registry, id).is_some_and(TowerState::is_ready));
    }

    #[test]
    fn archer_waits_for_construction() {
        let archer = config(TowerKind::Archer);
        let mut registry = TowerRegistry::new();
        let id = registry.insert(TowerKind::Archer, SlotId::new(0), Vec2::ZERO, &archer);

        let archer_state = state(&registry, id).expect("archer");
        assert!(!archer_state.is_ready());
        assert!(archer_state.cooldown_snapshot().building);

        registry.advance(archer.build_time());
        assert!(state(&registry, id).is_some_and(TowerState::is_ready));
    }

    #[test]
    fn cooldown_counts_down_without_underflow() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(
            TowerKind::Regular,
            SlotId::new(0),
            Vec2::ZERO,
            &config(TowerKind::Regular),
        );
        if let Some(tower) = registry.get_mut(id) {
            tower.cooldown = Duration::from_millis(300);
        }

        registry.advance(Duration::from_millis(200));
        assert_eq!(
            state(&registry, id).map(|tower| tower.cooldown),
            Some(Duration::from_millis(100))
        );
        registry.advance(Duration::from_millis(200));
        assert!(state(&registry, id).is_some_and(TowerState::is_ready));
    }
}
