//! Homing projectiles launched by towers.

use std::time::Duration;

use gate_defence_core::{EnemyId, ProjectileKind, ProjectileTuning, Vec2};

use crate::pool::Poolable;

/// Arguments that configure a projectile when a tower fires.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) kind: ProjectileKind,
    pub(crate) target: EnemyId,
    pub(crate) damage: u32,
    pub(crate) speed: f32,
    pub(crate) origin: Vec2,
    pub(crate) aim: Vec2,
}

/// Outcome of advancing a projectile for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flight {
    /// The target vanished; the projectile must be released silently.
    Lost,
    /// The projectile reached its target.
    Hit {
        target: EnemyId,
        damage: u32,
    },
    /// The projectile is still travelling.
    Airborne,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Projectile {
    kind: ProjectileKind,
    target: Option<EnemyId>,
    damage: u32,
    speed: f32,
    position: Vec2,
    initial_distance: f32,
    height: f32,
    rotation: f32,
}

impl Poolable for Projectile {
    type Args = Launch;

    fn reset(&mut self, launch: Launch) {
        let offset = launch.aim - launch.origin;
        self.kind = launch.kind;
        self.target = Some(launch.target);
        self.damage = launch.damage;
        self.speed = launch.speed;
        self.position = launch.origin;
        self.initial_distance = offset.length().max(f32::EPSILON);
        self.height = 0.0;
        self.rotation = offset.y.atan2(offset.x);
    }

    fn clean(&mut self) {
        self.target = None;
    }
}

impl Projectile {
    pub(crate) const fn kind(&self) -> ProjectileKind {
        self.kind
    }

    pub(crate) const fn target(&self) -> Option<EnemyId> {
        self.target
    }

    pub(crate) const fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) const fn height(&self) -> f32 {
        self.height
    }

    pub(crate) const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Homes toward the target's current position.
    ///
    /// `target_position` is `None` once the target died or left the map.
    pub(crate) fn advance(
        &mut self,
        target_position: Option<Vec2>,
        dt: Duration,
        tuning: &ProjectileTuning,
    ) -> Flight {
        let (Some(target), Some(goal)) = (self.target, target_position) else {
            return Flight::Lost;
        };

        let dt_secs = dt.as_secs_f32();
        let step = self.speed * dt_secs;
        let offset = goal - self.position;
        let distance = offset.length();

        if distance < tuning.hit_radius + step {
            return Flight::Hit {
                target,
                damage: self.damage,
            };
        }

        let angle = offset.y.atan2(offset.x);
        self.position += Vec2::new(angle.cos(), angle.sin()) * step;

        match self.kind {
            ProjectileKind::Linear => {
                self.rotation = angle;
            }
            ProjectileKind::Arc => {
                let remaining = (goal - self.position).length();
                let progress = (1.0 - remaining / self.initial_distance).clamp(0.0, 1.0);
                self.height = tuning.arc_coefficient
                    * tuning.arc_amplitude
                    * progress
                    * (1.0 - progress);
                self.rotation += tuning.spin_rate * dt_secs;
            }
        }

        Flight::Airborne
    }
}
