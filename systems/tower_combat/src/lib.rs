#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns tower targets into firing commands.

use gate_defence_core::{Command, PlayState, TowerCooldownView, TowerTarget};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat;

impl TowerCombat {
    /// Creates a new tower combat system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits `Command::FireProjectile` for every targeted tower whose cooldown
    /// elapsed and whose construction animation finished.
    ///
    /// Commands follow the order of `tower_targets`.
    pub fn handle(
        &self,
        play_state: PlayState,
        tower_cooldowns: &TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Running {
            return;
        }

        out.extend(
            tower_targets
                .iter()
                .filter(|target| tower_cooldowns.can_fire(target.tower))
                .map(|target| Command::FireProjectile {
                    tower: target.tower,
                    target: target.enemy,
                }),
        );
    }
}
