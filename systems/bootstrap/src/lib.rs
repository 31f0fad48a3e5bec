#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session driver that wires the world and the pure systems together.
//!
//! A [`Session`] owns the authoritative [`World`] plus every system and runs
//! them in a fixed order on each [`Session::tick`]:
//!
//! 1. enemies move,
//! 2. the wave orchestrator spawns and rewards,
//! 3. projectiles fly and resolve hits,
//! 4. tower cooldowns count down,
//! 5. towers pick targets and fire,
//! 6. presentation effects advance.
//!
//! Every event produced along the way is published to the subscribers
//! registered on the [`SessionBuilder`], in registration order.

use std::time::Duration;

use gate_defence_core::{
    Command, ConfigError, Event, GameConfig, PlaceableItem, PlacementError, PlayState, SoundCue,
    TowerTarget, Vec2,
};
use gate_defence_system_builder::{Builder, PlacementPreview, Surroundings};
use gate_defence_system_tower_combat::TowerCombat;
use gate_defence_system_tower_targeting::TowerTargeting;
use gate_defence_system_waves::{Config as WavesConfig, Waves};
use gate_defence_world::{self as world, query, World};
use tracing::{debug, info};

type Subscriber = Box<dyn FnMut(&Event)>;

/// First phase of session construction: collects configuration and listeners.
pub struct SessionBuilder {
    config: GameConfig,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("seed", &self.config.seed)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SessionBuilder {
    /// Registers a listener that observes every event the session publishes.
    #[must_use]
    pub fn subscribe<F>(mut self, subscriber: F) -> Self
    where
        F: FnMut(&Event) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Validates the configuration and assembles the session.
    pub fn build(self) -> Result<Session, ConfigError> {
        let world = World::new(&self.config)?;
        let waves = Waves::new(WavesConfig::from_game(&self.config));
        info!(
            seed = self.config.seed,
            subscribers = self.subscribers.len(),
            "session ready"
        );

        Ok(Session {
            world,
            waves,
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            builder: Builder::new(),
            subscribers: self.subscribers,
            carried: Vec::new(),
            targets: Vec::new(),
            commands: Vec::new(),
        })
    }
}

/// Running game session.
pub struct Session {
    world: World,
    waves: Waves,
    targeting: TowerTargeting,
    combat: TowerCombat,
    builder: Builder,
    subscribers: Vec<Subscriber>,
    /// Events raised after the wave step that the orchestrator has not seen.
    carried: Vec<Event>,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tick", &query::tick_index(&self.world))
            .field("wave", &self.waves.wave())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Starts building a session from the provided configuration.
    #[must_use]
    pub fn builder(config: GameConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            subscribers: Vec::new(),
        }
    }

    /// Read access to the authoritative world for queries.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Read access to the wave orchestrator.
    #[must_use]
    pub const fn waves(&self) -> &Waves {
        &self.waves
    }

    /// Advances the simulation by `dt` and publishes the resulting events.
    pub fn tick(&mut self, dt: Duration) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        if query::play_state(&self.world) == PlayState::Running {
            self.run_systems(dt, &mut events);
        }

        let _ = self.builder.refresh(&Surroundings {
            free_slots: &query::free_tower_slots(&self.world),
            free_nodes: &query::free_obstacle_nodes(&self.world),
            snap_radius: query::snap_radius(&self.world),
        });

        self.publish(&events);
    }

    fn run_systems(&mut self, dt: Duration, events: &mut Vec<Event>) {
        let mut wave_input = std::mem::take(&mut self.carried);
        wave_input.extend(events.iter().cloned());
        let mut wave_events = Vec::new();
        self.waves.handle(
            &wave_input,
            query::live_enemy_count(&self.world),
            &mut self.commands,
            &mut wave_events,
        );
        events.append(&mut wave_events);

        let carried_from = events.len();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }

        world::apply(&mut self.world, Command::AdvanceProjectiles { dt }, events);
        world::apply(&mut self.world, Command::AdvanceTowers { dt }, events);

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.targets,
        );
        self.combat.handle(
            query::play_state(&self.world),
            &query::tower_cooldowns(&self.world),
            &self.targets,
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }

        world::apply(&mut self.world, Command::AdvanceEffects { dt }, events);

        self.carried.extend(
            events[carried_from..]
                .iter()
                .filter(|event| {
                    matches!(event, Event::EnemySpawned { .. } | Event::EnemyKilled { .. })
                })
                .cloned(),
        );
    }

    /// Starts the next wave immediately. Ignored while a wave is spawning or
    /// after the gate fell.
    pub fn start_next_wave(&mut self) {
        if query::play_state(&self.world) == PlayState::Defeated {
            return;
        }

        // Spawns and kills from the last tick still belong to the ending wave.
        let pending = std::mem::take(&mut self.carried);
        let mut events = Vec::new();
        self.waves.handle(
            &pending,
            query::live_enemy_count(&self.world),
            &mut self.commands,
            &mut events,
        );
        self.waves.start_next_wave(&mut events);
        self.publish(&events);
    }

    /// Begins placing an item, replacing any placement in progress.
    pub fn begin_placement(&mut self, item: PlaceableItem) {
        debug!(?item, "placement started");
        self.builder.begin(item);
    }

    /// Moves the placement pointer and returns the refreshed preview.
    pub fn move_pointer(&mut self, point: Vec2) -> Option<PlacementPreview> {
        self.builder.move_pointer(
            point,
            &Surroundings {
                free_slots: &query::free_tower_slots(&self.world),
                free_nodes: &query::free_obstacle_nodes(&self.world),
                snap_radius: query::snap_radius(&self.world),
            },
        )
    }

    /// Current placement preview, if a placement is active.
    #[must_use]
    pub fn preview(&self) -> Option<PlacementPreview> {
        self.builder.preview()
    }

    /// Confirms the active placement.
    ///
    /// Rejections are published as [`Event::PlacementRejected`] together with
    /// the failure sound cue, except when nothing was being placed.
    pub fn confirm_placement(&mut self) -> Result<(), PlacementError> {
        let item = self.builder.active_item();
        let mut events = Vec::new();

        let outcome = match self.builder.confirm() {
            Ok(command) => {
                world::apply(&mut self.world, command, &mut events);
                events
                    .iter()
                    .find_map(|event| match event {
                        Event::PlacementRejected { reason, .. } => Some(*reason),
                        _ => None,
                    })
                    .map_or(Ok(()), Err)
            }
            Err(reason) => {
                if let Some(item) = item {
                    events.push(Event::PlacementRejected { item, reason });
                    events.push(Event::SoundRequested {
                        cue: SoundCue::PlacementFailed,
                    });
                }
                Err(reason)
            }
        };

        debug!(?item, ?outcome, "placement confirmed");
        self.publish(&events);
        outcome
    }

    /// Abandons the active placement. Returns whether one was active.
    pub fn cancel_placement(&mut self) -> bool {
        self.builder.cancel()
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            for subscriber in &mut self.subscribers {
                subscriber(event);
            }
        }
    }
}
