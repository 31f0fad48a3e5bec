#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave orchestrator that schedules enemy spawns and reports wave progress.
//!
//! The orchestrator is a pure system: it reads the event stream and the live
//! enemy count, emits [`Command::SpawnEnemy`] and [`Command::GrantReward`]
//! commands, and pushes wave notifications for subscribers.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    time::Duration,
};

use gate_defence_core::{
    Command, EnemyId, EnemyKind, EnemyStats, EnemyTypeConfig, Event, GameConfig, WaveState,
    WaveTuning,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Stream of the seeded generator reserved for wave composition.
const WAVE_RNG_STREAM: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Multipliers {
    hp: f32,
    reward: f32,
}

/// Configuration parameters required to construct the wave orchestrator.
#[derive(Clone, Debug)]
pub struct Config {
    tuning: WaveTuning,
    multipliers: BTreeMap<EnemyKind, Multipliers>,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from wave tuning, per-type multipliers and a seed.
    #[must_use]
    pub fn new(
        tuning: WaveTuning,
        enemies: &BTreeMap<EnemyKind, EnemyTypeConfig>,
        rng_seed: u64,
    ) -> Self {
        let multipliers = enemies
            .iter()
            .map(|(&kind, traits)| {
                (
                    kind,
                    Multipliers {
                        hp: traits.hp_multiplier,
                        reward: traits.reward_multiplier,
                    },
                )
            })
            .collect();

        Self {
            tuning,
            multipliers,
            rng_seed,
        }
    }

    /// Extracts the wave configuration from a full game configuration.
    #[must_use]
    pub fn from_game(config: &GameConfig) -> Self {
        Self::new(config.waves.clone(), &config.enemies, config.seed)
    }
}

/// Pure system that turns elapsed time into wave-scaled spawn commands.
#[derive(Debug)]
pub struct Waves {
    config: Config,
    rng: ChaCha8Rng,
    wave: u32,
    state: WaveState,
    queue: VecDeque<EnemyKind>,
    spawn_interval: Duration,
    spawn_timer: Duration,
    time_to_next_wave: Duration,
    killed: u32,
    total: u32,
    /// Enemies of the current wave that are still alive.
    roster: BTreeSet<EnemyId>,
}

impl Waves {
    /// Creates an idle orchestrator; no wave runs until one is started.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        rng.set_stream(WAVE_RNG_STREAM);

        Self {
            config,
            rng,
            wave: 0,
            state: WaveState::Idle,
            queue: VecDeque::new(),
            spawn_interval: Duration::ZERO,
            spawn_timer: Duration::ZERO,
            time_to_next_wave: Duration::ZERO,
            killed: 0,
            total: 0,
            roster: BTreeSet::new(),
        }
    }

    /// Current one-based wave number; zero before the first wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Current state of the orchestrator.
    #[must_use]
    pub const fn state(&self) -> WaveState {
        self.state
    }

    /// Time left before the next wave starts automatically.
    #[must_use]
    pub const fn time_to_next_wave(&self) -> Duration {
        self.time_to_next_wave
    }

    /// Kills and total enemies of the current wave.
    #[must_use]
    pub const fn kill_progress(&self) -> (u32, u32) {
        (self.killed, self.total)
    }

    /// Enemy types still waiting to spawn, in spawn order.
    pub fn queued(&self) -> impl Iterator<Item = EnemyKind> + '_ {
        self.queue.iter().copied()
    }

    /// Starts the next wave unless one is still spawning.
    pub fn start_next_wave(&mut self, out_events: &mut Vec<Event>) {
        if self.state == WaveState::Spawning {
            return;
        }
        self.init_wave(self.wave.saturating_add(1), out_events);
    }

    /// Consumes events and the live enemy count to emit spawn commands.
    ///
    /// Only kills of enemies spawned during the current wave advance its
    /// progress. Without a `TimeAdvanced` event only the bookkeeping runs.
    pub fn handle(
        &mut self,
        events: &[Event],
        live_enemies: usize,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::EnemySpawned { enemy, .. } if self.wave > 0 => {
                    let _ = self.roster.insert(*enemy);
                }
                Event::EnemyKilled { enemy, .. } if self.roster.remove(enemy) => {
                    self.killed = self.killed.saturating_add(1);
                    out_events.push(Event::KillProgress {
                        wave: self.wave,
                        killed: self.killed,
                        total: self.total,
                    });
                }
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        match self.state {
            WaveState::Idle => {}
            WaveState::Spawning => self.tick_spawning(elapsed, out_commands, out_events),
            WaveState::Waiting => self.tick_waiting(elapsed, live_enemies, out_commands, out_events),
        }
    }

    fn init_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        let tuning = &self.config.tuning;
        let total = tuning
            .first_spawn_count
            .saturating_add(tuning.enemies_per_wave.saturating_mul(wave - 1));

        let powerful = if wave >= tuning.powerful_threshold_wave {
            let ceiling = tuning.powerful_max.max(tuning.powerful_min);
            self.rng
                .gen_range(tuning.powerful_min..=ceiling)
                .min(total)
        } else {
            0
        };
        let mut queue: Vec<EnemyKind> = (0..total)
            .map(|index| {
                if index < powerful {
                    EnemyKind::Powerful
                } else {
                    EnemyKind::Regular
                }
            })
            .collect();
        queue.shuffle(&mut self.rng);

        let interval_secs = (tuning.spawn_interval_base_secs
            - tuning.spawn_interval_step_secs * wave as f32)
            .max(tuning.spawn_interval_min_secs);
        let budget_secs = total as f32 * interval_secs + tuning.between_waves_buffer_secs;

        self.wave = wave;
        self.state = WaveState::Spawning;
        self.queue = queue.into();
        self.spawn_interval = Duration::from_secs_f32(interval_secs.max(0.0));
        self.spawn_timer = Duration::ZERO;
        self.time_to_next_wave = Duration::from_secs_f32(budget_secs.max(0.0));
        self.killed = 0;
        self.total = total;
        self.roster.clear();

        info!(wave, total, powerful, "wave started");
        out_events.push(Event::WaveStarted { wave, total });
        out_events.push(Event::WaveStateChanged {
            wave,
            state: WaveState::Spawning,
        });
        out_events.push(Event::KillProgress {
            wave,
            killed: 0,
            total,
        });
        out_events.push(Event::WaveTimerUpdated {
            remaining: self.time_to_next_wave,
        });
    }

    fn tick_spawning(
        &mut self,
        elapsed: Duration,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        self.count_down(elapsed, out_events);

        self.spawn_timer = self.spawn_timer.saturating_sub(elapsed);
        if self.spawn_timer.is_zero() {
            if let Some(kind) = self.queue.pop_front() {
                let stats = self.stats_for(kind);
                debug!(wave = self.wave, ?kind, hp = stats.hp, "spawn requested");
                out_commands.push(Command::SpawnEnemy { kind, stats });
                self.spawn_timer = self.spawn_interval;
            }
        }

        if self.queue.is_empty() {
            self.enter(WaveState::Waiting, out_events);
        }
    }

    fn tick_waiting(
        &mut self,
        elapsed: Duration,
        live_enemies: usize,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        self.count_down(elapsed, out_events);

        if live_enemies == 0 {
            let whole_secs = self.time_to_next_wave.as_secs();
            let bonus = u32::try_from(whole_secs)
                .unwrap_or(u32::MAX)
                .saturating_mul(self.config.tuning.early_clear_bonus_per_second);
            self.time_to_next_wave = Duration::ZERO;
            out_events.push(Event::WaveTimerUpdated {
                remaining: Duration::ZERO,
            });
            self.enter(WaveState::Idle, out_events);

            if bonus > 0 {
                out_commands.push(Command::GrantReward { amount: bonus });
            }
            out_events.push(Event::WaveCleared {
                wave: self.wave,
                bonus,
            });
            return;
        }

        if self.time_to_next_wave.is_zero() {
            self.start_next_wave(out_events);
        }
    }

    fn count_down(&mut self, elapsed: Duration, out_events: &mut Vec<Event>) {
        self.time_to_next_wave = self.time_to_next_wave.saturating_sub(elapsed);
        out_events.push(Event::WaveTimerUpdated {
            remaining: self.time_to_next_wave,
        });
    }

    fn enter(&mut self, state: WaveState, out_events: &mut Vec<Event>) {
        self.state = state;
        info!(wave = self.wave, ?state, "wave state changed");
        out_events.push(Event::WaveStateChanged {
            wave: self.wave,
            state,
        });
    }

    /// HP grows geometrically with the wave; rewards grow linearly.
    fn stats_for(&self, kind: EnemyKind) -> EnemyStats {
        let tuning = &self.config.tuning;
        let multipliers = self
            .config
            .multipliers
            .get(&kind)
            .copied()
            .unwrap_or(Multipliers {
                hp: 1.0,
                reward: 1.0,
            });

        let growth = tuning.hp_growth.powi(self.wave as i32 - 1);
        let hp = (tuning.base_hp * growth * multipliers.hp).floor().max(1.0) as u32;
        let base_reward = tuning
            .base_reward
            .saturating_add(tuning.reward_per_wave.saturating_mul(self.wave));
        let reward = (base_reward as f32 * multipliers.reward).round() as u32;

        EnemyStats {
            hp,
            reward,
            damage_to_player: tuning.damage_to_player,
        }
    }
}
