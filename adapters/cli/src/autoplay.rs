//! Scripted player that drives a session without a view.
//!
//! The player drops a roadblock on the first obstacle node it can afford,
//! then spends every remaining coin on regular towers, nearest slots to the
//! spawn point first. It starts waves itself whenever the orchestrator is
//! idle.

use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use gate_defence_core::{
    BoosterKind, Event, GameConfig, PlaceableItem, PlayState, TowerKind, Vec2, WaveState,
};
use gate_defence_system_bootstrap::Session;
use gate_defence_world::query;
use tracing::{info, warn};

/// Limits of an autoplayed run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Options {
    pub(crate) waves: u32,
    pub(crate) dt: Duration,
    pub(crate) max_ticks: u64,
}

/// Outcome of an autoplayed run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) waves_reached: u32,
    pub(crate) waves_cleared: u32,
    pub(crate) kills: u32,
    pub(crate) leaks: u32,
    pub(crate) towers: u32,
    pub(crate) obstacles: u32,
    pub(crate) rejected: u32,
    pub(crate) bonus: u32,
    pub(crate) balance: u32,
    pub(crate) total_earned: u32,
    pub(crate) gate_hp: u32,
    pub(crate) defeated: bool,
    pub(crate) ticks: u64,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemyKilled { .. } => self.kills += 1,
            Event::EnemyReachedGoal { .. } => self.leaks += 1,
            Event::TowerPlaced { .. } => self.towers += 1,
            Event::ObstaclePlaced { .. } => self.obstacles += 1,
            Event::PlacementRejected { .. } => self.rejected += 1,
            Event::WaveCleared { bonus, .. } => {
                self.waves_cleared += 1;
                self.bonus += *bonus;
            }
            Event::GameOver => self.defeated = true,
            _ => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.defeated { "defeated" } else { "holding" };
        writeln!(f, "outcome:       {outcome}")?;
        writeln!(
            f,
            "waves:         {} reached, {} cleared early",
            self.waves_reached, self.waves_cleared
        )?;
        writeln!(f, "enemies:       {} killed, {} leaked", self.kills, self.leaks)?;
        writeln!(
            f,
            "placements:    {} towers, {} obstacles, {} rejected",
            self.towers, self.obstacles, self.rejected
        )?;
        writeln!(f, "gate hp:       {}", self.gate_hp)?;
        writeln!(
            f,
            "economy:       {} balance, {} earned, {} bonus",
            self.balance, self.total_earned, self.bonus
        )?;
        write!(f, "ticks:         {}", self.ticks)
    }
}

/// Plays `options.waves` waves, or until the gate falls or the tick budget
/// runs out.
pub(crate) fn run(config: GameConfig, options: &Options) -> Result<Summary> {
    let summary = Rc::new(RefCell::new(Summary::default()));
    let recorder = Rc::clone(&summary);
    let mut session = Session::builder(config)
        .subscribe(move |event| recorder.borrow_mut().record(event))
        .build()
        .context("failed to build the session")?;

    let mut ticks = 0;
    while ticks < options.max_ticks {
        if query::play_state(session.world()) == PlayState::Defeated {
            break;
        }

        let waves = session.waves();
        let finished = waves.wave() > options.waves
            || (waves.wave() == options.waves && waves.state() == WaveState::Idle);
        if finished {
            break;
        }
        if waves.state() == WaveState::Idle {
            invest(&mut session);
            session.start_next_wave();
            info!(wave = session.waves().wave(), "wave launched");
        }

        session.tick(options.dt);
        ticks += 1;
    }

    if ticks >= options.max_ticks {
        warn!(ticks, "tick budget exhausted");
    }

    let world = session.world();
    let mut summary = summary.borrow().clone();
    summary.waves_reached = session.waves().wave().min(options.waves);
    summary.balance = query::balance(world);
    summary.total_earned = query::total_earned(world);
    summary.gate_hp = query::gate_hp(world);
    summary.ticks = ticks;
    Ok(summary)
}

fn price(session: &Session, item: PlaceableItem) -> Option<u32> {
    query::registry(session.world()).price(item).ok()
}

/// Spends the balance on a roadblock and as many towers as it covers.
fn invest(session: &mut Session) {
    let roadblock = PlaceableItem::Booster(BoosterKind::Roadblock);
    if let (Some(cost), Some(node)) = (
        price(session, roadblock),
        query::free_obstacle_nodes(session.world()).first().copied(),
    ) {
        if query::obstacle_count(session.world()) == 0 && query::balance(session.world()) >= cost
        {
            place(session, roadblock, node.position);
        }
    }

    let tower = PlaceableItem::Tower(TowerKind::Regular);
    let Some(cost) = price(session, tower) else {
        return;
    };
    let graph = query::path_graph(session.world());
    let start = graph
        .node(graph.start())
        .map(|node| node.position)
        .unwrap_or_default();

    let mut slots = query::free_tower_slots(session.world());
    slots.sort_by(|a, b| {
        a.position
            .distance_squared(start)
            .total_cmp(&b.position.distance_squared(start))
    });
    for slot in slots {
        if query::balance(session.world()) < cost {
            break;
        }
        place(session, tower, slot.position);
    }
}

fn place(session: &mut Session, item: PlaceableItem, at: Vec2) {
    session.begin_placement(item);
    let _ = session.move_pointer(at);
    if let Err(reason) = session.confirm_placement() {
        warn!(?item, ?reason, "autoplay placement rejected");
        let _ = session.cancel_placement();
    }
}
