//! Headless Skirmish Runner
//!
//! Runs AI vs AI skirmishes on a seeded map and outputs a summary of the
//! tactical events. Units advance one cell along their path per tick and
//! trade fire with a crude damage model; both stand in for the real movement
//! and combat systems.

use std::collections::BTreeMap;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use skirmish_ai::battle::{
    BattleWorld, PathCacheStats, PlayerRoster, Structure, StructureKind, TacticalCore,
    TacticalEventKind, TargetRef, TerrainClass, TerrainMap, Unit, UnitKind, UnitType, Wreck,
};
use skirmish_ai::core::types::{Cell, GameTime, PlayerId, StructureId, UnitId, WreckId};
use skirmish_ai::core::{load_config, Result, TacticalConfig};

/// Headless Skirmish Runner - AI vs AI skirmishes
#[derive(Parser, Debug)]
#[command(name = "skirmish_runner")]
#[command(about = "Run AI vs AI skirmishes and print a tactical event summary")]
struct Args {
    /// Tactics preset name (loaded from data/tactics/)
    #[arg(long, default_value = "default")]
    config: String,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Milliseconds of game time per tick
    #[arg(long, default_value_t = 100)]
    tick_ms: GameTime,

    /// Map width in cells
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Map height in cells
    #[arg(long, default_value_t = 40)]
    height: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// JSON output structure
#[derive(Serialize)]
struct SkirmishSummary {
    seed: u64,
    ticks: u64,
    config: String,
    events: BTreeMap<String, usize>,
    units_alive: BTreeMap<u8, usize>,
    structures_alive: BTreeMap<u8, usize>,
    wrecks: usize,
    path_cache: PathCacheStats,
}

/// Hands out unique ids while the map is generated
#[derive(Default)]
struct IdSource {
    next_unit: u32,
    next_structure: u32,
}

impl IdSource {
    fn unit(&mut self) -> UnitId {
        self.next_unit += 1;
        UnitId(self.next_unit)
    }

    fn structure(&mut self) -> StructureId {
        self.next_structure += 1;
        StructureId(self.next_structure)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("skirmish_ai=debug")
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let config = load_config(&args.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load tactics '{}': {}", args.config, e);
        eprintln!("Using default tactics");
        TacticalConfig::new()
    });
    let config_name = config.name.clone();
    let mut core = TacticalCore::new(config)?;

    let mut world = generate_skirmish(args.width, args.height, &mut rng);
    core.check_world(&world)?;

    let mut events: BTreeMap<String, usize> = BTreeMap::new();
    let mut next_wreck = 0;

    for tick in 0..args.ticks {
        world.now = tick * args.tick_ms;
        let log = core.update(&mut world);
        for event in &log.events {
            *events.entry(event_name(&event.kind).to_string()).or_default() += 1;
            if args.format == "text" {
                println!("[{:>7}] {}", event.time, event.description);
            }
        }
        step_movement(&mut world);
        exchange_fire(&mut world, args.tick_ms, &mut rng, &mut next_wreck);
    }

    let summary = SkirmishSummary {
        seed,
        ticks: args.ticks,
        config: config_name,
        events,
        units_alive: count_by_owner(world.units.iter().filter(|u| u.is_alive()).map(|u| u.owner)),
        structures_alive: count_by_owner(
            world.structures.iter().filter(|s| s.is_alive()).map(|s| s.owner),
        ),
        wrecks: world.wrecks.len(),
        path_cache: core.path_cache().stats(),
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("=== Skirmish finished after {} ticks (seed {}) ===", summary.ticks, seed);
        for (kind, count) in &summary.events {
            println!("  {:<20} {}", kind, count);
        }
        println!("  units alive: {:?}", summary.units_alive);
        println!("  structures alive: {:?}", summary.structures_alive);
    }
    Ok(())
}

fn event_name(kind: &TacticalEventKind) -> &'static str {
    match kind {
        TacticalEventKind::DangerRecomputed { .. } => "danger_recomputed",
        TacticalEventKind::StateChanged { .. } => "state_changed",
        TacticalEventKind::ServiceAssigned { .. } => "service_assigned",
        TacticalEventKind::ServiceInterrupted { .. } => "service_interrupted",
        TacticalEventKind::ServiceQueued { .. } => "service_queued",
        TacticalEventKind::ServiceCompleted { .. } => "service_completed",
        TacticalEventKind::WreckRecovered { .. } => "wreck_recovered",
        TacticalEventKind::FormationDisbanded { .. } => "formation_disbanded",
    }
}

fn count_by_owner(owners: impl Iterator<Item = PlayerId>) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for owner in owners {
        *counts.entry(owner.0).or_default() += 1;
    }
    counts
}

/// Two mirrored bases with scattered rock and water between them
fn generate_skirmish(width: u32, height: u32, rng: &mut ChaCha8Rng) -> BattleWorld {
    let mut terrain = TerrainMap::new(width, height);
    let obstacles = (width * height / 25) as usize;
    for _ in 0..obstacles {
        let cell = Cell::new(
            rng.gen_range(16..(width as i32 - 16).max(17)),
            rng.gen_range(0..height as i32),
        );
        let class = if rng.gen_bool(0.5) {
            TerrainClass::Rock
        } else {
            TerrainClass::Water
        };
        terrain.set_terrain(cell, class);
    }

    let mut world = BattleWorld::new(terrain, PlayerRoster::new(2, None));
    let mut ids = IdSource::default();
    let mid = height as i32 / 2;
    place_base(&mut world, &mut ids, PlayerId(0), 2, mid, 1);
    place_base(&mut world, &mut ids, PlayerId(1), width as i32 - 3, mid, -1);
    world
}

/// Base and starting army for one player; `facing` is +1 or -1 along x
fn place_base(world: &mut BattleWorld, ids: &mut IdSource, owner: PlayerId, x: i32, mid: i32, facing: i32) {
    let at = |dx: i32| x + dx * facing;
    let layout = [
        (StructureKind::ConstructionYard, at(0), mid - 1),
        (StructureKind::VehicleFactory, at(0), mid - 6),
        (StructureKind::Refinery, at(0), mid + 4),
        (StructureKind::PowerPlant, at(4), mid - 9),
        (StructureKind::Workshop, at(4), mid + 8),
        (StructureKind::Hospital, at(0), mid + 8),
        (StructureKind::GunTurret, at(7), mid - 2),
        (StructureKind::RocketTurret, at(7), mid + 2),
    ];
    for (kind, sx, sy) in layout {
        let (w, _) = kind.footprint();
        let sx = if facing < 0 { sx - w as i32 + 1 } else { sx };
        world.add_structure(Structure::new(ids.structure(), owner, kind, sx, sy));
    }

    let army = [
        (UnitType::MediumTank, 9, -2),
        (UnitType::MediumTank, 9, 0),
        (UnitType::HeavyTank, 10, 1),
        (UnitType::LightTank, 10, -1),
        (UnitType::RocketTank, 8, 3),
        (UnitType::Artillery, 6, 0),
        (UnitType::Harvester, 5, 6),
        (UnitType::FuelTanker, 5, -4),
        (UnitType::AmmoTruck, 6, -4),
        (UnitType::Ambulance, 5, 5),
        (UnitType::RecoveryTank, 6, 5),
        (UnitType::Helicopter, 4, 0),
    ];
    for (unit_type, dx, dy) in army {
        let mut unit = Unit::new(ids.unit(), owner, unit_type, Cell::new(at(dx), mid + dy));
        if let UnitKind::Harvester(payload) = &mut unit.kind {
            let field = Cell::new(at(14), mid + dy);
            world.terrain.set_resource(field, true);
            payload.gathering = Some(field);
        }
        world.add_unit(unit);
    }
    let hunter = Unit::new(ids.unit(), owner, UnitType::LightTank, Cell::new(at(11), mid + 3)).as_hunter();
    world.add_unit(hunter);
}

/// Advance every living unit one cell along its path
fn step_movement(world: &mut BattleWorld) {
    for i in 0..world.units.len() {
        let unit = &world.units[i];
        if !unit.is_alive() || !unit.can_move() || unit.fuel().map(|f| f.is_exhausted()).unwrap_or(false) {
            continue;
        }
        let Some(pos) = unit.path.iter().position(|c| *c == unit.cell) else {
            continue;
        };
        let Some(&next) = unit.path.get(pos + 1) else {
            continue;
        };
        let (id, from, aerial) = (unit.id, unit.cell, unit.is_aerial());
        if !aerial && !world.is_free_cell(next, id) {
            continue;
        }

        if !aerial {
            world.occupancy.vacate(from);
            world.occupancy.occupy(next, id);
        }
        let unit = &mut world.units[i];
        unit.cell = next;
        unit.position = next.center();
        if let Some(fuel) = unit.fuel_mut() {
            fuel.current = (fuel.current - 0.5).max(0.0);
        }
    }
}

/// Units cleared to attack damage their target when in range
fn exchange_fire(world: &mut BattleWorld, tick_ms: GameTime, rng: &mut ChaCha8Rng, next_wreck: &mut u32) {
    let now = world.now;
    let shots: Vec<(UnitId, TargetRef, f32)> = world
        .units
        .iter()
        .filter(|u| u.is_alive() && u.flags.allowed_to_attack && u.crew.can_fire() && u.has_ammo())
        .filter_map(|u| {
            let target = u.target?;
            let weapon = u.weapon()?;
            let distance = world.distance_to_target(u.cell, target)?;
            weapon
                .in_range(distance)
                .then(|| (u.id, target, weapon.dps() * tick_ms as f32 / 1000.0))
        })
        .collect();

    for (shooter, target, damage) in shots {
        if let Some(ammo) = world.unit_mut(shooter).and_then(|u| u.ammo_mut()) {
            ammo.current = (ammo.current - 0.1).max(0.0);
        }
        if !rng.gen_bool(0.8) {
            continue;
        }
        match target {
            TargetRef::Unit(id) => {
                if let Some(victim) = world.unit_mut(id) {
                    victim.record_damage(damage, Some(shooter), now);
                }
            }
            TargetRef::Structure(id) => {
                if let Some(s) = world.structures.iter_mut().find(|s| s.id == id) {
                    s.health = (s.health - damage).max(0.0);
                }
            }
        }
    }

    let destroyed: Vec<(UnitId, PlayerId, Cell, UnitType)> = world
        .units
        .iter()
        .filter(|u| !u.is_alive())
        .map(|u| (u.id, u.owner, u.cell, u.unit_type))
        .collect();
    for (id, owner, cell, unit_type) in destroyed {
        if world.occupancy.occupant(cell) == Some(id) {
            world.occupancy.vacate(cell);
        }
        if unit_type != UnitType::Helicopter {
            *next_wreck += 1;
            world.add_wreck(Wreck {
                id: WreckId(*next_wreck),
                owner,
                cell,
                unit_type,
            });
        }
    }
    world.units.retain(|u| u.is_alive());

    let razed: Vec<StructureId> = world
        .structures
        .iter()
        .filter(|s| !s.is_alive())
        .map(|s| s.id)
        .collect();
    for id in razed {
        world.terrain.clear_structure(id);
    }
}
