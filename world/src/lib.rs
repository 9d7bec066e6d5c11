#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative match state management for the pursuit simulation.
//!
//! The world owns the generated city, the traffic light, the three agent
//! classes, and all match timers. Adapters and systems mutate it exclusively
//! through [`apply`]; read access goes through the [`query`] module.

use std::time::Duration;

use pursuit_core::{
    Command, Direction, Event, HunterMode, MatchPhase, MoveRejection, NpcColor, NpcId, TileCoord,
    WinKind, WELCOME_BANNER,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod agents;
mod light;
mod map;
pub mod navigation;

pub use light::{phase_duration, TrafficLight};
pub use map::{CityMap, NeighborIter};

use agents::{Hunter, Npc, Truck};

/// Chebyshev distance at or below which the Hunter switches to fleeing.
const FLEE_ENTER_DISTANCE: u32 = 3;
/// Chebyshev distance above which the Hunter relaxes back to wandering.
const FLEE_EXIT_DISTANCE: u32 = 5;
/// Attempts allowed while separating the Hunter's spawn from the Truck's.
const HUNTER_SPAWN_ATTEMPTS: u32 = 200;

/// Colour rotation applied to spawned NPC traffic cars.
const NPC_COLORS: [NpcColor; 4] = [
    NpcColor::from_rgb(0xe8, 0xa0, 0x20),
    NpcColor::from_rgb(0x44, 0x88, 0xdd),
    NpcColor::from_rgb(0xdd, 0x44, 0x44),
    NpcColor::from_rgb(0x44, 0xcc, 0x66),
];

/// Aggregated tuning knobs for a match.
///
/// Speeds are expressed in tiles per second; the Truck-to-Hunter ratio is the
/// lever that decides how quickly the pursuit closes.
#[derive(Clone, Copy, Debug)]
pub struct MatchConfig {
    /// Number of tile columns in the generated city.
    pub columns: u32,
    /// Number of tile rows in the generated city.
    pub rows: u32,
    /// Side length of one square tile in pixel units.
    pub tile_length: f32,
    /// Truck travel speed in tiles per second.
    pub truck_speed: f32,
    /// Hunter travel speed in tiles per second.
    pub hunter_speed: f32,
    /// NPC travel speed in tiles per second.
    pub npc_speed: f32,
    /// Number of NPC traffic cars placed at match start.
    pub npc_count: usize,
    /// Time the Truck stalls after entering a stop-controlled tile.
    pub stall_duration: Duration,
    /// Time the Hunter must remain without free neighbours to lose by trap.
    pub trapped_duration: Duration,
    /// Pixel distance on each axis under which capture triggers.
    pub capture_threshold: f32,
    /// Minimum Chebyshev spawn separation sought between Truck and Hunter.
    pub spawn_separation: u32,
    /// Upper bound applied to every tick's delta time.
    pub max_tick: Duration,
    /// Number of dead-end corridors the generator carves toward.
    pub dead_end_target: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            columns: 25,
            rows: 19,
            tile_length: 36.0,
            truck_speed: 3.4,
            hunter_speed: 3.2,
            npc_speed: 2.2,
            npc_count: 4,
            stall_duration: Duration::from_millis(2_000),
            trapped_duration: Duration::from_millis(3_000),
            capture_threshold: 28.0,
            spawn_separation: 10,
            max_tick: Duration::from_millis(100),
            dead_end_target: 6,
        }
    }
}

/// Represents the authoritative pursuit match state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: MatchConfig,
    map: CityMap,
    light: TrafficLight,
    phase: MatchPhase,
    elapsed: Duration,
    trapped: Option<Duration>,
    outcome: Option<WinKind>,
    truck: Truck,
    hunter: Hunter,
    npcs: Vec<Npc>,
}

impl World {
    /// Creates a new world resting on the title screen.
    ///
    /// A placeholder city is generated so queries are valid before the first
    /// match starts; `StartMatch` replaces it.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let map = CityMap::generate(config.columns, config.rows, config.dead_end_target, &mut rng);
        let origin = map.intersection();
        Self {
            banner: WELCOME_BANNER,
            config,
            map,
            light: TrafficLight::new(),
            phase: MatchPhase::Title,
            elapsed: Duration::ZERO,
            trapped: None,
            outcome: None,
            truck: Truck::spawn(origin),
            hunter: Hunter::spawn(origin),
            npcs: Vec::new(),
        }
    }

    fn start_match(&mut self, seed: u64, out_events: &mut Vec<Event>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.map = CityMap::generate(
            self.config.columns,
            self.config.rows,
            self.config.dead_end_target,
            &mut rng,
        );
        self.light.reset();

        let roads = self.map.road_tiles();
        let truck_tile = pick_tile(&roads, &mut rng).unwrap_or_else(|| self.map.intersection());

        // Separation is best effort: after the attempt budget the last
        // candidate is accepted regardless of distance.
        let mut hunter_tile = truck_tile;
        for _ in 0..HUNTER_SPAWN_ATTEMPTS {
            hunter_tile = pick_tile(&roads, &mut rng).unwrap_or_else(|| self.map.intersection());
            if hunter_tile.chebyshev_distance(truck_tile) >= self.config.spawn_separation {
                break;
            }
        }

        self.truck = Truck::spawn(truck_tile);
        self.hunter = Hunter::spawn(hunter_tile);
        self.npcs = spawn_npcs(
            &roads,
            &[truck_tile, hunter_tile],
            self.config.npc_count,
            &mut rng,
        );

        self.elapsed = Duration::ZERO;
        self.trapped = None;
        self.outcome = None;
        self.phase = MatchPhase::Playing;

        out_events.push(Event::MatchStarted {
            truck: truck_tile,
            hunter: hunter_tile,
        });
    }

    fn steer_hunter(&mut self, direction: Direction) {
        if self.phase != MatchPhase::Playing || self.hunter.motion.moving() {
            return;
        }
        self.hunter.decision_pending = false;

        let Some(target) = self.hunter.motion.tile.step(direction) else {
            return;
        };
        if !self.map.is_passable(target) {
            return;
        }
        self.hunter.motion.begin(target, direction);
        self.hunter.last_direction = Some(direction);
    }

    fn steer_npc(&mut self, npc_id: NpcId, direction: Direction) {
        if self.phase != MatchPhase::Playing {
            return;
        }
        let Some(npc) = self.npcs.iter_mut().find(|npc| npc.id == npc_id) else {
            return;
        };
        if npc.motion.moving() {
            return;
        }
        npc.decision_pending = false;

        let Some(target) = npc.motion.tile.step(direction) else {
            return;
        };
        if !self.map.is_passable(target) {
            return;
        }
        npc.motion.begin(target, direction);
        npc.last_direction = Some(direction);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.phase != MatchPhase::Playing {
            return;
        }

        // Bounding the step keeps a stalled frame driver from tunnelling
        // agents through collision gates.
        let dt = dt.min(self.config.max_tick);
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        if self.light.advance(dt) {
            out_events.push(Event::LightPhaseChanged {
                phase: self.light.phase(),
            });
        }

        self.update_npcs(dt, out_events);
        self.update_truck(dt, out_events);
        self.update_hunter(dt, out_events);
        self.check_win(dt, out_events);
    }

    fn update_npcs(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let speed = self.config.npc_speed;
        for npc in &mut self.npcs {
            let _ = npc.motion.advance(speed, dt);
            if !npc.motion.moving() && npc.mark_decision_needed() {
                out_events.push(Event::NpcDecisionNeeded {
                    npc_id: npc.id,
                    tile: npc.motion.tile,
                });
            }
        }
    }

    fn update_truck(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if let Some(arrival) = self.truck.motion.advance(self.config.truck_speed, dt) {
            if self.map.is_stop_sign(arrival) {
                self.truck.stall = self.config.stall_duration;
                out_events.push(Event::TruckStalled {
                    duration: self.config.stall_duration,
                });
            }
        }

        // A stalled Truck makes no movement attempt; the queued direction is
        // consumed only once the stall clears.
        if self.truck.stall > Duration::ZERO {
            self.truck.stall = self.truck.stall.saturating_sub(dt);
            return;
        }

        if self.truck.motion.moving() {
            return;
        }

        let Some(direction) = self.truck.queued.take() else {
            return;
        };
        let Some(target) = self.truck.motion.tile.step(direction) else {
            out_events.push(Event::TruckMoveRejected {
                direction,
                reason: MoveRejection::Blocked,
            });
            return;
        };
        if !self.map.is_passable(target) {
            out_events.push(Event::TruckMoveRejected {
                direction,
                reason: MoveRejection::Blocked,
            });
            return;
        }

        // The Truck turns to face a passable tile even when entry is denied.
        self.truck.motion.facing = direction;

        if self.map.is_intersection(target) && !self.light.permits(direction.axis()) {
            out_events.push(Event::TruckMoveRejected {
                direction,
                reason: MoveRejection::RedLight,
            });
            return;
        }
        if self.npc_blocks(target) {
            out_events.push(Event::TruckMoveRejected {
                direction,
                reason: MoveRejection::Occupied,
            });
            return;
        }

        self.truck.motion.begin(target, direction);
    }

    fn npc_blocks(&self, target: TileCoord) -> bool {
        self.npcs
            .iter()
            .any(|npc| npc.motion.tile == target || npc.motion.target == Some(target))
    }

    fn update_hunter(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let _ = self.hunter.motion.advance(self.config.hunter_speed, dt);
        if self.hunter.motion.moving() {
            return;
        }

        let distance = self
            .hunter
            .motion
            .tile
            .chebyshev_distance(self.truck.motion.tile);
        let mode = if distance <= FLEE_ENTER_DISTANCE {
            HunterMode::Flee
        } else if distance > FLEE_EXIT_DISTANCE {
            HunterMode::Wander
        } else {
            self.hunter.mode
        };
        if mode != self.hunter.mode {
            self.hunter.mode = mode;
            out_events.push(Event::HunterModeChanged { mode });
        }

        if self.hunter.mark_decision_needed() {
            out_events.push(Event::HunterDecisionNeeded {
                tile: self.hunter.motion.tile,
            });
        }
    }

    fn check_win(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let truck_center = self.truck.motion.center(self.config.tile_length);
        let hunter_center = self.hunter.motion.center(self.config.tile_length);
        if (truck_center.x - hunter_center.x).abs() < self.config.capture_threshold
            && (truck_center.y - hunter_center.y).abs() < self.config.capture_threshold
        {
            self.finish(WinKind::Capture, out_events);
            return;
        }

        let truck_tile = self.truck.motion.tile;
        let free_neighbors = self
            .map
            .neighbors(self.hunter.motion.tile)
            .filter(|(tile, _)| *tile != truck_tile)
            .count();
        if free_neighbors == 0 {
            match self.trapped {
                // Arm the countdown; time starts draining on the next tick.
                None => self.trapped = Some(self.config.trapped_duration),
                Some(remaining) => {
                    let remaining = remaining.saturating_sub(dt);
                    if remaining.is_zero() {
                        self.finish(WinKind::Trapped, out_events);
                        return;
                    }
                    self.trapped = Some(remaining);
                }
            }
        } else {
            self.trapped = None;
        }
    }

    fn finish(&mut self, outcome: WinKind, out_events: &mut Vec<Event>) {
        self.phase = MatchPhase::Won;
        self.outcome = Some(outcome);
        self.trapped = None;
        out_events.push(Event::MatchWon {
            outcome,
            elapsed: self.elapsed,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartMatch { seed } => world.start_match(seed, out_events),
        Command::QueueTruckDirection { direction } => {
            if world.phase == MatchPhase::Playing {
                world.truck.queued = Some(direction);
            }
        }
        Command::SteerHunter { direction } => world.steer_hunter(direction),
        Command::SteerNpc { npc_id, direction } => world.steer_npc(npc_id, direction),
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

fn pick_tile<R: Rng>(tiles: &[TileCoord], rng: &mut R) -> Option<TileCoord> {
    if tiles.is_empty() {
        return None;
    }
    Some(tiles[rng.gen_range(0..tiles.len())])
}

fn spawn_npcs<R: Rng>(
    roads: &[TileCoord],
    reserved: &[TileCoord],
    count: usize,
    rng: &mut R,
) -> Vec<Npc> {
    let mut pool: Vec<TileCoord> = roads
        .iter()
        .copied()
        .filter(|tile| !reserved.contains(tile))
        .collect();

    let mut npcs = Vec::with_capacity(count.min(pool.len()));
    for index in 0..count {
        if pool.is_empty() {
            break;
        }
        let tile = pool.swap_remove(rng.gen_range(0..pool.len()));
        let color = NPC_COLORS[index % NPC_COLORS.len()];
        npcs.push(Npc::spawn(NpcId::new(index as u32), tile, color));
    }
    npcs
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use pursuit_core::{
        HunterSnapshot, MatchPhase, NpcSnapshot, NpcView, TruckSnapshot, WinKind,
    };

    use super::{CityMap, MatchConfig, TrafficLight, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the match configuration.
    #[must_use]
    pub fn config(world: &World) -> &MatchConfig {
        &world.config
    }

    /// Provides read-only access to the generated city layout.
    #[must_use]
    pub fn map(world: &World) -> &CityMap {
        &world.map
    }

    /// Provides read-only access to the intersection traffic light.
    #[must_use]
    pub fn light(world: &World) -> &TrafficLight {
        &world.light
    }

    /// Lifecycle phase of the current match.
    #[must_use]
    pub fn match_phase(world: &World) -> MatchPhase {
        world.phase
    }

    /// Match time accumulated while playing.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Remaining trapped countdown, when armed.
    #[must_use]
    pub fn trapped_remaining(world: &World) -> Option<Duration> {
        world.trapped
    }

    /// Condition that ended the match, once one has.
    #[must_use]
    pub fn outcome(world: &World) -> Option<WinKind> {
        world.outcome
    }

    /// Captures a read-only snapshot of the Truck.
    #[must_use]
    pub fn truck(world: &World) -> TruckSnapshot {
        let motion = &world.truck.motion;
        TruckSnapshot {
            tile: motion.tile,
            facing: motion.facing,
            progress: motion.progress,
            moving: motion.moving(),
            target: motion.target,
            center: motion.center(world.config.tile_length),
            stall_remaining: world.truck.stall,
        }
    }

    /// Captures a read-only snapshot of the Hunter.
    #[must_use]
    pub fn hunter(world: &World) -> HunterSnapshot {
        let motion = &world.hunter.motion;
        HunterSnapshot {
            tile: motion.tile,
            facing: motion.facing,
            progress: motion.progress,
            moving: motion.moving(),
            center: motion.center(world.config.tile_length),
            mode: world.hunter.mode,
            last_direction: world.hunter.last_direction,
        }
    }

    /// Captures a read-only view of the NPC traffic cars.
    #[must_use]
    pub fn npc_view(world: &World) -> NpcView {
        let snapshots: Vec<NpcSnapshot> = world
            .npcs
            .iter()
            .map(|npc| NpcSnapshot {
                id: npc.id,
                tile: npc.motion.tile,
                facing: npc.motion.facing,
                progress: npc.motion.progress,
                moving: npc.motion.moving(),
                target: npc.motion.target,
                center: npc.motion.center(world.config.tile_length),
                color: npc.color,
                last_direction: npc.last_direction,
            })
            .collect();
        NpcView::from_snapshots(snapshots)
    }
}

/// Deterministic scenario construction for tests.
///
/// Every function here bypasses generation so suites can pin exact layouts
/// and agent positions; nothing in this module runs in release builds.
#[cfg(any(test, feature = "scenario_scaffolding"))]
pub mod scaffolding {
    use pursuit_core::{LightPhase, MatchPhase, NpcColor, NpcId, TileCoord};

    use super::agents::{Hunter, Npc, Truck};
    use super::{CityMap, World};

    /// Builds a city from ASCII rows.
    ///
    /// `#` block, `.` road, `=` arterial, `+` intersection, `S` stop-signed
    /// road. All rows must share one width.
    #[must_use]
    pub fn map_from_rows(rows: &[&str]) -> CityMap {
        CityMap::from_rows(rows)
    }

    /// Replaces the world's city layout.
    pub fn install_map(world: &mut World, map: CityMap) {
        world.map = map;
    }

    /// Moves the world into the playing phase without regenerating anything.
    pub fn begin_playing(world: &mut World) {
        world.phase = MatchPhase::Playing;
    }

    /// Places the Truck stationary on the provided tile.
    pub fn place_truck(world: &mut World, tile: TileCoord) {
        world.truck = Truck::spawn(tile);
    }

    /// Places the Hunter stationary on the provided tile.
    pub fn place_hunter(world: &mut World, tile: TileCoord) {
        world.hunter = Hunter::spawn(tile);
    }

    /// Adds a stationary NPC on the provided tile.
    pub fn spawn_npc(world: &mut World, tile: TileCoord) -> NpcId {
        let id = NpcId::new(world.npcs.len() as u32);
        world
            .npcs
            .push(Npc::spawn(id, tile, NpcColor::from_rgb(0xe8, 0xa0, 0x20)));
        id
    }

    /// Forces the traffic light to rest at the start of the given phase.
    pub fn force_light_phase(world: &mut World, phase: LightPhase) {
        world.light.force_phase(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_core::LightPhase;

    fn playing_world(rows: &[&str]) -> World {
        let mut world = World::new(MatchConfig::default());
        scaffolding::install_map(&mut world, scaffolding::map_from_rows(rows));
        scaffolding::begin_playing(&mut world);
        world
    }

    fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt }, &mut events);
        events
    }

    fn queue(world: &mut World, direction: Direction) {
        let mut events = Vec::new();
        apply(
            world,
            Command::QueueTruckDirection { direction },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn start_match_places_agents_on_road_tiles() {
        let mut world = World::new(MatchConfig::default());
        let mut events = Vec::new();
        apply(&mut world, Command::StartMatch { seed: 42 }, &mut events);

        assert_eq!(query::match_phase(&world), MatchPhase::Playing);
        let truck = query::truck(&world);
        let hunter = query::hunter(&world);
        assert!(query::map(&world).is_passable(truck.tile));
        assert!(query::map(&world).is_passable(hunter.tile));
        assert!(matches!(events[0], Event::MatchStarted { .. }));

        let npcs = query::npc_view(&world).into_vec();
        assert_eq!(npcs.len(), 4);
        for npc in &npcs {
            assert!(query::map(&world).is_passable(npc.tile));
            assert_ne!(npc.tile, truck.tile);
            assert_ne!(npc.tile, hunter.tile);
        }
    }

    #[test]
    fn start_match_is_deterministic_for_equal_seeds() {
        let mut first = World::new(MatchConfig::default());
        let mut second = World::new(MatchConfig::default());
        let mut first_events = Vec::new();
        let mut second_events = Vec::new();

        apply(&mut first, Command::StartMatch { seed: 9 }, &mut first_events);
        apply(
            &mut second,
            Command::StartMatch { seed: 9 },
            &mut second_events,
        );

        assert_eq!(first_events, second_events);
        assert_eq!(query::truck(&first).tile, query::truck(&second).tile);
        assert_eq!(query::hunter(&first).tile, query::hunter(&second).tile);
        assert_eq!(query::map(&first).tiles(), query::map(&second).tiles());
    }

    #[test]
    fn spawn_separation_is_honoured_when_achievable() {
        let mut world = World::new(MatchConfig::default());
        let mut events = Vec::new();
        for seed in 0..10 {
            apply(&mut world, Command::StartMatch { seed }, &mut events);
            let truck = query::truck(&world).tile;
            let hunter = query::hunter(&world).tile;
            assert!(
                truck.chebyshev_distance(hunter) >= 10,
                "seed {seed} spawned agents too close on a 25x19 city"
            );
        }
    }

    #[test]
    fn idle_truck_without_intent_never_moves() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(1, 1));
        let before = query::truck(&world);

        for _ in 0..50 {
            let _ = tick(&mut world, Duration::from_millis(16));
        }

        let after = query::truck(&world);
        assert_eq!(after.tile, before.tile);
        assert_eq!(after.progress, 0.0);
        assert!(!after.moving);
    }

    #[test]
    fn truck_move_into_block_is_rejected_and_intent_cleared() {
        let mut world = playing_world(&[".#.", "...", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(2, 2));

        queue(&mut world, Direction::East);
        let events = tick(&mut world, Duration::from_millis(16));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::East,
            reason: MoveRejection::Blocked,
        }));
        assert!(!query::truck(&world).moving);

        // Intent was consumed; the next tick attempts nothing.
        let events = tick(&mut world, Duration::from_millis(16));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TruckMoveRejected { .. })));
    }

    #[test]
    fn truck_move_off_grid_is_rejected() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(2, 2));

        queue(&mut world, Direction::West);
        let events = tick(&mut world, Duration::from_millis(16));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::West,
            reason: MoveRejection::Blocked,
        }));
        assert!(!query::truck(&world).moving);
    }

    #[test]
    fn red_axis_denies_intersection_entry() {
        let mut world = playing_world(&["#=#", "=+=", "#=#"]);
        scaffolding::place_truck(&mut world, TileCoord::new(1, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 2));
        scaffolding::force_light_phase(&mut world, LightPhase::EastWestGreen);

        // Southbound entry against the east-west green.
        queue(&mut world, Direction::South);
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::South,
            reason: MoveRejection::RedLight,
        }));
        let truck = query::truck(&world);
        assert!(!truck.moving);
        assert_eq!(truck.tile, TileCoord::new(1, 0));
        // The Truck still turned to face the intersection.
        assert_eq!(truck.facing, Direction::South);

        scaffolding::force_light_phase(&mut world, LightPhase::NorthSouthGreen);
        queue(&mut world, Direction::South);
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::TruckMoveRejected { .. })));
        assert!(query::truck(&world).moving);
    }

    #[test]
    fn yellow_denies_both_axes() {
        let mut world = playing_world(&["#=#", "=+=", "#=#"]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 1));
        scaffolding::place_hunter(&mut world, TileCoord::new(2, 1));
        scaffolding::force_light_phase(&mut world, LightPhase::EastWestYellow);

        queue(&mut world, Direction::East);
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::East,
            reason: MoveRejection::RedLight,
        }));
    }

    #[test]
    fn npc_occupancy_denies_truck_entry() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(2, 2));
        let _ = scaffolding::spawn_npc(&mut world, TileCoord::new(1, 0));

        queue(&mut world, Direction::East);
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::East,
            reason: MoveRejection::Occupied,
        }));
        assert!(!query::truck(&world).moving);
    }

    #[test]
    fn npc_in_flight_target_denies_truck_entry() {
        let mut world = playing_world(&["....", "....", "...."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(3, 2));
        let npc_id = scaffolding::spawn_npc(&mut world, TileCoord::new(2, 0));

        // Send the NPC toward the tile the Truck wants.
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SteerNpc {
                npc_id,
                direction: Direction::West,
            },
            &mut events,
        );
        queue(&mut world, Direction::East);
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events.contains(&Event::TruckMoveRejected {
            direction: Direction::East,
            reason: MoveRejection::Occupied,
        }));
    }

    #[test]
    fn stop_sign_arrival_stalls_the_truck() {
        let mut world = playing_world(&["...", ".S.", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(1, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(0, 2));

        queue(&mut world, Direction::South);
        let _ = tick(&mut world, Duration::from_millis(1));
        assert!(query::truck(&world).moving);

        // Let the transition finish; 3.4 tiles/sec crosses in under 300 ms.
        let mut stalled = false;
        for _ in 0..30 {
            let events = tick(&mut world, Duration::from_millis(16));
            if events
                .iter()
                .any(|event| matches!(event, Event::TruckStalled { .. }))
            {
                stalled = true;
                break;
            }
        }
        assert!(stalled);
        let truck = query::truck(&world);
        assert_eq!(truck.tile, TileCoord::new(1, 1));
        assert!(truck.stall_remaining > Duration::ZERO);

        // Movement attempts are suppressed until the stall drains.
        queue(&mut world, Direction::South);
        let _ = tick(&mut world, Duration::from_millis(16));
        assert!(!query::truck(&world).moving);

        let mut remaining = query::truck(&world).stall_remaining;
        while remaining > Duration::ZERO {
            let _ = tick(&mut world, Duration::from_millis(100));
            remaining = query::truck(&world).stall_remaining;
        }
        queue(&mut world, Direction::South);
        let _ = tick(&mut world, Duration::from_millis(16));
        assert!(query::truck(&world).moving);
    }

    #[test]
    fn hunter_mode_hysteresis_matches_band_edges() {
        let mut world = playing_world(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
        ]);
        scaffolding::place_hunter(&mut world, TileCoord::new(0, 0));

        let mut mode_at = |column: u32| {
            scaffolding::place_truck(&mut world, TileCoord::new(column, 0));
            let _ = tick(&mut world, Duration::from_millis(1));
            query::hunter(&world).mode
        };

        // Wander holds until the distance drops to the enter edge.
        assert_eq!(mode_at(6), HunterMode::Wander);
        assert_eq!(mode_at(4), HunterMode::Wander);
        assert_eq!(mode_at(3), HunterMode::Flee);
        // Flee holds across the hysteresis band.
        assert_eq!(mode_at(4), HunterMode::Flee);
        assert_eq!(mode_at(5), HunterMode::Flee);
        // Only beyond the exit edge does the Hunter relax.
        assert_eq!(mode_at(6), HunterMode::Wander);
    }

    #[test]
    fn hunter_mode_change_is_announced() {
        let mut world = playing_world(&["......", "......"]);
        scaffolding::place_hunter(&mut world, TileCoord::new(0, 0));
        scaffolding::place_truck(&mut world, TileCoord::new(2, 0));

        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events.contains(&Event::HunterModeChanged {
            mode: HunterMode::Flee,
        }));
    }

    #[test]
    fn idle_hunter_requests_a_decision_once() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 1));
        scaffolding::place_truck(&mut world, TileCoord::new(2, 2));

        let events = tick(&mut world, Duration::from_millis(1));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::HunterDecisionNeeded { .. })));

        // The request is not repeated while the decision is outstanding.
        let events = tick(&mut world, Duration::from_millis(1));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::HunterDecisionNeeded { .. })));
    }

    #[test]
    fn steering_the_hunter_commits_a_transition() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 1));
        scaffolding::place_truck(&mut world, TileCoord::new(2, 2));
        let _ = tick(&mut world, Duration::from_millis(1));

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SteerHunter {
                direction: Direction::North,
            },
            &mut events,
        );

        let hunter = query::hunter(&world);
        assert!(hunter.moving);
        assert_eq!(hunter.facing, Direction::North);
        assert_eq!(hunter.last_direction, Some(Direction::North));
    }

    #[test]
    fn trapped_win_fires_exactly_on_the_duration_boundary() {
        // The Hunter's only neighbour is occupied by the Truck.
        let mut world = playing_world(&["#.#", "#.#", "#.#"]);
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 0));
        scaffolding::place_truck(&mut world, TileCoord::new(1, 1));

        // First tick arms the countdown.
        let _ = tick(&mut world, Duration::from_millis(1));
        assert_eq!(
            query::trapped_remaining(&world),
            Some(Duration::from_millis(3_000))
        );

        // Drain to one millisecond short of the boundary.
        for _ in 0..29 {
            let _ = tick(&mut world, Duration::from_millis(100));
        }
        let _ = tick(&mut world, Duration::from_millis(99));
        assert_eq!(query::match_phase(&world), MatchPhase::Playing);
        assert_eq!(
            query::trapped_remaining(&world),
            Some(Duration::from_millis(1))
        );

        let events = tick(&mut world, Duration::from_millis(2));
        assert_eq!(query::match_phase(&world), MatchPhase::Won);
        assert_eq!(query::outcome(&world), Some(WinKind::Trapped));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::MatchWon {
                outcome: WinKind::Trapped,
                ..
            }
        )));
    }

    #[test]
    fn freed_neighbor_disarms_the_trapped_countdown() {
        let mut world = playing_world(&["#.#", "#.#", "#.#"]);
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 0));
        scaffolding::place_truck(&mut world, TileCoord::new(1, 1));

        let _ = tick(&mut world, Duration::from_millis(100));
        assert!(query::trapped_remaining(&world).is_some());

        // The Truck steps away; the countdown resets to unarmed.
        scaffolding::place_truck(&mut world, TileCoord::new(1, 2));
        let _ = tick(&mut world, Duration::from_millis(100));
        assert_eq!(query::trapped_remaining(&world), None);
    }

    #[test]
    fn capture_win_triggers_on_center_proximity() {
        let mut world = playing_world(&["..", "#."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 0));

        // Drive the Truck onto the Hunter's tile; centres close within one
        // transition (36 px apart, threshold 28 px).
        queue(&mut world, Direction::East);
        let mut won = false;
        for _ in 0..40 {
            let events = tick(&mut world, Duration::from_millis(16));
            if events.iter().any(|event| {
                matches!(
                    event,
                    Event::MatchWon {
                        outcome: WinKind::Capture,
                        ..
                    }
                )
            }) {
                won = true;
                break;
            }
            queue(&mut world, Direction::East);
        }
        assert!(won);
        assert_eq!(query::match_phase(&world), MatchPhase::Won);
    }

    #[test]
    fn ticks_are_ignored_outside_the_playing_phase() {
        let mut world = World::new(MatchConfig::default());
        let events = tick(&mut world, Duration::from_millis(100));
        assert!(events.is_empty());
        assert_eq!(query::elapsed(&world), Duration::ZERO);
    }

    #[test]
    fn tick_delta_is_clamped_to_the_configured_maximum() {
        let mut world = playing_world(&["...", "...", "..."]);
        scaffolding::place_truck(&mut world, TileCoord::new(0, 0));
        scaffolding::place_hunter(&mut world, TileCoord::new(2, 2));

        let events = tick(&mut world, Duration::from_secs(5));
        assert!(events.contains(&Event::TimeAdvanced {
            dt: Duration::from_millis(100),
        }));
        assert_eq!(query::elapsed(&world), Duration::from_millis(100));
    }

    #[test]
    fn elapsed_time_freezes_once_the_match_is_won() {
        let mut world = playing_world(&["#.#", "#.#", "#.#"]);
        scaffolding::place_hunter(&mut world, TileCoord::new(1, 0));
        scaffolding::place_truck(&mut world, TileCoord::new(1, 1));

        for _ in 0..40 {
            let _ = tick(&mut world, Duration::from_millis(100));
        }
        assert_eq!(query::match_phase(&world), MatchPhase::Won);
        let frozen = query::elapsed(&world);
        let _ = tick(&mut world, Duration::from_millis(100));
        assert_eq!(query::elapsed(&world), frozen);
    }
}
