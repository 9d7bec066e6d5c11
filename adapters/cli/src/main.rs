#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless pursuit match.
//!
//! The player is replaced by a greedy auto-chaser so whole matches can be
//! replayed and inspected from a terminal.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use pursuit_core::{Command, Direction, MatchPhase, TileCoord, TileKind};
use pursuit_rendering::{build_scene, AgentClass, Scene};
use pursuit_system_steering::{Steering, SteeringConfig};
use pursuit_world::navigation::DistanceField;
use pursuit_world::{apply, query, MatchConfig, World};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "pursuit", about = "Headless tile-grid chase runner")]
struct Args {
    /// Seed for city generation and agent placement.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Seed for the steering policy RNG.
    #[arg(long, default_value_t = 0)]
    steering_seed: u64,

    /// Maximum number of simulated frames before giving up.
    #[arg(long, default_value_t = 120_000)]
    max_frames: u32,

    /// Print the city every N frames; 0 prints only the final frame.
    #[arg(long, default_value_t = 0)]
    render_every: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut world = World::new(MatchConfig::default());
    println!("{}", query::welcome_banner(&world));

    let mut steering = Steering::new(SteeringConfig {
        rng_seed: args.steering_seed,
    });
    let mut events = Vec::new();
    apply(&mut world, Command::StartMatch { seed: args.seed }, &mut events);

    let mut frames = 0u32;
    while frames < args.max_frames && query::match_phase(&world) == MatchPhase::Playing {
        queue_chase_direction(&mut world);

        events.clear();
        apply(&mut world, Command::Tick { dt: FRAME }, &mut events);

        let truck = query::truck(&world);
        let hunter = query::hunter(&world);
        let npcs = query::npc_view(&world);
        let mut commands = Vec::new();
        steering.handle(
            &events,
            query::map(&world),
            &truck,
            &hunter,
            &npcs,
            &mut commands,
        );
        for command in commands {
            apply(&mut world, command, &mut events);
        }

        frames += 1;
        if args.render_every > 0 && frames % args.render_every == 0 {
            println!("{}", render_ascii(&world));
        }
    }

    println!("{}", render_ascii(&world));
    match query::outcome(&world) {
        Some(outcome) => println!(
            "match won by {outcome:?} after {:.1}s ({frames} frames, seed {})",
            query::elapsed(&world).as_secs_f64(),
            args.seed,
        ),
        None => println!(
            "no win within {frames} frames (seed {})",
            args.seed
        ),
    }
    Ok(())
}

/// Queues a step along the road network toward the Hunter.
///
/// Picks the passable neighbour with the smallest breadth-first distance to
/// the Hunter's tile; standing still is never preferred.
fn queue_chase_direction(world: &mut World) {
    let truck = query::truck(world);
    if truck.moving {
        return;
    }
    let hunter = query::hunter(world);
    let map = query::map(world);
    let field = DistanceField::trace(map, hunter.tile, None);

    let mut best: Option<(u16, Direction)> = None;
    for (neighbor, direction) in map.neighbors(truck.tile) {
        let Some(distance) = field.distance(neighbor) else {
            continue;
        };
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, direction));
        }
    }
    if let Some((_, direction)) = best {
        let mut events = Vec::new();
        apply(world, Command::QueueTruckDirection { direction }, &mut events);
    }
}

/// Renders the city and its inhabitants as one character per tile.
fn render_ascii(world: &World) -> String {
    let scene = build_scene(world);
    let map = query::map(world);
    let columns = map.columns();
    let rows = map.rows();

    let mut glyphs = vec![vec![' '; columns as usize]; rows as usize];
    for row in 0..rows {
        for column in 0..columns {
            let tile = TileCoord::new(column, row);
            glyphs[row as usize][column as usize] = match map.kind(tile) {
                Some(TileKind::Block) => '#',
                Some(TileKind::Arterial) => '=',
                Some(TileKind::Intersection) => '+',
                Some(TileKind::Road) if map.is_stop_sign(tile) => 's',
                Some(TileKind::Road) | None => '.',
            };
        }
    }
    for agent in &scene.agents {
        let column = (agent.center.x / scene.tile_grid.tile_length) as usize;
        let row = (agent.center.y / scene.tile_grid.tile_length) as usize;
        if row < glyphs.len() && column < glyphs[row].len() {
            glyphs[row][column] = match agent.class {
                AgentClass::Truck => 'T',
                AgentClass::Hunter => 'H',
                AgentClass::Npc => 'n',
            };
        }
    }

    let mut output = String::with_capacity((columns as usize + 1) * rows as usize + 64);
    for row in glyphs {
        output.extend(row);
        output.push('\n');
    }
    output.push_str(&status_line(&scene));
    output
}

fn status_line(scene: &Scene) -> String {
    let hud = &scene.hud;
    let mut line = format!(
        "phase {:?} | {:.1}s | light {:?}",
        hud.match_phase,
        hud.elapsed.as_secs_f64(),
        scene.signal.phase,
    );
    if hud.hunter_fleeing {
        line.push_str(" | hunter fleeing");
    }
    if let Some(stall) = hud.stall_remaining {
        line.push_str(&format!(" | stalled {:.1}s", stall.as_secs_f64()));
    }
    if let Some(countdown) = hud.trapped_countdown {
        line.push_str(&format!(" | trap {:.1}s", countdown.as_secs_f64()));
    }
    if let Some(outcome) = hud.outcome {
        line.push_str(&format!(" | won by {outcome:?}"));
    }
    line
}
