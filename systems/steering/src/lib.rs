#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Intent policies for the Hunter and the NPC traffic cars.
//!
//! The world announces idle agents through decision events; this system
//! answers each one with a steer command. It never mutates the world
//! directly, so a frame driver stays free to reorder or drop its output.
//!
//! All randomness flows through one seeded [`ChaCha8Rng`], which keeps a
//! match replayable from its seeds alone.

use pursuit_core::{
    Command, Direction, Event, HunterMode, HunterSnapshot, NpcView, TileCoord, TruckSnapshot,
};
use pursuit_world::navigation::DistanceField;
use pursuit_world::CityMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tuning parameters for the steering system.
#[derive(Clone, Copy, Debug)]
pub struct SteeringConfig {
    /// Seed for the policy RNG that breaks scoring ties.
    pub rng_seed: u64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self { rng_seed: 0 }
    }
}

/// Decides travel directions for every computer-driven agent.
#[derive(Debug)]
pub struct Steering {
    rng: ChaCha8Rng,
}

impl Steering {
    /// Creates a steering system seeded from the provided configuration.
    #[must_use]
    pub fn new(config: SteeringConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Answers the decision requests in `events` with steer commands.
    ///
    /// Events that carry no decision request are ignored. An agent boxed in
    /// on all sides receives no command; the world keeps that request
    /// pending rather than repeating it.
    pub fn handle(
        &mut self,
        events: &[Event],
        map: &CityMap,
        truck: &TruckSnapshot,
        hunter: &HunterSnapshot,
        npcs: &NpcView,
        out_commands: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::HunterDecisionNeeded { tile } => {
                    let direction = match hunter.mode {
                        HunterMode::Flee => self.flee_direction(map, *tile, truck),
                        HunterMode::Wander => {
                            self.wander_direction(map, *tile, hunter.last_direction)
                        }
                    };
                    if let Some(direction) = direction {
                        out_commands.push(Command::SteerHunter { direction });
                    }
                }
                Event::NpcDecisionNeeded { npc_id, tile } => {
                    let last = npcs.get(*npc_id).and_then(|npc| npc.last_direction);
                    if let Some(direction) = self.wander_direction(map, *tile, last) {
                        out_commands.push(Command::SteerNpc {
                            npc_id: *npc_id,
                            direction,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    /// Picks the neighbouring tile farthest from the Truck along roads.
    ///
    /// Distances come from a breadth-first field traced from the Truck's
    /// tile, so walls count; a neighbour the Truck cannot reach at all
    /// scores highest. Ties are broken uniformly at random.
    fn flee_direction(
        &mut self,
        map: &CityMap,
        tile: TileCoord,
        truck: &TruckSnapshot,
    ) -> Option<Direction> {
        let field = DistanceField::trace(map, truck.tile, None);

        let mut best_score = 0u32;
        let mut best: Vec<Direction> = Vec::with_capacity(4);
        for (neighbor, direction) in map.neighbors(tile) {
            let score = field
                .distance(neighbor)
                .map_or(u32::from(u16::MAX) + 1, u32::from);
            if score > best_score {
                best_score = score;
                best.clear();
            }
            if score == best_score {
                best.push(direction);
            }
        }
        self.pick(&best)
    }

    /// Picks a random passable direction, avoiding an immediate reversal.
    ///
    /// Reversal is only taken when it is the sole way out of a dead end.
    fn wander_direction(
        &mut self,
        map: &CityMap,
        tile: TileCoord,
        last: Option<Direction>,
    ) -> Option<Direction> {
        let mut forward: Vec<Direction> = Vec::with_capacity(4);
        let mut all: Vec<Direction> = Vec::with_capacity(4);
        let reverse = last.map(Direction::opposite);
        for (_, direction) in map.neighbors(tile) {
            all.push(direction);
            if Some(direction) != reverse {
                forward.push(direction);
            }
        }
        if forward.is_empty() {
            self.pick(&all)
        } else {
            self.pick(&forward)
        }
    }

    fn pick(&mut self, candidates: &[Direction]) -> Option<Direction> {
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pursuit_core::{NpcId, Position, TileCoord};
    use pursuit_world::scaffolding;

    use super::*;

    fn truck_at(tile: TileCoord) -> TruckSnapshot {
        TruckSnapshot {
            tile,
            facing: Direction::East,
            progress: 0.0,
            moving: false,
            target: None,
            center: Position { x: 0.0, y: 0.0 },
            stall_remaining: Duration::ZERO,
        }
    }

    fn hunter_at(tile: TileCoord, mode: HunterMode, last: Option<Direction>) -> HunterSnapshot {
        HunterSnapshot {
            tile,
            facing: Direction::South,
            progress: 0.0,
            moving: false,
            center: Position { x: 0.0, y: 0.0 },
            mode,
            last_direction: last,
        }
    }

    fn decide(
        rows: &[&str],
        truck: TruckSnapshot,
        hunter: HunterSnapshot,
        seed: u64,
    ) -> Vec<Command> {
        let map = scaffolding::map_from_rows(rows);
        let events = [Event::HunterDecisionNeeded { tile: hunter.tile }];
        let mut commands = Vec::new();
        let mut steering = Steering::new(SteeringConfig { rng_seed: seed });
        steering.handle(
            &events,
            &map,
            &truck,
            &hunter,
            &NpcView::from_snapshots(Vec::new()),
            &mut commands,
        );
        commands
    }

    #[test]
    fn fleeing_hunter_runs_down_the_corridor() {
        let commands = decide(
            &["....."],
            truck_at(TileCoord::new(0, 0)),
            hunter_at(TileCoord::new(1, 0), HunterMode::Flee, None),
            7,
        );
        assert_eq!(
            commands,
            vec![Command::SteerHunter {
                direction: Direction::East,
            }]
        );
    }

    #[test]
    fn fleeing_hunter_still_moves_when_cut_off_from_the_truck() {
        // A wall splits the corridor; every tile near the hunter is
        // unreached by the distance field, yet a steer is still produced.
        let commands = decide(
            &["..#.."],
            truck_at(TileCoord::new(0, 0)),
            hunter_at(TileCoord::new(3, 0), HunterMode::Flee, None),
            7,
        );
        assert_eq!(
            commands,
            vec![Command::SteerHunter {
                direction: Direction::East,
            }]
        );
    }

    #[test]
    fn flee_tie_break_is_deterministic_per_seed() {
        // Both corridor ends sit at equal distance from the central truck.
        let rows = &["......."];
        let truck = truck_at(TileCoord::new(3, 0));
        let hunter = hunter_at(TileCoord::new(3, 0), HunterMode::Flee, None);

        let first = decide(rows, truck, hunter, 11);
        let second = decide(rows, truck, hunter, 11);
        assert_eq!(first, second);
        assert!(matches!(
            first[0],
            Command::SteerHunter {
                direction: Direction::East | Direction::West,
            }
        ));
    }

    #[test]
    fn wandering_hunter_does_not_reverse_mid_corridor() {
        for seed in 0..20 {
            let commands = decide(
                &["..."],
                truck_at(TileCoord::new(2, 0)),
                hunter_at(
                    TileCoord::new(1, 0),
                    HunterMode::Wander,
                    Some(Direction::East),
                ),
                seed,
            );
            assert_eq!(
                commands,
                vec![Command::SteerHunter {
                    direction: Direction::East,
                }]
            );
        }
    }

    #[test]
    fn wandering_hunter_reverses_out_of_a_dead_end() {
        let commands = decide(
            &["..#"],
            truck_at(TileCoord::new(0, 0)),
            hunter_at(
                TileCoord::new(1, 0),
                HunterMode::Wander,
                Some(Direction::East),
            ),
            3,
        );
        assert_eq!(
            commands,
            vec![Command::SteerHunter {
                direction: Direction::West,
            }]
        );
    }

    #[test]
    fn boxed_in_hunter_receives_no_command() {
        let commands = decide(
            &["#.#", "###"],
            truck_at(TileCoord::new(1, 0)),
            hunter_at(TileCoord::new(1, 0), HunterMode::Flee, None),
            0,
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn npc_decisions_answer_with_the_matching_id() {
        let map = scaffolding::map_from_rows(&["...."]);
        let npc_id = NpcId::new(2);
        let events = [Event::NpcDecisionNeeded {
            npc_id,
            tile: TileCoord::new(1, 0),
        }];
        let mut commands = Vec::new();
        let mut steering = Steering::new(SteeringConfig::default());
        steering.handle(
            &events,
            &map,
            &truck_at(TileCoord::new(3, 0)),
            &hunter_at(TileCoord::new(0, 0), HunterMode::Wander, None),
            &NpcView::from_snapshots(Vec::new()),
            &mut commands,
        );
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            commands[0],
            Command::SteerNpc { npc_id: id, .. } if id == npc_id
        ));
    }

    #[test]
    fn unrelated_events_produce_no_commands() {
        let map = scaffolding::map_from_rows(&["..."]);
        let events = [Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }];
        let mut commands = Vec::new();
        let mut steering = Steering::new(SteeringConfig::default());
        steering.handle(
            &events,
            &map,
            &truck_at(TileCoord::new(0, 0)),
            &hunter_at(TileCoord::new(2, 0), HunterMode::Wander, None),
            &NpcView::from_snapshots(Vec::new()),
            &mut commands,
        );
        assert!(commands.is_empty());
    }
}
