#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the pursuit simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Hot pursuit. Corner the runner.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Starts a fresh match: regenerates the city, places agents, resets timers.
    StartMatch {
        /// Seed that drives the match's map generation and agent placement.
        seed: u64,
    },
    /// Latches the player's intended travel direction for the Truck.
    ///
    /// Repeated commands within one tick overwrite the previous intent.
    QueueTruckDirection {
        /// Direction the player wants the Truck to travel next.
        direction: Direction,
    },
    /// Requests that the Hunter begin a transition toward an adjacent tile.
    SteerHunter {
        /// Direction of travel chosen by the Hunter's intent policy.
        direction: Direction,
    },
    /// Requests that an NPC car begin a transition toward an adjacent tile.
    SteerNpc {
        /// Identifier of the NPC attempting to move.
        npc_id: NpcId,
        /// Direction of travel chosen by the NPC's wander policy.
        direction: Direction,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new match began on a freshly generated city.
    MatchStarted {
        /// Tile on which the Truck spawned.
        truck: TileCoord,
        /// Tile on which the Hunter spawned.
        hunter: TileCoord,
    },
    /// Indicates that the simulation clock advanced while playing.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick, after clamping.
        dt: Duration,
    },
    /// Announces that the traffic light entered a new phase.
    LightPhaseChanged {
        /// Phase that became active.
        phase: LightPhase,
    },
    /// Reports that the Truck's queued direction was consumed but denied.
    TruckMoveRejected {
        /// Direction the player had queued.
        direction: Direction,
        /// Specific gate that denied the move.
        reason: MoveRejection,
    },
    /// Announces that the Truck arrived on a stop-controlled tile and stalled.
    TruckStalled {
        /// Time the Truck will remain stalled.
        duration: Duration,
    },
    /// Announces that the Hunter switched behavioural mode.
    HunterModeChanged {
        /// Mode that became active.
        mode: HunterMode,
    },
    /// Signals that the Hunter is idle and awaits a steering decision.
    HunterDecisionNeeded {
        /// Tile the Hunter currently occupies.
        tile: TileCoord,
    },
    /// Signals that an NPC is idle and awaits a steering decision.
    NpcDecisionNeeded {
        /// Identifier of the idle NPC.
        npc_id: NpcId,
        /// Tile the NPC currently occupies.
        tile: TileCoord,
    },
    /// Announces that the match ended in the player's favour.
    MatchWon {
        /// Condition that ended the match.
        outcome: WinKind,
        /// Match time accumulated when the win triggered.
        elapsed: Duration,
    },
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Chebyshev distance between two tile coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: TileCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Returns the adjacent tile in the provided direction, if one exists.
    ///
    /// Stepping off the zero edge yields `None`; bounds above zero are the
    /// map's concern, not the coordinate's.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<TileCoord> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::South => self
                .row
                .checked_add(1)
                .map(|row| Self::new(self.column, row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// Cardinal movement directions available to all agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Returns the direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Travel axis the direction belongs to, used for signal permission.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::East | Self::West => Axis::EastWest,
            Self::North | Self::South => Axis::NorthSouth,
        }
    }

    /// Signed column and row offsets of one step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Travel axes recognised by the signal-controlled intersection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// East-west travel (column changes).
    EastWest,
    /// North-south travel (row changes).
    NorthSouth,
}

/// Classification of a single city tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Neighbourhood road, the default passable tile.
    Road,
    /// City block; impassable.
    Block,
    /// Arterial road forming the main horizontal or vertical axis.
    Arterial,
    /// The single tile where the two arterial roads cross.
    Intersection,
}

impl TileKind {
    /// Reports whether agents may occupy tiles of this kind.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Block)
    }
}

/// Phases of the intersection traffic light, in cycle order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightPhase {
    /// East-west traffic may enter the intersection.
    EastWestGreen,
    /// East-west phase winding down; entry denied.
    EastWestYellow,
    /// North-south traffic may enter the intersection.
    NorthSouthGreen,
    /// North-south phase winding down; entry denied.
    NorthSouthYellow,
}

impl LightPhase {
    /// Phase that follows this one in the fixed cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::EastWestGreen => Self::EastWestYellow,
            Self::EastWestYellow => Self::NorthSouthGreen,
            Self::NorthSouthGreen => Self::NorthSouthYellow,
            Self::NorthSouthYellow => Self::EastWestGreen,
        }
    }

    /// Reports whether travel along the provided axis may enter the
    /// intersection during this phase. Yellow and red both deny entry.
    #[must_use]
    pub const fn permits(self, axis: Axis) -> bool {
        match (self, axis) {
            (Self::EastWestGreen, Axis::EastWest) => true,
            (Self::NorthSouthGreen, Axis::NorthSouth) => true,
            _ => false,
        }
    }
}

/// Behavioural mode driving the Hunter's intent policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HunterMode {
    /// Aimless roaming with an anti-reversal bias.
    Wander,
    /// Active evasion away from the Truck.
    Flee,
}

/// Lifecycle phase of the current match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    /// No match running; awaiting a start request.
    Title,
    /// Simulation advancing each tick.
    Playing,
    /// Terminal condition reached; state frozen.
    Won,
}

/// Terminal conditions that end a match in the player's favour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinKind {
    /// Truck and Hunter centres came within the capture threshold.
    Capture,
    /// The Hunter had no free neighbouring tile for the trapped duration.
    Trapped,
}

/// Gates that can deny a queued Truck move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// The target tile is out of bounds or a city block.
    Blocked,
    /// The target is the intersection and the light denies that axis.
    RedLight,
    /// An NPC occupies the target tile or is already transitioning into it.
    Occupied,
}

/// Unique identifier assigned to an NPC traffic car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NpcId(u32);

impl NpcId {
    /// Creates a new NPC identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Visual appearance applied to an NPC traffic car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NpcColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl NpcColor {
    /// Creates a new car colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Interpolated centre of an agent expressed in pixel units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    /// Horizontal pixel coordinate.
    pub x: f32,
    /// Vertical pixel coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Immutable representation of the Truck's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruckSnapshot {
    /// Tile the Truck occupies, or is departing from while transitioning.
    pub tile: TileCoord,
    /// Direction the Truck currently faces.
    pub facing: Direction,
    /// Fraction travelled toward the committed target tile, in `[0, 1)`.
    pub progress: f32,
    /// Whether the Truck is mid-transition.
    pub moving: bool,
    /// Committed target tile, valid only while moving.
    pub target: Option<TileCoord>,
    /// Interpolated centre in pixel units.
    pub center: Position,
    /// Time remaining in the current stop-sign stall.
    pub stall_remaining: Duration,
}

/// Immutable representation of the Hunter's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HunterSnapshot {
    /// Tile the Hunter occupies, or is departing from while transitioning.
    pub tile: TileCoord,
    /// Direction the Hunter currently faces.
    pub facing: Direction,
    /// Fraction travelled toward the committed target tile, in `[0, 1)`.
    pub progress: f32,
    /// Whether the Hunter is mid-transition.
    pub moving: bool,
    /// Interpolated centre in pixel units.
    pub center: Position,
    /// Behavioural mode currently active.
    pub mode: HunterMode,
    /// Direction of the last committed step, if any.
    pub last_direction: Option<Direction>,
}

/// Immutable representation of a single NPC's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NpcSnapshot {
    /// Unique identifier assigned to the NPC.
    pub id: NpcId,
    /// Tile the NPC occupies, or is departing from while transitioning.
    pub tile: TileCoord,
    /// Direction the NPC currently faces.
    pub facing: Direction,
    /// Fraction travelled toward the committed target tile, in `[0, 1)`.
    pub progress: f32,
    /// Whether the NPC is mid-transition.
    pub moving: bool,
    /// Committed target tile, valid only while moving.
    pub target: Option<TileCoord>,
    /// Interpolated centre in pixel units.
    pub center: Position,
    /// Appearance assigned to the car.
    pub color: NpcColor,
    /// Direction of the last committed step, if any.
    pub last_direction: Option<Direction>,
}

/// Read-only snapshot describing all NPC traffic cars.
#[derive(Clone, Debug, Default)]
pub struct NpcView {
    snapshots: Vec<NpcSnapshot>,
}

impl NpcView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<NpcSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &NpcSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a snapshot by NPC identifier.
    #[must_use]
    pub fn get(&self, npc_id: NpcId) -> Option<&NpcSnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.id == npc_id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<NpcSnapshot> {
        self.snapshots
    }
}
