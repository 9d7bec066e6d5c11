//! Mobile agent state: shared interpolated motion plus per-class intent data.

use std::time::Duration;

use pursuit_core::{Direction, HunterMode, NpcColor, NpcId, Position, TileCoord};

/// Tile-to-tile interpolated motion shared by every agent class.
///
/// An agent is either stationary at `tile` or transitioning from `tile`
/// toward an adjacent `target` with `progress` in `[0, 1)`. Progress resets
/// to exactly zero at arrival and the tile snaps to the committed target.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Motion {
    pub(crate) tile: TileCoord,
    pub(crate) facing: Direction,
    pub(crate) progress: f32,
    pub(crate) target: Option<TileCoord>,
}

impl Motion {
    pub(crate) const fn at(tile: TileCoord, facing: Direction) -> Self {
        Self {
            tile,
            facing,
            progress: 0.0,
            target: None,
        }
    }

    pub(crate) const fn moving(&self) -> bool {
        self.target.is_some()
    }

    /// Commits a transition toward the target tile, turning to face it.
    pub(crate) fn begin(&mut self, target: TileCoord, facing: Direction) {
        self.target = Some(target);
        self.facing = facing;
        self.progress = 0.0;
    }

    /// Advances an in-flight transition, returning the arrival tile when the
    /// transition completes this tick.
    pub(crate) fn advance(&mut self, speed_tiles_per_sec: f32, dt: Duration) -> Option<TileCoord> {
        let target = self.target?;
        self.progress += speed_tiles_per_sec * dt.as_secs_f32();
        if self.progress >= 1.0 {
            self.tile = target;
            self.target = None;
            self.progress = 0.0;
            Some(target)
        } else {
            None
        }
    }

    /// Interpolated centre in pixel units for the provided tile edge length.
    pub(crate) fn center(&self, tile_length: f32) -> Position {
        let (dx, dy) = self.facing.offset();
        let (fx, fy) = if self.moving() {
            (dx as f32 * self.progress, dy as f32 * self.progress)
        } else {
            (0.0, 0.0)
        };
        Position::new(
            (self.tile.column() as f32 + fx) * tile_length + tile_length / 2.0,
            (self.tile.row() as f32 + fy) * tile_length + tile_length / 2.0,
        )
    }
}

/// Player-controlled pursuer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Truck {
    pub(crate) motion: Motion,
    /// Player intent latched between ticks; overwrite-latest.
    pub(crate) queued: Option<Direction>,
    /// Time remaining blocked at a stop sign.
    pub(crate) stall: Duration,
}

impl Truck {
    pub(crate) const fn spawn(tile: TileCoord) -> Self {
        Self {
            motion: Motion::at(tile, Direction::East),
            queued: None,
            stall: Duration::ZERO,
        }
    }
}

/// Autonomous evasive agent.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Hunter {
    pub(crate) motion: Motion,
    pub(crate) mode: HunterMode,
    pub(crate) last_direction: Option<Direction>,
    /// Set while the world awaits a steering decision for the idle Hunter.
    pub(crate) decision_pending: bool,
}

impl Hunter {
    pub(crate) const fn spawn(tile: TileCoord) -> Self {
        Self {
            motion: Motion::at(tile, Direction::South),
            mode: HunterMode::Wander,
            last_direction: None,
            decision_pending: false,
        }
    }

    /// Flags the Hunter as awaiting a decision; returns `true` when the flag
    /// was newly raised so callers emit the request event exactly once.
    pub(crate) fn mark_decision_needed(&mut self) -> bool {
        let was_pending = self.decision_pending;
        self.decision_pending = true;
        !was_pending
    }
}

/// Ambient traffic car.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Npc {
    pub(crate) id: NpcId,
    pub(crate) motion: Motion,
    pub(crate) last_direction: Option<Direction>,
    pub(crate) color: NpcColor,
    pub(crate) decision_pending: bool,
}

impl Npc {
    pub(crate) const fn spawn(id: NpcId, tile: TileCoord, color: NpcColor) -> Self {
        Self {
            id,
            motion: Motion::at(tile, Direction::East),
            last_direction: None,
            color,
            decision_pending: false,
        }
    }

    pub(crate) fn mark_decision_needed(&mut self) -> bool {
        let was_pending = self.decision_pending;
        self.decision_pending = true;
        !was_pending
    }
}
