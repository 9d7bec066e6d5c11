#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for pursuit adapters.
//!
//! Backends receive a declarative [`Scene`] built from a world snapshot and
//! draw it however they like; nothing in this crate touches a framebuffer.

use anyhow::Result as AnyResult;
use glam::Vec2;
use pursuit_core::{Direction, HunterMode, LightPhase, MatchPhase, TileKind, WinKind};
use pursuit_world::{query, World};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
///
/// Backends translate `steer` into a queued truck direction and
/// `start_action` into a match start or restart command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Travel direction requested by the player on this frame, if any.
    pub steer: Option<Direction>,
    /// Whether the adapter detected a start/restart press on this frame.
    pub start_action: bool,
}

/// Fill colors applied to each tile classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePalette {
    /// Fill used for neighbourhood road tiles.
    pub road: Color,
    /// Fill used for impassable city blocks.
    pub block: Color,
    /// Fill used for the arterial cross roads.
    pub arterial: Color,
    /// Fill used for the signal-controlled intersection tile.
    pub intersection: Color,
}

impl TilePalette {
    /// Palette matching the classic asphalt-and-parkland look.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            road: Color::from_rgb_u8(52, 56, 64),
            block: Color::from_rgb_u8(34, 102, 68),
            arterial: Color::from_rgb_u8(68, 72, 82),
            intersection: Color::from_rgb_u8(80, 84, 94),
        }
    }

    /// Fill color for the provided tile kind.
    #[must_use]
    pub const fn fill(&self, kind: TileKind) -> Color {
        match kind {
            TileKind::Road => self.road,
            TileKind::Block => self.block,
            TileKind::Arterial => self.arterial,
            TileKind::Intersection => self.intersection,
        }
    }
}

/// Describes the square tile grid that composes the city.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile expressed in world units.
    pub tile_length: f32,
    /// Tile fills in row-major order.
    pub fills: Vec<Color>,
    /// Positions of stop-sign markers expressed in world units.
    pub stop_signs: Vec<Vec2>,
}

impl TileGridPresentation {
    /// Calculates the total width of the grid.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Role a sprite plays in the chase, which decides how backends draw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentClass {
    /// The player-controlled tow truck.
    Truck,
    /// The evasive quarry.
    Hunter,
    /// Ambient traffic.
    Npc,
}

/// Moving agent rendered as an oriented sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSprite {
    /// Role of the agent within the chase.
    pub class: AgentClass,
    /// Interpolated centre of the agent in world units.
    pub center: Vec2,
    /// Direction the sprite faces.
    pub facing: Direction,
    /// Body fill color.
    pub color: Color,
}

/// Signal head drawn beside the intersection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalSprite {
    /// Centre of the intersection tile in world units.
    pub center: Vec2,
    /// Phase currently displayed.
    pub phase: LightPhase,
    /// Time left in the displayed phase.
    pub remaining: Duration,
}

/// Text-friendly status model rendered as an overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct HudModel {
    /// Lifecycle phase of the match.
    pub match_phase: MatchPhase,
    /// Match time accumulated while playing.
    pub elapsed: Duration,
    /// Remaining trapped countdown when the Hunter is cornered.
    pub trapped_countdown: Option<Duration>,
    /// Whether the Hunter is actively fleeing.
    pub hunter_fleeing: bool,
    /// Remaining stop-sign stall on the Truck, when stalled.
    pub stall_remaining: Option<Duration>,
    /// Condition that ended the match, once one has.
    pub outcome: Option<WinKind>,
    /// Banner text shown on the title screen.
    pub banner: &'static str,
}

/// Scene description combining the city grid, agents, signal and overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tile grid that composes the play area.
    pub tile_grid: TileGridPresentation,
    /// Agents currently visible, drawn in order.
    pub agents: Vec<AgentSprite>,
    /// Signal head at the arterial intersection.
    pub signal: SignalSprite,
    /// Status overlay content.
    pub hud: HudModel,
}

/// Builds a declarative scene from the provided world snapshot.
#[must_use]
pub fn build_scene(world: &World) -> Scene {
    let palette = TilePalette::classic();
    let map = query::map(world);
    let config = query::config(world);
    let tile_length = config.tile_length;

    let fills = map
        .tiles()
        .iter()
        .map(|kind| palette.fill(*kind))
        .collect();
    let stop_signs = map
        .stop_signs()
        .map(|tile| tile_center(tile.column(), tile.row(), tile_length))
        .collect();
    let tile_grid = TileGridPresentation {
        columns: map.columns(),
        rows: map.rows(),
        tile_length,
        fills,
        stop_signs,
    };

    let truck = query::truck(world);
    let hunter = query::hunter(world);
    let mut agents = Vec::new();
    for npc in query::npc_view(world).iter() {
        agents.push(AgentSprite {
            class: AgentClass::Npc,
            center: Vec2::new(npc.center.x, npc.center.y),
            facing: npc.facing,
            color: Color::from_rgb_u8(npc.color.red(), npc.color.green(), npc.color.blue()),
        });
    }
    agents.push(AgentSprite {
        class: AgentClass::Hunter,
        center: Vec2::new(hunter.center.x, hunter.center.y),
        facing: hunter.facing,
        color: Color::from_rgb_u8(0xcc, 0x33, 0xcc),
    });
    agents.push(AgentSprite {
        class: AgentClass::Truck,
        center: Vec2::new(truck.center.x, truck.center.y),
        facing: truck.facing,
        color: Color::from_rgb_u8(0xee, 0xdd, 0x33),
    });

    let light = query::light(world);
    let cross = map.intersection();
    let signal = SignalSprite {
        center: tile_center(cross.column(), cross.row(), tile_length),
        phase: light.phase(),
        remaining: light.remaining(),
    };

    let hud = HudModel {
        match_phase: query::match_phase(world),
        elapsed: query::elapsed(world),
        trapped_countdown: query::trapped_remaining(world),
        hunter_fleeing: hunter.mode == HunterMode::Flee,
        stall_remaining: (truck.stall_remaining > Duration::ZERO)
            .then_some(truck.stall_remaining),
        outcome: query::outcome(world),
        banner: query::welcome_banner(world),
    };

    Scene {
        tile_grid,
        agents,
        signal,
        hud,
    }
}

fn tile_center(column: u32, row: u32, tile_length: f32) -> Vec2 {
    Vec2::new(
        column as f32 * tile_length + tile_length / 2.0,
        row as f32 * tile_length + tile_length / 2.0,
    )
}

/// Rendering backend capable of presenting pursuit scenes.
///
/// No graphical backend ships in this workspace; windowed frontends live in
/// their own crates, implement this trait, and rebuild the scene each frame
/// through [`build_scene`].
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The `update_scene` closure receives the simulated frame delta and the
    /// input captured by the adapter, and replaces the scene before it is
    /// drawn.
    fn run<F>(self, scene: Scene, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}
