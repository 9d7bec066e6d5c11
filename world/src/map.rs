//! Procedural city generator and tile query surface.

use std::collections::{BTreeSet, VecDeque};

use pursuit_core::{Direction, TileCoord, TileKind};
use rand::Rng;

/// Attempts allowed before the generator accepts a disconnected grid.
const GENERATION_ATTEMPTS: u32 = 100;
/// Attempts allowed while carving dead-end corridors.
const CARVE_ATTEMPTS: u32 = 300;
/// Side length of the stamped city blocks, in tiles.
const BLOCK_SIZE: u32 = 3;
/// Lattice pitch between stamped blocks, in tiles.
const BLOCK_PITCH: u32 = 4;
/// Probability that a stamped block shifts one tile along an axis.
const JITTER_PROBABILITY: f64 = 0.3;
/// Margin between the arterial cross and the stop-sign quadrants.
const QUADRANT_MARGIN: u32 = 2;

/// Neighbour probe order shared by every query; matches the simulation's
/// historical east, west, south, north ordering.
const PROBE_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Immutable city layout generated once per match.
///
/// The full set of passable tiles always forms a single connected component
/// under 4-directional adjacency, except after the generator exhausts its
/// attempt budget, in which case the last grid is accepted as a documented
/// best-effort fallback.
#[derive(Clone, Debug)]
pub struct CityMap {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
    stop_signs: BTreeSet<TileCoord>,
    arterial_row: u32,
    arterial_column: u32,
}

impl CityMap {
    /// Generates a new city layout from the provided dimensions and RNG.
    pub(crate) fn generate<R: Rng>(
        columns: u32,
        rows: u32,
        dead_end_target: usize,
        rng: &mut R,
    ) -> Self {
        Self::generate_with(columns, rows, dead_end_target, rng, stamp_city)
    }

    /// Generation body with the stamping step injected, so tests can force
    /// the connectivity budget to run dry.
    fn generate_with<R, F>(
        columns: u32,
        rows: u32,
        dead_end_target: usize,
        rng: &mut R,
        mut stamp: F,
    ) -> Self
    where
        R: Rng,
        F: FnMut(u32, u32, u32, u32, &mut R) -> Vec<TileKind>,
    {
        let arterial_row = rows / 2;
        let arterial_column = columns / 2;

        let mut tiles = stamp(columns, rows, arterial_row, arterial_column, rng);
        let mut attempts = 1;
        while !is_connected(&tiles, columns, rows) && attempts < GENERATION_ATTEMPTS {
            tiles = stamp(columns, rows, arterial_row, arterial_column, rng);
            attempts += 1;
        }

        let mut map = Self {
            columns,
            rows,
            tiles,
            stop_signs: BTreeSet::new(),
            arterial_row,
            arterial_column,
        };
        map.carve_dead_ends(dead_end_target, rng);
        map.place_stop_signs(rng);
        map
    }

    /// Builds a fixed layout from ASCII rows for deterministic scenarios.
    ///
    /// `#` block, `.` road, `=` arterial, `+` intersection, `S` stop-signed
    /// road. Every row must have the same width. The arterial cross falls on
    /// the `+` tile when present and on the grid centre otherwise.
    #[cfg(any(test, feature = "scenario_scaffolding"))]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.len()) as u32;
        assert!(width > 0 && height > 0, "layout must be non-empty");

        let mut tiles = Vec::with_capacity((width * height) as usize);
        let mut stop_signs = BTreeSet::new();
        let mut cross = None;
        for (row_index, row) in rows.iter().enumerate() {
            assert_eq!(row.len() as u32, width, "ragged layout row {row_index}");
            for (column_index, glyph) in row.chars().enumerate() {
                let tile = TileCoord::new(column_index as u32, row_index as u32);
                let kind = match glyph {
                    '#' => TileKind::Block,
                    '.' => TileKind::Road,
                    '=' => TileKind::Arterial,
                    '+' => {
                        cross = Some(tile);
                        TileKind::Intersection
                    }
                    'S' => {
                        let _ = stop_signs.insert(tile);
                        TileKind::Road
                    }
                    other => panic!("unknown layout glyph {other:?}"),
                };
                tiles.push(kind);
            }
        }

        let cross = cross.unwrap_or_else(|| TileCoord::new(width / 2, height / 2));
        Self {
            columns: width,
            rows: height,
            tiles,
            stop_signs,
            arterial_row: cross.row(),
            arterial_column: cross.column(),
        }
    }

    /// Number of tile columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Row index of the horizontal arterial road.
    #[must_use]
    pub const fn arterial_row(&self) -> u32 {
        self.arterial_row
    }

    /// Column index of the vertical arterial road.
    #[must_use]
    pub const fn arterial_column(&self) -> u32 {
        self.arterial_column
    }

    /// Tile where the two arterial roads cross.
    #[must_use]
    pub const fn intersection(&self) -> TileCoord {
        TileCoord::new(self.arterial_column, self.arterial_row)
    }

    /// Classification of the provided tile, if it lies within the grid.
    #[must_use]
    pub fn kind(&self, tile: TileCoord) -> Option<TileKind> {
        index(self.columns, self.rows, tile).map(|offset| self.tiles[offset])
    }

    /// Dense row-major tile classifications, for presentation layers.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    /// Reports whether agents may occupy the provided tile.
    ///
    /// Out-of-bounds coordinates are simply not passable; agents probe
    /// adjacent-to-border tiles freely.
    #[must_use]
    pub fn is_passable(&self, tile: TileCoord) -> bool {
        self.kind(tile).is_some_and(TileKind::is_passable)
    }

    /// Reports whether the tile belongs to an arterial road or the crossing.
    #[must_use]
    pub fn is_arterial(&self, tile: TileCoord) -> bool {
        matches!(
            self.kind(tile),
            Some(TileKind::Arterial | TileKind::Intersection)
        )
    }

    /// Reports whether the tile is the signal-controlled intersection.
    #[must_use]
    pub fn is_intersection(&self, tile: TileCoord) -> bool {
        self.kind(tile) == Some(TileKind::Intersection)
    }

    /// Reports whether the tile carries a stop sign.
    #[must_use]
    pub fn is_stop_sign(&self, tile: TileCoord) -> bool {
        self.stop_signs.contains(&tile)
    }

    /// Stop-controlled tiles in deterministic order.
    pub fn stop_signs(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.stop_signs.iter().copied()
    }

    /// Enumerates the passable 4-neighbours of a tile, each annotated with
    /// the direction used to reach it.
    #[must_use]
    pub fn neighbors(&self, tile: TileCoord) -> NeighborIter {
        let mut neighbors = NeighborIter::default();
        for direction in PROBE_ORDER {
            if let Some(next) = tile.step(direction) {
                if self.is_passable(next) {
                    neighbors.push(next, direction);
                }
            }
        }
        neighbors
    }

    /// Number of passable 4-neighbours of the provided tile.
    #[must_use]
    pub fn passable_neighbor_count(&self, tile: TileCoord) -> usize {
        self.neighbors(tile).len()
    }

    /// Enumerates every tile classified as plain neighbourhood road.
    pub(crate) fn road_tiles(&self) -> Vec<TileCoord> {
        let mut tiles = Vec::new();
        for row in 0..self.rows {
            for column in 0..self.columns {
                let tile = TileCoord::new(column, row);
                if self.kind(tile) == Some(TileKind::Road) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    fn set_kind(&mut self, tile: TileCoord, kind: TileKind) {
        if let Some(offset) = index(self.columns, self.rows, tile) {
            self.tiles[offset] = kind;
        }
    }

    fn dead_end_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.rows {
            for column in 0..self.columns {
                let tile = TileCoord::new(column, row);
                if self.kind(tile) == Some(TileKind::Road)
                    && self.passable_neighbor_count(tile) == 1
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Converts corridor tips into dead ends until the target count is met.
    ///
    /// Each attempt provisionally blocks one candidate tile and keeps the
    /// change only while global connectivity holds; border and arterial-axis
    /// tiles are never blocked.
    fn carve_dead_ends<R: Rng>(&mut self, target: usize, rng: &mut R) {
        let mut attempts = 0;
        while self.dead_end_count() < target && attempts < CARVE_ATTEMPTS {
            attempts += 1;

            let candidates = self.corridor_tips();
            if candidates.is_empty() {
                break;
            }

            let pick = candidates[rng.gen_range(0..candidates.len())];
            if pick.column() == 0
                || pick.column() == self.columns - 1
                || pick.row() == 0
                || pick.row() == self.rows - 1
            {
                continue;
            }
            if pick.column() == self.arterial_column || pick.row() == self.arterial_row {
                continue;
            }
            if self.kind(pick) != Some(TileKind::Road) {
                continue;
            }

            self.set_kind(pick, TileKind::Block);
            if !is_connected(&self.tiles, self.columns, self.rows) {
                self.set_kind(pick, TileKind::Road);
            }
        }
    }

    /// Road tiles adjacent to an interior road tile that have exactly two
    /// passable neighbours; blocking one creates a dead end.
    fn corridor_tips(&self) -> Vec<TileCoord> {
        let mut candidates = Vec::new();
        for row in 1..self.rows.saturating_sub(1) {
            for column in 1..self.columns.saturating_sub(1) {
                let tile = TileCoord::new(column, row);
                if self.kind(tile) != Some(TileKind::Road) {
                    continue;
                }
                for (neighbor, _) in self.neighbors(tile) {
                    if self.kind(neighbor) != Some(TileKind::Road) {
                        continue;
                    }
                    if self.passable_neighbor_count(neighbor) == 2 {
                        candidates.push(neighbor);
                        break;
                    }
                }
            }
        }
        candidates
    }

    /// Marks one true junction per neighbourhood quadrant as stop-controlled.
    fn place_stop_signs<R: Rng>(&mut self, rng: &mut R) {
        for (row_range, column_range) in self.quadrants() {
            let mut candidates = Vec::new();
            for row in row_range.clone() {
                for column in column_range.clone() {
                    let tile = TileCoord::new(column, row);
                    if self.kind(tile) == Some(TileKind::Road)
                        && self.passable_neighbor_count(tile) >= 3
                    {
                        candidates.push(tile);
                    }
                }
            }
            if !candidates.is_empty() {
                let pick = candidates[rng.gen_range(0..candidates.len())];
                let _ = self.stop_signs.insert(pick);
            }
        }
    }

    /// The four neighbourhood regions bounded by the arterial cross with a
    /// two-tile margin, as inclusive-exclusive row and column ranges.
    fn quadrants(&self) -> [(std::ops::Range<u32>, std::ops::Range<u32>); 4] {
        let top = QUADRANT_MARGIN..self.arterial_row.saturating_sub(QUADRANT_MARGIN - 1);
        let bottom =
            (self.arterial_row + QUADRANT_MARGIN)..self.rows.saturating_sub(QUADRANT_MARGIN);
        let left = QUADRANT_MARGIN..self.arterial_column.saturating_sub(QUADRANT_MARGIN - 1);
        let right =
            (self.arterial_column + QUADRANT_MARGIN)..self.columns.saturating_sub(QUADRANT_MARGIN);

        [
            (top.clone(), left.clone()),
            (top, right.clone()),
            (bottom.clone(), left),
            (bottom, right),
        ]
    }
}

/// Passable-neighbour enumeration with the offsets used to reach each tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeighborIter {
    buffer: [Option<(TileCoord, Direction)>; 4],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, tile: TileCoord, direction: Direction) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some((tile, direction));
            self.len += 1;
        }
    }

    /// Number of passable neighbours captured.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether no passable neighbour exists.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for NeighborIter {
    type Item = (TileCoord, Direction);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Lays out one candidate grid: jittered block stamps, the arterial cross,
/// and a guaranteed-passable border.
fn stamp_city<R: Rng>(
    columns: u32,
    rows: u32,
    arterial_row: u32,
    arterial_column: u32,
    rng: &mut R,
) -> Vec<TileKind> {
    let capacity = (columns as usize) * (rows as usize);
    let mut tiles = vec![TileKind::Road; capacity];
    let at = |column: u32, row: u32| -> usize {
        (row as usize) * (columns as usize) + (column as usize)
    };

    let mut row = 1;
    while row + BLOCK_SIZE < rows {
        let mut column = 1;
        while column + BLOCK_SIZE < columns {
            let row_jitter = u32::from(rng.gen_bool(JITTER_PROBABILITY));
            let column_jitter = u32::from(rng.gen_bool(JITTER_PROBABILITY));
            let row_origin = row + row_jitter;
            let column_origin = column + column_jitter;

            for r in row_origin..(row_origin + BLOCK_SIZE).min(rows - 1) {
                for c in column_origin..(column_origin + BLOCK_SIZE).min(columns - 1) {
                    let offset = at(c, r);
                    tiles[offset] = TileKind::Block;
                }
            }
            column += BLOCK_PITCH;
        }
        row += BLOCK_PITCH;
    }

    // Arterial roads always win over stamped blocks.
    for column in 0..columns {
        let offset = at(column, arterial_row);
        tiles[offset] = TileKind::Arterial;
    }
    for row in 0..rows {
        let offset = at(arterial_column, row);
        tiles[offset] = TileKind::Arterial;
    }
    let crossing = at(arterial_column, arterial_row);
    tiles[crossing] = TileKind::Intersection;

    // Keep the outer border traversable.
    for column in 0..columns {
        for row in [0, rows - 1] {
            let offset = at(column, row);
            if tiles[offset] == TileKind::Block {
                tiles[offset] = TileKind::Road;
            }
        }
    }
    for row in 0..rows {
        for column in [0, columns - 1] {
            let offset = at(column, row);
            if tiles[offset] == TileKind::Block {
                tiles[offset] = TileKind::Road;
            }
        }
    }

    tiles
}

/// Reports whether all passable tiles form one connected component.
fn is_connected(tiles: &[TileKind], columns: u32, rows: u32) -> bool {
    let mut passable_count = 0;
    let mut start = None;
    for row in 0..rows {
        for column in 0..columns {
            let tile = TileCoord::new(column, row);
            if let Some(offset) = index(columns, rows, tile) {
                if tiles[offset].is_passable() {
                    passable_count += 1;
                    if start.is_none() {
                        start = Some(tile);
                    }
                }
            }
        }
    }

    let Some(start) = start else {
        return false;
    };

    let mut visited = vec![false; tiles.len()];
    let mut queue = VecDeque::new();
    if let Some(offset) = index(columns, rows, start) {
        visited[offset] = true;
    }
    queue.push_back(start);
    let mut reached = 1;

    while let Some(tile) = queue.pop_front() {
        for direction in PROBE_ORDER {
            let Some(next) = tile.step(direction) else {
                continue;
            };
            let Some(offset) = index(columns, rows, next) else {
                continue;
            };
            if !tiles[offset].is_passable() || visited[offset] {
                continue;
            }
            visited[offset] = true;
            reached += 1;
            queue.push_back(next);
        }
    }

    reached == passable_count
}

fn index(columns: u32, rows: u32, tile: TileCoord) -> Option<usize> {
    if tile.column() < columns && tile.row() < rows {
        let row = usize::try_from(tile.row()).ok()?;
        let column = usize::try_from(tile.column()).ok()?;
        let width = usize::try_from(columns).ok()?;
        Some(row * width + column)
    } else {
        None
    }
}
