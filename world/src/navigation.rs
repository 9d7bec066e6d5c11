//! Breadth-first hop-distance service over the city's passability graph.

use std::collections::VecDeque;

use pursuit_core::TileCoord;

use crate::map::CityMap;

const UNREACHED: u16 = u16::MAX;

/// Dense hop-distance grid seeded from a single source tile.
///
/// Distances are whole tile-steps over the passability graph. Unreachable
/// tiles (and the optional excluded tile) report no distance, so callers
/// supply their own "very far" fallback. The field is a pure function of the
/// map and source; it must be traced afresh whenever the source moves.
#[derive(Clone, Debug)]
pub struct DistanceField {
    columns: u32,
    rows: u32,
    distances: Vec<u16>,
}

impl DistanceField {
    /// Runs a breadth-first search from `source`, optionally excluding one
    /// tile from traversal.
    ///
    /// The excluded tile is never entered, so it also reports no distance;
    /// the search still covers every route around it.
    #[must_use]
    pub fn trace(map: &CityMap, source: TileCoord, blocked: Option<TileCoord>) -> Self {
        let columns = map.columns();
        let rows = map.rows();
        let capacity = (columns as usize) * (rows as usize);
        let mut field = Self {
            columns,
            rows,
            distances: vec![UNREACHED; capacity],
        };

        if !map.is_passable(source) {
            return field;
        }

        let Some(source_index) = field.index(source) else {
            return field;
        };
        field.distances[source_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);

        while let Some(tile) = queue.pop_front() {
            let Some(current_index) = field.index(tile) else {
                continue;
            };
            let current = field.distances[current_index];
            if current >= UNREACHED - 1 {
                continue;
            }
            let next_distance = current + 1;

            for (neighbor, _) in map.neighbors(tile) {
                if blocked == Some(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = field.index(neighbor) else {
                    continue;
                };
                if field.distances[neighbor_index] <= next_distance {
                    continue;
                }
                field.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }

        field
    }

    /// Hop distance from the source to the provided tile.
    ///
    /// Returns `None` for out-of-bounds coordinates and for tiles the search
    /// never reached.
    #[must_use]
    pub fn distance(&self, tile: TileCoord) -> Option<u16> {
        let offset = self.index(tile)?;
        let distance = self.distances[offset];
        (distance != UNREACHED).then_some(distance)
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.column() < self.columns && tile.row() < self.rows {
            let row = usize::try_from(tile.row()).ok()?;
            let column = usize::try_from(tile.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
