//! Broad-phase collision detection using a spatial hash

use std::collections::HashMap;

use tracing::trace;

use crate::body::BodyType;
use crate::config::BroadphaseConfig;
use crate::types::Aabb;

/// What the broadphase needs to know about one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadphaseProxy {
    pub aabb: Aabb,
    pub body_type: BodyType,
    pub sleeping: bool,
}

/// Grid occupancy from the last rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadphaseStats {
    pub occupied_cells: usize,
    pub total_entries: usize,
    pub huge_bodies: usize,
    pub pairs: usize,
}

/// Uniform grid keyed by integer cell coordinate, rebuilt every step.
///
/// Bodies spanning more than `huge_cell_threshold` cells (or with unbounded
/// boxes, like planes) skip the grid and are tested against every body.
/// Buffers are kept between rebuilds.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    huge_cell_threshold: usize,
    cells: HashMap<(i32, i32), Vec<u32>>,
    occupied: Vec<(i32, i32)>,
    huge: Vec<u32>,
    pairs: Vec<(usize, usize)>,
    stats: BroadphaseStats,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(&BroadphaseConfig::default())
    }
}

impl SpatialHash {
    #[must_use]
    pub fn new(config: &BroadphaseConfig) -> Self {
        Self {
            cell_size: config.cell_size.max(f32::EPSILON),
            huge_cell_threshold: config.huge_cell_threshold,
            cells: HashMap::new(),
            occupied: Vec::new(),
            huge: Vec::new(),
            pairs: Vec::new(),
            stats: BroadphaseStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> BroadphaseStats {
        self.stats
    }

    #[must_use]
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Whether two bodies ever need a narrowphase test.
    #[must_use]
    pub fn can_pair(a: &BroadphaseProxy, b: &BroadphaseProxy) -> bool {
        let a_moves = a.body_type == BodyType::Dynamic;
        let b_moves = b.body_type == BodyType::Dynamic;
        if !a_moves && !b_moves {
            return false;
        }
        if a.sleeping && b.sleeping {
            return false;
        }
        let a_static = a.body_type == BodyType::Static;
        let b_static = b.body_type == BodyType::Static;
        !(a.sleeping && b_static || b.sleeping && a_static)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_range(&self, aabb: &Aabb) -> Option<(i32, i32, i32, i32)> {
        if !(aabb.min.is_finite() && aabb.max.is_finite()) {
            return None;
        }
        let inv = 1.0 / self.cell_size;
        let x0 = (aabb.min.x * inv).floor() as i32;
        let y0 = (aabb.min.y * inv).floor() as i32;
        let x1 = (aabb.max.x * inv).floor() as i32;
        let y1 = (aabb.max.y * inv).floor() as i32;
        let span = (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1);
        if span > i64::try_from(self.huge_cell_threshold).unwrap_or(i64::MAX) {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    /// Rebuild from `proxies` (indexed by position) and return the candidate
    /// pairs `(i, j)` with `i < j`, sorted ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn update(&mut self, proxies: &[BroadphaseProxy]) -> &[(usize, usize)] {
        for key in self.occupied.drain(..) {
            if let Some(cell) = self.cells.get_mut(&key) {
                cell.clear();
            }
        }
        if self.cells.len() > 1024 && self.cells.len() > 4 * proxies.len() {
            self.cells.retain(|_, cell| !cell.is_empty());
        }
        self.huge.clear();
        self.pairs.clear();

        let mut entries = 0;
        for (index, proxy) in proxies.iter().enumerate() {
            let Some((x0, y0, x1, y1)) = self.cell_range(&proxy.aabb) else {
                self.huge.push(index as u32);
                continue;
            };
            for x in x0..=x1 {
                for y in y0..=y1 {
                    let cell = self.cells.entry((x, y)).or_default();
                    if cell.is_empty() {
                        self.occupied.push((x, y));
                    }
                    cell.push(index as u32);
                    entries += 1;
                }
            }
        }

        for key in &self.occupied {
            let Some(cell) = self.cells.get(key) else {
                continue;
            };
            for (k, &i) in cell.iter().enumerate() {
                for &j in &cell[k + 1..] {
                    let (a, b) = (&proxies[i as usize], &proxies[j as usize]);
                    if Self::can_pair(a, b) && a.aabb.overlaps(&b.aabb) {
                        self.pairs.push((i as usize, j as usize));
                    }
                }
            }
        }

        for &h in &self.huge {
            let h = h as usize;
            for (other, proxy) in proxies.iter().enumerate() {
                if other == h {
                    continue;
                }
                if Self::can_pair(&proxies[h], proxy) && proxies[h].aabb.overlaps(&proxy.aabb) {
                    self.pairs.push((h.min(other), h.max(other)));
                }
            }
        }

        self.pairs.sort_unstable();
        self.pairs.dedup();

        self.stats = BroadphaseStats {
            occupied_cells: self.occupied.len(),
            total_entries: entries,
            huge_bodies: self.huge.len(),
            pairs: self.pairs.len(),
        };
        trace!(
            occupied_cells = self.stats.occupied_cells,
            total_entries = self.stats.total_entries,
            huge_bodies = self.stats.huge_bodies,
            pairs = self.stats.pairs,
            "broadphase rebuilt"
        );
        &self.pairs
    }
}
