//! Hex neighborhood masks.
//!
//! A mask is a `(2r+1) x (2r+1)` boolean window centred on a cell. It is
//! grown ring by ring from the center with two 3x3 adjacency templates that
//! alternate per mask column, matching the offset layout of the hex lattice:
//! even grid columns reach one row further "down" on their diagonals, odd
//! columns one row further "up".

use std::collections::HashMap;
use std::sync::Arc;

/// Adjacency template for destinations in an even grid column.
const EVEN_TEMPLATE: [[bool; 3]; 3] = [
    [true, true, true],
    [true, false, true],
    [false, true, false],
];

/// Adjacency template for destinations in an odd grid column.
const ODD_TEMPLATE: [[bool; 3]; 3] = [
    [false, true, false],
    [true, false, true],
    [true, true, true],
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    side: usize,
    cells: Vec<bool>,
    /// `(di, dj)` offsets of every set cell relative to the center.
    offsets: Vec<(isize, isize)>,
}

impl Mask {
    fn from_cells(radius: usize, cells: Vec<bool>) -> Self {
        let side = 2 * radius + 1;
        let r = radius as isize;
        let offsets = cells
            .iter()
            .enumerate()
            .filter(|&(_, &set)| set)
            .map(|(i, _)| ((i / side) as isize - r, (i % side) as isize - r))
            .collect();
        Self {
            side,
            cells,
            offsets,
        }
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.side + j]
    }

    #[inline]
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    pub fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Build the hex mask for `radius`.
///
/// `parity_even` selects which template the even mask columns use; the odd
/// mask columns use the other one. The center is cleared after expansion and
/// then set according to `include_center`.
pub fn build_mask(parity_even: bool, radius: usize, include_center: bool) -> Mask {
    let side = 2 * radius + 1;
    let mut cells = vec![false; side * side];
    cells[radius * side + radius] = true;

    for _ in 0..radius {
        let mut next = vec![false; side * side];
        for i in 0..side {
            for j in 0..side {
                let template = if (j % 2 == 0) == parity_even {
                    &EVEN_TEMPLATE
                } else {
                    &ODD_TEMPLATE
                };
                // 2-D convolution in "same" mode: out[i][j] gathers
                // in[i + 1 - a][j + 1 - b] for every set template cell (a, b).
                let mut reached = false;
                'template: for (a, row) in template.iter().enumerate() {
                    for (b, &set) in row.iter().enumerate() {
                        if !set {
                            continue;
                        }
                        let (Some(si), Some(sj)) =
                            ((i + 1).checked_sub(a), (j + 1).checked_sub(b))
                        else {
                            continue;
                        };
                        if si < side && sj < side && cells[si * side + sj] {
                            reached = true;
                            break 'template;
                        }
                    }
                }
                next[i * side + j] = reached;
            }
        }
        cells = next;
    }

    cells[radius * side + radius] = include_center;
    Mask::from_cells(radius, cells)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct MaskKey {
    parity_even: bool,
    radius: usize,
    include_center: bool,
}

/// Memoized masks keyed by `(parity, radius, include_center)`.
///
/// Owned by the neighbor counter rather than shared process-wide, so each
/// grid controls its own cache and tests can reset it.
#[derive(Debug, Default)]
pub struct MaskCache {
    entries: HashMap<MaskKey, Arc<Mask>>,
    hits: u64,
    misses: u64,
}

impl MaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a mask, building it on first use.
    pub fn get(&mut self, parity_even: bool, radius: usize, include_center: bool) -> Arc<Mask> {
        let key = MaskKey {
            parity_even,
            radius,
            include_center,
        };
        if let Some(mask) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(mask);
        }
        self.misses += 1;
        let mask = Arc::new(build_mask(parity_even, radius, include_center));
        self.entries.insert(key, Arc::clone(&mask));
        mask
    }

    /// Masks for even and odd source columns at `radius`.
    pub fn column_pair(&mut self, radius: usize, include_center: bool) -> (Arc<Mask>, Arc<Mask>) {
        let base_even = radius % 2 == 0;
        (
            self.get(base_even, radius, include_center),
            self.get(!base_even, radius, include_center),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation or the last `clear`.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
