//! Neighbor-count kernels for hexgene-life.
//!
//! Two backends compute the same thing, the number of active cells within a
//! hex radius of every cell:
//! - dense: gathers over the full grid, one output row at a time
//! - sparse: scatters a mask around each active source cell
//!
//! `NeighborCounter` picks between them by occupancy unless a backend is
//! forced, and owns the mask cache.

use std::sync::Arc;

use rayon::prelude::*;

use super::mask::{Mask, MaskCache};
use super::plane::Plane;

/// Below this fraction of non-zero cells the sparse kernel is used.
pub const SPARSE_OCCUPANCY_THRESHOLD: f64 = 0.10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelBackend {
    Dense,
    Sparse,
}

/// Dense kernel over the output rows `first_row..first_row + rows`.
///
/// Equivalent to convolving the even-column and odd-column sub-grids with
/// their own masks and summing: the output at `(x, y)` gathers every source
/// `(x - di, y - dj)` whose column-parity mask contains `(di, dj)`.
#[inline]
fn dense_rows(
    src: &Plane<u8>,
    even: &Mask,
    odd: &Mask,
    first_row: usize,
    out_rows: &mut [u16],
) {
    let width = src.width() as isize;
    let height = src.height();
    let cells = src.as_slice();

    for (row_offset, out_row) in out_rows.chunks_mut(height).enumerate() {
        let x = (first_row + row_offset) as isize;
        for (y, out) in out_row.iter_mut().enumerate() {
            let y = y as isize;
            let mut acc = 0u16;
            for (mask, source_parity) in [(even, 0isize), (odd, 1isize)] {
                for &(di, dj) in mask.offsets() {
                    let sy = y - dj;
                    if sy < 0 || sy >= height as isize || (sy & 1) != source_parity {
                        continue;
                    }
                    let sx = x - di;
                    if sx < 0 || sx >= width {
                        continue;
                    }
                    acc = acc.saturating_add(cells[sx as usize * height + sy as usize] as u16);
                }
            }
            *out = acc;
        }
    }
}

/// Dense neighbor count, optionally splitting rows across `pool`.
pub fn count_dense(
    src: &Plane<u8>,
    even: &Mask,
    odd: &Mask,
    pool: Option<&rayon::ThreadPool>,
) -> Plane<u16> {
    let mut out = Plane::<u16>::new(src.width(), src.height());
    let height = src.height();
    match pool {
        Some(pool) if src.width() > 1 => {
            pool.install(|| {
                out.as_mut_slice()
                    .par_chunks_mut(height)
                    .enumerate()
                    .for_each(|(x, row)| dense_rows(src, even, odd, x, row));
            });
        }
        _ => dense_rows(src, even, odd, 0, out.as_mut_slice()),
    }
    out
}

/// Scatter the column-parity mask around each source cell.
fn scatter(src: &Plane<u8>, even: &Mask, odd: &Mask, sources: &[(usize, usize)]) -> Plane<u16> {
    let mut out = Plane::<u16>::new(src.width(), src.height());
    let width = src.width() as isize;
    let height = src.height() as isize;
    let h = src.height();
    let cells = src.as_slice();
    let acc = out.as_mut_slice();

    for &(x, y) in sources {
        let value = cells[x * h + y] as u16;
        let mask = if y % 2 == 0 { even } else { odd };
        for &(di, dj) in mask.offsets() {
            let tx = x as isize + di;
            let ty = y as isize + dj;
            if tx < 0 || ty < 0 || tx >= width || ty >= height {
                continue;
            }
            let slot = &mut acc[tx as usize * h + ty as usize];
            *slot = slot.saturating_add(value);
        }
    }
    out
}

/// Sparse neighbor count.
///
/// With `candidates`, only the in-bounds, non-zero, first occurrences of
/// those coordinates are used as sources; otherwise the grid is scanned.
pub fn count_sparse(
    src: &Plane<u8>,
    even: &Mask,
    odd: &Mask,
    candidates: Option<&[(usize, usize)]>,
) -> Plane<u16> {
    let sources = match candidates {
        Some(candidates) => filter_candidates(src, candidates),
        None => src.active_coords(),
    };
    scatter(src, even, odd, &sources)
}

fn filter_candidates(src: &Plane<u8>, candidates: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut seen = vec![0u64; src.len().div_ceil(64)];
    let mut sources = Vec::with_capacity(candidates.len());
    for &(x, y) in candidates {
        if x >= src.width() || y >= src.height() {
            continue;
        }
        let i = src.index(x, y);
        let word = i >> 6;
        let bit = 1u64 << (i & 63);
        if seen[word] & bit != 0 {
            continue;
        }
        seen[word] |= bit;
        if src.as_slice()[i] != 0 {
            sources.push((x, y));
        }
    }
    sources
}

/// Largest radius that still changes a count on `src`.
#[inline]
fn max_radius(src: &Plane<u8>) -> usize {
    src.width() + src.height()
}

/// Adaptive neighbor counter with its own mask cache.
pub struct NeighborCounter {
    masks: MaskCache,
    forced: Option<KernelBackend>,
    sparse_threshold: f64,
    pool: Option<rayon::ThreadPool>,
}

impl Default for NeighborCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl NeighborCounter {
    pub fn new() -> Self {
        Self {
            masks: MaskCache::new(),
            forced: None,
            sparse_threshold: SPARSE_OCCUPANCY_THRESHOLD,
            pool: None,
        }
    }

    /// Force one backend for every call that has no candidate list.
    pub fn with_backend(mut self, backend: Option<KernelBackend>) -> Self {
        self.forced = backend;
        self
    }

    pub fn with_sparse_threshold(mut self, threshold: f64) -> Self {
        self.sparse_threshold = threshold;
        self
    }

    /// Split dense rows across `pool`.
    pub fn with_pool(mut self, pool: Option<rayon::ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Use an existing mask cache.
    pub fn with_mask_cache(mut self, masks: MaskCache) -> Self {
        self.masks = masks;
        self
    }

    pub fn mask_cache(&self) -> &MaskCache {
        &self.masks
    }

    pub fn mask_cache_mut(&mut self) -> &mut MaskCache {
        &mut self.masks
    }

    /// Mask pair for `radius`, capped at `width + height`. No two cells of
    /// `src` are further apart than that, so larger radii count the same.
    fn masks_for(
        &mut self,
        src: &Plane<u8>,
        radius: usize,
        include_center: bool,
    ) -> (Arc<Mask>, Arc<Mask>) {
        let radius = radius.min(max_radius(src));
        self.masks.column_pair(radius, include_center)
    }

    /// Backend the adaptive policy would pick for `src`.
    pub fn select_backend(&self, src: &Plane<u8>, has_candidates: bool) -> KernelBackend {
        if has_candidates {
            return KernelBackend::Sparse;
        }
        if let Some(backend) = self.forced {
            return backend;
        }
        if src.occupancy() < self.sparse_threshold {
            KernelBackend::Sparse
        } else {
            KernelBackend::Dense
        }
    }

    /// Count active cells within `radius` of every cell.
    pub fn count(
        &mut self,
        src: &Plane<u8>,
        radius: usize,
        include_center: bool,
        candidates: Option<&[(usize, usize)]>,
    ) -> Plane<u16> {
        let backend = self.select_backend(src, candidates.is_some());
        log::trace!(
            "neighbor count r={radius} center={include_center} backend={backend:?} candidates={}",
            candidates.map_or(0, <[_]>::len)
        );
        match backend {
            KernelBackend::Dense => self.count_dense(src, radius, include_center),
            KernelBackend::Sparse => self.count_sparse(src, radius, include_center, candidates),
        }
    }

    pub fn count_dense(
        &mut self,
        src: &Plane<u8>,
        radius: usize,
        include_center: bool,
    ) -> Plane<u16> {
        let (even, odd) = self.masks_for(src, radius, include_center);
        count_dense(src, &even, &odd, self.pool.as_ref())
    }

    pub fn count_sparse(
        &mut self,
        src: &Plane<u8>,
        radius: usize,
        include_center: bool,
        candidates: Option<&[(usize, usize)]>,
    ) -> Plane<u16> {
        let (even, odd) = self.masks_for(src, radius, include_center);
        count_sparse(src, &even, &odd, candidates)
    }
}
