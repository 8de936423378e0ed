//! Flat grid buffers for hexgene-life.
//!
//! Storage is a single contiguous buffer per plane:
//! - `Plane<T>`: one value per cell, indexed `x * height + y`
//! - `GenePlanes`: one binary layer per gene, indexed `(gene, x, y)`
//!
//! The second coordinate `y` is the grid column; its parity selects the hex
//! neighbor template.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Plane<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    /// Wrap an existing row-major buffer. Panics if the length does not match.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "plane buffer length does not match {width}x{height}"
        );
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        x * self.height + y
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl Plane<u8> {
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Fraction of non-zero cells.
    pub fn occupancy(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count_nonzero() as f64 / self.data.len() as f64
    }

    pub fn any(&self) -> bool {
        self.data.iter().any(|&v| v != 0)
    }

    /// Coordinates of every non-zero cell, in buffer order.
    pub fn active_coords(&self) -> Vec<(usize, usize)> {
        let height = self.height;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0)
            .map(|(i, _)| (i / height, i % height))
            .collect()
    }

    pub fn or_assign(&mut self, other: &Plane<u8>) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = ((*a != 0) | (b != 0)) as u8;
        }
    }

    pub fn and_assign(&mut self, other: &Plane<u8>) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = ((*a != 0) & (b != 0)) as u8;
        }
    }

    /// Clear every cell that is set in `other`.
    pub fn and_not_assign(&mut self, other: &Plane<u8>) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = ((*a != 0) & (b == 0)) as u8;
        }
    }
}

impl Plane<u16> {
    /// Binary plane of cells whose count is positive.
    pub fn positive(&self) -> Plane<u8> {
        Plane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&c| (c > 0) as u8).collect(),
        }
    }

    /// Zero every count where `alive` is zero.
    pub fn mask_by(&mut self, alive: &Plane<u8>) {
        debug_assert_eq!(self.data.len(), alive.data.len());
        for (c, &a) in self.data.iter_mut().zip(&alive.data) {
            if a == 0 {
                *c = 0;
            }
        }
    }
}

/// Binary gene layers, one `width x height` layer per gene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenePlanes {
    genes: usize,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GenePlanes {
    pub fn new(genes: usize, width: usize, height: usize) -> Self {
        Self {
            genes,
            width,
            height,
            data: vec![0; genes * width * height],
        }
    }

    #[inline]
    pub fn genes(&self) -> usize {
        self.genes
    }

    #[inline]
    fn layer_len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn layer(&self, gene: usize) -> &[u8] {
        let len = self.layer_len();
        &self.data[gene * len..(gene + 1) * len]
    }

    #[inline]
    pub fn layer_mut(&mut self, gene: usize) -> &mut [u8] {
        let len = self.layer_len();
        &mut self.data[gene * len..(gene + 1) * len]
    }

    #[inline]
    pub fn get(&self, gene: usize, x: usize, y: usize) -> bool {
        self.layer(gene)[x * self.height + y] != 0
    }

    #[inline]
    pub fn set(&mut self, gene: usize, x: usize, y: usize, expressed: bool) {
        let height = self.height;
        self.layer_mut(gene)[x * height + y] = expressed as u8;
    }

    /// OR a binary plane into one gene layer.
    pub fn or_layer(&mut self, gene: usize, extent: &Plane<u8>) {
        for (a, &b) in self.layer_mut(gene).iter_mut().zip(extent.as_slice()) {
            *a = ((*a != 0) | (b != 0)) as u8;
        }
    }

    /// Whether each gene is expressed anywhere on the grid.
    pub fn expressed(&self) -> Vec<bool> {
        (0..self.genes)
            .map(|g| self.layer(g).iter().any(|&v| v != 0))
            .collect()
    }

    pub fn population(&self, gene: usize) -> usize {
        self.layer(gene).iter().filter(|&&v| v != 0).count()
    }

    /// Owned copy of one gene layer.
    pub fn channel(&self, gene: usize) -> Plane<u8> {
        Plane::from_vec(self.width, self.height, self.layer(gene).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{GenePlanes, Plane};

    #[test]
    fn plane_indexing_is_column_fastest() {
        let mut plane = Plane::<u8>::new(3, 4);
        plane.set(1, 2, 1);
        assert_eq!(plane.as_slice()[1 * 4 + 2], 1);
        assert_eq!(plane.active_coords(), vec![(1, 2)]);
    }

    #[test]
    fn occupancy_counts_nonzero_cells() {
        let mut plane = Plane::<u8>::new(4, 5);
        assert_eq!(plane.occupancy(), 0.0);
        plane.set(0, 0, 1);
        plane.set(3, 4, 2);
        assert_eq!(plane.count_nonzero(), 2);
        assert!((plane.occupancy() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn in_bounds_rejects_negative_and_overflow() {
        let plane = Plane::<u8>::new(2, 3);
        assert!(plane.in_bounds(1, 2));
        assert!(!plane.in_bounds(-1, 0));
        assert!(!plane.in_bounds(2, 0));
        assert!(!plane.in_bounds(0, 3));
    }

    #[test]
    fn boolean_ops_normalise_to_zero_one() {
        let mut a = Plane::from_vec(1, 4, vec![0, 3, 0, 1]);
        let b = Plane::from_vec(1, 4, vec![0, 0, 5, 1]);
        let mut or = a.clone();
        or.or_assign(&b);
        assert_eq!(or.as_slice(), &[0, 1, 1, 1]);
        let mut and = a.clone();
        and.and_assign(&b);
        assert_eq!(and.as_slice(), &[0, 0, 0, 1]);
        a.and_not_assign(&b);
        assert_eq!(a.as_slice(), &[0, 1, 0, 0]);
    }

    #[test]
    fn counts_mask_and_threshold() {
        let mut counts = Plane::from_vec(1, 4, vec![0u16, 2, 3, 1]);
        let alive = Plane::from_vec(1, 4, vec![1u8, 1, 0, 1]);
        counts.mask_by(&alive);
        assert_eq!(counts.as_slice(), &[0, 2, 0, 1]);
        assert_eq!(counts.positive().as_slice(), &[0, 1, 0, 1]);
    }

    #[test]
    fn gene_layers_are_independent() {
        let mut genes = GenePlanes::new(3, 2, 2);
        genes.set(1, 1, 0, true);
        assert!(genes.get(1, 1, 0));
        assert!(!genes.get(0, 1, 0));
        assert!(!genes.get(2, 1, 0));
        assert_eq!(genes.expressed(), vec![false, true, false]);
        assert_eq!(genes.population(1), 1);
        assert_eq!(genes.channel(1).as_slice(), &[0, 0, 1, 0]);

        let extent = Plane::from_vec(2, 2, vec![1u8, 0, 0, 1]);
        genes.or_layer(2, &extent);
        assert_eq!(genes.channel(2).as_slice(), &[1, 0, 0, 1]);
        assert_eq!(genes.channel(1).as_slice(), &[0, 0, 1, 0]);
    }
}
