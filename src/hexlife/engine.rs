use std::path::Path;
use std::sync::Arc;

use super::error::{HexLifeError, Result};
use super::kernel::{KernelBackend, NeighborCounter, SPARSE_OCCUPANCY_THRESHOLD};
use super::mask::MaskCache;
use super::parse::{read_rules_file, read_seeds_file};
use super::plane::{GenePlanes, Plane};
use super::rules::{RuleSet, RuleTarget};

/// A cell to bring to life at bootstrap, with the genes it starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedCell {
    pub x: i64,
    pub y: i64,
    pub active_genes: Vec<usize>,
}

impl SeedCell {
    pub fn new(x: i64, y: i64, active_genes: &[usize]) -> Self {
        Self {
            x,
            y,
            active_genes: active_genes.to_vec(),
        }
    }
}

/// What bootstrap does with a seed outside the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutOfBoundsPolicy {
    /// Drop the seed, log a warning and record it in `dropped_seeds`.
    #[default]
    Skip,
    /// Fail bootstrap with `HexLifeError::SeedOutOfBounds`.
    Reject,
}

/// Configuration for a CellGrid instance.
///
/// Use `HexLifeConfig::default()` for the adaptive single-threaded engine,
/// or customise individual knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct HexLifeConfig {
    /// Neighbor-count backend.
    /// `None` means adaptive: sparse below the occupancy threshold, dense
    /// above it. Calls with a candidate list are always sparse.
    pub kernel: Option<KernelBackend>,
    /// Occupancy below which the adaptive policy goes sparse.
    /// `None` means `SPARSE_OCCUPANCY_THRESHOLD`.
    pub sparse_threshold: Option<f64>,
    /// Threads for the dense kernel's row split.
    /// `None` or 1 keeps every generation on the calling thread.
    pub thread_count: Option<usize>,
    /// Handling of seeds outside the grid.
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl HexLifeConfig {
    /// Force a specific neighbor-count backend.
    pub fn kernel(mut self, backend: KernelBackend) -> Self {
        self.kernel = Some(backend);
        self
    }

    /// Set the occupancy threshold for the adaptive policy.
    pub fn sparse_threshold(mut self, threshold: f64) -> Self {
        self.sparse_threshold = Some(threshold.clamp(0.0, 1.0));
        self
    }

    /// Set an explicit thread count for the dense kernel.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    pub fn out_of_bounds(mut self, policy: OutOfBoundsPolicy) -> Self {
        self.out_of_bounds = policy;
        self
    }
}

fn build_counter(config: &HexLifeConfig) -> Result<NeighborCounter> {
    let threads = config.thread_count.unwrap_or(1).max(1);
    let pool = if threads > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?,
        )
    } else {
        None
    };
    Ok(NeighborCounter::new()
        .with_backend(config.kernel)
        .with_sparse_threshold(config.sparse_threshold.unwrap_or(SPARSE_OCCUPANCY_THRESHOLD))
        .with_pool(pool))
}

/// Hex-grid automaton carrying cell life and gene expression.
///
/// Cells only ever go from dead to alive. Gene expression is recomputed
/// from the rules every generation.
pub struct CellGrid {
    width: usize,
    height: usize,
    genes: usize,
    gene_names: Vec<String>,
    rules: Arc<RuleSet>,
    cell_status: Plane<u8>,
    gene_content: GenePlanes,
    counter: NeighborCounter,
    generation: u64,
    dropped_seeds: Vec<SeedCell>,
}

impl CellGrid {
    /// Bootstrap a grid from a rule set and seed cells.
    ///
    /// In-bounds seeds become alive with their genes expressed, then one
    /// propagation phase runs, so generation 0 already reflects diffusion.
    pub fn new(
        rules: impl Into<Arc<RuleSet>>,
        seeds: &[SeedCell],
        width: usize,
        height: usize,
        genes: usize,
        config: HexLifeConfig,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(HexLifeError::EmptyGrid { width, height });
        }
        if genes == 0 {
            return Err(HexLifeError::NoGenes);
        }
        let rules = rules.into();
        rules.validate(genes)?;

        let mut grid = Self {
            width,
            height,
            genes,
            gene_names: (0..genes).map(|g| format!("gene_{g}")).collect(),
            rules,
            cell_status: Plane::new(width, height),
            gene_content: GenePlanes::new(genes, width, height),
            counter: build_counter(&config)?,
            generation: 0,
            dropped_seeds: Vec::new(),
        };
        grid.plant(seeds, config.out_of_bounds)?;
        grid.propagate_genes();
        Ok(grid)
    }

    /// Read a rule file and a seed file and bootstrap from them.
    ///
    /// The gene count is the number of gene lines in the rule file, at
    /// least one.
    pub fn from_files(
        rules_path: impl AsRef<Path>,
        cells_path: impl AsRef<Path>,
        width: usize,
        height: usize,
        config: HexLifeConfig,
    ) -> Result<Self> {
        let rules = read_rules_file(rules_path)?;
        let seeds = read_seeds_file(cells_path)?;
        let genes = rules.gene_lines().max(1);
        Self::new(rules, &seeds, width, height, genes, config)
    }

    fn plant(&mut self, seeds: &[SeedCell], policy: OutOfBoundsPolicy) -> Result<()> {
        for seed in seeds {
            if let Some(gene) = seed.active_genes.iter().copied().find(|&g| g >= self.genes) {
                return Err(HexLifeError::GeneOutOfRange {
                    gene,
                    genes: self.genes,
                });
            }
            if !self.cell_status.in_bounds(seed.x, seed.y) {
                match policy {
                    OutOfBoundsPolicy::Reject => {
                        return Err(HexLifeError::SeedOutOfBounds {
                            x: seed.x,
                            y: seed.y,
                            width: self.width,
                            height: self.height,
                        });
                    }
                    OutOfBoundsPolicy::Skip => {
                        log::warn!(
                            "dropping seed ({}, {}) outside the {}x{} grid",
                            seed.x,
                            seed.y,
                            self.width,
                            self.height
                        );
                        self.dropped_seeds.push(seed.clone());
                        continue;
                    }
                }
            }
            let (x, y) = (seed.x as usize, seed.y as usize);
            self.cell_status.set(x, y, 1);
            for &gene in &seed.active_genes {
                self.gene_content.set(gene, x, y, true);
            }
        }
        Ok(())
    }

    /// Replace the default `gene_<i>` names.
    pub fn with_gene_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.genes {
            return Err(HexLifeError::GeneNamesLength {
                expected: self.genes,
                got: names.len(),
            });
        }
        self.gene_names = names;
        Ok(self)
    }

    /// Birth phase: dead cells near life that satisfy any birth rule come
    /// alive. Returns the number of newborn cells.
    pub fn create_alive_cells(&mut self) -> usize {
        if self.rules.alive_rules().is_empty() {
            return 0;
        }

        let neighbor_counts = self.counter.count(&self.cell_status, 1, false, None);
        let mut potential = self
            .counter
            .count(&self.cell_status, 1, true, None)
            .positive();
        potential.or_assign(&self.cell_status);

        let mut newborn = Plane::<u8>::new(self.width, self.height);
        for rule in self.rules.alive_rules() {
            newborn.or_assign(&rule.evaluate(&self.gene_content, &neighbor_counts, &potential));
        }
        newborn.and_not_assign(&self.cell_status);

        let born = newborn.count_nonzero();
        self.cell_status.or_assign(&newborn);
        log::debug!("generation {}: {born} cells born", self.generation + 1);
        born
    }

    /// Propagation phase: recompute every gene layer from the gene rules.
    pub fn propagate_genes(&mut self) {
        // Dead cells report no neighbors, so `n(k)` gates never match them.
        let mut neighbor_counts = self.counter.count(&self.cell_status, 1, false, None);
        neighbor_counts.mask_by(&self.cell_status);

        let expressed = self.gene_content.expressed();
        // Rule output is restricted to living cells, so they bound every
        // diffusion source below.
        let alive_coords = self.cell_status.active_coords();
        let mut next_genes = GenePlanes::new(self.genes, self.width, self.height);

        for rule in self.rules.gene_rules() {
            let RuleTarget::Gene(target) = rule.target else {
                continue;
            };
            if !rule.can_fire(&expressed) {
                continue;
            }

            let mut applicable =
                rule.evaluate(&self.gene_content, &neighbor_counts, &self.cell_status);
            applicable.and_assign(&self.cell_status);
            if !applicable.any() {
                continue;
            }

            let mut extent = self
                .counter
                .count(&applicable, rule.diffusion_radius, true, Some(&alive_coords))
                .positive();
            extent.or_assign(&applicable);
            next_genes.or_layer(target, &extent);
        }

        self.gene_content = next_genes;
        log::debug!(
            "generation {}: {} of {} genes expressed",
            self.generation,
            self.gene_content.expressed().iter().filter(|&&e| e).count(),
            self.genes
        );
    }

    /// Advance one generation: birth, then propagation.
    pub fn update(&mut self) {
        self.create_alive_cells();
        self.generation += 1;
        self.propagate_genes();
    }

    pub fn update_n(&mut self, n: u64) {
        for _ in 0..n {
            self.update();
        }
    }

    /// Snapshot of alive (1) and dead (0) cells.
    pub fn cell_status(&self) -> Plane<u8> {
        self.cell_status.clone()
    }

    /// Snapshot of one gene's expression; the birth target maps to the
    /// cell status.
    pub fn gene_channel(&self, target: RuleTarget) -> Result<Plane<u8>> {
        match target {
            RuleTarget::Birth => Ok(self.cell_status()),
            RuleTarget::Gene(gene) if gene < self.genes => Ok(self.gene_content.channel(gene)),
            RuleTarget::Gene(gene) => Err(HexLifeError::GeneOutOfRange {
                gene,
                genes: self.genes,
            }),
        }
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cell_status.get(x, y) != 0
    }

    pub fn has_gene(&self, x: usize, y: usize, gene: usize) -> bool {
        x < self.width && y < self.height && gene < self.genes && self.gene_content.get(gene, x, y)
    }

    pub fn population(&self) -> usize {
        self.cell_status.count_nonzero()
    }

    /// Number of cells expressing `gene`, or 0 for an unknown gene.
    pub fn gene_population(&self, gene: usize) -> usize {
        if gene < self.genes {
            self.gene_content.population(gene)
        } else {
            0
        }
    }

    pub fn for_each_live<F: FnMut(usize, usize)>(&self, mut f: F) {
        for (x, y) in self.cell_status.active_coords() {
            f(x, y);
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn gene_count(&self) -> usize {
        self.genes
    }

    pub fn gene_names(&self) -> &[String] {
        &self.gene_names
    }

    pub fn gene_index(&self, name: &str) -> Option<usize> {
        self.gene_names.iter().position(|n| n == name)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Seeds skipped at bootstrap for lying outside the grid.
    pub fn dropped_seeds(&self) -> &[SeedCell] {
        &self.dropped_seeds
    }

    pub fn mask_cache(&self) -> &MaskCache {
        self.counter.mask_cache()
    }

    pub fn mask_cache_mut(&mut self) -> &mut MaskCache {
        self.counter.mask_cache_mut()
    }
}

/// Bootstrap a grid with the default configuration.
pub fn initialize_grid(
    rules: impl Into<Arc<RuleSet>>,
    seeds: &[SeedCell],
    width: usize,
    height: usize,
    genes: usize,
) -> Result<CellGrid> {
    CellGrid::new(rules, seeds, width, height, genes, HexLifeConfig::default())
}
