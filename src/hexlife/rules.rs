//! AND-rules and rule sets.
//!
//! A rule is a conjunction of gene presence/absence conditions, gated either
//! by an exact neighbor count or by a caller-supplied base predicate. Gene
//! rules express their target gene around every satisfying cell; birth rules
//! bring dead cells to life.

use super::error::{HexLifeError, Result};
use super::plane::{GenePlanes, Plane};

/// What a satisfied rule acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleTarget {
    /// Express this gene.
    Gene(usize),
    /// Bring the cell to life.
    Birth,
}

impl RuleTarget {
    pub fn gene(self) -> Option<usize> {
        match self {
            RuleTarget::Gene(g) => Some(g),
            RuleTarget::Birth => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AndRule {
    pub positive_genes: Vec<usize>,
    pub negative_genes: Vec<usize>,
    /// Exact number of living neighbors required, if gated.
    pub required_neighbor_count: Option<u16>,
    pub diffusion_radius: usize,
    pub target: RuleTarget,
}

impl AndRule {
    pub fn new(target: RuleTarget) -> Self {
        Self {
            positive_genes: Vec::new(),
            negative_genes: Vec::new(),
            required_neighbor_count: None,
            diffusion_radius: 1,
            target,
        }
    }

    pub fn require(mut self, gene: usize) -> Self {
        self.positive_genes.push(gene);
        self
    }

    pub fn forbid(mut self, gene: usize) -> Self {
        self.negative_genes.push(gene);
        self
    }

    pub fn neighbors(mut self, count: u16) -> Self {
        self.required_neighbor_count = Some(count);
        self
    }

    pub fn radius(mut self, radius: usize) -> Self {
        self.diffusion_radius = radius;
        self
    }

    /// False when a required gene is expressed nowhere, in which case the
    /// rule cannot hold at any cell this generation.
    pub fn can_fire(&self, expressed: &[bool]) -> bool {
        self.positive_genes
            .iter()
            .all(|&g| expressed.get(g).copied().unwrap_or(false))
    }

    /// Cells where the rule holds.
    ///
    /// With a neighbor gate the count must match exactly and `base` is
    /// ignored; without one the cell must satisfy `base`.
    pub fn evaluate(&self, genes: &GenePlanes, counts: &Plane<u16>, base: &Plane<u8>) -> Plane<u8> {
        let positive: Vec<&[u8]> = self.positive_genes.iter().map(|&g| genes.layer(g)).collect();
        let negative: Vec<&[u8]> = self.negative_genes.iter().map(|&g| genes.layer(g)).collect();
        let count_cells = counts.as_slice();
        let base_cells = base.as_slice();

        let data = (0..base_cells.len())
            .map(|i| {
                let genes_ok = positive.iter().all(|layer| layer[i] != 0)
                    && negative.iter().all(|layer| layer[i] == 0);
                let gate_ok = match self.required_neighbor_count {
                    Some(k) => count_cells[i] == k,
                    None => base_cells[i] != 0,
                };
                (genes_ok && gate_ok) as u8
            })
            .collect();
        Plane::from_vec(base.width(), base.height(), data)
    }

    fn max_gene(&self) -> Option<usize> {
        self.positive_genes
            .iter()
            .chain(&self.negative_genes)
            .copied()
            .chain(self.target.gene())
            .max()
    }
}

/// Gene rules followed by birth rules, immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    gene_rules: Vec<AndRule>,
    alive_rules: Vec<AndRule>,
    gene_lines: usize,
}

impl RuleSet {
    /// Build from per-line rule groups: all but the last line target genes
    /// `0, 1, 2, ...`; the last line holds the birth rules.
    pub fn from_lines(mut lines: Vec<Vec<AndRule>>) -> Self {
        let Some(last) = lines.pop() else {
            return Self::default();
        };
        let gene_lines = lines.len();
        let gene_rules = lines
            .into_iter()
            .enumerate()
            .flat_map(|(gene, rules)| {
                rules.into_iter().map(move |mut rule| {
                    rule.target = RuleTarget::Gene(gene);
                    rule
                })
            })
            .collect();
        let alive_rules = last
            .into_iter()
            .map(|mut rule| {
                rule.target = RuleTarget::Birth;
                rule
            })
            .collect();
        Self {
            gene_rules,
            alive_rules,
            gene_lines,
        }
    }

    /// Build from explicit rule lists; targets are taken as given.
    pub fn new(gene_rules: Vec<AndRule>, alive_rules: Vec<AndRule>) -> Self {
        let gene_lines = gene_rules
            .iter()
            .filter_map(|r| r.target.gene())
            .max()
            .map_or(0, |g| g + 1);
        Self {
            gene_rules,
            alive_rules,
            gene_lines,
        }
    }

    pub fn gene_rules(&self) -> &[AndRule] {
        &self.gene_rules
    }

    pub fn alive_rules(&self) -> &[AndRule] {
        &self.alive_rules
    }

    /// Number of gene lines, i.e. the gene count the rules imply.
    pub fn gene_lines(&self) -> usize {
        self.gene_lines
    }

    pub fn is_empty(&self) -> bool {
        self.gene_rules.is_empty() && self.alive_rules.is_empty()
    }

    /// Reject rules that reference genes outside `0..genes`.
    pub fn validate(&self, genes: usize) -> Result<()> {
        for rule in self.gene_rules.iter().chain(&self.alive_rules) {
            if let Some(gene) = rule.max_gene().filter(|&g| g >= genes) {
                return Err(HexLifeError::GeneOutOfRange { gene, genes });
            }
        }
        Ok(())
    }
}
