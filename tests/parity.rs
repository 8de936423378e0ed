use hexgene_life::hexlife::{
    CellGrid, HexLifeConfig, KernelBackend, NeighborCounter, Plane, SeedCell, parse_rules,
};
use rand::RngCore;
use rand::SeedableRng;

fn random_plane(width: usize, height: usize, density: f64, seed: u64) -> Plane<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    let data = (0..width * height)
        .map(|_| (rng.next_u64() <= threshold) as u8)
        .collect();
    Plane::from_vec(width, height, data)
}

fn assert_backends_agree(src: &Plane<u8>, label: &str) {
    let mut dense = NeighborCounter::new().with_backend(Some(KernelBackend::Dense));
    let mut sparse = NeighborCounter::new().with_backend(Some(KernelBackend::Sparse));
    for radius in 0..=3 {
        for include_center in [false, true] {
            let d = dense.count(src, radius, include_center, None);
            let s = sparse.count(src, radius, include_center, None);
            assert_eq!(
                d, s,
                "{label}: dense/sparse mismatch at radius {radius} center {include_center}"
            );
        }
    }
}

#[test]
fn kernels_agree_on_empty_planes() {
    for (w, h) in [(1, 1), (5, 5), (6, 9)] {
        let src = Plane::<u8>::new(w, h);
        assert_backends_agree(&src, &format!("empty {w}x{h}"));
        let counts = NeighborCounter::new().count(&src, 2, true, None);
        assert!(counts.as_slice().iter().all(|&c| c == 0));
    }
}

#[test]
fn kernels_agree_on_single_cells() {
    let (w, h) = (7, 8);
    for (x, y) in [(0, 0), (0, 7), (6, 0), (6, 7), (3, 3), (3, 4), (1, 6)] {
        let mut src = Plane::<u8>::new(w, h);
        src.set(x, y, 1);
        assert_backends_agree(&src, &format!("single ({x},{y})"));
    }
}

#[test]
fn kernels_agree_on_random_planes() {
    for (w, h, density, seed) in [
        (13, 17, 0.05, 0x11u64),
        (13, 17, 0.30, 0x22),
        (20, 20, 0.75, 0x33),
        (1, 9, 0.5, 0x44),
        (9, 1, 0.5, 0x55),
        (32, 24, 0.10, 0x66),
    ] {
        let src = random_plane(w, h, density, seed);
        assert_backends_agree(&src, &format!("{w}x{h} density {density} seed {seed:#x}"));
    }
}

const PARITY_RULES: &str = "\
# gene 0
[n(2)]1 || [1,not(2)]2
# gene 1
[0]1
# gene 2
[0,1]0 || [n(3)]1
# birth
[n(2)] || [2,n(1)]
";

fn random_seeds(width: usize, height: usize, density: f64, seed: u64) -> Vec<SeedCell> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density) as u64;
    let mut seeds = Vec::new();
    for x in 0..width as i64 {
        for y in 0..height as i64 {
            if rng.next_u64() <= threshold {
                let genes: Vec<usize> = (0..3).filter(|_| rng.next_u32() % 2 == 0).collect();
                seeds.push(SeedCell::new(x, y, &genes));
            }
        }
    }
    seeds
}

fn run(config: HexLifeConfig, seeds: &[SeedCell], steps: u64) -> CellGrid {
    let rules = parse_rules(PARITY_RULES).unwrap();
    let mut grid = CellGrid::new(rules, seeds, 24, 24, 3, config).unwrap();
    grid.update_n(steps);
    grid
}

fn assert_same_state(a: &CellGrid, b: &CellGrid, label: &str) {
    assert_eq!(a.cell_status(), b.cell_status(), "{label}: cell status differs");
    for gene in 0..a.gene_count() {
        assert_eq!(
            a.gene_population(gene),
            b.gene_population(gene),
            "{label}: gene {gene} population differs"
        );
        for x in 0..a.width() {
            for y in 0..a.height() {
                assert_eq!(
                    a.has_gene(x, y, gene),
                    b.has_gene(x, y, gene),
                    "{label}: gene {gene} differs at ({x},{y})"
                );
            }
        }
    }
}

#[test]
fn whole_runs_match_across_backends() {
    for (density, seed) in [(0.03, 0xA1u64), (0.15, 0xB2), (0.45, 0xC3)] {
        let seeds = random_seeds(24, 24, density, seed);
        let reference = run(HexLifeConfig::default().kernel(KernelBackend::Dense), &seeds, 6);
        let label = format!("density {density} seed {seed:#x}");

        let sparse = run(HexLifeConfig::default().kernel(KernelBackend::Sparse), &seeds, 6);
        assert_same_state(&reference, &sparse, &format!("{label} sparse"));

        let adaptive = run(HexLifeConfig::default(), &seeds, 6);
        assert_same_state(&reference, &adaptive, &format!("{label} adaptive"));

        let threaded = run(
            HexLifeConfig::default()
                .kernel(KernelBackend::Dense)
                .thread_count(3),
            &seeds,
            6,
        );
        assert_same_state(&reference, &threaded, &format!("{label} threaded"));
    }
}
