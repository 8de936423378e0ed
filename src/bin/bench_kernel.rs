use hexgene_life::hexlife::{KernelBackend, NeighborCounter, Plane, SPARSE_OCCUPANCY_THRESHOLD};
use rand::RngCore;
use rand::SeedableRng;
use std::env;
use std::str::FromStr;
use std::time::Instant;

const DENSITIES: [f64; 5] = [0.01, 0.05, SPARSE_OCCUPANCY_THRESHOLD, 0.25, 0.5];

#[derive(Clone, Debug)]
struct KernelBench {
    width: usize,
    height: usize,
    radius: usize,
    include_center: bool,
    warmup: u32,
    iters: u32,
    seed: u64,
    threads: usize,
    json: bool,
}

impl Default for KernelBench {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            radius: 2,
            include_center: true,
            warmup: 3,
            iters: 30,
            seed: 0x4E16_B0A2_5EED_0001,
            threads: 1,
            json: false,
        }
    }
}

struct Timing {
    avg_ms: f64,
    counts: Plane<u16>,
}

fn next_raw(args: &mut impl Iterator<Item = String>, flag: &str) -> String {
    args.next()
        .unwrap_or_else(|| panic!("{flag} requires a value"))
}

fn flag_value<T: FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> T {
    let raw = next_raw(args, flag);
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{flag}: cannot parse `{raw}`"))
}

/// Decimal or `0x`-prefixed hex.
fn seed_value(args: &mut impl Iterator<Item = String>) -> u64 {
    let raw = next_raw(args, "--seed");
    let parsed = match raw.trim().strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.trim().parse(),
    };
    parsed.unwrap_or_else(|_| panic!("--seed: cannot parse `{raw}`"))
}

impl KernelBench {
    fn from_args() -> Self {
        let mut bench = Self::default();
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--width" => bench.width = flag_value(&mut args, "--width"),
                "--height" => bench.height = flag_value(&mut args, "--height"),
                "--radius" => bench.radius = flag_value(&mut args, "--radius"),
                "--no-center" => bench.include_center = false,
                "--warmup" => bench.warmup = flag_value(&mut args, "--warmup"),
                "--iters" => bench.iters = flag_value(&mut args, "--iters"),
                "--seed" => bench.seed = seed_value(&mut args),
                "--threads" => bench.threads = flag_value::<usize>(&mut args, "--threads").max(1),
                "--json" => bench.json = true,
                other => panic!("unknown arg: {other}"),
            }
        }
        bench
    }

    fn random_plane(&self, density: f64) -> Plane<u8> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        let threshold = (u64::MAX as f64 * density) as u64;
        let data = (0..self.width * self.height)
            .map(|_| (rng.next_u64() <= threshold) as u8)
            .collect();
        Plane::from_vec(self.width, self.height, data)
    }

    fn counter(&self, backend: KernelBackend) -> NeighborCounter {
        let pool = (self.threads > 1).then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()
                .unwrap_or_else(|err| panic!("bench thread pool: {err}"))
        });
        NeighborCounter::new()
            .with_backend(Some(backend))
            .with_pool(pool)
    }

    fn time(&self, src: &Plane<u8>, backend: KernelBackend) -> Timing {
        let mut counter = self.counter(backend);
        let mut counts = counter.count(src, self.radius, self.include_center, None);
        for _ in 1..self.warmup {
            std::hint::black_box(counter.count(src, self.radius, self.include_center, None));
        }

        let start = Instant::now();
        for _ in 0..self.iters {
            counts = counter.count(src, self.radius, self.include_center, None);
        }
        let avg_ms = start.elapsed().as_secs_f64() * 1000.0 / self.iters.max(1) as f64;
        Timing { avg_ms, counts }
    }
}

fn main() {
    let bench = KernelBench::from_args();

    if !bench.json {
        println!(
            "{}x{} radius {} center {} ({} iters, {} threads)",
            bench.width, bench.height, bench.radius, bench.include_center, bench.iters, bench.threads
        );
        println!(
            "{:<10} {:>12} {:>12} {:>10} {:>8}",
            "Density", "Dense(ms)", "Sparse(ms)", "Speedup", "Match"
        );
        println!("{}", "-".repeat(56));
    }

    let mut mismatches = 0;
    for density in DENSITIES {
        let src = bench.random_plane(density);
        let dense = bench.time(&src, KernelBackend::Dense);
        let sparse = bench.time(&src, KernelBackend::Sparse);
        let matched = dense.counts == sparse.counts;
        mismatches += usize::from(!matched);

        if bench.json {
            println!(
                "{{\"density\":{density},\"occupancy\":{:.6},\"dense_ms\":{:.6},\"sparse_ms\":{:.6},\"match\":{matched}}}",
                src.occupancy(),
                dense.avg_ms,
                sparse.avg_ms,
            );
        } else {
            println!(
                "{:<10.3} {:>12.4} {:>12.4} {:>9.2}x {:>8}",
                density,
                dense.avg_ms,
                sparse.avg_ms,
                dense.avg_ms / sparse.avg_ms,
                if matched { "MATCH" } else { "MISMATCH" }
            );
        }
    }

    if mismatches > 0 {
        eprintln!("{mismatches} densities produced different dense and sparse counts");
        std::process::exit(1);
    }
}
