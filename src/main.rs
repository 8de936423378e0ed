#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use hexgene_life::hexlife::{CellGrid, HexLifeConfig, KernelBackend, OutOfBoundsPolicy};

const RULES_FILE: &str = "rules.txt";
const SEEDS_FILE: &str = "initial_cell.txt";
const DEFAULT_WIDTH: usize = 20;
const DEFAULT_HEIGHT: usize = 50;
const DEFAULT_GENERATIONS: u64 = 10;

const USAGE: &str = "usage: hexgene-life <folder> [--width N] [--height N] [--generations N] \
                     [--kernel dense|sparse] [--threads N] [--strict]";

struct MainArgs {
    folder: PathBuf,
    width: usize,
    height: usize,
    generations: u64,
    config: HexLifeConfig,
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut folder = None;
    let mut width = DEFAULT_WIDTH;
    let mut height = DEFAULT_HEIGHT;
    let mut generations = DEFAULT_GENERATIONS;
    let mut config = HexLifeConfig::default();
    let next_arg = |i: usize, flag: &str| -> &str {
        args.get(i)
            .map(String::as_str)
            .unwrap_or_else(|| panic!("{flag} requires a value"))
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--width" => {
                i += 1;
                width = next_arg(i, "--width")
                    .parse()
                    .expect("--width requires a positive integer");
            }
            "--height" => {
                i += 1;
                height = next_arg(i, "--height")
                    .parse()
                    .expect("--height requires a positive integer");
            }
            "--generations" => {
                i += 1;
                generations = next_arg(i, "--generations")
                    .parse()
                    .expect("--generations requires a non-negative integer");
            }
            "--kernel" => {
                i += 1;
                let backend = match next_arg(i, "--kernel").to_ascii_lowercase().as_str() {
                    "dense" => KernelBackend::Dense,
                    "sparse" => KernelBackend::Sparse,
                    other => panic!("unknown kernel backend: {other} (expected dense or sparse)"),
                };
                config = config.kernel(backend);
            }
            "--threads" => {
                i += 1;
                let n: usize = next_arg(i, "--threads")
                    .parse()
                    .expect("--threads requires a positive integer");
                config = config.thread_count(n);
            }
            "--strict" => {
                config = config.out_of_bounds(OutOfBoundsPolicy::Reject);
            }
            other if other.starts_with("--") => panic!("unknown argument: {other}\n{USAGE}"),
            other => {
                if folder.replace(PathBuf::from(other)).is_some() {
                    panic!("more than one folder given\n{USAGE}");
                }
            }
        }
        i += 1;
    }
    let Some(folder) = folder else {
        panic!("missing folder\n{USAGE}");
    };
    MainArgs {
        folder,
        width,
        height,
        generations,
        config,
    }
}

fn print_generation(grid: &CellGrid, elapsed_ms: f64) {
    let genes: Vec<String> = grid
        .gene_names()
        .iter()
        .enumerate()
        .map(|(g, name)| format!("{name}={}", grid.gene_population(g)))
        .collect();
    println!(
        "Generation {}: population = {}, {} [{elapsed_ms:.3} ms]",
        grid.generation(),
        grid.population(),
        genes.join(" ")
    );
}

fn main() -> ExitCode {
    env_logger::init();
    let args = parse_args();

    if !args.folder.is_dir() {
        eprintln!(
            "The folder '{}' does not exist or is not a directory.",
            args.folder.display()
        );
        return ExitCode::FAILURE;
    }
    let rules_path = args.folder.join(RULES_FILE);
    let seeds_path = args.folder.join(SEEDS_FILE);
    let missing: Vec<&str> = [(RULES_FILE, &rules_path), (SEEDS_FILE, &seeds_path)]
        .into_iter()
        .filter(|(_, path)| !path.exists())
        .map(|(name, _)| name)
        .collect();
    if !missing.is_empty() {
        eprintln!(
            "Error: the following required file(s) are missing: {}",
            missing.join(", ")
        );
        return ExitCode::FAILURE;
    }

    let start = Instant::now();
    let mut grid = match CellGrid::from_files(
        &rules_path,
        &seeds_path,
        args.width,
        args.height,
        args.config,
    ) {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    print_generation(&grid, start.elapsed().as_secs_f64() * 1000.0);

    let mut total = std::time::Duration::ZERO;
    for _ in 0..args.generations {
        let start = Instant::now();
        grid.update();
        let elapsed = start.elapsed();
        total += elapsed;
        print_generation(&grid, elapsed.as_secs_f64() * 1000.0);
    }

    if args.generations > 0 {
        let total_ms = total.as_secs_f64() * 1000.0;
        println!(
            "\n--- Summary ({} generations on {}x{}) ---",
            args.generations, args.width, args.height
        );
        println!(
            "{total_ms:.3} ms total, {:.6} ms/generation",
            total_ms / args.generations as f64
        );
    }
    ExitCode::SUCCESS
}
