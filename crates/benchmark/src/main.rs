//! U-CutStock catalog runner CLI

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use u_cutstock::{CutStockEngine, OptimizationResult, ProgressReporter, Strategy};
use u_cutstock_benchmark::{
    BenchmarkConfig, BenchmarkResult, BenchmarkRunner, Catalog, CatalogParser, SyntheticGenerator,
};
use u_cutstock_core::Config;
use u_cutstock_cutting::{analyze_waste, cost_report, max_quantity, suggest_quantities};

#[derive(Parser)]
#[command(name = "bench-runner")]
#[command(about = "3D cutting-stock optimizer and benchmark runner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a catalog with one strategy
    Solve {
        /// Path to the JSON catalog
        file: PathBuf,

        /// Strategy to run
        #[arg(short, long, value_enum, default_value = "basic")]
        strategy: StrategyArg,

        /// Solver configuration (JSON, missing fields use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RNG seed for metaheuristics
        #[arg(long)]
        seed: Option<u64>,

        /// Print progress updates
        #[arg(long)]
        progress: bool,

        /// Output file for the full result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run several strategies concurrently and keep the best
    Compare {
        /// Path to the JSON catalog
        file: PathBuf,

        /// Strategies to compare
        #[arg(short, long, value_enum, default_values_t = vec![StrategyArg::Basic, StrategyArg::Guillotine, StrategyArg::Genetic])]
        strategies: Vec<StrategyArg>,

        /// Solver configuration (JSON, missing fields use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for the full result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Benchmark strategies over one or more catalogs
    Bench {
        /// Paths to JSON catalogs
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Preset configuration
        #[arg(short, long, value_enum, default_value = "quick")]
        preset: Preset,

        /// Strategies to benchmark (overrides the preset)
        #[arg(short, long, value_enum)]
        strategies: Vec<StrategyArg>,

        /// Number of runs per strategy
        #[arg(short, long)]
        runs: Option<usize>,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for CSV results
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Suggest extra quantities that fit the stock catalog
    Suggest {
        /// Path to the JSON catalog
        file: PathBuf,

        /// Disallow rotations when computing maximum quantities
        #[arg(long)]
        no_rotation: bool,
    },

    /// Generate a synthetic catalog
    Generate {
        /// Kind of catalog
        #[arg(short, long, value_enum, default_value = "mixed")]
        kind: CatalogKind,

        /// Number of piece types
        #[arg(short, long, default_value = "8")]
        pieces: usize,

        /// Edge length of the largest stock block
        #[arg(long, default_value = "200")]
        stock_side: f64,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Greedy extreme point packing
    Basic,
    /// Guillotine-constrained packing
    Guillotine,
    /// Genetic Algorithm
    Genetic,
    /// Simulated Annealing
    Annealing,
    /// Greedy, annealing refinement, residual fill
    Hybrid,
    /// Strategy chosen from instance signals
    Adaptive,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Basic => Strategy::Basic,
            StrategyArg::Guillotine => Strategy::Guillotine,
            StrategyArg::Genetic => Strategy::Genetic,
            StrategyArg::Annealing => Strategy::Annealing,
            StrategyArg::Hybrid => Strategy::Hybrid,
            StrategyArg::Adaptive => Strategy::Adaptive,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Basic and guillotine, 5s timeout
    Quick,
    /// All strategies, 3 runs, 60s timeout
    Standard,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogKind {
    /// Similar pieces, one stock type
    Uniform,
    /// Varied pieces, priced stock types
    Mixed,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let parser = CatalogParser::new();

    match cli.command {
        Commands::Solve {
            file,
            strategy,
            config,
            seed,
            progress,
            output,
        } => {
            let catalog = parser
                .parse_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            let mut solver = load_config(&parser, config.as_deref())?;
            if let Some(seed) = seed {
                solver = solver.with_seed(seed);
            }

            let mut engine = CutStockEngine::new(solver);
            if progress {
                engine = engine.with_progress(ProgressReporter::callback(|info| {
                    eprintln!("[{}] {:>5.1}% {}", info.algorithm, info.progress, info.stage);
                }));
            }

            let result = engine.run(strategy.into(), &catalog.pieces, &catalog.stocks)?;
            print_result(&catalog, &result);
            save_result(&result, output.as_deref())?;
        }

        Commands::Compare {
            file,
            strategies,
            config,
            output,
        } => {
            let catalog = parser
                .parse_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;
            let solver = load_config(&parser, config.as_deref())?;
            let strategies: Vec<Strategy> = strategies.into_iter().map(Into::into).collect();

            let result = CutStockEngine::new(solver).optimize_with_multiple_algorithms(
                &catalog.pieces,
                &catalog.stocks,
                &strategies,
            )?;

            if let Some(comparison) = &result.algorithm_comparison {
                println!("\nStrategy Comparison:");
                println!("{:-<72}", "");
                for run in &comparison.results {
                    println!(
                        "  {:<12} eff={:>6.2}% stocks={:<3} placed={}/{} cuts={:<4} time={}ms",
                        run.algorithm,
                        run.efficiency,
                        run.layouts_used,
                        run.placed_count,
                        run.placed_count + run.unplaced_count,
                        run.total_cuts,
                        run.elapsed_ms
                    );
                }
                println!("  Best: {}", comparison.best_algorithm);
            }

            print_result(&catalog, &result);
            save_result(&result, output.as_deref())?;
        }

        Commands::Bench {
            files,
            preset,
            strategies,
            runs,
            output,
            csv,
        } => {
            let mut config = match preset {
                Preset::Quick => BenchmarkConfig::quick(),
                Preset::Standard => BenchmarkConfig::standard(),
            };
            if !strategies.is_empty() {
                config = config.with_strategies(strategies.into_iter().map(Into::into).collect());
            }
            if let Some(runs) = runs {
                config = config.with_runs_per_config(runs);
            }

            let mut catalogs = Vec::with_capacity(files.len());
            for file in &files {
                match parser.parse_file(file) {
                    Ok(catalog) => catalogs.push(catalog),
                    Err(e) => eprintln!("Skipping {}: {}", file.display(), e),
                }
            }

            let results = BenchmarkRunner::new(config).run_catalogs(&catalogs);
            results.print_summary();
            print_strategy_summary(&results);

            if let Some(path) = output {
                results.save_json(&path)?;
                println!("\nResults saved to: {}", path.display());
            }

            if let Some(path) = csv {
                results.save_csv(&path)?;
                println!("CSV saved to: {}", path.display());
            }
        }

        Commands::Suggest { file, no_rotation } => {
            let catalog = parser
                .parse_file(&file)
                .with_context(|| format!("loading {}", file.display()))?;

            println!("Quantity suggestions for {}:", catalog.name);
            println!("{:-<60}", "");
            println!(
                "  {:<16} {:>10} {:>12} {:>12}",
                "Piece", "Current", "Suggested", "Max alone"
            );
            let suggestions = suggest_quantities(&catalog.pieces, &catalog.stocks);
            for (piece, suggestion) in catalog.pieces.iter().zip(&suggestions) {
                println!(
                    "  {:<16} {:>10} {:>12} {:>12}",
                    suggestion.piece_id,
                    suggestion.current,
                    suggestion.suggested(),
                    max_quantity(piece, &catalog.stocks, !no_rotation)
                );
            }
        }

        Commands::Generate {
            kind,
            pieces,
            stock_side,
            seed,
            output,
        } => {
            let mut generator = match seed {
                Some(seed) => SyntheticGenerator::with_seed(seed),
                None => SyntheticGenerator::new(),
            };
            let catalog = match kind {
                CatalogKind::Uniform => generator.uniform(pieces, stock_side),
                CatalogKind::Mixed => generator.mixed(pieces, stock_side),
            };

            let json = serde_json::to_string_pretty(&catalog)?;
            std::fs::write(&output, json)?;

            let info = catalog.info();
            println!("Catalog saved to: {}", output.display());
            println!("  Piece types: {}", info.piece_types);
            println!("  Total pieces: {}", info.total_pieces);
            println!("  Stock blocks: {}", info.stock_instances);
        }
    }

    Ok(())
}

fn load_config(parser: &CatalogParser, path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => parser
            .parse_config_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn save_result(result: &OptimizationResult, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        std::fs::write(path, serde_json::to_string_pretty(result)?)?;
        println!("Result saved to: {}", path.display());
    }
    Ok(())
}

fn print_result(catalog: &Catalog, result: &OptimizationResult) {
    println!("\n{:=<72}", "");
    println!(
        "{} via {}{}",
        catalog.name,
        result.strategy().unwrap_or("-"),
        if result.partial { " (partial)" } else { "" }
    );
    println!("{:=<72}", "");
    println!("  Efficiency:   {}", result.efficiency_percent());
    println!("  Stocks used:  {}", result.layouts_used());
    println!(
        "  Placed:       {}/{}",
        result.placed_count(),
        result.placed_count() + result.unplaced_count()
    );
    if result.total_cuts() > 0 {
        println!("  Cuts:         {}", result.total_cuts());
    }

    for layout in &result.layouts {
        println!(
            "    {}#{}: {} pieces, {:.1}% used",
            layout.stock_id,
            layout.stock_instance,
            layout.pieces.len(),
            layout.utilization
        );
    }
    for unplaced in &result.unplaced {
        println!("    unplaced {}#{}", unplaced.piece_id, unplaced.instance);
    }

    if let Some(analysis) = &result.hybrid_analysis {
        println!(
            "  Hybrid stages: {:.2}% -> {:.2}% -> {:.2}% (+{} surplus)",
            analysis.stage1_efficiency,
            analysis.stage2_efficiency,
            analysis.stage3_efficiency,
            analysis.surplus_placed
        );
    }
    if let Some(selection) = result
        .algorithm_data
        .as_ref()
        .and_then(|d| d.selection.as_ref())
    {
        println!("  Adaptive: {} ({})", selection.chosen, selection.reason);
    }

    let report = cost_report(result, &catalog.stocks, &Default::default());
    println!("\n  Material cost: {:.2}", report.material_cost);
    println!("  Waste cost:    {:.2}", report.waste_cost);
    println!(
        "  Time:          {:.1} min ({:.1} pieces/h)",
        report.total_minutes, report.pieces_per_hour
    );

    let waste = analyze_waste(result, &catalog.pieces);
    if let Some(smallest) = &waste.smallest_piece {
        println!(
            "  Waste volume:  {:.0} (room for ~{} more {})",
            waste.total_waste_volume, waste.additional_units, smallest
        );
    }
    println!("{:=<72}\n", "");
}

fn print_strategy_summary(results: &BenchmarkResult) {
    println!("\nStrategy Comparison:");
    println!("{:-<72}", "");
    for summary in results.summary_by_strategy() {
        println!(
            "  {:<12} runs={:<3} avg_eff={:.2}% best={:.2}% full={} avg_time={}ms",
            summary.strategy,
            summary.run_count,
            summary.avg_efficiency,
            summary.best_efficiency,
            summary.fully_placed,
            summary.avg_time_ms
        );
    }
}
