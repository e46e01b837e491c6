//! Batch runner for the pan heat-diffusion simulation
//!
//! Loads a configuration file, steps the simulation to convergence while
//! dumping temperature-field snapshots, and prints the final iteration count.
//! Any configuration or I/O failure exits non-zero with a diagnostic.

use bakesim_core::{
    checkpoint, example_config, parse_config, write_snapshot, BoundaryPolicy, ConvergenceScope,
    PanMutability, RunStatus, Simulation,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pan heat-diffusion simulation with configurable run policies
#[derive(Parser, Debug)]
#[command(name = "bakesim")]
#[command(about = "Brownie pan heat-diffusion simulator", long_about = None)]
struct Args {
    /// Configuration file (not needed with --resume or --emit-config)
    config: Option<PathBuf>,

    /// Directory snapshots are written into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Write a snapshot every N iterations (0 disables snapshots)
    #[arg(short, long, default_value_t = 1)]
    snapshot_every: u64,

    /// Abort if convergence takes more than this many iterations
    #[arg(short, long)]
    max_iterations: Option<u64>,

    /// Outer-ring policy (frozen, exchange)
    #[arg(long, default_value = "frozen")]
    boundary_policy: String,

    /// Hold pan-metal cells at their initial temperature
    #[arg(long)]
    fixed_pan: bool,

    /// Convergence scan scope (all-cells, brownie-only)
    #[arg(long, default_value = "all-cells")]
    convergence_scope: String,

    /// Save the final state to this checkpoint file
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Resume from a checkpoint instead of loading a configuration
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Print a sample configuration to stdout and exit
    #[arg(long)]
    emit_config: bool,

    /// Print a statistics row every N iterations
    #[arg(short, long, default_value_t = 100)]
    report_interval: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.emit_config {
        print!("{}", example_config());
        return ExitCode::SUCCESS;
    }

    let mut sim = match load_simulation(&args) {
        Ok(sim) => sim,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let grid = sim.grid();
    println!(
        "Grid: {}x{} divisions ({} brownie), threshold {:.1} K",
        grid.cols,
        grid.rows,
        grid.brownie_cell_count(),
        sim.params().temp_done
    );
    println!("Iteration | Max Change     | Average    | Maximum    | Minimum");
    println!("----------|----------------|------------|------------|----------");

    // Capture the pre-run state so snapshot 0 always exists
    if args.snapshot_every > 0 && sim.iteration() == 0 {
        if let Err(err) = write_snapshot(sim.grid(), &args.output_dir, 0) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    let outcome = sim.run(args.max_iterations, |sim, stats| {
        if args.report_interval > 0 && stats.iteration % args.report_interval == 0 {
            println!(
                "{:9} | {:14.12} | {:10.4} | {:10.4} | {:10.4}",
                stats.iteration,
                stats.max_change,
                stats.mean_temperature,
                stats.max_temperature,
                stats.min_temperature
            );
        }
        let capture = args.snapshot_every > 0
            && (stats.iteration % args.snapshot_every == 0
                || sim.status() == RunStatus::Converged);
        if capture {
            write_snapshot(sim.grid(), &args.output_dir, stats.iteration)?;
        }
        Ok(())
    });

    let final_iteration = match outcome {
        Ok(iteration) => iteration,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.checkpoint {
        if let Err(err) = checkpoint::save(&sim, path) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    println!("Converged after {final_iteration} iterations");
    ExitCode::SUCCESS
}

/// Build the simulation from a checkpoint or a configuration file, applying
/// the policy flags. Errors are rendered as the diagnostic to print.
fn load_simulation(args: &Args) -> Result<Simulation, String> {
    if let Some(path) = &args.resume {
        let sim = checkpoint::load(path)
            .map_err(|err| format!("Could not resume from {}: {err}", path.display()))?;
        tracing::info!(iteration = sim.iteration(), "resumed from checkpoint");
        return Ok(sim);
    }

    let config_path = args
        .config
        .as_ref()
        .ok_or_else(|| "No configuration file provided!".to_owned())?;
    let bytes = std::fs::read(config_path)
        .map_err(|err| format!("Could not open {}: {err}", config_path.display()))?;
    let (mut params, grid) = parse_config(&bytes)
        .map_err(|err| format!("Could not parse {}: {err}", config_path.display()))?;

    params.boundary_policy = match args.boundary_policy.to_lowercase().as_str() {
        "frozen" => BoundaryPolicy::Frozen,
        "exchange" => BoundaryPolicy::Exchange,
        other => return Err(format!("Unknown boundary policy '{other}'")),
    };
    params.pan_mutability = if args.fixed_pan {
        PanMutability::Fixed
    } else {
        PanMutability::Evolving
    };
    params.convergence_scope = match args.convergence_scope.to_lowercase().as_str() {
        "all-cells" | "all" => ConvergenceScope::AllCells,
        "brownie-only" | "brownie" => ConvergenceScope::BrownieOnly,
        other => return Err(format!("Unknown convergence scope '{other}'")),
    };

    Ok(Simulation::new(params, grid))
}
