use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use cutstock_core::{
    OptimizationResult, ProgressCallback, RangeRequest, RangeSolver, SolveRequest, Solver,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cutstock")]
#[command(about = "1D cutting stock optimizer - plan roll cutting from a demand list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single master roll length
    Solve {
        /// Request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sweep a range of master roll lengths and pick the best
    Range {
        /// Range request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { input, output } => solve_command(input, output)?,
        Commands::Range { input, output } => range_command(input, output)?,
    }

    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn solve_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "Loading request...".bright_blue());

    let content = std::fs::read_to_string(&input)?;
    let request: SolveRequest = if is_yaml(&input) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    println!(
        "  {} demand entries, master roll length {}",
        request.demand.len().to_string().bright_white().bold(),
        request.master_roll_length.to_string().bright_white().bold(),
    );
    println!();

    println!("{}", "Running optimization...".bright_blue());
    let result = Solver::new(request)?.solve()?;

    println!();
    println!("{}", "Optimization complete".bright_green().bold());
    println!();
    print_result(&result);

    save_or_print(&result, output)
}

fn range_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "Loading range request...".bright_blue());

    let content = std::fs::read_to_string(&input)?;
    let request: RangeRequest = if is_yaml(&input) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let range = request.master_roll_length.clone();
    println!(
        "  {} demand entries, lengths {}..={} step {}",
        request.demand.len().to_string().bright_white().bold(),
        range.min,
        range.max,
        range.step,
    );
    println!();

    println!("{}", "Running range sweep...".bright_blue());
    let progress: ProgressCallback = Box::new(|event| {
        println!(
            "  [{}/{}] solving length {}",
            event.completed + 1,
            event.total,
            event.current_configuration,
        );
    });
    let result = RangeSolver::new(request)?.solve_with_progress(progress)?;

    println!();
    println!("{}", "Sweep complete".bright_green().bold());
    println!();
    println!("{}", "Results:".bright_yellow().bold());
    println!(
        "  Best length: {}",
        result.best_configuration.to_string().bright_white().bold(),
    );
    println!(
        "  Feasible configurations: {}",
        result.summary.total_configurations,
    );
    println!(
        "  Efficiency best/mean/worst: {:.1}% / {:.1}% / {:.1}%",
        result.summary.best_efficiency,
        result.summary.average_efficiency,
        result.summary.worst_efficiency,
    );
    for failure in &result.failures {
        println!(
            "  {} length {}: {}",
            "failed".bright_red(),
            failure.master_roll_length,
            failure.error,
        );
    }
    if let Some(best) = result
        .results
        .iter()
        .find(|e| e.master_roll_length == result.best_configuration)
    {
        println!();
        print_result(&best.optimization);
    }

    save_or_print(&result, output)
}

fn print_result(result: &OptimizationResult) {
    println!("{}", "Plan:".bright_yellow().bold());
    println!(
        "  Total rolls: {}",
        result.total_rolls.to_string().bright_white().bold(),
    );
    println!("  Efficiency: {:.1}%", result.efficiency);
    println!(
        "  Waste: {} ({:.1}%)",
        result.total_waste, result.waste_percentage,
    );
    println!("  Convergence: {}", result.performance.convergence);
    println!();
    for instruction in &result.cutting_instructions {
        if instruction.rolls_count == 0 {
            println!(
                "  {}. {} {}",
                instruction.step,
                instruction.description,
                instruction.pattern.bright_cyan(),
            );
        } else {
            println!(
                "  {}. {} - cut each roll as {}",
                instruction.step,
                instruction.description,
                instruction.pattern.bright_white(),
            );
        }
    }
    println!();
}

fn save_or_print<T: serde::Serialize>(result: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!(
                "Saved result to {}",
                path.display().to_string().bright_white(),
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
