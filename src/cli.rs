use std::path::PathBuf;

use clap::Parser;

/// `program [instance-file] [populationSize] [numEmpires] [maxIterations]`.
#[derive(Debug, Parser)]
#[command(
    long_about = "Bi-objective imperialist-competitive solver for medical-sample collection with trucks and drones",
    propagate_version = true,
    version
)]
pub struct Arguments {
    /// Path to the instance file.
    pub instance: PathBuf,

    /// Number of individuals in the population.
    #[arg(default_value_t = 50)]
    pub population_size: usize,

    /// Number of empires carved out of the initial population.
    #[arg(default_value_t = 5)]
    pub num_empires: usize,

    /// Maximum number of ICA iterations before stopping.
    #[arg(default_value_t = 100)]
    pub max_iterations: usize,

    /// Iteration budget for local search applied to each assimilated child.
    #[arg(long, default_value_t = 50)]
    pub local_search_iterations: usize,

    /// Tabu tenure used by local search.
    #[arg(long, default_value_t = 7)]
    pub tabu_tenure: usize,

    /// Fixes the run's pseudo-random generator for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory to write `results.csv` into.
    #[arg(long, default_value_t = String::from("outputs/"))]
    pub outputs: String,
}
