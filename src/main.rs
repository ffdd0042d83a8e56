use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use mimalloc::MiMalloc;

mod cli;
mod decoder;
mod error;
mod evaluator;
mod hasher;
mod ica;
mod instance;
mod local_search;
mod pareto;
mod parser;
mod reporter;
mod route;
mod solution;
mod telemetry;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> ExitCode {
    telemetry::init();

    let args = cli::Arguments::parse();

    let instance = match parser::read_instance(&args.instance) {
        Ok(instance) => instance,
        Err(err) => {
            tracing::error!(error = %err, "failed to load instance");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    reporter::print_instance_summary(&instance);

    let config = ica::IcaConfig {
        population_size: args.population_size,
        num_empires: args.num_empires,
        max_iterations: args.max_iterations,
        local_search_iterations: args.local_search_iterations,
        tabu_tenure: args.tabu_tenure,
        decode_mode: decoder::DecodeMode::Incremental,
    };

    let mut engine = ica::IcaEngine::new(&instance, config, args.seed);

    let started = Instant::now();
    let report = match engine.run(|iteration, archive, empires_remaining| {
        reporter::print_iteration(iteration, archive, empires_remaining);
    }) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(error = %err, "engine aborted");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = started.elapsed();

    reporter::print_summary(engine.archive(), elapsed, report.converged);

    if let Err(err) = reporter::write_csv(engine.archive(), std::path::Path::new(&args.outputs)) {
        tracing::error!(error = %err, "failed to write results.csv");
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
