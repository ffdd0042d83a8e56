use std::error::Error;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use csv::Writer;

use crate::instance::Instance;
use crate::pareto::Archive;

pub fn print_instance_summary(instance: &Instance) {
    println!(
        "{} {} customers, {} trucks, {} drones",
        "loaded instance:".green().bold(),
        instance.customers_count(),
        instance.trucks_count,
        instance.drones_count,
    );
}

pub fn print_iteration(iteration: usize, archive: &Archive, empires_remaining: usize) {
    println!(
        "{} {:>5} | archive {:>4} | empires {:>3}",
        "iter".cyan(),
        iteration,
        archive.len(),
        empires_remaining,
    );
}

pub fn print_summary(archive: &Archive, elapsed: Duration, converged: bool) {
    println!(
        "{} front size {} | elapsed {:.2?} | {}",
        "done:".green().bold(),
        archive.len(),
        elapsed,
        if converged { "converged" } else { "iteration budget exhausted" },
    );

    let mut ranked: Vec<_> = archive.solutions().iter().collect();
    ranked.sort_by(|a, b| a.completion_time.total_cmp(&b.completion_time).then(a.waiting_time.total_cmp(&b.waiting_time)));

    for (rank, solution) in ranked.iter().take(5).enumerate() {
        println!(
            "  {:>2}. completion={:>10.2}  waiting={:>10.2}",
            rank + 1,
            solution.completion_time,
            solution.waiting_time
        );
    }
}

/// Writes `SolutionID,CompletionTime,TotalWaitingTime` for every archive member.
pub fn write_csv(archive: &Archive, outputs_dir: &Path) -> Result<(), Box<dyn Error>> {
    if !outputs_dir.is_dir() {
        std::fs::create_dir_all(outputs_dir)?;
    }

    let mut sorted: Vec<_> = archive.solutions().iter().collect();
    sorted.sort_by(|a, b| a.completion_time.total_cmp(&b.completion_time).then(a.waiting_time.total_cmp(&b.waiting_time)));

    let mut writer = Writer::from_path(outputs_dir.join("results.csv"))?;
    writer.write_record(["SolutionID", "CompletionTime", "TotalWaitingTime"])?;
    for (id, solution) in sorted.iter().enumerate() {
        writer.write_record([id.to_string(), solution.completion_time.to_string(), solution.waiting_time.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
