use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::decoder::{DecodeMode, decode};
use crate::error::EngineError;
use crate::hasher::SolutionHasher;
use crate::instance::Instance;
use crate::local_search::LocalSearch;
use crate::pareto::{Archive, crowding_distance, non_dominated_sort};
use crate::solution::{Individual, Solution};

/// Fixed seed for the Zobrist table so hashes are reproducible across runs
/// that share the same instance, independent of the run's own RNG seed.
const ZOBRIST_SEED: u64 = 0x5EED_5EED_5EED_5EEDu64;

const OX_MUTATION_RATE: f64 = 0.05;
const OX_RETRY_MUTATION_RATE: f64 = 0.15;

#[derive(Clone, Debug)]
pub struct IcaConfig {
    pub population_size: usize,
    pub num_empires: usize,
    pub max_iterations: usize,
    pub local_search_iterations: usize,
    pub tabu_tenure: usize,
    pub decode_mode: DecodeMode,
}

impl Default for IcaConfig {
    fn default() -> Self {
        IcaConfig {
            population_size: 50,
            num_empires: 5,
            max_iterations: 100,
            local_search_iterations: 50,
            tabu_tenure: 7,
            decode_mode: DecodeMode::Incremental,
        }
    }
}

pub struct EngineReport {
    pub iterations_run: usize,
    pub converged: bool,
}

struct Empire {
    imperialist: Individual,
    colonies: Vec<Individual>,
    power: f64,
}

/// Orchestrates population, empires, assimilation, revolution, and
/// imperialistic competition over a fixed iteration budget. All shared
/// mutable state (RNG, hash set, archive, empires) is owned here; the
/// Decoder, Local Search, and Evaluator remain pure functions of their
/// inputs and this engine's generator.
pub struct IcaEngine<'a> {
    instance: &'a Instance,
    config: IcaConfig,
    rng: StdRng,
    hasher: SolutionHasher,
    seen_hashes: HashSet<u64>,
    archive: Archive,
    empires: Vec<Empire>,
    local_search: LocalSearch,
}

impl<'a> IcaEngine<'a> {
    pub fn new(instance: &'a Instance, config: IcaConfig, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(Self::time_seed);
        IcaEngine {
            instance,
            hasher: SolutionHasher::new(instance, ZOBRIST_SEED),
            rng: StdRng::seed_from_u64(seed),
            seen_hashes: HashSet::new(),
            archive: Archive::new(),
            empires: Vec::new(),
            local_search: LocalSearch::new(config.tabu_tenure),
            config,
        }
    }

    fn time_seed() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn run(&mut self, mut on_iteration: impl FnMut(usize, &Archive, usize)) -> Result<EngineReport, EngineError> {
        self.initialize_population()?;

        let mut iterations_run = 0;
        let mut converged = false;

        for iter in 0..self.config.max_iterations {
            self.assimilation_and_revolution();
            self.imperialistic_competition();
            iterations_run = iter + 1;

            on_iteration(iterations_run, &self.archive, self.empires.len());
            tracing::info!(
                iteration = iterations_run,
                archive_size = self.archive.len(),
                empires = self.empires.len(),
                "ica iteration complete"
            );

            if self.empires.len() <= 1 {
                converged = true;
                break;
            }
        }

        Ok(EngineReport { iterations_run, converged })
    }

    fn decode_new_individual(&mut self) -> Individual {
        let n = self.instance.customers_count();
        let mut permutation: Vec<usize> = (1..=n).collect();
        permutation.shuffle(&mut self.rng);
        let mut solution = decode(self.instance, &permutation, self.config.decode_mode, &mut self.rng);
        solution.hash = self.hasher.hash(&solution);
        Individual { permutation, solution }
    }

    fn initialize_population(&mut self) -> Result<(), EngineError> {
        let mut population: Vec<Individual> = Vec::with_capacity(self.config.population_size);
        let max_attempts = 100 * self.config.population_size.max(1);
        let mut attempts = 0;

        while population.len() < self.config.population_size {
            attempts += 1;
            let individual = self.decode_new_individual();
            let duplicate = self.seen_hashes.contains(&individual.solution.hash);

            if duplicate && attempts <= max_attempts {
                tracing::debug!(attempts, "duplicate initial individual, reshuffling");
                continue;
            }
            if duplicate {
                tracing::warn!("duplicate-reject budget exhausted, accepting duplicate to guarantee progress");
            }

            self.seen_hashes.insert(individual.solution.hash);
            self.archive.submit(individual.solution.clone());
            population.push(individual);
        }

        if population.is_empty() {
            return Err(EngineError::EmptyPopulation);
        }

        let mut num_imperialists = self.config.num_empires;
        if population.len() < num_imperialists {
            num_imperialists = (population.len() / 2).max(1);
            tracing::warn!(num_imperialists, "reduced empire count: population smaller than requested empires");
        }

        let mut solutions: Vec<Solution> = population.iter().map(|ind| ind.solution.clone()).collect();
        let fronts = non_dominated_sort(&mut solutions);
        for front in &fronts {
            crowding_distance(&mut solutions, front);
        }
        for (individual, solution) in population.iter_mut().zip(solutions) {
            individual.solution = solution;
        }

        let mut selected: HashSet<usize> = HashSet::new();
        let mut imperialists: Vec<Individual> = Vec::with_capacity(num_imperialists);
        'fronts: for front in &fronts {
            let mut shuffled = front.clone();
            shuffled.shuffle(&mut self.rng);
            for idx in shuffled {
                if imperialists.len() >= num_imperialists {
                    break 'fronts;
                }
                imperialists.push(population[idx].clone());
                selected.insert(idx);
            }
        }

        self.empires = imperialists
            .into_iter()
            .map(|imperialist| Empire { imperialist, colonies: Vec::new(), power: 0.0 })
            .collect();

        let mut colony_cursor = 0;
        for idx in 0..population.len() {
            if selected.contains(&idx) {
                continue;
            }
            let empire_idx = colony_cursor % self.empires.len();
            self.empires[empire_idx].colonies.push(population[idx].clone());
            colony_cursor += 1;
        }

        for empire in &mut self.empires {
            empire.power = Self::empire_power(empire);
        }

        Ok(())
    }

    fn empire_power(empire: &Empire) -> f64 {
        let imperialist_power = 1.0 / (empire.imperialist.solution.rank as f64 + 1.0);
        if empire.colonies.is_empty() {
            imperialist_power
        } else {
            let mean = empire.colonies.iter().map(|c| 1.0 / (c.solution.rank as f64 + 1.0)).sum::<f64>()
                / empire.colonies.len() as f64;
            imperialist_power + 0.1 * mean
        }
    }

    fn assimilation_and_revolution(&mut self) {
        for empire_idx in 0..self.empires.len() {
            let colony_count = self.empires[empire_idx].colonies.len();
            for colony_idx in 0..colony_count {
                let (imperialist_perm, colony_perm) = {
                    let empire = &self.empires[empire_idx];
                    (empire.imperialist.permutation.clone(), empire.colonies[colony_idx].permutation.clone())
                };

                let mut child = order_crossover(&imperialist_perm, &colony_perm, &mut self.rng);
                swap_mutate(&mut child, OX_MUTATION_RATE, &mut self.rng);

                let mut child_solution = decode(self.instance, &child, self.config.decode_mode, &mut self.rng);
                child_solution.hash = self.hasher.hash(&child_solution);

                if self.seen_hashes.contains(&child_solution.hash) {
                    swap_mutate(&mut child, OX_RETRY_MUTATION_RATE, &mut self.rng);
                    child_solution = decode(self.instance, &child, self.config.decode_mode, &mut self.rng);
                    child_solution.hash = self.hasher.hash(&child_solution);

                    if self.seen_hashes.contains(&child_solution.hash) {
                        continue;
                    }
                }
                self.seen_hashes.insert(child_solution.hash);

                let refined = self.local_search.improve(self.instance, &child_solution, self.config.local_search_iterations);
                self.archive.submit(refined.clone());

                let empire = &mut self.empires[empire_idx];
                let colony = &mut empire.colonies[colony_idx];
                if refined.dominates(&colony.solution) {
                    colony.permutation = child;
                    colony.solution = refined;

                    if colony.solution.dominates(&empire.imperialist.solution) {
                        std::mem::swap(&mut empire.imperialist, colony);
                    }
                }
            }

            self.empires[empire_idx].power = Self::empire_power(&self.empires[empire_idx]);
        }
    }

    fn imperialistic_competition(&mut self) {
        if self.empires.len() <= 1 {
            return;
        }

        let weakest_idx = self.weakest_empire_idx();

        if self.empires[weakest_idx].colonies.is_empty() {
            if let Some(strongest_idx) = self.strongest_empire_idx_excluding(weakest_idx) {
                let imperialist = self.empires[weakest_idx].imperialist.clone();
                self.empires[strongest_idx].colonies.push(imperialist);
            }
            self.empires.remove(weakest_idx);
            tracing::info!(remaining = self.empires.len(), "empire collapsed");
            return;
        }

        let colony_idx = self.rng.random_range(0..self.empires[weakest_idx].colonies.len());
        let total_power: f64 = self.empires.iter().map(|e| e.power).sum();
        let pick = self.rng.random_range(0.0..total_power.max(f64::MIN_POSITIVE));

        let mut winner_idx = self.empires.len() - 1;
        let mut running = 0.0;
        for (idx, empire) in self.empires.iter().enumerate() {
            running += empire.power;
            if pick <= running {
                winner_idx = idx;
                break;
            }
        }

        if winner_idx != weakest_idx {
            let colony = self.empires[weakest_idx].colonies.remove(colony_idx);
            self.empires[winner_idx].colonies.push(colony);
        }
    }

    fn weakest_empire_idx(&self) -> usize {
        let mut best = 0;
        for i in 1..self.empires.len() {
            if self.empires[i].power < self.empires[best].power {
                best = i;
            }
        }
        best
    }

    fn strongest_empire_idx_excluding(&self, excluded: usize) -> Option<usize> {
        self.empires
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != excluded)
            .max_by(|a, b| a.1.power.total_cmp(&b.1.power))
            .map(|(idx, _)| idx)
    }
}

/// Order Crossover (OX): copy parent1's [a, b] segment, then fill the rest
/// by scanning parent2 cyclically from just after `b`.
pub fn order_crossover(parent1: &[usize], parent2: &[usize], rng: &mut impl Rng) -> Vec<usize> {
    let n = parent1.len();
    if n < 2 {
        return parent1.to_vec();
    }

    let mut a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n);
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }

    let mut child = vec![0usize; n];
    let mut in_child = vec![false; n + 1];

    for i in a..=b {
        child[i] = parent1[i];
        in_child[parent1[i]] = true;
    }

    let mut child_pos = (b + 1) % n;
    let mut parent_pos = (b + 1) % n;
    while child_pos != a {
        let gene = parent2[parent_pos];
        if !in_child[gene] {
            child[child_pos] = gene;
            in_child[gene] = true;
            child_pos = (child_pos + 1) % n;
        }
        parent_pos = (parent_pos + 1) % n;
    }

    child
}

/// Independently for each position, with probability `rate`, swap it with a
/// uniformly chosen other position.
pub fn swap_mutate(permutation: &mut [usize], rate: f64, rng: &mut impl Rng) {
    let n = permutation.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        if rng.random::<f64>() < rate {
            let j = rng.random_range(0..n);
            permutation.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn order_crossover_is_a_permutation() {
        let parent1 = vec![1, 2, 3, 4, 5, 6, 7];
        let parent2 = vec![3, 5, 7, 2, 1, 6, 4];
        let mut rng = StdRng::seed_from_u64(0);
        let child = order_crossover(&parent1, &parent2, &mut rng);

        let mut sorted = child.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn order_crossover_worked_example() {
        let parent1 = vec![1, 2, 3, 4, 5, 6, 7];
        let parent2 = vec![3, 5, 7, 2, 1, 6, 4];

        // replicate the worked example: cuts 2..4 (0-indexed), segment (3,4,5).
        let (a, b) = (2usize, 4usize);
        let mut child = vec![0usize; 7];
        let mut in_child = vec![false; 8];
        for i in a..=b {
            child[i] = parent1[i];
            in_child[parent1[i]] = true;
        }
        let mut child_pos = (b + 1) % 7;
        let mut parent_pos = (b + 1) % 7;
        while child_pos != a {
            let gene = parent2[parent_pos];
            if !in_child[gene] {
                child[child_pos] = gene;
                in_child[gene] = true;
                child_pos = (child_pos + 1) % 7;
            }
            parent_pos = (parent_pos + 1) % 7;
        }

        assert_eq!(&child[2..=4], &[3, 4, 5]);
        let mut sorted = child.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn swap_mutate_preserves_permutation() {
        let mut permutation = vec![1, 2, 3, 4, 5];
        let mut rng = StdRng::seed_from_u64(5);
        swap_mutate(&mut permutation, 0.5, &mut rng);
        let mut sorted = permutation.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5]);
    }
}
