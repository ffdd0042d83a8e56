use crate::solution::Solution;

/// Dominance (minimization over both objectives): `a` dominates `b` iff
/// componentwise ≤ and strictly < in at least one component.
pub fn dominates(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 <= b.0 && a.1 <= b.1 && (a.0 < b.0 || a.1 < b.1)
}

/// Deb's O(M·N²) non-dominated sorting. Sets each solution's 1-indexed rank
/// in place and returns the fronts as index groups into `solutions`.
pub fn non_dominated_sort(solutions: &mut [Solution]) -> Vec<Vec<usize>> {
    let n = solutions.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if solutions[i].dominates(&solutions[j]) {
                dominated_by[i].push(j);
            } else if solutions[j].dominates(&solutions[i]) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            solutions[i].rank = 1;
            fronts[0].push(i);
        }
    }

    let mut front_idx = 0;
    while !fronts[front_idx].is_empty() {
        let mut next_front = Vec::new();
        for &i in &fronts[front_idx] {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    solutions[j].rank = front_idx + 2;
                    next_front.push(j);
                }
            }
        }
        front_idx += 1;
        fronts.push(next_front);
    }
    fronts.pop(); // trailing empty front
    fronts
}

/// Crowding distance within one front. Extremes get +∞; the span
/// term is skipped when objMax − objMin < 1e-6.
pub fn crowding_distance(solutions: &mut [Solution], front: &[usize]) {
    for &i in front {
        solutions[i].crowding_distance = 0.0;
    }
    if front.len() <= 2 {
        for &i in front {
            solutions[i].crowding_distance = f64::INFINITY;
        }
        return;
    }

    for objective in 0..2 {
        let value = |s: &Solution| if objective == 0 { s.completion_time } else { s.waiting_time };

        let mut sorted = front.to_vec();
        sorted.sort_by(|&a, &b| value(&solutions[a]).total_cmp(&value(&solutions[b])));

        let first = sorted[0];
        let last = sorted[sorted.len() - 1];
        solutions[first].crowding_distance = f64::INFINITY;
        solutions[last].crowding_distance = f64::INFINITY;

        let span = value(&solutions[last]) - value(&solutions[first]);
        if span < 1e-6 {
            continue;
        }

        for w in 1..sorted.len() - 1 {
            let prev = value(&solutions[sorted[w - 1]]);
            let next = value(&solutions[sorted[w + 1]]);
            let cur = sorted[w];
            if solutions[cur].crowding_distance.is_finite() {
                solutions[cur].crowding_distance += (next - prev) / span;
            }
        }
    }
}

/// A set of pairwise non-dominated, feasible Solutions.
#[derive(Default)]
pub struct Archive {
    solutions: Vec<Solution>,
}

impl Archive {
    pub fn new() -> Self {
        Archive { solutions: Vec::new() }
    }

    /// Submits `candidate`: rejects infeasible solutions, removes every
    /// archive member it dominates, and inserts it unless something
    /// remaining in the archive dominates it.
    pub fn submit(&mut self, candidate: Solution) {
        if !candidate.is_feasible() {
            return;
        }

        let mut dominated = false;
        self.solutions.retain(|existing| {
            if candidate.dominates(existing) {
                false
            } else {
                if existing.dominates(&candidate) {
                    dominated = true;
                }
                true
            }
        });

        if !dominated {
            self.solutions.push(candidate);
        }
    }

    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution_with(completion: f64, waiting: f64) -> Solution {
        Solution {
            truck_routes: Vec::new(),
            drone_trips: Vec::new(),
            completion_time: completion,
            waiting_time: waiting,
            rank: 0,
            crowding_distance: 0.0,
            hash: 0,
        }
    }

    #[test]
    fn dominance_requires_strict_improvement_somewhere() {
        assert!(dominates((1.0, 2.0), (1.0, 3.0)));
        assert!(!dominates((1.0, 2.0), (1.0, 2.0)));
        assert!(!dominates((2.0, 1.0), (1.0, 2.0)));
    }

    #[test]
    fn archive_never_holds_mutually_dominated_members() {
        let mut archive = Archive::new();
        archive.submit(solution_with(10.0, 10.0));
        archive.submit(solution_with(5.0, 20.0));
        archive.submit(solution_with(4.0, 9.0)); // dominates both
        assert_eq!(archive.len(), 1);
        assert!((archive.solutions()[0].completion_time - 4.0).abs() < 1e-9);
    }

    #[test]
    fn archive_rejects_infeasible() {
        let mut archive = Archive::new();
        archive.submit(solution_with(f64::INFINITY, f64::INFINITY));
        assert!(archive.is_empty());
    }

    #[test]
    fn non_dominated_sort_ranks_first_front_as_one() {
        let mut solutions = vec![solution_with(1.0, 5.0), solution_with(5.0, 1.0), solution_with(3.0, 3.0)];
        let fronts = non_dominated_sort(&mut solutions);
        assert_eq!(fronts.len(), 1);
        assert!(solutions.iter().all(|s| s.rank == 1));
    }
}
