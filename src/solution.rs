use crate::instance::Instance;
use crate::pareto;
use crate::route::Route;

/// An ordered list of truck routes (one per truck) and drone-trip sequences
/// (one ordered list of trips per drone), plus the two Pareto objectives.
#[derive(Clone, Debug)]
pub struct Solution {
    pub truck_routes: Vec<Route>,
    pub drone_trips: Vec<Vec<Route>>,
    pub completion_time: f64,
    pub waiting_time: f64,
    pub rank: usize,
    pub crowding_distance: f64,
    pub hash: u64,
}

impl Solution {
    pub fn empty(instance: &Instance) -> Self {
        Solution {
            truck_routes: vec![Route::default(); instance.trucks_count],
            drone_trips: vec![Vec::new(); instance.drones_count],
            completion_time: 0.0,
            waiting_time: 0.0,
            rank: 0,
            crowding_distance: 0.0,
            hash: 0,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.completion_time.is_finite()
    }

    pub fn objectives(&self) -> (f64, f64) {
        (self.completion_time, self.waiting_time)
    }

    pub fn dominates(&self, other: &Solution) -> bool {
        pareto::dominates(self.objectives(), other.objectives())
    }
}

/// Pairs a customer permutation with its decoded Solution.
#[derive(Clone, Debug)]
pub struct Individual {
    pub permutation: Vec<usize>,
    pub solution: Solution,
}
