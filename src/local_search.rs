use std::collections::VecDeque;

use crate::evaluator::{evaluate, evaluate_drone_trips, evaluate_truck_route};
use crate::instance::Instance;
use crate::solution::Solution;

const DEFAULT_TENURE: usize = 7;
const STALL_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum MoveKind {
    Relocate,
    Swap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TabuEntry {
    customer: usize,
    kind: MoveKind,
}

#[derive(Clone, Copy, Debug)]
enum Loc {
    Truck(usize, usize),
    Drone(usize, usize, usize),
}

fn is_drone_loc(loc: Loc) -> bool {
    matches!(loc, Loc::Drone(..))
}

/// Plain customer-id layout a move is applied to before re-decoding, mirroring
/// the tagged-variant move representation.
#[derive(Clone)]
struct RawLayout {
    truck: Vec<Vec<usize>>,
    drone: Vec<Vec<Vec<usize>>>,
}

fn raw_layout(solution: &Solution) -> RawLayout {
    RawLayout {
        truck: solution.truck_routes.iter().map(|r| r.customers.clone()).collect(),
        drone: solution
            .drone_trips
            .iter()
            .map(|trips| trips.iter().map(|r| r.customers.clone()).collect())
            .collect(),
    }
}

fn decode_raw(instance: &Instance, layout: &RawLayout) -> Option<Solution> {
    let mut solution = Solution::empty(instance);
    for (i, customers) in layout.truck.iter().enumerate() {
        solution.truck_routes[i] = evaluate_truck_route(instance, customers);
    }
    for (i, trips) in layout.drone.iter().enumerate() {
        solution.drone_trips[i] = evaluate_drone_trips(instance, trips)?;
    }
    evaluate(instance, &mut solution);
    Some(solution)
}

fn locate(layout: &RawLayout, customer: usize) -> Option<Loc> {
    for (ti, route) in layout.truck.iter().enumerate() {
        if let Some(pos) = route.iter().position(|&c| c == customer) {
            return Some(Loc::Truck(ti, pos));
        }
    }
    for (di, trips) in layout.drone.iter().enumerate() {
        for (tripi, trip) in trips.iter().enumerate() {
            if let Some(pos) = trip.iter().position(|&c| c == customer) {
                return Some(Loc::Drone(di, tripi, pos));
            }
        }
    }
    None
}

fn set_at(layout: &mut RawLayout, loc: Loc, customer: usize) {
    match loc {
        Loc::Truck(ti, pos) => layout.truck[ti][pos] = customer,
        Loc::Drone(di, tripi, pos) => layout.drone[di][tripi][pos] = customer,
    }
}

fn remove_at(layout: &RawLayout, loc: Loc) -> RawLayout {
    let mut result = layout.clone();
    match loc {
        Loc::Truck(ti, pos) => {
            result.truck[ti].remove(pos);
        }
        Loc::Drone(di, tripi, pos) => {
            result.drone[di][tripi].remove(pos);
        }
    }
    result
}

fn all_served(solution: &Solution) -> Vec<usize> {
    let mut customers: Vec<usize> = solution.truck_routes.iter().flat_map(|r| r.customers.clone()).collect();
    customers.extend(solution.drone_trips.iter().flat_map(|trips| trips.iter().flat_map(|t| t.customers.clone())));
    customers
}

fn delta_cost(base: (f64, f64), neighbor: &Solution) -> f64 {
    0.5 * (neighbor.completion_time - base.0) + 0.5 * (neighbor.waiting_time - base.1)
}

/// Tabu-guarded relocate/swap improver.
pub struct LocalSearch {
    tenure: usize,
}

impl LocalSearch {
    pub fn new(tenure: usize) -> Self {
        LocalSearch { tenure }
    }

    pub fn default_tenure() -> Self {
        Self::new(DEFAULT_TENURE)
    }

    pub fn improve(&self, instance: &Instance, start: &Solution, iterations: usize) -> Solution {
        let mut current = start.clone();
        let mut best = start.clone();
        let mut tabu: VecDeque<TabuEntry> = VecDeque::new();
        let mut stall = 0;

        for _ in 0..iterations {
            let Some((neighbor, entries)) = self.find_best_move(instance, &current, &tabu) else {
                break;
            };

            for entry in entries {
                if !tabu.contains(&entry) {
                    tabu.push_back(entry);
                    if tabu.len() > self.tenure {
                        tabu.pop_front();
                    }
                }
            }

            if neighbor.dominates(&best) {
                best = neighbor.clone();
                stall = 0;
            } else {
                stall += 1;
            }

            current = neighbor;

            if stall >= STALL_LIMIT {
                break;
            }
        }

        best
    }

    fn find_best_move(
        &self,
        instance: &Instance,
        current: &Solution,
        tabu: &VecDeque<TabuEntry>,
    ) -> Option<(Solution, Vec<TabuEntry>)> {
        let layout = raw_layout(current);
        let served = all_served(current);
        let base = (current.completion_time, current.waiting_time);

        let mut best: Option<(Solution, Vec<TabuEntry>, f64)> = None;

        for &customer in &served {
            let entry = TabuEntry { customer, kind: MoveKind::Relocate };
            if tabu.contains(&entry) {
                continue;
            }
            let Some(loc) = locate(&layout, customer) else { continue };
            let without = remove_at(&layout, loc);

            for truck_idx in 0..instance.trucks_count {
                for position in 0..=without.truck[truck_idx].len() {
                    let mut candidate = without.clone();
                    candidate.truck[truck_idx].insert(position, customer);
                    if let Some(neighbor) = decode_raw(instance, &candidate) {
                        if neighbor.is_feasible() {
                            let cost = delta_cost(base, &neighbor);
                            if best.as_ref().is_none_or(|(_, _, c)| cost < *c) {
                                best = Some((neighbor, vec![entry], cost));
                            }
                        }
                    }
                }
            }

            if !instance.is_truck_only(customer) {
                for drone_idx in 0..instance.drones_count {
                    let mut candidate = without.clone();
                    candidate.drone[drone_idx].push(vec![customer]);
                    if let Some(neighbor) = decode_raw(instance, &candidate) {
                        if neighbor.is_feasible() {
                            let cost = delta_cost(base, &neighbor);
                            if best.as_ref().is_none_or(|(_, _, c)| cost < *c) {
                                best = Some((neighbor, vec![entry], cost));
                            }
                        }
                    }
                }
            }
        }

        for i in 0..served.len() {
            for j in (i + 1)..served.len() {
                let (c1, c2) = (served[i], served[j]);
                let e1 = TabuEntry { customer: c1, kind: MoveKind::Swap };
                let e2 = TabuEntry { customer: c2, kind: MoveKind::Swap };
                if tabu.contains(&e1) || tabu.contains(&e2) {
                    continue;
                }

                let (Some(loc1), Some(loc2)) = (locate(&layout, c1), locate(&layout, c2)) else { continue };
                if instance.is_truck_only(c1) && is_drone_loc(loc2) {
                    continue;
                }
                if instance.is_truck_only(c2) && is_drone_loc(loc1) {
                    continue;
                }

                let mut candidate = layout.clone();
                set_at(&mut candidate, loc1, c2);
                set_at(&mut candidate, loc2, c1);

                if let Some(neighbor) = decode_raw(instance, &candidate) {
                    if neighbor.is_feasible() {
                        let cost = delta_cost(base, &neighbor);
                        if best.as_ref().is_none_or(|(_, _, c)| cost < *c) {
                            best = Some((neighbor, vec![e1, e2], cost));
                        }
                    }
                }
            }
        }

        best.map(|(solution, entries, _)| (solution, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodeMode, decode};
    use crate::instance::{Customer, DroneParams, TimeInterval, TruckParams};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn instance_with(customers: Vec<Customer>, trucks: usize, drones: usize) -> Instance {
        let truck = TruckParams {
            max_speed: 20.0,
            intervals: vec![TimeInterval { start: 0.0, end: f64::INFINITY, sigma: 1.0 }],
        };
        let drone = DroneParams {
            max_capacity: 5.0,
            max_energy: 500.0,
            takeoff_speed: 5.0,
            cruise_speed: 15.0,
            landing_speed: 5.0,
            max_flight_time: 1800.0,
            beta: 1.0,
            gamma: 100.0,
        };
        Instance::new(customers, trucks, drones, drone, truck)
    }

    fn customer(id: usize, x: f64, y: f64) -> Customer {
        Customer { id, x, y, demand: 1.0, truck_only: false, service_time_truck: 0.0, service_time_drone: 0.0 }
    }

    #[test]
    fn improve_never_returns_worse_than_start() {
        let instance = instance_with(vec![customer(1, 10.0, 0.0), customer(2, 0.0, 10.0), customer(3, -5.0, -5.0)], 1, 1);
        let mut rng = StdRng::seed_from_u64(11);
        let start = decode(&instance, &[1, 2, 3], DecodeMode::Incremental, &mut rng);

        let local_search = LocalSearch::default_tenure();
        let improved = local_search.improve(&instance, &start, 50);

        assert!(!start.dominates(&improved));
    }
}
