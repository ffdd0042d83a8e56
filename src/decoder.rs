use rand::Rng;

use crate::evaluator::{
    aggregate_with_drone_override, aggregate_with_truck_override, evaluate, evaluate_drone_trips, evaluate_truck_route,
};
use crate::instance::{DEPOT, Instance};
use crate::solution::Solution;

const TOP_K: usize = 3;

/// Exact mode re-evaluates the whole Solution per candidate; Incremental
/// mode only touches the one route/trip-list the move affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    Exact,
    Incremental,
}

#[derive(Clone, Copy, Debug)]
enum InsertionMove {
    Truck { truck_idx: usize, position: usize },
    DroneAppend { drone_idx: usize, trip_idx: usize },
    DroneNewTrip { drone_idx: usize },
}

struct Candidate {
    mv: InsertionMove,
    cost: f64,
}

/// Greedy best-insertion decoder: assigns every customer in `permutation`
/// exactly once, respecting truck-only constraints and drone feasibility.
pub fn decode(instance: &Instance, permutation: &[usize], mode: DecodeMode, rng: &mut impl Rng) -> Solution {
    let mut solution = Solution::empty(instance);
    let mut served = vec![false; instance.customers_count() + 1];

    for &customer in permutation {
        if customer == DEPOT || served[customer] {
            continue;
        }

        let base = (solution.completion_time, solution.waiting_time);
        let mut candidates = Vec::new();

        collect_truck_candidates(instance, &solution, customer, mode, base, &mut candidates);
        if !instance.is_truck_only(customer) {
            collect_drone_candidates(instance, &solution, customer, mode, base, &mut candidates);
        }

        if candidates.is_empty() {
            tracing::warn!(customer, "no feasible insertion found, dropping customer");
            continue;
        }

        candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        let top_k = candidates.len().min(TOP_K);
        let chosen = candidates.swap_remove(rng.random_range(0..top_k)).mv;

        commit(instance, &mut solution, customer, chosen);
        served[customer] = true;
    }

    evaluate(instance, &mut solution);
    solution
}

fn truck_with_customer(customers: &[usize], customer: usize, position: usize) -> Vec<usize> {
    let mut result = customers.to_vec();
    result.insert(position.min(result.len()), customer);
    result
}

fn collect_truck_candidates(
    instance: &Instance,
    solution: &Solution,
    customer: usize,
    mode: DecodeMode,
    base: (f64, f64),
    out: &mut Vec<Candidate>,
) {
    for truck_idx in 0..instance.trucks_count {
        let route = &solution.truck_routes[truck_idx];
        for position in 0..=route.customers.len() {
            let new_customers = truck_with_customer(&route.customers, customer, position);
            let new_route = evaluate_truck_route(instance, &new_customers);

            let (new_completion, new_waiting) = match mode {
                DecodeMode::Exact => {
                    let mut clone = solution.clone();
                    clone.truck_routes[truck_idx] = new_route;
                    evaluate(instance, &mut clone);
                    (clone.completion_time, clone.waiting_time)
                }
                DecodeMode::Incremental => aggregate_with_truck_override(solution, truck_idx, &new_route),
            };

            if !new_completion.is_finite() {
                continue;
            }

            let cost = 0.5 * (new_completion - base.0) + 0.5 * (new_waiting - base.1);
            out.push(Candidate { mv: InsertionMove::Truck { truck_idx, position }, cost });
        }
    }
}

fn collect_drone_candidates(
    instance: &Instance,
    solution: &Solution,
    customer: usize,
    mode: DecodeMode,
    base: (f64, f64),
    out: &mut Vec<Candidate>,
) {
    let demand = instance.demand(customer);

    for drone_idx in 0..instance.drones_count {
        let trips = &solution.drone_trips[drone_idx];

        for trip_idx in 0..trips.len() {
            let load: f64 = trips[trip_idx].customers.iter().map(|&c| instance.demand(c)).sum();
            if load + demand > instance.drone.max_capacity {
                continue;
            }

            let mut customer_trips: Vec<Vec<usize>> = trips.iter().map(|route| route.customers.clone()).collect();
            customer_trips[trip_idx].push(customer);

            let Some(new_trips) = evaluate_drone_trips(instance, &customer_trips) else {
                continue;
            };

            let (new_completion, new_waiting) = match mode {
                DecodeMode::Exact => {
                    let mut clone = solution.clone();
                    clone.drone_trips[drone_idx] = new_trips;
                    evaluate(instance, &mut clone);
                    (clone.completion_time, clone.waiting_time)
                }
                DecodeMode::Incremental => aggregate_with_drone_override(solution, drone_idx, &new_trips),
            };

            if !new_completion.is_finite() {
                continue;
            }

            let cost = 0.5 * (new_completion - base.0) + 0.5 * (new_waiting - base.1);
            out.push(Candidate { mv: InsertionMove::DroneAppend { drone_idx, trip_idx }, cost });
        }

        if demand > instance.drone.max_capacity {
            continue;
        }

        let mut customer_trips: Vec<Vec<usize>> = trips.iter().map(|route| route.customers.clone()).collect();
        customer_trips.push(vec![customer]);

        let Some(new_trips) = evaluate_drone_trips(instance, &customer_trips) else {
            continue;
        };

        let (new_completion, new_waiting) = match mode {
            DecodeMode::Exact => {
                let mut clone = solution.clone();
                clone.drone_trips[drone_idx] = new_trips;
                evaluate(instance, &mut clone);
                (clone.completion_time, clone.waiting_time)
            }
            DecodeMode::Incremental => aggregate_with_drone_override(solution, drone_idx, &new_trips),
        };

        if !new_completion.is_finite() {
            continue;
        }

        let cost = 0.5 * (new_completion - base.0) + 0.5 * (new_waiting - base.1);
        out.push(Candidate { mv: InsertionMove::DroneNewTrip { drone_idx }, cost });
    }
}

fn commit(instance: &Instance, solution: &mut Solution, customer: usize, mv: InsertionMove) {
    match mv {
        InsertionMove::Truck { truck_idx, position } => {
            let new_customers = truck_with_customer(&solution.truck_routes[truck_idx].customers, customer, position);
            solution.truck_routes[truck_idx] = evaluate_truck_route(instance, &new_customers);
        }
        InsertionMove::DroneAppend { drone_idx, trip_idx } => {
            let mut customer_trips: Vec<Vec<usize>> =
                solution.drone_trips[drone_idx].iter().map(|route| route.customers.clone()).collect();
            customer_trips[trip_idx].push(customer);
            solution.drone_trips[drone_idx] =
                evaluate_drone_trips(instance, &customer_trips).expect("move was validated feasible");
        }
        InsertionMove::DroneNewTrip { drone_idx } => {
            let mut customer_trips: Vec<Vec<usize>> =
                solution.drone_trips[drone_idx].iter().map(|route| route.customers.clone()).collect();
            customer_trips.push(vec![customer]);
            solution.drone_trips[drone_idx] =
                evaluate_drone_trips(instance, &customer_trips).expect("move was validated feasible");
        }
    }
    evaluate(instance, solution);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Customer, DroneParams, TimeInterval, TruckParams};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn instance_with(customers: Vec<Customer>, trucks: usize, drones: usize) -> Instance {
        let truck = TruckParams {
            max_speed: 20.0,
            intervals: vec![
                TimeInterval { start: 0.0, end: 3600.0, sigma: 0.8 },
                TimeInterval { start: 3600.0, end: 7200.0, sigma: 1.0 },
                TimeInterval { start: 7200.0, end: 14400.0, sigma: 0.8 },
            ],
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

    fn customer(id: usize, x: f64, y: f64, truck_only: bool) -> Customer {
        Customer { id, x, y, demand: 1.0, truck_only, service_time_truck: 0.0, service_time_drone: 0.0 }
    }

    #[test]
    fn permutation_preservation_both_modes() {
        let instance =
            instance_with(vec![customer(1, 10.0, 0.0, false), customer(2, 0.0, 10.0, false), customer(3, -10.0, 0.0, true)], 2, 1);

        for mode in [DecodeMode::Exact, DecodeMode::Incremental] {
            let mut rng = StdRng::seed_from_u64(7);
            let solution = decode(&instance, &[1, 2, 3], mode, &mut rng);

            let mut served: Vec<usize> = solution.truck_routes.iter().flat_map(|r| r.customers.clone()).collect();
            served.extend(solution.drone_trips.iter().flat_map(|trips| trips.iter().flat_map(|t| t.customers.clone())));
            served.sort_unstable();
            assert_eq!(served, vec![1, 2, 3]);
            assert!(!served.contains(&DEPOT));
        }
    }

    #[test]
    fn truck_only_never_assigned_to_drone() {
        let instance = instance_with(vec![customer(1, 10.0, 0.0, true)], 1, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let solution = decode(&instance, &[1], DecodeMode::Incremental, &mut rng);
        assert!(solution.drone_trips.iter().all(|trips| trips.iter().all(|t| !t.customers.contains(&1))));
    }

    #[test]
    fn same_seed_same_permutation_is_deterministic() {
        let instance = instance_with(vec![customer(1, 10.0, 0.0, false), customer(2, 5.0, 5.0, false)], 1, 1);

        let mut rng_a = StdRng::seed_from_u64(99);
        let a = decode(&instance, &[1, 2], DecodeMode::Incremental, &mut rng_a);

        let mut rng_b = StdRng::seed_from_u64(99);
        let b = decode(&instance, &[1, 2], DecodeMode::Incremental, &mut rng_b);

        assert_eq!(a.truck_routes.iter().map(|r| r.customers.clone()).collect::<Vec<_>>(), b.truck_routes.iter().map(|r| r.customers.clone()).collect::<Vec<_>>());
        assert!((a.completion_time - b.completion_time).abs() < 1e-9);
    }

    #[test]
    fn exact_and_incremental_modes_agree_on_score() {
        let instance = instance_with(
            vec![customer(1, 10.0, 0.0, false), customer(2, 0.0, 10.0, false), customer(3, -5.0, -5.0, false)],
            2,
            1,
        );

        let mut rng_exact = StdRng::seed_from_u64(3);
        let exact = decode(&instance, &[3, 1, 2], DecodeMode::Exact, &mut rng_exact);

        let mut rng_incr = StdRng::seed_from_u64(3);
        let incremental = decode(&instance, &[3, 1, 2], DecodeMode::Incremental, &mut rng_incr);

        assert!((exact.completion_time - incremental.completion_time).abs() < 1e-6);
        assert!((exact.waiting_time - incremental.waiting_time).abs() < 1e-6);
    }
}
