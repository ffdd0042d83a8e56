use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::instance::Instance;
use crate::solution::Solution;

/// Number of trip slots reserved per drone in the route-id space, large
/// enough to cover any trip count seen in practice.
pub const DRONE_TRIP_STRIDE: usize = 10;

/// Position-aware Zobrist hash: a dense 3-D table keyed by
/// (customer-1, route-slot, position), built once from a fixed seed and
/// read-only thereafter.
pub struct SolutionHasher {
    table: Vec<Vec<Vec<u64>>>,
    trucks_count: usize,
}

impl SolutionHasher {
    pub fn new(instance: &Instance, seed: u64) -> Self {
        let customers_count = instance.customers_count();
        let max_routes = instance.trucks_count + instance.drones_count * DRONE_TRIP_STRIDE;
        let max_position = customers_count.max(1);

        let mut rng = StdRng::seed_from_u64(seed);
        let table = (0..customers_count)
            .map(|_| {
                (0..max_routes)
                    .map(|_| (0..max_position).map(|_| rng.random::<u64>()).collect())
                    .collect()
            })
            .collect();

        SolutionHasher { table, trucks_count: instance.trucks_count }
    }

    /// Missing keys (route-slot or position beyond reservation) contribute 0.
    fn entry(&self, customer: usize, route_slot: usize, position: usize) -> u64 {
        self.table
            .get(customer - 1)
            .and_then(|routes| routes.get(route_slot))
            .and_then(|positions| positions.get(position))
            .copied()
            .unwrap_or(0)
    }

    pub fn hash(&self, solution: &Solution) -> u64 {
        let mut hash = 0u64;

        for (truck_idx, route) in solution.truck_routes.iter().enumerate() {
            for (position, &customer) in route.customers.iter().enumerate() {
                hash ^= self.entry(customer, truck_idx, position);
            }
        }

        for (drone_idx, trips) in solution.drone_trips.iter().enumerate() {
            for (trip_idx, trip) in trips.iter().enumerate() {
                let route_slot = self.trucks_count + drone_idx * DRONE_TRIP_STRIDE + trip_idx;
                for (position, &customer) in trip.customers.iter().enumerate() {
                    hash ^= self.entry(customer, route_slot, position);
                }
            }
        }

        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Customer, DroneParams, TimeInterval, TruckParams};
    use crate::route::Route;

    fn tiny_instance() -> Instance {
        let customers = (1..=3)
            .map(|id| Customer {
                id,
                x: id as f64,
                y: 0.0,
                demand: 1.0,
                truck_only: false,
                service_time_truck: 0.0,
                service_time_drone: 0.0,
            })
            .collect();
        let truck = TruckParams {
            max_speed: 10.0,
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
            gamma: 1.0,
        };
        Instance::new(customers, 2, 1, drone, truck)
    }

    #[test]
    fn identical_layouts_hash_equal() {
        let instance = tiny_instance();
        let hasher = SolutionHasher::new(&instance, 42);

        let mut a = Solution::empty(&instance);
        a.truck_routes[0] = Route { customers: vec![1, 2], completion_time: 1.0, waiting_time: 1.0 };

        let mut b = Solution::empty(&instance);
        b.truck_routes[0] = Route { customers: vec![1, 2], completion_time: 99.0, waiting_time: 99.0 };

        assert_eq!(hasher.hash(&a), hasher.hash(&b));
    }

    #[test]
    fn different_positions_hash_differently() {
        let instance = tiny_instance();
        let hasher = SolutionHasher::new(&instance, 42);

        let mut a = Solution::empty(&instance);
        a.truck_routes[0] = Route { customers: vec![1, 2], completion_time: 0.0, waiting_time: 0.0 };

        let mut b = Solution::empty(&instance);
        b.truck_routes[0] = Route { customers: vec![2, 1], completion_time: 0.0, waiting_time: 0.0 };

        assert_ne!(hasher.hash(&a), hasher.hash(&b));
    }

    #[test]
    fn different_vehicle_hashes_differently() {
        let instance = tiny_instance();
        let hasher = SolutionHasher::new(&instance, 42);

        let mut a = Solution::empty(&instance);
        a.truck_routes[0] = Route { customers: vec![1], completion_time: 0.0, waiting_time: 0.0 };

        let mut b = Solution::empty(&instance);
        b.truck_routes[1] = Route { customers: vec![1], completion_time: 0.0, waiting_time: 0.0 };

        assert_ne!(hasher.hash(&a), hasher.hash(&b));
    }
}
