use crate::instance::{DEPOT, Instance};
use crate::route::Route;
use crate::solution::Solution;

/// Evaluates a single truck route in isolation: time-dependent travel,
/// service time at each stop, and the return-minus-pickup waiting rule.
pub fn evaluate_truck_route(instance: &Instance, customers: &[usize]) -> Route {
    if customers.is_empty() {
        return Route::default();
    }

    let mut clock = 0.0;
    let mut previous = DEPOT;
    let mut arrivals = Vec::with_capacity(customers.len());

    for &customer in customers {
        clock += instance.truck.travel_time(clock, instance.distance(previous, customer));
        arrivals.push(clock);
        clock += instance.service_time_truck(customer);
        previous = customer;
    }
    clock += instance.truck.travel_time(clock, instance.distance(previous, DEPOT));

    let completion_time = clock;
    let waiting_time = arrivals.iter().map(|&arrival| completion_time - arrival).sum();

    Route {
        customers: customers.to_vec(),
        completion_time,
        waiting_time,
    }
}

/// Evaluates one drone trip starting its clock at `start_clock` (so trips
/// can be serialized one after another on the same drone). Returns `None`
/// if the trip violates capacity or energy.
pub fn evaluate_drone_trip(instance: &Instance, customers: &[usize], start_clock: f64) -> Option<Route> {
    if customers.is_empty() {
        return Some(Route::default());
    }

    let drone = &instance.drone;
    let total_demand: f64 = customers.iter().map(|&c| instance.demand(c)).sum();
    if total_demand > drone.max_capacity {
        return None;
    }

    let mut load = total_demand;
    let mut clock = start_clock;
    let mut energy = 0.0;
    let mut previous = DEPOT;
    let mut arrivals = Vec::with_capacity(customers.len());

    for &customer in customers {
        let leg_distance = instance.distance(previous, customer);
        let leg_time = leg_distance / drone.cruise_speed;
        energy += drone.power(load) * leg_time;
        clock += leg_time;
        arrivals.push(clock);
        clock += instance.service_time_drone(customer);
        load -= instance.demand(customer);
        previous = customer;
    }

    let return_distance = instance.distance(previous, DEPOT);
    let return_time = return_distance / drone.cruise_speed;
    energy += drone.power(load) * return_time;
    clock += return_time;

    if energy > drone.max_energy {
        return None;
    }

    let completion_time = clock;
    let waiting_time = arrivals.iter().map(|&arrival| completion_time - arrival).sum();

    Some(Route {
        customers: customers.to_vec(),
        completion_time,
        waiting_time,
    })
}

/// Evaluates an ordered sequence of trips for one drone, serializing them:
/// trip N+1 starts when trip N ends. Returns `None` if any trip is infeasible.
pub fn evaluate_drone_trips(instance: &Instance, trips: &[Vec<usize>]) -> Option<Vec<Route>> {
    let mut clock = 0.0;
    let mut routes = Vec::with_capacity(trips.len());
    for trip in trips {
        let route = evaluate_drone_trip(instance, trip, clock)?;
        if !route.is_empty() {
            clock = route.completion_time;
        }
        routes.push(route);
    }
    Some(routes)
}

/// Re-evaluates every route/trip in `solution` in place, then sets the
/// Solution-level aggregates, marking the whole Solution infeasible
/// (+∞/+∞) if any drone trip violates capacity or energy.
pub fn evaluate(instance: &Instance, solution: &mut Solution) {
    let mut completions: Vec<f64> = Vec::new();
    let mut waiting_time = 0.0;
    let mut feasible = true;

    for route in &mut solution.truck_routes {
        *route = evaluate_truck_route(instance, &route.customers);
        if !route.is_empty() {
            completions.push(route.completion_time);
        }
        waiting_time += route.waiting_time;
    }

    for trips in &mut solution.drone_trips {
        let customer_trips: Vec<Vec<usize>> = trips.iter().map(|route| route.customers.clone()).collect();
        match evaluate_drone_trips(instance, &customer_trips) {
            Some(routes) => {
                for route in &routes {
                    if !route.is_empty() {
                        completions.push(route.completion_time);
                    }
                    waiting_time += route.waiting_time;
                }
                *trips = routes;
            }
            None => feasible = false,
        }
    }

    if feasible {
        solution.completion_time = completions.into_iter().fold(0.0, f64::max);
        solution.waiting_time = waiting_time;
    } else {
        solution.completion_time = f64::INFINITY;
        solution.waiting_time = f64::INFINITY;
    }
}

/// Aggregate (completion, waiting) as if `truck_idx`'s route were `override_route`,
/// without touching any other route's cached fields. The closed-form
/// re-evaluation path used by the Decoder's incremental mode.
pub fn aggregate_with_truck_override(solution: &Solution, truck_idx: usize, override_route: &Route) -> (f64, f64) {
    aggregate_with_override(solution, Some((truck_idx, override_route)), None)
}

/// Same as [`aggregate_with_truck_override`] but for one drone's whole trip list.
pub fn aggregate_with_drone_override(solution: &Solution, drone_idx: usize, override_trips: &[Route]) -> (f64, f64) {
    aggregate_with_override(solution, None, Some((drone_idx, override_trips)))
}

fn aggregate_with_override(
    solution: &Solution,
    truck_override: Option<(usize, &Route)>,
    drone_override: Option<(usize, &[Route])>,
) -> (f64, f64) {
    let mut completion = 0.0f64;
    let mut waiting = 0.0;

    for (idx, route) in solution.truck_routes.iter().enumerate() {
        let route = match truck_override {
            Some((i, override_route)) if i == idx => override_route,
            _ => route,
        };
        if !route.is_empty() {
            completion = completion.max(route.completion_time);
        }
        waiting += route.waiting_time;
    }

    for (idx, trips) in solution.drone_trips.iter().enumerate() {
        let trips: &[Route] = match drone_override {
            Some((i, override_trips)) if i == idx => override_trips,
            _ => trips,
        };
        for route in trips {
            if !route.is_empty() {
                completion = completion.max(route.completion_time);
            }
            waiting += route.waiting_time;
        }
    }

    (completion, waiting)
}
