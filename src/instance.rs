/// The depot: implicit origin and destination of every route and trip.
pub const DEPOT: usize = 0;

#[derive(Clone, Debug)]
pub struct Customer {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: f64,
    pub truck_only: bool,
    pub service_time_truck: f64,
    pub service_time_drone: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
    pub sigma: f64,
}

#[derive(Clone, Debug)]
pub struct TruckParams {
    pub max_speed: f64,
    pub intervals: Vec<TimeInterval>,
}

impl TruckParams {
    /// Speed factor in effect at `time`, and the end of that interval (±∞ past the last one).
    fn speed_factor_at(&self, time: f64) -> (f64, f64) {
        for interval in &self.intervals {
            if time < interval.end {
                return (interval.sigma, interval.end);
            }
        }
        let last = self
            .intervals
            .last()
            .expect("truck must have at least one time interval");
        (last.sigma, f64::INFINITY)
    }

    /// Time to cover `distance` starting the clock at `start`.
    pub fn travel_time(&self, start: f64, distance: f64) -> f64 {
        let mut remaining = distance;
        let mut clock = start;
        let mut elapsed = 0.0;
        loop {
            let (sigma, end) = self.speed_factor_at(clock);
            let speed = sigma * self.max_speed;
            if end.is_infinite() {
                return elapsed + remaining / speed;
            }
            let reachable = speed * (end - clock);
            if reachable >= remaining {
                return elapsed + remaining / speed;
            }
            elapsed += end - clock;
            remaining -= reachable;
            clock = end;
        }
    }
}

#[derive(Clone, Debug)]
pub struct DroneParams {
    pub max_capacity: f64,
    pub max_energy: f64,
    pub takeoff_speed: f64,
    pub cruise_speed: f64,
    pub landing_speed: f64,
    pub max_flight_time: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl DroneParams {
    /// Instantaneous power while carrying `load`.
    pub fn power(&self, load: f64) -> f64 {
        self.beta * load + self.gamma
    }
}

#[derive(Clone, Debug)]
pub struct Instance {
    pub trucks_count: usize,
    pub drones_count: usize,
    pub customers: Vec<Customer>,
    pub drone: DroneParams,
    pub truck: TruckParams,
    distances: Vec<Vec<f64>>,
}

impl Instance {
    pub fn new(
        customers: Vec<Customer>,
        trucks_count: usize,
        drones_count: usize,
        drone: DroneParams,
        truck: TruckParams,
    ) -> Self {
        let distances = Self::build_distances(&customers);
        Instance {
            trucks_count,
            drones_count,
            customers,
            drone,
            truck,
            distances,
        }
    }

    pub fn customers_count(&self) -> usize {
        self.customers.len()
    }

    /// Euclidean distance between node `a` and node `b`, where 0 is the depot.
    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.distances[a][b]
    }

    pub fn demand(&self, customer: usize) -> f64 {
        if customer == DEPOT {
            0.0
        } else {
            self.customers[customer - 1].demand
        }
    }

    pub fn is_truck_only(&self, customer: usize) -> bool {
        customer != DEPOT && self.customers[customer - 1].truck_only
    }

    pub fn service_time_truck(&self, customer: usize) -> f64 {
        if customer == DEPOT {
            0.0
        } else {
            self.customers[customer - 1].service_time_truck
        }
    }

    pub fn service_time_drone(&self, customer: usize) -> f64 {
        if customer == DEPOT {
            0.0
        } else {
            self.customers[customer - 1].service_time_drone
        }
    }

    fn build_distances(customers: &[Customer]) -> Vec<Vec<f64>> {
        let n = customers.len() + 1;
        let mut points = Vec::with_capacity(n);
        points.push((0.0, 0.0));
        points.extend(customers.iter().map(|c| (c.x, c.y)));

        let mut distances = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let (xi, yi) = points[i];
                let (xj, yj) = points[j];
                let d = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
                distances[i][j] = d;
                distances[j][i] = d;
            }
        }
        distances
    }
}
