use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::InstanceError;
use crate::instance::{Customer, DroneParams, Instance, TimeInterval, TruckParams};

const DRONE_MAX_CAPACITY: f64 = 5.0;
const DRONE_MAX_ENERGY: f64 = 500.0;
const DRONE_TAKEOFF_SPEED: f64 = 5.0;
const DRONE_CRUISE_SPEED: f64 = 15.0;
const DRONE_LANDING_SPEED: f64 = 5.0;
const DRONE_GAMMA: f64 = 100.0;
const TRUCK_MAX_SPEED: f64 = 20.0;

fn truck_intervals() -> Vec<TimeInterval> {
    vec![
        TimeInterval { start: 0.0, end: 3600.0, sigma: 0.8 },
        TimeInterval { start: 3600.0, end: 7200.0, sigma: 1.0 },
        TimeInterval { start: 7200.0, end: 14400.0, sigma: 0.8 },
    ]
}

/// Extracts the trailing number on a `<label> <value>` header line.
fn header_number(lines: &[&str], line_no: usize, label: &'static str) -> Result<f64, InstanceError> {
    let text = lines.get(line_no - 1).ok_or(InstanceError::Header { line: line_no, label })?;
    let re = Regex::new(r"(-?\d+(?:\.\d+)?)\s*$").expect("static regex is valid");
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or(InstanceError::Header { line: line_no, label })
}

/// Reads an instance file in the plain-text format: four labeled header
/// lines, a header row, N customer rows, a label line, and the drone β
/// coefficient. Every other drone/truck parameter is a fixed default
/// grounded in `original_source/src/InputReader.cpp`.
pub fn read_instance(path: &Path) -> Result<Instance, InstanceError> {
    let text = fs::read_to_string(path).map_err(|source| InstanceError::Io { path: path.display().to_string(), source })?;
    let lines: Vec<&str> = text.lines().collect();

    let trucks_count = header_number(&lines, 1, "numTrucks")? as usize;
    let drones_count = header_number(&lines, 2, "numDrones")? as usize;
    let max_flight_time = header_number(&lines, 3, "droneMaxFlightTime")?;
    let customers_count = header_number(&lines, 4, "numCustomers")? as usize;

    let mut customers = Vec::with_capacity(customers_count);
    let data_start = 6; // line 5 is the header row, customer rows start at line 6
    for i in 0..customers_count {
        let line_no = data_start + i;
        let text = lines.get(line_no - 1).ok_or(InstanceError::CustomerRecord { line: line_no, text: String::new() })?;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(InstanceError::CustomerRecord { line: line_no, text: (*text).to_string() });
        }

        let parse = |s: &str| s.parse::<f64>().map_err(|_| InstanceError::CustomerRecord { line: line_no, text: (*text).to_string() });
        let x = parse(fields[0])?;
        let y = parse(fields[1])?;
        let demand = parse(fields[2])?;
        let truck_only = parse(fields[3])? != 0.0;
        let service_time_truck = parse(fields[4])?;
        let service_time_drone = parse(fields[5])?;

        customers.push(Customer {
            id: i + 1,
            x,
            y,
            demand,
            truck_only,
            service_time_truck,
            service_time_drone,
        });
    }

    let beta_line_no = data_start + customers_count + 1;
    let beta = lines
        .get(beta_line_no - 1)
        .and_then(|line| line.split_whitespace().next())
        .and_then(|token| token.parse::<f64>().ok())
        .ok_or(InstanceError::MissingBeta)?;

    let drone = DroneParams {
        max_capacity: DRONE_MAX_CAPACITY,
        max_energy: DRONE_MAX_ENERGY,
        takeoff_speed: DRONE_TAKEOFF_SPEED,
        cruise_speed: DRONE_CRUISE_SPEED,
        landing_speed: DRONE_LANDING_SPEED,
        max_flight_time,
        beta,
        gamma: DRONE_GAMMA,
    };
    let truck = TruckParams { max_speed: TRUCK_MAX_SPEED, intervals: truck_intervals() };

    if customers.len() != customers_count {
        return Err(InstanceError::CustomerCount { expected: customers_count, found: customers.len() });
    }

    Ok(Instance::new(customers, trucks_count, drones_count, drone, truck))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct TempFile(std::path::PathBuf);

    impl TempFile {
        fn new(name: &str, contents: &str) -> Self {
            let mut path = std::env::temp_dir();
            path.push(name);
            let mut file = fs::File::create(&path).expect("create temp file");
            file.write_all(contents.as_bytes()).expect("write temp file");
            TempFile(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn reads_a_well_formed_single_customer_instance() {
        let contents = "trucks 1\n\
                         drones 1\n\
                         maxFlightTime 1800\n\
                         customers 1\n\
                         x y demand staffOnly serviceTruck serviceDrone\n\
                         10 0 1 0 0 0\n\
                         beta\n\
                         1.0\n";
        let file = TempFile::new("mssvtde-parser-test-ok.txt", contents);
        let instance = read_instance(&file.0).expect("parses");

        assert_eq!(instance.trucks_count, 1);
        assert_eq!(instance.drones_count, 1);
        assert_eq!(instance.customers_count(), 1);
        assert_eq!(instance.drone.max_capacity, DRONE_MAX_CAPACITY);
        assert_eq!(instance.drone.beta, 1.0);
        assert_eq!(instance.truck.max_speed, TRUCK_MAX_SPEED);
    }

    #[test]
    fn rejects_malformed_customer_rows() {
        let contents = "trucks 1\ndrones 1\nmaxFlightTime 1800\ncustomers 1\nheader\nnotanumber\nbeta\n1.0\n";
        let file = TempFile::new("mssvtde-parser-test-bad.txt", contents);
        let err = read_instance(&file.0).unwrap_err();
        assert!(matches!(err, InstanceError::CustomerRecord { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = read_instance(Path::new("/nonexistent/path/to/instance.txt")).unwrap_err();
        assert!(matches!(err, InstanceError::Io { .. }));
    }
}
