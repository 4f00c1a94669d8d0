use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::concurrency::Channel;
use crate::control_system::{IntersectionController, SignalLight};
use crate::error::ConfigError;
use crate::monitoring::SimEvent;
use crate::simulation_engine::map::{create_nyc_network, create_paris_network, RoadNetwork};
use crate::simulation_engine::vehicles::{Vehicle, VehicleId, VehicleType};

/// Driver loop tick. Bounds how often a vehicle updates its position; all
/// actual blocking happens inside the admission protocol, not here.
const TICK: Duration = Duration::from_millis(50);

/// Fraction of a street at which an approaching vehicle requests passage.
const REQUEST_AT: f64 = 0.9;

/// Time a vehicle needs to physically clear the intersection's footprint
/// after being let through.
const CROSSING: Duration = Duration::from_millis(300);

/// Built-in city layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum City {
    Paris,
    Nyc,
}

impl FromStr for City {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "paris" => Ok(City::Paris),
            "nyc" => Ok(City::Nyc),
            other => Err(ConfigError::UnknownCity(other.to_string())),
        }
    }
}

/// A fully wired simulation: one controller per intersection, one driver
/// thread per vehicle.
pub struct Simulation {
    pub network: Arc<RoadNetwork>,
    pub controllers: Vec<IntersectionController>,
    pub vehicles: Vec<Vehicle>,
    events: Option<Channel<SimEvent>>,
    running: Arc<AtomicBool>,
}

impl Simulation {
    /// Builds the network, one light/controller pair per intersection, and
    /// the vehicle fleet. Nothing runs until [`start`](Self::start).
    pub fn build(
        city: City,
        vehicle_count: usize,
        dwell_ms: std::ops::Range<u64>,
        events: Option<Channel<SimEvent>>,
    ) -> Self {
        let network = Arc::new(match city {
            City::Paris => create_paris_network(),
            City::Nyc => create_nyc_network(),
        });

        // Controllers are indexed by intersection id.
        let controllers: Vec<_> = network
            .intersections()
            .iter()
            .map(|node| {
                IntersectionController::new(node.id, SignalLight::with_dwell(dwell_ms.clone()))
            })
            .collect();

        let mut rng = rand::rng();
        let vehicles: Vec<_> = (0..vehicle_count)
            .map(|i| {
                let street = &network.streets()[i % network.streets().len()];
                // Car 60%, Bus 25%, Truck 15%.
                let roll: f64 = rng.random_range(0.0..1.0);
                let vehicle_type = if roll < 0.60 {
                    VehicleType::Car
                } else if roll < 0.85 {
                    VehicleType::Bus
                } else {
                    VehicleType::Truck
                };
                let speed = vehicle_type.random_speed(&mut rng);
                Vehicle::new(
                    VehicleId(i as u64 + 1),
                    vehicle_type,
                    speed,
                    street.id,
                    street.to,
                )
            })
            .collect();

        Self {
            network,
            controllers,
            vehicles,
            events,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Starts every controller (light + admission loop) and one driver
    /// thread per vehicle.
    pub fn start(&self) {
        for controller in &self.controllers {
            controller.start();
        }
        for vehicle in &self.vehicles {
            let vehicle = vehicle.clone();
            let network = Arc::clone(&self.network);
            let controllers = self.controllers.clone();
            let events = self.events.clone();
            let running = Arc::clone(&self.running);
            thread::spawn(move || drive(vehicle, network, controllers, events, running));
        }
        log::info!(
            "simulation started: {} intersections, {} vehicles",
            self.controllers.len(),
            self.vehicles.len()
        );
    }

    /// Asks driver threads to stop at their next tick. Threads blocked in
    /// the admission protocol stay blocked; they are abandoned at process
    /// exit (the simulation has no teardown).
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Per-vehicle driver loop: advance along the current street, request
/// passage at the intersection entrance, cross, pick the next street,
/// release, repeat.
fn drive(
    vehicle: Vehicle,
    network: Arc<RoadNetwork>,
    controllers: Vec<IntersectionController>,
    events: Option<Channel<SimEvent>>,
    running: Arc<AtomicBool>,
) {
    let mut rng = rand::rng();
    let mut granted = false;
    log::info!(
        "vehicle {} ({:?}, {:.0} units/s) entering service",
        vehicle.id,
        vehicle.vehicle_type,
        vehicle.speed
    );

    while running.load(Ordering::Relaxed) {
        thread::sleep(TICK);

        let (street_id, toward) = {
            let mut state = vehicle.state.lock().unwrap();
            let length = network.street(state.street).length;
            state.progress =
                (state.progress + vehicle.speed * TICK.as_secs_f64() / length).min(1.0);
            if !granted {
                state.progress = state.progress.min(REQUEST_AT);
            }
            (state.street, state.toward)
        };
        let controller = &controllers[toward.0];

        if !granted {
            if vehicle.snapshot().progress < REQUEST_AT {
                continue;
            }
            // Hold at the entrance until the controller lets us through.
            vehicle.state.lock().unwrap().waiting = true;
            let waited = Instant::now();
            controller.request_passage(vehicle.id);
            granted = true;
            vehicle.state.lock().unwrap().waiting = false;
            if let Some(events) = &events {
                events.send(SimEvent::Granted {
                    vehicle: vehicle.id,
                    intersection: toward,
                    waited_ms: waited.elapsed().as_millis() as u64,
                });
            }
            continue;
        }

        if vehicle.snapshot().progress < 1.0 {
            continue;
        }

        // End of street reached with a grant in hand: cross, then continue
        // on a random street other than the one we arrived on. A dead end
        // means turning around on the same street.
        let options = network.outgoing(toward, street_id);
        let next = if options.is_empty() {
            street_id
        } else {
            options[rng.random_range(0..options.len())]
        };
        let next_toward = network.street(next).other_end(toward);

        thread::sleep(CROSSING);
        {
            let mut state = vehicle.state.lock().unwrap();
            state.street = next;
            state.toward = next_toward;
            state.progress = 0.0;
        }
        controller.release(vehicle.id);
        granted = false;
        if let Some(events) = &events {
            events.send(SimEvent::Crossed {
                vehicle: vehicle.id,
                intersection: toward,
            });
        }
        log::debug!(
            "vehicle {} crossed intersection {}, continuing on street {} toward {}",
            vehicle.id,
            toward,
            next,
            next_toward
        );
    }
}
