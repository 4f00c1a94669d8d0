use std::fmt;
use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::streets::StreetId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Different types of vehicles in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Car,
    Bus,
    Truck,
}

impl VehicleType {
    /// Draws a cruising speed for this vehicle type, in map units per second.
    pub fn random_speed<R: Rng>(self, rng: &mut R) -> f64 {
        match self {
            VehicleType::Car => rng.random_range(120.0..220.0),
            VehicleType::Bus => rng.random_range(90.0..150.0),
            VehicleType::Truck => rng.random_range(70.0..120.0),
        }
    }
}

/// Where a vehicle currently is, written only by its own driver thread and
/// read by the rendering and monitoring collaborators.
#[derive(Debug, Clone)]
pub struct VehicleState {
    pub street: StreetId,
    /// Intersection the vehicle is heading toward.
    pub toward: IntersectionId,
    /// Fraction of the street already covered, 0.0 at the far end of
    /// `street`, 1.0 at `toward`.
    pub progress: f64,
    /// True while the vehicle is held at the intersection entrance.
    pub waiting: bool,
}

/// Handle to a vehicle participating in the simulation.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub vehicle_type: VehicleType,
    /// Cruising speed in map units per second.
    pub speed: f64,
    pub state: Arc<Mutex<VehicleState>>,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        vehicle_type: VehicleType,
        speed: f64,
        street: StreetId,
        toward: IntersectionId,
    ) -> Self {
        Self {
            id,
            vehicle_type,
            speed,
            state: Arc::new(Mutex::new(VehicleState {
                street,
                toward,
                progress: 0.0,
                waiting: false,
            })),
        }
    }

    pub fn snapshot(&self) -> VehicleState {
        self.state.lock().unwrap().clone()
    }
}
