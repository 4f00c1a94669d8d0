pub mod admission;
pub mod intersection_controller;
pub mod signal_light;

pub use intersection_controller::IntersectionController;
pub use signal_light::{Phase, SignalLight};
