use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use plotters::prelude::*;

use crate::control_system::IntersectionController;
use crate::simulation_engine::map::RoadNetwork;
use crate::simulation_engine::vehicles::{Vehicle, VehicleType};

const BACKGROUND: RGBColor = RGBColor(28, 30, 34);
const STREET: RGBColor = RGBColor(92, 92, 96);
const LIGHT_GREEN: RGBColor = RGBColor(60, 200, 90);
const LIGHT_RED: RGBColor = RGBColor(220, 60, 50);

/// Renders PNG snapshots of the simulation: streets as lines, intersections
/// as circles colored by their current light phase, vehicles as dots.
///
/// Strictly an observer — it only reads `is_green()` and the shared vehicle
/// states; no simulation logic depends on it.
pub struct FrameRenderer {
    network: Arc<RoadNetwork>,
    controllers: Vec<IntersectionController>,
    vehicles: Vec<Vehicle>,
    out_dir: PathBuf,
    width: u32,
    height: u32,
    scale: f64,
    offset: (f64, f64),
}

impl FrameRenderer {
    pub fn new(
        network: Arc<RoadNetwork>,
        controllers: Vec<IntersectionController>,
        vehicles: Vec<Vehicle>,
        out_dir: PathBuf,
        width: u32,
        height: u32,
    ) -> Self {
        let (scale, offset) = fit_to_canvas(&network, width, height);
        Self {
            network,
            controllers,
            vehicles,
            out_dir,
            width,
            height,
            scale,
            offset,
        }
    }

    /// Draws one frame to `frame_NNNN.png` in the output directory.
    pub fn render_frame(&self, index: usize) -> Result<PathBuf, Box<dyn Error>> {
        let path = self.out_dir.join(format!("frame_{:04}.png", index));
        let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
        root.fill(&BACKGROUND)?;

        for street in self.network.streets() {
            let a = self.project(street.from.0);
            let b = self.project(street.to.0);
            root.draw(&PathElement::new(
                vec![a, b],
                ShapeStyle::from(&STREET).stroke_width(3),
            ))?;
        }

        for controller in &self.controllers {
            let color = if controller.is_green() {
                LIGHT_GREEN
            } else {
                LIGHT_RED
            };
            let center = self.project(controller.id().0);
            root.draw(&Circle::new(center, 10, color.filled()))?;
        }

        for vehicle in &self.vehicles {
            let state = vehicle.snapshot();
            let street = self.network.street(state.street);
            let to = self.network.intersection(state.toward);
            let from = self.network.intersection(street.other_end(state.toward));
            let x = from.x + (to.x - from.x) * state.progress;
            let y = from.y + (to.y - from.y) * state.progress;
            let (radius, color) = match vehicle.vehicle_type {
                VehicleType::Car => (4, RGBColor(110, 170, 250)),
                VehicleType::Bus => (6, RGBColor(240, 200, 80)),
                VehicleType::Truck => (6, RGBColor(190, 130, 220)),
            };
            root.draw(&Circle::new(
                self.project_point(x, y),
                radius,
                color.filled(),
            ))?;
        }

        root.present()?;
        drop(root);
        Ok(path)
    }

    /// Spawns a thread that renders a frame every `interval` until `running`
    /// is cleared. Render errors are reported and stop the loop.
    pub fn start(self, interval: Duration, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            let mut index = 0;
            while running.load(Ordering::Relaxed) {
                if let Err(e) = self.render_frame(index) {
                    eprintln!("Error rendering frame {}: {}", index, e);
                    break;
                }
                index += 1;
                thread::sleep(interval);
            }
            log::info!("rendered {} frames to {}", index, self.out_dir.display());
        })
    }

    fn project(&self, intersection: usize) -> (i32, i32) {
        let node = &self.network.intersections()[intersection];
        self.project_point(node.x, node.y)
    }

    fn project_point(&self, x: f64, y: f64) -> (i32, i32) {
        (
            ((x - self.offset.0) * self.scale) as i32,
            ((y - self.offset.1) * self.scale) as i32,
        )
    }
}

/// Scale factor and origin that fit the network's bounding box into the
/// canvas with a margin.
fn fit_to_canvas(network: &RoadNetwork, width: u32, height: u32) -> (f64, (f64, f64)) {
    const MARGIN: f64 = 60.0;
    let xs = network.intersections().iter().map(|n| n.x);
    let ys = network.intersections().iter().map(|n| n.y);
    let min_x = xs.clone().fold(f64::INFINITY, f64::min);
    let max_x = xs.fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.clone().fold(f64::INFINITY, f64::min);
    let max_y = ys.fold(f64::NEG_INFINITY, f64::max);

    let span_x = (max_x - min_x).max(1.0);
    let span_y = (max_y - min_y).max(1.0);
    let scale = ((width as f64 - 2.0 * MARGIN) / span_x)
        .min((height as f64 - 2.0 * MARGIN) / span_y);
    let offset = (min_x - MARGIN / scale, min_y - MARGIN / scale);
    (scale, offset)
}
