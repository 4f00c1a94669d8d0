use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use serde::Serialize;

use crate::concurrency::Channel;
use crate::control_system::{IntersectionController, Phase};
use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::vehicles::VehicleId;

/// Observations produced by the simulation and drained by the recorder.
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// A vehicle's passage request was granted.
    Granted {
        vehicle: VehicleId,
        intersection: IntersectionId,
        waited_ms: u64,
    },
    /// A vehicle finished crossing and released the intersection.
    Crossed {
        vehicle: VehicleId,
        intersection: IntersectionId,
    },
    /// A signal light toggled.
    PhaseChanged {
        intersection: IntersectionId,
        phase: Phase,
    },
    /// Flush and stop the recorder.
    Shutdown,
}

#[derive(Debug, Serialize)]
struct EventRow {
    timestamp_ms: u64,
    event: &'static str,
    intersection: usize,
    vehicle: Option<u64>,
    detail: String,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    total_crossings: u64,
    total_phase_changes: u64,
    average_wait_ms: f64,
    crossings_per_intersection: HashMap<usize, u64>,
}

/// Collects [`SimEvent`]s from across the simulation into a CSV event log
/// and an end-of-run JSON summary.
///
/// Producers hold clones of the event channel; a single recorder thread
/// drains it, so file access needs no extra locking.
pub struct MetricsRecorder {
    events: Channel<SimEvent>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            events: Channel::new(),
        }
    }

    /// A producer handle for the event feed.
    pub fn sender(&self) -> Channel<SimEvent> {
        self.events.clone()
    }

    /// Starts the recorder thread. It runs until a [`SimEvent::Shutdown`]
    /// arrives, then writes the summary and exits.
    pub fn start(&self, csv_path: PathBuf, summary_path: PathBuf) -> JoinHandle<()> {
        let events = self.events.clone();
        thread::spawn(move || {
            if let Err(e) = record_events(&events, &csv_path, &summary_path) {
                eprintln!("Error recording metrics: {}", e);
            }
        })
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards every phase transition of every controller's light into the
/// event feed, one observer thread per light.
pub fn watch_phases(controllers: &[IntersectionController], events: &Channel<SimEvent>) {
    for controller in controllers {
        let feed = controller.light().subscribe();
        let events = events.clone();
        let intersection = controller.id();
        thread::spawn(move || loop {
            let phase = feed.recv();
            events.send(SimEvent::PhaseChanged {
                intersection,
                phase,
            });
        });
    }
}

fn record_events(
    events: &Channel<SimEvent>,
    csv_path: &Path,
    summary_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let started = Instant::now();
    let mut writer = csv::Writer::from_path(csv_path)?;
    let mut summary = Summary::default();
    let mut waits_ms: Vec<u64> = Vec::new();

    loop {
        let event = events.recv();
        let timestamp_ms = started.elapsed().as_millis() as u64;
        let row = match event {
            SimEvent::Granted {
                vehicle,
                intersection,
                waited_ms,
            } => {
                waits_ms.push(waited_ms);
                EventRow {
                    timestamp_ms,
                    event: "granted",
                    intersection: intersection.0,
                    vehicle: Some(vehicle.0),
                    detail: format!("waited {} ms", waited_ms),
                }
            }
            SimEvent::Crossed {
                vehicle,
                intersection,
            } => {
                summary.total_crossings += 1;
                *summary
                    .crossings_per_intersection
                    .entry(intersection.0)
                    .or_insert(0) += 1;
                EventRow {
                    timestamp_ms,
                    event: "crossed",
                    intersection: intersection.0,
                    vehicle: Some(vehicle.0),
                    detail: String::new(),
                }
            }
            SimEvent::PhaseChanged {
                intersection,
                phase,
            } => {
                summary.total_phase_changes += 1;
                EventRow {
                    timestamp_ms,
                    event: "phase_changed",
                    intersection: intersection.0,
                    vehicle: None,
                    detail: phase.to_string(),
                }
            }
            SimEvent::Shutdown => break,
        };
        writer.serialize(row)?;
        writer.flush()?;
    }

    if !waits_ms.is_empty() {
        summary.average_wait_ms =
            waits_ms.iter().sum::<u64>() as f64 / waits_ms.len() as f64;
    }
    serde_json::to_writer_pretty(File::create(summary_path)?, &summary)?;
    log::info!(
        "metrics: {} crossings, {} phase changes, average wait {:.0} ms",
        summary.total_crossings,
        summary.total_phase_changes,
        summary.average_wait_ms
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_rows_and_summary() {
        let dir = std::env::temp_dir().join("traffic_sim_metrics_test");
        std::fs::create_dir_all(&dir).unwrap();
        let csv_path = dir.join("events.csv");
        let summary_path = dir.join("summary.json");

        let recorder = MetricsRecorder::new();
        let events = recorder.sender();
        let handle = recorder.start(csv_path.clone(), summary_path.clone());

        events.send(SimEvent::Granted {
            vehicle: VehicleId(1),
            intersection: IntersectionId(0),
            waited_ms: 40,
        });
        events.send(SimEvent::Crossed {
            vehicle: VehicleId(1),
            intersection: IntersectionId(0),
        });
        events.send(SimEvent::PhaseChanged {
            intersection: IntersectionId(0),
            phase: Phase::Green,
        });
        events.send(SimEvent::Shutdown);
        handle.join().unwrap();

        let log = std::fs::read_to_string(&csv_path).unwrap();
        assert!(log.contains("granted"));
        assert!(log.contains("crossed"));
        assert!(log.contains("phase_changed"));

        let summary: serde_json::Value =
            serde_json::from_reader(File::open(&summary_path).unwrap()).unwrap();
        assert_eq!(summary["total_crossings"], 1);
        assert_eq!(summary["total_phase_changes"], 1);
        assert_eq!(summary["average_wait_ms"], 40.0);
    }
}
