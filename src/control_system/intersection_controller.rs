use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::control_system::admission::AdmissionQueue;
use crate::control_system::signal_light::{Phase, SignalLight};
use crate::error::PassageTimeout;
use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::vehicles::VehicleId;

/// Serializes passage through one intersection.
///
/// Vehicles enter strictly in arrival order, one at a time: the background
/// admission loop grants the head of the waiting line only while no earlier
/// grant is outstanding, and a granted vehicle still has to wait out a red
/// light before it may cross. The grant stays outstanding through the light
/// wait and the crossing itself, until the vehicle calls
/// [`release`](Self::release) — strict per-vehicle serialization, at the cost
/// of throughput during red phases.
///
/// The handle is cheap to clone and shared across vehicle threads.
pub struct IntersectionController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    id: IntersectionId,
    state: Mutex<AdmissionState>,
    /// Signaled when the waiting line grows or the occupancy clears; the
    /// admission loop blocks here instead of polling.
    wakeup: Condvar,
    light: SignalLight,
}

/// Queue and occupancy flag share one lock: granting reads both, and a
/// release that raced a separately-locked emptiness check could be missed.
struct AdmissionState {
    queue: AdmissionQueue,
    /// True while a grant is outstanding and the vehicle has not released.
    occupied: bool,
}

impl IntersectionController {
    pub fn new(id: IntersectionId, light: SignalLight) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                id,
                state: Mutex::new(AdmissionState {
                    queue: AdmissionQueue::new(),
                    occupied: false,
                }),
                wakeup: Condvar::new(),
                light,
            }),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.inner.id
    }

    pub fn light(&self) -> &SignalLight {
        &self.inner.light
    }

    pub fn is_green(&self) -> bool {
        self.inner.light.is_green()
    }

    pub fn current_phase(&self) -> Phase {
        self.inner.light.current_phase()
    }

    /// Number of vehicles currently waiting in line.
    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().unwrap().queue.len()
    }

    /// Launches the signal light's cycling thread and the admission loop.
    /// Call once per controller; a second call starts competing loops.
    pub fn start(&self) {
        self.inner.light.start();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || inner.process_queue());
    }

    /// Blocks until `vehicle` may cross the intersection.
    ///
    /// Joins the waiting line, blocks on the grant signal (satisfied only
    /// after every earlier vehicle has crossed and released), then waits out
    /// a red light if necessary. After returning the caller owns the
    /// intersection and must call [`release`](Self::release) once it has left
    /// the intersection's footprint.
    pub fn request_passage(&self, vehicle: VehicleId) {
        let grant = self.enqueue(vehicle);
        grant.recv();
        log::debug!(
            "intersection {}: vehicle {} granted entry",
            self.inner.id,
            vehicle
        );
        self.await_green();
    }

    /// Bounded variant of [`request_passage`](Self::request_passage): gives
    /// up if no grant arrives within `timeout` and withdraws from the line.
    ///
    /// The light wait after a grant is not bounded; the timeout covers the
    /// queue wait, which is the unbounded part under load.
    pub fn request_passage_timeout(
        &self,
        vehicle: VehicleId,
        timeout: Duration,
    ) -> Result<(), PassageTimeout> {
        let grant = self.enqueue(vehicle);
        if grant.recv_timeout(timeout).is_some() {
            self.await_green();
            return Ok(());
        }

        let mut state = self.inner.state.lock().unwrap();
        if state.queue.remove(vehicle) {
            log::debug!(
                "intersection {}: vehicle {} withdrew after {:?}",
                self.inner.id,
                vehicle,
                timeout
            );
            return Err(PassageTimeout {
                vehicle,
                intersection: self.inner.id,
                timeout,
            });
        }

        // The admission loop granted this entry while the wait was timing
        // out. The grant token is sent before the entry leaves the queue,
        // both under the state lock, so it is in the channel by now: consume
        // it and hand the slot straight back.
        let _ = grant.try_recv();
        assert!(
            state.occupied,
            "intersection {}: grant raced a timeout but no occupancy was recorded",
            self.inner.id
        );
        state.occupied = false;
        self.inner.wakeup.notify_one();
        Err(PassageTimeout {
            vehicle,
            intersection: self.inner.id,
            timeout,
        })
    }

    /// Called once the crossing vehicle has left the intersection's
    /// footprint; lets the admission loop grant the next waiter.
    ///
    /// Panics if no grant is outstanding — a release without a matching
    /// passage grant is a logic fault, and continuing would risk
    /// double-admission.
    pub fn release(&self, vehicle: VehicleId) {
        let mut state = self.inner.state.lock().unwrap();
        assert!(
            state.occupied,
            "intersection {}: release by vehicle {} without an outstanding grant",
            self.inner.id,
            vehicle
        );
        state.occupied = false;
        self.inner.wakeup.notify_one();
        log::debug!(
            "intersection {}: vehicle {} has left",
            self.inner.id,
            vehicle
        );
    }

    fn enqueue(&self, vehicle: VehicleId) -> crate::concurrency::Channel<()> {
        let mut state = self.inner.state.lock().unwrap();
        let grant = state.queue.enqueue(vehicle);
        self.inner.wakeup.notify_one();
        grant
    }

    fn await_green(&self) {
        if self.inner.light.current_phase() == Phase::Red {
            self.inner.light.wait_for_green();
        }
    }
}

impl Clone for IntersectionController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ControllerInner {
    /// Admission loop: grant the oldest waiter whenever the intersection is
    /// free. Runs for the controller's lifetime.
    fn process_queue(&self) {
        loop {
            let vehicle = {
                let mut state = self.state.lock().unwrap();
                while state.queue.is_empty() || state.occupied {
                    state = self.wakeup.wait(state).unwrap();
                }
                // Mark occupied and grant in the same critical section; the
                // grant must never be observable before the occupancy.
                state.occupied = true;
                state.queue.release_head()
            };
            log::trace!("intersection {}: granted head vehicle {}", self.id, vehicle);
        }
    }
}
