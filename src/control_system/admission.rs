use std::collections::VecDeque;

use crate::concurrency::Channel;
use crate::simulation_engine::vehicles::VehicleId;

/// A vehicle waiting for passage, paired with its one-shot grant signal.
///
/// The grant channel is used exactly once: [`AdmissionQueue::release_head`]
/// sends the single token, and the waiting vehicle's `recv` consumes it. The
/// entry is dropped as part of being released, so a second fulfillment is
/// impossible by construction.
#[derive(Debug)]
struct WaitingEntry {
    vehicle: VehicleId,
    grant: Channel<()>,
}

/// FIFO line of vehicles waiting to enter an intersection.
///
/// Not internally synchronized: the queue shares one mutual-exclusion
/// boundary with the controller's `occupied` flag (they must be updated
/// together), so it lives inside the controller's mutex.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    entries: VecDeque<WaitingEntry>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a vehicle to the tail of the line and returns the grant
    /// signal it should block on.
    pub fn enqueue(&mut self, vehicle: VehicleId) -> Channel<()> {
        let grant = Channel::new();
        self.entries.push_back(WaitingEntry {
            vehicle,
            grant: grant.clone(),
        });
        grant
    }

    /// Removes the head entry and fulfills its grant signal.
    ///
    /// Panics if the queue is empty. Callers must confirm non-emptiness
    /// inside the same critical section; checking and releasing under
    /// separate lock acquisitions would race.
    pub fn release_head(&mut self) -> VehicleId {
        let entry = self
            .entries
            .pop_front()
            .expect("release_head called on an empty admission queue");
        entry.grant.send(());
        entry.vehicle
    }

    /// Withdraws a waiting vehicle from anywhere in the line, preserving the
    /// order of the others. Returns false if the vehicle is not in the line
    /// (it has already been granted, or never enqueued).
    pub fn remove(&mut self, vehicle: VehicleId) -> bool {
        match self.entries.iter().position(|e| e.vehicle == vehicle) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }
}
