use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::concurrency::Channel;

/// The two possible states of a signal light. There are no intermediate
/// states; a light is either red or green at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    pub fn is_green(self) -> bool {
        self == Phase::Green
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => write!(f, "red"),
            Phase::Green => write!(f, "green"),
        }
    }
}

/// How long a phase persists before toggling, in milliseconds. Each dwell is
/// drawn uniformly from this range.
pub const DWELL_RANGE_MS: Range<u64> = 4000..6000;

/// A two-phase signal light that toggles itself on a randomized dwell timer.
///
/// The phase is mutated only by the light's own cycling thread. Readers call
/// [`current_phase`](Self::current_phase); threads that must hold for a green
/// call [`wait_for_green`](Self::wait_for_green). Green waits are broadcast:
/// every transition wakes every waiter, so concurrent waiters cannot consume
/// a transition out from under each other.
pub struct SignalLight {
    inner: Arc<LightInner>,
}

struct LightInner {
    phase: Mutex<Phase>,
    changed: Condvar,
    /// Fan-out feeds: every transition is sent to every subscriber.
    subscribers: Mutex<Vec<Channel<Phase>>>,
    dwell_ms: Range<u64>,
}

impl SignalLight {
    /// A new light with the production dwell range. Starts red: a light that
    /// has not begun cycling must not admit anyone.
    pub fn new() -> Self {
        Self::with_dwell(DWELL_RANGE_MS)
    }

    /// A new light with a custom dwell range, in milliseconds. Tests use
    /// short ranges to keep phase-dependent scenarios fast.
    pub fn with_dwell(dwell_ms: Range<u64>) -> Self {
        Self {
            inner: Arc::new(LightInner {
                phase: Mutex::new(Phase::Red),
                changed: Condvar::new(),
                subscribers: Mutex::new(Vec::new()),
                dwell_ms,
            }),
        }
    }

    /// Non-blocking read of the current phase.
    pub fn current_phase(&self) -> Phase {
        *self.inner.phase.lock().unwrap()
    }

    pub fn is_green(&self) -> bool {
        self.current_phase().is_green()
    }

    /// Blocks the caller until the light shows green. Returns immediately if
    /// it already does.
    pub fn wait_for_green(&self) {
        let mut phase = self.inner.phase.lock().unwrap();
        while !phase.is_green() {
            phase = self.inner.changed.wait(phase).unwrap();
        }
    }

    /// Registers an observation feed that receives every subsequent phase
    /// transition. Feeds are independent: a value consumed from one
    /// subscriber's channel is never taken from another's.
    pub fn subscribe(&self) -> Channel<Phase> {
        let feed = Channel::new();
        self.inner.subscribers.lock().unwrap().push(feed.clone());
        feed
    }

    /// Launches the background cycling thread. Call once per light: a second
    /// call starts a second, competing cycle loop.
    pub fn start(&self) {
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || inner.cycle_through_phases());
    }
}

impl Default for SignalLight {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SignalLight {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LightInner {
    fn cycle_through_phases(&self) {
        let mut rng = rand::rng();
        loop {
            let dwell = rng.random_range(self.dwell_ms.clone());
            thread::sleep(Duration::from_millis(dwell));

            let phase = {
                let mut phase = self.phase.lock().unwrap();
                *phase = phase.toggled();
                // Broadcast: every green-waiter re-checks the phase.
                self.changed.notify_all();
                *phase
            };
            log::debug!("signal light switched to {} after {} ms", phase, dwell);

            for feed in self.subscribers.lock().unwrap().iter() {
                feed.send(phase);
            }
        }
    }
}
