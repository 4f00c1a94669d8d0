use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Thread-safe FIFO handoff between threads.
///
/// `send` never blocks; `recv` parks the caller until a value is available.
/// Values come out in send order, and each value is delivered to exactly one
/// receiver. The handle is cheap to clone; all clones address the same queue.
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

struct ChannelInner<T> {
    queue: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                queue: Mutex::new(VecDeque::new()),
                ready: Condvar::new(),
            }),
        }
    }

    /// Appends a value to the tail and wakes at most one blocked receiver.
    pub fn send(&self, value: T) {
        let mut queue = self.inner.queue.lock().unwrap();
        queue.push_back(value);
        self.inner.ready.notify_one();
    }

    /// Blocks until a value is available, then removes and returns the head.
    pub fn recv(&self) -> T {
        let mut queue = self.inner.queue.lock().unwrap();
        // Re-check after every wake: wake-ups can be spurious, and another
        // receiver may have taken the value first.
        while queue.is_empty() {
            queue = self.inner.ready.wait(queue).unwrap();
        }
        queue.pop_front().unwrap()
    }

    /// Like [`recv`](Self::recv), but gives up after `timeout` and returns
    /// `None` if no value arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.inner.queue.lock().unwrap();
        while queue.is_empty() {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, wait) = self.inner.ready.wait_timeout(queue, remaining).unwrap();
            queue = guard;
            if wait.timed_out() && queue.is_empty() {
                return None;
            }
        }
        queue.pop_front()
    }

    /// Removes and returns the head value if one is immediately available.
    pub fn try_recv(&self) -> Option<T> {
        self.inner.queue.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.lock().unwrap().is_empty()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn delivers_in_send_order_to_a_single_receiver() {
        let ch = Channel::new();
        for i in 0..100 {
            ch.send(i);
        }
        for i in 0..100 {
            assert_eq!(ch.recv(), i);
        }
        assert!(ch.is_empty());
    }

    #[test]
    fn blocked_receiver_wakes_on_send() {
        let ch = Channel::new();
        let consumer = {
            let ch = ch.clone();
            thread::spawn(move || ch.recv())
        };
        thread::sleep(Duration::from_millis(20));
        ch.send(7u32);
        assert_eq!(consumer.join().unwrap(), 7);
    }

    #[test]
    fn each_value_reaches_exactly_one_receiver() {
        let ch = Channel::new();
        let spawn_consumer = |ch: Channel<u32>| {
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(v) = ch.recv_timeout(Duration::from_millis(200)) {
                    seen.push(v);
                }
                seen
            })
        };
        let a = spawn_consumer(ch.clone());
        let b = spawn_consumer(ch.clone());
        for i in 0..200u32 {
            ch.send(i);
        }
        let seen_a = a.join().unwrap();
        let seen_b = b.join().unwrap();

        let mut all: Vec<u32> = seen_a.iter().chain(seen_b.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..200).collect::<Vec<_>>());
        let dedup: HashSet<u32> = all.iter().copied().collect();
        assert_eq!(dedup.len(), 200, "a value was delivered twice");
    }

    #[test]
    fn recv_timeout_expires_on_an_empty_channel() {
        let ch: Channel<u32> = Channel::new();
        let start = Instant::now();
        assert_eq!(ch.recv_timeout(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn try_recv_does_not_block() {
        let ch = Channel::new();
        assert_eq!(ch.try_recv(), None::<u32>);
        ch.send(1);
        assert_eq!(ch.try_recv(), Some(1));
        assert_eq!(ch.try_recv(), None);
    }
}
