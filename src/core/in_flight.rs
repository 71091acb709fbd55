//! Count of messages accepted but not yet dispatched to every sink

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            count: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    pub fn increment(&self) {
        *self.count.lock() += 1;
    }

    /// Mark one message fully dispatched, waking waiters when none remain
    pub fn decrement(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    pub fn current(&self) -> usize {
        *self.count.lock()
    }

    /// Block until the count reaches zero
    pub fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}
