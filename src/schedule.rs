use parking_lot::{Condvar, Mutex};

struct SlotState<T> {
    pending: Option<T>,
    closed: bool,
    superseded: u64,
}

/// Single-slot mailbox between a producer and the render loop. Publishing
/// replaces whatever is pending, so the renderer only ever sees the newest
/// input and stale ones are dropped rather than queued.
pub struct FrameSlot<T> {
    state: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                closed: false,
                superseded: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Returns `true` when an unconsumed value was replaced.
    pub fn publish(&self, value: T) -> bool {
        let mut state = self.state.lock();
        let replaced = state.pending.replace(value).is_some();
        if replaced {
            state.superseded += 1;
        }
        drop(state);
        self.ready.notify_one();
        replaced
    }

    pub fn take(&self) -> Option<T> {
        self.state.lock().pending.take()
    }

    /// Block until a value is pending. `None` once closed and drained.
    pub fn wait_take(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.pending.take() {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            self.ready.wait(&mut state);
        }
    }

    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Values dropped because a newer one arrived first.
    pub fn superseded(&self) -> u64 {
        self.state.lock().superseded
    }
}
