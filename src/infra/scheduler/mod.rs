use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WakeupHandle(u64);

impl WakeupHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeupKind {
    Frame,
    Timer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    pub handle: WakeupHandle,
    pub kind: WakeupKind,
}

/// Schedule/cancel pairs for animation frames and one-shot timers.
///
/// Every scheduled callback is identified by a handle that is never reused,
/// so a callback that fires after being superseded can be recognised by
/// comparing handles even if cancellation raced with delivery.
pub trait Scheduler {
    fn request_frame(&mut self) -> WakeupHandle;
    fn cancel_frame(&mut self, handle: WakeupHandle);
    fn set_timeout(&mut self, now_ms: u64, delay_ms: u64) -> WakeupHandle;
    fn clear_timeout(&mut self, handle: WakeupHandle);
}

/// Single-threaded scheduler pumped by whoever owns the event loop.
#[derive(Debug, Default)]
pub struct CooperativeScheduler {
    next_id: u64,
    frames: BTreeSet<WakeupHandle>,
    timers: BTreeMap<WakeupHandle, u64>,
}

impl CooperativeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> WakeupHandle {
        self.next_id += 1;
        WakeupHandle(self.next_id)
    }

    pub fn is_pending(&self, handle: WakeupHandle) -> bool {
        self.frames.contains(&handle) || self.timers.contains_key(&handle)
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.frames.is_empty() && self.timers.is_empty()
    }

    /// Earliest timer deadline, if any timer is pending.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().copied().min()
    }

    /// Removes and returns everything due at `now_ms`: expired timers in
    /// deadline order, then every frame requested before this call. Frames
    /// requested while the caller dispatches these wakeups wait for the next
    /// drain.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Wakeup> {
        let mut due_timers = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(handle, deadline)| (*deadline, *handle))
            .collect::<Vec<_>>();
        due_timers.sort();

        let mut wakeups = Vec::with_capacity(due_timers.len() + self.frames.len());
        for (_, handle) in due_timers {
            self.timers.remove(&handle);
            wakeups.push(Wakeup {
                handle,
                kind: WakeupKind::Timer,
            });
        }
        for handle in std::mem::take(&mut self.frames) {
            wakeups.push(Wakeup {
                handle,
                kind: WakeupKind::Frame,
            });
        }
        wakeups
    }

    pub fn clear_all(&mut self) {
        self.frames.clear();
        self.timers.clear();
    }
}

impl Scheduler for CooperativeScheduler {
    fn request_frame(&mut self) -> WakeupHandle {
        let handle = self.next_handle();
        self.frames.insert(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: WakeupHandle) {
        self.frames.remove(&handle);
    }

    fn set_timeout(&mut self, now_ms: u64, delay_ms: u64) -> WakeupHandle {
        let handle = self.next_handle();
        self.timers.insert(handle, now_ms.saturating_add(delay_ms));
        handle
    }

    fn clear_timeout(&mut self, handle: WakeupHandle) {
        self.timers.remove(&handle);
    }
}
