//! Time-driven tweens and one-shot timers
//!
//! Nothing here blocks. Scheduling a tween records start time, duration and
//! easing; `advance` is called once per tick and reports eased progress for
//! every running task. A task whose end time has passed is reported once with
//! `finished = true` and dropped, so its completion runs inline in the same
//! tick. Tasks are identified by handle and can be cancelled before they
//! finish.

use serde::{Deserialize, Serialize};

/// Identifies a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(u64);

/// Easing curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    QuadOut,
    CubicOut,
    QuartOut,
    QuintOut,
    QuintInOut,
    ExpoOut,
    CircOut,
    BackOut,
    BackInOut,
}

/// Curves a relocating footprint picks from
pub const RELOCATION_EASINGS: [Easing; 6] = [
    Easing::ExpoOut,
    Easing::QuintOut,
    Easing::QuartOut,
    Easing::CircOut,
    Easing::BackOut,
    Easing::BackInOut,
];

const BACK_OVERSHOOT: f32 = 1.70158;

impl Easing {
    /// Map linear progress in [0, 1] to eased progress
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadOut => t * (2.0 - t),
            Easing::CubicOut => (t - 1.0).powi(3) + 1.0,
            Easing::QuartOut => 1.0 - (t - 1.0).powi(4),
            Easing::QuintOut => (t - 1.0).powi(5) + 1.0,
            Easing::QuintInOut => {
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * t.powi(5)
                } else {
                    0.5 * ((t - 2.0).powi(5) + 2.0)
                }
            }
            Easing::ExpoOut => 1.0 - 2f32.powf(-10.0 * t),
            Easing::CircOut => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Easing::BackOut => {
                let s = BACK_OVERSHOOT;
                let u = t - 1.0;
                u * u * ((s + 1.0) * u + s) + 1.0
            }
            Easing::BackInOut => {
                let s = BACK_OVERSHOOT * 1.525;
                let t = t * 2.0;
                if t < 1.0 {
                    0.5 * (t * t * ((s + 1.0) * t - s))
                } else {
                    let u = t - 2.0;
                    0.5 * (u * u * ((s + 1.0) * u + s) + 2.0)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Scheduled<A> {
    handle: TaskHandle,
    /// Absolute start time, delay included (ms)
    start_ms: f64,
    duration_ms: f32,
    easing: Easing,
    /// Timers only report on completion
    timer: bool,
    action: A,
}

/// Progress report for one task on one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Progress<A> {
    pub handle: TaskHandle,
    pub action: A,
    /// Eased progress, exactly 1.0 when finished
    pub t: f32,
    pub finished: bool,
}

/// Ordered set of running tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<A> {
    tasks: Vec<Scheduled<A>>,
    next_handle: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, start_ms: f64, duration_ms: f32, easing: Easing, timer: bool, action: A) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(Scheduled {
            handle,
            start_ms,
            duration_ms: duration_ms.max(0.0),
            easing,
            timer,
            action,
        });
        handle
    }

    /// Schedule a tween starting `delay_ms` after `now_ms`
    pub fn tween(&mut self, now_ms: f64, delay_ms: f32, duration_ms: f32, easing: Easing, action: A) -> TaskHandle {
        self.push(now_ms + delay_ms.max(0.0) as f64, duration_ms, easing, false, action)
    }

    /// Schedule a one-shot timer firing `delay_ms` after `now_ms`
    pub fn after(&mut self, now_ms: f64, delay_ms: f32, action: A) -> TaskHandle {
        self.push(now_ms, delay_ms, Easing::Linear, true, action)
    }

    /// Remove a task before it finishes. Returns whether it was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Cancel through an optional stored handle, clearing it
    pub fn cancel_slot(&mut self, slot: &mut Option<TaskHandle>) {
        if let Some(handle) = slot.take() {
            self.cancel(handle);
        }
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop everything (scene teardown)
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Evaluate all tasks at `now_ms`, in scheduling order. Finished tasks are
    /// reported once and removed.
    pub fn advance(&mut self, now_ms: f64) -> Vec<Progress<A>> {
        let mut reports = Vec::new();

        self.tasks.retain(|task| {
            if now_ms < task.start_ms {
                return true;
            }

            let elapsed = (now_ms - task.start_ms) as f32;
            let finished = elapsed >= task.duration_ms;

            if finished {
                reports.push(Progress {
                    handle: task.handle,
                    action: task.action.clone(),
                    t: 1.0,
                    finished: true,
                });
                return false;
            }

            if !task.timer {
                let linear = if task.duration_ms > 0.0 {
                    elapsed / task.duration_ms
                } else {
                    1.0
                };
                reports.push(Progress {
                    handle: task.handle,
                    action: task.action.clone(),
                    t: task.easing.apply(linear),
                    finished: false,
                });
            }
            true
        });

        reports
    }
}
