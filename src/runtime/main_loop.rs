//! Single-threaded run loop for Sitedeck.
//!
//! All tab state transitions, timer callbacks and event-bus deliveries run
//! here. Time is a monotonic [`Duration`] since the loop was created; the GUI
//! feeds it wall-clock time, tests advance it by hand.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

type Task = Box<dyn FnOnce()>;

struct Timer {
    task: Task,
    live: Rc<Cell<bool>>,
}

#[derive(Default)]
struct LoopState {
    now: Duration,
    next_seq: u64,
    timers: BTreeMap<(Duration, u64), Timer>,
    posted: VecDeque<Task>,
}

enum Due {
    Fire(Timer),
    Skip,
    Idle,
}

/// The main-thread task queue and timer wheel.
pub struct MainLoop {
    state: RefCell<LoopState>,
}

impl MainLoop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(LoopState::default()),
        })
    }

    /// Current loop time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Queues `task` to run on the next drain.
    pub fn post(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().posted.push_back(Box::new(task));
    }

    /// Registers a one-shot timer. Dropping the returned handle cancels it.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerHandle {
        let live = Rc::new(Cell::new(true));
        let mut state = self.state.borrow_mut();
        let deadline = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.insert(
            (deadline, seq),
            Timer {
                task: Box::new(task),
                live: live.clone(),
            },
        );
        TimerHandle { live, deadline }
    }

    /// Runs every posted task, including tasks posted while draining.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.state.borrow_mut().posted.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Moves the clock forward by `by`, firing every timer that comes due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Moves the clock to `target` (never backwards), firing due timers in
    /// deadline order and draining posted tasks after each one.
    pub fn advance_to(&self, target: Duration) {
        self.run_pending();
        loop {
            match self.pop_due(target) {
                Due::Fire(timer) => {
                    timer.live.set(false);
                    (timer.task)();
                    self.run_pending();
                }
                Due::Skip => continue,
                Due::Idle => break,
            }
        }
        let mut state = self.state.borrow_mut();
        if target > state.now {
            state.now = target;
        }
    }

    fn pop_due(&self, target: Duration) -> Due {
        let mut state = self.state.borrow_mut();
        let key = match state.timers.keys().next() {
            Some(&key) if key.0 <= target => key,
            _ => return Due::Idle,
        };
        let Some(timer) = state.timers.remove(&key) else {
            return Due::Idle;
        };
        if !timer.live.get() {
            return Due::Skip;
        }
        if key.0 > state.now {
            state.now = key.0;
        }
        Due::Fire(timer)
    }

    /// Deadline of the earliest live timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state
            .borrow()
            .timers
            .iter()
            .find(|(_, timer)| timer.live.get())
            .map(|((deadline, _), _)| *deadline)
    }

    /// Number of timers that are still armed.
    pub fn pending_timers(&self) -> usize {
        self.state
            .borrow()
            .timers
            .values()
            .filter(|timer| timer.live.get())
            .count()
    }

    /// Number of posted tasks waiting for a drain.
    pub fn pending_tasks(&self) -> usize {
        self.state.borrow().posted.len()
    }
}

/// Ownership of one scheduled timer.
#[derive(Debug)]
pub struct TimerHandle {
    live: Rc<Cell<bool>>,
    deadline: Duration,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.live.set(false);
    }

    /// True until the timer fires or is cancelled.
    pub fn is_pending(&self) -> bool {
        self.live.get()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
