// Sitedeck main-thread runtime
// A single cooperative run loop: posted tasks, one-shot timers and watchdog slots.

pub mod main_loop;
pub mod watchdog;

pub use main_loop::{MainLoop, TimerHandle};
pub use watchdog::WatchdogSlot;
