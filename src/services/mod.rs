pub mod normalizer;
pub mod timer_engine;
pub mod visibility_monitor;

pub use timer_engine::TimerEngine;
pub use visibility_monitor::{VisibilityMonitor, VisibilitySignal};
