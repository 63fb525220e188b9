//! Native implementations of the platform traits.

pub mod native_clock;
pub mod native_random;

pub use native_clock::{ManualClock, NativeClock};
pub use native_random::NativeRandom;
