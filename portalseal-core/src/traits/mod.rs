//! Platform abstraction traits so key generation and expiry stay deterministic under test.

pub mod random;
pub mod clock;
