//! Built-in scheduled tasks.

pub mod sweep;

pub use sweep::ShareSweepJob;
