//! Scan-and-apply pipeline over partition splits.
//!
//! Every split is a [`task::ScanTask`] driven by [`pipeline::drive`]: up to
//! `max_in_flight` units per split each loop fetch-apply-refill until the
//! scanner is exhausted, a request fails or the stop signal is raised.

pub mod pipeline;
pub mod stats;
pub mod task;

pub use pipeline::drive;
pub use task::{RunHandles, ScanTask, SplitOptions, SplitState};
