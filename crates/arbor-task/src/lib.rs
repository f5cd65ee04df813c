//! Arbor Task
//!
//! Dedicated single-threaded executors.
//!
//! Every document owns one [`TaskRunner`] that serializes all of its tree
//! mutations, and a shared runner delivers events. Work is submitted either
//! as a single closure or as a [`Scene`], an ordered batch that always runs
//! as one unit.

mod error;
mod runner;
mod scene;

pub use error::TaskError;
pub use runner::{TaskFn, TaskRunner};
pub use scene::Scene;
