//! Field restriction: path sets, frames and the engine that drives them.

mod engine;
mod frame;
mod pathset;

pub use engine::{Activation, OptimizeMode, RestrictionEngine};
pub use frame::{Frame, FrameStack};
pub use pathset::PathSet;
