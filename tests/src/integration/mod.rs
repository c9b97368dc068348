//! # Integration Flows
//!
//! - `authoring`: lottery → build → seal → verify, end to end
//! - `requeue`: failed attempts hand their extrinsics back to the queue
//! - `session`: the slot loop against a shared block tree

pub mod fixtures;

mod authoring;
mod requeue;
mod session;
