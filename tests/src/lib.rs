//! # Slot-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (lottery, threshold, seal, timing)
//! └── src/integration/  # Flows spanning builder, queue, seal and session
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p slot-tests
//!
//! # Benchmarks
//! cargo bench -p slot-tests
//! ```

#![allow(dead_code)]

pub mod integration;
