//! # Shared Types Crate
//!
//! Chain entities shared across the slot authoring engine and the node
//! runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: headers are encoded in exactly one place
//!   ([`BlockHeader::encode`]); seals and hashes are computed over that
//!   encoding.
//! - **Digest Ordering**: the pre-digest is always the first digest item and
//!   the seal, once present, is always the last.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
