//! Domain layer - authoring logic
//!
//! Pure functions (threshold, lottery, slot timing, sealing) plus the two
//! drivers that talk to the execution engine through the outbound ports
//! (epoch loader and block builder).
//!
//! ## Entities
//!
//! - [`EpochConfiguration`]: validated per-epoch parameters
//! - [`AuthoritySet`]: authorities plus this node's index
//! - [`SlotClaim`]: a won slot with its VRF output and proof
//! - [`Slot`]: one tick of the slot clock
//! - [`Seal`]: producer signature over the pre-seal header
//!
//! ## Services
//!
//! - [`calculate_threshold`]: stake share to lottery cutoff
//! - [`run_lottery`] / [`verify_claim`]: VRF slot lottery
//! - [`estimate_slot_time`]: median-drift slot start estimation
//! - [`load_configuration`]: epoch configuration from the runtime
//! - [`BlockBuilder`]: queue draining with requeue on rejection
//! - [`build_seal`] / [`verify_seal`]: header sealing

pub mod builder;
mod entities;
pub mod epoch;
pub mod lottery;
pub mod seal;
pub mod slot_time;
pub mod threshold;

pub use builder::{BlockBuilder, BuiltBlock};
pub use entities::*;
pub use epoch::{load_configuration, validate_configuration};
pub use lottery::{run_lottery, verify_claim};
pub use seal::{build_seal, seal_header, verify_seal, verify_sealed_header};
pub use slot_time::{estimate_slot_time, median, slot_of, slot_offset};
pub use threshold::calculate_threshold;
