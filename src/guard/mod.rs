//! Guards over the shared working copy.
//!
//! - [`permanent`] - files pinned to the canonical reference
//! - [`ref_state`] - capture/restore of the working copy position

pub mod permanent;
pub mod ref_state;

pub use permanent::{PermanentFile, PermanentFileGuard, Reasserted};
pub use ref_state::{RefState, RefStateGuard};
