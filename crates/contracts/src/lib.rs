//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Every other crate shares its types through this one.
//!
//! ## Angle Model
//! - Angles are degrees in `[0, 360)` after normalization
//! - Slots are addressed by whole degree: `floor(angle) mod 360`

mod blueprint;
mod direction;
mod error;
mod measurement;
mod scan;

pub use blueprint::*;
pub use direction::CardinalDirection;
pub use error::*;
pub use measurement::{Measurement, ATTRIBUTES_SEPARATOR, ROTATION_MARKER};
pub use scan::{Scan, SLOT_COUNT};
