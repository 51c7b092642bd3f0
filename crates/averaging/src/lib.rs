//! # Averaging
//!
//! Directional distance queries over a 360-slot `Scan`.
//!
//! Responsibilities:
//! - Width validation (odd, `[1, 360)`)
//! - Wrapping angular windows
//! - Mean distance per angle, per compass direction, per direction set
//!
//! ## Usage Example
//!
//! ```
//! use averaging::{average_at, averages_for_directions};
//! use contracts::{CardinalDirection, Measurement, Scan};
//!
//! let mut scan = Scan::empty();
//! scan.insert(Measurement::parse("90.0 1200.0 47", false, 0.0).unwrap());
//!
//! assert_eq!(average_at(&scan, 90, 3).unwrap(), 1200.0);
//!
//! let averages = averages_for_directions(&scan, 1, &[CardinalDirection::East]).unwrap();
//! assert_eq!(averages[&CardinalDirection::East], 1200.0);
//! ```

mod engine;
mod window;

pub use engine::{
    average_at, average_at_strict, average_for_direction, averages_for_all_directions,
    averages_for_directions, direction_slot,
};
pub use window::{validate_width, window_angles};

// Re-export contracts types
pub use contracts::{AverageError, CardinalDirection, Scan};
