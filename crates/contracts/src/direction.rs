//! Cardinal direction table
//!
//! Sixteen compass points in 22.5 degree steps, with their canonical angle
//! and display name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Compass direction the sensor can be queried in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardinalDirection {
    North,
    West,
    East,
    South,
    Northwest,
    Northeast,
    Southwest,
    Southeast,
    WestNorthwest,
    NorthNorthwest,
    EastNortheast,
    NorthNortheast,
    WestSouthwest,
    EastSoutheast,
    SouthSouthwest,
    SouthSoutheast,
}

impl CardinalDirection {
    /// Every direction, in table order
    pub const ALL: [CardinalDirection; 16] = [
        Self::North,
        Self::West,
        Self::East,
        Self::South,
        Self::Northwest,
        Self::Northeast,
        Self::Southwest,
        Self::Southeast,
        Self::WestNorthwest,
        Self::NorthNorthwest,
        Self::EastNortheast,
        Self::NorthNortheast,
        Self::WestSouthwest,
        Self::EastSoutheast,
        Self::SouthSouthwest,
        Self::SouthSoutheast,
    ];

    /// Canonical angle in degrees
    pub const fn angle(self) -> f64 {
        match self {
            Self::North => 0.0,
            Self::NorthNortheast => 22.5,
            Self::Northeast => 45.0,
            Self::EastNortheast => 67.5,
            Self::East => 90.0,
            Self::EastSoutheast => 112.5,
            Self::Southeast => 135.0,
            Self::SouthSoutheast => 157.5,
            Self::South => 180.0,
            Self::SouthSouthwest => 202.5,
            Self::Southwest => 225.0,
            Self::WestSouthwest => 247.5,
            Self::West => 270.0,
            Self::WestNorthwest => 292.5,
            Self::Northwest => 315.0,
            Self::NorthNorthwest => 337.5,
        }
    }

    /// Display name, e.g. `"north-northwest"`
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::West => "west",
            Self::East => "east",
            Self::South => "south",
            Self::Northwest => "northwest",
            Self::Northeast => "northeast",
            Self::Southwest => "southwest",
            Self::Southeast => "southeast",
            Self::WestNorthwest => "west-northwest",
            Self::NorthNorthwest => "north-northwest",
            Self::EastNortheast => "east-northeast",
            Self::NorthNortheast => "north-northeast",
            Self::WestSouthwest => "west-southwest",
            Self::EastSoutheast => "east-southeast",
            Self::SouthSouthwest => "south-southwest",
            Self::SouthSoutheast => "south-southeast",
        }
    }

    /// Look up a direction by display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardinalDirection {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| ContractError::config_parse(format!("unknown direction: '{s}'")))
    }
}
