//! Measurement - one parsed reading from the external tool
//!
//! Line format on the tool's primary stream:
//!
//! ```text
//! [S] <angle> <distance> <quality>
//! ```
//!
//! The leading `S` token only appears on the first reading of a new sweep.

use std::fmt;

use crate::ParseError;

/// Token that marks the first reading of a new rotation
pub const ROTATION_MARKER: &str = "S";

/// Separator used by the `Display` rendering
pub const ATTRIBUTES_SEPARATOR: &str = ",";

/// Marked angles carry at most one extra turn
const MAX_MARKED_ANGLE: f64 = 720.0;

/// Field positions after the rotation marker has been stripped
const ANGLE_INDEX: usize = 0;
const DISTANCE_INDEX: usize = 1;
const QUALITY_INDEX: usize = 2;

/// A single normalized reading.
///
/// The angle is always in `[0, 360)` once constructed. Values are never
/// mutated; a newer reading for the same degree replaces the old one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Angle in degrees, `[0, 360)`
    angle: f64,

    /// Distance in millimeters
    distance: f64,

    /// Sensor-reported return strength, 0 means no usable return
    quality: u32,

    /// First reading of a new sweep
    rotation_marker: bool,
}

impl Measurement {
    /// Build a measurement from raw fields.
    ///
    /// Validates the raw angle, then realigns rotation-marked angles, mirrors
    /// the angle for an inverted mount, applies `angle_adjustment` and
    /// normalizes back into `[0, 360)`. `angle_adjustment` is expected to be
    /// smaller than a full turn; larger values still wrap.
    pub fn new(
        angle: f64,
        distance: f64,
        quality: u32,
        rotation_marker: bool,
        upside_down: bool,
        angle_adjustment: f64,
    ) -> Result<Self, ParseError> {
        validate_angle(angle, rotation_marker)?;

        let mut angle = angle;
        if rotation_marker {
            angle -= 360.0;
        }
        if upside_down {
            angle = 360.0 - angle;
        }
        angle = normalize(angle + angle_adjustment);

        Ok(Self {
            angle,
            distance,
            quality,
            rotation_marker,
        })
    }

    /// Parse one line of the external tool's primary stream
    ///
    /// # Errors
    /// - `MalformedLine` when the field count is not 3 (after the marker)
    /// - `FieldParse` naming the field that failed numeric parsing
    /// - `InvalidAngle` when the raw angle is out of range
    pub fn parse(line: &str, upside_down: bool, angle_adjustment: f64) -> Result<Self, ParseError> {
        let mut fields: Vec<&str> = line.split_whitespace().collect();

        let rotation_marker = fields.first() == Some(&ROTATION_MARKER);
        if rotation_marker {
            fields.remove(0);
        }

        if fields.len() != 3 {
            return Err(ParseError::MalformedLine {
                found: fields.len(),
            });
        }

        let angle: f64 = parse_field("angle", fields[ANGLE_INDEX])?;
        let distance: f64 = parse_field("distance", fields[DISTANCE_INDEX])?;
        let quality: u32 = parse_field("quality", fields[QUALITY_INDEX])?;

        Self::new(
            angle,
            distance,
            quality,
            rotation_marker,
            upside_down,
            angle_adjustment,
        )
    }

    /// Angle in degrees, `[0, 360)`
    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Distance in millimeters
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// True when this reading started a new sweep
    #[inline]
    pub fn is_rotation_marker(&self) -> bool {
        self.rotation_marker
    }

    /// Whole-degree slot this reading belongs to
    #[inline]
    pub fn slot(&self) -> usize {
        (self.angle as usize) % crate::SLOT_COUNT
    }

    /// Render in the external tool's line format (without rotation marker)
    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.angle, self.distance, self.quality)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}{sep}{:.6}{sep}{}",
            self.angle,
            self.distance,
            self.quality,
            sep = ATTRIBUTES_SEPARATOR
        )
    }
}

fn validate_angle(angle: f64, rotation_marker: bool) -> Result<(), ParseError> {
    let valid = if rotation_marker {
        (0.0..MAX_MARKED_ANGLE).contains(&angle)
    } else {
        (0.0..360.0).contains(&angle)
    };

    if valid {
        Ok(())
    } else {
        Err(ParseError::InvalidAngle {
            angle,
            rotation_marker,
        })
    }
}

/// Wrap into `[0, 360)`; NaN and infinities are left as they are
fn normalize(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, ParseError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ParseError::FieldParse {
        field,
        value: value.to_string(),
        message: e.to_string(),
    })
}
