//! Mean distance over a window of a `Scan`
//!
//! All functions work on a snapshot and never touch shared state.

use std::collections::HashMap;

use contracts::{AverageError, CardinalDirection, Scan};
use tracing::trace;

use crate::window::{validate_width, window_angles};

/// Mean distance around `middle_angle`.
///
/// `width == 1` returns the slot's distance directly, or `0.0` when the slot
/// is empty. Wider windows average every slot that holds a reading with
/// nonzero distance and nonzero quality.
///
/// When no slot in a wider window qualifies the result is `NaN`; callers
/// should read that as "no usable data". Use [`average_at_strict`] to get
/// an error instead.
pub fn average_at(scan: &Scan, middle_angle: usize, width: usize) -> Result<f64, AverageError> {
    validate_width(width)?;

    if width == 1 {
        return Ok(scan.get(middle_angle).map_or(0.0, |m| m.distance()));
    }

    let (sum, count) = window_sum(scan, middle_angle, width)?;
    if count == 0 {
        trace!(middle_angle, width, "no usable readings in window");
    }
    Ok(sum / count as f64)
}

/// Like [`average_at`], but an empty window is `AverageError::NoData`
pub fn average_at_strict(
    scan: &Scan,
    middle_angle: usize,
    width: usize,
) -> Result<f64, AverageError> {
    validate_width(width)?;

    if width == 1 {
        return scan
            .get(middle_angle)
            .map(|m| m.distance())
            .ok_or(AverageError::NoData {
                middle_angle,
                width,
            });
    }

    match window_sum(scan, middle_angle, width)? {
        (_, 0) => Err(AverageError::NoData {
            middle_angle,
            width,
        }),
        (sum, count) => Ok(sum / count as f64),
    }
}

/// Whole degree a direction's window is centred on.
///
/// Half-degree angles round up in the upper semicircle (>= 180) and down in
/// the lower one, so 157.5 maps to 157 and 202.5 maps to 203.
pub fn direction_slot(direction: CardinalDirection) -> usize {
    let angle = direction.angle();
    let rounded = if angle >= 180.0 {
        angle.ceil()
    } else {
        angle.floor()
    };
    rounded as usize
}

/// Mean distance in a compass direction
pub fn average_for_direction(
    scan: &Scan,
    width: usize,
    direction: CardinalDirection,
) -> Result<f64, AverageError> {
    average_at(scan, direction_slot(direction), width)
}

/// Mean distance for each requested direction.
///
/// Fails as a whole, without a partial map, when `width` is invalid.
pub fn averages_for_directions(
    scan: &Scan,
    width: usize,
    directions: &[CardinalDirection],
) -> Result<HashMap<CardinalDirection, f64>, AverageError> {
    validate_width(width)?;

    let mut averages = HashMap::with_capacity(directions.len());
    for &direction in directions {
        averages.insert(direction, average_for_direction(scan, width, direction)?);
    }
    Ok(averages)
}

/// Mean distance for all sixteen directions
pub fn averages_for_all_directions(
    scan: &Scan,
    width: usize,
) -> Result<HashMap<CardinalDirection, f64>, AverageError> {
    averages_for_directions(scan, width, &CardinalDirection::ALL)
}

fn window_sum(scan: &Scan, middle_angle: usize, width: usize) -> Result<(f64, usize), AverageError> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for angle in window_angles(middle_angle, width)? {
        let Some(measurement) = scan.get(angle) else {
            continue;
        };
        if measurement.distance() == 0.0 || measurement.quality() == 0 {
            continue;
        }
        sum += measurement.distance();
        count += 1;
    }

    Ok((sum, count))
}
