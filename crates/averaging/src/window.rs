//! Angular query window
//!
//! A window of odd `width` is centred on a whole degree and spans
//! `(width - 1) / 2` degrees on each side, wrapping at 0/360.

use contracts::{AverageError, SLOT_COUNT};

/// Check that `width` is odd and within `[1, 360)`
///
/// Range violations are reported before parity so that 0 and 360 are
/// classified as too small / too large rather than even.
pub fn validate_width(width: usize) -> Result<(), AverageError> {
    if width < 1 {
        return Err(AverageError::WidthTooSmall { width });
    }
    if width >= SLOT_COUNT {
        return Err(AverageError::WidthTooLarge { width });
    }
    if width % 2 == 0 {
        return Err(AverageError::WidthNotOdd { width });
    }
    Ok(())
}

/// Slots covered by a window, in angular order
///
/// Built from up to three contiguous ranges: the part wrapped below 0,
/// the in-range part, and the part wrapped past 359.
pub fn window_angles(middle_angle: usize, width: usize) -> Result<Vec<usize>, AverageError> {
    validate_width(width)?;

    let slots = SLOT_COUNT as isize;
    let middle = (middle_angle % SLOT_COUNT) as isize;
    let half = ((width - 1) / 2) as isize;
    let left = middle - half;
    let right = middle + half;

    let mut angles = Vec::with_capacity(width);
    if left < 0 {
        angles.extend((slots + left) as usize..SLOT_COUNT);
    }
    angles.extend(left.max(0) as usize..=right.min(slots - 1) as usize);
    if right >= slots {
        angles.extend(0..=(right - slots) as usize);
    }
    Ok(angles)
}
