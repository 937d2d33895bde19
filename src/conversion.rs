//! Integer conversions between degrees, pulse widths, and duty counts.
//!
//! These functions are independent of any registry or backend and can be tested
//! in isolation. All intermediate products are computed in 64 bits, so no input
//! combination overflows.
//!
//! Angles map onto pulse widths through three points: 0° to `min_us`, 90° to
//! [`DEFAULT_PULSE_WIDTH_US`], and 180° to `max_us`. 90° is always exactly centered,
//! even when `min_us`/`max_us` are not symmetric around it; the shorter side just
//! gets coarser angular resolution.

use crate::config::{DEFAULT_ANGLE, DEFAULT_PULSE_WIDTH_US, MAX_ANGLE, REFRESH_PERIOD_US};

/// Re-map `value` from `in_min..=in_max` onto `out_min..=out_max`.
///
/// Division truncates toward zero. The result is not clamped, so values outside
/// the input range extrapolate. An empty input range maps everything to `out_min`.
#[must_use]
pub fn map_range(value: i64, in_min: i64, in_max: i64, out_min: i64, out_max: i64) -> i64 {
    let in_span = in_max.saturating_sub(in_min);
    if in_span == 0 {
        return out_min;
    }
    let out_span = out_max.saturating_sub(out_min);
    value
        .saturating_sub(in_min)
        .saturating_mul(out_span)
        .checked_div(in_span)
        .unwrap_or(0)
        .saturating_add(out_min)
}

/// Clamp a signed angle command to `0..=180`.
#[must_use]
pub fn clamp_degrees(value: i32) -> u8 {
    u8::try_from(value.clamp(0, i32::from(MAX_ANGLE))).unwrap_or(MAX_ANGLE)
}

/// Clamp a signed pulse-width command to `min_us..=max_us`.
#[must_use]
pub fn clamp_pulse_us(value: i32, min_us: u16, max_us: u16) -> u16 {
    let clamped = value.clamp(i32::from(min_us), i32::from(max_us));
    u16::try_from(clamped).unwrap_or(max_us)
}

/// Convert an angle (clamped to `0..=180`) to a pulse width.
#[must_use]
pub fn degrees_to_pulse_us(degrees: u8, min_us: u16, max_us: u16) -> u16 {
    let degrees = degrees.min(MAX_ANGLE);
    let center = i64::from(DEFAULT_PULSE_WIDTH_US);
    let pulse_us = match degrees.cmp(&DEFAULT_ANGLE) {
        core::cmp::Ordering::Equal => return DEFAULT_PULSE_WIDTH_US,
        core::cmp::Ordering::Less => map_range(
            i64::from(degrees),
            0,
            i64::from(DEFAULT_ANGLE),
            i64::from(min_us),
            center,
        ),
        core::cmp::Ordering::Greater => map_range(
            i64::from(degrees),
            i64::from(DEFAULT_ANGLE),
            i64::from(MAX_ANGLE),
            center,
            i64::from(max_us),
        ),
    };
    to_u16(pulse_us)
}

/// Convert a pulse width back to an angle using the inverse of
/// [`degrees_to_pulse_us`].
///
/// `pulse_us` is expected to lie in `min_us..=max_us`; the result is clamped to
/// `0..=180` either way.
#[must_use]
pub fn pulse_us_to_degrees(pulse_us: u16, min_us: u16, max_us: u16) -> u8 {
    let center = i64::from(DEFAULT_PULSE_WIDTH_US);
    let degrees = match pulse_us.cmp(&DEFAULT_PULSE_WIDTH_US) {
        core::cmp::Ordering::Equal => return DEFAULT_ANGLE,
        core::cmp::Ordering::Less => map_range(
            i64::from(pulse_us),
            i64::from(min_us),
            center,
            0,
            i64::from(DEFAULT_ANGLE),
        ),
        core::cmp::Ordering::Greater => map_range(
            i64::from(pulse_us),
            center,
            i64::from(max_us),
            i64::from(DEFAULT_ANGLE),
            i64::from(MAX_ANGLE),
        ),
    };
    u8::try_from(degrees.clamp(0, i64::from(MAX_ANGLE))).unwrap_or(MAX_ANGLE)
}

/// Convert a pulse width to a duty count.
///
/// `full_scale` is the count for 100% duty (e.g. 65536 at 16 bits). The result is
/// `pulse_us / REFRESH_PERIOD_US * full_scale`, truncated.
#[must_use]
pub fn pulse_us_to_duty(pulse_us: u16, full_scale: u32) -> u32 {
    let duty = u64::from(pulse_us)
        .saturating_mul(u64::from(full_scale))
        .checked_div(u64::from(REFRESH_PERIOD_US))
        .unwrap_or(0);
    u32::try_from(duty).unwrap_or(u32::MAX)
}

fn to_u16(value: i64) -> u16 {
    u16::try_from(value.clamp(0, i64::from(u16::MAX))).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_range_truncates_like_integer_division() {
        assert_eq!(map_range(45, 0, 90, 544, 1500), 1022);
        assert_eq!(map_range(1000, 544, 1500, 0, 90), 42);
        assert_eq!(map_range(7, 3, 3, 10, 20), 10);
    }

    #[test]
    fn center_is_pinned_for_asymmetric_bounds() {
        assert_eq!(degrees_to_pulse_us(90, 544, 2400), 1500);
        assert_eq!(degrees_to_pulse_us(90, 1400, 1600), 1500);
        assert_eq!(pulse_us_to_degrees(1500, 900, 2100), 90);
    }

    #[test]
    fn endpoints_map_to_bounds() {
        assert_eq!(degrees_to_pulse_us(0, 600, 2300), 600);
        assert_eq!(degrees_to_pulse_us(180, 600, 2300), 2300);
        assert_eq!(pulse_us_to_degrees(600, 600, 2300), 0);
        assert_eq!(pulse_us_to_degrees(2300, 600, 2300), 180);
    }

    #[test]
    fn each_half_uses_its_own_slope() {
        assert_eq!(degrees_to_pulse_us(45, 544, 2400), 1022);
        assert_eq!(degrees_to_pulse_us(135, 544, 2400), 1950);
        assert_eq!(pulse_us_to_degrees(1022, 544, 2400), 45);
        assert_eq!(pulse_us_to_degrees(1950, 544, 2400), 135);
    }

    #[test]
    fn clamps_signed_commands() {
        assert_eq!(clamp_degrees(-20), 0);
        assert_eq!(clamp_degrees(300), 180);
        assert_eq!(clamp_pulse_us(-5, 544, 2400), 544);
        assert_eq!(clamp_pulse_us(9_000, 544, 2400), 2400);
    }

    #[test]
    fn duty_scales_with_refresh_period() {
        assert_eq!(pulse_us_to_duty(1500, 65_536), 4915);
        assert_eq!(pulse_us_to_duty(544, 65_536), 1782);
        assert_eq!(pulse_us_to_duty(2400, 65_536), 7864);
        assert_eq!(pulse_us_to_duty(0, 65_536), 0);
        assert_eq!(pulse_us_to_duty(1500, 0), 0);
    }

    #[test]
    fn duty_does_not_overflow_at_extremes() {
        assert_eq!(pulse_us_to_duty(u16::MAX, u32::MAX), u32::MAX);
        assert_eq!(pulse_us_to_duty(u16::MAX, 65_536), 214_745);
    }
}
