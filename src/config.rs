//! Pulse timing constants and per-attach servo configuration.
//!
//! See [`AttachConfig`] for the options accepted by [`Servo::attach`](crate::Servo::attach).

// ============================================================================
// Constants
// ============================================================================

/// Shortest pulse ever sent to a servo (microseconds).
pub const MIN_PULSE_WIDTH_US: u16 = 544;

/// Longest pulse ever sent to a servo (microseconds).
pub const MAX_PULSE_WIDTH_US: u16 = 2_400;

/// Pulse width of a freshly attached (or detached) servo: the center position.
pub const DEFAULT_PULSE_WIDTH_US: u16 = 1_500;

/// Angle matching [`DEFAULT_PULSE_WIDTH_US`].
pub const DEFAULT_ANGLE: u8 = 90;

/// Largest commandable angle.
pub const MAX_ANGLE: u8 = 180;

/// Servo refresh rate.
pub const REFRESH_FREQUENCY_HZ: u32 = 50;

/// One PWM frame in microseconds (20 ms at 50 Hz).
pub const REFRESH_PERIOD_US: u32 = 1_000_000 / REFRESH_FREQUENCY_HZ;

/// Duty resolution requested from the backend on the first successful attach.
pub const PWM_RESOLUTION_BITS: u8 = 16;

/// [`Servo::write`](crate::Servo::write) values below this are degrees; values at or
/// above it are microseconds.
pub const DEGREE_THRESHOLD: i32 = 500;

// ============================================================================
// AttachConfig
// ============================================================================

/// Pulse-width bounds for [`Servo::attach`](crate::Servo::attach).
///
/// Both fields are optional in spirit: [`AttachConfig::default()`] uses the full
/// hardware-safe range, and the builder methods override one bound at a time.
/// Bounds outside [`MIN_PULSE_WIDTH_US`]..=[`MAX_PULSE_WIDTH_US`] are clipped at
/// attach time rather than rejected.
///
/// # Example
///
/// ```rust
/// use pwm_servo::AttachConfig;
///
/// let config = AttachConfig::new().with_min_us(1_000).with_max_us(2_000);
/// assert_eq!(config.min_us, 1_000);
/// assert_eq!(AttachConfig::default().max_us, 2_400);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttachConfig {
    /// Pulse width for 0° (microseconds).
    pub min_us: u16,
    /// Pulse width for 180° (microseconds).
    pub max_us: u16,
}

impl AttachConfig {
    /// Full hardware-safe range: 544..2400 µs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_us: MIN_PULSE_WIDTH_US,
            max_us: MAX_PULSE_WIDTH_US,
        }
    }

    /// Override the 0° pulse width.
    #[must_use]
    pub const fn with_min_us(self, min_us: u16) -> Self {
        Self { min_us, ..self }
    }

    /// Override the 180° pulse width.
    #[must_use]
    pub const fn with_max_us(self, max_us: u16) -> Self {
        Self { max_us, ..self }
    }

    /// Clip both bounds to the hardware-safe range.
    ///
    /// Returns `None` when the range is empty before or after clipping.
    #[must_use]
    pub const fn clipped(self) -> Option<Self> {
        if self.min_us >= self.max_us {
            return None;
        }
        let min_us = if self.min_us < MIN_PULSE_WIDTH_US {
            MIN_PULSE_WIDTH_US
        } else {
            self.min_us
        };
        let max_us = if self.max_us > MAX_PULSE_WIDTH_US {
            MAX_PULSE_WIDTH_US
        } else {
            self.max_us
        };
        if min_us >= max_us {
            return None;
        }
        Some(Self { min_us, max_us })
    }
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self::new()
    }
}
