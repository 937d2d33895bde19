//! The PWM capability the servo channels drive, plus an `embedded-hal` adapter.
//!
//! A [`PwmBackend`] addresses outputs by pin number, the way board-level
//! `analogWrite`-style APIs do. [`SetDutyCycleBank`] turns a fixed array of
//! [`embedded_hal::pwm::SetDutyCycle`] channels into such a backend.

use embedded_hal::pwm::{Error as _, ErrorKind, SetDutyCycle};

use crate::config::REFRESH_FREQUENCY_HZ;

// ============================================================================
// PwmBackend - peripheral capability
// ============================================================================

/// Pin-addressed hardware PWM, as consumed by [`ChannelRegistry`](crate::ChannelRegistry).
///
/// Implementations own the peripheral. The registry calls
/// [`configure_frequency`](Self::configure_frequency) once per attach,
/// [`configure_resolution`](Self::configure_resolution) and
/// [`max_duty_count`](Self::max_duty_count) once per process, and
/// [`write_duty`](Self::write_duty) on every pulse update.
pub trait PwmBackend {
    /// Failure reported by the peripheral.
    type Error: core::fmt::Debug;

    /// Configure the refresh frequency of `pin`'s PWM output.
    ///
    /// # Errors
    ///
    /// Fails if `pin` has no PWM capability or cannot run at `frequency_hz`.
    fn configure_frequency(&mut self, pin: u8, frequency_hz: u32) -> Result<(), Self::Error>;

    /// Configure the duty resolution shared by all outputs.
    fn configure_resolution(&mut self, bits: u8);

    /// Largest duty value accepted at the current resolution.
    fn max_duty_count(&self) -> u32;

    /// Write a raw duty value to `pin`.
    ///
    /// # Errors
    ///
    /// Fails if the peripheral rejects the write.
    fn write_duty(&mut self, pin: u8, duty: u32) -> Result<(), Self::Error>;
}

// ============================================================================
// SetDutyCycleBank - embedded-hal adapter
// ============================================================================

/// Failure reported by a [`SetDutyCycleBank`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BankError {
    /// The pin number is not an index into the bank.
    #[display("no PWM channel at index {pin}")]
    NoSuchPin {
        /// Requested pin (channel index).
        pin: u8,
    },
    /// The bank's timers run at a different frame rate than requested.
    #[display("channels run at {configured_hz} Hz, {requested_hz} Hz requested")]
    FrequencyMismatch {
        /// Frame rate the channels were set up with.
        configured_hz: u32,
        /// Frame rate the caller asked for.
        requested_hz: u32,
    },
    /// The underlying channel failed.
    #[display("PWM channel error: {kind:?}")]
    Channel {
        /// Kind reported by the `embedded-hal` channel.
        kind: ErrorKind,
    },
}

/// A fixed array of `embedded-hal` PWM channels addressed by index.
///
/// The channels' timers must already run at the servo refresh rate
/// ([`REFRESH_FREQUENCY_HZ`] by default); the HAL that produced them owns that
/// configuration, so [`configure_frequency`](PwmBackend::configure_frequency) only
/// checks that the requested rate matches. Resolution is likewise fixed by the
/// channels: duty values are rescaled per channel from the shared full scale
/// reported by channel 0.
///
/// # Example
///
/// ```rust,ignore
/// use pwm_servo::{AttachConfig, ChannelRegistry, Servo, pwm::SetDutyCycleBank};
///
/// // `ch0`/`ch1` are any `embedded_hal::pwm::SetDutyCycle` outputs running at 50 Hz.
/// let registry: ChannelRegistry<_, 2> = ChannelRegistry::new(SetDutyCycleBank::new([ch0, ch1]));
/// let mut servo = Servo::new(&registry);
/// servo.attach(1, AttachConfig::default())?;
/// servo.write(45);
/// ```
pub struct SetDutyCycleBank<C, const M: usize> {
    channels: [C; M],
    frequency_hz: u32,
    resolution_bits: Option<u8>,
}

impl<C: SetDutyCycle, const M: usize> SetDutyCycleBank<C, M> {
    /// Wrap channels whose timers run at [`REFRESH_FREQUENCY_HZ`].
    #[must_use]
    pub const fn new(channels: [C; M]) -> Self {
        Self::with_frequency(channels, REFRESH_FREQUENCY_HZ)
    }

    /// Wrap channels whose timers run at `frequency_hz`.
    #[must_use]
    pub const fn with_frequency(channels: [C; M], frequency_hz: u32) -> Self {
        Self {
            channels,
            frequency_hz,
            resolution_bits: None,
        }
    }

    /// Resolution most recently requested by the registry, if any.
    #[must_use]
    pub const fn requested_resolution(&self) -> Option<u8> {
        self.resolution_bits
    }

    /// Borrow a channel by index.
    #[must_use]
    pub fn channel(&self, pin: u8) -> Option<&C> {
        self.channels.get(usize::from(pin))
    }

    /// Give the channels back.
    pub fn into_channels(self) -> [C; M] {
        self.channels
    }
}

impl<C: SetDutyCycle, const M: usize> PwmBackend for SetDutyCycleBank<C, M> {
    type Error = BankError;

    fn configure_frequency(&mut self, pin: u8, frequency_hz: u32) -> Result<(), Self::Error> {
        if usize::from(pin) >= M {
            return Err(BankError::NoSuchPin { pin });
        }
        if frequency_hz != self.frequency_hz {
            return Err(BankError::FrequencyMismatch {
                configured_hz: self.frequency_hz,
                requested_hz: frequency_hz,
            });
        }
        Ok(())
    }

    fn configure_resolution(&mut self, bits: u8) {
        self.resolution_bits = Some(bits);
    }

    fn max_duty_count(&self) -> u32 {
        self.channels
            .first()
            .map_or(0, |channel| u32::from(channel.max_duty_cycle()))
    }

    fn write_duty(&mut self, pin: u8, duty: u32) -> Result<(), Self::Error> {
        let full_scale = u64::from(self.max_duty_count()).saturating_add(1);
        let channel = self
            .channels
            .get_mut(usize::from(pin))
            .ok_or(BankError::NoSuchPin { pin })?;
        let channel_max = channel.max_duty_cycle();
        let scaled = u64::from(duty)
            .saturating_mul(u64::from(channel_max).saturating_add(1))
            .checked_div(full_scale)
            .unwrap_or(0);
        let scaled = u16::try_from(scaled).unwrap_or(u16::MAX).min(channel_max);
        channel
            .set_duty_cycle(scaled)
            .map_err(|err| BankError::Channel { kind: err.kind() })
    }
}
