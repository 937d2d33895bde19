//! A recording [`PwmBackend`] for host tests and demos.
//!
//! Only built with the `host` feature; firmware links a real backend.
//!
//! [`RecordingPwm`] keeps the last duty written to each pin and a bounded history
//! of every call, and can be told to reject pins the way a board rejects pins
//! without PWM capability.

use heapless::{LinearMap, Vec};

use crate::pwm::PwmBackend;

/// Number of calls kept in [`RecordingPwm::calls`]. Later calls are not recorded.
pub const CALL_HISTORY: usize = 128;

const MAX_PINS: usize = 32;

/// One call made on a [`RecordingPwm`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmCall {
    /// [`PwmBackend::configure_frequency`]
    Frequency {
        /// Pin configured.
        pin: u8,
        /// Requested frequency.
        frequency_hz: u32,
    },
    /// [`PwmBackend::configure_resolution`]
    Resolution {
        /// Requested resolution.
        bits: u8,
    },
    /// [`PwmBackend::write_duty`]
    Duty {
        /// Pin written.
        pin: u8,
        /// Raw duty value.
        duty: u32,
    },
}

/// Failure reported by a [`RecordingPwm`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// The pin was marked with [`RecordingPwm::reject_pin`].
    #[display("pin {pin} has no PWM")]
    Rejected {
        /// Rejected pin.
        pin: u8,
    },
}

/// In-memory PWM backend that records what the servos asked for.
///
/// Before [`configure_resolution`](PwmBackend::configure_resolution) it reports an
/// 8-bit maximum (255), like Arduino-style `analogWrite` defaults.
///
/// # Example
///
/// ```rust
/// use pwm_servo::{AttachConfig, ChannelRegistry, Servo, mock::RecordingPwm};
///
/// let registry: ChannelRegistry<RecordingPwm, 4> = ChannelRegistry::new(RecordingPwm::new());
/// let mut servo = Servo::new(&registry);
/// servo.attach(3, AttachConfig::default()).unwrap();
///
/// // 1500 µs of a 20 ms frame at 16 bits.
/// assert_eq!(registry.with_pwm(|pwm| pwm.duty(3)), Some(4915));
/// ```
#[derive(Debug)]
pub struct RecordingPwm {
    calls: Vec<PwmCall, CALL_HISTORY>,
    duties: LinearMap<u8, u32, MAX_PINS>,
    rejected: Vec<u8, MAX_PINS>,
    resolution_bits: u8,
}

impl RecordingPwm {
    /// An empty recorder that accepts every pin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            calls: Vec::new(),
            duties: LinearMap::new(),
            rejected: Vec::new(),
            resolution_bits: 8,
        }
    }

    /// Make [`configure_frequency`](PwmBackend::configure_frequency) fail for `pin`.
    pub fn reject_pin(&mut self, pin: u8) {
        if !self.rejected.contains(&pin) {
            // Full list: the pin simply stays accepted.
            let _ = self.rejected.push(pin);
        }
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[PwmCall] {
        &self.calls
    }

    /// Forget the call history (last duties are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Last duty written to `pin`.
    #[must_use]
    pub fn duty(&self, pin: u8) -> Option<u32> {
        self.duties.get(&pin).copied()
    }

    /// How many times the shared resolution was configured.
    #[must_use]
    pub fn resolution_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, PwmCall::Resolution { .. }))
            .count()
    }

    fn record(&mut self, call: PwmCall) {
        // History is best-effort once full.
        let _ = self.calls.push(call);
    }
}

impl Default for RecordingPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmBackend for RecordingPwm {
    type Error = MockError;

    fn configure_frequency(&mut self, pin: u8, frequency_hz: u32) -> Result<(), Self::Error> {
        self.record(PwmCall::Frequency { pin, frequency_hz });
        if self.rejected.contains(&pin) {
            return Err(MockError::Rejected { pin });
        }
        Ok(())
    }

    fn configure_resolution(&mut self, bits: u8) {
        self.record(PwmCall::Resolution { bits });
        self.resolution_bits = bits;
    }

    fn max_duty_count(&self) -> u32 {
        1u32.checked_shl(u32::from(self.resolution_bits))
            .map_or(u32::MAX, |full| full.saturating_sub(1))
    }

    fn write_duty(&mut self, pin: u8, duty: u32) -> Result<(), Self::Error> {
        self.record(PwmCall::Duty { pin, duty });
        // Map full: the write is still recorded in the history.
        let _ = self.duties.insert(pin, duty);
        Ok(())
    }
}
