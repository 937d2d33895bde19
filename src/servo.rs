//! A device abstraction for hobby positional servos (SG90 and friends).
//!
//! This module provides [`Servo`], one servo bound to a slot of a shared
//! [`ChannelRegistry`]. See [`Servo`] for usage examples.
//!
//! Use the [`servo!`](crate::servo!) macro for a keyword-driven constructor with defaults.

use crate::config::{
    AttachConfig, DEFAULT_ANGLE, DEFAULT_PULSE_WIDTH_US, DEGREE_THRESHOLD, MAX_PULSE_WIDTH_US,
    MIN_PULSE_WIDTH_US, REFRESH_FREQUENCY_HZ,
};
use crate::conversion::{
    clamp_degrees, clamp_pulse_us, degrees_to_pulse_us, pulse_us_to_degrees, pulse_us_to_duty,
};
use crate::pwm::PwmBackend;
use crate::registry::{ChannelRegistry, RegistryState};
use crate::{Error, Result};

/// Create and attach a servo with keyword arguments and default pulse widths.
///
/// Required fields: `registry`, `pin`.
///
/// Optional fields: `min_us`, `max_us` (defaults to
/// [`MIN_PULSE_WIDTH_US`](crate::config::MIN_PULSE_WIDTH_US)/[`MAX_PULSE_WIDTH_US`](crate::config::MAX_PULSE_WIDTH_US)).
///
/// Evaluates to `Result<Servo>`. On failure the servo is dropped, so its slot
/// stays claimed (see [`ChannelRegistry`](crate::ChannelRegistry)).
///
/// # Example
///
/// ```rust,ignore
/// use pwm_servo::servo;
///
/// let mut pan = servo! { registry: &SERVOS, pin: 9 }?;
/// let mut tilt = servo! { registry: &SERVOS, pin: 10, min_us: 1_000, max_us: 2_000 }?;
/// ```
#[macro_export]
macro_rules! servo {
    (
        registry: $registry:expr,
        pin: $pin:expr
        $(, min_us: $min_us:expr)?
        $(, max_us: $max_us:expr)?
        $(,)?
    ) => {{
        let mut servo = $crate::Servo::new($registry);
        let config = $crate::AttachConfig::new()
            $(.with_min_us($min_us))?
            $(.with_max_us($max_us))?;
        servo.attach($pin, config).map(|_| servo)
    }};
}

/// A device abstraction for one hobby servo on a hardware PWM pin.
///
/// Construction claims a slot in the registry. [`attach`](Self::attach) binds the
/// slot to a pin and starts 50 Hz pulses at the center position;
/// [`write`](Self::write) and [`write_microseconds`](Self::write_microseconds) move
/// it; [`detach`](Self::detach) powers the output down and frees the pin.
///
/// Writes, reads, and detach on a servo that is not attached are silent no-ops
/// (reads return `0`). Dropping a servo does not detach it.
///
/// # Angles
///
/// Angles use a three-point map: 0° is `min_us`, 90° is always exactly 1500 µs,
/// and 180° is `max_us`. Each half is linear on its own, so asymmetric bounds give
/// each half a different slope.
///
/// # Example
///
/// ```rust,ignore
/// use pwm_servo::{AttachConfig, ChannelRegistry, Servo};
///
/// let mut servo = Servo::new(&SERVOS);
/// servo.attach(9, AttachConfig::default())?;
///
/// servo.write(45);                 // degrees (values below 500)
/// servo.write_microseconds(2_000); // raw pulse width
/// servo.write(1_200);              // values >= 500 are microseconds too
/// assert_eq!(servo.read_microseconds(), 1_200);
///
/// servo.detach();                  // let the servo relax
/// ```
pub struct Servo<'r, P: PwmBackend, const N: usize> {
    registry: &'r ChannelRegistry<P, N>,
    slot: Option<u8>,
    min_us: u16,
    max_us: u16,
    width_us: u16,
    degrees: u8,
}

impl<'r, P: PwmBackend, const N: usize> Servo<'r, P, N> {
    /// Claim a slot in `registry`.
    ///
    /// If every slot is already claimed the servo is still returned, but it is
    /// permanently invalid: [`attached`](Self::attached) is `false` and
    /// [`attach`](Self::attach) always fails with [`Error::PoolExhausted`].
    #[must_use]
    pub fn new(registry: &'r ChannelRegistry<P, N>) -> Self {
        let slot = registry.allocate_slot();
        match slot {
            Some(slot) => debug!("servo: claimed slot {}", slot),
            None => warn!("servo: all {} slots claimed", N),
        }
        Self {
            registry,
            slot,
            min_us: MIN_PULSE_WIDTH_US,
            max_us: MAX_PULSE_WIDTH_US,
            width_us: DEFAULT_PULSE_WIDTH_US,
            degrees: DEFAULT_ANGLE,
        }
    }

    /// Registry slot owned by this servo, or `None` if the pool was exhausted.
    #[must_use]
    pub const fn slot(&self) -> Option<u8> {
        self.slot
    }

    /// Effective 0° pulse width (µs), after clipping.
    #[must_use]
    pub const fn min_us(&self) -> u16 {
        self.min_us
    }

    /// Effective 180° pulse width (µs), after clipping.
    #[must_use]
    pub const fn max_us(&self) -> u16 {
        self.max_us
    }

    /// Pin this servo currently drives.
    #[must_use]
    pub fn pin(&self) -> Option<u8> {
        self.slot.and_then(|slot| self.registry.pin_of(slot))
    }

    /// Whether this servo is bound to a pin.
    #[must_use]
    pub fn attached(&self) -> bool {
        self.pin().is_some()
    }

    /// Bind this servo to `pin` and start pulsing at the stored position (the
    /// center, unless moved before a detach).
    ///
    /// Bounds outside 544..=2400 µs are clipped, not rejected. The first successful
    /// attach on a registry also sets the shared 16-bit duty resolution.
    ///
    /// Returns the slot index.
    ///
    /// # Errors
    ///
    /// Checked in this order, with nothing changed on failure:
    /// - [`Error::PoolExhausted`] if this servo has no slot.
    /// - [`Error::AlreadyAttached`] if it already drives a pin.
    /// - [`Error::InvalidRange`] if `min_us >= max_us`, before or after clipping.
    /// - [`Error::PinInUse`] if another servo drives `pin`.
    /// - [`Error::PeripheralRejected`] if the backend cannot run `pin` at 50 Hz.
    pub fn attach(&mut self, pin: u8, config: AttachConfig) -> Result<u8> {
        let Some(slot) = self.slot else {
            warn!("servo: attach to pin {} without a slot", pin);
            return Err(Error::PoolExhausted);
        };
        let registry = self.registry;
        let width_us = self.width_us;
        let clipped = registry.with_state(|state| {
            if state.pin_of(slot).is_some() {
                return Err(Error::AlreadyAttached);
            }
            let clipped = config.clipped().ok_or(Error::InvalidRange {
                min_us: config.min_us,
                max_us: config.max_us,
            })?;
            if state.slot_of(pin).is_some() {
                return Err(Error::PinInUse { pin });
            }
            state
                .pwm_mut()
                .configure_frequency(pin, REFRESH_FREQUENCY_HZ)
                .map_err(|_| Error::PeripheralRejected { pin })?;
            state.ensure_resolution_configured();
            state.bind(slot, pin)?;
            push_pulse(state, pin, width_us);
            Ok(clipped)
        });
        let clipped = match clipped {
            Ok(clipped) => clipped,
            Err(err) => {
                warn!("servo slot {}: attach to pin {} failed: {}", slot, pin, err);
                return Err(err);
            }
        };

        self.min_us = clipped.min_us;
        self.max_us = clipped.max_us;
        info!(
            "servo slot {}: attached to pin {}, range {}..{} us",
            slot,
            pin,
            clipped.min_us,
            clipped.max_us
        );
        Ok(slot)
    }

    /// Power the output down and free the pin.
    ///
    /// The stored position resets to the center whether or not the servo was
    /// attached, so a later [`attach`](Self::attach) starts centered. The slot stays
    /// claimed.
    pub fn detach(&mut self) {
        self.width_us = DEFAULT_PULSE_WIDTH_US;
        self.degrees = DEFAULT_ANGLE;
        let Some(slot) = self.slot else {
            return;
        };
        self.registry.with_state(|state| {
            if let Some(pin) = state.pin_of(slot) {
                write_duty_logged(state, pin, 0);
                state.unbind(slot);
                info!("servo slot {}: detached from pin {}", slot, pin);
            }
        });
    }

    /// Give the slot back to the registry so a new [`Servo`] can claim it.
    ///
    /// Detaches first. This is the only way a slot returns to the pool.
    pub fn release(mut self) {
        self.detach();
        if let Some(slot) = self.slot.take() {
            self.registry.release_slot(slot);
            debug!("servo: released slot {}", slot);
        }
    }

    /// Move to `value`.
    ///
    /// Values below 500 are degrees, clamped to 0..=180. Values of 500 and above
    /// are pulse widths and behave like
    /// [`write_microseconds`](Self::write_microseconds). No-op unless attached.
    pub fn write(&mut self, value: i32) {
        if value >= DEGREE_THRESHOLD {
            self.write_microseconds(value);
            return;
        }
        let degrees = clamp_degrees(value);
        let width_us = degrees_to_pulse_us(degrees, self.min_us, self.max_us);
        if self.update(width_us) {
            self.degrees = degrees;
        }
    }

    /// Set the pulse width, clamped to this servo's `min_us..=max_us`.
    ///
    /// The matching angle is recomputed for [`read`](Self::read). No-op unless
    /// attached.
    pub fn write_microseconds(&mut self, value: i32) {
        let width_us = clamp_pulse_us(value, self.min_us, self.max_us);
        if self.update(width_us) {
            self.degrees = pulse_us_to_degrees(width_us, self.min_us, self.max_us);
        }
    }

    /// Last commanded angle (0..=180), or `0` if not attached.
    #[must_use]
    pub fn read(&self) -> u8 {
        if self.attached() { self.degrees } else { 0 }
    }

    /// Last commanded pulse width (µs), or `0` if not attached.
    #[must_use]
    pub fn read_microseconds(&self) -> u16 {
        if self.attached() { self.width_us } else { 0 }
    }

    /// Store `width_us` and push it to the bound pin. Returns `false`, changing
    /// nothing, when not attached.
    fn update(&mut self, width_us: u16) -> bool {
        let Some(slot) = self.slot else {
            return false;
        };
        let pushed = self.registry.with_state(|state| {
            state.pin_of(slot).is_some_and(|pin| {
                push_pulse(state, pin, width_us);
                true
            })
        });
        if pushed {
            self.width_us = width_us;
        }
        pushed
    }
}

/// Convert `width_us` to duty counts at the registry's full scale and write it.
fn push_pulse<P: PwmBackend, const N: usize>(
    state: &mut RegistryState<P, N>,
    pin: u8,
    width_us: u16,
) {
    let duty = pulse_us_to_duty(width_us, state.full_scale());
    debug!("servo pin {}: {} us -> duty {}", pin, width_us, duty);
    write_duty_logged(state, pin, duty);
}

fn write_duty_logged<P: PwmBackend, const N: usize>(
    state: &mut RegistryState<P, N>,
    pin: u8,
    duty: u32,
) {
    if state.pwm_mut().write_duty(pin, duty).is_err() {
        warn!("servo pin {}: backend rejected duty {}", pin, duty);
    }
}
