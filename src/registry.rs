//! The shared table of servo channel slots.
//!
//! See [`ChannelRegistry`] for details and usage examples.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::PWM_RESOLUTION_BITS;
use crate::pwm::PwmBackend;
use crate::{Error, Result};

// ============================================================================
// Slot - one entry of the channel table
// ============================================================================

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    /// Never handed out, or handed back by [`Servo::release`](crate::Servo::release).
    Free,
    /// Owned by a servo; `Some(pin)` while attached.
    Claimed(Option<u8>),
}

// ============================================================================
// RegistryState - everything behind the lock
// ============================================================================

/// Channel table plus the backend that drives it.
pub(crate) struct RegistryState<P, const N: usize> {
    pwm: P,
    slots: [Slot; N],
    slot_count: usize,
    full_scale: u32,
}

impl<P: PwmBackend, const N: usize> RegistryState<P, N> {
    const fn new(pwm: P) -> Self {
        Self {
            pwm,
            slots: [Slot::Free; N],
            slot_count: 0,
            full_scale: 0,
        }
    }

    fn allocate_slot(&mut self) -> Option<u8> {
        // Fresh slots first, so slot indices follow construction order.
        let index = if self.slot_count < N {
            let index = self.slot_count;
            self.slot_count = self.slot_count.saturating_add(1);
            index
        } else {
            self.slots.iter().position(|slot| *slot == Slot::Free)?
        };
        *self.slots.get_mut(index)? = Slot::Claimed(None);
        u8::try_from(index).ok()
    }

    fn release_slot(&mut self, slot: u8) {
        if let Some(entry) = self.slots.get_mut(usize::from(slot)) {
            *entry = Slot::Free;
        }
    }

    pub(crate) fn pin_of(&self, slot: u8) -> Option<u8> {
        match self.slots.get(usize::from(slot)) {
            Some(Slot::Claimed(pin)) => *pin,
            _ => None,
        }
    }

    pub(crate) fn slot_of(&self, pin: u8) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| *slot == Slot::Claimed(Some(pin)))
            .and_then(|index| u8::try_from(index).ok())
    }

    pub(crate) fn bind(&mut self, slot: u8, pin: u8) -> Result<()> {
        if let Some(owner) = self.slot_of(pin) {
            if owner != slot {
                return Err(Error::PinInUse { pin });
            }
        }
        let entry = self
            .slots
            .get_mut(usize::from(slot))
            .ok_or(Error::InvalidSlot { slot })?;
        match *entry {
            Slot::Free => Err(Error::InvalidSlot { slot }),
            Slot::Claimed(Some(_)) => Err(Error::SlotAlreadyBound { slot }),
            Slot::Claimed(None) => {
                *entry = Slot::Claimed(Some(pin));
                Ok(())
            }
        }
    }

    pub(crate) fn unbind(&mut self, slot: u8) {
        if let Some(entry) = self.slots.get_mut(usize::from(slot)) {
            if matches!(entry, Slot::Claimed(Some(_))) {
                *entry = Slot::Claimed(None);
            }
        }
    }

    pub(crate) fn ensure_resolution_configured(&mut self) -> u32 {
        if self.full_scale == 0 {
            self.pwm.configure_resolution(PWM_RESOLUTION_BITS);
            self.full_scale = self.pwm.max_duty_count().saturating_add(1);
            info!(
                "servo registry: {} bit resolution, full scale {} counts",
                PWM_RESOLUTION_BITS,
                self.full_scale
            );
        }
        self.full_scale
    }

    pub(crate) const fn full_scale(&self) -> u32 {
        self.full_scale
    }

    pub(crate) fn pwm_mut(&mut self) -> &mut P {
        &mut self.pwm
    }
}

// ============================================================================
// ChannelRegistry
// ============================================================================

/// A fixed-size table of servo channel slots, shared by every [`Servo`](crate::Servo)
/// built from it.
///
/// `N` is the channel capacity, normally the number of PWM-capable pins on the
/// board. The registry owns the [`PwmBackend`], records which pin each slot drives,
/// and caches the full-scale duty count after the first successful attach.
///
/// # Slot lifetime
///
/// Each [`Servo::new`](crate::Servo::new) claims one slot for good: detaching frees
/// the *pin*, not the slot, and dropping a servo does neither. Once `N` servos have
/// been constructed, further servos are permanently unusable. Call
/// [`Servo::release`](crate::Servo::release) to opt in to handing a slot back.
///
/// # Sharing
///
/// The table lives behind a critical-section mutex, so a registry can be a
/// `static` and each operation is atomic with respect to interrupts.
///
/// # Example
///
/// ```rust,ignore
/// use pwm_servo::{AttachConfig, ChannelRegistry, Servo};
///
/// // `board_pwm` is any `PwmBackend`.
/// static SERVOS: ChannelRegistry<BoardPwm, 8> = ChannelRegistry::new(board_pwm());
///
/// let mut pan = Servo::new(&SERVOS);
/// let mut tilt = Servo::new(&SERVOS);
/// pan.attach(9, AttachConfig::default())?;
/// tilt.attach(10, AttachConfig::new().with_min_us(1_000).with_max_us(2_000))?;
/// ```
pub struct ChannelRegistry<P, const N: usize> {
    state: Mutex<CriticalSectionRawMutex, RefCell<RegistryState<P, N>>>,
}

impl<P: PwmBackend, const N: usize> ChannelRegistry<P, N> {
    /// Create a registry with `N` unclaimed slots that drives `pwm`.
    #[must_use]
    pub const fn new(pwm: P) -> Self {
        const { assert!(N <= u8::MAX as usize, "at most 255 servo slots") };
        Self {
            state: Mutex::new(RefCell::new(RegistryState::new(pwm))),
        }
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut RegistryState<P, N>) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    /// Number of slots (`MAX_CHANNELS`).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of slots ever handed out. Never decreases.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.with_state(|state| state.slot_count)
    }

    /// Full-scale duty count, or `0` before the first successful attach.
    #[must_use]
    pub fn max_duty(&self) -> u32 {
        self.with_state(|state| state.full_scale())
    }

    /// Claim the next slot.
    ///
    /// Returns `None` once all `N` slots are claimed. Never-used slots are handed
    /// out in order; slots given back with [`Servo::release`](crate::Servo::release)
    /// are reused only after that.
    pub fn allocate_slot(&self) -> Option<u8> {
        self.with_state(|state| state.allocate_slot())
    }

    /// Hand a slot back to the pool. Any pin binding on it is dropped without
    /// touching the output, so the owning servo must already be detached.
    pub(crate) fn release_slot(&self, slot: u8) {
        self.with_state(|state| state.release_slot(slot));
    }

    /// Record that `slot` drives `pin`.
    ///
    /// # Errors
    ///
    /// - [`Error::PinInUse`] if another slot already drives `pin`.
    /// - [`Error::SlotAlreadyBound`] if `slot` already drives a pin.
    /// - [`Error::InvalidSlot`] if `slot` is out of range or was never allocated.
    pub fn bind(&self, slot: u8, pin: u8) -> Result<()> {
        self.with_state(|state| state.bind(slot, pin))
    }

    /// Clear `slot`'s pin binding. No-op if it has none.
    pub fn unbind(&self, slot: u8) {
        self.with_state(|state| state.unbind(slot));
    }

    /// Configure the shared resolution on first call and return the cached
    /// full-scale duty count. Later calls return the cached value untouched.
    pub fn ensure_resolution_configured(&self) -> u32 {
        self.with_state(|state| state.ensure_resolution_configured())
    }

    /// Pin currently driven by `slot`.
    #[must_use]
    pub fn pin_of(&self, slot: u8) -> Option<u8> {
        self.with_state(|state| state.pin_of(slot))
    }

    /// Whether any slot currently drives `pin`.
    #[must_use]
    pub fn is_pin_bound(&self, pin: u8) -> bool {
        self.with_state(|state| state.slot_of(pin).is_some())
    }

    /// Run `f` with exclusive access to the backend.
    ///
    /// # Panics
    ///
    /// The registry stays locked while `f` runs. Calling back into this registry
    /// (or into a [`Servo`](crate::Servo) built from it) from inside `f` panics.
    pub fn with_pwm<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        self.with_state(|state| f(state.pwm_mut()))
    }
}
