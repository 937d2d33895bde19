//! Error type shared by the registry and servo operations.

/// A specialized [`Result`](core::result::Result) for servo operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Reasons a servo channel operation can fail.
///
/// Only the attach path and the registry's binding operations report errors.
/// Writes and detach on an unattached servo are silent no-ops.
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Every channel slot was already claimed when this servo was constructed.
    /// The servo can never be attached.
    #[display("servo channel pool exhausted")]
    PoolExhausted,

    /// The slot index does not exist in this registry or is not currently claimed.
    #[display("servo slot {slot} does not exist")]
    InvalidSlot {
        /// Requested slot index.
        slot: u8,
    },

    /// The requested pulse range is empty (`min_us >= max_us`), either as given
    /// or after clipping to the hardware-safe range.
    #[display("invalid pulse range {min_us}..{max_us} µs")]
    InvalidRange {
        /// Requested minimum pulse width (µs).
        min_us: u16,
        /// Requested maximum pulse width (µs).
        max_us: u16,
    },

    /// The pin is already bound to another slot.
    #[display("pin {pin} already drives another servo")]
    PinInUse {
        /// Pin that was requested.
        pin: u8,
    },

    /// The slot already holds a pin binding.
    #[display("servo slot {slot} is already bound")]
    SlotAlreadyBound {
        /// Slot that was requested.
        slot: u8,
    },

    /// This servo is already attached to a pin.
    #[display("servo already attached")]
    AlreadyAttached,

    /// The PWM backend refused to configure the pin (for example, the pin has
    /// no PWM capability).
    #[display("PWM backend rejected pin {pin}")]
    PeripheralRejected {
        /// Pin that was rejected.
        pin: u8,
    },
}
