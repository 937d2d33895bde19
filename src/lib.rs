//! Drive hobby servos from a microcontroller's hardware PWM.
//!
//! A [`ChannelRegistry`] is the fixed pool of servo channels for a board: it owns the
//! [`PwmBackend`], records which pin each channel drives, and enforces one servo per
//! pin. Each [`Servo`] claims one channel when constructed and turns angle or
//! pulse-width commands into duty counts for its pin.
//!
//! # Glossary
//!
//! - **Slot:** one entry of the registry. A [`Servo`] claims a slot for its whole
//!   life; attaching binds the slot to a pin.
//! - **Pulse width:** high time of each 20 ms (50 Hz) frame, 544..=2400 µs.
//! - **Full scale:** the duty count for 100% output at the shared 16-bit resolution,
//!   cached by the registry on the first successful attach.
//!
//! # Example
//!
//! ```rust
//! use pwm_servo::{AttachConfig, ChannelRegistry, PwmBackend, Servo};
//!
//! // A board with 16-bit PWM on every pin.
//! struct Board {
//!     duty: u32,
//! }
//!
//! impl PwmBackend for Board {
//!     type Error = ();
//!
//!     fn configure_frequency(&mut self, _pin: u8, _frequency_hz: u32) -> Result<(), ()> {
//!         Ok(())
//!     }
//!
//!     fn configure_resolution(&mut self, _bits: u8) {}
//!
//!     fn max_duty_count(&self) -> u32 {
//!         65_535
//!     }
//!
//!     fn write_duty(&mut self, _pin: u8, duty: u32) -> Result<(), ()> {
//!         self.duty = duty;
//!         Ok(())
//!     }
//! }
//!
//! let registry: ChannelRegistry<Board, 2> = ChannelRegistry::new(Board { duty: 0 });
//! let mut servo = Servo::new(&registry);
//!
//! servo.attach(9, AttachConfig::default())?;
//! servo.write(0);
//! assert_eq!(servo.read_microseconds(), 544);
//! assert_eq!(registry.with_pwm(|board| board.duty), 1_782);
//! servo.write(90);
//! assert_eq!(servo.read_microseconds(), 1_500);
//! servo.detach();
//! assert!(!servo.attached());
//! # Ok::<(), pwm_servo::Error>(())
//! ```
#![cfg_attr(not(any(test, feature = "host")), no_std)]

// Must come first: the logging macros are textually scoped.
mod fmt;

pub mod config;
pub mod conversion;
mod error;
#[cfg(any(test, feature = "host"))]
pub mod mock;
pub mod pwm;
pub mod registry;
pub mod servo;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};

pub use crate::config::AttachConfig;
pub use crate::pwm::PwmBackend;
pub use crate::registry::ChannelRegistry;
pub use crate::servo::Servo;
