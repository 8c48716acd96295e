//! # wwvb60
//!
//! A portable, no_std Rust receiver for the WWVB 60 kHz time-code broadcast,
//! consuming a demodulated bi-level envelope from any cheap AM receiver
//! module.
//!
//! This driver implements a software radio-clock pipeline using:
//! - `embedded-hal` traits for digital I/O
//! - template-matching correlators with sliding peak detection for symbol
//!   recovery
//! - a fractional-divider clock discipline that steers the local tick
//!   against the broadcast
//! - interrupt-safe shared state via `critical-section`
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]`; used by the host-side test suite |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for tick timing |
//! | `timer-isr` (default) | Uses `critical_section::with` for ISR integration |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Software Features
//!
//! - **Symbol detection** over an 80-bit sample register: ZERO/ONE/MARKER
//!   by pulse width, with ten ticks of context on both sides for noise
//!   immunity
//! - **Self-aligning frame decoder**: the 60-symbol window validates its
//!   own marker structure, then yields BCD minutes, hours, day-of-year,
//!   year and the leap-year flag
//! - **SEEK/SYNC acquisition machine** with peek-based tracking and drift
//!   accumulation
//! - **Oscillator calibration** learned on the air and persisted to a byte
//!   store across power cycles
//! - Fully portable across AVR and ARM Cortex-M targets
//!
//! ## Usage
//!
//! ```rust
//! use wwvb60::discipline::ClockParams;
//! use wwvb60::receiver::WwvbReceiver;
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! fn main() {
//!     // ...
//!     # let rx_pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
//!     let mut receiver: WwvbReceiver<Pin> =
//!         WwvbReceiver::new(rx_pin, ClockParams::nominal(), None);
//!     loop {
//!         receiver.tick(); // Call at the disciplined ~60 Hz cadence
//!         let _ = receiver.service_frame();
//!         # break; // For testing purposes
//!     }
//!     # receiver.rx.done();
//! }
//! ```
//!
//! Or, use `run_wwvb_tick_loop()` with a `DelayNs` implementation:
//!
//! ```rust
//! use wwvb60::discipline::ClockParams;
//! use wwvb60::receiver::WwvbReceiver;
//! #[cfg(feature = "delay-loop")]
//! use wwvb60::timer::step_wwvb_tick;
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! # use embedded_hal_mock::eh1::delay::NoopDelay as Delay;
//!
//! fn main() {
//!     // ...
//!     # let rx_pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
//!     let mut receiver: WwvbReceiver<Pin> =
//!         WwvbReceiver::new(rx_pin, ClockParams::nominal(), None);
//!     # #[cfg(feature = "delay-loop")]
//!     # let mut delay = Delay::new();
//!     # #[cfg(feature = "delay-loop")]
//!     step_wwvb_tick(&mut receiver, &mut delay, 16_667);
//!     # #[cfg(not(feature = "delay-loop"))]
//!     # receiver.tick();
//!     # receiver.rx.done();
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - The tick interrupt must run at the disciplined ~60 Hz cadence; program
//!   the next compare value returned by the tick path every interrupt so
//!   the fractional divider keeps the long-run average exact
//! - Decode, display refresh and calibration writes belong in the main
//!   loop, never the interrupt
//! - Only one receiver instance should be active at a time in
//!   interrupt-driven mode
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded
//! environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "timer-isr")]
pub use critical_section;

#[cfg(all(feature = "timer-isr", not(feature = "std")))]
pub use heapless;

/// Crate-internal diagnostics, dispatched to `log` and/or `defmt` when the
/// matching feature is enabled and compiled out otherwise.
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        let _ = ($($arg)*,);
    }};
}
pub(crate) use debug_log;

pub mod calibration;
pub mod clock;
pub mod consts;
pub mod correlate;
pub mod discipline;
pub mod display;
pub mod frame;
pub mod receiver;
pub mod register;
pub mod score;
pub mod sync;
pub mod timer;
