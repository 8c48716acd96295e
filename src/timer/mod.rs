//! Timer and tick-source utilities for the WWVB receiver.
//!
//! The receiver needs a tick every `whole + frac/64` timer cycles. Two
//! integration styles are supported: an interrupt service routine guarded by
//! `critical_section::with` (`timer-isr` feature, the default), or a
//! blocking busy-loop over `embedded_hal::delay::DelayNs` (`delay-loop`
//! feature, polling targets only — a plain delay cannot honor the
//! fractional cadence).
//!
//! Contains helpers for both, including:
//! - `compute_clock_params`: runtime tick-period calculator
//! - `const_clock_params`: compile-time tick-period calculator
//! - `global_receiver_tick` and `tick_wwvb_timer!()`: interrupt-based tick
//!   wrappers that return the next compare value (feature `timer-isr`)
//! - `run_wwvb_tick_loop`: blocking receiver loop (feature `delay-loop`)
//!
//! Common clock trees (for use with the calculators, tick rate 60 Hz):
//!
//! | F_CPU  | PRESCALER | Timer rate | whole | frac/64 |
//! |--------|-----------|------------|-------|---------|
//! | 16 MHz |         8 |      2 MHz | 33333 |      21 |
//! | 16 MHz |        64 |    250 kHz |  4166 |      43 |
//! |  8 MHz |         8 |      1 MHz | 16666 |      43 |

use crate::consts::DENOM;
use crate::discipline::ClockParams;
use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// The nominal tick rate of the receiver, in Hz.
pub const TICK_HZ: u32 = 60;

/// A reprogrammable tick source.
///
/// The concrete implementation wraps the platform timer: it must fire its
/// callback (the ISR that calls the receiver's tick path) once per period
/// and deliver the fractional cadence exactly — `frac_num` of every
/// `frac_denom` periods one cycle longer than the rest, with no long-run
/// rounding drift. [`FractionalDivider`](crate::discipline::FractionalDivider)
/// does the bookkeeping for implementations that program a compare register
/// per interrupt. Offline tests substitute a simulated clock.
pub trait TickSource {
    /// Reprograms the period to `whole + frac_num / frac_denom` timer
    /// cycles, taking effect from the next period.
    fn set_period(&mut self, whole: u16, frac_num: u8, frac_denom: u8);
}

/// Computes tick-period parameters for a given clock tree.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_hz`: desired tick rate in Hz (normally [`TICK_HZ`])
///
/// # Returns
/// - [`ClockParams`] whose scaled count rounds `f_cpu / prescaler / tick_hz`
///   to the nearest 1/64 cycle
pub fn compute_clock_params(f_cpu: u32, prescaler: u32, tick_hz: u32) -> ClockParams {
    let cycles_per_tick = f_cpu as f64 / prescaler as f64 / tick_hz as f64;
    let scaled = round(cycles_per_tick * DENOM as f64) as u32;
    ClockParams::from_scaled(scaled)
}

/// Compile-time tick-period calculator.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_hz`: desired tick rate in Hz (normally [`TICK_HZ`])
///
/// # Returns
/// - [`ClockParams`] whose scaled count rounds `f_cpu / prescaler / tick_hz`
///   to the nearest 1/64 cycle
pub const fn const_clock_params(f_cpu: u32, prescaler: u32, tick_hz: u32) -> ClockParams {
    let timer_hz = (f_cpu / prescaler) as u64;
    let scaled = (timer_hz * DENOM as u64 + (tick_hz as u64) / 2) / tick_hz as u64;
    ClockParams::from_scaled(scaled as u32)
}
