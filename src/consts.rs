//! Constants used across the WWVB receiver pipeline.
//!
//! This module defines the compile-time configuration surface: the sample
//! register geometry, the symbol detection threshold, the acquisition and
//! tracking thresholds, and the fractional-divider parameters that tie the
//! 60 Hz tick to the hardware timer.
//!
//! ## Key Concepts
//!
//! - **Ticks**: The receiver samples the demodulated input once per tick, at
//!   a nominal 60 Hz. Sixty ticks make one WWVB symbol (one second).
//! - **Scaled counts**: A tick period is expressed as `whole * DENOM + frac`
//!   raw timer cycles, giving sub-cycle resolution without floating point.
//! - **Thresholds**: Correlation scores above [`SCORE_THRESHOLD`] declare a
//!   symbol; the SEEK/SYNC state machine counts detections and misses against
//!   [`SEEK_DETECTED_THRESHOLD`] and [`SYNC_MISS_THRESHOLD`].
//!
//! The nominal values assume a 16 MHz clock behind a /8 prescaler (a 2 MHz
//! timer), so one 60 Hz tick is 33333 + 21/64 cycles. Use the helpers in
//! [`crate::timer`] to derive values for other clock trees.

/// Number of ticks per second, which is also the number of samples taken
/// across one WWVB symbol.
pub const TICKS_PER_SECOND: u8 = 60;

/// Number of symbols in one complete WWVB frame (one minute).
pub const FRAME_LEN: usize = 60;

/// Width of the sample register in bits: one full symbol plus 10 ticks of
/// context on each side.
pub const SAMPLE_BITS: usize = 80;

/// Width of the sample register in bytes.
pub const SAMPLE_BYTES: usize = SAMPLE_BITS / 8;

/// Denominator of the fractional tick divider. Must be a power of two;
/// the persisted calibration format (version 2) is defined against it.
pub const DENOM: u32 = 64;

/// Whole timer cycles per tick at the nominal 2 MHz timer rate.
pub const NOMINAL_WHOLE: u16 = 33_333;

/// Fractional numerator (out of [`DENOM`]) per tick at the nominal rate:
/// 2_000_000 / 60 = 33333.33... cycles, and 0.333 * 64 rounds to 21.
pub const NOMINAL_FRAC: u8 = 21;

/// The nominal tick period in scaled counts.
pub const NOMINAL_SCALED: u32 = NOMINAL_WHOLE as u32 * DENOM + NOMINAL_FRAC as u32;

/// Lower clamp bound for the disciplined period: 95% of nominal.
pub const SCALED_MIN: u32 = NOMINAL_SCALED - NOMINAL_SCALED / 20;

/// Upper clamp bound for the disciplined period: 105% of nominal.
pub const SCALED_MAX: u32 = NOMINAL_SCALED + NOMINAL_SCALED / 20;

/// Minimum correlation score (matching bits out of [`SAMPLE_BITS`]) for a
/// board to declare its symbol present. 70/80 tolerates ten flipped samples
/// per window.
pub const SCORE_THRESHOLD: u8 = 70;

/// Number of slots in each scoreboard ring. Odd, so a center slot exists;
/// a peak in the center is a confirmed local maximum with five ticks of
/// hindsight.
pub const SCOREBOARD_LEN: usize = 11;

/// Index of the scoreboard center slot.
pub const SCOREBOARD_CENTER: usize = SCOREBOARD_LEN / 2;

/// Number of center-slot detections required to leave SEEK for SYNC.
pub const SEEK_DETECTED_THRESHOLD: u8 = 10;

/// Number of consecutive missed peeks in SYNC before falling back to SEEK.
pub const SYNC_MISS_THRESHOLD: u8 = 6;

/// Accumulated symbol-arrival offset (in ticks) that triggers a clock
/// discipline adjustment.
pub const DRIFT_TRIGGER: i16 = 15;

/// Minimum ticks between discipline adjustments. A measurement over fewer
/// ticks than this is too noisy to steer the divider with.
pub const MIN_DISCIPLINE_TICKS: u32 = 1_000;

/// Ticks of continuous SYNC before the current calibration is written back
/// to the store. 500_000 ticks is roughly 2.3 hours.
pub const PERSIST_AFTER_TICKS: u32 = 500_000;

/// Ticks between a symbol's second boundary and its confirmed detection:
/// the correlation peak lands ten ticks after the boundary (once the next
/// symbol's head is in the register) and is confirmed when it reaches the
/// scoreboard center five ticks later. Used as the default decode latency
/// compensation.
pub const DETECT_LATENCY_TICKS: u8 = SCOREBOARD_CENTER as u8 + 10;

/// Capacity of the diagnostic event queue drained by the main loop.
pub const EVENT_QUEUE_LEN: usize = 8;

/// Calibration record version with a denominator of 16.
pub const CALIBRATION_V1: u8 = 1;

/// Calibration record version with a denominator of [`DENOM`] (64).
pub const CALIBRATION_V2: u8 = 2;

/// Byte offset of the calibration record within the store.
pub const CALIBRATION_OFFSET: u8 = 0;
