//! The seam between the receiver core and a numeric display.
//!
//! The core never touches display hardware. It hands hours, minutes and
//! seconds to whatever implements [`TimeDisplay`]; the six-byte shift
//! register serialization, the cathode bit mapping and any decorative
//! output live entirely in the implementor. Refreshes are driven from the
//! main loop via [`WwvbReceiver::refresh_display`], never from the tick
//! interrupt.
//!
//! [`WwvbReceiver::refresh_display`]: crate::receiver::WwvbReceiver::refresh_display

/// A sink for the time the receiver wants shown.
///
/// Implementations own the digit packing. The hours tens digit should be
/// suppressed rather than rendered as a leading zero; minutes and seconds
/// keep theirs.
pub trait TimeDisplay {
    /// Sets the hours field, `0..=23`.
    fn set_hours(&mut self, hours: u8);

    /// Sets the minutes field, `0..=59`.
    fn set_minutes(&mut self, minutes: u8);

    /// Sets the seconds field, `0..=60` (60 occurs in a leap minute).
    fn set_seconds(&mut self, seconds: u8);

    /// Blanks every digit. Used while no fix exists.
    fn blank(&mut self);
}
