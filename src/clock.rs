//! UTC time-of-day counter and local-offset presentation.
//!
//! [`TimeOfDay`] is the receiver's running clock: sixty ticks make a second,
//! and rollovers cascade through seconds, minutes, hours, day-of-year, and
//! year, including 61-second leap minutes and 366-day leap years. The frame
//! decoder overwrites these fields whenever a valid frame arrives; between
//! frames the counter free-runs on the disciplined tick.

use crate::consts::TICKS_PER_SECOND;

/// Edge signals produced by one call to [`TimeOfDay::tick_time`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEdges {
    /// The seconds field changed on this tick.
    pub second: bool,
    /// The minutes field changed on this tick.
    pub minute: bool,
}

/// The configured local offset from UTC.
///
/// There is no timezone database here; the application states its offset
/// and whether it wants the frame's DST flag honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LocalOffset {
    /// Whole hours east (positive) or west (negative) of UTC.
    pub hours: i8,
    /// Additional minutes, same sign convention as `hours`.
    pub minutes: i8,
    /// Add one hour whenever the broadcast DST flag is set.
    pub observe_dst: bool,
}

/// The current UTC date and time, normalized after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TimeOfDay {
    /// Tick within the current second, `0..60`.
    pub ticks: u8,
    /// Second within the current minute, `0..60` (`0..61` in a leap minute).
    pub seconds: u8,
    /// Minute within the current hour, `0..60`.
    pub minutes: u8,
    /// Hour of day, `0..24`.
    pub hours: u8,
    /// Day of year, `1..=365` (`..=366` in a leap year).
    pub day_of_year: u16,
    /// Full Gregorian year.
    pub year: u16,
    /// Daylight saving time is in effect. Not populated by the frame
    /// decoder; honored by [`local_hm`](TimeOfDay::local_hm) if set.
    pub is_dst: bool,
    /// The current minute has 61 seconds. Auto-clears after it elapses.
    pub is_leap_minute: bool,
    /// The current year has 366 days.
    pub is_leap_year: bool,
    /// At least one valid frame has been decoded since power-up.
    pub has_fix: bool,
}

impl Default for TimeOfDay {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeOfDay {
    /// Midnight, January 1st 2000, no fix.
    pub const fn new() -> Self {
        Self {
            ticks: 0,
            seconds: 0,
            minutes: 0,
            hours: 0,
            day_of_year: 1,
            year: 2000,
            is_dst: false,
            is_leap_minute: false,
            is_leap_year: true,
            has_fix: false,
        }
    }

    /// Advances the clock by one tick and cascades any rollovers.
    ///
    /// Called once per tick from the interrupt path. Returns which coarse
    /// fields changed so the caller can raise its edge flags.
    pub fn tick_time(&mut self) -> TickEdges {
        let mut edges = TickEdges::default();
        self.ticks += 1;
        if self.ticks < TICKS_PER_SECOND {
            return edges;
        }
        self.ticks = 0;
        self.seconds += 1;
        edges.second = true;

        let seconds_this_minute = if self.is_leap_minute { 61 } else { 60 };
        if self.seconds >= seconds_this_minute {
            self.seconds = 0;
            self.is_leap_minute = false;
            self.increment_minute();
            edges.minute = true;
        }
        edges
    }

    /// Steps to the next minute, cascading through hours, day, and year.
    pub(crate) fn increment_minute(&mut self) {
        self.minutes += 1;
        if self.minutes < 60 {
            return;
        }
        self.minutes = 0;
        self.hours += 1;
        if self.hours < 24 {
            return;
        }
        self.hours = 0;
        self.day_of_year += 1;
        if self.day_of_year <= self.days_this_year() {
            return;
        }
        self.day_of_year = 1;
        self.year += 1;
        self.is_leap_year = is_leap_year(self.year);
    }

    /// Number of days in the current year.
    pub fn days_this_year(&self) -> u16 {
        if self.is_leap_year { 366 } else { 365 }
    }

    /// Local hours and minutes under the configured offset.
    ///
    /// Wraps through the day; the date fields are not adjusted.
    pub fn local_hm(&self, offset: &LocalOffset) -> (u8, u8) {
        let dst_shift = if offset.observe_dst && self.is_dst { 60 } else { 0 };
        let utc = self.hours as i16 * 60 + self.minutes as i16;
        let shifted = utc + offset.hours as i16 * 60 + offset.minutes as i16 + dst_shift;
        let local = shifted.rem_euclid(24 * 60);
        ((local / 60) as u8, (local % 60) as u8)
    }

    /// Whether the display should currently be blanked.
    ///
    /// Without a fix the last quarter of every second blanks, producing a
    /// blink that distinguishes "searching" from a frozen display.
    pub fn display_blanked(&self) -> bool {
        !self.has_fix && self.ticks > 45
    }
}

/// Gregorian leap-year rule.
pub(crate) fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
