//! The 60-symbol stream and the frame decoder.
//!
//! Detected symbols accumulate in a sliding 60-slot window. The WWVB frame
//! structure is rigid enough to self-align: markers occupy positions 0, 9,
//! 19, 29, 39, 49 and 59, and every other position carries a data bit. The
//! stream scores itself after every shift; a perfect structural score of 60
//! means the window currently holds exactly one whole minute, and the BCD
//! fields can be read straight out of it.

use crate::clock::TimeOfDay;
use crate::consts::FRAME_LEN;

/// One received WWVB symbol, or a placeholder for a missed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Symbol {
    /// 0.2 s of carrier reduction: a zero data bit.
    Zero,
    /// 0.5 s of carrier reduction: a one data bit.
    One,
    /// 0.8 s of carrier reduction: a frame/position marker.
    Marker,
    /// Nothing detected where a symbol was expected.
    Missing,
}

impl Symbol {
    /// Board order used by the detector; doubles as the tie-break order.
    pub const DETECTION_ORDER: [Symbol; 3] = [Symbol::Zero, Symbol::One, Symbol::Marker];
}

/// Whether a frame position must hold a marker.
pub(crate) fn is_marker_slot(position: usize) -> bool {
    position == 0 || position % 10 == 9
}

/// Sliding window of the last sixty detected symbols.
///
/// Position 0 is the oldest symbol, 59 the newest. The structural alignment
/// score is recomputed on every shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStream {
    slots: [Symbol; FRAME_LEN],
    alignment: u8,
}

impl Default for SymbolStream {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolStream {
    /// Creates a stream of all-missing symbols (alignment score 0).
    pub const fn new() -> Self {
        Self {
            slots: [Symbol::Missing; FRAME_LEN],
            alignment: 0,
        }
    }

    /// Pushes the newest symbol, discarding the oldest, and rescores.
    pub fn shift(&mut self, symbol: Symbol) {
        self.slots.copy_within(1..FRAME_LEN, 0);
        self.slots[FRAME_LEN - 1] = symbol;

        let mut alignment = 0;
        for (position, slot) in self.slots.iter().enumerate() {
            let fits = if is_marker_slot(position) {
                *slot == Symbol::Marker
            } else {
                matches!(slot, Symbol::Zero | Symbol::One)
            };
            if fits {
                alignment += 1;
            }
        }
        self.alignment = alignment;
    }

    /// Structural alignment score in `[0, 60]`.
    pub fn alignment(&self) -> u8 {
        self.alignment
    }

    /// True when the window holds a structurally complete frame.
    pub fn is_valid_frame(&self) -> bool {
        self.alignment as usize == FRAME_LEN
    }

    /// The symbol at `position` (0 = oldest).
    pub fn symbol(&self, position: usize) -> Symbol {
        self.slots[position]
    }

    fn bit(&self, position: usize) -> bool {
        self.slots[position] == Symbol::One
    }
}

// Data-bit positions and their BCD weights, per the broadcast format.
const MINUTE_BITS: [(usize, u8); 7] = [
    (1, 40),
    (2, 20),
    (3, 10),
    (5, 8),
    (6, 4),
    (7, 2),
    (8, 1),
];
const HOUR_BITS: [(usize, u8); 6] = [(12, 20), (13, 10), (15, 8), (16, 4), (17, 2), (18, 1)];
const DAY_BITS: [(usize, u16); 10] = [
    (22, 200),
    (23, 100),
    (25, 80),
    (26, 40),
    (27, 20),
    (28, 10),
    (30, 8),
    (31, 4),
    (32, 2),
    (33, 1),
];
const YEAR_BITS: [(usize, u8); 8] = [
    (45, 80),
    (46, 40),
    (47, 20),
    (48, 10),
    (50, 8),
    (51, 4),
    (52, 2),
    (53, 1),
];
const LEAP_YEAR_BIT: usize = 55;

/// Date and time read out of one frame, as of the frame's first marker.
///
/// These are the raw broadcast fields: the minute named here is the minute
/// that just elapsed. [`apply`](FrameFields::apply) advances to the minute
/// actually in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct FrameFields {
    /// Minutes, `0..60`.
    pub minutes: u8,
    /// Hours, `0..24`.
    pub hours: u8,
    /// Day of year, `1..=366`.
    pub day_of_year: u16,
    /// Last two digits of the year.
    pub year: u8,
    /// The broadcast leap-year indicator (position 55).
    pub leap_year: bool,
}

/// Extracts the BCD fields from an aligned stream.
///
/// The caller must only pass streams whose alignment score is 60. Returns
/// `None` when a field decodes outside its legal range, which can happen
/// when noise forges a structurally valid frame out of flipped data bits.
pub fn decode(stream: &SymbolStream) -> Option<FrameFields> {
    let mut minutes: u8 = 0;
    for &(position, weight) in &MINUTE_BITS {
        if stream.bit(position) {
            minutes += weight;
        }
    }
    let mut hours: u8 = 0;
    for &(position, weight) in &HOUR_BITS {
        if stream.bit(position) {
            hours += weight;
        }
    }
    let mut day_of_year: u16 = 0;
    for &(position, weight) in &DAY_BITS {
        if stream.bit(position) {
            day_of_year += weight;
        }
    }
    let mut year: u8 = 0;
    for &(position, weight) in &YEAR_BITS {
        if stream.bit(position) {
            year += weight;
        }
    }

    if minutes > 59 || hours > 23 || day_of_year == 0 || day_of_year > 366 || year > 99 {
        return None;
    }
    Some(FrameFields {
        minutes,
        hours,
        day_of_year,
        year,
        leap_year: stream.bit(LEAP_YEAR_BIT),
    })
}

impl FrameFields {
    /// Writes this frame into the running clock.
    ///
    /// The decoded fields date the frame's first marker, so the minute in
    /// progress is the decoded minute plus one; seconds restart at zero.
    /// `ticks_delta` accounts for detection and processing latency and
    /// carries through every coarser field.
    pub fn apply(&self, time: &mut TimeOfDay, ticks_delta: u8) {
        time.minutes = self.minutes;
        time.hours = self.hours;
        time.day_of_year = self.day_of_year;
        time.year = 2000 + self.year as u16;
        time.is_leap_year = self.leap_year;
        time.seconds = 0;
        time.ticks = 0;
        time.increment_minute();
        for _ in 0..ticks_delta {
            let _ = time.tick_time();
        }
        time.has_fix = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds an aligned frame for the given fields, all other data bits
    /// zero.
    fn encode_frame(
        minutes: u8,
        hours: u8,
        day_of_year: u16,
        year: u8,
        leap_year: bool,
    ) -> [Symbol; FRAME_LEN] {
        let mut frame = [Symbol::Zero; FRAME_LEN];
        for (position, slot) in frame.iter_mut().enumerate() {
            if is_marker_slot(position) {
                *slot = Symbol::Marker;
            }
        }
        fn place(frame: &mut [Symbol; FRAME_LEN], bits: &[(usize, u16)], mut value: u16) {
            for &(position, weight) in bits {
                if value >= weight {
                    value -= weight;
                    frame[position] = Symbol::One;
                }
            }
        }
        let widen = |bits: &[(usize, u8)]| -> Vec<(usize, u16)> {
            bits.iter().map(|&(p, w)| (p, w as u16)).collect()
        };
        place(&mut frame, &widen(&MINUTE_BITS), minutes as u16);
        place(&mut frame, &widen(&HOUR_BITS), hours as u16);
        place(&mut frame, &DAY_BITS, day_of_year);
        place(&mut frame, &widen(&YEAR_BITS), year as u16);
        if leap_year {
            frame[LEAP_YEAR_BIT] = Symbol::One;
        }
        frame
    }

    fn stream_of(frame: &[Symbol; FRAME_LEN]) -> SymbolStream {
        let mut stream = SymbolStream::new();
        for &symbol in frame {
            stream.shift(symbol);
        }
        stream
    }

    #[test]
    fn test_marker_slots() {
        let markers: Vec<usize> = (0..FRAME_LEN).filter(|&p| is_marker_slot(p)).collect();
        assert_eq!(markers, [0, 9, 19, 29, 39, 49, 59]);
    }

    #[test]
    fn test_alignment_reaches_sixty_only_for_a_whole_frame() {
        let frame = encode_frame(35, 10, 152, 17, false);
        let mut stream = SymbolStream::new();
        for (count, &symbol) in frame.iter().enumerate() {
            assert!(!stream.is_valid_frame(), "valid before symbol {}", count);
            stream.shift(symbol);
        }
        assert_eq!(stream.alignment(), 60);
        assert!(stream.is_valid_frame());

        // One more symbol breaks the alignment until the next minute closes.
        stream.shift(Symbol::Marker);
        assert!(!stream.is_valid_frame());
    }

    #[test]
    fn test_missing_symbol_poisons_the_window() {
        let frame = encode_frame(0, 0, 1, 0, false);
        let mut stream = stream_of(&frame);
        assert!(stream.is_valid_frame());
        for &symbol in &frame {
            stream.shift(symbol);
        }
        assert!(stream.is_valid_frame());
        stream.shift(Symbol::Missing);
        // The hole stays in the window for a full minute.
        for &symbol in frame.iter().take(59) {
            stream.shift(symbol);
            assert!(!stream.is_valid_frame());
        }
    }

    #[test]
    fn test_decode_reads_the_broadcast_fields() {
        let stream = stream_of(&encode_frame(35, 10, 152, 17, false));
        let fields = decode(&stream).unwrap();
        assert_eq!(fields.minutes, 35);
        assert_eq!(fields.hours, 10);
        assert_eq!(fields.day_of_year, 152);
        assert_eq!(fields.year, 17);
        assert!(!fields.leap_year);
    }

    #[test]
    fn test_decode_reads_the_leap_year_bit() {
        let stream = stream_of(&encode_frame(59, 23, 366, 16, true));
        let fields = decode(&stream).unwrap();
        assert_eq!(fields.day_of_year, 366);
        assert!(fields.leap_year);
    }

    #[test]
    fn test_decode_rejects_forged_bcd() {
        // All minute bits set decodes to 85, which no real frame carries.
        let mut frame = encode_frame(0, 0, 1, 0, false);
        for &(position, _) in &MINUTE_BITS {
            frame[position] = Symbol::One;
        }
        let stream = stream_of(&frame);
        assert!(stream.is_valid_frame());
        assert!(decode(&stream).is_none());

        // Day zero is equally impossible.
        let day_zero = stream_of(&encode_frame(10, 10, 0, 17, false));
        assert!(decode(&day_zero).is_none());
    }

    #[test]
    fn test_apply_advances_to_the_minute_in_progress() {
        let fields = decode(&stream_of(&encode_frame(35, 10, 152, 17, false))).unwrap();
        let mut time = TimeOfDay::new();
        fields.apply(&mut time, 15);
        assert_eq!(time.minutes, 36);
        assert_eq!(time.hours, 10);
        assert_eq!(time.day_of_year, 152);
        assert_eq!(time.year, 2017);
        assert_eq!(time.seconds, 0);
        assert_eq!(time.ticks, 15);
        assert!(time.has_fix);
        assert!(!time.is_leap_year);
    }

    #[test]
    fn test_apply_carries_through_midnight() {
        let fields = decode(&stream_of(&encode_frame(59, 23, 365, 17, false))).unwrap();
        let mut time = TimeOfDay::new();
        time.is_leap_year = false;
        fields.apply(&mut time, 0);
        assert_eq!(time.minutes, 0);
        assert_eq!(time.hours, 0);
        assert_eq!(time.day_of_year, 1);
        assert_eq!(time.year, 2018);
    }
}
