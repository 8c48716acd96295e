//! The per-tick orchestrator for the WWVB receiver.
//!
//! This module provides the [`WwvbReceiver`] struct, which owns the whole
//! decoding pipeline: the sample register, the three correlation
//! scoreboards, the symbol stream, the SEEK/SYNC tracker, the disciplined
//! tick divider, and the time-of-day counter.
//!
//! The receiver is split across two execution contexts:
//!
//! - [`tick()`](WwvbReceiver::tick) runs once per 60 Hz timer interrupt. It
//!   samples the input pin, scores the register against the three templates,
//!   advances the tracker and the clock, and raises edge flags. It never
//!   blocks and touches neither the display nor the calibration store.
//! - The service methods ([`service_frame`](WwvbReceiver::service_frame),
//!   [`refresh_display`](WwvbReceiver::refresh_display),
//!   [`persist`](WwvbReceiver::persist), [`pop_event`](WwvbReceiver::pop_event))
//!   run from the main loop and consume those flags. Each flag has exactly
//!   one producer (the tick path, which only sets it) and one consumer (the
//!   service path, which only clears it).
//!
//! In interrupt-driven builds the whole receiver lives inside a
//! `critical_section::Mutex`, so both contexts observe it atomically; see
//! [`crate::timer`] for the glue.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! use wwvb60::discipline::ClockParams;
//! use wwvb60::receiver::WwvbReceiver;
//!
//! fn main() {
//!     # let rx_pin = Pin::new(&[PinTransaction::get(PinState::Low)]);
//!     let mut receiver: WwvbReceiver<Pin> =
//!         WwvbReceiver::new(rx_pin, ClockParams::nominal(), None);
//!
//!     loop {
//!         receiver.tick(); // Called at ~60 Hz by the timer interrupt
//!         let _ = receiver.service_frame();
//!         # break; // For testing purposes
//!     }
//!     # receiver.rx.done();
//! }
//! ```

use crate::calibration::{self, CalibrationError, CalibrationStore};
use crate::clock::{LocalOffset, TimeOfDay};
use crate::consts::{DENOM, DETECT_LATENCY_TICKS, EVENT_QUEUE_LEN, PERSIST_AFTER_TICKS};
use crate::correlate::{self, TEMPLATES};
use crate::discipline::{ClockParams, FractionalDivider};
use crate::display::TimeDisplay;
use crate::frame::{self, FrameFields, SymbolStream};
use crate::register::SampleRegister;
use crate::score::ScoreBoard;
use crate::sync::{Mode, TrackEvent, Tracker};
use crate::timer::TickSource;
use core::convert::Infallible;
use embedded_hal::digital::InputPin;
use heapless::Deque;

/// A notable state change, queued for the main loop's diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Event {
    /// The tracker completed acquisition and entered SYNC.
    SyncAcquired,
    /// The tracker ran out of symbols and fell back to SEEK.
    SyncLost,
    /// A valid frame was decoded and written into the clock.
    FrameApplied,
    /// A structurally valid frame carried impossible BCD fields.
    FrameRejected,
    /// The clock discipline adjusted the period to the given scaled count.
    Disciplined(u32),
    /// The calibration record was written to the store.
    CalibrationSaved,
}

/// A software WWVB time-code receiver over a demodulated input pin.
///
/// `WwvbReceiver` turns a bi-level 60 Hz sample stream into symbols, frames,
/// UTC time, and corrections to its own tick period. It is hardware-agnostic:
/// the input is any [`embedded_hal::digital::InputPin`], the tick cadence
/// comes from whatever timer the platform offers, and the optional display
/// and calibration store hide behind traits.
///
/// ## Type Parameters
///
/// - `RX`: the input pin carrying the demodulated envelope. A read failure
///   is treated as a low sample.
///
/// ## Notes
///
/// - Call [`tick()`](Self::tick) at the disciplined 60 Hz cadence, then ask
///   [`next_timer_compare()`](Self::next_timer_compare) for the following
///   period so the fractional divider keeps its long-run average exact.
/// - Only one receiver instance should be active in interrupt-driven mode.
#[derive(Debug)]
pub struct WwvbReceiver<RX>
where
    RX: InputPin,
{
    /// The demodulated input pin.
    pub rx: RX,
    rx_inverted: bool,
    register: SampleRegister,
    boards: [ScoreBoard; 3],
    stream: SymbolStream,
    /// The acquisition/tracking state machine.
    pub tracker: Tracker,
    /// The running UTC clock.
    pub time: TimeOfDay,
    divider: FractionalDivider,
    ticks_since_parameter_save: u32,
    ticks_delta: u8,

    // Edge flags: set by tick(), cleared by the service methods.
    valid_frame: bool,
    second_changed: bool,
    minute_changed: bool,
    params_unsaved: bool,
    needs_ui_refresh: bool,
    tick_interval_changed: bool,

    events: Deque<Event, EVENT_QUEUE_LEN>,

    /// Count of frames decoded and applied to the clock.
    pub frames_good: u16,
    /// Count of aligned frames rejected for impossible field values.
    pub frames_bad: u16,
    /// Count of peeks that found no unambiguous symbol.
    pub symbols_missed: u16,
}

impl<RX> WwvbReceiver<RX>
where
    RX: InputPin,
{
    /// Creates a receiver with the given input pin and tick parameters.
    ///
    /// # Arguments
    /// - `rx`: the demodulated input pin.
    /// - `params`: initial tick period, typically from
    ///   [`calibration::load_or_default`].
    /// - `rx_inverted`: whether the input pin is active-low.
    pub fn new(rx: RX, params: ClockParams, rx_inverted: Option<bool>) -> Self {
        Self {
            rx,
            rx_inverted: rx_inverted.unwrap_or(false),
            register: SampleRegister::new(),
            boards: [ScoreBoard::new(); 3],
            stream: SymbolStream::new(),
            tracker: Tracker::new(),
            time: TimeOfDay::new(),
            divider: FractionalDivider::new(params),
            ticks_since_parameter_save: 0,
            ticks_delta: DETECT_LATENCY_TICKS,
            valid_frame: false,
            second_changed: false,
            minute_changed: false,
            params_unsaved: false,
            needs_ui_refresh: false,
            tick_interval_changed: false,
            events: Deque::new(),
            frames_good: 0,
            frames_bad: 0,
            symbols_missed: 0,
        }
    }

    /// Overrides the decode latency compensation, in ticks.
    ///
    /// The default covers the correlator's detection lag. Add the expected
    /// main-loop latency if frames are serviced lazily.
    pub fn set_ticks_delta(&mut self, ticks: u8) {
        self.ticks_delta = ticks;
    }

    /// The current tick period parameters.
    pub fn clock_params(&self) -> ClockParams {
        self.divider.params()
    }

    /// Advances the receiver by one tick.
    ///
    /// This is the interrupt body. In order: sample the pin, shift the
    /// register, score all three boards, advance the tracker (which may
    /// detect a symbol, shift the stream, or discipline the clock), advance
    /// the time-of-day counter, and raise the UI flag.
    pub fn tick(&mut self) {
        let level = self.rx.is_high().unwrap_or(false);
        let sample = if self.rx_inverted { !level } else { level };
        self.register.shift(sample);

        for (board, template) in self.boards.iter_mut().zip(TEMPLATES.iter()) {
            board.shift(correlate::score(&self.register, template));
        }

        self.ticks_since_parameter_save = self.ticks_since_parameter_save.saturating_add(1);

        let event = self
            .tracker
            .tick(&self.boards, &mut self.stream, self.divider.params_mut());
        match event {
            TrackEvent::Idle | TrackEvent::SymbolAccepted(_) => {}
            TrackEvent::SyncAcquired => {
                self.ticks_since_parameter_save = 0;
                self.push_event(Event::SyncAcquired);
            }
            TrackEvent::SymbolMissed => {
                self.symbols_missed = self.symbols_missed.saturating_add(1);
            }
            TrackEvent::SyncLost => {
                self.push_event(Event::SyncLost);
            }
            TrackEvent::Disciplined(scaled) => {
                self.params_unsaved = true;
                self.tick_interval_changed = true;
                self.push_event(Event::Disciplined(scaled));
            }
        }

        // The stream only moves on non-idle ticks, so this is a true edge.
        if event != TrackEvent::Idle && self.stream.is_valid_frame() {
            self.valid_frame = true;
        }

        let edges = self.time.tick_time();
        if edges.second {
            self.second_changed = true;
        }
        if edges.minute {
            self.minute_changed = true;
        }
        self.needs_ui_refresh = true;
    }

    /// Length of the next tick period, as a hardware compare value.
    ///
    /// Call once per interrupt after [`tick()`](Self::tick); the fractional
    /// divider alternates short and long periods so the average period is
    /// exact.
    pub fn next_timer_compare(&mut self) -> u16 {
        self.divider.next_compare()
    }

    /// Decodes and applies a pending valid frame, if there is one.
    ///
    /// Main-loop only. Consumes the `valid_frame` flag; re-checks alignment
    /// in case the stream moved since the flag was raised. On success the
    /// clock now carries the broadcast time and `has_fix` is set.
    pub fn service_frame(&mut self) -> Option<FrameFields> {
        if !core::mem::take(&mut self.valid_frame) {
            return None;
        }
        if !self.stream.is_valid_frame() {
            // Serviced too late; the window has already moved on.
            return None;
        }
        match frame::decode(&self.stream) {
            Some(fields) => {
                fields.apply(&mut self.time, self.ticks_delta);
                self.frames_good = self.frames_good.saturating_add(1);
                self.push_event(Event::FrameApplied);
                debug_log!(
                    "frame applied: hours={} minutes={} day={}",
                    fields.hours,
                    fields.minutes,
                    fields.day_of_year
                );
                Some(fields)
            }
            None => {
                self.frames_bad = self.frames_bad.saturating_add(1);
                self.push_event(Event::FrameRejected);
                debug_log!("aligned frame rejected: fields out of range");
                None
            }
        }
    }

    /// Blocks (in the `nb` sense) until the first valid frame has been
    /// decoded.
    pub fn wait_fix(&self) -> nb::Result<(), Infallible> {
        if self.time.has_fix {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Whether the calibration should be written back now.
    ///
    /// True once the parameters changed, the tracker has stayed in SYNC,
    /// and enough continuous tracking has elapsed that the value is worth
    /// trusting to the store.
    pub fn should_persist(&self) -> bool {
        self.params_unsaved
            && self.tracker.mode == Mode::Sync
            && self.ticks_since_parameter_save >= PERSIST_AFTER_TICKS
    }

    /// Writes the current parameters to the calibration store.
    ///
    /// Main-loop only; store writes may be slow. On failure the pending
    /// flag stays set, so the next [`should_persist`](Self::should_persist)
    /// trigger retries.
    pub fn persist<S: CalibrationStore>(
        &mut self,
        store: &mut S,
    ) -> Result<(), CalibrationError<S::Error>> {
        let params = self.divider.params();
        calibration::save(store, &params)?;
        self.params_unsaved = false;
        self.ticks_since_parameter_save = 0;
        self.push_event(Event::CalibrationSaved);
        debug_log!("calibration saved: scaled={}", params.scaled());
        Ok(())
    }

    /// Pushes the current time at the display, honoring no-fix blanking.
    ///
    /// Main-loop only. Does nothing unless a tick has happened since the
    /// last refresh.
    pub fn refresh_display<D: TimeDisplay>(&mut self, display: &mut D, offset: &LocalOffset) {
        if !core::mem::take(&mut self.needs_ui_refresh) {
            return;
        }
        if self.time.display_blanked() {
            display.blank();
            return;
        }
        let (hours, minutes) = self.time.local_hm(offset);
        display.set_hours(hours);
        display.set_minutes(minutes);
        display.set_seconds(self.time.seconds);
    }

    /// Reads and clears the seconds-boundary flag.
    pub fn take_second_changed(&mut self) -> bool {
        core::mem::take(&mut self.second_changed)
    }

    /// Reads and clears the minute-boundary flag.
    pub fn take_minute_changed(&mut self) -> bool {
        core::mem::take(&mut self.minute_changed)
    }

    /// Reads and clears the period-reprogram flag.
    ///
    /// Integrations that copy the clock parameters into their own timer
    /// state poll this; users of
    /// [`next_timer_compare`](Self::next_timer_compare) get the new cadence
    /// automatically.
    pub fn take_tick_interval_changed(&mut self) -> bool {
        core::mem::take(&mut self.tick_interval_changed)
    }

    /// Pushes a changed tick period at a reprogrammable tick source.
    ///
    /// Main-loop alternative to polling
    /// [`take_tick_interval_changed`](Self::take_tick_interval_changed):
    /// consumes the same flag and calls
    /// [`TickSource::set_period`] with the new parameters. Returns whether a
    /// reprogram happened.
    pub fn reprogram_tick_source<T: TickSource>(&mut self, source: &mut T) -> bool {
        if !core::mem::take(&mut self.tick_interval_changed) {
            return false;
        }
        let params = self.divider.params();
        source.set_period(params.whole(), params.frac(), DENOM as u8);
        true
    }

    /// Pops the oldest queued diagnostic event.
    pub fn pop_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    fn push_event(&mut self, event: Event) {
        // A full queue drops the newest event; diagnostics are best-effort.
        let _ = self.events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[derive(Debug, Default)]
    struct CapturedDisplay {
        hours: Option<u8>,
        minutes: Option<u8>,
        seconds: Option<u8>,
        blanked: bool,
    }

    impl TimeDisplay for CapturedDisplay {
        fn set_hours(&mut self, hours: u8) {
            self.hours = Some(hours);
        }
        fn set_minutes(&mut self, minutes: u8) {
            self.minutes = Some(minutes);
        }
        fn set_seconds(&mut self, seconds: u8) {
            self.seconds = Some(seconds);
        }
        fn blank(&mut self) {
            self.blanked = true;
        }
    }

    #[test]
    fn test_receiver_initialization() {
        let rx = PinMock::new(&[]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        assert_eq!(receiver.tracker.mode, Mode::Seek);
        assert!(!receiver.time.has_fix);
        assert_eq!(receiver.clock_params(), ClockParams::nominal());
        assert!(receiver.pop_event().is_none());
        receiver.rx.done();
    }

    #[test]
    fn test_tick_samples_the_pin_and_raises_the_ui_flag() {
        let rx = PinMock::new(&[PinTransaction::get(PinState::High)]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        receiver.tick();
        assert_eq!(receiver.time.ticks, 1);

        let mut display = CapturedDisplay::default();
        let utc = LocalOffset {
            hours: 0,
            minutes: 0,
            observe_dst: false,
        };
        receiver.refresh_display(&mut display, &utc);
        assert_eq!(display.hours, Some(0));

        // The flag was consumed; a second refresh is a no-op.
        let mut second = CapturedDisplay::default();
        receiver.refresh_display(&mut second, &utc);
        assert_eq!(second.hours, None);
        receiver.rx.done();
    }

    #[test]
    fn test_display_blanks_late_in_the_second_without_fix() {
        let transactions = vec![PinTransaction::get(PinState::Low); 50];
        let rx = PinMock::new(&transactions);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        for _ in 0..50 {
            receiver.tick();
        }
        let mut display = CapturedDisplay::default();
        let utc = LocalOffset {
            hours: 0,
            minutes: 0,
            observe_dst: false,
        };
        receiver.refresh_display(&mut display, &utc);
        assert!(display.blanked);
        assert_eq!(display.hours, None);
        receiver.rx.done();
    }

    #[test]
    fn test_wait_fix_blocks_until_first_frame() {
        let rx = PinMock::new(&[]);
        let receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);
        assert_eq!(receiver.wait_fix(), Err(nb::Error::WouldBlock));
        let mut receiver = receiver;
        receiver.time.has_fix = true;
        assert_eq!(receiver.wait_fix(), Ok(()));
        receiver.rx.done();
    }

    #[test]
    fn test_second_edge_flag_is_read_once() {
        let transactions = vec![PinTransaction::get(PinState::Low); 60];
        let rx = PinMock::new(&transactions);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        for _ in 0..59 {
            receiver.tick();
            assert!(!receiver.take_second_changed());
        }
        receiver.tick();
        assert!(receiver.take_second_changed());
        assert!(!receiver.take_second_changed());
        receiver.rx.done();
    }

    #[test]
    fn test_next_timer_compare_follows_the_divider() {
        let rx = PinMock::new(&[]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        let mut longs = 0u32;
        for _ in 0..64 {
            let compare = receiver.next_timer_compare();
            assert!(compare == 33_332 || compare == 33_333);
            if compare == 33_333 {
                longs += 1;
            }
        }
        assert_eq!(longs, u32::from(ClockParams::nominal().frac()));
        receiver.rx.done();
    }

    #[test]
    fn test_reprogram_pushes_new_params_at_the_tick_source() {
        #[derive(Debug, Default)]
        struct RecordedPeriod(Option<(u16, u8, u8)>);

        impl TickSource for RecordedPeriod {
            fn set_period(&mut self, whole: u16, frac_num: u8, frac_denom: u8) {
                self.0 = Some((whole, frac_num, frac_denom));
            }
        }

        let rx = PinMock::new(&[]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);
        let mut source = RecordedPeriod::default();

        assert!(!receiver.reprogram_tick_source(&mut source));
        assert_eq!(source.0, None);

        receiver.tick_interval_changed = true;
        assert!(receiver.reprogram_tick_source(&mut source));
        assert_eq!(source.0, Some((33_333, 21, 64)));
        // The flag was consumed.
        assert!(!receiver.reprogram_tick_source(&mut source));
        receiver.rx.done();
    }

    #[test]
    fn test_should_persist_requires_all_three_conditions() {
        let rx = PinMock::new(&[]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);

        assert!(!receiver.should_persist());
        receiver.params_unsaved = true;
        assert!(!receiver.should_persist());
        receiver.tracker.mode = Mode::Sync;
        assert!(!receiver.should_persist());
        receiver.ticks_since_parameter_save = PERSIST_AFTER_TICKS;
        assert!(receiver.should_persist());
        receiver.rx.done();
    }
}
