//! Symbol detection and the SEEK/SYNC tracking machine.
//!
//! Acquisition has two regimes. In SEEK the receiver knows nothing about
//! symbol timing, so it waits for correlation peaks to sit dead center in a
//! scoreboard — a confirmed local maximum — and counts them. Enough
//! detections establish the one-second cadence and the machine moves to
//! SYNC, where it stops scanning and instead peeks at the boards exactly
//! when the next symbol center is due. The offset between the expected and
//! observed peak position at each peek is both the tracking correction for
//! the next peek and, accumulated, the drift measurement that drives the
//! clock discipline.

use crate::consts::{
    DRIFT_TRIGGER, MIN_DISCIPLINE_TICKS, SCOREBOARD_CENTER, SCORE_THRESHOLD,
    SEEK_DETECTED_THRESHOLD, SYNC_MISS_THRESHOLD, TICKS_PER_SECOND,
};
use crate::discipline::ClockParams;
use crate::frame::{Symbol, SymbolStream};
use crate::score::ScoreBoard;

/// Acquisition regime.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Mode {
    /// Searching for aligned symbols; no timing assumption.
    #[default]
    Seek,
    /// Locked to the one-second cadence; tracking drift.
    Sync,
}

/// What one tracker tick did, for the orchestrator's flags and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEvent {
    /// Nothing of note this tick.
    Idle,
    /// A symbol was detected and pushed into the stream.
    SymbolAccepted(Symbol),
    /// The detection that completed acquisition; the machine is now in SYNC.
    SyncAcquired,
    /// A peek found no unambiguous symbol; a placeholder was pushed.
    SymbolMissed,
    /// Too many consecutive misses; the machine fell back to SEEK.
    SyncLost,
    /// The clock discipline ran; the payload is the new scaled period.
    Disciplined(u32),
}

/// SEEK detection: any board whose peak is above threshold *and* centered,
/// checked in ZERO, ONE, MARKER order.
fn detect_centered(boards: &[ScoreBoard; 3]) -> Option<Symbol> {
    for (board, &symbol) in boards.iter().zip(Symbol::DETECTION_ORDER.iter()) {
        if let Some((_, index)) = board.max_over_threshold(SCORE_THRESHOLD) {
            if index == SCOREBOARD_CENTER {
                return Some(symbol);
            }
        }
    }
    None
}

/// SYNC detection: exactly one board above threshold, wherever its peak
/// sits. Returns the symbol and the peak's offset from center in ticks.
fn detect_at_peek(boards: &[ScoreBoard; 3]) -> Option<(Symbol, i8)> {
    let mut hit = None;
    for (board, &symbol) in boards.iter().zip(Symbol::DETECTION_ORDER.iter()) {
        if board.max_over_threshold(SCORE_THRESHOLD).is_some() {
            if hit.is_some() {
                // Two boards claiming the same second is noise, not signal.
                return None;
            }
            hit = Some((symbol, board.center_offset()));
        }
    }
    hit
}

/// The acquisition/tracking state machine.
///
/// Owns the counters; reads the scoreboards; writes the symbol stream and,
/// through [`ClockParams::adjust`], the tick period.
#[derive(Debug, Clone, Copy)]
pub struct Tracker {
    /// Current regime. Read by the orchestrator's persistence gate.
    pub mode: Mode,
    detected: u8,
    missed: u8,
    peek_in: u8,
    accumulated_offset: i16,
    ticks_since_discipline: u32,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// A tracker in SEEK with clear counters.
    pub const fn new() -> Self {
        Self {
            mode: Mode::Seek,
            detected: 0,
            missed: 0,
            peek_in: TICKS_PER_SECOND,
            accumulated_offset: 0,
            ticks_since_discipline: 0,
        }
    }

    /// Net symbol-arrival offset accumulated since the last discipline run.
    pub fn accumulated_offset(&self) -> i16 {
        self.accumulated_offset
    }

    /// Runs one tick of the state machine, after the boards were updated.
    pub fn tick(
        &mut self,
        boards: &[ScoreBoard; 3],
        stream: &mut SymbolStream,
        params: &mut ClockParams,
    ) -> TrackEvent {
        self.ticks_since_discipline = self.ticks_since_discipline.saturating_add(1);
        match self.mode {
            Mode::Seek => self.tick_seek(boards, stream),
            Mode::Sync => self.tick_sync(boards, stream, params),
        }
    }

    fn tick_seek(&mut self, boards: &[ScoreBoard; 3], stream: &mut SymbolStream) -> TrackEvent {
        let Some(symbol) = detect_centered(boards) else {
            return TrackEvent::Idle;
        };
        stream.shift(symbol);
        self.detected += 1;
        if self.detected < SEEK_DETECTED_THRESHOLD {
            return TrackEvent::SymbolAccepted(symbol);
        }
        // This detection is the symbol center, so the next one is due in
        // exactly one second.
        self.mode = Mode::Sync;
        self.detected = 0;
        self.missed = 0;
        self.peek_in = TICKS_PER_SECOND;
        self.accumulated_offset = 0;
        self.ticks_since_discipline = 0;
        TrackEvent::SyncAcquired
    }

    fn tick_sync(
        &mut self,
        boards: &[ScoreBoard; 3],
        stream: &mut SymbolStream,
        params: &mut ClockParams,
    ) -> TrackEvent {
        self.peek_in -= 1;
        if self.peek_in > 0 {
            return TrackEvent::Idle;
        }

        match detect_at_peek(boards) {
            Some((symbol, offset)) => {
                stream.shift(symbol);
                self.missed = 0;
                self.accumulated_offset += offset as i16;
                // Peeks self-track: an early or late peak shifts the next
                // peek by the same amount.
                self.peek_in = (TICKS_PER_SECOND as i8 + offset) as u8;

                if self.accumulated_offset.abs() > DRIFT_TRIGGER
                    && self.ticks_since_discipline > MIN_DISCIPLINE_TICKS
                {
                    let local = self.ticks_since_discipline;
                    let apparent = (local as i32 - self.accumulated_offset as i32) as u32;
                    params.adjust(local, apparent);
                    self.accumulated_offset = 0;
                    self.ticks_since_discipline = 0;
                    return TrackEvent::Disciplined(params.scaled());
                }
                TrackEvent::SymbolAccepted(symbol)
            }
            None => {
                stream.shift(Symbol::Missing);
                self.peek_in = TICKS_PER_SECOND;
                self.missed += 1;
                if self.missed < SYNC_MISS_THRESHOLD {
                    return TrackEvent::SymbolMissed;
                }
                self.mode = Mode::Seek;
                self.detected = 0;
                self.missed = 0;
                self.accumulated_offset = 0;
                TrackEvent::SyncLost
            }
        }
    }
}
