//! Persistence of the learned oscillator calibration.
//!
//! The disciplined tick period is the one thing worth keeping across power
//! cycles: reacquiring sync is fast, but re-learning the oscillator takes
//! hours. The record is five bytes at a fixed offset in a small byte store
//! (typically an EEPROM): a version byte followed by the scaled period,
//! little-endian. Version 1 predates the wider divider and used a
//! denominator of 16; it is upgraded on read by scaling the count up to the
//! current denominator of 64.
//!
//! Nothing here is fatal. A record that fails to parse means the
//! compile-time defaults are used; a write that fails stays pending and is
//! retried at the next persistence trigger.

use crate::consts::{CALIBRATION_OFFSET, CALIBRATION_V1, CALIBRATION_V2, SCALED_MAX, SCALED_MIN};
use crate::discipline::ClockParams;
use thiserror::Error;

/// Length of the serialized record: version byte plus a `u32`.
pub const RECORD_LEN: usize = 5;

/// A byte store holding the calibration record.
///
/// The receiver core needs nothing more than offset-addressed byte access;
/// an EEPROM driver, a flash page, or a test array all qualify. Writes may
/// be slow and must only happen from the main loop, never the tick path.
pub trait CalibrationStore {
    /// Error type of the underlying store.
    type Error;

    /// Reads `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes `bytes` starting at `offset`.
    fn write(&mut self, offset: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Why a calibration record could not be loaded or saved.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum CalibrationError<E> {
    /// The version byte is not one this firmware understands.
    #[error("unrecognized calibration record version {0}")]
    UnknownVersion(u8),
    /// The stored period is outside the ±5% clamp window.
    #[error("calibration value {0} outside the trusted window")]
    OutOfRange(u32),
    /// The store itself failed.
    #[error("calibration store access failed")]
    Store(E),
}

/// Reads and validates the stored record.
///
/// A version-1 record has its scaled count converted from the old
/// denominator of 16 (a factor of four). Any scaled count outside the
/// clamp window is rejected rather than trusted.
pub fn load<S: CalibrationStore>(store: &mut S) -> Result<ClockParams, CalibrationError<S::Error>> {
    let mut raw = [0u8; RECORD_LEN];
    store
        .read(CALIBRATION_OFFSET, &mut raw)
        .map_err(CalibrationError::Store)?;
    let stored = u32::from_le_bytes([raw[1], raw[2], raw[3], raw[4]]);
    let scaled = match raw[0] {
        CALIBRATION_V2 => stored,
        CALIBRATION_V1 => stored.saturating_mul(4),
        version => return Err(CalibrationError::UnknownVersion(version)),
    };
    if !(SCALED_MIN..=SCALED_MAX).contains(&scaled) {
        return Err(CalibrationError::OutOfRange(scaled));
    }
    Ok(ClockParams::from_scaled(scaled))
}

/// Loads the stored record, falling back to the nominal parameters.
///
/// This is the startup path: any failure is diagnostic, never fatal.
pub fn load_or_default<S: CalibrationStore>(store: &mut S) -> ClockParams {
    match load(store) {
        Ok(params) => {
            crate::debug_log!("calibration loaded: scaled={}", params.scaled());
            params
        }
        Err(_error) => {
            crate::debug_log!("calibration unusable, using nominal defaults");
            ClockParams::nominal()
        }
    }
}

/// Writes `params` as a current-version record.
pub fn save<S: CalibrationStore>(
    store: &mut S,
    params: &ClockParams,
) -> Result<(), CalibrationError<S::Error>> {
    let mut raw = [0u8; RECORD_LEN];
    raw[0] = CALIBRATION_V2;
    raw[1..].copy_from_slice(&params.scaled().to_le_bytes());
    store
        .write(CALIBRATION_OFFSET, &raw)
        .map_err(CalibrationError::Store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NOMINAL_SCALED;

    /// An array-backed store for tests.
    #[derive(Debug, Default)]
    struct RamStore {
        bytes: [u8; 16],
    }

    impl CalibrationStore for RamStore {
        type Error = ();

        fn read(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), ()> {
            let start = offset as usize;
            buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
            Ok(())
        }

        fn write(&mut self, offset: u8, bytes: &[u8]) -> Result<(), ()> {
            let start = offset as usize;
            self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }
    }

    /// A store whose every access fails.
    #[derive(Debug)]
    struct BrokenStore;

    impl CalibrationStore for BrokenStore {
        type Error = u8;

        fn read(&mut self, _offset: u8, _buf: &mut [u8]) -> Result<(), u8> {
            Err(0xEE)
        }

        fn write(&mut self, _offset: u8, _bytes: &[u8]) -> Result<(), u8> {
            Err(0xEE)
        }
    }

    #[test]
    fn test_save_then_load_round_trips_byte_for_byte() {
        let mut store = RamStore::default();
        let params = ClockParams::from_scaled(2_133_332);
        save(&mut store, &params).unwrap();
        assert_eq!(&store.bytes[..RECORD_LEN], &[2, 0x14, 0x8D, 0x20, 0x00]);
        assert_eq!(load(&mut store).unwrap(), params);
    }

    #[test]
    fn test_v1_record_upgrades_its_denominator() {
        let mut store = RamStore::default();
        store.bytes[0] = CALIBRATION_V1;
        // 533333 under denominator 16 is 33333 + 5/16.
        store.bytes[1..RECORD_LEN].copy_from_slice(&533_333u32.to_le_bytes());
        let params = load(&mut store).unwrap();
        assert_eq!(params.scaled(), 2_133_332);
        assert_eq!(params.whole(), 33_333);
        assert_eq!(params.frac(), 20);

        // Saving writes it back in the current format.
        save(&mut store, &params).unwrap();
        assert_eq!(store.bytes[0], CALIBRATION_V2);
        assert_eq!(load(&mut store).unwrap().scaled(), 2_133_332);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut store = RamStore::default();
        store.bytes[0] = 7;
        store.bytes[1..RECORD_LEN].copy_from_slice(&NOMINAL_SCALED.to_le_bytes());
        assert_eq!(load(&mut store), Err(CalibrationError::UnknownVersion(7)));
    }

    #[test]
    fn test_out_of_window_value_is_rejected() {
        let mut store = RamStore::default();
        store.bytes[0] = CALIBRATION_V2;
        store.bytes[1..RECORD_LEN].copy_from_slice(&(SCALED_MAX + 1).to_le_bytes());
        assert_eq!(
            load(&mut store),
            Err(CalibrationError::OutOfRange(SCALED_MAX + 1))
        );

        // Erased-EEPROM garbage (all 0xFF) fails on the version byte first.
        let mut erased = RamStore { bytes: [0xFF; 16] };
        assert_eq!(
            load(&mut erased),
            Err(CalibrationError::UnknownVersion(0xFF))
        );
    }

    #[test]
    fn test_store_failure_surfaces_and_defaults_apply() {
        let mut store = BrokenStore;
        assert_eq!(load(&mut store), Err(CalibrationError::Store(0xEE)));
        assert_eq!(load_or_default(&mut store), ClockParams::nominal());
        assert_eq!(
            save(&mut store, &ClockParams::nominal()),
            Err(CalibrationError::Store(0xEE))
        );
    }

    #[test]
    fn test_fresh_store_yields_defaults() {
        // All zeroes: version 0 is unknown.
        let mut store = RamStore::default();
        assert_eq!(load_or_default(&mut store), ClockParams::nominal());
    }
}
