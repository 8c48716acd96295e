use crate::receiver::WwvbReceiver;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

/// Runs one tick-and-wait iteration against a delay provider.
///
/// For environments without a usable timer interrupt. Note that a fixed
/// microsecond delay cannot reproduce the fractional divider's cadence, so
/// the clock discipline has nothing to steer in this mode; it suits bench
/// bring-up and tests rather than production timekeeping.
///
/// # Arguments
/// - `receiver`: the receiver to advance.
/// - `delay`: a delay provider implementing `DelayNs`, typically from the HAL.
/// - `tick_us`: the delay after each tick, in microseconds (16_667 for 60 Hz).
pub fn step_wwvb_tick<D: DelayNs, RX: InputPin>(
    receiver: &mut WwvbReceiver<RX>,
    delay: &mut D,
    tick_us: u32,
) {
    receiver.tick();
    delay.delay_us(tick_us);
}

/// Drives the receiver forever with a blocking delay loop.
///
/// Never returns; intended for single-purpose polling firmware. Prefer the
/// interrupt integration in [`crate::timer`] wherever a timer is available.
pub fn run_wwvb_tick_loop<D: DelayNs, RX: InputPin>(
    receiver: &mut WwvbReceiver<RX>,
    delay: &mut D,
    tick_us: u32,
) -> ! {
    loop {
        step_wwvb_tick(receiver, delay, tick_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discipline::ClockParams;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_step_ticks_once_per_call() {
        let rx = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ]);
        let mut receiver = WwvbReceiver::new(rx, ClockParams::nominal(), None);
        let mut delay = NoopDelay::new();

        step_wwvb_tick(&mut receiver, &mut delay, 16_667);
        step_wwvb_tick(&mut receiver, &mut delay, 16_667);
        assert_eq!(receiver.time.ticks, 2);
        receiver.rx.done();
    }
}
