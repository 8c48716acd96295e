use crate::clock::TimeOfDay;
use crate::discipline::ClockParams;
use crate::frame::FrameFields;
use crate::receiver::WwvbReceiver;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::InputPin;

/// Used to initialize the global static `WwvbReceiver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust
/// use wwvb60::receiver::WwvbReceiver;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// # use embedded_hal_mock::eh1::digital::Mock as Pin;
/// use wwvb60::timer::global_receiver_init;
///
/// static RECEIVER: Mutex<RefCell<Option<WwvbReceiver<Pin>>>> =
///     global_receiver_init::<Pin>();
/// ```
pub const fn global_receiver_init<RX: InputPin>() -> Mutex<RefCell<Option<WwvbReceiver<RX>>>> {
    Mutex::new(RefCell::new(None))
}

/// Places a fully constructed receiver into the global static.
///
/// Call once from `main()` before enabling the timer interrupt. The initial
/// parameters normally come from
/// [`calibration::load_or_default`](crate::calibration::load_or_default).
///
/// # Example
/// ```rust
/// use wwvb60::discipline::ClockParams;
/// use wwvb60::receiver::WwvbReceiver;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// # use embedded_hal_mock::eh1::digital::Mock as Pin;
/// use wwvb60::timer::{global_receiver_init, global_receiver_setup};
///
/// static RECEIVER: Mutex<RefCell<Option<WwvbReceiver<Pin>>>> =
///     global_receiver_init::<Pin>();
///
/// fn main() {
///     # let rx = Pin::new(&[]);
///     global_receiver_setup(&RECEIVER, rx, ClockParams::nominal(), None);
///     # critical_section::with(|cs| {
///     #     if let Some(receiver) = RECEIVER.borrow(cs).borrow_mut().as_mut() {
///     #         receiver.rx.done();
///     #     }
///     # });
/// }
/// ```
pub fn global_receiver_setup<RX: InputPin>(
    global_receiver: &'static Mutex<RefCell<Option<WwvbReceiver<RX>>>>,
    rx: RX,
    params: ClockParams,
    rx_inverted: Option<bool>,
) {
    critical_section::with(|cs| {
        let _ = global_receiver
            .borrow(cs)
            .replace(Some(WwvbReceiver::new(rx, params, rx_inverted)));
    });
}

/// Runs one receiver tick from the timer interrupt.
///
/// Returns the compare value for the *next* period, so the ISR can keep the
/// fractional cadence: program it into the timer before returning. Returns
/// `None` if the receiver has not been set up yet.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     if let Some(compare) = global_receiver_tick(&RECEIVER) {
///         write_compare_register(compare);
///     }
/// }
/// ```
pub fn global_receiver_tick<RX: InputPin>(
    global_receiver: &'static Mutex<RefCell<Option<WwvbReceiver<RX>>>>,
) -> Option<u16> {
    critical_section::with(|cs| {
        let mut guard = global_receiver.borrow(cs).borrow_mut();
        let receiver = guard.as_mut()?;
        receiver.tick();
        Some(receiver.next_timer_compare())
    })
}

/// Services a pending frame on the global receiver from the main loop.
///
/// Decodes and applies the frame if the tick path flagged one since the
/// last call; returns the decoded fields.
///
/// # See also
/// - [`WwvbReceiver::service_frame()`]
pub fn service_global_frame<RX: InputPin>(
    global_receiver: &'static Mutex<RefCell<Option<WwvbReceiver<RX>>>>,
) -> Option<FrameFields> {
    critical_section::with(|cs| {
        let mut guard = global_receiver.borrow(cs).borrow_mut();
        guard.as_mut()?.service_frame()
    })
}

/// Snapshots the global receiver's clock, once it has a fix.
///
/// Returns `None` before the first valid frame (or before setup). The
/// returned value is a copy taken inside a critical section, so it is never
/// torn by a concurrent tick.
///
/// # Example
/// ```rust
/// # use embedded_hal_mock::eh1::digital::Mock as Pin;
/// use core::cell::RefCell;
/// use critical_section::Mutex;
/// use wwvb60::receiver::WwvbReceiver;
/// use wwvb60::timer::{global_receiver_init, time_from_global_receiver};
///
/// static RECEIVER: Mutex<RefCell<Option<WwvbReceiver<Pin>>>> =
///     global_receiver_init::<Pin>();
/// // ...
/// if let Some(now) = time_from_global_receiver(&RECEIVER) {
///     // Display `now`
/// }
/// ```
pub fn time_from_global_receiver<RX: InputPin>(
    global_receiver: &'static Mutex<RefCell<Option<WwvbReceiver<RX>>>>,
) -> Option<TimeOfDay> {
    critical_section::with(|cs| {
        let guard = global_receiver.borrow(cs).borrow();
        let receiver = guard.as_ref()?;
        if receiver.time.has_fix {
            Some(receiver.time)
        } else {
            None
        }
    })
}
