/// Declares a static global `WWVB_RECEIVER` protected by a
/// `critical_section` mutex.
///
/// This macro creates a `static` singleton suitable for interrupt-based
/// environments, where both the main loop and the timer ISR need safe
/// access to shared receiver state.
///
/// # Arguments
/// - `$rx`: The concrete type of the input pin (must implement `InputPin`)
///
/// # Example
/// ```rust
/// # use embedded_hal_mock::eh1::digital::Mock as Pin;
/// use wwvb60::init_wwvb_receiver;
///
/// init_wwvb_receiver!(Pin);
/// ```
#[macro_export]
macro_rules! init_wwvb_receiver {
    ( $rx:ty ) => {
        pub static WWVB_RECEIVER: $crate::critical_section::Mutex<
            core::cell::RefCell<Option<$crate::receiver::WwvbReceiver<$rx>>>,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Installs a receiver into the `WWVB_RECEIVER` singleton declared by
/// [`init_wwvb_receiver!`].
///
/// # Arguments
/// - `$rx`: The input pin value (must implement `InputPin`)
/// - `$params`: The initial [`ClockParams`](crate::discipline::ClockParams),
///   typically loaded from the calibration store
/// - `$rx_inverted`: `Option<bool>`, whether the input pin is active-low
///
/// # Notes
/// - Must be called in a critical-section-aware context (safe in `main()`).
/// - Requires `init_wwvb_receiver!` to have been used earlier.
#[macro_export]
macro_rules! setup_wwvb_receiver {
    ( $rx:expr, $params:expr, $rx_inverted:expr ) => {
        $crate::critical_section::with(|cs| {
            let _ = WWVB_RECEIVER
                .borrow(cs)
                .replace(Some($crate::receiver::WwvbReceiver::new(
                    $rx,
                    $params,
                    $rx_inverted,
                )));
        });
    };
}

/// Runs one tick on the global `WWVB_RECEIVER` if it has been initialized.
///
/// Intended to be invoked from the timer ISR. Evaluates to
/// `Option<u16>`: the compare value to program for the next period, or
/// `None` when the receiver has not been set up yet.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIMER1_COMPA() {
///     if let Some(compare) = tick_wwvb_timer!() {
///         write_compare_register(compare);
///     }
/// }
/// ```
#[macro_export]
macro_rules! tick_wwvb_timer {
    () => {
        $crate::critical_section::with(|cs| {
            WWVB_RECEIVER
                .borrow(cs)
                .borrow_mut()
                .as_mut()
                .map(|receiver| {
                    receiver.tick();
                    receiver.next_timer_compare()
                })
        })
    };
}

/// Snapshots the global receiver's clock from the main loop, once it has a
/// fix.
///
/// Evaluates to `Option<TimeOfDay>`; the copy is taken inside a critical
/// section so a concurrent tick can never tear it.
///
/// # Example
/// ```rust,ignore
/// if let Some(now) = time_from_wwvb!() {
///     render(now.hours, now.minutes, now.seconds);
/// }
/// ```
#[macro_export]
macro_rules! time_from_wwvb {
    () => {
        $crate::critical_section::with(|cs| {
            WWVB_RECEIVER
                .borrow(cs)
                .borrow()
                .as_ref()
                .and_then(|receiver| {
                    if receiver.time.has_fix {
                        Some(receiver.time)
                    } else {
                        None
                    }
                })
        })
    };
}
