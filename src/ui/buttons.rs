//! GPIO button input with async debouncing.
//!
//! One physical button (active-low with internal pull-up): RESET clears
//! the session min/max and restarts the runtime clock.
//!
//! The task waits for a GPIO edge, debounces it, and signals a
//! `ButtonEvent` to the display task.

use crate::config::BUTTON_DEBOUNCE_MS;
use crate::ui::ButtonEvent;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

/// Latest button press, consumed by the display task.
pub type ButtonSignal = Signal<CriticalSectionRawMutex, ButtonEvent>;

/// Run a single button polling loop.
///
/// Waits for the pin to go low (pressed), debounces, signals the event,
/// then waits for release before repeating.
pub async fn button_task(pin: AnyPin, event: ButtonEvent, signal: &'static ButtonSignal) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        // Wait for falling edge (button press, active-low).
        btn.wait_for_falling_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Button: {}", event);
            signal.signal(event);

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
