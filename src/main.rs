//! hrlink firmware - nRF52840 bench build.
//!
//! Drives the link state machine against the simulated strap and shows
//! the live metrics on an SSD1306 OLED.  Three tasks:
//!
//! - **link**: polls `HrLink::advance` every `LINK_POLL_INTERVAL_MS`
//! - **display**: redraws every `DISPLAY_REFRESH_MS`, or at once on RESET
//! - **button**: debounces the RESET button

#![no_std]
#![no_main]

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{AnyPin, Pin};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use {defmt_rtt as _, panic_probe as _};

use hrlink::config::{DISPLAY_REFRESH_MS, LINK_POLL_INTERVAL_MS};
use hrlink::sim::SimRadio;
use hrlink::ui::buttons::{self, ButtonSignal};
use hrlink::ui::display::{self, Display};
use hrlink::ui::{ButtonEvent, Frame};
use hrlink::{time, EventQueue, EventSender, HrLink, LinkConfig, MetricsSource, MetricsStore};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

/// Shared between the link task (writer) and the display task (reader).
static METRICS: MetricsStore = MetricsStore::new();
/// Radio stack -> link events.
static EVENTS: EventQueue = EventQueue::new();
static BUTTON: ButtonSignal = Signal::new();

#[embassy_executor::task]
async fn link_task() -> ! {
    let radio = SimRadio::new(EventSender::new(&EVENTS));
    let mut link = HrLink::new(radio, LinkConfig::new(), &METRICS, &EVENTS, time::now());
    let mut ticker = Ticker::every(Duration::from_millis(LINK_POLL_INTERVAL_MS));

    loop {
        let now = time::now();
        link.radio_mut().tick(now);
        link.advance(now);
        ticker.next().await;
    }
}

#[embassy_executor::task]
async fn display_task(mut oled: Display<Twim<'static, TWISPI0>>) -> ! {
    loop {
        let frame = Frame::from_snapshot(&METRICS.snapshot(), time::now());
        display::draw_frame(&mut oled, &frame);

        let refresh = Timer::after(Duration::from_millis(DISPLAY_REFRESH_MS));
        if let Either::Second(ButtonEvent::Reset) = select(refresh, BUTTON.wait()).await {
            METRICS.reset_metrics(time::now());
        }
    }
}

#[embassy_executor::task]
async fn reset_button_task(pin: AnyPin) -> ! {
    buttons::button_task(pin, ButtonEvent::Reset, &BUTTON).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("hrlink starting");

    // nRF52840-DK: SDA P0.26, SCL P0.27, BUTTON1 P0.11.
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let oled = display::init(i2c);

    unwrap!(spawner.spawn(link_task()));
    unwrap!(spawner.spawn(display_task(oled)));
    unwrap!(spawner.spawn(reset_button_task(p.P0_11.degrade())));
}
