//! LED tick task
//!
//! Redraws the light grid once per tick. Blinking lights alternate
//! between the on and off frame; the on-board LED follows the phase as a
//! heartbeat.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker};

use ptw_core::led::Blinker;
use ptw_core::traits::LedDriver;

use crate::channels::{TICK_GATE, WALL};
use crate::panel::LedMutex;

/// LED tick task - writes the current light pattern every period
#[embassy_executor::task]
pub async fn led_tick_task(leds: &'static LedMutex, mut indicator: Output<'static>, period_ms: u32) {
    info!("LED tick task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
    let mut blinker = Blinker::new();

    loop {
        ticker.next().await;

        if !TICK_GATE.is_open() {
            continue;
        }

        let pattern = WALL.led_pattern();
        let (registers, phase_on) = blinker.tick(&pattern);
        indicator.set_level(phase_on.into());

        let mut leds = leds.lock().await;
        if let Err(e) = leds.write(registers, 0) {
            error!("LED write failed: {:?}", e);
        }
        trace!("Tick {}", blinker.ticks());
    }
}
