//! Action runner
//!
//! Executes the side effects the dispatcher decides on: frames to the
//! host, display updates, buzzer patterns and pauses. Runs on the
//! controller task; waits are plain timer awaits and no wall lock is held
//! across them.

use core::fmt::Write as _;

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::uart::BufferedUartTx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Timer};
use embedded_io_async::Write;
use heapless::String;

use ptw_core::dispatch::{Action, Actions, BeepPattern};
use ptw_core::render::StatusRenderer;
use ptw_core::selftest::{self, SelfTestStep};
use ptw_core::traits::{LedDriver, TextDisplay, TextDisplayExt};
use ptw_drivers::lcd::BATCH_DISPLAY;
use ptw_drivers::{DriverError, LcdBank, LcdDisplay, Mcp23017, Tm1638};
use ptw_protocol::{OutboundMessage, SLOT_COUNT};

use crate::channels::{TICK_GATE, WALL};

/// Expander behind the blocking I2C bus
pub type Expander = Mcp23017<I2c<'static, I2C0, Blocking>>;

/// The ten character displays and the buzzer
pub type Displays = LcdBank<Expander, Delay>;

/// LED driver for the light grid
pub type Leds = Tm1638<Output<'static>, Output<'static>, Output<'static>, Delay>;

/// LED driver shared by the tick task and the selftest
pub type LedMutex = Mutex<CriticalSectionRawMutex, Leds>;

type DisplayError = DriverError<DriverError<embassy_rp::i2c::Error>>;

/// Rows redrawn on every display after the selftest
const FULL_ROWS: u8 = 2;

/// Hardware the controller drives
pub struct Panel {
    displays: Displays,
    tx: BufferedUartTx,
    leds: &'static LedMutex,
}

impl Panel {
    pub fn new(displays: Displays, tx: BufferedUartTx, leds: &'static LedMutex) -> Self {
        Self { displays, tx, leds }
    }

    /// Execute actions in order
    pub async fn run(&mut self, actions: Actions, sound_enabled: bool) {
        for action in actions {
            self.execute(action, sound_enabled).await;
        }
    }

    async fn execute(&mut self, action: Action, sound_enabled: bool) {
        match action {
            Action::Send(message) => self.send(&message).await,
            Action::RenderSlot { slot, rows } => self.render_slot(slot, rows),
            Action::RenderBatch { rows } => {
                let batch = WALL.batch();
                self.draw(BATCH_DISPLAY, |display| batch.render(display, rows));
            }
            Action::ClearSlot(slot) => self.draw(slot, |display| display.show_empty()),
            Action::ClearBatch => self.draw(BATCH_DISPLAY, |display| display.show_empty()),
            Action::Notice { row, text } => {
                self.draw(BATCH_DISPLAY, |display| display.show_centered(row, text))
            }
            Action::Beep(pattern) => self.beep(pattern).await,
            Action::Pause(ms) => Timer::after_millis(ms as u64).await,
            Action::SelfTest => self.selftest(sound_enabled).await,
            Action::OrderReturned { slot, cycle_ms } => {
                info!("Order returned from slot {}, cycle {} ms", slot + 1, cycle_ms);
            }
            Action::BatchEnded { cycle_ms } => {
                info!("Batch unregistered, cycle {} ms", cycle_ms);
            }
        }
    }

    async fn send(&mut self, message: &OutboundMessage) {
        let frame = match message.encode() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode {:?} frame: {:?}", message.kind(), e);
                return;
            }
        };

        debug!("TX: {=[u8]:a}", frame.as_slice());
        if let Err(e) = self.tx.write_all(&frame).await {
            error!("UART write failed: {:?}", e);
        }
    }

    fn render_slot(&mut self, index: u8, rows: u8) {
        if let Some(slot) = WALL.slot(index) {
            self.draw(index, |display| slot.render(display, rows));
        }
    }

    /// Run `f` on one display and log a failed write
    fn draw<F>(&mut self, index: u8, f: F)
    where
        F: FnOnce(&mut LcdDisplay<'_, Expander, Delay>) -> Result<(), DisplayError>,
    {
        let result = self
            .displays
            .display(index)
            .and_then(|mut display| f(&mut display));
        if let Err(e) = result {
            error!("Display {} write failed: {:?}", index, e);
        }
    }

    fn set_buzzer(&mut self, on: bool) {
        if let Err(e) = self.displays.set_buzzer(on) {
            error!("Buzzer write failed: {:?}", e);
        }
    }

    async fn beep(&mut self, pattern: BeepPattern) {
        for _ in 0..pattern.count {
            self.set_buzzer(true);
            Timer::after_millis(pattern.on_ms as u64).await;
            self.set_buzzer(false);
            Timer::after_millis(pattern.off_ms as u64).await;
        }
    }

    /// Walk every light, display and the buzzer
    ///
    /// The LED tick stays paused and the LED driver locked until the plan
    /// is done; afterwards every display is redrawn from the wall state.
    async fn selftest(&mut self, sound_enabled: bool) {
        info!("Selftest started");

        let leds = self.leds;
        {
            let _pause = TICK_GATE.pause();
            let mut leds = leds.lock().await;

            for step in selftest::plan(sound_enabled) {
                match step {
                    SelfTestStep::Beep(pattern) => self.beep(pattern).await,
                    SelfTestStep::Pause(ms) => Timer::after_millis(ms as u64).await,
                    SelfTestStep::Leds(registers) => {
                        if let Err(e) = leds.write(&registers, 0) {
                            error!("LED write failed: {:?}", e);
                        }
                    }
                    SelfTestStep::Notice { row, text } => {
                        self.draw(BATCH_DISPLAY, |display| display.show_centered(row, text))
                    }
                    SelfTestStep::SlotNumber(slot) => {
                        let mut number: String<4> = String::new();
                        let _ = write!(number, "{}", slot + 1);
                        self.draw(slot, |display| {
                            display.clear()?;
                            display.show_centered(0, &number)
                        });
                    }
                    SelfTestStep::ClearSlot(slot) => {
                        self.draw(slot, |display| display.show_empty())
                    }
                    SelfTestStep::ClearBatch => self.draw(BATCH_DISPLAY, |display| display.clear()),
                }
            }
        }

        for index in 0..SLOT_COUNT as u8 {
            self.render_slot(index, FULL_ROWS);
        }
        let batch = WALL.batch();
        if batch.is_active() {
            self.draw(BATCH_DISPLAY, |display| batch.render(display, FULL_ROWS));
        }

        info!("Selftest finished");
    }
}
