//! Put-to-Wall - Pick-to-light Order Wall Firmware
//!
//! Main firmware binary for RP2040-based put-to-wall controllers. A host
//! application assigns orders to nine shelf slots over the serial link;
//! workers confirm picks and returns with the slot buttons.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ptw_core::config::{parse_config, WallConfig};
use ptw_core::state::ButtonEvent;
use ptw_drivers::{LcdBank, LcdPins, Mcp23017, Tm1638};

use crate::panel::{LedMutex, Panel};

/// Embedded configuration (compiled into firmware)
/// Edit wall.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../wall.toml");

/// I2C clock for the expander
const I2C_FREQUENCY_HZ: u32 = 400_000;

mod channels;
mod panel;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// LED driver shared by the tick task and the selftest
static LEDS: StaticCell<LedMutex> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Put-to-Wall firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Displays and expander need time after power-up
    Timer::after_millis(config.startup_delay_ms as u64).await;

    // Host serial link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.baud_rate);

    // Character displays and buzzer behind the MCP23017
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let mut expander = Mcp23017::new(i2c, config.expander_address);
    if let Err(e) = expander.init() {
        error!("Expander init failed: {:?}", e);
    }
    let mut displays = LcdBank::new(expander, Delay, LcdPins::default(), config.buzzer_pin);
    if let Err(e) = displays.init() {
        error!("Display init failed: {:?}", e);
    }

    info!("Displays initialized");

    // Light grid on the TM1638
    let mut tm1638 = Tm1638::new(
        Output::new(p.PIN_28, Level::High),
        Output::new(p.PIN_3, Level::High),
        Output::new(p.PIN_2, Level::Low),
        Delay,
        config.led_brightness,
    );
    if let Err(e) = tm1638.init() {
        error!("LED driver init failed: {:?}", e);
    }
    let leds: &'static LedMutex = LEDS.init(Mutex::new(tm1638));

    let indicator = Output::new(p.PIN_25, Level::Low);

    info!("LED driver initialized");

    // Buttons pull the pins high while pressed
    let front = [
        Input::new(p.PIN_6, Pull::Down),
        Input::new(p.PIN_7, Pull::Down),
        Input::new(p.PIN_8, Pull::Down),
        Input::new(p.PIN_9, Pull::Down),
        Input::new(p.PIN_10, Pull::Down),
        Input::new(p.PIN_11, Pull::Down),
        Input::new(p.PIN_12, Pull::Down),
        Input::new(p.PIN_13, Pull::Down),
        Input::new(p.PIN_14, Pull::Down),
    ];
    let back = [
        Input::new(p.PIN_15, Pull::Down),
        Input::new(p.PIN_16, Pull::Down),
        Input::new(p.PIN_17, Pull::Down),
        Input::new(p.PIN_18, Pull::Down),
        Input::new(p.PIN_19, Pull::Down),
        Input::new(p.PIN_20, Pull::Down),
        Input::new(p.PIN_21, Pull::Down),
        Input::new(p.PIN_22, Pull::Down),
        Input::new(p.PIN_26, Pull::Down),
    ];
    let batch = Input::new(p.PIN_27, Pull::Down);

    let panel = Panel::new(displays, tx, leds);

    // Spawn tasks
    for (slot, pin) in front.into_iter().enumerate() {
        spawner
            .spawn(tasks::button_task(pin, ButtonEvent::Front(slot as u8)))
            .unwrap();
    }
    for (slot, pin) in back.into_iter().enumerate() {
        spawner
            .spawn(tasks::button_task(pin, ButtonEvent::Back(slot as u8)))
            .unwrap();
    }
    spawner.spawn(tasks::button_task(batch, ButtonEvent::Batch)).unwrap();
    spawner
        .spawn(tasks::led_tick_task(leds, indicator, config.tick_period_ms))
        .unwrap();
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::controller_task(panel, config)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Load the embedded configuration
///
/// Parses the wall.toml file that was embedded at compile time. A file
/// that fails to parse or validate falls back to the defaults.
fn load_config() -> WallConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using default configuration");
            return WallConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Invalid embedded config: {:?}", e);
            error!("Using default configuration");
            WallConfig::default()
        }
    }
}
