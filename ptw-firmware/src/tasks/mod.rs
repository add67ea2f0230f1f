//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels and the
//! shared wall.

pub mod buttons;
pub mod controller;
pub mod serial_rx;
pub mod tick;

pub use buttons::button_task;
pub use controller::controller_task;
pub use serial_rx::serial_rx_task;
pub use tick::led_tick_task;
