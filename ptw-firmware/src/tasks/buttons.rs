//! Button tasks
//!
//! One task per button waits for the rising edge of its pin and posts
//! the event to the controller. Button tasks never touch the displays,
//! the lights or the serial link.

use defmt::*;
use embassy_rp::gpio::Input;

use ptw_core::state::ButtonEvent;

use crate::channels::{dropped_button_events, post_button};

/// One instance per front and back button of the nine slots, plus the
/// batch button
#[embassy_executor::task(pool_size = 19)]
pub async fn button_task(mut pin: Input<'static>, event: ButtonEvent) {
    debug!("Button task started: {:?}", event);

    loop {
        pin.wait_for_rising_edge().await;
        trace!("Edge: {:?}", event);

        if !post_button(event) {
            warn!(
                "Button channel full, dropping {:?} ({} dropped)",
                event,
                dropped_button_events()
            );
        }
    }
}
