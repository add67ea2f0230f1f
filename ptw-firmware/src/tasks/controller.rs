//! Main controller task
//!
//! Owns the dispatcher and the panel. Each pass queues the frames the RX
//! task decoded, answers queued commands in arrival order, applies button
//! edges and reconciles every slot against the host's claims. Then it
//! waits for the next frame, button edge or reminder tick.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Instant, Ticker};

use ptw_core::config::WallConfig;
use ptw_core::dispatch::{Action, Actions, Dispatcher, ReceiveError};
use ptw_core::state::ButtonEvent;
use ptw_protocol::{Fields, SLOT_COUNT};

use crate::channels::{BUTTON_CHANNEL, FRAME_CHANNEL, WALL};
use crate::panel::Panel;

/// Controller task - runs the wall
#[embassy_executor::task]
pub async fn controller_task(mut panel: Panel, config: WallConfig) {
    info!("Controller task started");

    let mut dispatcher = Dispatcher::new(&config);
    let mut reminder = Ticker::every(Duration::from_millis(config.reminder_interval_ms as u64));

    panel.run(idle_screens(), dispatcher.sound_enabled()).await;

    loop {
        while let Ok(fields) = FRAME_CHANNEL.try_receive() {
            queue_frame(&mut dispatcher, &fields);
        }

        loop {
            let Some(actions) = WALL.with(|wall| dispatcher.dispatch_next(wall, now_ms())) else {
                break;
            };
            panel.run(actions, dispatcher.sound_enabled()).await;

            // Frames that arrived meanwhile queue behind the rest
            while let Ok(fields) = FRAME_CHANNEL.try_receive() {
                queue_frame(&mut dispatcher, &fields);
            }
        }

        while let Ok(event) = BUTTON_CHANNEL.try_receive() {
            apply_button(event);
        }

        for index in 0..SLOT_COUNT as u8 {
            let actions = WALL.with(|wall| dispatcher.reconcile_slot(wall, index));
            if !actions.is_empty() {
                panel.run(actions, dispatcher.sound_enabled()).await;
            }
        }

        if WALL.with(|wall| dispatcher.acknowledge_batch_button(wall)) {
            debug!("Batch button acknowledged");
        }

        match select3(FRAME_CHANNEL.receive(), BUTTON_CHANNEL.receive(), reminder.next()).await {
            Either3::First(fields) => queue_frame(&mut dispatcher, &fields),
            Either3::Second(event) => apply_button(event),
            Either3::Third(()) => {
                let actions = WALL.with(|wall| dispatcher.reminder(wall));
                panel.run(actions, dispatcher.sound_enabled()).await;
            }
        }
    }
}

/// Milliseconds since boot; wraps after ~49 days like the cycle times
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

fn queue_frame(dispatcher: &mut Dispatcher, fields: &Fields) {
    let kind = fields.first().map(|f| f.as_str()).unwrap_or("");
    match dispatcher.receive(fields) {
        Ok(()) => debug!("Queued {} ({} waiting)", kind, dispatcher.queued()),
        Err(ReceiveError::UnknownKind) => warn!("Unknown command kind {}, dropped", kind),
        Err(ReceiveError::QueueFull) => warn!("Command queue full, dropping {}", kind),
    }
}

fn apply_button(event: ButtonEvent) {
    let accepted = WALL.apply_button(event, now_ms());
    debug!("Button {:?}, latched: {}", event, accepted);
}

/// Every display showing its empty screen
fn idle_screens() -> Actions {
    let mut actions = Actions::new();
    for slot in 0..SLOT_COUNT as u8 {
        let _ = actions.push(Action::ClearSlot(slot));
    }
    let _ = actions.push(Action::ClearBatch);
    actions
}
