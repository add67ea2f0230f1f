//! Host UART receive task
//!
//! Decodes frames from the host and hands them to the controller.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use ptw_protocol::FrameDecoder;

use crate::channels::FRAME_CHANNEL;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - receives and decodes frames from the host
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for frame in decoder.decode(&buf[..n]) {
                    match frame {
                        Ok(fields) => {
                            if FRAME_CHANNEL.try_send(fields).is_err() {
                                warn!("Frame channel full, dropping frame");
                            }
                        }
                        Err(e) => {
                            warn!("Frame decode error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                // Bytes were lost, so any partial frame is garbage
                warn!("UART read error: {:?}", e);
                decoder.reset();
            }
        }
    }
}
