//! Status rendering for slot and batch displays
//!
//! Every display shows two label/value rows, with the value
//! right-justified to the display width:
//!
//! ```text
//! Quantity:    2/3        C:10    Orders:3
//! Order:      ORD1        Batch:        B1
//! ```

use core::fmt::Write;

use heapless::String;

use crate::state::{Batch, ShelfSlot};
use crate::traits::{TextDisplay, TextDisplayExt};

/// Display width in characters
pub const LCD_COLUMNS: usize = 16;

/// Rows with status content
pub const STATUS_ROWS: u8 = 2;

/// Column of the empty marker
pub const EMPTY_COLUMN: u8 = 5;

/// Shown on a display with nothing assigned
pub const EMPTY_TEXT: &str = "EMPTY";

/// Room for a label and the longest identifier
pub const LINE_CAPACITY: usize = 48;

/// One rendered display row
pub type Line = String<LINE_CAPACITY>;

/// Place `left` and `right` at the edges of a display row
///
/// Content wider than the display is joined without padding.
pub fn justify(left: &str, right: &str) -> Line {
    let mut line = Line::new();
    let padding = LCD_COLUMNS.saturating_sub(left.len() + right.len());
    push_str(&mut line, left);
    for _ in 0..padding {
        let _ = line.push(' ');
    }
    push_str(&mut line, right);
    line
}

/// Center `text` on a display row, padding both sides
pub fn centered(text: &str) -> Line {
    let mut line = Line::new();
    let padding = (LCD_COLUMNS / 2).saturating_sub(text.len() / 2);
    for _ in 0..padding {
        let _ = line.push(' ');
    }
    push_str(&mut line, text);
    for _ in 0..padding {
        let _ = line.push(' ');
    }
    line
}

fn push_str(line: &mut Line, text: &str) {
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
}

/// Something that can draw its status on a display
pub trait StatusRenderer {
    /// Content of one status row, `None` if there is nothing to show
    fn line(&self, row: u8) -> Option<Line>;

    /// Draw the first `rows` status rows, or the empty screen
    fn render<D: TextDisplay>(&self, display: &mut D, rows: u8) -> Result<(), D::Error> {
        if self.line(0).is_none() {
            return display.show_empty();
        }
        for row in 0..rows.min(STATUS_ROWS) {
            if let Some(line) = self.line(row) {
                display.write_row(row, &line)?;
            }
        }
        Ok(())
    }
}

impl StatusRenderer for ShelfSlot {
    fn line(&self, row: u8) -> Option<Line> {
        let order_id = self.order_id()?;
        match row {
            0 => {
                let mut count: String<12> = String::new();
                let _ = write!(count, "{}/{}", self.items_picked(), self.items_total());
                Some(justify("Quantity:", &count))
            }
            1 => Some(justify("Order:", order_id)),
            _ => None,
        }
    }
}

impl StatusRenderer for Batch {
    fn line(&self, row: u8) -> Option<Line> {
        let batch_id = self.batch_id()?;
        match row {
            0 => {
                let mut carts: String<8> = String::new();
                let mut orders: String<14> = String::new();
                let _ = write!(carts, "C:{}", self.carts_total());
                let _ = write!(orders, "Orders:{}", self.orders_remaining());
                Some(justify(&carts, &orders))
            }
            1 => Some(justify("Batch:", batch_id)),
            _ => None,
        }
    }
}
