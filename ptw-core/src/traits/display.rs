//! Character display trait

/// A character display such as an HD44780 16x2
pub trait TextDisplay {
    type Error;

    /// Clear the screen and home the cursor
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Move the cursor
    fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Self::Error>;

    /// Write ASCII text at the cursor
    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Helpers for common screen layouts
pub trait TextDisplayExt: TextDisplay {
    /// Write a full row starting at column 0
    fn write_row(&mut self, row: u8, text: &str) -> Result<(), Self::Error> {
        self.set_cursor(0, row)?;
        self.write_text(text)
    }

    /// Show a centered notice on one row
    fn show_centered(&mut self, row: u8, text: &str) -> Result<(), Self::Error> {
        let line = crate::render::centered(text);
        self.write_row(row, &line)
    }

    /// Clear and show the empty marker
    fn show_empty(&mut self) -> Result<(), Self::Error> {
        self.clear()?;
        self.set_cursor(crate::render::EMPTY_COLUMN, 0)?;
        self.write_text(crate::render::EMPTY_TEXT)
    }
}

// Blanket implementation for all TextDisplay types
impl<T: TextDisplay> TextDisplayExt for T {}
