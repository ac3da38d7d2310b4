//! Text box widget: the thin layer tying the scrollback ring to the
//! blit engine.
//!
//! The widget never draws on its own. Character ingestion only mutates
//! the ring and raises the dirty flag; the owner decides when to clear
//! the framebuffer and call [`TextBox::render`], then flushes the
//! result to the display.

use crate::error::DrawError;
use crate::font::Font;
use crate::framebuffer::Framebuffer;
use crate::textbuf::TextRing;

/// A scrolling text viewport backed by a [`TextRing`] of capacity `N`.
pub struct TextBox<const N: usize> {
    pos_x: usize,
    pos_y: usize,
    width: usize,
    height: usize,
    font: Font,
    buffer: TextRing<N>,
    updated: bool,
}

impl<const N: usize> TextBox<N> {
    /// Create a text box covering the pixel rectangle at
    /// `(pos_x, pos_y)` of size `width` x `height`.
    ///
    /// Partial glyph rows and columns at the viewport edge are never
    /// rendered; the usable area is the largest whole-glyph grid that
    /// fits.
    pub const fn new(pos_x: usize, pos_y: usize, width: usize, height: usize, font: Font) -> Self {
        Self {
            pos_x,
            pos_y,
            width,
            height,
            font,
            buffer: TextRing::new(),
            updated: false,
        }
    }

    /// Feed one character through the ring's classification policy and
    /// mark the widget dirty.
    pub fn process_char(&mut self, c: u8) {
        self.buffer.process_char(c);
        self.updated = true;
    }

    /// Whether the content changed since the last full render.
    pub fn updated(&self) -> bool {
        self.updated
    }

    /// Drop all text and mark the widget dirty.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.updated = true;
    }

    /// Read access to the backing ring.
    pub fn buffer(&self) -> &TextRing<N> {
        &self.buffer
    }

    /// Whole glyph rows that fit in the viewport.
    pub fn lines_in_viewport(&self) -> usize {
        if self.font.char_height == 0 {
            return 0;
        }
        self.height / self.font.char_height
    }

    /// Whole glyph columns that fit in the viewport.
    pub fn columns_in_viewport(&self) -> usize {
        if self.font.char_width == 0 {
            return 0;
        }
        self.width / self.font.char_width
    }

    /// Redraw every visible character into `fb` and clear the dirty
    /// flag.
    ///
    /// The window anchors at the start of the n-th line from the end,
    /// n being the viewport height in lines. Both `\n` and `\r` reset
    /// the cursor column and advance the line, capped at the last
    /// visible row; characters past the last column are dropped, not
    /// wrapped. The framebuffer is not cleared here - the caller does
    /// that before a redraw.
    ///
    /// On error the dirty flag stays set, so the next poll retries.
    pub fn render<const W: usize, const P: usize>(
        &mut self,
        fb: &mut Framebuffer<W, P>,
    ) -> Result<(), DrawError> {
        let lines = self.lines_in_viewport();
        let columns = self.columns_in_viewport();
        if lines == 0 || columns == 0 {
            self.updated = false;
            return Ok(());
        }

        let start = self.buffer.start_of_nth_line_from_end(lines);
        let mut col = 0;
        let mut line = 0;
        for c in self.buffer.iter_from(start) {
            if c == b'\n' || c == b'\r' {
                col = 0;
                if line + 1 < lines {
                    line += 1;
                }
            } else if col < columns {
                let glyph = self.font.glyph(c)?;
                fb.blit_paged(
                    glyph,
                    self.font.char_height,
                    self.font.char_width,
                    self.pos_x + col * self.font.char_width,
                    self.pos_y + line * self.font.char_height,
                )?;
                col += 1;
            }
        }

        self.updated = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4x8 test glyphs: every column byte of a glyph is the character
    // code itself, so framebuffer bytes identify the glyph directly.
    static GLYPH_DATA: [u8; 26 * 4] = {
        let mut data = [0u8; 26 * 4];
        let mut i = 0;
        while i < data.len() {
            data[i] = b'A' + (i / 4) as u8;
            i += 1;
        }
        data
    };

    static FONT_4X8: Font = Font {
        char_width: 4,
        char_height: 8,
        first_char: b'A',
        data: &GLYPH_DATA,
    };

    fn feed<const N: usize>(tb: &mut TextBox<N>, text: &[u8]) {
        for &c in text {
            tb.buffer.append(c);
        }
        tb.updated = true;
    }

    /// The glyph cell at (col, line) must be filled with `code`.
    fn assert_cell(fb: &Framebuffer<8, 2>, col: usize, line: usize, code: u8) {
        for i in 0..4 {
            assert_eq!(
                fb.pages()[line][col * 4 + i],
                code,
                "cell ({}, {}) column {}",
                col,
                line,
                i
            );
        }
    }

    fn assert_cell_empty(fb: &Framebuffer<8, 2>, col: usize, line: usize) {
        assert_cell(fb, col, line, 0);
    }

    #[test]
    fn test_two_lines_two_columns() {
        // "AB\nCD" in a 2x2 glyph viewport: AB on top, CD below.
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        feed(&mut tb, b"AB\nCD");
        tb.render(&mut fb).unwrap();
        assert_cell(&fb, 0, 0, b'A');
        assert_cell(&fb, 1, 0, b'B');
        assert_cell(&fb, 0, 1, b'C');
        assert_cell(&fb, 1, 1, b'D');
    }

    #[test]
    fn test_long_line_truncates_without_wrapping() {
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        feed(&mut tb, b"ABCD");
        tb.render(&mut fb).unwrap();
        assert_cell(&fb, 0, 0, b'A');
        assert_cell(&fb, 1, 0, b'B');
        // C and D are dropped, nothing spills onto line 1.
        assert_cell_empty(&fb, 0, 1);
        assert_cell_empty(&fb, 1, 1);
    }

    #[test]
    fn test_scrolls_to_last_lines() {
        // Four one-character lines in a two-line viewport: only the
        // last two are visible.
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        feed(&mut tb, b"A\nB\nC\nD");
        tb.render(&mut fb).unwrap();
        assert_cell(&fb, 0, 0, b'C');
        assert_cell(&fb, 0, 1, b'D');
    }

    #[test]
    fn test_line_advance_caps_at_last_row() {
        // More delimiters than rows: rendering keeps going on the last
        // visible row instead of walking off the viewport.
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 8, FONT_4X8);
        feed(&mut tb, b"A\nB");
        tb.render(&mut fb).unwrap();
        assert_cell(&fb, 0, 0, b'B');
        assert_cell_empty(&fb, 0, 1);
    }

    #[test]
    fn test_carriage_return_breaks_forward_but_not_backward() {
        // The backward scan only counts \n, so "AB\rCD" anchors at the
        // oldest character; the forward walk still breaks on \r and
        // the second line overwrites only the columns it covers.
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 8, FONT_4X8);
        feed(&mut tb, b"AB\rC");
        tb.render(&mut fb).unwrap();
        assert_cell(&fb, 0, 0, b'C');
        assert_cell(&fb, 1, 0, b'B');
    }

    #[test]
    fn test_render_offset_viewport() {
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(4, 8, 4, 8, FONT_4X8);
        feed(&mut tb, b"A");
        tb.render(&mut fb).unwrap();
        for i in 0..4 {
            assert_eq!(fb.pages()[1][4 + i], b'A');
        }
        assert_eq!(fb.pages()[0][4], 0);
        assert_eq!(fb.pages()[1][0], 0);
    }

    #[test]
    fn test_dirty_flag_lifecycle() {
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        assert!(!tb.updated());
        tb.process_char(b'A');
        assert!(tb.updated());
        tb.render(&mut fb).unwrap();
        assert!(!tb.updated());
        tb.clear();
        assert!(tb.updated());
    }

    #[test]
    fn test_stored_char_outside_font_reports_invalid_glyph() {
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        tb.process_char(b'z');
        assert_eq!(tb.render(&mut fb), Err(DrawError::InvalidGlyph));
        // The flag stays raised so the owner can retry after a fix.
        assert!(tb.updated());
    }

    #[test]
    fn test_render_empty_buffer_is_blank() {
        let mut fb = Framebuffer::<8, 2>::new();
        let mut tb = TextBox::<32>::new(0, 0, 8, 16, FONT_4X8);
        tb.updated = true;
        tb.render(&mut fb).unwrap();
        assert!(fb.pages().iter().all(|p| p.iter().all(|&b| b == 0)));
        assert!(!tb.updated());
    }
}
