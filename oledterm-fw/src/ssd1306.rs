//! SSD1306 OLED display driver
//!
//! Drives a 128x64 SSD1306 module over I2C. Drawing happens in the
//! owned [`Framebuffer`]; [`Ssd1306::show`] pushes the whole buffer to
//! the controller in one bulk data transfer using horizontal
//! addressing mode.

use oledterm_core::Framebuffer;

/// SSD1306 I2C address (typically 0x3C or 0x3D)
const SSD1306_ADDR: u8 = 0x3C;

/// Control byte selecting the command register
const CTRL_COMMAND: u8 = 0x00;
/// Control byte selecting the data register
const CTRL_DATA: u8 = 0x40;

/// Display dimensions
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
pub const PAGES: usize = HEIGHT / 8;

/// SSD1306 commands
#[allow(dead_code)]
mod cmd {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_ENTIRE_ON: u8 = 0xA4;
    pub const SET_NORM_INV: u8 = 0xA6;
    pub const SET_DISP: u8 = 0xAE;
    pub const SET_MEM_ADDR: u8 = 0x20;
    pub const SET_COL_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_DISP_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA0;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_COM_OUT_DIR: u8 = 0xC0;
    pub const SET_DISP_OFFSET: u8 = 0xD3;
    pub const SET_COM_PIN_CFG: u8 = 0xDA;
    pub const SET_DISP_CLK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DESEL: u8 = 0xDB;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// SSD1306 driver owning the framebuffer and the bulk transfer buffer.
pub struct Ssd1306<I2C> {
    i2c: I2C,
    fb: Framebuffer<WIDTH, PAGES>,
    /// Framebuffer bytes prefixed with the data control byte, kept
    /// around so `show` sends one contiguous transfer.
    txbuf: [u8; WIDTH * PAGES + 1],
    external_vcc: bool,
}

impl<I2C> Ssd1306<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    /// Create a new driver. `external_vcc` selects the charge pump and
    /// precharge settings for externally powered panels.
    pub fn new(i2c: I2C, external_vcc: bool) -> Self {
        Self {
            i2c,
            fb: Framebuffer::new(),
            txbuf: [0; WIDTH * PAGES + 1],
            external_vcc,
        }
    }

    /// The drawing surface.
    pub fn framebuffer(&mut self) -> &mut Framebuffer<WIDTH, PAGES> {
        &mut self.fb
    }

    /// Send a single command byte.
    async fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.i2c.write(SSD1306_ADDR, &[CTRL_COMMAND, cmd]).await
    }

    /// Run the power-on sequence and leave the panel on in horizontal
    /// addressing mode.
    pub async fn init(&mut self) -> Result<(), I2C::Error> {
        let charge_pump: u8 = if self.external_vcc { 0x10 } else { 0x14 };
        let precharge: u8 = if self.external_vcc { 0x22 } else { 0xF1 };
        let com_pin_cfg: u8 = if WIDTH > 2 * HEIGHT { 0x02 } else { 0x12 };

        let init_cmds: &[u8] = &[
            cmd::SET_DISP,
            // timing and driving scheme
            cmd::SET_DISP_CLK_DIV,
            0x80,
            cmd::SET_MUX_RATIO,
            (HEIGHT - 1) as u8,
            cmd::SET_DISP_OFFSET,
            0x00,
            // resolution and layout
            cmd::SET_DISP_START_LINE,
            // charge pump
            cmd::SET_CHARGE_PUMP,
            charge_pump,
            cmd::SET_SEG_REMAP | 0x01,   // column addr 127 mapped to SEG0
            cmd::SET_COM_OUT_DIR | 0x08, // scan from COM[N] to COM0
            cmd::SET_COM_PIN_CFG,
            com_pin_cfg,
            // display
            cmd::SET_CONTRAST,
            0xFF,
            cmd::SET_PRECHARGE,
            precharge,
            cmd::SET_VCOM_DESEL,
            0x30,
            cmd::SET_ENTIRE_ON, // output follows RAM contents
            cmd::SET_NORM_INV,  // not inverted
            cmd::SET_DISP | 0x01,
            // address setting
            cmd::SET_MEM_ADDR,
            0x00, // horizontal
        ];

        for &c in init_cmds {
            self.command(c).await?;
        }

        Ok(())
    }

    /// Flush the framebuffer to the panel.
    ///
    /// On failure the framebuffer is untouched; calling again resends
    /// the full buffer.
    pub async fn show(&mut self) -> Result<(), I2C::Error> {
        // Narrow panels sit centered in the controller's 128-column RAM.
        let col_offset: u8 = if WIDTH == 64 { 32 } else { 0 };
        let window: [u8; 6] = [
            cmd::SET_COL_ADDR,
            col_offset,
            col_offset + (WIDTH - 1) as u8,
            cmd::SET_PAGE_ADDR,
            0,
            (PAGES - 1) as u8,
        ];
        for &c in window.iter() {
            self.command(c).await?;
        }

        self.txbuf[0] = CTRL_DATA;
        for (page, data) in self.fb.pages().iter().enumerate() {
            let start = 1 + page * WIDTH;
            self.txbuf[start..start + WIDTH].copy_from_slice(data);
        }
        self.i2c.write(SSD1306_ADDR, &self.txbuf).await
    }

    /// Turn the panel off (contents retained).
    #[allow(dead_code)]
    pub async fn poweroff(&mut self) -> Result<(), I2C::Error> {
        self.command(cmd::SET_DISP).await
    }

    /// Turn the panel back on.
    #[allow(dead_code)]
    pub async fn poweron(&mut self) -> Result<(), I2C::Error> {
        self.command(cmd::SET_DISP | 0x01).await
    }

    /// Set panel contrast (0-255).
    #[allow(dead_code)]
    pub async fn contrast(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.command(cmd::SET_CONTRAST).await?;
        self.command(value).await
    }

    /// Invert panel colors.
    #[allow(dead_code)]
    pub async fn invert(&mut self, inverted: bool) -> Result<(), I2C::Error> {
        self.command(cmd::SET_NORM_INV | inverted as u8).await
    }
}
