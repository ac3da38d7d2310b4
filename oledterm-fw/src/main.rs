//! oledterm firmware
//!
//! A Raspberry Pi Pico enumerates as a USB CDC serial port and scrolls
//! everything typed into it on a 128x64 SSD1306 OLED. Incoming bytes
//! are echoed back in hex and fed into the text box's scrollback ring;
//! the display task re-renders and flushes the panel whenever the
//! widget is dirty.

#![no_std]
#![no_main]

mod font;
mod ssd1306;

use core::fmt::Write as _;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C1, USB};
use embassy_rp::usb::{self, Driver};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::UsbDevice;
use heapless::String;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use oledterm_core::TextBox;

use crate::font::FONT_6X8;
use crate::ssd1306::{Ssd1306, HEIGHT, WIDTH};

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => usb::InterruptHandler<USB>;
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
});

/// Scrollback capacity: several screenfuls of the 21x8 character grid
const TEXT_BUF_LEN: usize = 512;

/// Characters from the USB task to the display task
static INPUT: Channel<CriticalSectionRawMutex, u8, 64> = Channel::new();

static USB_STATE: StaticCell<State> = StaticCell::new();
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("oledterm starting...");

    let p = embassy_rp::init(Default::default());

    // I2C1 on GP2 (SDA) / GP3 (SCL)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_async(p.I2C1, p.PIN_3, p.PIN_2, Irqs, i2c_config);

    let mut display = Ssd1306::new(i2c, false);
    match display.init().await {
        Ok(()) => info!("SSD1306 initialized"),
        Err(e) => error!("display init failed: {:?}", e),
    }
    display.framebuffer().clear();
    if let Err(e) = display.show().await {
        warn!("initial flush failed: {:?}", e);
    }

    // USB CDC-ACM serial port
    let usb_driver = Driver::new(p.USB, Irqs);
    let mut usb_config = embassy_usb::Config::new(0xc0de, 0xcafe);
    usb_config.manufacturer = Some("oledterm");
    usb_config.product = Some("oledterm serial display");
    usb_config.serial_number = Some("0001");
    usb_config.max_packet_size_0 = 64;

    let mut builder = embassy_usb::Builder::new(
        usb_driver,
        usb_config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUF.init([0; 64]),
    );
    let class = CdcAcmClass::new(&mut builder, USB_STATE.init(State::new()), 64);
    let usb = builder.build();

    spawner.spawn(usb_task(usb)).unwrap();
    spawner.spawn(cdc_task(class)).unwrap();
    spawner.spawn(display_task(display)).unwrap();

    info!("All tasks spawned");
}

/// USB device task - runs enumeration and transfers
#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, Driver<'static, USB>>) -> ! {
    usb.run().await
}

/// USB serial task - reconnects the echo loop across host sessions
#[embassy_executor::task]
async fn cdc_task(mut class: CdcAcmClass<'static, Driver<'static, USB>>) {
    loop {
        class.wait_connection().await;
        info!("USB host connected");
        let _ = serve(&mut class).await;
        info!("USB host disconnected");
    }
}

struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            // Reads use the full max packet size, so this cannot happen.
            EndpointError::BufferOverflow => defmt::panic!("buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Read CDC packets, echo each byte back in hex, and forward it to the
/// display task.
async fn serve(
    class: &mut CdcAcmClass<'static, Driver<'static, USB>>,
) -> Result<(), Disconnected> {
    let mut buf = [0u8; 64];
    loop {
        let n = class.read_packet(&mut buf).await?;
        for &c in &buf[..n] {
            let mut echo: String<8> = String::new();
            let _ = write!(echo, "0x{:02X} ", c);
            class.write_packet(echo.as_bytes()).await?;
            if c == b'\r' || c == b'\n' {
                class.write_packet(b"\r\n").await?;
            }
            INPUT.send(c).await;
        }
    }
}

/// Display task - drains input into the widget and redraws when dirty
#[embassy_executor::task]
async fn display_task(mut display: Ssd1306<I2c<'static, I2C1, i2c::Async>>) {
    info!("Display task started");

    let mut textbox: TextBox<TEXT_BUF_LEN> = TextBox::new(0, 0, WIDTH, HEIGHT, FONT_6X8);

    loop {
        let c = INPUT.receive().await;
        textbox.process_char(c);
        // Let a burst settle so a single flush covers it.
        Timer::after_millis(10).await;
        while let Ok(c) = INPUT.try_receive() {
            textbox.process_char(c);
        }

        if textbox.updated() {
            display.framebuffer().clear();
            match textbox.render(display.framebuffer()) {
                Ok(()) => {
                    if let Err(e) = display.show().await {
                        warn!("display flush failed: {:?}", e);
                    }
                }
                Err(e) => warn!("render failed: {:?}", e),
            }
        }
    }
}
