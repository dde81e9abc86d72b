//! Full example code for driving an SH1106 display. This runs on an
//! STM32F303RE with the display on SPI1, PA8 for D/C, and PA9 for /RESET,
//! and animates Conway's Game of Life double-buffered: while one generation
//! is clocking out to the panel, the next one is computed into the other
//! framebuffer.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_halt as _;

use cortex_m_rt::entry;
use stm32f3xx_hal::{delay::Delay, pac, prelude::*, spi::Spi};

use sh1106::{consts, Config, Display, Framebuffer, SpiInterface};

/// One Game of Life step on the framebuffer's torus: the wrap-around pixel
/// addressing makes the neighbor lookups boundary-free.
fn step_life(current: &Framebuffer, next: &mut Framebuffer) {
    for y in 0..consts::NUM_PIXEL_ROWS {
        for x in 0..consts::NUM_PIXEL_COLS {
            let mut neighbors = 0;
            for dy in [consts::NUM_PIXEL_ROWS - 1, 0, 1] {
                for dx in [consts::NUM_PIXEL_COLS - 1, 0, 1] {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if current.get_pixel(x + dx, y + dy) {
                        neighbors += 1;
                    }
                }
            }
            let alive = match (current.get_pixel(x, y), neighbors) {
                (true, 2) | (_, 3) => true,
                _ => false,
            };
            next.set_pixel(x, y, alive);
        }
    }
}

/// An acorn: seven cells that take a long time to settle.
fn seed(fb: &mut Framebuffer) {
    for &(x, y) in &[(61, 30), (63, 31), (60, 32), (61, 32), (64, 32), (65, 32), (66, 32)] {
        fb.set_pixel(x, y, true);
    }
}

#[entry]
fn main() -> ! {
    // Get peripherals and set up the clocks.
    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();

    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.acr);
    let mut delay = Delay::new(cp.SYST, clocks);

    // Get GPIO A where the display is connected.
    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);

    // Set up SPI1, which is Alternate Function 5 for GPIOs PA5,6,7.
    let disp_sck = gpioa.pa5.into_af5(&mut gpioa.moder, &mut gpioa.afrl);
    let disp_miso = gpioa.pa6.into_af5(&mut gpioa.moder, &mut gpioa.afrl);
    let disp_mosi = gpioa.pa7.into_af5(&mut gpioa.moder, &mut gpioa.afrl);

    let disp_spi = Spi::spi1(
        dp.SPI1,
        (disp_sck, disp_miso, disp_mosi),
        embedded_hal::spi::MODE_0,
        20.mhz(),
        clocks,
        &mut rcc.apb2,
    );

    // PA8 is the D/C push-pull output (the fourth "wire"), PA9 the
    // display's /RESET; both are driven by the driver itself.
    let disp_dc = gpioa
        .pa8
        .into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);
    let disp_rst = gpioa
        .pa9
        .into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);

    // Open the session and run the one-time reset + init sequence.
    let mut disp = Display::open(
        SpiInterface::new(disp_spi, disp_dc, disp_rst),
        Config::new(),
    )
    .unwrap();
    disp.init(&mut delay).unwrap();

    // A short splash: checkerboard of 8x8 tiles, drawn with rectangle fills.
    let mut current = Framebuffer::new();
    let mut next = Framebuffer::new();
    for tile_y in 0..consts::NUM_PIXEL_ROWS / 8 {
        for tile_x in 0..consts::NUM_PIXEL_COLS / 8 {
            if (tile_x + tile_y) % 2 == 0 {
                current.set_rect(tile_x * 8, tile_y * 8, 8, 8);
            }
        }
    }
    disp.send_frame(&current).unwrap();
    delay.delay_ms(1000u16);

    current = Framebuffer::new();
    seed(&mut current);

    loop {
        // Generation N streams out while generation N+1 is computed into
        // the back buffer; `wait` holds the frame-vs-mutation ordering.
        let frame = disp.begin_frame(&current).unwrap();
        step_life(frame.framebuffer(), &mut next);
        frame.wait().unwrap();
        core::mem::swap(&mut current, &mut next);
        delay.delay_ms(50u16);
    }
}
