//! The main API to the display driver. It provides the session lifecycle
//! (open, one-time hardware initialization, release), the runtime commands,
//! and, in the `frame` submodule, the pipelined frame transfer path.
//!
//! A session owns the bus interface exclusively, so there is exactly one
//! producer of transactions per display; concurrent sends are ruled out by
//! `&mut self`.


pub mod frame;

use embedded_hal as hal;

use crate::command::{Command, INIT_SEQUENCE};
use crate::config::Config;
use crate::error::Error;
use crate::interface::{DisplayInterface, Transaction};

pub use self::frame::FrameInFlight;

/// Duration of each phase of the reset cycle: the reset line is held
/// asserted at least this long, and the controller is given at least this
/// long to settle after release. A requirement of the panel hardware, not a
/// tunable.
const RESET_PHASE_MS: u16 = 100;

/// A driver session for an SH1106 display.
pub struct Display<DI>
where
    DI: DisplayInterface,
{
    iface: DI,
    config: Config,
    /// Transactions submitted to the interface and not yet retired.
    in_flight: usize,
    initialized: bool,
}

impl<DI> Display<DI>
where
    DI: DisplayInterface,
{
    /// Open a session on the display connected to `iface`, claiming the bus
    /// and device. Fails with [`Error::ResourceUnavailable`] when the claim
    /// fails; that is not retryable until the hardware configuration is
    /// fixed.
    pub fn open(mut iface: DI, config: Config) -> Result<Self, Error> {
        iface.acquire(&config)?;
        #[cfg(feature = "log")]
        log::debug!("display session opened");
        Ok(Display {
            iface,
            config,
            in_flight: 0,
            initialized: false,
        })
    }

    /// Reset and initialize the display: hold /RESET asserted for
    /// [`RESET_PHASE_MS`], release it, wait the same settle time, then issue
    /// the full power-on command sequence. Must complete exactly once before
    /// any frame is sent; a second call is an [`Error::InvalidUsage`].
    pub fn init<D>(&mut self, delay: &mut D) -> Result<(), Error>
    where
        D: hal::blocking::delay::DelayMs<u16>,
    {
        if self.initialized {
            return Err(Error::InvalidUsage);
        }
        self.iface.set_reset(true)?;
        delay.delay_ms(RESET_PHASE_MS);
        self.iface.set_reset(false)?;
        delay.delay_ms(RESET_PHASE_MS);
        for step in INIT_SEQUENCE {
            self.transmit(step.opcode, step.args)?;
        }
        self.initialized = true;
        #[cfg(feature = "log")]
        log::debug!("display initialized");
        Ok(())
    }

    /// Control sleep mode.
    pub fn sleep(&mut self, enabled: bool) -> Result<(), Error> {
        self.command(Command::SetSleepMode(enabled))
    }

    /// Control the contrast current.
    pub fn contrast(&mut self, contrast: u8) -> Result<(), Error> {
        self.command(Command::SetContrast(contrast))
    }

    /// Control luminance inversion.
    pub fn invert(&mut self, enabled: bool) -> Result<(), Error> {
        self.command(Command::SetInverted(enabled))
    }

    /// Set the vertical pan.
    ///
    /// This uses the `Command::SetStartLine` feature to shift which display
    /// RAM row is shown first, "rolling" the image vertically without
    /// touching RAM contents.
    pub fn vertical_pan(&mut self, offset: u8) -> Result<(), Error> {
        self.command(Command::SetStartLine(offset))
    }

    /// Close the session and give the interface back.
    pub fn release(self) -> DI {
        self.iface
    }

    fn command(&mut self, command: Command) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::InvalidUsage);
        }
        let mut arg_buf = [0u8; 1];
        let (opcode, args) = command.encode(&mut arg_buf)?;
        self.transmit(opcode, args)
    }

    /// Send one opcode (command channel) plus its argument bytes (data
    /// channel) through the queue and wait for both to retire.
    fn transmit(&mut self, opcode: u8, args: &[u8]) -> Result<(), Error> {
        let result = self.try_transmit(opcode, args);
        if result.is_err() {
            self.abort_in_flight();
        }
        result
    }

    fn try_transmit(&mut self, opcode: u8, args: &[u8]) -> Result<(), Error> {
        self.submit_backpressured(Transaction::command(&[opcode]))?;
        if !args.is_empty() {
            self.submit_backpressured(Transaction::data(args))?;
        }
        self.drain_all()
    }
}
