//! The bus interface to the display: queued command/data transactions with
//! an explicit data/command tag per transaction.
//!
//! The controller distinguishes two byte-stream channels with one control
//! line: command bytes (D/C low) and data bytes (D/C high). A transaction is
//! one burst of bytes on one channel; the D/C line must be at the
//! transaction's level strictly before its first clock edge and must hold
//! until its last. Implementations that execute asynchronously (DMA, an
//! interrupt-driven queue) surface that through the `nb` return types:
//! `submit` reports a full queue and `drain` reports a still-executing
//! transaction as `WouldBlock`.

use crate::config::Config;
use crate::error::Error;

/// Which channel a transaction's bytes belong to; drives the D/C line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferKind {
    Command,
    Data,
}

/// One discrete unit of bytes clocked out over the bus.
///
/// The payload is borrowed from the caller for the duration of `submit`
/// only; an implementation that cannot finish (or copy) the bytes within
/// that call must not accept the transaction. The protocol-level rule that a
/// framebuffer may not be mutated while transactions referencing it are
/// undrained is carried by the frame guard in `display::frame`, not here.
#[derive(Clone, Copy, Debug)]
pub struct Transaction<'a> {
    kind: TransferKind,
    bytes: &'a [u8],
}

impl<'a> Transaction<'a> {
    /// A transaction on the command channel.
    pub fn command(bytes: &'a [u8]) -> Self {
        Transaction {
            kind: TransferKind::Command,
            bytes,
        }
    }

    /// A transaction on the data channel.
    pub fn data(bytes: &'a [u8]) -> Self {
        Transaction {
            kind: TransferKind::Data,
            bytes,
        }
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// A display bus with a bounded execution queue.
///
/// Transactions execute on the wire strictly in submission order, and
/// `drain` retires them in that same order, one call per transaction.
pub trait DisplayInterface {
    /// Claim the bus and the device. Called exactly once, by
    /// [`Display::open`](crate::Display::open); failure means the hardware
    /// is misconfigured or owned elsewhere and is reported as
    /// [`Error::ResourceUnavailable`].
    fn acquire(&mut self, config: &Config) -> Result<(), Error>;

    /// Drive the display's reset line. `asserted` means "hold the controller
    /// in reset"; the line itself is active-low on this family.
    fn set_reset(&mut self, asserted: bool) -> Result<(), Error>;

    /// Queue one transaction for execution, driving the D/C line to the
    /// transaction's level before its first clock edge. Returns `WouldBlock`
    /// when the execution queue is full.
    fn submit(&mut self, txn: Transaction<'_>) -> nb::Result<(), Error>;

    /// Retire the oldest submitted transaction. Returns `WouldBlock` while
    /// it is still executing, `Ok` once it has fully left the wire, and an
    /// error (retiring the transaction) if the hardware reported a fault.
    fn drain(&mut self) -> nb::Result<(), Error>;
}

pub mod spi {
    //! The SPI interface supports the "4-wire" wiring of the controller:
    //! SPI mode 0 plus a D/C GPIO as the fourth wire, and the active-low
    //! reset line. Exercised at 1 MHz and 20 MHz bus clocks.

    use embedded_hal as hal;

    use super::{DisplayInterface, Transaction, TransferKind};
    use crate::config::Config;
    use crate::error::Error;

    /// An interface whose transactions are executed by a blocking
    /// embedded-hal SPI write.
    ///
    /// Each transaction has fully left the wire by the time `submit`
    /// returns, so the queue never fills and `drain` only retires
    /// bookkeeping. The queued contract still holds; the pipelined overlap
    /// simply degenerates to zero. `spi` is the SPI master device (mode 0,
    /// chip select managed by the HAL), `dc` the data/command GPIO, and
    /// `rst` the active-low reset GPIO.
    pub struct SpiInterface<SPI, DC, RST> {
        spi: SPI,
        dc: DC,
        rst: RST,
        submitted: usize,
    }

    impl<SPI, DC, RST> SpiInterface<SPI, DC, RST>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: hal::digital::v2::OutputPin,
        RST: hal::digital::v2::OutputPin,
    {
        pub fn new(spi: SPI, dc: DC, rst: RST) -> Self {
            Self {
                spi,
                dc,
                rst,
                submitted: 0,
            }
        }

        /// Give the SPI device and GPIO pins back.
        pub fn release(self) -> (SPI, DC, RST) {
            (self.spi, self.dc, self.rst)
        }
    }

    impl<SPI, DC, RST> DisplayInterface for SpiInterface<SPI, DC, RST>
    where
        SPI: hal::blocking::spi::Write<u8>,
        DC: hal::digital::v2::OutputPin,
        RST: hal::digital::v2::OutputPin,
    {
        fn acquire(&mut self, _config: &Config) -> Result<(), Error> {
            // Claiming the device means proving the control lines can be
            // driven to their idle levels.
            self.rst
                .set_high()
                .map_err(|_| Error::ResourceUnavailable)?;
            self.dc.set_low().map_err(|_| Error::ResourceUnavailable)?;
            self.submitted = 0;
            Ok(())
        }

        fn set_reset(&mut self, asserted: bool) -> Result<(), Error> {
            let result = if asserted {
                self.rst.set_low()
            } else {
                self.rst.set_high()
            };
            result.map_err(|_| Error::TransferFailed)
        }

        fn submit(&mut self, txn: Transaction<'_>) -> nb::Result<(), Error> {
            match txn.kind() {
                TransferKind::Command => self.dc.set_low(),
                TransferKind::Data => self.dc.set_high(),
            }
            .map_err(|_| Error::TransferFailed)?;
            self.spi
                .write(txn.bytes())
                .map_err(|_| Error::TransferFailed)?;
            self.submitted += 1;
            Ok(())
        }

        fn drain(&mut self) -> nb::Result<(), Error> {
            if self.submitted == 0 {
                return Err(nb::Error::Other(Error::InvalidUsage));
            }
            self.submitted -= 1;
            Ok(())
        }
    }
}

#[cfg(test)]
pub mod test_spy {
    //! An interface for unit tests: spies on every byte and reset edge, and
    //! simulates the bounded execution queue of an asynchronous backend,
    //! including delayed completions and injected faults.

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::{DisplayInterface, Transaction, TransferKind};
    use crate::config::Config;
    use crate::error::Error;

    /// One transaction as observed on the wire.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Sent {
        Cmd(Vec<u8>),
        Data(Vec<u8>),
    }

    struct SpyCore {
        sent: Vec<Sent>,
        resets: Vec<bool>,
        /// Remaining completion polls for each in-flight transaction, oldest
        /// first.
        queue: VecDeque<u32>,
        queue_depth: usize,
        /// Completion polls a transaction needs before it retires. 0 models
        /// a bus that is always done by drain time.
        lag: u32,
        max_in_flight: usize,
        acquired: bool,
        fail_acquire: bool,
        /// Countdown to an injected submit fault: `Some(1)` fails the next
        /// accepted submit.
        fail_submit_in: Option<usize>,
        /// Countdown to an injected completion fault: `Some(1)` fails the
        /// next retiring transaction.
        fail_drain_in: Option<usize>,
    }

    pub struct TestSpyInterface {
        core: Rc<RefCell<SpyCore>>,
    }

    impl TestSpyInterface {
        pub fn new() -> Self {
            TestSpyInterface {
                core: Rc::new(RefCell::new(SpyCore {
                    sent: Vec::new(),
                    resets: Vec::new(),
                    queue: VecDeque::new(),
                    queue_depth: 16,
                    lag: 0,
                    max_in_flight: 0,
                    acquired: false,
                    fail_acquire: false,
                    fail_submit_in: None,
                    fail_drain_in: None,
                })),
            }
        }

        /// A second handle onto the same spy, so the test keeps visibility
        /// after giving one handle to the display.
        pub fn split(&self) -> Self {
            TestSpyInterface {
                core: self.core.clone(),
            }
        }

        pub fn set_lag(&self, polls: u32) {
            self.core.borrow_mut().lag = polls;
        }

        pub fn refuse_acquire(&self) {
            self.core.borrow_mut().fail_acquire = true;
        }

        /// Make the `nth` submit from now report a hardware fault.
        pub fn fail_submit_in(&self, nth: usize) {
            self.core.borrow_mut().fail_submit_in = Some(nth);
        }

        /// Make the `nth` retiring transaction from now report a hardware
        /// fault.
        pub fn fail_drain_in(&self, nth: usize) {
            self.core.borrow_mut().fail_drain_in = Some(nth);
        }

        pub fn clear(&self) {
            self.core.borrow_mut().sent.clear();
        }

        /// Transactions submitted but not yet retired.
        pub fn in_flight(&self) -> usize {
            self.core.borrow().queue.len()
        }

        /// High-water mark of the queue; 16 proves a whole frame was
        /// submitted before any completion was drained.
        pub fn max_in_flight(&self) -> usize {
            self.core.borrow().max_in_flight
        }

        pub fn resets(&self) -> Vec<bool> {
            self.core.borrow().resets.clone()
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.core.borrow().sent.clone()
        }

        pub fn check_multi(&self, expected: &[Sent]) {
            assert_eq!(self.core.borrow().sent[..], expected[..]);
        }
    }

    impl DisplayInterface for TestSpyInterface {
        fn acquire(&mut self, config: &Config) -> Result<(), Error> {
            let mut core = self.core.borrow_mut();
            if core.fail_acquire {
                return Err(Error::ResourceUnavailable);
            }
            core.queue_depth = config.queue_depth;
            core.acquired = true;
            Ok(())
        }

        fn set_reset(&mut self, asserted: bool) -> Result<(), Error> {
            self.core.borrow_mut().resets.push(asserted);
            Ok(())
        }

        fn submit(&mut self, txn: Transaction<'_>) -> nb::Result<(), Error> {
            let mut core = self.core.borrow_mut();
            assert!(core.acquired, "interface used before acquire");
            if core.queue.len() >= core.queue_depth {
                return Err(nb::Error::WouldBlock);
            }
            match core.fail_submit_in {
                Some(1) => {
                    core.fail_submit_in = None;
                    return Err(nb::Error::Other(Error::TransferFailed));
                }
                Some(n) => core.fail_submit_in = Some(n - 1),
                None => (),
            }
            let record = match txn.kind() {
                TransferKind::Command => Sent::Cmd(txn.bytes().to_vec()),
                TransferKind::Data => Sent::Data(txn.bytes().to_vec()),
            };
            core.sent.push(record);
            let lag = core.lag;
            core.queue.push_back(lag);
            core.max_in_flight = core.max_in_flight.max(core.queue.len());
            Ok(())
        }

        fn drain(&mut self) -> nb::Result<(), Error> {
            let mut core = self.core.borrow_mut();
            {
                let polls = match core.queue.front_mut() {
                    None => return Err(nb::Error::Other(Error::InvalidUsage)),
                    Some(polls) => polls,
                };
                if *polls > 0 {
                    *polls -= 1;
                    return Err(nb::Error::WouldBlock);
                }
            }
            core.queue.pop_front();
            match core.fail_drain_in {
                Some(1) => {
                    core.fail_drain_in = None;
                    Err(nb::Error::Other(Error::TransferFailed))
                }
                Some(n) => {
                    core.fail_drain_in = Some(n - 1);
                    Ok(())
                }
                None => Ok(()),
            }
        }
    }
}
