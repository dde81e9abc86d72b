//! Frame transfer scheduling.
//!
//! One frame is a fixed batch of 16 transactions: for each of the 8 pages,
//! a 3-byte addressing preamble on the command channel, then the page's 128
//! bytes on the data channel. The whole batch is submitted before any
//! completion is drained, so a queued backend can clock out the first pages
//! while the later ones are still being queued and, with two framebuffers,
//! while the producer computes the next frame.

use itertools::izip;

use crate::command::page_cursor;
use crate::display::Display;
use crate::error::Error;
use crate::framebuffer::Framebuffer;
use crate::interface::{DisplayInterface, Transaction};

impl<DI> Display<DI>
where
    DI: DisplayInterface,
{
    /// Transfer one frame to the display.
    ///
    /// Synchronous: returns only once every transaction of the frame has
    /// been retired, so the framebuffer may be mutated freely afterwards.
    /// On an error the frame is dropped whole (the panel keeps showing the
    /// last successful frame) and the session remains usable.
    pub fn send_frame(&mut self, framebuffer: &Framebuffer) -> Result<(), Error> {
        self.begin_frame(framebuffer)?.wait()
    }

    /// Submit a whole frame and return while it may still be clocking out.
    ///
    /// The pipelined variant of [`send_frame`](Display::send_frame): the
    /// returned guard keeps a shared borrow of `framebuffer`, so the caller
    /// can go on to compute the next generation into a *different* buffer
    /// while this one drains, but cannot mutate this one until
    /// [`FrameInFlight::wait`] (or the guard's drop) has retired every
    /// transaction referencing it.
    pub fn begin_frame<'buf>(
        &mut self,
        framebuffer: &'buf Framebuffer,
    ) -> Result<FrameInFlight<'_, 'buf, DI>, Error> {
        if !self.initialized {
            return Err(Error::InvalidUsage);
        }
        // Frames must not interleave: anything left over from an earlier
        // frame that failed to retire fully is drained before this frame
        // may submit.
        self.drain_all()?;
        match self.submit_frame(framebuffer) {
            Ok(()) => Ok(FrameInFlight {
                display: self,
                framebuffer,
            }),
            Err(e) => {
                self.abort_in_flight();
                Err(e)
            }
        }
    }

    /// Queue the fixed batch for one frame. The bus executes transactions
    /// in submission order, which is what puts each addressing preamble on
    /// the wire ahead of its page data.
    fn submit_frame(&mut self, framebuffer: &Framebuffer) -> Result<(), Error> {
        for (page, data) in izip!(0u8.., framebuffer.pages()) {
            let preamble = page_cursor(page);
            self.submit_backpressured(Transaction::command(&preamble))?;
            self.submit_backpressured(Transaction::data(data))?;
        }
        #[cfg(feature = "log")]
        log::trace!("frame submitted, {} transactions in flight", self.in_flight);
        Ok(())
    }

    /// Submit one transaction; when the execution queue is full, retire the
    /// oldest in-flight transaction to make room and try again.
    pub(crate) fn submit_backpressured(&mut self, txn: Transaction<'_>) -> Result<(), Error> {
        loop {
            match self.iface.submit(txn) {
                Ok(()) => {
                    self.in_flight += 1;
                    return Ok(());
                }
                Err(nb::Error::WouldBlock) => self.drain_one()?,
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
    }

    /// Wait for the oldest in-flight transaction to retire, within the
    /// configured per-transaction poll budget.
    pub(crate) fn drain_one(&mut self) -> Result<(), Error> {
        let mut budget = self.config.poll_budget;
        loop {
            match self.iface.drain() {
                Ok(()) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    return Ok(());
                }
                Err(nb::Error::WouldBlock) => {
                    if let Some(remaining) = budget.as_mut() {
                        if *remaining == 0 {
                            return Err(Error::TimedOut);
                        }
                        *remaining -= 1;
                    }
                }
                Err(nb::Error::Other(e)) => {
                    // The interface retires a transaction when it reports
                    // that transaction's failure.
                    self.in_flight = self.in_flight.saturating_sub(1);
                    return Err(e);
                }
            }
        }
    }

    pub(crate) fn drain_all(&mut self) -> Result<(), Error> {
        while self.in_flight > 0 {
            self.drain_one()?;
        }
        Ok(())
    }

    /// Best-effort retirement of everything outstanding after a failure, so
    /// that no submitted transaction still references caller memory when the
    /// error is reported. A completion that itself fails is already retired
    /// and draining continues; a completion that times out leaves the
    /// remainder recorded in `in_flight`, to be drained before the next
    /// frame may submit.
    pub(crate) fn abort_in_flight(&mut self) {
        if self.in_flight == 0 {
            return;
        }
        #[cfg(feature = "log")]
        log::warn!(
            "aborting frame with {} transactions in flight",
            self.in_flight
        );
        while self.in_flight > 0 {
            match self.drain_one() {
                Ok(()) | Err(Error::TransferFailed) => {}
                Err(_) => break,
            }
        }
    }
}

/// A frame whose transactions may still be executing.
///
/// While the guard lives, the framebuffer it was built from is borrowed
/// shared: it can be read (for example by the simulation step that computes
/// the next generation from it) but not mutated. `wait` reports the transfer
/// result; merely dropping the guard also drains, discarding any error.
pub struct FrameInFlight<'di, 'buf, DI>
where
    DI: DisplayInterface,
{
    display: &'di mut Display<DI>,
    framebuffer: &'buf Framebuffer,
}

impl<'di, 'buf, DI> FrameInFlight<'di, 'buf, DI>
where
    DI: DisplayInterface,
{
    /// The buffer in flight, readable while it drains.
    pub fn framebuffer(&self) -> &'buf Framebuffer {
        self.framebuffer
    }

    /// Block until every transaction of this frame has retired, then give
    /// the framebuffer back to the producer for mutation.
    pub fn wait(self) -> Result<(), Error> {
        let mut this = core::mem::ManuallyDrop::new(self);
        let result = this.display.drain_all();
        if result.is_err() {
            this.display.abort_in_flight();
        }
        result
    }
}

impl<'di, 'buf, DI> Drop for FrameInFlight<'di, 'buf, DI>
where
    DI: DisplayInterface,
{
    fn drop(&mut self) {
        self.display.abort_in_flight();
    }
}
