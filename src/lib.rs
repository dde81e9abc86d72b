//! Driver library for the SH1106 dot matrix OLED display driver.
//!
//! The display is wired "4-wire": SPI mode 0 plus a data/command select GPIO,
//! with an active-low reset line. Frames are 128x64 at 1 bit per pixel,
//! mirrored in a [`Framebuffer`] with the controller's paged memory layout
//! and streamed as a fixed batch of 16 queued transactions per frame: an
//! addressing command and a 128-byte data burst for each of the 8 pages. The
//! whole batch is submitted before any completion is drained, so queued
//! (DMA-style) interface implementations overlap the wire transfer with
//! preparing later transactions, and [`Display::begin_frame`] extends that
//! overlap across the producer's computation of the next frame.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod command;
pub mod config;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod interface;

// Re-exports for primary API.
pub use command::consts;
pub use config::Config;
pub use display::{Display, FrameInFlight};
pub use error::Error;
pub use framebuffer::Framebuffer;
pub use interface::spi::SpiInterface;
pub use interface::{DisplayInterface, Transaction, TransferKind};
