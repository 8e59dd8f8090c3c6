#![cfg_attr(not(test), no_std)]
//! Platform agnostic driver for the Adesto AT45DB321E serial DataFlash, built on
//! [embedded-hal](https://github.com/rust-embedded/embedded-hal).
//!
//! The device is driven over a SPI bus with explicit chip-select and write-protect
//! lines. Pages are 512 bytes (power-of-two configuration) and are always read and
//! programmed whole. Program operations use the device's built-in erase, so there is
//! no separate page erase step.
//!
//! Both a blocking driver ([`comms::DataFlash`]) and an async driver
//! ([`async_comms::AsyncDataFlash`]) are provided. They track the device power state
//! and refuse to talk to a device that is powered down.
//!
//! The drivers assume a single caller. The bus has no locking, so on a platform with
//! threads or interrupt handlers that also want the flash, wrap the handle in a mutex.
//! Note that a chip erase holds the handle for up to ~80 seconds.

#[macro_use]
mod fmt;

pub mod address;
pub mod async_comms;
pub mod command;
pub mod comms;
pub mod config;
pub mod error;
pub mod identification;
pub mod power;
pub mod status;
pub mod traits;

#[cfg(test)]
mod mock;

pub use address::{pack_page_address, PageAddress, PAGE_COUNT, PAGE_SIZE};
pub use async_comms::AsyncDataFlash;
pub use comms::DataFlash;
pub use config::Config;
pub use error::Error;
pub use identification::{Identification, AT45DB321E_SIGNATURE};
pub use power::PowerState;
pub use status::{PageSize, Status};
pub use traits::{AsyncPageFlash, PageFlash};
