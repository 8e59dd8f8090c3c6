use core::fmt::{self, Debug, Display};

use crate::identification::Identification;
use crate::power::PowerState;
use crate::status::Status;

/// The error type used by this library.
///
/// This can encapsulate an SPI or GPIO error, and adds its own protocol errors
/// on top of that. `S` is the SPI bus error and `P` the error of the chip-select,
/// write-protect and reset pins.
pub enum Error<S, P> {
    /// An SPI transfer failed. HALs report bus stalls and timeouts here.
    Spi(S),
    /// Driving chip-select, write-protect or reset failed.
    Pin(P),
    /// The device stayed busy for longer than the configured bound. For a program
    /// this leaves the page contents undefined.
    DeviceNotReady {
        /// Last status word read before giving up.
        status: Status,
    },
    /// The operation is not allowed in the current power state. Nothing was sent.
    WrongPowerState {
        expected: PowerState,
        actual: PowerState,
    },
    /// The page number is not below [`PAGE_COUNT`](crate::PAGE_COUNT). Nothing was sent.
    AddressOutOfRange { page: u16 },
    /// A page size configuration completed but the status word still reports the
    /// other page size.
    PageSizeNotApplied {
        /// Status word read after the configuration.
        status: Status,
    },
    /// The ID read back does not carry the expected signature.
    IdentityMismatch { found: Identification },
}

#[cfg(feature = "defmt")]
impl<S, P> defmt::Format for Error<S, P> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::Spi(_) => defmt::write!(fmt, "Error::Spi"),
            Error::Pin(_) => defmt::write!(fmt, "Error::Pin"),
            Error::DeviceNotReady { status } => {
                defmt::write!(fmt, "Error::DeviceNotReady({})", status)
            }
            Error::WrongPowerState { expected, actual } => defmt::write!(
                fmt,
                "Error::WrongPowerState(expected {}, actual {})",
                expected,
                actual
            ),
            Error::AddressOutOfRange { page } => {
                defmt::write!(fmt, "Error::AddressOutOfRange({=u16})", page)
            }
            Error::PageSizeNotApplied { status } => {
                defmt::write!(fmt, "Error::PageSizeNotApplied({})", status)
            }
            Error::IdentityMismatch { found } => {
                defmt::write!(fmt, "Error::IdentityMismatch({})", found)
            }
        }
    }
}

impl<S: Debug, P: Debug> Debug for Error<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "Error::Spi({:?})", spi),
            Error::Pin(pin) => write!(f, "Error::Pin({:?})", pin),
            Error::DeviceNotReady { status } => write!(f, "Error::DeviceNotReady({:?})", status),
            Error::WrongPowerState { expected, actual } => write!(
                f,
                "Error::WrongPowerState {{ expected: {:?}, actual: {:?} }}",
                expected, actual
            ),
            Error::AddressOutOfRange { page } => write!(f, "Error::AddressOutOfRange({})", page),
            Error::PageSizeNotApplied { status } => {
                write!(f, "Error::PageSizeNotApplied({:?})", status)
            }
            Error::IdentityMismatch { found } => write!(f, "Error::IdentityMismatch({:?})", found),
        }
    }
}

impl<S: Debug, P: Debug> Display for Error<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Spi(spi) => write!(f, "SPI transfer failed: {:?}", spi),
            Error::Pin(pin) => write!(f, "control pin failed: {:?}", pin),
            Error::DeviceNotReady { status } => {
                write!(f, "flash did not become ready, last {:?}", status)
            }
            Error::WrongPowerState { expected, actual } => write!(
                f,
                "flash is in {:?} but the operation needs {:?}",
                actual, expected
            ),
            Error::AddressOutOfRange { page } => write!(f, "page {} is out of range", page),
            Error::PageSizeNotApplied { status } => {
                write!(f, "page size configuration did not apply, {:?}", status)
            }
            Error::IdentityMismatch { found } => {
                write!(f, "unexpected flash ID {:02x?}", found.bytes())
            }
        }
    }
}
