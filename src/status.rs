use core::fmt;

bitflags::bitflags! {
    /// First status register byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatusByte1: u8 {
        /// Device is ready. Cleared while an erase or program is in progress.
        const READY = 1 << 7;
        /// Result of the most recent memory page to buffer compare.
        const COMP = 1 << 6;
        /// Density code, 0b1101 for 32-Mbit.
        const DENSITY = 0b0011_1100;
        /// Sector protection is enabled.
        const PROTECT = 1 << 1;
        /// Set when configured for 512 byte pages, clear for 528 byte pages.
        const PAGE_SIZE = 1 << 0;
    }
}

bitflags::bitflags! {
    /// Second status register byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatusByte2: u8 {
        const READY = 1 << 7;
        /// The last erase or program operation failed.
        const EPE = 1 << 5;
        /// Sector lockdown enabled.
        const SLE = 1 << 3;
        /// Program suspended, buffer 2.
        const PS2 = 1 << 2;
        /// Program suspended, buffer 1.
        const PS1 = 1 << 1;
        /// Erase suspended.
        const ES = 1 << 0;
    }
}

/// Configured page size of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageSize {
    /// 512 byte pages. The only size the page operations of this crate address.
    PowerOfTwo,
    /// 528 byte pages, the factory default.
    Standard,
}

impl PageSize {
    pub const fn bytes(self) -> usize {
        match self {
            PageSize::PowerOfTwo => 512,
            PageSize::Standard => 528,
        }
    }
}

/// The 2 byte status word.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub byte1: StatusByte1,
    pub byte2: StatusByte2,
}

impl Status {
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            byte1: StatusByte1::from_bits_retain(bytes[0]),
            byte2: StatusByte2::from_bits_retain(bytes[1]),
        }
    }

    pub const fn bytes(&self) -> [u8; 2] {
        [self.byte1.bits(), self.byte2.bits()]
    }

    pub fn is_ready(&self) -> bool {
        self.byte1.contains(StatusByte1::READY)
    }

    pub fn page_size(&self) -> PageSize {
        if self.byte1.contains(StatusByte1::PAGE_SIZE) {
            PageSize::PowerOfTwo
        } else {
            PageSize::Standard
        }
    }

    pub fn density(&self) -> u8 {
        (self.byte1 & StatusByte1::DENSITY).bits() >> 2
    }

    /// The last erase or program reported a failure.
    pub fn program_error(&self) -> bool {
        self.byte2.contains(StatusByte2::EPE)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({:#04x}, {:#04x})", self.byte1.bits(), self.byte2.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Status({=u8:#04x}, {=u8:#04x})",
            self.byte1.bits(),
            self.byte2.bits()
        )
    }
}
