//! Refer to datasheet:
//! https://www.mouser.de/datasheet/2/590/doc8784-1385823.pdf
//!
//! Only the commands the driver issues are listed here.

/// Single byte opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Continuous array read, low frequency variant (no dummy bytes).
    ContinuousArrayReadLowFrequency = 0x03,
    /// Main memory page program through buffer 1 with built-in erase.
    PageProgramThroughBuffer1 = 0x82,
    /// Read the 2 byte status register.
    StatusRegisterRead = 0xD7,
    /// Read manufacturer and device ID.
    ManufacturerAndDeviceIdRead = 0x9F,
    DeepPowerDown = 0xB9,
    ResumeFromDeepPowerDown = 0xAB,
    UltraDeepPowerDown = 0x79,
}

/// Fixed 4 byte command sequences. These are destructive or persistent, so
/// they are only ever sent as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sequence {
    /// Erase the entire main memory array.
    ChipErase,
    /// Configure 512 byte ("power of two") pages. Persists across power cycles.
    PowerOfTwoPageSize,
    /// Configure 528 byte ("standard DataFlash") pages. Persists across power cycles.
    StandardPageSize,
    SoftwareReset,
}

impl Sequence {
    pub const fn bytes(self) -> &'static [u8; 4] {
        match self {
            Sequence::ChipErase => &[0xC7, 0x94, 0x80, 0x9A],
            Sequence::PowerOfTwoPageSize => &[0x3D, 0x2A, 0x80, 0xA6],
            Sequence::StandardPageSize => &[0x3D, 0x2A, 0x80, 0xA7],
            Sequence::SoftwareReset => &[0xF0, 0x00, 0x00, 0x00],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_sequences_share_prefix() {
        let binary = Sequence::PowerOfTwoPageSize.bytes();
        let standard = Sequence::StandardPageSize.bytes();
        assert_eq!(binary[..3], standard[..3]);
        assert_ne!(binary[3], standard[3]);
    }

    #[test]
    fn chip_erase_sequence() {
        assert_eq!(Sequence::ChipErase.bytes(), &[0xC7, 0x94, 0x80, 0x9A]);
    }
}
