/// Bytes per page in the power-of-two configuration.
pub const PAGE_SIZE: usize = 512;
/// Number of pages of the AT45DB321E.
pub const PAGE_COUNT: u16 = 8192;

/// Packs a page number into the three address bytes of a read/program frame.
///
/// The page number occupies address bits A21..A9: the top 6 bits go into the first
/// byte and the next 7 bits into the upper part of the second byte. The third byte
/// is the in-page offset, which the continuous read at this command variant does
/// not need. The low byte of the page number is sent there anyway, so existing
/// devices see exactly the frames they always have.
///
/// No range check is done; see [`PageAddress::new`].
pub const fn pack_page_address(page: u16) -> [u8; 3] {
    [
        ((page >> 7) & 0x3F) as u8,
        ((page << 1) & 0xFE) as u8,
        (page & 0xFF) as u8,
    ]
}

/// A page number known to be within the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageAddress(u16);

impl PageAddress {
    /// Returns `None` if `page` is not below [`PAGE_COUNT`].
    pub const fn new(page: u16) -> Option<Self> {
        if page < PAGE_COUNT {
            Some(Self(page))
        } else {
            None
        }
    }

    pub const fn page(self) -> u16 {
        self.0
    }

    pub const fn packed(self) -> [u8; 3] {
        pack_page_address(self.0)
    }
}
