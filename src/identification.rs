/// Manufacturer and device ID bytes of the AT45DB321E.
pub const AT45DB321E_SIGNATURE: [u8; 3] = [0x1F, 0x27, 0x01];

/// The 5 bytes returned by the manufacturer and device ID read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identification {
    /// JEDEC manufacturer ID, 0x1F for Adesto.
    pub manufacturer_id: u8,
    /// Family/density and sub-code/product version.
    pub device_id: [u8; 2],
    /// Extended device information string length, followed by its first byte.
    pub extended: [u8; 2],
}

impl Identification {
    pub const fn from_bytes(bytes: [u8; 5]) -> Self {
        Self {
            manufacturer_id: bytes[0],
            device_id: [bytes[1], bytes[2]],
            extended: [bytes[3], bytes[4]],
        }
    }

    pub const fn bytes(&self) -> [u8; 5] {
        [
            self.manufacturer_id,
            self.device_id[0],
            self.device_id[1],
            self.extended[0],
            self.extended[1],
        ]
    }

    /// Compares manufacturer and device ID against `signature`. The extended
    /// bytes are not part of the signature.
    pub fn matches(&self, signature: &[u8; 3]) -> bool {
        self.manufacturer_id == signature[0] && self.device_id == [signature[1], signature[2]]
    }
}
