//! Power states and the device timings around them. The timings are electrical
//! characteristics of the part: commands issued before they elapse are not
//! rejected by the device, they just return garbage.

use crate::error::Error;

/// Reset line low time.
pub const RESET_PULSE_US: u32 = 10;
/// Wait after releasing reset before the first command.
pub const RESET_SETTLE_US: u32 = 35;
/// tRDPD, resume from deep power-down to standby.
pub const RESUME_DEEP_POWER_DOWN_US: u32 = 35;
/// tCSLU, minimum chip select low time to leave ultra-deep power-down.
pub const CS_LOW_ULTRA_DEEP_WAKE_NS: u32 = 20;
/// tXUDPD, ultra-deep power-down exit to standby.
pub const RESUME_ULTRA_DEEP_POWER_DOWN_US: u32 = 180;
/// tSWRST, software reset time.
pub const SOFTWARE_RESET_US: u32 = 35;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    #[default]
    Active,
    DeepPowerDown,
    /// Buffer contents are lost in this state.
    UltraDeepPowerDown,
}

impl PowerState {
    /// Fails with [`Error::WrongPowerState`] unless `self` is `expected`.
    pub(crate) fn require<S, P>(self, expected: PowerState) -> Result<(), Error<S, P>> {
        if self == expected {
            Ok(())
        } else {
            warn!("Flash is in {:?}, {:?} required", self, expected);
            Err(Error::WrongPowerState {
                expected,
                actual: self,
            })
        }
    }
}
