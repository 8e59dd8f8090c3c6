/// Driver settings for status polling.
///
/// The device keeps streaming its status register while chip select stays
/// asserted, so the drivers poll inside one transaction and sleep
/// `poll_interval_us` between reads. Elapsed time is accounted from the
/// intervals, with at least 1us per poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub poll_interval_us: u32,
    /// Bound for page program, page size configuration and `wait_ready`.
    pub program_timeout_us: u32,
    /// Bound for chip erase. The datasheet gives up to 80s.
    pub chip_erase_timeout_us: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            poll_interval_us: 10,
            program_timeout_us: 100_000,
            chip_erase_timeout_us: 120_000_000,
        }
    }

    pub const fn with_poll_interval_us(mut self, us: u32) -> Self {
        self.poll_interval_us = us;
        self
    }

    pub const fn with_program_timeout_us(mut self, us: u32) -> Self {
        self.program_timeout_us = us;
        self
    }

    pub const fn with_chip_erase_timeout_us(mut self, us: u32) -> Self {
        self.chip_erase_timeout_us = us;
        self
    }

    /// Time charged against the timeout per unsuccessful poll.
    pub(crate) const fn poll_step_us(&self) -> u32 {
        if self.poll_interval_us == 0 {
            1
        } else {
            self.poll_interval_us
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
