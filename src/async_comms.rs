//! Async driver. Same behaviour as [`DataFlash`](crate::comms::DataFlash), over
//! `embedded-hal-async` buses and delays. The control lines stay blocking
//! `OutputPin`s.
use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiBus;

use crate::address::{PageAddress, PAGE_COUNT, PAGE_SIZE};
use crate::command::{Opcode, Sequence};
use crate::config::Config;
use crate::error::Error;
use crate::identification::Identification;
use crate::power::{self, PowerState};
use crate::status::{PageSize, Status};
use crate::traits::AsyncPageFlash;

/// AT45DB321E on an async SPI bus with dedicated chip-select and write-protect
/// lines. See [`DataFlash`](crate::comms::DataFlash).
pub struct AsyncDataFlash<SPI, CS, WP, D> {
    spi: SPI,
    cs: CS,
    wp: WP,
    delay: D,
    config: Config,
    power: PowerState,
}

impl<SPI, CS, WP, D> Debug for AsyncDataFlash<SPI, CS, WP, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncDataFlash")
            .field("power", &self.power)
            .field("config", &self.config)
            .finish()
    }
}

impl<SPI, CS, WP, D, P> AsyncDataFlash<SPI, CS, WP, D>
where
    SPI: SpiBus,
    CS: OutputPin<Error = P>,
    WP: OutputPin<Error = P>,
    D: DelayNs,
{
    /// Takes ownership of the bus and control lines and resets the device.
    ///
    /// The reset line is pulsed low for 10us, followed by a 35us settle time
    /// before the first command. The device is assumed to be active afterwards.
    pub async fn init<RST>(
        spi: SPI,
        cs: CS,
        wp: WP,
        reset: &mut RST,
        delay: D,
        config: Config,
    ) -> Result<Self, Error<SPI::Error, P>>
    where
        RST: OutputPin<Error = P>,
    {
        let mut this = Self {
            spi,
            cs,
            wp,
            delay,
            config,
            power: PowerState::Active,
        };
        this.cs.set_high().map_err(Error::Pin)?;
        this.protect()?;

        reset.set_low().map_err(Error::Pin)?;
        this.delay.delay_us(power::RESET_PULSE_US).await;
        reset.set_high().map_err(Error::Pin)?;
        this.delay.delay_us(power::RESET_SETTLE_US).await;

        let status = this.get_status().await?;
        debug!("Initial status: {:?}", status);
        Ok(this)
    }

    /// Gives back the bus, the control lines and the delay.
    pub fn release(self) -> (SPI, CS, WP, D) {
        (self.spi, self.cs, self.wp, self.delay)
    }

    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads the status word once, without waiting for the device.
    pub async fn get_status(&mut self) -> Result<Status, Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.select()?;
        let mut word = [0xFF; 2];
        let result = self
            .write_then_transfer(&[Opcode::StatusRegisterRead as u8], &mut word)
            .await;
        self.finish(result).await?;
        Ok(Status::from_bytes(word))
    }

    /// Polls the status word until the device reports ready and returns the
    /// status from that final poll.
    ///
    /// Gives up with [`Error::DeviceNotReady`] after `program_timeout_us`.
    pub async fn wait_ready(&mut self) -> Result<Status, Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.wait_ready_within(self.config.program_timeout_us).await
    }

    /// Reads the manufacturer and device ID.
    pub async fn get_id(&mut self) -> Result<Identification, Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.select()?;
        let mut buf = [0xFF; 5];
        let result = self
            .write_then_transfer(&[Opcode::ManufacturerAndDeviceIdRead as u8], &mut buf)
            .await;
        self.finish(result).await?;
        Ok(Identification::from_bytes(buf))
    }

    /// Reads the ID and checks manufacturer and device ID against `signature`,
    /// for example [`AT45DB321E_SIGNATURE`](crate::AT45DB321E_SIGNATURE).
    pub async fn verify_id(
        &mut self,
        signature: [u8; 3],
    ) -> Result<Identification, Error<SPI::Error, P>> {
        let id = self.get_id().await?;
        if !id.matches(&signature) {
            warn!("Unexpected flash ID: {:?}", id);
            return Err(Error::IdentityMismatch { found: id });
        }
        Ok(id)
    }

    /// Page size the device is currently configured for.
    pub async fn page_size(&mut self) -> Result<PageSize, Error<SPI::Error, P>> {
        Ok(self.get_status().await?.page_size())
    }

    /// Configures 512 byte pages. This is a one-time setting stored in the device.
    pub async fn configure_power_of_two_page_size(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.configure_page_size(Sequence::PowerOfTwoPageSize).await
    }

    /// Configures 528 byte pages. This is a one-time setting stored in the device.
    pub async fn configure_standard_page_size(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.configure_page_size(Sequence::StandardPageSize).await
    }

    /// Switches the device to 512 byte pages unless it already uses them.
    ///
    /// Returns `true` if the configuration was written. The status word is read
    /// back afterwards; if it still reports 528 byte pages this fails with
    /// [`Error::PageSizeNotApplied`].
    pub async fn ensure_power_of_two_page_size(&mut self) -> Result<bool, Error<SPI::Error, P>> {
        if self.page_size().await? == PageSize::PowerOfTwo {
            return Ok(false);
        }
        self.configure_power_of_two_page_size().await?;
        let status = self.get_status().await?;
        if status.page_size() != PageSize::PowerOfTwo {
            warn!("Page size configuration did not apply: {:?}", status);
            return Err(Error::PageSizeNotApplied { status });
        }
        debug!("Page size now {:?}", status.page_size());
        Ok(true)
    }

    /// Reads a whole page.
    ///
    /// Uses the low frequency continuous array read, which starts at byte 0 of the
    /// page and does not disturb a busy device.
    pub async fn read_page(
        &mut self,
        page: u16,
        buf: &mut [u8; PAGE_SIZE],
    ) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        let address = Self::page_address(page)?;
        let [a0, a1, a2] = address.packed();

        self.select()?;
        buf.fill(0xFF);
        let header = [Opcode::ContinuousArrayReadLowFrequency as u8, a0, a1, a2];
        let result = self.write_then_transfer(&header, buf).await;
        self.finish(result).await?;
        trace!("Read page {}", page);
        Ok(())
    }

    /// Replaces the contents of a whole page.
    ///
    /// The data goes through buffer 1 and the device erases the page before
    /// programming it. Completes once the device is ready again. If that fails the
    /// page contents must be considered corrupt.
    pub async fn write_page(
        &mut self,
        page: u16,
        data: &[u8; PAGE_SIZE],
    ) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        let address = Self::page_address(page)?;
        let [a0, a1, a2] = address.packed();

        self.unprotect()?;
        let header = [Opcode::PageProgramThroughBuffer1 as u8, a0, a1, a2];
        let programmed = match self.program_frame(&header, data).await {
            Ok(()) => self.wait_ready_within(self.config.program_timeout_us).await,
            Err(e) => Err(e),
        };
        let protected = self.protect();
        let status = programmed?;
        protected?;

        if status.program_error() {
            warn!("Page {} program reported an error: {:?}", page, status);
        }
        trace!("Wrote page {}", page);
        Ok(())
    }

    /// Erases the whole array. Takes up to 80 seconds.
    pub async fn erase_chip(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.unprotect()?;
        let erased = match self.command(Sequence::ChipErase.bytes()).await {
            Ok(()) => self
                .wait_ready_within(self.config.chip_erase_timeout_us)
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };
        let protected = self.protect();
        erased?;
        protected?;
        debug!("Chip erased");
        Ok(())
    }

    /// Resets the device through the software reset sequence. An erase or
    /// program in progress is aborted.
    pub async fn software_reset(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.command(Sequence::SoftwareReset.bytes()).await?;
        self.delay.delay_us(power::SOFTWARE_RESET_US).await;
        Ok(())
    }

    /// Enters deep power-down. Only [`resume_deep_power_down`](Self::resume_deep_power_down)
    /// is accepted afterwards.
    pub async fn enter_deep_power_down(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.command(&[Opcode::DeepPowerDown as u8]).await?;
        self.power = PowerState::DeepPowerDown;
        debug!("Flash in deep power-down");
        Ok(())
    }

    /// Leaves deep power-down. Returns once tRDPD has elapsed.
    pub async fn resume_deep_power_down(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::DeepPowerDown)?;
        self.command(&[Opcode::ResumeFromDeepPowerDown as u8]).await?;
        self.delay.delay_us(power::RESUME_DEEP_POWER_DOWN_US).await;
        self.power = PowerState::Active;
        debug!("Flash resumed from deep power-down");
        Ok(())
    }

    /// Enters ultra-deep power-down. Buffer contents are lost.
    pub async fn enter_ultra_deep_power_down(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.command(&[Opcode::UltraDeepPowerDown as u8]).await?;
        self.power = PowerState::UltraDeepPowerDown;
        debug!("Flash in ultra-deep power-down");
        Ok(())
    }

    /// Leaves ultra-deep power-down by pulsing chip select for tCSLU. No opcode is
    /// sent. Returns once tXUDPD has elapsed.
    pub async fn resume_ultra_deep_power_down(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::UltraDeepPowerDown)?;
        self.select()?;
        self.delay.delay_ns(power::CS_LOW_ULTRA_DEEP_WAKE_NS).await;
        self.deselect()?;
        self.delay.delay_us(power::RESUME_ULTRA_DEEP_POWER_DOWN_US).await;
        self.power = PowerState::Active;
        debug!("Flash resumed from ultra-deep power-down");
        Ok(())
    }

    async fn configure_page_size(
        &mut self,
        sequence: Sequence,
    ) -> Result<(), Error<SPI::Error, P>> {
        self.ensure_power(PowerState::Active)?;
        self.command(sequence.bytes()).await?;
        self.wait_ready_within(self.config.program_timeout_us).await?;
        debug!("Page size configured: {:?}", sequence);
        Ok(())
    }

    fn ensure_power(&self, expected: PowerState) -> Result<(), Error<SPI::Error, P>> {
        self.power.require(expected)
    }

    fn page_address(page: u16) -> Result<PageAddress, Error<SPI::Error, P>> {
        PageAddress::new(page).ok_or(Error::AddressOutOfRange { page })
    }

    async fn wait_ready_within(&mut self, timeout_us: u32) -> Result<Status, Error<SPI::Error, P>> {
        self.select()?;
        let result = match self.spi.write(&[Opcode::StatusRegisterRead as u8]).await {
            Ok(()) => self.poll_until_ready(timeout_us).await,
            Err(e) => Err(Error::Spi(e)),
        };
        self.finish(result).await
    }

    async fn poll_until_ready(&mut self, timeout_us: u32) -> Result<Status, Error<SPI::Error, P>> {
        let mut waited_us: u32 = 0;
        loop {
            let mut word = [0xFF; 2];
            self.spi
                .transfer_in_place(&mut word)
                .await
                .map_err(Error::Spi)?;
            let status = Status::from_bytes(word);
            if status.is_ready() {
                return Ok(status);
            }
            if waited_us >= timeout_us {
                warn!("Flash still busy after {}us: {:?}", waited_us, status);
                return Err(Error::DeviceNotReady { status });
            }
            if self.config.poll_interval_us > 0 {
                self.delay.delay_us(self.config.poll_interval_us).await;
            }
            waited_us = waited_us.saturating_add(self.config.poll_step_us());
        }
    }

    async fn write_then_transfer(
        &mut self,
        instruction: &[u8],
        response: &mut [u8],
    ) -> Result<(), Error<SPI::Error, P>> {
        self.spi.write(instruction).await.map_err(Error::Spi)?;
        self.spi
            .transfer_in_place(response)
            .await
            .map_err(Error::Spi)
    }

    async fn command(&mut self, bytes: &[u8]) -> Result<(), Error<SPI::Error, P>> {
        self.select()?;
        let result = self.spi.write(bytes).await.map_err(Error::Spi);
        self.finish(result).await
    }

    async fn program_frame(
        &mut self,
        header: &[u8],
        data: &[u8],
    ) -> Result<(), Error<SPI::Error, P>> {
        self.select()?;
        let result = match self.spi.write(header).await {
            Ok(()) => self.spi.write(data).await.map_err(Error::Spi),
            Err(e) => Err(Error::Spi(e)),
        };
        self.finish(result).await
    }

    fn select(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.cs.set_low().map_err(Error::Pin)
    }

    fn deselect(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.cs.set_high().map_err(Error::Pin)
    }

    async fn finish<R>(
        &mut self,
        result: Result<R, Error<SPI::Error, P>>,
    ) -> Result<R, Error<SPI::Error, P>> {
        let flushed = self.spi.flush().await.map_err(Error::Spi);
        let released = self.deselect();
        let value = result?;
        flushed?;
        released?;
        Ok(value)
    }

    fn protect(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.wp.set_low().map_err(Error::Pin)
    }

    fn unprotect(&mut self) -> Result<(), Error<SPI::Error, P>> {
        self.wp.set_high().map_err(Error::Pin)
    }
}

impl<SPI, CS, WP, D, P> AsyncPageFlash for AsyncDataFlash<SPI, CS, WP, D>
where
    SPI: SpiBus,
    CS: OutputPin<Error = P>,
    WP: OutputPin<Error = P>,
    D: DelayNs,
{
    type Error = Error<SPI::Error, P>;
    const PAGE_COUNT: u16 = PAGE_COUNT;

    async fn read_page(&mut self, page: u16, buf: &mut [u8; PAGE_SIZE]) -> Result<(), Self::Error> {
        AsyncDataFlash::read_page(self, page, buf).await
    }

    async fn write_page(&mut self, page: u16, data: &[u8; PAGE_SIZE]) -> Result<(), Self::Error> {
        AsyncDataFlash::write_page(self, page, data).await
    }

    async fn erase_chip(&mut self) -> Result<(), Self::Error> {
        AsyncDataFlash::erase_chip(self).await
    }
}
