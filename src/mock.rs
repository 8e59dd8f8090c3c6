//! Simulated AT45DB321E for tests. The bus, the pins and the delay share one
//! `Sim` so that frames are delimited by the chip-select line the driver drives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use embedded_hal::digital;
use embedded_hal::spi::{self, ErrorKind};

use crate::address::PAGE_SIZE;
use crate::command::Sequence;

pub const ID: [u8; 5] = [0x1F, 0x27, 0x01, 0x01, 0x00];

/// Density 0b1101, 512 byte pages, ready bit excluded.
pub const STATUS1_BINARY_PAGES: u8 = 0x35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPower {
    Active,
    DeepPowerDown,
    UltraDeepPowerDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
    /// Write-protect was released (high) when the frame ended.
    pub writable: bool,
}

#[derive(Debug)]
pub struct Sim {
    /// Pages that were never written read back erased.
    pub pages: HashMap<u16, [u8; PAGE_SIZE]>,
    pub id: [u8; 5],
    pub status1: u8,
    pub status2: u8,
    pub power: SimPower,

    /// Remaining status reads that report busy.
    pub busy_polls: u32,
    pub program_busy_polls: u32,
    pub erase_busy_polls: u32,
    pub status_reads: u32,
    last_ready: bool,

    pub cs_low: bool,
    pub wp_high: bool,
    pub reset_low: bool,
    pub reset_pulses: u32,
    pub software_resets: u32,
    pub fail_bus: bool,
    /// Page size sequences are accepted but the status bit does not change.
    pub page_size_locked: bool,

    frame: Vec<u8>,
    pub frames: Vec<Frame>,
    /// Bytes clocked while chip select was high.
    pub stray_bytes: usize,

    pub elapsed_ns: u64,
    pub ns_since_cs_release: u64,
    pub ns_cs_low: u64,
    pub ns_reset_low: u64,
    ns_since_reset_release: u64,
    pub settle_before_first_frame_ns: Option<u64>,
}

impl Sim {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            id: ID,
            status1: STATUS1_BINARY_PAGES,
            status2: 0x00,
            power: SimPower::Active,
            busy_polls: 0,
            program_busy_polls: 3,
            erase_busy_polls: 50,
            status_reads: 0,
            last_ready: true,
            cs_low: false,
            wp_high: false,
            reset_low: false,
            reset_pulses: 0,
            software_resets: 0,
            fail_bus: false,
            page_size_locked: false,
            frame: Vec::new(),
            frames: Vec::new(),
            stray_bytes: 0,
            elapsed_ns: 0,
            ns_since_cs_release: 0,
            ns_cs_low: 0,
            ns_reset_low: 0,
            ns_since_reset_release: 0,
            settle_before_first_frame_ns: None,
        }
    }

    pub fn page(&self, page: u16) -> [u8; PAGE_SIZE] {
        self.pages.get(&page).copied().unwrap_or([0xFF; PAGE_SIZE])
    }

    /// Total bytes clocked plus chip-select edges seen so far.
    pub fn bus_activity(&self) -> usize {
        self.frames.iter().map(|f| f.bytes.len() + 1).sum::<usize>()
            + self.frame.len()
            + self.stray_bytes
    }

    fn exchange(&mut self, out: u8) -> u8 {
        if !self.cs_low {
            self.stray_bytes += 1;
            return 0xFF;
        }
        let position = self.frame.len();
        self.frame.push(out);
        if self.power != SimPower::Active || position == 0 {
            return 0xFF;
        }
        match self.frame[0] {
            0xD7 => {
                if position % 2 == 1 {
                    self.status_reads += 1;
                    self.last_ready = if self.busy_polls > 0 {
                        self.busy_polls -= 1;
                        false
                    } else {
                        true
                    };
                    self.status1 | if self.last_ready { 0x80 } else { 0 }
                } else {
                    self.status2 | if self.last_ready { 0x80 } else { 0 }
                }
            }
            0x9F => self.id.get(position - 1).copied().unwrap_or(0xFF),
            0x03 if position >= 4 => {
                let offset = position - 4;
                if offset < PAGE_SIZE {
                    self.page(decode_page(&self.frame))[offset]
                } else {
                    0xFF
                }
            }
            _ => 0x00,
        }
    }

    fn select(&mut self) {
        if self.cs_low {
            return;
        }
        if self.frames.is_empty() && self.settle_before_first_frame_ns.is_none() {
            self.settle_before_first_frame_ns = Some(self.ns_since_reset_release);
        }
        self.cs_low = true;
        self.ns_cs_low = 0;
        self.frame.clear();
    }

    fn deselect(&mut self) {
        if !self.cs_low {
            return;
        }
        self.cs_low = false;
        self.ns_since_cs_release = 0;
        let bytes = std::mem::take(&mut self.frame);
        self.execute(&bytes);
        self.frames.push(Frame {
            bytes,
            writable: self.wp_high,
        });
    }

    fn execute(&mut self, bytes: &[u8]) {
        match self.power {
            SimPower::UltraDeepPowerDown => {
                if self.ns_cs_low >= 20 {
                    self.power = SimPower::Active;
                }
                return;
            }
            SimPower::DeepPowerDown => {
                if bytes == [0xAB] {
                    self.power = SimPower::Active;
                }
                return;
            }
            SimPower::Active => {}
        }

        if bytes.len() == 4 {
            let sequence = [bytes[0], bytes[1], bytes[2], bytes[3]];
            if &sequence == Sequence::ChipErase.bytes() {
                if self.wp_high {
                    self.pages.clear();
                    self.busy_polls = self.erase_busy_polls;
                }
                return;
            }
            if &sequence == Sequence::PowerOfTwoPageSize.bytes() {
                if !self.page_size_locked {
                    self.status1 |= 0x01;
                }
                self.busy_polls = self.program_busy_polls;
                return;
            }
            if &sequence == Sequence::StandardPageSize.bytes() {
                if !self.page_size_locked {
                    self.status1 &= !0x01;
                }
                self.busy_polls = self.program_busy_polls;
                return;
            }
            if &sequence == Sequence::SoftwareReset.bytes() {
                self.software_resets += 1;
                self.busy_polls = 0;
                return;
            }
        }

        match bytes.first() {
            Some(0x82) if bytes.len() >= 4 && self.wp_high => {
                let mut contents = [0xFF; PAGE_SIZE];
                let data = &bytes[4..];
                let len = data.len().min(PAGE_SIZE);
                contents[..len].copy_from_slice(&data[..len]);
                self.pages.insert(decode_page(bytes), contents);
                self.busy_polls = self.program_busy_polls;
            }
            Some(0xB9) => self.power = SimPower::DeepPowerDown,
            Some(0x79) => self.power = SimPower::UltraDeepPowerDown,
            _ => {}
        }
    }

    fn elapse(&mut self, ns: u64) {
        self.elapsed_ns += ns;
        self.ns_since_cs_release += ns;
        self.ns_since_reset_release += ns;
        if self.cs_low {
            self.ns_cs_low += ns;
        }
        if self.reset_low {
            self.ns_reset_low += ns;
        }
    }
}

fn decode_page(frame: &[u8]) -> u16 {
    (((frame[1] & 0x3F) as u16) << 7) | ((frame[2] as u16) >> 1)
}

pub type Shared = Rc<RefCell<Sim>>;

pub struct MockBus(pub Shared);

impl spi::ErrorType for MockBus {
    type Error = BusFault;
}

impl MockBus {
    fn check(&self) -> Result<(), BusFault> {
        if self.0.borrow().fail_bus {
            Err(BusFault)
        } else {
            Ok(())
        }
    }
}

impl spi::SpiBus for MockBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        self.check()?;
        let mut sim = self.0.borrow_mut();
        for word in words {
            *word = sim.exchange(0x00);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        self.check()?;
        let mut sim = self.0.borrow_mut();
        for word in words {
            sim.exchange(*word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), BusFault> {
        self.check()?;
        let mut sim = self.0.borrow_mut();
        for i in 0..read.len().max(write.len()) {
            let received = sim.exchange(write.get(i).copied().unwrap_or(0x00));
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        self.check()?;
        let mut sim = self.0.borrow_mut();
        for word in words {
            *word = sim.exchange(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BusFault> {
        Ok(())
    }
}

impl embedded_hal_async::spi::SpiBus for MockBus {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        spi::SpiBus::read(self, words)
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        spi::SpiBus::write(self, words)
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), BusFault> {
        spi::SpiBus::transfer(self, read, write)
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        spi::SpiBus::transfer_in_place(self, words)
    }

    async fn flush(&mut self) -> Result<(), BusFault> {
        spi::SpiBus::flush(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Line {
    ChipSelect,
    WriteProtect,
    Reset,
}

pub struct MockPin(pub Shared, pub Line);

impl digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        match self.1 {
            Line::ChipSelect => sim.select(),
            Line::WriteProtect => sim.wp_high = false,
            Line::Reset => {
                sim.reset_low = true;
                sim.ns_reset_low = 0;
            }
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        match self.1 {
            Line::ChipSelect => sim.deselect(),
            Line::WriteProtect => sim.wp_high = true,
            Line::Reset => {
                if sim.reset_low {
                    sim.reset_low = false;
                    sim.reset_pulses += 1;
                    sim.ns_since_reset_release = 0;
                }
            }
        }
        Ok(())
    }
}

pub struct MockDelay(pub Shared);

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().elapse(ns as u64);
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().elapse(ns as u64);
    }
}

pub struct Parts {
    pub sim: Shared,
    pub bus: MockBus,
    pub cs: MockPin,
    pub wp: MockPin,
    pub reset: MockPin,
    pub delay: MockDelay,
}

pub fn parts() -> Parts {
    let sim = Rc::new(RefCell::new(Sim::new()));
    Parts {
        bus: MockBus(sim.clone()),
        cs: MockPin(sim.clone(), Line::ChipSelect),
        wp: MockPin(sim.clone(), Line::WriteProtect),
        reset: MockPin(sim.clone(), Line::Reset),
        delay: MockDelay(sim.clone()),
        sim,
    }
}

/// Data patterns used by the round trip tests.
pub fn patterns() -> [[u8; PAGE_SIZE]; 3] {
    let mut ramp = [0u8; PAGE_SIZE];
    for (i, byte) in ramp.iter_mut().enumerate() {
        *byte = i as u8;
    }
    [[0x00; PAGE_SIZE], [0xFF; PAGE_SIZE], ramp]
}
