//! Mode-dependent opcode assembly and high-level front-end operations.

use crate::pec::{frame_command, frame_register};
use crate::transport::{verify_all, Transport};
use crate::link::Link;

/// ADC conversion speed. Declared order matters: ordinal 0 is the fastest
/// setting, ordinal 7 (`Hz26`) is the slowest and the power-on default.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcMode {
    Khz27 = 0,
    Khz14 = 1,
    Khz7 = 2,
    Khz3 = 3,
    Khz2 = 4,
    Khz1 = 5,
    Hz422 = 6,
    Hz26 = 7,
}

impl AdcMode {
    const fn faster(self) -> Self {
        match self {
            AdcMode::Khz27 => AdcMode::Khz27,
            AdcMode::Khz14 => AdcMode::Khz27,
            AdcMode::Khz7 => AdcMode::Khz14,
            AdcMode::Khz3 => AdcMode::Khz7,
            AdcMode::Khz2 => AdcMode::Khz3,
            AdcMode::Khz1 => AdcMode::Khz2,
            AdcMode::Hz422 => AdcMode::Khz1,
            AdcMode::Hz26 => AdcMode::Hz422,
        }
    }
}

const fn build_adcv(mode: AdcMode) -> u16 {
    match mode {
        AdcMode::Hz422 | AdcMode::Khz1 => 0b0000_0010_0110_0000,
        AdcMode::Khz27 | AdcMode::Khz14 => 0b0000_0010_1110_0000,
        AdcMode::Khz7 | AdcMode::Khz3 => 0b0000_0011_0110_0000,
        AdcMode::Hz26 | AdcMode::Khz2 => 0b0000_0011_1110_0000,
    }
}

const fn build_adcvsc(mode: AdcMode) -> u16 {
    match mode {
        AdcMode::Hz422 | AdcMode::Khz1 => 0b0000_0100_0111_0111,
        AdcMode::Khz27 | AdcMode::Khz14 => 0b0000_0100_1111_0111,
        AdcMode::Khz7 | AdcMode::Khz3 => 0b0000_0101_0111_0111,
        AdcMode::Hz26 | AdcMode::Khz2 => 0b0000_0101_1111_0111,
    }
}

const fn build_adax(mode: AdcMode) -> u16 {
    match mode {
        AdcMode::Hz422 | AdcMode::Khz1 => 0b0000_0100_0110_0000,
        AdcMode::Khz27 | AdcMode::Khz14 => 0b0000_0100_1110_0000,
        AdcMode::Khz7 | AdcMode::Khz3 => 0b0000_0101_0110_0000,
        AdcMode::Hz26 | AdcMode::Khz2 => 0b0000_0101_1110_0000,
    }
}

const WRCFG: u16 = 0x0001;
const RDCVA: u16 = 0x0004;
const RDCVB: u16 = 0x0006;
const RDAUXA: u16 = 0x000C;
const RDAUXB: u16 = 0x000E;
const RDSTATA: u16 = 0x0010;

/// Volts per ADC count: 100 microvolts.
const ADC_RESOLUTION: f32 = 100e-6;

fn build_cfg(refon: bool) -> [u8; 6] {
    let first = if refon { 0x7C } else { 0x78 };
    [first, 0x00, 0x00, 0x00, 0x00, 0x00]
}

/// Reads the `i`th little-endian 16-bit data word out of a raw 8-byte
/// register group (word 0 starts at byte 0; the PEC at bytes 6..8 is never
/// addressed this way).
fn word16(group: &crate::transport::RawRegister, i: usize) -> u16 {
    group[2 * i] as u16 | (group[2 * i + 1] as u16) << 8
}

/// Drives one daisy chain of `N` LTC6810s through their ADC opcodes,
/// decoding raw register groups into volts.
pub struct Driver<L: Link, const N: usize> {
    transport: Transport<L, N>,
    mode: AdcMode,
    adcv: [u8; 4],
    adcvsc: [u8; 4],
    adax: [u8; 4],
    wrcfg: [u8; 4],
    rdcva: [u8; 4],
    rdcvb: [u8; 4],
    rdauxa: [u8; 4],
    rdauxb: [u8; 4],
    rdstata: [u8; 4],
    cfg: [u8; 8],
}

impl<L: Link, const N: usize> Driver<L, N> {
    pub fn new(link: L, refon: bool) -> Self {
        let mode = AdcMode::Hz26;
        Driver {
            transport: Transport::new(link),
            mode,
            adcv: frame_command(build_adcv(mode)),
            adcvsc: frame_command(build_adcvsc(mode)),
            adax: frame_command(build_adax(mode)),
            wrcfg: frame_command(WRCFG),
            rdcva: frame_command(RDCVA),
            rdcvb: frame_command(RDCVB),
            rdauxa: frame_command(RDAUXA),
            rdauxb: frame_command(RDAUXB),
            rdstata: frame_command(RDSTATA),
            cfg: frame_register(build_cfg(refon)),
        }
    }

    pub fn mode(&self) -> AdcMode {
        self.mode
    }

    pub fn release(self) -> L {
        self.transport.release()
    }

    /// Wakes the chain and (re)writes its configuration register.
    pub fn wake_up(&mut self) {
        self.transport.wake_up();
        self.transport.write(self.wrcfg, self.cfg);
    }

    /// Starts an all-cell conversion with self-test sum (`ADCVSC`).
    pub fn start_cell_conversion(&mut self) {
        self.transport.start_conversion_raw(self.adcvsc);
    }

    /// Starts an auxiliary (GPIO) conversion (`ADAX`).
    pub fn start_gpio_conversion(&mut self) {
        self.transport.start_conversion_raw(self.adax);
    }

    pub fn is_conv_done(&mut self) -> bool {
        self.transport.is_conversion_done()
    }

    /// Reads back cell voltages and the per-device pack total. Slot 6 of
    /// each device's row is the STATA-derived total voltage; slots 0..2
    /// come from `RDCVA`, slots 3..5 from `RDCVB`. A failed PEC leaves its
    /// slots `None`.
    pub fn read_cells(&mut self) -> [[Option<f32>; 7]; N] {
        let cva = verify_all(self.transport.read(self.rdcva));
        let cvb = verify_all(self.transport.read(self.rdcvb));
        let stata = verify_all(self.transport.read(self.rdstata));

        let mut cells = [[None; 7]; N];
        for i in 0..N {
            if let Some(group) = cva[i] {
                cells[i][0] = Some(word16(&group, 0) as f32 * ADC_RESOLUTION);
                cells[i][1] = Some(word16(&group, 1) as f32 * ADC_RESOLUTION);
                cells[i][2] = Some(word16(&group, 2) as f32 * ADC_RESOLUTION);
            }
            if let Some(group) = cvb[i] {
                cells[i][3] = Some(word16(&group, 0) as f32 * ADC_RESOLUTION);
                cells[i][4] = Some(word16(&group, 1) as f32 * ADC_RESOLUTION);
                cells[i][5] = Some(word16(&group, 2) as f32 * ADC_RESOLUTION);
            }
            if let Some(group) = stata[i] {
                cells[i][6] = Some(word16(&group, 0) as f32 * ADC_RESOLUTION * 10.0);
            }
        }
        cells
    }

    /// Reads back auxiliary channels. `AUXA` word 0 is a device reference
    /// diagnostic, not a board sensor, and is intentionally skipped.
    pub fn read_gpios(&mut self) -> [[Option<f32>; 4]; N] {
        let auxa = verify_all(self.transport.read(self.rdauxa));
        let auxb = verify_all(self.transport.read(self.rdauxb));

        let mut gpios = [[None; 4]; N];
        for i in 0..N {
            if let Some(group) = auxa[i] {
                gpios[i][0] = Some(word16(&group, 1) as f32 * ADC_RESOLUTION);
                gpios[i][1] = Some(word16(&group, 2) as f32 * ADC_RESOLUTION);
            }
            if let Some(group) = auxb[i] {
                gpios[i][2] = Some(word16(&group, 0) as f32 * ADC_RESOLUTION);
                gpios[i][3] = Some(word16(&group, 1) as f32 * ADC_RESOLUTION);
            }
        }
        gpios
    }

    /// Steps the ADC mode one notch faster, rebuilding the cached opcodes.
    /// A no-op at the fastest setting (`Khz27`).
    pub fn faster_conv(&mut self) {
        let next = self.mode.faster();
        if next == self.mode {
            return;
        }
        self.mode = next;
        self.adcv = frame_command(build_adcv(next));
        self.adcvsc = frame_command(build_adcvsc(next));
        self.adax = frame_command(build_adax(next));
    }
}
