/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! In-memory shadow of the sensor registers the driver manages.
//!
//! Each mode register is held as named fields plus the register bits the
//! driver does not manage, so the packed value can always be recomputed.

use core::convert::TryFrom;

use crate::config::SensorConfig;
use crate::format::{catalog, Fraction, PixFormat};
use crate::registers::*;

/// Exposure (shutter width) accepted through the control interface
pub const EXPOSURE_MIN: u16 = 2;
pub const EXPOSURE_MAX: u16 = 480;
/// Analog gain accepted through the control interface
pub const GAIN_MIN: u16 = 16;
pub const GAIN_MAX: u16 = 64;

pub const DEFAULT_FPS: u32 = 60;

/// Chip versions this driver knows how to program
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum ChipVersion {
    Rev1 = 0x1311,
    Rev3 = 0x1313,
}

impl TryFrom<u16> for ChipVersion {
    type Error = u16;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            0x1311 => Ok(ChipVersion::Rev1),
            0x1313 => Ok(ChipVersion::Rev3),
            other => Err(other),
        }
    }
}

/// Pixel Operation Mode register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelMode {
    base: u16,
    pub color: bool,
    pub high_dynamic_range: bool,
}

impl PixelMode {
    const MANAGED: u16 = COLOR_SENSOR | HIGH_DYNAMIC_RANGE;

    pub fn bits(&self) -> u16 {
        let mut bits = self.base & !Self::MANAGED;
        if self.color {
            bits |= COLOR_SENSOR;
        }
        if self.high_dynamic_range {
            bits |= HIGH_DYNAMIC_RANGE;
        }
        bits
    }

    /// Adopt the unmanaged bits of `raw`, keeping the named fields
    pub fn rebase(&mut self, raw: u16) {
        self.base = raw & !Self::MANAGED;
    }
}

/// Read Mode register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadMode {
    base: u16,
    pub vflip: bool,
    pub hflip: bool,
}

impl ReadMode {
    const MANAGED: u16 = VERTICAL_FLIP | HORIZONTAL_FLIP;

    pub fn bits(&self) -> u16 {
        let mut bits = self.base & !Self::MANAGED;
        if self.vflip {
            bits |= VERTICAL_FLIP;
        }
        if self.hflip {
            bits |= HORIZONTAL_FLIP;
        }
        bits
    }

    pub fn rebase(&mut self, raw: u16) {
        self.base = raw & !Self::MANAGED;
    }
}

/// AEC/AGC Enable register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoControl {
    base: u16,
    pub exposure: bool,
    pub gain: bool,
}

impl AutoControl {
    const MANAGED: u16 = AUTO_EXPOSURE | AUTO_GAIN;

    pub fn bits(&self) -> u16 {
        let mut bits = self.base & !Self::MANAGED;
        if self.exposure {
            bits |= AUTO_EXPOSURE;
        }
        if self.gain {
            bits |= AUTO_GAIN;
        }
        bits
    }

    pub fn rebase(&mut self, raw: u16) {
        self.base = raw & !Self::MANAGED;
    }
}

/// Chip Control register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipControl {
    base: u16,
    /// Snapshot (triggered) mode when set, streaming otherwise
    pub snapshot: bool,
}

impl ChipControl {
    pub fn bits(&self) -> u16 {
        if self.snapshot {
            self.base | SNAPSHOT_MODE
        } else {
            self.base & !SNAPSHOT_MODE
        }
    }

    pub fn rebase(&mut self, raw: u16) {
        self.base = raw & !SNAPSHOT_MODE;
    }
}

/// ADC Mode Control register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcMode {
    Linear,
    Companding,
}

impl AdcMode {
    pub fn bits(self) -> u16 {
        match self {
            AdcMode::Linear => LINEAR_ADC,
            AdcMode::Companding => COMPANDING_ADC,
        }
    }
}

/// Gains of 32 and above only take even values
pub fn coerce_gain(gain: u16) -> u16 {
    if gain >= 32 {
        gain & !1
    } else {
        gain
    }
}

/// Everything the driver knows about one bound sensor
#[derive(Clone, Debug, PartialEq)]
pub struct SensorState {
    pub(crate) version: Option<ChipVersion>,
    pub(crate) pixel_mode: PixelMode,
    pub(crate) read_mode: ReadMode,
    pub(crate) auto_control: AutoControl,
    pub(crate) chip_control: ChipControl,
    pub(crate) adc_mode: AdcMode,
    pub(crate) shutter: u16,
    pub(crate) gain: u16,
    pub(crate) time_per_frame: Fraction,
    pub(crate) fps: u32,
    pub(crate) pix: PixFormat,
}

impl SensorState {
    pub fn new(config: &SensorConfig) -> Self {
        let shadow = |reg| default_value(reg).unwrap_or(0);
        let mut pixel_mode = PixelMode {
            base: 0,
            color: config.mode == crate::SensorMode::Color,
            high_dynamic_range: config.high_dynamic_range,
        };
        pixel_mode.rebase(shadow(Register::PixelOperationMode));
        let mut read_mode = ReadMode {
            base: 0,
            vflip: config.vflip,
            hflip: config.hflip,
        };
        read_mode.rebase(shadow(Register::ReadMode));
        let mut auto_control = AutoControl {
            base: 0,
            exposure: config.auto_exposure,
            gain: config.auto_gain,
        };
        auto_control.rebase(shadow(Register::AecAgcEnable));
        let mut chip_control = ChipControl {
            base: 0,
            snapshot: false,
        };
        chip_control.rebase(shadow(Register::ChipControl));

        let adc_mode = if config.low_light {
            AdcMode::Companding
        } else {
            AdcMode::Linear
        };

        Self {
            version: None,
            pixel_mode,
            read_mode,
            auto_control,
            chip_control,
            adc_mode,
            shutter: EXPOSURE_MAX,
            gain: GAIN_MIN,
            time_per_frame: Fraction::new(1, DEFAULT_FPS),
            fps: DEFAULT_FPS,
            pix: PixFormat::new(catalog(config.mode)[0].pixel_format),
        }
    }

    pub fn chip_version(&self) -> Option<ChipVersion> {
        self.version
    }

    pub fn is_detected(&self) -> bool {
        self.version.is_some()
    }

    pub fn pixel_mode(&self) -> PixelMode {
        self.pixel_mode
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    pub fn auto_control(&self) -> AutoControl {
        self.auto_control
    }

    pub fn chip_control(&self) -> ChipControl {
        self.chip_control
    }

    pub fn adc_mode(&self) -> AdcMode {
        self.adc_mode
    }

    /// Total shutter width, in row times
    pub fn shutter(&self) -> u16 {
        self.shutter
    }

    pub fn gain(&self) -> u16 {
        self.gain
    }

    pub fn time_per_frame(&self) -> Fraction {
        self.time_per_frame
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn pix_format(&self) -> PixFormat {
        self.pix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorMode;

    #[test]
    fn initial_state_follows_config() {
        let config = SensorConfig {
            mode: SensorMode::Mono,
            auto_exposure: false,
            low_light: true,
            vflip: true,
            ..SensorConfig::default()
        };
        let state = SensorState::new(&config);
        assert!(!state.is_detected());
        assert_eq!(state.shutter(), 480);
        assert_eq!(state.gain(), 16);
        assert_eq!(state.fps(), 60);
        assert_eq!(state.adc_mode(), AdcMode::Companding);
        assert_eq!(state.auto_control().bits(), AUTO_GAIN);
        assert_eq!(state.read_mode().bits(), 0x0300 | VERTICAL_FLIP);
        assert_eq!(state.pixel_mode().bits(), 0x0011 | HIGH_DYNAMIC_RANGE);
        assert_eq!(state.chip_control().bits(), 0x0388);
    }

    #[test]
    fn rebase_keeps_named_fields() {
        let mut read_mode = SensorState::new(&SensorConfig::default()).read_mode();
        read_mode.hflip = true;
        read_mode.rebase(0x0130 | VERTICAL_FLIP);
        assert!(read_mode.hflip && !read_mode.vflip);
        assert_eq!(read_mode.bits(), 0x0100 | HORIZONTAL_FLIP);

        let mut chip_control = SensorState::new(&SensorConfig::default()).chip_control();
        chip_control.rebase(0x0398);
        assert_eq!(chip_control.bits(), 0x0388);
        chip_control.snapshot = true;
        assert_eq!(chip_control.bits(), 0x0398);
    }

    #[test]
    fn high_gains_are_even() {
        assert_eq!(coerce_gain(17), 17);
        assert_eq!(coerce_gain(31), 31);
        assert_eq!(coerce_gain(32), 32);
        assert_eq!(coerce_gain(33), 32);
        assert_eq!(coerce_gain(63), 62);
    }

    #[test]
    fn only_known_versions_are_accepted() {
        assert_eq!(ChipVersion::try_from(0x1311u16), Ok(ChipVersion::Rev1));
        assert_eq!(ChipVersion::try_from(0x1313u16), Ok(ChipVersion::Rev3));
        assert_eq!(ChipVersion::try_from(0x1324u16), Err(0x1324));
    }
}
