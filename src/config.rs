/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use core::fmt;
use core::str::FromStr;

/// Which color filter the sensor die carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorMode {
    Color,
    Mono,
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorMode::Color => f.write_str("color"),
            SensorMode::Mono => f.write_str("mono"),
        }
    }
}

/// Returned when a sensor mode name is neither "color" nor "mono"
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseSensorModeError;

impl fmt::Display for ParseSensorModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sensor mode must be \"color\" or \"mono\"")
    }
}

impl FromStr for SensorMode {
    type Err = ParseSensorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "color" => Ok(SensorMode::Color),
            "mono" => Ok(SensorMode::Mono),
            _ => Err(ParseSensorModeError),
        }
    }
}

/// Options fixed when the driver is bound to a sensor.
///
/// The flip and automatic exposure/gain options only seed the initial
/// state; they may later be changed through the control interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorConfig {
    pub mode: SensorMode,
    /// Initial state of automatic exposure
    pub auto_exposure: bool,
    /// Initial state of automatic gain
    pub auto_gain: bool,
    /// High dynamic range pixel operation
    pub high_dynamic_range: bool,
    /// Companding ADC for better low light response
    pub low_light: bool,
    pub hflip: bool,
    pub vflip: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            mode: SensorMode::Color,
            auto_exposure: true,
            auto_gain: true,
            high_dynamic_range: true,
            low_light: false,
            hflip: false,
            vflip: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sensor_mode_names() {
        assert_eq!("color".parse::<SensorMode>(), Ok(SensorMode::Color));
        assert_eq!(" mono\n".parse::<SensorMode>(), Ok(SensorMode::Mono));
        assert_eq!("bayer".parse::<SensorMode>(), Err(ParseSensorModeError));
    }

    #[test]
    fn defaults_enable_auto_controls_and_hdr() {
        let config = SensorConfig::default();
        assert_eq!(config.mode, SensorMode::Color);
        assert!(config.auto_exposure && config.auto_gain);
        assert!(config.high_dynamic_range);
        assert!(!config.low_light && !config.hflip && !config.vflip);
    }
}
