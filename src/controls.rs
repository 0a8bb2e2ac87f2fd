/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! User controls: flips, exposure, gain and their automatic modes.
//!
//! Control identifiers are the V4L2 ones, so a capture host can pass them
//! through unchanged. Reads come from the shadow state; writes go through
//! to the sensor.

use core::convert::TryFrom;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::{debug, warn};

use crate::power::Platform;
use crate::state::{
    coerce_gain, AutoControl, EXPOSURE_MAX, EXPOSURE_MIN, GAIN_MAX, GAIN_MIN,
};
use crate::{Error, Mt9v032};

const CID_BASE: u32 = 0x0098_0900;
const CID_CAMERA_CLASS_BASE: u32 = 0x009a_0900;

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlId {
    Exposure = CID_BASE + 17,
    AutoGain = CID_BASE + 18,
    Gain = CID_BASE + 19,
    HorizontalFlip = CID_BASE + 20,
    VerticalFlip = CID_BASE + 21,
    AutoExposure = CID_CAMERA_CLASS_BASE + 1,
}

impl ControlId {
    /// Raw control identifier
    pub const fn cid(self) -> u32 {
        self as u32
    }

    pub fn descriptor(self) -> &'static ControlDescriptor {
        match self {
            ControlId::VerticalFlip => &CONTROLS[0],
            ControlId::HorizontalFlip => &CONTROLS[1],
            ControlId::Exposure => &CONTROLS[2],
            ControlId::Gain => &CONTROLS[3],
            ControlId::AutoExposure => &CONTROLS[4],
            ControlId::AutoGain => &CONTROLS[5],
        }
    }
}

impl TryFrom<u32> for ControlId {
    type Error = u32;

    fn try_from(cid: u32) -> Result<Self, Self::Error> {
        CONTROLS
            .iter()
            .map(|c| c.id)
            .find(|id| id.cid() == cid)
            .ok_or(cid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKind {
    Boolean,
    Integer,
}

/// Control flag: present the control as a slider
pub const CTRL_FLAG_SLIDER: u32 = 0x0020;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub id: ControlId,
    pub kind: ControlKind,
    pub name: &'static str,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl ControlDescriptor {
    pub fn accepts(&self, value: i32) -> bool {
        value >= self.minimum && value <= self.maximum
    }
}

/// Every control the sensor offers
pub static CONTROLS: [ControlDescriptor; 6] = [
    ControlDescriptor {
        id: ControlId::VerticalFlip,
        kind: ControlKind::Boolean,
        name: "Flip Vertically",
        minimum: 0,
        maximum: 1,
        step: 1,
        default_value: 0,
        flags: 0,
    },
    ControlDescriptor {
        id: ControlId::HorizontalFlip,
        kind: ControlKind::Boolean,
        name: "Flip Horizontally",
        minimum: 0,
        maximum: 1,
        step: 1,
        default_value: 0,
        flags: 0,
    },
    ControlDescriptor {
        id: ControlId::Exposure,
        kind: ControlKind::Integer,
        name: "Exposure",
        minimum: EXPOSURE_MIN as i32,
        maximum: EXPOSURE_MAX as i32,
        step: 1,
        default_value: EXPOSURE_MAX as i32,
        flags: CTRL_FLAG_SLIDER,
    },
    ControlDescriptor {
        id: ControlId::Gain,
        kind: ControlKind::Integer,
        name: "Analog Gain",
        minimum: GAIN_MIN as i32,
        maximum: GAIN_MAX as i32,
        step: 1,
        default_value: GAIN_MIN as i32,
        flags: CTRL_FLAG_SLIDER,
    },
    ControlDescriptor {
        id: ControlId::AutoExposure,
        kind: ControlKind::Boolean,
        name: "Automatic Exposure",
        minimum: 0,
        maximum: 1,
        step: 1,
        default_value: 1,
        flags: 0,
    },
    ControlDescriptor {
        id: ControlId::AutoGain,
        kind: ControlKind::Boolean,
        name: "Automatic Gain",
        minimum: 0,
        maximum: 1,
        step: 1,
        default_value: 1,
        flags: 0,
    },
];

impl<I2C, P, D, CommE> Mt9v032<I2C, P, D>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    P: Platform,
    D: DelayMs<u8>,
{
    pub fn controls(&self) -> impl Iterator<Item = &'static ControlDescriptor> {
        CONTROLS.iter()
    }

    pub fn query_control(
        &self,
        cid: u32,
    ) -> Result<&'static ControlDescriptor, Error<CommE, P::Error>> {
        ControlId::try_from(cid)
            .map(ControlId::descriptor)
            .map_err(|_| Error::NotSupported)
    }

    /// Current value of a control, from the shadow state
    pub fn get_control(&self, cid: u32) -> Result<i32, Error<CommE, P::Error>> {
        let id = ControlId::try_from(cid).map_err(|_| Error::NotSupported)?;
        let state = &self.state;
        let value = match id {
            ControlId::VerticalFlip => i32::from(state.read_mode.vflip),
            ControlId::HorizontalFlip => i32::from(state.read_mode.hflip),
            ControlId::Exposure => i32::from(state.shutter),
            ControlId::Gain => i32::from(state.gain),
            ControlId::AutoExposure => i32::from(state.auto_control.exposure),
            ControlId::AutoGain => i32::from(state.auto_control.gain),
        };
        Ok(value)
    }

    /// Change a control on the sensor.
    ///
    /// Setting exposure or gain by hand turns the matching automatic mode
    /// off first. Out of range values are rejected before any bus traffic.
    pub fn set_control(
        &mut self,
        cid: u32,
        value: i32,
    ) -> Result<(), Error<CommE, P::Error>> {
        let id = ControlId::try_from(cid).map_err(|_| Error::NotSupported)?;
        if !id.descriptor().accepts(value) {
            return Err(Error::InvalidArgument);
        }
        let raw = u16::try_from(value).map_err(|_| Error::InvalidArgument)?;
        let enable = raw != 0;

        match id {
            ControlId::VerticalFlip => {
                let mut read_mode = self.state.read_mode;
                read_mode.vflip = enable;
                self.write_read_mode(read_mode)?;
                debug!(
                    "setting vertical flip {} (read_mode=0x{:04X})",
                    value,
                    read_mode.bits()
                );
            }
            ControlId::HorizontalFlip => {
                let mut read_mode = self.state.read_mode;
                read_mode.hflip = enable;
                self.write_read_mode(read_mode)?;
                debug!(
                    "setting horizontal flip {} (read_mode=0x{:04X})",
                    value,
                    read_mode.bits()
                );
            }
            ControlId::Exposure => {
                let prior = self.state.auto_control;
                if prior.exposure {
                    let mut auto_control = prior;
                    auto_control.exposure = false;
                    self.write_auto_control(auto_control)?;
                }
                if let Err(e) = self.write_shutter(raw) {
                    self.restore_auto_control(prior);
                    return Err(e);
                }
                debug!("setting exposure {}", raw);
            }
            ControlId::Gain => {
                let prior = self.state.auto_control;
                if prior.gain {
                    let mut auto_control = prior;
                    auto_control.gain = false;
                    self.write_auto_control(auto_control)?;
                }
                let gain = coerce_gain(raw);
                if let Err(e) = self.write_gain(gain) {
                    self.restore_auto_control(prior);
                    return Err(e);
                }
                debug!("setting gain {}", gain);
            }
            ControlId::AutoExposure => {
                let mut auto_control = self.state.auto_control;
                auto_control.exposure = enable;
                self.write_auto_control(auto_control)?;
                debug!("setting automatic exposure {}", value);
            }
            ControlId::AutoGain => {
                let mut auto_control = self.state.auto_control;
                auto_control.gain = enable;
                self.write_auto_control(auto_control)?;
                debug!("setting automatic gain {}", value);
            }
        }
        Ok(())
    }

    /// Put the automatic modes back after a manual value failed to land.
    /// Best effort: the value write error is the one reported.
    fn restore_auto_control(&mut self, prior: AutoControl) {
        if self.state.auto_control != prior && self.write_auto_control(prior).is_err() {
            warn!(
                "unable to restore AEC/AGC enable (0x{:04X})",
                prior.bits()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_sensor;
    use crate::{SensorConfig, DEFAULT_I2C_ADDRESS};
    use embedded_hal_mock::i2c::Transaction;
    use std::vec;

    const ADDR: u8 = DEFAULT_I2C_ADDRESS;

    #[test]
    fn raw_ids_map_to_catalog() {
        assert_eq!(ControlId::try_from(0x0098_0915u32), Ok(ControlId::VerticalFlip));
        assert_eq!(ControlId::try_from(0x009a_0901u32), Ok(ControlId::AutoExposure));
        assert_eq!(ControlId::try_from(0x0098_0900u32), Err(0x0098_0900));
        for desc in CONTROLS.iter() {
            assert_eq!(desc.id.descriptor(), desc);
        }
    }

    #[test]
    fn query_reports_ranges() {
        let sensor = mock_sensor(&[], SensorConfig::default());
        let exposure = sensor.query_control(ControlId::Exposure.cid()).unwrap();
        assert_eq!(exposure.name, "Exposure");
        assert_eq!((exposure.minimum, exposure.maximum), (2, 480));
        assert_eq!(exposure.default_value, 480);
        let gain = sensor.query_control(ControlId::Gain.cid()).unwrap();
        assert_eq!((gain.minimum, gain.maximum, gain.step), (16, 64, 1));
        assert_eq!(gain.kind, ControlKind::Integer);
        let auto = sensor.query_control(ControlId::AutoGain.cid()).unwrap();
        assert_eq!(auto.kind, ControlKind::Boolean);
        assert_eq!(auto.default_value, 1);
        assert!(matches!(
            sensor.query_control(0x0098_0900),
            Err(Error::NotSupported)
        ));
        assert_eq!(sensor.controls().count(), 6);
    }

    #[test]
    fn manual_exposure_clears_auto_exposure_first() {
        let expectations = [
            // AEC off, AGC still on
            Transaction::write(ADDR, vec![0xaf, 0x00, 0x02]),
            Transaction::write(ADDR, vec![0x0b, 0x01, 0x2c]),
            // already manual: shutter only
            Transaction::write(ADDR, vec![0x0b, 0x00, 0x02]),
        ];
        let mut sensor = mock_sensor(&expectations, SensorConfig::default());
        sensor.set_control(ControlId::Exposure.cid(), 300).unwrap();
        assert_eq!(sensor.get_control(ControlId::AutoExposure.cid()).unwrap(), 0);
        assert_eq!(sensor.get_control(ControlId::AutoGain.cid()).unwrap(), 1);
        sensor.set_control(ControlId::Exposure.cid(), 2).unwrap();
        assert_eq!(sensor.get_control(ControlId::Exposure.cid()).unwrap(), 2);
        sensor.release().0.done();
    }

    #[test]
    fn manual_gain_clears_auto_gain_and_rounds_down() {
        let expectations = [
            Transaction::write(ADDR, vec![0xaf, 0x00, 0x01]),
            Transaction::write(ADDR, vec![0x35, 0x00, 0x20]),
            Transaction::write(ADDR, vec![0x35, 0x00, 0x11]),
        ];
        let mut sensor = mock_sensor(&expectations, SensorConfig::default());
        sensor.set_control(ControlId::Gain.cid(), 33).unwrap();
        assert_eq!(sensor.get_control(ControlId::Gain.cid()).unwrap(), 32);
        assert_eq!(sensor.get_control(ControlId::AutoGain.cid()).unwrap(), 0);
        sensor.set_control(ControlId::Gain.cid(), 17).unwrap();
        assert_eq!(sensor.get_control(ControlId::Gain.cid()).unwrap(), 17);
        sensor.release().0.done();
    }

    #[test]
    fn flips_share_the_read_mode_register() {
        let expectations = [
            Transaction::write(ADDR, vec![0x0d, 0x03, 0x10]),
            Transaction::write(ADDR, vec![0x0d, 0x03, 0x30]),
            Transaction::write(ADDR, vec![0x0d, 0x03, 0x20]),
        ];
        let mut sensor = mock_sensor(&expectations, SensorConfig::default());
        sensor.set_control(ControlId::VerticalFlip.cid(), 1).unwrap();
        sensor.set_control(ControlId::HorizontalFlip.cid(), 1).unwrap();
        sensor.set_control(ControlId::VerticalFlip.cid(), 0).unwrap();
        assert_eq!(sensor.get_control(ControlId::VerticalFlip.cid()).unwrap(), 0);
        assert_eq!(sensor.get_control(ControlId::HorizontalFlip.cid()).unwrap(), 1);
        sensor.release().0.done();
    }

    #[test]
    fn invalid_values_never_reach_the_bus() {
        let mut sensor = mock_sensor(&[], SensorConfig::default());
        for &(id, value) in [
            (ControlId::Exposure, 1),
            (ControlId::Exposure, 481),
            (ControlId::Gain, 15),
            (ControlId::Gain, 65),
            (ControlId::VerticalFlip, 2),
            (ControlId::AutoGain, -1),
        ]
        .iter()
        {
            assert!(matches!(
                sensor.set_control(id.cid(), value),
                Err(Error::InvalidArgument)
            ));
        }
        assert!(matches!(
            sensor.set_control(0x0098_0900, 0),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            sensor.get_control(0x0098_0900),
            Err(Error::NotSupported)
        ));
        assert_eq!(sensor.get_control(ControlId::Exposure.cid()).unwrap(), 480);
        assert_eq!(sensor.get_control(ControlId::AutoExposure.cid()).unwrap(), 1);
        sensor.release().0.done();
    }
}
