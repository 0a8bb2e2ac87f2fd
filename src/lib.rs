/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/
#![no_std]

//! Configuration driver for the ON Semiconductor MT9V032 image sensor
//! This imaging sensor has multiple interfaces:
//! - Two-wire i2c for configuration registers (i2c)
//! - parallel pixel data out (dout)
//! - pixel out sync (vsync, hsync, pix clock)
//! This driver is concerned only with the i2c interface.
//!
//! It presents the sensor to a capture host as a video source with a fixed
//! 752x480 frame, a handful of controls (flips, exposure, gain, automatic
//! exposure and gain), and a power state machine that detects and programs
//! the sensor each time it is powered on.

#[cfg(test)]
extern crate std;

mod config;
mod controls;
mod driver;
mod format;
mod interface;
mod power;
pub mod registers;
mod state;

pub use config::{ParseSensorModeError, SensorConfig, SensorMode};
pub use controls::{
    ControlDescriptor, ControlId, ControlKind, CONTROLS, CTRL_FLAG_SLIDER,
};
pub use driver::Mt9v032;
pub use format::{
    catalog, BufferType, ColorSpace, Field, FormatDescriptor, Fraction,
    FrameSize, PixFormat, PixelFormat, StreamParams, CAP_TIME_PER_FRAME,
    FRAME_INTERVALS, MAX_FRAME_HEIGHT, MAX_FRAME_WIDTH,
};
pub use interface::{
    CaptureHost, ProbeError, SensorSlot, VideoSensor, DRIVER_NAME,
};
pub use power::{Platform, PowerState, XCLK_FREQUENCY};
pub use state::{
    AdcMode, AutoControl, ChipControl, ChipVersion, PixelMode, ReadMode,
    SensorState, EXPOSURE_MAX, EXPOSURE_MIN, GAIN_MAX, GAIN_MIN,
};

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE, PlatformE> {
    /// Sensor communication error
    Comm(CommE),

    /// The platform could not change the sensor power state
    Platform(PlatformE),

    /// No supported sensor answered on the bus
    NotDetected,

    /// A control value or enumeration index is out of range
    InvalidArgument,

    /// Unknown control, pixel format or buffer type
    NotSupported,

    /// A sensor is already bound
    Busy,

    /// No sensor is bound
    NoDevice,

    /// The capture host refused the sensor
    Registration,
}

/// 7-bit address with both S_CTRL_ADR pins low.
/// The sensor may also be strapped to 0x4C, 0x58 or 0x5C.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x48;

#[cfg(test)]
pub(crate) mod testing {
    use crate::{Mt9v032, Platform, PowerState, SensorConfig, DEFAULT_I2C_ADDRESS};
    use embedded_hal_mock::delay::MockNoop;
    use embedded_hal_mock::i2c::{Mock, Transaction};

    /// Platform that always succeeds and remembers the last request
    #[derive(Debug, Default)]
    pub struct NullPlatform {
        pub xclk: u32,
        pub power: Option<PowerState>,
    }

    impl Platform for NullPlatform {
        type Error = ();
        type PrivData = ();

        fn set_power(&mut self, state: PowerState) -> Result<(), ()> {
            self.power = Some(state);
            Ok(())
        }

        fn set_xclk(&mut self, frequency: u32) -> u32 {
            self.xclk = frequency;
            frequency
        }

        fn priv_data(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    pub type MockSensor = Mt9v032<Mock, NullPlatform, MockNoop>;

    pub fn mock_sensor(
        expectations: &[Transaction],
        config: SensorConfig,
    ) -> MockSensor {
        Mt9v032::new(
            Mock::new(expectations),
            DEFAULT_I2C_ADDRESS,
            NullPlatform::default(),
            MockNoop::new(),
            config,
        )
    }
}
