/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::{error, info};

use crate::config::SensorConfig;
use crate::controls::ControlDescriptor;
use crate::format::{
    BufferType, FormatDescriptor, Fraction, FrameSize, PixFormat, PixelFormat,
    StreamParams,
};
use crate::power::{Platform, PowerState};
use crate::{Error, Mt9v032};

/// Name the driver registers under with the capture host
pub const DRIVER_NAME: &str = "mt9v032";

/// The operations a capture host drives a sensor with
pub trait VideoSensor {
    type Error;
    type PrivData;

    fn query_control(
        &self,
        cid: u32,
    ) -> Result<&'static ControlDescriptor, Self::Error>;
    fn get_control(&self, cid: u32) -> Result<i32, Self::Error>;
    fn set_control(&mut self, cid: u32, value: i32) -> Result<(), Self::Error>;

    fn enum_format(
        &self,
        buf_type: BufferType,
        index: usize,
    ) -> Result<&'static FormatDescriptor, Self::Error>;
    fn try_format(&self, requested: &PixFormat) -> Result<PixFormat, Self::Error>;
    fn set_format(&mut self, requested: &PixFormat)
        -> Result<PixFormat, Self::Error>;
    fn get_format(&self) -> Result<PixFormat, Self::Error>;

    fn get_stream_params(
        &self,
        buf_type: BufferType,
    ) -> Result<StreamParams, Self::Error>;
    fn set_stream_params(
        &mut self,
        buf_type: BufferType,
        requested: &StreamParams,
    ) -> Result<StreamParams, Self::Error>;

    fn enum_frame_sizes(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<FrameSize, Self::Error>;
    fn enum_frame_intervals(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<Fraction, Self::Error>;

    fn set_power(&mut self, state: PowerState) -> Result<(), Self::Error>;
    fn priv_data(&mut self) -> Result<Self::PrivData, Self::Error>;
}

impl<I2C, P, D, CommE> VideoSensor for Mt9v032<I2C, P, D>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    P: Platform,
    D: DelayMs<u8>,
{
    type Error = Error<CommE, P::Error>;
    type PrivData = P::PrivData;

    fn query_control(
        &self,
        cid: u32,
    ) -> Result<&'static ControlDescriptor, Self::Error> {
        Mt9v032::query_control(self, cid)
    }

    fn get_control(&self, cid: u32) -> Result<i32, Self::Error> {
        Mt9v032::get_control(self, cid)
    }

    fn set_control(&mut self, cid: u32, value: i32) -> Result<(), Self::Error> {
        Mt9v032::set_control(self, cid, value)
    }

    fn enum_format(
        &self,
        buf_type: BufferType,
        index: usize,
    ) -> Result<&'static FormatDescriptor, Self::Error> {
        Mt9v032::enum_format(self, buf_type, index)
    }

    fn try_format(&self, requested: &PixFormat) -> Result<PixFormat, Self::Error> {
        Ok(Mt9v032::try_format(self, requested))
    }

    fn set_format(
        &mut self,
        requested: &PixFormat,
    ) -> Result<PixFormat, Self::Error> {
        Ok(Mt9v032::set_format(self, requested))
    }

    fn get_format(&self) -> Result<PixFormat, Self::Error> {
        Ok(Mt9v032::get_format(self))
    }

    fn get_stream_params(
        &self,
        buf_type: BufferType,
    ) -> Result<StreamParams, Self::Error> {
        Mt9v032::stream_params(self, buf_type)
    }

    fn set_stream_params(
        &mut self,
        buf_type: BufferType,
        requested: &StreamParams,
    ) -> Result<StreamParams, Self::Error> {
        Mt9v032::set_stream_params(self, buf_type, requested)
    }

    fn enum_frame_sizes(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<FrameSize, Self::Error> {
        Mt9v032::enum_frame_sizes(self, pixel_format, index)
    }

    fn enum_frame_intervals(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<Fraction, Self::Error> {
        Mt9v032::enum_frame_intervals(self, pixel_format, index)
    }

    fn set_power(&mut self, state: PowerState) -> Result<(), Self::Error> {
        Mt9v032::set_power(self, state)
    }

    fn priv_data(&mut self) -> Result<Self::PrivData, Self::Error> {
        Mt9v032::priv_data(self)
    }
}

/// The capture host a sensor registers with once bound
pub trait CaptureHost {
    type Error: core::fmt::Debug;

    fn register(&mut self, name: &'static str) -> Result<(), Self::Error>;
    fn unregister(&mut self, name: &'static str);
}

/// Binding point for at most one sensor on a bus address
pub struct SensorSlot<I2C, P, D> {
    sensor: Option<Mt9v032<I2C, P, D>>,
}

impl<I2C, P, D> Default for SensorSlot<I2C, P, D> {
    fn default() -> Self {
        Self { sensor: None }
    }
}

impl<I2C, P, D> SensorSlot<I2C, P, D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.sensor.is_some()
    }

    pub fn sensor(&mut self) -> Option<&mut Mt9v032<I2C, P, D>> {
        self.sensor.as_mut()
    }
}

/// A refused probe, with the resources handed to it
pub struct ProbeError<I2C, P, D, CommE, PlatformE> {
    pub error: Error<CommE, PlatformE>,
    pub i2c: I2C,
    pub platform: P,
    pub delay: D,
}

impl<I2C, P, D, CommE, PlatformE> ProbeError<I2C, P, D, CommE, PlatformE> {
    pub fn into_parts(self) -> (Error<CommE, PlatformE>, (I2C, P, D)) {
        (self.error, (self.i2c, self.platform, self.delay))
    }
}

impl<I2C, P, D, CommE, PlatformE> core::fmt::Debug
    for ProbeError<I2C, P, D, CommE, PlatformE>
where
    CommE: core::fmt::Debug,
    PlatformE: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProbeError")
            .field("error", &self.error)
            .finish()
    }
}

impl<I2C, P, D, CommE> SensorSlot<I2C, P, D>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    P: Platform,
{
    /// Bind a sensor to this slot and register it with the host.
    /// Fails with `Busy` if a sensor is already bound, and with
    /// `Registration` if the host refuses it. Either way the bus, platform
    /// and delay come back in the error.
    pub fn probe<H: CaptureHost>(
        &mut self,
        i2c: I2C,
        address: u8,
        platform: P,
        delay: D,
        config: SensorConfig,
        host: &mut H,
    ) -> Result<&mut Mt9v032<I2C, P, D>, ProbeError<I2C, P, D, CommE, P::Error>>
    {
        if self.sensor.is_some() {
            return Err(ProbeError {
                error: Error::Busy,
                i2c,
                platform,
                delay,
            });
        }

        info!("{} sensor", config.mode);
        info!(
            "hflip={} vflip={} auto_gain={} auto_exp={} hdr={} low_light={}",
            config.hflip,
            config.vflip,
            config.auto_gain,
            config.auto_exposure,
            config.high_dynamic_range,
            config.low_light
        );

        let sensor = Mt9v032::new(i2c, address, platform, delay, config);
        if let Err(e) = host.register(DRIVER_NAME) {
            error!("unable to register {}: {:?}", DRIVER_NAME, e);
            let (i2c, platform, delay) = sensor.release();
            return Err(ProbeError {
                error: Error::Registration,
                i2c,
                platform,
                delay,
            });
        }
        Ok(self.sensor.get_or_insert(sensor))
    }

    /// Unregister the bound sensor and hand back its resources
    pub fn remove<H: CaptureHost>(
        &mut self,
        host: &mut H,
    ) -> Result<(I2C, P, D), Error<CommE, P::Error>> {
        let sensor = self.sensor.take().ok_or(Error::NoDevice)?;
        host.unregister(DRIVER_NAME);
        Ok(sensor.release())
    }
}
