/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use core::convert::TryFrom;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use log::{debug, error, info, warn};

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

use crate::config::SensorConfig;
use crate::format::{catalog, FormatDescriptor};
use crate::power::{Platform, PowerState, XCLK_FREQUENCY};
use crate::registers::*;
use crate::state::*;
use crate::Error;

/// Wait after reset register writes
const SETTLE_DELAY_MS: u8 = 1;
/// Wait before stopping the clock, so the sensor shuts down with LED_OUT disabled
const POWER_DOWN_DELAY_MS: u8 = 50;

/// Main driver struct
pub struct Mt9v032<I2C, P, D> {
    i2c: I2C,
    base_address: u8,
    platform: P,
    delay: D,
    config: SensorConfig,
    power: PowerState,
    pub(crate) state: SensorState,
    pub(crate) formats: &'static [FormatDescriptor],
}

impl<I2C, P, D> Mt9v032<I2C, P, D> {
    /// Create a new instance with a 7-bit i2c address:
    /// May use DEFAULT_I2C_ADDRESS if in doubt.
    /// The sensor is not touched until it is powered on.
    pub fn new(
        i2c: I2C,
        address: u8,
        platform: P,
        delay: D,
        config: SensorConfig,
    ) -> Self {
        Self {
            i2c,
            base_address: address,
            platform,
            delay,
            state: SensorState::new(&config),
            formats: catalog(config.mode),
            config,
            power: PowerState::Off,
        }
    }

    /// Give back the bus, platform and delay
    pub fn release(self) -> (I2C, P, D) {
        (self.i2c, self.platform, self.delay)
    }

    pub fn address(&self) -> u8 {
        self.base_address
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Last power state reached successfully
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub fn chip_version(&self) -> Option<ChipVersion> {
        self.state.version
    }

    /// Formats this sensor offers, fixed by the sensor mode
    pub fn formats(&self) -> &'static [FormatDescriptor] {
        self.formats
    }
}

impl<I2C, P, D, CommE> Mt9v032<I2C, P, D>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    P: Platform,
    D: DelayMs<u8>,
{
    /// Read a u16 register
    pub fn read_register(
        &mut self,
        reg: Register,
    ) -> Result<u16, Error<CommE, P::Error>> {
        let mut recv_buf = [0u8; 2];
        self.i2c
            .write_read(self.base_address, &[reg.addr()], &mut recv_buf)
            .map_err(Error::Comm)?;
        // register words travel most significant byte first
        Ok(u16::from_be_bytes(recv_buf))
    }

    /// Write a u16 register
    pub fn write_register(
        &mut self,
        reg: Register,
        data: u16,
    ) -> Result<(), Error<CommE, P::Error>> {
        let [upper, lower] = data.to_be_bytes();
        self.i2c
            .write(self.base_address, &[reg.addr(), upper, lower])
            .map_err(Error::Comm)
    }

    /// Program the default register set and then the state held for this
    /// sensor: flips, automatic exposure and gain, dynamic range, ADC mode.
    /// Leaves the sensor in snapshot mode.
    ///
    /// Returns how many default registers failed to read back as written.
    /// Such mismatches are logged but never abort configuration.
    pub fn configure(&mut self) -> Result<usize, Error<CommE, P::Error>> {
        #[cfg(feature = "rttdebug")]
        rprintln!("mt9v032-i2c configure start");

        // soft reset needs 15 clock cycles, give it more
        self.write_register(Register::Reset, RESET_SOFT)?;
        self.delay.delay_ms(SETTLE_DELAY_MS);

        for &(reg, value) in DEFAULT_REGISTERS.iter() {
            self.write_register(reg, value)?;
        }

        // latch shadowed registers, otherwise verification reads stale values
        self.write_register(Register::Reset, RESET_COMMIT)?;
        self.delay.delay_ms(SETTLE_DELAY_MS);

        let mismatches = self.verify_defaults()?;

        self.write_register(Register::HorizontalBlanking, HORIZONTAL_BLANKING)?;
        self.write_register(Register::VerticalBlanking, VERTICAL_BLANKING)?;

        let mut chip_control = self.state.chip_control;
        chip_control.rebase(self.read_register(Register::ChipControl)?);
        chip_control.snapshot = true;
        self.write_chip_control(chip_control)?;

        // longest shutter that fits the frame; used when AEC is off
        let window_height = self.read_register(Register::WindowHeight)?;
        let shutter = window_height
            .saturating_add(VERTICAL_BLANKING)
            .saturating_sub(2);
        self.write_shutter(shutter)?;

        let mut pixel_mode = self.state.pixel_mode;
        pixel_mode.rebase(self.read_register(Register::PixelOperationMode)?);
        self.write_pixel_mode(pixel_mode)?;

        let mut read_mode = self.state.read_mode;
        read_mode.rebase(self.read_register(Register::ReadMode)?);
        self.write_read_mode(read_mode)?;

        let mut auto_control = self.state.auto_control;
        auto_control.rebase(self.read_register(Register::AecAgcEnable)?);
        self.write_auto_control(auto_control)?;

        let adc_mode = self.state.adc_mode;
        self.write_adc_mode(adc_mode)?;

        // manual gain starts at its ceiling; the sensor gets the ceiling
        // as read, the shadow keeps it within the control range
        let max_gain = self.read_register(Register::MaxAnalogGain)?;
        self.write_register(Register::AnalogGain, max_gain)?;
        self.state.gain = coerce_gain(max_gain.max(GAIN_MIN).min(GAIN_MAX));

        // headroom for AEC in low light
        self.write_register(
            Register::MaxShutterWidth,
            shutter.saturating_mul(4),
        )?;

        #[cfg(feature = "rttdebug")]
        rprintln!("mt9v032-i2c configure done");
        Ok(mismatches)
    }

    fn verify_defaults(&mut self) -> Result<usize, Error<CommE, P::Error>> {
        let mut mismatches = 0;
        for &(reg, expected) in DEFAULT_REGISTERS.iter() {
            let actual = self.read_register(reg)?;
            if actual != expected {
                warn!(
                    "attempted to set {} to {:04X} read {:04X}",
                    reg.name(),
                    expected,
                    actual
                );
                mismatches += 1;
            }
        }
        Ok(mismatches)
    }

    /// Read the chip version and remember it if this driver supports it
    pub fn detect(&mut self) -> Result<ChipVersion, Error<CommE, P::Error>> {
        let raw = self
            .read_register(Register::ChipVersion)
            .map_err(|_| Error::NotDetected)?;
        match ChipVersion::try_from(raw) {
            Ok(version) => {
                info!("chip version 0x{:04X}", raw);
                self.state.version = Some(version);
                Ok(version)
            }
            Err(_) => {
                warn!("chip version mismatch (0x{:04X})", raw);
                Err(Error::NotDetected)
            }
        }
    }

    /// Leave snapshot mode and stream continuously
    pub fn start_capture(&mut self) -> Result<(), Error<CommE, P::Error>> {
        let mut chip_control = self.state.chip_control;
        chip_control.snapshot = false;
        self.write_chip_control(chip_control)
    }

    /// Return to snapshot mode
    pub fn stop_capture(&mut self) -> Result<(), Error<CommE, P::Error>> {
        let mut chip_control = self.state.chip_control;
        chip_control.snapshot = true;
        self.write_chip_control(chip_control)
    }

    /// Move the sensor to a new power state.
    ///
    /// Powering on starts the clock and the supplies, detects the sensor if
    /// that has not succeeded yet, configures it and starts capture. If any of
    /// that fails the sensor is powered back down and the error returned.
    pub fn set_power(
        &mut self,
        state: PowerState,
    ) -> Result<(), Error<CommE, P::Error>> {
        match state {
            PowerState::On => self.power_up(),
            PowerState::Standby | PowerState::Off => self.power_down(state),
        }
    }

    fn power_up(&mut self) -> Result<(), Error<CommE, P::Error>> {
        let xclk = self.platform.set_xclk(XCLK_FREQUENCY);
        debug!("xclk set to {} Hz", xclk);

        // the platform waits for its rails to settle
        if let Err(e) = self.platform.set_power(PowerState::On) {
            error!("unable to set the power state: mt9v032 sensor");
            self.platform.set_xclk(0);
            return Err(Error::Platform(e));
        }

        if let Err(e) = self.bring_up() {
            error!("unable to bring up mt9v032 sensor");
            // best effort, the bring-up error is the one reported
            let _ = self.platform.set_power(PowerState::Off);
            self.platform.set_xclk(0);
            self.power = PowerState::Off;
            return Err(e);
        }

        self.power = PowerState::On;
        Ok(())
    }

    fn bring_up(&mut self) -> Result<(), Error<CommE, P::Error>> {
        if !self.state.is_detected() {
            self.detect()?;
        }
        self.configure()?;
        self.start_capture()
    }

    fn power_down(
        &mut self,
        state: PowerState,
    ) -> Result<(), Error<CommE, P::Error>> {
        if self.state.is_detected() && self.stop_capture().is_err() {
            warn!("unable to stop capture before power down");
        }

        self.delay.delay_ms(POWER_DOWN_DELAY_MS);
        self.platform.set_xclk(0);

        self.platform.set_power(state).map_err(|e| {
            error!("unable to set the power state: mt9v032 sensor");
            Error::Platform(e)
        })?;
        self.power = state;
        Ok(())
    }

    /// Board private data, as provided by the platform
    pub fn priv_data(&mut self) -> Result<P::PrivData, Error<CommE, P::Error>> {
        self.platform.priv_data().map_err(Error::Platform)
    }

    // Write-through for the registers shadowed in SensorState:
    // the shadow only changes once the register write succeeded.

    pub(crate) fn write_chip_control(
        &mut self,
        chip_control: ChipControl,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::ChipControl, chip_control.bits())?;
        self.state.chip_control = chip_control;
        Ok(())
    }

    pub(crate) fn write_pixel_mode(
        &mut self,
        pixel_mode: PixelMode,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::PixelOperationMode, pixel_mode.bits())?;
        self.state.pixel_mode = pixel_mode;
        Ok(())
    }

    pub(crate) fn write_read_mode(
        &mut self,
        read_mode: ReadMode,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::ReadMode, read_mode.bits())?;
        self.state.read_mode = read_mode;
        Ok(())
    }

    pub(crate) fn write_auto_control(
        &mut self,
        auto_control: AutoControl,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::AecAgcEnable, auto_control.bits())?;
        self.state.auto_control = auto_control;
        Ok(())
    }

    pub(crate) fn write_adc_mode(
        &mut self,
        adc_mode: AdcMode,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::AdcModeControl, adc_mode.bits())?;
        self.state.adc_mode = adc_mode;
        Ok(())
    }

    pub(crate) fn write_shutter(
        &mut self,
        shutter: u16,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::TotalShutterWidth, shutter)?;
        self.state.shutter = shutter;
        Ok(())
    }

    pub(crate) fn write_gain(
        &mut self,
        gain: u16,
    ) -> Result<(), Error<CommE, P::Error>> {
        self.write_register(Register::AnalogGain, gain)?;
        self.state.gain = gain;
        Ok(())
    }
}
