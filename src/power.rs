/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

/// Sensor master clock while powered
pub const XCLK_FREQUENCY: u32 = 27_000_000;

/// Power states requested by the capture host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Off,
    Standby,
    On,
}

/// Board-level services the driver needs but does not own:
/// power rails, the master clock, and private data for the capture host.
pub trait Platform {
    type Error;
    type PrivData;

    /// Switch the sensor supplies. Implementations wait for rails to settle.
    fn set_power(&mut self, state: PowerState) -> Result<(), Self::Error>;

    /// Set the master clock, zero stops it. Returns the frequency actually set.
    fn set_xclk(&mut self, frequency: u32) -> u32;

    /// Board private data, passed through to the capture host unchanged
    fn priv_data(&mut self) -> Result<Self::PrivData, Self::Error>;
}
