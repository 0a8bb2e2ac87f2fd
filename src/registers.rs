/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! MT9V032 register map, bit definitions, and the known-good default register set

/// Sensor registers addressed over the two-wire interface
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    ChipVersion = 0x00,
    ColumnStart = 0x01,
    RowStart = 0x02,
    WindowHeight = 0x03,
    WindowWidth = 0x04,
    HorizontalBlanking = 0x05,
    VerticalBlanking = 0x06,
    ChipControl = 0x07,
    ShutterWidth1 = 0x08,
    ShutterWidth2 = 0x09,
    ShutterWidthCtrl = 0x0a,
    TotalShutterWidth = 0x0b,
    Reset = 0x0c,
    ReadMode = 0x0d,
    MonitorMode = 0x0e,
    PixelOperationMode = 0x0f,
    LedOutControl = 0x1b,
    AdcModeControl = 0x1c,
    VrefAdcControl = 0x2c,
    V1 = 0x31,
    V2 = 0x32,
    V3 = 0x33,
    V4 = 0x34,
    AnalogGain = 0x35,
    MaxAnalogGain = 0x36,
    FrameDarkAverage = 0x42,
    DarkAvgThresholds = 0x46,
    BlackLevelCalibCtrl = 0x47,
    BlackLevelCalibValue = 0x48,
    BlackLevelCalibStep = 0x4c,
    RowNoiseCorrCtrl1 = 0x70,
    RowNoiseConstant = 0x72,
    RowNoiseCorrCtrl2 = 0x73,
    PixclkFvLv = 0x74,
    DigitalTestPattern = 0x7f,
    AgcAecDesiredBin = 0xa5,
    AecUpdate = 0xa6,
    AecLowpass = 0xa8,
    AgcUpdate = 0xa9,
    AgcLowpass = 0xab,
    AecAgcEnable = 0xaf,
    AgcAecPixelCount = 0xb0,
    /// Read-only: gain currently chosen by AGC
    AgcOutput = 0xba,
    /// Read-only: shutter width currently chosen by AEC
    AecOutput = 0xbb,
    /// Maximum total shutter width AEC may select
    MaxShutterWidth = 0xbd,
    BinDiffThreshold = 0xbe,
}

impl Register {
    /// The 8-bit register address
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Human-readable name, used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Register::ChipVersion => "Chip Version",
            Register::ColumnStart => "Column Start",
            Register::RowStart => "Row Start",
            Register::WindowHeight => "Window Height",
            Register::WindowWidth => "Window Width",
            Register::HorizontalBlanking => "Horizontal Blanking",
            Register::VerticalBlanking => "Vertical Blanking",
            Register::ChipControl => "Chip Control",
            Register::ShutterWidth1 => "Shutter Width 1",
            Register::ShutterWidth2 => "Shutter Width 2",
            Register::ShutterWidthCtrl => "Shutter Width Ctrl",
            Register::TotalShutterWidth => "Total Shutter Width",
            Register::Reset => "Reset",
            Register::ReadMode => "Read Mode",
            Register::MonitorMode => "Monitor Mode",
            Register::PixelOperationMode => "Pixel Operation Mode",
            Register::LedOutControl => "LED_OUT Ctrl",
            Register::AdcModeControl => "ADC Mode Control",
            Register::VrefAdcControl => "VREF_ADC Control",
            Register::V1 => "V1",
            Register::V2 => "V2",
            Register::V3 => "V3",
            Register::V4 => "V4",
            Register::AnalogGain => "Analog Gain (16-64)",
            Register::MaxAnalogGain => "Max Analog Gain",
            Register::FrameDarkAverage => "Frame Dark Average",
            Register::DarkAvgThresholds => "Dark Avg Thresholds",
            Register::BlackLevelCalibCtrl => "Black Level Calib Control",
            Register::BlackLevelCalibValue => "Black Level Calib Value",
            Register::BlackLevelCalibStep => "BL Calib Step Size",
            Register::RowNoiseCorrCtrl1 => "Row Noise Corr Ctrl 1",
            Register::RowNoiseConstant => "Row Noise Constant",
            Register::RowNoiseCorrCtrl2 => "Row Noise Corr Ctrl 2",
            Register::PixclkFvLv => "Pixclk, FV, LV",
            Register::DigitalTestPattern => "Digital Test Pattern",
            Register::AgcAecDesiredBin => "AEC/AGC Desired Bin",
            Register::AecUpdate => "AEC Update Frequency",
            Register::AecLowpass => "AEC LPF",
            Register::AgcUpdate => "AGC Update Frequency",
            Register::AgcLowpass => "AGC LPF",
            Register::AecAgcEnable => "AEC/AGC Enable",
            Register::AgcAecPixelCount => "AEC/AGC Pix Count",
            Register::AgcOutput => "AGC Output",
            Register::AecOutput => "AEC Output",
            Register::MaxShutterWidth => "Maximum Shutter Width",
            Register::BinDiffThreshold => "AGC/AEC Bin Difference Threshold",
        }
    }
}

// AecAgcEnable bits
pub const AUTO_EXPOSURE: u16 = 0x0001;
pub const AUTO_GAIN: u16 = 0x0002;

// AdcModeControl values
pub const LINEAR_ADC: u16 = 0x0002;
pub const COMPANDING_ADC: u16 = 0x0003;

// ChipControl bits
pub const SNAPSHOT_MODE: u16 = 0x0010;

// PixelOperationMode bits
pub const COLOR_SENSOR: u16 = 0x0004;
pub const HIGH_DYNAMIC_RANGE: u16 = 0x0040;

// ReadMode bits
pub const VERTICAL_FLIP: u16 = 0x0010;
pub const HORIZONTAL_FLIP: u16 = 0x0020;

/// Reset register: soft reset of the sensor core
pub const RESET_SOFT: u16 = 0x0003;
/// Reset register: latch shadowed registers so reads return written values
pub const RESET_COMMIT: u16 = 0x0001;

/// Blanking for 60 fps with a 27 MHz pixel clock (datasheet timing equations)
pub const HORIZONTAL_BLANKING: u16 = 43;
pub const VERTICAL_BLANKING: u16 = 88;

/// Default register values, written in order by configuration.
/// Later entries may overwrite fields shared with earlier ones.
pub const DEFAULT_REGISTERS: [(Register, u16); 41] = [
    (Register::ColumnStart, 0x0001),
    (Register::RowStart, 0x0004),
    (Register::WindowHeight, 0x01e0),
    (Register::WindowWidth, 0x02f0),
    (Register::HorizontalBlanking, 0x005e),
    (Register::VerticalBlanking, 0x002d),
    (Register::ChipControl, 0x0388),
    (Register::ShutterWidth1, 0x01bb),
    (Register::ShutterWidth2, 0x01d9),
    (Register::ShutterWidthCtrl, 0x0164),
    (Register::TotalShutterWidth, 0x01e0),
    (Register::Reset, 0x0000),
    (Register::ReadMode, 0x0300),
    (Register::MonitorMode, 0x0000),
    (Register::PixelOperationMode, 0x0011),
    (Register::LedOutControl, 0x0000),
    (Register::AdcModeControl, 0x0002),
    (Register::VrefAdcControl, 0x0004),
    (Register::V1, 0x001d),
    (Register::V2, 0x0018),
    (Register::V3, 0x0015),
    (Register::V4, 0x0004),
    (Register::AnalogGain, 0x0010),
    (Register::MaxAnalogGain, 0x0040),
    (Register::DarkAvgThresholds, 0x231d),
    (Register::BlackLevelCalibCtrl, 0x8080),
    (Register::BlackLevelCalibStep, 0x0002),
    (Register::RowNoiseCorrCtrl1, 0x0034),
    (Register::RowNoiseConstant, 0x002a),
    (Register::RowNoiseCorrCtrl2, 0x02f7),
    (Register::PixclkFvLv, 0x0000),
    (Register::DigitalTestPattern, 0x0000),
    (Register::AgcAecDesiredBin, 0x003a),
    (Register::AecUpdate, 0x0002),
    (Register::AecLowpass, 0x0000),
    (Register::AgcUpdate, 0x0002),
    (Register::AgcLowpass, 0x0002),
    (Register::AecAgcEnable, 0x0003),
    (Register::AgcAecPixelCount, 0xabe0),
    (Register::MaxShutterWidth, 0x01e0),
    (Register::BinDiffThreshold, 0x0014),
];

/// Power-on default of a register, if it is part of the default set
pub fn default_value(reg: Register) -> Option<u16> {
    DEFAULT_REGISTERS
        .iter()
        .find(|(r, _)| *r == reg)
        .map(|(_, value)| *value)
}
