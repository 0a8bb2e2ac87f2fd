/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Capture format and frame timing negotiation.
//! The sensor always delivers full-array progressive frames at 60 fps;
//! negotiation only picks a pixel format from the active catalog.

use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::config::SensorMode;
use crate::power::Platform;
use crate::state::DEFAULT_FPS;
use crate::{Error, Mt9v032};

// Array format: Wide-VGA, Active 752 H x 480 V
pub const MAX_FRAME_HEIGHT: u16 = 480;
pub const MAX_FRAME_WIDTH: u16 = 752;

/// Stream parameter capability flag: time per frame may be set
pub const CAP_TIME_PER_FRAME: u32 = 0x1000;

/// A four-character pixel format code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat(u32);

impl PixelFormat {
    /// 10-bit Bayer, BGBG.. / GRGR..
    pub const SBGGR10: PixelFormat = PixelFormat::from_fourcc(*b"BG10");
    /// 10-bit Bayer, GRGR.. / BGBG..
    pub const SGRBG10: PixelFormat = PixelFormat::from_fourcc(*b"BA10");

    pub const fn from_fourcc(code: [u8; 4]) -> Self {
        PixelFormat(u32::from_le_bytes(code))
    }

    pub const fn fourcc(self) -> u32 {
        self.0
    }
}

/// One entry of a format enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub description: &'static str,
    pub pixel_format: PixelFormat,
    pub flags: u32,
}

static COLOR_FORMATS: [FormatDescriptor; 1] = [FormatDescriptor {
    description: "Bayer10 (GrR/BGb)",
    pixel_format: PixelFormat::SBGGR10,
    flags: 0,
}];

static MONO_FORMATS: [FormatDescriptor; 1] = [FormatDescriptor {
    description: "Bayer10 (GrR/BGb)",
    pixel_format: PixelFormat::SGRBG10,
    flags: 0,
}];

/// Formats offered for a sensor mode. Never empty.
pub fn catalog(mode: SensorMode) -> &'static [FormatDescriptor] {
    match mode {
        SensorMode::Color => &COLOR_FORMATS,
        SensorMode::Mono => &MONO_FORMATS,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferType {
    VideoCapture,
    VideoOutput,
    VideoOverlay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Progressive: no interlacing
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
}

/// Negotiated image layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixFormat {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub field: Field,
    pub bytes_per_line: u32,
    pub size_image: u32,
    pub colorspace: ColorSpace,
}

impl PixFormat {
    /// Full frame in the given pixel format; every pixel occupies two bytes
    pub fn new(pixel_format: PixelFormat) -> Self {
        let width = u32::from(MAX_FRAME_WIDTH);
        let height = u32::from(MAX_FRAME_HEIGHT);
        let bytes_per_line = width * 2;
        Self {
            width,
            height,
            pixel_format,
            field: Field::None,
            bytes_per_line,
            size_image: bytes_per_line * height,
            colorspace: ColorSpace::Srgb,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Frame intervals offered for every format
pub const FRAME_INTERVALS: [Fraction; 1] = [Fraction::new(1, 60)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamParams {
    pub capability: u32,
    pub time_per_frame: Fraction,
}

impl<I2C, P, D, CommE> Mt9v032<I2C, P, D>
where
    I2C: Write<Error = CommE> + WriteRead<Error = CommE>,
    P: Platform,
{
    fn offers(&self, pixel_format: PixelFormat) -> bool {
        self.formats.iter().any(|f| f.pixel_format == pixel_format)
    }

    /// Enumerate the capture formats of the active catalog
    pub fn enum_format(
        &self,
        buf_type: BufferType,
        index: usize,
    ) -> Result<&'static FormatDescriptor, Error<CommE, P::Error>> {
        if buf_type != BufferType::VideoCapture {
            return Err(Error::NotSupported);
        }
        self.formats.get(index).ok_or(Error::InvalidArgument)
    }

    /// Adjust a requested format to the closest one the sensor can deliver,
    /// without applying it
    pub fn try_format(&self, requested: &PixFormat) -> PixFormat {
        let pixel_format = if self.offers(requested.pixel_format) {
            requested.pixel_format
        } else {
            self.formats[0].pixel_format
        };
        PixFormat::new(pixel_format)
    }

    pub fn set_format(&mut self, requested: &PixFormat) -> PixFormat {
        let pix = self.try_format(requested);
        self.state.pix = pix;
        pix
    }

    pub fn get_format(&self) -> PixFormat {
        self.state.pix
    }

    pub fn stream_params(
        &self,
        buf_type: BufferType,
    ) -> Result<StreamParams, Error<CommE, P::Error>> {
        if buf_type != BufferType::VideoCapture {
            return Err(Error::NotSupported);
        }
        Ok(StreamParams {
            capability: CAP_TIME_PER_FRAME,
            time_per_frame: self.state.time_per_frame,
        })
    }

    /// The frame rate is fixed: any requested interval is replaced by 1/60
    pub fn set_stream_params(
        &mut self,
        buf_type: BufferType,
        _requested: &StreamParams,
    ) -> Result<StreamParams, Error<CommE, P::Error>> {
        if buf_type != BufferType::VideoCapture {
            return Err(Error::NotSupported);
        }
        self.state.fps = DEFAULT_FPS;
        self.state.time_per_frame = Fraction::new(1, self.state.fps);
        self.stream_params(buf_type)
    }

    pub fn enum_frame_sizes(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<FrameSize, Error<CommE, P::Error>> {
        if !self.offers(pixel_format) {
            return Err(Error::NotSupported);
        }
        if index > 0 {
            return Err(Error::InvalidArgument);
        }
        Ok(FrameSize {
            width: u32::from(MAX_FRAME_WIDTH),
            height: u32::from(MAX_FRAME_HEIGHT),
        })
    }

    pub fn enum_frame_intervals(
        &self,
        pixel_format: PixelFormat,
        index: usize,
    ) -> Result<Fraction, Error<CommE, P::Error>> {
        if !self.offers(pixel_format) {
            return Err(Error::NotSupported);
        }
        FRAME_INTERVALS
            .get(index)
            .copied()
            .ok_or(Error::InvalidArgument)
    }
}
