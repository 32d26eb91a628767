//! Image format descriptions handed to libvship when a handler is created.
//!
//! [`Colorspace`] carries geometry, sample format, subsampling and colour
//! metadata for one side of a comparison. Matrix, transfer and primaries use
//! the ITU-T H.273 code points, which is what `VshipColor.h` uses.

use serde::{Deserialize, Serialize};

use crate::ffi;

/// How samples are stored in memory. Anything that is not a whole byte is
/// rounded up: `UInt10` occupies a `u16`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplingFormat {
    Float = 0,
    Half = 1,
    UInt8 = 2,
    UInt9 = 3,
    UInt10 = 4,
    UInt12 = 5,
    UInt14 = 6,
    UInt16 = 7,
}

impl SamplingFormat {
    /// Bytes occupied by one sample.
    #[must_use]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Float => 4,
            Self::UInt8 => 1,
            Self::Half | Self::UInt9 | Self::UInt10 | Self::UInt12 | Self::UInt14 | Self::UInt16 => 2,
        }
    }
}

/// Limited (TV) or full (PC) range.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorRange {
    #[default]
    Limited = 0,
    Full = 1,
}

/// Position of chroma samples relative to luma. Only relevant when chroma is
/// subsampled.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromaLocation {
    #[default]
    Left = 0,
    Center = 1,
    TopLeft = 2,
    Top = 3,
}

/// RGB or YUV channels.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorFamily {
    #[default]
    Yuv = 0,
    Rgb = 1,
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMatrix {
    Rgb = 0,
    #[default]
    Bt709 = 1,
    Bt470Bg = 5,
    St170M = 6,
    Bt2020Ncl = 9,
    Bt2020Cl = 10,
    Bt2100Ictcp = 14,
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorTransfer {
    #[default]
    Bt709 = 1,
    Bt470M = 4,
    Bt470Bg = 5,
    Bt601 = 6,
    Linear = 8,
    Srgb = 13,
    Pq = 16,
    St428 = 17,
    Hlg = 18,
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorPrimaries {
    /// libvship's internal working primaries.
    Internal = -1,
    #[default]
    Bt709 = 1,
    Bt470M = 4,
    Bt470Bg = 5,
    Bt2020 = 9,
}

/// Crop applied before scoring, in pixels from each edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crop {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Format and layout of one image.
///
/// # Example
///
/// ```
/// use vship_flat::{Colorspace, ColorFamily, SamplingFormat};
///
/// let mut rgb = Colorspace::new(1920, 1080, SamplingFormat::UInt8);
/// rgb.color_family = ColorFamily::Rgb;
/// assert_eq!(rgb.plane_dimensions(1), (1920, 1080));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colorspace {
    pub width: i64,
    pub height: i64,
    /// Resize target; `-1` leaves the dimension alone.
    pub target_width: i64,
    pub target_height: i64,
    pub sampling_format: SamplingFormat,
    pub color_range: ColorRange,
    /// log2 of the horizontal chroma subsampling factor.
    pub chroma_subsampling_width: i32,
    /// log2 of the vertical chroma subsampling factor.
    pub chroma_subsampling_height: i32,
    pub chroma_location: ChromaLocation,
    pub color_family: ColorFamily,
    pub color_matrix: ColorMatrix,
    pub color_transfer: ColorTransfer,
    pub color_primaries: ColorPrimaries,
    pub crop: Crop,
}

impl Colorspace {
    /// Defaults for the given size and sample format: limited-range YUV
    /// 4:2:0, BT.709 matrix, transfer and primaries, no crop, no resize.
    #[must_use]
    pub fn new(width: i64, height: i64, sampling_format: SamplingFormat) -> Self {
        Self {
            width,
            height,
            target_width: -1,
            target_height: -1,
            sampling_format,
            color_range: ColorRange::Limited,
            chroma_subsampling_width: 1,
            chroma_subsampling_height: 1,
            chroma_location: ChromaLocation::Left,
            color_family: ColorFamily::Yuv,
            color_matrix: ColorMatrix::Bt709,
            color_transfer: ColorTransfer::Bt709,
            color_primaries: ColorPrimaries::Bt709,
            crop: Crop::default(),
        }
    }

    /// Full-range RGB with no subsampling and sRGB transfer.
    #[must_use]
    pub fn rgb(width: i64, height: i64, sampling_format: SamplingFormat) -> Self {
        Self {
            color_range: ColorRange::Full,
            chroma_subsampling_width: 0,
            chroma_subsampling_height: 0,
            color_family: ColorFamily::Rgb,
            color_matrix: ColorMatrix::Rgb,
            color_transfer: ColorTransfer::Srgb,
            ..Self::new(width, height, sampling_format)
        }
    }

    /// Width and height in samples of plane `index` as stored in memory.
    ///
    /// Chroma planes of YUV input are divided by the subsampling factor,
    /// rounding up.
    #[must_use]
    pub fn plane_dimensions(&self, index: usize) -> (usize, usize) {
        let width = self.width.max(0) as usize;
        let height = self.height.max(0) as usize;
        if index == 0 || self.color_family == ColorFamily::Rgb {
            return (width, height);
        }
        let subw = self.chroma_subsampling_width.clamp(0, 16) as u32;
        let subh = self.chroma_subsampling_height.clamp(0, 16) as u32;
        (width.div_ceil(1 << subw), height.div_ceil(1 << subh))
    }

    /// Bytes in one row of plane `index`.
    #[must_use]
    pub fn row_bytes(&self, index: usize) -> u64 {
        let (width, _) = self.plane_dimensions(index);
        (width * self.sampling_format.bytes_per_sample()) as u64
    }

    /// Largest dimensions a per-pixel map for this image can have: the
    /// stored size or the resize target, whichever is larger.
    #[must_use]
    pub fn map_dimensions(&self) -> (usize, usize) {
        let width = self.width.max(self.target_width).max(0) as usize;
        let height = self.height.max(self.target_height).max(0) as usize;
        (width, height)
    }

    /// The `Vship_Colorspace_t` passed to handler constructors.
    #[must_use]
    pub fn to_raw(self) -> ffi::Colorspace {
        ffi::Colorspace {
            width: self.width,
            height: self.height,
            target_width: self.target_width,
            target_height: self.target_height,
            sample: self.sampling_format as i32,
            range: self.color_range as i32,
            subsampling: ffi::ChromaSubsample {
                subw: self.chroma_subsampling_width,
                subh: self.chroma_subsampling_height,
            },
            chroma_location: self.chroma_location as i32,
            color_family: self.color_family as i32,
            yuv_matrix: self.color_matrix as i32,
            transfer_function: self.color_transfer as i32,
            primaries: self.color_primaries as i32,
            crop: ffi::CropRectangle {
                top: self.crop.top,
                bottom: self.crop.bottom,
                left: self.crop.left,
                right: self.crop.right,
            },
        }
    }
}
