//! Raw declarations mirroring `VshipAPI.h` and `VshipColor.h`.
//!
//! Everything here is `#[repr(C)]` and layout-compatible with the C headers.
//! Enumerations that cross the boundary as return values are kept as plain
//! `c_int` newtypes so that a code the headers do not list is still carried
//! through unchanged instead of becoming an invalid Rust enum.

use std::ffi::{c_char, c_int};
use std::fmt;

/// Status returned by every libvship entry point.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExceptionCode(c_int);

impl ExceptionCode {
    pub const NO_ERROR: Self = Self(0);
    pub const OUT_OF_VRAM: Self = Self(1);
    pub const OUT_OF_RAM: Self = Self(2);
    pub const HIP_ERROR: Self = Self(3);
    pub const BAD_DISPLAY_MODEL: Self = Self(4);
    pub const DIFFERING_INPUT_TYPE: Self = Self(5);
    pub const NON_RGBS_INPUT: Self = Self(6);
    pub const BAD_PATH: Self = Self(7);
    pub const BAD_JSON: Self = Self(8);
    pub const DEVICE_COUNT_ERROR: Self = Self(9);
    pub const NO_DEVICE_DETECTED: Self = Self(10);
    pub const BAD_DEVICE_ARGUMENT: Self = Self(11);
    pub const BAD_DEVICE_CODE: Self = Self(12);
    pub const BAD_HANDLER: Self = Self(13);
    pub const BAD_POINTER: Self = Self(14);
    pub const BAD_ERROR_TYPE: Self = Self(15);

    /// Wrap a raw status value.
    #[must_use]
    pub const fn from_raw(code: c_int) -> Self {
        Self(code)
    }

    /// The raw status value as returned by the library.
    #[must_use]
    pub const fn raw(self) -> c_int {
        self.0
    }

    /// True when the operation completed successfully.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == Self::NO_ERROR.0
    }

    /// Symbolic name of the code, as spelled in `VshipAPI.h`.
    ///
    /// Returns `None` for values the headers do not define.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NO_ERROR => "NoError",
            Self::OUT_OF_VRAM => "OutOfVRAM",
            Self::OUT_OF_RAM => "OutOfRAM",
            Self::HIP_ERROR => "HIPError",
            Self::BAD_DISPLAY_MODEL => "BadDisplayModel",
            Self::DIFFERING_INPUT_TYPE => "DifferingInputType",
            Self::NON_RGBS_INPUT => "NonRGBSInput",
            Self::BAD_PATH => "BadPath",
            Self::BAD_JSON => "BadJson",
            Self::DEVICE_COUNT_ERROR => "DeviceCountError",
            Self::NO_DEVICE_DETECTED => "NoDeviceDetected",
            Self::BAD_DEVICE_ARGUMENT => "BadDeviceArgument",
            Self::BAD_DEVICE_CODE => "BadDeviceCode",
            Self::BAD_HANDLER => "BadHandler",
            Self::BAD_POINTER => "BadPointer",
            Self::BAD_ERROR_TYPE => "BadErrorType",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ExceptionCode::{name}"),
            None => write!(f, "ExceptionCode({})", self.0),
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown exception {}", self.0),
        }
    }
}

/// `Vship_SSIMU2Handler`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ssimu2Handler {
    pub id: c_int,
}

/// `Vship_ButteraugliHandler`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButteraugliHandler {
    pub id: c_int,
}

/// `Vship_CVVDPHandler`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CvvdpHandler {
    pub id: c_int,
}

/// `Vship_ButteraugliScore`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButteraugliScore {
    pub norm_q: f64,
    pub norm3: f64,
    pub norm_inf: f64,
}

/// `Vship_Version`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: c_int,
    pub minor: c_int,
    pub minor_minor: c_int,
    pub backend: c_int,
}

pub const DEVICE_NAME_LEN: usize = 256;

/// `Vship_DeviceInfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub name: [c_char; DEVICE_NAME_LEN],
    pub vram_size: u64,
    pub integrated: c_int,
    pub multi_processor_count: c_int,
    pub warp_size: c_int,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            name: [0; DEVICE_NAME_LEN],
            vram_size: 0,
            integrated: 0,
            multi_processor_count: 0,
            warp_size: 0,
        }
    }
}

/// `Vship_ChromaSubsample_t`: log2 of the horizontal and vertical factors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChromaSubsample {
    pub subw: c_int,
    pub subh: c_int,
}

/// `Vship_CropRectangle_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropRectangle {
    pub top: c_int,
    pub bottom: c_int,
    pub left: c_int,
    pub right: c_int,
}

/// `Vship_Colorspace_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Colorspace {
    pub width: i64,
    pub height: i64,
    pub target_width: i64,
    pub target_height: i64,
    pub sample: c_int,
    pub range: c_int,
    pub subsampling: ChromaSubsample,
    pub chroma_location: c_int,
    pub color_family: c_int,
    pub yuv_matrix: c_int,
    pub transfer_function: c_int,
    pub primaries: c_int,
    pub crop: CropRectangle,
}

#[cfg(feature = "native")]
#[allow(non_snake_case)]
unsafe extern "C" {
    pub fn Vship_GetVersion() -> Version;
    pub fn Vship_GetDeviceCount(number: *mut c_int) -> ExceptionCode;
    pub fn Vship_GPUFullCheck(gpu_id: c_int) -> ExceptionCode;
    pub fn Vship_SetDevice(gpu_id: c_int) -> ExceptionCode;
    pub fn Vship_GetDeviceInfo(info: *mut DeviceInfo, gpu_id: c_int) -> ExceptionCode;
    pub fn Vship_GetErrorMessage(exception: ExceptionCode, out_message: *mut c_char, len: c_int) -> c_int;

    pub fn Vship_SSIMU2Init(
        handler: *mut Ssimu2Handler,
        src_colorspace: Colorspace,
        dis_colorspace: Colorspace,
    ) -> ExceptionCode;
    pub fn Vship_SSIMU2Free(handler: Ssimu2Handler) -> ExceptionCode;
    pub fn Vship_ComputeSSIMU2(
        handler: Ssimu2Handler,
        score: *mut f64,
        srcp1: *const *const u8,
        srcp2: *const *const u8,
        line_size: *const i64,
        line_size2: *const i64,
    ) -> ExceptionCode;

    pub fn Vship_ButteraugliInit(
        handler: *mut ButteraugliHandler,
        src_colorspace: Colorspace,
        dis_colorspace: Colorspace,
        qnorm: c_int,
        intensity_multiplier: f32,
    ) -> ExceptionCode;
    pub fn Vship_ButteraugliFree(handler: ButteraugliHandler) -> ExceptionCode;
    pub fn Vship_ComputeButteraugli(
        handler: ButteraugliHandler,
        score: *mut ButteraugliScore,
        dstp: *const u8,
        dststride: i64,
        srcp1: *const *const u8,
        srcp2: *const *const u8,
        line_size: *const i64,
        line_size2: *const i64,
    ) -> ExceptionCode;

    pub fn Vship_CVVDPInit(
        handler: *mut CvvdpHandler,
        src_colorspace: Colorspace,
        dis_colorspace: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
    ) -> ExceptionCode;
    pub fn Vship_CVVDPInit2(
        handler: *mut CvvdpHandler,
        src_colorspace: Colorspace,
        dis_colorspace: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
        // Path to a JSON display configuration file.
        model_config_path: *const c_char,
    ) -> ExceptionCode;
    pub fn Vship_CVVDPFree(handler: CvvdpHandler) -> ExceptionCode;
    pub fn Vship_ResetCVVDP(handler: CvvdpHandler) -> ExceptionCode;
    pub fn Vship_ResetScoreCVVDP(handler: CvvdpHandler) -> ExceptionCode;
    pub fn Vship_LoadTemporalCVVDP(
        handler: CvvdpHandler,
        srcp1: *const *const u8,
        srcp2: *const *const u8,
        line_size: *const i64,
        line_size2: *const i64,
    ) -> ExceptionCode;
    pub fn Vship_ComputeCVVDP(
        handler: CvvdpHandler,
        score: *mut f64,
        dstp: *const u8,
        dststride: i64,
        srcp1: *const *const u8,
        srcp2: *const *const u8,
        line_size: *const i64,
        line_size2: *const i64,
    ) -> ExceptionCode;
}
