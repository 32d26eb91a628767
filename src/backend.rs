//! The seam between this crate and the library that computes the metrics.
//!
//! [`Backend`] has one method per libvship entry point, in the library's own
//! array-based calling convention. [`Native`] forwards each method to the
//! linked `libvship`; the flattening adapter in [`crate::flat`] and the safe
//! handlers are generic over the trait.

use std::ffi::{c_char, c_int};

use crate::ffi::{
    ButteraugliHandler, ButteraugliScore, Colorspace, CvvdpHandler, DeviceInfo, ExceptionCode,
    Ssimu2Handler, Version,
};

/// Array-based libvship surface.
///
/// Pointer arguments follow the C contract of the corresponding `Vship_*`
/// function. Plane arrays always hold three entries and line-size arrays three
/// byte strides, in plane order 0, 1, 2.
pub trait Backend {
    /// `Vship_GetVersion`.
    fn version(&self) -> Version;

    /// `Vship_GetDeviceCount`.
    ///
    /// # Safety
    ///
    /// `count` must be valid for a write of one `c_int`.
    unsafe fn device_count(&self, count: *mut c_int) -> ExceptionCode;

    /// `Vship_GPUFullCheck`.
    fn gpu_full_check(&self, gpu_id: c_int) -> ExceptionCode;

    /// `Vship_SetDevice`.
    fn set_device(&self, gpu_id: c_int) -> ExceptionCode;

    /// `Vship_GetDeviceInfo`.
    ///
    /// # Safety
    ///
    /// `info` must be valid for a write of one [`DeviceInfo`].
    unsafe fn device_info(&self, info: *mut DeviceInfo, gpu_id: c_int) -> ExceptionCode;

    /// `Vship_GetErrorMessage`. Returns the buffer size the full message needs,
    /// terminator included.
    ///
    /// # Safety
    ///
    /// `out` must be null or valid for writes of `len` bytes.
    unsafe fn error_message(&self, code: ExceptionCode, out: *mut c_char, len: c_int) -> c_int;

    /// `Vship_SSIMU2Init`.
    ///
    /// # Safety
    ///
    /// `handler` must be valid for a write of one handler.
    unsafe fn ssimu2_init(
        &self,
        handler: *mut Ssimu2Handler,
        src: Colorspace,
        dis: Colorspace,
    ) -> ExceptionCode;

    /// `Vship_SSIMU2Free`.
    fn ssimu2_free(&self, handler: Ssimu2Handler) -> ExceptionCode;

    /// `Vship_ComputeSSIMU2`.
    ///
    /// # Safety
    ///
    /// `score` must be writable; the arrays must hold three entries each and
    /// every non-null plane must cover its stride times its row count.
    unsafe fn compute_ssimu2(
        &self,
        handler: Ssimu2Handler,
        score: *mut f64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode;

    /// `Vship_ButteraugliInit`.
    ///
    /// # Safety
    ///
    /// `handler` must be valid for a write of one handler.
    unsafe fn butteraugli_init(
        &self,
        handler: *mut ButteraugliHandler,
        src: Colorspace,
        dis: Colorspace,
        qnorm: c_int,
        display_nits: f32,
    ) -> ExceptionCode;

    /// `Vship_ButteraugliFree`.
    fn butteraugli_free(&self, handler: ButteraugliHandler) -> ExceptionCode;

    /// `Vship_ComputeButteraugli`.
    ///
    /// # Safety
    ///
    /// As [`Backend::compute_ssimu2`]; `dstp` is null or a writable `f32` map
    /// with `dst_stride` bytes per row.
    unsafe fn compute_butteraugli(
        &self,
        handler: ButteraugliHandler,
        score: *mut ButteraugliScore,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode;

    /// `Vship_CVVDPInit`.
    ///
    /// # Safety
    ///
    /// `handler` must be writable; `model_key` must be a NUL-terminated string.
    unsafe fn cvvdp_init(
        &self,
        handler: *mut CvvdpHandler,
        src: Colorspace,
        dis: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
    ) -> ExceptionCode;

    /// `Vship_CVVDPInit2`.
    ///
    /// # Safety
    ///
    /// As [`Backend::cvvdp_init`]; `model_config_path` must be a NUL-terminated
    /// path to a CVVDP display configuration file.
    unsafe fn cvvdp_init_with_config(
        &self,
        handler: *mut CvvdpHandler,
        src: Colorspace,
        dis: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
        model_config_path: *const c_char,
    ) -> ExceptionCode;

    /// `Vship_CVVDPFree`.
    fn cvvdp_free(&self, handler: CvvdpHandler) -> ExceptionCode;

    /// `Vship_ResetCVVDP`.
    fn cvvdp_reset(&self, handler: CvvdpHandler) -> ExceptionCode;

    /// `Vship_ResetScoreCVVDP`.
    fn cvvdp_reset_score(&self, handler: CvvdpHandler) -> ExceptionCode;

    /// `Vship_LoadTemporalCVVDP`.
    ///
    /// # Safety
    ///
    /// As [`Backend::compute_ssimu2`], without the score slot.
    unsafe fn load_temporal_cvvdp(
        &self,
        handler: CvvdpHandler,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode;

    /// `Vship_ComputeCVVDP`.
    ///
    /// # Safety
    ///
    /// As [`Backend::compute_butteraugli`], with a scalar score slot.
    unsafe fn compute_cvvdp(
        &self,
        handler: CvvdpHandler,
        score: *mut f64,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode;
}

/// The linked `libvship`.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Native;

#[cfg(feature = "native")]
impl Backend for Native {
    fn version(&self) -> Version {
        unsafe { crate::ffi::Vship_GetVersion() }
    }

    unsafe fn device_count(&self, count: *mut c_int) -> ExceptionCode {
        unsafe { crate::ffi::Vship_GetDeviceCount(count) }
    }

    fn gpu_full_check(&self, gpu_id: c_int) -> ExceptionCode {
        unsafe { crate::ffi::Vship_GPUFullCheck(gpu_id) }
    }

    fn set_device(&self, gpu_id: c_int) -> ExceptionCode {
        unsafe { crate::ffi::Vship_SetDevice(gpu_id) }
    }

    unsafe fn device_info(&self, info: *mut DeviceInfo, gpu_id: c_int) -> ExceptionCode {
        unsafe { crate::ffi::Vship_GetDeviceInfo(info, gpu_id) }
    }

    unsafe fn error_message(&self, code: ExceptionCode, out: *mut c_char, len: c_int) -> c_int {
        unsafe { crate::ffi::Vship_GetErrorMessage(code, out, len) }
    }

    unsafe fn ssimu2_init(
        &self,
        handler: *mut Ssimu2Handler,
        src: Colorspace,
        dis: Colorspace,
    ) -> ExceptionCode {
        unsafe { crate::ffi::Vship_SSIMU2Init(handler, src, dis) }
    }

    fn ssimu2_free(&self, handler: Ssimu2Handler) -> ExceptionCode {
        unsafe { crate::ffi::Vship_SSIMU2Free(handler) }
    }

    unsafe fn compute_ssimu2(
        &self,
        handler: Ssimu2Handler,
        score: *mut f64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        unsafe { crate::ffi::Vship_ComputeSSIMU2(handler, score, src, dis, src_line, dis_line) }
    }

    unsafe fn butteraugli_init(
        &self,
        handler: *mut ButteraugliHandler,
        src: Colorspace,
        dis: Colorspace,
        qnorm: c_int,
        display_nits: f32,
    ) -> ExceptionCode {
        unsafe { crate::ffi::Vship_ButteraugliInit(handler, src, dis, qnorm, display_nits) }
    }

    fn butteraugli_free(&self, handler: ButteraugliHandler) -> ExceptionCode {
        unsafe { crate::ffi::Vship_ButteraugliFree(handler) }
    }

    unsafe fn compute_butteraugli(
        &self,
        handler: ButteraugliHandler,
        score: *mut ButteraugliScore,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        unsafe {
            crate::ffi::Vship_ComputeButteraugli(
                handler, score, dstp, dst_stride, src, dis, src_line, dis_line,
            )
        }
    }

    unsafe fn cvvdp_init(
        &self,
        handler: *mut CvvdpHandler,
        src: Colorspace,
        dis: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
    ) -> ExceptionCode {
        unsafe { crate::ffi::Vship_CVVDPInit(handler, src, dis, fps, resize_to_display, model_key) }
    }

    unsafe fn cvvdp_init_with_config(
        &self,
        handler: *mut CvvdpHandler,
        src: Colorspace,
        dis: Colorspace,
        fps: f32,
        resize_to_display: bool,
        model_key: *const c_char,
        model_config_path: *const c_char,
    ) -> ExceptionCode {
        unsafe {
            crate::ffi::Vship_CVVDPInit2(
                handler,
                src,
                dis,
                fps,
                resize_to_display,
                model_key,
                model_config_path,
            )
        }
    }

    fn cvvdp_free(&self, handler: CvvdpHandler) -> ExceptionCode {
        unsafe { crate::ffi::Vship_CVVDPFree(handler) }
    }

    fn cvvdp_reset(&self, handler: CvvdpHandler) -> ExceptionCode {
        unsafe { crate::ffi::Vship_ResetCVVDP(handler) }
    }

    fn cvvdp_reset_score(&self, handler: CvvdpHandler) -> ExceptionCode {
        unsafe { crate::ffi::Vship_ResetScoreCVVDP(handler) }
    }

    unsafe fn load_temporal_cvvdp(
        &self,
        handler: CvvdpHandler,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        unsafe { crate::ffi::Vship_LoadTemporalCVVDP(handler, src, dis, src_line, dis_line) }
    }

    unsafe fn compute_cvvdp(
        &self,
        handler: CvvdpHandler,
        score: *mut f64,
        dstp: *const u8,
        dst_stride: i64,
        src: *const *const u8,
        dis: *const *const u8,
        src_line: *const i64,
        dis_line: *const i64,
    ) -> ExceptionCode {
        unsafe {
            crate::ffi::Vship_ComputeCVVDP(
                handler, score, dstp, dst_stride, src, dis, src_line, dis_line,
            )
        }
    }
}
